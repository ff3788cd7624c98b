// Messaging - Scheduler to observer communication

pub mod channels;
pub mod event;
