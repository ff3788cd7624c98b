// Communication channels lock-free

use crate::messaging::event::PlaybackEvent;
use ringbuf::traits::{Consumer, Producer, Split};
use ringbuf::HeapRb;
use std::sync::{Arc, Mutex};

pub type EventProducer = ringbuf::HeapProd<PlaybackEvent>;
pub type EventConsumer = ringbuf::HeapCons<PlaybackEvent>;

pub fn create_event_channel(capacity: usize) -> (EventProducer, EventConsumer) {
    let rb = HeapRb::<PlaybackEvent>::new(capacity);
    rb.split()
}

/// Producer side shared between successive tick threads
///
/// Publishers only contend with each other for a single push; when the
/// observer falls behind, new events are dropped.
#[derive(Clone)]
pub struct EventSink {
    producer: Option<Arc<Mutex<EventProducer>>>,
}

impl EventSink {
    pub fn new(producer: EventProducer) -> Self {
        Self {
            producer: Some(Arc::new(Mutex::new(producer))),
        }
    }

    /// Sink that discards every event
    pub fn disconnected() -> Self {
        Self { producer: None }
    }

    /// Push an event, returning false if it was dropped
    pub fn publish(&self, event: PlaybackEvent) -> bool {
        let Some(producer) = &self.producer else {
            return false;
        };
        let mut producer = producer.lock().unwrap_or_else(|e| e.into_inner());
        producer.try_push(event).is_ok()
    }
}

impl std::fmt::Debug for EventSink {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EventSink")
            .field("connected", &self.producer.is_some())
            .finish()
    }
}

/// Drain every pending event from a consumer
pub fn drain_events(consumer: &mut EventConsumer) -> Vec<PlaybackEvent> {
    let mut events = Vec::new();
    while let Some(event) = consumer.try_pop() {
        events.push(event);
    }
    events
}
