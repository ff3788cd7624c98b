// Module audio - CPAL output for rendered tones

pub mod device;
pub mod format_conversion;
pub mod output;

pub use output::{CpalTonePlayer, SilentTonePlayer, TonePlayer, default_tone_player};
