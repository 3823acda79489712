pub mod speech_error;

pub use speech_error::{SpeechError, SpeechResult};
