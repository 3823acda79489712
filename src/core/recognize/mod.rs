//! One-shot recognition over HTTP.

mod recognizer;


pub use recognizer::SynchronousRecognizer;
