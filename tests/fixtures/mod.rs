//! Test Fixtures Module
//!
//! Programmatically generated audio so tests carry no binary files.

// Not every test binary uses every helper
#![allow(dead_code)]

pub mod audio_fixtures;

pub use audio_fixtures::*;
