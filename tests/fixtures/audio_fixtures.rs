//! Audio Test Fixtures
//!
//! Audio format:
//! - Sample rate: 16kHz (16000 Hz)
//! - Bit depth: 16-bit signed PCM
//! - Channels: Mono

use std::f32::consts::PI;
use std::io::Cursor;
use std::path::{Path, PathBuf};

/// Standard sample rate for STT (16kHz)
pub const SAMPLE_RATE: u32 = 16000;

pub const MS_100: usize = 1600; // 100ms at 16kHz
pub const SECOND: usize = 16000; // 1 second at 16kHz

/// Generate silence (zeros)
pub fn generate_silence(duration_samples: usize) -> Vec<i16> {
    vec![0i16; duration_samples]
}

/// Generate a sine wave tone
pub fn generate_sine_wave(duration_samples: usize, frequency: f32, amplitude: f32) -> Vec<i16> {
    let max_amplitude = amplitude * i16::MAX as f32;
    let angular_freq = 2.0 * PI * frequency / SAMPLE_RATE as f32;

    (0..duration_samples)
        .map(|i| ((angular_freq * i as f32).sin() * max_amplitude) as i16)
        .collect()
}

/// Speech-like audio: a tone with a syllable-rate amplitude envelope.
pub fn generate_speech_like(duration_samples: usize) -> Vec<i16> {
    let syllable = 2.0 * PI * 4.0 / SAMPLE_RATE as f32;
    generate_sine_wave(duration_samples, 220.0, 0.6)
        .into_iter()
        .enumerate()
        .map(|(i, s)| (s as f32 * (syllable * i as f32).sin().abs()) as i16)
        .collect()
}

/// Raw little-endian PCM bytes, as sent for `audio/l16`.
pub fn samples_to_bytes(samples: &[i16]) -> Vec<u8> {
    samples.iter().flat_map(|s| s.to_le_bytes()).collect()
}

/// A complete WAV file in memory.
pub fn wav_bytes(samples: &[i16]) -> Vec<u8> {
    let spec = hound::WavSpec {
        channels: 1,
        sample_rate: SAMPLE_RATE,
        bits_per_sample: 16,
        sample_format: hound::SampleFormat::Int,
    };

    let mut cursor = Cursor::new(Vec::new());
    {
        let mut writer = hound::WavWriter::new(&mut cursor, spec).unwrap();
        for &sample in samples {
            writer.write_sample(sample).unwrap();
        }
        writer.finalize().unwrap();
    }
    cursor.into_inner()
}

/// Write `samples` as `name` under `dir` and return the path.
pub fn write_wav(dir: &Path, name: &str, samples: &[i16]) -> PathBuf {
    let path = dir.join(name);
    std::fs::write(&path, wav_bytes(samples)).unwrap();
    path
}
