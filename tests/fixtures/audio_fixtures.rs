//! Audio Test Fixtures
//!
//! Programmatically generated audio so tests never depend on checked-in
//! recordings.
//!
//! Audio formats:
//! - Sample rate: 16kHz unless stated otherwise
//! - Bit depth: 16-bit signed PCM
//! - Container: WAV (via `hound`)

use std::f32::consts::PI;
use std::io::Cursor;

/// Standard sample rate for Whisper (16kHz)
pub const SAMPLE_RATE: u32 = 16000;

/// Duration constants (in samples at 16kHz)
pub const MS_500: usize = 8000;
pub const SECOND: usize = 16000;

/// Generate silence (zeros)
pub fn generate_silence(duration_samples: usize) -> Vec<i16> {
    vec![0i16; duration_samples]
}

/// Generate a sine wave tone at `sample_rate`
pub fn generate_sine_wave(
    duration_samples: usize,
    frequency: f32,
    amplitude: f32,
    sample_rate: u32,
) -> Vec<i16> {
    let max_amplitude = amplitude * i16::MAX as f32;
    let angular_freq = 2.0 * PI * frequency / sample_rate as f32;

    (0..duration_samples)
        .map(|i| ((angular_freq * i as f32).sin() * max_amplitude) as i16)
        .collect()
}

/// Encode interleaved samples as a 16-bit PCM WAV file
pub fn wav_bytes(samples: &[i16], sample_rate: u32, channels: u16) -> Vec<u8> {
    let spec = hound::WavSpec {
        channels,
        sample_rate,
        bits_per_sample: 16,
        sample_format: hound::SampleFormat::Int,
    };

    let mut cursor = Cursor::new(Vec::new());
    {
        let mut writer = hound::WavWriter::new(&mut cursor, spec).expect("wav writer");
        for &sample in samples {
            writer.write_sample(sample).expect("write sample");
        }
        writer.finalize().expect("finalize wav");
    }
    cursor.into_inner()
}

/// Half a second of 440 Hz tone as a mono 16kHz WAV
pub fn short_tone_wav() -> Vec<u8> {
    wav_bytes(
        &generate_sine_wave(MS_500, 440.0, 0.5, SAMPLE_RATE),
        SAMPLE_RATE,
        1,
    )
}

/// One second of stereo 44.1kHz tone, exercising downmix and resampling
pub fn stereo_cd_quality_wav() -> Vec<u8> {
    let mono = generate_sine_wave(44_100, 440.0, 0.5, 44_100);
    let interleaved: Vec<i16> = mono.iter().flat_map(|&s| [s, s]).collect();
    wav_bytes(&interleaved, 44_100, 2)
}
