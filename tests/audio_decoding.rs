//! Decoding uploaded containers into 16kHz mono PCM.
#![cfg(feature = "local-whisper")]

mod fixtures;

use tempfile::TempDir;

use fixtures::{SAMPLE_RATE, SECOND, short_tone_wav, stereo_cd_quality_wav, wav_bytes};
use voxchat_gateway::core::SttError;
use voxchat_gateway::core::stt::whisper::{TARGET_SAMPLE_RATE, decode_file_to_pcm};

fn write(dir: &TempDir, name: &str, bytes: &[u8]) -> std::path::PathBuf {
    let path = dir.path().join(name);
    std::fs::write(&path, bytes).unwrap();
    path
}

#[test]
fn test_mono_16k_wav_passes_through() {
    let dir = TempDir::new().unwrap();
    let path = write(&dir, "tone.wav", &short_tone_wav());

    let pcm = decode_file_to_pcm(&path).unwrap();
    assert_eq!(SAMPLE_RATE, TARGET_SAMPLE_RATE);
    assert_eq!(pcm.len(), SECOND / 2);
    assert!(pcm.iter().all(|s| (-1.0..=1.0).contains(s)));
    assert!(pcm.iter().any(|s| s.abs() > 0.1));
}

#[test]
fn test_stereo_44k_is_downmixed_and_resampled() {
    let dir = TempDir::new().unwrap();
    let path = write(&dir, "stereo.wav", &stereo_cd_quality_wav());

    let pcm = decode_file_to_pcm(&path).unwrap();
    // One second of audio at the target rate
    let expected = TARGET_SAMPLE_RATE as i64;
    assert!((pcm.len() as i64 - expected).abs() <= 1, "got {} samples", pcm.len());
}

#[test]
fn test_empty_wav_is_rejected() {
    let dir = TempDir::new().unwrap();
    let path = write(&dir, "empty.wav", &wav_bytes(&[], SAMPLE_RATE, 1));

    assert!(matches!(
        decode_file_to_pcm(&path),
        Err(SttError::AudioDecoding(_))
    ));
}

#[test]
fn test_wrong_extension_still_decodes() {
    let dir = TempDir::new().unwrap();
    let path = write(&dir, "actually-wav.mp3", &short_tone_wav());
    assert!(decode_file_to_pcm(&path).is_ok());
}
