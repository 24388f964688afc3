//! Audio duration estimation with an ordered fallback chain.
//!
//! Recordings arrive in whatever container the client produced. Each
//! estimator tries one way of reading the length; the chain returns the first
//! usable answer and falls back to 0.0 (duration unavailable) otherwise.

use std::io::Cursor;

use symphonia::core::codecs::{DecoderOptions, CODEC_TYPE_NULL};
use symphonia::core::errors::Error as SymphoniaError;
use symphonia::core::formats::{FormatOptions, FormatReader, Track};
use symphonia::core::io::MediaSourceStream;
use symphonia::core::meta::MetadataOptions;
use symphonia::core::probe::Hint;
use thiserror::Error;
use tracing::{debug, warn};

/// Capture format of the streaming endpoint: 16 kHz mono 16-bit PCM.
pub const CAPTURE_SAMPLE_RATE: u32 = 16_000;

#[derive(Error, Debug)]
pub enum AudioError {
    #[error("probe failed: {0}")]
    Probe(#[source] SymphoniaError),
    #[error("no audio track found")]
    NoTrack,
    #[error("decode failed: {0}")]
    Decode(#[source] SymphoniaError),
    #[error("no audio data")]
    Empty,
    #[error("stream length unknown")]
    UnknownLength,
    #[error("not raw PCM: {0}")]
    NotPcm(&'static str),
}

/// One way of finding out how long a recording is.
pub trait DurationEstimator: Send + Sync {
    fn name(&self) -> &'static str;

    /// Duration in seconds.
    fn estimate(&self, audio: &[u8]) -> Result<f64, AudioError>;
}

fn open(audio: &[u8]) -> Result<Box<dyn FormatReader>, AudioError> {
    if audio.is_empty() {
        return Err(AudioError::Empty);
    }

    let mss = MediaSourceStream::new(Box::new(Cursor::new(audio.to_vec())), Default::default());
    let probed = symphonia::default::get_probe()
        .format(
            &Hint::new(),
            mss,
            &FormatOptions::default(),
            &MetadataOptions::default(),
        )
        .map_err(AudioError::Probe)?;

    Ok(probed.format)
}

fn first_audio_track(format: &dyn FormatReader) -> Result<Track, AudioError> {
    format
        .tracks()
        .iter()
        .find(|t| t.codec_params.codec != CODEC_TYPE_NULL)
        .cloned()
        .ok_or(AudioError::NoTrack)
}

/// Reads the frame count and sample rate from the container header.
#[derive(Debug, Default, Clone, Copy)]
pub struct ContainerHeaderEstimator;

impl DurationEstimator for ContainerHeaderEstimator {
    fn name(&self) -> &'static str {
        "container-header"
    }

    fn estimate(&self, audio: &[u8]) -> Result<f64, AudioError> {
        let format = open(audio)?;
        let track = first_audio_track(format.as_ref())?;

        match (track.codec_params.n_frames, track.codec_params.sample_rate) {
            (Some(frames), Some(rate)) if rate > 0 => Ok(frames as f64 / f64::from(rate)),
            _ => Err(AudioError::UnknownLength),
        }
    }
}

/// Decodes every packet of the first audio track and counts frames.
#[derive(Debug, Default, Clone, Copy)]
pub struct PacketDecodeEstimator;

impl DurationEstimator for PacketDecodeEstimator {
    fn name(&self) -> &'static str {
        "packet-decode"
    }

    fn estimate(&self, audio: &[u8]) -> Result<f64, AudioError> {
        let mut format = open(audio)?;
        let track = first_audio_track(format.as_ref())?;
        let track_id = track.id;

        let mut decoder = symphonia::default::get_codecs()
            .make(&track.codec_params, &DecoderOptions::default())
            .map_err(AudioError::Decode)?;

        let mut frames: u64 = 0;
        let mut rate = track.codec_params.sample_rate;

        loop {
            let packet = match format.next_packet() {
                Ok(p) => p,
                Err(SymphoniaError::IoError(ref e))
                    if e.kind() == std::io::ErrorKind::UnexpectedEof =>
                {
                    break;
                }
                Err(e) => return Err(AudioError::Decode(e)),
            };

            if packet.track_id() != track_id {
                continue;
            }

            match decoder.decode(&packet) {
                Ok(decoded) => {
                    frames += decoded.frames() as u64;
                    rate = rate.or(Some(decoded.spec().rate));
                }
                // Corrupt packet: skip it and keep counting
                Err(SymphoniaError::DecodeError(msg)) => {
                    debug!(msg, "skipping undecodable packet");
                }
                Err(e) => return Err(AudioError::Decode(e)),
            }
        }

        match rate {
            Some(rate) if rate > 0 && frames > 0 => Ok(frames as f64 / f64::from(rate)),
            _ => Err(AudioError::UnknownLength),
        }
    }
}

/// Name of the container or format whose signature starts `audio`.
pub fn container_signature(audio: &[u8]) -> Option<&'static str> {
    match audio {
        [b'R', b'I', b'F', b'F', ..] => Some("RIFF"),
        [0x1A, 0x45, 0xDF, 0xA3, ..] => Some("EBML (WebM/Matroska)"),
        [b'O', b'g', b'g', b'S', ..] => Some("Ogg"),
        [b'f', b'L', b'a', b'C', ..] => Some("FLAC"),
        [b'I', b'D', b'3', ..] => Some("ID3"),
        [_, _, _, _, b'f', b't', b'y', b'p', ..] => Some("MP4"),
        // ADTS: 12 sync bits, layer 00
        [0xFF, b1, ..] if b1 & 0xF6 == 0xF0 => Some("ADTS"),
        // MPEG audio frame header with valid layer, bitrate and rate fields
        [0xFF, b1, b2, ..]
            if b1 & 0xE0 == 0xE0
                && (b1 >> 1) & 0x03 != 0
                && b2 >> 4 != 0x0F
                && b2 >> 4 != 0
                && (b2 >> 2) & 0x03 != 0x03 =>
        {
            Some("MPEG audio")
        }
        _ => None,
    }
}

/// Text with no control characters besides whitespace. Captured PCM always
/// holds control bytes (quiet samples are near zero).
fn looks_like_text(audio: &[u8]) -> bool {
    match std::str::from_utf8(audio) {
        Ok(text) => text.chars().all(|c| !c.is_control() || c.is_whitespace()),
        Err(_) => false,
    }
}

/// Treats the bytes as headerless PCM. Data that starts with a container
/// signature or reads as text is rejected.
#[derive(Debug, Clone, Copy)]
pub struct RawPcmEstimator {
    pub sample_rate: u32,
    pub channels: u16,
    pub bytes_per_sample: u16,
}

impl Default for RawPcmEstimator {
    fn default() -> Self {
        Self {
            sample_rate: CAPTURE_SAMPLE_RATE,
            channels: 1,
            bytes_per_sample: 2,
        }
    }
}

impl DurationEstimator for RawPcmEstimator {
    fn name(&self) -> &'static str {
        "raw-pcm"
    }

    fn estimate(&self, audio: &[u8]) -> Result<f64, AudioError> {
        let frame_bytes = usize::from(self.channels) * usize::from(self.bytes_per_sample);
        if frame_bytes == 0 || self.sample_rate == 0 {
            return Err(AudioError::UnknownLength);
        }

        let frames = audio.len() / frame_bytes;
        if frames == 0 {
            return Err(AudioError::Empty);
        }

        if let Some(container) = container_signature(audio) {
            return Err(AudioError::NotPcm(container));
        }
        if looks_like_text(audio) {
            return Err(AudioError::NotPcm("text"));
        }

        Ok(frames as f64 / f64::from(self.sample_rate))
    }
}

/// Estimators tried in order until one gives a usable duration.
pub struct FallbackChain {
    estimators: Vec<Box<dyn DurationEstimator>>,
}

impl FallbackChain {
    pub fn new(estimators: Vec<Box<dyn DurationEstimator>>) -> Self {
        Self { estimators }
    }

    /// Header, then full decode, then raw capture-format PCM.
    pub fn standard() -> Self {
        Self::new(vec![
            Box::new(ContainerHeaderEstimator),
            Box::new(PacketDecodeEstimator),
            Box::new(RawPcmEstimator::default()),
        ])
    }

    pub fn len(&self) -> usize {
        self.estimators.len()
    }

    pub fn is_empty(&self) -> bool {
        self.estimators.is_empty()
    }

    /// Duration in seconds, or 0.0 when no estimator succeeds.
    pub fn estimate(&self, audio: &[u8]) -> f64 {
        match self.estimate_detailed(audio) {
            Some((_, seconds)) => seconds,
            None => {
                warn!(bytes = audio.len(), "audio duration unavailable, using 0.0");
                0.0
            }
        }
    }

    /// Duration together with the name of the estimator that produced it.
    pub fn estimate_detailed(&self, audio: &[u8]) -> Option<(&'static str, f64)> {
        for estimator in &self.estimators {
            match estimator.estimate(audio) {
                Ok(seconds) if seconds.is_finite() && seconds > 0.0 => {
                    debug!(estimator = estimator.name(), seconds, "audio duration estimated");
                    return Some((estimator.name(), seconds));
                }
                Ok(seconds) => {
                    warn!(estimator = estimator.name(), seconds, "unusable duration, trying next");
                }
                Err(e) => {
                    warn!(estimator = estimator.name(), error = %e, "duration estimator failed");
                }
            }
        }
        None
    }
}

impl Default for FallbackChain {
    fn default() -> Self {
        Self::standard()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Minimal PCM WAV file of silence.
    fn generate_test_wav(sample_rate: u32, channels: u16, num_frames: u32) -> Vec<u8> {
        let bits_per_sample: u16 = 16;
        let byte_rate = sample_rate * u32::from(channels) * u32::from(bits_per_sample) / 8;
        let block_align = channels * bits_per_sample / 8;
        let data_size = num_frames * u32::from(channels) * u32::from(bits_per_sample) / 8;

        let mut buf = Vec::with_capacity(data_size as usize + 44);
        buf.extend_from_slice(b"RIFF");
        buf.extend_from_slice(&(36 + data_size).to_le_bytes());
        buf.extend_from_slice(b"WAVE");
        buf.extend_from_slice(b"fmt ");
        buf.extend_from_slice(&16u32.to_le_bytes());
        buf.extend_from_slice(&1u16.to_le_bytes()); // PCM
        buf.extend_from_slice(&channels.to_le_bytes());
        buf.extend_from_slice(&sample_rate.to_le_bytes());
        buf.extend_from_slice(&byte_rate.to_le_bytes());
        buf.extend_from_slice(&block_align.to_le_bytes());
        buf.extend_from_slice(&bits_per_sample.to_le_bytes());
        buf.extend_from_slice(b"data");
        buf.extend_from_slice(&data_size.to_le_bytes());
        buf.resize(buf.len() + data_size as usize, 0);
        buf
    }

    struct Fixed(Result<f64, ()>);

    impl DurationEstimator for Fixed {
        fn name(&self) -> &'static str {
            "fixed"
        }

        fn estimate(&self, _audio: &[u8]) -> Result<f64, AudioError> {
            self.0.map_err(|_| AudioError::UnknownLength)
        }
    }

    #[test]
    fn test_header_estimator_wav() {
        let wav = generate_test_wav(16_000, 1, 16_000);
        let seconds = ContainerHeaderEstimator.estimate(&wav).unwrap();
        assert!((seconds - 1.0).abs() < 1e-6);
    }

    #[test]
    fn test_decode_estimator_wav() {
        let wav = generate_test_wav(44_100, 2, 22_050);
        let seconds = PacketDecodeEstimator.estimate(&wav).unwrap();
        assert!((seconds - 0.5).abs() < 1e-3, "got {seconds}");
    }

    #[test]
    fn test_symphonia_rejects_garbage() {
        assert!(ContainerHeaderEstimator.estimate(b"not audio data").is_err());
        assert!(PacketDecodeEstimator.estimate(b"not audio data").is_err());
        assert!(matches!(
            ContainerHeaderEstimator.estimate(b""),
            Err(AudioError::Empty)
        ));
    }

    #[test]
    fn test_raw_pcm_capture_format() {
        // 32000 bytes = 16000 frames of mono 16-bit = 1s
        let seconds = RawPcmEstimator::default().estimate(&vec![0u8; 32_000]).unwrap();
        assert!((seconds - 1.0).abs() < 1e-9);
        assert!(RawPcmEstimator::default().estimate(&[0u8]).is_err());
    }

    #[test]
    fn test_raw_pcm_rejects_containers_and_text() {
        let mut webm = vec![0x1A, 0x45, 0xDF, 0xA3];
        webm.resize(20_000, 0);
        assert!(matches!(
            RawPcmEstimator::default().estimate(&webm),
            Err(AudioError::NotPcm(_))
        ));

        let mut ogg = b"OggS".to_vec();
        ogg.resize(4_000, 7);
        assert!(RawPcmEstimator::default().estimate(&ogg).is_err());

        let text = "not audio, just a text upload. ".repeat(100);
        assert!(matches!(
            RawPcmEstimator::default().estimate(text.as_bytes()),
            Err(AudioError::NotPcm("text"))
        ));
    }

    #[test]
    fn test_raw_pcm_accepts_near_silence() {
        // Samples of -1 start with 0xFF 0xFF, which is not a valid frame header.
        let seconds = RawPcmEstimator::default().estimate(&vec![0xFFu8; 16_000]).unwrap();
        assert!((seconds - 0.5).abs() < 1e-9);
    }

    #[test]
    fn test_container_signatures() {
        assert_eq!(container_signature(b"RIFF\0\0\0\0WAVE"), Some("RIFF"));
        assert_eq!(container_signature(b"\0\0\0\x20ftypisom"), Some("MP4"));
        assert_eq!(container_signature(b"ID3\x04"), Some("ID3"));
        assert_eq!(container_signature(&[0xFF, 0xF1, 0x50, 0x80]), Some("ADTS"));
        assert_eq!(container_signature(&[0xFF, 0xFB, 0x90, 0x64]), Some("MPEG audio"));
        assert_eq!(container_signature(&[0xFF, 0xFF, 0xFF, 0xFF]), None);
        assert_eq!(container_signature(&[0, 0, 1, 0]), None);
    }

    #[test]
    fn test_chain_unknown_container_is_zero() {
        let mut webm = vec![0x1A, 0x45, 0xDF, 0xA3];
        webm.resize(20_000, 0);
        assert_eq!(FallbackChain::standard().estimate_detailed(&webm), None);
        assert_eq!(FallbackChain::standard().estimate(&webm), 0.0);

        let text = "plain text ".repeat(300);
        assert_eq!(FallbackChain::standard().estimate(text.as_bytes()), 0.0);
    }

    #[test]
    fn test_chain_prefers_header() {
        let wav = generate_test_wav(16_000, 1, 8_000);
        let (name, seconds) = FallbackChain::standard().estimate_detailed(&wav).unwrap();
        assert_eq!(name, "container-header");
        assert!((seconds - 0.5).abs() < 1e-6);
    }

    #[test]
    fn test_chain_falls_back_to_raw_pcm() {
        let raw = vec![1u8; 48_000];
        let (name, seconds) = FallbackChain::standard().estimate_detailed(&raw).unwrap();
        assert_eq!(name, "raw-pcm");
        assert!((seconds - 1.5).abs() < 1e-9);
    }

    #[test]
    fn test_chain_skips_unusable_values() {
        let chain = FallbackChain::new(vec![
            Box::new(Fixed(Ok(f64::NAN))),
            Box::new(Fixed(Ok(-2.0))),
            Box::new(Fixed(Err(()))),
            Box::new(Fixed(Ok(3.0))),
        ]);
        assert!((chain.estimate(b"x") - 3.0).abs() < 1e-9);
    }

    #[test]
    fn test_chain_exhausted_is_zero() {
        assert_eq!(FallbackChain::standard().estimate(b""), 0.0);
        assert_eq!(FallbackChain::new(Vec::new()).estimate(b"abc"), 0.0);
    }
}
