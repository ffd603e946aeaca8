use std::path::{Path, PathBuf};

use super::config::CaptureConfiguration;

/// Description of a started capture session.
///
/// Returned by `CaptureWriter::start`; the session itself is driven by the
/// capture thread and ends on stop or on the first read/write failure.
#[derive(Debug, Clone, PartialEq)]
pub struct CaptureSession {
    pub id: String,
    pub destination: PathBuf,
    pub sample_rate: u32,
    pub channels: u16,
    pub bits_per_sample: u16,
    pub started_at: String,
}

impl CaptureSession {
    pub fn new(destination: &Path, config: &CaptureConfiguration) -> Self {
        Self {
            id: uuid::Uuid::new_v4().to_string(),
            destination: destination.to_path_buf(),
            sample_rate: config.sample_rate,
            channels: config.channel_count(),
            bits_per_sample: config.bits_per_sample(),
            started_at: chrono::Utc::now().to_rfc3339(),
        }
    }

    /// Bytes of raw payload per second of audio.
    pub fn byte_rate(&self) -> u64 {
        self.sample_rate as u64 * self.channels as u64 * self.bits_per_sample as u64 / 8
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::audio_models::ChannelConfig;

    #[test]
    fn session_carries_configured_format() {
        let config = CaptureConfiguration {
            sample_rate: 44_100,
            channels: ChannelConfig::Stereo,
            ..Default::default()
        };
        let session = CaptureSession::new(Path::new("/tmp/a.raw"), &config);
        assert_eq!(session.channels, 2);
        assert_eq!(session.byte_rate(), 176_400);
        assert!(!session.id.is_empty());
    }

    #[test]
    fn byte_rate_does_not_overflow() {
        let config = CaptureConfiguration {
            sample_rate: u32::MAX,
            channels: ChannelConfig::Stereo,
            ..Default::default()
        };
        let session = CaptureSession::new(Path::new("x.raw"), &config);
        assert_eq!(session.byte_rate(), u32::MAX as u64 * 4);
    }
}
