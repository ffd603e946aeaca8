use std::path::PathBuf;

use serde::{Deserialize, Serialize};

/// Outcome of a capture session once the capture thread has exited.
#[derive(Debug, Clone, PartialEq)]
pub struct CaptureSummary {
    pub session_id: String,
    pub raw_path: PathBuf,
    pub samples_written: u64,
    pub bytes_written: u64,
    pub duration_secs: f64,
}

/// Result returned when a raw file has been encoded into a WAVE file.
#[derive(Debug, Clone, PartialEq)]
pub struct RecordingResult {
    pub file_path: PathBuf,
    pub raw_path: PathBuf,
    pub duration_secs: f64,
    pub data_size: u32,
    pub checksum: String,
    pub metadata: RecordingMetadata,
}

/// Metadata stored alongside a WAVE recording.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RecordingMetadata {
    pub id: String,
    pub duration_secs: f64,
    pub file_path: String,
    pub checksum: String,
    pub created_at: String,
    pub sample_rate: u32,
    pub channels: u16,
    pub bits_per_sample: u16,
    pub data_size: u32,
}

impl RecordingMetadata {
    /// Creates metadata for a freshly encoded PCM recording.
    pub fn new_pcm(
        file_path: &str,
        checksum: &str,
        sample_rate: u32,
        channels: u16,
        bits_per_sample: u16,
        data_size: u32,
    ) -> Self {
        let byte_rate = sample_rate as u64 * channels as u64 * bits_per_sample as u64 / 8;
        let duration_secs = if byte_rate == 0 {
            0.0
        } else {
            data_size as f64 / byte_rate as f64
        };
        Self {
            id: uuid::Uuid::new_v4().to_string(),
            duration_secs,
            file_path: file_path.to_string(),
            checksum: checksum.to_string(),
            created_at: chrono::Utc::now().to_rfc3339(),
            sample_rate,
            channels,
            bits_per_sample,
            data_size,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn duration_follows_byte_rate() {
        let meta = RecordingMetadata::new_pcm("a.wav", "00", 16_000, 1, 16, 64_000);
        assert_relative_eq!(meta.duration_secs, 2.0);
        assert!(!meta.id.is_empty());
    }

    #[test]
    fn metadata_serializes_with_format_fields() {
        let meta = RecordingMetadata::new_pcm("a.wav", "ab", 16_000, 1, 16, 20);
        let json = serde_json::to_value(&meta).unwrap();
        assert_eq!(json["sample_rate"], 16_000);
        assert_eq!(json["data_size"], 20);
        assert_eq!(json["checksum"], "ab");
    }
}
