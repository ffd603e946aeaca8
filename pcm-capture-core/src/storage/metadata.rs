use std::fs;
use std::path::{Path, PathBuf};

use crate::models::error::CaptureError;
use crate::models::recording_result::RecordingMetadata;

/// Path of the JSON sidecar for a recording: `{stem}.metadata.json`.
pub fn metadata_path(recording_path: &Path) -> PathBuf {
    recording_path.with_extension("metadata.json")
}

/// Write recording metadata as a JSON sidecar file.
pub fn write_metadata(metadata: &RecordingMetadata, recording_path: &Path) -> Result<PathBuf, CaptureError> {
    let path = metadata_path(recording_path);
    let json = serde_json::to_string_pretty(metadata)
        .map_err(|e| CaptureError::Format(format!("failed to serialize metadata: {}", e)))?;
    fs::write(&path, json).map_err(|e| CaptureError::Io(format!("failed to write metadata: {}", e)))?;
    Ok(path)
}

/// Read recording metadata from a JSON sidecar file.
pub fn read_metadata(recording_path: &Path) -> Result<RecordingMetadata, CaptureError> {
    let path = metadata_path(recording_path);
    let json = fs::read_to_string(&path).map_err(|e| CaptureError::Io(format!("failed to read metadata: {}", e)))?;
    serde_json::from_str(&json).map_err(|e| CaptureError::Format(format!("failed to parse metadata: {}", e)))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sidecar_roundtrip() {
        let dir = tempfile::tempdir().unwrap();
        let wave_path = dir.path().join("conversation.wav");
        let meta = RecordingMetadata::new_pcm(&wave_path.to_string_lossy(), "abc", 16_000, 1, 16, 20);

        let written = write_metadata(&meta, &wave_path).unwrap();
        assert_eq!(written, dir.path().join("conversation.metadata.json"));
        assert_eq!(read_metadata(&wave_path).unwrap(), meta);
    }

    #[test]
    fn corrupt_sidecar_is_format_error() {
        let dir = tempfile::tempdir().unwrap();
        let wave_path = dir.path().join("x.wav");
        fs::write(metadata_path(&wave_path), "{ not json").unwrap();
        assert!(matches!(read_metadata(&wave_path), Err(CaptureError::Format(_))));
    }
}
