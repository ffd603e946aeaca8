use std::fs::{self, File};
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};

use crate::models::audio_models::ByteOrder;
use crate::models::error::CaptureError;

/// Buffered sequential writer for headerless 16-bit sample files.
///
/// Owned by the capture thread for the lifetime of a session. Samples are
/// appended in the order given; nothing is ever rewritten, so a failure
/// part-way leaves the samples written so far on disk.
pub struct RawSampleWriter {
    file_path: PathBuf,
    byte_order: ByteOrder,
    writer: Option<BufWriter<File>>,
    scratch: Vec<u8>,
    samples_written: u64,
}

impl RawSampleWriter {
    /// Create or truncate `file_path` for writing.
    pub fn create(file_path: &Path, byte_order: ByteOrder) -> Result<Self, CaptureError> {
        if let Some(parent) = file_path.parent() {
            if !parent.as_os_str().is_empty() && !parent.exists() {
                fs::create_dir_all(parent)
                    .map_err(|e| CaptureError::Io(format!("failed to create directory: {}", e)))?;
            }
        }

        let file = File::create(file_path).map_err(|e| {
            CaptureError::Io(format!("failed to create raw file {}: {}", file_path.display(), e))
        })?;

        Ok(Self {
            file_path: file_path.to_path_buf(),
            byte_order,
            writer: Some(BufWriter::new(file)),
            scratch: Vec::new(),
            samples_written: 0,
        })
    }

    /// Queue `samples` for writing, each encoded as two bytes.
    pub fn write_samples(&mut self, samples: &[i16]) -> Result<(), CaptureError> {
        let writer = self
            .writer
            .as_mut()
            .ok_or_else(|| CaptureError::InvalidState("raw file is closed".into()))?;

        self.scratch.clear();
        self.scratch.reserve(samples.len() * 2);
        for &sample in samples {
            self.scratch.extend_from_slice(&self.byte_order.encode(sample));
        }

        writer
            .write_all(&self.scratch)
            .map_err(|e| CaptureError::Io(format!("write failed: {}", e)))?;
        self.samples_written += samples.len() as u64;
        Ok(())
    }

    /// Flush buffered samples and close the file.
    ///
    /// The file is closed even if the flush fails. Returns the number of
    /// bytes handed to the file.
    pub fn finish(&mut self) -> Result<u64, CaptureError> {
        let mut writer = self
            .writer
            .take()
            .ok_or_else(|| CaptureError::InvalidState("raw file is already closed".into()))?;
        writer
            .flush()
            .map_err(|e| CaptureError::Io(format!("flush failed: {}", e)))?;
        Ok(self.bytes_written())
    }

    pub fn samples_written(&self) -> u64 {
        self.samples_written
    }

    pub fn bytes_written(&self) -> u64 {
        self.samples_written * 2
    }

    pub fn file_path(&self) -> &Path {
        &self.file_path
    }

    pub fn is_open(&self) -> bool {
        self.writer.is_some()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn writes_samples_in_order() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("capture.raw");

        let mut writer = RawSampleWriter::create(&path, ByteOrder::Little).unwrap();
        writer.write_samples(&[1, -2]).unwrap();
        writer.write_samples(&[0x0102]).unwrap();
        assert_eq!(writer.finish().unwrap(), 6);
        assert!(!writer.is_open());

        let data = fs::read(&path).unwrap();
        assert_eq!(data, vec![0x01, 0x00, 0xFE, 0xFF, 0x02, 0x01]);
    }

    #[test]
    fn big_endian_order() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("capture.raw");

        let mut writer = RawSampleWriter::create(&path, ByteOrder::Big).unwrap();
        writer.write_samples(&[0x0102]).unwrap();
        writer.finish().unwrap();

        assert_eq!(fs::read(&path).unwrap(), vec![0x01, 0x02]);
    }

    #[test]
    fn create_truncates_existing_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("capture.raw");
        fs::write(&path, [9u8; 100]).unwrap();

        let mut writer = RawSampleWriter::create(&path, ByteOrder::Native).unwrap();
        writer.write_samples(&[7]).unwrap();
        writer.finish().unwrap();

        assert_eq!(fs::read(&path).unwrap().len(), 2);
    }

    #[test]
    fn create_makes_missing_parent_directories() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("deeper").join("capture.raw");

        let mut writer = RawSampleWriter::create(&path, ByteOrder::Native).unwrap();
        writer.finish().unwrap();
        assert!(path.exists());
    }

    #[test]
    fn create_fails_when_path_is_a_directory() {
        let dir = tempfile::tempdir().unwrap();
        let err = RawSampleWriter::create(dir.path(), ByteOrder::Native).err().unwrap();
        assert!(matches!(err, CaptureError::Io(_)));
    }

    #[test]
    fn write_after_finish_is_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("capture.raw");

        let mut writer = RawSampleWriter::create(&path, ByteOrder::Native).unwrap();
        writer.finish().unwrap();
        assert!(matches!(writer.write_samples(&[1]), Err(CaptureError::InvalidState(_))));
        assert!(matches!(writer.finish(), Err(CaptureError::InvalidState(_))));
    }
}
