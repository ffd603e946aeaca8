use std::path::{Path, PathBuf};
use std::sync::Arc;

use crate::models::config::CaptureConfiguration;
use crate::models::error::CaptureError;
use crate::models::recording_result::{CaptureSummary, RecordingResult};
use crate::models::session::CaptureSession;
use crate::session::capture_writer::CaptureWriter;
use crate::storage::metadata;
use crate::storage::wave_encoder::WaveEncoder;
use crate::traits::audio_source::AudioSource;
use crate::traits::capture_delegate::CaptureDelegate;

/// Raw and WAVE destinations for one recording.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecordingPaths {
    pub raw: PathBuf,
    pub wave: PathBuf,
}

impl RecordingPaths {
    /// Stem used by [`single_slot`](Self::single_slot).
    pub const DEFAULT_STEM: &'static str = "conversation";

    pub fn new(raw: impl Into<PathBuf>, wave: impl Into<PathBuf>) -> Self {
        Self {
            raw: raw.into(),
            wave: wave.into(),
        }
    }

    /// `{dir}/{stem}.raw` and `{dir}/{stem}.wav`.
    pub fn in_directory(dir: &Path, stem: &str) -> Self {
        Self {
            raw: dir.join(format!("{}.raw", stem)),
            wave: dir.join(format!("{}.wav", stem)),
        }
    }

    /// Fixed `conversation.raw` / `conversation.wav` pair; each recording
    /// overwrites the previous one.
    pub fn single_slot(dir: &Path) -> Self {
        Self::in_directory(dir, Self::DEFAULT_STEM)
    }
}

/// Control surface tying a [`CaptureWriter`] to a [`WaveEncoder`].
///
/// Sequences stop → join → encode so the encoder never reads a raw file
/// that the capture thread is still flushing.
pub struct Recorder<S: AudioSource + 'static> {
    writer: CaptureWriter<S>,
    encoder: WaveEncoder,
    delegate: Option<Arc<dyn CaptureDelegate>>,
    write_metadata: bool,
}

impl<S: AudioSource + 'static> Recorder<S> {
    pub fn new(source: S, config: CaptureConfiguration) -> Result<Self, CaptureError> {
        let encoder = WaveEncoder::from_config(&config);
        let write_metadata = config.write_metadata;
        Ok(Self {
            writer: CaptureWriter::new(source, config)?,
            encoder,
            delegate: None,
            write_metadata,
        })
    }

    pub fn set_delegate(&mut self, delegate: Arc<dyn CaptureDelegate>) {
        self.writer.set_delegate(Arc::clone(&delegate));
        self.delegate = Some(delegate);
    }

    pub fn writer(&self) -> &CaptureWriter<S> {
        &self.writer
    }

    pub fn encoder(&self) -> &WaveEncoder {
        &self.encoder
    }

    pub fn is_capturing(&self) -> bool {
        self.writer.is_active()
    }

    pub fn start_capture(&mut self, raw_path: impl AsRef<Path>) -> Result<CaptureSession, CaptureError> {
        self.writer.start(raw_path)
    }

    /// Stop capturing and wait until the raw file is flushed and closed.
    pub fn stop_capture(&mut self) -> Result<CaptureSummary, CaptureError> {
        self.writer.stop_and_wait()
    }

    /// Encode a finished raw file, writing the metadata sidecar if enabled.
    ///
    /// Both outcomes are also reported to the delegate. Failing to write the
    /// sidecar is logged and does not fail the recording.
    pub fn encode(&self, raw_path: &Path, wave_path: &Path) -> Result<RecordingResult, CaptureError> {
        match self.encode_inner(raw_path, wave_path) {
            Ok(result) => {
                if let Some(ref d) = self.delegate {
                    d.on_recording_ready(&result);
                }
                Ok(result)
            }
            Err(e) => {
                log::error!("Encoding {} failed: {}", raw_path.display(), e);
                if let Some(ref d) = self.delegate {
                    d.on_error(&e);
                }
                Err(e)
            }
        }
    }

    /// Stop the running capture and encode its raw file to `wave_path`.
    pub fn finish_recording(&mut self, wave_path: &Path) -> Result<RecordingResult, CaptureError> {
        let summary = self.stop_capture()?;
        self.encode(&summary.raw_path, wave_path)
    }

    /// Start a recording when idle, otherwise finish the current one.
    ///
    /// Returns the encoded result when a recording was finished.
    pub fn toggle(&mut self, paths: &RecordingPaths) -> Result<Option<RecordingResult>, CaptureError> {
        if self.is_capturing() {
            self.finish_recording(&paths.wave).map(Some)
        } else {
            self.start_capture(&paths.raw).map(|_| None)
        }
    }

    pub fn close_source(&mut self) -> Result<(), CaptureError> {
        self.writer.close_source()
    }

    fn encode_inner(&self, raw_path: &Path, wave_path: &Path) -> Result<RecordingResult, CaptureError> {
        if self.writer.is_active() {
            if let Some(session) = self.writer.session() {
                if session.destination == raw_path {
                    return Err(CaptureError::InvalidState(format!(
                        "{} is still being captured",
                        raw_path.display()
                    )));
                }
            }
        }

        let result = self.encoder.encode(raw_path, wave_path)?;
        // The WAVE file is complete at this point; a missing sidecar does not invalidate it.
        if self.write_metadata {
            match metadata::write_metadata(&result.metadata, &result.file_path) {
                Ok(sidecar) => log::debug!("Wrote metadata sidecar {}", sidecar.display()),
                Err(e) => log::warn!("Recording {} has no metadata sidecar: {}", wave_path.display(), e),
            }
        }
        Ok(result)
    }
}
