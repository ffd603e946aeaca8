use crate::models::audio_models::AudioLevels;
use crate::models::error::CaptureError;
use crate::models::recording_result::{CaptureSummary, RecordingResult};
use crate::models::state::CaptureState;

/// Presentation sink for capture notifications.
///
/// Level, error and capture-finished callbacks fire on the capture thread;
/// state changes fire on whichever thread caused them. Implementations that
/// drive a UI should marshal to the UI thread themselves.
pub trait CaptureDelegate: Send + Sync {
    /// Called when the writer state changes.
    fn on_state_changed(&self, state: &CaptureState);

    /// Called after every non-empty buffer has been queued for writing, and
    /// once with zero levels when the capture loop exits.
    fn on_levels_updated(&self, levels: &AudioLevels);

    /// Called once per failure. `error.kind()` gives the category.
    fn on_error(&self, error: &CaptureError);

    /// Called when the capture loop has exited cleanly and the raw file is closed.
    fn on_capture_finished(&self, summary: &CaptureSummary);

    /// Called when a WAVE file has been produced from a raw capture.
    fn on_recording_ready(&self, result: &RecordingResult);
}
