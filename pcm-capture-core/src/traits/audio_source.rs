use crate::models::audio_models::{AudioDevice, ChannelConfig, SampleEncoding};
use crate::models::error::CaptureError;

/// A live, pull-based source of PCM samples (typically a microphone).
///
/// Implemented by:
/// - `ScriptedSource` (replays predetermined buffers)
/// - `WasapiMicSource` (Windows, in `pcm-capture-windows`)
///
/// `read` is called from the capture thread, so implementations must be
/// `Send`. `open` and `close` are called from the control thread while no
/// capture loop is running.
pub trait AudioSource: Send {
    /// Acquire the device in the requested format.
    ///
    /// Fails with [`CaptureError::Resource`] if the device is busy or missing.
    fn open(
        &mut self,
        sample_rate: u32,
        channels: ChannelConfig,
        encoding: SampleEncoding,
    ) -> Result<(), CaptureError>;

    /// Block until samples are available and copy up to `buffer.len()` of them
    /// into the front of `buffer`, returning how many were written.
    ///
    /// Returning `Ok(0)` is a transient condition, not end of stream: a live
    /// device never ends on its own.
    fn read(&mut self, buffer: &mut [i16]) -> Result<usize, CaptureError>;

    /// Release the device. Closing an unopened source is a no-op.
    fn close(&mut self) -> Result<(), CaptureError>;

    /// Information about the device backing this source.
    fn device_info(&self) -> AudioDevice;
}
