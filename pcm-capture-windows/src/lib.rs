//! # pcm-capture-windows
//!
//! Windows WASAPI backend for pcm-capture.
//!
//! Provides:
//! - `WasapiMicSource`: microphone [`AudioSource`](pcm_capture_core::AudioSource) via a WASAPI capture endpoint
//! - `DeviceEnumerator`: capture device enumeration via the MMDevice API
//!
//! ## Usage
//! ```ignore
//! use pcm_capture_core::{CaptureConfiguration, Recorder, RecordingPaths};
//! use pcm_capture_windows::WasapiMicSource;
//!
//! let mut recorder = Recorder::new(WasapiMicSource::default_device(), CaptureConfiguration::default())?;
//! let paths = RecordingPaths::single_slot(&recordings_dir);
//! recorder.toggle(&paths)?; // start
//! recorder.toggle(&paths)?; // stop and encode conversation.wav
//! ```

#[cfg(target_os = "windows")]
pub mod device_enumerator;
#[cfg(target_os = "windows")]
pub mod wasapi_mic;

#[cfg(target_os = "windows")]
pub use device_enumerator::DeviceEnumerator;
#[cfg(target_os = "windows")]
pub use wasapi_mic::WasapiMicSource;
