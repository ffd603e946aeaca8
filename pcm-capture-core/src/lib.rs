//! # pcm-capture-core
//!
//! Platform-agnostic PCM capture library.
//!
//! Pulls 16-bit samples from a live [`AudioSource`], streams them to a raw
//! file on a dedicated thread while publishing RMS levels, and packages the
//! finished raw file as a canonical 44-byte-header WAVE file.
//! Platform backends (Windows WASAPI) implement `AudioSource` and plug into
//! the generic [`CaptureWriter`].
//!
//! ## Architecture
//!
//! ```text
//! pcm-capture-core (this crate)
//! ├── traits/       ← AudioSource, CaptureDelegate
//! ├── models/       ← CaptureError, CaptureState, CaptureConfiguration, AudioLevels, etc.
//! ├── processing/   ← level metering, RingBuffer, WAV header generation/parsing
//! ├── session/      ← CaptureWriter (capture thread), Recorder, channel events
//! ├── sources/      ← ScriptedSource
//! └── storage/      ← RawSampleWriter, WaveEncoder, metadata sidecar
//! ```

pub mod models;
pub mod processing;
pub mod session;
pub mod sources;
pub mod storage;
pub mod traits;

// Re-export key types at crate root for convenience.
pub use models::audio_models::{
    AudioDevice, AudioLevels, AudioTransportType, ByteOrder, CaptureStats, ChannelConfig, SampleEncoding,
};
pub use models::config::CaptureConfiguration;
pub use models::error::{CaptureError, ErrorKind};
pub use models::recording_result::{CaptureSummary, RecordingMetadata, RecordingResult};
pub use models::session::CaptureSession;
pub use models::state::CaptureState;
pub use processing::ring_buffer::RingBuffer;
pub use session::capture_writer::CaptureWriter;
pub use session::events::{CaptureEvent, ChannelDelegate};
pub use session::recorder::{Recorder, RecordingPaths};
pub use sources::scripted::{ScriptMonitor, ScriptedSource};
pub use storage::raw_writer::RawSampleWriter;
pub use storage::wave_encoder::WaveEncoder;
pub use traits::audio_source::AudioSource;
pub use traits::capture_delegate::CaptureDelegate;
