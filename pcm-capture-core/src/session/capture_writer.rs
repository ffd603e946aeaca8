use std::path::Path;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread;

use parking_lot::Mutex;

use crate::models::audio_models::{AudioDevice, AudioLevels, CaptureStats};
use crate::models::config::CaptureConfiguration;
use crate::models::error::CaptureError;
use crate::models::recording_result::CaptureSummary;
use crate::models::session::CaptureSession;
use crate::models::state::CaptureState;
use crate::storage::raw_writer::RawSampleWriter;
use crate::traits::audio_source::AudioSource;
use crate::traits::capture_delegate::CaptureDelegate;

/// Mutable session state shared with the capture thread.
struct SessionState {
    state: CaptureState,
    levels: AudioLevels,
    stats: CaptureStats,
}

impl SessionState {
    fn new() -> Self {
        Self {
            state: CaptureState::Idle,
            levels: AudioLevels::default(),
            stats: CaptureStats::default(),
        }
    }
}

type CaptureHandle = thread::JoinHandle<Result<CaptureSummary, CaptureError>>;

/// Drains an [`AudioSource`] into a raw sample file on a dedicated thread.
///
/// ```text
/// [AudioSource] → read → [RawSampleBuffer] → [RawSampleWriter] → raw file
///                                  └→ AudioLevels → CaptureDelegate
/// ```
///
/// One session at a time: `start` spawns the `pcm-capture` thread, `stop`
/// asks it to exit after the current read/write, and `wait` joins it. The
/// raw file is only complete once `wait` has returned.
pub struct CaptureWriter<S: AudioSource + 'static> {
    source: Arc<Mutex<S>>,
    device: AudioDevice,
    config: CaptureConfiguration,
    delegate: Option<Arc<dyn CaptureDelegate>>,
    session_state: Arc<Mutex<SessionState>>,
    active: Arc<AtomicBool>,
    source_open: bool,
    stop_requested: bool,
    session: Option<CaptureSession>,
    capture_handle: Option<CaptureHandle>,
}

impl<S: AudioSource + 'static> CaptureWriter<S> {
    pub fn new(source: S, config: CaptureConfiguration) -> Result<Self, CaptureError> {
        config.validate().map_err(CaptureError::Configuration)?;
        // Cached so queries never wait on the capture thread's blocking read.
        let device = source.device_info();
        Ok(Self {
            source: Arc::new(Mutex::new(source)),
            device,
            config,
            delegate: None,
            session_state: Arc::new(Mutex::new(SessionState::new())),
            active: Arc::new(AtomicBool::new(false)),
            source_open: false,
            stop_requested: false,
            session: None,
            capture_handle: None,
        })
    }

    /// Set the presentation sink. Takes effect from the next `start`.
    pub fn set_delegate(&mut self, delegate: Arc<dyn CaptureDelegate>) {
        self.delegate = Some(delegate);
    }

    pub fn config(&self) -> &CaptureConfiguration {
        &self.config
    }

    pub fn state(&self) -> CaptureState {
        self.session_state.lock().state.clone()
    }

    /// Levels of the most recent buffer; zero once the loop has exited.
    pub fn current_levels(&self) -> AudioLevels {
        self.session_state.lock().levels
    }

    pub fn stats(&self) -> CaptureStats {
        self.session_state.lock().stats
    }

    /// The most recently started session, if any.
    pub fn session(&self) -> Option<&CaptureSession> {
        self.session.as_ref()
    }

    /// Whether the capture loop is running and has not been asked to stop.
    pub fn is_active(&self) -> bool {
        self.active.load(Ordering::SeqCst)
    }

    pub fn is_source_open(&self) -> bool {
        self.source_open
    }

    pub fn device_info(&self) -> AudioDevice {
        self.device.clone()
    }

    /// Open the source if needed, create `destination`, and start capturing.
    pub fn start(&mut self, destination: impl AsRef<Path>) -> Result<CaptureSession, CaptureError> {
        let destination = destination.as_ref();

        if self.is_active() {
            let current = self
                .session
                .as_ref()
                .map(|s| s.destination.display().to_string())
                .unwrap_or_default();
            return Err(CaptureError::InvalidState(format!(
                "capture already active (writing {})",
                current
            )));
        }

        // A previous session may have stopped without being waited on.
        self.reap_session();
        let state = self.state();
        if !state.can_start() {
            return Err(CaptureError::InvalidState(format!("cannot start from {:?}", state)));
        }

        if !self.source_open {
            self.source
                .lock()
                .open(self.config.sample_rate, self.config.channels, self.config.encoding)?;
            self.source_open = true;
            log::debug!(
                "Opened audio source at {} Hz, {:?}, {:?}",
                self.config.sample_rate,
                self.config.channels,
                self.config.encoding
            );
        }

        let writer = RawSampleWriter::create(destination, self.config.raw_byte_order)?;
        let session = CaptureSession::new(destination, &self.config);

        {
            let mut s = self.session_state.lock();
            s.levels = AudioLevels::default();
            s.stats = CaptureStats::default();
        }
        self.active.store(true, Ordering::SeqCst);
        self.stop_requested = false;
        self.set_state(CaptureState::Capturing);

        let ctx = LoopContext {
            source: Arc::clone(&self.source),
            writer,
            active: Arc::clone(&self.active),
            session_state: Arc::clone(&self.session_state),
            delegate: self.delegate.clone(),
            session: session.clone(),
            buffer_capacity: self.config.buffer_capacity,
        };

        let spawned = thread::Builder::new()
            .name("pcm-capture".into())
            .spawn(move || capture_loop(ctx));

        match spawned {
            Ok(handle) => self.capture_handle = Some(handle),
            Err(e) => {
                self.active.store(false, Ordering::SeqCst);
                let error = CaptureError::Resource(format!("failed to spawn capture thread: {}", e));
                self.set_state(CaptureState::Failed(error.clone()));
                return Err(error);
            }
        }

        log::info!("Capture started: session {} -> {}", session.id, destination.display());
        self.session = Some(session.clone());
        Ok(session)
    }

    /// Ask the capture loop to exit. Does not block.
    ///
    /// The loop finishes its in-flight read and write, then flushes and
    /// closes the raw file. Use [`wait`](Self::wait) to join it.
    pub fn stop(&mut self) -> Result<(), CaptureError> {
        if self.capture_handle.is_none() {
            return Err(CaptureError::InvalidState("no capture session to stop".into()));
        }
        self.stop_requested = true;
        if self.active.swap(false, Ordering::SeqCst) {
            log::info!("Capture stop requested");
        }
        Ok(())
    }

    /// Join the capture thread and return how the session ended.
    ///
    /// Requires a prior `stop` unless the loop has already terminated on
    /// its own (after a read or write failure).
    pub fn wait(&mut self) -> Result<CaptureSummary, CaptureError> {
        let handle = self
            .capture_handle
            .take()
            .ok_or_else(|| CaptureError::InvalidState("no capture session to wait for".into()))?;

        if !self.stop_requested && !handle.is_finished() {
            self.capture_handle = Some(handle);
            return Err(CaptureError::InvalidState(
                "capture is still running; call stop first".into(),
            ));
        }

        handle
            .join()
            .map_err(|_| CaptureError::Resource("capture thread panicked".into()))?
    }

    /// `stop` followed by `wait`.
    pub fn stop_and_wait(&mut self) -> Result<CaptureSummary, CaptureError> {
        self.stop()?;
        self.wait()
    }

    /// Release the audio source. Only valid while no session is running.
    pub fn close_source(&mut self) -> Result<(), CaptureError> {
        if self.is_active() {
            return Err(CaptureError::InvalidState(
                "cannot close the audio source while capturing".into(),
            ));
        }
        self.reap_session();
        if self.source_open {
            self.source.lock().close()?;
            self.source_open = false;
            log::debug!("Closed audio source");
        }
        Ok(())
    }

    // --- Internal helpers ---

    fn set_state(&self, new_state: CaptureState) {
        transition(&self.session_state, self.delegate.as_ref(), new_state);
    }

    /// Join a session whose loop is no longer active.
    fn reap_session(&mut self) {
        let Some(handle) = self.capture_handle.take() else {
            return;
        };
        match handle.join() {
            Ok(Ok(summary)) => log::debug!("Reaped capture session {}", summary.session_id),
            Ok(Err(e)) => log::warn!("Previous capture session ended with error: {}", e),
            Err(_) => log::error!("Capture thread panicked"),
        }
    }
}

impl<S: AudioSource + 'static> Drop for CaptureWriter<S> {
    fn drop(&mut self) {
        self.active.store(false, Ordering::SeqCst);
        self.reap_session();
        if self.source_open {
            if let Err(e) = self.source.lock().close() {
                log::warn!("Failed to close audio source: {}", e);
            }
        }
    }
}

fn transition(
    session_state: &Mutex<SessionState>,
    delegate: Option<&Arc<dyn CaptureDelegate>>,
    new_state: CaptureState,
) {
    session_state.lock().state = new_state.clone();
    if let Some(d) = delegate {
        d.on_state_changed(&new_state);
    }
}

struct LoopContext<S> {
    source: Arc<Mutex<S>>,
    writer: RawSampleWriter,
    active: Arc<AtomicBool>,
    session_state: Arc<Mutex<SessionState>>,
    delegate: Option<Arc<dyn CaptureDelegate>>,
    session: CaptureSession,
    buffer_capacity: usize,
}

/// Body of the capture thread.
///
/// Each iteration reads up to `buffer_capacity` samples, appends them to the
/// raw file, and only then publishes their levels. The raw file is flushed
/// and closed however the loop ends; the first failure is reported once.
fn capture_loop<S: AudioSource>(mut ctx: LoopContext<S>) -> Result<CaptureSummary, CaptureError> {
    let mut buffer = vec![0i16; ctx.buffer_capacity];
    let mut failure: Option<CaptureError> = None;

    while ctx.active.load(Ordering::SeqCst) {
        let result = ctx.source.lock().read(&mut buffer);
        let read = match result {
            Ok(read) => read.min(buffer.len()),
            Err(e) => {
                failure = Some(e);
                break;
            }
        };

        if read == 0 {
            let mut s = ctx.session_state.lock();
            s.stats.reads += 1;
            s.stats.empty_reads += 1;
            continue;
        }

        let samples = &buffer[..read];
        if let Err(e) = ctx.writer.write_samples(samples) {
            failure = Some(e);
            break;
        }

        let levels = AudioLevels::measure(samples);
        {
            let mut s = ctx.session_state.lock();
            s.levels = levels;
            s.stats.reads += 1;
            s.stats.samples_written += read as u64;
            s.stats.bytes_written += read as u64 * 2;
        }
        if let Some(ref d) = ctx.delegate {
            d.on_levels_updated(&levels);
        }
    }

    ctx.active.store(false, Ordering::SeqCst);
    if failure.is_none() {
        transition(&ctx.session_state, ctx.delegate.as_ref(), CaptureState::Stopping);
    }

    if let Err(e) = ctx.writer.finish() {
        if failure.is_none() {
            failure = Some(e);
        } else {
            log::warn!("Closing raw file after failure also failed: {}", e);
        }
    }

    ctx.session_state.lock().levels = AudioLevels::default();
    if let Some(ref d) = ctx.delegate {
        d.on_levels_updated(&AudioLevels::default());
    }

    if let Some(error) = failure {
        log::error!("Capture session {} failed: {}", ctx.session.id, error);
        transition(
            &ctx.session_state,
            ctx.delegate.as_ref(),
            CaptureState::Failed(error.clone()),
        );
        if let Some(ref d) = ctx.delegate {
            d.on_error(&error);
        }
        return Err(error);
    }

    let bytes_written = ctx.writer.bytes_written();
    let summary = CaptureSummary {
        session_id: ctx.session.id.clone(),
        raw_path: ctx.writer.file_path().to_path_buf(),
        samples_written: ctx.writer.samples_written(),
        bytes_written,
        duration_secs: bytes_written as f64 / ctx.session.byte_rate() as f64,
    };

    log::info!(
        "Capture stopped: {} samples ({:.2}s) in {}",
        summary.samples_written,
        summary.duration_secs,
        summary.raw_path.display()
    );
    transition(
        &ctx.session_state,
        ctx.delegate.as_ref(),
        CaptureState::Stopped(summary.clone()),
    );
    if let Some(ref d) = ctx.delegate {
        d.on_capture_finished(&summary);
    }
    Ok(summary)
}
