use std::collections::VecDeque;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::thread;
use std::time::{Duration, Instant};

use crate::models::audio_models::{AudioDevice, AudioTransportType, ChannelConfig, SampleEncoding};
use crate::models::error::CaptureError;
use crate::traits::audio_source::AudioSource;

enum ScriptStep {
    Samples(Vec<i16>),
    Fail(CaptureError),
}

#[derive(Default)]
struct ScriptCounters {
    remaining: AtomicUsize,
    reads: AtomicUsize,
    opens: AtomicUsize,
    closes: AtomicUsize,
}

/// Observer for a [`ScriptedSource`] that has been moved into a capture writer.
#[derive(Clone)]
pub struct ScriptMonitor {
    counters: Arc<ScriptCounters>,
}

impl ScriptMonitor {
    /// Script steps not yet fully delivered.
    pub fn remaining(&self) -> usize {
        self.counters.remaining.load(Ordering::SeqCst)
    }

    pub fn reads(&self) -> usize {
        self.counters.reads.load(Ordering::SeqCst)
    }

    pub fn opens(&self) -> usize {
        self.counters.opens.load(Ordering::SeqCst)
    }

    pub fn closes(&self) -> usize {
        self.counters.closes.load(Ordering::SeqCst)
    }

    /// Poll until every scripted step has been delivered or `timeout` passes.
    pub fn wait_drained(&self, timeout: Duration) -> bool {
        let deadline = Instant::now() + timeout;
        while self.remaining() > 0 {
            if Instant::now() >= deadline {
                return false;
            }
            thread::sleep(Duration::from_millis(1));
        }
        true
    }
}

/// Audio source that replays a fixed script of buffers.
///
/// Each scripted buffer is delivered by one `read` (split across several
/// reads if it exceeds the caller's buffer). Once the script runs out the
/// source behaves like an idle live device: every read sleeps briefly and
/// returns 0. Useful for tests and for feeding pre-recorded samples through
/// the capture pipeline.
pub struct ScriptedSource {
    script: VecDeque<ScriptStep>,
    is_open: bool,
    open_error: Option<CaptureError>,
    idle_delay: Duration,
    opened_format: Option<(u32, ChannelConfig, SampleEncoding)>,
    counters: Arc<ScriptCounters>,
}

impl ScriptedSource {
    pub fn new<I>(buffers: I) -> Self
    where
        I: IntoIterator<Item = Vec<i16>>,
    {
        let script: VecDeque<ScriptStep> = buffers.into_iter().map(ScriptStep::Samples).collect();
        let counters = Arc::new(ScriptCounters::default());
        counters.remaining.store(script.len(), Ordering::SeqCst);
        Self {
            script,
            is_open: false,
            open_error: None,
            idle_delay: Duration::from_millis(1),
            opened_format: None,
            counters,
        }
    }

    /// Fail the read that follows the scripted buffers with `error`.
    pub fn then_fail(mut self, error: CaptureError) -> Self {
        self.script.push_back(ScriptStep::Fail(error));
        self.counters.remaining.fetch_add(1, Ordering::SeqCst);
        self
    }

    /// Make every `open` fail with `error`.
    pub fn with_open_failure(mut self, error: CaptureError) -> Self {
        self.open_error = Some(error);
        self
    }

    /// How long an idle read waits before returning 0.
    pub fn with_idle_delay(mut self, delay: Duration) -> Self {
        self.idle_delay = delay;
        self
    }

    pub fn monitor(&self) -> ScriptMonitor {
        ScriptMonitor {
            counters: Arc::clone(&self.counters),
        }
    }

    pub fn is_open(&self) -> bool {
        self.is_open
    }

    /// Format passed to the last successful `open`.
    pub fn opened_format(&self) -> Option<(u32, ChannelConfig, SampleEncoding)> {
        self.opened_format
    }
}

impl AudioSource for ScriptedSource {
    fn open(
        &mut self,
        sample_rate: u32,
        channels: ChannelConfig,
        encoding: SampleEncoding,
    ) -> Result<(), CaptureError> {
        if let Some(ref error) = self.open_error {
            return Err(error.clone());
        }
        self.is_open = true;
        self.opened_format = Some((sample_rate, channels, encoding));
        self.counters.opens.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }

    fn read(&mut self, buffer: &mut [i16]) -> Result<usize, CaptureError> {
        if !self.is_open {
            return Err(CaptureError::Resource("scripted source is not open".into()));
        }
        self.counters.reads.fetch_add(1, Ordering::SeqCst);

        let Some(step) = self.script.pop_front() else {
            thread::sleep(self.idle_delay);
            return Ok(0);
        };

        match step {
            ScriptStep::Fail(error) => {
                self.counters.remaining.fetch_sub(1, Ordering::SeqCst);
                Err(error)
            }
            ScriptStep::Samples(mut samples) => {
                let count = samples.len().min(buffer.len());
                buffer[..count].copy_from_slice(&samples[..count]);
                if count < samples.len() {
                    let rest = samples.split_off(count);
                    self.script.push_front(ScriptStep::Samples(rest));
                } else {
                    self.counters.remaining.fetch_sub(1, Ordering::SeqCst);
                }
                Ok(count)
            }
        }
    }

    fn close(&mut self) -> Result<(), CaptureError> {
        if self.is_open {
            self.is_open = false;
            self.counters.closes.fetch_add(1, Ordering::SeqCst);
        }
        Ok(())
    }

    fn device_info(&self) -> AudioDevice {
        AudioDevice {
            id: "scripted".into(),
            name: "Scripted Source".into(),
            is_default: false,
            transport_type: Some(AudioTransportType::Virtual),
        }
    }
}
