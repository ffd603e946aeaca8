//! WASAPI microphone source.
//!
//! Opens a capture endpoint in shared mode, asks the audio engine to convert
//! to 16-bit PCM at the requested rate, and buffers the delivered samples
//! in a [`RingBuffer`] drained by [`AudioSource::read`].

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::mpsc;
use std::sync::Arc;
use std::thread;
use std::time::Duration;

use parking_lot::{Condvar, Mutex};
use windows::core::*;
use windows::Win32::Media::Audio::*;
use windows::Win32::System::Com::*;
use windows::Win32::System::Threading::*;

use pcm_capture_core::models::audio_models::{AudioDevice, ChannelConfig, SampleEncoding};
use pcm_capture_core::models::error::CaptureError;
use pcm_capture_core::processing::ring_buffer::RingBuffer;
use pcm_capture_core::traits::audio_source::AudioSource;

/// Engine buffer duration in 100-nanosecond units (100 ms).
const BUFFER_DURATION: i64 = 1_000_000;
const POLL_INTERVAL: Duration = Duration::from_millis(10);
/// How long `read` blocks before reporting a transient empty read.
const READ_TIMEOUT: Duration = Duration::from_millis(50);

/// State shared between `read` and the WASAPI thread.
struct Shared {
    samples: Mutex<RingBuffer>,
    available: Condvar,
    failure: Mutex<Option<CaptureError>>,
}

/// Microphone capture through a WASAPI capture endpoint.
///
/// All COM objects live on the `wasapi-mic-capture` thread; this handle
/// only holds the shared sample buffer and the thread's join handle.
pub struct WasapiMicSource {
    device: AudioDevice,
    device_id: Option<String>,
    running: Arc<AtomicBool>,
    shared: Option<Arc<Shared>>,
    capture_handle: Option<thread::JoinHandle<()>>,
}

impl WasapiMicSource {
    /// Source for the system default microphone.
    pub fn default_device() -> Self {
        Self {
            device: AudioDevice {
                id: "default-mic".into(),
                name: "Default Microphone".into(),
                is_default: true,
                transport_type: None,
            },
            device_id: None,
            running: Arc::new(AtomicBool::new(false)),
            shared: None,
            capture_handle: None,
        }
    }

    /// Source for a specific microphone, as listed by
    /// [`DeviceEnumerator`](crate::device_enumerator::DeviceEnumerator).
    pub fn with_device(device: AudioDevice) -> Self {
        Self {
            device_id: Some(device.id.clone()),
            device,
            running: Arc::new(AtomicBool::new(false)),
            shared: None,
            capture_handle: None,
        }
    }

    pub fn is_open(&self) -> bool {
        self.shared.is_some()
    }

    /// Samples discarded because `read` fell behind the device.
    pub fn dropped_samples(&self) -> u64 {
        self.shared
            .as_ref()
            .map(|s| s.samples.lock().dropped())
            .unwrap_or(0)
    }

    fn stop_thread(&mut self) {
        self.running.store(false, Ordering::SeqCst);
        if let Some(handle) = self.capture_handle.take() {
            if handle.join().is_err() {
                log::error!("WASAPI capture thread panicked");
            }
        }
    }
}

impl AudioSource for WasapiMicSource {
    fn open(
        &mut self,
        sample_rate: u32,
        channels: ChannelConfig,
        encoding: SampleEncoding,
    ) -> std::result::Result<(), CaptureError> {
        if self.is_open() {
            return Err(CaptureError::InvalidState("microphone already open".into()));
        }

        let format = capture_format(sample_rate, channels, encoding);
        // One second of audio.
        let capacity = sample_rate as usize * channels.channel_count() as usize;
        let shared = Arc::new(Shared {
            samples: Mutex::new(RingBuffer::new(capacity)),
            available: Condvar::new(),
            failure: Mutex::new(None),
        });

        self.running.store(true, Ordering::SeqCst);
        let running = Arc::clone(&self.running);
        let thread_shared = Arc::clone(&shared);
        let device_id = self.device_id.clone();
        let (ready_tx, ready_rx) = mpsc::sync_channel(1);

        let handle = thread::Builder::new()
            .name("wasapi-mic-capture".into())
            .spawn(move || {
                let mut ready = Some(ready_tx);
                if let Err(e) = mic_capture_loop(&running, device_id, format, &thread_shared, &mut ready) {
                    log::error!("Mic capture error: {}", e);
                    // Fails the pending open, or the next read once running.
                    match ready.take() {
                        Some(tx) => {
                            let _ = tx.send(Err(e));
                        }
                        None => {
                            *thread_shared.failure.lock() = Some(e);
                            thread_shared.available.notify_all();
                        }
                    }
                }
                running.store(false, Ordering::SeqCst);
            })
            .map_err(|e| CaptureError::Resource(format!("failed to spawn mic thread: {}", e)))?;
        self.capture_handle = Some(handle);

        let ready = ready_rx
            .recv()
            .unwrap_or_else(|_| Err(CaptureError::Resource("mic thread exited during open".into())));
        if let Err(e) = ready {
            self.stop_thread();
            return Err(e);
        }

        log::info!(
            "Opened microphone {} at {} Hz, {} channel(s)",
            self.device.name,
            sample_rate,
            channels.channel_count()
        );
        self.shared = Some(shared);
        Ok(())
    }

    fn read(&mut self, buffer: &mut [i16]) -> std::result::Result<usize, CaptureError> {
        let shared = self
            .shared
            .as_ref()
            .ok_or_else(|| CaptureError::Resource("microphone is not open".into()))?;

        if let Some(error) = shared.failure.lock().take() {
            return Err(error);
        }

        let mut samples = shared.samples.lock();
        if samples.is_empty() {
            shared.available.wait_for(&mut samples, READ_TIMEOUT);
        }
        Ok(samples.read_into(buffer))
    }

    fn close(&mut self) -> std::result::Result<(), CaptureError> {
        self.stop_thread();
        if let Some(shared) = self.shared.take() {
            let dropped = shared.samples.lock().dropped();
            if dropped > 0 {
                log::warn!("Microphone buffer overflowed, {} samples dropped", dropped);
            }
            log::info!("Closed microphone {}", self.device.name);
        }
        Ok(())
    }

    fn device_info(&self) -> AudioDevice {
        self.device.clone()
    }
}

impl Drop for WasapiMicSource {
    fn drop(&mut self) {
        self.stop_thread();
    }
}

/// Interleaved integer PCM format requested from the engine.
fn capture_format(sample_rate: u32, channels: ChannelConfig, encoding: SampleEncoding) -> WAVEFORMATEX {
    let n_channels = channels.channel_count();
    let bits = encoding.bits_per_sample();
    let block_align = n_channels * bits / 8;
    WAVEFORMATEX {
        wFormatTag: WAVE_FORMAT_PCM as u16,
        nChannels: n_channels,
        nSamplesPerSec: sample_rate,
        nAvgBytesPerSec: sample_rate * block_align as u32,
        nBlockAlign: block_align,
        wBitsPerSample: bits,
        cbSize: 0,
    }
}

/// Body of the WASAPI thread.
///
/// Sequence:
/// 1. CoInitializeEx (MTA)
/// 2. Get capture device (default or by ID)
/// 3. Activate IAudioClient, initialize shared mode with PCM auto-conversion
/// 4. Get IAudioCaptureClient, register with MMCSS
/// 5. Report readiness to `open`, then poll for packets until stopped
fn mic_capture_loop(
    running: &AtomicBool,
    device_id: Option<String>,
    format: WAVEFORMATEX,
    shared: &Shared,
    ready: &mut Option<mpsc::SyncSender<std::result::Result<(), CaptureError>>>,
) -> std::result::Result<(), CaptureError> {
    unsafe {
        CoInitializeEx(None, COINIT_MULTITHREADED)
            .ok()
            .map_err(|e| CaptureError::Resource(format!("CoInitializeEx failed: {}", e)))?;
        let _com_guard = CoUninitializeGuard;

        let enumerator: IMMDeviceEnumerator = CoCreateInstance(&MMDeviceEnumerator, None, CLSCTX_ALL)
            .map_err(|e| CaptureError::Resource(format!("failed to create enumerator: {}", e)))?;

        let device = match device_id {
            Some(ref id) => {
                let wide_id: Vec<u16> = id.encode_utf16().chain(std::iter::once(0)).collect();
                enumerator
                    .GetDevice(PCWSTR(wide_id.as_ptr()))
                    .map_err(|e| CaptureError::Resource(format!("microphone {} not found: {}", id, e)))?
            }
            None => enumerator
                .GetDefaultAudioEndpoint(eCapture, eConsole)
                .map_err(|e| CaptureError::Resource(format!("no default microphone: {}", e)))?,
        };

        let audio_client: IAudioClient = device
            .Activate(CLSCTX_ALL, None)
            .map_err(|e| CaptureError::Resource(format!("Activate failed: {}", e)))?;

        audio_client
            .Initialize(
                AUDCLNT_SHAREMODE_SHARED,
                AUDCLNT_STREAMFLAGS_AUTOCONVERTPCM | AUDCLNT_STREAMFLAGS_SRC_DEFAULT_QUALITY,
                BUFFER_DURATION,
                0,
                &format,
                None,
            )
            .map_err(|e| CaptureError::Resource(format!("IAudioClient::Initialize failed: {}", e)))?;

        let capture_client: IAudioCaptureClient = audio_client
            .GetService()
            .map_err(|e| CaptureError::Resource(format!("GetService failed: {}", e)))?;

        let mut task_index: u32 = 0;
        let task_name: Vec<u16> = "Pro Audio\0".encode_utf16().collect();
        let _mmcss_handle = AvSetMmThreadCharacteristicsW(PCWSTR(task_name.as_ptr()), &mut task_index);

        audio_client
            .Start()
            .map_err(|e| CaptureError::Resource(format!("IAudioClient::Start failed: {}", e)))?;

        let opened = ready.take().map(|tx| tx.send(Ok(())).is_ok()).unwrap_or(false);
        if !opened {
            let _ = audio_client.Stop();
            return Ok(());
        }

        let channels = format.nChannels as usize;
        let result = drain_packets(running, &capture_client, channels, shared);
        let _ = audio_client.Stop();
        result
    }
}

/// Copy packets into the shared ring buffer until `running` is cleared.
unsafe fn drain_packets(
    running: &AtomicBool,
    capture_client: &IAudioCaptureClient,
    channels: usize,
    shared: &Shared,
) -> std::result::Result<(), CaptureError> {
    let mut silence: Vec<i16> = Vec::new();

    while running.load(Ordering::SeqCst) {
        thread::sleep(POLL_INTERVAL);

        let mut packet_length = capture_client
            .GetNextPacketSize()
            .map_err(|e| CaptureError::Resource(format!("GetNextPacketSize failed: {}", e)))?;

        while packet_length > 0 {
            let mut buffer_ptr: *mut u8 = std::ptr::null_mut();
            let mut num_frames: u32 = 0;
            let mut flags: u32 = 0;

            capture_client
                .GetBuffer(&mut buffer_ptr, &mut num_frames, &mut flags, None, None)
                .map_err(|e| CaptureError::Resource(format!("GetBuffer failed: {}", e)))?;

            if num_frames > 0 && !buffer_ptr.is_null() {
                let total_samples = num_frames as usize * channels;
                let mut ring = shared.samples.lock();
                if flags & (AUDCLNT_BUFFERFLAGS_SILENT.0 as u32) != 0 {
                    silence.clear();
                    silence.resize(total_samples, 0);
                    ring.write(&silence);
                } else {
                    let samples = std::slice::from_raw_parts(buffer_ptr as *const i16, total_samples);
                    ring.write(samples);
                }
                drop(ring);
                shared.available.notify_all();
            }

            capture_client
                .ReleaseBuffer(num_frames)
                .map_err(|e| CaptureError::Resource(format!("ReleaseBuffer failed: {}", e)))?;

            packet_length = capture_client
                .GetNextPacketSize()
                .map_err(|e| CaptureError::Resource(format!("GetNextPacketSize failed: {}", e)))?;
        }
    }
    Ok(())
}

/// RAII guard to call CoUninitialize when dropped.
struct CoUninitializeGuard;

impl Drop for CoUninitializeGuard {
    fn drop(&mut self) {
        unsafe {
            CoUninitialize();
        }
    }
}
