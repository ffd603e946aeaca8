use std::fs::{self, File};
use std::io::Write;
use std::path::{Path, PathBuf};

use sha2::{Digest, Sha256};

use crate::models::audio_models::ByteOrder;
use crate::models::config::CaptureConfiguration;
use crate::models::error::CaptureError;
use crate::models::recording_result::{RecordingMetadata, RecordingResult};
use crate::processing::wav_format::{self, MAX_DATA_SIZE, WAV_HEADER_SIZE};

/// One-shot transcoder from a headerless 16-bit PCM file to a WAVE file.
///
/// The whole raw file is read into memory, its samples are rewritten as
/// little-endian in a single pass, and the finished file is written to a
/// sibling `.partial` file that is renamed over `wave_path` only once it is
/// complete. A failure therefore never leaves a truncated WAVE file at
/// `wave_path`; a leftover `.partial` file may remain if even the cleanup
/// fails.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WaveEncoder {
    sample_rate: u32,
    channels: u16,
    bits_per_sample: u16,
    raw_byte_order: ByteOrder,
}

impl WaveEncoder {
    /// Mono 16-bit encoder for raw files in native byte order.
    pub fn new(sample_rate: u32) -> Self {
        Self {
            sample_rate,
            channels: 1,
            bits_per_sample: 16,
            raw_byte_order: ByteOrder::Native,
        }
    }

    /// Encoder matching the files a capture writer produces with `config`.
    pub fn from_config(config: &CaptureConfiguration) -> Self {
        Self {
            sample_rate: config.sample_rate,
            channels: config.channel_count(),
            bits_per_sample: config.bits_per_sample(),
            raw_byte_order: config.raw_byte_order,
        }
    }

    pub fn with_channels(mut self, channels: u16) -> Self {
        self.channels = channels;
        self
    }

    pub fn with_bits_per_sample(mut self, bits_per_sample: u16) -> Self {
        self.bits_per_sample = bits_per_sample;
        self
    }

    pub fn with_raw_byte_order(mut self, order: ByteOrder) -> Self {
        self.raw_byte_order = order;
        self
    }

    pub fn sample_rate(&self) -> u32 {
        self.sample_rate
    }

    pub fn channels(&self) -> u16 {
        self.channels
    }

    /// Bytes per sample frame across all channels.
    ///
    /// Wider than the header's 16-bit field; `validate` rejects formats
    /// whose frame does not fit.
    pub fn block_align(&self) -> u32 {
        self.channels as u32 * self.bits_per_sample as u32 / 8
    }

    /// Bytes per second, or `None` if it does not fit the header's 32-bit field.
    pub fn byte_rate(&self) -> Option<u32> {
        self.sample_rate.checked_mul(self.block_align())
    }

    fn validate(&self) -> Result<(), CaptureError> {
        if self.sample_rate == 0 {
            return Err(CaptureError::Configuration("sample rate must be positive".into()));
        }
        if self.channels == 0 {
            return Err(CaptureError::Configuration("channel count must be positive".into()));
        }
        if self.bits_per_sample != 16 {
            return Err(CaptureError::Configuration(format!(
                "unsupported bit depth: {}",
                self.bits_per_sample
            )));
        }
        if self.block_align() > u16::MAX as u32 {
            return Err(CaptureError::Configuration(format!(
                "{} channels of {}-bit samples exceed the WAVE block align field",
                self.channels, self.bits_per_sample
            )));
        }
        if self.byte_rate().is_none() {
            return Err(CaptureError::Configuration(format!(
                "byte rate overflows for {} Hz x {} channels",
                self.sample_rate, self.channels
            )));
        }
        Ok(())
    }

    /// Wrap an in-memory raw payload in a WAVE container.
    pub fn encode_bytes(&self, mut raw: Vec<u8>) -> Result<Vec<u8>, CaptureError> {
        self.validate()?;

        let block_align = self.block_align() as usize;
        if raw.len() % block_align != 0 {
            return Err(CaptureError::Format(format!(
                "raw payload of {} bytes is not a whole number of {}-byte sample frames",
                raw.len(),
                block_align
            )));
        }
        let data_size = u32::try_from(raw.len())
            .ok()
            .filter(|&size| size <= MAX_DATA_SIZE)
            .ok_or_else(|| {
                CaptureError::Format(format!("raw payload of {} bytes is too large for WAVE", raw.len()))
            })?;

        wav_format::normalize_to_little_endian(&mut raw, self.raw_byte_order);

        let header =
            wav_format::generate_wav_header(self.sample_rate, self.bits_per_sample, self.channels, data_size);
        let mut wave = Vec::with_capacity(WAV_HEADER_SIZE + raw.len());
        wave.extend_from_slice(&header);
        wave.extend_from_slice(&raw);
        Ok(wave)
    }

    /// Read `raw_path` in full and write the WAVE file to `wave_path`.
    pub fn encode(&self, raw_path: &Path, wave_path: &Path) -> Result<RecordingResult, CaptureError> {
        let raw = fs::read(raw_path)
            .map_err(|e| CaptureError::Io(format!("failed to read raw file {}: {}", raw_path.display(), e)))?;
        let raw_len = raw.len();

        let wave = self.encode_bytes(raw)?;
        let data_size = (wave.len() - WAV_HEADER_SIZE) as u32;
        let checksum = hex_encode(&Sha256::digest(&wave));

        write_replacing(wave_path, &wave)?;

        let metadata = RecordingMetadata::new_pcm(
            &wave_path.to_string_lossy(),
            &checksum,
            self.sample_rate,
            self.channels,
            self.bits_per_sample,
            data_size,
        );

        log::info!(
            "Encoded {} ({} raw bytes) to {} ({:.2}s)",
            raw_path.display(),
            raw_len,
            wave_path.display(),
            metadata.duration_secs
        );

        Ok(RecordingResult {
            file_path: wave_path.to_path_buf(),
            raw_path: raw_path.to_path_buf(),
            duration_secs: metadata.duration_secs,
            data_size,
            checksum,
            metadata,
        })
    }
}

/// Encode a raw capture file with the given format.
pub fn encode(
    raw_path: &Path,
    wave_path: &Path,
    sample_rate: u32,
    channels: u16,
    bits_per_sample: u16,
) -> Result<RecordingResult, CaptureError> {
    WaveEncoder::new(sample_rate)
        .with_channels(channels)
        .with_bits_per_sample(bits_per_sample)
        .encode(raw_path, wave_path)
}

fn partial_path(path: &Path) -> Result<PathBuf, CaptureError> {
    let mut name = path
        .file_name()
        .ok_or_else(|| CaptureError::Io(format!("{} has no file name", path.display())))?
        .to_os_string();
    name.push(".partial");
    Ok(path.with_file_name(name))
}

/// Write `data` to a sibling file, then rename it over `path`.
fn write_replacing(path: &Path, data: &[u8]) -> Result<(), CaptureError> {
    let partial = partial_path(path)?;

    let result = File::create(&partial)
        .and_then(|mut file| {
            file.write_all(data)?;
            file.sync_all()
        })
        .and_then(|_| fs::rename(&partial, path));

    result.map_err(|e| {
        if let Err(cleanup) = fs::remove_file(&partial) {
            if cleanup.kind() != std::io::ErrorKind::NotFound {
                log::warn!("Failed to remove {}: {}", partial.display(), cleanup);
            }
        }
        CaptureError::Io(format!("failed to write wave file {}: {}", path.display(), e))
    })
}

fn hex_encode(bytes: &[u8]) -> String {
    bytes.iter().map(|b| format!("{:02x}", b)).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::processing::wav_format::parse_wav_header;
    use approx::assert_relative_eq;

    fn raw_le(samples: &[i16]) -> Vec<u8> {
        samples.iter().flat_map(|s| s.to_le_bytes()).collect()
    }

    fn samples_le(bytes: &[u8]) -> Vec<i16> {
        bytes
            .chunks_exact(2)
            .map(|c| i16::from_le_bytes([c[0], c[1]]))
            .collect()
    }

    #[test]
    fn payload_roundtrips_as_little_endian_samples() {
        let samples = [0i16, 1, -1, 12345, -12345, i16::MAX, i16::MIN];
        let encoder = WaveEncoder::new(16_000).with_raw_byte_order(ByteOrder::Little);

        let wave = encoder.encode_bytes(raw_le(&samples)).unwrap();

        let header = parse_wav_header(&wave).unwrap();
        assert_eq!(header.data_size as usize, samples.len() * 2);
        assert_eq!(samples_le(&wave[WAV_HEADER_SIZE..]), samples);
    }

    #[test]
    fn big_endian_raw_is_normalized() {
        let samples = [0x0102i16, -2, 300];
        let raw: Vec<u8> = samples.iter().flat_map(|s| s.to_be_bytes()).collect();
        let encoder = WaveEncoder::new(8_000).with_raw_byte_order(ByteOrder::Big);

        let wave = encoder.encode_bytes(raw).unwrap();
        assert_eq!(samples_le(&wave[WAV_HEADER_SIZE..]), samples);
    }

    #[test]
    fn native_raw_is_normalized() {
        let samples = [0x0A0Bi16, -300];
        let raw: Vec<u8> = samples.iter().flat_map(|s| s.to_ne_bytes()).collect();

        let wave = WaveEncoder::new(16_000).encode_bytes(raw).unwrap();
        assert_eq!(samples_le(&wave[WAV_HEADER_SIZE..]), samples);
    }

    #[test]
    fn odd_payload_is_format_error() {
        let err = WaveEncoder::new(16_000).encode_bytes(vec![1, 2, 3]).unwrap_err();
        assert!(matches!(err, CaptureError::Format(_)));
    }

    #[test]
    fn stereo_requires_whole_frames() {
        let encoder = WaveEncoder::new(16_000).with_channels(2);
        assert!(matches!(encoder.encode_bytes(vec![0; 6]), Err(CaptureError::Format(_))));

        let wave = encoder.encode_bytes(vec![0; 8]).unwrap();
        let header = parse_wav_header(&wave).unwrap();
        assert_eq!(header.block_align, 4);
        assert_eq!(header.byte_rate, 64_000);
    }

    #[test]
    fn empty_payload_produces_bare_header() {
        let wave = WaveEncoder::new(16_000).encode_bytes(Vec::new()).unwrap();
        assert_eq!(wave.len(), WAV_HEADER_SIZE);
        assert_eq!(parse_wav_header(&wave).unwrap().riff_chunk_size, 36);
    }

    #[test]
    fn unsupported_bit_depth_is_rejected() {
        let encoder = WaveEncoder::new(16_000).with_bits_per_sample(24);
        assert!(matches!(encoder.encode_bytes(vec![0; 6]), Err(CaptureError::Configuration(_))));
    }

    #[test]
    fn high_sample_rate_within_header_range_encodes() {
        let wave = WaveEncoder::new(300_000_000).encode_bytes(vec![0; 4]).unwrap();
        let header = parse_wav_header(&wave).unwrap();
        assert_eq!(header.byte_rate, 600_000_000);
        assert_eq!(header.block_align, 2);
    }

    #[test]
    fn byte_rate_overflow_is_configuration_error() {
        let encoder = WaveEncoder::new(3_000_000_000);
        assert_eq!(encoder.byte_rate(), None);
        assert!(matches!(encoder.encode_bytes(vec![0; 4]), Err(CaptureError::Configuration(_))));
    }

    #[test]
    fn oversized_frame_is_configuration_error() {
        let encoder = WaveEncoder::new(8_000).with_channels(5_000);
        assert_eq!(encoder.block_align(), 10_000);
        assert!(matches!(encoder.encode_bytes(vec![0; 4]), Err(CaptureError::Configuration(_))));

        let widest = WaveEncoder::new(8_000).with_channels(u16::MAX);
        assert!(matches!(widest.encode_bytes(vec![0; 4]), Err(CaptureError::Configuration(_))));
    }

    #[test]
    fn encode_file_writes_header_payload_and_checksum() {
        let dir = tempfile::tempdir().unwrap();
        let raw_path = dir.path().join("conversation.raw");
        let wave_path = dir.path().join("conversation.wav");
        fs::write(&raw_path, raw_le(&[1; 16_000])).unwrap();

        let result = WaveEncoder::new(16_000)
            .with_raw_byte_order(ByteOrder::Little)
            .encode(&raw_path, &wave_path)
            .unwrap();

        let wave = fs::read(&wave_path).unwrap();
        assert_eq!(wave.len(), WAV_HEADER_SIZE + 32_000);
        assert_eq!(result.data_size, 32_000);
        assert_eq!(result.checksum, hex_encode(&Sha256::digest(&wave)));
        assert_eq!(result.checksum.len(), 64);
        assert_relative_eq!(result.duration_secs, 1.0);
        assert_eq!(result.raw_path, raw_path);
        assert!(!dir.path().join("conversation.wav.partial").exists());
    }

    #[test]
    fn encode_is_idempotent() {
        let dir = tempfile::tempdir().unwrap();
        let raw_path = dir.path().join("a.raw");
        let wave_path = dir.path().join("a.wav");
        fs::write(&raw_path, raw_le(&[5, -5, 1000, -1000])).unwrap();

        let encoder = WaveEncoder::new(16_000);
        let first = encoder.encode(&raw_path, &wave_path).unwrap();
        let first_bytes = fs::read(&wave_path).unwrap();
        let second = encoder.encode(&raw_path, &wave_path).unwrap();
        let second_bytes = fs::read(&wave_path).unwrap();

        assert_eq!(first_bytes, second_bytes);
        assert_eq!(first.checksum, second.checksum);
    }

    #[test]
    fn odd_raw_file_writes_nothing() {
        let dir = tempfile::tempdir().unwrap();
        let raw_path = dir.path().join("odd.raw");
        let wave_path = dir.path().join("odd.wav");
        fs::write(&raw_path, [0u8; 21]).unwrap();

        let err = encode(&raw_path, &wave_path, 16_000, 1, 16).unwrap_err();
        assert!(matches!(err, CaptureError::Format(_)));
        assert!(!wave_path.exists());
        assert!(!dir.path().join("odd.wav.partial").exists());
    }

    #[test]
    fn odd_raw_file_keeps_previous_wave() {
        let dir = tempfile::tempdir().unwrap();
        let raw_path = dir.path().join("odd.raw");
        let wave_path = dir.path().join("odd.wav");
        fs::write(&raw_path, [0u8; 3]).unwrap();
        fs::write(&wave_path, b"previous").unwrap();

        assert!(encode(&raw_path, &wave_path, 16_000, 1, 16).is_err());
        assert_eq!(fs::read(&wave_path).unwrap(), b"previous");
    }

    #[test]
    fn missing_raw_file_is_io_error() {
        let dir = tempfile::tempdir().unwrap();
        let err = encode(
            &dir.path().join("missing.raw"),
            &dir.path().join("out.wav"),
            16_000,
            1,
            16,
        )
        .unwrap_err();
        assert!(matches!(err, CaptureError::Io(_)));
    }

    #[test]
    fn unwritable_wave_path_is_io_error() {
        let dir = tempfile::tempdir().unwrap();
        let raw_path = dir.path().join("a.raw");
        fs::write(&raw_path, [0u8; 4]).unwrap();

        let wave_path = dir.path().join("no-such-dir").join("a.wav");
        let err = encode(&raw_path, &wave_path, 16_000, 1, 16).unwrap_err();
        assert!(matches!(err, CaptureError::Io(_)));
    }
}
