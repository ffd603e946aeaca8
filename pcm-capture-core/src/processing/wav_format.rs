//! Canonical 44-byte RIFF/WAVE header generation and inspection.

use crate::models::audio_models::ByteOrder;
use crate::models::error::CaptureError;

/// Size of the canonical WAV RIFF header in bytes.
pub const WAV_HEADER_SIZE: usize = 44;

/// Size of the PCM `fmt ` chunk body.
pub const PCM_FMT_CHUNK_SIZE: u32 = 16;

/// `fmt ` format code for linear PCM.
pub const PCM_FORMAT_CODE: u16 = 1;

/// Largest payload a 32-bit RIFF chunk size can describe.
pub const MAX_DATA_SIZE: u32 = u32::MAX - 36;

/// Decoded fields of a canonical PCM WAV header.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WavHeader {
    pub riff_chunk_size: u32,
    pub format_code: u16,
    pub channels: u16,
    pub sample_rate: u32,
    pub byte_rate: u32,
    pub block_align: u16,
    pub bits_per_sample: u16,
    pub data_size: u32,
}

/// Generate a 44-byte WAV RIFF header.
///
/// Format: PCM (format code 1), little-endian.
///
/// Layout:
/// ```text
/// [0-3]    "RIFF"
/// [4-7]    36 + data_size
/// [8-11]   "WAVE"
/// [12-15]  "fmt "
/// [16-19]  16 (PCM format chunk size)
/// [20-21]  1 (PCM format code)
/// [22-23]  channels
/// [24-27]  sample_rate
/// [28-31]  byte_rate = sample_rate * block_align
/// [32-33]  block_align = channels * bit_depth / 8
/// [34-35]  bit_depth
/// [36-39]  "data"
/// [40-43]  data_size
/// ```
///
/// Fields that do not fit their width saturate; callers validate the
/// format first (see `WaveEncoder`).
pub fn generate_wav_header(sample_rate: u32, bit_depth: u16, channels: u16, data_size: u32) -> [u8; WAV_HEADER_SIZE] {
    let frame_bytes = channels as u32 * bit_depth as u32 / 8;
    let block_align = u16::try_from(frame_bytes).unwrap_or(u16::MAX);
    let byte_rate = sample_rate.saturating_mul(frame_bytes);
    let chunk_size = 36 + data_size;

    let mut header = [0u8; WAV_HEADER_SIZE];

    // RIFF chunk descriptor
    header[0..4].copy_from_slice(b"RIFF");
    header[4..8].copy_from_slice(&chunk_size.to_le_bytes());
    header[8..12].copy_from_slice(b"WAVE");

    // fmt sub-chunk
    header[12..16].copy_from_slice(b"fmt ");
    header[16..20].copy_from_slice(&PCM_FMT_CHUNK_SIZE.to_le_bytes());
    header[20..22].copy_from_slice(&PCM_FORMAT_CODE.to_le_bytes());
    header[22..24].copy_from_slice(&channels.to_le_bytes());
    header[24..28].copy_from_slice(&sample_rate.to_le_bytes());
    header[28..32].copy_from_slice(&byte_rate.to_le_bytes());
    header[32..34].copy_from_slice(&block_align.to_le_bytes());
    header[34..36].copy_from_slice(&bit_depth.to_le_bytes());

    // data sub-chunk
    header[36..40].copy_from_slice(b"data");
    header[40..44].copy_from_slice(&data_size.to_le_bytes());

    header
}

/// Parse and validate a canonical 44-byte PCM header.
pub fn parse_wav_header(bytes: &[u8]) -> Result<WavHeader, CaptureError> {
    if bytes.len() < WAV_HEADER_SIZE {
        return Err(CaptureError::Format(format!(
            "header needs {} bytes, got {}",
            WAV_HEADER_SIZE,
            bytes.len()
        )));
    }

    let tag = |offset: usize, expected: &[u8; 4]| -> Result<(), CaptureError> {
        if &bytes[offset..offset + 4] == expected {
            Ok(())
        } else {
            Err(CaptureError::Format(format!(
                "expected {:?} at offset {}",
                String::from_utf8_lossy(expected),
                offset
            )))
        }
    };
    tag(0, b"RIFF")?;
    tag(8, b"WAVE")?;
    tag(12, b"fmt ")?;
    tag(36, b"data")?;

    let u16_at = |offset: usize| u16::from_le_bytes([bytes[offset], bytes[offset + 1]]);
    let u32_at = |offset: usize| {
        u32::from_le_bytes([bytes[offset], bytes[offset + 1], bytes[offset + 2], bytes[offset + 3]])
    };

    let fmt_size = u32_at(16);
    if fmt_size != PCM_FMT_CHUNK_SIZE {
        return Err(CaptureError::Format(format!("unexpected fmt chunk size {}", fmt_size)));
    }

    let header = WavHeader {
        riff_chunk_size: u32_at(4),
        format_code: u16_at(20),
        channels: u16_at(22),
        sample_rate: u32_at(24),
        byte_rate: u32_at(28),
        block_align: u16_at(32),
        bits_per_sample: u16_at(34),
        data_size: u32_at(40),
    };

    if header.format_code != PCM_FORMAT_CODE {
        return Err(CaptureError::Format(format!(
            "unsupported format code {}",
            header.format_code
        )));
    }
    if header.riff_chunk_size != header.data_size.wrapping_add(36) {
        return Err(CaptureError::Format(format!(
            "RIFF size {} does not match data size {}",
            header.riff_chunk_size, header.data_size
        )));
    }

    Ok(header)
}

/// Rewrite 16-bit samples stored in `order` as little-endian, in place.
///
/// `payload` must hold whole samples.
pub fn normalize_to_little_endian(payload: &mut [u8], order: ByteOrder) {
    if order.is_little_endian() {
        return;
    }
    for sample in payload.chunks_exact_mut(2) {
        sample.swap(0, 1);
    }
}
