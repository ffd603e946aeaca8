use serde::{Deserialize, Serialize};

use super::audio_models::{ByteOrder, ChannelConfig, SampleEncoding};

/// Configuration for a capture writer.
///
/// Missing fields fall back to [`Default`] when deserialized, so hosts can
/// persist only what they override.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CaptureConfiguration {
    /// Sample rate in Hz requested from the audio source (default: 16000).
    pub sample_rate: u32,

    /// Channel layout requested from the audio source (default: mono).
    pub channels: ChannelConfig,

    /// Sample encoding requested from the audio source (default: 16-bit PCM).
    pub encoding: SampleEncoding,

    /// Maximum number of samples fetched per read (default: 1024).
    pub buffer_capacity: usize,

    /// Byte order used for the raw sample file (default: native).
    pub raw_byte_order: ByteOrder,

    /// Write a `.metadata.json` sidecar next to each encoded WAVE file.
    pub write_metadata: bool,
}

impl CaptureConfiguration {
    pub fn validate(&self) -> Result<(), String> {
        if self.sample_rate == 0 {
            return Err("sample rate must be positive".into());
        }
        if self.buffer_capacity == 0 {
            return Err("buffer capacity must be positive".into());
        }
        let channels = self.channels.channel_count() as usize;
        if self.buffer_capacity % channels != 0 {
            return Err(format!(
                "buffer capacity {} is not a whole number of {}-channel frames",
                self.buffer_capacity, channels
            ));
        }
        Ok(())
    }

    pub fn channel_count(&self) -> u16 {
        self.channels.channel_count()
    }

    pub fn bits_per_sample(&self) -> u16 {
        self.encoding.bits_per_sample()
    }

    /// Bytes of raw payload produced per second of audio.
    pub fn byte_rate(&self) -> u32 {
        self.sample_rate * self.channel_count() as u32 * self.bits_per_sample() as u32 / 8
    }
}

impl Default for CaptureConfiguration {
    fn default() -> Self {
        Self {
            sample_rate: 16_000,
            channels: ChannelConfig::Mono,
            encoding: SampleEncoding::Pcm16,
            buffer_capacity: 1024,
            raw_byte_order: ByteOrder::Native,
            write_metadata: true,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_is_16k_mono_pcm16() {
        let config = CaptureConfiguration::default();
        assert_eq!(config.sample_rate, 16_000);
        assert_eq!(config.channel_count(), 1);
        assert_eq!(config.bits_per_sample(), 16);
        assert_eq!(config.byte_rate(), 32_000);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn rejects_zero_rate_and_capacity() {
        let config = CaptureConfiguration {
            sample_rate: 0,
            ..Default::default()
        };
        assert!(config.validate().is_err());

        let config = CaptureConfiguration {
            buffer_capacity: 0,
            ..Default::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn stereo_capacity_must_hold_whole_frames() {
        let config = CaptureConfiguration {
            channels: ChannelConfig::Stereo,
            buffer_capacity: 1023,
            ..Default::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn partial_json_falls_back_to_defaults() {
        let config: CaptureConfiguration =
            serde_json::from_str(r#"{ "sample_rate": 8000, "raw_byte_order": "big" }"#).unwrap();
        assert_eq!(config.sample_rate, 8000);
        assert_eq!(config.raw_byte_order, ByteOrder::Big);
        assert_eq!(config.channels, ChannelConfig::Mono);
        assert_eq!(config.buffer_capacity, 1024);
    }
}
