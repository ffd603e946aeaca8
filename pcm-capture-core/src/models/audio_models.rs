use serde::{Deserialize, Serialize};

/// Channel layout requested from an audio source.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ChannelConfig {
    Mono,
    Stereo,
}

impl ChannelConfig {
    pub fn channel_count(self) -> u16 {
        match self {
            Self::Mono => 1,
            Self::Stereo => 2,
        }
    }
}

/// Sample encoding requested from an audio source.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SampleEncoding {
    /// Signed 16-bit linear PCM.
    Pcm16,
}

impl SampleEncoding {
    pub fn bits_per_sample(self) -> u16 {
        match self {
            Self::Pcm16 => 16,
        }
    }
}

/// Byte order of samples in a headerless raw file.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ByteOrder {
    /// Whatever the host CPU uses.
    #[default]
    Native,
    Little,
    Big,
}

impl ByteOrder {
    /// Whether samples stored in this order are already little-endian.
    pub fn is_little_endian(self) -> bool {
        match self {
            Self::Native => cfg!(target_endian = "little"),
            Self::Little => true,
            Self::Big => false,
        }
    }

    pub fn encode(self, sample: i16) -> [u8; 2] {
        match self {
            Self::Native => sample.to_ne_bytes(),
            Self::Little => sample.to_le_bytes(),
            Self::Big => sample.to_be_bytes(),
        }
    }

    pub fn decode(self, bytes: [u8; 2]) -> i16 {
        match self {
            Self::Native => i16::from_ne_bytes(bytes),
            Self::Little => i16::from_le_bytes(bytes),
            Self::Big => i16::from_be_bytes(bytes),
        }
    }
}

/// Transport type for an audio device.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AudioTransportType {
    BuiltIn,
    Bluetooth,
    BluetoothLE,
    Usb,
    Virtual,
    Unknown,
}

/// An input device backing an [`AudioSource`](crate::traits::audio_source::AudioSource).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AudioDevice {
    pub id: String,
    pub name: String,
    pub is_default: bool,
    pub transport_type: Option<AudioTransportType>,
}

/// Loudness of one captured buffer.
///
/// `mean_square` is the raw amplitude (sum of squared samples divided by the
/// number of samples read); `rms` is its square root and is the magnitude
/// meant for display. Both are in 16-bit sample units.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct AudioLevels {
    pub mean_square: f64,
    pub rms: f64,
    pub peak: u16,
}

/// Running counters for the active capture session.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CaptureStats {
    pub reads: u64,
    pub empty_reads: u64,
    pub samples_written: u64,
    pub bytes_written: u64,
}
