use crate::models::audio_models::AudioLevels;

impl AudioLevels {
    /// Measure the loudness of the samples actually read from the source.
    ///
    /// An empty slice measures as silence.
    pub fn measure(samples: &[i16]) -> Self {
        if samples.is_empty() {
            return Self::default();
        }
        let sum_sq: f64 = samples
            .iter()
            .map(|&s| {
                let s = s as f64;
                s * s
            })
            .sum();
        let mean_square = sum_sq / samples.len() as f64;
        Self {
            mean_square,
            rms: mean_square.sqrt(),
            peak: peak_level(samples),
        }
    }

    /// RMS scaled to `0.0..=1.0` of full scale, for progress-bar style meters.
    pub fn normalized_rms(&self) -> f32 {
        (self.rms / i16::MAX as f64).min(1.0) as f32
    }
}

/// Peak absolute sample value. `i16::MIN` maps to 32768.
pub fn peak_level(samples: &[i16]) -> u16 {
    samples.iter().map(|s| s.unsigned_abs()).max().unwrap_or(0)
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn silence_measures_zero() {
        let levels = AudioLevels::measure(&[0, 0, 0, 0]);
        assert_eq!(levels.mean_square, 0.0);
        assert_eq!(levels.rms, 0.0);
        assert_eq!(levels.peak, 0);
    }

    #[test]
    fn constant_buffer_rms_is_magnitude() {
        for v in [1i16, -250, 1000, i16::MAX, i16::MIN] {
            let levels = AudioLevels::measure(&[v; 64]);
            assert_relative_eq!(levels.rms, (v as f64).abs(), max_relative = 1e-12);
        }
    }

    #[test]
    fn alternating_full_swing() {
        let levels = AudioLevels::measure(&[100, -100, 100, -100]);
        assert_relative_eq!(levels.mean_square, 10_000.0);
        assert_relative_eq!(levels.rms, 100.0);
        assert_eq!(levels.peak, 100);
    }

    #[test]
    fn extremes_do_not_overflow() {
        let levels = AudioLevels::measure(&[32767, -32768]);
        let expected = (32767.0f64 * 32767.0 + 32768.0 * 32768.0) / 2.0;
        assert_relative_eq!(levels.mean_square, expected);
        assert_eq!(levels.peak, 32768);
        assert_relative_eq!(levels.normalized_rms(), 1.0);
    }

    #[test]
    fn empty_is_silence() {
        assert_eq!(AudioLevels::measure(&[]), AudioLevels::default());
    }
}
