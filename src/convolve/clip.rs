use log::warn;

/// Saturation statistics for one pass.
///
/// Every sample that ever entered the output accumulator counts towards the
/// peak; samples beyond full scale are clamped in place and tallied.
#[derive(Debug, Default, Clone, Copy)]
pub struct ClipStats {
    /// Samples whose un-clipped magnitude exceeded full scale.
    pub clipped: usize,
    /// Largest un-clipped magnitude observed.
    pub peak: f32,
}

impl ClipStats {
    /// Folds a stretch of the accumulator into the statistics, clamping any
    /// sample beyond full scale to +/-1.
    pub fn scan(&mut self, samples: &mut [f32]) {
        for s in samples.iter_mut() {
            let mag = s.abs();
            if mag > self.peak {
                self.peak = mag;
            }
            if mag > 1.0 {
                self.clipped += 1;
                *s = s.signum();
            }
        }
    }

    /// Multiplier that would have kept the observed peak at full scale.
    pub fn suggested_amp(&self, amp: f32) -> f32 {
        amp / self.peak
    }

    /// Warns the user when anything clipped. Clipping is not an error; the
    /// output has already been written with the offending samples clamped.
    pub fn report(&self, amp: f32) {
        if self.clipped > 0 {
            warn!("{} samples got clipped!", self.clipped);
            warn!(
                "recommend a multiplier of less than {:.6} instead",
                self.suggested_amp(amp)
            );
            warn!("maximum amplitude: {:.6}", self.peak);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_counts_and_clamps() {
        let mut stats = ClipStats::default();
        let mut samples = [0.5, -1.5, 2.0, 0.9, -0.2];
        stats.scan(&mut samples);

        assert_eq!(stats.clipped, 2);
        assert_eq!(stats.peak, 2.0);
        assert_eq!(samples, [0.5, -1.0, 1.0, 0.9, -0.2]);
    }

    #[test]
    fn test_peak_tracks_unclipped_samples() {
        let mut stats = ClipStats::default();
        let mut samples = [0.25, -0.75];
        stats.scan(&mut samples);

        assert_eq!(stats.clipped, 0);
        assert_eq!(stats.peak, 0.75);
        assert_eq!(samples, [0.25, -0.75]);
    }

    #[test]
    fn test_peak_carries_across_scans() {
        let mut stats = ClipStats::default();
        stats.scan(&mut [0.5, -3.0]);
        stats.scan(&mut [0.9]);

        assert_eq!(stats.clipped, 1);
        assert_eq!(stats.peak, 3.0);
    }

    #[test]
    fn test_suggested_amp() {
        let stats = ClipStats {
            clipped: 7,
            peak: 3.2,
        };
        assert!((stats.suggested_amp(1.0) - 0.3125).abs() < 1e-6);
        assert!((stats.suggested_amp(0.5) - 0.15625).abs() < 1e-6);
    }
}
