use std::fmt;

use pt_core::config::FeatureConfig;
use pt_core::features::FeatureSet;

/// Événement discret émis quand un pic de détection dépasse le seuil et
/// retombe. Le code à deux chiffres est l'unique payload qui traverse
/// vers le sous-système d'annonce vocale.
///
/// # Example
/// ```
/// use pt_dsp::extract::Trigger;
/// let t = Trigger::from_ratio(0.42);
/// assert_eq!(t.to_string(), "42");
/// ```
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Trigger {
    /// Code de conductivité, 0..=99.
    pub code: u8,
}

impl Trigger {
    /// Map a shape ratio to a two-digit code: `round(ratio·100)` clamped
    /// to [0, 99]. Non-finite ratios map to 0.
    #[must_use]
    pub fn from_ratio(ratio: f64) -> Self {
        let scaled = ratio * 100.0;
        let code = if scaled.is_finite() {
            scaled.round().clamp(0.0, 99.0) as u8
        } else {
            0
        };
        Self { code }
    }
}

impl fmt::Display for Trigger {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:02}", self.code)
    }
}

/// Réduit une courbe normalisée (signal − baseline) en features
/// scalaires et fait tourner la machine à états de suivi de pic.
///
/// `extract` met à jour le FeatureSet partagé ; `update_peak_tracker`
/// décide si la montée qui vient de s'achever mérite une annonce.
pub struct FeatureExtractor {
    start_index: usize,
    end_trim: usize,
    leading_window: usize,
    trailing_window: usize,
    trigger_peak: f64,
    features: FeatureSet,
}

impl FeatureExtractor {
    /// Create an extractor from the feature-window configuration.
    #[must_use]
    pub fn new(config: &FeatureConfig) -> Self {
        Self {
            start_index: config.start_index,
            end_trim: config.end_trim,
            leading_window: config.leading_window.max(1),
            trailing_window: config.trailing_window.max(1),
            trigger_peak: config.trigger_peak,
            features: FeatureSet::default(),
        }
    }

    /// Compute shape/strength features over the interior slice of
    /// `samples` and fold them into the shared feature set.
    ///
    /// The leading and trailing windows use FIXED divisors: a slice
    /// shorter than the window still divides by the window size, so the
    /// scale of `first_half_sum`/`second_half_sum` stays comparable
    /// across curve lengths.
    pub fn extract(&mut self, samples: &[f64], timestamp: f64) -> FeatureSet {
        let end = samples.len().saturating_sub(self.end_trim);
        let subset = if self.start_index < end {
            &samples[self.start_index..end]
        } else {
            &[]
        };

        if subset.is_empty() {
            self.features.total_sum = 0.0;
            self.features.first_half_sum = 0.0;
            self.features.second_half_sum = 0.0;
            self.features.diff = 0.0;
            self.features.timestamp = timestamp;
            return self.features;
        }

        let total_sum: f64 = subset.iter().sum();

        let lead = &subset[..self.leading_window.min(subset.len())];
        let trail = &subset[subset.len() - self.trailing_window.min(subset.len())..];
        let first_half_sum = lead.iter().sum::<f64>() / self.leading_window as f64;
        let second_half_sum = trail.iter().sum::<f64>() / self.trailing_window as f64;

        self.features.total_sum = total_sum;
        self.features.first_half_sum = first_half_sum;
        self.features.second_half_sum = second_half_sum;
        self.features.diff = first_half_sum - second_half_sum;
        self.features.timestamp = timestamp;
        self.features
    }

    /// Advance the peak/trigger state machine on the current `diff`.
    ///
    /// While `diff ≥ 0` the run accumulates: `cumulative_total += diff`,
    /// and a new maximum captures the shape ratio alongside the peak.
    /// When `diff` crosses below zero the run ends: `cumulative_total`
    /// and `peak` reset together, and a trigger fires iff the ended
    /// run's peak exceeded the threshold.
    pub fn update_peak_tracker(&mut self) -> Option<Trigger> {
        let current = self.features.diff;

        if current < 0.0 {
            let fired = self.features.peak > self.trigger_peak;
            let ratio = self.features.ratio;
            self.features.cumulative_total = 0.0;
            self.features.peak = current.max(0.0);
            return fired.then(|| Trigger::from_ratio(ratio));
        }

        self.features.cumulative_total += current;
        if current > self.features.peak {
            self.features.peak = current;
            self.features.ratio = if self.features.first_half_sum == 0.0 {
                0.0
            } else {
                self.features.second_half_sum / self.features.first_half_sum
            };
        }
        None
    }

    /// Copy of the shared feature set.
    #[must_use]
    pub fn features(&self) -> FeatureSet {
        self.features
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn extractor(start_index: usize, end_trim: usize) -> FeatureExtractor {
        FeatureExtractor::new(&FeatureConfig {
            start_index,
            end_trim,
            leading_window: 10,
            trailing_window: 6,
            trigger_peak: 10.0,
        })
    }

    #[test]
    fn extract_matches_reference_example() {
        // [10..100], skip first 2, trim last 1 → subset [30..90]
        let samples: Vec<f64> = (1..=10).map(|i| f64::from(i) * 10.0).collect();
        let mut ex = extractor(2, 1);
        let f = ex.extract(&samples, 0.0);
        assert!((f.total_sum - 420.0).abs() < 1e-9);
        assert!((f.first_half_sum - 42.0).abs() < 1e-9);
        assert!((f.second_half_sum - 65.0).abs() < 1e-9);
        assert!((f.diff - (-23.0)).abs() < 1e-9);
    }

    #[test]
    fn empty_interior_slice_zeroes_outputs() {
        let mut ex = extractor(4, 1);
        let f = ex.extract(&[1.0, 2.0, 3.0], 5.0);
        assert!((f.total_sum).abs() < 1e-12);
        assert!((f.first_half_sum).abs() < 1e-12);
        assert!((f.second_half_sum).abs() < 1e-12);
        assert!((f.diff).abs() < 1e-12);
        assert!((f.timestamp - 5.0).abs() < 1e-12);
    }

    /// Drive the tracker with a synthetic diff value.
    fn step(ex: &mut FeatureExtractor, diff: f64) -> Option<Trigger> {
        ex.features.diff = diff;
        ex.update_peak_tracker()
    }

    #[test]
    fn positive_diffs_accumulate_and_track_peak() {
        let mut ex = extractor(2, 1);
        ex.features.first_half_sum = 40.0;
        ex.features.second_half_sum = 20.0;
        assert!(step(&mut ex, 5.0).is_none());
        assert!(step(&mut ex, 12.0).is_none());
        assert!(step(&mut ex, 8.0).is_none());
        let f = ex.features();
        assert!((f.cumulative_total - 25.0).abs() < 1e-9);
        assert!((f.peak - 12.0).abs() < 1e-9);
        // Ratio captured when the peak was set
        assert!((f.ratio - 0.5).abs() < 1e-9);
    }

    #[test]
    fn reset_clears_peak_and_cumulative_together() {
        let mut ex = extractor(2, 1);
        step(&mut ex, 5.0);
        step(&mut ex, -1.0);
        let f = ex.features();
        assert!((f.cumulative_total).abs() < 1e-12);
        assert!((f.peak).abs() < 1e-12);
    }

    #[test]
    fn trigger_fires_iff_peak_exceeded_threshold() {
        let mut ex = extractor(2, 1);
        ex.features.first_half_sum = 100.0;
        ex.features.second_half_sum = 62.0;
        // Run peaking below threshold: no trigger
        step(&mut ex, 9.0);
        assert!(step(&mut ex, -1.0).is_none());
        // Run peaking above threshold: trigger with the captured ratio
        step(&mut ex, 11.0);
        let trigger = step(&mut ex, -0.5).unwrap();
        assert_eq!(trigger.to_string(), "62");
    }

    #[test]
    fn cumulative_total_never_goes_negative() {
        let mut ex = extractor(2, 1);
        for &d in &[3.0, -2.0, -5.0, 1.0, -0.1] {
            step(&mut ex, d);
            assert!(ex.features().cumulative_total >= 0.0);
        }
    }

    #[test]
    fn exactly_threshold_peak_does_not_fire() {
        let mut ex = extractor(2, 1);
        step(&mut ex, 10.0);
        assert!(step(&mut ex, -1.0).is_none());
    }

    #[test]
    fn two_digit_code_clamps_and_pads() {
        assert_eq!(Trigger::from_ratio(0.054).to_string(), "05");
        assert_eq!(Trigger::from_ratio(1.7).to_string(), "99");
        assert_eq!(Trigger::from_ratio(-0.3).to_string(), "00");
        assert_eq!(Trigger::from_ratio(f64::NAN).to_string(), "00");
        assert_eq!(Trigger::from_ratio(f64::INFINITY).to_string(), "00");
    }
}
