use crate::error::DspError;

/// Moyenne mobile exponentielle par élément, à taux asymétriques.
///
/// `alpha_fast` s'applique quand le nouvel échantillon passe SOUS la
/// moyenne courante (une dérive vers le bas est absorbée vite),
/// `alpha_slow` sinon (une élévation doit être soutenue pour déplacer la
/// moyenne — elle n'avale pas le signal de détection).
///
/// Deux instances indépendantes tournent en parallèle sur la même
/// entrée : la baseline (lente) et le signal (rapide).
///
/// # Example
/// ```
/// use pt_dsp::filter::AdaptiveAverage;
/// let mut avg = AdaptiveAverage::new(3, 0.03, 0.1);
/// let first = avg.update(&[1.0, 2.0, 3.0]).unwrap();
/// assert_eq!(first, vec![1.0, 2.0, 3.0]);
/// ```
pub struct AdaptiveAverage {
    size: usize,
    alpha_slow: f64,
    alpha_fast: f64,
    average: Vec<f64>,
    initialized: bool,
}

impl AdaptiveAverage {
    /// Create a filter over vectors of `size` elements.
    #[must_use]
    pub fn new(size: usize, alpha_slow: f64, alpha_fast: f64) -> Self {
        Self {
            size,
            alpha_slow,
            alpha_fast,
            average: vec![0.0; size],
            initialized: false,
        }
    }

    /// Update the average with a new curve and return a snapshot of the
    /// result. The first call stores the input verbatim.
    ///
    /// # Errors
    /// Returns `SizeMismatch` when the input length differs from the
    /// configured size.
    pub fn update(&mut self, new_values: &[f64]) -> Result<Vec<f64>, DspError> {
        if new_values.len() != self.size {
            return Err(DspError::SizeMismatch {
                expected: self.size,
                got: new_values.len(),
            });
        }

        if self.initialized {
            for (avg, &new) in self.average.iter_mut().zip(new_values) {
                let alpha = if new < *avg {
                    self.alpha_fast
                } else {
                    self.alpha_slow
                };
                *avg = alpha * new + (1.0 - alpha) * *avg;
            }
        } else {
            self.average.copy_from_slice(new_values);
            self.initialized = true;
        }

        Ok(self.average.clone())
    }

    /// Snapshot of the current average, no state change.
    #[must_use]
    pub fn current(&self) -> Vec<f64> {
        self.average.clone()
    }

    /// Zero the average and forget initialization.
    pub fn reset(&mut self) {
        self.average.fill(0.0);
        self.initialized = false;
    }

    /// Update either or both learning rates; effective on the next update.
    pub fn set_alphas(&mut self, alpha_slow: Option<f64>, alpha_fast: Option<f64>) {
        if let Some(a) = alpha_slow {
            self.alpha_slow = a;
        }
        if let Some(a) = alpha_fast {
            self.alpha_fast = a;
        }
    }

    /// `true` once the first update has seeded the average.
    #[must_use]
    pub fn is_initialized(&self) -> bool {
        self.initialized
    }

    /// Configured vector length.
    #[must_use]
    pub fn size(&self) -> usize {
        self.size
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn first_update_stores_input_verbatim() {
        let mut avg = AdaptiveAverage::new(4, 0.03, 0.1);
        assert!(!avg.is_initialized());
        let out = avg.update(&[5.0, -2.0, 0.0, 7.5]).unwrap();
        assert_eq!(out, vec![5.0, -2.0, 0.0, 7.5]);
        assert!(avg.is_initialized());
    }

    #[test]
    fn wrong_length_input_is_rejected() {
        let mut avg = AdaptiveAverage::new(4, 0.03, 0.1);
        let err = avg.update(&[1.0, 2.0]).unwrap_err();
        assert!(matches!(
            err,
            DspError::SizeMismatch {
                expected: 4,
                got: 2
            }
        ));
        // State untouched on failure
        assert!(!avg.is_initialized());
    }

    #[test]
    fn update_converges_monotonically_toward_input() {
        let mut avg = AdaptiveAverage::new(2, 0.03, 0.1);
        avg.update(&[10.0, 10.0]).unwrap();
        let out = avg.update(&[20.0, 0.0]).unwrap();
        // Each element lies strictly between previous average and new input
        assert!(out[0] > 10.0 && out[0] < 20.0);
        assert!(out[1] < 10.0 && out[1] > 0.0);
    }

    #[test]
    fn alpha_selection_is_asymmetric_per_element() {
        let mut avg = AdaptiveAverage::new(2, 0.03, 0.1);
        avg.update(&[10.0, 10.0]).unwrap();
        let out = avg.update(&[20.0, 0.0]).unwrap();
        // Above average: slow alpha → 0.03·20 + 0.97·10 = 10.3
        assert!((out[0] - 10.3).abs() < 1e-9);
        // Below average: fast alpha → 0.1·0 + 0.9·10 = 9.0
        assert!((out[1] - 9.0).abs() < 1e-9);
    }

    #[test]
    fn equal_input_uses_slow_alpha_and_stays_put() {
        let mut avg = AdaptiveAverage::new(1, 0.03, 0.1);
        avg.update(&[10.0]).unwrap();
        let out = avg.update(&[10.0]).unwrap();
        assert!((out[0] - 10.0).abs() < 1e-12);
    }

    #[test]
    fn reset_clears_average_and_initialization() {
        let mut avg = AdaptiveAverage::new(2, 0.03, 0.1);
        avg.update(&[10.0, 20.0]).unwrap();
        avg.reset();
        assert!(!avg.is_initialized());
        assert_eq!(avg.current(), vec![0.0, 0.0]);
        // Next update re-seeds verbatim
        let out = avg.update(&[3.0, 4.0]).unwrap();
        assert_eq!(out, vec![3.0, 4.0]);
    }

    #[test]
    fn set_alphas_takes_effect_on_next_update() {
        let mut avg = AdaptiveAverage::new(1, 0.03, 0.1);
        avg.update(&[10.0]).unwrap();
        avg.set_alphas(Some(0.5), None);
        let out = avg.update(&[20.0]).unwrap();
        // 0.5·20 + 0.5·10 = 15
        assert!((out[0] - 15.0).abs() < 1e-9);
    }

    #[test]
    fn returned_snapshot_is_detached_from_internal_state() {
        let mut avg = AdaptiveAverage::new(1, 0.03, 0.1);
        let mut out = avg.update(&[10.0]).unwrap();
        out[0] = 999.0;
        assert!((avg.current()[0] - 10.0).abs() < 1e-12);
    }
}
