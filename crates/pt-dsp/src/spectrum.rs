use realfft::RealFftPlanner;

/// Spectre d'une courbe : bins positifs seulement.
///
/// Destiné aux collaborateurs de tracé (waterfall) ; sérialisé côté
/// streaming à partir des deux vecteurs.
#[derive(Clone, Debug, Default)]
pub struct Spectrum {
    /// Fréquence centrale de chaque bin, en Hz.
    pub frequencies: Vec<f64>,
    /// Magnitude de chaque bin.
    pub magnitudes: Vec<f64>,
}

/// FFT réelle d'une courbe de décharge via realfft.
///
/// Pre-allocates the FFT plan and scratch buffers; `process` does not
/// allocate beyond its output.
///
/// # Example
/// ```
/// use pt_dsp::spectrum::SpectrumAnalyzer;
/// let mut analyzer = SpectrumAnalyzer::new(25, 3.0);
/// let spectrum = analyzer.process(&[0.0; 25]);
/// assert_eq!(spectrum.magnitudes.len(), 13); // N/2 + 1
/// ```
pub struct SpectrumAnalyzer {
    len: usize,
    sample_rate: f64,
    input_buf: Vec<f64>,
    spectrum_buf: Vec<realfft::num_complex::Complex<f64>>,
    scratch: Vec<realfft::num_complex::Complex<f64>>,
    plan: std::sync::Arc<dyn realfft::RealToComplex<f64>>,
}

impl SpectrumAnalyzer {
    /// Create an analyzer for curves of `len` samples spaced
    /// `sample_interval_us` microseconds apart.
    ///
    /// # Panics
    /// Panics if `len` is 0.
    #[must_use]
    pub fn new(len: usize, sample_interval_us: f64) -> Self {
        assert!(len > 0, "curve length must be > 0");

        let mut planner = RealFftPlanner::<f64>::new();
        let plan = planner.plan_fft_forward(len);

        let input_buf = plan.make_input_vec();
        let spectrum_buf = plan.make_output_vec();
        let scratch = plan.make_scratch_vec();

        Self {
            len,
            sample_rate: 1e6 / sample_interval_us,
            input_buf,
            spectrum_buf,
            scratch,
            plan,
        }
    }

    /// Forward FFT of `samples`, magnitudes of the positive bins.
    ///
    /// Inputs shorter than the configured length are zero-padded, longer
    /// ones truncated.
    pub fn process(&mut self, samples: &[f64]) -> Spectrum {
        let n = self.len.min(samples.len());
        for (i, slot) in self.input_buf.iter_mut().enumerate() {
            *slot = if i < n { samples[i] } else { 0.0 };
        }

        let bins = self.spectrum_buf.len();
        if self
            .plan
            .process_with_scratch(&mut self.input_buf, &mut self.spectrum_buf, &mut self.scratch)
            .is_err()
        {
            return Spectrum {
                frequencies: vec![0.0; bins],
                magnitudes: vec![0.0; bins],
            };
        }

        let bin_hz = self.sample_rate / self.len as f64;
        Spectrum {
            frequencies: (0..bins).map(|i| i as f64 * bin_hz).collect(),
            magnitudes: self
                .spectrum_buf
                .iter()
                .map(|c| (c.re * c.re + c.im * c.im).sqrt())
                .collect(),
        }
    }

    /// Sample rate derived from the inter-sample interval, in Hz.
    #[must_use]
    pub fn sample_rate(&self) -> f64 {
        self.sample_rate
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bin_count_is_half_plus_one() {
        let mut analyzer = SpectrumAnalyzer::new(25, 3.0);
        let spectrum = analyzer.process(&[1.0; 25]);
        assert_eq!(spectrum.magnitudes.len(), 13);
        assert_eq!(spectrum.frequencies.len(), 13);
    }

    #[test]
    fn dc_bin_equals_sum_of_samples() {
        let mut analyzer = SpectrumAnalyzer::new(8, 3.0);
        let spectrum = analyzer.process(&[2.0; 8]);
        assert!((spectrum.magnitudes[0] - 16.0).abs() < 1e-9);
        assert!((spectrum.frequencies[0]).abs() < 1e-12);
        // Constant input has no energy outside DC
        for mag in &spectrum.magnitudes[1..] {
            assert!(mag.abs() < 1e-9);
        }
    }

    #[test]
    fn sample_rate_derived_from_interval() {
        let analyzer = SpectrumAnalyzer::new(25, 3.0);
        assert!((analyzer.sample_rate() - 1e6 / 3.0).abs() < 1e-6);
    }
}
