use std::f64::consts::TAU;

/// Oscillateur sinus à phase continue.
///
/// La phase est possédée exclusivement par le chemin de génération :
/// elle n'avance que dans `fill`, et les changements de fréquence ou de
/// volume ne prennent effet qu'entre deux blocs. C'est ce qui garantit
/// l'absence de clic quand la boucle d'acquisition pousse de nouveaux
/// paramètres pendant que le flux joue.
///
/// # Example
/// ```
/// use pt_audio::osc::Oscillator;
/// let mut osc = Oscillator::new(48_000);
/// osc.set_frequency(440.0);
/// osc.set_volume(0.3);
/// let mut block = [0.0f32; 512];
/// osc.fill(&mut block);
/// assert!(block.iter().all(|s| s.abs() <= 0.3));
/// ```
pub struct Oscillator {
    sample_rate: u32,
    frequency: f32,
    volume: f32,
    phase: f64,
}

impl Oscillator {
    /// Create a silent oscillator at the given sample rate.
    #[must_use]
    pub fn new(sample_rate: u32) -> Self {
        Self {
            sample_rate,
            frequency: 440.0,
            volume: 0.0,
            phase: 0.0,
        }
    }

    /// Set the tone frequency; applied from the next `fill` block.
    pub fn set_frequency(&mut self, hz: f32) {
        self.frequency = hz;
    }

    /// Set the tone volume, clamped to [0, 1]; applied from the next block.
    pub fn set_volume(&mut self, volume: f32) {
        self.volume = volume.clamp(0.0, 1.0);
    }

    /// Generate one block of samples and advance the phase.
    ///
    /// `out[i] = volume · sin(2π·f·i/rate + phase)`, then the phase
    /// advances by `2π·f·frames/rate`, wrapped to [0, 2π). Wrapping the
    /// accumulator keeps precision stable over long sessions.
    pub fn fill(&mut self, out: &mut [f32]) {
        let step = TAU * f64::from(self.frequency) / f64::from(self.sample_rate);
        let volume = f64::from(self.volume);
        for (i, sample) in out.iter_mut().enumerate() {
            *sample = (volume * (self.phase + step * i as f64).sin()) as f32;
        }
        self.phase = (self.phase + step * out.len() as f64) % TAU;
    }

    /// Reset the phase to 0 (tone restart).
    pub fn reset(&mut self) {
        self.phase = 0.0;
    }

    /// Current phase in radians, wrapped to [0, 2π).
    #[must_use]
    pub fn phase(&self) -> f64 {
        self.phase
    }

    /// Current frequency in Hz.
    #[must_use]
    pub fn frequency(&self) -> f32 {
        self.frequency
    }

    /// Current volume in [0, 1].
    #[must_use]
    pub fn volume(&self) -> f32 {
        self.volume
    }
}
