use serde::Serialize;

/// Une courbe de décharge acquise : N échantillons horodatés.
///
/// Immuable après construction. Les temps d'échantillonnage sont dérivés
/// de l'intervalle fixe entre points, pas mesurés.
///
/// # Example
/// ```
/// use pt_core::curve::Curve;
/// let curve = Curve::new(1.5, vec![0.0, 1.0, 2.0], 3.0);
/// assert_eq!(curve.len(), 3);
/// assert!((curve.times_us[2] - 6.0).abs() < 1e-12);
/// ```
#[derive(Clone, Debug, Serialize)]
pub struct Curve {
    /// Secondes écoulées depuis le début de l'acquisition (monotone).
    pub timestamp: f64,
    /// Valeurs des échantillons, longueur N.
    pub values: Vec<f64>,
    /// Offset temporel de chaque échantillon, en µs, longueur N.
    pub times_us: Vec<f64>,
}

impl Curve {
    /// Build a curve from sample values and a fixed inter-sample interval.
    #[must_use]
    pub fn new(timestamp: f64, values: Vec<f64>, sample_interval_us: f64) -> Self {
        let times_us = (0..values.len())
            .map(|i| i as f64 * sample_interval_us)
            .collect();
        Self {
            timestamp,
            values,
            times_us,
        }
    }

    /// Number of samples in the curve.
    #[must_use]
    pub fn len(&self) -> usize {
        self.values.len()
    }

    /// `true` when the curve holds no samples.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}

/// Vue copie des deux moyennes adaptatives, publiée après chaque courbe
/// acceptée. Consommée par l'UI et le streaming, jamais mutée en place.
#[derive(Clone, Debug, Default, Serialize)]
pub struct AverageSnapshot {
    /// Moyenne lente (niveau ambiant).
    pub baseline: Vec<f64>,
    /// Moyenne rapide (réponse instantanée du détecteur).
    pub signal: Vec<f64>,
    /// Offsets temporels partagés, en µs.
    pub times_us: Vec<f64>,
}
