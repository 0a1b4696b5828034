use serde::Serialize;

/// Features scalaires extraites d'une courbe normalisée, plus l'état du
/// suivi de pic.
///
/// Une seule instance logique : écrite par la boucle d'acquisition, lue
/// en copie par l'audio et le streaming.
///
/// # Example
/// ```
/// use pt_core::features::FeatureSet;
/// let f = FeatureSet::default();
/// assert!((f.diff - 0.0).abs() < 1e-12);
/// ```
#[derive(Clone, Copy, Debug, Default, Serialize)]
pub struct FeatureSet {
    /// Somme de la tranche intérieure de la courbe.
    pub total_sum: f64,
    /// Moyenne de la fenêtre de tête (diviseur fixe).
    pub first_half_sum: f64,
    /// Moyenne de la fenêtre de queue (diviseur fixe).
    pub second_half_sum: f64,
    /// first_half_sum − second_half_sum.
    pub diff: f64,
    /// Accumulation de diff tant qu'il reste ≥ 0.
    pub cumulative_total: f64,
    /// Maximum de diff observé dans la montée courante.
    pub peak: f64,
    /// second_half_sum / first_half_sum capturé au moment du nouveau pic.
    pub ratio: f64,
    /// Horodatage de la dernière extraction, en secondes.
    pub timestamp: f64,
}
