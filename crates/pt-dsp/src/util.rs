/// Extrait un sous-ensemble de `samples` et le normalise sur [0, 1].
///
/// `last` est relatif à la fin quand il est ≤ 0 (comme un index négatif) :
/// `-1` exclut le dernier échantillon, `0` va jusqu'au bout. Un
/// sous-ensemble constant devient 0.5 partout ; un sous-ensemble vide
/// donne un vecteur vide.
///
/// # Example
/// ```
/// use pt_dsp::util::normalize_samples;
/// let out = normalize_samples(&[100.0, 200.0, 500.0, 1000.0, 800.0, 600.0, 50.0], 1, -1);
/// assert_eq!(out, vec![0.0, 0.375, 1.0, 0.75, 0.5]);
/// ```
#[must_use]
pub fn normalize_samples(samples: &[f64], first: usize, last: isize) -> Vec<f64> {
    let end = if last <= 0 {
        samples.len().saturating_sub(last.unsigned_abs())
    } else {
        (last as usize).min(samples.len())
    };

    if first >= end {
        return Vec::new();
    }
    let subset = &samples[first..end];

    let min = subset.iter().copied().fold(f64::INFINITY, f64::min);
    let max = subset.iter().copied().fold(f64::NEG_INFINITY, f64::max);
    let range = max - min;

    if range > 0.0 {
        subset.iter().map(|&s| (s - min) / range).collect()
    } else {
        vec![0.5; subset.len()]
    }
}

/// Table de compensation de décroissance exponentielle : `exp(i·dt/tau)`
/// pour chaque index d'échantillon.
///
/// Multiplier une courbe brute par cette table aplatit la décharge
/// exponentielle de constante `tau_us`, ce qui rend les cibles lentes
/// visibles en queue de courbe.
#[must_use]
pub fn compensation_factors(len: usize, sample_interval_us: f64, tau_us: f64) -> Vec<f64> {
    (0..len)
        .map(|i| (i as f64 * sample_interval_us / tau_us).exp())
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn normalize_extracts_and_scales_reference_example() {
        let samples = [100.0, 200.0, 500.0, 1000.0, 800.0, 600.0, 50.0];
        let out = normalize_samples(&samples, 1, -1);
        assert_eq!(out, vec![0.0, 0.375, 1.0, 0.75, 0.5]);
    }

    #[test]
    fn normalize_full_range_with_zero_last() {
        let out = normalize_samples(&[0.0, 5.0, 10.0], 0, 0);
        assert_eq!(out, vec![0.0, 0.5, 1.0]);
    }

    #[test]
    fn constant_subset_maps_to_half() {
        let out = normalize_samples(&[7.0, 7.0, 7.0], 0, 0);
        assert_eq!(out, vec![0.5, 0.5, 0.5]);
    }

    #[test]
    fn empty_subset_yields_empty_vec() {
        assert!(normalize_samples(&[1.0, 2.0], 2, 0).is_empty());
        assert!(normalize_samples(&[1.0, 2.0], 0, -2).is_empty());
        assert!(normalize_samples(&[], 0, 0).is_empty());
    }

    #[test]
    fn compensation_starts_at_one_and_grows() {
        let factors = compensation_factors(25, 3.0, 75.0);
        assert_eq!(factors.len(), 25);
        assert!((factors[0] - 1.0).abs() < 1e-12);
        // exp(24·3/75) = exp(0.96)
        assert!((factors[24] - 0.96f64.exp()).abs() < 1e-9);
        assert!(factors.windows(2).all(|w| w[1] > w[0]));
    }
}
