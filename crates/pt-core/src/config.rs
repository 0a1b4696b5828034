use std::path::Path;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

/// Configuration complète du détecteur, hot-rechargeable.
///
/// Sérialisable en TOML. Chaque champ a une valeur par défaut saine,
/// reprise du firmware de référence.
///
/// # Example
/// ```
/// use pt_core::config::DetectorConfig;
/// let config = DetectorConfig::default();
/// assert_eq!(config.acquisition.curve_len, 25);
/// ```
#[derive(Clone, Debug, Deserialize, Serialize)]
pub struct DetectorConfig {
    /// Serial channel and curve geometry.
    pub acquisition: AcquisitionConfig,
    /// Baseline/signal adaptive-average learning rates.
    pub filter: FilterConfig,
    /// Feature-extraction windows and trigger threshold.
    pub features: FeatureConfig,
    /// Tone synthesis and signal-to-sound mapping.
    pub audio: AudioConfig,
}

/// Serial acquisition parameters.
#[derive(Clone, Debug, Deserialize, Serialize)]
pub struct AcquisitionConfig {
    /// Périphérique série (ex: /dev/ttyACM0, COM4).
    pub device: String,
    /// Débit en bauds.
    pub baud: u32,
    /// Timeout de lecture bloquante, en millisecondes.
    pub read_timeout_ms: u64,
    /// Nombre d'échantillons par courbe de décharge (N).
    pub curve_len: usize,
    /// Profondeur du ring buffer de courbes (M).
    pub buffer_len: usize,
    /// Intervalle entre échantillons, en microsecondes.
    pub sample_interval_us: f64,
    /// Constante de temps tau pour la compensation de décroissance, en µs.
    pub tau_us: f64,
    /// Appliquer la compensation exponentielle aux valeurs brutes.
    pub compensate: bool,
}

/// Learning rates for the two adaptive averages.
///
/// `*_alpha_fast` applies when the new sample undercuts the current
/// average (downward drift absorbed quickly); `*_alpha_slow` applies
/// otherwise, so real elevation must be sustained to move the baseline.
#[derive(Clone, Debug, Deserialize, Serialize)]
pub struct FilterConfig {
    /// Baseline (slow-tracking) alpha for upward motion.
    pub baseline_alpha_slow: f64,
    /// Baseline alpha for downward motion.
    pub baseline_alpha_fast: f64,
    /// Signal (fast-tracking) alpha for upward motion.
    pub signal_alpha_slow: f64,
    /// Signal alpha for downward motion.
    pub signal_alpha_fast: f64,
}

/// Feature-extraction windows over the normalized curve.
#[derive(Clone, Debug, Deserialize, Serialize)]
pub struct FeatureConfig {
    /// Échantillons ignorés en tête de courbe (artefacts de commutation).
    pub start_index: usize,
    /// Échantillons ignorés en queue de courbe.
    pub end_trim: usize,
    /// Taille de la fenêtre de tête (diviseur fixe de first_half_sum).
    pub leading_window: usize,
    /// Taille de la fenêtre de queue (diviseur fixe de second_half_sum).
    pub trailing_window: usize,
    /// Seuil de pic au-delà duquel un événement de détection est émis.
    /// Valeur empirique du firmware de référence, sans dérivation connue.
    pub trigger_peak: f64,
}

/// Tone synthesis and strength-to-sound mapping.
#[derive(Clone, Debug, Deserialize, Serialize)]
pub struct AudioConfig {
    /// Retour sonore temps réel actif.
    pub enabled: bool,
    /// Fréquence d'échantillonnage du flux de sortie, en Hz.
    pub sample_rate: u32,
    /// Fréquence du ton à signal nul, en Hz.
    pub min_freq: f32,
    /// Fréquence du ton à signal maximal, en Hz.
    pub max_freq: f32,
    /// Volume plancher (jamais totalement muet quand le ton joue).
    pub min_volume: f32,
    /// Volume plafond.
    pub max_volume: f32,
    /// Force de signal correspondant au plein régime fréquence/volume.
    pub max_expected_strength: f64,
    /// Profondeur de la file d'annonces vocales.
    pub announce_queue: usize,
}

impl Default for DetectorConfig {
    fn default() -> Self {
        Self {
            acquisition: AcquisitionConfig {
                device: "/dev/ttyACM0".to_string(),
                baud: 230_400,
                read_timeout_ms: 1000,
                curve_len: 25,
                buffer_len: 100,
                sample_interval_us: 3.0,
                tau_us: 75.0,
                compensate: false,
            },
            filter: FilterConfig {
                baseline_alpha_slow: 0.03,
                baseline_alpha_fast: 0.1,
                signal_alpha_slow: 0.3,
                signal_alpha_fast: 0.3,
            },
            features: FeatureConfig {
                start_index: 4,
                end_trim: 1,
                leading_window: 10,
                trailing_window: 6,
                trigger_peak: 10.0,
            },
            audio: AudioConfig {
                enabled: true,
                sample_rate: 48_000,
                min_freq: 400.0,
                max_freq: 1000.0,
                min_volume: 0.05,
                max_volume: 0.7,
                max_expected_strength: 100.0,
                announce_queue: 8,
            },
        }
    }
}

impl DetectorConfig {
    /// Clamp all numeric fields to their valid ranges.
    /// Called after TOML deserialization to prevent out-of-range values.
    pub fn clamp_all(&mut self) {
        self.acquisition.curve_len = self.acquisition.curve_len.clamp(1, 1024);
        self.acquisition.buffer_len = self.acquisition.buffer_len.clamp(1, 10_000);
        self.acquisition.sample_interval_us = self.acquisition.sample_interval_us.clamp(0.1, 1000.0);
        self.acquisition.tau_us = self.acquisition.tau_us.clamp(1.0, 10_000.0);
        self.acquisition.read_timeout_ms = self.acquisition.read_timeout_ms.clamp(10, 60_000);
        self.filter.baseline_alpha_slow = self.filter.baseline_alpha_slow.clamp(0.001, 1.0);
        self.filter.baseline_alpha_fast = self.filter.baseline_alpha_fast.clamp(0.001, 1.0);
        self.filter.signal_alpha_slow = self.filter.signal_alpha_slow.clamp(0.001, 1.0);
        self.filter.signal_alpha_fast = self.filter.signal_alpha_fast.clamp(0.001, 1.0);
        self.features.leading_window = self.features.leading_window.max(1);
        self.features.trailing_window = self.features.trailing_window.max(1);
        self.features.trigger_peak = self.features.trigger_peak.max(0.0);
        self.audio.sample_rate = self.audio.sample_rate.clamp(8000, 192_000);
        self.audio.min_freq = self.audio.min_freq.clamp(20.0, 20_000.0);
        self.audio.max_freq = self.audio.max_freq.clamp(self.audio.min_freq, 20_000.0);
        self.audio.min_volume = self.audio.min_volume.clamp(0.0, 1.0);
        self.audio.max_volume = self.audio.max_volume.clamp(self.audio.min_volume, 1.0);
        self.audio.max_expected_strength = self.audio.max_expected_strength.max(1.0);
        self.audio.announce_queue = self.audio.announce_queue.clamp(1, 256);
    }
}

/// Structure TOML intermédiaire pour désérialisation avec valeurs optionnelles.
#[derive(Default, Deserialize)]
struct ConfigFile {
    acquisition: Option<AcquisitionSection>,
    filter: Option<FilterSection>,
    features: Option<FeatureSection>,
    audio: Option<AudioSection>,
}

/// Acquisition section of the TOML config, all fields optional for partial override.
#[derive(Deserialize)]
struct AcquisitionSection {
    device: Option<String>,
    baud: Option<u32>,
    read_timeout_ms: Option<u64>,
    curve_len: Option<usize>,
    buffer_len: Option<usize>,
    sample_interval_us: Option<f64>,
    tau_us: Option<f64>,
    compensate: Option<bool>,
}

/// Filter section of the TOML config, all fields optional.
#[derive(Deserialize)]
struct FilterSection {
    baseline_alpha_slow: Option<f64>,
    baseline_alpha_fast: Option<f64>,
    signal_alpha_slow: Option<f64>,
    signal_alpha_fast: Option<f64>,
}

/// Features section of the TOML config, all fields optional.
#[derive(Deserialize)]
struct FeatureSection {
    start_index: Option<usize>,
    end_trim: Option<usize>,
    leading_window: Option<usize>,
    trailing_window: Option<usize>,
    trigger_peak: Option<f64>,
}

/// Audio section of the TOML config, all fields optional.
#[derive(Deserialize)]
struct AudioSection {
    enabled: Option<bool>,
    sample_rate: Option<u32>,
    min_freq: Option<f32>,
    max_freq: Option<f32>,
    min_volume: Option<f32>,
    max_volume: Option<f32>,
    max_expected_strength: Option<f64>,
    announce_queue: Option<usize>,
}

/// Charge un fichier TOML et fusionne avec les valeurs par défaut.
///
/// # Errors
/// Returns an error if the file cannot be read or parsed.
///
/// # Example
/// ```no_run
/// use pt_core::config::load_config;
/// use std::path::Path;
/// let config = load_config(Path::new("config/default.toml")).unwrap();
/// ```
pub fn load_config(path: &Path) -> Result<DetectorConfig> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Impossible de lire {}", path.display()))?;

    let file: ConfigFile = toml::from_str(&content)
        .with_context(|| format!("Erreur de parsing TOML dans {}", path.display()))?;

    let mut config = DetectorConfig::default();

    if let Some(a) = file.acquisition {
        if let Some(v) = a.device {
            config.acquisition.device = v;
        }
        if let Some(v) = a.baud {
            config.acquisition.baud = v;
        }
        if let Some(v) = a.read_timeout_ms {
            config.acquisition.read_timeout_ms = v;
        }
        if let Some(v) = a.curve_len {
            config.acquisition.curve_len = v;
        }
        if let Some(v) = a.buffer_len {
            config.acquisition.buffer_len = v;
        }
        if let Some(v) = a.sample_interval_us {
            config.acquisition.sample_interval_us = v;
        }
        if let Some(v) = a.tau_us {
            config.acquisition.tau_us = v;
        }
        if let Some(v) = a.compensate {
            config.acquisition.compensate = v;
        }
    }

    if let Some(f) = file.filter {
        if let Some(v) = f.baseline_alpha_slow {
            config.filter.baseline_alpha_slow = v;
        }
        if let Some(v) = f.baseline_alpha_fast {
            config.filter.baseline_alpha_fast = v;
        }
        if let Some(v) = f.signal_alpha_slow {
            config.filter.signal_alpha_slow = v;
        }
        if let Some(v) = f.signal_alpha_fast {
            config.filter.signal_alpha_fast = v;
        }
    }

    if let Some(f) = file.features {
        if let Some(v) = f.start_index {
            config.features.start_index = v;
        }
        if let Some(v) = f.end_trim {
            config.features.end_trim = v;
        }
        if let Some(v) = f.leading_window {
            config.features.leading_window = v;
        }
        if let Some(v) = f.trailing_window {
            config.features.trailing_window = v;
        }
        if let Some(v) = f.trigger_peak {
            config.features.trigger_peak = v;
        }
    }

    if let Some(a) = file.audio {
        if let Some(v) = a.enabled {
            config.audio.enabled = v;
        }
        if let Some(v) = a.sample_rate {
            config.audio.sample_rate = v;
        }
        if let Some(v) = a.min_freq {
            config.audio.min_freq = v;
        }
        if let Some(v) = a.max_freq {
            config.audio.max_freq = v;
        }
        if let Some(v) = a.min_volume {
            config.audio.min_volume = v;
        }
        if let Some(v) = a.max_volume {
            config.audio.max_volume = v;
        }
        if let Some(v) = a.max_expected_strength {
            config.audio.max_expected_strength = v;
        }
        if let Some(v) = a.announce_queue {
            config.audio.announce_queue = v;
        }
    }

    config.clamp_all();
    Ok(config)
}
