use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::thread;
use std::time::{Duration, Instant};

use arc_swap::{ArcSwap, ArcSwapOption};
use pt_audio::announce::Announce;
use pt_audio::tone::ToneControl;
use pt_core::config::DetectorConfig;
use pt_core::curve::{AverageSnapshot, Curve};
use pt_core::features::FeatureSet;
use pt_core::store::CurveStore;
use pt_dsp::extract::FeatureExtractor;
use pt_dsp::filter::AdaptiveAverage;
use pt_dsp::util::compensation_factors;

use crate::error::AcquireError;
use crate::parser::CurveParser;
use crate::serial::LineSource;

/// Pause avant nouvelle tentative après un échec de lecture série.
const RETRY_BACKOFF: Duration = Duration::from_millis(100);

/// État partagé entre la boucle d'acquisition (écrivain unique) et les
/// consommateurs externes (UI, streaming).
///
/// Toutes les lectures sont des copies instantanées — jamais de
/// référence vivante sur l'état interne de la boucle.
#[derive(Clone)]
pub struct AcquireShared {
    /// Configuration hot-rechargeable (tau, alphas, drapeau son).
    pub config: Arc<ArcSwap<DetectorConfig>>,
    /// Ring des dernières courbes.
    pub store: Arc<CurveStore>,
    /// Dernières moyennes baseline/signal publiées.
    pub averages: Arc<ArcSwapOption<AverageSnapshot>>,
    /// Dernier jeu de features publié.
    pub features: Arc<ArcSwap<FeatureSet>>,
}

impl AcquireShared {
    /// Build the shared state around an already-wrapped configuration.
    #[must_use]
    pub fn new(config: Arc<ArcSwap<DetectorConfig>>) -> Self {
        let buffer_len = config.load().acquisition.buffer_len;
        Self {
            config,
            store: Arc::new(CurveStore::new(buffer_len)),
            averages: Arc::new(ArcSwapOption::empty()),
            features: Arc::new(ArcSwap::from_pointee(FeatureSet::default())),
        }
    }

    /// The most recent accepted curve.
    #[must_use]
    pub fn latest_curve(&self) -> Option<Arc<Curve>> {
        self.store.latest()
    }

    /// Copy-out of the whole curve ring, oldest first.
    #[must_use]
    pub fn curve_snapshot(&self) -> Vec<Arc<Curve>> {
        self.store.snapshot()
    }

    /// Copy of the last published baseline/signal averages.
    #[must_use]
    pub fn average_snapshot(&self) -> Option<AverageSnapshot> {
        self.averages.load_full().map(|a| (*a).clone())
    }

    /// Copy of the last published feature set.
    #[must_use]
    pub fn feature_snapshot(&self) -> FeatureSet {
        **self.features.load()
    }

    /// Drop buffered curves and published averages.
    pub fn clear(&self) {
        self.store.clear();
        self.averages.store(None);
    }
}

/// Le pipeline par-ligne : parse → filtres → store → features → ton.
///
/// Séparé de la boucle de lecture pour être testable avec des lignes
/// scriptées, sans port série ni thread.
pub struct Pipeline {
    shared: AcquireShared,
    parser: CurveParser,
    baseline: AdaptiveAverage,
    signal: AdaptiveAverage,
    extractor: FeatureExtractor,
    tone: Option<ToneControl>,
    announce_tx: Option<flume::Sender<Announce>>,
}

impl Pipeline {
    /// Assemble the pipeline from the startup configuration.
    ///
    /// `tone` and `announce_tx` are optional: without them the pipeline
    /// still filters, stores, and publishes snapshots.
    #[must_use]
    pub fn new(
        shared: AcquireShared,
        tone: Option<ToneControl>,
        announce_tx: Option<flume::Sender<Announce>>,
    ) -> Self {
        let config = shared.config.load_full();
        let n = config.acquisition.curve_len;
        Self {
            parser: CurveParser::new(n),
            baseline: AdaptiveAverage::new(
                n,
                config.filter.baseline_alpha_slow,
                config.filter.baseline_alpha_fast,
            ),
            signal: AdaptiveAverage::new(
                n,
                config.filter.signal_alpha_slow,
                config.filter.signal_alpha_fast,
            ),
            extractor: FeatureExtractor::new(&config.features),
            shared,
            tone,
            announce_tx,
        }
    }

    /// Process one serial line. Returns `Ok(true)` when the line was a
    /// valid curve, `Ok(false)` when it was dropped.
    ///
    /// A dropped line touches neither the filters nor the store.
    ///
    /// # Errors
    /// Only a filter `SizeMismatch` propagates — curve lengths are
    /// pre-validated by the parser, so this indicates a config change
    /// the pipeline was not rebuilt for.
    pub fn process_line(&mut self, line: &str, timestamp: f64) -> Result<bool, AcquireError> {
        let values = match self.parser.parse(line) {
            Ok(values) => values,
            Err(e) => {
                log::warn!("Ligne rejetée : {e}");
                return Ok(false);
            }
        };

        let config = self.shared.config.load();
        let acq = &config.acquisition;

        let values: Vec<f64> = if acq.compensate {
            let factors = compensation_factors(values.len(), acq.sample_interval_us, acq.tau_us);
            values.iter().zip(&factors).map(|(v, f)| v * f).collect()
        } else {
            values
        };

        // Alphas re-read from the hot config: runtime tuning lands on
        // the next update
        self.baseline.set_alphas(
            Some(config.filter.baseline_alpha_slow),
            Some(config.filter.baseline_alpha_fast),
        );
        self.signal.set_alphas(
            Some(config.filter.signal_alpha_slow),
            Some(config.filter.signal_alpha_fast),
        );
        self.baseline.update(&values)?;
        self.signal.update(&values)?;

        let baseline = self.baseline.current();
        let signal = self.signal.current();
        let normalized: Vec<f64> = signal.iter().zip(&baseline).map(|(s, b)| s - b).collect();

        let curve = Curve::new(timestamp, values, acq.sample_interval_us);
        let times_us = curve.times_us.clone();
        self.shared.store.push(curve);
        self.shared.averages.store(Some(Arc::new(AverageSnapshot {
            baseline,
            signal,
            times_us,
        })));

        if config.audio.enabled {
            self.extractor.extract(&normalized, timestamp);
            if let Some(trigger) = self.extractor.update_peak_tracker()
                && let Some(tx) = &self.announce_tx
                && tx.try_send(Announce::Code(trigger)).is_err()
            {
                log::warn!("File d'annonces pleine, code {trigger} abandonné");
            }
            let features = self.extractor.features();
            self.shared.features.store(Arc::new(features));

            let strength = features.first_half_sum;
            let shape_ratio = if features.second_half_sum > 0.0 {
                features.first_half_sum / features.second_half_sum
            } else {
                1.0
            };
            if let Some(tone) = self.tone.as_mut() {
                tone.apply_signal(strength, shape_ratio);
            }
        } else if let Some(tone) = self.tone.as_mut()
            && tone.is_playing()
        {
            tone.stop();
        }

        Ok(true)
    }
}

/// Poignée du thread d'acquisition.
///
/// `stop()` lève le drapeau puis join ; le join est borné par le timeout
/// de lecture série plus le traitement d'une ligne.
pub struct ReaderHandle {
    stop: Arc<AtomicBool>,
    thread: Option<thread::JoinHandle<()>>,
}

impl ReaderHandle {
    /// Signal the loop to stop and wait for it.
    pub fn stop(mut self) {
        self.stop.store(true, Ordering::Relaxed);
        if let Some(handle) = self.thread.take() {
            let _ = handle.join();
        }
        log::info!("Lecture série arrêtée");
    }
}

/// Spawn the acquisition thread over `source`, running `pipeline` on
/// every line until stopped.
///
/// # Errors
/// Returns an error if the thread cannot be spawned.
pub fn spawn_reader(
    source: impl LineSource,
    pipeline: Pipeline,
) -> anyhow::Result<ReaderHandle> {
    let stop = Arc::new(AtomicBool::new(false));
    let stop_flag = Arc::clone(&stop);
    let mut source = source;

    let thread = thread::Builder::new()
        .name("pt-acquire".to_string())
        .spawn(move || {
            if let Err(e) = run_loop(&mut source, pipeline, &stop_flag) {
                log::error!("Boucle d'acquisition terminée sur erreur : {e}");
            }
        })?;

    log::info!("Lecture série démarrée");
    Ok(ReaderHandle {
        stop,
        thread: Some(thread),
    })
}

/// The acquisition loop proper. Read errors are logged and retried
/// after a backoff; nothing here is fatal except a filter size
/// mismatch, which propagates.
fn run_loop(
    source: &mut dyn LineSource,
    mut pipeline: Pipeline,
    stop: &AtomicBool,
) -> Result<(), AcquireError> {
    let start = Instant::now();
    while !stop.load(Ordering::Relaxed) {
        let line = match source.read_line() {
            Ok(Some(line)) => line,
            Ok(None) => continue,
            Err(e) => {
                log::error!("Lecture série en échec : {e}");
                thread::sleep(RETRY_BACKOFF);
                continue;
            }
        };
        pipeline.process_line(&line, start.elapsed().as_secs_f64())?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn shared_with(mutate: impl FnOnce(&mut DetectorConfig)) -> AcquireShared {
        let mut config = DetectorConfig::default();
        mutate(&mut config);
        AcquireShared::new(Arc::new(ArcSwap::from_pointee(config)))
    }

    fn csv(values: &[f64]) -> String {
        values
            .iter()
            .map(ToString::to_string)
            .collect::<Vec<_>>()
            .join(",")
    }

    #[test]
    fn accepted_line_feeds_store_and_snapshots() {
        let shared = shared_with(|c| c.acquisition.curve_len = 4);
        let mut pipeline = Pipeline::new(shared.clone(), None, None);

        let accepted = pipeline.process_line("1,2,3,4", 0.5).unwrap();
        assert!(accepted);
        assert_eq!(shared.store.len(), 1);
        let latest = shared.latest_curve().unwrap();
        assert_eq!(latest.values, vec![1.0, 2.0, 3.0, 4.0]);
        assert!((latest.timestamp - 0.5).abs() < 1e-12);

        // First update seeds both averages verbatim
        let averages = shared.average_snapshot().unwrap();
        assert_eq!(averages.baseline, vec![1.0, 2.0, 3.0, 4.0]);
        assert_eq!(averages.signal, vec![1.0, 2.0, 3.0, 4.0]);
    }

    #[test]
    fn rejected_line_leaves_all_state_untouched() {
        let shared = shared_with(|c| c.acquisition.curve_len = 4);
        let mut pipeline = Pipeline::new(shared.clone(), None, None);

        assert!(!pipeline.process_line("1,zut,3,4", 0.0).unwrap());
        assert!(!pipeline.process_line("1,2", 0.0).unwrap());
        assert!(shared.store.is_empty());
        assert!(shared.average_snapshot().is_none());

        // The next valid line still seeds verbatim: filters were never touched
        pipeline.process_line("5,6,7,8", 0.1).unwrap();
        let averages = shared.average_snapshot().unwrap();
        assert_eq!(averages.baseline, vec![5.0, 6.0, 7.0, 8.0]);
    }

    #[test]
    fn audio_disabled_skips_feature_extraction() {
        let shared = shared_with(|c| {
            c.acquisition.curve_len = 4;
            c.audio.enabled = false;
        });
        let mut pipeline = Pipeline::new(shared.clone(), None, None);
        pipeline.process_line("10,10,10,10", 0.0).unwrap();
        let features = shared.feature_snapshot();
        assert!((features.total_sum).abs() < 1e-12);
        // The curve itself is still stored
        assert_eq!(shared.store.len(), 1);
    }

    #[test]
    fn compensation_scales_stored_values() {
        let shared = shared_with(|c| {
            c.acquisition.curve_len = 3;
            c.acquisition.compensate = true;
            c.acquisition.sample_interval_us = 3.0;
            c.acquisition.tau_us = 75.0;
        });
        let mut pipeline = Pipeline::new(shared.clone(), None, None);
        pipeline.process_line("100,100,100", 0.0).unwrap();
        let latest = shared.latest_curve().unwrap();
        assert!((latest.values[0] - 100.0).abs() < 1e-9);
        assert!((latest.values[1] - 100.0 * (3.0f64 / 75.0).exp()).abs() < 1e-9);
        assert!(latest.values[2] > latest.values[1]);
    }

    #[test]
    fn strong_then_fading_signal_emits_conductivity_code() {
        let shared = shared_with(|c| c.acquisition.curve_len = 25);
        let (tx, rx) = flume::bounded(8);
        let mut pipeline = Pipeline::new(shared.clone(), None, Some(tx));

        // Baseline: flat zero curve
        let flat = vec![0.0; 25];
        pipeline.process_line(&csv(&flat), 0.0).unwrap();

        // Strong leading-edge response: normalized first half shoots up
        let mut hot = vec![0.0; 25];
        for v in hot.iter_mut().take(10) {
            *v = 1000.0;
        }
        pipeline.process_line(&csv(&hot), 0.1).unwrap();
        assert!(shared.feature_snapshot().peak > 10.0);
        assert!(rx.is_empty());

        // Response collapses to the trailing half: diff goes negative,
        // the run ends, the code fires
        let mut tail = vec![0.0; 25];
        for v in tail.iter_mut().skip(15) {
            *v = 1000.0;
        }
        pipeline.process_line(&csv(&tail), 0.2).unwrap();

        let msg = rx.try_recv().unwrap();
        assert!(matches!(msg, Announce::Code(_)));
        let features = shared.feature_snapshot();
        assert!((features.peak).abs() < 1e-12);
        assert!((features.cumulative_total).abs() < 1e-12);
    }

    #[test]
    fn store_eviction_holds_under_sustained_input() {
        let shared = shared_with(|c| {
            c.acquisition.curve_len = 2;
            c.acquisition.buffer_len = 5;
        });
        let mut pipeline = Pipeline::new(shared.clone(), None, None);
        for i in 0..20 {
            pipeline
                .process_line(&csv(&[f64::from(i), 0.0]), f64::from(i))
                .unwrap();
        }
        assert_eq!(shared.store.len(), 5);
        let snapshot = shared.curve_snapshot();
        assert!((snapshot[0].values[0] - 15.0).abs() < 1e-12);
        assert!((snapshot[4].values[0] - 19.0).abs() < 1e-12);
    }
}
