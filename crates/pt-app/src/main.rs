use std::sync::Arc;
use std::time::Duration;

use anyhow::Result;
use arc_swap::ArcSwap;
use clap::Parser;
use pt_acquire::reader::{AcquireShared, Pipeline};
use pt_acquire::serial::SerialSource;
use pt_audio::announce::{Announce, AnnouncerHandle, LogAnnouncer};
use pt_audio::tone::{ToneControl, ToneOutput};
use pt_core::config::DetectorConfig;

pub mod cli;
pub mod hotreload;

fn main() -> Result<()> {
    // 1. Parser CLI
    let cli = cli::Cli::parse();

    // 2. Initialiser le logging
    env_logger::Builder::new()
        .filter_level(cli.log_level.parse().unwrap_or(log::LevelFilter::Warn))
        .init();

    // 3. Charger la config et appliquer les overrides CLI
    let mut config = resolve_config(&cli)?;
    if let Some(ref device) = cli.device {
        config.acquisition.device.clone_from(device);
    }
    if let Some(baud) = cli.baud {
        config.acquisition.baud = baud;
    }
    if cli.no_sound {
        config.audio.enabled = false;
    }

    let config = Arc::new(ArcSwap::from_pointee(config));

    // 4. Lancer le hot-reload config (thread interne notify)
    let _watcher = hotreload::spawn_config_watcher(&cli.config, &config)?;

    // 5. Démarrer la chaîne audio (sauf --no-sound)
    let (tone_output, tone_control, announce) = init_audio(&config);
    let (announce_tx, announce_handle) = match announce {
        Some((tx, handle)) => (Some(tx), Some(handle)),
        None => (None, None),
    };

    // 6. Ouvrir le port série et lancer la boucle d'acquisition
    let startup = config.load_full();
    let source = SerialSource::open(
        &startup.acquisition.device,
        startup.acquisition.baud,
        Duration::from_millis(startup.acquisition.read_timeout_ms),
    )?;
    let shared = AcquireShared::new(Arc::clone(&config));
    let pipeline = Pipeline::new(shared, tone_control, announce_tx);
    let reader = pt_acquire::reader::spawn_reader(source, pipeline)?;

    // 7. Attendre Ctrl-C
    let (stop_tx, stop_rx) = flume::bounded::<()>(1);
    ctrlc::set_handler(move || {
        let _ = stop_tx.try_send(());
    })?;
    log::info!("pulsetone en marche — Ctrl-C pour arrêter");
    let _ = stop_rx.recv();

    // 8. Arrêt ordonné : lecture, annonces, ton
    reader.stop();
    if let Some(handle) = announce_handle {
        handle.stop();
    }
    drop(tone_output);

    Ok(())
}

/// Start the tone stream, the startup beep, and the announcement worker.
///
/// Audio is best-effort: without an output device the detector still
/// acquires and publishes snapshots, it just runs silent.
fn init_audio(
    config: &Arc<ArcSwap<DetectorConfig>>,
) -> (
    Option<ToneOutput>,
    Option<ToneControl>,
    Option<(flume::Sender<Announce>, AnnouncerHandle)>,
) {
    let audio = config.load().audio.clone();
    if !audio.enabled {
        return (None, None, None);
    }

    // Bip de démarrage : auto-test sonore
    if let Err(e) = pt_audio::beep::beep(audio.sample_rate, 440.0, 0.2, 0.3) {
        log::warn!("Bip de démarrage impossible : {e}");
    }

    let (output, control) = match ToneOutput::start(&audio) {
        Ok(pair) => pair,
        Err(e) => {
            log::warn!("Audio non disponible : {e}");
            return (None, None, None);
        }
    };

    let announce = match pt_audio::announce::spawn_announcer(audio.announce_queue, LogAnnouncer) {
        Ok(pair) => Some(pair),
        Err(e) => {
            log::warn!("Worker d'annonces non démarré : {e}");
            None
        }
    };

    (Some(output), Some(control), announce)
}

/// Resolve config: file when present, defaults with a warning otherwise.
fn resolve_config(cli: &cli::Cli) -> Result<DetectorConfig> {
    if cli.config.exists() {
        pt_core::config::load_config(&cli.config)
    } else {
        log::warn!(
            "Config introuvable : {}. Utilisation des défauts.",
            cli.config.display()
        );
        Ok(DetectorConfig::default())
    }
}
