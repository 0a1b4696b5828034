use std::path::Path;
use std::sync::Arc;

use anyhow::Result;
use arc_swap::ArcSwap;
use notify::{Event, EventKind, RecursiveMode, Watcher};
use pt_core::config::DetectorConfig;

/// Lance un thread qui surveille le fichier config et met à jour l'ArcSwap.
///
/// C'est par ce canal que tau, les alphas et le drapeau son atteignent
/// la boucle d'acquisition en cours de route. Retourne le Watcher (doit
/// rester vivant tant que l'app tourne), ou `None` quand le fichier
/// n'existe pas : l'app tourne alors sur les défauts, sans hot-reload.
///
/// # Errors
/// Returns an error if the watcher cannot be created or the path cannot
/// be watched.
///
/// # Example
/// ```no_run
/// use std::sync::Arc;
/// use arc_swap::ArcSwap;
/// use pt_core::config::DetectorConfig;
/// use std::path::Path;
///
/// let config = Arc::new(ArcSwap::from_pointee(DetectorConfig::default()));
/// // let _watcher = spawn_config_watcher(Path::new("config/default.toml"), &config);
/// ```
pub fn spawn_config_watcher(
    config_path: &Path,
    config: &Arc<ArcSwap<DetectorConfig>>,
) -> Result<Option<impl Watcher + use<>>> {
    if !config_path.exists() {
        log::warn!(
            "Pas de fichier config à surveiller : {}. Hot-reload désactivé.",
            config_path.display()
        );
        return Ok(None);
    }

    let config = Arc::clone(config);
    let path = config_path.to_path_buf();

    let mut watcher = notify::recommended_watcher(move |res: notify::Result<Event>| {
        if let Ok(event) = res {
            if matches!(event.kind, EventKind::Modify(_)) {
                match pt_core::config::load_config(&path) {
                    Ok(new_config) => {
                        config.store(Arc::new(new_config));
                        log::info!("Config rechargée depuis {}", path.display());
                    }
                    Err(e) => {
                        log::warn!("Erreur de rechargement config : {e}");
                        // On garde l'ancienne config. Pas de panic.
                    }
                }
            }
        }
    })?;

    watcher.watch(config_path, RecursiveMode::NonRecursive)?;
    Ok(Some(watcher))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_config_file_runs_without_hot_reload() {
        let config = Arc::new(ArcSwap::from_pointee(DetectorConfig::default()));
        let watcher =
            spawn_config_watcher(Path::new("/nonexistent/pulsetone.toml"), &config).unwrap();
        assert!(watcher.is_none());
    }

    #[test]
    fn existing_config_file_gets_a_watcher() {
        let file = tempfile::NamedTempFile::new().unwrap();
        let config = Arc::new(ArcSwap::from_pointee(DetectorConfig::default()));
        let watcher = spawn_config_watcher(file.path(), &config).unwrap();
        assert!(watcher.is_some());
    }
}
