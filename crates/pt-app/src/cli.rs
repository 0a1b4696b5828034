use std::path::PathBuf;

use clap::Parser;

/// pulsetone — Pulse-induction detector head unit.
#[derive(Parser, Debug)]
#[command(version, about, long_about = None)]
pub struct Cli {
    /// Périphérique série du détecteur (ex: /dev/ttyACM0, COM4).
    #[arg(long)]
    pub device: Option<String>,

    /// Débit série en bauds.
    #[arg(long)]
    pub baud: Option<u32>,

    /// Fichier de configuration TOML. Défaut : config/default.toml.
    #[arg(short, long, default_value = "config/default.toml")]
    pub config: PathBuf,

    /// Désactiver tout retour sonore (ton continu, bip, annonces).
    #[arg(long, default_value_t = false)]
    pub no_sound: bool,

    /// Niveau de log : error, warn, info, debug, trace.
    #[arg(long, default_value = "warn")]
    pub log_level: String,
}
