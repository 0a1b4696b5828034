use pt_dsp::error::DspError;
use thiserror::Error;

/// Errors originating from the acquisition module.
///
/// `Parse`, `LengthMismatch` and `Channel` are recoverable: the line is
/// dropped (or the read retried) and the loop continues. `Dsp` wraps a
/// filter size mismatch, a programming error that propagates.
#[derive(Error, Debug)]
pub enum AcquireError {
    /// A token failed numeric parsing; the line is dropped.
    #[error("Jeton numérique invalide : {token:?}")]
    Parse {
        /// The offending token.
        token: String,
    },

    /// Wrong sample count on an otherwise numeric line; the line is dropped.
    #[error("Nombre d'échantillons inattendu : attendu {expected}, reçu {got}")]
    LengthMismatch {
        /// Configured curve length N.
        expected: usize,
        /// Token count actually received.
        got: usize,
    },

    /// Serial read failure; retried after a short backoff.
    #[error("Erreur de lecture série : {0}")]
    Channel(String),

    /// The serial device could not be opened.
    #[error("Impossible d'ouvrir {device}")]
    Open {
        /// Device path that failed to open.
        device: String,
        /// Underlying serialport error.
        #[source]
        source: serialport::Error,
    },

    /// Filter invoked with a wrong-length input.
    #[error(transparent)]
    Dsp(#[from] DspError),
}
