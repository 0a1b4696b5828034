use thiserror::Error;

/// Errors originating from the DSP module.
#[derive(Error, Debug)]
pub enum DspError {
    /// Filter invoked with an input of the wrong length. This is a
    /// programming or configuration error, never silently absorbed.
    #[error("Taille d'entrée invalide : attendu {expected}, reçu {got}")]
    SizeMismatch {
        /// Length the filter was configured for.
        expected: usize,
        /// Length actually received.
        got: usize,
    },
}
