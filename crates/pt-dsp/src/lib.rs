// Adaptive filtering, feature extraction, and spectrum analysis for pulsetone.

pub mod error;
pub mod extract;
pub mod filter;
pub mod spectrum;
pub mod util;

pub use error::DspError;
pub use extract::{FeatureExtractor, Trigger};
pub use filter::AdaptiveAverage;
pub use spectrum::{Spectrum, SpectrumAnalyzer};
