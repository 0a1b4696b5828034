/// Configuration, types, and shared structures for pulsetone.
///
/// This crate contains all shared types and configuration logic used
/// across the pulsetone workspace: the discharge-curve value type, the
/// bounded curve store, the feature snapshot, and the hot-reloadable
/// detector configuration.

pub mod config;
pub mod curve;
pub mod error;
pub mod features;
pub mod store;

pub use config::DetectorConfig;
pub use curve::{AverageSnapshot, Curve};
pub use error::CoreError;
pub use features::FeatureSet;
pub use store::CurveStore;
