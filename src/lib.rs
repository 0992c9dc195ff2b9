//! Flight delay prediction
//!
//! One-hot encodes airline, flight type and month into a fixed feature set and
//! classifies each flight as delayed or not with a gradient-boosted ensemble.

pub mod config;
pub mod dataset;
pub mod delay_model;
pub mod encoder;
pub mod error;
pub mod handlers;
pub mod metrics;
pub mod models;
pub mod validation;

pub use config::AppConfig;
pub use delay_model::{DelayModel, FitReport};
pub use encoder::{FeatureEncoder, FeatureMatrix, FeatureSet};
pub use error::{DelayError, Result};

use tracing_subscriber::EnvFilter;

/// Install the global tracing subscriber; `RUST_LOG` wins over `verbose`
pub fn init_logging(verbose: bool) {
    let default_level = if verbose { "debug" } else { "info" };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));
    tracing_subscriber::fmt().with_env_filter(filter).init();
}
