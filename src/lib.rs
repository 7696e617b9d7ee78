//! Moodcast - well-being signal fusion and mood forecasting pipeline
//!
//! Moodcast turns heterogeneous lifestyle logs into mood predictions through
//! a deterministic pipeline: source loading → per-source feature derivation
//! → nearest-in-time merge → model fitting → bounded 0-5 scoring.
//!
//! ## Modules
//!
//! - **Training Pipeline**: Load raw survey/sensor data, derive rolling and
//!   trend features per user, merge them into one training table, and fit
//!   the regression artifacts
//! - **Inference Adapter**: Rebuild the training feature schema from a flat
//!   request and score it against the persisted artifacts, with a tagged
//!   heuristic fallback when the modeled path fails

pub mod dataset;
pub mod error;
pub mod features;
pub mod merge;
pub mod model;
pub mod predict;
pub mod sources;
pub mod trainer;
pub mod types;

// HTTP transport over the synchronous library (feature `http`)
#[cfg(feature = "http")]
pub mod server;

pub use error::PipelineError;
pub use merge::{attach_improvement_labels, merge_nearest, MergeOptions};
pub use predict::{
    run_prediction, MoodPredictor, Prediction, PredictionRequest, PredictionSource,
};
pub use trainer::{train_fusion_model, train_survey_model, TrainReport};

/// Moodcast version embedded in artifact provenance and reports
pub const MOODCAST_VERSION: &str = env!("CARGO_PKG_VERSION");

/// Producer name recorded in artifacts and the health endpoint
pub const PRODUCER_NAME: &str = "moodcast";
