//! Error types for the moodcast pipeline

use thiserror::Error;

/// Errors that can occur while loading data, fitting, or predicting
#[derive(Debug, Error)]
pub enum PipelineError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Invalid JSON: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Missing required column: {0}")]
    MissingColumn(String),

    #[error("Empty source: {0}")]
    EmptySource(String),

    #[error("Feature derivation error: {0}")]
    FeatureError(String),

    #[error("Dimension mismatch: {0}")]
    DimensionMismatch(String),

    #[error("Degenerate fit: {0}")]
    DegenerateFit(String),

    #[error("Unknown artifact kind: expected {expected}, found {found}")]
    ArtifactKind { expected: String, found: String },

    #[error("Artifact version mismatch: expected {expected}, found {found}")]
    ArtifactVersion { expected: u32, found: u32 },

    #[error("Configuration error: {0}")]
    Config(String),
}
