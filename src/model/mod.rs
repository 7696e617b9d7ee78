//! Model layer
//!
//! Scaling and encoding, the least-squares regressor, the combined
//! pipeline, and the versioned artifact files they persist to.

pub mod artifact;
pub mod pipeline;
pub mod preprocess;
pub mod regressor;
pub mod scaler;

pub use artifact::{
    load_artifact, save_artifact, ArtifactInfo, ARTIFACT_VERSION, DELTA_MODEL_KIND, PIPELINE_KIND,
    TARGET_SCALER_KIND,
};
pub use pipeline::{r2_score, rmse, train_test_split, EvalMetrics, ModelPipeline};
pub use preprocess::{ColumnTransform, OneHotEncoder};
pub use regressor::LinearRegressor;
pub use scaler::{MinMaxScaler, StandardScaler};
