//! Versioned JSON artifacts
//!
//! Every trained model is persisted as a JSON envelope carrying a kind
//! tag, a format version and provenance. Loading checks kind and version
//! before touching the payload so a stale or foreign file fails with a
//! structured error instead of a serde one.

use std::fs;
use std::path::Path;

use chrono::{DateTime, Utc};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::PipelineError;

/// Current envelope format
pub const ARTIFACT_VERSION: u32 = 1;

pub const PIPELINE_KIND: &str = "mood_pipeline";
pub const TARGET_SCALER_KIND: &str = "target_scaler";
pub const DELTA_MODEL_KIND: &str = "mood_delta_model";

/// Provenance recorded alongside every artifact
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ArtifactInfo {
    pub producer: String,
    pub producer_version: String,
    pub run_id: Uuid,
    pub trained_at: DateTime<Utc>,
}

impl ArtifactInfo {
    /// Stamps the current crate as producer
    pub fn new(run_id: Uuid) -> Self {
        Self {
            producer: crate::PRODUCER_NAME.to_string(),
            producer_version: crate::MOODCAST_VERSION.to_string(),
            run_id,
            trained_at: Utc::now(),
        }
    }
}

#[derive(Serialize)]
struct EnvelopeRef<'a, T: Serialize> {
    kind: &'a str,
    version: u32,
    info: &'a ArtifactInfo,
    payload: &'a T,
}

#[derive(Deserialize)]
struct Envelope<T> {
    kind: String,
    version: u32,
    info: ArtifactInfo,
    payload: T,
}

#[derive(Deserialize)]
struct EnvelopeProbe {
    kind: String,
    version: u32,
}

/// Writes `payload` wrapped in a versioned envelope, creating parent
/// directories as needed
pub fn save_artifact<T: Serialize>(
    path: &Path,
    kind: &str,
    info: &ArtifactInfo,
    payload: &T,
) -> Result<(), PipelineError> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            fs::create_dir_all(parent)?;
        }
    }
    let envelope = EnvelopeRef {
        kind,
        version: ARTIFACT_VERSION,
        info,
        payload,
    };
    let json = serde_json::to_string_pretty(&envelope)?;
    fs::write(path, json)?;
    Ok(())
}

/// Reads an envelope back, verifying kind and version first
pub fn load_artifact<T: DeserializeOwned>(
    path: &Path,
    kind: &str,
) -> Result<(T, ArtifactInfo), PipelineError> {
    let raw = fs::read_to_string(path)?;
    let probe: EnvelopeProbe = serde_json::from_str(&raw)?;
    if probe.kind != kind {
        return Err(PipelineError::ArtifactKind {
            expected: kind.to_string(),
            found: probe.kind,
        });
    }
    if probe.version != ARTIFACT_VERSION {
        return Err(PipelineError::ArtifactVersion {
            expected: ARTIFACT_VERSION,
            found: probe.version,
        });
    }
    let envelope: Envelope<T> = serde_json::from_str(&raw)?;
    Ok((envelope.payload, envelope.info))
}
