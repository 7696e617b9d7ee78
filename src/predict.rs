//! Single-request inference
//!
//! Builds a feature row matching the survey training schema from a flat
//! request, runs it through the persisted pipeline, and rescales the raw
//! prediction into a bounded 0-5 display score with a banded message.
//! Every failure on the modeled path falls back to a weighted-sum
//! heuristic over the same numeric inputs, and the result carries an
//! explicit source tag so callers can tell the two apart.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use serde_json::Value;
use thiserror::Error;

use crate::error::PipelineError;
use crate::model::artifact::{load_artifact, PIPELINE_KIND, TARGET_SCALER_KIND};
use crate::model::{MinMaxScaler, ModelPipeline};

pub const DEFAULT_MODEL_PATH: &str = "models/mood_pipeline.json";
pub const DEFAULT_SCALER_PATH: &str = "models/target_scaler.json";

/// Artifact paths from `MOODCAST_MODEL_PATH` and `MOODCAST_SCALER_PATH`,
/// with the standard defaults when unset
pub fn artifact_paths_from_env() -> (PathBuf, PathBuf) {
    let model = std::env::var("MOODCAST_MODEL_PATH")
        .unwrap_or_else(|_| DEFAULT_MODEL_PATH.to_string());
    let scaler = std::env::var("MOODCAST_SCALER_PATH")
        .unwrap_or_else(|_| DEFAULT_SCALER_PATH.to_string());
    (model.into(), scaler.into())
}

/// Flat request shape shared by the CLI and the HTTP endpoint
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PredictionRequest {
    #[serde(rename = "DAILY_STRESS")]
    pub daily_stress: f64,
    #[serde(rename = "FLOW")]
    pub flow: f64,
    #[serde(rename = "TODO_COMPLETED")]
    pub todo_completed: f64,
    #[serde(rename = "SLEEP_HOURS")]
    pub sleep_hours: f64,
    #[serde(rename = "GENDER")]
    pub gender: String,
    #[serde(rename = "AGE")]
    pub age: f64,
}

/// Request decoding failures, worded exactly as callers print them
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RequestError {
    #[error("Invalid JSON input")]
    InvalidJson,
    #[error("Data must be a JSON object")]
    NotAnObject,
    #[error("{0}")]
    BadFields(String),
}

/// Decodes a request from raw JSON text.
///
/// Unknown extra fields are ignored; anything else wrong with the payload
/// maps to a [`RequestError`] rather than a crash.
pub fn parse_request(raw: &str) -> Result<PredictionRequest, RequestError> {
    let value: Value = serde_json::from_str(raw).map_err(|_| RequestError::InvalidJson)?;
    if !value.is_object() {
        return Err(RequestError::NotAnObject);
    }
    serde_json::from_value(value).map_err(|e| RequestError::BadFields(e.to_string()))
}

/// Age bands matching the survey's categorical vocabulary
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AgeBand {
    Under20,
    From20To35,
    From36To50,
    Over50,
}

impl AgeBand {
    /// Total over all numbers; every age lands in exactly one band
    pub fn from_years(age: f64) -> Self {
        if age < 20.0 {
            AgeBand::Under20
        } else if age <= 35.0 {
            AgeBand::From20To35
        } else if age <= 50.0 {
            AgeBand::From36To50
        } else {
            AgeBand::Over50
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            AgeBand::Under20 => "Less than 20",
            AgeBand::From20To35 => "20 to 35",
            AgeBand::From36To50 => "36 to 50",
            AgeBand::Over50 => "51 or more",
        }
    }
}

/// How the score was produced; serializes as the wire `status` value
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum PredictionSource {
    #[serde(rename = "success")]
    Modeled,
    #[serde(rename = "fallback")]
    Heuristic,
}

/// One scored request; serializes to the wire response shape
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Prediction {
    pub prediction: f64,
    pub message: String,
    #[serde(rename = "status")]
    pub source: PredictionSource,
}

/// Maps a raw-range score onto [0, 5] using the scaler's observed bounds.
///
/// Monotonic within the bounds; clamps to 0 below the minimum and 5 above
/// the maximum. A degenerate scaler maps everything to 0.
pub fn display_score(raw: f64, scaler: &MinMaxScaler) -> f64 {
    let span = scaler.data_max - scaler.data_min;
    if span == 0.0 {
        return 0.0;
    }
    ((raw - scaler.data_min) / span * 5.0).clamp(0.0, 5.0)
}

/// Banded message for a 0-5 display score
pub fn message_for_score(score: f64) -> &'static str {
    if score >= 4.0 {
        "Excellent outlook. Keep doing what works."
    } else if score >= 3.0 {
        "Doing well. Small changes could lift your score further."
    } else if score >= 2.0 {
        "Under some strain. Protect your sleep and take real breaks."
    } else {
        "Struggling right now. Lighten the load and reach out for support."
    }
}

/// Weighted-sum stand-in for the model, on the 0-5 display scale.
///
/// Stress counts against the score, sleep saturates at eight hours.
pub fn heuristic_score(request: &PredictionRequest) -> f64 {
    let sleep = (request.sleep_hours / 8.0).min(1.0);
    let blended = 0.35 * (1.0 - request.daily_stress / 5.0)
        + 0.25 * (request.flow / 5.0)
        + 0.15 * (request.todo_completed / 5.0)
        + 0.25 * sleep;
    blended.clamp(0.0, 1.0) * 5.0
}

/// Scores a request with the heuristic and tags it as a fallback
pub fn heuristic_prediction(request: &PredictionRequest) -> Prediction {
    let score = heuristic_score(request);
    Prediction {
        prediction: score,
        message: message_for_score(score).to_string(),
        source: PredictionSource::Heuristic,
    }
}

/// Loaded artifacts ready to score requests
#[derive(Debug, Clone)]
pub struct MoodPredictor {
    pipeline: ModelPipeline,
    target_scaler: MinMaxScaler,
}

impl MoodPredictor {
    /// Loads the fitted pipeline and the target scaler from their
    /// artifact files
    pub fn load(model_path: &Path, scaler_path: &Path) -> Result<Self, PipelineError> {
        let (pipeline, _) = load_artifact::<ModelPipeline>(model_path, PIPELINE_KIND)?;
        let (target_scaler, _) = load_artifact::<MinMaxScaler>(scaler_path, TARGET_SCALER_KIND)?;
        Ok(Self::from_parts(pipeline, target_scaler))
    }

    /// Builds a predictor from already-fitted parts
    pub fn from_parts(pipeline: ModelPipeline, target_scaler: MinMaxScaler) -> Self {
        Self {
            pipeline,
            target_scaler,
        }
    }

    /// Scores one request, falling back to the heuristic if the modeled
    /// path fails for any reason
    pub fn predict(&self, request: &PredictionRequest) -> Prediction {
        match self.modeled(request) {
            Ok(prediction) => prediction,
            Err(_) => heuristic_prediction(request),
        }
    }

    fn modeled(&self, request: &PredictionRequest) -> Result<Prediction, PipelineError> {
        let numeric = [
            request.daily_stress,
            request.flow,
            request.todo_completed,
            request.sleep_hours,
        ];
        let categorical = [
            request.gender.clone(),
            AgeBand::from_years(request.age).as_str().to_string(),
        ];
        let scaled = self.pipeline.predict_row(&numeric, &categorical)?;
        let raw = self.target_scaler.inverse_transform(scaled);
        let score = display_score(raw, &self.target_scaler);
        Ok(Prediction {
            prediction: score,
            message: message_for_score(score).to_string(),
            source: PredictionSource::Modeled,
        })
    }
}

/// One-shot scoring: load artifacts if possible, heuristic otherwise
pub fn run_prediction(
    request: &PredictionRequest,
    model_path: &Path,
    scaler_path: &Path,
) -> Prediction {
    match MoodPredictor::load(model_path, scaler_path) {
        Ok(predictor) => predictor.predict(request),
        Err(_) => heuristic_prediction(request),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::artifact::{save_artifact, ArtifactInfo};
    use uuid::Uuid;

    fn example_request() -> PredictionRequest {
        PredictionRequest {
            daily_stress: 5.0,
            flow: 2.0,
            todo_completed: 3.0,
            sleep_hours: 7.0,
            gender: "Male".to_string(),
            age: 29.0,
        }
    }

    fn fitted_predictor() -> MoodPredictor {
        let numeric = vec![
            vec![1.0, 4.0, 4.0, 8.0],
            vec![2.0, 3.0, 3.0, 7.0],
            vec![3.0, 3.0, 2.0, 6.0],
            vec![4.0, 2.0, 2.0, 6.0],
            vec![5.0, 1.0, 1.0, 5.0],
            vec![2.0, 4.0, 3.0, 8.0],
        ];
        let categorical = vec![
            vec!["Male".to_string(), "20 to 35".to_string()],
            vec!["Female".to_string(), "20 to 35".to_string()],
            vec!["Male".to_string(), "36 to 50".to_string()],
            vec!["Female".to_string(), "36 to 50".to_string()],
            vec!["Male".to_string(), "51 or more".to_string()],
            vec!["Female".to_string(), "Less than 20".to_string()],
        ];
        let y = vec![0.9, 0.7, 0.5, 0.4, 0.1, 0.8];
        let pipeline = ModelPipeline::fit(&numeric, &categorical, 2, &y).unwrap();
        let target_scaler = MinMaxScaler::fit(&[480.0, 600.0, 820.0]).unwrap();
        MoodPredictor::from_parts(pipeline, target_scaler)
    }

    #[test]
    fn every_age_lands_in_one_band() {
        assert_eq!(AgeBand::from_years(0.0), AgeBand::Under20);
        assert_eq!(AgeBand::from_years(19.9), AgeBand::Under20);
        assert_eq!(AgeBand::from_years(20.0), AgeBand::From20To35);
        assert_eq!(AgeBand::from_years(29.0), AgeBand::From20To35);
        assert_eq!(AgeBand::from_years(35.0), AgeBand::From20To35);
        assert_eq!(AgeBand::from_years(36.0), AgeBand::From36To50);
        assert_eq!(AgeBand::from_years(50.0), AgeBand::From36To50);
        assert_eq!(AgeBand::from_years(51.0), AgeBand::Over50);
        assert_eq!(AgeBand::from_years(90.0), AgeBand::Over50);
        assert_eq!(AgeBand::from_years(29.0).as_str(), "20 to 35");
    }

    #[test]
    fn display_score_is_monotonic_and_clamps() {
        let scaler = MinMaxScaler {
            data_min: 480.0,
            data_max: 820.0,
        };
        assert_eq!(display_score(400.0, &scaler), 0.0);
        assert_eq!(display_score(480.0, &scaler), 0.0);
        assert!((display_score(650.0, &scaler) - 2.5).abs() < 1e-12);
        assert_eq!(display_score(820.0, &scaler), 5.0);
        assert_eq!(display_score(900.0, &scaler), 5.0);

        let lo = display_score(500.0, &scaler);
        let hi = display_score(700.0, &scaler);
        assert!(lo < hi);
    }

    #[test]
    fn degenerate_scaler_maps_to_zero() {
        let scaler = MinMaxScaler {
            data_min: 3.0,
            data_max: 3.0,
        };
        assert_eq!(display_score(3.0, &scaler), 0.0);
    }

    #[test]
    fn heuristic_stays_on_the_display_scale() {
        let mut request = example_request();
        let score = heuristic_score(&request);
        assert!((0.0..=5.0).contains(&score));
        // stress 5/5 zeroes its term: 0.25*0.4 + 0.15*0.6 + 0.25*0.875
        assert!((score - 2.04375).abs() < 1e-9);

        request.daily_stress = -100.0;
        request.sleep_hours = 100.0;
        assert_eq!(heuristic_score(&request), 5.0);
    }

    #[test]
    fn parse_rejects_malformed_json() {
        let err = parse_request("not json at all").unwrap_err();
        assert_eq!(err, RequestError::InvalidJson);
        assert_eq!(err.to_string(), "Invalid JSON input");
    }

    #[test]
    fn parse_rejects_non_objects() {
        let err = parse_request("[1, 2, 3]").unwrap_err();
        assert_eq!(err, RequestError::NotAnObject);
        assert_eq!(err.to_string(), "Data must be a JSON object");
    }

    #[test]
    fn parse_reports_missing_fields() {
        let err = parse_request(r#"{"DAILY_STRESS": 5}"#).unwrap_err();
        assert!(matches!(err, RequestError::BadFields(_)));
    }

    #[test]
    fn parse_ignores_extra_fields() {
        let raw = r#"{"DAILY_STRESS": 5, "FLOW": 2, "TODO_COMPLETED": 3,
                      "SLEEP_HOURS": 7, "GENDER": "Male", "AGE": 29,
                      "DEVICE": "handheld"}"#;
        let request = parse_request(raw).unwrap();
        assert_eq!(request, example_request());
    }

    #[test]
    fn modeled_response_has_the_wire_shape() {
        let predictor = fitted_predictor();
        let prediction = predictor.predict(&example_request());
        assert_eq!(prediction.source, PredictionSource::Modeled);
        assert!((0.0..=5.0).contains(&prediction.prediction));

        let value = serde_json::to_value(&prediction).unwrap();
        let object = value.as_object().unwrap();
        assert!(object.contains_key("prediction"));
        assert!(object.contains_key("message"));
        assert_eq!(object["status"], "success");
    }

    #[test]
    fn missing_artifacts_fall_back_to_the_heuristic() {
        let dir = tempfile::tempdir().unwrap();
        let prediction = run_prediction(
            &example_request(),
            &dir.path().join("absent_model.json"),
            &dir.path().join("absent_scaler.json"),
        );
        assert_eq!(prediction.source, PredictionSource::Heuristic);
        let value = serde_json::to_value(&prediction).unwrap();
        assert_eq!(value["status"], "fallback");
    }

    #[test]
    fn loads_from_saved_artifacts() {
        let dir = tempfile::tempdir().unwrap();
        let model_path = dir.path().join("mood_pipeline.json");
        let scaler_path = dir.path().join("target_scaler.json");

        let predictor = fitted_predictor();
        let info = ArtifactInfo::new(Uuid::new_v4());
        save_artifact(&model_path, PIPELINE_KIND, &info, &predictor.pipeline).unwrap();
        save_artifact(
            &scaler_path,
            TARGET_SCALER_KIND,
            &info,
            &predictor.target_scaler,
        )
        .unwrap();

        let loaded = MoodPredictor::load(&model_path, &scaler_path).unwrap();
        let before = predictor.predict(&example_request());
        let after = loaded.predict(&example_request());
        assert_eq!(before, after);
    }

    #[test]
    fn messages_cover_the_four_bands() {
        let texts: Vec<&str> = [4.5, 3.5, 2.5, 0.5]
            .iter()
            .map(|s| message_for_score(*s))
            .collect();
        for pair in texts.windows(2) {
            assert_ne!(pair[0], pair[1]);
        }
    }
}
