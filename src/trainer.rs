//! Training flows
//!
//! Two end-to-end flows share the split/fit/evaluate/persist skeleton:
//! the survey regression, which fits the well-being pipeline plus its
//! target scaler from a CSV, and the fusion flow, which builds the merged
//! multi-source dataset and fits the mood-delta model. Both return a
//! report suitable for printing as JSON.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::dataset::{feature_matrix, improvement_labels};
use crate::error::PipelineError;
use crate::features::{build_activity_features, build_mood_features, build_sleep_features};
use crate::merge::{attach_improvement_labels, merge_nearest, MergeOptions};
use crate::model::artifact::{
    save_artifact, ArtifactInfo, DELTA_MODEL_KIND, PIPELINE_KIND, TARGET_SCALER_KIND,
};
use crate::model::{r2_score, rmse, train_test_split, EvalMetrics, MinMaxScaler, ModelPipeline};
use crate::sources::{
    load_source_dir, load_survey_csv, ActivityLoader, LoadReport, MoodLoader, SleepLoader,
};

pub const DEFAULT_SEED: u64 = 42;
pub const SURVEY_HOLDOUT: f64 = 0.2;
pub const FUSION_HOLDOUT: f64 = 0.1;

pub const PIPELINE_FILE: &str = "mood_pipeline.json";
pub const TARGET_SCALER_FILE: &str = "target_scaler.json";
pub const DELTA_MODEL_FILE: &str = "mood_delta_model.json";

/// Summary of one training run
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrainReport {
    pub run_id: Uuid,
    pub trained_at: DateTime<Utc>,
    pub sources: BTreeMap<String, LoadReport>,
    pub rows_total: usize,
    pub rows_train: usize,
    pub rows_test: usize,
    pub train_metrics: EvalMetrics,
    pub test_metrics: EvalMetrics,
    pub artifacts: Vec<PathBuf>,
}

/// Fits the survey pipeline and writes `mood_pipeline.json` plus
/// `target_scaler.json` under `out_dir`
pub fn train_survey_model(
    csv_path: &Path,
    out_dir: &Path,
    seed: u64,
    holdout: f64,
) -> Result<TrainReport, PipelineError> {
    let (records, load) = load_survey_csv(csv_path)?;

    let numeric: Vec<Vec<f64>> = records
        .iter()
        .map(|r| vec![r.daily_stress, r.flow, r.todo_completed, r.sleep_hours])
        .collect();
    let categorical: Vec<Vec<String>> = records
        .iter()
        .map(|r| vec![r.gender.clone(), r.age.clone()])
        .collect();
    let target_raw: Vec<f64> = records.iter().map(|r| r.work_life_balance).collect();

    // The regressor learns the [0, 1] scaled target; the scaler artifact
    // carries the bounds back to the original score range.
    let target_scaler = MinMaxScaler::fit(&target_raw)?;
    let y: Vec<f64> = target_raw.iter().map(|&v| target_scaler.transform(v)).collect();

    let (train_idx, test_idx) = train_test_split(records.len(), holdout, seed);
    let pipeline = ModelPipeline::fit(
        &select(&numeric, &train_idx),
        &select(&categorical, &train_idx),
        2,
        &select(&y, &train_idx),
    )?;

    let train_metrics = evaluate(&pipeline, &numeric, &categorical, &y, &train_idx)?;
    let test_metrics = evaluate(&pipeline, &numeric, &categorical, &y, &test_idx)?;

    let run_id = Uuid::new_v4();
    let info = ArtifactInfo::new(run_id);
    let model_path = out_dir.join(PIPELINE_FILE);
    let scaler_path = out_dir.join(TARGET_SCALER_FILE);
    save_artifact(&model_path, PIPELINE_KIND, &info, &pipeline)?;
    save_artifact(&scaler_path, TARGET_SCALER_KIND, &info, &target_scaler)?;

    let mut sources = BTreeMap::new();
    sources.insert("survey".to_string(), load);

    Ok(TrainReport {
        run_id,
        trained_at: info.trained_at,
        sources,
        rows_total: records.len(),
        rows_train: train_idx.len(),
        rows_test: test_idx.len(),
        train_metrics,
        test_metrics,
        artifacts: vec![model_path, scaler_path],
    })
}

/// Builds the merged multi-source dataset and writes
/// `mood_delta_model.json` under `out_dir`.
///
/// Expects `Mood/`, `Activity/` and `Sleep/` under `data_dir`, each
/// holding per-user JSON logs.
pub fn train_fusion_model(
    data_dir: &Path,
    out_dir: &Path,
    seed: u64,
    holdout: f64,
    options: &MergeOptions,
) -> Result<TrainReport, PipelineError> {
    let (mood_events, mood_load) = load_source_dir(&MoodLoader, &data_dir.join("Mood"))?;
    let (activity_events, activity_load) =
        load_source_dir(&ActivityLoader, &data_dir.join("Activity"))?;
    let (sleep_events, sleep_load) = load_source_dir(&SleepLoader, &data_dir.join("Sleep"))?;

    let mood = build_mood_features(&mood_events);
    if mood.is_empty() {
        return Err(PipelineError::FeatureError(
            "no mood events carry both happy and sad ratings".to_string(),
        ));
    }
    let activity = build_activity_features(&activity_events);
    let sleep = build_sleep_features(&sleep_events);

    let mut rows = merge_nearest(&mood, &activity, &sleep, options);
    attach_improvement_labels(&mut rows);

    let x = feature_matrix(&rows);
    let y = improvement_labels(&rows);

    let (train_idx, test_idx) = train_test_split(rows.len(), holdout, seed);
    let pipeline = ModelPipeline::fit(&select(&x, &train_idx), &[], 0, &select(&y, &train_idx))?;

    let train_metrics = evaluate(&pipeline, &x, &[], &y, &train_idx)?;
    let test_metrics = evaluate(&pipeline, &x, &[], &y, &test_idx)?;

    let run_id = Uuid::new_v4();
    let info = ArtifactInfo::new(run_id);
    let model_path = out_dir.join(DELTA_MODEL_FILE);
    save_artifact(&model_path, DELTA_MODEL_KIND, &info, &pipeline)?;

    let mut sources = BTreeMap::new();
    sources.insert("mood".to_string(), mood_load);
    sources.insert("activity".to_string(), activity_load);
    sources.insert("sleep".to_string(), sleep_load);

    Ok(TrainReport {
        run_id,
        trained_at: info.trained_at,
        sources,
        rows_total: rows.len(),
        rows_train: train_idx.len(),
        rows_test: test_idx.len(),
        train_metrics,
        test_metrics,
        artifacts: vec![model_path],
    })
}

fn select<T: Clone>(rows: &[T], idx: &[usize]) -> Vec<T> {
    idx.iter().map(|&i| rows[i].clone()).collect()
}

fn evaluate(
    pipeline: &ModelPipeline,
    numeric: &[Vec<f64>],
    categorical: &[Vec<String>],
    y: &[f64],
    idx: &[usize],
) -> Result<EvalMetrics, PipelineError> {
    let empty: Vec<String> = Vec::new();
    let actual = select(y, idx);
    let mut predicted = Vec::with_capacity(idx.len());
    for &i in idx {
        let cats = categorical.get(i).unwrap_or(&empty);
        predicted.push(pipeline.predict_row(&numeric[i], cats)?);
    }
    Ok(EvalMetrics {
        r2: r2_score(&actual, &predicted),
        rmse: rmse(&actual, &predicted),
    })
}
