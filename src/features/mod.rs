//! Per-source feature builders
//!
//! Each builder takes one source's raw events and produces its feature
//! table: a bounded composite score, rolling means over windows 3 and 7,
//! and a first-difference trend, all computed strictly within a single
//! user's chronologically sorted sequence.

pub mod activity;
pub mod mood;
pub mod rolling;
pub mod sleep;

pub use activity::{build_activity_features, compute_total_activity_score};
pub use mood::{build_mood_features, compute_mood_score};
pub use sleep::build_sleep_features;
