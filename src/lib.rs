//! Focus Engine - deterministic productivity analytics
//!
//! Turns raw activity, task and focus-session records into scores, schedules
//! and ranked recommendations. Four independent components share the record
//! types in [`types`]:
//!
//! - **Distraction Analyzer**: duration-weighted distraction scores, behavioral
//!   patterns and insights over a recent time window
//! - **Focus Planner**: task summaries and a prioritized daily schedule snapped
//!   to the user's peak hours
//! - **Duration Predictor**: task duration estimates calibrated against similar
//!   historical tasks
//! - **Suggestion Ranker**: prioritized improvement suggestions
//!
//! [`FocusEngine`] wraps all four behind JSON-in / JSON-out entry points.

pub mod adapter;
pub mod config;
pub mod distraction;
pub mod error;
pub mod pipeline;
pub mod planner;
pub mod predictor;
pub mod stats;
pub mod summarizer;
pub mod suggestions;
pub mod types;

pub use config::EngineConfig;
pub use distraction::{analyze_activity_patterns, DistractionAnalysis, DistractionAnalyzer};
pub use error::EngineError;
pub use pipeline::FocusEngine;
pub use planner::{generate_focus_plan, summarize_tasks, FocusPlanOutcome, FocusPlanner, TaskSummary};
pub use predictor::{batch_predict, predict_task_duration, DurationPrediction, DurationPredictor};
pub use summarizer::TaskSummarizer;
pub use suggestions::{generate_suggestions, Suggestion, SuggestionRanker};

// Record exports
pub use types::{
    ActivityPatternEntry, ActivityRecord, FocusSession, TaskRecord, UserPreferences, UserProfile,
};

/// Engine version
pub const ENGINE_VERSION: &str = env!("CARGO_PKG_VERSION");

/// Model version stamped on every report
pub const MODEL_VERSION: &str = "v1.0";

/// Producer name reported by the CLI
pub const PRODUCER_NAME: &str = "focus-engine";
