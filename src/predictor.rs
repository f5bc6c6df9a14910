//! Duration prediction
//!
//! Estimates how long a task will take from a per-type baseline, calibrated
//! against similar historical tasks and the user's typical task length.
//!
//! Pipeline: Task → Features → Base estimate → History blend → Profile scale → Confidence

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;

use crate::config::{BaseDurations, EngineConfig};
use crate::stats::{jaccard, mean, median, round_to};
use crate::types::{TaskRecord, UserProfile, GENERAL_TASK_TYPE};
use crate::MODEL_VERSION;

const COMPLEXITY_KEYWORDS: [&str; 5] = ["complex", "difficult", "challenging", "multiple", "several"];
const URGENCY_KEYWORDS: [&str; 5] = ["urgent", "asap", "immediate", "critical", "important"];

/// Task types whose baseline scales with description length
const WORDY_TASK_TYPES: [&str; 3] = ["writing", "research", "email"];

/// Minimum similarity score for a historical task to count
pub const SIMILARITY_THRESHOLD: f64 = 2.0;

/// Maximum number of similar historical tasks considered
pub const MAX_SIMILAR_TASKS: usize = 10;

/// Typical task length the profile factor is relative to (minutes)
const PROFILE_BASELINE_MINUTES: f64 = 30.0;

const BASE_CONFIDENCE: f64 = 0.5;
const MIN_CONFIDENCE: f64 = 0.3;
const MAX_CONFIDENCE: f64 = 0.95;

/// Features extracted from a task
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TaskFeatures {
    pub title_length: usize,
    pub description_length: usize,
    pub word_count: usize,
    pub task_type: String,
    pub priority: String,
    pub has_deadline: bool,
    pub estimated_minutes: Option<u32>,
    pub tags: Vec<String>,
    /// Number of distinct complexity keywords found
    pub complexity_score: u32,
    /// Number of distinct urgency keywords found
    pub urgency_score: u32,
}

impl TaskFeatures {
    pub fn extract(task: &TaskRecord) -> Self {
        let title = task.title.to_lowercase();
        let description = task.description.as_deref().unwrap_or("").to_lowercase();

        let keyword_hits = |keywords: &[&str]| {
            keywords
                .iter()
                .filter(|k| title.contains(*k) || description.contains(*k))
                .count() as u32
        };

        Self {
            title_length: title.chars().count(),
            description_length: description.chars().count(),
            word_count: title.split_whitespace().count() + description.split_whitespace().count(),
            task_type: task.type_key(),
            priority: task.priority_key(),
            has_deadline: task.due_date.is_some(),
            estimated_minutes: task.estimated_minutes,
            tags: task.tags.clone(),
            complexity_score: keyword_hits(&COMPLEXITY_KEYWORDS),
            urgency_score: keyword_hits(&URGENCY_KEYWORDS),
        }
    }
}

/// Outcome of the similar-task search
///
/// The count drives two separate formulas: the blend weight applied to the
/// historical estimate and the confidence boost.
#[derive(Debug, Clone, PartialEq)]
pub struct HistoryMatch<'a> {
    pub similar: Vec<&'a TaskRecord>,
}

impl<'a> HistoryMatch<'a> {
    pub fn similar_count(&self) -> usize {
        self.similar.len()
    }

    /// Weight of the historical estimate, min(n / 5, 1)
    pub fn blend_weight(&self) -> f64 {
        (self.similar_count() as f64 / 5.0).min(1.0)
    }

    /// Confidence added by history, min(n / 10, 0.3)
    pub fn confidence_boost(&self) -> f64 {
        (self.similar_count() as f64 / 10.0).min(0.3)
    }

    /// Recorded durations of the similar tasks, zeros dropped
    pub fn recorded_minutes(&self) -> Vec<f64> {
        self.similar
            .iter()
            .filter_map(|t| t.recorded_minutes())
            .map(f64::from)
            .collect()
    }
}

/// A duration prediction
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DurationPrediction {
    pub task_id: Option<String>,
    pub predicted_minutes: u32,
    pub confidence_score: f64,
    pub base_estimate_minutes: u32,
    pub reasoning: String,
    pub input_features: TaskFeatures,
    pub model_version: String,
    pub predicted_at: DateTime<Utc>,
}

/// Similarity of a historical task to the task being predicted
pub fn similarity_score(task: &TaskRecord, historical: &TaskRecord) -> f64 {
    let mut score = 0.0;

    let historical_type = historical.task_type.as_deref().unwrap_or("").to_lowercase();
    if historical_type == task.type_key() {
        score += 3.0;
    }

    let title_words = |title: &str| -> HashSet<String> {
        title
            .to_lowercase()
            .split_whitespace()
            .map(str::to_string)
            .collect()
    };
    score += 2.0 * jaccard(&title_words(&task.title), &title_words(&historical.title));

    let historical_priority = historical.priority.as_deref().unwrap_or("").to_lowercase();
    if historical_priority == task.priority_key() {
        score += 1.0;
    }

    let task_tags: HashSet<&str> = task.tags.iter().map(String::as_str).collect();
    let historical_tags: HashSet<&str> = historical.tags.iter().map(String::as_str).collect();
    score += jaccard(&task_tags, &historical_tags);

    score
}

/// Historical tasks scoring at least the threshold, in input order, capped
pub fn find_similar_tasks<'a>(task: &TaskRecord, history: &'a [TaskRecord]) -> HistoryMatch<'a> {
    let similar = history
        .iter()
        .filter(|h| similarity_score(task, h) >= SIMILARITY_THRESHOLD)
        .take(MAX_SIMILAR_TASKS)
        .collect();
    HistoryMatch { similar }
}

/// Duration predictor over a base duration table
#[derive(Debug, Clone, Default)]
pub struct DurationPredictor {
    base_durations: BaseDurations,
}

impl DurationPredictor {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_base_durations(base_durations: BaseDurations) -> Self {
        Self { base_durations }
    }

    pub fn from_config(config: &EngineConfig) -> Self {
        Self::with_base_durations(config.base_durations.clone())
    }

    /// Baseline for the task type, scaled for long text and complexity
    pub fn base_estimate(&self, features: &TaskFeatures) -> f64 {
        let mut base = self.base_durations.minutes(&features.task_type);

        if WORDY_TASK_TYPES.contains(&features.task_type.as_str()) {
            if features.word_count > 1000 {
                base *= 2.0;
            } else if features.word_count > 500 {
                base *= 1.5;
            }
        }

        if features.complexity_score > 0 {
            base *= 1.0 + f64::from(features.complexity_score) * 0.2;
        }

        base
    }

    pub fn predict(
        &self,
        task: &TaskRecord,
        history: Option<&[TaskRecord]>,
        profile: Option<&UserProfile>,
    ) -> DurationPrediction {
        self.predict_at(task, history, profile, Utc::now())
    }

    /// Predict with an explicit `predicted_at` timestamp
    pub fn predict_at(
        &self,
        task: &TaskRecord,
        history: Option<&[TaskRecord]>,
        profile: Option<&UserProfile>,
        now: DateTime<Utc>,
    ) -> DurationPrediction {
        let features = TaskFeatures::extract(task);
        let base = self.base_estimate(&features);

        let history_match = find_similar_tasks(task, history.unwrap_or(&[]));
        let calibrated = adjust_with_history(base, &history_match);

        let profile_average = profile.and_then(UserProfile::average_minutes);
        let estimate = match profile_average {
            Some(average) => calibrated * (average / PROFILE_BASELINE_MINUTES),
            None => calibrated,
        };

        let confidence = confidence(task, &history_match, profile_average.is_some());
        let predicted_minutes = estimate.round().max(0.0) as u32;

        log::debug!(
            "duration prediction: type={} base={:.1} similar={} predicted={} confidence={:.2}",
            features.task_type,
            base,
            history_match.similar_count(),
            predicted_minutes,
            confidence
        );

        DurationPrediction {
            task_id: task.id.clone(),
            predicted_minutes,
            confidence_score: round_to(confidence, 2),
            base_estimate_minutes: base.round().max(0.0) as u32,
            reasoning: reasoning(task, predicted_minutes, confidence),
            input_features: features,
            model_version: MODEL_VERSION.to_string(),
            predicted_at: now,
        }
    }

    /// Predict each task independently, in input order
    pub fn batch_predict(
        &self,
        tasks: &[TaskRecord],
        history: Option<&[TaskRecord]>,
        profile: Option<&UserProfile>,
    ) -> Vec<DurationPrediction> {
        self.batch_predict_at(tasks, history, profile, Utc::now())
    }

    pub fn batch_predict_at(
        &self,
        tasks: &[TaskRecord],
        history: Option<&[TaskRecord]>,
        profile: Option<&UserProfile>,
        now: DateTime<Utc>,
    ) -> Vec<DurationPrediction> {
        tasks
            .iter()
            .map(|task| self.predict_at(task, history, profile, now))
            .collect()
    }
}

/// Blend the base estimate with durations recorded for similar tasks
fn adjust_with_history(base: f64, history_match: &HistoryMatch<'_>) -> f64 {
    let recorded = history_match.recorded_minutes();
    let (Some(average), Some(middle)) = (mean(&recorded), median(&recorded)) else {
        return base;
    };

    // median-weighted to damp outliers
    let adjusted = average * 0.3 + middle * 0.7;
    let weight = history_match.blend_weight();
    base * (1.0 - weight) + adjusted * weight
}

fn confidence(task: &TaskRecord, history_match: &HistoryMatch<'_>, has_profile: bool) -> f64 {
    let mut confidence = BASE_CONFIDENCE + history_match.confidence_boost();

    if has_profile {
        confidence += 0.2;
    }

    let description_chars = task
        .description
        .as_deref()
        .map(|d| d.chars().count())
        .unwrap_or(0);
    if description_chars < 10 {
        confidence -= 0.1;
    }

    confidence.clamp(MIN_CONFIDENCE, MAX_CONFIDENCE)
}

fn reasoning(task: &TaskRecord, predicted_minutes: u32, confidence: f64) -> String {
    let task_type = task.task_type.as_deref().unwrap_or(GENERAL_TASK_TYPE);
    let qualifier = if confidence > 0.7 {
        "High confidence based on similar historical tasks."
    } else if confidence > 0.5 {
        "Moderate confidence with some uncertainty."
    } else {
        "Lower confidence - task details may need refinement."
    };

    format!(
        "Based on {} task patterns, estimated duration is {} minutes. {}",
        task_type, predicted_minutes, qualifier
    )
}

/// Predict a single task duration with the default baselines
pub fn predict_task_duration(
    task: &TaskRecord,
    history: Option<&[TaskRecord]>,
    profile: Option<&UserProfile>,
) -> DurationPrediction {
    DurationPredictor::new().predict(task, history, profile)
}

/// Predict several task durations with the default baselines
pub fn batch_predict(
    tasks: &[TaskRecord],
    history: Option<&[TaskRecord]>,
    profile: Option<&UserProfile>,
) -> Vec<DurationPrediction> {
    DurationPredictor::new().batch_predict(tasks, history, profile)
}
