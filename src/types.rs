//! Core record types for the focus engine
//!
//! These are the typed shapes callers hand to the engine. Optional fields carry
//! documented defaults so loosely-typed upstream payloads can be coerced once at
//! the boundary (see [`crate::adapter`]) and every component downstream works
//! with fully-typed data.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::{Map, Value};

use crate::adapter::parse_timestamp;

/// Category assumed when an activity does not name one
pub const UNKNOWN_CATEGORY: &str = "unknown";

/// Category assumed when a task does not name one
pub const GENERAL_CATEGORY: &str = "general";

/// Task type assumed when a task does not name one
pub const GENERAL_TASK_TYPE: &str = "general";

/// Priority assumed when a task does not name one
pub const DEFAULT_PRIORITY: &str = "medium";

/// Peak productivity hours used when the caller supplies no preference
pub const DEFAULT_PEAK_HOURS: [u32; 6] = [9, 10, 11, 14, 15, 16];

/// Preferred focus block length (minutes) when the caller supplies no preference
pub const DEFAULT_FOCUS_DURATION_MINUTES: u32 = 50;

fn default_unknown_category() -> String {
    UNKNOWN_CATEGORY.to_string()
}

fn deserialize_timestamp<'de, D>(deserializer: D) -> Result<DateTime<Utc>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = String::deserialize(deserializer)?;
    parse_timestamp(&raw).map_err(serde::de::Error::custom)
}

fn deserialize_optional_timestamp<'de, D>(
    deserializer: D,
) -> Result<Option<DateTime<Utc>>, D::Error>
where
    D: Deserializer<'de>,
{
    match Option::<String>::deserialize(deserializer)? {
        Some(raw) if !raw.trim().is_empty() => parse_timestamp(&raw)
            .map(Some)
            .map_err(serde::de::Error::custom),
        _ => Ok(None),
    }
}

/// A single tracked activity (app usage, browsing, messaging, ...)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ActivityRecord {
    /// Free-form activity type (e.g. "app_usage")
    #[serde(default)]
    pub activity_type: String,
    /// Activity category, looked up case-insensitively in the weight table
    #[serde(default = "default_unknown_category")]
    pub activity_category: String,
    /// When the activity happened (UTC)
    #[serde(deserialize_with = "deserialize_timestamp")]
    pub timestamp: DateTime<Utc>,
    /// How long the activity lasted
    #[serde(default)]
    pub duration_seconds: u64,
    /// Per-activity distraction score (0-1), when the producer computed one
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub distraction_score: Option<f64>,
    /// Opaque producer context
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub context: Option<Map<String, Value>>,
}

impl ActivityRecord {
    /// Create an activity with the given category, timestamp and duration
    pub fn new(category: &str, timestamp: DateTime<Utc>, duration_seconds: u64) -> Self {
        Self {
            activity_type: String::new(),
            activity_category: category.to_string(),
            timestamp,
            duration_seconds,
            distraction_score: None,
            context: None,
        }
    }

    /// Attach an explicit distraction score
    pub fn with_distraction_score(mut self, score: f64) -> Self {
        self.distraction_score = Some(score);
        self
    }

    /// Lower-cased category used for weight lookup and grouping
    pub fn category_key(&self) -> String {
        self.activity_category.to_lowercase()
    }
}

/// A task, either pending (planning, prediction) or historical (calibration)
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TaskRecord {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    #[serde(default)]
    pub title: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    /// urgent, high, medium or low; anything else is carried through untouched
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub priority: Option<String>,
    #[serde(
        default,
        deserialize_with = "deserialize_optional_timestamp",
        skip_serializing_if = "Option::is_none"
    )]
    pub due_date: Option<DateTime<Utc>>,
    /// Caller-supplied estimate (minutes)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub estimated_minutes: Option<u32>,
    /// Planned or recorded duration (minutes)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub duration_minutes: Option<u32>,
    /// Measured duration of a completed task (minutes)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub actual_minutes: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub category: Option<String>,
    /// Task type used for duration baselines (email, coding, ...)
    #[serde(rename = "type", default, skip_serializing_if = "Option::is_none")]
    pub task_type: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub tags: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status: Option<String>,
}

impl TaskRecord {
    /// Create a task with just a title
    pub fn new(title: &str) -> Self {
        Self {
            title: title.to_string(),
            ..Self::default()
        }
    }

    pub fn with_id(mut self, id: &str) -> Self {
        self.id = Some(id.to_string());
        self
    }

    pub fn with_priority(mut self, priority: &str) -> Self {
        self.priority = Some(priority.to_string());
        self
    }

    pub fn with_type(mut self, task_type: &str) -> Self {
        self.task_type = Some(task_type.to_string());
        self
    }

    pub fn with_description(mut self, description: &str) -> Self {
        self.description = Some(description.to_string());
        self
    }

    pub fn with_estimate(mut self, minutes: u32) -> Self {
        self.estimated_minutes = Some(minutes);
        self
    }

    pub fn with_actual(mut self, minutes: u32) -> Self {
        self.actual_minutes = Some(minutes);
        self
    }

    pub fn with_due_date(mut self, due: DateTime<Utc>) -> Self {
        self.due_date = Some(due);
        self
    }

    pub fn with_category(mut self, category: &str) -> Self {
        self.category = Some(category.to_string());
        self
    }

    pub fn with_tags(mut self, tags: &[&str]) -> Self {
        self.tags = tags.iter().map(|t| t.to_string()).collect();
        self
    }

    pub fn with_status(mut self, status: &str) -> Self {
        self.status = Some(status.to_string());
        self
    }

    /// Lower-cased priority, `medium` when absent
    pub fn priority_key(&self) -> String {
        self.priority
            .as_deref()
            .unwrap_or(DEFAULT_PRIORITY)
            .to_lowercase()
    }

    /// Lower-cased task type, `general` when absent
    pub fn type_key(&self) -> String {
        self.task_type
            .as_deref()
            .unwrap_or(GENERAL_TASK_TYPE)
            .to_lowercase()
    }

    /// Category as supplied, `general` when absent
    pub fn category_key(&self) -> &str {
        self.category.as_deref().unwrap_or(GENERAL_CATEGORY)
    }

    /// Estimate in minutes: `estimated_minutes`, then `duration_minutes`, then `default`
    pub fn estimate_or(&self, default: u32) -> u32 {
        self.estimated_minutes
            .or(self.duration_minutes)
            .unwrap_or(default)
    }

    /// Recorded duration for a historical task; zero counts as missing
    pub fn recorded_minutes(&self) -> Option<u32> {
        self.actual_minutes
            .filter(|m| *m > 0)
            .or(self.duration_minutes.filter(|m| *m > 0))
    }

    /// True for urgent or high priority tasks
    pub fn is_high_priority(&self) -> bool {
        matches!(self.priority_key().as_str(), "urgent" | "high")
    }

    /// False once a task is completed or cancelled
    pub fn is_open(&self) -> bool {
        !matches!(self.status.as_deref(), Some("completed") | Some("cancelled"))
    }
}

/// A recorded focus session
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FocusSession {
    #[serde(deserialize_with = "deserialize_timestamp")]
    pub started_at: DateTime<Utc>,
    #[serde(default)]
    pub duration_minutes: f64,
    #[serde(default)]
    pub interruption_count: u32,
}

impl FocusSession {
    pub fn new(started_at: DateTime<Utc>, duration_minutes: f64, interruption_count: u32) -> Self {
        Self {
            started_at,
            duration_minutes,
            interruption_count,
        }
    }
}

/// Aggregated activity signal consumed by the suggestion ranker
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ActivityPatternEntry {
    #[serde(default = "default_unknown_category")]
    pub activity_category: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub distraction_score: Option<f64>,
}

impl ActivityPatternEntry {
    pub fn new(category: &str, distraction_score: f64) -> Self {
        Self {
            activity_category: category.to_string(),
            distraction_score: Some(distraction_score),
        }
    }
}

/// Planning preferences supplied by the user
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UserPreferences {
    /// Hours of the day (0-23) the user focuses best in, in preference order
    #[serde(default = "default_peak_hours")]
    pub peak_productivity_hours: Vec<u32>,
    /// Length of a focus block in minutes
    #[serde(default = "default_focus_duration")]
    pub preferred_focus_duration: u32,
}

fn default_peak_hours() -> Vec<u32> {
    DEFAULT_PEAK_HOURS.to_vec()
}

fn default_focus_duration() -> u32 {
    DEFAULT_FOCUS_DURATION_MINUTES
}

impl Default for UserPreferences {
    fn default() -> Self {
        Self {
            peak_productivity_hours: default_peak_hours(),
            preferred_focus_duration: default_focus_duration(),
        }
    }
}

/// Productivity profile used to calibrate duration predictions
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct UserProfile {
    /// The user's typical task length in minutes
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub average_task_duration_minutes: Option<f64>,
}

impl UserProfile {
    pub fn with_average_task_duration(minutes: f64) -> Self {
        Self {
            average_task_duration_minutes: Some(minutes),
        }
    }

    /// Average task duration when present and positive
    pub fn average_minutes(&self) -> Option<f64> {
        self.average_task_duration_minutes.filter(|m| *m > 0.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn test_activity_defaults() {
        let activity: ActivityRecord =
            serde_json::from_str(r#"{"timestamp": "2024-01-15T14:00:00Z"}"#).unwrap();
        assert_eq!(activity.activity_category, "unknown");
        assert_eq!(activity.duration_seconds, 0);
        assert!(activity.distraction_score.is_none());
        assert_eq!(
            activity.timestamp,
            Utc.with_ymd_and_hms(2024, 1, 15, 14, 0, 0).unwrap()
        );
    }

    #[test]
    fn test_activity_rejects_bad_timestamp() {
        let result: Result<ActivityRecord, _> =
            serde_json::from_str(r#"{"timestamp": "yesterday-ish"}"#);
        assert!(result.is_err());

        let missing: Result<ActivityRecord, _> =
            serde_json::from_str(r#"{"activity_category": "work"}"#);
        assert!(missing.is_err());
    }

    #[test]
    fn test_activity_rejects_negative_duration() {
        let result: Result<ActivityRecord, _> = serde_json::from_str(
            r#"{"timestamp": "2024-01-15T14:00:00Z", "duration_seconds": -5}"#,
        );
        assert!(result.is_err());
    }

    #[test]
    fn test_task_type_field_is_renamed() {
        let task: TaskRecord =
            serde_json::from_str(r#"{"title": "Fix bug", "type": "Coding"}"#).unwrap();
        assert_eq!(task.type_key(), "coding");
        assert_eq!(task.priority_key(), "medium");
        assert_eq!(task.category_key(), "general");
    }

    #[test]
    fn test_task_empty_due_date_is_none() {
        let task: TaskRecord =
            serde_json::from_str(r#"{"title": "x", "due_date": ""}"#).unwrap();
        assert!(task.due_date.is_none());

        let bad: Result<TaskRecord, _> =
            serde_json::from_str(r#"{"title": "x", "due_date": "soon"}"#);
        assert!(bad.is_err());
    }

    #[test]
    fn test_task_estimate_fallbacks() {
        assert_eq!(TaskRecord::new("a").estimate_or(30), 30);
        assert_eq!(TaskRecord::new("a").with_estimate(45).estimate_or(30), 45);

        let mut task = TaskRecord::new("a");
        task.duration_minutes = Some(20);
        assert_eq!(task.estimate_or(0), 20);
    }

    #[test]
    fn test_recorded_minutes_skips_zero() {
        let mut task = TaskRecord::new("a").with_actual(0);
        task.duration_minutes = Some(25);
        assert_eq!(task.recorded_minutes(), Some(25));
        assert_eq!(TaskRecord::new("b").recorded_minutes(), None);
    }

    #[test]
    fn test_task_open_and_priority_flags() {
        assert!(TaskRecord::new("a").is_open());
        assert!(!TaskRecord::new("a").with_status("completed").is_open());
        assert!(!TaskRecord::new("a").with_status("cancelled").is_open());
        assert!(TaskRecord::new("a").with_priority("URGENT").is_high_priority());
        assert!(!TaskRecord::new("a").is_high_priority());
    }

    #[test]
    fn test_preferences_defaults() {
        let prefs: UserPreferences = serde_json::from_str("{}").unwrap();
        assert_eq!(prefs.peak_productivity_hours, vec![9, 10, 11, 14, 15, 16]);
        assert_eq!(prefs.preferred_focus_duration, 50);
        assert_eq!(prefs, UserPreferences::default());
    }

    #[test]
    fn test_profile_ignores_non_positive_average() {
        assert_eq!(UserProfile::default().average_minutes(), None);
        assert_eq!(
            UserProfile::with_average_task_duration(0.0).average_minutes(),
            None
        );
        assert_eq!(
            UserProfile::with_average_task_duration(45.0).average_minutes(),
            Some(45.0)
        );
    }
}
