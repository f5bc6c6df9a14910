//! Engine façade
//!
//! `FocusEngine` owns one instance of each analytical component, built from a
//! shared [`EngineConfig`], and exposes JSON-in / JSON-out entry points.
//!
//! Each request goes through the same stages:
//! 1. Parse the request JSON
//! 2. Validate and coerce records (`adapter`)
//! 3. Run the component
//! 4. Encode the result as pretty JSON

use chrono::{DateTime, Utc};
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::{Map, Value};
use std::sync::Arc;

use crate::adapter::{
    activities_from_value, pattern_entries_from_value, sessions_from_value, tasks_from_value,
};
use crate::config::EngineConfig;
use crate::distraction::{DistractionAnalyzer, DEFAULT_WINDOW_HOURS};
use crate::error::EngineError;
use crate::planner::FocusPlanner;
use crate::predictor::DurationPredictor;
use crate::suggestions::SuggestionRanker;
use crate::summarizer::TaskSummarizer;
use crate::types::{TaskRecord, UserPreferences, UserProfile};

/// Owns the four components and serves JSON requests.
///
/// Components hold only immutable configuration, so a shared engine can serve
/// concurrent requests.
#[derive(Clone)]
pub struct FocusEngine {
    config: EngineConfig,
    analyzer: DistractionAnalyzer,
    planner: FocusPlanner,
    predictor: DurationPredictor,
    ranker: SuggestionRanker,
    clock: Option<DateTime<Utc>>,
}

impl Default for FocusEngine {
    fn default() -> Self {
        Self::new()
    }
}

impl FocusEngine {
    /// Create an engine with the default configuration
    pub fn new() -> Self {
        Self::with_config(EngineConfig::default())
    }

    /// Create an engine from an explicit configuration
    pub fn with_config(config: EngineConfig) -> Self {
        Self {
            analyzer: DistractionAnalyzer::from_config(&config),
            planner: FocusPlanner::from_config(&config),
            predictor: DurationPredictor::from_config(&config),
            ranker: SuggestionRanker::from_config(&config),
            config,
            clock: None,
        }
    }

    /// Load configuration overrides from JSON
    pub fn from_config_json(json: &str) -> Result<Self, EngineError> {
        Ok(Self::with_config(EngineConfig::from_json(json)?))
    }

    /// Attach a prose backend for task summaries
    pub fn with_summarizer(mut self, summarizer: Arc<dyn TaskSummarizer>) -> Self {
        self.planner = self.planner.with_summarizer(summarizer);
        self
    }

    /// Evaluate every request against a fixed `now` instead of the system clock
    pub fn with_fixed_clock(mut self, now: DateTime<Utc>) -> Self {
        self.clock = Some(now);
        self
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    pub fn analyzer(&self) -> &DistractionAnalyzer {
        &self.analyzer
    }

    pub fn planner(&self) -> &FocusPlanner {
        &self.planner
    }

    pub fn predictor(&self) -> &DurationPredictor {
        &self.predictor
    }

    pub fn ranker(&self) -> &SuggestionRanker {
        &self.ranker
    }

    fn now(&self) -> DateTime<Utc> {
        self.clock.unwrap_or_else(Utc::now)
    }

    /// Distraction analysis.
    ///
    /// Request: `{"activities": [...], "time_window_hours": 24}` or a bare
    /// activity array.
    pub fn analyze_activity_patterns_json(&self, request: &str) -> Result<String, EngineError> {
        let request = parse_request(request)?;
        let activities = activities_from_value(list_field(&request, "activities")?)?;
        let hours = optional_hours(&request, "time_window_hours")?.unwrap_or(DEFAULT_WINDOW_HOURS);

        let analysis = self.analyzer.analyze_at(&activities, hours, self.now())?;
        encode(&analysis)
    }

    /// Task summary.
    ///
    /// Request: `{"tasks": [...]}` or a bare task array.
    pub fn summarize_tasks_json(&self, request: &str) -> Result<String, EngineError> {
        let request = parse_request(request)?;
        let tasks = tasks_from_value(list_field(&request, "tasks")?)?;
        encode(&self.planner.summarize(&tasks))
    }

    /// Daily focus plan.
    ///
    /// Request: `{"tasks": [...], "user_preferences": {...}, "available_hours": 8}`;
    /// everything but `tasks` is optional.
    pub fn generate_focus_plan_json(&self, request: &str) -> Result<String, EngineError> {
        let request = parse_request(request)?;
        let tasks = tasks_from_value(list_field(&request, "tasks")?)?;
        let preferences: Option<UserPreferences> = optional_object(&request, "user_preferences")?;
        let available_hours = optional_hours(&request, "available_hours")?;

        let outcome = self.planner.generate_plan_at(
            &tasks,
            preferences.as_ref(),
            available_hours,
            self.now(),
        );
        encode(&outcome)
    }

    /// Single duration prediction.
    ///
    /// Request: `{"task": {...}, "historical_data": [...], "user_profile": {...}}`.
    pub fn predict_task_duration_json(&self, request: &str) -> Result<String, EngineError> {
        let request = parse_request(request)?;
        let task = single_task(&request)?;
        let history = optional_tasks(&request, "historical_data")?;
        let profile: Option<UserProfile> = optional_object(&request, "user_profile")?;

        let prediction =
            self.predictor
                .predict_at(&task, history.as_deref(), profile.as_ref(), self.now());
        encode(&prediction)
    }

    /// Batch duration prediction.
    ///
    /// Request: `{"tasks": [...], "historical_data": [...], "user_profile": {...}}`.
    pub fn batch_predict_json(&self, request: &str) -> Result<String, EngineError> {
        let request = parse_request(request)?;
        let tasks = tasks_from_value(list_field(&request, "tasks")?)?;
        let history = optional_tasks(&request, "historical_data")?;
        let profile: Option<UserProfile> = optional_object(&request, "user_profile")?;

        let predictions = self.predictor.batch_predict_at(
            &tasks,
            history.as_deref(),
            profile.as_ref(),
            self.now(),
        );
        encode(&predictions)
    }

    /// Ranked suggestions.
    ///
    /// Request: `{"user_id": "...", "productivity_data": {...}, "focus_sessions": [...],
    /// "tasks": [...], "activity_patterns": [...]}`; every field is optional.
    pub fn generate_suggestions_json(&self, request: &str) -> Result<String, EngineError> {
        let request = parse_request(request)?;
        let object = request
            .as_object()
            .ok_or_else(|| EngineError::ParseError("request must be a JSON object".to_string()))?;

        let user_id = match object.get("user_id") {
            None | Some(Value::Null) => "",
            Some(Value::String(id)) => id.as_str(),
            Some(_) => {
                return Err(EngineError::InvalidArgument(
                    "user_id must be a string".to_string(),
                ))
            }
        };
        let productivity_data = object
            .get("productivity_data")
            .cloned()
            .unwrap_or_else(|| Value::Object(Map::new()));
        let sessions = sessions_from_value(&optional_list(object, "focus_sessions"))?;
        let tasks = tasks_from_value(&optional_list(object, "tasks"))?;
        let patterns = pattern_entries_from_value(&optional_list(object, "activity_patterns"))?;

        let suggestions = self.ranker.generate_at(
            user_id,
            &productivity_data,
            &sessions,
            &tasks,
            &patterns,
            self.now(),
        );
        encode(&suggestions)
    }
}

fn parse_request(request: &str) -> Result<Value, EngineError> {
    Ok(serde_json::from_str(request)?)
}

fn encode<T: Serialize>(value: &T) -> Result<String, EngineError> {
    Ok(serde_json::to_string_pretty(value)?)
}

/// The named array of an object request, or the request itself when it is an array
fn list_field<'a>(request: &'a Value, name: &str) -> Result<&'a Value, EngineError> {
    match request {
        Value::Array(_) => Ok(request),
        Value::Object(object) => object
            .get(name)
            .ok_or_else(|| EngineError::MissingField(name.to_string())),
        _ => Err(EngineError::ParseError(format!(
            "request must be a JSON object or an array of {}",
            name
        ))),
    }
}

fn optional_list(object: &Map<String, Value>, name: &str) -> Value {
    match object.get(name) {
        None | Some(Value::Null) => Value::Array(Vec::new()),
        Some(value) => value.clone(),
    }
}

fn optional_field<'a>(request: &'a Value, name: &str) -> Option<&'a Value> {
    request
        .as_object()
        .and_then(|object| object.get(name))
        .filter(|value| !value.is_null())
}

fn optional_hours(request: &Value, name: &str) -> Result<Option<u32>, EngineError> {
    let Some(value) = optional_field(request, name) else {
        return Ok(None);
    };
    value
        .as_u64()
        .and_then(|hours| u32::try_from(hours).ok())
        .map(Some)
        .ok_or_else(|| {
            EngineError::InvalidArgument(format!("{} must be a non-negative integer", name))
        })
}

fn optional_object<T: DeserializeOwned>(request: &Value, name: &str) -> Result<Option<T>, EngineError> {
    optional_field(request, name)
        .map(|value| {
            serde_json::from_value(value.clone())
                .map_err(|e| EngineError::ParseError(format!("{}: {}", name, e)))
        })
        .transpose()
}

fn optional_tasks(request: &Value, name: &str) -> Result<Option<Vec<TaskRecord>>, EngineError> {
    optional_field(request, name)
        .map(tasks_from_value)
        .transpose()
}

fn single_task(request: &Value) -> Result<TaskRecord, EngineError> {
    let task = optional_field(request, "task")
        .ok_or_else(|| EngineError::MissingField("task".to_string()))?;
    tasks_from_value(&Value::Array(vec![task.clone()]))?
        .pop()
        .ok_or_else(|| EngineError::MissingField("task".to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use pretty_assertions::assert_eq;
    use serde_json::json;

    fn engine() -> FocusEngine {
        FocusEngine::new().with_fixed_clock(Utc.with_ymd_and_hms(2024, 1, 15, 18, 0, 0).unwrap())
    }

    fn decode(output: &str) -> Value {
        serde_json::from_str(output).unwrap()
    }

    #[test]
    fn test_analyze_json() {
        let request = json!({
            "activities": [
                {"activity_type": "app", "activity_category": "Entertainment",
                 "timestamp": "2024-01-15T10:00:00Z", "duration_seconds": 600}
            ],
            "time_window_hours": 24
        });
        let output = engine()
            .analyze_activity_patterns_json(&request.to_string())
            .unwrap();
        let report = decode(&output);

        assert_eq!(
            report["distraction_scores"]["overall_distraction_score"],
            json!(0.9)
        );
        assert_eq!(report["total_activities"], json!(1));
        assert_eq!(report["model_version"], json!("v1.0"));
    }

    #[test]
    fn test_analyze_json_accepts_bare_array_and_reports_empty() {
        let output = engine().analyze_activity_patterns_json("[]").unwrap();
        assert_eq!(
            decode(&output),
            json!({"error": "No activities provided for analysis", "total_activities": 0})
        );
    }

    #[test]
    fn test_analyze_json_rejects_bad_input() {
        let missing = json!({"activities": [{"activity_category": "work"}]});
        let result = engine().analyze_activity_patterns_json(&missing.to_string());
        assert!(matches!(result, Err(EngineError::MissingField(path)) if path == "activities[0].timestamp"));

        let zero = json!({"activities": [], "time_window_hours": 0});
        let result = engine().analyze_activity_patterns_json(&zero.to_string());
        assert!(matches!(result, Err(EngineError::InvalidArgument(_))));

        let result = engine().analyze_activity_patterns_json("not json");
        assert!(matches!(result, Err(EngineError::JsonError(_))));

        let result = engine().analyze_activity_patterns_json(r#"{"time_window_hours": 4}"#);
        assert!(matches!(result, Err(EngineError::MissingField(name)) if name == "activities"));
    }

    #[test]
    fn test_summarize_json_empty() {
        let output = engine().summarize_tasks_json(r#"{"tasks": []}"#).unwrap();
        assert_eq!(
            decode(&output),
            json!({
                "summary": "No tasks to summarize.",
                "total_tasks": 0,
                "categories": {},
                "priority_breakdown": {}
            })
        );
    }

    #[test]
    fn test_plan_json() {
        let request = json!({
            "tasks": [
                {"id": "t1", "title": "Write report", "priority": "high", "estimated_minutes": 60},
                {"id": "t2", "title": "Inbox", "priority": "low", "due_date": "2024-01-14"}
            ],
            "user_preferences": {"preferred_focus_duration": 25},
            "available_hours": 4
        });
        let output = engine().generate_focus_plan_json(&request.to_string()).unwrap();
        let plan = decode(&output);

        assert_eq!(plan["title"], json!("Focus Plan for January 15, 2024"));
        assert_eq!(plan["status"], json!("draft"));
        // overdue low (1 + 3) outranks high (3)
        assert_eq!(plan["recommended_schedule"]["task_schedule"][0]["task_id"], json!("t2"));
        assert_eq!(plan["estimated_total_minutes"], json!(90));
        assert!(plan["focus_strategy"]
            .as_str()
            .unwrap()
            .ends_with("Schedule 25-minute focus blocks aligned with your natural rhythm."));
    }

    #[test]
    fn test_plan_json_empty_and_invalid() {
        let output = engine().generate_focus_plan_json(r#"{"tasks": []}"#).unwrap();
        assert_eq!(
            decode(&output),
            json!({"error": "No tasks provided for focus plan generation"})
        );

        let result = engine().generate_focus_plan_json(r#"{"tasks": [], "available_hours": -2}"#);
        assert!(matches!(result, Err(EngineError::InvalidArgument(_))));

        let result = engine()
            .generate_focus_plan_json(r#"{"tasks": [{"title": "x", "due_date": "next week"}]}"#);
        assert!(matches!(result, Err(EngineError::InvalidTimestamp { .. })));
    }

    #[test]
    fn test_predict_json() {
        let request = json!({
            "task": {"id": "t9", "title": "Implement feature", "type": "coding"},
            "historical_data": null,
            "user_profile": null
        });
        let output = engine().predict_task_duration_json(&request.to_string()).unwrap();
        let prediction = decode(&output);

        assert_eq!(prediction["task_id"], json!("t9"));
        assert_eq!(prediction["predicted_minutes"], json!(90));
        assert_eq!(prediction["confidence_score"], json!(0.4));
        assert_eq!(prediction["input_features"]["task_type"], json!("coding"));

        let result = engine().predict_task_duration_json("{}");
        assert!(matches!(result, Err(EngineError::MissingField(name)) if name == "task"));
    }

    #[test]
    fn test_batch_predict_json() {
        let request = json!({
            "tasks": [
                {"title": "Reply to client", "type": "email"},
                {"title": "Sprint planning", "type": "planning"}
            ],
            "user_profile": {"average_task_duration_minutes": 15}
        });
        let output = engine().batch_predict_json(&request.to_string()).unwrap();
        let predictions = decode(&output);

        let minutes: Vec<&Value> = predictions
            .as_array()
            .unwrap()
            .iter()
            .map(|p| &p["predicted_minutes"])
            .collect();
        assert_eq!(minutes, vec![&json!(3), &json!(30)]);
    }

    #[test]
    fn test_suggestions_json() {
        let request = json!({
            "user_id": "user-1",
            "productivity_data": {},
            "focus_sessions": [
                {"started_at": "2024-01-15T09:00:00Z", "duration_minutes": 50, "interruption_count": 0}
            ],
            "tasks": [
                {"title": "Late", "priority": "urgent", "due_date": "2024-01-10T00:00:00Z"}
            ],
            "activity_patterns": [
                {"activity_category": "social", "distraction_score": 0.9}
            ]
        });
        let output = engine().generate_suggestions_json(&request.to_string()).unwrap();
        let suggestions = decode(&output);
        let kinds: Vec<&str> = suggestions
            .as_array()
            .unwrap()
            .iter()
            .map(|s| s["suggestion_type"].as_str().unwrap())
            .collect();

        assert_eq!(
            kinds,
            vec![
                "task_prioritization",
                "schedule_optimization",
                "distraction_management",
                "focus_duration"
            ]
        );

        let output = engine().generate_suggestions_json("{}").unwrap();
        assert_eq!(decode(&output), json!([]));
    }

    #[test]
    fn test_engine_uses_config() {
        let engine = FocusEngine::from_config_json(
            r#"{"base_durations": {"coding": 120, "general": 30}, "max_suggestions": 1}"#,
        )
        .unwrap();
        assert_eq!(engine.config().max_suggestions, 1);

        let output = engine
            .predict_task_duration_json(r#"{"task": {"title": "x", "type": "coding"}}"#)
            .unwrap();
        assert_eq!(decode(&output)["predicted_minutes"], json!(120));
    }
}
