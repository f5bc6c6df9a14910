//! Record adapter
//!
//! Validates loosely-typed JSON batches and converts them into typed records.
//! Timestamps are checked before deserialization so a bad record is reported
//! with its position and raw value instead of being dropped: silently skipping
//! it would shift time-window filtering and pattern detection.

use chrono::{DateTime, NaiveDate, NaiveDateTime, TimeZone, Utc};
use serde::de::DeserializeOwned;
use serde_json::Value;

use crate::error::EngineError;
use crate::types::{ActivityPatternEntry, ActivityRecord, FocusSession, TaskRecord};

/// Offset-less date-time layouts, interpreted as UTC
const NAIVE_FORMATS: [&str; 6] = [
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y-%m-%dT%H:%M:%S",
    "%Y-%m-%dT%H:%M",
    "%Y-%m-%d %H:%M:%S%.f",
    "%Y-%m-%d %H:%M:%S",
    "%Y-%m-%d %H:%M",
];

/// Date-time layouts carrying an explicit offset that RFC 3339 parsing rejects
const OFFSET_FORMATS: [&str; 3] = [
    "%Y-%m-%d %H:%M:%S%.f%:z",
    "%Y-%m-%dT%H:%M%:z",
    "%Y-%m-%d %H:%M%:z",
];

/// Parse an ISO-8601 timestamp into UTC.
///
/// Accepts RFC 3339 (a trailing `Z` means UTC), date-times without an offset
/// (taken as UTC) and bare dates (midnight UTC).
pub fn parse_timestamp(raw: &str) -> Result<DateTime<Utc>, EngineError> {
    let trimmed = raw.trim();
    let invalid = || EngineError::InvalidTimestamp {
        field: "timestamp".to_string(),
        value: raw.to_string(),
    };

    if trimmed.is_empty() {
        return Err(invalid());
    }

    if let Ok(dt) = DateTime::parse_from_rfc3339(trimmed) {
        return Ok(dt.with_timezone(&Utc));
    }

    for format in OFFSET_FORMATS {
        if let Ok(dt) = DateTime::parse_from_str(trimmed, format) {
            return Ok(dt.with_timezone(&Utc));
        }
    }

    for format in NAIVE_FORMATS {
        if let Ok(naive) = NaiveDateTime::parse_from_str(trimmed, format) {
            return Ok(Utc.from_utc_datetime(&naive));
        }
    }

    if let Ok(date) = NaiveDate::parse_from_str(trimmed, "%Y-%m-%d") {
        if let Some(naive) = date.and_hms_opt(0, 0, 0) {
            return Ok(Utc.from_utc_datetime(&naive));
        }
    }

    Err(invalid())
}

/// A timestamp-bearing field checked before deserialization
struct TimestampField {
    name: &'static str,
    required: bool,
}

const ACTIVITY_TIMESTAMPS: &[TimestampField] = &[TimestampField {
    name: "timestamp",
    required: true,
}];

const TASK_TIMESTAMPS: &[TimestampField] = &[TimestampField {
    name: "due_date",
    required: false,
}];

const SESSION_TIMESTAMPS: &[TimestampField] = &[TimestampField {
    name: "started_at",
    required: true,
}];

/// Parse a JSON array of activity records
pub fn parse_activities(json: &str) -> Result<Vec<ActivityRecord>, EngineError> {
    activities_from_value(&serde_json::from_str(json)?)
}

/// Parse a JSON array of task records
pub fn parse_tasks(json: &str) -> Result<Vec<TaskRecord>, EngineError> {
    tasks_from_value(&serde_json::from_str(json)?)
}

/// Convert an already-parsed JSON array into activity records
pub fn activities_from_value(value: &Value) -> Result<Vec<ActivityRecord>, EngineError> {
    records_from_value(value, "activities", ACTIVITY_TIMESTAMPS)
}

/// Convert an already-parsed JSON array into task records
pub fn tasks_from_value(value: &Value) -> Result<Vec<TaskRecord>, EngineError> {
    records_from_value(value, "tasks", TASK_TIMESTAMPS)
}

/// Convert an already-parsed JSON array into focus sessions
///
/// Negative or non-finite durations are rejected.
pub fn sessions_from_value(value: &Value) -> Result<Vec<FocusSession>, EngineError> {
    let sessions: Vec<FocusSession> =
        records_from_value(value, "focus_sessions", SESSION_TIMESTAMPS)?;
    for (index, session) in sessions.iter().enumerate() {
        if !(session.duration_minutes.is_finite() && session.duration_minutes >= 0.0) {
            return Err(EngineError::InvalidArgument(format!(
                "focus_sessions[{}].duration_minutes must be non-negative, got {}",
                index, session.duration_minutes
            )));
        }
    }
    Ok(sessions)
}

/// Convert an already-parsed JSON array into activity pattern entries
pub fn pattern_entries_from_value(value: &Value) -> Result<Vec<ActivityPatternEntry>, EngineError> {
    records_from_value(value, "activity_patterns", &[])
}

fn records_from_value<T: DeserializeOwned>(
    value: &Value,
    kind: &str,
    timestamps: &[TimestampField],
) -> Result<Vec<T>, EngineError> {
    let items = value
        .as_array()
        .ok_or_else(|| EngineError::ParseError(format!("{} must be a JSON array", kind)))?;

    let mut records = Vec::with_capacity(items.len());
    for (index, item) in items.iter().enumerate() {
        let object = item.as_object().ok_or_else(|| {
            EngineError::ParseError(format!("{}[{}] must be a JSON object", kind, index))
        })?;

        for field in timestamps {
            let path = format!("{}[{}].{}", kind, index, field.name);
            match object.get(field.name) {
                None | Some(Value::Null) => {
                    if field.required {
                        return Err(EngineError::MissingField(path));
                    }
                }
                Some(Value::String(raw)) => {
                    if !field.required && raw.trim().is_empty() {
                        continue;
                    }
                    parse_timestamp(raw).map_err(|_| EngineError::InvalidTimestamp {
                        field: path,
                        value: raw.clone(),
                    })?;
                }
                Some(other) => {
                    return Err(EngineError::InvalidTimestamp {
                        field: path,
                        value: other.to_string(),
                    });
                }
            }
        }

        let record = serde_json::from_value(item.clone())
            .map_err(|e| EngineError::ParseError(format!("{}[{}]: {}", kind, index, e)))?;
        records.push(record);
    }

    Ok(records)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Timelike;
    use serde_json::json;

    #[test]
    fn test_parse_timestamp_zulu() {
        let ts = parse_timestamp("2024-01-15T14:30:00Z").unwrap();
        assert_eq!(ts, Utc.with_ymd_and_hms(2024, 1, 15, 14, 30, 0).unwrap());
    }

    #[test]
    fn test_parse_timestamp_normalizes_offset() {
        let ts = parse_timestamp("2024-01-15T14:30:00+02:00").unwrap();
        assert_eq!(ts.hour(), 12);
    }

    #[test]
    fn test_parse_timestamp_naive_and_date_only() {
        let naive = parse_timestamp("2024-01-15T08:05:00.250").unwrap();
        assert_eq!(naive.hour(), 8);
        assert_eq!(naive.minute(), 5);

        let spaced = parse_timestamp("2024-01-15 08:05:00").unwrap();
        assert_eq!(spaced.minute(), 5);

        let date = parse_timestamp("2024-01-15").unwrap();
        assert_eq!(date, Utc.with_ymd_and_hms(2024, 1, 15, 0, 0, 0).unwrap());
    }

    #[test]
    fn test_parse_timestamp_rejects_garbage() {
        assert!(matches!(
            parse_timestamp("not a date"),
            Err(EngineError::InvalidTimestamp { .. })
        ));
        assert!(parse_timestamp("").is_err());
        assert!(parse_timestamp("2024-13-45T00:00:00Z").is_err());
    }

    #[test]
    fn test_activities_from_value() {
        let value = json!([
            {"activity_type": "app", "activity_category": "Social", "timestamp": "2024-01-15T14:00:00Z", "duration_seconds": 120},
            {"activity_category": "work", "timestamp": "2024-01-15T14:05:00Z"}
        ]);
        let activities = activities_from_value(&value).unwrap();
        assert_eq!(activities.len(), 2);
        assert_eq!(activities[0].category_key(), "social");
        assert_eq!(activities[1].duration_seconds, 0);
    }

    #[test]
    fn test_bad_timestamp_fails_whole_batch() {
        let value = json!([
            {"activity_category": "work", "timestamp": "2024-01-15T14:00:00Z"},
            {"activity_category": "work", "timestamp": "15/01/2024"}
        ]);
        match activities_from_value(&value) {
            Err(EngineError::InvalidTimestamp { field, value }) => {
                assert_eq!(field, "activities[1].timestamp");
                assert_eq!(value, "15/01/2024");
            }
            other => panic!("expected invalid timestamp, got {:?}", other),
        }
    }

    #[test]
    fn test_missing_timestamp_is_reported() {
        let value = json!([{ "activity_category": "work" }]);
        assert!(matches!(
            activities_from_value(&value),
            Err(EngineError::MissingField(path)) if path == "activities[0].timestamp"
        ));
    }

    #[test]
    fn test_non_string_timestamp_is_rejected() {
        let value = json!([{ "started_at": 1705327200, "duration_minutes": 30 }]);
        assert!(matches!(
            sessions_from_value(&value),
            Err(EngineError::InvalidTimestamp { .. })
        ));
    }

    #[test]
    fn test_negative_session_duration_is_rejected() {
        let value = json!([
            {"started_at": "2024-01-15T09:00:00Z", "duration_minutes": 45, "interruption_count": 1},
            {"started_at": "2024-01-15T10:00:00Z", "duration_minutes": -20}
        ]);
        assert!(matches!(
            sessions_from_value(&value),
            Err(EngineError::InvalidArgument(msg)) if msg.starts_with("focus_sessions[1].duration_minutes")
        ));

        let valid = json!([{"started_at": "2024-01-15T09:00:00Z", "duration_minutes": 0}]);
        assert_eq!(sessions_from_value(&valid).unwrap()[0].duration_minutes, 0.0);
    }

    #[test]
    fn test_task_due_date_is_optional() {
        let value = json!([
            {"title": "a"},
            {"title": "b", "due_date": null},
            {"title": "c", "due_date": "2024-02-01T00:00:00Z"}
        ]);
        let tasks = tasks_from_value(&value).unwrap();
        assert!(tasks[0].due_date.is_none());
        assert!(tasks[1].due_date.is_none());
        assert!(tasks[2].due_date.is_some());
    }

    #[test]
    fn test_type_mismatch_is_parse_error() {
        let value = json!([{ "title": "a", "estimated_minutes": "lots" }]);
        assert!(matches!(
            tasks_from_value(&value),
            Err(EngineError::ParseError(msg)) if msg.starts_with("tasks[0]")
        ));
    }

    #[test]
    fn test_non_array_is_rejected() {
        assert!(matches!(
            pattern_entries_from_value(&json!({"activity_category": "social"})),
            Err(EngineError::ParseError(_))
        ));
    }

    #[test]
    fn test_parse_activities_from_str() {
        let json = r#"[{"activity_category": "news", "timestamp": "2024-01-15T09:00:00Z"}]"#;
        let activities = parse_activities(json).unwrap();
        assert_eq!(activities[0].activity_category, "news");
        assert!(matches!(parse_tasks("{oops"), Err(EngineError::JsonError(_))));
    }
}
