//! Productivity suggestions
//!
//! Five independent generators each inspect one slice of the user's history
//! and yield at most one suggestion. Results are ranked by `priority_score`.

use chrono::{DateTime, Timelike, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{json, Map, Value};

use crate::config::{EngineConfig, DEFAULT_MAX_SUGGESTIONS};
use crate::stats::{mean, median};
use crate::types::{ActivityPatternEntry, FocusSession, TaskRecord};

/// Number of best hours named by the schedule suggestion
const PEAK_HOURS_SHOWN: usize = 3;

/// Overdue task titles listed in the prioritization context
const OVERDUE_TITLES_SHOWN: usize = 3;

/// Pattern entries above this score count as high distraction
const HIGH_DISTRACTION_SCORE: f64 = 0.7;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SuggestionType {
    ScheduleOptimization,
    TaskPrioritization,
    BreakTiming,
    FocusDuration,
    DistractionManagement,
}

impl SuggestionType {
    /// Fixed ranking score of each suggestion kind
    pub fn priority_score(&self) -> f64 {
        match self {
            SuggestionType::TaskPrioritization => 0.95,
            SuggestionType::ScheduleOptimization => 0.85,
            SuggestionType::DistractionManagement => 0.80,
            SuggestionType::BreakTiming => 0.75,
            SuggestionType::FocusDuration => 0.70,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Suggestion {
    pub suggestion_type: SuggestionType,
    pub title: String,
    pub description: String,
    pub rationale: String,
    pub priority_score: f64,
    pub action_items: Vec<String>,
    pub expected_benefit: String,
    pub context_data: Map<String, Value>,
}

impl Suggestion {
    fn new(suggestion_type: SuggestionType, title: String, description: String) -> Self {
        Self {
            suggestion_type,
            title,
            description,
            rationale: String::new(),
            priority_score: suggestion_type.priority_score(),
            action_items: Vec::new(),
            expected_benefit: String::new(),
            context_data: Map::new(),
        }
    }

    fn with_rationale(mut self, rationale: &str) -> Self {
        self.rationale = rationale.to_string();
        self
    }

    fn with_actions(mut self, actions: Vec<String>) -> Self {
        self.action_items = actions;
        self
    }

    fn with_benefit(mut self, benefit: &str) -> Self {
        self.expected_benefit = benefit.to_string();
        self
    }

    fn with_context(mut self, context: Value) -> Self {
        if let Value::Object(map) = context {
            self.context_data = map;
        }
        self
    }
}

/// Ranks suggestions from the five generators
#[derive(Debug, Clone)]
pub struct SuggestionRanker {
    max_suggestions: usize,
}

impl Default for SuggestionRanker {
    fn default() -> Self {
        Self::new()
    }
}

impl SuggestionRanker {
    pub fn new() -> Self {
        Self {
            max_suggestions: DEFAULT_MAX_SUGGESTIONS,
        }
    }

    pub fn with_max_suggestions(max_suggestions: usize) -> Self {
        Self { max_suggestions }
    }

    pub fn from_config(config: &EngineConfig) -> Self {
        Self::with_max_suggestions(config.max_suggestions)
    }

    pub fn generate(
        &self,
        user_id: &str,
        productivity_data: &Value,
        sessions: &[FocusSession],
        tasks: &[TaskRecord],
        patterns: &[ActivityPatternEntry],
    ) -> Vec<Suggestion> {
        self.generate_at(user_id, productivity_data, sessions, tasks, patterns, Utc::now())
    }

    /// Generate suggestions, judging overdue tasks against `now`
    ///
    /// `productivity_data` is accepted for interface parity and not inspected.
    pub fn generate_at(
        &self,
        user_id: &str,
        _productivity_data: &Value,
        sessions: &[FocusSession],
        tasks: &[TaskRecord],
        patterns: &[ActivityPatternEntry],
        now: DateTime<Utc>,
    ) -> Vec<Suggestion> {
        let mut suggestions: Vec<Suggestion> = [
            schedule_suggestion(sessions),
            prioritization_suggestion(tasks, now),
            break_timing_suggestion(sessions),
            focus_duration_suggestion(sessions),
            distraction_suggestion(patterns),
        ]
        .into_iter()
        .flatten()
        .collect();

        suggestions.sort_by(|a, b| b.priority_score.total_cmp(&a.priority_score));
        suggestions.truncate(self.max_suggestions);

        log::debug!(
            "suggestions for user {}: {} generated",
            user_id,
            suggestions.len()
        );

        suggestions
    }
}

#[derive(Debug, Default)]
struct HourTotals {
    duration: f64,
    interruptions: u64,
}

impl HourTotals {
    /// Minutes of focus per interruption
    fn productivity(&self) -> f64 {
        self.duration / self.interruptions.max(1) as f64
    }
}

fn schedule_suggestion(sessions: &[FocusSession]) -> Option<Suggestion> {
    // first-seen hour order so ties stay stable
    let mut hours: Vec<(u32, HourTotals)> = Vec::new();
    for session in sessions {
        let hour = session.started_at.hour();
        let index = match hours.iter().position(|(h, _)| *h == hour) {
            Some(index) => index,
            None => {
                hours.push((hour, HourTotals::default()));
                hours.len() - 1
            }
        };
        let totals = &mut hours[index].1;
        totals.duration += session.duration_minutes;
        totals.interruptions += u64::from(session.interruption_count);
    }

    hours.sort_by(|a, b| b.1.productivity().total_cmp(&a.1.productivity()));
    hours.truncate(PEAK_HOURS_SHOWN);

    let (first, best) = hours.first()?;
    let last = hours.last().map(|(h, _)| *h).unwrap_or(*first);
    let peak_hours: Vec<u32> = hours.iter().map(|(h, _)| *h).collect();
    let listed = peak_hours
        .iter()
        .map(|h| format!("{}:00", h))
        .collect::<Vec<_>>()
        .join(", ");

    Some(
        Suggestion::new(
            SuggestionType::ScheduleOptimization,
            "Optimize Your Schedule".to_string(),
            format!(
                "Your most productive hours are {}. Schedule important tasks during these times.",
                listed
            ),
        )
        .with_rationale(
            "Based on your focus session history, these hours show the highest productivity with minimal interruptions.",
        )
        .with_actions(vec![
            format!("Schedule high-priority tasks between {}:00 and {}:00", first, last),
            "Block these hours in your calendar for deep work".to_string(),
        ])
        .with_benefit("30% increase in focus session effectiveness")
        .with_context(json!({
            "peak_hours": peak_hours,
            "productivity_score": best.productivity(),
        })),
    )
}

fn prioritization_suggestion(tasks: &[TaskRecord], now: DateTime<Utc>) -> Option<Suggestion> {
    let overdue: Vec<&TaskRecord> = tasks
        .iter()
        .filter(|t| t.is_open() && t.is_high_priority())
        .filter(|t| t.due_date.map_or(false, |due| due < now))
        .collect();

    if overdue.is_empty() {
        return None;
    }

    let titles: Vec<&str> = overdue
        .iter()
        .take(OVERDUE_TITLES_SHOWN)
        .map(|t| t.title.as_str())
        .collect();

    Some(
        Suggestion::new(
            SuggestionType::TaskPrioritization,
            "Focus on Overdue High-Priority Tasks".to_string(),
            format!(
                "You have {} overdue high-priority task(s) that need immediate attention.",
                overdue.len()
            ),
        )
        .with_rationale("Overdue high-priority tasks can cause stress and reduce overall productivity.")
        .with_actions(vec![
            format!("Review {} overdue task(s)", overdue.len()),
            "Schedule focus sessions for these tasks today".to_string(),
            "Consider breaking down complex tasks into smaller pieces".to_string(),
        ])
        .with_benefit("Reduce stress and improve task completion rate")
        .with_context(json!({
            "overdue_count": overdue.len(),
            "tasks": titles,
        })),
    )
}

fn break_timing_suggestion(sessions: &[FocusSession]) -> Option<Suggestion> {
    let interrupted: Vec<&FocusSession> = sessions
        .iter()
        .filter(|s| s.interruption_count > 0)
        .collect();

    let durations: Vec<f64> = interrupted.iter().map(|s| s.duration_minutes).collect();
    let interruptions: Vec<f64> = interrupted
        .iter()
        .map(|s| f64::from(s.interruption_count))
        .collect();
    let avg_duration = mean(&durations)?;
    let avg_interruptions = mean(&interruptions)?;

    if avg_interruptions <= 3.0 || avg_duration <= 50.0 {
        return None;
    }

    Some(
        Suggestion::new(
            SuggestionType::BreakTiming,
            "Take Strategic Breaks Earlier".to_string(),
            format!(
                "Your focus sessions show increased interruptions after {} minutes. Try taking breaks at 45-minute intervals.",
                avg_duration.trunc()
            ),
        )
        .with_rationale("Taking breaks before productivity naturally declines can maintain focus quality.")
        .with_actions(vec![
            "Set focus sessions to 45 minutes instead of longer durations".to_string(),
            "Take 5-10 minute breaks between sessions".to_string(),
            "Use breaks to hydrate and stretch".to_string(),
        ])
        .with_benefit("20% reduction in interruptions and improved focus quality")
        .with_context(json!({
            "avg_duration": avg_duration,
            "avg_interruptions": avg_interruptions,
        })),
    )
}

fn focus_duration_suggestion(sessions: &[FocusSession]) -> Option<Suggestion> {
    let durations: Vec<f64> = sessions
        .iter()
        .filter(|s| s.interruption_count <= 1 && s.duration_minutes >= 30.0)
        .map(|s| s.duration_minutes)
        .collect();
    let optimal = median(&durations)?;
    let minutes = optimal.trunc();

    Some(
        Suggestion::new(
            SuggestionType::FocusDuration,
            format!("Optimal Focus Duration: {} Minutes", minutes),
            format!(
                "Your most successful focus sessions average {} minutes with minimal interruptions.",
                minutes
            ),
        )
        .with_rationale("Using your proven optimal duration can improve focus session success rate.")
        .with_actions(vec![
            format!("Set default focus duration to {} minutes", minutes),
            "Experiment with ±5 minute variations to fine-tune".to_string(),
            "Track interruption rates to validate optimal duration".to_string(),
        ])
        .with_benefit("Higher focus session completion rate with fewer interruptions")
        .with_context(json!({
            "optimal_duration": optimal,
            "sample_size": durations.len(),
        })),
    )
}

fn distraction_suggestion(patterns: &[ActivityPatternEntry]) -> Option<Suggestion> {
    // first-seen category order so ties go to the earliest
    let mut counts: Vec<(&str, usize)> = Vec::new();
    for entry in patterns
        .iter()
        .filter(|p| p.distraction_score.unwrap_or(0.0) > HIGH_DISTRACTION_SCORE)
    {
        let category = entry.activity_category.as_str();
        match counts.iter_mut().find(|(c, _)| *c == category) {
            Some((_, count)) => *count += 1,
            None => counts.push((category, 1)),
        }
    }

    let (category, frequency) = counts
        .iter()
        .fold(None, |best: Option<(&str, usize)>, &(c, n)| match best {
            Some((_, top)) if top >= n => best,
            _ => Some((c, n)),
        })?;

    Some(
        Suggestion::new(
            SuggestionType::DistractionManagement,
            format!("Manage {} Distractions", title_words(category)),
            format!(
                "You have frequent {} distractions during focus time. Consider blocking these during focus sessions.",
                category
            ),
        )
        .with_rationale(&format!(
            "Reducing {} distractions can significantly improve focus quality.",
            category
        ))
        .with_actions(vec![
            format!("Enable focus mode to block {} notifications", category),
            format!("Schedule {} time during breaks", category),
            "Use app blockers during focus sessions".to_string(),
        ])
        .with_benefit("40% reduction in distractions during focus sessions")
        .with_context(json!({
            "distraction_type": category,
            "frequency": frequency,
        })),
    )
}

/// Capitalize each word: "social media" -> "Social Media"
fn title_words(text: &str) -> String {
    text.split(' ')
        .map(|word| {
            let mut chars = word.chars();
            match chars.next() {
                Some(first) => first.to_uppercase().chain(chars.flat_map(char::to_lowercase)).collect(),
                None => String::new(),
            }
        })
        .collect::<Vec<_>>()
        .join(" ")
}

/// Generate suggestions with the default limit
pub fn generate_suggestions(
    user_id: &str,
    productivity_data: &Value,
    sessions: &[FocusSession],
    tasks: &[TaskRecord],
    patterns: &[ActivityPatternEntry],
) -> Vec<Suggestion> {
    SuggestionRanker::new().generate(user_id, productivity_data, sessions, tasks, patterns)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, TimeZone};
    use pretty_assertions::assert_eq;

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 1, 15, 18, 0, 0).unwrap()
    }

    fn session(hour: u32, minutes: f64, interruptions: u32) -> FocusSession {
        FocusSession::new(
            Utc.with_ymd_and_hms(2024, 1, 15, hour, 0, 0).unwrap(),
            minutes,
            interruptions,
        )
    }

    fn kinds(suggestions: &[Suggestion]) -> Vec<SuggestionType> {
        suggestions.iter().map(|s| s.suggestion_type).collect()
    }

    #[test]
    fn test_no_history_no_suggestions() {
        let suggestions = generate_suggestions("u1", &json!({}), &[], &[], &[]);
        assert!(suggestions.is_empty());
    }

    #[test]
    fn test_schedule_optimization_picks_best_hours() {
        let sessions = vec![
            session(9, 60.0, 0),
            session(14, 90.0, 3),
            session(9, 30.0, 1),
            session(20, 45.0, 0),
            session(16, 40.0, 2),
        ];
        let suggestion = schedule_suggestion(&sessions).unwrap();

        // 9 -> 90, 20 -> 45, 14 -> 30, 16 -> 20
        assert_eq!(suggestion.context_data["peak_hours"], json!([9, 20, 14]));
        assert_eq!(suggestion.context_data["productivity_score"], json!(90.0));
        assert_eq!(
            suggestion.description,
            "Your most productive hours are 9:00, 20:00, 14:00. Schedule important tasks during these times."
        );
        assert_eq!(
            suggestion.action_items[0],
            "Schedule high-priority tasks between 9:00 and 14:00"
        );
    }

    #[test]
    fn test_schedule_ties_keep_first_seen_hour() {
        let sessions = vec![session(15, 30.0, 0), session(10, 30.0, 0)];
        let suggestion = schedule_suggestion(&sessions).unwrap();
        assert_eq!(suggestion.context_data["peak_hours"], json!([15, 10]));
    }

    #[test]
    fn test_schedule_interruption_totals_do_not_overflow() {
        let sessions = vec![session(9, 60.0, u32::MAX), session(9, 60.0, u32::MAX)];
        let suggestion = schedule_suggestion(&sessions).unwrap();
        assert_eq!(suggestion.context_data["peak_hours"], json!([9]));
        let score = suggestion.context_data["productivity_score"].as_f64().unwrap();
        assert!(score > 0.0 && score < 1e-6);
    }

    #[test]
    fn test_overdue_high_priority_tasks() {
        let past = now() - Duration::days(1);
        let tasks = vec![
            TaskRecord::new("Ship fix").with_priority("urgent").with_due_date(past),
            TaskRecord::new("Done").with_priority("high").with_due_date(past).with_status("completed"),
            TaskRecord::new("Later").with_priority("high").with_due_date(now() + Duration::days(1)),
            TaskRecord::new("Low").with_priority("low").with_due_date(past),
            TaskRecord::new("Report").with_priority("High").with_due_date(past),
            TaskRecord::new("Undated").with_priority("urgent"),
        ];
        let suggestion = prioritization_suggestion(&tasks, now()).unwrap();

        assert_eq!(suggestion.priority_score, 0.95);
        assert_eq!(
            suggestion.description,
            "You have 2 overdue high-priority task(s) that need immediate attention."
        );
        assert_eq!(suggestion.context_data["overdue_count"], json!(2));
        assert_eq!(suggestion.context_data["tasks"], json!(["Ship fix", "Report"]));
    }

    #[test]
    fn test_break_timing_thresholds() {
        let heavy = vec![session(9, 60.0, 4), session(10, 70.0, 5), session(11, 20.0, 0)];
        let suggestion = break_timing_suggestion(&heavy).unwrap();
        assert_eq!(
            suggestion.description,
            "Your focus sessions show increased interruptions after 65 minutes. Try taking breaks at 45-minute intervals."
        );
        assert_eq!(suggestion.context_data["avg_interruptions"], json!(4.5));

        let light = vec![session(9, 60.0, 3), session(10, 70.0, 3)];
        assert!(break_timing_suggestion(&light).is_none());
    }

    #[test]
    fn test_focus_duration_uses_median_of_clean_sessions() {
        let sessions = vec![
            session(9, 45.0, 0),
            session(10, 55.0, 1),
            session(11, 90.0, 4),
            session(12, 20.0, 0),
            session(13, 50.5, 0),
        ];
        let suggestion = focus_duration_suggestion(&sessions).unwrap();
        assert_eq!(suggestion.title, "Optimal Focus Duration: 50 Minutes");
        assert_eq!(suggestion.context_data["optimal_duration"], json!(50.5));
        assert_eq!(suggestion.context_data["sample_size"], json!(3));
        assert_eq!(suggestion.action_items[1], "Experiment with ±5 minute variations to fine-tune");
    }

    #[test]
    fn test_distraction_management_top_category() {
        let patterns = vec![
            ActivityPatternEntry::new("social media", 0.8),
            ActivityPatternEntry::new("entertainment", 0.95),
            ActivityPatternEntry::new("social media", 0.75),
            ActivityPatternEntry::new("entertainment", 0.9),
            ActivityPatternEntry::new("work", 0.1),
            ActivityPatternEntry::new("news", 0.7),
        ];
        let suggestion = distraction_suggestion(&patterns).unwrap();

        assert_eq!(suggestion.title, "Manage Social Media Distractions");
        assert_eq!(suggestion.action_items[1], "Schedule social media time during breaks");
        assert_eq!(suggestion.context_data["distraction_type"], json!("social media"));
        assert_eq!(suggestion.context_data["frequency"], json!(2));
    }

    #[test]
    fn test_ranked_output() {
        let sessions = vec![session(9, 60.0, 4), session(10, 70.0, 5), session(11, 45.0, 0)];
        let tasks = vec![TaskRecord::new("Late").with_priority("urgent").with_due_date(now() - Duration::hours(1))];
        let patterns = vec![ActivityPatternEntry::new("entertainment", 0.9)];

        let suggestions = SuggestionRanker::new().generate_at(
            "user-42",
            &json!({"average_focus_minutes": 40}),
            &sessions,
            &tasks,
            &patterns,
            now(),
        );

        assert_eq!(
            kinds(&suggestions),
            vec![
                SuggestionType::TaskPrioritization,
                SuggestionType::ScheduleOptimization,
                SuggestionType::DistractionManagement,
                SuggestionType::BreakTiming,
                SuggestionType::FocusDuration,
            ]
        );
        assert!(suggestions
            .windows(2)
            .all(|pair| pair[0].priority_score >= pair[1].priority_score));

        let limited = SuggestionRanker::with_max_suggestions(2).generate_at(
            "user-42",
            &Value::Null,
            &sessions,
            &tasks,
            &patterns,
            now(),
        );
        assert_eq!(limited.len(), 2);

        let value = serde_json::to_value(&suggestions[0]).unwrap();
        assert_eq!(value["suggestion_type"], json!("task_prioritization"));
    }
}
