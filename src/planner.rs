//! Focus planning
//!
//! Summarizes task lists and turns them into a time-boxed daily plan.
//!
//! Pipeline: Tasks → Prioritize → Schedule into peak hours → Strategy → Plan

use chrono::{DateTime, Duration, NaiveDate, TimeZone, Timelike, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::sync::Arc;
use uuid::Uuid;

use crate::config::{EngineConfig, DEFAULT_AVAILABLE_HOURS};
use crate::summarizer::{backend_titles, rule_based_summary, TaskSummarizer};
use crate::types::{TaskRecord, UserPreferences};
use crate::MODEL_VERSION;

/// Hour of day (UTC) the schedule starts at
const SCHEDULE_START_HOUR: u32 = 9;

/// Minutes assumed for a task without an estimate when scheduling
const DEFAULT_TASK_MINUTES: u32 = 30;

/// Buffer between scheduled tasks
const BUFFER_MINUTES: i64 = 5;

/// Average estimate above which long tasks should be split
const LONG_TASK_MINUTES: f64 = 60.0;

/// Priority buckets that are always present in a non-empty breakdown
const PRIORITY_BUCKETS: [&str; 4] = ["urgent", "high", "medium", "low"];

/// Summary of a task list
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TaskSummary {
    pub summary: String,
    pub total_tasks: usize,
    /// Category to number of tasks
    pub categories: BTreeMap<String, usize>,
    /// Lower-cased priority to number of tasks
    pub priority_breakdown: BTreeMap<String, u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub total_estimated_minutes: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub average_task_minutes: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub model_version: Option<String>,
}

impl TaskSummary {
    fn empty() -> Self {
        Self {
            summary: "No tasks to summarize.".to_string(),
            total_tasks: 0,
            categories: BTreeMap::new(),
            priority_breakdown: BTreeMap::new(),
            total_estimated_minutes: None,
            average_task_minutes: None,
            model_version: None,
        }
    }
}

/// One task placed on the timeline
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScheduledTask {
    pub task_id: Option<String>,
    pub title: String,
    pub scheduled_time: DateTime<Utc>,
    pub estimated_minutes: u32,
    pub priority: String,
    /// 1-based position in the schedule
    pub order: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Schedule {
    pub task_schedule: Vec<ScheduledTask>,
    pub start_time: Option<DateTime<Utc>>,
    /// Start of the last scheduled slot
    pub end_time: Option<DateTime<Utc>>,
    pub total_scheduled_minutes: u32,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PlanStatus {
    Draft,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FocusPlan {
    pub plan_id: Uuid,
    pub plan_type: String,
    pub title: String,
    pub description: String,
    pub tasks_summary: TaskSummary,
    pub recommended_schedule: Schedule,
    pub focus_strategy: String,
    pub estimated_total_minutes: u32,
    pub status: PlanStatus,
    pub created_at: DateTime<Utc>,
    pub model_version: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SkippedPlan {
    pub error: String,
}

/// Outcome of a plan request
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum FocusPlanOutcome {
    Plan(Box<FocusPlan>),
    Skipped(SkippedPlan),
}

impl FocusPlanOutcome {
    pub fn error(&self) -> Option<&str> {
        match self {
            FocusPlanOutcome::Plan(_) => None,
            FocusPlanOutcome::Skipped(skipped) => Some(&skipped.error),
        }
    }

    pub fn plan(&self) -> Option<&FocusPlan> {
        match self {
            FocusPlanOutcome::Plan(plan) => Some(plan),
            FocusPlanOutcome::Skipped(_) => None,
        }
    }
}

/// Focus planner with an optional prose backend
#[derive(Clone)]
pub struct FocusPlanner {
    summarizer: Option<Arc<dyn TaskSummarizer>>,
    default_available_hours: u32,
}

impl Default for FocusPlanner {
    fn default() -> Self {
        Self::new()
    }
}

impl FocusPlanner {
    /// Create a planner using rule-based summaries
    pub fn new() -> Self {
        Self {
            summarizer: None,
            default_available_hours: DEFAULT_AVAILABLE_HOURS,
        }
    }

    pub fn from_config(config: &EngineConfig) -> Self {
        Self {
            summarizer: None,
            default_available_hours: config.default_available_hours,
        }
    }

    /// Attach a prose backend for task summaries
    pub fn with_summarizer(mut self, summarizer: Arc<dyn TaskSummarizer>) -> Self {
        self.summarizer = Some(summarizer);
        self
    }

    pub fn has_summarizer(&self) -> bool {
        self.summarizer.is_some()
    }

    /// Summarize a task list
    pub fn summarize(&self, tasks: &[TaskRecord]) -> TaskSummary {
        if tasks.is_empty() {
            return TaskSummary::empty();
        }

        let mut categories: BTreeMap<String, usize> = BTreeMap::new();
        let mut priority_breakdown: BTreeMap<String, u32> = PRIORITY_BUCKETS
            .iter()
            .map(|p| (p.to_string(), 0))
            .collect();
        let mut total_estimated_minutes: u64 = 0;

        for task in tasks {
            *categories.entry(task.category_key().to_string()).or_default() += 1;
            *priority_breakdown.entry(task.priority_key()).or_default() += 1;
            total_estimated_minutes += u64::from(task.estimate_or(0));
        }

        let summary = self.summary_text(tasks, &categories, &priority_breakdown);

        TaskSummary {
            summary,
            total_tasks: tasks.len(),
            categories,
            priority_breakdown,
            total_estimated_minutes: Some(total_estimated_minutes),
            average_task_minutes: Some(total_estimated_minutes as f64 / tasks.len() as f64),
            model_version: Some(MODEL_VERSION.to_string()),
        }
    }

    fn summary_text(
        &self,
        tasks: &[TaskRecord],
        categories: &BTreeMap<String, usize>,
        priority_breakdown: &BTreeMap<String, u32>,
    ) -> String {
        if let Some(summarizer) = &self.summarizer {
            let titles = backend_titles(tasks.iter().map(|t| t.title.as_str()));
            match summarizer.summarize(&titles) {
                Ok(text) if !text.trim().is_empty() => return text.trim().to_string(),
                Ok(_) => log::warn!("summarizer backend returned empty text, using rule-based summary"),
                Err(e) => log::warn!("summarizer backend failed, using rule-based summary: {}", e),
            }
        }

        rule_based_summary(
            tasks.len(),
            priority_breakdown.get("urgent").copied().unwrap_or(0),
            priority_breakdown.get("high").copied().unwrap_or(0),
            categories.len(),
        )
    }

    /// Build a daily focus plan
    pub fn generate_plan(
        &self,
        tasks: &[TaskRecord],
        preferences: Option<&UserPreferences>,
        available_hours: Option<u32>,
    ) -> FocusPlanOutcome {
        self.generate_plan_at(tasks, preferences, available_hours, Utc::now())
    }

    /// Build a daily focus plan relative to an explicit `now`
    pub fn generate_plan_at(
        &self,
        tasks: &[TaskRecord],
        preferences: Option<&UserPreferences>,
        available_hours: Option<u32>,
        now: DateTime<Utc>,
    ) -> FocusPlanOutcome {
        if tasks.is_empty() {
            return FocusPlanOutcome::Skipped(SkippedPlan {
                error: "No tasks provided for focus plan generation".to_string(),
            });
        }

        let default_preferences = UserPreferences::default();
        let preferences = preferences.unwrap_or(&default_preferences);
        let available_hours = available_hours
            .filter(|h| *h > 0)
            .unwrap_or(self.default_available_hours);

        let prioritized = prioritize_tasks(tasks, now);
        let schedule = build_schedule(
            &prioritized,
            available_hours.saturating_mul(60),
            &preferences.peak_productivity_hours,
            now,
        );
        let focus_strategy = focus_strategy(&prioritized, preferences);

        log::debug!(
            "focus plan: scheduled {} of {} tasks ({} min)",
            schedule.task_schedule.len(),
            tasks.len(),
            schedule.total_scheduled_minutes
        );

        FocusPlanOutcome::Plan(Box::new(FocusPlan {
            plan_id: Uuid::new_v4(),
            plan_type: "daily".to_string(),
            title: format!("Focus Plan for {}", now.format("%B %d, %Y")),
            description: format!("Generated focus plan with {} tasks", tasks.len()),
            tasks_summary: self.summarize(tasks),
            estimated_total_minutes: schedule.total_scheduled_minutes,
            recommended_schedule: schedule,
            focus_strategy,
            status: PlanStatus::Draft,
            created_at: now,
            model_version: MODEL_VERSION.to_string(),
        }))
    }
}

/// Priority weight plus due-date urgency bonus
pub fn task_priority_score(task: &TaskRecord, now: DateTime<Utc>) -> u32 {
    let base = match task.priority_key().as_str() {
        "urgent" => 4,
        "high" => 3,
        "medium" => 2,
        "low" => 1,
        _ => 2,
    };

    let bonus = match task.due_date.map(|due| days_until(due, now)) {
        Some(days) if days < 0 => 3,
        Some(0) => 2,
        Some(1) => 1,
        _ => 0,
    };

    base + bonus
}

/// Whole days until `due`, floored (one second overdue is day -1)
fn days_until(due: DateTime<Utc>, now: DateTime<Utc>) -> i64 {
    (due - now).num_seconds().div_euclid(86_400)
}

/// Order tasks by descending priority score; ties keep input order
pub fn prioritize_tasks(tasks: &[TaskRecord], now: DateTime<Utc>) -> Vec<&TaskRecord> {
    let mut scored: Vec<(u32, &TaskRecord)> = tasks
        .iter()
        .map(|task| (task_priority_score(task, now), task))
        .collect();
    scored.sort_by(|a, b| b.0.cmp(&a.0));
    scored.into_iter().map(|(_, task)| task).collect()
}

fn at_hour(date: NaiveDate, hour: u32) -> Option<DateTime<Utc>> {
    date.and_hms_opt(hour, 0, 0)
        .map(|naive| Utc.from_utc_datetime(&naive))
}

/// Start of the next peak hour after `clock`.
///
/// Past the last peak hour of the day this is the first listed peak hour on
/// the *following* day, never an earlier hour on the same day, so scheduled
/// times only move forward.
fn next_peak_start(clock: DateTime<Utc>, peak_hours: &[u32]) -> DateTime<Utc> {
    let hour = clock.hour();
    let date = clock.date_naive();

    let next = match peak_hours.iter().copied().filter(|h| *h > hour).min() {
        Some(next_hour) => at_hour(date, next_hour),
        None => match (peak_hours.first(), date.succ_opt()) {
            (Some(first), Some(tomorrow)) => at_hour(tomorrow, *first),
            _ => None,
        },
    };

    next.unwrap_or(clock)
}

fn build_schedule(
    tasks: &[&TaskRecord],
    available_minutes: u32,
    peak_hours: &[u32],
    now: DateTime<Utc>,
) -> Schedule {
    let peak_hours: Vec<u32> = peak_hours.iter().copied().filter(|h| *h < 24).collect();
    let mut clock = at_hour(now.date_naive(), SCHEDULE_START_HOUR).unwrap_or(now);
    let mut total_scheduled: u32 = 0;
    let mut task_schedule = Vec::new();

    for (index, task) in tasks.iter().enumerate() {
        let estimated = task.estimate_or(DEFAULT_TASK_MINUTES);

        // an overflowing total cannot fit either
        let fits = total_scheduled
            .checked_add(estimated)
            .map_or(false, |total| total <= available_minutes);
        if !fits {
            break;
        }

        if index > 0 && !peak_hours.is_empty() && !peak_hours.contains(&clock.hour()) {
            clock = next_peak_start(clock, &peak_hours);
        }

        task_schedule.push(ScheduledTask {
            task_id: task.id.clone(),
            title: task.title.clone(),
            scheduled_time: clock,
            estimated_minutes: estimated,
            priority: task.priority.clone().unwrap_or_else(|| "medium".to_string()),
            order: index + 1,
        });

        clock += Duration::minutes(i64::from(estimated) + BUFFER_MINUTES);
        total_scheduled += estimated;
    }

    Schedule {
        start_time: task_schedule.first().map(|t| t.scheduled_time),
        end_time: task_schedule.last().map(|t| t.scheduled_time),
        task_schedule,
        total_scheduled_minutes: total_scheduled,
    }
}

fn focus_strategy(tasks: &[&TaskRecord], preferences: &UserPreferences) -> String {
    let mut strategies: Vec<String> = Vec::new();

    let high_priority_count = tasks.iter().filter(|t| t.is_high_priority()).count();
    if high_priority_count as f64 > tasks.len() as f64 * 0.5 {
        strategies.push(
            "Focus on high-priority tasks first during your peak productivity hours.".to_string(),
        );
    } else {
        strategies.push(
            "Distribute focus sessions evenly throughout the day with strategic breaks."
                .to_string(),
        );
    }

    let average_minutes = if tasks.is_empty() {
        f64::from(DEFAULT_TASK_MINUTES)
    } else {
        tasks
            .iter()
            .map(|t| f64::from(t.estimate_or(DEFAULT_TASK_MINUTES)))
            .sum::<f64>()
            / tasks.len() as f64
    };
    if average_minutes > LONG_TASK_MINUTES {
        strategies.push(
            "Consider breaking down longer tasks into focused 50-minute sessions with 10-minute breaks."
                .to_string(),
        );
    }

    strategies.push(format!(
        "Schedule {}-minute focus blocks aligned with your natural rhythm.",
        preferences.preferred_focus_duration
    ));

    strategies.join(" ")
}

/// Summarize tasks with the rule-based summary
pub fn summarize_tasks(tasks: &[TaskRecord]) -> TaskSummary {
    FocusPlanner::new().summarize(tasks)
}

/// Build a focus plan with default settings
pub fn generate_focus_plan(
    tasks: &[TaskRecord],
    preferences: Option<&UserPreferences>,
    available_hours: Option<u32>,
) -> FocusPlanOutcome {
    FocusPlanner::new().generate_plan(tasks, preferences, available_hours)
}
