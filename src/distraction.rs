//! Distraction analysis
//!
//! Scores how distracting a window of activity was, detects time-of-day and
//! repetition patterns, and turns both into insights.
//!
//! Pipeline: Activities → Window filter → Category scoring → Patterns → Insights → Report

use chrono::{DateTime, Duration, Timelike, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::config::{CategoryWeights, EngineConfig};
use crate::error::EngineError;
use crate::stats::{mean, median};
use crate::types::ActivityRecord;
use crate::MODEL_VERSION;

/// Default analysis window in hours
pub const DEFAULT_WINDOW_HOURS: u32 = 24;

/// Adjacent activities closer than this count as a rapid switch
const RAPID_SWITCH_SECONDS: i64 = 60;

/// Share of activities that must be rapid switches before it is a pattern
const RAPID_SWITCH_RATIO: f64 = 0.1;

/// Number of most frequent categories inspected for recurring distractions
const RECURRING_TOP_N: usize = 3;

/// Overall score above which distraction is high
const HIGH_DISTRACTION_SCORE: f64 = 0.6;

/// Overall score above which distraction is moderate
const MODERATE_DISTRACTION_SCORE: f64 = 0.4;

/// Per-category accumulation
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CategoryScore {
    pub count: u32,
    pub total_duration: u64,
    /// Duration weighted by the category's distraction weight (seconds)
    pub distraction_duration: f64,
    /// distraction_duration / total_duration
    pub avg_score: f64,
}

/// Duration-weighted distraction scores
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DistractionScores {
    /// 0.0 - 1.0
    pub overall_distraction_score: f64,
    pub by_category: BTreeMap<String, CategoryScore>,
    pub total_duration_seconds: u64,
    pub distraction_duration_seconds: f64,
}

/// A behavioral pattern found in the activity stream
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum DistractionPattern {
    PeakDistractionHour {
        hour: u32,
        distraction_count: u32,
        recommendation: String,
    },
    RecurringDistraction {
        category: String,
        frequency: u32,
        recommendation: String,
    },
    RapidContextSwitching {
        switch_count: u32,
        recommendation: String,
    },
}

impl DistractionPattern {
    /// Pattern type as serialized
    pub fn kind(&self) -> &'static str {
        match self {
            DistractionPattern::PeakDistractionHour { .. } => "peak_distraction_hour",
            DistractionPattern::RecurringDistraction { .. } => "recurring_distraction",
            DistractionPattern::RapidContextSwitching { .. } => "rapid_context_switching",
        }
    }

    pub fn recommendation(&self) -> &str {
        match self {
            DistractionPattern::PeakDistractionHour { recommendation, .. }
            | DistractionPattern::RecurringDistraction { recommendation, .. }
            | DistractionPattern::RapidContextSwitching { recommendation, .. } => recommendation,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum InsightKind {
    HighDistraction,
    ModerateDistraction,
    PatternInsight,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    High,
    Medium,
}

/// Actionable insight derived from scores and patterns
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Insight {
    #[serde(rename = "type")]
    pub kind: InsightKind,
    pub severity: Severity,
    pub title: String,
    pub description: String,
    pub recommendations: Vec<String>,
}

/// Summary statistics over the analyzed activities
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DistractionStatistics {
    pub total_activities: usize,
    pub avg_duration_seconds: f64,
    pub median_duration_seconds: f64,
    /// Over activities carrying an explicit distraction score only
    pub avg_distraction_score: f64,
    pub max_distraction_score: f64,
    pub min_distraction_score: f64,
}

/// Full distraction analysis
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DistractionReport {
    pub analysis_period_hours: u32,
    pub total_activities: usize,
    pub distraction_scores: DistractionScores,
    pub patterns: Vec<DistractionPattern>,
    pub insights: Vec<Insight>,
    pub statistics: DistractionStatistics,
    pub model_version: String,
    pub analyzed_at: DateTime<Utc>,
}

/// Result shape when there is nothing to analyze
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SkippedAnalysis {
    pub error: String,
    pub total_activities: usize,
}

impl SkippedAnalysis {
    fn new(error: &str) -> Self {
        Self {
            error: error.to_string(),
            total_activities: 0,
        }
    }
}

/// Outcome of an analysis call
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum DistractionAnalysis {
    Report(Box<DistractionReport>),
    Skipped(SkippedAnalysis),
}

impl DistractionAnalysis {
    /// Reported condition, if the analysis was skipped
    pub fn error(&self) -> Option<&str> {
        match self {
            DistractionAnalysis::Report(_) => None,
            DistractionAnalysis::Skipped(skipped) => Some(&skipped.error),
        }
    }

    pub fn total_activities(&self) -> usize {
        match self {
            DistractionAnalysis::Report(report) => report.total_activities,
            DistractionAnalysis::Skipped(skipped) => skipped.total_activities,
        }
    }

    pub fn report(&self) -> Option<&DistractionReport> {
        match self {
            DistractionAnalysis::Report(report) => Some(report),
            DistractionAnalysis::Skipped(_) => None,
        }
    }
}

/// Distraction analyzer over a fixed category weight table
#[derive(Debug, Clone, Default)]
pub struct DistractionAnalyzer {
    weights: CategoryWeights,
}

impl DistractionAnalyzer {
    /// Create an analyzer with the default category weights
    pub fn new() -> Self {
        Self::default()
    }

    /// Create an analyzer with a custom category weight table
    pub fn with_weights(weights: CategoryWeights) -> Self {
        Self { weights }
    }

    pub fn from_config(config: &EngineConfig) -> Self {
        Self::with_weights(config.distraction_categories.clone())
    }

    pub fn weights(&self) -> &CategoryWeights {
        &self.weights
    }

    /// Analyze activities from the last `time_window_hours` hours
    pub fn analyze(
        &self,
        activities: &[ActivityRecord],
        time_window_hours: u32,
    ) -> Result<DistractionAnalysis, EngineError> {
        self.analyze_at(activities, time_window_hours, Utc::now())
    }

    /// Analyze activities relative to an explicit `now`
    pub fn analyze_at(
        &self,
        activities: &[ActivityRecord],
        time_window_hours: u32,
        now: DateTime<Utc>,
    ) -> Result<DistractionAnalysis, EngineError> {
        if time_window_hours == 0 {
            return Err(EngineError::InvalidArgument(
                "time_window_hours must be positive".to_string(),
            ));
        }

        if activities.is_empty() {
            return Ok(DistractionAnalysis::Skipped(SkippedAnalysis::new(
                "No activities provided for analysis",
            )));
        }

        let cutoff = now - Duration::hours(i64::from(time_window_hours));
        let recent: Vec<&ActivityRecord> = activities
            .iter()
            .filter(|a| a.timestamp >= cutoff)
            .collect();

        log::debug!(
            "distraction analysis: {} of {} activities within {}h window",
            recent.len(),
            activities.len(),
            time_window_hours
        );

        if recent.is_empty() {
            return Ok(DistractionAnalysis::Skipped(SkippedAnalysis::new(
                "No recent activities in the specified time window",
            )));
        }

        let distraction_scores = self.score(&recent);
        let patterns = self.detect_patterns(&recent);
        let insights = generate_insights(distraction_scores.overall_distraction_score, &patterns);
        let statistics = compute_statistics(&recent);

        Ok(DistractionAnalysis::Report(Box::new(DistractionReport {
            analysis_period_hours: time_window_hours,
            total_activities: recent.len(),
            distraction_scores,
            patterns,
            insights,
            statistics,
            model_version: MODEL_VERSION.to_string(),
            analyzed_at: now,
        })))
    }

    /// Duration-weighted scoring.
    ///
    /// Every activity contributes `duration × weight` to the distraction pool,
    /// whether or not its category crosses the distraction threshold.
    fn score(&self, activities: &[&ActivityRecord]) -> DistractionScores {
        let mut by_category: BTreeMap<String, CategoryScore> = BTreeMap::new();
        let mut total_duration: u64 = 0;
        let mut distraction_duration = 0.0;

        for activity in activities {
            let category = activity.category_key();
            let weight = self.weights.weight(&category);
            let weighted = activity.duration_seconds as f64 * weight;

            total_duration += activity.duration_seconds;
            distraction_duration += weighted;

            let entry = by_category.entry(category).or_default();
            entry.count += 1;
            entry.total_duration += activity.duration_seconds;
            entry.distraction_duration += weighted;
        }

        for score in by_category.values_mut() {
            score.avg_score = if score.total_duration > 0 {
                score.distraction_duration / score.total_duration as f64
            } else {
                0.0
            };
        }

        let overall = if total_duration > 0 {
            distraction_duration / total_duration as f64
        } else {
            0.0
        };

        DistractionScores {
            overall_distraction_score: overall.min(1.0),
            by_category,
            total_duration_seconds: total_duration,
            distraction_duration_seconds: distraction_duration,
        }
    }

    fn detect_patterns(&self, activities: &[&ActivityRecord]) -> Vec<DistractionPattern> {
        let mut patterns = Vec::new();

        if let Some(peak) = self.peak_distraction_hour(activities) {
            patterns.push(peak);
        }
        patterns.extend(self.recurring_distractions(activities));
        if let Some(switching) = detect_rapid_switching(activities) {
            patterns.push(switching);
        }

        patterns
    }

    /// Hour with the most distracting activities; earliest-seen hour wins ties.
    ///
    /// Reported whenever the window has activities, even if none distract.
    fn peak_distraction_hour(&self, activities: &[&ActivityRecord]) -> Option<DistractionPattern> {
        // (hour, distracting count) in first-seen order
        let mut hours: Vec<(u32, u32)> = Vec::new();
        for activity in activities {
            let hour = activity.timestamp.hour();
            let distracting = u32::from(self.weights.is_distraction(&activity.activity_category));
            match hours.iter_mut().find(|(h, _)| *h == hour) {
                Some((_, count)) => *count += distracting,
                None => hours.push((hour, distracting)),
            }
        }

        let mut peak: Option<(u32, u32)> = None;
        for (hour, count) in hours {
            if peak.map_or(true, |(_, best)| count > best) {
                peak = Some((hour, count));
            }
        }

        peak.map(|(hour, count)| DistractionPattern::PeakDistractionHour {
            hour,
            distraction_count: count,
            recommendation: format!("Avoid scheduling focus sessions at {}:00", hour),
        })
    }

    /// Distracting categories among the most frequent ones
    fn recurring_distractions(&self, activities: &[&ActivityRecord]) -> Vec<DistractionPattern> {
        let mut frequencies: Vec<(String, u32)> = Vec::new();
        for activity in activities {
            let category = activity.category_key();
            match frequencies.iter_mut().find(|(c, _)| *c == category) {
                Some((_, count)) => *count += 1,
                None => frequencies.push((category, 1)),
            }
        }

        // stable: equal counts keep first-seen order
        frequencies.sort_by(|a, b| b.1.cmp(&a.1));

        frequencies
            .into_iter()
            .take(RECURRING_TOP_N)
            .filter(|(category, _)| self.weights.is_distraction(category))
            .map(|(category, frequency)| DistractionPattern::RecurringDistraction {
                recommendation: format!("Consider blocking {} during focus sessions", category),
                category,
                frequency,
            })
            .collect()
    }
}

/// Count adjacent activities (input order) less than a minute apart
fn detect_rapid_switching(activities: &[&ActivityRecord]) -> Option<DistractionPattern> {
    let switch_count = activities
        .windows(2)
        .filter(|pair| (pair[1].timestamp - pair[0].timestamp).num_milliseconds() < RAPID_SWITCH_SECONDS * 1000)
        .count() as u32;

    if switch_count as f64 > activities.len() as f64 * RAPID_SWITCH_RATIO {
        Some(DistractionPattern::RapidContextSwitching {
            switch_count,
            recommendation: "Try focusing on single tasks for longer periods".to_string(),
        })
    } else {
        None
    }
}

fn generate_insights(overall_score: f64, patterns: &[DistractionPattern]) -> Vec<Insight> {
    let mut insights = Vec::new();
    let percent = overall_score * 100.0;

    if overall_score > HIGH_DISTRACTION_SCORE {
        insights.push(Insight {
            kind: InsightKind::HighDistraction,
            severity: Severity::High,
            title: "High Distraction Level Detected".to_string(),
            description: format!(
                "Your distraction score is {:.1}%. Consider using focus mode more frequently.",
                percent
            ),
            recommendations: vec![
                "Enable focus mode during peak work hours".to_string(),
                "Block distracting apps during focus sessions".to_string(),
                "Take strategic breaks to prevent burnout".to_string(),
            ],
        });
    } else if overall_score > MODERATE_DISTRACTION_SCORE {
        insights.push(Insight {
            kind: InsightKind::ModerateDistraction,
            severity: Severity::Medium,
            title: "Moderate Distraction Detected".to_string(),
            description: format!(
                "Your distraction score is {:.1}%. Some room for improvement.",
                percent
            ),
            recommendations: vec![
                "Schedule focus sessions during your most productive hours".to_string(),
                "Minimize notifications during important tasks".to_string(),
            ],
        });
    }

    for pattern in patterns {
        if matches!(
            pattern,
            DistractionPattern::PeakDistractionHour { .. }
                | DistractionPattern::RecurringDistraction { .. }
        ) {
            insights.push(Insight {
                kind: InsightKind::PatternInsight,
                severity: Severity::Medium,
                title: format!("Pattern Detected: {}", title_case(pattern.kind())),
                description: pattern.recommendation().to_string(),
                recommendations: vec![pattern.recommendation().to_string()],
            });
        }
    }

    insights
}

fn compute_statistics(activities: &[&ActivityRecord]) -> DistractionStatistics {
    let durations: Vec<f64> = activities
        .iter()
        .map(|a| a.duration_seconds as f64)
        .collect();
    let scores: Vec<f64> = activities
        .iter()
        .filter_map(|a| a.distraction_score)
        .collect();

    DistractionStatistics {
        total_activities: activities.len(),
        avg_duration_seconds: mean(&durations).unwrap_or(0.0),
        median_duration_seconds: median(&durations).unwrap_or(0.0),
        avg_distraction_score: mean(&scores).unwrap_or(0.0),
        max_distraction_score: scores.iter().copied().reduce(f64::max).unwrap_or(0.0),
        min_distraction_score: scores.iter().copied().reduce(f64::min).unwrap_or(0.0),
    }
}

/// "peak_distraction_hour" -> "Peak Distraction Hour"
fn title_case(snake: &str) -> String {
    snake
        .split('_')
        .filter(|w| !w.is_empty())
        .map(|word| {
            let mut chars = word.chars();
            match chars.next() {
                Some(first) => first.to_uppercase().chain(chars).collect::<String>(),
                None => String::new(),
            }
        })
        .collect::<Vec<_>>()
        .join(" ")
}

/// Analyze activities with the default category weights
pub fn analyze_activity_patterns(
    activities: &[ActivityRecord],
    time_window_hours: u32,
) -> Result<DistractionAnalysis, EngineError> {
    DistractionAnalyzer::new().analyze(activities, time_window_hours)
}
