//! Engine configuration
//!
//! Static lookup tables (category distraction weights, task-type duration
//! baselines) plus a few tunables. Configuration is read-only once an engine
//! component is built from it; overrides are loaded from JSON up front.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::error::EngineError;
use crate::types::GENERAL_TASK_TYPE;

/// Weight applied to categories missing from the table
pub const DEFAULT_CATEGORY_WEIGHT: f64 = 0.5;

/// A category counts as a distraction only above this weight (strict)
pub const DISTRACTION_THRESHOLD: f64 = 0.5;

/// Baseline (minutes) if the table has no `general` entry either
const FALLBACK_GENERAL_MINUTES: f64 = 30.0;

/// Default focus hours available for planning
pub const DEFAULT_AVAILABLE_HOURS: u32 = 8;

/// Default number of suggestions returned
pub const DEFAULT_MAX_SUGGESTIONS: usize = 10;

/// Distraction profile for one activity category
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CategoryProfile {
    /// Distraction weight (0-1)
    pub weight: f64,
    /// Example apps in this category
    #[serde(default)]
    pub apps: Vec<String>,
}

impl CategoryProfile {
    fn new(weight: f64, apps: &[&str]) -> Self {
        Self {
            weight,
            apps: apps.iter().map(|a| a.to_string()).collect(),
        }
    }
}

/// Category name (lower-case) to distraction profile
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CategoryWeights {
    categories: BTreeMap<String, CategoryProfile>,
}

impl Default for CategoryWeights {
    fn default() -> Self {
        let mut categories = BTreeMap::new();
        categories.insert(
            "communication".to_string(),
            CategoryProfile::new(0.8, &["slack", "cliq", "teams", "messages"]),
        );
        categories.insert(
            "entertainment".to_string(),
            CategoryProfile::new(0.9, &["youtube", "netflix", "twitter", "instagram", "tiktok"]),
        );
        categories.insert(
            "social".to_string(),
            CategoryProfile::new(0.7, &["facebook", "linkedin", "reddit"]),
        );
        categories.insert(
            "news".to_string(),
            CategoryProfile::new(0.5, &["news", "cnn", "bbc"]),
        );
        categories.insert(
            "work".to_string(),
            CategoryProfile::new(0.1, &["vscode", "excel", "docs", "sheets"]),
        );
        Self { categories }
    }
}

impl CategoryWeights {
    /// Build a table from explicit profiles; keys are lower-cased
    pub fn new(categories: BTreeMap<String, CategoryProfile>) -> Self {
        Self {
            categories: categories
                .into_iter()
                .map(|(name, profile)| (name.to_lowercase(), profile))
                .collect(),
        }
    }

    /// Weight for a category, 0.5 when unknown
    pub fn weight(&self, category: &str) -> f64 {
        self.categories
            .get(&category.to_lowercase())
            .map(|p| p.weight)
            .unwrap_or(DEFAULT_CATEGORY_WEIGHT)
    }

    /// Whether a category counts as a distraction source
    pub fn is_distraction(&self, category: &str) -> bool {
        self.weight(category) > DISTRACTION_THRESHOLD
    }

    pub fn get(&self, category: &str) -> Option<&CategoryProfile> {
        self.categories.get(&category.to_lowercase())
    }

    pub fn len(&self) -> usize {
        self.categories.len()
    }

    pub fn is_empty(&self) -> bool {
        self.categories.is_empty()
    }

    fn validate(&self) -> Result<(), EngineError> {
        for (name, profile) in &self.categories {
            if !profile.weight.is_finite() || !(0.0..=1.0).contains(&profile.weight) {
                return Err(EngineError::ConfigError(format!(
                    "weight for category '{}' must be within [0, 1], got {}",
                    name, profile.weight
                )));
            }
        }
        Ok(())
    }
}

/// Task type (lower-case) to baseline duration in minutes
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct BaseDurations {
    minutes: BTreeMap<String, f64>,
}

impl Default for BaseDurations {
    fn default() -> Self {
        let minutes = [
            ("email", 5.0),
            ("meeting", 60.0),
            ("coding", 90.0),
            ("writing", 45.0),
            ("research", 60.0),
            ("design", 120.0),
            ("review", 30.0),
            ("planning", 60.0),
            (GENERAL_TASK_TYPE, 30.0),
        ]
        .into_iter()
        .map(|(k, v)| (k.to_string(), v))
        .collect();
        Self { minutes }
    }
}

impl BaseDurations {
    /// Build a table from explicit baselines; keys are lower-cased
    pub fn new(minutes: BTreeMap<String, f64>) -> Self {
        Self {
            minutes: minutes
                .into_iter()
                .map(|(k, v)| (k.to_lowercase(), v))
                .collect(),
        }
    }

    /// Baseline minutes for a task type, falling back to `general`
    pub fn minutes(&self, task_type: &str) -> f64 {
        self.minutes
            .get(&task_type.to_lowercase())
            .or_else(|| self.minutes.get(GENERAL_TASK_TYPE))
            .copied()
            .unwrap_or(FALLBACK_GENERAL_MINUTES)
    }

    pub fn contains(&self, task_type: &str) -> bool {
        self.minutes.contains_key(&task_type.to_lowercase())
    }

    fn validate(&self) -> Result<(), EngineError> {
        for (task_type, minutes) in &self.minutes {
            if !minutes.is_finite() || *minutes < 0.0 {
                return Err(EngineError::ConfigError(format!(
                    "baseline for task type '{}' must be a non-negative number, got {}",
                    task_type, minutes
                )));
            }
        }
        Ok(())
    }
}

/// Complete engine configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    pub distraction_categories: CategoryWeights,
    pub base_durations: BaseDurations,
    /// Focus hours assumed when a plan request names none
    pub default_available_hours: u32,
    /// Upper bound on ranked suggestions
    pub max_suggestions: usize,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            distraction_categories: CategoryWeights::default(),
            base_durations: BaseDurations::default(),
            default_available_hours: DEFAULT_AVAILABLE_HOURS,
            max_suggestions: DEFAULT_MAX_SUGGESTIONS,
        }
    }
}

impl EngineConfig {
    /// Load configuration overrides from JSON; omitted sections keep defaults
    pub fn from_json(json: &str) -> Result<Self, EngineError> {
        let config: EngineConfig = serde_json::from_str(json)
            .map_err(|e| EngineError::ConfigError(format!("Failed to parse config: {}", e)))?;
        config.normalized()
    }

    /// Serialize the effective configuration
    pub fn to_json(&self) -> Result<String, EngineError> {
        serde_json::to_string_pretty(self).map_err(EngineError::JsonError)
    }

    /// Lower-case table keys and check value ranges
    pub fn normalized(self) -> Result<Self, EngineError> {
        let config = Self {
            distraction_categories: CategoryWeights::new(self.distraction_categories.categories),
            base_durations: BaseDurations::new(self.base_durations.minutes),
            ..self
        };
        config.distraction_categories.validate()?;
        config.base_durations.validate()?;
        if config.default_available_hours == 0 {
            return Err(EngineError::ConfigError(
                "default_available_hours must be positive".to_string(),
            ));
        }
        Ok(config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_weights() {
        let weights = CategoryWeights::default();
        assert_eq!(weights.weight("entertainment"), 0.9);
        assert_eq!(weights.weight("Communication"), 0.8);
        assert_eq!(weights.weight("work"), 0.1);
        assert_eq!(weights.weight("gardening"), 0.5);
        assert_eq!(weights.len(), 5);
        assert!(weights.get("social").unwrap().apps.contains(&"reddit".to_string()));
    }

    #[test]
    fn test_distraction_threshold_is_strict() {
        let weights = CategoryWeights::default();
        assert!(weights.is_distraction("social"));
        assert!(!weights.is_distraction("news"));
        assert!(!weights.is_distraction("unknown"));
        assert!(!weights.is_distraction("work"));
    }

    #[test]
    fn test_base_duration_fallback() {
        let durations = BaseDurations::default();
        assert_eq!(durations.minutes("coding"), 90.0);
        assert_eq!(durations.minutes("DESIGN"), 120.0);
        assert_eq!(durations.minutes("knitting"), 30.0);
        assert!(durations.contains("email"));

        let bare = BaseDurations::new(BTreeMap::new());
        assert_eq!(bare.minutes("coding"), 30.0);
    }

    #[test]
    fn test_config_partial_override() {
        let config = EngineConfig::from_json(
            r#"{"distraction_categories": {"Gaming": {"weight": 0.95}}, "max_suggestions": 5}"#,
        )
        .unwrap();
        assert_eq!(config.distraction_categories.weight("gaming"), 0.95);
        assert_eq!(config.distraction_categories.weight("entertainment"), 0.5);
        assert_eq!(config.base_durations.minutes("coding"), 90.0);
        assert_eq!(config.max_suggestions, 5);
        assert_eq!(config.default_available_hours, 8);
    }

    #[test]
    fn test_config_rejects_out_of_range_weight() {
        let result =
            EngineConfig::from_json(r#"{"distraction_categories": {"x": {"weight": 1.5}}}"#);
        assert!(matches!(result, Err(EngineError::ConfigError(_))));

        let result = EngineConfig::from_json(r#"{"base_durations": {"coding": -1}}"#);
        assert!(matches!(result, Err(EngineError::ConfigError(_))));

        let result = EngineConfig::from_json(r#"{"default_available_hours": 0}"#);
        assert!(matches!(result, Err(EngineError::ConfigError(_))));
    }

    #[test]
    fn test_config_roundtrips_through_json() {
        let config = EngineConfig::default();
        let json = config.to_json().unwrap();
        assert_eq!(EngineConfig::from_json(&json).unwrap(), config);
    }
}
