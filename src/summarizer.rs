//! Task summary text
//!
//! Prose summaries can come from an external language-model backend supplied by
//! the caller. The engine never depends on one: without a backend, or when the
//! backend fails, a deterministic rule-based sentence is produced instead.

use crate::error::EngineError;

/// Maximum number of task titles handed to a backend
pub const MAX_BACKEND_TITLES: usize = 10;

/// Optional prose backend for task summaries
pub trait TaskSummarizer: Send + Sync {
    /// Summarize the given task titles into a short paragraph
    fn summarize(&self, task_titles: &[String]) -> Result<String, EngineError>;
}

/// Collapse runs of whitespace and trim
pub fn clean_text(value: &str) -> String {
    value.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Titles prepared for a backend: cleaned, blanks dropped, capped
pub fn backend_titles<'a, I>(titles: I) -> Vec<String>
where
    I: IntoIterator<Item = &'a str>,
{
    titles
        .into_iter()
        .map(clean_text)
        .filter(|t| !t.is_empty())
        .take(MAX_BACKEND_TITLES)
        .collect()
}

/// Deterministic summary sentence
pub fn rule_based_summary(total: usize, urgent: u32, high: u32, category_count: usize) -> String {
    let mut summary = format!("You have {} tasks to complete. ", total);

    if urgent > 0 {
        summary.push_str(&format!(
            "{} urgent task(s) require immediate attention. ",
            urgent
        ));
    }

    if high > 0 {
        summary.push_str(&format!(
            "{} high-priority task(s) should be prioritized. ",
            high
        ));
    }

    summary.push_str(&format!(
        "Tasks are distributed across {} categories.",
        category_count
    ));
    summary
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_clean_text() {
        assert_eq!(clean_text("  Write \n the\treport  "), "Write the report");
        assert_eq!(clean_text("   "), "");
    }

    #[test]
    fn test_backend_titles_caps_and_cleans() {
        let titles: Vec<String> = (0..15).map(|i| format!(" task  {} ", i)).collect();
        let prepared = backend_titles(titles.iter().map(String::as_str));
        assert_eq!(prepared.len(), MAX_BACKEND_TITLES);
        assert_eq!(prepared[0], "task 0");

        let prepared = backend_titles(["", "  ", "real"]);
        assert_eq!(prepared, vec!["real".to_string()]);
    }

    #[test]
    fn test_rule_based_summary() {
        assert_eq!(
            rule_based_summary(5, 1, 2, 3),
            "You have 5 tasks to complete. 1 urgent task(s) require immediate attention. \
             2 high-priority task(s) should be prioritized. Tasks are distributed across 3 categories."
        );
        assert_eq!(
            rule_based_summary(2, 0, 0, 1),
            "You have 2 tasks to complete. Tasks are distributed across 1 categories."
        );
    }
}
