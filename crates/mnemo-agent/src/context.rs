// SPDX-FileCopyrightText: 2026 Mnemo Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Grounding context assembly for the response prompt.

use mnemo_memory::SearchResult;

use crate::insights::InsightReport;

/// Longest entry preview included in context, in characters.
const PREVIEW_CHARS: usize = 500;

/// Insight bullets folded in per section.
const TOP_INSIGHTS: usize = 3;

/// Shown when neither memory results nor insights exist.
pub const NO_DATA_FALLBACK: &str =
    "i don't have any data in my memory yet. add some log entries and ask me again.";

/// Assembles the context block from retrieved entries and the latest
/// insight report (only its most recent window is consumed).
pub fn build_context(memory_results: &[SearchResult], insights: Option<&InsightReport>) -> String {
    let mut context = String::new();
    let mut has_context = false;

    if !memory_results.is_empty() {
        has_context = true;
        context.push_str("relevant log entries:\n");
        for (i, result) in memory_results.iter().enumerate() {
            context.push_str(&format!(
                "entry {} ({}):\n{}\n\n",
                i + 1,
                result.entry.date.format("%Y-%m-%d"),
                preview(&result.entry.raw_text)
            ));
        }
    }

    if let Some(window) = insights.and_then(|report| report.windows.first()) {
        if !window.insights.is_empty() {
            has_context = true;
            context.push_str("key insights:\n");
            for insight in window.insights.iter().take(TOP_INSIGHTS) {
                context.push_str(&format!("- {insight}\n"));
            }
        }

        if !window.themes.is_empty() {
            has_context = true;
            context.push_str("\nthemes:\n");
            for theme in window.themes.iter().take(TOP_INSIGHTS) {
                context.push_str(&format!("- {theme}\n"));
            }
        }
    }

    if !has_context {
        context.push_str(NO_DATA_FALLBACK);
    }

    context
}

/// Truncates entry text to a bounded preview.
fn preview(text: &str) -> String {
    let mut preview: String = text.chars().take(PREVIEW_CHARS).collect();
    if text.chars().count() > PREVIEW_CHARS {
        preview.push_str("...");
    }
    preview
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::insights::{DateRange, InsightWindow};
    use chrono::TimeZone;
    use mnemo_memory::LogEntry;

    fn search_result(date: &str, text: &str) -> SearchResult {
        let day = chrono::NaiveDate::parse_from_str(date, "%Y-%m-%d").unwrap();
        SearchResult {
            entry: LogEntry {
                id: Some("id".into()),
                date: chrono::Utc.from_utc_datetime(&day.and_hms_opt(0, 0, 0).unwrap()),
                raw_text: text.into(),
                summary: None,
                importance: 0.5,
            },
            similarity_score: 0.8,
            final_score: 0.9,
        }
    }

    fn report(windows: Vec<InsightWindow>) -> InsightReport {
        InsightReport {
            generated_at: "2024-03-28T00:00:00Z".into(),
            windows,
        }
    }

    fn window(insights: &[&str], themes: &[&str]) -> InsightWindow {
        InsightWindow {
            date_range: DateRange {
                start: "2024-03-01T00:00:00Z".into(),
                end: "2024-03-07T00:00:00Z".into(),
            },
            insights: insights.iter().map(|s| s.to_string()).collect(),
            themes: themes.iter().map(|s| s.to_string()).collect(),
            changes: vec![],
        }
    }

    #[test]
    fn numbers_and_dates_memory_entries() {
        let results = vec![
            search_result("2024-03-28", "first entry text"),
            search_result("2024-03-01", "second entry text"),
        ];
        let context = build_context(&results, None);
        assert!(context.contains("entry 1 (2024-03-28):\nfirst entry text"));
        assert!(context.contains("entry 2 (2024-03-01):\nsecond entry text"));
    }

    #[test]
    fn long_entries_are_previewed() {
        let long_text = "x".repeat(600);
        let results = vec![search_result("2024-03-28", &long_text)];
        let context = build_context(&results, None);
        assert!(context.contains(&format!("{}...", "x".repeat(500))));
        assert!(!context.contains(&"x".repeat(501)));
    }

    #[test]
    fn only_first_window_and_top_three_bullets() {
        let report = report(vec![
            window(&["a", "b", "c", "d"], &["t1", "t2", "t3", "t4"]),
            window(&["from second window"], &[]),
        ]);
        let context = build_context(&[], Some(&report));
        assert!(context.contains("- a\n"));
        assert!(context.contains("- c\n"));
        assert!(!context.contains("- d\n"));
        assert!(context.contains("- t3\n"));
        assert!(!context.contains("- t4\n"));
        assert!(!context.contains("from second window"));
    }

    #[test]
    fn empty_everything_yields_fallback() {
        let context = build_context(&[], None);
        assert_eq!(context, NO_DATA_FALLBACK);
    }

    #[test]
    fn empty_windows_yield_fallback() {
        let report = report(vec![]);
        let context = build_context(&[], Some(&report));
        assert_eq!(context, NO_DATA_FALLBACK);
    }

    #[test]
    fn memory_without_insights_skips_fallback() {
        let results = vec![search_result("2024-03-28", "entry")];
        let context = build_context(&results, None);
        assert!(!context.contains(NO_DATA_FALLBACK));
    }
}
