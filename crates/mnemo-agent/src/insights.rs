// SPDX-FileCopyrightText: 2026 Mnemo Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Insight reports: time-windowed batch summaries of log entries.
//!
//! The generator slides a window over the most recent entries, asks the
//! generation backend for bullet-point insights/themes/changes per
//! window, and saves the result as `insights_<timestamp>.json`. The
//! conversation layer only ever reads the most recently modified report
//! and only consumes its first window.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use chrono::Utc;
use mnemo_core::error::MnemoError;
use mnemo_core::traits::GenerationAdapter;
use mnemo_memory::LogEntry;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

/// Date span covered by one insight window.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DateRange {
    pub start: String,
    pub end: String,
}

/// Insights for one window of entries.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InsightWindow {
    pub date_range: DateRange,
    #[serde(default)]
    pub insights: Vec<String>,
    #[serde(default)]
    pub themes: Vec<String>,
    #[serde(default)]
    pub changes: Vec<String>,
}

/// A saved insight report.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InsightReport {
    pub generated_at: String,
    pub windows: Vec<InsightWindow>,
}

/// Reads and writes insight reports in a directory.
pub struct InsightStore {
    dir: PathBuf,
}

impl InsightStore {
    pub fn new(dir: PathBuf) -> Self {
        Self { dir }
    }

    /// Saves a report as `insights_<timestamp>.json` and returns the path.
    pub fn save(&self, report: &InsightReport) -> Result<PathBuf, MnemoError> {
        std::fs::create_dir_all(&self.dir).map_err(|e| {
            MnemoError::Internal(format!("failed to create insights dir: {e}"))
        })?;

        let timestamp = Utc::now().format("%Y%m%d_%H%M%S%3f");
        let path = self.dir.join(format!("insights_{timestamp}.json"));
        let json = serde_json::to_string_pretty(report)
            .map_err(|e| MnemoError::Internal(format!("failed to serialize report: {e}")))?;
        std::fs::write(&path, json)
            .map_err(|e| MnemoError::Internal(format!("failed to write {}: {e}", path.display())))?;

        Ok(path)
    }

    /// Loads the most recently modified report, or `None` when the
    /// directory is missing, empty, or the newest file is undecodable.
    pub fn load_latest(&self) -> Option<InsightReport> {
        let entries = std::fs::read_dir(&self.dir).ok()?;

        let latest = entries
            .filter_map(|e| e.ok())
            .filter(|e| {
                let name = e.file_name();
                let name = name.to_string_lossy();
                name.starts_with("insights_") && name.ends_with(".json")
            })
            .filter_map(|e| {
                let modified = e.metadata().ok()?.modified().ok()?;
                Some((modified, e.path()))
            })
            .max_by_key(|(modified, _)| *modified)?;

        read_report(&latest.1)
    }
}

fn read_report(path: &Path) -> Option<InsightReport> {
    let content = std::fs::read_to_string(path).ok()?;
    match serde_json::from_str(&content) {
        Ok(report) => Some(report),
        Err(e) => {
            warn!(path = %path.display(), error = %e, "undecodable insight report");
            None
        }
    }
}

/// Generates insight reports from log entries via the generation backend.
pub struct InsightGenerator {
    provider: Arc<dyn GenerationAdapter>,
}

impl InsightGenerator {
    pub fn new(provider: Arc<dyn GenerationAdapter>) -> Self {
        Self { provider }
    }

    /// Analyzes the `recent_count` newest entries in windows of
    /// `window_size`, newest first. Windows whose generation call fails
    /// are skipped with a warning; an empty entry list is an error.
    pub async fn generate(
        &self,
        entries: &[LogEntry],
        recent_count: usize,
        window_size: usize,
    ) -> Result<InsightReport, MnemoError> {
        if entries.is_empty() {
            return Err(MnemoError::Internal("no entries to analyze".to_string()));
        }
        let window_size = window_size.max(1);

        let mut sorted: Vec<&LogEntry> = entries.iter().collect();
        sorted.sort_by(|a, b| b.date.cmp(&a.date));
        sorted.truncate(recent_count);

        let mut windows = Vec::new();
        for chunk in sorted.chunks(window_size) {
            let prompt = window_prompt(chunk);
            match self.provider.generate(&prompt).await {
                Ok(response) => {
                    let (insights, themes, changes) = parse_sections(&response);
                    windows.push(InsightWindow {
                        date_range: DateRange {
                            start: chunk[0].date.to_rfc3339(),
                            end: chunk[chunk.len() - 1].date.to_rfc3339(),
                        },
                        insights,
                        themes,
                        changes,
                    });
                }
                Err(e) => {
                    warn!(error = %e, "skipping insight window after generation failure");
                }
            }
        }

        debug!(windows = windows.len(), "insight generation complete");
        Ok(InsightReport {
            generated_at: Utc::now().to_rfc3339(),
            windows,
        })
    }
}

/// Builds the analysis prompt for one window of entries.
fn window_prompt(entries: &[&LogEntry]) -> String {
    let start = entries[0].date.format("%Y-%m-%d");
    let end = entries[entries.len() - 1].date.format("%Y-%m-%d");

    let mut prompt = format!(
        "Analyze these log entries from {start} to {end} and provide high-level insights about:\n\n\
         1. Changes in interests and focus areas\n\
         2. Emerging concepts or themes\n\
         3. Shifts in priorities or goals\n\
         4. Patterns in decision-making\n\
         5. Notable personal or professional developments\n\n\
         Format your response as:\n\
         INSIGHTS:\n\
         - Key insight 1\n\
         - Key insight 2\n\
         ...\n\n\
         THEMES:\n\
         - Theme 1\n\
         - Theme 2\n\
         ...\n\n\
         CHANGES:\n\
         - Change 1\n\
         - Change 2\n\
         ...\n\n\
         Log entries:\n"
    );

    for entry in entries {
        prompt.push_str(&format!(
            "\n{}:\n{}\n",
            entry.date.format("%Y-%m-%d"),
            entry.raw_text
        ));
    }

    prompt
}

/// Splits a sectioned bullet-list response into (insights, themes,
/// changes). Lines outside a known section or without a bullet are
/// ignored.
fn parse_sections(response: &str) -> (Vec<String>, Vec<String>, Vec<String>) {
    enum Section {
        None,
        Insights,
        Themes,
        Changes,
    }

    let mut insights = Vec::new();
    let mut themes = Vec::new();
    let mut changes = Vec::new();
    let mut section = Section::None;

    for line in response.lines() {
        let line = line.trim();
        if line.is_empty() {
            continue;
        }

        if line.starts_with("INSIGHTS:") {
            section = Section::Insights;
        } else if line.starts_with("THEMES:") {
            section = Section::Themes;
        } else if line.starts_with("CHANGES:") {
            section = Section::Changes;
        } else if let Some(stripped) = line.strip_prefix('-') {
            let item = stripped.trim().to_string();
            match section {
                Section::Insights => insights.push(item),
                Section::Themes => themes.push(item),
                Section::Changes => changes.push(item),
                Section::None => {}
            }
        }
    }

    (insights, themes, changes)
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use chrono::TimeZone;
    use mnemo_core::traits::adapter::PluginAdapter;
    use mnemo_core::traits::GenerationStream;
    use mnemo_core::types::{AdapterType, HealthStatus};

    struct ScriptedGenerator(String);

    #[async_trait]
    impl PluginAdapter for ScriptedGenerator {
        fn name(&self) -> &str {
            "scripted"
        }
        fn version(&self) -> semver::Version {
            semver::Version::new(0, 0, 0)
        }
        fn adapter_type(&self) -> AdapterType {
            AdapterType::Provider
        }
        async fn health_check(&self) -> Result<HealthStatus, MnemoError> {
            Ok(HealthStatus::Healthy)
        }
    }

    #[async_trait]
    impl GenerationAdapter for ScriptedGenerator {
        async fn generate(&self, _prompt: &str) -> Result<String, MnemoError> {
            Ok(self.0.clone())
        }
        async fn generate_stream(&self, _prompt: &str) -> Result<GenerationStream, MnemoError> {
            Ok(Box::pin(futures::stream::iter(vec![Ok(self.0.clone())])))
        }
    }

    fn entry(date: &str, text: &str) -> LogEntry {
        let date = chrono::NaiveDate::parse_from_str(date, "%Y-%m-%d").unwrap();
        LogEntry::new(
            chrono::Utc.from_utc_datetime(&date.and_hms_opt(0, 0, 0).unwrap()),
            text,
        )
    }

    const SECTIONED: &str = "\
INSIGHTS:
- Focus shifted to infrastructure
- More time spent reviewing

THEMES:
- Reliability
- Automation

CHANGES:
- Dropped the mobile project
";

    #[test]
    fn parse_sections_splits_bullets() {
        let (insights, themes, changes) = parse_sections(SECTIONED);
        assert_eq!(insights.len(), 2);
        assert_eq!(insights[0], "Focus shifted to infrastructure");
        assert_eq!(themes, vec!["Reliability", "Automation"]);
        assert_eq!(changes, vec!["Dropped the mobile project"]);
    }

    #[test]
    fn parse_sections_ignores_noise() {
        let response = "\
Sure, here's my analysis.
- orphan bullet before any section
INSIGHTS:
- Real insight
Some commentary in between.
THEMES:
- Real theme
";
        let (insights, themes, changes) = parse_sections(response);
        assert_eq!(insights, vec!["Real insight"]);
        assert_eq!(themes, vec!["Real theme"]);
        assert!(changes.is_empty());
    }

    #[test]
    fn parse_sections_empty_response() {
        let (insights, themes, changes) = parse_sections("");
        assert!(insights.is_empty() && themes.is_empty() && changes.is_empty());
    }

    #[tokio::test]
    async fn generate_windows_newest_first() {
        let generator = InsightGenerator::new(Arc::new(ScriptedGenerator(SECTIONED.to_string())));
        let entries = vec![
            entry("2024-03-01", "oldest"),
            entry("2024-03-05", "newest"),
            entry("2024-03-03", "middle"),
        ];

        let report = generator.generate(&entries, 20, 2).await.unwrap();
        assert_eq!(report.windows.len(), 2);
        // First window covers the two newest entries, newest first.
        assert!(report.windows[0].date_range.start.starts_with("2024-03-05"));
        assert!(report.windows[0].date_range.end.starts_with("2024-03-03"));
        assert!(report.windows[1].date_range.start.starts_with("2024-03-01"));
        assert_eq!(report.windows[0].insights.len(), 2);
    }

    #[tokio::test]
    async fn generate_respects_recent_count() {
        let generator = InsightGenerator::new(Arc::new(ScriptedGenerator(SECTIONED.to_string())));
        let entries: Vec<LogEntry> = (1..=9)
            .map(|d| entry(&format!("2024-03-0{d}"), "text"))
            .collect();

        let report = generator.generate(&entries, 4, 2).await.unwrap();
        assert_eq!(report.windows.len(), 2);
    }

    #[tokio::test]
    async fn generate_empty_entries_is_error() {
        let generator = InsightGenerator::new(Arc::new(ScriptedGenerator(String::new())));
        assert!(generator.generate(&[], 20, 7).await.is_err());
    }

    #[test]
    fn store_roundtrip_and_latest_selection() {
        let dir = tempfile::tempdir().unwrap();
        let store = InsightStore::new(dir.path().to_path_buf());

        let older = InsightReport {
            generated_at: "2024-03-01T00:00:00Z".into(),
            windows: vec![],
        };
        store.save(&older).unwrap();

        // Ensure a later modification time for the second file.
        std::thread::sleep(std::time::Duration::from_millis(20));

        let newer = InsightReport {
            generated_at: "2024-03-02T00:00:00Z".into(),
            windows: vec![InsightWindow {
                date_range: DateRange {
                    start: "2024-02-20T00:00:00Z".into(),
                    end: "2024-02-25T00:00:00Z".into(),
                },
                insights: vec!["insight".into()],
                themes: vec!["theme".into()],
                changes: vec![],
            }],
        };
        store.save(&newer).unwrap();

        let loaded = store.load_latest().unwrap();
        assert_eq!(loaded.generated_at, "2024-03-02T00:00:00Z");
        assert_eq!(loaded.windows.len(), 1);
        assert_eq!(loaded.windows[0].insights, vec!["insight"]);
    }

    #[test]
    fn load_latest_missing_dir_is_none() {
        let store = InsightStore::new(PathBuf::from("/nonexistent/mnemo/insights"));
        assert!(store.load_latest().is_none());
    }

    #[test]
    fn load_latest_skips_undecodable_file() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("insights_bad.json"), "not json").unwrap();

        let store = InsightStore::new(dir.path().to_path_buf());
        assert!(store.load_latest().is_none());
    }
}
