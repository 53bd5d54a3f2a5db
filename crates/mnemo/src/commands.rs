// SPDX-FileCopyrightText: 2026 Mnemo Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Subcommand implementations: component wiring plus the command bodies.

use std::io::Write as _;
use std::path::PathBuf;
use std::sync::Arc;

use mnemo_agent::{ConversationSession, EntryAnalyzer, InsightGenerator, InsightStore};
use mnemo_config::MnemoConfig;
use mnemo_core::error::MnemoError;
use mnemo_core::traits::PluginAdapter;
use mnemo_core::types::HealthStatus;
use mnemo_memory::{MemoryEngine, ModelManager, OnnxEmbedder, VectorStore};
use mnemo_ollama::OllamaClient;
use tracing::info;

/// Resolves the data directory: config override or the platform default.
fn data_dir(config: &MnemoConfig) -> Result<PathBuf, MnemoError> {
    if let Some(dir) = &config.memory.data_dir {
        return Ok(PathBuf::from(dir));
    }
    dirs::data_dir()
        .map(|d| d.join("mnemo"))
        .ok_or_else(|| MnemoError::Config("cannot determine a data directory".to_string()))
}

fn ollama_client(config: &MnemoConfig) -> Result<Arc<OllamaClient>, MnemoError> {
    Ok(Arc::new(OllamaClient::new(
        &config.ollama.base_url,
        &config.ollama.model,
        config.ollama.timeout_secs,
    )?))
}

/// Builds the memory engine, downloading the embedding model on first run.
async fn memory_engine(config: &MnemoConfig) -> Result<Arc<MemoryEngine>, MnemoError> {
    let dir = data_dir(config)?;
    tokio::fs::create_dir_all(&dir)
        .await
        .map_err(|e| MnemoError::Config(format!("cannot create data dir: {e}")))?;

    let manager = ModelManager::new(dir.clone());
    let model_path = manager.ensure_model().await?;
    let embedder = Arc::new(OnnxEmbedder::new(&model_path)?);

    let store = VectorStore::open(&dir.join("store.db"), &config.memory.collection).await?;
    Ok(Arc::new(
        MemoryEngine::new(store, embedder)
            .with_ranking(config.memory.lambda_decay, config.memory.recency_weight),
    ))
}

fn insight_store(config: &MnemoConfig) -> Result<InsightStore, MnemoError> {
    Ok(InsightStore::new(data_dir(config)?.join("insights")))
}

pub async fn chat(config: &MnemoConfig, message: &str, stream: bool) -> Result<(), MnemoError> {
    let memory = memory_engine(config).await?;
    let provider = ollama_client(config)?;
    let mut session = ConversationSession::new(
        memory,
        provider,
        insight_store(config)?,
        config.agent.persona_name.clone(),
    );

    if stream {
        session
            .chat_streamed(message, |chunk| {
                print!("{chunk}");
                let _ = std::io::stdout().flush();
            })
            .await;
        println!();
    } else {
        let response = session.chat(message).await;
        println!("{response}");
    }

    Ok(())
}

pub async fn add(
    config: &MnemoConfig,
    date: &str,
    text: &str,
    analyze: bool,
) -> Result<(), MnemoError> {
    let memory = memory_engine(config).await?;

    let id = memory.add_entry_for_date(date, text).await?;
    if id.is_empty() {
        return Err(MnemoError::Internal(format!(
            "could not parse date {date:?} (expected YYYY-MM-DD)"
        )));
    }
    println!("stored entry {id}");

    if analyze {
        let analyzer = EntryAnalyzer::new(ollama_client(config)?);
        let (summary, importance) = analyzer.analyze(text, date).await?;
        println!("summary: {summary}");
        println!("importance: {importance:.2}");
    }

    Ok(())
}

pub async fn search(config: &MnemoConfig, query: &str, top_k: usize) -> Result<(), MnemoError> {
    let memory = memory_engine(config).await?;
    let results = memory.search(query, top_k).await?;

    if results.is_empty() {
        println!("no matching entries");
        return Ok(());
    }

    for result in results {
        println!(
            "{}  score {:.3} (similarity {:.3})  {}",
            result.entry.date.format("%Y-%m-%d"),
            result.final_score,
            result.similarity_score,
            first_line(&result.entry.raw_text),
        );
    }

    Ok(())
}

pub async fn list(config: &MnemoConfig, limit: Option<usize>) -> Result<(), MnemoError> {
    let memory = memory_engine(config).await?;
    let entries = memory.get_all_entries(limit).await?;

    if entries.is_empty() {
        println!("no entries stored");
        return Ok(());
    }

    for entry in entries {
        println!(
            "{}  [{}]  {}",
            entry.date.format("%Y-%m-%d"),
            entry.id.as_deref().unwrap_or("-"),
            first_line(&entry.raw_text),
        );
    }

    Ok(())
}

pub async fn insights(config: &MnemoConfig) -> Result<(), MnemoError> {
    let memory = memory_engine(config).await?;
    let entries = memory.get_all_entries(None).await?;

    let generator = InsightGenerator::new(ollama_client(config)?);
    let report = generator
        .generate(
            &entries,
            config.insights.recent_count,
            config.insights.window_size,
        )
        .await?;

    let path = insight_store(config)?.save(&report)?;
    info!(windows = report.windows.len(), "insight report generated");
    println!("saved insight report to {}", path.display());

    Ok(())
}

pub async fn doctor(config: &MnemoConfig) -> Result<(), MnemoError> {
    let ollama = ollama_client(config)?;
    print_health(ollama.name(), &ollama.version(), ollama.health_check().await?);

    let manager = ModelManager::new(data_dir(config)?);
    if manager.is_model_available() {
        let embedder = OnnxEmbedder::new(&manager.model_path())?;
        print_health(
            embedder.name(),
            &embedder.version(),
            embedder.health_check().await?,
        );
    } else {
        println!(
            "onnx-embedder: model not downloaded yet (expected under {})",
            manager.model_dir().display()
        );
    }

    Ok(())
}

pub async fn clear(config: &MnemoConfig, yes: bool) -> Result<(), MnemoError> {
    if !yes {
        return Err(MnemoError::Config(
            "refusing to delete all entries without --yes".to_string(),
        ));
    }

    let memory = memory_engine(config).await?;
    memory.clear().await?;
    println!("all entries deleted");

    Ok(())
}

fn print_health(name: &str, version: &semver::Version, status: HealthStatus) {
    match status {
        HealthStatus::Healthy => println!("{name} v{version}: healthy"),
        HealthStatus::Degraded(reason) => println!("{name} v{version}: degraded ({reason})"),
        HealthStatus::Unhealthy(reason) => println!("{name} v{version}: unhealthy ({reason})"),
    }
}

fn first_line(text: &str) -> &str {
    text.lines().next().unwrap_or("")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn data_dir_prefers_config_override() {
        let mut config = MnemoConfig::default();
        config.memory.data_dir = Some("/tmp/mnemo-test".to_string());
        assert_eq!(data_dir(&config).unwrap(), PathBuf::from("/tmp/mnemo-test"));
    }

    #[test]
    fn first_line_truncates_multiline_text() {
        assert_eq!(first_line("User: hello\nResponse: hi"), "User: hello");
        assert_eq!(first_line(""), "");
    }

    #[test]
    fn default_config_is_usable() {
        let config = mnemo_config::load_config_from_str("").expect("defaults should load");
        assert!(!config.memory.collection.is_empty());
        assert!(config.memory.lambda_decay > 0.0);
    }
}
