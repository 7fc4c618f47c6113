//! `lorekeep chat` — Interactive or single-message chat mode.

use lorekeep_agent::{ChatHistory, ChatSession};
use lorekeep_config::AppConfig;
use lorekeep_core::memory::MemoryStore;
use lorekeep_core::retrieval::Retriever;
use lorekeep_memory::{FileBackend, FilePassages, InMemoryStore, NoopMemory};
use std::io::Write;
use std::sync::Arc;
use tracing::warn;

pub async fn run(message: Option<String>) -> Result<(), Box<dyn std::error::Error>> {
    let config = AppConfig::load().map_err(|e| format!("Failed to load config: {e}"))?;

    // Check for an API key early — give a clear error
    if config.api_key.is_none() {
        eprintln!();
        eprintln!("  ERROR: No API key configured!");
        eprintln!();
        eprintln!("  Set one of these environment variables:");
        eprintln!("    export OPENAI_API_KEY='sk-...'");
        eprintln!("    export LOREKEEP_API_KEY='sk-...'");
        eprintln!();
        eprintln!("  Or add it to your config file:");
        eprintln!(
            "    {}",
            AppConfig::config_dir().join("config.toml").display()
        );
        eprintln!();
        return Err("No API key found. See above for setup instructions.".into());
    }

    let provider = lorekeep_providers::build(&config)?;

    let knowledge: Arc<dyn Retriever> = Arc::new(FilePassages::new(
        config.knowledge.passages_path.clone(),
        config.knowledge.top_k,
    ));

    let memory: Arc<dyn MemoryStore> = match config.memory.backend.as_str() {
        "file" => Arc::new(FileBackend::new(config.memory.path.clone())),
        "in_memory" => Arc::new(InMemoryStore::new()),
        _ => Arc::new(NoopMemory),
    };

    let history = if config.history.persist {
        ChatHistory::load(&config.history.path, config.history.max_chars)?
    } else {
        ChatHistory::new(config.history.max_chars)
    };

    let persist_path = config.history.persist.then(|| config.history.path.clone());
    let ai_name = config.assistant.name.clone();
    let human_prefix = config.assistant.human_prefix.clone();

    let mut session =
        ChatSession::new(config, provider, Some(knowledge), memory).with_history(history);

    // Single-message mode
    if let Some(message) = message {
        let report = session.respond(&message).await?;
        println!("{ai_name}: {}", report.answer);
        if let Some(path) = &persist_path {
            session.history().save(path)?;
        }
        return Ok(());
    }

    // Interactive mode
    println!("Chatting with {ai_name}. Type 'exit' to quit.");
    println!();

    loop {
        print!("{human_prefix}: ");
        std::io::stdout().flush()?;

        let mut line = String::new();
        let bytes_read = std::io::stdin().read_line(&mut line)?;
        if bytes_read == 0 {
            // EOF behaves like "exit"
            if persist_path.is_none() {
                session.archive_history().await;
            }
            break;
        }
        let line = line.trim();
        if line.is_empty() {
            continue;
        }

        if line == "exit" {
            // Without persistence, the conversation would be lost; move it
            // into long-term memory instead.
            if persist_path.is_none() {
                session.archive_history().await;
            }
            break;
        }

        let report = session.respond(line).await?;
        println!();
        println!("{ai_name}: {}", report.answer);
        println!();

        if let Some(path) = &persist_path {
            if let Err(e) = session.history().save(path) {
                warn!(error = %e, "Failed to persist chat history");
            }
        }
    }

    Ok(())
}
