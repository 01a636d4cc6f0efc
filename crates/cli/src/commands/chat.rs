//! Interactive chat — wires store → engine → console together.
//!
//! Every line becomes a user record; the engine sees a token-budgeted
//! window of the channel, and whatever it says ends up back in the log,
//! so the conversation survives restarts.

use crate::console::ConsoleOutlet;
use anyhow::Context;
use ponder_agent::Engine;
use ponder_backends::OpenAiCompatBackend;
use ponder_core::context::AmbientContext;
use ponder_core::memory::MemoryStore;
use ponder_core::message::{Message, Role};
use ponder_core::record::ConversationRecord;
use ponder_memory::SqliteStore;
use std::io::Write;
use std::path::PathBuf;
use std::sync::Arc;
use tokio::io::{AsyncBufReadExt, BufReader};
use tracing::{error, info};

const PROTOCOL: &str = "console";
const CHANNEL: &str = "repl";
const USER_UID: &str = "local_user";
const USER_NAME: &str = "you";
const AGENT_UID: &str = "0";

pub async fn run(config_path: Option<PathBuf>, message: Option<String>) -> anyhow::Result<()> {
    let config = super::load_config(config_path)?;

    let store: Arc<dyn MemoryStore> = Arc::new(
        SqliteStore::new(&config.memory.db_path)
            .await
            .context("opening memory store")?,
    );

    let api_key = config.backend.api_key.clone().unwrap_or_default();
    let backend = OpenAiCompatBackend::new(
        "openai-compat",
        &config.backend.base_url,
        api_key,
        &config.backend.model,
    )
    .context("building model backend")?
    .with_temperature(config.backend.temperature);

    let registry = Arc::new(ponder_actions::default_registry(store.clone()));
    let outlet = Arc::new(ConsoleOutlet::new(config.agent.name.clone()));

    let engine = Engine::new(Arc::new(backend), outlet, registry)
        .with_system_prompt(&config.agent.system_prompt)
        .with_max_depth(config.agent.max_depth);

    info!(
        model = %config.backend.model,
        max_depth = config.agent.max_depth,
        "Agent ready"
    );

    if let Some(line) = message {
        take_turn(&engine, store.as_ref(), &config, &line).await?;
        return Ok(());
    }

    let stdin = tokio::io::stdin();
    let reader = BufReader::new(stdin);
    let mut lines = reader.lines();

    loop {
        print!("{USER_NAME}> ");
        std::io::stdout().flush().ok();

        let Some(line) = lines.next_line().await? else {
            break; // EOF (Ctrl+D)
        };
        let line = line.trim().to_string();
        if line.is_empty() {
            continue;
        }
        if matches!(line.as_str(), "exit" | "quit" | "/exit" | "/quit" | ":q") {
            break;
        }

        // One bad turn must not kill the session.
        if let Err(e) = take_turn(&engine, store.as_ref(), &config, &line).await {
            error!("Turn failed: {e:#}");
        }
    }

    Ok(())
}

/// Record the user's line, run the engine over the history window, and
/// record what came back.
async fn take_turn(
    engine: &Engine,
    store: &dyn MemoryStore,
    config: &ponder_config::AppConfig,
    line: &str,
) -> anyhow::Result<()> {
    store
        .append(ConversationRecord::new(
            PROTOCOL, CHANNEL, USER_UID, USER_NAME, Role::User, line,
        ))
        .await?;

    let records = store
        .get_channel(PROTOCOL, CHANNEL, config.agent.history_budget)
        .await?;
    let history: Vec<Message> = records.iter().map(record_to_message).collect();

    let ctx = AmbientContext::new(PROTOCOL, CHANNEL, USER_UID, USER_NAME);
    let turn = engine.run(history, ctx).await?;

    // Don't memorize turns where the agent acted without talking.
    if turn.notalk {
        return Ok(());
    }

    if let Some(last) = turn.generated.last() {
        if !last.content.is_empty() {
            store
                .append(ConversationRecord::new(
                    PROTOCOL,
                    CHANNEL,
                    AGENT_UID,
                    &config.agent.name,
                    Role::Assistant,
                    &last.content,
                ))
                .await?;
        }
    }

    Ok(())
}

/// Render a stored record as an engine message.
///
/// User lines carry their author so the model can tell speakers apart in
/// shared channels; everything else passes through verbatim.
fn record_to_message(record: &ConversationRecord) -> Message {
    match record.role {
        Role::User => Message::user(format!("{}> {}", record.author, record.content)),
        Role::Assistant => Message::assistant(&record.content),
        Role::System => Message::system(&record.content),
        Role::Function => Message::function(&record.author, &record.content),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn user_records_are_prefixed_with_their_author() {
        let record =
            ConversationRecord::new("console", "repl", "7", "telamohn", Role::User, "hello");
        let message = record_to_message(&record);
        assert_eq!(message.role, Role::User);
        assert_eq!(message.content, "telamohn> hello");
    }

    #[test]
    fn assistant_records_pass_through_verbatim() {
        let record =
            ConversationRecord::new("console", "repl", "0", "Ponder", Role::Assistant, "hi there");
        let message = record_to_message(&record);
        assert_eq!(message.role, Role::Assistant);
        assert_eq!(message.content, "hi there");
    }
}
