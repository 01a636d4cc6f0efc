//! Profile store commands — direct access without the engine.

use anyhow::Context;
use ponder_core::memory::MemoryStore;
use ponder_core::record::UserProfile;
use ponder_memory::SqliteStore;
use std::path::PathBuf;

async fn open_store(config_path: Option<PathBuf>) -> anyhow::Result<SqliteStore> {
    let config = super::load_config(config_path)?;
    SqliteStore::new(&config.memory.db_path)
        .await
        .context("opening memory store")
}

pub async fn whois(
    config_path: Option<PathBuf>,
    protocol: &str,
    query: &str,
) -> anyhow::Result<()> {
    let store = open_store(config_path).await?;
    match store.search_user(protocol, query).await? {
        Some(profile) => {
            match &profile.display_name {
                Some(name) => println!("{} ({}): {}", name, profile.uid, profile.description),
                None => println!("{}: {}", profile.uid, profile.description),
            }
        }
        None => println!("unknown individual"),
    }
    Ok(())
}

pub async fn remember(
    config_path: Option<PathBuf>,
    protocol: &str,
    uid: &str,
    description: &str,
    name: Option<String>,
) -> anyhow::Result<()> {
    let store = open_store(config_path).await?;
    let mut profile = UserProfile::new(protocol, uid, description);
    if let Some(name) = name {
        profile = profile.named(name);
    }
    store.set_user(profile).await?;
    println!("saved");
    Ok(())
}
