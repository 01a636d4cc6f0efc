//! Notebook capability over the path-keyed blob namespace.

use async_trait::async_trait;
use ponder_core::action::{Action, Outcome};
use ponder_core::capability::{CapabilitySpec, ParamKind, ParamSpec};
use ponder_core::context::AmbientContext;
use ponder_core::error::ActionError;
use ponder_core::memory::MemoryStore;
use serde_json::json;
use std::sync::Arc;

const SCRATCH_PAGE: &str = "notes/scratch";

/// Save, read, and list small text notes.
pub struct NoteAction {
    store: Arc<dyn MemoryStore>,
}

impl NoteAction {
    pub fn new(store: Arc<dyn MemoryStore>) -> Self {
        Self { store }
    }

    fn store_err(e: ponder_core::error::MemoryError) -> ActionError {
        ActionError::Failed {
            name: "note".into(),
            reason: e.to_string(),
        }
    }
}

#[async_trait]
impl Action for NoteAction {
    fn spec(&self) -> CapabilitySpec {
        CapabilitySpec::new("note", "Keep small text notes across conversations")
            .param(
                ParamSpec::new("mode", ParamKind::String)
                    .describe("One of: save, read, list"),
            )
            .param(
                ParamSpec::new("page", ParamKind::String)
                    .describe("Which note page to use")
                    .default_value(json!(SCRATCH_PAGE)),
            )
            .param(
                ParamSpec::new("text", ParamKind::String)
                    .describe("The text to save (save mode only)")
                    .default_value(json!("")),
            )
    }

    async fn call(
        &self,
        _ctx: &AmbientContext,
        args: serde_json::Value,
    ) -> Result<Outcome, ActionError> {
        let mode = args["mode"]
            .as_str()
            .ok_or_else(|| ActionError::InvalidArguments("mode must be a string".into()))?;
        let page = args["page"].as_str().unwrap_or(SCRATCH_PAGE);

        match mode {
            "save" => {
                let text = args["text"].as_str().unwrap_or("");
                self.store
                    .put_blob(page, text)
                    .await
                    .map_err(Self::store_err)?;
                Ok(Outcome::Ack)
            }
            "read" => {
                let content = self.store.get_blob(page).await.map_err(Self::store_err)?;
                Ok(Outcome::text(
                    content.unwrap_or_else(|| "nothing on that page".into()),
                ))
            }
            "list" => {
                let pages = self.store.list_blobs().await.map_err(Self::store_err)?;
                if pages.is_empty() {
                    Ok(Outcome::text("no notes yet"))
                } else {
                    Ok(Outcome::text(pages.join("\n")))
                }
            }
            other => Err(ActionError::InvalidArguments(format!(
                "unknown mode: {other}"
            ))),
        }
    }
}
