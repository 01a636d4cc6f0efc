//! User-database lookup capability.

use async_trait::async_trait;
use ponder_core::action::{Action, Outcome};
use ponder_core::capability::{CapabilitySpec, ParamKind, ParamSpec};
use ponder_core::context::AmbientContext;
use ponder_core::error::ActionError;
use ponder_core::memory::MemoryStore;
use std::sync::Arc;
use tracing::debug;

/// Looks a user up in the profile store by id or approximate name.
///
/// The protocol comes from the ambient context, so the backend only ever
/// supplies the name it wants resolved.
pub struct WhoisAction {
    store: Arc<dyn MemoryStore>,
}

impl WhoisAction {
    pub fn new(store: Arc<dyn MemoryStore>) -> Self {
        Self { store }
    }
}

#[async_trait]
impl Action for WhoisAction {
    fn spec(&self) -> CapabilitySpec {
        CapabilitySpec::new(
            "whois",
            "Look up your user database for previous interactions with an individual",
        )
        .param(ParamSpec::context("ctx"))
        .param(
            ParamSpec::new("user", ParamKind::String)
                .describe("The username of the individual you wanna look up"),
        )
    }

    async fn call(
        &self,
        ctx: &AmbientContext,
        args: serde_json::Value,
    ) -> Result<Outcome, ActionError> {
        let user = args["user"]
            .as_str()
            .ok_or_else(|| ActionError::InvalidArguments("user must be a string".into()))?;

        let found = self
            .store
            .search_user(&ctx.protocol, user)
            .await
            .map_err(|e| ActionError::Failed {
                name: "whois".into(),
                reason: e.to_string(),
            })?;

        debug!(protocol = %ctx.protocol, user, hit = found.is_some(), "whois lookup");
        match found {
            Some(profile) => Ok(Outcome::text(profile.description)),
            None => Ok(Outcome::text("unknown individual")),
        }
    }
}
