//! Profile-writing capability.

use async_trait::async_trait;
use ponder_core::action::{Action, Outcome};
use ponder_core::capability::{CapabilitySpec, ParamKind, ParamSpec};
use ponder_core::context::AmbientContext;
use ponder_core::error::ActionError;
use ponder_core::memory::MemoryStore;
use ponder_core::record::UserProfile;
use serde_json::json;
use std::sync::Arc;
use tracing::debug;

/// Writes a one-line description of a user to the profile store.
///
/// Last write wins, so calling it again simply revises the description.
pub struct RememberAction {
    store: Arc<dyn MemoryStore>,
}

impl RememberAction {
    pub fn new(store: Arc<dyn MemoryStore>) -> Self {
        Self { store }
    }
}

#[async_trait]
impl Action for RememberAction {
    fn spec(&self) -> CapabilitySpec {
        CapabilitySpec::new(
            "remember",
            "Save a one-line description of an individual for later",
        )
        .param(ParamSpec::context("ctx"))
        .param(
            ParamSpec::new("user", ParamKind::String)
                .describe("The user id of the individual to remember"),
        )
        .param(
            ParamSpec::new("about", ParamKind::String)
                .describe("A single line describing the individual"),
        )
        .param(
            ParamSpec::new("name", ParamKind::String)
                .describe("The individual's display name, if you know it")
                .default_value(json!("")),
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
        let about = args["about"]
            .as_str()
            .ok_or_else(|| ActionError::InvalidArguments("about must be a string".into()))?;
        let name = args["name"].as_str().unwrap_or("");

        let mut profile = UserProfile::new(&ctx.protocol, user, about);
        if !name.is_empty() {
            profile = profile.named(name);
        }

        self.store
            .set_user(profile)
            .await
            .map_err(|e| ActionError::Failed {
                name: "remember".into(),
                reason: e.to_string(),
            })?;

        debug!(protocol = %ctx.protocol, user, "profile saved");
        Ok(Outcome::Ack)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ponder_memory::InMemoryStore;

    fn ctx() -> AmbientContext {
        AmbientContext::new("discord", "20", "7", "telamohn")
    }

    #[tokio::test]
    async fn saves_and_indexes_a_profile() {
        let store = Arc::new(InMemoryStore::new());
        let action = RememberAction::new(store.clone());

        let outcome = action
            .call(
                &ctx(),
                json!({"user": "42", "about": "likes tea", "name": "Amy"}),
            )
            .await
            .unwrap();
        assert_eq!(outcome, Outcome::Ack);

        let profile = store.search_user("discord", "am").await.unwrap().unwrap();
        assert_eq!(profile.description, "likes tea");
    }

    #[tokio::test]
    async fn empty_name_skips_the_index() {
        let store = Arc::new(InMemoryStore::new());
        let action = RememberAction::new(store.clone());

        action
            .call(&ctx(), json!({"user": "42", "about": "likes tea", "name": ""}))
            .await
            .unwrap();

        let profile = store.get_user("discord", "42").await.unwrap().unwrap();
        assert!(profile.display_name.is_none());
    }

    #[test]
    fn name_parameter_is_optional_in_the_schema() {
        let action = RememberAction::new(Arc::new(InMemoryStore::new()));
        let def = action.spec().to_def();
        let required = def.parameters["required"].as_array().unwrap();
        assert!(required.iter().any(|v| v == "user"));
        assert!(required.iter().any(|v| v == "about"));
        assert!(!required.iter().any(|v| v == "name"));
        assert!(!required.iter().any(|v| v == "ctx"));
    }
}
