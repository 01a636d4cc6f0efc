//! Emoji-reaction capability.
//!
//! Sometimes the only right answer is a reaction. The transport hook is
//! injected as a `Reactor`, and the `stop` flag decides whether the
//! invocation keeps talking afterwards or ends silently.

use async_trait::async_trait;
use ponder_core::action::{Action, Outcome};
use ponder_core::capability::{CapabilitySpec, ParamKind, ParamSpec};
use ponder_core::context::AmbientContext;
use ponder_core::error::ActionError;
use serde_json::json;
use std::sync::Arc;

/// Platform hook that attaches an emoji reaction to the message being
/// answered.
#[async_trait]
pub trait Reactor: Send + Sync {
    async fn add_reaction(&self, ctx: &AmbientContext, emoji: &str) -> Result<(), ActionError>;
}

/// Adds an emoji reaction to the user's message.
pub struct ReactAction {
    reactor: Arc<dyn Reactor>,
}

impl ReactAction {
    pub fn new(reactor: Arc<dyn Reactor>) -> Self {
        Self { reactor }
    }
}

#[async_trait]
impl Action for ReactAction {
    fn spec(&self) -> CapabilitySpec {
        CapabilitySpec::new(
            "react",
            "Add an emoji reaction to the user's message when a reaction says it best",
        )
        .param(ParamSpec::context("ctx"))
        .param(ParamSpec::new("emoji", ParamKind::String).describe("One emoji"))
        .param(
            ParamSpec::new("stop", ParamKind::Boolean)
                .describe("true: the reaction is the whole answer, false: keep talking")
                .default_value(json!(false)),
        )
    }

    async fn call(
        &self,
        ctx: &AmbientContext,
        args: serde_json::Value,
    ) -> Result<Outcome, ActionError> {
        let emoji = args["emoji"]
            .as_str()
            .ok_or_else(|| ActionError::InvalidArguments("emoji must be a string".into()))?;
        let stop = args["stop"].as_bool().unwrap_or(false);

        self.reactor.add_reaction(ctx, emoji).await?;

        if stop {
            Ok(Outcome::Silent)
        } else {
            Ok(Outcome::text("done"))
        }
    }
}
