//! The engine's recursive generation loop.
//!
//! One invocation walks `COMPOSE → THINK → (DISPATCH → COMPOSE)* →
//! FINALIZE` as an explicit loop with a depth counter, so the depth cap is
//! a plain comparison and the stack stays flat no matter how eagerly the
//! backend requests capabilities.

use ponder_core::action::{ActionRegistry, Outcome};
use ponder_core::backend::{ModelBackend, ThinkRequest};
use ponder_core::context::AmbientContext;
use ponder_core::error::Result;
use ponder_core::message::Message;
use ponder_core::outlet::Outlet;
use std::sync::Arc;
use tracing::{debug, warn};

/// Canonical acknowledgement fed back when a capability reports plain
/// success with nothing to say.
pub const ACK_TEXT: &str = "Done!";

/// The outcome report of one finished invocation.
#[derive(Debug, Clone)]
pub struct Turn {
    /// How many dispatch rounds ran before the loop settled
    pub depth: u32,

    /// The caller-supplied history, untouched
    pub history: Vec<Message>,

    /// Everything the invocation generated: assistant messages and
    /// function-role capability results, in order
    pub generated: Vec<Message>,

    /// True when a capability ended the invocation without a reply
    pub notalk: bool,
}

/// The orchestration engine.
///
/// Immutable after construction; wrap it in an `Arc` and call
/// [`Engine::run`] from as many tasks as needed.
pub struct Engine {
    /// The model backend to think with
    backend: Arc<dyn ModelBackend>,

    /// Where finished invocations deliver their messages
    outlet: Arc<dyn Outlet>,

    /// Registered capabilities, read-only after startup
    actions: Arc<ActionRegistry>,

    /// The system prompt composed in front of every exchange
    system_prompt: String,

    /// Hard cap on dispatch rounds per invocation
    max_depth: u32,
}

impl Engine {
    /// Create a new engine.
    pub fn new(
        backend: Arc<dyn ModelBackend>,
        outlet: Arc<dyn Outlet>,
        actions: Arc<ActionRegistry>,
    ) -> Self {
        Self {
            backend,
            outlet,
            actions,
            system_prompt: "You're a helpful agent".into(),
            max_depth: 5,
        }
    }

    /// Set the system prompt.
    pub fn with_system_prompt(mut self, prompt: impl Into<String>) -> Self {
        self.system_prompt = prompt.into();
        self
    }

    /// Set the maximum number of dispatch rounds per invocation.
    pub fn with_max_depth(mut self, max: u32) -> Self {
        self.max_depth = max;
        self
    }

    /// Perform one full invocation over the supplied history.
    ///
    /// The loop composes [system prompt] + history + generated messages,
    /// asks the backend to think, and dispatches at most `max_depth`
    /// capability calls before finalizing. The depth cap truncates
    /// silently, even mid-call-request. An unknown capability name is
    /// treated as "no usable call", not an error. Backend failures and
    /// malformed call arguments propagate to the caller.
    pub async fn run(&self, history: Vec<Message>, ctx: AmbientContext) -> Result<Turn> {
        let mut depth: u32 = 0;
        let mut generated: Vec<Message> = Vec::new();
        let mut notalk = false;
        let capabilities = self.actions.definitions();

        while depth < self.max_depth {
            let mut messages = Vec::with_capacity(1 + history.len() + generated.len());
            messages.push(Message::system(&self.system_prompt));
            messages.extend(history.iter().cloned());
            messages.extend(generated.iter().cloned());

            debug!(depth, messages = messages.len(), "Thinking");
            let message = self
                .backend
                .think(ThinkRequest {
                    messages,
                    capabilities: capabilities.clone(),
                })
                .await?;

            let call = message.call.clone();
            generated.push(message);

            let Some(call) = call else {
                break;
            };

            if !self.actions.contains(&call.name) {
                debug!(capability = %call.name, "Backend requested an unregistered capability");
                break;
            }

            let arguments: serde_json::Value = serde_json::from_str(&call.arguments)?;
            debug!(depth, capability = %call.name, "Dispatching");

            match self.actions.dispatch(&call.name, &ctx, arguments).await? {
                Outcome::Reply(value) => {
                    let text = match value {
                        serde_json::Value::String(s) => s,
                        other => serde_json::to_string(&other)?,
                    };
                    generated.push(Message::function(&call.name, text));
                    depth += 1;
                }
                Outcome::Ack => {
                    generated.push(Message::function(&call.name, ACK_TEXT));
                    depth += 1;
                }
                Outcome::Silent => {
                    debug!(capability = %call.name, "Capability ended the invocation silently");
                    notalk = true;
                    break;
                }
            }

            if depth == self.max_depth {
                warn!(
                    max_depth = self.max_depth,
                    "Depth cap reached, truncating further capability use"
                );
            }
        }

        if !notalk {
            self.outlet.output(&generated, &ctx).await?;
        }

        Ok(Turn {
            depth,
            history,
            generated,
            notalk,
        })
    }
}
