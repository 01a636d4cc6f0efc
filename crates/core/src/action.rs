//! Action traits and the capability registry/dispatcher.
//!
//! Actions are what give the agent the ability to act in the world: look
//! up a person, add a reaction, read the clock. The model backend picks
//! them by name; the registry resolves that name to a handler and invokes
//! it uniformly whatever its execution model.
//!
//! The execution model is fixed at registration time by construction:
//! `register` takes an async [`Action`], `register_blocking` takes a
//! synchronous [`BlockingAction`] that the dispatcher runs on the blocking
//! pool so it cannot stall sibling invocations.

use crate::capability::{CapabilityDef, CapabilitySpec, ParamKind};
use crate::context::AmbientContext;
use crate::error::ActionError;
use async_trait::async_trait;
use std::sync::Arc;
use tracing::debug;

/// What a capability handler produced, classified for the engine.
#[derive(Debug, Clone, PartialEq)]
pub enum Outcome {
    /// A result to feed back to the backend. Strings pass through
    /// verbatim; any other value is serialized as compact JSON.
    Reply(serde_json::Value),

    /// The work is done and there is nothing to say about it beyond a
    /// canonical acknowledgement.
    Ack,

    /// The handler already produced the whole visible effect; end the
    /// invocation without a reply ("notalk").
    Silent,
}

impl Outcome {
    /// Convenience constructor for text replies.
    pub fn text(s: impl Into<String>) -> Self {
        Outcome::Reply(serde_json::Value::String(s.into()))
    }
}

/// An asynchronous capability handler.
#[async_trait]
pub trait Action: Send + Sync {
    /// The descriptor this capability registers under.
    fn spec(&self) -> CapabilitySpec;

    /// Execute with the ambient context and the parsed call arguments.
    async fn call(
        &self,
        ctx: &AmbientContext,
        args: serde_json::Value,
    ) -> Result<Outcome, ActionError>;
}

/// A synchronous capability handler.
///
/// Runs on the blocking pool; must not assume an async runtime context.
pub trait BlockingAction: Send + Sync {
    /// The descriptor this capability registers under.
    fn spec(&self) -> CapabilitySpec;

    /// Execute with the ambient context and the parsed call arguments.
    fn call(&self, ctx: &AmbientContext, args: serde_json::Value) -> Result<Outcome, ActionError>;
}

enum Handler {
    Deferred(Arc<dyn Action>),
    Blocking(Arc<dyn BlockingAction>),
}

/// A registered capability: the authored spec, the wire definition
/// derived from it once at registration, and the handler.
struct Registered {
    spec: CapabilitySpec,
    def: CapabilityDef,
    handler: Handler,
}

/// The capability registry and dispatcher.
///
/// Read-only after startup: build it, wrap it in an `Arc`, and share it
/// across concurrent engine invocations.
#[derive(Default)]
pub struct ActionRegistry {
    actions: Vec<Registered>,
}

impl ActionRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register an async capability. Re-registering a name replaces the
    /// previous entry in place (last registration wins).
    pub fn register(&mut self, action: Arc<dyn Action>) {
        let spec = action.spec();
        self.insert(spec, Handler::Deferred(action));
    }

    /// Register a synchronous capability; it will run on the blocking pool.
    pub fn register_blocking(&mut self, action: Arc<dyn BlockingAction>) {
        let spec = action.spec();
        self.insert(spec, Handler::Blocking(action));
    }

    fn insert(&mut self, spec: CapabilitySpec, handler: Handler) {
        let def = spec.to_def();
        let entry = Registered { spec, def, handler };
        match self.actions.iter_mut().find(|r| r.spec.name == entry.spec.name) {
            Some(slot) => {
                debug!(capability = %entry.spec.name, "Replacing registered capability");
                *slot = entry;
            }
            None => self.actions.push(entry),
        }
    }

    /// Whether a capability name is registered.
    pub fn contains(&self, name: &str) -> bool {
        self.actions.iter().any(|r| r.spec.name == name)
    }

    /// The ordered capability definitions for transmission to the backend.
    pub fn definitions(&self) -> Vec<CapabilityDef> {
        self.actions.iter().map(|r| r.def.clone()).collect()
    }

    /// List all registered capability names.
    pub fn names(&self) -> Vec<&str> {
        self.actions.iter().map(|r| r.spec.name.as_str()).collect()
    }

    /// Resolve a name and invoke its handler.
    ///
    /// Declared parameter defaults are merged into the argument object for
    /// keys the backend omitted; no other coercion is applied. Async
    /// handlers are awaited directly; blocking handlers are offloaded so
    /// they cannot stall the caller's scheduler.
    pub async fn dispatch(
        &self,
        name: &str,
        ctx: &AmbientContext,
        mut args: serde_json::Value,
    ) -> Result<Outcome, ActionError> {
        let registered = self
            .actions
            .iter()
            .find(|r| r.spec.name == name)
            .ok_or_else(|| ActionError::NotFound(name.to_string()))?;

        Self::merge_defaults(&registered.spec, &mut args);

        match &registered.handler {
            Handler::Deferred(action) => action.call(ctx, args).await,
            Handler::Blocking(action) => {
                let action = Arc::clone(action);
                let ctx = ctx.clone();
                let name = name.to_string();
                tokio::task::spawn_blocking(move || action.call(&ctx, args))
                    .await
                    .map_err(|e| ActionError::Failed {
                        name,
                        reason: format!("blocking handler panicked: {e}"),
                    })?
            }
        }
    }

    /// Fill omitted arguments with declared defaults.
    fn merge_defaults(spec: &CapabilitySpec, args: &mut serde_json::Value) {
        let Some(object) = args.as_object_mut() else {
            return;
        };
        for param in &spec.params {
            if param.kind == ParamKind::Context {
                continue;
            }
            if let Some(default) = &param.default {
                object
                    .entry(param.name.clone())
                    .or_insert_with(|| default.clone());
            }
        }
    }
}
