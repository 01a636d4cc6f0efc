//! # Ponder Core
//!
//! Domain types, traits, and error definitions for the Ponder agent engine.
//! This crate has **zero framework dependencies** — it defines the domain
//! model that all other crates implement against.
//!
//! ## Design Philosophy
//!
//! Every collaborator is defined as a trait here. Implementations live in
//! their respective crates. This enables:
//! - Swapping implementations via configuration
//! - Easy testing with mock/stub implementations
//! - Clean dependency graph (all crates depend inward on core)

pub mod action;
pub mod backend;
pub mod capability;
pub mod context;
pub mod error;
pub mod memory;
pub mod message;
pub mod outlet;
pub mod record;

// Re-export key types at crate root for ergonomics
pub use action::{Action, ActionRegistry, BlockingAction, Outcome};
pub use backend::{ModelBackend, ThinkRequest};
pub use capability::{CapabilityDef, CapabilitySpec, ParamKind, ParamSpec};
pub use context::AmbientContext;
pub use error::{Error, Result};
pub use memory::MemoryStore;
pub use message::{CallRequest, Message, Role};
pub use outlet::Outlet;
pub use record::{ConversationRecord, Moderation, UserProfile};
