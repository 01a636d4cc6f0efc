//! The Ponder orchestration engine.
//!
//! One `Engine` serves any number of concurrent invocations; each
//! invocation owns its recursion state and touches nothing shared except
//! the read-only capability registry and whatever the handlers reach.

pub mod engine;

pub use engine::{Engine, Turn, ACK_TEXT};
