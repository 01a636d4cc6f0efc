//! Built-in capability implementations for Ponder.
//!
//! Capabilities give the agent something to do between thoughts: read the
//! clock, look people up, remember them, keep notes. Platform-coupled
//! capabilities (like emoji reactions) take their side-effect collaborator
//! by injection so the same action works on any transport.

pub mod clock;
pub mod note;
pub mod react;
pub mod remember;
pub mod whois;

pub use clock::ClockAction;
pub use note::NoteAction;
pub use react::{ReactAction, Reactor};
pub use remember::RememberAction;
pub use whois::WhoisAction;

use ponder_core::action::ActionRegistry;
use ponder_core::memory::MemoryStore;
use std::sync::Arc;

/// Create a registry with the store-backed built-ins.
///
/// The clock goes through the blocking path; everything else is async.
/// Platform-coupled capabilities (reactions) are left to the caller since
/// they need a transport collaborator.
pub fn default_registry(store: Arc<dyn MemoryStore>) -> ActionRegistry {
    let mut registry = ActionRegistry::new();
    registry.register_blocking(Arc::new(ClockAction));
    registry.register(Arc::new(WhoisAction::new(store.clone())));
    registry.register(Arc::new(RememberAction::new(store.clone())));
    registry.register(Arc::new(NoteAction::new(store)));
    registry
}

#[cfg(test)]
mod tests {
    use super::*;
    use ponder_memory::InMemoryStore;

    #[test]
    fn default_registry_contains_builtins() {
        let registry = default_registry(Arc::new(InMemoryStore::new()));
        for name in ["clock", "whois", "remember", "note"] {
            assert!(registry.contains(name), "{name} missing");
        }
        assert_eq!(registry.definitions().len(), 4);
    }
}
