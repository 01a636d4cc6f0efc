//! Wall-clock capability.

use chrono::Local;
use ponder_core::action::{BlockingAction, Outcome};
use ponder_core::capability::CapabilitySpec;
use ponder_core::context::AmbientContext;
use ponder_core::error::ActionError;

/// Shows the current time. Synchronous, so it registers through the
/// blocking path.
pub struct ClockAction;

impl BlockingAction for ClockAction {
    fn spec(&self) -> CapabilitySpec {
        CapabilitySpec::new("clock", "It shows you the current date and time")
    }

    fn call(&self, _ctx: &AmbientContext, _args: serde_json::Value) -> Result<Outcome, ActionError> {
        Ok(Outcome::text(Local::now().to_rfc3339()))
    }
}
