//! Outlet trait — the delivery side of an invocation.
//!
//! The engine hands the accumulated generated messages to an `Outlet`
//! exactly once per completed non-"notalk" invocation. The outlet owns all
//! platform-specific side effects: sending, formatting, mentions, typing
//! indicators.

use crate::context::AmbientContext;
use crate::error::OutletError;
use crate::message::Message;
use async_trait::async_trait;

/// The delivery collaborator.
#[async_trait]
pub trait Outlet: Send + Sync {
    /// Deliver the generated messages for one finished invocation.
    async fn output(
        &self,
        generated: &[Message],
        ctx: &AmbientContext,
    ) -> Result<(), OutletError>;
}

/// An outlet that discards everything. Useful for agents whose actions
/// carry all visible effects.
pub struct NullOutlet;

#[async_trait]
impl Outlet for NullOutlet {
    async fn output(
        &self,
        _generated: &[Message],
        _ctx: &AmbientContext,
    ) -> Result<(), OutletError> {
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn null_outlet_accepts_anything() {
        let outlet = NullOutlet;
        let ctx = AmbientContext::new("test", "chan", "1", "Tester");
        outlet
            .output(&[Message::assistant("hello")], &ctx)
            .await
            .unwrap();
    }
}
