//! Console outlet — delivers finished turns to stdout.

use async_trait::async_trait;
use ponder_core::context::AmbientContext;
use ponder_core::error::OutletError;
use ponder_core::message::Message;
use ponder_core::outlet::Outlet;
use tracing::debug;

/// Prints the final generated message prefixed with the agent's name.
pub struct ConsoleOutlet {
    agent_name: String,
}

impl ConsoleOutlet {
    pub fn new(agent_name: impl Into<String>) -> Self {
        Self {
            agent_name: agent_name.into(),
        }
    }
}

#[async_trait]
impl Outlet for ConsoleOutlet {
    async fn output(
        &self,
        generated: &[Message],
        _ctx: &AmbientContext,
    ) -> Result<(), OutletError> {
        for message in generated {
            debug!(role = %message.role, content = %message.content, "generated");
        }

        if let Some(last) = generated.last() {
            if !last.content.is_empty() {
                println!("{}> {}", self.agent_name, last.content);
            }
        }
        Ok(())
    }
}
