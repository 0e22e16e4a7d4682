//! Runs the block cycle and the control loop side by side
//!
//! Both cycles are polled by the same task, so exactly one of them runs at a
//! time and control changes hands only at await points. A block cycle error
//! stops the control loop too; cancellation stops both at their next safe
//! point.

use crate::control::ControlLoop;
use crate::engine::BlockCycle;
use crate::error::AppResult;
use tokio_util::sync::CancellationToken;

/// Top-level driver
pub struct Orchestrator {
    block_cycle: BlockCycle,
    /// Absent when messaging is not configured
    control: Option<ControlLoop>,
}

impl Orchestrator {
    pub fn new(block_cycle: BlockCycle, control: Option<ControlLoop>) -> Self {
        Self {
            block_cycle,
            control,
        }
    }

    /// Run until the block cycle fails or `cancel_token` is cancelled.
    /// Both cycles finish their in-flight work before returning.
    pub async fn run(&self, cancel_token: CancellationToken) -> AppResult<()> {
        // Also cancelled when the block cycle fails, to stop the control loop
        let shutdown = cancel_token.child_token();

        let block_cycle = async {
            let result = self.block_cycle.run(shutdown.clone()).await;
            shutdown.cancel();
            result
        };

        let control = async {
            match &self.control {
                Some(control) => control.run(shutdown.clone()).await,
                None => tracing::info!("Messaging disabled, control channel not started"),
            }
        };

        let (result, ()) = tokio::join!(block_cycle, control);
        if result.is_ok() {
            tracing::info!("Shutdown requested, orchestrator stopped");
        }
        result
    }
}
