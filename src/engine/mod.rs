//! Allocation engine for the subnet staker
//!
//! Scores subnets, commits stake once per block and builds the per-block
//! report.

pub mod allocation;
mod block_cycle;
pub mod report;

pub use allocation::{effective_score, select_best_subnet, Selection};
pub use block_cycle::BlockCycle;
pub use report::{CycleReport, ReportRow, StakeAction};
