//! Domain models shared by the gateway, engine and control channel

mod purchase;
mod subnet;

pub use purchase::PurchaseEvent;
pub use subnet::{StakePosition, SubnetSnapshot, Wallet};
