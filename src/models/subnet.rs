//! Chain-side models - subnets, stake positions and the staking wallet

use crate::constants::network::ROOT_NETUID;
use serde::{Deserialize, Serialize};

/// Point-in-time view of one subnet as returned by the gateway.
///
/// Fetched fresh every block cycle and never mutated locally.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SubnetSnapshot {
    /// Subnet id (0 is the root subnet)
    pub netuid: u16,
    /// Display name
    #[serde(rename = "subnet_name", default)]
    pub name: String,
    /// Unit price in TAO
    pub price: f64,
    /// TAO emission flowing into the subnet per block
    #[serde(rename = "tao_in_emission")]
    pub emission: f64,
    /// Symbol of the subnet's alpha token
    #[serde(default)]
    pub symbol: String,
}

impl SubnetSnapshot {
    /// Root subnet is never eligible for allocation
    pub fn is_root(&self) -> bool {
        self.netuid == ROOT_NETUID
    }

    /// Raw score (`emission / price`), `None` when the price is not positive
    pub fn raw_score(&self) -> Option<f64> {
        if self.price > 0.0 {
            Some(self.emission / self.price)
        } else {
            None
        }
    }
}

/// Stake held by a coldkey on one subnet, delegated to one hotkey
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StakePosition {
    pub netuid: u16,
    /// Hotkey (validator identity) the stake is delegated to
    #[serde(rename = "hotkey_ss58")]
    pub hotkey: String,
    /// Owning coldkey
    #[serde(rename = "coldkey_ss58", default)]
    pub coldkey: String,
    /// Staked amount, in subnet units
    pub stake: f64,
}

/// Staking wallet identity
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Wallet {
    /// Wallet name known to the signing bridge
    pub name: String,
    /// Coldkey SS58 address holding balance and stake
    pub coldkey: String,
}
