/// Network-level constants shared by the gateway, engine and control channel.
pub mod network {
    /// Root subnet id. Never eligible for allocation.
    pub const ROOT_NETUID: u16 = 0;
    /// Symbol of the native token balances and stake amounts are quoted in.
    pub const NATIVE_SYMBOL: &str = "TAO";
    /// Base units per native token (1 TAO = 10^9 rao).
    pub const RAO_PER_TAO: u64 = 1_000_000_000;
}

/// Preference multiplier bounds adjusted by `/boost` and `/slash`.
pub mod preference {
    /// Multiplier applied when a subnet has no explicit preference.
    pub const DEFAULT_MULTIPLIER: f64 = 1.0;
    /// Step applied by a single boost or slash.
    pub const STEP: f64 = 0.1;
    /// Floor enforced by slash.
    pub const MIN_MULTIPLIER: f64 = 0.1;
}
