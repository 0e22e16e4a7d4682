use crate::constants::network::RAO_PER_TAO;
use rust_decimal::prelude::*;

/// Safely convert TAO (f64) to rao (u64) using Decimal to avoid precision loss
pub fn tao_to_rao(tao: f64) -> u64 {
    let tao_decimal = Decimal::from_f64_retain(tao).unwrap_or(Decimal::ZERO);
    let multiplier = Decimal::from(RAO_PER_TAO);

    (tao_decimal * multiplier).round().to_u64().unwrap_or(0)
}

/// Safely convert rao (u64) to TAO (f64) for display and scoring
pub fn rao_to_tao(rao: u64) -> f64 {
    let rao_dec = Decimal::from(rao);
    let divisor = Decimal::from(RAO_PER_TAO);

    (rao_dec / divisor).to_f64().unwrap_or(0.0)
}
