//! Decimal type utilities for precise energy and price calculations

use rust_decimal::Decimal;
pub use rust_decimal_macros::dec;

/// Price type with high precision (currency per kWh)
pub type Price = Decimal;

/// Quantity type with high precision (kWh)
pub type Quantity = Decimal;

/// Amount type with high precision (typically Price * Quantity)
pub type Amount = Decimal;

/// Precision helpers for common operations
pub mod precision {
    use super::*;

    /// Energy figures are stored with 2 decimal places
    pub const ENERGY_PRECISION: u32 = 2;

    /// Prices are stored with 4 decimal places
    pub const PRICE_PRECISION: u32 = 4;

    /// Round an energy quantity to standard precision
    pub fn round_energy(qty: Quantity) -> Quantity {
        qty.round_dp(ENERGY_PRECISION)
    }

    /// Round a price to standard precision
    pub fn round_price(price: Price) -> Price {
        price.round_dp(PRICE_PRECISION)
    }
}
