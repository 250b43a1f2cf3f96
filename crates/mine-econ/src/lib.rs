#![deny(warnings)]

//! Economic models for a mining session.
//!
//! This crate provides pure calculators over a [`mine_core::Scenario`]:
//! - Expected value of one mining action, with the fire-skill smelt replacing
//!   (not adding to) the normal shard yield
//! - Cost, profit and sell-raw baseline of every crafting recipe under the
//!   selected supply modes
//!
//! Nothing here fails: malformed inputs have already been normalised and the
//! remaining degenerate values are floored or clamped.
//!
//! Crafting sums are money and use [`Decimal`]. Expected values are products
//! of probabilities and stay in `f64`.

pub mod craft;
pub mod ev;

pub use craft::{
    best_recipe, compare_all, compare_recipe, unit_cost, CostByMode, CostLine, CraftComparison,
    Verdict,
};
pub use ev::{ev_breakdown, evaluate, EvBreakdown, EvInputs};

use mine_core::clamp01;
use rust_decimal::prelude::FromPrimitive;
use rust_decimal::Decimal;

/// Gross price after the proportional sell fee; negative prices floor at 0.
///
/// Example:
/// assert_eq!(net_price(6000.0, 0.05), 5700.0);
pub fn net_price(gross: f64, fee_rate: f64) -> f64 {
    gross.max(0.0) * (1.0 - fee_rate)
}

/// Normalised rate as a currency amount. Negative or NaN reads as 0 and
/// anything past the decimal range saturates.
pub fn money(value: f64) -> Decimal {
    if value.is_nan() || value <= 0.0 {
        return Decimal::ZERO;
    }
    Decimal::from_f64(value).unwrap_or(Decimal::MAX)
}

/// Sell fee as a decimal fraction in [0, 1].
pub fn fee_fraction(fee_rate: f64) -> Decimal {
    Decimal::from_f64(clamp01(fee_rate)).unwrap_or(Decimal::ZERO)
}

/// [`net_price`] over currency amounts.
pub fn net_amount(gross: Decimal, fee: Decimal) -> Decimal {
    gross.max(Decimal::ZERO).saturating_mul(Decimal::ONE - fee)
}
