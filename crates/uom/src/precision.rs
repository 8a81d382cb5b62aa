//! Rounding and precision comparison on decimal quantities.

use core::cmp::Ordering;

use rust_decimal::{Decimal, RoundingStrategy};
use serde::{Deserialize, Serialize};

/// How a converted quantity is rounded to the target unit's precision.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum RoundingMethod {
    /// Round half away from zero.
    HalfUp,
    /// Always away from zero.
    Up,
    /// Truncate toward zero.
    Down,
}

impl RoundingMethod {
    fn strategy(self) -> RoundingStrategy {
        match self {
            RoundingMethod::HalfUp => RoundingStrategy::MidpointAwayFromZero,
            RoundingMethod::Up => RoundingStrategy::AwayFromZero,
            RoundingMethod::Down => RoundingStrategy::ToZero,
        }
    }
}

/// Round `value` to a multiple of `precision_rounding` (e.g. `0.01`).
///
/// A non-positive precision leaves the value untouched.
pub fn float_round(value: Decimal, precision_rounding: Decimal, method: RoundingMethod) -> Decimal {
    if precision_rounding <= Decimal::ZERO {
        return value;
    }
    let steps = (value / precision_rounding).round_dp_with_strategy(0, method.strategy());
    (steps * precision_rounding).normalize()
}

/// Round half-up to `digits` decimal places.
pub fn round_to_digits(value: Decimal, digits: u32) -> Decimal {
    value.round_dp_with_strategy(digits, RoundingStrategy::MidpointAwayFromZero)
}

/// True when `value` rounds to zero at `digits` decimal places.
pub fn is_zero(value: Decimal, digits: u32) -> bool {
    round_to_digits(value, digits).is_zero()
}

/// Compare two quantities after rounding both to `digits` decimal places.
pub fn compare(a: Decimal, b: Decimal, digits: u32) -> Ordering {
    let delta = round_to_digits(a, digits) - round_to_digits(b, digits);
    if is_zero(delta, digits) {
        Ordering::Equal
    } else if delta.is_sign_negative() {
        Ordering::Less
    } else {
        Ordering::Greater
    }
}
