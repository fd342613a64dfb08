//! Pip arithmetic.
//!
//! The pip unit of an instrument comes from its quoting precision when the
//! terminal reports it. Without it, the unit is guessed from the text of the
//! price: two or more integer digits means a 2-decimal (JPY style) quote.
//! The guess fails for 4-decimal prices above 10 and for sub-10 JPY crosses,
//! so it is only a fallback.

use rust_decimal::prelude::ToPrimitive;
use rust_decimal::{Decimal, RoundingStrategy};

/// Pip of a 4-decimal quote.
pub const STANDARD_PIP: Decimal = Decimal::from_parts(1, 0, 0, false, 4);

/// Pip of a 2-decimal quote.
pub const JPY_PIP: Decimal = Decimal::from_parts(1, 0, 0, false, 2);

/// Pip unit guessed from where the decimal point falls in `price`.
pub fn heuristic_pip_unit(price: Decimal) -> Decimal {
    let text = price.abs().to_string();
    let point = text.find('.').unwrap_or(text.len());
    if point >= 2 {
        JPY_PIP
    } else {
        STANDARD_PIP
    }
}

/// Pip unit for an instrument quoted with `digits` decimals.
///
/// Odd precisions carry a fractional pip (5 -> 0.0001, 3 -> 0.01),
/// even precisions quote whole pips (4 -> 0.0001, 2 -> 0.01).
pub fn pip_unit_for_digits(digits: u32) -> Decimal {
    let pip_digits = if digits % 2 == 1 { digits - 1 } else { digits };
    Decimal::new(1, pip_digits.min(28))
}

/// Pip unit from instrument precision, falling back to the price heuristic.
pub fn resolve_pip_unit(digits: Option<u32>, price: Decimal) -> Decimal {
    match digits {
        Some(d) => pip_unit_for_digits(d),
        None => heuristic_pip_unit(price),
    }
}

/// Distance between two prices in pips, rounded half-up, unit guessed from
/// the prices themselves.
///
/// The unit is taken from the larger price so the distance is symmetric.
pub fn pip_distance(a: Decimal, b: Decimal) -> u64 {
    pip_distance_with_unit(a, b, heuristic_pip_unit(a.max(b)))
}

/// Distance between two prices in whole pips of `unit`, rounded half-up.
pub fn pip_distance_with_unit(a: Decimal, b: Decimal, unit: Decimal) -> u64 {
    if unit <= Decimal::ZERO {
        return 0;
    }

    (a - b)
        .abs()
        .checked_div(unit)
        .unwrap_or(Decimal::MAX)
        .round_dp_with_strategy(0, RoundingStrategy::MidpointAwayFromZero)
        .to_u64()
        .unwrap_or(u64::MAX)
}
