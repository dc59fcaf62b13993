//! Case pricing
//!
//! A case is priced from its items: the sum of `unit_price × quantity`,
//! rounded up once to the next whole euro. Item prices arrive from the
//! admin form in whatever shape the operator typed them (`"16,90€"`,
//! `"16.9"`, `16.9`), so every field is normalized before arithmetic.

use std::str::FromStr;

use rust_decimal::{Decimal, RoundingStrategy};

use crate::models::ItemInput;
use crate::types::RawAmount;

/// Quantity used when an item has none, or a non-positive one
pub const DEFAULT_ITEM_QUANTITY: i32 = 2;

/// Bottles in a standard case, used for the per-bottle display price
pub const BOTTLES_PER_CASE: u32 = 6;

/// Largest unit price an item can carry (fits `NUMERIC(10, 2)`)
pub const MAX_UNIT_PRICE: Decimal = Decimal::from_parts(999_999_999, 0, 0, false, 2);

/// Largest case price that can be stored (`NUMERIC(10, 0)`): 9 999 999 999
pub const MAX_CASE_PRICE: Decimal = Decimal::from_parts(1_410_065_407, 2, 0, false, 0);

/// Normalize a unit price to a non-negative decimal.
///
/// Currency symbols and spaces are dropped and a comma decimal separator is
/// accepted. When both `.` and `,` appear, the last one is the decimal
/// separator and the other is treated as a thousands separator.
/// Anything that still fails to parse is worth 0. The result is rounded
/// to cents and capped at [`MAX_UNIT_PRICE`], so the price computed here
/// is the one stored.
pub fn normalize_price(raw: Option<&RawAmount>) -> Decimal {
    let value = match raw {
        Some(RawAmount::Number(n)) => parse_decimal(&n.to_string()),
        Some(RawAmount::Text(s)) => parse_decimal(&clean_price_text(s)),
        None => None,
    };

    value
        .filter(|v| *v > Decimal::ZERO)
        .map(|v| {
            v.min(MAX_UNIT_PRICE)
                .round_dp_with_strategy(2, RoundingStrategy::MidpointAwayFromZero)
        })
        .unwrap_or(Decimal::ZERO)
}

/// Normalize an item quantity; absent, unparsable or non-positive values
/// become [`DEFAULT_ITEM_QUANTITY`]
pub fn normalize_quantity(raw: Option<&RawAmount>) -> i32 {
    let parsed = match raw {
        Some(RawAmount::Number(n)) => n
            .as_i64()
            .or_else(|| n.as_f64().map(|f| f.trunc() as i64)),
        Some(RawAmount::Text(s)) => leading_integer(s),
        None => None,
    };

    match parsed {
        Some(q) if q > 0 => i32::try_from(q).unwrap_or(i32::MAX),
        _ => DEFAULT_ITEM_QUANTITY,
    }
}

/// Compute the sale price of a case from its items.
///
/// The sum is rounded up once at the end, never per item. An empty list
/// costs 0.
pub fn compute_price(items: &[ItemInput]) -> Decimal {
    price_of_lines(items.iter().map(|item| {
        (
            normalize_price(item.price.as_ref()),
            normalize_quantity(item.quantity.as_ref()),
        )
    }))
}

/// Ceiling of the sum of already-normalized `(unit_price, quantity)` lines.
/// Saturates at [`Decimal::MAX`] instead of overflowing.
pub fn price_of_lines<I>(lines: I) -> Decimal
where
    I: IntoIterator<Item = (Decimal, i32)>,
{
    let total = lines
        .into_iter()
        .try_fold(Decimal::ZERO, |acc, (unit_price, quantity)| {
            unit_price
                .checked_mul(Decimal::from(quantity))
                .and_then(|line| acc.checked_add(line))
        })
        .unwrap_or(Decimal::MAX);

    total.ceil().normalize()
}

/// Price of one bottle, rounded to cents
pub fn price_per_bottle(case_price: Decimal, bottles: u32) -> Decimal {
    if bottles == 0 {
        return case_price;
    }
    (case_price / Decimal::from(bottles)).round_dp(2)
}

fn clean_price_text(raw: &str) -> String {
    let kept: String = raw
        .chars()
        .filter(|c| c.is_ascii_digit() || matches!(c, '.' | ',' | '-'))
        .collect();

    let last_dot = kept.rfind('.');
    let last_comma = kept.rfind(',');
    match (last_dot, last_comma) {
        (Some(dot), Some(comma)) if comma > dot => kept.replace('.', "").replace(',', "."),
        (Some(_), Some(_)) => kept.replace(',', ""),
        _ => kept.replace(',', "."),
    }
}

fn parse_decimal(text: &str) -> Option<Decimal> {
    Decimal::from_str(text)
        .or_else(|_| Decimal::from_scientific(text))
        .ok()
}

fn leading_integer(raw: &str) -> Option<i64> {
    let trimmed = raw.trim();
    let (sign, digits) = match trimmed.strip_prefix('-') {
        Some(rest) => (-1, rest),
        None => (1, trimmed.strip_prefix('+').unwrap_or(trimmed)),
    };
    let end = digits
        .find(|c: char| !c.is_ascii_digit())
        .unwrap_or(digits.len());
    digits[..end].parse::<i64>().ok().map(|n| n * sign)
}
