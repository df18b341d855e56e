use rust_decimal::Decimal;
use std::cmp::Ordering;

/// Tolerance historically used when this service's balance arithmetic was
/// backed by floating point. Decimal arithmetic doesn't accumulate the same
/// error, but comparisons still go through this helper so callers get
/// consistent three-way semantics instead of raw `PartialOrd`.
const EPSILON: Decimal = Decimal::from_parts(1, 0, 0, false, 6);

/// -1 if `a < b`, 0 if `a` and `b` are within [`EPSILON`] of each other, 1 if `a > b`.
pub fn compare(a: Decimal, b: Decimal) -> Ordering {
    let diff = a - b;
    if diff.abs() <= EPSILON {
        Ordering::Equal
    } else if diff.is_sign_negative() {
        Ordering::Less
    } else {
        Ordering::Greater
    }
}

pub fn is_non_negative(amount: Decimal) -> bool {
    compare(amount, Decimal::ZERO) != Ordering::Less
}
