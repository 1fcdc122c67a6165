//! Arithmetic integrity checks.
//!
//! A failed check means the rule evaluation itself is defective; the
//! calculation is aborted rather than returning an inconsistent result.

use rust_decimal::Decimal;
use tracing::error;

use crate::error::{EngineError, EngineResult};

use super::contribution::round_money;

/// Verifies that `actual` equals `expected` once both are rounded to 2 decimal
/// places.
///
/// # Examples
///
/// ```
/// use payroll_engine::calculation::ensure_balanced;
/// use rust_decimal::Decimal;
///
/// assert!(ensure_balanced("net_pay", Decimal::new(10000, 2), Decimal::from(100)).is_ok());
/// assert!(ensure_balanced("net_pay", Decimal::new(10001, 2), Decimal::from(100)).is_err());
/// ```
pub fn ensure_balanced(check: &str, expected: Decimal, actual: Decimal) -> EngineResult<()> {
    let expected = round_money(expected);
    let actual = round_money(actual);

    if expected == actual {
        return Ok(());
    }

    error!(
        check = %check,
        expected = %expected,
        actual = %actual,
        "Integrity check failed"
    );
    Err(EngineError::IntegrityViolation {
        check: check.to_string(),
        expected,
        actual,
    })
}
