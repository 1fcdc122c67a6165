//! Progressive income tax calculation.
//!
//! Rates apply marginally: each bracket taxes only the slice of income between
//! the previous bracket's upper bound and its own.

use rust_decimal::Decimal;
use tracing::warn;

use crate::config::TaxBracket;
use crate::error::EngineResult;
use crate::models::TaxBracketDetail;

use super::contribution::{checked_add, checked_mul, round_money};

/// The result of a progressive income tax calculation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IncomeTaxResult {
    /// Total tax, rounded to 2 decimal places.
    pub income_tax: Decimal,
    /// Tax charged per bracket, for brackets that taxed a non-zero slice.
    pub bracket_details: Vec<TaxBracketDetail>,
    /// Income above the highest finite bracket that no bracket absorbed.
    pub untaxed_remainder: Decimal,
}

/// Applies progressive brackets to a taxable income.
///
/// `brackets` must already be sorted ascending with unbounded brackets last, as
/// [`CountryConfig`](crate::config::CountryConfig) guarantees. Each finite bound
/// becomes the threshold for the next bracket, even when it is negative. A
/// bracket whose span would be negative is treated as empty. An unbounded
/// bracket absorbs all remaining income.
///
/// Income exactly on a boundary is taxed entirely in the lower bracket.
///
/// # Errors
///
/// Returns `InvalidEmployee` when the tax does not fit in a `Decimal`.
///
/// # Examples
///
/// ```
/// use payroll_engine::calculation::calculate_income_tax;
/// use payroll_engine::config::TaxBracket;
/// use rust_decimal::Decimal;
///
/// let brackets = [
///     TaxBracket { up_to: Some(Decimal::from(1000)), rate: Decimal::new(1, 1) },
///     TaxBracket { up_to: None, rate: Decimal::new(2, 1) },
/// ];
///
/// let result = calculate_income_tax(Decimal::from(1500), &brackets).unwrap();
/// assert_eq!(result.income_tax, Decimal::from(200));
/// assert_eq!(result.bracket_details.len(), 2);
/// ```
pub fn calculate_income_tax(
    taxable_income: Decimal,
    brackets: &[TaxBracket],
) -> EngineResult<IncomeTaxResult> {
    let mut remaining = taxable_income.max(Decimal::ZERO);
    let mut last_threshold = Decimal::ZERO;
    let mut tax = Decimal::ZERO;
    let mut bracket_details = Vec::new();

    for bracket in brackets {
        if remaining <= Decimal::ZERO {
            break;
        }

        let taxable_at_rate = match bracket.up_to {
            Some(up_to) => remaining.min(bracket_span(last_threshold, up_to, remaining)),
            None => remaining,
        };

        if taxable_at_rate > Decimal::ZERO {
            let tax_for_bracket = checked_mul("income_tax", taxable_at_rate, bracket.rate)?;
            tax = checked_add("income_tax", tax, tax_for_bracket)?;
            bracket_details.push(TaxBracketDetail {
                up_to: bracket.up_to,
                rate: bracket.rate,
                amount: round_money(tax_for_bracket),
            });
            remaining -= taxable_at_rate;
        }

        if let Some(up_to) = bracket.up_to {
            last_threshold = up_to;
        }
    }

    let untaxed_remainder = remaining.max(Decimal::ZERO);
    if untaxed_remainder > Decimal::ZERO && !brackets.is_empty() {
        warn!(
            untaxed = %untaxed_remainder,
            "Taxable income exceeds the highest finite bracket and no unbounded bracket exists"
        );
    }

    Ok(IncomeTaxResult {
        income_tax: round_money(tax),
        bracket_details,
        untaxed_remainder,
    })
}

/// Width of the slice between two thresholds, never negative.
///
/// A span too wide to represent is wider than anything left to tax.
fn bracket_span(from: Decimal, to: Decimal, remaining: Decimal) -> Decimal {
    match to.checked_sub(from) {
        Some(span) => span.max(Decimal::ZERO),
        None if to > from => remaining,
        None => Decimal::ZERO,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;
    use std::str::FromStr;

    fn dec(s: &str) -> Decimal {
        Decimal::from_str(s).unwrap()
    }

    fn bracket(up_to: Option<&str>, rate: &str) -> TaxBracket {
        TaxBracket {
            up_to: up_to.map(dec),
            rate: dec(rate),
        }
    }

    fn two_brackets() -> Vec<TaxBracket> {
        vec![bracket(Some("1000"), "0.1"), bracket(None, "0.2")]
    }

    fn four_brackets() -> Vec<TaxBracket> {
        vec![
            bracket(Some("1000"), "0"),
            bracket(Some("3000"), "0.15"),
            bracket(Some("8000"), "0.3"),
            bracket(None, "0.45"),
        ]
    }

    #[test]
    fn test_marginal_rates_across_two_brackets() {
        let result = calculate_income_tax(dec("1500"), &two_brackets()).unwrap();

        assert_eq!(result.income_tax, dec("200"));
        assert_eq!(result.bracket_details[0].amount, dec("100"));
        assert_eq!(result.bracket_details[1].amount, dec("100"));
        assert_eq!(result.bracket_details[1].up_to, None);
    }

    #[test]
    fn test_income_on_boundary_stays_in_lower_bracket() {
        let result = calculate_income_tax(dec("1000"), &two_brackets()).unwrap();

        assert_eq!(result.income_tax, dec("100"));
        assert_eq!(result.bracket_details.len(), 1);
        assert_eq!(result.bracket_details[0].up_to, Some(dec("1000")));
    }

    #[test]
    fn test_zero_income_has_no_details() {
        let result = calculate_income_tax(Decimal::ZERO, &two_brackets()).unwrap();
        assert_eq!(result.income_tax, Decimal::ZERO);
        assert!(result.bracket_details.is_empty());
    }

    #[test]
    fn test_zero_rate_bracket_recorded_only_when_nonzero_slice() {
        let result = calculate_income_tax(dec("2000"), &four_brackets()).unwrap();

        // 1000 @ 0 + 1000 @ 0.15
        assert_eq!(result.income_tax, dec("150"));
        assert_eq!(result.bracket_details.len(), 2);
        assert_eq!(result.bracket_details[0].amount, Decimal::ZERO);
    }

    #[test]
    fn test_top_bracket_absorbs_large_income() {
        let result = calculate_income_tax(dec("1000000"), &four_brackets()).unwrap();

        // 0 + 2000*0.15 + 5000*0.3 + 992000*0.45
        assert_eq!(result.income_tax, dec("448200"));
        assert_eq!(result.untaxed_remainder, Decimal::ZERO);
    }

    #[test]
    fn test_no_unbounded_bracket_leaves_remainder_untaxed() {
        let brackets = vec![bracket(Some("1000"), "0.1")];
        let result = calculate_income_tax(dec("1500"), &brackets).unwrap();

        assert_eq!(result.income_tax, dec("100"));
        assert_eq!(result.untaxed_remainder, dec("500"));
    }

    #[test]
    fn test_negative_span_clamped_to_zero() {
        // Negative bound yields a negative span for the first bracket.
        let brackets = vec![bracket(Some("-500"), "0.5"), bracket(None, "0.1")];
        let result = calculate_income_tax(dec("1000"), &brackets).unwrap();

        assert_eq!(result.income_tax, dec("100"));
        assert_eq!(result.bracket_details.len(), 1);
    }

    #[test]
    fn test_negative_bound_is_next_threshold() {
        // The first bracket is empty but its bound still opens the second one,
        // which therefore spans 1500.
        let brackets = vec![
            bracket(Some("-500"), "0.1"),
            bracket(Some("1000"), "0.2"),
            bracket(None, "0.3"),
        ];
        let result = calculate_income_tax(dec("1500"), &brackets).unwrap();

        assert_eq!(result.income_tax, dec("300"));
        assert_eq!(result.bracket_details.len(), 1);
        assert_eq!(result.bracket_details[0].up_to, Some(dec("1000")));
    }

    #[test]
    fn test_tax_overflow_is_invalid_employee() {
        let brackets = vec![bracket(None, "2")];
        let result = calculate_income_tax(Decimal::MAX, &brackets);

        assert!(matches!(
            result,
            Err(crate::error::EngineError::InvalidEmployee { .. })
        ));
    }

    #[test]
    fn test_no_brackets_means_no_tax() {
        let result = calculate_income_tax(dec("5000"), &[]).unwrap();
        assert_eq!(result.income_tax, Decimal::ZERO);
        assert_eq!(result.untaxed_remainder, dec("5000"));
    }

    proptest! {
        #[test]
        fn prop_tax_is_monotonic(a in 0u64..5_000_000, b in 0u64..5_000_000) {
            let (low, high) = if a <= b { (a, b) } else { (b, a) };
            let brackets = four_brackets();

            let low_tax = calculate_income_tax(Decimal::new(low as i64, 2), &brackets)
                .unwrap()
                .income_tax;
            let high_tax = calculate_income_tax(Decimal::new(high as i64, 2), &brackets)
                .unwrap()
                .income_tax;

            prop_assert!(low_tax <= high_tax);
        }

        #[test]
        fn prop_unbounded_bracket_absorbs_everything(cents in 0u64..10_000_000_000) {
            let income = Decimal::new(cents as i64, 2);
            let result = calculate_income_tax(income, &four_brackets()).unwrap();

            prop_assert_eq!(result.untaxed_remainder, Decimal::ZERO);
        }
    }
}
