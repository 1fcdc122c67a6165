//! Contribution rule resolution.
//!
//! Every percentage-or-fixed rule in a country rule set, on either the employee
//! or the employer side, resolves to a per-period amount through the same three
//! steps: compute the base amount for its basis, prorate annual values back to
//! the period, then apply any per-period and annual ceilings.

use rust_decimal::{Decimal, RoundingStrategy};

use crate::config::{Basis, Caps, ContributionRule, RuleAmount};
use crate::error::{EngineError, EngineResult};

/// Number of decimal places used for every monetary value in a result.
pub const MONEY_DECIMAL_PLACES: u32 = 2;

/// Rounds a monetary amount to 2 decimal places, midpoint away from zero.
///
/// # Examples
///
/// ```
/// use payroll_engine::calculation::round_money;
/// use rust_decimal::Decimal;
/// use std::str::FromStr;
///
/// assert_eq!(round_money(Decimal::from_str("83.335").unwrap()), Decimal::from_str("83.34").unwrap());
/// assert_eq!(round_money(Decimal::from_str("83.3333").unwrap()), Decimal::from_str("83.33").unwrap());
/// ```
pub fn round_money(amount: Decimal) -> Decimal {
    amount.round_dp_with_strategy(MONEY_DECIMAL_PLACES, RoundingStrategy::MidpointAwayFromZero)
}

/// Converts an annual amount into its per-period equivalent.
pub fn prorate_annual(amount: Decimal, periods_per_year: u32) -> Decimal {
    amount / Decimal::from(periods_per_year.max(1))
}

/// Multiplies two amounts, failing with `quantity` out of range on overflow.
pub fn checked_mul(quantity: &str, lhs: Decimal, rhs: Decimal) -> EngineResult<Decimal> {
    lhs.checked_mul(rhs).ok_or_else(|| out_of_range(quantity))
}

/// Adds two amounts, failing with `quantity` out of range on overflow.
pub fn checked_add(quantity: &str, lhs: Decimal, rhs: Decimal) -> EngineResult<Decimal> {
    lhs.checked_add(rhs).ok_or_else(|| out_of_range(quantity))
}

/// Sums amounts, failing with `quantity` out of range on overflow.
pub fn checked_sum<I>(quantity: &str, values: I) -> EngineResult<Decimal>
where
    I: IntoIterator<Item = Decimal>,
{
    values
        .into_iter()
        .try_fold(Decimal::ZERO, |total, value| checked_add(quantity, total, value))
}

fn out_of_range(quantity: &str) -> EngineError {
    EngineError::InvalidEmployee {
        field: quantity.to_string(),
        message: "amount out of range".to_string(),
    }
}

/// Computes the uncapped per-period amount of a rule shape.
///
/// A percentage with an annual basis is applied to the annualized gross and
/// prorated back; a fixed annual amount is prorated. Returns `None` if the
/// amount does not fit in a `Decimal`.
pub fn base_period_amount(
    amount: &RuleAmount,
    gross_pay: Decimal,
    periods_per_year: u32,
) -> Option<Decimal> {
    match *amount {
        RuleAmount::Percentage {
            rate,
            basis: Basis::Gross,
        } => gross_pay.checked_mul(rate),
        RuleAmount::Percentage {
            rate,
            basis: Basis::Annual,
        } => {
            let annualized = gross_pay.checked_mul(Decimal::from(periods_per_year.max(1)))?;
            Some(prorate_annual(annualized.checked_mul(rate)?, periods_per_year))
        }
        RuleAmount::Fixed {
            amount,
            basis: Basis::Gross,
        } => Some(amount),
        RuleAmount::Fixed {
            amount,
            basis: Basis::Annual,
        } => Some(prorate_annual(amount, periods_per_year)),
    }
}

/// Applies the per-period ceiling, then the annual ceiling.
///
/// Non-positive amounts collapse to zero. The annual ceiling is applied to the
/// already period-capped amount, so it is authoritative when both are present.
/// Returns `None` if annualizing the amount overflows.
pub fn apply_caps(amount: Decimal, caps: &Caps, periods_per_year: u32) -> Option<Decimal> {
    if amount <= Decimal::ZERO {
        return Some(Decimal::ZERO);
    }

    let mut capped = amount;
    if let Some(max_amount) = caps.max_amount {
        capped = capped.min(max_amount);
    }
    if let Some(annual_cap) = caps.annual_cap {
        let annualized = capped
            .checked_mul(Decimal::from(periods_per_year.max(1)))?
            .min(annual_cap);
        capped = prorate_annual(annualized, periods_per_year);
    }

    Some(capped.max(Decimal::ZERO))
}

/// Resolves a rule to its unrounded per-period amount.
///
/// A rule without a rate or amount contributes zero.
///
/// # Errors
///
/// Returns `InvalidEmployee` naming the rule when the amount overflows.
pub fn resolve_rule_amount(
    rule: &ContributionRule,
    gross_pay: Decimal,
    periods_per_year: u32,
) -> EngineResult<Decimal> {
    let Some(amount) = &rule.amount else {
        return Ok(Decimal::ZERO);
    };

    base_period_amount(amount, gross_pay, periods_per_year)
        .and_then(|base| apply_caps(base, &rule.caps, periods_per_year))
        .ok_or_else(|| out_of_range(&rule.name))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;

    fn dec(s: &str) -> Decimal {
        Decimal::from_str(s).unwrap()
    }

    fn rule(amount: Option<RuleAmount>, caps: Caps) -> ContributionRule {
        ContributionRule {
            name: "test_rule".to_string(),
            amount,
            caps,
        }
    }

    #[test]
    fn test_percentage_of_period_gross() {
        let amount = RuleAmount::Percentage {
            rate: dec("0.0635"),
            basis: Basis::Gross,
        };
        assert_eq!(base_period_amount(&amount, dec("2000"), 12), Some(dec("127.0000")));
    }

    #[test]
    fn test_percentage_of_annual_gross_prorated_back() {
        let amount = RuleAmount::Percentage {
            rate: dec("0.1"),
            basis: Basis::Annual,
        };
        assert_eq!(base_period_amount(&amount, dec("2000"), 12), Some(dec("200")));
    }

    #[test]
    fn test_fixed_annual_amount_prorated() {
        let amount = RuleAmount::Fixed {
            amount: dec("1200"),
            basis: Basis::Annual,
        };
        assert_eq!(base_period_amount(&amount, dec("5000"), 12), Some(dec("100")));
    }

    #[test]
    fn test_fixed_period_amount_ignores_gross() {
        let amount = RuleAmount::Fixed {
            amount: dec("45"),
            basis: Basis::Gross,
        };
        assert_eq!(base_period_amount(&amount, Decimal::ZERO, 12), Some(dec("45")));
    }

    #[test]
    fn test_annual_cap_scenario() {
        // 2000 x 12 x 0.1 = 2400 annual, capped to 1000, prorated to 83.33
        let r = rule(
            Some(RuleAmount::Percentage {
                rate: dec("0.1"),
                basis: Basis::Annual,
            }),
            Caps {
                max_amount: None,
                annual_cap: Some(dec("1000")),
            },
        );

        let amount = resolve_rule_amount(&r, dec("2000"), 12).unwrap();
        assert_eq!(round_money(amount), dec("83.33"));
    }

    #[test]
    fn test_max_amount_caps_period_value() {
        let caps = Caps {
            max_amount: Some(dec("150")),
            annual_cap: None,
        };
        assert_eq!(apply_caps(dec("200"), &caps, 12), Some(dec("150")));
        assert_eq!(apply_caps(dec("100"), &caps, 12), Some(dec("100")));
    }

    #[test]
    fn test_annual_cap_applied_after_max_amount() {
        let caps = Caps {
            max_amount: Some(dec("150")),
            annual_cap: Some(dec("1200")),
        };
        // 150 x 12 = 1800 > 1200, so 100 per period
        assert_eq!(apply_caps(dec("200"), &caps, 12), Some(dec("100")));
    }

    #[test]
    fn test_annual_cap_not_reached_leaves_amount() {
        let caps = Caps {
            max_amount: None,
            annual_cap: Some(dec("10000")),
        };
        assert_eq!(apply_caps(dec("200"), &caps, 12), Some(dec("200")));
    }

    #[test]
    fn test_non_positive_amount_is_zero() {
        let caps = Caps::default();
        assert_eq!(apply_caps(dec("-5"), &caps, 12), Some(Decimal::ZERO));
        assert_eq!(apply_caps(Decimal::ZERO, &caps, 12), Some(Decimal::ZERO));
    }

    #[test]
    fn test_rule_without_amount_contributes_zero() {
        let r = rule(None, Caps::default());
        assert_eq!(resolve_rule_amount(&r, dec("5000"), 12).unwrap(), Decimal::ZERO);
    }

    #[test]
    fn test_round_money_midpoint_away_from_zero() {
        assert_eq!(round_money(dec("0.005")), dec("0.01"));
        assert_eq!(round_money(dec("-0.005")), dec("-0.01"));
        assert_eq!(round_money(dec("12.344")), dec("12.34"));
    }

    #[test]
    fn test_annualizing_huge_gross_is_out_of_range() {
        let r = rule(
            Some(RuleAmount::Percentage {
                rate: dec("0.1"),
                basis: Basis::Annual,
            }),
            Caps::default(),
        );

        match resolve_rule_amount(&r, Decimal::from_scientific("1e28").unwrap(), 12) {
            Err(EngineError::InvalidEmployee { field, message }) => {
                assert_eq!(field, "test_rule");
                assert_eq!(message, "amount out of range");
            }
            other => panic!("Expected InvalidEmployee, got {:?}", other),
        }
    }

    #[test]
    fn test_annual_cap_overflow_is_none() {
        let caps = Caps {
            max_amount: None,
            annual_cap: Some(dec("1000")),
        };
        assert_eq!(apply_caps(Decimal::MAX, &caps, 12), None);
    }

    #[test]
    fn test_checked_sum_reports_quantity() {
        assert_eq!(
            checked_sum("gross_pay", [dec("1.50"), dec("2.25")]).unwrap(),
            dec("3.75")
        );
        match checked_sum("gross_pay", [Decimal::MAX, Decimal::ONE]) {
            Err(EngineError::InvalidEmployee { field, .. }) => assert_eq!(field, "gross_pay"),
            other => panic!("Expected InvalidEmployee, got {:?}", other),
        }
    }
}
