//! Gross pay calculation functionality.
//!
//! This module derives base pay, overtime pay and applicable allowances from an
//! employee snapshot and sums them, with bonuses, into gross pay.

use rust_decimal::Decimal;
use std::collections::BTreeMap;

use crate::config::CountryConfig;
use crate::error::EngineResult;
use crate::models::EmployeeSnapshot;

use super::contribution::{checked_mul, checked_sum, round_money};

/// The result of a gross pay calculation.
///
/// Every component is rounded to 2 decimal places and `gross_pay` is their
/// exact sum.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GrossPayResult {
    /// Base + overtime + bonuses + allowances.
    pub gross_pay: Decimal,
    /// Base pay for the period.
    pub base_pay: Decimal,
    /// Overtime pay for the period.
    pub overtime_pay: Decimal,
    /// Bonuses for the period.
    pub bonuses: Decimal,
    /// Allowances with a positive value, by name.
    pub allowances_breakdown: BTreeMap<String, Decimal>,
}

impl GrossPayResult {
    /// Returns the sum of the applied allowances.
    pub fn allowances_total(&self) -> Decimal {
        self.allowances_breakdown.values().copied().sum()
    }
}

/// Calculates gross pay for an employee.
///
/// - Base pay is the employee's `base_pay` when positive, otherwise
///   `hourly_rate x hours_worked`.
/// - Overtime is `hourly_rate x overtime_hours x overtime_multiplier`, only when
///   both the rate and the hours are positive.
/// - Non-positive allowances are dropped.
///
/// # Errors
///
/// Returns `InvalidEmployee` when a component or the total does not fit in a
/// `Decimal`.
///
/// # Examples
///
/// ```
/// use payroll_engine::calculation::calculate_gross_pay;
/// use payroll_engine::config::CountryConfig;
/// use payroll_engine::models::EmployeeSnapshot;
/// use rust_decimal::Decimal;
///
/// let config = CountryConfig::from_yaml_str("country: Testland\n").unwrap();
/// let employee = EmployeeSnapshot {
///     hourly_rate: Decimal::from(20),
///     hours_worked: Decimal::from(160),
///     overtime_hours: Decimal::from(10),
///     ..Default::default()
/// };
///
/// let result = calculate_gross_pay(&employee, &config).unwrap();
/// assert_eq!(result.base_pay, Decimal::from(3200));
/// assert_eq!(result.overtime_pay, Decimal::from(250));
/// assert_eq!(result.gross_pay, Decimal::from(3450));
/// ```
pub fn calculate_gross_pay(
    employee: &EmployeeSnapshot,
    config: &CountryConfig,
) -> EngineResult<GrossPayResult> {
    let base_pay = if employee.base_pay > Decimal::ZERO {
        employee.base_pay
    } else {
        checked_mul("base_pay", employee.hourly_rate, employee.hours_worked)?
    };

    let overtime_pay =
        if employee.hourly_rate > Decimal::ZERO && employee.overtime_hours > Decimal::ZERO {
            let hours_pay = checked_mul("overtime_pay", employee.hourly_rate, employee.overtime_hours)?;
            checked_mul("overtime_pay", hours_pay, config.overtime_multiplier())?
        } else {
            Decimal::ZERO
        };

    let allowances_breakdown: BTreeMap<String, Decimal> = employee
        .allowances
        .iter()
        .filter(|(_, amount)| **amount > Decimal::ZERO)
        .map(|(name, amount)| (name.clone(), round_money(*amount)))
        .collect();

    let base_pay = round_money(base_pay);
    let overtime_pay = round_money(overtime_pay);
    let bonuses = round_money(employee.bonuses);
    let allowances_total = checked_sum("allowances", allowances_breakdown.values().copied())?;
    let gross_pay = checked_sum(
        "gross_pay",
        [base_pay, overtime_pay, bonuses, allowances_total],
    )?;

    Ok(GrossPayResult {
        gross_pay,
        base_pay,
        overtime_pay,
        bonuses,
        allowances_breakdown,
    })
}
