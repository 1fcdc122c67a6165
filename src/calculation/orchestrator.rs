//! Gross-to-net orchestration.
//!
//! Sequences gross pay, deductions and employer costs into one
//! [`CalculationResult`] and enforces the cross-component totals.

use tracing::debug;

use crate::config::{ConfigLoader, CountryConfig};
use crate::error::EngineResult;
use crate::models::{CalculationResult, EmployeeSnapshot, NamedDeductions};

use super::contribution::checked_add;
use super::deductions::calculate_deductions;
use super::employer_costs::calculate_employer_costs;
use super::gross_pay::calculate_gross_pay;
use super::integrity::ensure_balanced;

/// Runs a complete gross-to-net calculation against a resolved rule set.
///
/// The calculation is a pure function of its inputs: it performs no I/O and
/// keeps no state between calls, so any number of calculations may share one
/// `CountryConfig` concurrently.
///
/// # Errors
///
/// Returns `InvalidEmployee` if an amount does not fit in a `Decimal`, or
/// `IntegrityViolation` if any total fails to reconcile with its components.
///
/// # Examples
///
/// ```
/// use payroll_engine::calculation::calculate_payroll;
/// use payroll_engine::config::CountryConfig;
/// use payroll_engine::models::EmployeeSnapshot;
/// use rust_decimal::Decimal;
///
/// let config = CountryConfig::from_yaml_str(
///     "country: Testland\nincome_tax_brackets:\n  - { up_to: 1000, rate: 0.1 }\n  - { up_to: null, rate: 0.2 }\n",
/// )?;
/// let employee = EmployeeSnapshot {
///     country: "Testland".to_string(),
///     base_pay: Decimal::from(1500),
///     ..Default::default()
/// };
///
/// let result = calculate_payroll(&employee, &config)?;
/// assert_eq!(result.income_tax, Decimal::from(200));
/// assert_eq!(result.net_pay, Decimal::from(1300));
/// # Ok::<(), payroll_engine::error::EngineError>(())
/// ```
pub fn calculate_payroll(
    employee: &EmployeeSnapshot,
    config: &CountryConfig,
) -> EngineResult<CalculationResult> {
    let gross = calculate_gross_pay(employee, config)?;
    ensure_balanced(
        "gross_pay",
        gross.base_pay + gross.overtime_pay + gross.bonuses + gross.allowances_total(),
        gross.gross_pay,
    )?;

    let deductions = calculate_deductions(employee, gross.gross_pay, config)?;
    let net_pay = checked_add("net_pay", gross.gross_pay, -deductions.total_deductions)?;
    ensure_balanced(
        "net_pay",
        gross.gross_pay - deductions.income_tax - deductions.total_pre_tax - deductions.total_post_tax,
        net_pay,
    )?;

    let employer = calculate_employer_costs(employee, gross.gross_pay, config)?;

    debug!(
        employee_id = %employee.employee_id,
        country = %config.country(),
        gross_pay = %gross.gross_pay,
        total_deductions = %deductions.total_deductions,
        net_pay = %net_pay,
        total_employer_cost = %employer.total_employer_cost,
        "Payroll calculated"
    );

    let named_deductions = NamedDeductions::from_breakdowns(
        &deductions.pre_tax_breakdown,
        &deductions.post_tax_breakdown,
    );

    Ok(CalculationResult {
        employee_id: employee.employee_id.clone(),
        country: config.country().to_string(),
        gross_pay: gross.gross_pay,
        base_pay: gross.base_pay,
        overtime_pay: gross.overtime_pay,
        bonuses: gross.bonuses,
        allowances_breakdown: gross.allowances_breakdown,
        tax_exempt_amount: deductions.tax_exempt_amount,
        tax_exemptions_applied: deductions.tax_exemptions_applied,
        taxable_income: deductions.taxable_income,
        income_tax: deductions.income_tax,
        tax_bracket_details: deductions.tax_bracket_details,
        pre_tax_breakdown: deductions.pre_tax_breakdown,
        post_tax_breakdown: deductions.post_tax_breakdown,
        total_pre_tax: deductions.total_pre_tax,
        total_post_tax: deductions.total_post_tax,
        total_deductions: deductions.total_deductions,
        net_pay,
        named_deductions,
        employer_cost_breakdown: employer.breakdown,
        total_employer_cost: employer.total_employer_cost,
    })
}

/// Resolves the employee's country rule set and runs the calculation.
///
/// # Errors
///
/// Returns `CountryConfigNotFound` when no rule set exists for
/// `employee.country`, or any error from the calculation itself.
pub fn calculate_for_country(
    employee: &EmployeeSnapshot,
    configs: &ConfigLoader,
) -> EngineResult<CalculationResult> {
    let config = configs.get_country(&employee.country)?;
    calculate_payroll(employee, config)
}
