//! Employer cost calculation.
//!
//! Employer contributions are computed from gross pay, the country rule set and
//! the employee's opt-ins only. They never affect net pay.

use rust_decimal::Decimal;
use std::collections::BTreeMap;
use tracing::debug;

use crate::config::{CountryConfig, EmployerContribution};
use crate::error::EngineResult;
use crate::models::EmployeeSnapshot;

use super::contribution::{checked_add, resolve_rule_amount, round_money};
use super::integrity::ensure_balanced;

/// The result of the employer cost calculation.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EmployerCostResult {
    /// Sum of the breakdown.
    pub total_employer_cost: Decimal,
    /// Contributions by label; colliding labels are summed.
    pub breakdown: BTreeMap<String, Decimal>,
}

/// Calculates employer-side statutory contributions and benefit matches.
///
/// Statutory contributions always apply. A benefit's employer match applies
/// only when the employee opted into that benefit, and is computed from the
/// benefit's `employer_*` settings regardless of any employee override.
///
/// # Errors
///
/// Returns `InvalidEmployee` if a contribution does not fit in a `Decimal`.
///
/// # Examples
///
/// ```
/// use payroll_engine::calculation::calculate_employer_costs;
/// use payroll_engine::config::CountryConfig;
/// use payroll_engine::models::EmployeeSnapshot;
/// use rust_decimal::Decimal;
///
/// let config = CountryConfig::from_yaml_str(
///     "country: Testland\nstatutory:\n  employer_contributions:\n    - { name: pension, rate: 0.1 }\n",
/// )?;
/// let result = calculate_employer_costs(&EmployeeSnapshot::default(), Decimal::from(2000), &config)?;
/// assert_eq!(result.total_employer_cost, Decimal::from(200));
/// # Ok::<(), payroll_engine::error::EngineError>(())
/// ```
pub fn calculate_employer_costs(
    employee: &EmployeeSnapshot,
    gross_pay: Decimal,
    config: &CountryConfig,
) -> EngineResult<EmployerCostResult> {
    let periods_per_year = config.periods_per_year();
    let mut breakdown: BTreeMap<String, Decimal> = BTreeMap::new();
    let mut total_employer_cost = Decimal::ZERO;

    let mut record = |contribution: &EmployerContribution| -> EngineResult<()> {
        let amount = round_money(resolve_rule_amount(
            &contribution.rule,
            gross_pay,
            periods_per_year,
        )?);
        if amount > Decimal::ZERO {
            let entry = breakdown
                .entry(contribution.label.clone())
                .or_insert(Decimal::ZERO);
            *entry = checked_add(&contribution.label, *entry, amount)?;
            total_employer_cost =
                checked_add("total_employer_cost", total_employer_cost, amount)?;
        }
        Ok(())
    };

    // 1) Statutory employer contributions
    for contribution in config.employer_contributions() {
        record(contribution)?;
    }

    // 2) Employer match on opted-in benefits
    for (name, benefit) in config.optional_benefits() {
        if !employee.is_opted_in(name) {
            continue;
        }
        if let Some(contribution) = &benefit.employer {
            record(contribution)?;
        }
    }

    ensure_balanced(
        "total_employer_cost",
        breakdown.values().copied().sum(),
        total_employer_cost,
    )?;

    debug!(
        employee_id = %employee.employee_id,
        total_employer_cost = %total_employer_cost,
        contributions = breakdown.len(),
        "Employer costs calculated"
    );

    Ok(EmployerCostResult {
        total_employer_cost,
        breakdown,
    })
}
