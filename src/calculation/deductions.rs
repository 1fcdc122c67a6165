//! Employee-side deduction calculation.
//!
//! This module resolves allowance exemptions, statutory and opt-in deductions,
//! optional benefits and progressive income tax for one employee. The order is
//! fixed: the tax base is settled by exemptions and statutory and other
//! deductions alone, and optional benefits are applied after the tax.

use rust_decimal::Decimal;
use std::collections::BTreeMap;
use tracing::debug;

use crate::config::{
    Caps, ContributionRule, CountryConfig, EmployeeDeduction, OptionalBenefit, RuleAmount,
    TaxTreatment,
};
use crate::error::EngineResult;
use crate::models::{EmployeeSnapshot, OptIn, TaxBracketDetail};

use super::contribution::{checked_add, checked_sum, resolve_rule_amount, round_money};
use super::income_tax::calculate_income_tax;
use super::integrity::ensure_balanced;

/// The result of the employee-side deduction calculation.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DeductionResult {
    /// Total of tax-exempt allowances.
    pub tax_exempt_amount: Decimal,
    /// Tax-exempt allowances by name.
    pub tax_exemptions_applied: BTreeMap<String, Decimal>,
    /// Income subject to progressive tax.
    pub taxable_income: Decimal,
    /// Progressive income tax.
    pub income_tax: Decimal,
    /// Per-bracket tax details.
    pub tax_bracket_details: Vec<TaxBracketDetail>,
    /// Pre-tax deductions by name.
    pub pre_tax_breakdown: BTreeMap<String, Decimal>,
    /// Post-tax deductions by name.
    pub post_tax_breakdown: BTreeMap<String, Decimal>,
    /// Sum of the pre-tax breakdown.
    pub total_pre_tax: Decimal,
    /// Sum of the post-tax breakdown.
    pub total_post_tax: Decimal,
    /// Income tax plus pre- and post-tax deductions.
    pub total_deductions: Decimal,
}

/// Accumulates pre- and post-tax deductions into their buckets.
#[derive(Debug, Default)]
struct DeductionBuckets {
    pre_tax: BTreeMap<String, Decimal>,
    post_tax: BTreeMap<String, Decimal>,
    total_pre_tax: Decimal,
    total_post_tax: Decimal,
}

impl DeductionBuckets {
    /// Rounds and records a deduction; non-positive amounts are skipped.
    fn add(&mut self, name: &str, amount: Decimal, pre_tax: bool) -> EngineResult<()> {
        let amount = round_money(amount);
        if amount <= Decimal::ZERO {
            return Ok(());
        }

        let (bucket, total, total_name) = if pre_tax {
            (&mut self.pre_tax, &mut self.total_pre_tax, "total_pre_tax")
        } else {
            (&mut self.post_tax, &mut self.total_post_tax, "total_post_tax")
        };
        *total = checked_add(total_name, *total, amount)?;
        let entry = bucket.entry(name.to_string()).or_insert(Decimal::ZERO);
        *entry = checked_add(name, *entry, amount)?;
        Ok(())
    }
}

/// Calculates all employee-side deductions and income tax.
///
/// # Steps
///
/// 1. Allowances whose rule is `exempt` are excluded from taxable income.
/// 2. Statutory employee contributions are always applied.
/// 3. Other employee deductions apply unless marked optional, in which case the
///    employee must have opted in by name.
/// 4. Taxable income is gross minus exemptions minus the pre-tax deductions of
///    steps 2 and 3, floored at zero.
/// 5. Progressive income tax is applied to taxable income.
/// 6. Optional benefits apply only to opted-in employees; overrides in the
///    opt-in replace the configured amount, rate or pre-tax flag. A pre-tax
///    benefit lands in the pre-tax bucket but does not change the tax.
///
/// # Errors
///
/// Returns `InvalidEmployee` if an amount does not fit in a `Decimal`, and
/// `IntegrityViolation` if the totals do not reconcile with the breakdowns;
/// the latter indicates a defect, never bad input.
pub fn calculate_deductions(
    employee: &EmployeeSnapshot,
    gross_pay: Decimal,
    config: &CountryConfig,
) -> EngineResult<DeductionResult> {
    let periods_per_year = config.periods_per_year();

    // 1) Allowance exemptions
    let mut tax_exemptions_applied = BTreeMap::new();
    let mut tax_exempt_amount = Decimal::ZERO;
    for (name, amount) in &employee.allowances {
        let exempt = config
            .allowance_rules()
            .get(name)
            .is_some_and(|rule| rule.tax_treatment == TaxTreatment::Exempt);
        if exempt && *amount > Decimal::ZERO {
            let amount = round_money(*amount);
            tax_exempt_amount = checked_add("tax_exempt_amount", tax_exempt_amount, amount)?;
            tax_exemptions_applied.insert(name.clone(), amount);
        }
    }

    let mut buckets = DeductionBuckets::default();

    // 2) Statutory employee contributions
    for deduction in config.employee_contributions() {
        apply_employee_deduction(&mut buckets, deduction, gross_pay, periods_per_year)?;
    }

    // 3) Other employee deductions, optional ones gated on opt-in
    for deduction in config.other_employee_deductions() {
        if deduction.optional && !employee.is_opted_in(&deduction.rule.name) {
            continue;
        }
        apply_employee_deduction(&mut buckets, deduction, gross_pay, periods_per_year)?;
    }

    // 4) Taxable income; anything below representable range floors at zero
    let statutory_pre_tax = buckets.total_pre_tax;
    let taxable_income = gross_pay
        .checked_sub(tax_exempt_amount)
        .and_then(|income| income.checked_sub(statutory_pre_tax))
        .unwrap_or(Decimal::ZERO)
        .max(Decimal::ZERO);
    let taxable_income = round_money(taxable_income);

    // 5) Progressive income tax
    let tax = calculate_income_tax(taxable_income, config.income_tax_brackets())?;

    // 6) Optional benefits
    for (name, benefit) in config.optional_benefits() {
        let opt_in = employee.opt_in(name);
        if !opt_in.is_opted_in() {
            continue;
        }
        let (rule, pre_tax) = effective_benefit_rule(benefit, opt_in);
        let amount = resolve_rule_amount(&rule, gross_pay, periods_per_year)?;
        buckets.add(name, amount, pre_tax)?;
    }

    let total_pre_tax = buckets.total_pre_tax;
    let total_post_tax = buckets.total_post_tax;
    let total_deductions = checked_sum(
        "total_deductions",
        [tax.income_tax, total_pre_tax, total_post_tax],
    )?;

    ensure_balanced(
        "total_pre_tax",
        buckets.pre_tax.values().copied().sum(),
        total_pre_tax,
    )?;
    ensure_balanced(
        "total_post_tax",
        buckets.post_tax.values().copied().sum(),
        total_post_tax,
    )?;
    ensure_balanced(
        "total_deductions",
        tax.income_tax
            + buckets.pre_tax.values().copied().sum::<Decimal>()
            + buckets.post_tax.values().copied().sum::<Decimal>(),
        total_deductions,
    )?;

    debug!(
        employee_id = %employee.employee_id,
        taxable_income = %taxable_income,
        income_tax = %tax.income_tax,
        total_pre_tax = %total_pre_tax,
        total_post_tax = %total_post_tax,
        "Deductions calculated"
    );

    Ok(DeductionResult {
        tax_exempt_amount,
        tax_exemptions_applied,
        taxable_income,
        income_tax: tax.income_tax,
        tax_bracket_details: tax.bracket_details,
        pre_tax_breakdown: buckets.pre_tax,
        post_tax_breakdown: buckets.post_tax,
        total_pre_tax,
        total_post_tax,
        total_deductions,
    })
}

fn apply_employee_deduction(
    buckets: &mut DeductionBuckets,
    deduction: &EmployeeDeduction,
    gross_pay: Decimal,
    periods_per_year: u32,
) -> EngineResult<()> {
    let amount = resolve_rule_amount(&deduction.rule, gross_pay, periods_per_year)?;
    buckets.add(&deduction.rule.name, amount, deduction.pre_tax)
}

/// Builds the employee's rule for a benefit, applying any opt-in overrides.
///
/// An override `amount` wins over an override `rate`; either replaces the
/// configured share and keeps the benefit's basis.
pub fn effective_benefit_rule(benefit: &OptionalBenefit, opt_in: &OptIn) -> (ContributionRule, bool) {
    let (amount, pre_tax) = match opt_in.overrides() {
        Some(overrides) => {
            let amount = match (overrides.amount, overrides.rate) {
                (Some(amount), _) => Some(RuleAmount::Fixed {
                    amount,
                    basis: benefit.basis,
                }),
                (None, Some(rate)) => Some(RuleAmount::Percentage {
                    rate,
                    basis: benefit.basis,
                }),
                (None, None) => benefit.amount,
            };
            (amount, overrides.pre_tax.unwrap_or(benefit.pre_tax))
        }
        None => (benefit.amount, benefit.pre_tax),
    };

    (
        ContributionRule {
            name: benefit.name.clone(),
            amount,
            caps: Caps::default(),
        },
        pre_tax,
    )
}
