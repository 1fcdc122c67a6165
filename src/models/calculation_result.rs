//! Calculation result models for the payroll engine.
//!
//! This module contains the [`CalculationResult`] type and its associated
//! structures that capture every output of a gross-to-net calculation.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// The tax charged inside one income tax bracket.
///
/// # Example
///
/// ```
/// use payroll_engine::models::TaxBracketDetail;
/// use rust_decimal::Decimal;
///
/// let detail = TaxBracketDetail {
///     up_to: None,
///     rate: Decimal::new(2, 1),
///     amount: Decimal::new(10000, 2),
/// };
/// assert!(detail.up_to.is_none());
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TaxBracketDetail {
    /// Upper bound of the bracket; `None` is the unbounded top bracket.
    pub up_to: Option<Decimal>,
    /// The bracket's marginal rate.
    pub rate: Decimal,
    /// Tax charged in this bracket, rounded to 2 decimal places.
    pub amount: Decimal,
}

/// Deductions reported under fixed legacy names.
///
/// Populated by name-matching against the pre- and post-tax breakdowns; each
/// value is zero when the country has no deduction of that name.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct NamedDeductions {
    /// Deductions named `social_security`.
    pub social_security: Decimal,
    /// Deductions named `health_insurance`.
    pub health_insurance: Decimal,
    /// Deductions named `solidarity_fund`.
    pub solidarity_fund: Decimal,
}

impl NamedDeductions {
    /// Derives the legacy fields from the pre- and post-tax breakdowns.
    pub fn from_breakdowns(
        pre_tax: &BTreeMap<String, Decimal>,
        post_tax: &BTreeMap<String, Decimal>,
    ) -> Self {
        let pick = |name: &str| {
            pre_tax.get(name).copied().unwrap_or_default()
                + post_tax.get(name).copied().unwrap_or_default()
        };
        Self {
            social_security: pick("social_security"),
            health_insurance: pick("health_insurance"),
            solidarity_fund: pick("solidarity_fund"),
        }
    }
}

/// The complete result of a gross-to-net calculation.
///
/// All monetary fields are rounded to 2 decimal places and every total equals
/// the sum of its components exactly.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CalculationResult {
    /// The employee the calculation is for.
    pub employee_id: String,
    /// The country whose rule set was applied.
    pub country: String,

    /// Total earnings before deductions.
    pub gross_pay: Decimal,
    /// Base pay for the period.
    pub base_pay: Decimal,
    /// Overtime pay for the period.
    pub overtime_pay: Decimal,
    /// Bonuses for the period.
    pub bonuses: Decimal,
    /// Applied allowances by name.
    pub allowances_breakdown: BTreeMap<String, Decimal>,

    /// Total of tax-exempt allowances.
    pub tax_exempt_amount: Decimal,
    /// Tax-exempt allowances by name.
    pub tax_exemptions_applied: BTreeMap<String, Decimal>,
    /// Income subject to progressive tax.
    pub taxable_income: Decimal,
    /// Progressive income tax.
    pub income_tax: Decimal,
    /// Per-bracket tax, in bracket order.
    pub tax_bracket_details: Vec<TaxBracketDetail>,

    /// Deductions taken before tax, by name.
    pub pre_tax_breakdown: BTreeMap<String, Decimal>,
    /// Deductions taken after tax, by name.
    pub post_tax_breakdown: BTreeMap<String, Decimal>,
    /// Sum of the pre-tax breakdown.
    pub total_pre_tax: Decimal,
    /// Sum of the post-tax breakdown.
    pub total_post_tax: Decimal,
    /// Income tax plus all pre- and post-tax deductions.
    pub total_deductions: Decimal,
    /// Gross pay minus total deductions.
    pub net_pay: Decimal,
    /// Legacy named deduction fields.
    pub named_deductions: NamedDeductions,

    /// Employer contributions by label.
    pub employer_cost_breakdown: BTreeMap<String, Decimal>,
    /// Sum of the employer breakdown.
    pub total_employer_cost: Decimal,
}
