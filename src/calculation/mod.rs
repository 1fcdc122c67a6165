//! Calculation logic for the payroll engine.
//!
//! This module contains the gross-to-net pipeline: gross pay derivation,
//! contribution rule resolution (proration and caps), progressive income tax,
//! employee-side deductions, employer costs, and the orchestrator that
//! assembles them into a single result with its integrity checks.

mod contribution;
mod deductions;
mod employer_costs;
mod gross_pay;
mod income_tax;
mod integrity;
mod orchestrator;

pub use contribution::{
    MONEY_DECIMAL_PLACES, apply_caps, base_period_amount, prorate_annual, resolve_rule_amount,
    round_money,
};
pub use deductions::{DeductionResult, calculate_deductions, effective_benefit_rule};
pub use employer_costs::{EmployerCostResult, calculate_employer_costs};
pub use gross_pay::{GrossPayResult, calculate_gross_pay};
pub use income_tax::{IncomeTaxResult, calculate_income_tax};
pub use integrity::ensure_balanced;
pub use orchestrator::{calculate_for_country, calculate_payroll};
