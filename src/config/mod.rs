//! Country rule sets for the payroll engine.
//!
//! This module provides functionality to load per-country rule sets from YAML
//! files: tax brackets, statutory employee and employer contributions,
//! allowance exemptions and the optional-benefit catalog.
//!
//! # Example
//!
//! ```no_run
//! use payroll_engine::config::ConfigLoader;
//!
//! let loader = ConfigLoader::load("./config/countries").unwrap();
//! for country in loader.countries() {
//!     println!("Loaded rule set: {}", country);
//! }
//! ```

mod loader;
mod types;

pub use loader::ConfigLoader;
pub use types::{
    AllowanceRule, Basis, BenefitEntry, BracketEntry, Caps, ContributionRule, CountryConfig,
    CountryConfigFile, EmployeeDeduction, EmployerContribution, OptionalBenefit, RuleAmount,
    RuleEntry, StatutorySection, TaxBracket, TaxTreatment,
};
