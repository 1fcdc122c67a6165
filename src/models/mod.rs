//! Core data models for the payroll engine.
//!
//! This module contains the per-calculation input snapshot and the result
//! record handed back to callers.

mod calculation_result;
mod employee;

pub use calculation_result::{CalculationResult, NamedDeductions, TaxBracketDetail};
pub use employee::{BenefitOverride, EmployeeMasterRecord, EmployeeSnapshot, OptIn};
