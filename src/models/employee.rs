//! Employee snapshot and benefit opt-in types.
//!
//! An [`EmployeeSnapshot`] is the fully-typed input to one calculation. Every
//! numeric field is defaulted to zero when it is built, so the calculators never
//! have to check for missing values.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Employee-supplied overrides for a single optional benefit.
///
/// Any field that is present wins over the country default; absent fields fall
/// back to the configured value.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct BenefitOverride {
    /// Flat amount replacing the configured employee share.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub amount: Option<Decimal>,
    /// Rate replacing the configured employee share.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rate: Option<Decimal>,
    /// Reclassifies the deduction as pre-tax or post-tax.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pre_tax: Option<bool>,
}

/// An employee's election for one optional benefit or opt-in deduction.
///
/// On the wire this is `true`/`false`, `null`, or an override object. An empty
/// override object counts as not opted in.
///
/// # Example
///
/// ```
/// use payroll_engine::models::OptIn;
///
/// let flag: OptIn = serde_json::from_str("true").unwrap();
/// assert_eq!(flag, OptIn::Default);
///
/// let declined: OptIn = serde_json::from_str("false").unwrap();
/// assert!(!declined.is_opted_in());
///
/// let custom: OptIn = serde_json::from_str(r#"{"amount": "200", "pre_tax": true}"#).unwrap();
/// assert!(custom.is_opted_in());
/// ```
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "OptInValue", into = "OptInValue")]
pub enum OptIn {
    /// The employee did not opt in.
    #[default]
    NotOptedIn,
    /// Opted in using the country defaults.
    Default,
    /// Opted in with employee-specific overrides.
    Override(BenefitOverride),
}

impl OptIn {
    /// Returns true for any form of opt-in.
    pub fn is_opted_in(&self) -> bool {
        !matches!(self, OptIn::NotOptedIn)
    }

    /// Returns the overrides, if the employee supplied any.
    pub fn overrides(&self) -> Option<&BenefitOverride> {
        match self {
            OptIn::Override(overrides) => Some(overrides),
            _ => None,
        }
    }
}

/// Wire shape of an opt-in value.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
#[serde(untagged)]
enum OptInValue {
    Null,
    Flag(bool),
    Override(BenefitOverride),
}

impl From<OptInValue> for OptIn {
    fn from(value: OptInValue) -> Self {
        match value {
            OptInValue::Null | OptInValue::Flag(false) => OptIn::NotOptedIn,
            OptInValue::Flag(true) => OptIn::Default,
            OptInValue::Override(overrides) if overrides == BenefitOverride::default() => {
                OptIn::NotOptedIn
            }
            OptInValue::Override(overrides) => OptIn::Override(overrides),
        }
    }
}

impl From<OptIn> for OptInValue {
    fn from(value: OptIn) -> Self {
        match value {
            OptIn::NotOptedIn => OptInValue::Flag(false),
            OptIn::Default => OptInValue::Flag(true),
            OptIn::Override(overrides) => OptInValue::Override(overrides),
        }
    }
}

/// Reference master data for an employee, used to fill gaps in a request.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct EmployeeMasterRecord {
    /// The employee's country of record; wins over the request when set.
    #[serde(default)]
    pub country: Option<String>,
    /// Fallback per-period base pay.
    #[serde(default)]
    pub base_pay: Option<Decimal>,
    /// Fallback hourly rate.
    #[serde(default)]
    pub hourly_rate: Option<Decimal>,
}

/// The typed input for one gross-to-net calculation.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct EmployeeSnapshot {
    /// Tenant the employee belongs to.
    pub tenant_id: String,
    /// Unique identifier for the employee.
    pub employee_id: String,
    /// Country key used to resolve the rule set.
    pub country: String,
    /// Per-period base pay; authoritative when greater than zero.
    pub base_pay: Decimal,
    /// Hourly rate for derived base pay and overtime.
    pub hourly_rate: Decimal,
    /// Ordinary hours worked in the period.
    pub hours_worked: Decimal,
    /// Overtime hours worked in the period.
    pub overtime_hours: Decimal,
    /// Bonuses paid in the period.
    pub bonuses: Decimal,
    /// Named allowances; only positive entries are applied.
    #[serde(default)]
    pub allowances: BTreeMap<String, Decimal>,
    /// Benefit and opt-in deduction elections.
    #[serde(default)]
    pub benefit_opt_ins: BTreeMap<String, OptIn>,
}

impl EmployeeSnapshot {
    /// Returns the employee's election for `name`, `NotOptedIn` when absent.
    ///
    /// # Examples
    ///
    /// ```
    /// use payroll_engine::models::{EmployeeSnapshot, OptIn};
    ///
    /// let mut employee = EmployeeSnapshot::default();
    /// employee.benefit_opt_ins.insert("gym".to_string(), OptIn::Default);
    ///
    /// assert!(employee.is_opted_in("gym"));
    /// assert_eq!(employee.opt_in("dental"), &OptIn::NotOptedIn);
    /// ```
    pub fn opt_in(&self, name: &str) -> &OptIn {
        self.benefit_opt_ins
            .get(name)
            .unwrap_or(&OptIn::NotOptedIn)
    }

    /// Returns true if the employee opted into `name` in any form.
    pub fn is_opted_in(&self, name: &str) -> bool {
        self.opt_in(name).is_opted_in()
    }
}
