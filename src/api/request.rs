//! Request types for the payroll engine API.
//!
//! This module defines the JSON request structures for the `/calculate`
//! endpoint and their conversion into an [`EmployeeSnapshot`], which is where
//! all input defaulting and validation happens.

use rust_decimal::Decimal;
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;
use std::str::FromStr;

use crate::error::{EngineError, EngineResult};
use crate::models::{EmployeeMasterRecord, EmployeeSnapshot, OptIn};

/// Request body for the `/calculate` endpoint.
///
/// Unknown top-level fields (such as company metadata used for payslip
/// rendering) are ignored.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CalculationRequest {
    /// The employee's pay inputs for the period.
    pub employee: EmployeeRequest,
}

/// Employee pay inputs in a calculation request.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct EmployeeRequest {
    /// Tenant identifier; strings and numbers are accepted.
    #[serde(deserialize_with = "string_or_number")]
    pub tenant_id: String,
    /// Employee identifier; strings and numbers are accepted.
    #[serde(deserialize_with = "string_or_number")]
    pub employee_id: String,
    /// Country key; master data takes precedence when present.
    #[serde(default)]
    pub country: Option<String>,
    /// Per-period base pay.
    #[serde(default)]
    pub base_pay: Option<Decimal>,
    /// Hourly rate.
    #[serde(default)]
    pub hourly_rate: Option<Decimal>,
    /// Ordinary hours worked.
    #[serde(default)]
    pub hours_worked: Option<Decimal>,
    /// Overtime hours worked.
    #[serde(default)]
    pub overtime_hours: Option<Decimal>,
    /// Bonuses for the period.
    #[serde(default)]
    pub bonuses: Option<Decimal>,
    /// Named allowances; non-numeric values are dropped.
    #[serde(default)]
    pub allowances: BTreeMap<String, Value>,
    /// Benefit elections: `true`/`false` or an override object.
    #[serde(default)]
    pub benefits_opt_in: BTreeMap<String, OptIn>,
}

impl EmployeeRequest {
    /// Builds the calculation snapshot, filling gaps from master data.
    ///
    /// The country comes from the master record when it has one, otherwise from
    /// the request. The hourly rate and base pay come from the request when
    /// supplied and fall back to the master record. Every other missing number
    /// defaults to zero.
    ///
    /// # Errors
    ///
    /// Returns `InvalidEmployee` if no country can be resolved.
    pub fn into_snapshot(
        self,
        master: Option<&EmployeeMasterRecord>,
    ) -> EngineResult<EmployeeSnapshot> {
        let master_country = master
            .and_then(|m| m.country.as_deref())
            .map(str::trim)
            .filter(|c| !c.is_empty());
        let request_country = self.country.as_deref().map(str::trim).filter(|c| !c.is_empty());

        let country = master_country
            .or(request_country)
            .ok_or_else(|| EngineError::InvalidEmployee {
                field: "country".to_string(),
                message: "Country is required".to_string(),
            })?
            .to_string();

        let hourly_rate = self
            .hourly_rate
            .or_else(|| master.and_then(|m| m.hourly_rate))
            .unwrap_or_default();
        let base_pay = self
            .base_pay
            .or_else(|| master.and_then(|m| m.base_pay))
            .unwrap_or_default();

        let allowances = self
            .allowances
            .iter()
            .filter_map(|(name, value)| parse_amount(value).map(|amount| (name.clone(), amount)))
            .collect();

        Ok(EmployeeSnapshot {
            tenant_id: self.tenant_id,
            employee_id: self.employee_id,
            country,
            base_pay,
            hourly_rate,
            hours_worked: self.hours_worked.unwrap_or_default(),
            overtime_hours: self.overtime_hours.unwrap_or_default(),
            bonuses: self.bonuses.unwrap_or_default(),
            allowances,
            benefit_opt_ins: self.benefits_opt_in,
        })
    }
}

/// Parses a JSON number or numeric string into a Decimal.
fn parse_amount(value: &Value) -> Option<Decimal> {
    let text = match value {
        Value::Number(n) => n.to_string(),
        Value::String(s) => s.trim().to_string(),
        _ => return None,
    };
    Decimal::from_str(&text)
        .or_else(|_| Decimal::from_scientific(&text))
        .ok()
}

fn string_or_number<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    match Value::deserialize(deserializer)? {
        Value::String(s) => Ok(s),
        Value::Number(n) => Ok(n.to_string()),
        other => Err(serde::de::Error::custom(format!(
            "expected a string or number, found {}",
            other
        ))),
    }
}
