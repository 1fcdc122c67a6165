//! Application state for the payroll engine API.
//!
//! This module defines the shared application state that is available
//! to all request handlers.

use std::collections::HashMap;
use std::sync::Arc;

use crate::config::ConfigLoader;
use crate::models::EmployeeMasterRecord;

/// Shared application state.
///
/// Holds the loaded country rule sets and an optional read-only directory of
/// employee master records used to fill gaps in incoming requests.
#[derive(Clone)]
pub struct AppState {
    /// The loaded country rule sets.
    config: Arc<ConfigLoader>,
    /// Master records keyed by (tenant_id, employee_id).
    employees: Arc<HashMap<(String, String), EmployeeMasterRecord>>,
}

impl AppState {
    /// Creates a new application state with the given configuration loader.
    pub fn new(config: ConfigLoader) -> Self {
        Self {
            config: Arc::new(config),
            employees: Arc::new(HashMap::new()),
        }
    }

    /// Attaches a directory of employee master records.
    pub fn with_employee_directory(
        mut self,
        employees: HashMap<(String, String), EmployeeMasterRecord>,
    ) -> Self {
        self.employees = Arc::new(employees);
        self
    }

    /// Returns a reference to the configuration loader.
    pub fn config(&self) -> &ConfigLoader {
        &self.config
    }

    /// Looks up the master record for an employee, if one is known.
    pub fn master_record(
        &self,
        tenant_id: &str,
        employee_id: &str,
    ) -> Option<&EmployeeMasterRecord> {
        self.employees
            .get(&(tenant_id.to_string(), employee_id.to_string()))
    }
}
