//! HTTP API module for the payroll engine.
//!
//! A thin adapter over the calculation core: it parses the request, resolves
//! master data, runs the calculation for the employee's country and serializes
//! the result.

mod handlers;
mod request;
mod response;
mod state;

pub use handlers::create_router;
pub use request::{CalculationRequest, EmployeeRequest};
pub use response::{ApiError, ApiErrorResponse, CalculationResponse, ENGINE_VERSION};
pub use state::AppState;
