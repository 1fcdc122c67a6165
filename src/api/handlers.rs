//! HTTP request handlers for the payroll engine API.
//!
//! This module contains the handler functions for all API endpoints.

use std::time::Instant;

use axum::{
    Json, Router,
    extract::{State, rejection::JsonRejection},
    http::{StatusCode, header},
    response::{IntoResponse, Response},
    routing::post,
};
use tracing::{info, warn};
use uuid::Uuid;

use crate::calculation::calculate_for_country;

use super::request::CalculationRequest;
use super::response::{ApiError, ApiErrorResponse, CalculationResponse};
use super::state::AppState;

/// Creates the API router with all endpoints.
pub fn create_router(state: AppState) -> Router {
    Router::new()
        .route("/calculate", post(calculate_handler))
        .with_state(state)
}

/// Handler for POST /calculate endpoint.
///
/// Accepts an employee's pay inputs and returns the gross-to-net result.
async fn calculate_handler(
    State(state): State<AppState>,
    payload: Result<Json<CalculationRequest>, JsonRejection>,
) -> Response {
    let correlation_id = Uuid::new_v4();
    info!(correlation_id = %correlation_id, "Processing calculation request");

    let request = match payload {
        Ok(Json(req)) => req,
        Err(rejection) => {
            let error = match rejection {
                JsonRejection::JsonDataError(err) => {
                    let body_text = err.body_text();
                    warn!(
                        correlation_id = %correlation_id,
                        error = %body_text,
                        "JSON data error"
                    );
                    if body_text.contains("missing field") {
                        ApiError::new("VALIDATION_ERROR", body_text)
                    } else {
                        ApiError::malformed_json(body_text)
                    }
                }
                JsonRejection::JsonSyntaxError(err) => {
                    warn!(
                        correlation_id = %correlation_id,
                        error = %err,
                        "JSON syntax error"
                    );
                    ApiError::malformed_json(format!("Invalid JSON syntax: {}", err))
                }
                JsonRejection::MissingJsonContentType(_) => {
                    ApiError::new("MISSING_CONTENT_TYPE", "Content-Type must be application/json")
                }
                _ => ApiError::malformed_json("Failed to parse request body"),
            };
            return json_response(StatusCode::BAD_REQUEST, error);
        }
    };

    let employee = request.employee;
    let master = state.master_record(&employee.tenant_id, &employee.employee_id);
    let snapshot = match employee.into_snapshot(master) {
        Ok(snapshot) => snapshot,
        Err(err) => {
            warn!(correlation_id = %correlation_id, error = %err, "Invalid employee");
            return error_response(err.into());
        }
    };

    let start_time = Instant::now();
    match calculate_for_country(&snapshot, state.config()) {
        Ok(result) => {
            info!(
                correlation_id = %correlation_id,
                employee_id = %snapshot.employee_id,
                country = %snapshot.country,
                gross_pay = %result.gross_pay,
                net_pay = %result.net_pay,
                duration_us = start_time.elapsed().as_micros(),
                "Calculation completed successfully"
            );
            json_response(StatusCode::OK, CalculationResponse::new(result))
        }
        Err(err) => {
            warn!(
                correlation_id = %correlation_id,
                country = %snapshot.country,
                error = %err,
                "Calculation failed"
            );
            error_response(err.into())
        }
    }
}

fn json_response<T: serde::Serialize>(status: StatusCode, body: T) -> Response {
    (
        status,
        [(header::CONTENT_TYPE, "application/json")],
        Json(body),
    )
        .into_response()
}

fn error_response(api_error: ApiErrorResponse) -> Response {
    json_response(api_error.status, api_error.error)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ConfigLoader;
    use crate::models::EmployeeMasterRecord;
    use axum::body::Body;
    use axum::http::Request;
    use rust_decimal::Decimal;
    use std::collections::HashMap;
    use std::str::FromStr;
    use tower::ServiceExt;

    fn dec(s: &str) -> Decimal {
        Decimal::from_str(s).unwrap()
    }

    fn create_test_state() -> AppState {
        let config = ConfigLoader::load("./config/countries").expect("Failed to load config");
        AppState::new(config)
    }

    async fn post_calculate(state: AppState, body: String) -> (StatusCode, serde_json::Value) {
        let response = create_router(state)
            .oneshot(
                Request::builder()
                    .method("POST")
                    .uri("/calculate")
                    .header("Content-Type", "application/json")
                    .body(Body::from(body))
                    .unwrap(),
            )
            .await
            .unwrap();

        let status = response.status();
        let body = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        (status, serde_json::from_slice(&body).unwrap())
    }

    #[tokio::test]
    async fn test_valid_request_returns_200() {
        let body = r#"{
            "employee": {
                "tenant_id": "1",
                "employee_id": "emp_001",
                "country": "Spain",
                "base_pay": 3000
            }
        }"#;

        let (status, json) = post_calculate(create_test_state(), body.to_string()).await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(json["employee_id"], "emp_001");
        assert_eq!(json["country"], "Spain");
        assert!(json.get("calculation_id").is_some());
        assert!(json.get("calculated_at").is_some());
    }

    #[tokio::test]
    async fn test_malformed_json_returns_400() {
        let (status, json) =
            post_calculate(create_test_state(), "{invalid json".to_string()).await;

        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(json["code"], "MALFORMED_JSON");
    }

    #[tokio::test]
    async fn test_missing_employee_id_returns_400() {
        let body = r#"{ "employee": { "tenant_id": "1", "country": "Spain" } }"#;

        let (status, json) = post_calculate(create_test_state(), body.to_string()).await;

        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(json["code"], "VALIDATION_ERROR");
    }

    #[tokio::test]
    async fn test_missing_country_returns_400() {
        let body = r#"{ "employee": { "tenant_id": "1", "employee_id": "emp_001" } }"#;

        let (status, json) = post_calculate(create_test_state(), body.to_string()).await;

        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(json["code"], "INVALID_EMPLOYEE");
    }

    #[tokio::test]
    async fn test_unknown_country_returns_400() {
        let body = r#"{
            "employee": { "tenant_id": "1", "employee_id": "emp_001", "country": "Atlantis" }
        }"#;

        let (status, json) = post_calculate(create_test_state(), body.to_string()).await;

        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(json["code"], "COUNTRY_NOT_FOUND");
    }

    #[tokio::test]
    async fn test_master_record_supplies_country_and_rate() {
        let mut directory = HashMap::new();
        directory.insert(
            ("1".to_string(), "emp_042".to_string()),
            EmployeeMasterRecord {
                country: Some("Ireland".to_string()),
                base_pay: None,
                hourly_rate: Some(dec("25")),
            },
        );
        let state = create_test_state().with_employee_directory(directory);
        let body = r#"{
            "employee": {
                "tenant_id": "1",
                "employee_id": "emp_042",
                "country": "Spain",
                "hours_worked": 160
            }
        }"#;

        let (status, json) = post_calculate(state, body.to_string()).await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(json["country"], "Ireland");
        let gross = Decimal::from_str(json["gross_pay"].as_str().unwrap()).unwrap();
        assert_eq!(gross, dec("4000"));
    }
}
