//! Performance benchmarks for the payroll engine.
//!
//! Measures the calculation core on its own and the full HTTP round trip:
//! - Single calculation against a loaded rule set
//! - Single request through the router
//! - Batches of 100 and 1000 requests across countries
//!
//! Run with: `cargo bench`
//! HTML reports are generated in `target/criterion/`

use criterion::{BenchmarkId, Criterion, Throughput, black_box, criterion_group, criterion_main};
use rust_decimal::Decimal;

use payroll_engine::api::{AppState, create_router};
use payroll_engine::calculation::calculate_for_country;
use payroll_engine::config::ConfigLoader;
use payroll_engine::models::{EmployeeSnapshot, OptIn};

use axum::{body::Body, http::Request};
use tower::ServiceExt;

const COUNTRIES: [&str; 3] = ["Spain", "Canada", "Ireland"];

fn load_config() -> ConfigLoader {
    ConfigLoader::load("./config/countries").expect("Failed to load config")
}

/// Creates a request body for a salaried employee with a pension opt-in.
fn create_request_body(index: usize) -> String {
    let country = COUNTRIES[index % COUNTRIES.len()];
    let pension = match country {
        "Spain" => "private_pension",
        "Canada" => "rrsp",
        _ => "pension",
    };
    let mut opt_ins = serde_json::Map::new();
    opt_ins.insert(pension.to_string(), serde_json::Value::Bool(true));
    let request_json = serde_json::json!({
        "employee": {
            "tenant_id": "bench",
            "employee_id": format!("emp_bench_{:04}", index),
            "country": country,
            "base_pay": 2500 + (index % 40) * 100,
            "bonuses": if index % 5 == 0 { 500 } else { 0 },
            "benefits_opt_in": opt_ins
        }
    });
    request_json.to_string()
}

fn post(body: String) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri("/calculate")
        .header("Content-Type", "application/json")
        .body(Body::from(body))
        .unwrap()
}

/// Benchmark: calculation core without HTTP.
fn bench_core_calculation(c: &mut Criterion) {
    let config = load_config();
    let mut employee = EmployeeSnapshot {
        tenant_id: "bench".to_string(),
        employee_id: "emp_bench_core".to_string(),
        country: "Spain".to_string(),
        base_pay: Decimal::from(3000),
        ..Default::default()
    };
    employee
        .allowances
        .insert("meal".to_string(), Decimal::from(100));
    employee
        .benefit_opt_ins
        .insert("private_pension".to_string(), OptIn::Default);

    c.bench_function("core_calculation", |b| {
        b.iter(|| black_box(calculate_for_country(black_box(&employee), &config)))
    });
}

/// Benchmark: single request through the router.
fn bench_single_request(c: &mut Criterion) {
    let rt = tokio::runtime::Runtime::new().unwrap();
    let router = create_router(AppState::new(load_config()));
    let body = create_request_body(0);

    c.bench_function("single_request", |b| {
        b.to_async(&rt).iter(|| async {
            let response = router.clone().oneshot(post(body.clone())).await.unwrap();
            black_box(response)
        })
    });
}

/// Benchmark: batches of requests across all countries.
fn bench_batches(c: &mut Criterion) {
    let rt = tokio::runtime::Runtime::new().unwrap();
    let state = AppState::new(load_config());

    let mut group = c.benchmark_group("batch_processing");
    group.sample_size(10);

    for batch_size in [100usize, 1000].iter() {
        let requests: Vec<String> = (0..*batch_size).map(create_request_body).collect();

        group.throughput(Throughput::Elements(*batch_size as u64));
        group.bench_with_input(
            BenchmarkId::new("requests", batch_size),
            batch_size,
            |b, _| {
                b.to_async(&rt).iter(|| async {
                    let mut results = Vec::with_capacity(requests.len());
                    for body in &requests {
                        let router = create_router(state.clone());
                        let response = router.oneshot(post(body.clone())).await.unwrap();
                        results.push(response);
                    }
                    black_box(results)
                })
            },
        );
    }

    group.finish();
}

criterion_group!(
    benches,
    bench_core_calculation,
    bench_single_request,
    bench_batches,
);
criterion_main!(benches);
