//! End-to-end storefront runs against an in-process stub shop
//!
//! These tests exercise the whole stack at once: configuration, the ramp
//! scheduler, session execution over a real reqwest transport, metric
//! accumulation and threshold verdicts, with an axum stub standing in for
//! the e-commerce target.

use anyhow::Result;
use axum::{
    extract::{Path, State},
    http::StatusCode,
    routing::{get, post},
    Json, Router,
};
use serde_json::{json, Value};
use stampede_config::StampedeConfig;
use stampede_core::scenario::Scenario;
use stampede_core::stage::{RampMode, Stage};
use stampede_engine::Orchestrator;
use stampede_metrics::names;
use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::net::TcpListener;

/// Helper to suppress logging output during test execution
fn init_quiet_logging() {
    use std::sync::Once;
    static INIT: Once = Once::new();

    INIT.call_once(|| {
        let _ = tracing_subscriber::fmt()
            .with_max_level(tracing::Level::WARN)
            .with_target(false)
            .without_time()
            .try_init();
    });
}

/// Per-route hit counts plus failure switches for the stub shop
#[derive(Clone)]
struct StorefrontState {
    hits: Arc<Mutex<HashMap<String, u32>>>,
    empty_search: bool,
    fail_payments: bool,
}

impl StorefrontState {
    fn new(empty_search: bool, fail_payments: bool) -> Self {
        Self {
            hits: Arc::new(Mutex::new(HashMap::new())),
            empty_search,
            fail_payments,
        }
    }

    fn hit(&self, route: &str) {
        *self
            .hits
            .lock()
            .unwrap()
            .entry(route.to_string())
            .or_insert(0) += 1;
    }

    fn count(&self, route: &str) -> u32 {
        self.hits.lock().unwrap().get(route).copied().unwrap_or(0)
    }
}

async fn homepage(State(state): State<StorefrontState>) -> Json<Value> {
    state.hit("homepage");
    Json(json!({ "message": "welcome to the shop" }))
}

async fn login(State(state): State<StorefrontState>, Json(body): Json<Value>) -> Json<Value> {
    state.hit("login");
    Json(json!({ "token": "tok-1", "user": body["username"] }))
}

async fn search(State(state): State<StorefrontState>, Path(term): Path<String>) -> Json<Value> {
    state.hit("search");
    if state.empty_search {
        Json(json!({ "products": [] }))
    } else {
        Json(json!({
            "products": [
                { "id": "p-1001", "name": format!("{} deluxe", term) },
                { "id": "p-1002", "name": format!("{} basic", term) },
            ]
        }))
    }
}

async fn product(State(state): State<StorefrontState>, Path(id): Path<String>) -> Json<Value> {
    state.hit("product");
    Json(json!({ "id": id, "price": 19.99, "in_stock": true }))
}

async fn cart(State(state): State<StorefrontState>, Json(body): Json<Value>) -> Json<Value> {
    state.hit("cart");
    Json(json!({ "cart_id": "c-42", "items": [body["product_id"]] }))
}

async fn checkout(State(state): State<StorefrontState>, Json(body): Json<Value>) -> Json<Value> {
    state.hit("checkout");
    Json(json!({ "order_id": "o-77", "cart_id": body["cart_id"] }))
}

async fn payment(
    State(state): State<StorefrontState>,
    Json(body): Json<Value>,
) -> (StatusCode, Json<Value>) {
    state.hit("payment");
    if state.fail_payments {
        (
            StatusCode::INTERNAL_SERVER_ERROR,
            Json(json!({ "error": "payment gateway down" })),
        )
    } else {
        (
            StatusCode::OK,
            Json(json!({ "status": "paid", "order_id": body["order_id"] })),
        )
    }
}

/// Start the stub shop on an ephemeral port
async fn start_storefront(
    empty_search: bool,
    fail_payments: bool,
) -> Result<(String, StorefrontState)> {
    let state = StorefrontState::new(empty_search, fail_payments);

    let app = Router::new()
        .route("/", get(homepage))
        .route("/login", post(login))
        .route("/search/{term}", get(search))
        .route("/product/{id}", get(product))
        .route("/cart", post(cart))
        .route("/checkout", post(checkout))
        .route("/payment", post(payment))
        .with_state(state.clone());

    let listener = TcpListener::bind("127.0.0.1:0").await?;
    let addr = listener.local_addr()?;

    tokio::spawn(async move {
        if let Err(e) = axum::serve(listener, app).await {
            eprintln!("Stub storefront error: {}", e);
        }
    });

    Ok((format!("http://{}", addr), state))
}

/// A configuration tuned for sub-second test runs
fn quick_config(base_url: String) -> StampedeConfig {
    let mut config = StampedeConfig::default();
    config.target.base_url = base_url;
    config.load.stages = vec![Stage::new(Duration::from_millis(600), 3)];
    config.load.ramp = RampMode::Step;
    config.load.tick_interval = Duration::from_millis(25);
    config.load.think_time = Duration::ZERO;
    config
}

#[tokio::test]
async fn test_full_journey_passes_default_thresholds() -> Result<()> {
    init_quiet_logging();
    println!("🧪 Running the storefront journey against a healthy stub...");

    let (base_url, state) = start_storefront(false, false).await?;
    let orchestrator = Orchestrator::new(quick_config(base_url), Scenario::storefront());
    let result = orchestrator.run().await?;

    println!(
        "✅ {} sessions started, peak {} concurrent",
        result.sessions_started, result.peak_active
    );

    assert!(result.passed, "healthy stub must pass default thresholds");
    assert!(result.sessions_started >= 3, "stage target should be reached");
    assert_eq!(
        result.verdicts.len(),
        2,
        "default thresholds: error rate and p95 latency"
    );

    for route in [
        "homepage", "login", "search", "product", "cart", "checkout", "payment",
    ] {
        assert!(state.count(route) > 0, "route {} was never exercised", route);
    }

    let checks = result
        .metrics
        .rates
        .get(names::CHECKS)
        .expect("checks rate recorded");
    assert_eq!(checks.rate, 1.0, "every check should pass");

    let failed = result
        .metrics
        .rates
        .get(names::HTTP_REQ_FAILED)
        .expect("failure rate recorded");
    assert_eq!(failed.flagged, 0, "no request should have failed");

    Ok(())
}

#[tokio::test]
async fn test_payment_outage_fails_error_rate_threshold() -> Result<()> {
    init_quiet_logging();
    println!("🧪 Running the storefront journey against a broken payment gateway...");

    let (base_url, state) = start_storefront(false, true).await?;
    let orchestrator = Orchestrator::new(quick_config(base_url), Scenario::storefront());
    let result = orchestrator.run().await?;

    assert!(
        !result.passed,
        "5xx payments must trip the error-rate threshold"
    );
    assert!(state.count("payment") > 0, "payments should have been attempted");

    let verdict = result
        .verdicts
        .iter()
        .find(|v| v.threshold.metric == names::HTTP_REQ_FAILED)
        .expect("error-rate verdict present");
    assert!(!verdict.passed);
    assert!(
        verdict.observed > 0.01,
        "one failing request in seven is far above 1%, got {}",
        verdict.observed
    );

    let errors = result
        .metrics
        .counters
        .get(names::ERRORS)
        .copied()
        .unwrap_or(0);
    assert!(errors > 0, "each failed payment records an error");

    let aborted = result
        .metrics
        .counters
        .get(names::VUS_ABORTED)
        .copied()
        .unwrap_or(0);
    assert!(aborted > 0, "sessions abort on the failed check");

    Ok(())
}

#[tokio::test]
async fn test_empty_search_skips_downstream_steps() -> Result<()> {
    init_quiet_logging();
    println!("🧪 Running the storefront journey against a shop with no inventory...");

    let (base_url, state) = start_storefront(true, false).await?;
    let orchestrator = Orchestrator::new(quick_config(base_url), Scenario::storefront());
    let result = orchestrator.run().await?;

    assert!(result.passed, "skips are not failures");
    assert!(state.count("search") > 0);
    assert_eq!(
        state.count("product"),
        0,
        "no product id extracted, so no product views"
    );
    assert_eq!(state.count("cart"), 0);
    assert_eq!(state.count("checkout"), 0);
    assert_eq!(state.count("payment"), 0);

    let skipped = result
        .metrics
        .counters
        .get(names::STEPS_SKIPPED)
        .copied()
        .unwrap_or(0);
    assert!(skipped > 0, "dependent steps should be recorded as skipped");

    let errors = result
        .metrics
        .counters
        .get(names::ERRORS)
        .copied()
        .unwrap_or(0);
    assert_eq!(errors, 0, "an empty catalog is not an error");

    let completed = result
        .metrics
        .counters
        .get(names::VUS_COMPLETED)
        .copied()
        .unwrap_or(0);
    assert!(completed > 0, "sessions with skipped steps still complete");

    Ok(())
}

#[tokio::test]
async fn test_json_report_written_to_configured_path() -> Result<()> {
    init_quiet_logging();

    let dir = tempfile::tempdir()?;
    let report_path = dir.path().join("run-report.json");

    let (base_url, _state) = start_storefront(false, false).await?;
    let mut config = quick_config(base_url);
    config.output.report_json = Some(report_path.clone());

    let orchestrator = Orchestrator::new(config, Scenario::storefront());
    let result = orchestrator.run().await?;

    let raw = std::fs::read_to_string(&report_path)?;
    let parsed: Value = serde_json::from_str(&raw)?;

    assert_eq!(parsed["scenario"], "storefront");
    assert_eq!(parsed["passed"], json!(result.passed));
    assert_eq!(parsed["verdicts"].as_array().unwrap().len(), 2);
    assert!(
        parsed["metrics"]["latencies"]["http_req_duration"]["count"]
            .as_u64()
            .unwrap()
            > 0,
        "latency summary should cover the issued requests"
    );

    Ok(())
}

#[tokio::test]
async fn test_scenario_loaded_from_yaml_file() -> Result<()> {
    init_quiet_logging();

    let dir = tempfile::tempdir()?;
    let scenario_path = dir.path().join("browse.yaml");
    std::fs::write(
        &scenario_path,
        r#"
name: browse-only
steps:
  - name: homepage
    path: /
  - name: search
    path: /search/{search_term}
    extract:
      - key: product_id
        pointer: /products/0/id
  - name: product
    path: /product/{product_id}
    requires: product_id
"#,
    )?;

    let scenario = Scenario::from_yaml_file(&scenario_path)?;
    let (base_url, state) = start_storefront(false, false).await?;
    let orchestrator = Orchestrator::new(quick_config(base_url), scenario);
    let result = orchestrator.run().await?;

    assert!(result.passed);
    assert!(state.count("homepage") > 0);
    assert!(
        state.count("product") > 0,
        "the extracted product id should flow into the product step"
    );
    assert_eq!(state.count("cart"), 0, "the yaml journey stops at product");

    Ok(())
}
