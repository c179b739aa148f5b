use std::sync::Arc;

use axum::body::Body;
use axum::http::{Request, StatusCode};
use axum::Router;
use http_body_util::BodyExt;
use serde_json::{json, Value};
use tower::ServiceExt;

use plangate_core::audit::{LimitAction, MemoryEventSink};
use plangate_core::config::Config;
use plangate_core::plan::{Ceiling, ResourceKind};
use plangate_core::subscription::SubscriptionStatus;
use plangate_duckdb::DuckDbBackend;
use plangate_server::app::build_app;
use plangate_server::state::AppState;

fn test_config() -> Config {
    Config {
        port: 0,
        data_dir: "/tmp/plangate-test".to_string(),
        duckdb_memory_limit: "1GB".to_string(),
        cors_origins: vec![],
        feature_limits_enabled: true,
        audit_log_enabled: true,
        audit_log_path: "/tmp/plangate-test/limit-events.jsonl".to_string(),
    }
}

struct Harness {
    app: Router,
    state: Arc<AppState>,
    sink: Arc<MemoryEventSink>,
}

async fn harness_with(config: Config) -> Harness {
    let db = DuckDbBackend::open_in_memory().expect("in-memory DuckDB");
    db.seed_default_plans().await.expect("seed plans");
    let sink = Arc::new(MemoryEventSink::new());
    let state = Arc::new(AppState::with_audit_sink(db, config, sink.clone()));
    Harness {
        app: build_app(Arc::clone(&state)),
        state,
        sink,
    }
}

async fn harness() -> Harness {
    harness_with(test_config()).await
}

async fn json_body(response: axum::http::Response<Body>) -> Value {
    let bytes = response
        .into_body()
        .collect()
        .await
        .expect("read body")
        .to_bytes();
    serde_json::from_slice(&bytes).expect("parse JSON")
}

async fn text_body(response: axum::http::Response<Body>) -> String {
    let bytes = response
        .into_body()
        .collect()
        .await
        .expect("read body")
        .to_bytes();
    String::from_utf8(bytes.to_vec()).expect("utf-8 body")
}

fn get(uri: &str, tenant: Option<&str>) -> Request<Body> {
    let mut builder = Request::builder().method("GET").uri(uri);
    if let Some(tenant) = tenant {
        builder = builder.header("X-Tenant-Id", tenant);
    }
    builder.body(Body::empty()).expect("build request")
}

fn create(uri: &str, tenant: &str, body: Value) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri(uri)
        .header("X-Tenant-Id", tenant)
        .header("Content-Type", "application/json")
        .body(Body::from(body.to_string()))
        .expect("build request")
}

async fn send(app: &Router, request: Request<Body>) -> axum::http::Response<Body> {
    app.clone().oneshot(request).await.expect("request")
}

// ============================================================
// BDD: Health check returns 200 when DB is reachable
// ============================================================
#[tokio::test]
async fn test_health_returns_200_when_db_reachable() {
    let h = harness().await;
    let response = send(&h.app, get("/health", None)).await;
    assert_eq!(response.status(), StatusCode::OK);

    let json = json_body(response).await;
    assert_eq!(json["status"], "ok");
    assert_eq!(json["version"], env!("CARGO_PKG_VERSION"));
}

// ============================================================
// BDD: Requests without a tenant are rejected
// ============================================================
#[tokio::test]
async fn test_missing_tenant_header_returns_401() {
    let h = harness().await;
    let response = send(&h.app, get("/api/subscription/status", None)).await;
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);

    let json = json_body(response).await;
    assert_eq!(json["error"]["code"], "unauthorized");
    assert!(json["error"]["field"].is_null());
}

#[tokio::test]
async fn test_blank_tenant_header_returns_401() {
    let h = harness().await;
    let response = send(&h.app, get("/api/subscription/status", Some("   "))).await;
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}

// ============================================================
// BDD: Status endpoint falls back to the free plan
// ============================================================
#[tokio::test]
async fn test_status_without_subscription_is_free_inactive() {
    let h = harness().await;
    let response = send(&h.app, get("/api/subscription/status", Some("tenant_new"))).await;
    assert_eq!(response.status(), StatusCode::OK);

    let json = json_body(response).await;
    assert_eq!(json["plan"], json!({ "slug": "free", "name": "Free" }));
    assert_eq!(json["status"], "inactive");
    assert_eq!(
        json["limits"],
        json!({ "expenses": 50, "cards": 2, "categories": 10, "loans": 0 })
    );
    assert_eq!(
        json["usage"],
        json!({ "expenses": 0, "cards": 0, "categories": 0, "loans": 0 })
    );
    assert_eq!(json["features"], json!([]));
    assert!(json["currentPeriodEnd"].is_null());
}

#[tokio::test]
async fn test_status_reports_subscribed_plan_and_usage() {
    let h = harness().await;
    h.state
        .db
        .seed_subscription("tenant_a", "premium", SubscriptionStatus::Active, None)
        .await
        .unwrap();
    h.state
        .db
        .create_resource("tenant_a", ResourceKind::Cards, "Visa")
        .await
        .unwrap();

    let json = json_body(send(&h.app, get("/api/subscription/status", Some("tenant_a"))).await).await;
    assert_eq!(json["plan"]["slug"], "premium");
    assert_eq!(json["status"], "active");
    assert_eq!(json["limits"]["cards"], -1);
    assert_eq!(json["usage"]["cards"], 1);
    assert_eq!(
        json["features"],
        json!(["csv_export", "pdf_export", "investments"])
    );
}

// ============================================================
// BDD: Creation is allowed below the ceiling and blocked at it
// ============================================================
#[tokio::test]
async fn test_create_card_until_free_ceiling_then_402() {
    let h = harness().await;

    for name in ["Visa", "Amex"] {
        let response = send(&h.app, create("/api/cards", "tenant_a", json!({ "name": name }))).await;
        assert_eq!(response.status(), StatusCode::CREATED);
        let json = json_body(response).await;
        assert_eq!(json["data"]["kind"], "cards");
        assert_eq!(json["data"]["name"], name);
        assert!(json["data"]["id"].as_str().unwrap().starts_with("card_"));
    }

    let response = send(&h.app, create("/api/cards", "tenant_a", json!({ "name": "Discover" }))).await;
    assert_eq!(response.status(), StatusCode::PAYMENT_REQUIRED);
    let json = json_body(response).await;
    assert_eq!(json["error"], "limit_exceeded");
    assert_eq!(json["requiredPlan"], "pro");
    assert_eq!(json["upgradeUrl"], "/pricing?highlight=pro");
    assert_eq!(json["resource"], "cards");
    assert_eq!(json["used"], 2);
    assert_eq!(json["limit"], 2);

    let count = h
        .state
        .db
        .count_resources("tenant_a", ResourceKind::Cards)
        .await
        .unwrap();
    assert_eq!(count, 2);

    let events = h.sink.events().await;
    let actions: Vec<_> = events.iter().map(|e| e.action).collect();
    assert_eq!(
        actions,
        vec![LimitAction::Allow, LimitAction::Allow, LimitAction::Block]
    );
}

#[tokio::test]
async fn test_free_plan_cannot_create_loans() {
    let h = harness().await;
    let response = send(&h.app, create("/api/loans", "tenant_a", json!({ "name": "Mortgage" }))).await;
    assert_eq!(response.status(), StatusCode::PAYMENT_REQUIRED);
    let json = json_body(response).await;
    assert_eq!(json["used"], 0);
    assert_eq!(json["limit"], 0);
}

#[tokio::test]
async fn test_pro_tenant_at_ceiling_is_pointed_at_premium() {
    let h = harness().await;
    h.state
        .db
        .seed_subscription("tenant_a", "pro", SubscriptionStatus::Active, None)
        .await
        .unwrap();
    for i in 0..5 {
        h.state
            .db
            .create_resource("tenant_a", ResourceKind::Loans, &format!("Loan {i}"))
            .await
            .unwrap();
    }

    let response = send(&h.app, create("/api/loans", "tenant_a", json!({ "name": "One more" }))).await;
    assert_eq!(response.status(), StatusCode::PAYMENT_REQUIRED);
    let json = json_body(response).await;
    assert_eq!(json["requiredPlan"], "premium");
    assert_eq!(json["upgradeUrl"], "/pricing?highlight=premium");
}

#[tokio::test]
async fn test_blank_name_returns_400() {
    let h = harness().await;
    let response = send(&h.app, create("/api/expenses", "tenant_a", json!({ "name": "  " }))).await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let json = json_body(response).await;
    assert_eq!(json["error"]["code"], "validation_error");

    let response = send(&h.app, create("/api/expenses", "tenant_a", json!({}))).await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

// ============================================================
// BDD: Successful creation records usage for subscribed tenants
// ============================================================
#[tokio::test]
async fn test_create_records_history_for_subscription() {
    let h = harness().await;
    let sub_id = h
        .state
        .db
        .seed_subscription("tenant_a", "pro", SubscriptionStatus::Active, None)
        .await
        .unwrap();

    for name in ["Rent", "Food"] {
        let response =
            send(&h.app, create("/api/categories", "tenant_a", json!({ "name": name }))).await;
        assert_eq!(response.status(), StatusCode::CREATED);
    }

    let history = h.state.db.list_usage_history(&sub_id).await.unwrap();
    let used: Vec<u64> = history.iter().map(|e| e.used).collect();
    assert_eq!(used, vec![1, 2]);
    assert!(history
        .iter()
        .all(|e| e.limit_value == Ceiling::Bounded(50)));

    let snapshots = h.state.db.list_usage_snapshots("tenant_a").await.unwrap();
    assert_eq!(snapshots.len(), 2);
}

#[tokio::test]
async fn test_create_without_subscription_records_nothing() {
    let h = harness().await;
    let response = send(&h.app, create("/api/expenses", "tenant_free", json!({ "name": "Coffee" }))).await;
    assert_eq!(response.status(), StatusCode::CREATED);
    assert!(h
        .state
        .db
        .list_usage_snapshots("tenant_free")
        .await
        .unwrap()
        .is_empty());
}

// ============================================================
// BDD: CSV export is gated by the csv_export feature
// ============================================================
#[tokio::test]
async fn test_export_locked_on_free_plan() {
    let h = harness().await;
    let response = send(&h.app, get("/api/export/usage.csv", Some("tenant_a"))).await;
    assert_eq!(response.status(), StatusCode::PAYMENT_REQUIRED);
    let json = json_body(response).await;
    assert_eq!(json["error"], "feature_locked");
    assert_eq!(json["resource"], "csv_export");
    assert_eq!(json["requiredPlan"], "pro");
    assert!(json["used"].is_null());
    assert!(json["limit"].is_null());
}

#[tokio::test]
async fn test_export_locked_when_pro_is_past_due() {
    let h = harness().await;
    h.state
        .db
        .seed_subscription("tenant_a", "pro", SubscriptionStatus::PastDue, None)
        .await
        .unwrap();
    let response = send(&h.app, get("/api/export/usage.csv", Some("tenant_a"))).await;
    assert_eq!(response.status(), StatusCode::PAYMENT_REQUIRED);
}

#[tokio::test]
async fn test_export_returns_csv_for_pro() {
    let h = harness().await;
    h.state
        .db
        .seed_subscription("tenant_a", "pro", SubscriptionStatus::Active, None)
        .await
        .unwrap();
    let response = send(&h.app, create("/api/expenses", "tenant_a", json!({ "name": "Coffee" }))).await;
    assert_eq!(response.status(), StatusCode::CREATED);

    let response = send(&h.app, get("/api/export/usage.csv", Some("tenant_a"))).await;
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(
        response.headers()["content-type"],
        "text/csv; charset=utf-8"
    );
    let csv = text_body(response).await;
    let lines: Vec<&str> = csv.lines().collect();
    assert_eq!(lines[0], "timestamp,plan,resource,used,limit");
    assert_eq!(lines.len(), 2);
    assert!(lines[1].ends_with(",pro,expenses,1,1000"));
}

// ============================================================
// BDD: Configuration toggles
// ============================================================
#[tokio::test]
async fn test_disabled_enforcement_allows_everything() {
    let h = harness_with(Config {
        feature_limits_enabled: false,
        ..test_config()
    })
    .await;

    let response = send(&h.app, create("/api/loans", "tenant_a", json!({ "name": "Car" }))).await;
    assert_eq!(response.status(), StatusCode::CREATED);

    let response = send(&h.app, get("/api/export/usage.csv", Some("tenant_a"))).await;
    assert_eq!(response.status(), StatusCode::OK);

    assert!(h.sink.events().await.is_empty());
}

#[tokio::test]
async fn test_disabled_audit_log_writes_no_events() {
    let h = harness_with(Config {
        audit_log_enabled: false,
        ..test_config()
    })
    .await;

    send(&h.app, create("/api/cards", "tenant_a", json!({ "name": "Visa" }))).await;
    send(&h.app, create("/api/loans", "tenant_a", json!({ "name": "Car" }))).await;
    assert!(h.sink.events().await.is_empty());
}

#[tokio::test]
async fn test_default_state_appends_json_lines_audit_file() {
    let dir = std::env::temp_dir().join(format!("plangate-audit-{}", std::process::id()));
    let path = dir.join("limit-events.jsonl");
    let _ = std::fs::remove_dir_all(&dir);

    let db = DuckDbBackend::open_in_memory().expect("in-memory DuckDB");
    db.seed_default_plans().await.unwrap();
    let state = Arc::new(AppState::new(
        db,
        Config {
            audit_log_path: path.to_string_lossy().into_owned(),
            ..test_config()
        },
    ));
    let app = build_app(state);

    let response = send(&app, create("/api/loans", "tenant_a", json!({ "name": "Car" }))).await;
    assert_eq!(response.status(), StatusCode::PAYMENT_REQUIRED);

    let contents = std::fs::read_to_string(&path).expect("audit file written");
    let lines: Vec<Value> = contents
        .lines()
        .map(|line| serde_json::from_str(line).unwrap())
        .collect();
    assert_eq!(lines.len(), 1);
    assert_eq!(lines[0]["tenantId"], "tenant_a");
    assert_eq!(lines[0]["resourceKind"], "loans");
    assert_eq!(lines[0]["action"], "block");
    assert!(lines[0]["timestamp"].is_string());

    let _ = std::fs::remove_dir_all(&dir);
}
