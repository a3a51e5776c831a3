#![allow(clippy::unwrap_used, clippy::expect_used)]

//! End-to-end: gateway + in-process or HTTP PDP + static store + mock backend.

use std::sync::Arc;

use axum::Router;
use axum::body::Body;
use http::{Method, Request, StatusCode, header};
use http_body_util::BodyExt;
use httpmock::prelude::*;
use pep_gateway::test_support::ScriptedPdp;
use pep_gateway::{PepConfig, PepGateway, USER_ID_HEADER};
use policy_store::{StaticPolicyRepository, StaticStoreConfig};
use rbac_pdp::{DecisionEngine, RbacPdpConfig, RbacPdpLocalClient, Service, VisibilityTable};
use rbac_pdp_sdk::{ACTION_VIEW, EvaluationRequest, PolicyRepository};
use serde_json::{Value, json};
use tower::ServiceExt;

const STORE: &str = r#"
roles:
  - id: "11111111-1111-1111-1111-111111111111"
    name: manager
  - id: "22222222-2222-2222-2222-222222222222"
    name: employee
  - id: "44444444-4444-4444-4444-444444444444"
    name: guest
assignments:
  - user_id: alice
    role_ids: ["11111111-1111-1111-1111-111111111111"]
  - user_id: bob
    role_ids: ["22222222-2222-2222-2222-222222222222"]
  - user_id: carol
    role_ids: ["44444444-4444-4444-4444-444444444444"]
permissions:
  - role: "11111111-1111-1111-1111-111111111111"
    resource_id: "33333333-3333-3333-3333-333333333333"
    action: view
  - role: "22222222-2222-2222-2222-222222222222"
    resource_id: "33333333-3333-3333-3333-333333333333"
    action: view
resources:
  - id: "33333333-3333-3333-3333-333333333333"
    resource_type: employees
    tenant_id: "11111111-1111-1111-1111-111111111111"
"#;

const POLICIES: &str = r#"
policies:
  - resource_type: employees
    schema:
      - id
      - name
      - email
      - department_id
      - department_name
      - employment_type_id
      - employment_type
      - position
      - joined_at
    roles:
      - role_id: "11111111-1111-1111-1111-111111111111"
        fields: full
      - role_id: "22222222-2222-2222-2222-222222222222"
        fields: [id, name, department_name, employment_type]
"#;

const EMPLOYEES_RESOURCE_ID: &str = "33333333-3333-3333-3333-333333333333";

const EMPLOYEE_SCHEMA: [&str; 9] = [
    "id",
    "name",
    "email",
    "department_id",
    "department_name",
    "employment_type_id",
    "employment_type",
    "position",
    "joined_at",
];

/// Unreachable: any request that gets forwarded fails with 502.
const CLOSED_BACKEND: &str = "http://127.0.0.1:9";

fn employee_record() -> Value {
    json!({
        "id": "e-1",
        "name": "Ann Lee",
        "email": "ann@example.com",
        "department_id": "d-7",
        "department_name": "Finance",
        "employment_type_id": "t-1",
        "employment_type": "full-time",
        "position": "Analyst",
        "joined_at": "2021-04-01"
    })
}

fn repository() -> Arc<dyn PolicyRepository> {
    let cfg: StaticStoreConfig = serde_saphyr::from_str(STORE).unwrap();
    Arc::new(StaticPolicyRepository::from_config(&cfg).unwrap())
}

fn pdp_service(repo: Arc<dyn PolicyRepository>) -> Arc<Service> {
    let cfg: RbacPdpConfig = serde_saphyr::from_str(POLICIES).unwrap();
    let table = VisibilityTable::from_config(&cfg.policies).unwrap();
    Arc::new(Service::new(repo, DecisionEngine::new(Arc::new(table))))
}

fn gateway_config(backend: &str) -> PepConfig {
    let mut cfg = PepConfig::default();
    cfg.backend.default_url = Some(backend.to_owned());
    cfg
}

fn local_gateway(backend: &str) -> Router {
    let repo = repository();
    let pdp = Arc::new(RbacPdpLocalClient::new(pdp_service(repo.clone())));
    PepGateway::new(&gateway_config(backend), pdp, repo)
        .unwrap()
        .router()
}

fn get(uri: &str, user: Option<&str>) -> Request<Body> {
    let mut builder = Request::builder().method(Method::GET).uri(uri);
    if let Some(user) = user {
        builder = builder.header(USER_ID_HEADER, user);
    }
    builder.body(Body::empty()).unwrap()
}

async fn body_bytes(resp: axum::response::Response) -> Vec<u8> {
    resp.into_body().collect().await.unwrap().to_bytes().to_vec()
}

/// Serve the PDP REST surface on an ephemeral port; returns its base URL.
async fn spawn_remote_pdp(repo: Arc<dyn PolicyRepository>) -> String {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let pdp_addr = listener.local_addr().unwrap();
    let limit = RbacPdpConfig::default().max_request_bytes;
    let pdp_app = rbac_pdp::api::router(pdp_service(repo), limit);
    tokio::spawn(async move {
        axum::serve(listener, pdp_app).await.unwrap();
    });
    format!("http://{pdp_addr}")
}

fn many_employees(count: usize) -> Value {
    let employees: Vec<Value> = (0..count)
        .map(|i| {
            let mut record = employee_record();
            record["id"] = json!(format!("e-{i}"));
            record
        })
        .collect();
    json!({ "employees": employees })
}

async fn employees_backend(user: &str) -> MockServer {
    let server = MockServer::start_async().await;
    server
        .mock_async(|when, then| {
            when.method(GET)
                .path("/employees")
                .header("x-user-id", user);
            then.status(200)
                .header("content-type", "application/json")
                .json_body(json!({ "employees": [employee_record()] }));
        })
        .await;
    server
}

#[tokio::test]
async fn full_visibility_role_sees_record_unchanged() {
    let backend = employees_backend("alice").await;
    let app = local_gateway(&backend.base_url());

    let resp = app.oneshot(get("/employees", Some("alice"))).await.unwrap();

    assert_eq!(resp.status(), StatusCode::OK);
    assert_eq!(resp.headers()[header::CONTENT_TYPE], "application/json");
    let body: Value = serde_json::from_slice(&body_bytes(resp).await).unwrap();
    assert_eq!(body, json!({ "employees": [employee_record()] }));
}

#[tokio::test]
async fn phase_one_lists_allowed_fields_in_schema_order() {
    let svc = pdp_service(repository());

    let manager = svc
        .evaluate(EvaluationRequest::new(
            "alice",
            "employees",
            EMPLOYEES_RESOURCE_ID,
            ACTION_VIEW,
        ))
        .await
        .unwrap();
    let employee = svc
        .evaluate(EvaluationRequest::new(
            "bob",
            "employees",
            EMPLOYEES_RESOURCE_ID,
            ACTION_VIEW,
        ))
        .await
        .unwrap();

    assert!(manager.allow);
    assert_eq!(manager.allowed_fields, EMPLOYEE_SCHEMA);
    assert!(employee.allow);
    assert_eq!(
        employee.allowed_fields,
        ["id", "name", "department_name", "employment_type"]
    );
}

#[tokio::test]
async fn restricted_role_sees_four_fields_in_record_order() {
    let backend = employees_backend("bob").await;
    let app = local_gateway(&backend.base_url());

    let resp = app.oneshot(get("/employees", Some("bob"))).await.unwrap();

    assert_eq!(resp.status(), StatusCode::OK);
    let body = body_bytes(resp).await;
    assert_eq!(
        String::from_utf8(body).unwrap(),
        r#"{"employees":[{"id":"e-1","name":"Ann Lee","department_name":"Finance","employment_type":"full-time"}]}"#
    );
}

#[tokio::test]
async fn subject_without_permission_is_denied_before_forwarding() {
    let app = local_gateway(CLOSED_BACKEND);

    let resp = app.oneshot(get("/employees", Some("carol"))).await.unwrap();

    assert_eq!(resp.status(), StatusCode::FORBIDDEN);
    assert_eq!(body_bytes(resp).await, b"Access denied");
}

#[tokio::test]
async fn unknown_subject_is_denied() {
    let app = local_gateway(CLOSED_BACKEND);

    let resp = app.oneshot(get("/employees", Some("mallory"))).await.unwrap();

    assert_eq!(resp.status(), StatusCode::FORBIDDEN);
}

#[tokio::test]
async fn unregistered_resource_type_is_denied() {
    let app = local_gateway(CLOSED_BACKEND);

    let resp = app.oneshot(get("/payroll", Some("alice"))).await.unwrap();

    assert_eq!(resp.status(), StatusCode::FORBIDDEN);
    assert_eq!(body_bytes(resp).await, b"Access denied");
}

#[tokio::test]
async fn health_is_forwarded_without_any_decision() {
    let server = MockServer::start_async().await;
    let health = server
        .mock_async(|when, then| {
            when.method(GET).path("/health");
            then.status(200).body("ok");
        })
        .await;
    let pdp = Arc::new(ScriptedPdp::new());
    let app = PepGateway::new(&gateway_config(&server.base_url()), pdp.clone(), repository())
        .unwrap()
        .router();

    let resp = app.oneshot(get("/health", Some("alice"))).await.unwrap();

    assert_eq!(resp.status(), StatusCode::OK);
    assert_eq!(body_bytes(resp).await, b"ok");
    health.assert_async().await;
    assert_eq!(pdp.calls(), 0);
}

#[tokio::test]
async fn missing_user_header_makes_no_collaborator_calls() {
    let pdp = Arc::new(ScriptedPdp::new());
    let app = PepGateway::new(&gateway_config(CLOSED_BACKEND), pdp.clone(), repository())
        .unwrap()
        .router();

    let resp = app.oneshot(get("/employees", None)).await.unwrap();

    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    assert_eq!(body_bytes(resp).await, b"Missing X-User-ID header");
    assert_eq!(pdp.calls(), 0);
}

#[tokio::test]
async fn non_collection_backend_response_is_passed_through() {
    let server = MockServer::start_async().await;
    server
        .mock_async(|when, then| {
            when.method(GET)
                .path("/employees/33333333-3333-3333-3333-333333333333");
            then.status(404)
                .header("content-type", "text/plain")
                .header("x-request-source", "employee-service")
                .body("employee not found");
        })
        .await;
    let app = local_gateway(&server.base_url());

    let resp = app
        .oneshot(get(
            "/employees/33333333-3333-3333-3333-333333333333",
            Some("alice"),
        ))
        .await
        .unwrap();

    assert_eq!(resp.status(), StatusCode::NOT_FOUND);
    assert_eq!(resp.headers()[header::CONTENT_TYPE], "text/plain");
    assert_eq!(resp.headers()["x-request-source"], "employee-service");
    assert_eq!(body_bytes(resp).await, b"employee not found");
}

#[tokio::test]
async fn backend_down_is_bad_gateway_after_grant() {
    let app = local_gateway(CLOSED_BACKEND);

    let resp = app.oneshot(get("/employees", Some("alice"))).await.unwrap();

    assert_eq!(resp.status(), StatusCode::BAD_GATEWAY);
}

#[tokio::test]
async fn remote_pdp_over_http_redacts_the_same_way() {
    let repo = repository();
    let pdp_url = spawn_remote_pdp(repo.clone()).await;

    let backend = employees_backend("bob").await;
    let mut cfg = gateway_config(&backend.base_url());
    cfg.pdp.url = pdp_url;
    let app = PepGateway::with_remote_pdp(&cfg, repo).unwrap().router();

    let resp = app.oneshot(get("/employees", Some("bob"))).await.unwrap();

    assert_eq!(resp.status(), StatusCode::OK);
    let body: Value = serde_json::from_slice(&body_bytes(resp).await).unwrap();
    assert_eq!(
        body,
        json!({"employees": [{
            "id": "e-1",
            "name": "Ann Lee",
            "department_name": "Finance",
            "employment_type": "full-time"
        }]})
    );
}

#[tokio::test]
async fn remote_pdp_accepts_collections_up_to_the_backend_bound() {
    assert!(
        RbacPdpConfig::default().max_request_bytes
            > PepConfig::default().backend.max_response_bytes
    );

    let repo = repository();
    let pdp_url = spawn_remote_pdp(repo.clone()).await;
    let collection = many_employees(12_000);
    assert!(collection.to_string().len() > 2 * 1024 * 1024);

    let backend = MockServer::start_async().await;
    backend
        .mock_async(|when, then| {
            when.method(GET).path("/employees");
            then.status(200)
                .header("content-type", "application/json")
                .json_body(collection.clone());
        })
        .await;
    let mut cfg = gateway_config(&backend.base_url());
    cfg.pdp.url = pdp_url;
    let app = PepGateway::with_remote_pdp(&cfg, repo).unwrap().router();

    let resp = app.oneshot(get("/employees", Some("bob"))).await.unwrap();

    assert_eq!(resp.status(), StatusCode::OK);
    let body: Value = serde_json::from_slice(&body_bytes(resp).await).unwrap();
    let employees = body["employees"].as_array().unwrap();
    assert_eq!(employees.len(), 12_000);
    assert_eq!(
        employees[11_999],
        json!({
            "id": "e-11999",
            "name": "Ann Lee",
            "department_name": "Finance",
            "employment_type": "full-time"
        })
    );
}

#[tokio::test]
async fn remote_pdp_unreachable_is_internal_error() {
    let mut cfg = gateway_config(CLOSED_BACKEND);
    cfg.pdp.url = "http://127.0.0.1:9".to_owned();
    let app = PepGateway::with_remote_pdp(&cfg, repository())
        .unwrap()
        .router();

    let resp = app.oneshot(get("/employees", Some("alice"))).await.unwrap();

    assert_eq!(resp.status(), StatusCode::INTERNAL_SERVER_ERROR);
}
