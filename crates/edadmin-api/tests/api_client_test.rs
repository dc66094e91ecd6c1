// Integration tests for `ApiClient` using wiremock.
#![allow(clippy::unwrap_used)]

use pretty_assertions::assert_eq;
use secrecy::{ExposeSecret, SecretString};
use serde_json::{Value, json};
use wiremock::matchers::{body_json, header, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

use edadmin_api::endpoints::{BroadcastQuery, CompanyAction, PublishAction};
use edadmin_api::models::{Webhook, WebhookEvent};
use edadmin_api::{ApiClient, Error, Session};

// ── Helpers ─────────────────────────────────────────────────────────

fn session() -> Session {
    Session::new("u1", SecretString::from("c00kie"))
}

async fn setup() -> (MockServer, ApiClient) {
    let server = MockServer::start().await;
    let client = ApiClient::from_reqwest(&server.uri(), reqwest::Client::new())
        .unwrap()
        .with_session(session());
    (server, client)
}

// ── Login ───────────────────────────────────────────────────────────

#[tokio::test]
async fn test_login_returns_session() {
    let server = MockServer::start().await;
    let client = ApiClient::from_reqwest(&server.uri(), reqwest::Client::new()).unwrap();

    Mock::given(method("POST"))
        .and(path("/api/login"))
        .and(body_json(json!({"username": "admin", "password": "hunter2"})))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(json!({"uid": "u42", "cookie": "sess"})),
        )
        .mount(&server)
        .await;

    let session = client
        .login("admin", &SecretString::from("hunter2"))
        .await
        .unwrap();

    assert_eq!(session.uid, "u42");
    assert_eq!(session.cookie.expose_secret(), "sess");
    assert!(session.impersonate.is_none());
}

#[tokio::test]
async fn test_login_failure_is_authentication_error() {
    let server = MockServer::start().await;
    let client = ApiClient::from_reqwest(&server.uri(), reqwest::Client::new()).unwrap();

    Mock::given(method("POST"))
        .and(path("/api/login"))
        .respond_with(ResponseTemplate::new(401).set_body_json(
            json!({"title": "401 Unauthorized", "description": "Invalid login"}),
        ))
        .mount(&server)
        .await;

    let err = client
        .login("admin", &SecretString::from("nope"))
        .await
        .unwrap_err();
    assert!(matches!(err, Error::Authentication { .. }), "got {err:?}");
}

// ── Session headers ─────────────────────────────────────────────────

#[tokio::test]
async fn test_session_headers_sent() {
    let (server, client) = setup().await;

    Mock::given(method("GET"))
        .and(path("/api/lists"))
        .and(header("x-auth-uid", "u1"))
        .and(header("x-auth-cookie", "c00kie"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([])))
        .mount(&server)
        .await;

    let lists: Vec<Value> = client.list("lists", &[]).await.unwrap();
    assert!(lists.is_empty());
}

#[tokio::test]
async fn test_impersonation_skipped_for_admin_endpoints() {
    let server = MockServer::start().await;
    let client = ApiClient::from_reqwest(&server.uri(), reqwest::Client::new())
        .unwrap()
        .with_session(session().with_impersonate(Some("cust9".into())));

    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([])))
        .mount(&server)
        .await;

    let _: Vec<Value> = client.list("lists", &[]).await.unwrap();
    let _: Vec<Value> = client.list("policies", &[]).await.unwrap();

    let requests = server.received_requests().await.unwrap();
    assert_eq!(requests.len(), 2);

    let lists = &requests[0];
    assert_eq!(lists.url.path(), "/api/lists");
    assert_eq!(lists.headers.get("x-auth-impersonate").unwrap(), "cust9");

    let policies = &requests[1];
    assert_eq!(policies.url.path(), "/api/policies");
    assert!(policies.headers.get("x-auth-impersonate").is_none());
    assert_eq!(policies.headers.get("x-auth-uid").unwrap(), "u1");
}

#[tokio::test]
async fn test_missing_session_fails_before_request() {
    let server = MockServer::start().await;
    let client = ApiClient::from_reqwest(&server.uri(), reqwest::Client::new()).unwrap();

    let err = client.list::<Value>("lists", &[]).await.unwrap_err();
    assert!(matches!(err, Error::NoSession));
    assert!(server.received_requests().await.unwrap().is_empty());
}

// ── Collection CRUD ─────────────────────────────────────────────────

#[tokio::test]
async fn test_fetch_typed_record_keeps_unknown_fields() {
    let (server, client) = setup().await;

    Mock::given(method("GET"))
        .and(path("/api/resthooks/7"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "id": "7",
            "cid": "c1",
            "name": "Opens",
            "target_url": "https://hooks.example.com/x",
            "event": "open",
        })))
        .mount(&server)
        .await;

    let hook: Webhook = client.fetch("resthooks", "7").await.unwrap();
    assert_eq!(hook.event, WebhookEvent::Open);
    assert_eq!(hook.extra.get("cid"), Some(&json!("c1")));

    // Unknown fields go back out on save.
    let out = serde_json::to_value(&hook).unwrap();
    assert_eq!(out["cid"], "c1");
}

#[tokio::test]
async fn test_create_returns_created_document() {
    let (server, client) = setup().await;

    Mock::given(method("POST"))
        .and(path("/api/domaingroups"))
        .and(body_json(json!({"name": "Gmail", "domains": "gmail.com"})))
        .respond_with(
            ResponseTemplate::new(201)
                .set_body_json(json!({"id": "abc123", "name": "Gmail", "domains": "gmail.com"})),
        )
        .mount(&server)
        .await;

    let created = client
        .create("domaingroups", &json!({"name": "Gmail", "domains": "gmail.com"}))
        .await
        .unwrap();
    assert_eq!(created["id"], "abc123");
}

#[tokio::test]
async fn test_update_with_empty_body_returns_null() {
    let (server, client) = setup().await;

    Mock::given(method("PATCH"))
        .and(path("/api/lists/42"))
        .respond_with(ResponseTemplate::new(200))
        .expect(1)
        .mount(&server)
        .await;

    let resp = client
        .update("lists", "42", &json!({"name": "Renamed"}))
        .await
        .unwrap();
    assert_eq!(resp, Value::Null);
}

#[tokio::test]
async fn test_remove() {
    let (server, client) = setup().await;

    Mock::given(method("DELETE"))
        .and(path("/api/sinks/s1"))
        .respond_with(ResponseTemplate::new(204))
        .expect(1)
        .mount(&server)
        .await;

    client.remove("sinks", "s1").await.unwrap();
}

// ── Errors ──────────────────────────────────────────────────────────

#[tokio::test]
async fn test_backend_error_body_is_parsed() {
    let (server, client) = setup().await;

    Mock::given(method("GET"))
        .and(path("/api/segments/missing"))
        .respond_with(ResponseTemplate::new(404).set_body_json(
            json!({"title": "404 Not Found", "description": "segment not found"}),
        ))
        .mount(&server)
        .await;

    let err = client.fetch::<Value>("segments", "missing").await.unwrap_err();
    assert!(err.is_not_found());
    match err {
        Error::Api {
            status,
            title,
            message,
        } => {
            assert_eq!(status, 404);
            assert_eq!(title.as_deref(), Some("404 Not Found"));
            assert_eq!(message, "segment not found");
        }
        other => panic!("expected Api error, got {other:?}"),
    }
}

#[tokio::test]
async fn test_unauthorized_maps_to_session_expired() {
    let (server, client) = setup().await;

    Mock::given(method("GET"))
        .and(path("/api/lists"))
        .respond_with(ResponseTemplate::new(401))
        .mount(&server)
        .await;

    let err = client.list::<Value>("lists", &[]).await.unwrap_err();
    assert!(matches!(err, Error::SessionExpired));
    assert!(err.is_auth_expired());
}

#[tokio::test]
async fn test_bad_json_includes_body() {
    let (server, client) = setup().await;

    Mock::given(method("GET"))
        .and(path("/api/resthooks/1"))
        .respond_with(ResponseTemplate::new(200).set_body_string("<html>oops</html>"))
        .mount(&server)
        .await;

    let err = client.fetch::<Webhook>("resthooks", "1").await.unwrap_err();
    match err {
        Error::Deserialization { body, .. } => assert_eq!(body, "<html>oops</html>"),
        other => panic!("expected Deserialization, got {other:?}"),
    }
}

#[tokio::test]
async fn test_bad_json_with_multibyte_text_is_reported() {
    let (server, client) = setup().await;
    let body = format!("{}é trailing", "x".repeat(199));

    Mock::given(method("GET"))
        .and(path("/api/lists/1"))
        .respond_with(ResponseTemplate::new(200).set_body_string(body.clone()))
        .mount(&server)
        .await;

    let err = client.fetch::<Value>("lists", "1").await.unwrap_err();
    match err {
        Error::Deserialization { body: raw, message } => {
            assert_eq!(raw, body);
            assert!(message.contains('é'), "{message}");
        }
        other => panic!("expected Deserialization, got {other:?}"),
    }
}

#[tokio::test]
async fn test_error_message_field_is_used() {
    let (server, client) = setup().await;

    Mock::given(method("POST"))
        .and(path("/api/lists"))
        .respond_with(
            ResponseTemplate::new(400).set_body_json(json!({"message": "name is required"})),
        )
        .mount(&server)
        .await;

    let err = client.create("lists", &json!({})).await.unwrap_err();
    match err {
        Error::Api { status, message, .. } => {
            assert_eq!(status, 400);
            assert_eq!(message, "name is required");
        }
        other => panic!("expected Api error, got {other:?}"),
    }
}

// ── Resource endpoints ──────────────────────────────────────────────

#[tokio::test]
async fn test_list_broadcasts_unwraps_envelope() {
    let (server, client) = setup().await;

    Mock::given(method("GET"))
        .and(path("/api/broadcasts"))
        .and(query_param("search", "spring"))
        .and(query_param("older", "2024-03-01T00:00:00Z"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "count": 1,
            "broadcasts": [{"id": "b1", "name": "Spring sale", "canceled": true}],
        })))
        .mount(&server)
        .await;

    let rows = client
        .list_broadcasts(&BroadcastQuery {
            search: Some("spring".into()),
            older: Some("2024-03-01T00:00:00Z".into()),
            newer: None,
        })
        .await
        .unwrap();

    assert_eq!(rows.len(), 1);
    assert_eq!(rows[0].name, "Spring sale");
    assert_eq!(rows[0].status().to_string(), "Canceled");
}

#[tokio::test]
async fn test_publish_action() {
    let (server, client) = setup().await;

    Mock::given(method("POST"))
        .and(path("/api/policies/p1/publish"))
        .respond_with(ResponseTemplate::new(200))
        .expect(1)
        .mount(&server)
        .await;

    client
        .publish_action("policies", "p1", PublishAction::Publish)
        .await
        .unwrap();
}

#[tokio::test]
async fn test_company_actions_body_shapes() {
    let (server, client) = setup().await;

    Mock::given(method("POST"))
        .and(path("/api/approvecompanies"))
        .and(body_json(json!({"ids": ["c1"]})))
        .respond_with(ResponseTemplate::new(200))
        .expect(1)
        .mount(&server)
        .await;

    Mock::given(method("POST"))
        .and(path("/api/bancompanies"))
        .and(body_json(json!(["c1"])))
        .respond_with(ResponseTemplate::new(200))
        .expect(1)
        .mount(&server)
        .await;

    let ids = vec!["c1".to_owned()];
    client
        .company_action(CompanyAction::Approve, &ids)
        .await
        .unwrap();
    client.company_action(CompanyAction::Ban, &ids).await.unwrap();
}

#[tokio::test]
async fn test_webhook_test_endpoint() {
    let (server, client) = setup().await;

    Mock::given(method("POST"))
        .and(path("/api/resthooks/test"))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(json!({"success": true, "status_code": 204})),
        )
        .mount(&server)
        .await;

    let result = client
        .test_webhook(" https://hooks.example.com/x ", WebhookEvent::TagAdd)
        .await
        .unwrap();
    assert!(result.success);
    assert_eq!(result.status_code, Some(204));

    let requests = server.received_requests().await.unwrap();
    let sent: Value = serde_json::from_slice(&requests[0].body).unwrap();
    assert_eq!(sent["target_url"], "https://hooks.example.com/x");
    assert_eq!(sent["payload"]["type"], "tag_add");
}
