// End-to-end tests: resource bindings mounted against a wiremock backend.
#![allow(clippy::unwrap_used)]

use pretty_assertions::assert_eq;
use secrecy::SecretString;
use serde_json::{Value, json};
use wiremock::matchers::{body_json, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

use edadmin_api::models::Warmup;
use edadmin_api::{ApiClient, Session, TransportConfig};
use edadmin_core::{CoreError, Location, Notifier, Patch, ResourceKind};

async fn setup() -> (MockServer, ApiClient) {
    let server = MockServer::start().await;
    let client = ApiClient::new(&server.uri(), &TransportConfig::default())
        .unwrap()
        .with_session(Session::new("u1", SecretString::from("c00kie")));
    (server, client)
}

async fn mock_get(server: &MockServer, at: &str, body: Value) {
    Mock::given(method("GET"))
        .and(path(at))
        .respond_with(ResponseTemplate::new(200).set_body_json(body))
        .mount(server)
        .await;
}

#[tokio::test]
async fn test_edit_existing_list_and_save() {
    let (server, client) = setup().await;
    mock_get(&server, "/api/lists/42", json!({"id": "42", "name": "Old", "count": 7})).await;

    Mock::given(method("PATCH"))
        .and(path("/api/lists/42"))
        .and(body_json(json!({"id": "42", "name": "Foo", "count": 7})))
        .respond_with(ResponseTemplate::new(200))
        .expect(1)
        .mount(&server)
        .await;

    let location = ResourceKind::Lists.location(Some("42"));
    let binder = ResourceKind::Lists
        .binding(&client)
        .mount(&location, Notifier::new());
    binder.ready().await.unwrap();
    assert_eq!(binder.data()["name"], "Old");

    binder
        .update(&r#"{"name": {"$set": "Foo"}}"#.parse::<Patch>().unwrap())
        .unwrap();
    binder.save(None).await.unwrap();
}

#[tokio::test]
async fn test_create_webhook_returns_edit_location() {
    let (server, client) = setup().await;
    Mock::given(method("POST"))
        .and(path("/api/resthooks"))
        .and(body_json(json!({
            "name": "Hook",
            "target_url": "https://example.com/h",
            "event": "open_click",
        })))
        .respond_with(ResponseTemplate::new(201).set_body_json(json!({"id": "abc123"})))
        .expect(1)
        .mount(&server)
        .await;

    let binder = ResourceKind::Webhooks
        .binding(&client)
        .mount(&ResourceKind::Webhooks.location(Some("new")), Notifier::new());
    binder.ready().await.unwrap();

    let patch = Patch::set_path("name", json!("Hook"))
        .then(Patch::set_path("target_url", json!("https://example.com/h")));
    binder.update(&patch).unwrap();
    let outcome = binder.form_submit(true).await.unwrap();

    assert_eq!(outcome.created.unwrap().to_string(), "/webhooks/edit?id=abc123");
    assert!(outcome.close);
}

#[tokio::test]
async fn test_segment_options_exclude_self() {
    let (server, client) = setup().await;
    mock_get(&server, "/api/segments/s1", json!({"id": "s1", "name": "Mine", "parts": []})).await;
    mock_get(
        &server,
        "/api/segments",
        json!([
            {"id": "s2", "name": "beta"},
            {"id": "s1", "name": "Mine"},
            {"id": "s3", "name": "Alpha"},
        ]),
    )
    .await;
    mock_get(&server, "/api/lists", json!([])).await;
    Mock::given(method("GET"))
        .and(path("/api/recentbroadcasts"))
        .and(query_param("segid", "s1"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([
            {"id": "b1", "name": "Spring", "linkurls": ["https://x"], "is_bc": true,
             "updated_at": "2024-01-01", "modified": "2024-01-02", "extra": 1},
        ])))
        .mount(&server)
        .await;
    mock_get(&server, "/api/recenttags", json!(["vip"])).await;
    mock_get(&server, "/api/countries", json!(["US"])).await;
    mock_get(&server, "/api/regions", json!(["US-CA"])).await;
    mock_get(&server, "/api/allfields", json!(["email", "first"])).await;

    let binder = ResourceKind::Segments
        .binding(&client)
        .mount(&Location::parse("/segments/edit?id=s1"), Notifier::new());
    let outcome = binder.ready().await.unwrap();

    assert!(outcome.extra_failures.is_empty());
    assert_eq!(
        binder.extra("segments").unwrap(),
        json!([{"id": "s3", "text": "Alpha"}, {"id": "s2", "text": "beta"}])
    );
    assert_eq!(
        binder.extra("lists").unwrap(),
        json!([{"id": "", "text": "None Available"}])
    );
    assert_eq!(
        binder.extra("campaigns").unwrap(),
        json!([{
            "id": "b1", "text": "Spring", "linkurls": ["https://x"], "is_bc": true,
            "updated_at": "2024-01-01", "modified": "2024-01-02",
        }])
    );
    assert_eq!(binder.extra("tags").unwrap(), json!(["vip"]));
    assert_eq!(binder.extra("allfields").unwrap(), json!(["email", "first"]));
}

#[tokio::test]
async fn test_warmup_sink_defaults_to_first_server() {
    let (server, client) = setup().await;
    mock_get(&server, "/api/sinks", json!([{"id": "z", "name": "Zeta"}, {"id": "a", "name": "alpha"}])).await;

    let binder = ResourceKind::Warmups
        .typed_binding(&client, Warmup::default())
        .mount(&Location::parse("/warmups/edit?id=new"), Notifier::new());
    binder.ready().await.unwrap();

    let data = serde_json::to_value(binder.data()).unwrap();
    assert_eq!(data["sink"], "a");
}

#[tokio::test]
async fn test_warmup_keeps_sink_when_servers_fail() {
    let (server, client) = setup().await;
    mock_get(&server, "/api/warmups/7", json!({"id": "7", "name": "w", "sink": "s1"})).await;
    Mock::given(method("GET"))
        .and(path("/api/sinks"))
        .respond_with(ResponseTemplate::new(500).set_body_json(json!({"description": "down"})))
        .mount(&server)
        .await;
    Mock::given(method("PATCH"))
        .and(path("/api/warmups/7"))
        .and(body_json(json!({"id": "7", "name": "renamed", "sink": "s1"})))
        .respond_with(ResponseTemplate::new(200))
        .expect(1)
        .mount(&server)
        .await;

    let binder = ResourceKind::Warmups
        .binding(&client)
        .mount(&Location::parse("/warmups/edit?id=7"), Notifier::new());
    let outcome = binder.ready().await.unwrap();

    assert_eq!(outcome.extra_failures, vec!["sinks".to_owned()]);
    assert_eq!(binder.data()["sink"], "s1");
    assert_eq!(binder.extra("override").unwrap(), Value::Null);

    binder.update(&Patch::set_path("name", json!("renamed"))).unwrap();
    binder.save(None).await.unwrap();
}

#[tokio::test]
async fn test_warmup_override_loads_template() {
    let (server, client) = setup().await;
    mock_get(&server, "/api/sinks", json!([{"id": "s1", "name": "One"}])).await;
    mock_get(
        &server,
        "/api/warmups/w9",
        json!({"id": "w9", "name": "Base", "sink": "s1", "rampfactor": 150}),
    )
    .await;

    let binder = ResourceKind::Warmups
        .binding(&client)
        .mount(&Location::parse("/warmups/edit?id=new&override=w9"), Notifier::new());
    let outcome = binder.ready().await.unwrap();

    assert!(outcome.extra_failures.is_empty());
    let template = binder.extra("override").unwrap();
    assert_eq!(template["name"], "Base");
    assert_eq!(template["rampfactor"], 150);
}

#[tokio::test]
async fn test_customer_extra_failure_keeps_record() {
    let (server, client) = setup().await;
    mock_get(&server, "/api/companies/c1", json!({"id": "c1", "name": "Acme", "frontend": "f1"})).await;
    mock_get(&server, "/api/frontends", json!([{"id": "f1", "name": "Main"}])).await;
    mock_get(&server, "/api/routes", json!([{"id": "r1", "published": true}, {"id": "r2"}])).await;
    Mock::given(method("GET"))
        .and(path("/api/companies/c1/credits"))
        .respond_with(ResponseTemplate::new(500).set_body_json(json!({
            "title": "500 Internal Server Error",
            "description": "credits unavailable",
        })))
        .mount(&server)
        .await;

    let notifier = Notifier::new();
    let binder = ResourceKind::Customers
        .binding(&client)
        .mount(&Location::parse("/customers/edit?id=c1"), notifier.clone());
    let outcome = binder.ready().await.unwrap();

    assert_eq!(outcome.extra_failures, vec!["credits".to_owned()]);
    assert_eq!(binder.data()["frontend"], "f1");
    assert_eq!(binder.extra("routes").unwrap(), json!([{"id": "r1", "published": true}]));
    assert!(notifier.current().unwrap().message.contains("credits"));
}

#[tokio::test]
async fn test_missing_record_surfaces_not_found() {
    let (server, client) = setup().await;
    Mock::given(method("GET"))
        .and(path("/api/routes/nope"))
        .respond_with(ResponseTemplate::new(404).set_body_json(json!({
            "title": "404 Not Found",
            "description": "no such route",
        })))
        .mount(&server)
        .await;
    mock_get(&server, "/api/domaingroups", json!([])).await;
    mock_get(&server, "/api/routepolicies", json!([])).await;

    let binder = ResourceKind::Routes
        .binding(&client)
        .mount(&Location::parse("/routes/edit?id=nope"), Notifier::new());
    let err = binder.ready().await.unwrap_err();

    assert!(matches!(err, CoreError::NotFound { .. }), "{err:?}");
    assert_eq!(binder.data(), ResourceKind::Routes.initial());
}

#[tokio::test]
async fn test_dkim_singleton_patches_collection() {
    let (server, client) = setup().await;
    mock_get(&server, "/api/dkimentries", json!({"example.com": {"selector": "s1"}})).await;
    Mock::given(method("PATCH"))
        .and(path("/api/dkimentries"))
        .respond_with(ResponseTemplate::new(200))
        .expect(1)
        .mount(&server)
        .await;

    let binder = ResourceKind::Dkim
        .binding(&client)
        .mount(&ResourceKind::Dkim.location(None), Notifier::new());
    binder.ready().await.unwrap();
    assert_eq!(binder.data()["example.com"]["selector"], "s1");
    binder.save(None).await.unwrap();
}
