//! End-to-end tests over HTTP:
//! 1) Start the router in-process on an ephemeral port with the in-memory backend.
//! 2) Drive every route with reqwest and check status codes, headers and bodies.

use notify_service::infra::tenant::TENANT_HEADER;
use notify_service::{transport, Messages, NotifyService, ResourceSpec, TenantStores};
use reqwest::StatusCode;
use serde_json::{json, Value};
use std::sync::Arc;

struct TestServer {
    base_url: String,
    client: reqwest::Client,
    handle: tokio::task::JoinHandle<()>,
}

impl Drop for TestServer {
    fn drop(&mut self) {
        self.handle.abort();
    }
}

impl TestServer {
    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }
}

async fn spawn(resource: ResourceSpec) -> Result<TestServer, Box<dyn std::error::Error>> {
    let service = NotifyService::new(resource, Arc::new(TenantStores::in_memory()), Messages::default());
    let state = transport::http::AppState {
        service: Arc::new(service),
        pool: None,
        default_lang: "en".to_string(),
    };
    let router = transport::http::create_router(state);
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await?;
    let addr = listener.local_addr()?;
    let handle = tokio::spawn(async move {
        axum::serve(listener, router).await.unwrap();
    });
    let client = reqwest::Client::builder()
        .timeout(std::time::Duration::from_secs(10))
        .build()?;
    Ok(TestServer {
        base_url: format!("http://{}", addr),
        client,
        handle,
    })
}

async fn post(server: &TestServer, body: Value) -> reqwest::Response {
    server
        .client
        .post(server.url("/notify"))
        .json(&body)
        .send()
        .await
        .unwrap()
}

async fn list(server: &TestServer, params: &[(&str, &str)]) -> (StatusCode, Value) {
    let response = server
        .client
        .get(server.url("/notify"))
        .query(params)
        .send()
        .await
        .unwrap();
    let status = response.status();
    let text = response.text().await.unwrap();
    (status, serde_json::from_str(&text).unwrap_or(Value::String(text)))
}

fn ids(page: &Value) -> Vec<&str> {
    page["notifications"]
        .as_array()
        .map(|a| a.iter().filter_map(|n| n["id"].as_str()).collect())
        .unwrap_or_default()
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn test_paging_scenario() -> Result<(), Box<dyn std::error::Error>> {
    let server = spawn(ResourceSpec::notifications().without_field_validation()).await?;

    assert_eq!(post(&server, json!({"id": "a", "x": 1})).await.status(), StatusCode::CREATED);
    assert_eq!(post(&server, json!({"id": "b", "x": 2})).await.status(), StatusCode::CREATED);

    let (status, page) = list(&server, &[("query", "x=1")]).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(ids(&page), vec!["a"]);
    assert_eq!(page["totalRecords"], 1);

    let (_, page) = list(&server, &[("limit", "1"), ("offset", "1")]).await;
    assert_eq!(ids(&page), vec!["b"]);
    assert_eq!(page["totalRecords"], 2);

    let (_, page) = list(&server, &[("limit", "0")]).await;
    assert!(ids(&page).is_empty());
    assert_eq!(page["totalRecords"], 2);

    let (status, _) = list(&server, &[("limit", "-1")]).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    Ok(())
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn test_create_get_and_duplicate() -> Result<(), Box<dyn std::error::Error>> {
    let server = spawn(ResourceSpec::notifications()).await?;

    let created = post(&server, json!({"recipientId": "u1", "text": "Hello there"})).await;
    assert_eq!(created.status(), StatusCode::CREATED);
    let location = created.headers()["location"].to_str()?.to_string();
    let body: Value = created.json().await?;
    let id = body["id"].as_str().expect("generated id").to_string();
    assert_eq!(location, format!("/notify/{}", id));

    let fetched = server.client.get(server.url(&location)).send().await?;
    assert_eq!(fetched.status(), StatusCode::OK);
    let doc: Value = fetched.json().await?;
    assert_eq!(doc["id"], json!(id));
    assert_eq!(doc["text"], "Hello there");

    let duplicate = post(&server, json!({"id": id, "text": "again"})).await;
    assert_eq!(duplicate.status(), StatusCode::UNPROCESSABLE_ENTITY);
    let errors: Value = duplicate.json().await?;
    assert_eq!(errors["errors"][0]["message"], "Duplicate id");
    assert_eq!(errors["errors"][0]["parameters"][0]["key"], "id");
    assert_eq!(errors["errors"][0]["parameters"][0]["value"], json!(id));

    let missing = server.client.get(server.url("/notify/nope")).send().await?;
    assert_eq!(missing.status(), StatusCode::NOT_FOUND);
    assert_eq!(missing.text().await?, "nope");
    Ok(())
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn test_query_errors() -> Result<(), Box<dyn std::error::Error>> {
    let server = spawn(ResourceSpec::notifications()).await?;
    post(&server, json!({"id": "n1", "recipientId": "u1", "text": "Loan due soon"})).await;
    post(&server, json!({"id": "n2", "recipientId": "u2", "text": "Request ready"})).await;

    let (status, page) = list(&server, &[("query", "recipientId=u2")]).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(ids(&page), vec!["n2"]);

    let (status, page) = list(&server, &[("query", "loan")]).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(ids(&page), vec!["n1"]);

    let (status, errors) = list(&server, &[("query", "foo=bar")]).await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    assert_eq!(errors["errors"][0]["parameters"][0]["key"], "foo");
    assert_eq!(errors["errors"][0]["parameters"][0]["value"], "");

    let (status, body) = list(&server, &[("query", "(text=a")]).await;
    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert!(body.as_str().unwrap_or("").starts_with("CQL parse error "));

    let deep = format!("{}text=a{}", "(".repeat(2000), ")".repeat(2000));
    let (status, body) = list(&server, &[("query", deep.as_str())]).await;
    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert!(body.as_str().unwrap_or("").starts_with("CQL parse error query too complex"));

    let (status, page) = list(&server, &[("query", "recipientId=u2")]).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(ids(&page), vec!["n2"]);
    Ok(())
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn test_update_and_delete() -> Result<(), Box<dyn std::error::Error>> {
    let server = spawn(ResourceSpec::notifications()).await?;
    post(&server, json!({"id": "n1", "text": "first"})).await;

    let mismatch = server
        .client
        .put(server.url("/notify/n1"))
        .json(&json!({"id": "other", "text": "x"}))
        .send()
        .await?;
    assert_eq!(mismatch.status(), StatusCode::UNPROCESSABLE_ENTITY);
    let errors: Value = mismatch.json().await?;
    assert_eq!(errors["errors"][0]["message"], "Can not change the id");

    let updated = server
        .client
        .put(server.url("/notify/n1"))
        .json(&json!({"text": "second"}))
        .send()
        .await?;
    assert_eq!(updated.status(), StatusCode::NO_CONTENT);
    let doc: Value = server.client.get(server.url("/notify/n1")).send().await?.json().await?;
    assert_eq!(doc, json!({"id": "n1", "text": "second"}));

    let nothing = server
        .client
        .put(server.url("/notify/ghost"))
        .json(&json!({"text": "x"}))
        .send()
        .await?;
    assert_eq!(nothing.status(), StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(nothing.text().await?, "No records were updated");

    let absent = server.client.delete(server.url("/notify/ghost")).send().await?;
    assert_eq!(absent.status(), StatusCode::NOT_FOUND);
    assert_eq!(
        absent.text().await?,
        "Deleted record count error, expected 1 but deleted 0"
    );

    let deleted = server.client.delete(server.url("/notify/n1")).send().await?;
    assert_eq!(deleted.status(), StatusCode::NO_CONTENT);
    let gone = server.client.get(server.url("/notify/n1")).send().await?;
    assert_eq!(gone.status(), StatusCode::NOT_FOUND);
    Ok(())
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn test_tenants_self_and_health() -> Result<(), Box<dyn std::error::Error>> {
    let server = spawn(ResourceSpec::notifications()).await?;

    let created = server
        .client
        .post(server.url("/notify"))
        .header(TENANT_HEADER, "diku")
        .json(&json!({"id": "d1", "text": "tenant data"}))
        .send()
        .await?;
    assert_eq!(created.status(), StatusCode::CREATED);

    let other = server.client.get(server.url("/notify/d1")).send().await?;
    assert_eq!(other.status(), StatusCode::NOT_FOUND);
    let own = server
        .client
        .get(server.url("/notify/d1"))
        .header(TENANT_HEADER, "diku")
        .send()
        .await?;
    assert_eq!(own.status(), StatusCode::OK);

    let invalid = server
        .client
        .get(server.url("/notify"))
        .header(TENANT_HEADER, "bad-tenant")
        .send()
        .await?;
    assert_eq!(invalid.status(), StatusCode::BAD_REQUEST);

    for response in [
        server.client.get(server.url("/notify/_self")).send().await?,
        server
            .client
            .post(server.url("/notify/_self"))
            .json(&json!({}))
            .send()
            .await?,
    ] {
        assert_eq!(response.status(), StatusCode::NOT_IMPLEMENTED);
        assert_eq!(response.text().await?, "Not supported yet.");
    }

    let health = server.client.get(server.url("/admin/health")).send().await?;
    assert_eq!(health.status(), StatusCode::OK);
    Ok(())
}
