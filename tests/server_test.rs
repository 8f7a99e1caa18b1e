//! End-to-end tests over a real socket.

use std::time::Duration;

use openapi_router::{Application, Route, SubRouter, Typed};
use reqwest::StatusCode;
use serde::Deserialize;
use serde_json::{json, Value};
use utoipa::ToSchema;

mod common;

#[derive(Debug, Deserialize, ToSchema)]
struct Greeting {
    name: String,
    times: Option<u8>,
}

fn greeter() -> Application {
    let mut sub = SubRouter::new();
    sub.route(
        Route::post("/greet")
            .operation_id("greet")
            .body(Typed::<Greeting>::new())
            .handler(|mut ctx| async move {
                let greeting = ctx.take_body().unwrap_or(Greeting {
                    name: String::new(),
                    times: None,
                });
                let times = usize::from(greeting.times.unwrap_or(1));
                json!({ "message": format!("hello {}", greeting.name).repeat(times) })
            }),
    );

    let mut app = Application::new();
    app.mount("/api/", sub);
    app.get("/health", || async { "ok" });
    app
}

#[tokio::test]
async fn test_serves_routes_document_and_docs() {
    let (addr, stop) = common::spawn(greeter()).await;
    let base = format!("http://{addr}");
    let client = reqwest::Client::new();

    let res = client
        .post(format!("{base}/api/greet"))
        .json(&json!({ "name": "ada", "times": 2 }))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::OK);
    assert!(res.headers().contains_key("x-request-id"));
    let body: Value = res.json().await.unwrap();
    assert_eq!(body["message"], "hello adahello ada");

    let res = client
        .post(format!("{base}/api/greet"))
        .json(&json!({ "times": 2 }))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::UNPROCESSABLE_ENTITY);
    assert_eq!(res.text().await.unwrap(), "Invalid request!");

    let doc: Value = client
        .get(format!("{base}/api/openapi.json"))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(doc["paths"]["/api/greet"]["post"]["operationId"], "greet");

    let page = client.get(format!("{base}/docs")).send().await.unwrap();
    assert_eq!(page.status(), StatusCode::OK);

    let health = client.get(format!("{base}/health")).send().await.unwrap();
    assert_eq!(health.text().await.unwrap(), "ok");

    stop.send(()).unwrap();
}

#[tokio::test]
async fn test_request_id_is_propagated() {
    let (addr, _stop) = common::spawn(greeter()).await;

    let res = reqwest::Client::new()
        .get(format!("http://{addr}/health"))
        .header("x-request-id", "abc-123")
        .send()
        .await
        .unwrap();

    assert_eq!(res.headers()["x-request-id"], "abc-123");
}

#[tokio::test]
async fn test_graceful_shutdown_stops_accepting() {
    let (addr, stop) = common::spawn(greeter()).await;
    let client = reqwest::Client::builder()
        .timeout(Duration::from_secs(2))
        .build()
        .unwrap();

    let res = client.get(format!("http://{addr}/health")).send().await.unwrap();
    assert_eq!(res.status(), StatusCode::OK);
    drop(res);

    stop.send(()).unwrap();
    tokio::time::sleep(Duration::from_millis(200)).await;

    let fresh = reqwest::Client::builder()
        .timeout(Duration::from_secs(2))
        .pool_max_idle_per_host(0)
        .build()
        .unwrap();
    assert!(fresh.get(format!("http://{addr}/health")).send().await.is_err());
}
