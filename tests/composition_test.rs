//! Sub-router composition, duplicate registration and fixed endpoints.

use axum::http::StatusCode;
use openapi_router::config::{DocsOptions, InfoOptions, OpenApiOptions};
use openapi_router::{Application, Method, PartialApplicationOptions, Route, SubRouter};

mod common;

fn items_router() -> SubRouter {
    let mut sub = SubRouter::new();
    sub.route(Route::get("/x").operation_id("getX").handler(|_ctx| async { "x" }));
    sub.route(Route::post("/x").operation_id("postX").handler(|_ctx| async { "posted" }));
    sub
}

#[tokio::test]
async fn test_prefix_with_trailing_slash_elides_one() {
    let mut app = Application::new();
    app.mount("/api/", items_router());

    let paths: Vec<String> = app.routes().iter().map(|r| r.path().to_string()).collect();
    assert_eq!(paths, vec!["/api/x", "/api/x"]);

    let router = app.into_router();
    let res = common::send(router.clone(), common::get("/api/x")).await;
    assert_eq!(res.status, StatusCode::OK);
    assert_eq!(res.body, "x");

    let res = common::send(router.clone(), common::json_request("POST", "/api/x", "")).await;
    assert_eq!(res.body, "posted");

    let res = common::send(router, common::get("/api//x")).await;
    assert_eq!(res.status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_sub_router_mounts_under_several_prefixes() {
    let mut app = Application::new();
    app.mount("/v1", items_router());
    app.mount("/v2/", items_router());
    app.route(Route::get("/root").handler(|_ctx| async { "root" }));

    let listed: Vec<(Method, String)> = app
        .routes()
        .iter()
        .map(|r| (r.method(), r.path().to_string()))
        .collect();
    assert_eq!(
        listed,
        vec![
            (Method::Get, "/v1/x".to_string()),
            (Method::Post, "/v1/x".to_string()),
            (Method::Get, "/v2/x".to_string()),
            (Method::Post, "/v2/x".to_string()),
            (Method::Get, "/root".to_string()),
        ]
    );

    let router = app.into_router();
    for uri in ["/v1/x", "/v2/x", "/root"] {
        let res = common::send(router.clone(), common::get(uri)).await;
        assert_eq!(res.status, StatusCode::OK, "{uri}");
    }
}

#[tokio::test]
async fn test_sub_router_works_standalone() {
    let sub = items_router();
    assert_eq!(sub.len(), 2);
    assert_eq!(sub.routes().iter().next().map(|r| r.path().to_string()), Some("/x".to_string()));

    let res = common::send(sub.into_router(), common::get("/x")).await;
    assert_eq!(res.status, StatusCode::OK);
    assert_eq!(res.body, "x");
}

#[tokio::test]
async fn test_duplicate_route_first_registration_wins() {
    let mut app = Application::new();
    app.route(Route::get("/dup").operation_id("first").handler(|_ctx| async { "first" }));
    app.route(Route::get("/dup").operation_id("second").handler(|_ctx| async { "second" }));

    assert_eq!(app.routes().len(), 2);

    let spec = serde_json::to_value(app.spec()).unwrap();
    assert_eq!(spec["paths"]["/dup"]["get"]["operationId"], "first");

    let res = common::send(app.into_router(), common::get("/dup")).await;
    assert_eq!(res.body, "first");
}

#[tokio::test]
async fn test_colon_params_are_normalized() {
    let mut app = Application::new();
    app.route(Route::get("/users/:id").handler(|ctx| async move {
        ctx.req.raw.param("id").unwrap_or_default().to_string()
    }));

    assert_eq!(app.routes().iter().next().unwrap().path(), "/users/{id}");

    let res = common::send(app.into_router(), common::get("/users/7")).await;
    assert_eq!(res.body, "7");
}

#[tokio::test]
async fn test_default_docs_viewers_are_mounted() {
    let app = Application::with_options(PartialApplicationOptions {
        openapi: Some(OpenApiOptions {
            info: InfoOptions {
                title: "Pets API".to_string(),
                version: "2.0.0".to_string(),
                description: None,
            },
            servers: Vec::new(),
        }),
        ..Default::default()
    });
    let router = app.into_router();

    let scalar = common::send(router.clone(), common::get("/docs")).await;
    assert_eq!(scalar.status, StatusCode::OK);
    assert!(scalar.headers["content-type"].to_str().unwrap().starts_with("text/html"));
    assert!(scalar.body.contains("<title>Pets API</title>"));
    assert!(scalar.body.contains("&#x2f;api&#x2f;openapi.json"));

    let redoc = common::send(router, common::get("/redocly")).await;
    assert_eq!(redoc.status, StatusCode::OK);
    assert!(redoc.body.contains("redoc"));
}

#[tokio::test]
async fn test_omitted_viewer_is_not_found() {
    let app = Application::with_options(PartialApplicationOptions {
        docs: Some(DocsOptions {
            scalar: Some("/reference".to_string()),
            redocly: None,
        }),
        ..Default::default()
    });
    let router = app.into_router();

    let res = common::send(router.clone(), common::get("/redocly")).await;
    assert_eq!(res.status, StatusCode::NOT_FOUND);

    let res = common::send(router.clone(), common::get("/docs")).await;
    assert_eq!(res.status, StatusCode::NOT_FOUND);

    let res = common::send(router, common::get("/reference")).await;
    assert_eq!(res.status, StatusCode::OK);
}

#[tokio::test]
async fn test_json_path_cannot_be_shadowed() {
    let mut app = Application::new();
    app.route(Route::get("/api/openapi.json").handler(|_ctx| async { "shadow" }));
    app.get("/health", || async { "ok" });

    let router = app.into_router();

    let res = common::send(router.clone(), common::get("/api/openapi.json")).await;
    assert_eq!(res.status, StatusCode::OK);
    assert_eq!(res.headers["content-type"], "application/json");
    assert_eq!(res.json()["openapi"], "3.0.3");

    let res = common::send(router, common::get("/health")).await;
    assert_eq!(res.body, "ok");
}

#[tokio::test]
async fn test_raw_routes_are_not_documented() {
    let mut app = Application::new();
    app.get("/health", || async { "ok" });
    app.route(Route::get("/pets").handler(|_ctx| async { "[]" }));

    assert_eq!(app.routes().len(), 1);
    let spec = serde_json::to_value(app.spec()).unwrap();
    assert!(spec["paths"].get("/health").is_none());
    assert!(spec["paths"].get("/pets").is_some());
}

#[tokio::test]
async fn test_unregistered_method_is_rejected() {
    let mut app = Application::new();
    app.route(Route::get("/only-get").handler(|_ctx| async { "ok" }));

    let res = common::send(app.into_router(), common::json_request("PUT", "/only-get", "")).await;
    assert_eq!(res.status, StatusCode::METHOD_NOT_ALLOWED);
}

#[tokio::test]
async fn test_renamed_parameter_is_skipped_not_fatal() {
    let mut app = Application::new();
    app.route(Route::get("/pets/:id").operation_id("getPet").handler(|ctx| async move {
        ctx.req.raw.param("id").unwrap_or_default().to_string()
    }));
    app.route(
        Route::delete("/pets/:petId")
            .operation_id("deletePet")
            .handler(|_ctx| async { "gone" }),
    );

    let mut sub = SubRouter::new();
    sub.route(Route::get("/{a}").handler(|_ctx| async { "a" }));
    sub.route(Route::post("/{b}").handler(|_ctx| async { "b" }));
    app.mount("/misc", sub);

    assert_eq!(app.routes().len(), 4);
    let router = app.into_router();

    let res = common::send(router.clone(), common::get("/pets/9")).await;
    assert_eq!(res.status, StatusCode::OK);
    assert_eq!(res.body, "9");

    let res = common::send(router.clone(), common::json_request("DELETE", "/pets/9", "")).await;
    assert_eq!(res.status, StatusCode::METHOD_NOT_ALLOWED);

    let res = common::send(router, common::get("/misc/z")).await;
    assert_eq!(res.body, "a");
}

#[tokio::test]
async fn test_empty_sub_route_lands_on_the_prefix() {
    let mut sub = SubRouter::new();
    sub.route(Route::get("").handler(|_ctx| async { "index" }));

    let mut app = Application::new();
    app.mount("/api", sub);
    assert_eq!(app.routes().iter().next().unwrap().path(), "/api");

    let router = app.into_router();
    let res = common::send(router.clone(), common::get("/api")).await;
    assert_eq!(res.status, StatusCode::OK);
    assert_eq!(res.body, "index");

    let res = common::send(router, common::get("/api/")).await;
    assert_eq!(res.status, StatusCode::NOT_FOUND);
}
