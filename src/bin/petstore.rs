//! Petstore demo server.
//!
//! Registers a typed pets API under `/api`, serves the generated document
//! and the documentation viewers, and exposes Prometheus metrics on a
//! separate listener when asked to.

use std::collections::BTreeMap;
use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use axum::http::StatusCode;
use axum::Json;
use clap::Parser;
use openapi_router::config::{load_options, ApplicationOptions};
use openapi_router::observability::{logging, metrics};
use openapi_router::routing::BodySpec;
use openapi_router::{Application, HandlerError, ResponseSpec, Route, SubRouter, Typed};
use serde::{Deserialize, Serialize};
use serde_json::json;
use tokio::sync::RwLock;
use utoipa::openapi::schema::{ArrayBuilder, Ref, Schema};
use utoipa::openapi::RefOr;
use utoipa::ToSchema;

#[derive(Parser)]
#[command(name = "petstore")]
#[command(about = "Demo pets API with a generated OpenAPI document", long_about = None)]
struct Cli {
    /// TOML options file
    #[arg(short, long)]
    config: Option<PathBuf>,

    #[arg(short, long, default_value = "127.0.0.1:3000")]
    bind: String,

    /// Log filter directive, overridden by RUST_LOG
    #[arg(long)]
    log_level: Option<String>,

    /// Prometheus scrape address
    #[arg(long)]
    metrics_bind: Option<SocketAddr>,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
struct Pet {
    id: u64,
    name: String,
    #[schema(example = "dog")]
    tag: Option<String>,
}

#[derive(Debug, Deserialize, ToSchema)]
struct NewPet {
    name: String,
    tag: Option<String>,
}

#[derive(Debug, Deserialize, ToSchema)]
struct PetPath {
    id: u64,
}

#[derive(Debug, Deserialize, ToSchema)]
struct ListPets {
    /// Maximum number of pets to return
    limit: Option<usize>,
    tag: Option<String>,
}

#[derive(Debug, Serialize, ToSchema)]
struct ApiError {
    message: String,
}

#[derive(Default)]
struct Store {
    next_id: AtomicU64,
    pets: RwLock<BTreeMap<u64, Pet>>,
}

fn pet_list_schema() -> RefOr<Schema> {
    RefOr::T(Schema::Array(
        ArrayBuilder::new().items(Ref::from_schema_name("Pet")).build(),
    ))
}

fn pets_router(store: Arc<Store>) -> SubRouter {
    let mut pets = SubRouter::new();

    let list_store = Arc::clone(&store);
    pets.route(
        Route::get("/pets")
            .operation_id("listPets")
            .summary("List all pets")
            .tag("pets")
            .query(Typed::<ListPets>::new())
            .response(
                200,
                ResponseSpec::with_schema("A page of pets", pet_list_schema()).component::<Pet>(),
            )
            .handler(move |ctx| {
                let store = Arc::clone(&list_store);
                async move {
                    let query = ctx.req.query.unwrap_or(ListPets { limit: None, tag: None });
                    let pets = store.pets.read().await;
                    let page: Vec<Pet> = pets
                        .values()
                        .filter(|pet| query.tag.is_none() || pet.tag == query.tag)
                        .take(query.limit.unwrap_or(usize::MAX))
                        .cloned()
                        .collect();
                    Json(page)
                }
            }),
    );

    let create_store = Arc::clone(&store);
    pets.route(
        Route::post("/pets")
            .operation_id("createPet")
            .summary("Create a pet")
            .tag("pets")
            .body_spec(
                BodySpec::json(
                    Typed::<NewPet>::new()
                        .refine(|pet| !pet.name.trim().is_empty(), "name is blank"),
                )
                    .description("Pet to add to the store")
                    .named_example("dog", json!({ "name": "Rex", "tag": "dog" }))
                    .named_example("cat", json!({ "name": "Tom", "tag": "cat" })),
            )
            .response(201, ResponseSpec::json::<Pet>("Pet created"))
            .handler(move |mut ctx| {
                let store = Arc::clone(&create_store);
                async move {
                    let Some(new_pet) = ctx.take_body() else {
                        return Err(HandlerError::msg("validated body missing"));
                    };
                    let id = store.next_id.fetch_add(1, Ordering::Relaxed) + 1;
                    let pet = Pet {
                        id,
                        name: new_pet.name,
                        tag: new_pet.tag,
                    };
                    store.pets.write().await.insert(id, pet.clone());
                    tracing::info!(pet_id = id, "pet created");
                    ctx.res.status(StatusCode::CREATED);
                    Ok(Json(pet))
                }
            }),
    );

    let show_store = Arc::clone(&store);
    pets.route(
        Route::get("/pets/{id}")
            .operation_id("showPetById")
            .summary("Info for a specific pet")
            .tag("pets")
            .params(Typed::<PetPath>::new())
            .response(200, ResponseSpec::json::<Pet>("Expected response to a valid request"))
            .response(
                404,
                ResponseSpec::json::<ApiError>("Pet not found")
                    .example(json!({ "message": "not found" })),
            )
            .handler(move |ctx| {
                let store = Arc::clone(&show_store);
                async move {
                    let Some(PetPath { id }) = ctx.req.params else {
                        return Err(HandlerError::msg("validated params missing"));
                    };
                    let pet = store.pets.read().await.get(&id).cloned();
                    match pet {
                        Some(pet) => ctx.respond(serde_json::to_value(pet)?, None),
                        None => ctx.respond(
                            json!({ "message": "not found" }),
                            Some(StatusCode::NOT_FOUND),
                        ),
                    }
                    Ok::<(), HandlerError>(())
                }
            }),
    );

    let delete_store = Arc::clone(&store);
    pets.route(
        Route::delete("/pets/{id}")
            .operation_id("deletePet")
            .tag("pets")
            .params(Typed::<PetPath>::new())
            .response(204, ResponseSpec::empty("Pet removed"))
            .response(404, ResponseSpec::empty("Pet not found"))
            .handler(move |ctx| {
                let store = Arc::clone(&delete_store);
                async move {
                    let removed = match ctx.req.params {
                        Some(PetPath { id }) => store.pets.write().await.remove(&id),
                        None => None,
                    };
                    let status = if removed.is_some() {
                        StatusCode::NO_CONTENT
                    } else {
                        StatusCode::NOT_FOUND
                    };
                    ctx.res.send_with(status, "");
                }
            }),
    );

    pets
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    let directive = cli.log_level.clone().unwrap_or_else(logging::default_directive);
    logging::init(&directive)?;

    tracing::info!("petstore v{} starting", env!("CARGO_PKG_VERSION"));

    let options = match &cli.config {
        Some(path) => load_options(path)?,
        None => ApplicationOptions::default(),
    };

    tracing::info!(
        json_path = %options.json_path,
        scalar = ?options.docs.scalar_path(),
        redocly = ?options.docs.redocly_path(),
        mock_examples = options.generate_mock_examples,
        "Configuration loaded"
    );

    if let Some(addr) = cli.metrics_bind {
        metrics::install_prometheus(addr)?;
    }

    let store = Arc::new(Store::default());
    let mut app = Application::from_options(options);
    app.mount("/api/", pets_router(store));
    app.get("/health", || async { "ok" });

    app.listen(&cli.bind).await?;

    tracing::info!("Shutdown complete");
    Ok(())
}
