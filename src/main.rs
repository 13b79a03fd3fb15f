use axum::{routing::get, Router};
use serde_json::{json, Value};
use tower_http::{cors::CorsLayer, trace::TraceLayer};

use stores_api::config;
use stores_api::database::manager::DatabaseManager;

#[tokio::main]
async fn main() {
    // Load .env if present so cargo run picks up DATABASE_URL, JWT_SECRET, etc.
    let _ = dotenvy::dotenv();

    tracing_subscriber::fmt::init();

    let config = config::config();
    tracing::info!("Starting Stores API in {:?} mode", config.environment);

    // Apply pending migrations; a missing database only degrades /health,
    // it does not prevent the server from starting.
    if let Err(e) = DatabaseManager::migrate().await {
        tracing::error!("migrations not applied: {}", e);
    }

    let app = app();

    // Allow tests or deployments to override port via env
    let port = std::env::var("STORES_API_PORT")
        .ok()
        .or_else(|| std::env::var("PORT").ok())
        .and_then(|s| s.parse::<u16>().ok())
        .unwrap_or(3000);

    let bind_addr = format!("0.0.0.0:{}", port);
    let listener = tokio::net::TcpListener::bind(&bind_addr)
        .await
        .unwrap_or_else(|e| panic!("failed to bind {}: {}", bind_addr, e));

    tracing::info!("Stores API listening on http://{}", bind_addr);

    axum::serve(listener, app).await.expect("server");
}

fn app() -> Router {
    let mut app = Router::new()
        .route("/", get(root))
        .route("/health", get(health))
        .merge(auth_routes())
        .merge(store_routes())
        .merge(item_routes())
        .merge(tag_routes());

    if config::config().security.enable_cors {
        app = app.layer(CorsLayer::permissive());
    }

    app.layer(TraceLayer::new_for_http())
}

fn auth_routes() -> Router {
    use axum::routing::post;
    use stores_api::handlers::auth;

    Router::new()
        .route("/auth/register", post(auth::register))
        .route("/auth/login", post(auth::login))
        .route("/auth/refresh", post(auth::refresh))
        .route("/auth/logout", post(auth::logout))
}

fn store_routes() -> Router {
    use stores_api::handlers::stores;

    Router::new()
        .route("/store", get(stores::list).post(stores::create))
        .route("/store/:store_id", get(stores::get).delete(stores::delete))
}

fn item_routes() -> Router {
    use axum::routing::post;
    use stores_api::handlers::{items, tags};

    Router::new()
        .route("/item", get(items::list).post(items::create))
        .route(
            "/item/:item_id",
            get(items::get).put(items::put).delete(items::delete),
        )
        .route(
            "/item/:item_id/tag/:tag_id",
            post(tags::link).delete(tags::unlink),
        )
        .route("/itemtags", get(tags::list_pairs))
}

fn tag_routes() -> Router {
    use stores_api::handlers::tags;

    Router::new()
        .route(
            "/store/:store_id/tag",
            get(tags::list_for_store).post(tags::create_in_store),
        )
        .route("/tag", get(tags::list))
        .route("/tag/:tag_id", get(tags::get).delete(tags::delete))
}

async fn root() -> axum::response::Json<Value> {
    let version = env!("CARGO_PKG_VERSION");

    axum::response::Json(json!({
        "name": "Stores REST API",
        "version": version,
        "endpoints": {
            "auth": "/auth/register, /auth/login, /auth/refresh, /auth/logout",
            "stores": "/store[/:id], /store/:id/tag",
            "items": "/item[/:id], /item/:id/tag/:tag_id, /itemtags",
            "tags": "/tag[/:id]",
        }
    }))
}

async fn health() -> impl axum::response::IntoResponse {
    let now = chrono::Utc::now();

    match DatabaseManager::health_check().await {
        Ok(_) => (
            axum::http::StatusCode::OK,
            axum::response::Json(json!({
                "status": "ok",
                "timestamp": now,
                "database": "ok"
            })),
        ),
        Err(e) => (
            axum::http::StatusCode::SERVICE_UNAVAILABLE,
            axum::response::Json(json!({
                "status": "degraded",
                "timestamp": now,
                "database_error": e.to_string()
            })),
        ),
    }
}
