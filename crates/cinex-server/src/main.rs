use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Context;
use axum::{
    Json, Router, middleware,
    routing::{delete, get, post, put},
};
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use tracing::info;

use cinex_api::auth::{self, AppState, AppStateInner};
use cinex_api::lists;
use cinex_api::middleware::require_auth;
use cinex_api::movies;
use cinex_api::ratings;
use cinex_api::tmdb::TmdbClient;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load .env if present
    let _ = dotenvy::dotenv();

    // Init logging
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "cinex=debug,tower_http=debug".into()),
        )
        .init();

    // Config
    let jwt_secret =
        std::env::var("CINEX_JWT_SECRET").unwrap_or_else(|_| "dev-secret-change-me".into());
    let db_path = std::env::var("CINEX_DB_PATH").unwrap_or_else(|_| "cinex.db".into());
    let host = std::env::var("CINEX_HOST").unwrap_or_else(|_| "0.0.0.0".into());
    let port: u16 = std::env::var("CINEX_PORT")
        .unwrap_or_else(|_| "3000".into())
        .parse()?;
    let tmdb_api_key =
        std::env::var("CINEX_TMDB_API_KEY").context("CINEX_TMDB_API_KEY must be set")?;
    let tmdb_base_url = std::env::var("CINEX_TMDB_BASE_URL").ok();

    // Init database
    let db = cinex_db::Database::open(&PathBuf::from(&db_path))?;

    // Shared state
    let state: AppState = Arc::new(AppStateInner {
        db,
        jwt_secret,
        tmdb: TmdbClient::new(tmdb_api_key, tmdb_base_url),
    });

    // Routes
    let public_routes = Router::new()
        .route("/", get(index))
        .route("/auth/register", post(auth::register))
        .route("/auth/login", post(auth::login))
        .route("/movies/search", get(movies::search))
        .route("/movies/popular", get(movies::popular))
        .route("/movies/top", get(movies::top))
        .route("/movies/genre/{genre}", get(movies::by_genre))
        .route("/movies/{movie_id}", get(movies::detail))
        .route("/movies/{movie_id}/ratings", get(ratings::movie_ratings))
        .with_state(state.clone());

    let protected_routes = Router::new()
        .route("/auth/profile", get(auth::profile))
        .route("/movies", post(movies::save_from_catalog))
        .route("/ratings", post(ratings::rate_movie))
        .route("/ratings/mine/{movie_id}", get(ratings::my_rating))
        .route("/ratings/{rating_id}", put(ratings::update_rating))
        .route("/ratings/{rating_id}", delete(ratings::delete_rating))
        .route("/lists", get(lists::my_lists))
        .route("/lists/custom", post(lists::create_custom_list))
        .route("/lists/custom/{list_id}", delete(lists::delete_custom_list))
        .route(
            "/lists/custom/{list_id}/movies/{movie_id}",
            post(lists::add_to_custom_list),
        )
        .route("/lists/{kind}/movies/{movie_id}", post(lists::add_to_list))
        .route(
            "/lists/{kind}/movies/{movie_id}",
            delete(lists::remove_from_list),
        )
        .route("/lists/{selector}", get(lists::list_contents))
        .layer(middleware::from_fn(require_auth))
        .with_state(state);

    let app = Router::new()
        .merge(public_routes)
        .merge(protected_routes)
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http());

    let addr: SocketAddr = format!("{}:{}", host, port).parse()?;
    info!("Cinex server listening on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}

async fn index() -> Json<serde_json::Value> {
    Json(serde_json::json!({
        "message": "Cinex API",
        "version": env!("CARGO_PKG_VERSION"),
        "endpoints": {
            "auth": "/auth",
            "movies": "/movies",
            "ratings": "/ratings",
            "lists": "/lists",
        },
    }))
}
