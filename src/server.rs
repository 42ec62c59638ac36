//! HTTP server.
//!
//! A thin JSON shell over [`ContentService`]: every route renders the
//! canonical entities as JSON and leaves presentation to the client.
//!
//! # Endpoints
//!
//! | Method | Path | Description |
//! |--------|------|-------------|
//! | `GET`  | `/` | Home page: articles (optionally `?search=` / `?category=`) and sidebar |
//! | `POST` | `/search` | Form submit; redirects to `/?search=...` |
//! | `GET`  | `/category/{slug}` | Redirects to `/?category=...` |
//! | `GET`  | `/article/{id}` | One article plus the sidebar |
//! | `GET`  | `/health` | Health check (returns version) |
//!
//! # Error Contract
//!
//! The home page never fails; when the backend is unavailable it is served
//! empty. Other errors use a JSON body:
//!
//! ```json
//! { "error": { "code": "not_found", "message": "no article with id: 42" } }
//! ```
//!
//! Error codes: `not_found` (404), `internal` (500).

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::{IntoResponse, Redirect, Response},
    routing::{get, post},
    Form, Json, Router,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tower_http::cors::{Any, CorsLayer};
use tracing::{error, info};

use crate::config::Config;
use crate::models::{Article, Sidebar};
use crate::service::{ContentService, HomePage};
use crate::sigv4::uri_encode;

/// Shared application state passed to all route handlers via Axum's `State` extractor.
#[derive(Clone)]
struct AppState {
    /// Site name shown on every page.
    site_name: Arc<str>,
    service: Arc<ContentService>,
}

/// Starts the HTTP server on `[server].bind` and runs until the process exits.
pub async fn run_server(config: &Config, service: ContentService) -> anyhow::Result<()> {
    let app = router(&config.site.name, service);

    let listener = tokio::net::TcpListener::bind(&config.server.bind).await?;
    info!(addr = %listener.local_addr()?, "portal listening");
    axum::serve(listener, app).await?;

    Ok(())
}

/// Build the router without binding, for embedding or tests.
pub fn router(site_name: &str, service: ContentService) -> Router {
    let state = AppState {
        site_name: Arc::from(site_name),
        service: Arc::new(service),
    };

    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .route("/", get(handle_home))
        .route("/search", post(handle_search))
        .route("/category/{slug}", get(handle_category))
        .route("/article/{id}", get(handle_article))
        .route("/health", get(handle_health))
        .layer(cors)
        .with_state(state)
}

// ============ Error response ============

#[derive(Serialize)]
struct ErrorBody {
    error: ErrorDetail,
}

#[derive(Serialize)]
struct ErrorDetail {
    code: String,
    message: String,
}

/// Internal error type that converts into an Axum HTTP response.
struct AppError {
    status: StatusCode,
    code: String,
    message: String,
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let body = ErrorBody {
            error: ErrorDetail {
                code: self.code,
                message: self.message,
            },
        };
        (self.status, Json(body)).into_response()
    }
}

fn not_found(message: impl Into<String>) -> AppError {
    AppError {
        status: StatusCode::NOT_FOUND,
        code: "not_found".to_string(),
        message: message.into(),
    }
}

fn internal(message: impl Into<String>) -> AppError {
    AppError {
        status: StatusCode::INTERNAL_SERVER_ERROR,
        code: "internal".to_string(),
        message: message.into(),
    }
}

// ============ GET / ============

#[derive(Deserialize)]
struct HomeQuery {
    search: Option<String>,
    category: Option<String>,
}

#[derive(Serialize)]
struct HomeResponse {
    name: String,
    #[serde(flatten)]
    page: HomePage,
}

async fn handle_home(
    State(state): State<AppState>,
    Query(query): Query<HomeQuery>,
) -> Json<HomeResponse> {
    let page = state
        .service
        .home(query.search.as_deref(), query.category.as_deref())
        .await;
    Json(HomeResponse {
        name: state.site_name.to_string(),
        page,
    })
}

// ============ POST /search ============

#[derive(Deserialize)]
struct SearchForm {
    #[serde(default)]
    search: String,
}

async fn handle_search(Form(form): Form<SearchForm>) -> Redirect {
    Redirect::to(&format!("/?search={}", uri_encode(&form.search)))
}

// ============ GET /category/{slug} ============

async fn handle_category(Path(slug): Path<String>) -> Redirect {
    Redirect::to(&format!("/?category={}", uri_encode(&slug)))
}

// ============ GET /article/{id} ============

#[derive(Serialize)]
struct ArticleResponse {
    name: String,
    article: Article,
    sidebar: Sidebar,
}

async fn handle_article(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<ArticleResponse>, AppError> {
    let article = state
        .service
        .get_article_by_id(&id)
        .await
        .map_err(|err| {
            error!(error = %err, id = %id, "failed to load article");
            internal("failed to load article")
        })?
        .ok_or_else(|| not_found(format!("no article with id: {}", id)))?;

    Ok(Json(ArticleResponse {
        name: state.site_name.to_string(),
        article,
        sidebar: state.service.sidebar_or_empty().await,
    }))
}

// ============ GET /health ============

#[derive(Serialize)]
struct HealthResponse {
    status: String,
    version: String,
}

async fn handle_health() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
    })
}
