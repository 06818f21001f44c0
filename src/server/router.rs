//! Route table

use axum::Router;
use axum::extract::DefaultBodyLimit;
use axum::middleware;
use axum::routing::{get, post};
use tower_http::services::ServeDir;

use crate::handlers::actions::{create_folder, delete, upload};
use crate::handlers::browse::browse;
use crate::handlers::download::download;
use crate::handlers::session::{check_session, login, login_page, logout};
use crate::middleware::{add_security_headers, log_request};
use crate::server::state::AppState;

/// Builds the application router. Every path not matched by a named route
/// is browsed relative to the root directory.
pub fn build_router(state: AppState) -> Router {
    let upload_limit = DefaultBodyLimit::max(state.settings.max_upload_bytes);
    let static_files = ServeDir::new(&state.settings.static_dir);

    Router::new()
        .route("/login", get(login_page).post(login))
        .route("/logout", get(logout))
        .route("/check-session", get(check_session))
        .route("/download", get(download))
        .route("/upload", post(upload).layer(upload_limit))
        .route("/create-folder", post(create_folder))
        .route("/delete", post(delete))
        .nest_service("/static", static_files)
        .fallback(browse)
        .layer(middleware::from_fn(add_security_headers))
        .layer(middleware::from_fn(log_request))
        .with_state(state)
}
