//! Directory listings and raw file delivery for `GET /<path>`.

use askama::Template;
use axum::extract::{Request, State};
use axum::http::{Method, StatusCode, header};
use axum::response::{Html, IntoResponse, Response};
use axum_extra::extract::cookie::CookieJar;
use log::{debug, info, warn};
use std::sync::Arc;
use tower::ServiceExt;
use tower_http::services::ServeFile;

use crate::client::ClientAddr;
use crate::error::{FileManagerError, StorageError};
use crate::handlers::{directory_url, run_blocking};
use crate::listing::IndexTemplate;
use crate::server::state::AppState;
use crate::session::cookie::session_token;
use crate::storage::operations::list_directory;

pub async fn browse(
    State(state): State<AppState>,
    client: ClientAddr,
    jar: CookieJar,
    request: Request,
) -> Result<Response, FileManagerError> {
    if !matches!(*request.method(), Method::GET | Method::HEAD) {
        return Ok(StatusCode::METHOD_NOT_ALLOWED.into_response());
    }

    let raw_path = request.uri().path().to_string();
    let decoded = urlencoding::decode(&raw_path)
        .map_err(|_| StorageError::NotFound(raw_path.clone()))?;
    let resolved = state.resolver.resolve(&decoded).inspect_err(|e| {
        warn!("Path not found: {} from IP: {}", e, client);
    })?;

    let fs = Arc::clone(&state.fs);
    let real_path = resolved.real_path().to_path_buf();
    let metadata = run_blocking(move || Ok(fs.metadata(&real_path)?))
        .await
        .map_err(|_| {
            warn!(
                "Path not found: {} from IP: {}",
                resolved.real_path().display(),
                client
            );
            StorageError::NotFound(resolved.display_path())
        })?;

    if !metadata.is_dir() {
        info!(
            "File served: {} to IP: {}",
            resolved.real_path().display(),
            client
        );
        let response = ServeFile::new(resolved.real_path())
            .oneshot(request)
            .await
            .map(IntoResponse::into_response)
            .unwrap_or_else(|never| match never {});
        return Ok(response);
    }

    if !raw_path.ends_with('/') {
        // Rebuilt from the resolved path so `//host` never becomes the target.
        let location = directory_url(&resolved);
        return Ok((StatusCode::MOVED_PERMANENTLY, [(header::LOCATION, location)]).into_response());
    }

    let logged_in = match session_token(&jar) {
        Some(token) => state.sessions.validate(&token).await.is_some(),
        None => false,
    };

    let fs = Arc::clone(&state.fs);
    let dir = resolved.clone();
    let listing = run_blocking(move || Ok(list_directory(fs.as_ref(), &dir)?)).await?;
    debug!(
        "Rendering listing of {} ({} entries) for IP: {}",
        resolved.display_path(),
        listing.entries.len(),
        client
    );

    let page = IndexTemplate::new(&listing, logged_in).render()?;
    Ok(Html(page).into_response())
}
