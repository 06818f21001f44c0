//! `GET /download?items=...`: one file as-is, several as a zip bundle
//! streamed while it is written.

use axum::body::Body;
use axum::extract::{Request, State};
use axum::http::header;
use axum::response::{IntoResponse, Response};
use axum_extra::extract::Query;
use log::{debug, info};
use serde::Deserialize;
use std::sync::Arc;
use tokio_util::io::ReaderStream;
use tower::ServiceExt;
use tower_http::services::ServeFile;

use crate::archive::{ARCHIVE_NAME, DownloadPlan, select_files, stream_bundle};
use crate::client::ClientAddr;
use crate::error::{ArchiveError, FileManagerError};
use crate::handlers::run_blocking;
use crate::server::state::AppState;

#[derive(Debug, Deserialize)]
pub struct DownloadQuery {
    #[serde(default)]
    pub items: Vec<String>,
}

pub async fn download(
    State(state): State<AppState>,
    client: ClientAddr,
    Query(query): Query<DownloadQuery>,
    request: Request,
) -> Result<Response, FileManagerError> {
    if query.items.is_empty() {
        return Err(ArchiveError::NoSelection.into());
    }

    let fs = Arc::clone(&state.fs);
    let resolver = Arc::clone(&state.resolver);
    let items = query.items;
    let plan = run_blocking(move || Ok(select_files(fs.as_ref(), &resolver, &items)?)).await?;

    match plan {
        DownloadPlan::Single(file) => {
            info!(
                "File downloaded: {} by IP: {}",
                file.real_path().display(),
                client
            );
            let response = ServeFile::new(file.real_path())
                .oneshot(request)
                .await
                .map(IntoResponse::into_response)
                .unwrap_or_else(|never| match never {});
            Ok(response)
        }
        DownloadPlan::Bundle(files) => {
            debug!("Streaming archive of {} files to IP: {}", files.len(), client);
            let pipe = stream_bundle(Arc::clone(&state.fs), files, client);
            let disposition = format!("attachment; filename=\"{ARCHIVE_NAME}\"");
            Ok((
                [
                    (header::CONTENT_TYPE, "application/zip".to_string()),
                    (header::CONTENT_DISPOSITION, disposition),
                ],
                Body::from_stream(ReaderStream::new(pipe)),
            )
                .into_response())
        }
    }
}
