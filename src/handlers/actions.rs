//! Mutating routes: upload, create-folder and delete.
//!
//! Each handler takes [`Authenticated`] as its first argument, so the
//! request body is never read for a caller without a live session.

use axum::extract::{Multipart, State};
use axum::response::Redirect;
use axum_extra::extract::Form;
use log::{info, warn};
use serde::Deserialize;
use std::sync::Arc;

use crate::auth::Authenticated;
use crate::error::FileManagerError;
use crate::handlers::{back_to, run_blocking};
use crate::server::state::AppState;
use crate::storage::operations::{create_folder as create_dir, delete_items, store_uploads};
use crate::storage::results::UploadedFile;

const CURRENT_PATH_FIELD: &str = "currentPath";
const UPLOAD_FILES_FIELD: &str = "uploadFiles";

pub async fn upload(
    State(state): State<AppState>,
    Authenticated(actor): Authenticated,
    mut multipart: Multipart,
) -> Result<Redirect, FileManagerError> {
    let mut current_path = String::new();
    let mut files = Vec::new();

    while let Some(field) = multipart.next_field().await.inspect_err(|e| {
        warn!("Error parsing upload form: {} from {}", e, actor);
    })? {
        let name = field.name().map(str::to_string);
        match name.as_deref() {
            Some(CURRENT_PATH_FIELD) => current_path = field.text().await?,
            Some(UPLOAD_FILES_FIELD) => {
                let file_name = field.file_name().unwrap_or_default().to_string();
                let contents = field.bytes().await?;
                if !file_name.is_empty() {
                    files.push(UploadedFile {
                        file_name,
                        contents,
                    });
                }
            }
            _ => {}
        }
    }

    let dir = state.resolver.resolve(&current_path)?;
    let fs = Arc::clone(&state.fs);
    let resolver = Arc::clone(&state.resolver);
    let uploader = actor.clone();
    let stored = run_blocking(move || {
        Ok(store_uploads(
            fs.as_ref(),
            &resolver,
            &current_path,
            &files,
            &uploader,
        )?)
    })
    .await?;

    info!(
        "Upload of {} files to {} completed by {}",
        stored.len(),
        dir.display_path(),
        actor
    );
    Ok(back_to(&dir))
}

#[derive(Debug, Deserialize)]
pub struct CreateFolderForm {
    #[serde(rename = "currentPath", default)]
    pub current_path: String,
    #[serde(rename = "folderName", default)]
    pub folder_name: String,
}

pub async fn create_folder(
    State(state): State<AppState>,
    Authenticated(actor): Authenticated,
    Form(form): Form<CreateFolderForm>,
) -> Result<Redirect, FileManagerError> {
    if form.folder_name.trim().is_empty() {
        return Err(FileManagerError::BadRequest(
            "Folder name is required".to_string(),
        ));
    }

    let dir = state.resolver.resolve(&form.current_path)?;
    let fs = Arc::clone(&state.fs);
    let resolver = Arc::clone(&state.resolver);
    run_blocking(move || {
        Ok(create_dir(
            fs.as_ref(),
            &resolver,
            &form.current_path,
            &form.folder_name,
            &actor,
        )?)
    })
    .await?;

    Ok(back_to(&dir))
}

#[derive(Debug, Deserialize)]
pub struct DeleteForm {
    #[serde(rename = "currentPath", default)]
    pub current_path: String,
    #[serde(default)]
    pub items: Vec<String>,
}

pub async fn delete(
    State(state): State<AppState>,
    Authenticated(actor): Authenticated,
    Form(form): Form<DeleteForm>,
) -> Result<Redirect, FileManagerError> {
    if form.items.is_empty() {
        return Err(FileManagerError::BadRequest(
            "No items selected for deletion".to_string(),
        ));
    }

    let dir = state.resolver.resolve(&form.current_path)?;
    let fs = Arc::clone(&state.fs);
    let resolver = Arc::clone(&state.resolver);
    let deleter = actor.clone();
    let items = form.items;
    let report = run_blocking(move || Ok(delete_items(fs.as_ref(), &resolver, &items, &deleter)?))
        .await?;

    if !report.failed.is_empty() {
        warn!(
            "Delete finished with {} failures ({} deleted) by {}",
            report.failed.len(),
            report.deleted.len(),
            actor
        );
    }
    Ok(back_to(&dir))
}
