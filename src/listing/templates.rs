//! Page templates

use askama::Template;

use crate::listing::format::{
    Crumb, breadcrumbs, encode_path, file_icon, format_modified, readable_size,
};
use crate::listing::readme::render_markdown;
use crate::storage::results::{DirectoryListing, EntryInfo};

/// One row of the directory table.
#[derive(Debug, Clone)]
pub struct EntryView {
    pub name: String,
    /// Virtual path submitted by the download and delete forms.
    pub item: String,
    pub href: String,
    pub icon: &'static str,
    pub is_dir: bool,
    pub size: String,
    pub modified: String,
}

impl EntryView {
    fn new(dir_display_path: &str, entry: &EntryInfo) -> Self {
        let item = format!("{}{}", dir_display_path, entry.name);
        let mut href = encode_path(&item);
        if entry.is_dir {
            href.push('/');
        }
        Self {
            name: entry.name.clone(),
            item,
            href,
            icon: if entry.is_dir { "folder" } else { file_icon(&entry.name) },
            is_dir: entry.is_dir,
            size: if entry.is_dir {
                String::new()
            } else {
                readable_size(entry.size)
            },
            modified: format_modified(entry.modified),
        }
    }
}

/// Directory listing page
#[derive(Template)]
#[template(path = "index.html")]
pub struct IndexTemplate {
    /// Virtual path of the directory, always `/`-terminated.
    pub path: String,
    pub full_path: String,
    pub entries: Vec<EntryView>,
    pub parent: Option<String>,
    pub crumbs: Vec<Crumb>,
    pub logged_in: bool,
    pub readme_html: Option<String>,
}

impl IndexTemplate {
    pub fn new(listing: &DirectoryListing, logged_in: bool) -> Self {
        let path = match listing.path.virtual_path() {
            "" => "/".to_string(),
            virtual_path => format!("/{virtual_path}/"),
        };
        Self {
            entries: listing
                .entries
                .iter()
                .map(|entry| EntryView::new(&path, entry))
                .collect(),
            full_path: listing.path.real_path().display().to_string(),
            parent: listing
                .path
                .parent_display_path()
                .map(|parent| encode_path(&parent)),
            crumbs: breadcrumbs(listing.path.virtual_path()),
            logged_in,
            readme_html: listing.readme.as_deref().map(render_markdown),
            path,
        }
    }
}

/// Login form
#[derive(Template)]
#[template(path = "login.html")]
pub struct LoginTemplate {
    pub error: Option<String>,
}

impl LoginTemplate {
    pub fn new() -> Self {
        Self { error: None }
    }

    pub fn failed() -> Self {
        Self {
            error: Some("Authentication failed. Please try again.".to_string()),
        }
    }
}

impl Default for LoginTemplate {
    fn default() -> Self {
        Self::new()
    }
}
