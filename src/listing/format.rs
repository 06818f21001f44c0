//! Formatting helpers for the listing page

use chrono::{DateTime, Local};
use std::path::Path;
use std::time::SystemTime;

/// Material icon name for a file, chosen by extension.
pub fn file_icon(name: &str) -> &'static str {
    let ext = Path::new(name)
        .extension()
        .map(|ext| ext.to_string_lossy().to_lowercase())
        .unwrap_or_default();
    match ext.as_str() {
        "txt" | "doc" | "docx" => "description",
        "pdf" => "picture_as_pdf",
        "jpg" | "jpeg" | "png" | "gif" | "bmp" => "image",
        "zip" | "rar" | "7z" | "tar" | "gz" => "archive",
        "xls" | "xlsx" => "grid_on",
        "ppt" | "pptx" => "slideshow",
        "mp3" | "wav" | "aac" => "audiotrack",
        "mp4" | "avi" | "mov" | "mkv" => "movie",
        _ => "insert_drive_file",
    }
}

/// Size in 1024-based units with one decimal (`512 B`, `1.5 KB`).
pub fn readable_size(size: u64) -> String {
    const UNIT: u64 = 1024;
    const PREFIXES: [char; 6] = ['K', 'M', 'G', 'T', 'P', 'E'];
    if size < UNIT {
        return format!("{size} B");
    }
    let mut div = UNIT;
    let mut exp = 0;
    let mut n = size / UNIT;
    while n >= UNIT {
        div *= UNIT;
        exp += 1;
        n /= UNIT;
    }
    format!("{:.1} {}B", size as f64 / div as f64, PREFIXES[exp])
}

pub fn format_modified(modified: Option<SystemTime>) -> String {
    match modified {
        Some(time) => DateTime::<Local>::from(time)
            .format("%Y-%m-%d %H:%M:%S")
            .to_string(),
        None => String::new(),
    }
}

/// Percent-encodes every segment of a `/`-separated virtual path.
pub fn encode_path(path: &str) -> String {
    path.split('/')
        .map(|segment| urlencoding::encode(segment).into_owned())
        .collect::<Vec<_>>()
        .join("/")
}

/// One link of the breadcrumb trail.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Crumb {
    pub name: String,
    pub href: String,
}

/// Breadcrumbs for a root-relative virtual path (`a/b` gives `a`, `a/b`).
pub fn breadcrumbs(virtual_path: &str) -> Vec<Crumb> {
    let mut href = String::from("/");
    virtual_path
        .split('/')
        .filter(|segment| !segment.is_empty())
        .map(|segment| {
            href.push_str(&urlencoding::encode(segment));
            href.push('/');
            Crumb {
                name: segment.to_string(),
                href: href.clone(),
            }
        })
        .collect()
}
