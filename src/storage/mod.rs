//! File system storage management
//!
//! Handles path confinement, file system access and the file operations
//! behind the browse, upload, create-folder and delete routes.

pub mod filesystem;
pub mod operations;
pub mod results;
pub mod validation;

pub use filesystem::{FileSystem, LocalFs};
pub use validation::{PathResolver, ResolvedPath};
