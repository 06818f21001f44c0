//! Directory listing presentation
//!
//! Turns storage listings into the view models rendered by the askama
//! templates under `templates/`.

pub mod format;
pub mod readme;
pub mod templates;

pub use templates::{IndexTemplate, LoginTemplate};
