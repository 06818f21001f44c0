//! Utility functions
//!
//! Logging setup and the rotating log file sink.

pub mod logging;
pub mod rotating_file;
