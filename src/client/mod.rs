//! Client identity
//!
//! Who is acting on a request and where it came from. Carried explicitly
//! into every handler that logs or mutates.

mod state;

pub use state::{Actor, ClientAddr};
