//! `cadence-core`: types and configuration shared by the daemon, the
//! controller, and the library crates in between.

pub mod config;
pub mod error;
pub mod types;

pub use config::CadenceConfig;
pub use error::{CadenceError, Result};
pub use types::JobId;
