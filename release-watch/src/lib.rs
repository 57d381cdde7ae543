//! release-watch library crate.
//!
//! Watches GitHub repositories for new releases and forwards each new release
//! to the configured notification channels exactly once.

pub mod config;
pub mod domain;
pub mod error;
pub mod logging;
pub mod monitor;
pub mod notification;
pub mod state;
pub mod utils;

pub use error::{Error, Result};
