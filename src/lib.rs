//! Control plane for a small, compose-managed cluster of game servers.

pub mod cluster;
pub mod config;
pub mod container;
pub mod daemon;
pub mod error;
pub mod logs;
pub mod players;
pub mod router;
pub mod servers;

pub use error::{Error, Result};
pub use router::{create_app, AppState};
