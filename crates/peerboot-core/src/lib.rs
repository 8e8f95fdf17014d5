//! peerboot core - Core types, configuration and errors for cluster bootstrap

pub mod config;
pub mod error;
pub mod types;

pub use config::*;
pub use error::*;
pub use types::*;
