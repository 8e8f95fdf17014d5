//! peerboot cluster - Membership discovery and reconciliation
//!
//! This crate decides how a node enters its cluster:
//!
//! - `directory`: members API capability of a single endpoint
//! - `http`: HTTP/TLS implementation of the members API
//! - `discovery`: probing roster peers for a live cluster
//! - `reconcile`: join-vs-create decision and membership pruning
//! - `observer`: structured events emitted along the way
//! - `emitter`: startup parameters for the consensus process

pub mod directory;
pub mod discovery;
pub mod emitter;
pub mod http;
pub mod observer;
pub mod reconcile;

#[cfg(test)]
mod testing;

pub use directory::*;
pub use discovery::*;
pub use emitter::*;
pub use http::{HttpDirectory, HttpDirectoryFactory};
pub use observer::*;
pub use reconcile::Reconciler;
