//! Membership directory capability

use peerboot_core::{RemoteMember, Result};
use std::future::Future;

/// Members API of a single cluster endpoint
///
/// `add_member` and `remove_member` mutate the live cluster and are not
/// idempotent; callers check the current membership before using them.
pub trait MembershipDirectory: Send + Sync {
    /// Endpoint this directory talks to
    fn endpoint(&self) -> &str;

    /// List the current members
    fn list_members(&self) -> impl Future<Output = Result<Vec<RemoteMember>>> + Send;

    /// Register a new voting member advertising `peer_url`
    fn add_member(&self, peer_url: &str) -> impl Future<Output = Result<RemoteMember>> + Send;

    /// Evict a member by its cluster-assigned id
    fn remove_member(&self, id: &str) -> impl Future<Output = Result<()>> + Send;
}

/// Builds directories for endpoint URLs, selected once from configuration
pub trait DirectoryFactory {
    type Directory: MembershipDirectory;

    fn connect(&self, endpoint: &str) -> Result<Self::Directory>;
}
