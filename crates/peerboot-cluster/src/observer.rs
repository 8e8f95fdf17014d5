//! Reconciliation events

use peerboot_core::ClusterState;

/// Something discovery or the engine did
#[derive(Clone, Debug, Eq, PartialEq)]
pub enum ReconcileEvent {
    /// A candidate did not answer with a membership list
    CandidateFailed { endpoint: String, error: String },

    /// A candidate answered; it stays the endpoint for the rest of the run
    ClusterFound { endpoint: String, members: usize },

    /// No candidate answered
    NoLiveCluster,

    CreatingCluster,

    JoiningCluster { endpoint: String },

    /// The local node is already listed and no rejoin was forced
    AlreadyMember { endpoint: String },

    RemovingMember { id: String, name: String, peer_host: String },

    MemberRemoved { id: String },

    AddingSelf { peer_url: String },

    SelfAdded { id: String },

    Reconciled { state: ClusterState, members: usize },
}

/// Receives reconciliation events
pub trait ReconcileObserver {
    fn on_event(&self, event: ReconcileEvent);
}

/// Reports events through `tracing`
#[derive(Clone, Copy, Debug, Default)]
pub struct TracingObserver;

impl ReconcileObserver for TracingObserver {
    fn on_event(&self, event: ReconcileEvent) {
        match event {
            ReconcileEvent::CandidateFailed { endpoint, error } => {
                tracing::warn!(%endpoint, %error, "unable to list cluster members");
            }
            ReconcileEvent::ClusterFound { endpoint, members } => {
                tracing::info!(%endpoint, members, "found live cluster");
            }
            ReconcileEvent::NoLiveCluster => {
                tracing::info!("no live cluster reachable");
            }
            ReconcileEvent::CreatingCluster => {
                tracing::info!("creating new cluster");
            }
            ReconcileEvent::JoiningCluster { endpoint } => {
                tracing::info!(%endpoint, "joining an existing cluster");
            }
            ReconcileEvent::AlreadyMember { endpoint } => {
                tracing::info!(%endpoint, "already a cluster member, leaving membership untouched");
            }
            ReconcileEvent::RemovingMember { id, name, peer_host } => {
                tracing::info!(%id, %name, %peer_host, "removing member");
            }
            ReconcileEvent::MemberRemoved { id } => {
                tracing::debug!(%id, "member removed");
            }
            ReconcileEvent::AddingSelf { peer_url } => {
                tracing::info!(%peer_url, "adding member");
            }
            ReconcileEvent::SelfAdded { id } => {
                tracing::debug!(%id, "member added");
            }
            ReconcileEvent::Reconciled { state, members } => {
                tracing::info!(%state, members, "reconciled");
            }
        }
    }
}
