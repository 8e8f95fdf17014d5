//! Membership reconciliation
//!
//! Decides whether the local node creates a new cluster or joins a live one,
//! and when joining brings the live membership in line with the roster:
//!
//! 1. query the roster for a live members API (first answer wins and stays
//!    the endpoint for the whole run)
//! 2. no live cluster: the initial cluster is the roster itself
//! 3. live cluster without the local node (or `force`): evict members whose
//!    peer host is not in the roster, plus a stale entry of the local node
//!    when forced, re-list, then register the local node if needed
//! 4. live cluster already listing the local node: leave it untouched

use crate::directory::{DirectoryFactory, MembershipDirectory};
use crate::discovery::{discover, LiveCluster};
use crate::observer::{ReconcileEvent, ReconcileObserver, TracingObserver};
use peerboot_core::{
    BootstrapConfig, ClusterState, Member, ReconciliationResult, RemoteMember, Result, UrlScheme,
};
use std::collections::HashSet;

/// One-shot reconciliation of the local node against the roster
pub struct Reconciler<F, O = TracingObserver> {
    factory: F,

    observer: O,

    me: Member,

    roster: Vec<Member>,

    urls: UrlScheme,

    force: bool,
}

impl<F: DirectoryFactory> Reconciler<F> {
    pub fn new(factory: F, config: &BootstrapConfig) -> Self {
        Self {
            factory,
            observer: TracingObserver,
            me: config.me.clone(),
            roster: config.members.clone(),
            urls: config.urls.clone(),
            force: config.force,
        }
    }
}

impl<F: DirectoryFactory, O: ReconcileObserver> Reconciler<F, O> {
    /// Report events to `observer` instead of `tracing`
    pub fn with_observer<P: ReconcileObserver>(self, observer: P) -> Reconciler<F, P> {
        Reconciler {
            factory: self.factory,
            observer,
            me: self.me,
            roster: self.roster,
            urls: self.urls,
            force: self.force,
        }
    }

    /// Run the whole pass; any error after discovery aborts it
    pub async fn run(&self) -> Result<ReconciliationResult> {
        let live = discover(&self.factory, &self.urls, &self.roster, &self.me, &self.observer).await;

        let result = match live {
            Some(live) if !live.members.is_empty() => {
                let is_member = live.members.iter().any(|m| m.name == self.me.name);
                if !is_member || self.force {
                    self.join(live).await?
                } else {
                    self.adopt(live)?
                }
            }
            _ => self.create(),
        };

        self.observer.on_event(ReconcileEvent::Reconciled {
            state: result.cluster_state,
            members: result.initial_cluster.len(),
        });
        Ok(result)
    }

    /// Brand-new cluster made of the whole roster
    fn create(&self) -> ReconciliationResult {
        self.observer.on_event(ReconcileEvent::CreatingCluster);

        let initial_cluster = self
            .roster
            .iter()
            .map(|m| format!("{}={}", m.name, self.urls.peer_url(&m.address)))
            .collect();

        ReconciliationResult {
            cluster_state: ClusterState::New,
            initial_cluster,
            self_name: self.me.name.clone(),
        }
    }

    async fn join(&self, live: LiveCluster<F::Directory>) -> Result<ReconciliationResult> {
        let LiveCluster {
            endpoint,
            directory,
            members,
        } = live;
        self.observer.on_event(ReconcileEvent::JoiningCluster {
            endpoint: endpoint.clone(),
        });

        // peer hosts come back lowercased, addresses are compared the same way
        let addresses: HashSet<String> = self.roster.iter().map(|m| m.address.to_ascii_lowercase()).collect();
        let mut add_required = true;

        for member in &members {
            let peer_host = member.peer_host().map_err(|e| e.at_endpoint(&endpoint))?;
            let stale = !addresses.contains(&peer_host.to_ascii_lowercase());
            let stale_self = self.force && member.name == self.me.name;

            if stale || stale_self {
                self.observer.on_event(ReconcileEvent::RemovingMember {
                    id: member.id.clone(),
                    name: member.name.clone(),
                    peer_host,
                });
                directory.remove_member(&member.id).await?;
                self.observer.on_event(ReconcileEvent::MemberRemoved {
                    id: member.id.clone(),
                });
            } else if peer_host.eq_ignore_ascii_case(&self.me.address) {
                // registered already, possibly unstarted
                add_required = false;
            }
        }

        let members = directory.list_members().await?;
        let self_peer_url = self.urls.peer_url(&self.me.address);
        let initial_cluster = self.initial_cluster(&members, &self_peer_url, &endpoint)?;

        if add_required {
            self.observer.on_event(ReconcileEvent::AddingSelf {
                peer_url: self_peer_url.clone(),
            });
            let added = directory.add_member(&self_peer_url).await?;
            self.observer.on_event(ReconcileEvent::SelfAdded { id: added.id });
        }

        Ok(ReconciliationResult {
            cluster_state: ClusterState::Existing,
            initial_cluster,
            self_name: self.me.name.clone(),
        })
    }

    /// Already a member and not forced: report the live membership as is
    fn adopt(&self, live: LiveCluster<F::Directory>) -> Result<ReconciliationResult> {
        self.observer.on_event(ReconcileEvent::AlreadyMember {
            endpoint: live.endpoint.clone(),
        });

        let self_peer_url = self.urls.peer_url(&self.me.address);
        let initial_cluster = self.initial_cluster(&live.members, &self_peer_url, &live.endpoint)?;

        Ok(ReconciliationResult {
            cluster_state: ClusterState::Existing,
            initial_cluster,
            self_name: self.me.name.clone(),
        })
    }

    /// Started members in listing order, then the local node
    fn initial_cluster(
        &self,
        members: &[RemoteMember],
        self_peer_url: &str,
        endpoint: &str,
    ) -> Result<Vec<String>> {
        let mut initial_cluster = Vec::with_capacity(members.len() + 1);

        for member in members {
            if member.is_unstarted() || member.name == self.me.name {
                continue;
            }
            let peer_url = member.peer_url().map_err(|e| e.at_endpoint(endpoint))?;
            initial_cluster.push(format!("{}={}", member.name, peer_url));
        }
        initial_cluster.push(format!("{}={}", self.me.name, self_peer_url));

        Ok(initial_cluster)
    }
}
