//! Peer discovery

use crate::directory::{DirectoryFactory, MembershipDirectory};
use crate::observer::{ReconcileEvent, ReconcileObserver};
use peerboot_core::{Member, RemoteMember, UrlScheme};

/// A cluster endpoint that answered with its membership list
pub struct LiveCluster<D> {
    pub endpoint: String,

    /// Directory of `endpoint`, used for every later call of the run
    pub directory: D,

    pub members: Vec<RemoteMember>,
}

/// Find the first roster peer (other than `me`) whose members API answers
///
/// Per-candidate failures are reported to `observer` and skipped; `None` means
/// no live cluster was found.
pub async fn discover<F, O>(
    factory: &F,
    urls: &UrlScheme,
    roster: &[Member],
    me: &Member,
    observer: &O,
) -> Option<LiveCluster<F::Directory>>
where
    F: DirectoryFactory,
    O: ReconcileObserver,
{
    for member in roster.iter().filter(|m| m.address != me.address) {
        let endpoint = urls.client_url(&member.address);

        let directory = match factory.connect(&endpoint) {
            Ok(directory) => directory,
            Err(e) => {
                observer.on_event(ReconcileEvent::CandidateFailed {
                    endpoint,
                    error: e.to_string(),
                });
                continue;
            }
        };

        match directory.list_members().await {
            Ok(members) => {
                observer.on_event(ReconcileEvent::ClusterFound {
                    endpoint: endpoint.clone(),
                    members: members.len(),
                });
                return Some(LiveCluster {
                    endpoint,
                    directory,
                    members,
                });
            }
            Err(e) => observer.on_event(ReconcileEvent::CandidateFailed {
                endpoint,
                error: e.to_string(),
            }),
        }
    }

    observer.on_event(ReconcileEvent::NoLiveCluster);
    None
}
