//! In-memory members API for tests

use crate::directory::{DirectoryFactory, MembershipDirectory};
use crate::observer::{ReconcileEvent, ReconcileObserver};
use peerboot_core::{BootError, RemoteMember, Result};
use std::collections::HashSet;
use std::sync::{Arc, Mutex};

/// Directory call as seen by the fake cluster, tagged with its endpoint
#[derive(Clone, Debug, Eq, PartialEq)]
pub enum Call {
    List(String),
    Add(String, String),
    Remove(String, String),
}

/// Started member advertising `http://{host}:2380`
pub fn remote(id: &str, name: &str, host: &str) -> RemoteMember {
    RemoteMember {
        id: id.to_string(),
        name: name.to_string(),
        peer_urls: vec![format!("http://{}:2380", host)],
        client_urls: vec![format!("http://{}:2379", host)],
    }
}

struct State {
    members: Vec<RemoteMember>,
    calls: Vec<Call>,
    next_id: u64,
    fail_removals: bool,
}

/// One cluster, reachable through a chosen set of endpoints
#[derive(Clone)]
pub struct FakeCluster {
    state: Arc<Mutex<State>>,
}

impl FakeCluster {
    pub fn new(members: Vec<RemoteMember>) -> Self {
        Self {
            state: Arc::new(Mutex::new(State {
                members,
                calls: Vec::new(),
                next_id: 100,
                fail_removals: false,
            })),
        }
    }

    pub fn factory(&self, reachable: &[&str]) -> FakeFactory {
        FakeFactory {
            cluster: self.clone(),
            reachable: reachable.iter().map(|e| e.to_string()).collect(),
        }
    }

    /// Make every later removal fail as if the endpoint went away
    pub fn fail_removals(&self) {
        self.state.lock().unwrap().fail_removals = true;
    }

    pub fn calls(&self) -> Vec<Call> {
        self.state.lock().unwrap().calls.clone()
    }

    pub fn members(&self) -> Vec<RemoteMember> {
        self.state.lock().unwrap().members.clone()
    }
}

pub struct FakeFactory {
    cluster: FakeCluster,
    reachable: HashSet<String>,
}

impl DirectoryFactory for FakeFactory {
    type Directory = FakeDirectory;

    fn connect(&self, endpoint: &str) -> Result<FakeDirectory> {
        Ok(FakeDirectory {
            cluster: self.cluster.clone(),
            endpoint: endpoint.to_string(),
            reachable: self.reachable.contains(endpoint),
        })
    }
}

pub struct FakeDirectory {
    cluster: FakeCluster,
    endpoint: String,
    reachable: bool,
}

impl FakeDirectory {
    fn call(&self, call: Call) -> Result<std::sync::MutexGuard<'_, State>> {
        let mut state = self.cluster.state.lock().unwrap();
        state.calls.push(call);
        if !self.reachable {
            return Err(self.unreachable());
        }
        Ok(state)
    }

    fn unreachable(&self) -> BootError {
        BootError::Unreachable {
            endpoint: self.endpoint.clone(),
            reason: "connection refused".to_string(),
        }
    }
}

impl MembershipDirectory for FakeDirectory {
    fn endpoint(&self) -> &str {
        &self.endpoint
    }

    async fn list_members(&self) -> Result<Vec<RemoteMember>> {
        let state = self.call(Call::List(self.endpoint.clone()))?;
        Ok(state.members.clone())
    }

    async fn add_member(&self, peer_url: &str) -> Result<RemoteMember> {
        let mut state = self.call(Call::Add(self.endpoint.clone(), peer_url.to_string()))?;
        if state.members.iter().any(|m| m.peer_urls.iter().any(|u| u == peer_url)) {
            return Err(BootError::Conflict {
                endpoint: self.endpoint.clone(),
                reason: "peerURL exists".to_string(),
            });
        }

        let member = RemoteMember {
            id: state.next_id.to_string(),
            name: String::new(),
            peer_urls: vec![peer_url.to_string()],
            client_urls: vec![],
        };
        state.next_id += 1;
        state.members.push(member.clone());
        Ok(member)
    }

    async fn remove_member(&self, id: &str) -> Result<()> {
        let mut state = self.call(Call::Remove(self.endpoint.clone(), id.to_string()))?;
        if state.fail_removals {
            return Err(self.unreachable());
        }

        match state.members.iter().position(|m| m.id == id) {
            Some(index) => {
                state.members.remove(index);
                Ok(())
            }
            None => Err(BootError::NotFound {
                endpoint: self.endpoint.clone(),
                id: id.to_string(),
            }),
        }
    }
}

/// Keeps every event it receives
#[derive(Clone, Default)]
pub struct RecordingObserver {
    events: Arc<Mutex<Vec<ReconcileEvent>>>,
}

impl RecordingObserver {
    pub fn events(&self) -> Vec<ReconcileEvent> {
        self.events.lock().unwrap().clone()
    }
}

impl ReconcileObserver for RecordingObserver {
    fn on_event(&self, event: ReconcileEvent) {
        self.events.lock().unwrap().push(event);
    }
}
