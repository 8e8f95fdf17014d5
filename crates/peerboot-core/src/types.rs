//! Core types for peerboot

use crate::error::{BootError, Result};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use url::{Host, Url};

/// An intended participant of the cluster, taken from the static roster
#[derive(Clone, Debug, Hash, Eq, PartialEq, Serialize, Deserialize)]
pub struct Member {
    /// Unique human-readable identifier
    pub name: String,

    /// Host or IP the member's endpoints are derived from
    pub address: String,
}

impl Member {
    pub fn new(name: impl Into<String>, address: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            address: address.into(),
        }
    }

    /// Parse a comma-separated `name=address` roster, preserving order
    pub fn parse_roster(value: &str) -> Result<Vec<Member>> {
        value.split(',').map(str::parse).collect()
    }
}

impl FromStr for Member {
    type Err = BootError;

    fn from_str(value: &str) -> Result<Self> {
        let mut parts = value.split('=');
        match (parts.next(), parts.next(), parts.next()) {
            (Some(name), Some(address), None) if !name.trim().is_empty() && !address.trim().is_empty() => {
                Ok(Member::new(name.trim(), address.trim()))
            }
            _ => Err(BootError::Config(format!(
                "member {:?} doesn't follow name=ip/host format",
                value
            ))),
        }
    }
}

impl fmt::Display for Member {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}={}", self.name, self.address)
    }
}

/// A participant as reported by a live cluster's members API
#[derive(Clone, Debug, Eq, PartialEq, Serialize, Deserialize)]
pub struct RemoteMember {
    /// Cluster-assigned identifier
    pub id: String,

    /// Empty until the peer has started and published its name
    #[serde(default)]
    pub name: String,

    #[serde(rename = "peerURLs", default)]
    pub peer_urls: Vec<String>,

    #[serde(rename = "clientURLs", default)]
    pub client_urls: Vec<String>,
}

impl RemoteMember {
    /// Registered as a member but not started yet
    pub fn is_unstarted(&self) -> bool {
        self.name.is_empty()
    }

    /// First advertised peer URL
    pub fn peer_url(&self) -> Result<&str> {
        self.peer_urls
            .first()
            .map(String::as_str)
            .ok_or_else(|| BootError::Protocol {
                endpoint: String::new(),
                reason: format!("member {} advertises no peer URLs", self.id),
            })
    }

    /// Host part of the first advertised peer URL
    pub fn peer_host(&self) -> Result<String> {
        let url = self.peer_url()?;
        host_of(url).ok_or_else(|| BootError::Protocol {
            endpoint: String::new(),
            reason: format!("member {} has malformed peer URL {:?}", self.id, url),
        })
    }
}

/// Host of an absolute URL, without IPv6 brackets
///
/// Domains of `http`/`https` URLs come back lowercased.
pub fn host_of(url: &str) -> Option<String> {
    let host = match Url::parse(url).ok()?.host()? {
        Host::Domain(domain) => domain.to_string(),
        Host::Ipv4(addr) => addr.to_string(),
        Host::Ipv6(addr) => addr.to_string(),
    };

    if host.is_empty() {
        None
    } else {
        Some(host)
    }
}

/// Whether the node forms a brand-new cluster or joins a running one
#[derive(Clone, Copy, Debug, Hash, Eq, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ClusterState {
    New,
    Existing,
}

impl ClusterState {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::New => "new",
            Self::Existing => "existing",
        }
    }
}

impl fmt::Display for ClusterState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Outcome of one reconciliation pass
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct ReconciliationResult {
    pub cluster_state: ClusterState,

    /// `name=peerURL` pairs, local node last when joining
    pub initial_cluster: Vec<String>,

    pub self_name: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_member() {
        let member: Member = "a=10.0.0.1".parse().unwrap();
        assert_eq!(member, Member::new("a", "10.0.0.1"));
        assert_eq!(member.to_string(), "a=10.0.0.1");
    }

    #[test]
    fn test_parse_member_rejects_malformed() {
        for value in ["a", "a=b=c", "=10.0.0.1", "a=", ""] {
            let err = value.parse::<Member>().unwrap_err();
            assert!(matches!(err, BootError::Config(_)), "{value:?} -> {err:?}");
        }
    }

    #[test]
    fn test_parse_roster_keeps_order() {
        let roster = Member::parse_roster("b=10.0.0.2, a=10.0.0.1,c=node-c.local").unwrap();
        let names: Vec<_> = roster.iter().map(|m| m.name.as_str()).collect();
        assert_eq!(names, ["b", "a", "c"]);
        assert_eq!(roster[2].address, "node-c.local");
    }

    #[test]
    fn test_host_of() {
        assert_eq!(host_of("http://10.0.0.1:2380").as_deref(), Some("10.0.0.1"));
        assert_eq!(host_of("https://node-a.local/").as_deref(), Some("node-a.local"));
        assert_eq!(host_of("http://[fd00::1]:2380").as_deref(), Some("fd00::1"));
        assert_eq!(host_of("http://user@10.0.0.3:2380").as_deref(), Some("10.0.0.3"));
        assert_eq!(host_of("10.0.0.1:2380"), None);
        assert_eq!(host_of("http://:2380"), None);
        assert_eq!(host_of("http://Node-A.local:2380").as_deref(), Some("node-a.local"));
    }

    #[test]
    fn test_remote_member_from_members_api() {
        let json = r#"{"id":"8e9e05c52164694d","name":"","peerURLs":["http://10.0.0.2:2380"]}"#;
        let member: RemoteMember = serde_json::from_str(json).unwrap();
        assert!(member.is_unstarted());
        assert!(member.client_urls.is_empty());
        assert_eq!(member.peer_host().unwrap(), "10.0.0.2");
    }

    #[test]
    fn test_remote_member_without_peer_urls() {
        let member = RemoteMember {
            id: "1".into(),
            name: "a".into(),
            peer_urls: vec![],
            client_urls: vec![],
        };
        assert!(matches!(member.peer_host(), Err(BootError::Protocol { .. })));
    }

    #[test]
    fn test_cluster_state_display() {
        assert_eq!(ClusterState::New.to_string(), "new");
        assert_eq!(ClusterState::Existing.to_string(), "existing");
    }
}
