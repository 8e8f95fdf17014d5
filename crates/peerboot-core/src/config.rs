//! Configuration types for peerboot

use crate::error::{BootError, Result};
use crate::types::Member;
use std::path::PathBuf;
use std::time::Duration;

/// Default client port of a cluster member
pub const DEFAULT_CLIENT_PORT: u16 = 2379;

/// Default peer port of a cluster member
pub const DEFAULT_PEER_PORT: u16 = 2380;

/// Default destination of the environment file
pub const DEFAULT_OUT: &str = "/etc/sysconfig/etcd-peers";

/// Placeholder a URL template substitutes the member address into
const PLACEHOLDER: &str = ".";

/// URL template over a member address, e.g. `https://{{.}}:4001`
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct UrlTemplate {
    /// Literal text between placeholders; `render` interleaves the address
    segments: Vec<String>,
}

impl UrlTemplate {
    pub fn parse(template: &str) -> Result<Self> {
        let mut segments = Vec::new();
        let mut rest = template;

        while let Some(start) = rest.find("{{") {
            let end = rest[start..].find("}}").ok_or_else(|| {
                BootError::Config(format!("unclosed action in template {:?}", template))
            })?;
            let action = rest[start + 2..start + end].trim();
            if action != PLACEHOLDER {
                return Err(BootError::Config(format!(
                    "unsupported action {{{{{}}}}} in template {:?}",
                    action, template
                )));
            }
            segments.push(rest[..start].to_string());
            rest = &rest[start + end + 2..];
        }
        segments.push(rest.to_string());

        Ok(Self { segments })
    }

    pub fn render(&self, address: &str) -> String {
        self.segments.join(address)
    }
}

/// How member endpoints are derived from their addresses
#[derive(Clone, Debug, Default)]
pub struct UrlScheme {
    /// Client (members API) endpoint template
    pub listen: Option<UrlTemplate>,

    /// Peer endpoint template
    pub peer: Option<UrlTemplate>,
}

impl UrlScheme {
    pub fn client_url(&self, address: &str) -> String {
        match &self.listen {
            Some(template) => template.render(address),
            None => format!("http://{}:{}", address, DEFAULT_CLIENT_PORT),
        }
    }

    pub fn peer_url(&self, address: &str) -> String {
        match &self.peer {
            Some(template) => template.render(address),
            None => format!("http://{}:{}", address, DEFAULT_PEER_PORT),
        }
    }
}

/// Client certificate material for talking to a TLS-secured cluster
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct TlsConfig {
    pub cert_file: PathBuf,
    pub key_file: PathBuf,
    pub ca_file: PathBuf,
}

impl TlsConfig {
    /// TLS is enabled only when all three files are given
    pub fn from_parts(
        cert_file: Option<PathBuf>,
        key_file: Option<PathBuf>,
        ca_file: Option<PathBuf>,
    ) -> Result<Option<Self>> {
        match (cert_file, key_file, ca_file) {
            (Some(cert_file), Some(key_file), Some(ca_file)) => Ok(Some(Self {
                cert_file,
                key_file,
                ca_file,
            })),
            (None, None, None) => Ok(None),
            _ => Err(BootError::Config(
                "--cert-file, --key-file and --ca-file must be given together".to_string(),
            )),
        }
    }
}

/// Timeouts applied to every members API call
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct DirectoryTimeouts {
    /// Connection setup
    pub dial: Duration,

    /// Whole request, independent per call
    pub request: Duration,
}

impl Default for DirectoryTimeouts {
    fn default() -> Self {
        Self {
            dial: Duration::from_secs(30),
            request: Duration::from_secs(5),
        }
    }
}

/// Validated configuration of one bootstrap run
#[derive(Clone, Debug)]
pub struct BootstrapConfig {
    /// The local node
    pub me: Member,

    /// Intended roster, in configured order
    pub members: Vec<Member>,

    pub urls: UrlScheme,

    pub tls: Option<TlsConfig>,

    pub timeouts: DirectoryTimeouts,

    /// Evict and re-add a stale registration of the local node
    pub force: bool,

    /// Environment file destination
    pub out: PathBuf,
}

impl BootstrapConfig {
    /// Build a config from raw `name=address` values
    pub fn new(me: &str, members: &str) -> Result<Self> {
        if me.trim().is_empty() {
            return Err(BootError::Config("--me is a required parameter".to_string()));
        }
        if members.trim().is_empty() {
            return Err(BootError::Config("--members is a required parameter".to_string()));
        }

        let config = Self {
            me: me.parse()?,
            members: Member::parse_roster(members)?,
            urls: UrlScheme::default(),
            tls: None,
            timeouts: DirectoryTimeouts::default(),
            force: false,
            out: PathBuf::from(DEFAULT_OUT),
        };
        config.validate()?;
        Ok(config)
    }

    /// The roster must list the local node exactly once
    pub fn validate(&self) -> Result<()> {
        let occurrences = self.members.iter().filter(|m| **m == self.me).count();
        if occurrences != 1 {
            return Err(BootError::Config(format!(
                "{} must appear exactly once in --members, found {} times",
                self.me, occurrences
            )));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_urls() {
        let urls = UrlScheme::default();
        assert_eq!(urls.client_url("10.0.0.1"), "http://10.0.0.1:2379");
        assert_eq!(urls.peer_url("10.0.0.1"), "http://10.0.0.1:2380");
    }

    #[test]
    fn test_template_urls() {
        let urls = UrlScheme {
            listen: Some(UrlTemplate::parse("https://{{.}}:4001").unwrap()),
            peer: Some(UrlTemplate::parse("https://{{ . }}:7001/{{.}}").unwrap()),
        };
        assert_eq!(urls.client_url("node-a"), "https://node-a:4001");
        assert_eq!(urls.peer_url("node-a"), "https://node-a:7001/node-a");
    }

    #[test]
    fn test_template_rejects_bad_actions() {
        assert!(UrlTemplate::parse("http://{{.Host}}:2379").is_err());
        assert!(UrlTemplate::parse("http://{{.:2379").is_err());
    }

    #[test]
    fn test_template_without_placeholder_is_constant() {
        let template = UrlTemplate::parse("http://lb.local:2379").unwrap();
        assert_eq!(template.render("10.0.0.1"), "http://lb.local:2379");
    }

    #[test]
    fn test_tls_requires_all_parts() {
        assert_eq!(TlsConfig::from_parts(None, None, None).unwrap(), None);
        assert!(TlsConfig::from_parts(Some("c.pem".into()), None, Some("ca.pem".into())).is_err());

        let tls = TlsConfig::from_parts(
            Some("c.pem".into()),
            Some("k.pem".into()),
            Some("ca.pem".into()),
        )
        .unwrap()
        .unwrap();
        assert_eq!(tls.key_file, PathBuf::from("k.pem"));
    }

    #[test]
    fn test_config_requires_self_in_roster() {
        let config = BootstrapConfig::new("a=10.0.0.1", "a=10.0.0.1,b=10.0.0.2").unwrap();
        assert_eq!(config.members.len(), 2);
        assert_eq!(config.out, PathBuf::from(DEFAULT_OUT));
        assert_eq!(config.timeouts.request, Duration::from_secs(5));

        let err = BootstrapConfig::new("c=10.0.0.3", "a=10.0.0.1,b=10.0.0.2").unwrap_err();
        assert!(matches!(err, BootError::Config(_)));

        let err = BootstrapConfig::new("a=10.0.0.1", "a=10.0.0.1,a=10.0.0.1").unwrap_err();
        assert!(matches!(err, BootError::Config(_)));
    }

    #[test]
    fn test_config_requires_values() {
        assert!(BootstrapConfig::new("", "a=10.0.0.1").is_err());
        assert!(BootstrapConfig::new("a=10.0.0.1", " ").is_err());
    }
}
