//! peerboot - Bootstraps this node into its etcd cluster

mod envfile;

use clap::Parser;
use peerboot_cluster::{emit, DirectoryFactory, HttpDirectoryFactory, Reconciler};
use peerboot_core::{
    BootstrapConfig, ClusterState, DirectoryTimeouts, Result, TlsConfig, UrlScheme, UrlTemplate,
    DEFAULT_OUT,
};
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

#[derive(Parser)]
#[command(name = "peerboot")]
#[command(about = "Bootstraps an etcd cluster member and writes its startup environment")]
struct Args {
    /// This node, as name=ip/host
    #[arg(long, env = "PEERBOOT_ME")]
    me: String,

    /// Intended cluster members, as comma-separated name=ip/host pairs
    #[arg(long, env = "PEERBOOT_MEMBERS")]
    members: String,

    /// Client URL template, `{{.}}` is replaced by a member address
    #[arg(long, env = "PEERBOOT_TMPL_LISTEN_URL")]
    tmpl_listen_url: Option<String>,

    /// Peer URL template, `{{.}}` is replaced by a member address
    #[arg(long, env = "PEERBOOT_TMPL_PEER_URL")]
    tmpl_peer_url: Option<String>,

    /// Identify HTTPS client using this SSL certificate file
    #[arg(long, env = "PEERBOOT_CERT_FILE")]
    cert_file: Option<PathBuf>,

    /// Identify HTTPS client using this SSL key file
    #[arg(long, env = "PEERBOOT_KEY_FILE")]
    key_file: Option<PathBuf>,

    /// Verify certificates of HTTPS-enabled servers using this CA bundle
    #[arg(long, env = "PEERBOOT_CA_FILE")]
    ca_file: Option<PathBuf>,

    /// Evict a stale registration of this node and register it again
    #[arg(long, env = "PEERBOOT_FORCE")]
    force: bool,

    /// Environment file destination
    #[arg(long, env = "PEERBOOT_OUT", default_value = DEFAULT_OUT)]
    out: PathBuf,

    /// Total timeout of each members API request
    #[arg(long, env = "PEERBOOT_REQUEST_TIMEOUT_SECS", default_value = "5")]
    request_timeout_secs: u64,

    /// Connection setup timeout
    #[arg(long, env = "PEERBOOT_DIAL_TIMEOUT_SECS", default_value = "30")]
    dial_timeout_secs: u64,
}

impl Args {
    fn into_config(self) -> Result<BootstrapConfig> {
        let mut config = BootstrapConfig::new(&self.me, &self.members)?;

        config.urls = UrlScheme {
            listen: self.tmpl_listen_url.as_deref().map(UrlTemplate::parse).transpose()?,
            peer: self.tmpl_peer_url.as_deref().map(UrlTemplate::parse).transpose()?,
        };
        config.tls = TlsConfig::from_parts(self.cert_file, self.key_file, self.ca_file)?;
        config.timeouts = DirectoryTimeouts {
            dial: Duration::from_secs(self.dial_timeout_secs),
            request: Duration::from_secs(self.request_timeout_secs),
        };
        config.force = self.force;
        config.out = self.out;

        Ok(config)
    }
}

/// Whether a previous run already wrote the environment file
fn already_bootstrapped(out: &Path) -> bool {
    out.exists()
}

/// Reconcile and write the environment file, unless a previous run already did
///
/// Returns the cluster state written, or `None` when the file already existed.
/// `make_factory` runs only past that check, so nothing touches the network
/// or the TLS material of an already bootstrapped node.
async fn bootstrap<F, M>(config: &BootstrapConfig, make_factory: M) -> Result<Option<ClusterState>>
where
    F: DirectoryFactory,
    M: FnOnce(&BootstrapConfig) -> Result<F>,
{
    if already_bootstrapped(&config.out) {
        tracing::info!(out = %config.out.display(), "etcd-peers file already created, exiting");
        return Ok(None);
    }

    tracing::info!(
        me = %config.me,
        members = config.members.len(),
        tls = config.tls.is_some(),
        force = config.force,
        "Starting peerboot"
    );

    let factory = make_factory(config)?;
    let result = Reconciler::new(factory, config).run().await.inspect_err(|e| {
        if e.is_directory_error() {
            tracing::error!(error = %e, "reconciliation aborted, membership changes already made are kept");
        }
    })?;

    let params = emit(&result);
    envfile::write_env_file(&config.out, &params)?;

    tracing::info!(
        out = %config.out.display(),
        state = %result.cluster_state,
        "wrote bootstrap parameters"
    );

    Ok(Some(result.cluster_state))
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::registry()
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let config = Args::parse().into_config()?;
    bootstrap(&config, HttpDirectoryFactory::from_config).await?;

    Ok(())
}
