//! HTTP members API client
//!
//! Talks to the `/v2/members` API of one cluster endpoint, over plain HTTP or
//! TLS with a client certificate.

use crate::directory::{DirectoryFactory, MembershipDirectory};
use peerboot_core::{BootError, BootstrapConfig, DirectoryTimeouts, RemoteMember, Result, TlsConfig};
use reqwest::{Certificate, Client, Identity, StatusCode, Url};
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;

/// HTTP directory factory
pub struct HttpDirectoryFactory {
    /// HTTP client, shared by every directory it builds
    client: Client,

    /// Total timeout of each request
    request_timeout: Duration,
}

impl HttpDirectoryFactory {
    /// Plain HTTP transport
    pub fn new(timeouts: DirectoryTimeouts) -> Result<Self> {
        Self::build(Client::builder().connect_timeout(timeouts.dial), timeouts)
    }

    /// TLS transport verifying servers against `ca_file` and presenting a client certificate
    pub fn with_tls(timeouts: DirectoryTimeouts, tls: &TlsConfig) -> Result<Self> {
        let ca = Certificate::from_pem(&read_pem(&tls.ca_file)?)
            .map_err(|e| BootError::Config(format!("invalid CA bundle {}: {}", tls.ca_file.display(), e)))?;
        // PKCS#8, PKCS#1 and SEC1 keys are all accepted
        let mut pem = read_pem(&tls.cert_file)?;
        pem.push(b'\n');
        pem.extend(read_pem(&tls.key_file)?);
        let identity = Identity::from_pem(&pem)
            .map_err(|e| BootError::Config(format!("invalid client certificate or key: {}", e)))?;

        let builder = Client::builder()
            .connect_timeout(timeouts.dial)
            .add_root_certificate(ca)
            .identity(identity);

        Self::build(builder, timeouts)
    }

    /// Pick the transport the configuration asks for
    pub fn from_config(config: &BootstrapConfig) -> Result<Self> {
        match &config.tls {
            Some(tls) => Self::with_tls(config.timeouts, tls),
            None => Self::new(config.timeouts),
        }
    }

    fn build(builder: reqwest::ClientBuilder, timeouts: DirectoryTimeouts) -> Result<Self> {
        let client = builder
            .build()
            .map_err(|e| BootError::Config(format!("failed to create HTTP client: {}", e)))?;

        Ok(Self {
            client,
            request_timeout: timeouts.request,
        })
    }
}

impl DirectoryFactory for HttpDirectoryFactory {
    type Directory = HttpDirectory;

    fn connect(&self, endpoint: &str) -> Result<HttpDirectory> {
        let base = Url::parse(endpoint)
            .map_err(|e| BootError::Config(format!("invalid endpoint URL {:?}: {}", endpoint, e)))?;

        Ok(HttpDirectory {
            client: self.client.clone(),
            endpoint: endpoint.to_string(),
            members_url: format!("{}/v2/members", base.as_str().trim_end_matches('/')),
            request_timeout: self.request_timeout,
        })
    }
}

fn read_pem(path: &Path) -> Result<Vec<u8>> {
    std::fs::read(path).map_err(|e| BootError::Config(format!("failed to read {}: {}", path.display(), e)))
}

#[derive(Deserialize)]
struct MembersResponse {
    #[serde(default)]
    members: Vec<RemoteMember>,
}

#[derive(Serialize)]
struct AddMemberRequest<'a> {
    #[serde(rename = "peerURLs")]
    peer_urls: Vec<&'a str>,
}

#[derive(Deserialize)]
struct ErrorResponse {
    message: String,
}

/// Members API of one endpoint over HTTP
pub struct HttpDirectory {
    client: Client,

    endpoint: String,

    /// `{endpoint}/v2/members`
    members_url: String,

    request_timeout: Duration,
}

impl HttpDirectory {
    fn transport_error(&self, err: reqwest::Error) -> BootError {
        if err.is_decode() {
            self.protocol_error(format!("malformed response: {}", err))
        } else {
            BootError::Unreachable {
                endpoint: self.endpoint.clone(),
                reason: err.to_string(),
            }
        }
    }

    fn protocol_error(&self, reason: String) -> BootError {
        BootError::Protocol {
            endpoint: self.endpoint.clone(),
            reason,
        }
    }

    /// Error message of a non-success response, `{"message": ...}` or raw text
    async fn error_message(&self, response: reqwest::Response) -> String {
        let status = response.status();
        let text = response.text().await.unwrap_or_default();
        let message = serde_json::from_str::<ErrorResponse>(&text)
            .map(|e| e.message)
            .unwrap_or(text);
        format!("HTTP {}: {}", status, message.trim())
    }
}

impl MembershipDirectory for HttpDirectory {
    fn endpoint(&self) -> &str {
        &self.endpoint
    }

    async fn list_members(&self) -> Result<Vec<RemoteMember>> {
        let response = self
            .client
            .get(&self.members_url)
            .timeout(self.request_timeout)
            .send()
            .await
            .map_err(|e| self.transport_error(e))?;

        if response.status() != StatusCode::OK {
            let message = self.error_message(response).await;
            return Err(self.protocol_error(message));
        }

        let body: MembersResponse = response.json().await.map_err(|e| self.transport_error(e))?;
        Ok(body.members)
    }

    async fn add_member(&self, peer_url: &str) -> Result<RemoteMember> {
        let response = self
            .client
            .post(&self.members_url)
            .timeout(self.request_timeout)
            .json(&AddMemberRequest {
                peer_urls: vec![peer_url],
            })
            .send()
            .await
            .map_err(|e| self.transport_error(e))?;

        match response.status() {
            StatusCode::CREATED => response.json().await.map_err(|e| self.transport_error(e)),
            StatusCode::CONFLICT => Err(BootError::Conflict {
                endpoint: self.endpoint.clone(),
                reason: self.error_message(response).await,
            }),
            _ => {
                let message = self.error_message(response).await;
                Err(self.protocol_error(message))
            }
        }
    }

    async fn remove_member(&self, id: &str) -> Result<()> {
        let response = self
            .client
            .delete(format!("{}/{}", self.members_url, id))
            .timeout(self.request_timeout)
            .send()
            .await
            .map_err(|e| self.transport_error(e))?;

        match response.status() {
            StatusCode::NO_CONTENT => Ok(()),
            StatusCode::NOT_FOUND | StatusCode::GONE => Err(BootError::NotFound {
                endpoint: self.endpoint.clone(),
                id: id.to_string(),
            }),
            _ => {
                let message = self.error_message(response).await;
                Err(self.protocol_error(message))
            }
        }
    }
}
