//! EndpointSpec - resolved connection descriptor

use std::time::Duration;

use contracts::OutputConfig;
use url::Url;

use crate::error::OutputError;

/// Wire style of an endpoint
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransportKind {
    /// UDP, fire-and-forget
    Datagram,
    /// HTTP write/query API
    Stream,
}

impl TransportKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Datagram => "datagram",
            Self::Stream => "stream",
        }
    }
}

/// Connection descriptor for one configured URL
///
/// Immutable once resolved.
#[derive(Debug, Clone, PartialEq)]
pub struct EndpointSpec {
    /// URL as configured (endpoint identity in logs)
    pub endpoint: String,
    /// Parsed URL
    pub url: Url,
    pub kind: TransportKind,
    pub username: Option<String>,
    pub password: Option<String>,
    pub user_agent: String,
    /// Stream request timeout (zero disables it)
    pub timeout: Duration,
    /// Datagram payload bound, `None` for stream endpoints
    pub payload_size: Option<usize>,
}

impl EndpointSpec {
    /// Resolve one URL against the output settings
    ///
    /// Schemes starting with `udp` resolve to datagram endpoints, everything
    /// else to stream endpoints.
    ///
    /// # Errors
    /// `OutputError::Config` when the URL cannot be parsed, or a datagram URL
    /// has no host or port
    pub fn resolve(raw: &str, config: &OutputConfig) -> Result<Self, OutputError> {
        let url = Url::parse(raw).map_err(|e| OutputError::config(raw, e.to_string()))?;

        if url.scheme().starts_with("udp") {
            if url.host_str().is_none_or(str::is_empty) {
                return Err(OutputError::config(raw, "datagram url has no host"));
            }
            if url.port().is_none() {
                return Err(OutputError::config(raw, "datagram url has no port"));
            }
            return Ok(Self {
                endpoint: raw.to_string(),
                url,
                kind: TransportKind::Datagram,
                username: None,
                password: None,
                user_agent: config.user_agent.clone(),
                timeout: config.timeout,
                payload_size: Some(config.effective_udp_payload()),
            });
        }

        if url.cannot_be_a_base() {
            return Err(OutputError::config(raw, "url cannot carry an api path"));
        }

        Ok(Self {
            endpoint: raw.to_string(),
            url,
            kind: TransportKind::Stream,
            username: config.username.clone(),
            password: config.password.clone(),
            user_agent: config.user_agent.clone(),
            timeout: config.timeout,
            payload_size: None,
        })
    }

    /// Resolve every configured URL, `urls` first then the legacy `url`
    pub fn resolve_all(config: &OutputConfig) -> Result<Vec<Self>, OutputError> {
        config
            .endpoint_urls()
            .into_iter()
            .map(|raw| Self::resolve(raw, config))
            .collect()
    }

    /// `host:port` of a datagram endpoint
    pub fn socket_addr(&self) -> Option<String> {
        let host = self.url.host_str()?;
        let port = self.url.port()?;
        // bracketed IPv6 literal is kept as-is by host_str
        Some(format!("{host}:{port}"))
    }

    /// API url for a path under the endpoint base (`/write`, `/query`)
    pub fn api_url(&self, path: &str) -> Url {
        let mut url = self.url.clone();
        if let Ok(mut segments) = url.path_segments_mut() {
            segments.pop_if_empty().push(path);
        }
        url.set_query(None);
        url
    }
}
