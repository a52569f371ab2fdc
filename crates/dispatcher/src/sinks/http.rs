//! HttpSink - stream writes over the HTTP write/query API

use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use contracts::{Batch, Transport, TransportError};
use reqwest::{Client, RequestBuilder, Response, StatusCode};
use serde::Deserialize;
use tracing::{debug, instrument};
use url::Url;

use crate::endpoint::EndpointSpec;
use crate::line_protocol::render_batch;

/// Statement error the store returns when the database is already there
const ALREADY_EXISTS: &str = "database already exists";

/// `/query` response body
#[derive(Debug, Deserialize)]
struct QueryResponse {
    #[serde(default)]
    results: Vec<StatementResult>,
    #[serde(default)]
    error: Option<String>,
}

#[derive(Debug, Deserialize)]
struct StatementResult {
    #[serde(default)]
    error: Option<String>,
}

/// Error body returned by `/write`
#[derive(Debug, Deserialize)]
struct ErrorBody {
    error: String,
}

/// Sink that posts line protocol to the store's HTTP API
pub struct HttpSink {
    endpoint: String,
    write_url: Url,
    query_url: Url,
    client: Client,
    username: Option<String>,
    password: Option<String>,
    timeout: Duration,
    closed: AtomicBool,
}

impl HttpSink {
    /// Create a new HttpSink
    ///
    /// No request is made; the client connects on first use.
    pub fn new(spec: &EndpointSpec) -> Result<Self, TransportError> {
        let mut builder = Client::builder().user_agent(spec.user_agent.clone());
        if !spec.timeout.is_zero() {
            builder = builder.timeout(spec.timeout);
        }
        let client = builder
            .build()
            .map_err(|e| TransportError::connection(&spec.endpoint, e.to_string()))?;

        debug!(endpoint = %spec.endpoint, timeout = ?spec.timeout, "HttpSink created");

        Ok(Self {
            endpoint: spec.endpoint.clone(),
            write_url: spec.api_url("write"),
            query_url: spec.api_url("query"),
            client,
            username: spec.username.clone(),
            password: spec.password.clone(),
            timeout: spec.timeout,
            closed: AtomicBool::new(false),
        })
    }

    fn ensure_open(&self) -> Result<(), TransportError> {
        if self.closed.load(Ordering::Acquire) {
            return Err(TransportError::Closed {
                endpoint: self.endpoint.clone(),
            });
        }
        Ok(())
    }

    fn authorize(&self, request: RequestBuilder) -> RequestBuilder {
        match &self.username {
            Some(user) => request.basic_auth(user, self.password.as_deref()),
            None => request,
        }
    }

    fn request_error(&self, err: reqwest::Error) -> TransportError {
        if err.is_timeout() {
            TransportError::Timeout {
                endpoint: self.endpoint.clone(),
                timeout: self.timeout,
            }
        } else {
            TransportError::connection(&self.endpoint, err.to_string())
        }
    }

    async fn rejected(&self, response: Response) -> TransportError {
        let status = response.status().as_u16();
        let body = response.text().await.unwrap_or_default();
        let message = serde_json::from_str::<ErrorBody>(&body)
            .map(|b| b.error)
            .unwrap_or_else(|_| body.trim().to_string());
        TransportError::Rejected {
            endpoint: self.endpoint.clone(),
            status,
            message,
        }
    }
}

/// Quote a database name for a query statement
fn quote_identifier(name: &str) -> String {
    let mut quoted = String::with_capacity(name.len() + 2);
    quoted.push('"');
    for c in name.chars() {
        if c == '"' || c == '\\' {
            quoted.push('\\');
        }
        quoted.push(c);
    }
    quoted.push('"');
    quoted
}

impl Transport for HttpSink {
    fn endpoint(&self) -> &str {
        &self.endpoint
    }

    #[instrument(
        name = "http_sink_write",
        skip(self, batch),
        fields(endpoint = %self.endpoint, points = batch.len())
    )]
    async fn write(&self, batch: &Batch) -> Result<(), TransportError> {
        self.ensure_open()?;

        let settings = &batch.settings;
        let mut params = vec![("db", settings.database.as_str()), ("precision", "ns")];
        if !settings.retention_policy.is_empty() {
            params.push(("rp", settings.retention_policy.as_str()));
        }
        if !settings.write_consistency.is_empty() {
            params.push(("consistency", settings.write_consistency.as_str()));
        }

        let request = self
            .client
            .post(self.write_url.clone())
            .query(&params)
            .body(render_batch(batch));
        let response = self
            .authorize(request)
            .send()
            .await
            .map_err(|e| self.request_error(e))?;

        match response.status() {
            status if status.is_success() => {
                debug!(endpoint = %self.endpoint, status = status.as_u16(), "Written");
                Ok(())
            }
            StatusCode::NOT_FOUND => Err(TransportError::SchemaMissing {
                endpoint: self.endpoint.clone(),
                database: settings.database.clone(),
            }),
            _ => Err(self.rejected(response).await),
        }
    }

    #[instrument(name = "http_sink_create_database", skip(self), fields(endpoint = %self.endpoint))]
    async fn create_database(&self, database: &str) -> Result<(), TransportError> {
        self.ensure_open()?;

        let statement = format!("CREATE DATABASE {}", quote_identifier(database));
        let request = self
            .client
            .post(self.query_url.clone())
            .query(&[("q", statement.as_str())]);
        let response = self
            .authorize(request)
            .send()
            .await
            .map_err(|e| self.request_error(e))?;

        if !response.status().is_success() {
            return Err(self.rejected(response).await);
        }

        let status = response.status().as_u16();
        let text = response.text().await.map_err(|e| self.request_error(e))?;
        let body: QueryResponse =
            serde_json::from_str(&text).map_err(|_| TransportError::Rejected {
                endpoint: self.endpoint.clone(),
                status,
                message: text.trim().to_string(),
            })?;
        let error = body
            .error
            .or_else(|| body.results.into_iter().find_map(|r| r.error));

        match error {
            None => Ok(()),
            Some(message) if message == ALREADY_EXISTS => Err(TransportError::AlreadyExists {
                endpoint: self.endpoint.clone(),
                database: database.to_string(),
            }),
            Some(message) => Err(TransportError::Rejected {
                endpoint: self.endpoint.clone(),
                status,
                message,
            }),
        }
    }

    #[instrument(name = "http_sink_close", skip(self), fields(endpoint = %self.endpoint))]
    async fn close(&self) -> Result<(), TransportError> {
        self.closed.store(true, Ordering::Release);
        debug!(endpoint = %self.endpoint, "HttpSink closed");
        Ok(())
    }
}
