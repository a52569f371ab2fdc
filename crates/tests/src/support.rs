//! Test fixtures: fake InfluxDB HTTP API and a UDP receiver

use std::collections::{HashMap, HashSet};
use std::net::SocketAddr;
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;

use axum::extract::{Query, State};
use axum::http::{header, HeaderMap, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::routing::post;
use axum::{Json, Router};
use chrono::{TimeZone, Utc};
use contracts::{MetricRecord, OutputConfig};
use serde_json::json;
use tokio::net::{TcpListener, UdpSocket};

/// One request accepted by `/write`
#[derive(Debug, Clone)]
pub struct RecordedWrite {
    pub params: HashMap<String, String>,
    pub body: String,
    pub authorization: Option<String>,
    pub user_agent: Option<String>,
}

#[derive(Default)]
struct FakeState {
    databases: HashSet<String>,
    writes: Vec<RecordedWrite>,
    not_found: usize,
    creates: usize,
    write_status: Option<StatusCode>,
    fail_creates: bool,
    html_queries: bool,
    write_delay: Option<Duration>,
}

type Shared = Arc<Mutex<FakeState>>;

/// In-process stand-in for an InfluxDB 1.x HTTP endpoint
#[derive(Clone)]
pub struct FakeInflux {
    url: String,
    state: Shared,
}

impl FakeInflux {
    /// Serve on an ephemeral port
    pub async fn start() -> Self {
        let state: Shared = Arc::default();
        let router = Router::new()
            .route("/write", post(handle_write))
            .route("/query", post(handle_query))
            .with_state(Arc::clone(&state));

        let listener = TcpListener::bind("127.0.0.1:0")
            .await
            .expect("Failed to bind random port");
        let addr = listener.local_addr().expect("Failed to get local addr");

        tokio::spawn(async move {
            axum::serve(listener, router).await.unwrap();
        });

        Self {
            url: format!("http://{addr}"),
            state,
        }
    }

    pub fn url(&self) -> &str {
        &self.url
    }

    fn state(&self) -> MutexGuard<'_, FakeState> {
        self.state.lock().unwrap()
    }

    pub fn drop_database(&self, database: &str) {
        self.state().databases.remove(database);
    }

    pub fn has_database(&self, database: &str) -> bool {
        self.state().databases.contains(database)
    }

    /// Answer every write with `status`
    pub fn reject_writes(&self, status: StatusCode) {
        self.state().write_status = Some(status);
    }

    pub fn fail_creates(&self, fail: bool) {
        self.state().fail_creates = fail;
    }

    /// Answer `/query` with a 200 HTML page, like a misrouted proxy
    pub fn html_queries(&self, html: bool) {
        self.state().html_queries = html;
    }

    pub fn delay_writes(&self, delay: Duration) {
        self.state().write_delay = Some(delay);
    }

    /// Accepted writes
    pub fn writes(&self) -> Vec<RecordedWrite> {
        self.state().writes.clone()
    }

    /// Writes answered with 404
    pub fn not_found(&self) -> usize {
        self.state().not_found
    }

    /// CREATE DATABASE statements received
    pub fn creates(&self) -> usize {
        self.state().creates
    }
}

async fn handle_write(
    State(state): State<Shared>,
    Query(params): Query<HashMap<String, String>>,
    headers: HeaderMap,
    body: String,
) -> Response {
    let delay = state.lock().unwrap().write_delay;
    if let Some(delay) = delay {
        tokio::time::sleep(delay).await;
    }

    let mut state = state.lock().unwrap();
    if let Some(status) = state.write_status {
        return (status, Json(json!({ "error": "unable to parse points" }))).into_response();
    }

    let database = params.get("db").cloned().unwrap_or_default();
    if !state.databases.contains(&database) {
        state.not_found += 1;
        return (
            StatusCode::NOT_FOUND,
            Json(json!({ "error": format!("database not found: \"{database}\"") })),
        )
            .into_response();
    }

    let header_value = |name: header::HeaderName| {
        headers
            .get(name)
            .and_then(|v| v.to_str().ok())
            .map(str::to_string)
    };
    state.writes.push(RecordedWrite {
        params,
        body,
        authorization: header_value(header::AUTHORIZATION),
        user_agent: header_value(header::USER_AGENT),
    });
    StatusCode::NO_CONTENT.into_response()
}

async fn handle_query(
    State(state): State<Shared>,
    Query(params): Query<HashMap<String, String>>,
) -> Response {
    let mut state = state.lock().unwrap();
    state.creates += 1;

    if state.html_queries {
        return (
            [(header::CONTENT_TYPE, "text/html")],
            "<html><body>Welcome</body></html>",
        )
            .into_response();
    }

    if state.fail_creates {
        return (
            StatusCode::FORBIDDEN,
            Json(json!({ "error": "create database requires admin privilege" })),
        )
            .into_response();
    }

    let statement = params.get("q").cloned().unwrap_or_default();
    let Some(name) = statement.strip_prefix("CREATE DATABASE ") else {
        return (
            StatusCode::BAD_REQUEST,
            Json(json!({ "error": format!("unsupported statement: {statement}") })),
        )
            .into_response();
    };
    let name = name.trim_matches('"').replace("\\\"", "\"");

    if !state.databases.insert(name) {
        return Json(json!({
            "results": [{ "statement_id": 0, "error": "database already exists" }]
        }))
        .into_response();
    }
    Json(json!({ "results": [{ "statement_id": 0 }] })).into_response()
}

/// Local UDP socket collecting datagrams
pub struct UdpReceiver {
    socket: UdpSocket,
    addr: SocketAddr,
}

impl UdpReceiver {
    pub async fn bind() -> Self {
        let socket = UdpSocket::bind("127.0.0.1:0").await.unwrap();
        let addr = socket.local_addr().unwrap();
        Self { socket, addr }
    }

    pub fn url(&self) -> String {
        format!("udp://{}", self.addr)
    }

    /// Collect datagrams until none arrives for `idle`
    pub async fn drain(&self, idle: Duration) -> Vec<Vec<u8>> {
        let mut packets = Vec::new();
        let mut buf = vec![0u8; 65536];
        while let Ok(Ok(n)) = tokio::time::timeout(idle, self.socket.recv(&mut buf)).await {
            packets.push(buf[..n].to_vec());
        }
        packets
    }
}

/// Output config for `urls` writing to `telegraf`
pub fn output_config(urls: &[&str]) -> OutputConfig {
    let mut config = OutputConfig::new("telegraf");
    config.urls = urls.iter().map(ToString::to_string).collect();
    config.timeout = Duration::from_secs(2);
    config
}

/// Record with one host tag and one float field at a fixed time
pub fn record(name: &str, value: f64) -> MetricRecord {
    MetricRecord::new(name, Utc.timestamp_opt(1_700_000_000, 0).unwrap())
        .with_tag("host", "server 01")
        .with_field("value", value)
}
