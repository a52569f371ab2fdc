//! `info` command implementation.

use anyhow::{Context, Result};
use contracts::RelayBlueprint;
use dispatcher::{EndpointSpec, TransportKind};
use serde::Serialize;
use tracing::info;

use crate::cli::InfoArgs;

/// Configuration info for JSON output
#[derive(Serialize)]
struct ConfigInfo {
    version: String,
    database: String,
    #[serde(skip_serializing_if = "String::is_empty")]
    retention_policy: String,
    write_consistency: String,
    endpoints: Vec<EndpointInfo>,
}

#[derive(Serialize)]
struct EndpointInfo {
    url: String,
    kind: &'static str,
    address: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    payload_size: Option<usize>,
    #[serde(skip_serializing_if = "Option::is_none")]
    timeout: Option<String>,
    authenticated: bool,
}

/// Execute the `info` command
pub fn run_info(args: &InfoArgs) -> Result<()> {
    info!(config = %args.config.display(), "Loading configuration info");

    let blueprint = super::load_config(&args.config)?;
    let info = build_config_info(&blueprint)?;

    if args.json {
        let json =
            serde_json::to_string_pretty(&info).context("Failed to serialize config info")?;
        println!("{json}");
    } else {
        print_config_info(&info);
    }

    Ok(())
}

fn build_config_info(blueprint: &RelayBlueprint) -> Result<ConfigInfo> {
    let output = &blueprint.output;
    let specs = EndpointSpec::resolve_all(output).context("Failed to resolve endpoints")?;

    let endpoints = specs
        .iter()
        .map(|spec| {
            let (address, timeout) = match spec.kind {
                TransportKind::Datagram => (spec.socket_addr().unwrap_or_default(), None),
                TransportKind::Stream => (
                    spec.api_url("write").to_string(),
                    Some(format!("{:?}", spec.timeout)),
                ),
            };
            EndpointInfo {
                url: spec.endpoint.clone(),
                kind: spec.kind.as_str(),
                address,
                payload_size: spec.payload_size,
                timeout,
                authenticated: spec.username.is_some(),
            }
        })
        .collect();

    Ok(ConfigInfo {
        version: format!("{:?}", blueprint.version),
        database: output.database.clone(),
        retention_policy: output.retention_policy.clone(),
        write_consistency: output.write_consistency.clone(),
        endpoints,
    })
}

fn print_config_info(info: &ConfigInfo) {
    println!("╔══════════════════════════════════════════════════════════════╗");
    println!("║               Metric Relay Configuration                     ║");
    println!("╚══════════════════════════════════════════════════════════════╝\n");

    println!("🗄  Target");
    println!("   ├─ Version: {}", info.version);
    println!("   ├─ Database: {}", info.database);
    if info.retention_policy.is_empty() {
        println!("   ├─ Retention policy: (default)");
    } else {
        println!("   ├─ Retention policy: {}", info.retention_policy);
    }
    println!("   └─ Write consistency: {}", info.write_consistency);

    println!("\n📤 Endpoints ({})", info.endpoints.len());
    for (i, endpoint) in info.endpoints.iter().enumerate() {
        let is_last = i == info.endpoints.len() - 1;
        let prefix = if is_last { "└─" } else { "├─" };
        let child_prefix = if is_last { "   " } else { "│  " };

        println!("   {} {} ({})", prefix, endpoint.url, endpoint.kind);
        println!("   {}  ├─ Address: {}", child_prefix, endpoint.address);
        if let Some(size) = endpoint.payload_size {
            println!("   {}  └─ Max payload: {} bytes", child_prefix, size);
        }
        if let Some(ref timeout) = endpoint.timeout {
            println!("   {}  ├─ Timeout: {}", child_prefix, timeout);
            println!("   {}  └─ Basic auth: {}", child_prefix, endpoint.authenticated);
        }
    }

    println!();
}
