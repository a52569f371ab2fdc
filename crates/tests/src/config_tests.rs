//! Configuration files through to a resolved output

use std::io::Write;
use std::time::Duration;

use config_loader::{ConfigFormat, ConfigLoader};
use dispatcher::{EndpointResolver, TransportKind, SAMPLE_CONFIG};

#[test]
fn test_sample_config_loads_and_resolves() {
    let blueprint = ConfigLoader::load_from_str(SAMPLE_CONFIG, ConfigFormat::Toml).unwrap();
    assert_eq!(blueprint.output.database, "telegraf");
    assert_eq!(blueprint.output.timeout, Duration::from_secs(5));
    assert!(config_loader::collect_warnings(&blueprint).is_empty());

    let resolver = EndpointResolver::new(blueprint.output).unwrap();
    assert_eq!(resolver.endpoints().len(), 1);
    assert_eq!(resolver.endpoints()[0].kind, TransportKind::Stream);
}

#[test]
fn test_json_file_with_legacy_url() {
    let mut file = tempfile::Builder::new().suffix(".json").tempfile().unwrap();
    write!(
        file,
        r#"{{
  "output": {{
    "urls": ["udp://127.0.0.1:8089"],
    "url": "http://127.0.0.1:8086",
    "database": "metrics",
    "udp_payload": 1400
  }}
}}"#
    )
    .unwrap();

    let blueprint = ConfigLoader::load_from_path(file.path()).unwrap();
    let warnings = config_loader::collect_warnings(&blueprint);
    assert_eq!(warnings.len(), 1);

    let resolver = EndpointResolver::new(blueprint.output).unwrap();
    let endpoints = resolver.endpoints();
    // legacy url is appended after `urls`
    assert_eq!(endpoints[0].kind, TransportKind::Datagram);
    assert_eq!(endpoints[0].payload_size, Some(1400));
    assert_eq!(endpoints[1].kind, TransportKind::Stream);
    assert_eq!(endpoints[1].endpoint, "http://127.0.0.1:8086");
}

#[test]
fn test_round_trip_through_toml() {
    let blueprint = ConfigLoader::load_from_str(SAMPLE_CONFIG, ConfigFormat::Toml).unwrap();
    let rendered = ConfigLoader::to_toml(&blueprint).unwrap();
    let reloaded = ConfigLoader::load_from_str(&rendered, ConfigFormat::Toml).unwrap();
    assert_eq!(reloaded.output.endpoint_urls(), blueprint.output.endpoint_urls());
    assert_eq!(reloaded.output.timeout, blueprint.output.timeout);
}
