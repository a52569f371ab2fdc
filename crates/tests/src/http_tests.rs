//! Stream endpoints against a fake InfluxDB HTTP API

use std::time::Duration;

use axum::http::StatusCode;
use contracts::MetricRecord;
use dispatcher::{
    EndpointSpec, HttpSink, MetricOutput, OutputError, SchemaGuard, Transport, TransportError,
};

use crate::support::{output_config, record, FakeInflux};

#[tokio::test]
async fn test_connect_creates_database_then_writes() {
    let server = FakeInflux::start().await;
    let mut config = output_config(&[server.url()]);
    config.username = Some("relay".into());
    config.password = Some("secret".into());
    config.retention_policy = "autogen".into();
    config.write_consistency = "one".into();

    let output = MetricOutput::from_config(config).unwrap();
    output.connect().await.unwrap();
    assert!(server.has_database("telegraf"));
    assert_eq!(output.pool_size().await, 1);

    let report = output
        .write(&[record("cpu", 1.5), record("mem", 2.0)])
        .await
        .unwrap();
    assert_eq!(report.endpoint.as_deref(), Some(server.url()));
    assert_eq!(report.attempts, 1);
    assert_eq!(report.points, 2);

    let writes = server.writes();
    assert_eq!(writes.len(), 1);
    let write = &writes[0];
    assert_eq!(write.params["db"], "telegraf");
    assert_eq!(write.params["precision"], "ns");
    assert_eq!(write.params["rp"], "autogen");
    assert_eq!(write.params["consistency"], "one");
    assert_eq!(
        write.body,
        "cpu,host=server\\ 01 value=1.5 1700000000000000000\n\
         mem,host=server\\ 01 value=2 1700000000000000000\n"
    );
    assert!(write
        .authorization
        .as_deref()
        .is_some_and(|auth| auth.starts_with("Basic ")));
    assert_eq!(write.user_agent.as_deref(), Some("metric-relay"));

    output.close().await.unwrap();
    assert_eq!(output.pool_size().await, 0);
}

#[tokio::test]
async fn test_dropped_database_is_recreated_and_batch_fails_over() {
    let a = FakeInflux::start().await;
    let b = FakeInflux::start().await;
    let output = MetricOutput::from_config(output_config(&[a.url(), b.url()])).unwrap();
    output.connect().await.unwrap();
    assert_eq!(a.creates(), 1);

    a.drop_database("telegraf");

    // keep writing until the shuffle tries `a` while its database is gone
    let mut calls = 0;
    while a.not_found() == 0 && calls < 64 {
        let report = output.write(&[record("cpu", 1.0)]).await.unwrap();
        calls += 1;
        if a.not_found() > 0 {
            assert_eq!(report.endpoint.as_deref(), Some(b.url()));
            assert_eq!(report.attempts, 2);
        }
    }

    assert_eq!(a.not_found(), 1, "shuffle never tried the broken endpoint");
    assert!(a.has_database("telegraf"));
    assert_eq!(a.creates(), 2);
    assert_eq!(output.pool_size().await, 2);
    // every call delivered exactly once
    assert_eq!(a.writes().len() + b.writes().len(), calls);
}

#[tokio::test]
async fn test_rejecting_endpoints_exhaust_pool() {
    let a = FakeInflux::start().await;
    let b = FakeInflux::start().await;
    let output = MetricOutput::from_config(output_config(&[a.url(), b.url()])).unwrap();
    output.connect().await.unwrap();

    a.reject_writes(StatusCode::INTERNAL_SERVER_ERROR);
    b.reject_writes(StatusCode::BAD_REQUEST);

    let err = output.write(&[record("cpu", 1.0)]).await.unwrap_err();
    assert!(matches!(
        err,
        OutputError::PoolExhausted {
            attempted: 2,
            pool_size: 2
        }
    ));
    assert!(a.writes().is_empty() && b.writes().is_empty());

    let stats = output.connection_stats().await;
    assert!(stats.iter().all(|s| s.counters.failure_count == 1));
}

#[tokio::test]
async fn test_slow_endpoint_times_out_and_fails_over() {
    let slow = FakeInflux::start().await;
    let fast = FakeInflux::start().await;
    let mut config = output_config(&[slow.url(), fast.url()]);
    config.timeout = Duration::from_millis(200);

    let output = MetricOutput::from_config(config).unwrap();
    output.connect().await.unwrap();
    slow.delay_writes(Duration::from_secs(2));

    for _ in 0..4 {
        let report = output.write(&[record("cpu", 1.0)]).await.unwrap();
        assert_eq!(report.endpoint.as_deref(), Some(fast.url()));
    }
    assert!(slow.writes().is_empty());
    assert_eq!(fast.writes().len(), 4);
}

#[tokio::test]
async fn test_endpoint_failing_schema_check_is_excluded() {
    let broken = FakeInflux::start().await;
    let healthy = FakeInflux::start().await;
    broken.fail_creates(true);

    let output =
        MetricOutput::from_config(output_config(&[broken.url(), healthy.url()])).unwrap();
    output.connect().await.unwrap();

    assert_eq!(output.pool_size().await, 1);
    let stats = output.connection_stats().await;
    assert_eq!(stats[0].endpoint, healthy.url());

    for _ in 0..4 {
        output.write(&[record("cpu", 1.0)]).await.unwrap();
    }
    assert_eq!(healthy.writes().len(), 4);
}

#[tokio::test]
async fn test_invalid_record_reaches_no_endpoint() {
    let server = FakeInflux::start().await;
    let output = MetricOutput::from_config(output_config(&[server.url()])).unwrap();
    output.connect().await.unwrap();

    let bad = MetricRecord::new("cpu", chrono::Utc::now())
        .with_field("samples", serde_json::json!([1, 2, 3]));
    let err = output
        .write(&[record("cpu", 1.0), bad])
        .await
        .unwrap_err();

    assert!(matches!(err, OutputError::Encoding { index: 1, .. }));
    assert!(server.writes().is_empty());
    assert_eq!(server.not_found(), 0);
}

#[tokio::test]
async fn test_empty_pool_is_rebuilt_on_write() {
    let server = FakeInflux::start().await;
    server.fail_creates(true);

    let output = MetricOutput::from_config(output_config(&[server.url()])).unwrap();
    output.connect().await.unwrap();
    assert_eq!(output.pool_size().await, 0);

    // rebuild attempted, endpoint still failing its schema check
    let err = output.write(&[record("cpu", 1.0)]).await.unwrap_err();
    assert!(matches!(err, OutputError::PoolExhausted { attempted: 0, .. }));
    assert_eq!(server.creates(), 2);

    server.fail_creates(false);
    let report = output.write(&[record("cpu", 1.0)]).await.unwrap();
    assert_eq!(report.endpoint.as_deref(), Some(server.url()));
    assert_eq!(output.pool_size().await, 1);
    assert_eq!(server.writes().len(), 1);
}

#[tokio::test]
async fn test_create_database_reports_existing_database() {
    let server = FakeInflux::start().await;
    let spec = EndpointSpec::resolve(server.url(), &output_config(&[])).unwrap();
    let sink = HttpSink::new(&spec).unwrap();

    sink.create_database("telegraf").await.unwrap();
    let err = sink.create_database("telegraf").await.unwrap_err();
    assert!(matches!(err, TransportError::AlreadyExists { .. }));

    // the guard treats it as success
    SchemaGuard::new("telegraf").ensure(&sink).await.unwrap();
    assert_eq!(server.creates(), 3);
}

#[tokio::test]
async fn test_missing_database_write_is_classified() {
    let server = FakeInflux::start().await;
    let spec = EndpointSpec::resolve(server.url(), &output_config(&[])).unwrap();
    let sink = HttpSink::new(&spec).unwrap();

    let encoder = dispatcher::BatchEncoder::new(contracts::BatchSettings {
        database: "telegraf".into(),
        ..Default::default()
    });
    let batch = encoder.encode(&[record("cpu", 1.0)]).unwrap();

    let err = sink.write(&batch).await.unwrap_err();
    assert_eq!(err.class(), contracts::FailureClass::SchemaMissing);
}

#[tokio::test]
async fn test_non_json_query_answer_is_not_success() {
    let server = FakeInflux::start().await;
    server.html_queries(true);
    let spec = EndpointSpec::resolve(server.url(), &output_config(&[])).unwrap();
    let sink = HttpSink::new(&spec).unwrap();

    let err = sink.create_database("telegraf").await.unwrap_err();
    match err {
        TransportError::Rejected {
            status, message, ..
        } => {
            assert_eq!(status, 200);
            assert!(message.contains("<html>"));
        }
        other => panic!("unexpected error: {other}"),
    }

    // the endpoint is kept out of the pool
    let output = MetricOutput::from_config(output_config(&[server.url()])).unwrap();
    output.connect().await.unwrap();
    assert_eq!(output.pool_size().await, 0);
}
