//! Datagram endpoints against a real UDP socket

use std::time::Duration;

use dispatcher::MetricOutput;

use crate::support::{output_config, record, UdpReceiver};

const IDLE: Duration = Duration::from_millis(300);

#[tokio::test]
async fn test_batch_arrives_as_line_protocol() {
    let receiver = UdpReceiver::bind().await;
    let url = receiver.url();
    let output = MetricOutput::from_config(output_config(&[url.as_str()])).unwrap();
    output.connect().await.unwrap();

    let report = output
        .write(&[record("cpu", 0.5), record("mem", 42.25)])
        .await
        .unwrap();
    assert_eq!(report.endpoint.as_deref(), Some(url.as_str()));

    let packets = receiver.drain(IDLE).await;
    assert_eq!(packets.len(), 1);
    assert_eq!(
        String::from_utf8(packets[0].clone()).unwrap(),
        "cpu,host=server\\ 01 value=0.5 1700000000000000000\n\
         mem,host=server\\ 01 value=42.25 1700000000000000000\n"
    );

    output.close().await.unwrap();
}

#[tokio::test]
async fn test_large_batch_is_split_by_payload_bound() {
    let receiver = UdpReceiver::bind().await;
    let url = receiver.url();
    let mut config = output_config(&[url.as_str()]);
    config.udp_payload = 128;

    let output = MetricOutput::from_config(config).unwrap();
    output.connect().await.unwrap();

    let records: Vec<_> = (0..10).map(|i| record(&format!("m{i}"), 1.5)).collect();
    output.write(&records).await.unwrap();

    let packets = receiver.drain(IDLE).await;
    assert!(packets.len() > 1);
    assert!(packets.iter().all(|p| p.len() <= 128));

    let lines: Vec<String> = packets
        .iter()
        .flat_map(|p| {
            String::from_utf8(p.clone())
                .unwrap()
                .lines()
                .map(str::to_string)
                .collect::<Vec<_>>()
        })
        .collect();
    assert_eq!(lines.len(), 10);
    assert!(lines[0].starts_with("m0,"));
    assert!(lines[9].starts_with("m9,"));
}

#[tokio::test]
async fn test_datagram_pool_needs_no_schema_check() {
    let first = UdpReceiver::bind().await;
    let second = UdpReceiver::bind().await;
    let (first_url, second_url) = (first.url(), second.url());

    let config = output_config(&[first_url.as_str(), second_url.as_str()]);
    let output = MetricOutput::from_config(config).unwrap();
    output.connect().await.unwrap();
    assert_eq!(output.pool_size().await, 2);

    for i in 0..6 {
        output.write(&[record(&format!("m{i}"), 1.0)]).await.unwrap();
    }

    // each batch lands on exactly one endpoint
    let total = first.drain(IDLE).await.len() + second.drain(IDLE).await.len();
    assert_eq!(total, 6);
}
