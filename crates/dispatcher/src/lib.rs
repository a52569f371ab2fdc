//! # Dispatcher
//!
//! 指标输出模块。
//!
//! 负责：
//! - 将配置中的端点解析为 UDP / HTTP 连接池
//! - 将 `MetricRecord` 编码为 line protocol 批次
//! - 随机顺序故障转移写入，首个成功即返回
//! - 数据库缺失时自动重建，连接池为空时自动重建

pub mod dispatcher;
pub mod encoder;
pub mod endpoint;
pub mod error;
pub mod line_protocol;
pub mod metrics;
pub mod output;
pub mod pool;
pub mod resolver;
pub mod sample;
pub mod schema;
pub mod sinks;
#[cfg(any(test, feature = "testkit"))]
pub mod testing;

pub use contracts::{FailureClass, MetricRecord, OutputConfig, Transport, TransportError};
pub use dispatcher::{DispatchReport, FailoverDispatcher, shuffled_indices};
pub use encoder::{BatchEncoder, EncodingError, encode_record};
pub use endpoint::{EndpointSpec, TransportKind};
pub use error::OutputError;
pub use line_protocol::{render_batch, render_point};
pub use metrics::{ConnectionMetrics, MetricsSnapshot};
pub use output::{MetricOutput, PoolFactory, WriteReport};
pub use pool::{ConnectionPool, ConnectionState, ConnectionStats, PooledConnection};
pub use resolver::EndpointResolver;
pub use sample::SAMPLE_CONFIG;
pub use schema::SchemaGuard;
pub use sinks::{Connection, HttpSink, UdpSink, pack_datagrams};
