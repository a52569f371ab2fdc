//! Write path 指标收集模块
//!
//! 记录批次、单连接写入尝试、Schema 恢复与连接池状态。

use std::collections::HashMap;

use contracts::FailureClass;
use metrics::{counter, gauge, histogram};

/// 记录一次批次编码
pub fn record_batch_encoded(points: usize) {
    counter!("metric_relay_points_total").increment(points as u64);
    histogram!("metric_relay_batch_size").record(points as f64);
}

/// 记录一次批次写入结果
///
/// `attempts` 为本次调用尝试的连接数。
pub fn record_batch_outcome(success: bool, attempts: usize, latency_ms: f64) {
    let status = if success { "success" } else { "failure" };
    counter!("metric_relay_batches_total", "status" => status).increment(1);
    histogram!("metric_relay_write_attempts").record(attempts as f64);
    histogram!("metric_relay_write_latency_ms").record(latency_ms);
}

/// 记录单连接写入尝试
///
/// `failure` 为 None 表示成功。
pub fn record_write_attempt(endpoint: &str, failure: Option<FailureClass>) {
    let (status, class) = match failure {
        None => ("success", "none"),
        Some(class) => ("failure", class.as_str()),
    };
    counter!(
        "metric_relay_write_attempts_total",
        "endpoint" => endpoint.to_string(),
        "status" => status,
        "class" => class
    )
    .increment(1);
}

/// 记录 Schema 恢复
pub fn record_schema_recovery(endpoint: &str, success: bool) {
    let status = if success { "success" } else { "failure" };
    counter!(
        "metric_relay_schema_recoveries_total",
        "endpoint" => endpoint.to_string(),
        "status" => status
    )
    .increment(1);
}

/// 记录连接池大小
pub fn record_pool_size(size: usize) {
    gauge!("metric_relay_pool_size").set(size as f64);
}

/// 记录连接池重建
pub fn record_pool_rebuild(success: bool) {
    let status = if success { "success" } else { "failure" };
    counter!("metric_relay_pool_rebuilds_total", "status" => status).increment(1);
}

/// 写入指标聚合器
///
/// 在内存中聚合指标，便于统计和输出摘要。
#[derive(Debug, Clone, Default)]
pub struct WriteMetricsAggregator {
    /// 批次总数
    pub total_batches: u64,

    /// 失败批次数
    pub failed_batches: u64,

    /// 写入成功的点数
    pub points_written: u64,

    /// 每批尝试连接数统计
    pub attempt_stats: RunningStats,

    /// 写入延迟统计 (毫秒)
    pub latency_stats: RunningStats,

    /// 各端点成功写入批次数
    pub endpoint_counts: HashMap<String, u64>,
}

impl WriteMetricsAggregator {
    /// 创建新的聚合器
    pub fn new() -> Self {
        Self::default()
    }

    /// 记录成功批次
    pub fn record_success(&mut self, endpoint: &str, points: usize, attempts: usize, latency_ms: f64) {
        self.total_batches += 1;
        self.points_written += points as u64;
        self.attempt_stats.push(attempts as f64);
        self.latency_stats.push(latency_ms);
        *self.endpoint_counts.entry(endpoint.to_string()).or_insert(0) += 1;
    }

    /// 记录失败批次
    pub fn record_failure(&mut self, latency_ms: f64) {
        self.total_batches += 1;
        self.failed_batches += 1;
        self.latency_stats.push(latency_ms);
    }

    /// 生成摘要报告
    pub fn summary(&self) -> MetricsSummary {
        MetricsSummary {
            total_batches: self.total_batches,
            failed_batches: self.failed_batches,
            points_written: self.points_written,
            failure_rate: if self.total_batches > 0 {
                self.failed_batches as f64 / self.total_batches as f64 * 100.0
            } else {
                0.0
            },
            attempts: StatsSummary::from(&self.attempt_stats),
            latency_ms: StatsSummary::from(&self.latency_stats),
            endpoint_counts: self.endpoint_counts.clone(),
        }
    }

    /// 重置统计
    pub fn reset(&mut self) {
        *self = Self::default();
    }
}

/// 指标摘要
#[derive(Debug, Clone, Default)]
pub struct MetricsSummary {
    pub total_batches: u64,
    pub failed_batches: u64,
    pub points_written: u64,
    pub failure_rate: f64,
    pub attempts: StatsSummary,
    pub latency_ms: StatsSummary,
    pub endpoint_counts: HashMap<String, u64>,
}

impl std::fmt::Display for MetricsSummary {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        writeln!(f, "=== Write Metrics Summary ===")?;
        writeln!(f, "Total batches: {}", self.total_batches)?;
        writeln!(
            f,
            "Failed batches: {} ({:.2}%)",
            self.failed_batches, self.failure_rate
        )?;
        writeln!(f, "Points written: {}", self.points_written)?;
        writeln!(f, "Attempts per batch: {}", self.attempts)?;
        writeln!(f, "Latency (ms): {}", self.latency_ms)?;

        if !self.endpoint_counts.is_empty() {
            writeln!(f, "Batches per endpoint:")?;
            let mut endpoints: Vec<_> = self.endpoint_counts.iter().collect();
            endpoints.sort();
            for (endpoint, count) in endpoints {
                writeln!(f, "  {}: {}", endpoint, count)?;
            }
        }

        Ok(())
    }
}

/// 统计摘要
#[derive(Debug, Clone, Default)]
pub struct StatsSummary {
    pub count: u64,
    pub min: f64,
    pub max: f64,
    pub mean: f64,
    pub std_dev: f64,
}

impl From<&RunningStats> for StatsSummary {
    fn from(stats: &RunningStats) -> Self {
        Self {
            count: stats.count,
            min: stats.min,
            max: stats.max,
            mean: stats.mean(),
            std_dev: stats.std_dev(),
        }
    }
}

impl std::fmt::Display for StatsSummary {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        if self.count == 0 {
            write!(f, "N/A")
        } else {
            write!(
                f,
                "min={:.3}, max={:.3}, mean={:.3}, std={:.3} (n={})",
                self.min, self.max, self.mean, self.std_dev, self.count
            )
        }
    }
}

/// 在线统计计算器 (Welford's algorithm)
#[derive(Debug, Clone, Default)]
pub struct RunningStats {
    count: u64,
    mean: f64,
    m2: f64,
    min: f64,
    max: f64,
}

impl RunningStats {
    /// 添加新值
    pub fn push(&mut self, value: f64) {
        self.count += 1;

        if self.count == 1 {
            self.min = value;
            self.max = value;
            self.mean = value;
            self.m2 = 0.0;
        } else {
            self.min = self.min.min(value);
            self.max = self.max.max(value);

            let delta = value - self.mean;
            self.mean += delta / self.count as f64;
            let delta2 = value - self.mean;
            self.m2 += delta * delta2;
        }
    }

    /// 样本数量
    pub fn count(&self) -> u64 {
        self.count
    }

    /// 均值
    pub fn mean(&self) -> f64 {
        if self.count == 0 {
            0.0
        } else {
            self.mean
        }
    }

    /// 方差
    pub fn variance(&self) -> f64 {
        if self.count < 2 {
            0.0
        } else {
            self.m2 / (self.count - 1) as f64
        }
    }

    /// 标准差
    pub fn std_dev(&self) -> f64 {
        self.variance().sqrt()
    }

    /// 最小值
    pub fn min(&self) -> f64 {
        self.min
    }

    /// 最大值
    pub fn max(&self) -> f64 {
        self.max
    }
}
