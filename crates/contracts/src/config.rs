//! RelayBlueprint - Config Loader 输出
//!
//! 描述输出适配器的完整配置：目标端点、认证、数据库、写入设置。

use serde::{Deserialize, Serialize};
use std::time::Duration;
use validator::Validate;

/// Default datagram payload bound (bytes)
pub const DEFAULT_UDP_PAYLOAD: usize = 512;

/// Largest payload a single IPv4 UDP datagram can carry
pub const MAX_UDP_PAYLOAD: usize = 65507;

/// Default request timeout for stream endpoints
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(5);

/// 配置版本
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum ConfigVersion {
    #[default]
    V1,
}

/// 完整的配置蓝图
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct RelayBlueprint {
    /// 配置版本
    #[serde(default)]
    pub version: ConfigVersion,

    /// 输出配置
    #[validate(nested)]
    pub output: OutputConfig,
}

/// 输出配置：端点列表、认证、目标库
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct OutputConfig {
    /// 端点 URL 列表，同一集群内的多个节点
    #[serde(default)]
    pub urls: Vec<String>,

    /// 旧版单一 URL，追加在 `urls` 之后
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,

    /// 用户名
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub username: Option<String>,

    /// 密码
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub password: Option<String>,

    /// 目标数据库，不存在时自动创建
    #[validate(length(min = 1, message = "database cannot be empty"))]
    pub database: String,

    /// HTTP User-Agent
    #[serde(default = "default_user_agent")]
    pub user_agent: String,

    /// 保留策略，空字符串表示默认策略
    #[serde(default)]
    pub retention_policy: String,

    /// 写一致性 (any / one / quorum / all)，原样透传
    #[serde(default = "default_write_consistency")]
    pub write_consistency: String,

    /// 请求超时，0s 表示不限
    #[serde(default = "default_timeout", with = "humantime_serde")]
    pub timeout: Duration,

    /// UDP 负载上限 (字节)，0 表示默认值
    #[serde(default)]
    #[validate(range(max = 65507, message = "udp_payload exceeds the UDP datagram limit"))]
    pub udp_payload: usize,

    /// 旧版精度设置，已忽略
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub precision: Option<String>,
}

fn default_user_agent() -> String {
    "metric-relay".to_string()
}

fn default_write_consistency() -> String {
    "any".to_string()
}

fn default_timeout() -> Duration {
    DEFAULT_TIMEOUT
}

impl OutputConfig {
    /// 创建指向单一数据库的最小配置
    pub fn new(database: impl Into<String>) -> Self {
        Self {
            urls: Vec::new(),
            url: None,
            username: None,
            password: None,
            database: database.into(),
            user_agent: default_user_agent(),
            retention_policy: String::new(),
            write_consistency: default_write_consistency(),
            timeout: DEFAULT_TIMEOUT,
            udp_payload: 0,
            precision: None,
        }
    }

    /// 端点列表：`urls` 按顺序，旧版 `url` 追加在最后
    pub fn endpoint_urls(&self) -> Vec<&str> {
        let mut urls: Vec<&str> = self.urls.iter().map(String::as_str).collect();
        if let Some(legacy) = self.url.as_deref().filter(|u| !u.is_empty()) {
            urls.push(legacy);
        }
        urls
    }

    /// 实际生效的 UDP 负载上限
    pub fn effective_udp_payload(&self) -> usize {
        if self.udp_payload == 0 {
            DEFAULT_UDP_PAYLOAD
        } else {
            self.udp_payload
        }
    }
}
