//! # Integration Tests
//!
//! 集成测试与端到端测试。
//!
//! 负责：
//! - 配置加载到连接池的全链路
//! - 基于 axum 的模拟 InfluxDB HTTP 服务
//! - 真实 UDP 接收端验证 datagram 写入

#[cfg(test)]
mod support;

#[cfg(test)]
mod config_tests;

#[cfg(test)]
mod http_tests;

#[cfg(test)]
mod udp_tests;

#[cfg(test)]
mod contract_tests {
    #[test]
    fn test_contracts_compile() {
        // 验证 contracts crate 可编译
        let _ = contracts::ConfigVersion::V1;
    }
}
