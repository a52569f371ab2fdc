//! 配置校验模块
//!
//! 校验规则：
//! - database 非空，udp_payload 不超过 UDP 上限 (derive 规则)
//! - 至少配置一个端点 (urls 或旧版 url)
//! - 每个端点都是合法 URL 且带 host
//! - UDP 端点必须带端口

use url::Url;
use validator::Validate;

use contracts::{ContractError, OutputConfig, RelayBlueprint};

/// 已知的写一致性取值 (仅用于告警，不参与校验)
const KNOWN_CONSISTENCY: [&str; 4] = ["any", "one", "quorum", "all"];

/// 校验 RelayBlueprint 配置
///
/// 返回第一个遇到的错误，或 Ok(())。
pub fn validate(blueprint: &RelayBlueprint) -> Result<(), ContractError> {
    validate_output_fields(&blueprint.output)?;
    validate_endpoint_presence(&blueprint.output)?;
    validate_endpoint_urls(&blueprint.output)?;
    Ok(())
}

/// 收集非致命问题
pub fn collect_warnings(blueprint: &RelayBlueprint) -> Vec<String> {
    let output = &blueprint.output;
    let mut warnings = Vec::new();

    if output.url.as_deref().is_some_and(|u| !u.is_empty()) {
        warnings.push("output.url is deprecated - list endpoints in output.urls".to_string());
    }

    if output.precision.is_some() {
        warnings.push(
            "output.precision is ignored - points are always written with ns precision"
                .to_string(),
        );
    }

    if !output.write_consistency.is_empty()
        && !KNOWN_CONSISTENCY.contains(&output.write_consistency.as_str())
    {
        warnings.push(format!(
            "output.write_consistency '{}' is not one of {:?} - passed to the store unchanged",
            output.write_consistency, KNOWN_CONSISTENCY
        ));
    }

    if output.timeout.is_zero() {
        warnings.push("output.timeout is 0s - stream writes will never time out".to_string());
    }

    warnings
}

/// derive 规则 (validator)
fn validate_output_fields(output: &OutputConfig) -> Result<(), ContractError> {
    output.validate().map_err(|errors| {
        let (field, message) = errors
            .field_errors()
            .into_iter()
            .next()
            .map(|(field, errs)| {
                let message = errs
                    .first()
                    .and_then(|e| e.message.as_ref())
                    .map(|m| m.to_string())
                    .unwrap_or_else(|| "invalid value".to_string());
                (format!("output.{field}"), message)
            })
            .unwrap_or_else(|| ("output".to_string(), errors.to_string()));
        ContractError::config_validation(field, message)
    })
}

/// 校验端点数量
fn validate_endpoint_presence(output: &OutputConfig) -> Result<(), ContractError> {
    if output.endpoint_urls().is_empty() {
        return Err(ContractError::config_validation(
            "output.urls",
            "at least one endpoint url is required",
        ));
    }
    Ok(())
}

/// 校验端点 URL
fn validate_endpoint_urls(output: &OutputConfig) -> Result<(), ContractError> {
    for (idx, raw) in output.endpoint_urls().into_iter().enumerate() {
        let field = format!("output.urls[{idx}]");
        let parsed = Url::parse(raw).map_err(|e| {
            ContractError::config_validation(&field, format!("invalid url '{raw}': {e}"))
        })?;

        if parsed.host_str().is_none_or(str::is_empty) {
            return Err(ContractError::config_validation(
                &field,
                format!("url '{raw}' has no host"),
            ));
        }

        if parsed.scheme().starts_with("udp") && parsed.port().is_none() {
            return Err(ContractError::config_validation(
                &field,
                format!("udp url '{raw}' requires an explicit port"),
            ));
        }
    }
    Ok(())
}
