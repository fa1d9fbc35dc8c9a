//! 规则数据模型定义
//! 仅存储规则数据，无任何业务逻辑，支持序列化/反序列化
//! 同一结构既是缓存文件格式，也是远程/内置规则的传输格式

use serde::{Deserialize, Serialize};

use crate::error::{PpResult, PurePasteError};

/// 规则载荷（所有字段可选，容忍不同来源的结构差异）
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RuleSourcePayload {
    #[serde(default, alias = "general_exact")]
    pub general_exact: Option<Vec<String>>,
    #[serde(default, alias = "general_regex")]
    pub general_regex: Option<Vec<String>>,
    #[serde(default)]
    pub providers: Option<Vec<ProviderEntry>>,
}

/// 单个提供方规则
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProviderEntry {
    #[serde(default)]
    pub name: String,
    #[serde(default, alias = "url_pattern")]
    pub url_pattern: Option<String>,
    #[serde(default, alias = "exact_params")]
    pub exact_params: Vec<String>,
    #[serde(default, alias = "regex_params")]
    pub regex_params: Vec<String>,
}

impl RuleSourcePayload {
    /// 从原始字节解码并做结构校验
    pub fn from_slice(bytes: &[u8]) -> PpResult<Self> {
        let payload: RuleSourcePayload = serde_json::from_slice(bytes)
            .map_err(|e| PurePasteError::ParseError(format!("payload is not valid rule JSON: {}", e)))?;

        if payload.general_exact.is_none() && payload.general_regex.is_none() && payload.providers.is_none() {
            return Err(PurePasteError::ParseError(
                "payload contains none of generalExact, generalRegex, providers".to_string(),
            ));
        }

        Ok(payload)
    }

    /// 序列化为紧凑JSON
    pub fn to_vec(&self) -> PpResult<Vec<u8>> {
        Ok(serde_json::to_vec(self)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_decode_camel_case_payload() {
        let json = br#"{
            "generalExact": ["utm_source"],
            "generalRegex": ["utm_.*"],
            "providers": [{"name": "amazon", "urlPattern": "amazon\\.", "exactParams": ["tag"], "regexParams": []}]
        }"#;
        let payload = RuleSourcePayload::from_slice(json).unwrap();

        assert_eq!(payload.general_exact, Some(vec!["utm_source".to_string()]));
        let providers = payload.providers.unwrap();
        assert_eq!(providers[0].name, "amazon");
        assert_eq!(providers[0].url_pattern.as_deref(), Some("amazon\\."));
    }

    #[test]
    fn test_missing_fields_default() {
        let payload = RuleSourcePayload::from_slice(br#"{"providers": [{"name": "x"}]}"#).unwrap();
        assert!(payload.general_exact.is_none());
        let providers = payload.providers.unwrap();
        assert!(providers[0].url_pattern.is_none());
        assert!(providers[0].exact_params.is_empty());
    }

    #[test]
    fn test_snake_case_aliases_accepted() {
        let payload = RuleSourcePayload::from_slice(br#"{"general_exact": ["fbclid"]}"#).unwrap();
        assert_eq!(payload.general_exact, Some(vec!["fbclid".to_string()]));
    }

    #[test]
    fn test_payload_without_sections_is_rejected() {
        let err = RuleSourcePayload::from_slice(br#"{"unrelated": true}"#).unwrap_err();
        assert!(matches!(err, PurePasteError::ParseError(_)));
    }

    #[test]
    fn test_garbage_is_rejected() {
        assert!(RuleSourcePayload::from_slice(b"<html>500</html>").is_err());
        assert!(RuleSourcePayload::from_slice(b"").is_err());
    }
}
