//! ClearURLs 风格提供方规则解析

use std::collections::{BTreeMap, BTreeSet};

use serde::Deserialize;

use crate::compiler::{classify_token, TokenKind};
use crate::error::{PpResult, PurePasteError};
use crate::rule::model::ProviderEntry;

#[derive(Debug, Deserialize)]
struct ClearUrlsRoot {
    #[serde(default)]
    providers: BTreeMap<String, ClearUrlsProvider>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ClearUrlsProvider {
    #[serde(default)]
    url_pattern: Option<String>,
    #[serde(default)]
    rules: Option<Vec<String>>,
    #[serde(default)]
    referral_marketing: Option<Vec<String>>,
    #[serde(default)]
    raw_rules: Option<Vec<String>>,
}

/// 解析提供方规则，按名称排序，缺少 urlPattern 的提供方跳过
pub fn parse_clear_urls_providers(data: &[u8]) -> PpResult<Vec<ProviderEntry>> {
    let root: ClearUrlsRoot = serde_json::from_slice(data)
        .map_err(|e| PurePasteError::ParseError(format!("provider list is not valid JSON: {}", e)))?;

    let mut entries = Vec::with_capacity(root.providers.len());
    for (name, provider) in root.providers {
        let Some(url_pattern) = provider.url_pattern.filter(|p| !p.is_empty()) else {
            continue;
        };

        let mut exact = BTreeSet::new();
        let mut regex = Vec::new();
        let tokens = [provider.rules, provider.referral_marketing, provider.raw_rules];
        for token in tokens.iter().flatten().flatten() {
            match classify_token(token) {
                Some(TokenKind::Exact(value)) => {
                    exact.insert(value);
                }
                Some(TokenKind::Regex(pattern)) => regex.push(pattern),
                None => {}
            }
        }

        entries.push(ProviderEntry {
            name,
            url_pattern: Some(url_pattern),
            exact_params: exact.into_iter().collect(),
            regex_params: regex,
        });
    }

    Ok(entries)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_providers() {
        let data = br#"{"providers": {
            "zeta": {"urlPattern": "zeta\\.com", "rules": ["Ref", "utm_[a-z]+"], "referralMarketing": ["tag"]},
            "alpha": {"urlPattern": "alpha\\.com", "rawRules": ["\\/ref=[^/?]*"]},
            "empty": {"urlPattern": "", "rules": ["x"]},
            "missing": {"rules": ["y"]}
        }}"#;
        let entries = parse_clear_urls_providers(data).unwrap();

        let names: Vec<&str> = entries.iter().map(|e| e.name.as_str()).collect();
        assert_eq!(names, vec!["alpha", "zeta"]);
        assert_eq!(entries[0].regex_params, vec!["\\/ref=[^/?]*"]);
        assert_eq!(entries[1].exact_params, vec!["ref", "tag"]);
        assert_eq!(entries[1].regex_params, vec!["utm_[a-z]+"]);
    }

    #[test]
    fn test_invalid_json_is_parse_error() {
        assert!(matches!(
            parse_clear_urls_providers(b"nope"),
            Err(PurePasteError::ParseError(_))
        ));
    }
}
