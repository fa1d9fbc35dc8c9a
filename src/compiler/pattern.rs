//! 编译后模式模型
//! 正则编译后的结构，整套规则编译完成后不可变

use std::collections::HashSet;
use regex::{Regex, RegexBuilder};

use crate::error::PpResult;

/// 编译后的正则模式
#[derive(Debug, Clone)]
pub struct CompiledPattern {
    pub source: String,
    pub regex: Regex,
}

impl CompiledPattern {
    /// 参数名正则：整串锚定 ^(?:...)$，忽略大小写
    pub fn parameter(source: &str) -> PpResult<Self> {
        let regex = RegexBuilder::new(&format!("^(?:{})$", source))
            .case_insensitive(true)
            .build()?;
        Ok(Self { source: source.to_string(), regex })
    }

    /// URL匹配正则：不锚定，在整个输入串中查找，忽略大小写
    pub fn url(source: &str) -> PpResult<Self> {
        let regex = RegexBuilder::new(source)
            .case_insensitive(true)
            .build()?;
        Ok(Self { source: source.to_string(), regex })
    }

    pub fn is_match(&self, input: &str) -> bool {
        self.regex.is_match(input)
    }
}

/// 提供方规则（仅在URL模式编译成功时生成）
#[derive(Debug, Clone)]
pub struct ProviderRule {
    pub name: String,
    pub url_pattern: CompiledPattern,
    pub exact_params: HashSet<String>,
    pub regex_params: Vec<CompiledPattern>,
}

impl ProviderRule {
    /// URL模式在输入任意位置命中即视为匹配（不限定主机名）
    pub fn matches_url(&self, url: &str) -> bool {
        self.url_pattern.is_match(url)
    }

    fn removes(&self, name: &str, lowercased: &str) -> bool {
        self.exact_params.contains(lowercased) || matches_any(&self.regex_params, name)
    }
}

/// 完整规则集快照，刷新时整体替换
#[derive(Debug, Clone, Default)]
pub struct RuleSet {
    general_exact: HashSet<String>,
    general_regex: Vec<CompiledPattern>,
    providers: Vec<ProviderRule>,
}

impl RuleSet {
    pub(crate) fn new(
        general_exact: HashSet<String>,
        general_regex: Vec<CompiledPattern>,
        providers: Vec<ProviderRule>,
    ) -> Self {
        Self { general_exact, general_regex, providers }
    }

    /// 空规则集（不移除任何参数）
    pub fn empty() -> Self {
        Self::default()
    }

    pub fn is_empty(&self) -> bool {
        self.general_exact.is_empty() && self.general_regex.is_empty() && self.providers.is_empty()
    }

    pub fn general_exact(&self) -> &HashSet<String> {
        &self.general_exact
    }

    pub fn general_regex(&self) -> &[CompiledPattern] {
        &self.general_regex
    }

    pub fn providers(&self) -> &[ProviderRule] {
        &self.providers
    }

    /// 找出URL模式命中输入的所有提供方
    pub fn matching_providers(&self, url: &str) -> Vec<&ProviderRule> {
        self.providers.iter().filter(|p| p.matches_url(url)).collect()
    }

    /// 通用规则或任一命中提供方的规则要求移除即移除（取并集）
    pub fn should_remove(&self, name: &str, matching_providers: &[&ProviderRule]) -> bool {
        let lowercased = name.to_lowercase();
        if self.general_exact.contains(&lowercased) || matches_any(&self.general_regex, name) {
            return true;
        }
        matching_providers.iter().any(|provider| provider.removes(name, &lowercased))
    }
}

fn matches_any(patterns: &[CompiledPattern], value: &str) -> bool {
    patterns.iter().any(|p| p.is_match(value))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parameter_pattern_is_anchored() {
        let pattern = CompiledPattern::parameter("utm_[a-z]+").unwrap();
        assert!(pattern.is_match("utm_source"));
        assert!(pattern.is_match("UTM_Medium"));
        assert!(!pattern.is_match("xutm_source"));
        assert!(!pattern.is_match("utm_source2"));
    }

    #[test]
    fn test_alternation_stays_inside_anchor() {
        let pattern = CompiledPattern::parameter("a|b").unwrap();
        assert!(pattern.is_match("a"));
        assert!(!pattern.is_match("ab"));
    }

    #[test]
    fn test_url_pattern_searches_anywhere() {
        let pattern = CompiledPattern::url("amazon\\.").unwrap();
        assert!(pattern.is_match("https://www.AMAZON.de/dp/1"));
        assert!(pattern.is_match("https://example.com/?next=amazon.com"));
    }

    #[test]
    fn test_invalid_regex_is_an_error() {
        assert!(CompiledPattern::parameter("(unclosed").is_err());
        assert!(CompiledPattern::url("[z-a]").is_err());
    }

    #[test]
    fn test_should_remove_unions_providers() {
        let provider_a = ProviderRule {
            name: "a".to_string(),
            url_pattern: CompiledPattern::url("example").unwrap(),
            exact_params: HashSet::from(["aid".to_string()]),
            regex_params: vec![],
        };
        let provider_b = ProviderRule {
            name: "b".to_string(),
            url_pattern: CompiledPattern::url("example").unwrap(),
            exact_params: HashSet::new(),
            regex_params: vec![CompiledPattern::parameter("b_.*").unwrap()],
        };
        let rules = RuleSet::new(HashSet::new(), vec![], vec![provider_a, provider_b]);
        let matching = rules.matching_providers("https://example.com/?aid=1");

        assert_eq!(matching.len(), 2);
        assert!(rules.should_remove("AID", &matching));
        assert!(rules.should_remove("b_tracker", &matching));
        assert!(!rules.should_remove("id", &matching));
        assert!(!rules.should_remove("aid", &[]));
    }
}
