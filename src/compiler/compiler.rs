//! 规则编译器核心
//! 负责载荷与规则集之间的双向转换，坏正则逐条丢弃而不中断整体加载

use std::collections::HashSet;
use std::time::Instant;
use tracing::debug;

use super::pattern::{CompiledPattern, ProviderRule, RuleSet};
use super::token::{classify_token, token_source, TokenKind};
use crate::error::PpResult;
use crate::rule::model::{ProviderEntry, RuleSourcePayload};

/// 编译统计
#[derive(Debug, Default)]
struct CompileStats {
    exact_count: usize,
    regex_count: usize,
    provider_count: usize,
    dropped_regex: usize,
    dropped_providers: usize,
}

/// 规则编译器
pub struct RuleCompiler;

impl RuleCompiler {
    /// 解码并编译原始载荷字节
    pub fn compile_bytes(bytes: &[u8]) -> PpResult<RuleSet> {
        let payload = RuleSourcePayload::from_slice(bytes)?;
        Ok(Self::compile(&payload))
    }

    /// 编译规则载荷
    pub fn compile(payload: &RuleSourcePayload) -> RuleSet {
        let start = Instant::now();
        let mut stats = CompileStats::default();

        let mut general_exact = HashSet::new();
        let mut general_patterns = Vec::new();
        let general_tokens = payload
            .general_exact
            .iter()
            .flatten()
            .chain(payload.general_regex.iter().flatten());
        for token in general_tokens {
            Self::add_token(token, &mut general_exact, &mut general_patterns);
        }
        let general_regex = Self::compile_parameter_regexes(&general_patterns, &mut stats);
        stats.exact_count += general_exact.len();

        let providers: Vec<ProviderRule> = payload
            .providers
            .iter()
            .flatten()
            .filter_map(|entry| Self::compile_provider(entry, &mut stats))
            .collect();
        stats.provider_count = providers.len();

        debug!(
            "规则集编译完成，耗时{:?}：精确={}，正则={}，提供方={}，丢弃正则={}，丢弃提供方={}",
            start.elapsed(),
            stats.exact_count,
            stats.regex_count,
            stats.provider_count,
            stats.dropped_regex,
            stats.dropped_providers
        );

        RuleSet::new(general_exact, general_regex, providers)
    }

    /// 规则集还原为载荷（精确列表排序，正则保持加载顺序）
    pub fn to_payload(rule_set: &RuleSet) -> RuleSourcePayload {
        let providers = rule_set
            .providers()
            .iter()
            .map(|provider| ProviderEntry {
                name: provider.name.clone(),
                url_pattern: Some(provider.url_pattern.source.clone()),
                exact_params: sorted(&provider.exact_params),
                regex_params: sources(&provider.regex_params),
            })
            .collect();

        RuleSourcePayload {
            general_exact: Some(sorted(rule_set.general_exact())),
            general_regex: Some(sources(rule_set.general_regex())),
            providers: Some(providers),
        }
    }

    /// 编译单个提供方：URL模式缺失或编译失败则整条丢弃
    fn compile_provider(entry: &ProviderEntry, stats: &mut CompileStats) -> Option<ProviderRule> {
        let Some(raw_pattern) = entry.url_pattern.as_deref().filter(|p| !p.is_empty()) else {
            stats.dropped_providers += 1;
            return None;
        };

        let url_pattern = match CompiledPattern::url(raw_pattern) {
            Ok(pattern) => pattern,
            Err(e) => {
                debug!("丢弃提供方[{}]：URL模式编译失败：{}", entry.name, e);
                stats.dropped_providers += 1;
                return None;
            }
        };

        let mut exact_params = HashSet::new();
        let mut patterns = Vec::new();
        for token in entry.exact_params.iter().chain(entry.regex_params.iter()) {
            Self::add_token(token, &mut exact_params, &mut patterns);
        }
        stats.exact_count += exact_params.len();

        Some(ProviderRule {
            name: entry.name.clone(),
            url_pattern,
            exact_params,
            regex_params: Self::compile_parameter_regexes(&patterns, stats),
        })
    }

    fn add_token(raw: &str, exact: &mut HashSet<String>, patterns: &mut Vec<String>) {
        match classify_token(raw) {
            Some(TokenKind::Exact(name)) => {
                exact.insert(name);
            }
            Some(TokenKind::Regex(pattern)) => patterns.push(pattern),
            None => {}
        }
    }

    fn compile_parameter_regexes(patterns: &[String], stats: &mut CompileStats) -> Vec<CompiledPattern> {
        patterns
            .iter()
            .filter_map(|source| match CompiledPattern::parameter(source) {
                Ok(pattern) => {
                    stats.regex_count += 1;
                    Some(pattern)
                }
                Err(e) => {
                    debug!("丢弃参数正则[{}]：{}", source, e);
                    stats.dropped_regex += 1;
                    None
                }
            })
            .collect()
    }
}

fn sorted(set: &HashSet<String>) -> Vec<String> {
    let mut values: Vec<String> = set.iter().map(|token| token_source(token)).collect();
    values.sort();
    values
}

fn sources(patterns: &[CompiledPattern]) -> Vec<String> {
    patterns.iter().map(|p| token_source(&p.source)).collect()
}
