//! uBlock Origin 风格过滤列表解析
//! 仅识别 `$removeparam=` 开头的行，作为通用规则

use std::collections::BTreeSet;

use crate::compiler::{classify_token, TokenKind};

const REMOVE_PARAM_PREFIX: &str = "$removeparam=";

/// 通用规则解析结果
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct GeneralRules {
    pub exact: Vec<String>,
    pub regex: Vec<String>,
}

/// 解析过滤列表文本
pub fn parse_remove_param_list(content: &str) -> GeneralRules {
    let mut exact = BTreeSet::new();
    let mut regex = Vec::new();

    for raw_line in content.lines() {
        let line = raw_line.trim();
        if line.is_empty() || line.starts_with('!') || line.starts_with('#') {
            continue;
        }
        let Some(rest) = line.strip_prefix(REMOVE_PARAM_PREFIX) else {
            continue;
        };

        // 逗号之后是过滤选项，丢弃
        let token = rest.split(',').next().unwrap_or_default();
        match classify_token(token) {
            Some(TokenKind::Exact(name)) => {
                exact.insert(name);
            }
            Some(TokenKind::Regex(pattern)) => regex.push(pattern),
            None => {}
        }
    }

    GeneralRules {
        exact: exact.into_iter().collect(),
        regex,
    }
}
