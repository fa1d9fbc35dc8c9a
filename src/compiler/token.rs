//! 规则词元分类
//! 统一判定原始词元是精确参数名还是正则模式，与规则来源无关

use once_cell::sync::Lazy;
use regex::Regex;

/// 含等号或任一正则元字符即视为正则
static REGEX_HINT: Lazy<Regex> = Lazy::new(|| Regex::new(r"[=\\^$.*+?()\[\]{}|]").unwrap());

/// 词元分类结果
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TokenKind {
    /// 精确参数名（已转小写）
    Exact(String),
    /// 参数名正则（未锚定的原始模式）
    Regex(String),
}

/// 分类单个原始词元，空词元返回None
pub fn classify_token(raw: &str) -> Option<TokenKind> {
    let mut token = raw.trim();
    if token.is_empty() {
        return None;
    }

    // /pattern/ 形式去掉首尾斜杠
    if is_slash_wrapped(token) {
        token = &token[1..token.len() - 1];
    }

    if REGEX_HINT.is_match(token) {
        Some(TokenKind::Regex(token.to_string()))
    } else {
        Some(TokenKind::Exact(token.to_lowercase()))
    }
}

/// classify_token 的逆操作：再次分类会被改写（去斜杠或去空白）的词元包上 /.../
pub fn token_source(token: &str) -> String {
    if is_slash_wrapped(token) || token.trim() != token {
        format!("/{}/", token)
    } else {
        token.to_string()
    }
}

fn is_slash_wrapped(token: &str) -> bool {
    token.chars().count() > 2 && token.starts_with('/') && token.ends_with('/')
}
