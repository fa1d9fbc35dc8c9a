//! URL 清理引擎
//! 纯函数：(输入串, 替换模式) -> 清理后的串 或 不适用

use url::Url;

use crate::compiler::RuleSet;

/// 替换模式下写入的固定值
pub const NEUTRALIZED_VALUE: &str = "null";

/// URL 清理引擎
pub struct CleaningEngine;

impl CleaningEngine {
    /// 非 http(s) URL 返回 None；无需改动时原样返回去空白后的输入
    pub fn clean_if_needed(rules: &RuleSet, input: &str, replace_mode: bool) -> Option<String> {
        let trimmed = input.trim();
        if trimmed.is_empty() || trimmed.contains(char::is_whitespace) {
            return None;
        }

        let mut url = Url::parse(trimmed).ok()?;
        if !matches!(url.scheme(), "http" | "https") || url.host().is_none() {
            return None;
        }

        let query = match url.query() {
            Some(query) if !query.is_empty() => query.to_string(),
            _ => return Some(trimmed.to_string()),
        };

        let matching_providers = rules.matching_providers(trimmed);
        let mut kept: Vec<String> = Vec::new();
        let mut mutated = false;

        for segment in query.split('&') {
            let (raw_name, raw_value) = match segment.split_once('=') {
                Some((name, value)) => (name, Some(value)),
                None => (segment, None),
            };
            let name = decode_component(raw_name);
            let normalized = name.trim();
            if normalized.is_empty() {
                mutated = true;
                continue;
            }
            let renamed = normalized != name;

            if rules.should_remove(normalized, &matching_providers) {
                if replace_mode {
                    let value = raw_value.map(decode_component);
                    if renamed || value.as_deref() != Some(NEUTRALIZED_VALUE) {
                        mutated = true;
                    }
                    kept.push(format!("{}={}", encode_name(normalized), NEUTRALIZED_VALUE));
                } else {
                    mutated = true;
                }
                continue;
            }

            if renamed {
                mutated = true;
                kept.push(match raw_value {
                    Some(value) => format!("{}={}", encode_name(normalized), value),
                    None => encode_name(normalized),
                });
            } else {
                kept.push(segment.to_string());
            }
        }

        if !mutated {
            return Some(trimmed.to_string());
        }

        if kept.is_empty() {
            url.set_query(None);
        } else {
            url.set_query(Some(&kept.join("&")));
        }
        Some(url.into())
    }
}

/// 非法 UTF-8 以替换字符保留
fn decode_component(raw: &str) -> String {
    String::from_utf8_lossy(&urlencoding::decode_binary(raw.as_bytes())).into_owned()
}

fn encode_name(name: &str) -> String {
    urlencoding::encode(name).into_owned()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::compiler::RuleCompiler;

    fn rules() -> RuleSet {
        RuleCompiler::compile_bytes(
            br#"{
                "generalExact": ["utm_source", "fbclid"],
                "generalRegex": ["mc_[a-z]+"],
                "providers": [
                    {"name": "amazon", "urlPattern": "amazon\\.", "exactParams": ["tag"], "regexParams": ["pd_rd_.*"]},
                    {"name": "shop", "urlPattern": "shop\\.", "exactParams": ["ref"]}
                ]
            }"#,
        )
        .unwrap()
    }

    fn clean(input: &str, replace: bool) -> Option<String> {
        CleaningEngine::clean_if_needed(&rules(), input, replace)
    }

    #[test]
    fn test_removes_general_exact() {
        assert_eq!(
            clean("https://example.com/?utm_source=ads&id=5", false).as_deref(),
            Some("https://example.com/?id=5")
        );
    }

    #[test]
    fn test_clean_url_is_returned_verbatim() {
        assert_eq!(clean("https://example.com/?id=5", false).as_deref(), Some("https://example.com/?id=5"));
        // 无改动时不做重新编码或路径补全
        assert_eq!(clean("HTTPS://Example.com?b=1&a=%7e", false).as_deref(), Some("HTTPS://Example.com?b=1&a=%7e"));
    }

    #[test]
    fn test_replace_mode_neutralizes_value() {
        assert_eq!(
            clean("https://shop.example/?fbclid=abc", true).as_deref(),
            Some("https://shop.example/?fbclid=null")
        );
    }

    #[test]
    fn test_replace_mode_already_null_is_untouched() {
        assert_eq!(
            clean("https://shop.example/?fbclid=null&x=1", true).as_deref(),
            Some("https://shop.example/?fbclid=null&x=1")
        );
        // 名称需要规范化时仍视为改动
        assert_eq!(
            clean("https://shop.example/?%20fbclid=null", true).as_deref(),
            Some("https://shop.example/?fbclid=null")
        );
    }

    #[test]
    fn test_replace_mode_valueless_parameter_gets_null() {
        assert_eq!(clean("https://a.com/?fbclid", true).as_deref(), Some("https://a.com/?fbclid=null"));
    }

    #[test]
    fn test_not_applicable_inputs() {
        assert_eq!(clean("not a url", false), None);
        assert_eq!(clean("   ", false), None);
        assert_eq!(clean("ftp://example.com/?utm_source=x", false), None);
        assert_eq!(clean("mailto:someone@example.com?utm_source=x", false), None);
        assert_eq!(clean("https://example.com/?utm_source=x and more text", false), None);
    }

    #[test]
    fn test_query_dropped_entirely_when_empty() {
        assert_eq!(
            clean("https://example.com/path?utm_source=a&fbclid=b#frag", false).as_deref(),
            Some("https://example.com/path#frag")
        );
    }

    #[test]
    fn test_no_query_returns_trimmed_input() {
        assert_eq!(clean("  https://example.com/a  ", false).as_deref(), Some("https://example.com/a"));
        assert_eq!(clean("https://example.com/a?", false).as_deref(), Some("https://example.com/a?"));
    }

    #[test]
    fn test_case_insensitive_and_regex_matching() {
        assert_eq!(
            clean("https://example.com/?UTM_SOURCE=a&MC_eid=1&keep=1", false).as_deref(),
            Some("https://example.com/?keep=1")
        );
    }

    #[test]
    fn test_empty_and_padded_names_are_normalized() {
        assert_eq!(
            clean("https://example.com/?=x&%20id%20=5&&q=1", false).as_deref(),
            Some("https://example.com/?id=5&q=1")
        );
    }

    #[test]
    fn test_provider_rules_only_apply_when_url_matches() {
        assert_eq!(
            clean("https://www.amazon.de/dp/1?tag=abc&pd_rd_w=x&th=1", false).as_deref(),
            Some("https://www.amazon.de/dp/1?th=1")
        );
        assert_eq!(
            clean("https://example.com/?tag=abc", false).as_deref(),
            Some("https://example.com/?tag=abc")
        );
    }

    #[test]
    fn test_provider_match_is_not_host_restricted() {
        // URL 模式在查询串中命中同样生效
        assert_eq!(
            clean("https://example.com/?next=amazon.com&tag=abc", false).as_deref(),
            Some("https://example.com/?next=amazon.com")
        );
    }

    #[test]
    fn test_removal_is_union_across_matching_providers() {
        assert_eq!(
            clean("https://shop.amazon.com/?tag=1&ref=2&id=3", false).as_deref(),
            Some("https://shop.amazon.com/?id=3")
        );
    }

    #[test]
    fn test_untouched_segments_keep_their_encoding() {
        assert_eq!(
            clean("https://example.com/?q=a%20b+c&utm_source=x&e=%E2%9C%93", false).as_deref(),
            Some("https://example.com/?q=a%20b+c&e=%E2%9C%93")
        );
    }

    #[test]
    fn test_cleaning_is_idempotent() {
        let inputs = [
            "https://example.com/?utm_source=ads&id=5",
            "https://www.amazon.de/dp/1?tag=abc&pd_rd_w=x&th=1",
            "https://example.com/?=x&%20id%20=5",
            "https://shop.example/?fbclid=abc&ref=1",
        ];
        for replace in [false, true] {
            for input in inputs {
                let once = clean(input, replace).unwrap();
                assert_eq!(clean(&once, replace).unwrap(), once, "{} replace={}", input, replace);
            }
        }
    }

    #[test]
    fn test_replace_mode_keeps_parameter_count() {
        let input = "https://shop.example/?fbclid=1&ref=2&id=3&utm_source=4";
        let deleted = clean(input, false).unwrap();
        let replaced = clean(input, true).unwrap();

        let count = |s: &str| Url::parse(s).unwrap().query_pairs().count();
        assert_eq!(count(&deleted), 1);
        assert_eq!(count(&replaced), 4);
        assert_eq!(replaced, "https://shop.example/?fbclid=null&ref=null&id=3&utm_source=null");
    }

    #[test]
    fn test_empty_rules_change_nothing() {
        let input = "https://example.com/?utm_source=x";
        assert_eq!(
            CleaningEngine::clean_if_needed(&RuleSet::empty(), input, false).as_deref(),
            Some(input)
        );
    }
}
