//! 剪贴板内容摘要

use sha2::{Digest, Sha256};

/// SHA-256 十六进制摘要
pub fn content_hash(value: &str) -> String {
    format!("{:x}", Sha256::digest(value.as_bytes()))
}
