//! 内置规则资源
//! 依次查找各搜索起点（含向上8层父目录）下的 assets/parsedRules.json，
//! 最后回退到编译期嵌入的副本

use std::fs;
use std::path::{Path, PathBuf};

use tracing::debug;

use super::cache::PARSED_RULES_FILE;
use crate::compiler::{RuleCompiler, RuleSet};
use crate::config::GlobalConfig;
use crate::error::{PpResult, PurePasteError};

const ASSET_DIR: &str = "assets";
const MAX_ASCENT: usize = 8;

#[cfg(feature = "embedded-rules")]
static EMBEDDED_RULES: &[u8] = include_bytes!("../../assets/parsedRules.json");

fn embedded_rules() -> Option<&'static [u8]> {
    #[cfg(feature = "embedded-rules")]
    {
        Some(EMBEDDED_RULES)
    }
    #[cfg(not(feature = "embedded-rules"))]
    {
        None
    }
}

/// 内置规则加载器
#[derive(Debug, Clone)]
pub struct BundledAssets {
    search_roots: Vec<PathBuf>,
    use_embedded: bool,
}

impl BundledAssets {
    pub fn new(config: &GlobalConfig) -> Self {
        Self {
            search_roots: config.asset_search_roots.clone(),
            use_embedded: config.embedded_rules,
        }
    }

    /// 查找磁盘上的资源文件
    pub fn locate_files(&self) -> Vec<PathBuf> {
        let mut found = Vec::new();
        for root in &self.search_roots {
            if let Some(path) = search_up_tree(root) {
                if !found.contains(&path) {
                    found.push(path);
                }
            }
        }
        found
    }

    /// 取第一个能解析的内置载荷，返回规则集及其原始字节
    pub fn load(&self) -> PpResult<(RuleSet, Vec<u8>)> {
        for path in self.locate_files() {
            match fs::read(&path) {
                Ok(data) => match RuleCompiler::compile_bytes(&data) {
                    Ok(rules) => {
                        debug!("内置规则加载成功：{}", path.display());
                        return Ok((rules, data));
                    }
                    Err(e) => debug!("内置规则{}解析失败：{}", path.display(), e),
                },
                Err(e) => debug!("内置规则{}读取失败：{}", path.display(), e),
            }
        }

        if self.use_embedded {
            if let Some(data) = embedded_rules() {
                let rules = RuleCompiler::compile_bytes(data)?;
                debug!("使用编译期嵌入的内置规则");
                return Ok((rules, data.to_vec()));
            }
        }

        Err(PurePasteError::SourceUnavailable("no bundled rules found".to_string()))
    }
}

fn search_up_tree(root: &Path) -> Option<PathBuf> {
    let mut current = Some(root);
    for _ in 0..MAX_ASCENT {
        let dir = current?;
        let candidate = dir.join(ASSET_DIR).join(PARSED_RULES_FILE);
        if candidate.is_file() {
            return Some(candidate);
        }
        current = dir.parent();
    }
    None
}
