//! 规则缓存管理
//! 缓存文件即"最近一次成功拉取并校验通过的载荷"，写入采用临时文件+重命名保证原子性

use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};

use tempfile::NamedTempFile;
use tracing::{debug, warn};

use crate::compiler::{RuleCompiler, RuleSet};
use crate::config::GlobalConfig;
use crate::error::{PpResult, PurePasteError};

/// 缓存文件名（与旧版产品保持一致，便于迁移）
pub const PARSED_RULES_FILE: &str = "parsedRules.json";

/// 规则缓存管理器
#[derive(Debug, Clone)]
pub struct RuleCacheManager {
    cache_dir: PathBuf,
}

impl RuleCacheManager {
    /// 按配置创建，并尝试一次旧缓存迁移
    pub fn new(config: &GlobalConfig) -> Self {
        if let Some(legacy) = &config.legacy_cache_dir {
            match migrate_legacy_cache(legacy, &config.cache_dir) {
                Ok(true) => debug!("旧缓存目录已迁移：{} -> {}", legacy.display(), config.cache_dir.display()),
                Ok(false) => {}
                Err(e) => debug!("跳过旧缓存迁移：{}", e),
            }
        }

        Self {
            cache_dir: config.cache_dir.clone(),
        }
    }

    pub fn cache_dir(&self) -> &Path {
        &self.cache_dir
    }

    pub fn cache_file(&self) -> PathBuf {
        self.cache_dir.join(PARSED_RULES_FILE)
    }

    /// 读取缓存原始字节
    pub fn load_bytes(&self) -> PpResult<Vec<u8>> {
        fs::read(self.cache_file()).map_err(|e| {
            PurePasteError::SourceUnavailable(format!("cache {} unreadable: {}", self.cache_file().display(), e))
        })
    }

    /// 从本地缓存加载规则集
    pub fn load_from_cache(&self) -> PpResult<RuleSet> {
        let data = self.load_bytes()?;
        RuleCompiler::compile_bytes(&data)
    }

    /// 原子写入缓存
    pub fn save_bytes(&self, data: &[u8]) -> PpResult<()> {
        let io_err = |e: std::io::Error| PurePasteError::CacheIoFailure(e.to_string());

        fs::create_dir_all(&self.cache_dir).map_err(io_err)?;
        let mut tmp = NamedTempFile::new_in(&self.cache_dir).map_err(io_err)?;
        tmp.write_all(data).map_err(io_err)?;
        tmp.as_file().sync_all().map_err(io_err)?;
        tmp.persist(self.cache_file()).map_err(|e| io_err(e.error))?;

        debug!("规则缓存已写入：{}字节 -> {}", data.len(), self.cache_file().display());
        Ok(())
    }

    /// 缓存只是优化，失败仅记录日志
    pub fn store(&self, data: &[u8]) {
        if let Err(e) = self.save_bytes(data) {
            warn!("规则缓存写入失败：{}", e);
        }
    }
}

/// 旧缓存目录迁移：仅当新目录尚不存在时复制（不移动）顶层文件，可重复调用
pub fn migrate_legacy_cache(legacy_dir: &Path, new_dir: &Path) -> PpResult<bool> {
    if !legacy_dir.is_dir() || new_dir.exists() {
        return Ok(false);
    }

    fs::create_dir_all(new_dir)?;
    for entry in fs::read_dir(legacy_dir)? {
        let entry = entry?;
        if !entry.file_type()?.is_file() {
            continue;
        }
        let target = new_dir.join(entry.file_name());
        if !target.exists() {
            fs::copy(entry.path(), target)?;
        }
    }

    Ok(true)
}
