//! 规则加载管理器
//! 启动加载：缓存 > 内置资源 > 空规则（无网络）
//! 刷新：远程 > 缓存 > 内置资源 > 放弃（保留内存中的现有规则）

use tracing::{debug, info, warn};

use super::bundled::BundledAssets;
use super::cache::RuleCacheManager;
use super::fetcher::{HttpRuleFetcher, RuleFetcher};
use crate::compiler::{RuleCompiler, RuleSet};
use crate::config::GlobalConfig;
use crate::error::PpResult;
use crate::utils::DiagnosticLog;

/// 启动加载结果
#[derive(Debug, Clone)]
pub struct BootstrapLoad {
    pub rules: RuleSet,
    pub loaded_from_cache: bool,
}

/// 刷新状态（面向用户的简短提示）
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RefreshOutcome {
    pub message: String,
    pub used_remote: bool,
    pub had_errors: bool,
}

/// 刷新结果：rules 为 None 表示所有来源均失败
#[derive(Debug, Clone)]
pub struct RefreshResult {
    pub rules: Option<RuleSet>,
    pub outcome: RefreshOutcome,
}

/// 规则加载管理器
pub struct RuleSourceLoader {
    config: GlobalConfig,
    cache: RuleCacheManager,
    bundled: BundledAssets,
    fetcher: Box<dyn RuleFetcher>,
    diag_log: DiagnosticLog,
}

impl RuleSourceLoader {
    /// 使用 HTTP 拉取器创建
    pub fn new(config: GlobalConfig) -> PpResult<Self> {
        let fetcher = HttpRuleFetcher::new(config.http_timeout)?;
        Ok(Self::with_fetcher(config, Box::new(fetcher)))
    }

    /// 使用自定义拉取器创建
    pub fn with_fetcher(config: GlobalConfig, fetcher: Box<dyn RuleFetcher>) -> Self {
        let cache = RuleCacheManager::new(&config);
        let bundled = BundledAssets::new(&config);
        let diag_log = DiagnosticLog::in_dir(cache.cache_dir());
        Self {
            config,
            cache,
            bundled,
            fetcher,
            diag_log,
        }
    }

    pub fn cache(&self) -> &RuleCacheManager {
        &self.cache
    }

    pub fn diagnostic_log(&self) -> &DiagnosticLog {
        &self.diag_log
    }

    /// 启动加载（同步、无网络）
    pub fn load_bootstrap(&self) -> BootstrapLoad {
        match self.cache.load_from_cache() {
            Ok(rules) => {
                debug!("从本地缓存加载启动规则成功");
                return BootstrapLoad {
                    rules,
                    loaded_from_cache: true,
                };
            }
            Err(e) => debug!("启动时本地缓存不可用：{}", e),
        }

        match self.bundled.load() {
            Ok((rules, data)) => {
                self.cache.store(&data);
                return BootstrapLoad {
                    rules,
                    loaded_from_cache: false,
                };
            }
            Err(e) => warn!("启动时未找到内置规则：{}", e),
        }

        BootstrapLoad {
            rules: RuleSet::empty(),
            loaded_from_cache: false,
        }
    }

    /// 刷新规则：远程失败时沿回退链降级
    pub async fn refresh(&self) -> RefreshResult {
        let url = self.config.rules_url();

        let data = match self.fetcher.fetch(&url).await {
            Ok(data) => data,
            Err(e) => return self.refresh_from_fallback(e.to_string()),
        };

        match RuleCompiler::compile_bytes(&data) {
            Ok(rules) => {
                self.cache.store(&data);
                info!("远程规则已更新：{}", url);
                RefreshResult {
                    rules: Some(rules),
                    outcome: RefreshOutcome {
                        message: "Rules updated from remote.".to_string(),
                        used_remote: true,
                        had_errors: false,
                    },
                }
            }
            Err(e) => self.refresh_from_fallback(format!("remote payload rejected: {}", e)),
        }
    }

    fn refresh_from_fallback(&self, reason: String) -> RefreshResult {
        warn!("规则刷新失败：{}", reason);
        let prefix = format!("Refetch failed: {}.", reason);

        let fallback = match self.cache.load_from_cache() {
            Ok(rules) => Some((rules, "Using cached rules.")),
            Err(cache_err) => {
                debug!("回退：本地缓存不可用：{}", cache_err);
                match self.bundled.load() {
                    Ok((rules, data)) => {
                        self.cache.store(&data);
                        Some((rules, "Using bundled rules."))
                    }
                    Err(bundled_err) => {
                        debug!("回退：内置规则不可用：{}", bundled_err);
                        None
                    }
                }
            }
        };

        let (rules, message) = match fallback {
            Some((rules, suffix)) => (Some(rules), format!("{} {}", prefix, suffix)),
            None => (None, format!("{} No fallback rules available.", prefix)),
        };
        self.diag_log.record(&message);

        RefreshResult {
            rules,
            outcome: RefreshOutcome {
                message,
                used_remote: false,
                had_errors: true,
            },
        }
    }
}
