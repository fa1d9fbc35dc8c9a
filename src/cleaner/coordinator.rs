//! 规则协调器
//! 持有当前生效的规则集快照，负责启动加载与刷新后的整体替换

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, PoisonError, RwLock};

use tracing::{debug, info};

use super::engine::CleaningEngine;
use super::UrlCleaner;
use crate::compiler::RuleSet;
use crate::config::GlobalConfig;
use crate::error::PpResult;
use crate::rule::{RefreshOutcome, RuleSourceLoader};

/// 规则协调器
pub struct RulesCoordinator {
    loader: RuleSourceLoader,
    rules: RwLock<Arc<RuleSet>>,
    refresh_on_launch: AtomicBool,
}

impl RulesCoordinator {
    /// 使用默认 HTTP 拉取器创建（尚未加载规则）
    pub fn new(config: GlobalConfig) -> PpResult<Self> {
        Ok(Self::with_loader(RuleSourceLoader::new(config)?))
    }

    pub fn with_loader(loader: RuleSourceLoader) -> Self {
        Self {
            loader,
            rules: RwLock::new(Arc::new(RuleSet::empty())),
            refresh_on_launch: AtomicBool::new(false),
        }
    }

    pub fn loader(&self) -> &RuleSourceLoader {
        &self.loader
    }

    /// 启动加载，返回是否来自缓存；非缓存来源会登记一次启动刷新
    pub fn bootstrap(&self) -> bool {
        let boot = self.loader.load_bootstrap();
        self.swap_rules(boot.rules);
        self.refresh_on_launch.store(!boot.loaded_from_cache, Ordering::SeqCst);
        info!("启动规则加载完成（来自缓存：{}）", boot.loaded_from_cache);
        boot.loaded_from_cache
    }

    /// 每个进程至多一次的自动刷新
    pub async fn refresh_if_needed_on_launch(&self) -> Option<RefreshOutcome> {
        if !self.refresh_on_launch.swap(false, Ordering::SeqCst) {
            return None;
        }
        Some(self.refresh().await)
    }

    /// 手动刷新；并发调用需由调用方自行互斥
    pub async fn refetch_manually(&self) -> RefreshOutcome {
        self.refresh().await
    }

    /// 当前规则集快照
    pub fn current_rules(&self) -> Arc<RuleSet> {
        self.rules.read().unwrap_or_else(PoisonError::into_inner).clone()
    }

    async fn refresh(&self) -> RefreshOutcome {
        let result = self.loader.refresh().await;
        match result.rules {
            Some(rules) => self.swap_rules(rules),
            None => debug!("刷新未得到任何规则，保留当前规则集"),
        }
        result.outcome
    }

    fn swap_rules(&self, rules: RuleSet) {
        *self.rules.write().unwrap_or_else(PoisonError::into_inner) = Arc::new(rules);
    }
}

impl UrlCleaner for RulesCoordinator {
    fn clean_if_needed(&self, input: &str, replace_mode: bool) -> Option<String> {
        CleaningEngine::clean_if_needed(&self.current_rules(), input, replace_mode)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ConfigManager;
    use crate::error::PurePasteError;
    use crate::rule::RuleFetcher;
    use async_trait::async_trait;
    use std::fs;
    use std::path::Path;
    use std::sync::atomic::AtomicUsize;

    struct CountingFetcher {
        body: Option<&'static [u8]>,
        calls: Arc<AtomicUsize>,
    }

    #[async_trait]
    impl RuleFetcher for CountingFetcher {
        async fn fetch(&self, _url: &str) -> PpResult<Vec<u8>> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            self.body
                .map(<[u8]>::to_vec)
                .ok_or_else(|| PurePasteError::SourceUnavailable("offline".to_string()))
        }
    }

    fn coordinator(root: &Path, bundle: Option<&[u8]>, body: Option<&'static [u8]>) -> (RulesCoordinator, Arc<AtomicUsize>) {
        let app = root.join("app");
        fs::create_dir_all(app.join("assets")).unwrap();
        if let Some(bundle) = bundle {
            fs::write(app.join("assets").join("parsedRules.json"), bundle).unwrap();
        }
        let config = ConfigManager::custom()
            .cache_dir(root.join("cache"))
            .legacy_cache_dir(None)
            .asset_search_roots(vec![app])
            .embedded_rules(false)
            .build();
        let calls = Arc::new(AtomicUsize::new(0));
        let fetcher = CountingFetcher { body, calls: Arc::clone(&calls) };
        (
            RulesCoordinator::with_loader(RuleSourceLoader::with_fetcher(config, Box::new(fetcher))),
            calls,
        )
    }

    #[tokio::test]
    async fn test_launch_refresh_runs_once_after_bundle_bootstrap() {
        let dir = tempfile::tempdir().unwrap();
        let (coordinator, calls) = coordinator(
            dir.path(),
            Some(br#"{"generalExact":["fbclid"]}"#),
            Some(br#"{"generalExact":["gclid"]}"#),
        );

        assert!(!coordinator.bootstrap());
        assert_eq!(
            coordinator.clean_if_needed("https://a.com/?fbclid=1&gclid=2", false).as_deref(),
            Some("https://a.com/?gclid=2")
        );

        let outcome = coordinator.refresh_if_needed_on_launch().await.unwrap();
        assert!(outcome.used_remote);
        assert!(coordinator.refresh_if_needed_on_launch().await.is_none());
        assert_eq!(calls.load(Ordering::SeqCst), 1);

        // 新规则整体替换旧规则
        assert_eq!(
            coordinator.clean_if_needed("https://a.com/?fbclid=1&gclid=2", false).as_deref(),
            Some("https://a.com/?fbclid=1")
        );
    }

    #[tokio::test]
    async fn test_no_launch_refresh_after_cache_bootstrap() {
        let dir = tempfile::tempdir().unwrap();
        let (coordinator, calls) = coordinator(dir.path(), None, Some(br#"{"generalExact":["gclid"]}"#));
        coordinator.loader().cache().save_bytes(br#"{"generalExact":["fbclid"]}"#).unwrap();

        assert!(coordinator.bootstrap());
        assert!(coordinator.refresh_if_needed_on_launch().await.is_none());
        assert_eq!(calls.load(Ordering::SeqCst), 0);

        coordinator.refetch_manually().await;
        coordinator.refetch_manually().await;
        assert_eq!(calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn test_failed_refresh_keeps_previous_rules() {
        let dir = tempfile::tempdir().unwrap();
        let (coordinator, _) = coordinator(dir.path(), Some(br#"{"generalExact":["fbclid"]}"#), None);
        coordinator.bootstrap();
        // 缓存与内置资源都失效后刷新
        fs::remove_file(coordinator.loader().cache().cache_file()).unwrap();
        fs::remove_file(dir.path().join("app").join("assets").join("parsedRules.json")).unwrap();

        let before = coordinator.current_rules();
        let outcome = coordinator.refetch_manually().await;
        assert!(outcome.had_errors);
        assert!(Arc::ptr_eq(&before, &coordinator.current_rules()));
        assert_eq!(
            coordinator.clean_if_needed("https://a.com/?fbclid=1", false).as_deref(),
            Some("https://a.com/")
        );
    }

    #[test]
    fn test_empty_bootstrap_cleans_nothing() {
        let dir = tempfile::tempdir().unwrap();
        let (coordinator, _) = coordinator(dir.path(), None, None);

        assert!(!coordinator.bootstrap());
        assert!(coordinator.current_rules().is_empty());
        assert_eq!(
            coordinator.clean_if_needed("https://a.com/?fbclid=1", false).as_deref(),
            Some("https://a.com/?fbclid=1")
        );
    }
}
