//! 规则模块：负责规则的加载、缓存、数据模型定义
pub mod model;
pub mod cache;
pub mod bundled;
pub mod fetcher;
pub mod loader;
pub mod source;

// 导出核心接口
pub use self::model::{ProviderEntry, RuleSourcePayload};
pub use self::cache::{migrate_legacy_cache, RuleCacheManager, PARSED_RULES_FILE};
pub use self::bundled::BundledAssets;
pub use self::fetcher::{HttpRuleFetcher, RuleFetcher};
pub use self::loader::{BootstrapLoad, RefreshOutcome, RefreshResult, RuleSourceLoader};
