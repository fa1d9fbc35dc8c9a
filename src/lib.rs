//! purepaste - 剪贴板 URL 跟踪参数清理工具

// 导出全局错误类型
pub use self::error::{PpResult, PurePasteError};

// 导出配置模块
pub use self::config::{ConfigManager, CustomConfigBuilder, GlobalConfig};

// 导出编译模块核心接口
pub use self::compiler::{classify_token, CompiledPattern, ProviderRule, RuleCompiler, RuleSet, TokenKind};

// 导出规则模块核心接口
pub use self::rule::{
    BootstrapLoad, BundledAssets, HttpRuleFetcher, ProviderEntry, RefreshOutcome, RefreshResult,
    RuleCacheManager, RuleFetcher, RuleSourceLoader, RuleSourcePayload,
};

// 导出清理模块核心接口
pub use self::cleaner::{CleaningEngine, RulesCoordinator, UrlCleaner, NEUTRALIZED_VALUE};

// 导出监听模块核心接口
pub use self::watcher::{
    ClipboardProvider, ClipboardWatcher, FireOutcome, MemoryClipboard, SystemClipboard, WatcherPhase,
};

// 导出工具模块核心接口
pub use self::utils::{content_hash, DiagnosticLog};

// 声明所有子模块
pub mod config;
pub mod error;
pub mod compiler;
pub mod rule;
pub mod cleaner;
pub mod watcher;
pub mod utils;
