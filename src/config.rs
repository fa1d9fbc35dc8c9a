//! 全局配置管理,存储所有可配置项

use std::path::PathBuf;
use std::time::Duration;

use url::Url;

/// 规则地址环境变量覆盖
pub const RULES_URL_ENV: &str = "PUREPASTE_RULES_URL";

/// 打包期写入的规则地址（构建时通过同名环境变量注入）
pub const PACKAGED_RULES_URL: Option<&str> = option_env!("PUREPASTE_PARSED_RULES_URL");

/// 编译期默认规则地址
pub const DEFAULT_RULES_URL: &str =
    "https://raw.githubusercontent.com/jayf0x/url-safe-clipboard/refs/heads/main/assets/parsedRules.json";

const CACHE_DIR_NAME: &str = "PurePaste";
const LEGACY_CACHE_DIR_NAME: &str = "URLSafeClipboard";

/// 全局配置
#[derive(Debug, Clone)]
pub struct GlobalConfig {
    // 规则缓存目录
    pub cache_dir: PathBuf,
    // 旧版产品的缓存目录（仅用于一次性迁移）
    pub legacy_cache_dir: Option<PathBuf>,
    // 内置资源搜索起点（每个起点向上最多查找8层 assets/ 目录）
    pub asset_search_roots: Vec<PathBuf>,
    // 是否启用编译进二进制的内置规则
    pub embedded_rules: bool,
    // 远程拉取超时
    pub http_timeout: Duration,
    // 剪贴板轮询间隔
    pub poll_interval: Duration,
    // 剪贴板变化防抖间隔
    pub debounce_interval: Duration,
}

impl Default for GlobalConfig {
    fn default() -> Self {
        let cache_base = dirs::cache_dir().unwrap_or_else(std::env::temp_dir);

        let mut asset_search_roots = Vec::new();
        if let Some(exe_dir) = std::env::current_exe()
            .ok()
            .and_then(|exe| exe.parent().map(PathBuf::from))
        {
            asset_search_roots.push(exe_dir);
        }
        if let Ok(cwd) = std::env::current_dir() {
            asset_search_roots.push(cwd);
        }

        Self {
            cache_dir: cache_base.join(CACHE_DIR_NAME),
            legacy_cache_dir: Some(cache_base.join(LEGACY_CACHE_DIR_NAME)),
            asset_search_roots,
            embedded_rules: cfg!(feature = "embedded-rules"),
            http_timeout: Duration::from_secs(12),
            poll_interval: Duration::from_millis(200),
            debounce_interval: Duration::from_millis(80),
        }
    }
}

impl GlobalConfig {
    /// 解析远程规则地址：环境变量 > 打包配置 > 编译期默认值
    pub fn rules_url(&self) -> String {
        resolve_rules_url(std::env::var(RULES_URL_ENV).ok(), PACKAGED_RULES_URL)
    }
}

/// 按优先级选出第一个非空且可解析的地址
pub fn resolve_rules_url(env_override: Option<String>, packaged: Option<&str>) -> String {
    let usable = |candidate: &str| !candidate.trim().is_empty() && Url::parse(candidate.trim()).is_ok();

    if let Some(url) = env_override.as_deref().filter(|u| usable(u)) {
        return url.trim().to_string();
    }
    if let Some(url) = packaged.filter(|u| usable(u)) {
        return url.trim().to_string();
    }
    DEFAULT_RULES_URL.to_string()
}

/// 配置管理器
pub struct ConfigManager;

impl ConfigManager {
    /// 获取默认配置
    pub fn get_default() -> GlobalConfig {
        GlobalConfig::default()
    }

    /// 自定义配置
    pub fn custom() -> CustomConfigBuilder {
        CustomConfigBuilder::new()
    }
}

/// 配置构建器（便于自定义配置）
#[derive(Debug, Clone)]
pub struct CustomConfigBuilder {
    config: GlobalConfig,
}

impl Default for CustomConfigBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl CustomConfigBuilder {
    pub fn new() -> Self {
        Self {
            config: GlobalConfig::default(),
        }
    }

    pub fn cache_dir(mut self, path: PathBuf) -> Self {
        self.config.cache_dir = path;
        self
    }

    pub fn legacy_cache_dir(mut self, path: Option<PathBuf>) -> Self {
        self.config.legacy_cache_dir = path;
        self
    }

    pub fn asset_search_roots(mut self, roots: Vec<PathBuf>) -> Self {
        self.config.asset_search_roots = roots;
        self
    }

    pub fn embedded_rules(mut self, enabled: bool) -> Self {
        self.config.embedded_rules = enabled;
        self
    }

    pub fn http_timeout(mut self, timeout: Duration) -> Self {
        self.config.http_timeout = timeout;
        self
    }

    pub fn poll_interval(mut self, interval: Duration) -> Self {
        self.config.poll_interval = interval;
        self
    }

    pub fn debounce_interval(mut self, interval: Duration) -> Self {
        self.config.debounce_interval = interval;
        self
    }

    pub fn build(self) -> GlobalConfig {
        self.config
    }
}
