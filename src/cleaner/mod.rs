//! 清理模块：URL 清理引擎与规则协调器
pub mod engine;
pub mod coordinator;

pub use self::engine::{CleaningEngine, NEUTRALIZED_VALUE};
pub use self::coordinator::RulesCoordinator;

use crate::compiler::RuleSet;

/// 剪贴板监听器依赖的清理接口
pub trait UrlCleaner {
    fn clean_if_needed(&self, input: &str, replace_mode: bool) -> Option<String>;
}

impl UrlCleaner for RuleSet {
    fn clean_if_needed(&self, input: &str, replace_mode: bool) -> Option<String> {
        CleaningEngine::clean_if_needed(self, input, replace_mode)
    }
}
