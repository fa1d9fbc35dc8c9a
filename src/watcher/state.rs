//! 监听器状态机（同步部分）
//! 轮询只负责发现变化并记录快照，真正的清理与回写在防抖到期后进行

use std::sync::Arc;

use tracing::{debug, info, warn};

use super::clipboard::ClipboardProvider;
use crate::cleaner::UrlCleaner;
use crate::utils::{content_hash, DiagnosticLog};

/// 轮询发现变化时记录的快照
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PendingSnapshot {
    pub text: Option<String>,
    pub token: u64,
}

/// 防抖到期后的处理结果
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FireOutcome {
    /// 防抖期间剪贴板又被改动，本次作废
    Stale,
    /// 剪贴板为空或非文本，忘记上次的内容指纹
    Cleared,
    /// 与上次处理过的内容相同
    Duplicate,
    /// 不是可清理的 URL
    NotApplicable,
    /// 是 URL 但没有需要移除的参数
    AlreadyClean,
    /// 已写回清理后的 URL
    Rewritten,
    /// 写回被拒绝
    WriteFailed,
}

pub struct WatcherCore<C: ClipboardProvider> {
    clipboard: C,
    cleaner: Arc<dyn UrlCleaner>,
    last_token: u64,
    last_hash: Option<String>,
    replace_mode: bool,
    diag_log: Option<DiagnosticLog>,
}

impl<C: ClipboardProvider> WatcherCore<C> {
    pub fn new(clipboard: C, cleaner: Arc<dyn UrlCleaner>) -> Self {
        Self {
            clipboard,
            cleaner,
            last_token: 0,
            last_hash: None,
            replace_mode: false,
            diag_log: None,
        }
    }

    pub fn with_diagnostic_log(mut self, log: DiagnosticLog) -> Self {
        self.set_diagnostic_log(log);
        self
    }

    pub fn set_diagnostic_log(&mut self, log: DiagnosticLog) {
        self.diag_log = Some(log);
    }

    pub fn replace_mode(&self) -> bool {
        self.replace_mode
    }

    pub fn set_replace_mode(&mut self, enabled: bool) {
        self.replace_mode = enabled;
    }

    pub fn last_token(&self) -> u64 {
        self.last_token
    }

    pub fn last_hash(&self) -> Option<&str> {
        self.last_hash.as_deref()
    }

    /// 重置状态并以当前剪贴板令牌为基线，启动前已存在的内容不会被处理
    pub fn rebaseline(&mut self) {
        self.last_token = self.clipboard.change_token();
        self.last_hash = None;
    }

    /// 轮询一次：令牌未变返回 None，否则记录快照
    pub fn poll_tick(&mut self) -> Option<PendingSnapshot> {
        let token = self.clipboard.change_token();
        if token == self.last_token {
            return None;
        }
        self.last_token = token;

        Some(PendingSnapshot {
            text: self.clipboard.read_text(),
            token,
        })
    }

    /// 防抖到期：校验快照是否仍然有效，然后清理并写回
    pub fn debounce_fire(&mut self, pending: PendingSnapshot) -> FireOutcome {
        if self.clipboard.change_token() != pending.token {
            debug!("防抖期间剪贴板已变化，丢弃快照");
            return FireOutcome::Stale;
        }

        let text = match pending.text {
            Some(text) if !text.is_empty() => text,
            _ => {
                self.last_hash = None;
                return FireOutcome::Cleared;
            }
        };

        let hash = content_hash(&text);
        if self.last_hash.as_deref() == Some(hash.as_str()) {
            return FireOutcome::Duplicate;
        }

        let cleaned = match self.cleaner.clean_if_needed(&text, self.replace_mode) {
            Some(cleaned) => cleaned,
            None => {
                self.last_hash = Some(hash);
                return FireOutcome::NotApplicable;
            }
        };
        if cleaned == text {
            self.last_hash = Some(hash);
            return FireOutcome::AlreadyClean;
        }

        match self.clipboard.write_text(&cleaned) {
            Ok(()) => {
                // 以写入后的令牌为基线，自身的写入不会再触发一轮处理
                self.last_token = self.clipboard.change_token();
                self.last_hash = Some(content_hash(&cleaned));
                info!("剪贴板URL已清理");
                FireOutcome::Rewritten
            }
            Err(e) => {
                warn!("剪贴板回写失败：{}", e);
                if let Some(log) = &self.diag_log {
                    log.record(&format!("Clipboard write-back failed: {}", e));
                }
                FireOutcome::WriteFailed
            }
        }
    }
}
