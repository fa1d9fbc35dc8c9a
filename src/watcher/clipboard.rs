//! 剪贴板抽象
//! 变更令牌单调递增，只要内容被任何一方写入就会变化

use std::cell::RefCell;
use std::rc::Rc;

use tracing::debug;

use crate::error::{PpResult, PurePasteError};

/// 监听器所需的剪贴板能力
pub trait ClipboardProvider {
    /// 当前变更令牌
    fn change_token(&mut self) -> u64;
    /// 当前文本内容（非文本或读取失败为 None）
    fn read_text(&mut self) -> Option<String>;
    /// 写入文本，被拒绝时返回 WriteBackFailure
    fn write_text(&mut self, text: &str) -> PpResult<()>;
}

/// 基于 arboard 的系统剪贴板
/// arboard 不提供变更计数，这里在每次观察到文本变化或自身写入时递增令牌
pub struct SystemClipboard {
    inner: arboard::Clipboard,
    token: u64,
    last_seen: Option<String>,
}

impl SystemClipboard {
    pub fn new() -> PpResult<Self> {
        let mut inner = arboard::Clipboard::new()
            .map_err(|e| PurePasteError::InvalidInput(format!("system clipboard unavailable: {}", e)))?;
        let last_seen = inner.get_text().ok();
        Ok(Self {
            inner,
            token: 0,
            last_seen,
        })
    }
}

impl ClipboardProvider for SystemClipboard {
    fn change_token(&mut self) -> u64 {
        let current = self.inner.get_text().ok();
        if current != self.last_seen {
            self.token += 1;
            self.last_seen = current;
        }
        self.token
    }

    fn read_text(&mut self) -> Option<String> {
        self.inner.get_text().ok()
    }

    fn write_text(&mut self, text: &str) -> PpResult<()> {
        self.inner
            .set_text(text.to_string())
            .map_err(|e| PurePasteError::WriteBackFailure(e.to_string()))?;
        self.token += 1;
        self.last_seen = Some(text.to_string());
        debug!("系统剪贴板已写入，令牌={}", self.token);
        Ok(())
    }
}

#[derive(Debug, Default)]
struct MemoryState {
    text: Option<String>,
    token: u64,
    writes: usize,
    reject_writes: bool,
}

/// 进程内剪贴板（无图形环境或测试时使用），克隆体共享同一份内容
#[derive(Debug, Clone, Default)]
pub struct MemoryClipboard {
    state: Rc<RefCell<MemoryState>>,
}

impl MemoryClipboard {
    pub fn new() -> Self {
        Self::default()
    }

    /// 模拟其他程序写入剪贴板
    pub fn set_external(&self, text: Option<&str>) {
        let mut state = self.state.borrow_mut();
        state.text = text.map(str::to_string);
        state.token += 1;
    }

    pub fn text(&self) -> Option<String> {
        self.state.borrow().text.clone()
    }

    pub fn token(&self) -> u64 {
        self.state.borrow().token
    }

    /// 监听器自身成功写入的次数
    pub fn write_count(&self) -> usize {
        self.state.borrow().writes
    }

    pub fn set_reject_writes(&self, reject: bool) {
        self.state.borrow_mut().reject_writes = reject;
    }
}

impl ClipboardProvider for MemoryClipboard {
    fn change_token(&mut self) -> u64 {
        self.state.borrow().token
    }

    fn read_text(&mut self) -> Option<String> {
        self.state.borrow().text.clone()
    }

    fn write_text(&mut self, text: &str) -> PpResult<()> {
        let mut state = self.state.borrow_mut();
        if state.reject_writes {
            return Err(PurePasteError::WriteBackFailure("clipboard rejected write".to_string()));
        }
        state.text = Some(text.to_string());
        state.token += 1;
        state.writes += 1;
        Ok(())
    }
}
