//! 剪贴板监听模块
pub mod clipboard;
pub mod state;
pub mod watcher;

pub use self::clipboard::{ClipboardProvider, MemoryClipboard, SystemClipboard};
pub use self::state::{FireOutcome, PendingSnapshot, WatcherCore};
pub use self::watcher::{ClipboardWatcher, WatcherPhase};
