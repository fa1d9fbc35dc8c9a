//! 剪贴板监听器
//! 轮询与防抖都是 LocalSet 上的本地任务，start 必须在 tokio::task::LocalSet 内调用

use std::cell::RefCell;
use std::rc::Rc;
use std::sync::Arc;
use std::time::Duration;

use tokio::task::{self, JoinHandle};
use tokio::time::{self, MissedTickBehavior};
use tracing::{debug, info};

use super::clipboard::ClipboardProvider;
use super::state::{PendingSnapshot, WatcherCore};
use crate::cleaner::UrlCleaner;
use crate::config::GlobalConfig;
use crate::utils::DiagnosticLog;

/// 监听器当前阶段
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WatcherPhase {
    Stopped,
    Idle,
    PendingDebounce,
}

#[derive(Default)]
struct Timers {
    poll: Option<JoinHandle<()>>,
    debounce: Option<JoinHandle<()>>,
}

impl Timers {
    fn cancel_debounce(&mut self) {
        if let Some(handle) = self.debounce.take() {
            handle.abort();
        }
    }

    fn cancel_all(&mut self) {
        if let Some(handle) = self.poll.take() {
            handle.abort();
        }
        self.cancel_debounce();
    }
}

/// 剪贴板监听器：固定间隔轮询，变化后防抖，再清理并写回
pub struct ClipboardWatcher<C: ClipboardProvider + 'static> {
    core: Rc<RefCell<WatcherCore<C>>>,
    timers: Rc<RefCell<Timers>>,
    poll_interval: Duration,
    debounce_interval: Duration,
}

impl<C: ClipboardProvider + 'static> ClipboardWatcher<C> {
    pub fn new(clipboard: C, cleaner: Arc<dyn UrlCleaner>, config: &GlobalConfig) -> Self {
        Self {
            core: Rc::new(RefCell::new(WatcherCore::new(clipboard, cleaner))),
            timers: Rc::new(RefCell::new(Timers::default())),
            poll_interval: config.poll_interval,
            debounce_interval: config.debounce_interval,
        }
    }

    pub fn with_diagnostic_log(self, log: DiagnosticLog) -> Self {
        self.core.borrow_mut().set_diagnostic_log(log);
        self
    }

    /// 开始监听；已在运行时不做任何事
    pub fn start(&self) {
        if self.timers.borrow().poll.is_some() {
            return;
        }
        self.core.borrow_mut().rebaseline();

        let core = Rc::clone(&self.core);
        let timers = Rc::clone(&self.timers);
        let poll_interval = self.poll_interval;
        let debounce_interval = self.debounce_interval;

        let handle = task::spawn_local(async move {
            let mut ticker = time::interval(poll_interval);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
            // interval 的第一个 tick 立即完成
            ticker.tick().await;
            loop {
                ticker.tick().await;
                let pending = core.borrow_mut().poll_tick();
                if let Some(pending) = pending {
                    arm_debounce(&core, &timers, pending, debounce_interval);
                }
            }
        });

        self.timers.borrow_mut().poll = Some(handle);
        info!(
            "剪贴板监听已启动（轮询={:?}，防抖={:?}）",
            self.poll_interval, self.debounce_interval
        );
    }

    /// 停止监听并取消未到期的防抖，可重复调用
    pub fn stop(&self) {
        let mut timers = self.timers.borrow_mut();
        if timers.poll.is_none() && timers.debounce.is_none() {
            return;
        }
        timers.cancel_all();
        info!("剪贴板监听已停止");
    }

    pub fn set_replace_mode(&self, enabled: bool) {
        self.core.borrow_mut().set_replace_mode(enabled);
    }

    pub fn replace_mode(&self) -> bool {
        self.core.borrow().replace_mode()
    }

    pub fn phase(&self) -> WatcherPhase {
        let timers = self.timers.borrow();
        match (&timers.poll, &timers.debounce) {
            (None, _) => WatcherPhase::Stopped,
            (Some(_), Some(_)) => WatcherPhase::PendingDebounce,
            (Some(_), None) => WatcherPhase::Idle,
        }
    }
}

impl<C: ClipboardProvider + 'static> Drop for ClipboardWatcher<C> {
    fn drop(&mut self) {
        self.timers.borrow_mut().cancel_all();
    }
}

/// 重新计时：旧的防抖任务被取消，只处理最后一次变化
fn arm_debounce<C: ClipboardProvider + 'static>(
    core: &Rc<RefCell<WatcherCore<C>>>,
    timers: &Rc<RefCell<Timers>>,
    pending: PendingSnapshot,
    delay: Duration,
) {
    let mut guard = timers.borrow_mut();
    guard.cancel_debounce();

    let core = Rc::clone(core);
    let timers_for_task = Rc::clone(timers);
    let handle = task::spawn_local(async move {
        time::sleep(delay).await;
        timers_for_task.borrow_mut().debounce = None;
        let outcome = core.borrow_mut().debounce_fire(pending);
        debug!("防抖到期，处理结果：{:?}", outcome);
    });
    guard.debounce = Some(handle);
}
