//! # 进度通知与取消信号
//!
//! 运行器通过 `ProgressSink` 上报进度，通过 `CancellationToken` 接收停止请求。
//!
//! ## 依赖关系
//! - 被 `batch/runner.rs` 使用
//! - 使用 `crossbeam-channel` 把事件送往观察方

use crate::models::{RunOutcome, RunState, RunStatus};

use crossbeam_channel::Sender;
use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, AtomicU8, AtomicUsize, Ordering};
use std::sync::Arc;

/// 协作式取消令牌
///
/// 只在文件边界被检查，不会打断正在进行的转换。
#[derive(Debug, Clone)]
pub struct CancellationToken {
    cancelled: Arc<AtomicBool>,
}

impl CancellationToken {
    pub fn new() -> Self {
        Self {
            cancelled: Arc::new(AtomicBool::new(false)),
        }
    }

    pub fn cancel(&self) {
        self.cancelled.store(true, Ordering::SeqCst);
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancelled.load(Ordering::SeqCst)
    }
}

impl Default for CancellationToken {
    fn default() -> Self {
        Self::new()
    }
}

/// 运行事件，按处理顺序发送
#[derive(Debug, Clone)]
pub enum RunEvent {
    /// 候选文件已确定
    Started { total: usize },
    /// 开始转换某个文件
    FileStarted { index: usize, path: PathBuf },
    /// 文件转换成功
    FileConverted {
        source: PathBuf,
        output: PathBuf,
        state: RunState,
    },
    /// 文件转换失败（仅跳过继续策略下会继续运行）
    FileFailed {
        source: PathBuf,
        reason: String,
        state: RunState,
    },
    /// 运行结束
    Finished(RunStatus),
}

/// 进度接收方
///
/// 所有方法都在后台工作线程上调用。
pub trait ProgressSink {
    fn on_event(&self, event: RunEvent);
}

/// 通过 channel 转发事件
pub struct ChannelSink {
    tx: Sender<RunEvent>,
}

impl ChannelSink {
    pub fn new(tx: Sender<RunEvent>) -> Self {
        Self { tx }
    }
}

impl ProgressSink for ChannelSink {
    fn on_event(&self, event: RunEvent) {
        // 接收端被丢弃时运行照常继续
        let _ = self.tx.send(event);
    }
}

/// 单写多读的共享运行状态
pub(crate) struct SharedState {
    status: AtomicU8,
    total: AtomicUsize,
    completed: AtomicUsize,
    failed: AtomicUsize,
}

impl SharedState {
    pub(crate) fn new() -> Self {
        Self {
            status: AtomicU8::new(RunStatus::Idle.as_u8()),
            total: AtomicUsize::new(0),
            completed: AtomicUsize::new(0),
            failed: AtomicUsize::new(0),
        }
    }

    pub(crate) fn set_status(&self, status: RunStatus) {
        self.status.store(status.as_u8(), Ordering::SeqCst);
    }

    pub(crate) fn set_total(&self, total: usize) {
        self.total.store(total, Ordering::SeqCst);
    }

    pub(crate) fn record_success(&self) {
        self.completed.fetch_add(1, Ordering::SeqCst);
    }

    pub(crate) fn record_failure(&self) {
        self.failed.fetch_add(1, Ordering::SeqCst);
    }

    pub(crate) fn snapshot(&self) -> RunState {
        RunState {
            status: RunStatus::from_u8(self.status.load(Ordering::SeqCst)),
            total: self.total.load(Ordering::SeqCst),
            completed: self.completed.load(Ordering::SeqCst),
            failed: self.failed.load(Ordering::SeqCst),
        }
    }
}

type CompletionCallback = Box<dyn FnOnce(&RunOutcome) + Send>;

/// 完成信号：保存最终结果并通知已注册的回调
pub(crate) struct Completion {
    inner: std::sync::Mutex<CompletionInner>,
}

struct CompletionInner {
    outcome: Option<Arc<RunOutcome>>,
    callbacks: Vec<CompletionCallback>,
}

impl Completion {
    pub(crate) fn new() -> Self {
        Self {
            inner: std::sync::Mutex::new(CompletionInner {
                outcome: None,
                callbacks: Vec::new(),
            }),
        }
    }

    /// 注册回调；已结束时立即调用
    pub(crate) fn subscribe(&self, callback: CompletionCallback) {
        let outcome = {
            let mut inner = self.lock();
            match inner.outcome.clone() {
                Some(outcome) => outcome,
                None => {
                    inner.callbacks.push(callback);
                    return;
                }
            }
        };
        callback(&outcome);
    }

    /// 写入结果并依次调用回调，只会生效一次
    pub(crate) fn resolve(&self, outcome: RunOutcome) -> Arc<RunOutcome> {
        let (outcome, callbacks) = {
            let mut inner = self.lock();
            if let Some(existing) = inner.outcome.clone() {
                return existing;
            }
            let outcome = Arc::new(outcome);
            inner.outcome = Some(Arc::clone(&outcome));
            (outcome, std::mem::take(&mut inner.callbacks))
        };
        for callback in callbacks {
            callback(&outcome);
        }
        outcome
    }

    pub(crate) fn outcome(&self) -> Option<Arc<RunOutcome>> {
        self.lock().outcome.clone()
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, CompletionInner> {
        // 回调在锁外执行，中毒只可能来自其他 panic
        self.inner.lock().unwrap_or_else(|e| e.into_inner())
    }
}
