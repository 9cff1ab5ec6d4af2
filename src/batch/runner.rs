//! # 批量执行器
//!
//! 在单个后台线程中按顺序转换候选文件。
//!
//! ## 功能
//! - 运行前校验请求
//! - 按枚举顺序逐个转换，同一时刻只有一个转换在进行
//! - 每个文件前检查取消信号
//! - 默认遇到第一个失败即终止；可选跳过继续
//! - 通过事件 channel 和完成回调报告结果
//!
//! ## 状态机
//! ```text
//! Idle ──start──▶ Running ──┬─▶ Completed
//!                           ├─▶ Cancelled
//!                           └─▶ Failed
//! ```
//!
//! ## 依赖关系
//! - 被 `commands/export.rs` 调用
//! - 使用 `batch/collector.rs` 枚举文件
//! - 使用 `converters::ConversionStep` 转换单个文件

use super::collector::FileCollector;
use super::progress::{
    CancellationToken, ChannelSink, Completion, ProgressSink, RunEvent, SharedState,
};
use crate::converters::ConversionStep;
use crate::error::{BulkExportError, Result};
use crate::models::{BatchRequest, FileFailure, RunOutcome, RunState, RunStatus, RunSummary};

use crossbeam_channel::Receiver;
use std::any::Any;
use std::panic::{self, AssertUnwindSafe};
use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread::JoinHandle;

/// 单个文件转换失败时的处理策略
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum FailurePolicy {
    /// 第一个失败即终止运行
    #[default]
    FailFast,
    /// 记录失败并继续处理剩余文件，结束时统一报告
    SkipAndContinue,
}

/// 批量执行器
pub struct BatchRunner {
    converter: Arc<dyn ConversionStep>,
    policy: FailurePolicy,
    /// 是否有运行在进行
    active: Arc<AtomicBool>,
}

impl BatchRunner {
    /// 创建新的批量执行器
    pub fn new(converter: impl ConversionStep + 'static) -> Self {
        Self {
            converter: Arc::new(converter),
            policy: FailurePolicy::default(),
            active: Arc::new(AtomicBool::new(false)),
        }
    }

    /// 设置失败策略
    pub fn with_policy(mut self, policy: FailurePolicy) -> Self {
        self.policy = policy;
        self
    }

    /// 当前状态：有运行时为 `Running`，否则为 `Idle`
    pub fn status(&self) -> RunStatus {
        if self.active.load(Ordering::SeqCst) {
            RunStatus::Running
        } else {
            RunStatus::Idle
        }
    }

    /// 在后台线程中开始一次运行
    ///
    /// 已有运行未结束时返回 `AlreadyRunning`。请求校验失败不会在这里报错，
    /// 而是让这次运行以 `Failed` 结束。
    pub fn start(&self, request: BatchRequest) -> Result<RunHandle> {
        if self
            .active
            .compare_exchange(false, true, Ordering::SeqCst, Ordering::SeqCst)
            .is_err()
        {
            return Err(BulkExportError::AlreadyRunning);
        }

        let guard = ActiveGuard(Arc::clone(&self.active));
        let state = Arc::new(SharedState::new());
        state.set_status(RunStatus::Running);

        let completion = Arc::new(Completion::new());
        let cancel = CancellationToken::new();
        let (tx, rx) = crossbeam_channel::unbounded();

        let worker = Worker {
            converter: Arc::clone(&self.converter),
            policy: self.policy,
            state: Arc::clone(&state),
        };
        let worker_cancel = cancel.clone();
        let worker_completion = Arc::clone(&completion);

        let spawned = std::thread::Builder::new()
            .name("bulkexport-worker".to_string())
            .spawn(move || {
                let sink = ChannelSink::new(tx);
                let outcome = worker.run_guarded(&request, &sink, &worker_cancel);
                // 回调里可以立即开始下一次运行
                drop(guard);
                worker_completion.resolve(outcome);
            });

        let thread = match spawned {
            Ok(thread) => thread,
            // 闭包连同 guard 一起被丢弃，运行占用随之释放
            Err(e) => {
                return Err(BulkExportError::Other(format!(
                    "Failed to spawn worker thread: {}",
                    e
                )));
            }
        };

        Ok(RunHandle {
            state,
            cancel,
            completion,
            events: rx,
            thread: Some(thread),
        })
    }

    /// 在当前线程中同步执行一次运行
    pub fn run_blocking(
        &self,
        request: &BatchRequest,
        sink: &dyn ProgressSink,
        cancel: &CancellationToken,
    ) -> Result<RunOutcome> {
        if self
            .active
            .compare_exchange(false, true, Ordering::SeqCst, Ordering::SeqCst)
            .is_err()
        {
            return Err(BulkExportError::AlreadyRunning);
        }
        let _guard = ActiveGuard(Arc::clone(&self.active));

        let worker = Worker {
            converter: Arc::clone(&self.converter),
            policy: self.policy,
            state: Arc::new(SharedState::new()),
        };
        Ok(worker.run_guarded(request, sink, cancel))
    }
}

/// 离开作用域时释放运行占用，panic 展开时同样生效
struct ActiveGuard(Arc<AtomicBool>);

impl Drop for ActiveGuard {
    fn drop(&mut self) {
        self.0.store(false, Ordering::SeqCst);
    }
}

/// 一次运行所需的全部状态，移动到后台线程
struct Worker {
    converter: Arc<dyn ConversionStep>,
    policy: FailurePolicy,
    state: Arc<SharedState>,
}

impl Worker {
    /// 与 `run` 相同，但进度接收方的 panic 也会变成 `Failed`
    fn run_guarded(
        &self,
        request: &BatchRequest,
        sink: &dyn ProgressSink,
        cancel: &CancellationToken,
    ) -> RunOutcome {
        panic::catch_unwind(AssertUnwindSafe(|| self.run(request, sink, cancel)))
            .unwrap_or_else(|payload| {
                let message = panic_message(payload.as_ref());
                log::error!("Run aborted by panic: {}", message);

                let total = self.state.snapshot().total;
                self.state.set_status(RunStatus::Failed);
                fail(
                    RunSummary {
                        total,
                        ..RunSummary::default()
                    },
                    None,
                    BulkExportError::Other(format!("Run aborted: {}", message)),
                )
            })
    }

    fn run(
        &self,
        request: &BatchRequest,
        sink: &dyn ProgressSink,
        cancel: &CancellationToken,
    ) -> RunOutcome {
        self.state.set_status(RunStatus::Running);

        let outcome = self.execute(request, sink, cancel);

        self.state.set_status(outcome.status());
        match &outcome {
            RunOutcome::Completed(summary) => log::info!(
                "Run completed: {}/{} converted, {} failed",
                summary.completed(),
                summary.total,
                summary.failures.len()
            ),
            RunOutcome::Cancelled(summary) => log::info!(
                "Run cancelled after {}/{} files",
                summary.completed(),
                summary.total
            ),
            RunOutcome::Failed { error, .. } => log::info!("Run failed: {}", error),
        }
        sink.on_event(RunEvent::Finished(outcome.status()));

        outcome
    }

    fn execute(
        &self,
        request: &BatchRequest,
        sink: &dyn ProgressSink,
        cancel: &CancellationToken,
    ) -> RunOutcome {
        let mut summary = RunSummary::default();

        if let Err(e) = request.validate() {
            return fail(summary, None, e);
        }

        let candidates = match FileCollector::new(&request.source_dir)
            .with_extensions(&request.extensions)
            .collect()
        {
            Ok(files) => files,
            Err(e) => return fail(summary, None, e),
        };

        summary.total = candidates.len();
        self.state.set_total(candidates.len());
        sink.on_event(RunEvent::Started {
            total: candidates.len(),
        });

        if candidates.is_empty() {
            log::info!(
                "No files matching '{}' in {}",
                request.extension_label(),
                request.source_dir.display()
            );
            return RunOutcome::Completed(summary);
        }

        log::info!(
            "Converting {} file(s) from {} into {}",
            candidates.len(),
            request.source_dir.display(),
            request.dest_dir.display()
        );

        for (index, source) in candidates.into_iter().enumerate() {
            if cancel.is_cancelled() {
                log::info!("Cancellation requested, stopping before {}", source.display());
                return RunOutcome::Cancelled(summary);
            }

            sink.on_event(RunEvent::FileStarted {
                index,
                path: source.clone(),
            });

            let converted = panic::catch_unwind(AssertUnwindSafe(|| {
                self.converter.convert(&source, &request.dest_dir)
            }))
            .unwrap_or_else(|payload| {
                Err(BulkExportError::Other(format!(
                    "Conversion step panicked: {}",
                    panic_message(payload.as_ref())
                )))
            });

            match converted {
                Ok(output) => {
                    log::debug!("{} -> {}", source.display(), output.display());
                    self.state.record_success();
                    summary.converted.push((source.clone(), output.clone()));
                    sink.on_event(RunEvent::FileConverted {
                        source,
                        output,
                        state: self.state.snapshot(),
                    });
                }
                Err(e) => match self.policy {
                    FailurePolicy::FailFast => return fail(summary, Some(source), e),
                    FailurePolicy::SkipAndContinue => {
                        log::info!("Skipping {}: {}", source.display(), e);
                        self.state.record_failure();
                        let reason = e.to_string();
                        summary.failures.push(FileFailure {
                            index,
                            path: source.clone(),
                            reason: reason.clone(),
                        });
                        sink.on_event(RunEvent::FileFailed {
                            source,
                            reason,
                            state: self.state.snapshot(),
                        });
                    }
                },
            }
        }

        RunOutcome::Completed(summary)
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(msg) = payload.downcast_ref::<&str>() {
        msg.to_string()
    } else if let Some(msg) = payload.downcast_ref::<String>() {
        msg.clone()
    } else {
        "unknown panic".to_string()
    }
}

fn fail(summary: RunSummary, file: Option<PathBuf>, error: BulkExportError) -> RunOutcome {
    RunOutcome::Failed {
        summary,
        file,
        error: Arc::new(error),
    }
}

/// 运行句柄
///
/// 丢弃句柄时会先请求停止并等待后台线程结束，正在写入的文件不会被中断。
pub struct RunHandle {
    state: Arc<SharedState>,
    cancel: CancellationToken,
    completion: Arc<Completion>,
    events: Receiver<RunEvent>,
    thread: Option<JoinHandle<()>>,
}

impl RunHandle {
    /// 当前进度快照
    pub fn progress(&self) -> RunState {
        self.state.snapshot()
    }

    /// 请求停止，在下一个文件边界生效
    pub fn cancel(&self) {
        if self.progress().status.is_stoppable() {
            log::info!("Stop requested");
        }
        self.cancel.cancel();
    }

    /// 取消令牌的副本，可交给信号处理函数
    pub fn cancellation_token(&self) -> CancellationToken {
        self.cancel.clone()
    }

    /// 运行事件，运行结束后 channel 关闭
    pub fn events(&self) -> &Receiver<RunEvent> {
        &self.events
    }

    /// 注册完成回调；已结束时立即调用
    pub fn on_complete<F>(&self, callback: F)
    where
        F: FnOnce(&RunOutcome) + Send + 'static,
    {
        self.completion.subscribe(Box::new(callback));
    }

    /// 运行是否已结束
    pub fn is_finished(&self) -> bool {
        self.completion.outcome().is_some()
    }

    /// 等待运行结束并返回结果
    pub fn wait(mut self) -> Arc<RunOutcome> {
        self.join();
        self.completion.outcome().unwrap_or_else(|| {
            Arc::new(RunOutcome::Failed {
                summary: RunSummary::default(),
                file: None,
                error: Arc::new(BulkExportError::Other(
                    "Worker thread terminated unexpectedly".to_string(),
                )),
            })
        })
    }

    fn join(&mut self) {
        if let Some(thread) = self.thread.take() {
            if thread.join().is_err() {
                log::error!("Worker thread panicked");
            }
        }
    }
}

impl Drop for RunHandle {
    fn drop(&mut self) {
        if self.thread.is_some() {
            self.cancel.cancel();
            self.join();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::converters::{output_path_for, ConversionOutcome};
    use std::fs;
    use std::path::Path;
    use std::sync::Mutex;

    /// 把源文件内容复制为 `<stem>.xlsx`，记录调用顺序
    fn copy_converter(calls: Arc<Mutex<Vec<String>>>) -> impl ConversionStep + 'static {
        move |source: &Path, dest: &Path| -> ConversionOutcome {
            let name = source.file_name().unwrap().to_string_lossy().to_string();
            calls.lock().unwrap().push(name);
            let output = output_path_for(source, dest, "xlsx");
            fs::copy(source, &output).map_err(|e| BulkExportError::FileWriteError {
                path: output.display().to_string(),
                source: e,
            })?;
            Ok(output)
        }
    }

    struct RecordingSink {
        events: Mutex<Vec<RunEvent>>,
    }

    impl RecordingSink {
        fn new() -> Self {
            Self {
                events: Mutex::new(Vec::new()),
            }
        }

        fn completed_counts(&self) -> Vec<usize> {
            self.events
                .lock()
                .unwrap()
                .iter()
                .filter_map(|e| match e {
                    RunEvent::FileConverted { state, .. } => Some(state.completed),
                    _ => None,
                })
                .collect()
        }
    }

    impl ProgressSink for RecordingSink {
        fn on_event(&self, event: RunEvent) {
            self.events.lock().unwrap().push(event);
        }
    }

    struct Fixture {
        src: tempfile::TempDir,
        dst: tempfile::TempDir,
    }

    impl Fixture {
        fn new(files: &[&str]) -> Self {
            let src = tempfile::tempdir().unwrap();
            let dst = tempfile::tempdir().unwrap();
            for name in files {
                fs::write(src.path().join(name), name.as_bytes()).unwrap();
            }
            Self { src, dst }
        }

        fn request(&self, extensions: &str) -> BatchRequest {
            BatchRequest::from_extension_list(self.src.path(), self.dst.path(), extensions)
        }

        /// 按枚举顺序列出候选文件名
        fn candidates(&self, extensions: &str) -> Vec<String> {
            FileCollector::new(self.src.path())
                .with_extension_list(extensions)
                .collect()
                .unwrap()
                .iter()
                .map(|p| p.file_name().unwrap().to_string_lossy().to_string())
                .collect()
        }

        fn outputs(&self) -> Vec<String> {
            let mut names: Vec<String> = fs::read_dir(self.dst.path())
                .unwrap()
                .map(|e| e.unwrap().file_name().to_string_lossy().to_string())
                .collect();
            names.sort();
            names
        }
    }

    #[test]
    fn test_end_to_end_conversion() {
        let fx = Fixture::new(&["report.xml", "notes.xls", "readme.txt"]);
        let calls = Arc::new(Mutex::new(Vec::new()));
        let runner = BatchRunner::new(copy_converter(Arc::clone(&calls)));
        let sink = RecordingSink::new();

        let outcome = runner
            .run_blocking(&fx.request(".xml, .xls"), &sink, &CancellationToken::new())
            .unwrap();

        assert_eq!(outcome.status(), RunStatus::Completed);
        assert_eq!(outcome.summary().total, 2);
        assert_eq!(outcome.summary().completed(), 2);
        assert_eq!(fx.outputs(), vec!["notes.xlsx", "report.xlsx"]);
        // 严格按照枚举顺序转换
        assert_eq!(*calls.lock().unwrap(), fx.candidates(".xml, .xls"));
        assert_eq!(sink.completed_counts(), vec![1, 2]);
        assert_eq!(runner.status(), RunStatus::Idle);
    }

    #[test]
    fn test_nothing_to_do() {
        let fx = Fixture::new(&["a.txt", "b.doc"]);
        let calls = Arc::new(Mutex::new(Vec::new()));
        let runner = BatchRunner::new(copy_converter(Arc::clone(&calls)));
        let sink = RecordingSink::new();

        let outcome = runner
            .run_blocking(&fx.request(".xml, .xls"), &sink, &CancellationToken::new())
            .unwrap();

        assert_eq!(outcome.status(), RunStatus::Completed);
        assert!(outcome.summary().nothing_to_do());
        assert_eq!(outcome.summary().completed(), 0);
        assert!(calls.lock().unwrap().is_empty());
        assert!(fx.outputs().is_empty());
    }

    #[test]
    fn test_validation_failure_touches_nothing() {
        let fx = Fixture::new(&["a.xls"]);
        let calls = Arc::new(Mutex::new(Vec::new()));
        let runner = BatchRunner::new(copy_converter(Arc::clone(&calls)));
        let request = BatchRequest::from_extension_list(
            fx.src.path(),
            fx.dst.path().join("missing"),
            ".xls",
        );

        let outcome = runner
            .run_blocking(&request, &RecordingSink::new(), &CancellationToken::new())
            .unwrap();

        match outcome {
            RunOutcome::Failed { file, error, .. } => {
                assert!(file.is_none());
                assert!(error.is_validation());
            }
            other => panic!("unexpected outcome: {other:?}"),
        }
        assert!(calls.lock().unwrap().is_empty());
    }

    #[test]
    fn test_empty_extension_list_fails_validation() {
        let fx = Fixture::new(&["a.xls"]);
        let runner = BatchRunner::new(copy_converter(Arc::new(Mutex::new(Vec::new()))));

        let outcome = runner
            .run_blocking(&fx.request(" , "), &RecordingSink::new(), &CancellationToken::new())
            .unwrap();

        match outcome {
            RunOutcome::Failed { error, .. } => {
                assert!(matches!(*error, BulkExportError::NoExtensions))
            }
            other => panic!("unexpected outcome: {other:?}"),
        }
    }

    #[test]
    fn test_fail_fast_stops_at_failing_file() {
        let fx = Fixture::new(&["a.xls", "b.xls", "c.xls", "d.xls"]);
        let order = fx.candidates(".xls");
        let failing = order[1].clone();

        let calls = Arc::new(Mutex::new(Vec::new()));
        let inner = copy_converter(Arc::clone(&calls));
        let bad = failing.clone();
        let converter = move |source: &Path, dest: &Path| -> ConversionOutcome {
            if source.file_name().unwrap().to_string_lossy() == bad {
                return Err(BulkExportError::ConversionError {
                    path: source.display().to_string(),
                    reason: "corrupt workbook".to_string(),
                });
            }
            inner.convert(source, dest)
        };
        let runner = BatchRunner::new(converter);

        let outcome = runner
            .run_blocking(&fx.request(".xls"), &RecordingSink::new(), &CancellationToken::new())
            .unwrap();

        match &outcome {
            RunOutcome::Failed {
                summary,
                file,
                error,
            } => {
                assert_eq!(summary.completed(), 1);
                assert_eq!(summary.total, 4);
                let file = file.as_ref().unwrap();
                assert_eq!(file.file_name().unwrap().to_string_lossy(), failing);
                assert!(error.to_string().contains("corrupt workbook"));
            }
            other => panic!("unexpected outcome: {other:?}"),
        }
        // 失败之后的文件从未被尝试
        assert_eq!(*calls.lock().unwrap(), vec![order[0].clone()]);
    }

    #[test]
    fn test_skip_and_continue_reports_all_failures() {
        let fx = Fixture::new(&["a.xls", "b.xls", "c.xls"]);
        let order = fx.candidates(".xls");
        let bad = order[0].clone();

        let calls = Arc::new(Mutex::new(Vec::new()));
        let inner = copy_converter(Arc::clone(&calls));
        let converter = move |source: &Path, dest: &Path| -> ConversionOutcome {
            if source.file_name().unwrap().to_string_lossy() == bad {
                return Err(BulkExportError::ConversionError {
                    path: source.display().to_string(),
                    reason: "locked".to_string(),
                });
            }
            inner.convert(source, dest)
        };
        let runner = BatchRunner::new(converter).with_policy(FailurePolicy::SkipAndContinue);
        let sink = RecordingSink::new();

        let outcome = runner
            .run_blocking(&fx.request(".xls"), &sink, &CancellationToken::new())
            .unwrap();

        assert_eq!(outcome.status(), RunStatus::Completed);
        let summary = outcome.summary();
        assert_eq!(summary.completed(), 2);
        assert_eq!(summary.failures.len(), 1);
        assert!(summary.failures[0].reason.contains("locked"));
        assert_eq!(summary.failures[0].index, 0);
        assert_eq!(calls.lock().unwrap().len(), 2);
        assert_eq!(sink.completed_counts(), vec![1, 2]);
    }

    #[cfg(unix)]
    #[test]
    fn test_unreadable_source_fails_after_validation() {
        use std::os::unix::fs::PermissionsExt;

        let fx = Fixture::new(&["a.xls"]);
        let calls = Arc::new(Mutex::new(Vec::new()));
        let runner = BatchRunner::new(copy_converter(Arc::clone(&calls)));

        // 目录本身存在，校验通过，但无法列出内容
        fs::set_permissions(fx.src.path(), fs::Permissions::from_mode(0o000)).unwrap();
        if fs::read_dir(fx.src.path()).is_ok() {
            // root 不受目录权限限制
            fs::set_permissions(fx.src.path(), fs::Permissions::from_mode(0o755)).unwrap();
            return;
        }

        let outcome = runner
            .run_blocking(&fx.request(".xls"), &RecordingSink::new(), &CancellationToken::new())
            .unwrap();
        fs::set_permissions(fx.src.path(), fs::Permissions::from_mode(0o755)).unwrap();

        match &outcome {
            RunOutcome::Failed {
                summary,
                file,
                error,
            } => {
                assert!(file.is_none());
                assert!(!error.is_validation());
                assert!(matches!(**error, BulkExportError::DirectoryReadError { .. }));
                assert_eq!(summary.completed(), 0);
            }
            other => panic!("unexpected outcome: {other:?}"),
        }
        assert!(calls.lock().unwrap().is_empty());
        assert!(fx.outputs().is_empty());
        assert_eq!(runner.status(), RunStatus::Idle);
    }

    /// 在指定文件上 panic，其余文件正常复制
    fn panicking_converter(
        calls: Arc<Mutex<Vec<String>>>,
        bad: String,
    ) -> impl ConversionStep + 'static {
        let inner = copy_converter(calls);
        move |source: &Path, dest: &Path| -> ConversionOutcome {
            if source.file_name().unwrap().to_string_lossy() == bad {
                panic!("workbook parser crashed");
            }
            inner.convert(source, dest)
        }
    }

    #[test]
    fn test_panicking_step_fails_run_and_releases_runner() {
        let fx = Fixture::new(&["a.xls", "b.xls", "c.xls"]);
        let order = fx.candidates(".xls");
        let calls = Arc::new(Mutex::new(Vec::new()));
        let runner = BatchRunner::new(panicking_converter(Arc::clone(&calls), order[1].clone()));

        let handle = runner.start(fx.request(".xls")).unwrap();
        let fired = Arc::new(Mutex::new(Vec::new()));
        let seen = Arc::clone(&fired);
        handle.on_complete(move |o| seen.lock().unwrap().push(o.status()));

        let outcome = handle.wait();
        match &*outcome {
            RunOutcome::Failed {
                summary,
                file,
                error,
            } => {
                assert_eq!(summary.completed(), 1);
                let file = file.as_ref().unwrap();
                assert_eq!(file.file_name().unwrap().to_string_lossy(), order[1]);
                assert!(error.to_string().contains("workbook parser crashed"));
            }
            other => panic!("unexpected outcome: {other:?}"),
        }
        assert_eq!(*fired.lock().unwrap(), vec![RunStatus::Failed]);
        assert_eq!(*calls.lock().unwrap(), vec![order[0].clone()]);

        // 运行器没有卡在 Running，可以再次启动
        assert_eq!(runner.status(), RunStatus::Idle);
        let again = runner.start(fx.request(".xls")).unwrap();
        assert_eq!(again.wait().status(), RunStatus::Failed);
    }

    #[test]
    fn test_panicking_step_is_skipped_when_continuing() {
        let fx = Fixture::new(&["a.xls", "b.xls", "c.xls"]);
        let order = fx.candidates(".xls");
        let calls = Arc::new(Mutex::new(Vec::new()));
        let runner = BatchRunner::new(panicking_converter(Arc::clone(&calls), order[0].clone()))
            .with_policy(FailurePolicy::SkipAndContinue);

        let outcome = runner
            .run_blocking(&fx.request(".xls"), &RecordingSink::new(), &CancellationToken::new())
            .unwrap();

        assert_eq!(outcome.status(), RunStatus::Completed);
        let summary = outcome.summary();
        assert_eq!(summary.completed(), 2);
        assert_eq!(summary.failures.len(), 1);
        assert!(summary.failures[0].reason.contains("panicked"));
        assert_eq!(runner.status(), RunStatus::Idle);
    }

    #[test]
    fn test_panicking_sink_still_resolves() {
        struct ExplodingSink;

        impl ProgressSink for ExplodingSink {
            fn on_event(&self, event: RunEvent) {
                if let RunEvent::FileConverted { .. } = event {
                    panic!("observer crashed");
                }
            }
        }

        let fx = Fixture::new(&["a.xls"]);
        let runner = BatchRunner::new(copy_converter(Arc::new(Mutex::new(Vec::new()))));

        let outcome = runner
            .run_blocking(&fx.request(".xls"), &ExplodingSink, &CancellationToken::new())
            .unwrap();

        match outcome {
            RunOutcome::Failed { file, error, .. } => {
                assert!(file.is_none());
                assert!(error.to_string().contains("observer crashed"));
            }
            other => panic!("unexpected outcome: {other:?}"),
        }
        assert_eq!(runner.status(), RunStatus::Idle);
    }

    #[test]
    fn test_cancel_before_start_converts_nothing() {
        let fx = Fixture::new(&["a.xls", "b.xls"]);
        let calls = Arc::new(Mutex::new(Vec::new()));
        let runner = BatchRunner::new(copy_converter(Arc::clone(&calls)));
        let cancel = CancellationToken::new();
        cancel.cancel();

        let outcome = runner
            .run_blocking(&fx.request(".xls"), &RecordingSink::new(), &cancel)
            .unwrap();

        assert_eq!(outcome.status(), RunStatus::Cancelled);
        assert_eq!(outcome.summary().total, 2);
        assert!(calls.lock().unwrap().is_empty());
    }

    #[test]
    fn test_cancel_during_file_stops_at_boundary() {
        let fx = Fixture::new(&["a.xls", "b.xls", "c.xls", "d.xls"]);
        let order = fx.candidates(".xls");
        let calls = Arc::new(Mutex::new(Vec::new()));
        let inner = copy_converter(Arc::clone(&calls));

        let cancel = CancellationToken::new();
        let token = cancel.clone();
        let trigger = order[1].clone();
        let converter = move |source: &Path, dest: &Path| -> ConversionOutcome {
            // 第 2 个文件转换过程中请求停止
            if source.file_name().unwrap().to_string_lossy() == trigger {
                token.cancel();
            }
            inner.convert(source, dest)
        };
        let runner = BatchRunner::new(converter);

        let outcome = runner
            .run_blocking(&fx.request(".xls"), &RecordingSink::new(), &cancel)
            .unwrap();

        assert_eq!(outcome.status(), RunStatus::Cancelled);
        assert_eq!(outcome.summary().completed(), 2);
        assert_eq!(*calls.lock().unwrap(), order[..2].to_vec());
        assert_eq!(fx.outputs().len(), 2);
    }

    #[test]
    fn test_rerun_overwrites_same_output() {
        let fx = Fixture::new(&["book.xls"]);
        let runner = BatchRunner::new(copy_converter(Arc::new(Mutex::new(Vec::new()))));

        let first = runner
            .run_blocking(&fx.request(".xls"), &RecordingSink::new(), &CancellationToken::new())
            .unwrap();
        fs::write(fx.src.path().join("book.xls"), b"changed").unwrap();
        let second = runner
            .run_blocking(&fx.request(".xls"), &RecordingSink::new(), &CancellationToken::new())
            .unwrap();

        assert_eq!(first.summary().converted, second.summary().converted);
        assert_eq!(fx.outputs(), vec!["book.xlsx"]);
        let content = fs::read(fx.dst.path().join("book.xlsx")).unwrap();
        assert_eq!(content, b"changed");
    }

    #[test]
    fn test_background_run_reports_progress_and_completion() {
        let fx = Fixture::new(&["report.xml", "notes.xls", "readme.txt"]);
        let runner = BatchRunner::new(copy_converter(Arc::new(Mutex::new(Vec::new()))));

        let handle = runner.start(fx.request(".xml, .xls")).unwrap();

        let callback_hits = Arc::new(Mutex::new(Vec::new()));
        let hits = Arc::clone(&callback_hits);
        handle.on_complete(move |outcome| hits.lock().unwrap().push(outcome.status()));

        let events: Vec<RunEvent> = handle.events().iter().collect();
        let outcome = handle.wait();

        assert_eq!(outcome.status(), RunStatus::Completed);
        assert_eq!(outcome.summary().completed(), 2);
        assert_eq!(*callback_hits.lock().unwrap(), vec![RunStatus::Completed]);

        assert!(matches!(events.first(), Some(RunEvent::Started { total: 2 })));
        assert!(matches!(
            events.last(),
            Some(RunEvent::Finished(RunStatus::Completed))
        ));

        let mut last = 0;
        for event in &events {
            if let RunEvent::FileConverted { state, .. } = event {
                assert!(state.completed >= last);
                assert!(state.completed <= state.total);
                last = state.completed;
            }
        }
        assert_eq!(last, 2);
        assert_eq!(runner.status(), RunStatus::Idle);
    }

    #[test]
    fn test_start_rejected_while_running() {
        let fx = Fixture::new(&["a.xls", "b.xls"]);
        let (release_tx, release_rx) = crossbeam_channel::unbounded::<()>();
        let (entered_tx, entered_rx) = crossbeam_channel::unbounded::<()>();

        let converter = move |source: &Path, dest: &Path| -> ConversionOutcome {
            let _ = entered_tx.send(());
            let _ = release_rx.recv();
            Ok(output_path_for(source, dest, "xlsx"))
        };
        let runner = BatchRunner::new(converter);

        let handle = runner.start(fx.request(".xls")).unwrap();
        entered_rx.recv().unwrap();

        assert_eq!(runner.status(), RunStatus::Running);
        assert!(handle.progress().is_running());
        assert!(matches!(
            runner.start(fx.request(".xls")),
            Err(BulkExportError::AlreadyRunning)
        ));

        // 停止请求不会打断正在进行的转换
        handle.cancel();
        release_tx.send(()).unwrap();
        drop(release_tx);

        let outcome = handle.wait();
        assert_eq!(outcome.status(), RunStatus::Cancelled);
        assert_eq!(outcome.summary().completed(), 1);

        // 上一次运行结束后可以开始新的运行
        let handle = runner.start(fx.request(".xls")).unwrap();
        assert_eq!(handle.wait().status(), RunStatus::Completed);
    }

    #[test]
    fn test_dropping_handle_cancels_and_waits() {
        let fx = Fixture::new(&["a.xls", "b.xls", "c.xls"]);
        let (entered_tx, entered_rx) = crossbeam_channel::unbounded::<()>();
        let (release_tx, release_rx) = crossbeam_channel::unbounded::<()>();
        let calls = Arc::new(Mutex::new(Vec::new()));
        let inner = copy_converter(Arc::clone(&calls));

        let converter = move |source: &Path, dest: &Path| -> ConversionOutcome {
            let _ = entered_tx.send(());
            let _ = release_rx.recv();
            inner.convert(source, dest)
        };
        let runner = BatchRunner::new(converter);

        let handle = runner.start(fx.request(".xls")).unwrap();
        let outcomes = Arc::new(Mutex::new(Vec::new()));
        let seen = Arc::clone(&outcomes);
        handle.on_complete(move |o| seen.lock().unwrap().push(o.status()));

        // 放行第一个文件的转换，前提是 drop 已经请求了停止
        let token = handle.cancellation_token();
        let releaser = std::thread::spawn(move || {
            while !token.is_cancelled() {
                std::thread::sleep(std::time::Duration::from_millis(1));
            }
            let _ = release_tx.send(());
        });

        entered_rx.recv().unwrap();
        drop(handle);
        releaser.join().unwrap();

        // drop 返回时后台线程已结束
        assert_eq!(runner.status(), RunStatus::Idle);
        assert_eq!(*outcomes.lock().unwrap(), vec![RunStatus::Cancelled]);
        // 正在进行的文件完整写出
        assert_eq!(calls.lock().unwrap().len(), 1);
        assert_eq!(fx.outputs().len(), 1);
    }

    #[test]
    fn test_progress_snapshot_after_finish() {
        let fx = Fixture::new(&["a.xls"]);
        let runner = BatchRunner::new(copy_converter(Arc::new(Mutex::new(Vec::new()))));
        let handle = runner.start(fx.request(".xls")).unwrap();

        for _ in handle.events().iter() {}
        // channel 关闭后状态已是终态
        while !handle.is_finished() {
            std::thread::yield_now();
        }
        let state = handle.progress();
        assert_eq!(state.status, RunStatus::Completed);
        assert_eq!((state.completed, state.total), (1, 1));
        assert!(!state.is_running());
    }
}
