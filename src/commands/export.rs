//! # export 命令实现
//!
//! 批量转换表格文件。
//!
//! ## 功能
//! - 运行前检查源目录和目标目录
//! - 后台线程逐个转换，前台显示进度条
//! - Ctrl-C 请求停止，等待当前文件写完再退出
//! - 可选导出 CSV 报告
//!
//! ## 依赖关系
//! - 使用 `cli/export.rs` 定义的参数
//! - 使用 `bulkexport::batch`, `bulkexport::converters`
//! - 使用 `utils/output.rs`, `utils/progress.rs`, `utils/report.rs`

use crate::cli::export::ExportArgs;
use bulkexport::batch::{BatchRunner, FailurePolicy, RunEvent, RunHandle};
use bulkexport::converters::OfficeConverter;
use bulkexport::error::{BulkExportError, Result};
use bulkexport::models::{BatchRequest, RunOutcome};
use bulkexport::utils::{output, progress, report};

use std::path::{Path, PathBuf};

/// 执行 export 命令
pub fn execute(args: ExportArgs) -> Result<()> {
    output::print_header(&format!("Exporting spreadsheets to {} format", args.target));

    // 验证输入输出目录
    check_folder(&args.input)?;
    check_folder(&args.output)?;

    let request = BatchRequest::from_extension_list(&args.input, &args.output, &args.extensions);

    let converter = OfficeConverter::new(args.target).with_program(&args.soffice);
    let policy = if args.keep_going {
        FailurePolicy::SkipAndContinue
    } else {
        FailurePolicy::FailFast
    };
    let runner = BatchRunner::new(converter).with_policy(policy);

    let handle = runner.start(request)?;
    install_stop_handler(&handle);

    watch_progress(&handle);
    let outcome = handle.wait();

    if let Some(report_path) = &args.report {
        let rows = report::write_report(&outcome, report_path)?;
        output::print_info(&format!(
            "Wrote {} row(s) to report '{}'",
            rows,
            report_path.display()
        ));
    }

    summarize(&args, &outcome)
}

/// 调用方检查：目录必须已存在
fn check_folder(path: &Path) -> Result<()> {
    if !path.is_dir() {
        output::print_warning("The folder you chose doesn't exist");
        return Err(BulkExportError::DirectoryNotFound {
            path: path.display().to_string(),
        });
    }
    Ok(())
}

/// Ctrl-C 只请求停止，主线程随后等待运行结束
fn install_stop_handler(handle: &RunHandle) {
    let token = handle.cancellation_token();
    let installed = ctrlc::set_handler(move || {
        if !token.is_cancelled() {
            output::print_warning("Stop requested, finishing the current file...");
        }
        token.cancel();
    });

    if let Err(e) = installed {
        log::warn!("Could not install Ctrl-C handler: {}", e);
    }
}

/// 消费事件直到后台线程关闭 channel
fn watch_progress(handle: &RunHandle) {
    let pb = progress::create_progress_bar(0, "Scanning");

    for event in handle.events().iter() {
        match event {
            RunEvent::Started { total } => {
                pb.set_length(total as u64);
                pb.set_message("Converting");
            }
            RunEvent::FileStarted { path, .. } => {
                pb.set_message(progress::file_message(&path));
            }
            RunEvent::FileConverted { state, .. } => {
                pb.set_position(state.processed() as u64);
            }
            RunEvent::FileFailed {
                source,
                reason,
                state,
            } => {
                pb.suspend(|| output::print_file_failure(&source, &reason));
                pb.set_position(state.processed() as u64);
            }
            RunEvent::Finished(_) => pb.finish_and_clear(),
        }
    }

    if !pb.is_finished() {
        pb.finish_and_clear();
    }

    let state = handle.progress();
    if state.is_cancelled() {
        log::info!(
            "Stopped at a file boundary: {} of {} processed",
            state.processed(),
            state.total
        );
    }
}

/// 根据最终结果输出提示并决定退出状态
fn summarize(args: &ExportArgs, outcome: &RunOutcome) -> Result<()> {
    match outcome {
        RunOutcome::Completed(summary) if summary.nothing_to_do() => {
            output::print_warning(&format!(
                "There are no {} files in '{}'",
                args.extensions.trim(),
                args.input.display()
            ));
            Ok(())
        }
        RunOutcome::Completed(summary) => {
            output::print_done(&format!(
                "Converted {} of {} file(s) to '{}' in '{}'",
                summary.completed(),
                summary.total,
                args.target,
                args.output.display()
            ));

            if summary.failures.is_empty() {
                return Ok(());
            }

            output::print_separator();
            for failure in &summary.failures {
                output::print_file_failure(&failure.path, &failure.reason);
            }
            Err(BulkExportError::Other(format!(
                "{} of {} file(s) failed to convert",
                summary.failures.len(),
                summary.total
            )))
        }
        RunOutcome::Cancelled(summary) => {
            output::print_stopped(&format!(
                "Stopped after converting {} of {} file(s)",
                summary.completed(),
                summary.total
            ));
            Ok(())
        }
        RunOutcome::Failed {
            summary,
            file,
            error,
        } => {
            if summary.total > 0 {
                output::print_info(&format!(
                    "{} of {} file(s) were converted before the failure",
                    summary.completed(),
                    summary.total
                ));
            }
            Err(BulkExportError::Other(failure_message(file.as_ref(), error)))
        }
    }
}

/// 失败文件存在时确保消息里带上文件路径
fn failure_message(file: Option<&PathBuf>, error: &BulkExportError) -> String {
    match (file, error) {
        (Some(_), BulkExportError::ConversionError { .. }) | (None, _) => error.to_string(),
        (Some(path), other) => format!("Conversion failed for file {}: {}", path.display(), other),
    }
}
