//! # 运行报告导出
//!
//! 把每个文件的处理结果写成 CSV。
//!
//! ## 依赖关系
//! - 被 `commands/export.rs` 使用
//! - 使用 `csv` + `serde` 序列化

use crate::error::{BulkExportError, Result};
use crate::models::RunOutcome;

use serde::Serialize;
use std::path::Path;

/// 报告中的一行
#[derive(Debug, Serialize, PartialEq, Eq)]
pub struct ReportRecord {
    pub source: String,
    pub output: String,
    pub status: &'static str,
    pub error: String,
}

/// 按处理顺序生成报告行
///
/// 处理是严格串行的，每个已处理文件要么转换成功要么失败，
/// 因此按失败记录的序号把两组结果归并回原顺序。
pub fn build_records(outcome: &RunOutcome) -> Vec<ReportRecord> {
    let summary = outcome.summary();
    let mut converted = summary.converted.iter();
    let mut failures = summary.failures.iter().peekable();
    let processed = summary.converted.len() + summary.failures.len();

    let mut records = Vec::with_capacity(processed + 1);
    for position in 0..processed {
        match failures.next_if(|f| f.index == position) {
            Some(failure) => records.push(ReportRecord {
                source: failure.path.display().to_string(),
                output: String::new(),
                status: "failed",
                error: failure.reason.clone(),
            }),
            None => {
                if let Some((source, output)) = converted.next() {
                    records.push(ReportRecord {
                        source: source.display().to_string(),
                        output: output.display().to_string(),
                        status: "converted",
                        error: String::new(),
                    });
                }
            }
        }
    }

    // 导致终止的文件总是最后处理的那个
    if let RunOutcome::Failed {
        file: Some(file),
        error,
        ..
    } = outcome
    {
        records.push(ReportRecord {
            source: file.display().to_string(),
            output: String::new(),
            status: "failed",
            error: error.to_string(),
        });
    }

    records
}

/// 写出 CSV 报告
pub fn write_report(outcome: &RunOutcome, output_path: &Path) -> Result<usize> {
    let records = build_records(outcome);
    let mut wtr = csv::Writer::from_path(output_path)?;

    for record in &records {
        wtr.serialize(record)?;
    }

    wtr.flush().map_err(|e| BulkExportError::FileWriteError {
        path: output_path.display().to_string(),
        source: e,
    })?;

    Ok(records.len())
}
