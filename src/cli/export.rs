//! # export 子命令 CLI 定义
//!
//! 批量转换目录中的表格文件 (.xml/.xls -> .xlsx/.ods/.csv)
//!
//! ## 依赖关系
//! - 被 `cli/mod.rs` 使用
//! - 参数传递给 `commands/export.rs`

use bulkexport::models::DEFAULT_EXTENSIONS;
use bulkexport::TargetFormat;
use clap::Args;
use std::path::PathBuf;

/// export 子命令参数
#[derive(Args, Debug)]
pub struct ExportArgs {
    /// Folder containing the files to convert (not searched recursively)
    #[arg(short, long)]
    pub input: PathBuf,

    /// Existing folder to write converted files into
    #[arg(short, long)]
    pub output: PathBuf,

    /// Comma-separated file suffixes to convert (case-insensitive)
    #[arg(short, long, default_value = DEFAULT_EXTENSIONS)]
    pub extensions: String,

    /// Target output format
    #[arg(short, long, value_enum, default_value_t = TargetFormat::Xlsx)]
    pub target: TargetFormat,

    /// Office suite executable used for conversion
    #[arg(long, env = "BULKEXPORT_SOFFICE", default_value = bulkexport::converters::office::DEFAULT_PROGRAM)]
    pub soffice: PathBuf,

    /// Skip files that fail to convert instead of stopping the run
    #[arg(long, default_value_t = false)]
    pub keep_going: bool,

    /// Write a per-file CSV report to this path
    #[arg(long)]
    pub report: Option<PathBuf>,
}
