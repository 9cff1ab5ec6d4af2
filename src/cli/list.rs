//! # list 子命令 CLI 定义
//!
//! 预览将被转换的文件
//!
//! ## 依赖关系
//! - 被 `cli/mod.rs` 使用
//! - 参数传递给 `commands/list.rs`

use bulkexport::models::DEFAULT_EXTENSIONS;
use bulkexport::TargetFormat;
use clap::Args;
use std::path::PathBuf;

/// list 子命令参数
#[derive(Args, Debug)]
pub struct ListArgs {
    /// Folder to scan
    #[arg(short, long)]
    pub input: PathBuf,

    /// Folder the outputs would be written to (defaults to the input folder)
    #[arg(short, long)]
    pub output: Option<PathBuf>,

    /// Comma-separated file suffixes to match (case-insensitive)
    #[arg(short, long, default_value = DEFAULT_EXTENSIONS)]
    pub extensions: String,

    /// Target output format
    #[arg(short, long, value_enum, default_value_t = TargetFormat::Xlsx)]
    pub target: TargetFormat,
}
