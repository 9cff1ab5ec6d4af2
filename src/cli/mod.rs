//! # CLI 模块
//!
//! 使用 `clap` 定义命令行参数和子命令。
//!
//! ## 命令结构
//! - `export`: 批量转换
//! - `list`: 只列出候选文件及其输出路径，不做转换
//!
//! ## 依赖关系
//! - 被 `main.rs` 使用
//! - 子模块: export, list

pub mod export;
pub mod list;

use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// bulkexport - 表格文件批量转换
#[derive(Parser)]
#[command(name = "bulkexport")]
#[command(author)]
#[command(version)]
#[command(about = "Batch-convert spreadsheet files into a normalized format", long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Increase log verbosity (-v info, -vv debug, -vvv trace)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Also write the log to this file
    #[arg(long, global = true, env = "BULKEXPORT_LOG_FILE")]
    pub log_file: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Commands,
}

/// 可用的子命令
#[derive(Subcommand)]
pub enum Commands {
    /// Convert every matching file in a folder into the target format
    Export(export::ExportArgs),

    /// Show which files an export would convert, without converting
    List(list::ListArgs),
}
