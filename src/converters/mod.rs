//! # 转换器模块
//!
//! 定义单文件转换能力 `ConversionStep` 及目标格式。
//!
//! ## 功能
//! - 根据源文件名推导输出路径
//! - 可替换的转换实现（外部办公套件、闭包）
//!
//! ## 依赖关系
//! - 被 `batch/runner.rs` 通过 trait 调用
//! - 子模块: office

pub mod office;

pub use office::OfficeConverter;

use crate::error::Result;
use clap::ValueEnum;
use std::path::{Path, PathBuf};

/// 单个文件的转换结果：成功时为输出路径
pub type ConversionOutcome = Result<PathBuf>;

/// 把一个源文件转换为目标格式，写入目标目录
///
/// 实现只能创建或覆盖目标目录中的一个文件。运行器同一时刻只会调用一次，
/// 但实现需要能被移动到后台线程。
pub trait ConversionStep: Send + Sync {
    fn convert(&self, source: &Path, dest_dir: &Path) -> ConversionOutcome;
}

impl<F> ConversionStep for F
where
    F: Fn(&Path, &Path) -> ConversionOutcome + Send + Sync,
{
    fn convert(&self, source: &Path, dest_dir: &Path) -> ConversionOutcome {
        self(source, dest_dir)
    }
}

/// 支持的目标格式
#[derive(Debug, Clone, Copy, ValueEnum, PartialEq, Eq, Default)]
pub enum TargetFormat {
    /// Office Open XML workbook
    #[default]
    Xlsx,
    /// OpenDocument spreadsheet
    Ods,
    /// Comma-separated values (first sheet only)
    Csv,
}

impl TargetFormat {
    /// 输出文件扩展名（不含点）
    pub fn extension(self) -> &'static str {
        match self {
            TargetFormat::Xlsx => "xlsx",
            TargetFormat::Ods => "ods",
            TargetFormat::Csv => "csv",
        }
    }

    /// 传给 `--convert-to` 的过滤器
    pub fn office_filter(self) -> &'static str {
        match self {
            TargetFormat::Xlsx => "xlsx:Calc MS Excel 2007 XML",
            TargetFormat::Ods => "ods",
            TargetFormat::Csv => "csv",
        }
    }
}

impl std::fmt::Display for TargetFormat {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.extension())
    }
}

/// `<dest_dir>/<源文件名去掉最后一个扩展名>.<extension>`
pub fn output_path_for(source: &Path, dest_dir: &Path, extension: &str) -> PathBuf {
    let stem = source
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_else(|| "workbook".to_string());
    dest_dir.join(format!("{}.{}", stem, extension))
}
