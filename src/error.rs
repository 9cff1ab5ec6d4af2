//! # 统一错误处理模块
//!
//! 定义 bulkexport 的所有错误类型，使用 `thiserror` 派生。
//!
//! ## 错误分类
//! - 校验错误：请求前置条件不满足，任何文件都不会被处理
//! - 枚举错误：源目录无法读取，运行在处理前中止
//! - 转换错误：单个文件转换失败，默认策略下终止整个运行
//!
//! ## 依赖关系
//! - 被所有其他模块使用
//! - 无外部模块依赖

use thiserror::Error;

/// bulkexport 统一错误类型
#[derive(Error, Debug)]
pub enum BulkExportError {
    // ─────────────────────────────────────────────────────────────
    // 校验错误
    // ─────────────────────────────────────────────────────────────
    #[error("Directory does not exist: {path}")]
    DirectoryNotFound { path: String },

    #[error("Not a directory: {path}")]
    NotADirectory { path: String },

    #[error("Destination directory is read-only: {path}")]
    DestinationReadOnly { path: String },

    #[error("No file extensions given (expected e.g. '.xml, .xls')")]
    NoExtensions,

    #[error("A batch run is already in progress")]
    AlreadyRunning,

    // ─────────────────────────────────────────────────────────────
    // I/O 错误
    // ─────────────────────────────────────────────────────────────
    #[error("Failed to read directory: {path}")]
    DirectoryReadError {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to write file: {path}")]
    FileWriteError {
        path: String,
        #[source]
        source: std::io::Error,
    },

    // ─────────────────────────────────────────────────────────────
    // 转换错误
    // ─────────────────────────────────────────────────────────────
    #[error("Conversion failed for file {path}: {reason}")]
    ConversionError { path: String, reason: String },

    // ─────────────────────────────────────────────────────────────
    // 外部命令错误
    // ─────────────────────────────────────────────────────────────
    #[error("External command '{command}' not found in PATH")]
    CommandNotFound { command: String },

    #[error("External command failed: {command}\n{stderr}")]
    CommandFailed { command: String, stderr: String },

    // ─────────────────────────────────────────────────────────────
    // CSV 错误
    // ─────────────────────────────────────────────────────────────
    #[error("CSV error: {0}")]
    CsvError(#[from] csv::Error),

    // ─────────────────────────────────────────────────────────────
    // 其他
    // ─────────────────────────────────────────────────────────────
    #[error("{0}")]
    Other(String),
}

impl BulkExportError {
    /// 是否为运行开始前的校验错误
    pub fn is_validation(&self) -> bool {
        matches!(
            self,
            BulkExportError::DirectoryNotFound { .. }
                | BulkExportError::NotADirectory { .. }
                | BulkExportError::DestinationReadOnly { .. }
                | BulkExportError::NoExtensions
        )
    }
}

/// Result 类型别名
pub type Result<T> = std::result::Result<T, BulkExportError>;
