//! # 批量转换请求
//!
//! 用户选定的源目录、目标目录与扩展名列表。
//!
//! ## 依赖关系
//! - 被 `batch/runner.rs` 校验和消费
//! - 被 `commands/` 由命令行参数构造

use crate::error::{BulkExportError, Result};
use std::fs;
use std::path::{Path, PathBuf};

/// 默认扩展名列表
pub const DEFAULT_EXTENSIONS: &str = ".xml, .xls";

/// 一次批量转换的输入参数
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BatchRequest {
    /// 源目录（只读取其直接子文件）
    pub source_dir: PathBuf,
    /// 目标目录
    pub dest_dir: PathBuf,
    /// 已去空白、转小写的扩展名后缀，保持输入顺序
    pub extensions: Vec<String>,
}

impl BatchRequest {
    /// 创建请求，扩展名会被规范化
    pub fn new<I, S>(source_dir: impl Into<PathBuf>, dest_dir: impl Into<PathBuf>, extensions: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        Self {
            source_dir: source_dir.into(),
            dest_dir: dest_dir.into(),
            extensions: normalize_extensions(extensions),
        }
    }

    /// 从逗号分隔的扩展名字符串创建请求（如 `.xml, .xls`）
    pub fn from_extension_list(
        source_dir: impl Into<PathBuf>,
        dest_dir: impl Into<PathBuf>,
        extensions: &str,
    ) -> Self {
        Self::new(source_dir, dest_dir, extensions.split(','))
    }

    /// 检查运行前置条件
    ///
    /// 源目录必须存在且是目录，目标目录必须存在、是目录且可写，
    /// 扩展名列表不能为空。
    pub fn validate(&self) -> Result<()> {
        check_directory(&self.source_dir)?;
        check_directory(&self.dest_dir)?;

        let readonly = fs::metadata(&self.dest_dir)
            .map(|m| m.permissions().readonly())
            .unwrap_or(false);
        if readonly {
            return Err(BulkExportError::DestinationReadOnly {
                path: self.dest_dir.display().to_string(),
            });
        }

        if self.extensions.is_empty() {
            return Err(BulkExportError::NoExtensions);
        }

        Ok(())
    }

    /// 以逗号拼接的扩展名，用于提示信息
    pub fn extension_label(&self) -> String {
        self.extensions.join(", ")
    }
}

/// 去除空白、转小写并丢弃空项
pub fn normalize_extensions<I, S>(extensions: I) -> Vec<String>
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    extensions
        .into_iter()
        .map(|s| s.as_ref().trim().to_lowercase())
        .filter(|s| !s.is_empty())
        .collect()
}

fn check_directory(path: &Path) -> Result<()> {
    if !path.exists() {
        return Err(BulkExportError::DirectoryNotFound {
            path: path.display().to_string(),
        });
    }
    if !path.is_dir() {
        return Err(BulkExportError::NotADirectory {
            path: path.display().to_string(),
        });
    }
    Ok(())
}
