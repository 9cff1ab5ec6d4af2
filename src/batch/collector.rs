//! # 文件收集器
//!
//! 列出源目录下的文件并按扩展名后缀过滤。
//!
//! ## 功能
//! - 只读取目录的直接子文件（不递归）
//! - 小写完整路径以任一扩展名结尾即匹配
//! - 保持文件系统原生的枚举顺序，不重新排序
//!
//! ## 依赖关系
//! - 被 `batch/runner.rs` 和 `commands/list.rs` 调用
//! - 使用 `walkdir` 遍历目录

use crate::error::{BulkExportError, Result};
use crate::models::request::normalize_extensions;

use std::path::{Path, PathBuf};
use walkdir::WalkDir;

/// 文件收集器
pub struct FileCollector {
    /// 输入目录
    input: PathBuf,
    /// 已规范化的扩展名后缀
    extensions: Vec<String>,
}

impl FileCollector {
    /// 创建新的文件收集器
    pub fn new(input: impl Into<PathBuf>) -> Self {
        Self {
            input: input.into(),
            extensions: Vec::new(),
        }
    }

    /// 设置扩展名（逗号分隔的多后缀）
    pub fn with_extension_list(self, extensions: &str) -> Self {
        self.with_extensions(extensions.split(','))
    }

    /// 设置扩展名
    pub fn with_extensions<I, S>(mut self, extensions: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        self.extensions = normalize_extensions(extensions);
        self
    }

    /// 收集所有匹配的文件
    ///
    /// 结果一次性物化，调用方需要先知道总数。
    pub fn collect(&self) -> Result<Vec<PathBuf>> {
        let walker = WalkDir::new(&self.input).min_depth(1).max_depth(1);

        let mut files = Vec::new();
        for entry in walker {
            let entry = entry.map_err(|e| BulkExportError::DirectoryReadError {
                path: self.input.display().to_string(),
                source: e.into(),
            })?;

            // 跟随符号链接判断是否为普通文件
            if entry.path().is_file() && self.matches_extensions(entry.path()) {
                files.push(entry.into_path());
            }
        }

        Ok(files)
    }

    /// 检查文件是否匹配任一扩展名
    fn matches_extensions(&self, path: &Path) -> bool {
        let lowered = path.to_string_lossy().to_lowercase();
        self.extensions.iter().any(|ext| lowered.ends_with(ext.as_str()))
    }
}
