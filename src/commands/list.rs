//! # list 命令实现
//!
//! 按处理顺序列出候选文件及对应的输出路径，不执行转换。
//!
//! ## 依赖关系
//! - 使用 `cli/list.rs` 定义的参数
//! - 使用 `bulkexport::batch::FileCollector`
//! - 使用 `tabled` 输出表格

use crate::cli::list::ListArgs;
use bulkexport::batch::FileCollector;
use bulkexport::converters::output_path_for;
use bulkexport::error::{BulkExportError, Result};
use bulkexport::models::request::normalize_extensions;
use bulkexport::utils::output;

use std::path::{Path, PathBuf};
use tabled::{Table, Tabled};

/// 候选文件表格行
#[derive(Debug, Clone, Tabled)]
struct CandidateRow {
    #[tabled(rename = "#")]
    index: usize,
    #[tabled(rename = "Source")]
    source: String,
    #[tabled(rename = "Output")]
    output: String,
}

/// 执行 list 命令
pub fn execute(args: ListArgs) -> Result<()> {
    output::print_header("Conversion candidates");

    if !args.input.is_dir() {
        return Err(BulkExportError::DirectoryNotFound {
            path: args.input.display().to_string(),
        });
    }

    if normalize_extensions(args.extensions.split(',')).is_empty() {
        return Err(BulkExportError::NoExtensions);
    }

    let files = FileCollector::new(&args.input)
        .with_extension_list(&args.extensions)
        .collect()?;

    if files.is_empty() {
        output::print_warning(&format!(
            "There are no {} files in '{}'",
            args.extensions.trim(),
            args.input.display()
        ));
        return Ok(());
    }

    let dest_dir = args.output.as_deref().unwrap_or(args.input.as_path());
    let rows = build_rows(&files, dest_dir, args.target.extension());

    println!("{}", Table::new(&rows));
    output::print_info(&format!("{} file(s) would be converted", rows.len()));

    Ok(())
}

fn build_rows(files: &[PathBuf], dest_dir: &Path, extension: &str) -> Vec<CandidateRow> {
    files
        .iter()
        .enumerate()
        .map(|(i, file)| CandidateRow {
            index: i + 1,
            source: file
                .file_name()
                .map(|n| n.to_string_lossy().into_owned())
                .unwrap_or_default(),
            output: output_path_for(file, dest_dir, extension)
                .display()
                .to_string(),
        })
        .collect()
}
