//! # 命令执行模块
//!
//! 实现各子命令的业务逻辑。
//!
//! ## 依赖关系
//! - 被 `main.rs` 调用
//! - 使用 `cli/` 和 `bulkexport` 库
//! - 子模块: export, list

pub mod export;
pub mod list;

use crate::cli::Commands;
use bulkexport::error::Result;

/// 执行命令
pub fn run(cmd: Commands) -> Result<()> {
    match cmd {
        Commands::Export(args) => export::execute(args),
        Commands::List(args) => list::execute(args),
    }
}
