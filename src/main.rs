//! # bulkexport 命令行入口
//!
//! ## 子命令
//! - `export` - 把目录中匹配扩展名的文件批量转换为 xlsx/ods/csv
//! - `list`   - 预览候选文件和输出路径
//!
//! ## 依赖关系
//! ```text
//! main.rs
//!   ├── cli/        (命令行参数定义)
//!   ├── commands/   (命令执行逻辑)
//!   └── bulkexport  (库：batch, converters, models, utils, error)
//! ```

mod cli;
mod commands;

use bulkexport::utils::{logging, output};
use clap::Parser;
use cli::Cli;

fn main() {
    // Initialize colored output for Windows compatibility
    #[cfg(windows)]
    colored::control::set_virtual_terminal(true).ok();

    let cli = Cli::parse();
    logging::initialize(cli.verbose, cli.log_file.as_deref());

    if let Err(e) = commands::run(cli.command) {
        output::print_error(&format!("{}", e));
        std::process::exit(1);
    }
}
