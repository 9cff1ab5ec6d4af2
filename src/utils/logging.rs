//! # 日志初始化
//!
//! 基于 `simplelog` 初始化全局 `log` 后端。
//!
//! ## 功能
//! - 终端日志输出到 stderr，级别由 `-v` 次数决定
//! - 可选同时写入日志文件
//!
//! ## 依赖关系
//! - 被 `main.rs` 调用一次

use log::LevelFilter;
use simplelog::{
    ColorChoice, CombinedLogger, Config, ConfigBuilder, SharedLogger, TermLogger, TerminalMode,
    WriteLogger,
};
use std::fs::File;
use std::path::Path;

/// `-v` 次数到日志级别
pub fn level_from_verbosity(verbose: u8) -> LevelFilter {
    match verbose {
        0 => LevelFilter::Warn,
        1 => LevelFilter::Info,
        2 => LevelFilter::Debug,
        _ => LevelFilter::Trace,
    }
}

/// 初始化日志；重复初始化时静默忽略
pub fn initialize(verbose: u8, log_file: Option<&Path>) {
    let level = level_from_verbosity(verbose);
    let config = build_config();

    let mut loggers: Vec<Box<dyn SharedLogger>> = vec![TermLogger::new(
        level,
        config.clone(),
        TerminalMode::Stderr,
        ColorChoice::Auto,
    )];

    if let Some(path) = log_file {
        match File::create(path) {
            // 文件日志至少记录到 debug
            Ok(file) => loggers.push(WriteLogger::new(level.max(LevelFilter::Debug), config, file)),
            Err(err) => eprintln!(
                "Warning: Could not create log file at {}: {}",
                path.display(),
                err
            ),
        }
    }

    let _ = CombinedLogger::init(loggers);
}

fn build_config() -> Config {
    ConfigBuilder::new()
        .set_time_format_rfc3339()
        .set_target_level(LevelFilter::Error)
        .build()
}
