//! # 批量处理模块
//!
//! 批量转换的编排核心。
//!
//! ## 功能
//! - 枚举源目录并按扩展名过滤
//! - 单后台线程顺序转换
//! - 进度事件与协作式取消
//! - 完成回调与失败策略
//!
//! ## 依赖关系
//! - 被 `commands/` 模块使用
//! - 使用 `walkdir` 枚举文件
//! - 使用 `crossbeam-channel` 传递进度事件

pub mod collector;
pub mod progress;
pub mod runner;

pub use collector::FileCollector;
pub use progress::{CancellationToken, ChannelSink, ProgressSink, RunEvent};
pub use runner::{BatchRunner, FailurePolicy, RunHandle};
