//! # 数据模型模块
//!
//! 定义批量转换请求与运行状态的数据模型。
//!
//! ## 依赖关系
//! - 被 `batch/` 和 `commands/` 使用
//! - 子模块: request, run

pub mod request;
pub mod run;

pub use request::{BatchRequest, DEFAULT_EXTENSIONS};
pub use run::{FileFailure, RunOutcome, RunState, RunStatus, RunSummary};
