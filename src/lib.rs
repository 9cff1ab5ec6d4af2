//! # bulkexport - 表格文件批量转换
//!
//! 把源目录中按扩展名筛选出的文件逐个转换为目标格式，写入目标目录。
//!
//! ## 模块
//! - `batch` - 文件枚举、后台运行器、进度与取消
//! - `converters` - 单文件转换能力及办公套件实现
//! - `models` - 请求与运行状态数据模型
//! - `utils` - 终端输出、进度条、日志、报告
//!
//! ## 依赖关系
//! ```text
//! main.rs
//!   ├── cli/        (命令行参数定义)
//!   └── commands/   (命令执行逻辑)
//!         └── lib.rs
//!               ├── batch/      (编排核心)
//!               │     └── converters/ (单文件转换)
//!               ├── models/     (数据模型)
//!               ├── utils/      (工具函数)
//!               └── error.rs    (错误处理)
//! ```

pub mod batch;
pub mod converters;
pub mod error;
pub mod models;
pub mod utils;

pub use batch::{BatchRunner, CancellationToken, FailurePolicy, RunEvent, RunHandle};
pub use converters::{ConversionStep, OfficeConverter, TargetFormat};
pub use error::{BulkExportError, Result};
pub use models::{BatchRequest, RunOutcome, RunState, RunStatus};
