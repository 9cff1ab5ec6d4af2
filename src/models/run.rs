//! # 运行状态数据模型
//!
//! 批量运行的状态机、进度快照与最终结果。
//!
//! ## 依赖关系
//! - 被 `batch/runner.rs` 写入
//! - 被 `commands/export.rs` 读取并展示

use crate::error::BulkExportError;
use std::path::PathBuf;
use std::sync::Arc;

/// 运行状态机
///
/// `Idle → Running → {Completed, Cancelled, Failed}`，右侧三个状态为终态。
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunStatus {
    Idle,
    Running,
    Completed,
    Cancelled,
    Failed,
}

impl RunStatus {
    /// 可以开始新的运行
    pub fn is_startable(self) -> bool {
        self == RunStatus::Idle
    }

    /// 可以请求停止
    pub fn is_stoppable(self) -> bool {
        self == RunStatus::Running
    }

    pub(crate) fn as_u8(self) -> u8 {
        match self {
            RunStatus::Idle => 0,
            RunStatus::Running => 1,
            RunStatus::Completed => 2,
            RunStatus::Cancelled => 3,
            RunStatus::Failed => 4,
        }
    }

    pub(crate) fn from_u8(value: u8) -> Self {
        match value {
            1 => RunStatus::Running,
            2 => RunStatus::Completed,
            3 => RunStatus::Cancelled,
            4 => RunStatus::Failed,
            _ => RunStatus::Idle,
        }
    }
}

impl std::fmt::Display for RunStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            RunStatus::Idle => write!(f, "idle"),
            RunStatus::Running => write!(f, "running"),
            RunStatus::Completed => write!(f, "completed"),
            RunStatus::Cancelled => write!(f, "cancelled"),
            RunStatus::Failed => write!(f, "failed"),
        }
    }
}

/// 进度快照
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RunState {
    pub status: RunStatus,
    /// 候选文件总数
    pub total: usize,
    /// 已成功转换的文件数
    pub completed: usize,
    /// 跳过继续策略下失败的文件数
    pub failed: usize,
}

impl RunState {
    pub fn new() -> Self {
        Self {
            status: RunStatus::Idle,
            total: 0,
            completed: 0,
            failed: 0,
        }
    }

    pub fn is_running(&self) -> bool {
        self.status == RunStatus::Running
    }

    /// 运行因停止请求而结束
    pub fn is_cancelled(&self) -> bool {
        self.status == RunStatus::Cancelled
    }

    /// 已处理（成功或失败）的文件数
    pub fn processed(&self) -> usize {
        self.completed + self.failed
    }
}

impl Default for RunState {
    fn default() -> Self {
        Self::new()
    }
}

/// 单个文件的失败记录
#[derive(Debug, Clone)]
pub struct FileFailure {
    /// 在枚举顺序中的位置
    pub index: usize,
    pub path: PathBuf,
    pub reason: String,
}

/// 运行统计
#[derive(Debug, Clone, Default)]
pub struct RunSummary {
    /// 候选文件总数
    pub total: usize,
    /// 按处理顺序排列的 (源文件, 输出文件)
    pub converted: Vec<(PathBuf, PathBuf)>,
    /// 跳过继续策略下记录的失败
    pub failures: Vec<FileFailure>,
}

impl RunSummary {
    pub fn completed(&self) -> usize {
        self.converted.len()
    }

    /// 没有任何匹配文件
    pub fn nothing_to_do(&self) -> bool {
        self.total == 0
    }
}

/// 一次运行的最终结果，每个完成回调只收到一次
#[derive(Debug, Clone)]
pub enum RunOutcome {
    Completed(RunSummary),
    Cancelled(RunSummary),
    Failed {
        summary: RunSummary,
        /// 触发失败的文件；校验和枚举错误时为 `None`
        file: Option<PathBuf>,
        error: Arc<BulkExportError>,
    },
}

impl RunOutcome {
    pub fn status(&self) -> RunStatus {
        match self {
            RunOutcome::Completed(_) => RunStatus::Completed,
            RunOutcome::Cancelled(_) => RunStatus::Cancelled,
            RunOutcome::Failed { .. } => RunStatus::Failed,
        }
    }

    pub fn summary(&self) -> &RunSummary {
        match self {
            RunOutcome::Completed(summary) | RunOutcome::Cancelled(summary) => summary,
            RunOutcome::Failed { summary, .. } => summary,
        }
    }
}
