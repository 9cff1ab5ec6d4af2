//! # 办公套件转换器
//!
//! 调用无界面模式的办公套件（LibreOffice `soffice`）完成单文件转换。
//!
//! ## 功能
//! - `soffice --headless --convert-to <filter> --outdir <dest> <source>`
//! - 每个文件启动一个进程，由运行器保证串行
//! - 子进程运行在独立进程组，终端 Ctrl-C 不会打断正在写入的文件
//! - 校验输出文件确实生成
//!
//! ## 依赖关系
//! - 实现 `converters::ConversionStep`
//! - 被 `commands/export.rs` 构造

use super::{output_path_for, ConversionOutcome, ConversionStep, TargetFormat};
use crate::error::{BulkExportError, Result};

use std::path::{Path, PathBuf};
use std::process::{Command, Stdio};

/// 默认的办公套件可执行文件
pub const DEFAULT_PROGRAM: &str = "soffice";

/// 基于外部办公套件的转换器
#[derive(Debug, Clone)]
pub struct OfficeConverter {
    /// 可执行文件名或路径
    program: PathBuf,
    /// 目标格式
    target: TargetFormat,
}

impl OfficeConverter {
    pub fn new(target: TargetFormat) -> Self {
        Self {
            program: PathBuf::from(DEFAULT_PROGRAM),
            target,
        }
    }

    /// 指定办公套件可执行文件
    pub fn with_program(mut self, program: impl Into<PathBuf>) -> Self {
        self.program = program.into();
        self
    }

    /// 执行外部命令
    fn run_office(&self, source: &Path, dest_dir: &Path) -> Result<()> {
        let command = self.program.display().to_string();

        let mut cmd = Command::new(&self.program);
        cmd.arg("--headless")
            .arg("--convert-to")
            .arg(self.target.office_filter())
            .arg("--outdir")
            .arg(dest_dir)
            .arg(source)
            .stdin(Stdio::null());
        detach_from_terminal_signals(&mut cmd);

        let output = cmd
            .output()
            .map_err(|e| match e.kind() {
                std::io::ErrorKind::NotFound => BulkExportError::CommandNotFound {
                    command: command.clone(),
                },
                _ => BulkExportError::CommandFailed {
                    command: command.clone(),
                    stderr: e.to_string(),
                },
            })?;

        if output.status.success() {
            Ok(())
        } else {
            Err(BulkExportError::CommandFailed {
                command: format!("{} --convert-to {}", command, self.target.office_filter()),
                stderr: String::from_utf8_lossy(&output.stderr).trim().to_string(),
            })
        }
    }
}

/// 子进程放入独立进程组，终端的 Ctrl-C 只到达本进程
///
/// 停止请求由取消令牌在文件边界处理，正在写入的文件必须完整结束。
#[cfg(unix)]
fn detach_from_terminal_signals(cmd: &mut Command) {
    use std::os::unix::process::CommandExt;
    cmd.process_group(0);
}

#[cfg(windows)]
fn detach_from_terminal_signals(cmd: &mut Command) {
    use std::os::windows::process::CommandExt;
    const CREATE_NEW_PROCESS_GROUP: u32 = 0x0000_0200;
    cmd.creation_flags(CREATE_NEW_PROCESS_GROUP);
}

#[cfg(not(any(unix, windows)))]
fn detach_from_terminal_signals(_cmd: &mut Command) {}

impl ConversionStep for OfficeConverter {
    fn convert(&self, source: &Path, dest_dir: &Path) -> ConversionOutcome {
        let output_path = output_path_for(source, dest_dir, self.target.extension());

        log::debug!(
            "{} {} -> {}",
            self.program.display(),
            source.display(),
            output_path.display()
        );

        self.run_office(source, dest_dir)
            .map_err(|e| BulkExportError::ConversionError {
                path: source.display().to_string(),
                reason: e.to_string(),
            })?;

        // soffice 在无法打开输入时仍可能返回 0
        if !output_path.is_file() {
            return Err(BulkExportError::ConversionError {
                path: source.display().to_string(),
                reason: format!("no output produced at {}", output_path.display()),
            });
        }

        Ok(output_path)
    }
}
