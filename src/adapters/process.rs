use crate::domain::model::{CommandOutput, CommandSpec};
use crate::domain::ports::CommandRunner;
use crate::utils::error::{OpsError, Result};
use async_trait::async_trait;
use std::process::Stdio;
use tokio::io::AsyncWriteExt;
use tokio::process::Command;

/// 以 tokio 子程序執行命令，stderr 直接輸出到終端
#[derive(Debug, Clone, Default)]
pub struct SystemRunner;

impl SystemRunner {
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl CommandRunner for SystemRunner {
    async fn run(&self, command: &CommandSpec) -> Result<CommandOutput> {
        tracing::debug!("▶️ {}", command.display());

        let mut cmd = Command::new(&command.program);
        cmd.args(&command.args)
            .stdin(if command.stdin.is_some() {
                Stdio::piped()
            } else {
                Stdio::inherit()
            })
            .stdout(if command.capture_stdout {
                Stdio::piped()
            } else {
                Stdio::inherit()
            })
            .stderr(Stdio::inherit());

        let mut child = cmd.spawn().map_err(|e| match e.kind() {
            std::io::ErrorKind::NotFound => OpsError::MissingTool {
                tool: command.program.clone(),
            },
            _ => OpsError::IoError(e),
        })?;

        // 另開任務寫入 stdin，避免與 stdout 讀取互相阻塞
        let writer = match (child.stdin.take(), command.stdin.clone()) {
            (Some(mut stdin), Some(input)) => Some(tokio::spawn(async move {
                let result = stdin.write_all(&input).await;
                drop(stdin);
                result
            })),
            _ => None,
        };

        let output = child.wait_with_output().await?;

        if let Some(writer) = writer {
            match writer.await {
                Ok(Ok(())) => {}
                Ok(Err(e)) if e.kind() == std::io::ErrorKind::BrokenPipe => {
                    tracing::warn!("⚠️ {} closed stdin early", command.program);
                }
                Ok(Err(e)) => return Err(OpsError::IoError(e)),
                Err(e) => {
                    return Err(OpsError::IoError(std::io::Error::new(
                        std::io::ErrorKind::Other,
                        e,
                    )))
                }
            }
        }

        Ok(CommandOutput {
            code: output.status.code(),
            stdout: output.stdout,
            stderr: output.stderr,
        })
    }
}

/// 只記錄命令而不執行，所有命令都視為成功
#[derive(Debug, Clone, Default)]
pub struct DryRunRunner;

#[async_trait]
impl CommandRunner for DryRunRunner {
    async fn run(&self, command: &CommandSpec) -> Result<CommandOutput> {
        tracing::info!("🔍 [dry-run] {}", command.display());
        println!("  $ {}", command.display());
        Ok(CommandOutput::ok())
    }
}

#[cfg(test)]
mod dry_run_tests {
    use super::*;

    #[test]
    fn test_dry_run_reports_success_without_spawning() {
        let runner = DryRunRunner;
        let output = tokio_test::block_on(
            runner.run_checked(&CommandSpec::new("docker-compose").args(["down", "--volumes"])),
        )
        .unwrap();
        assert!(output.success());
        assert!(output.stdout.is_empty());
    }
}

#[cfg(all(test, unix))]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_missing_program_maps_to_missing_tool() {
        let runner = SystemRunner::new();
        let err = runner
            .run(&CommandSpec::new("definitely-not-a-real-tool-4821"))
            .await
            .unwrap_err();
        assert!(matches!(err, OpsError::MissingTool { tool } if tool == "definitely-not-a-real-tool-4821"));
    }

    #[tokio::test]
    async fn test_capture_and_stdin() {
        let runner = SystemRunner::new();
        let output = runner
            .run(&CommandSpec::new("cat").capture().with_stdin(b"PONG\n".to_vec()))
            .await
            .unwrap();
        assert!(output.success());
        assert_eq!(output.stdout_text(), "PONG");
    }

    #[tokio::test]
    async fn test_run_checked_reports_exit_code() {
        let runner = SystemRunner::new();
        let err = runner
            .run_checked(&CommandSpec::new("sh").args(["-c", "exit 3"]))
            .await
            .unwrap_err();
        assert!(matches!(err, OpsError::CommandFailed { code: Some(3), .. }));
    }
}
