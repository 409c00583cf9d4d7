use crate::domain::model::{CommandOutput, CommandSpec};
use crate::utils::error::{OpsError, Result};
use async_trait::async_trait;

#[async_trait]
pub trait CommandRunner: Send + Sync {
    /// 執行命令並回傳結果；程式不存在時回傳 `OpsError::MissingTool`
    async fn run(&self, command: &CommandSpec) -> Result<CommandOutput>;

    /// 與 `run` 相同，但非零結束碼視為錯誤
    async fn run_checked(&self, command: &CommandSpec) -> Result<CommandOutput> {
        let output = self.run(command).await?;
        if output.success() {
            Ok(output)
        } else {
            Err(OpsError::CommandFailed {
                command: command.display(),
                code: output.code,
            })
        }
    }
}

pub trait Prompter: Send + Sync {
    fn confirm(&self, question: &str) -> Result<bool>;
    fn ask(&self, question: &str) -> Result<String>;
    fn pause(&self, message: &str) -> Result<()>;
}

/// Only an explicit yes counts as confirmation.
pub fn is_affirmative(answer: &str) -> bool {
    matches!(answer.trim(), "y" | "Y" | "yes" | "Yes" | "YES")
}
