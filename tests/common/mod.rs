#![allow(dead_code)]

use async_trait::async_trait;
use booking_ops::domain::model::{CommandOutput, CommandSpec};
use booking_ops::domain::ports::{is_affirmative, CommandRunner, Prompter};
use booking_ops::{OpsError, Result};
use std::collections::VecDeque;
use std::path::PathBuf;
use std::sync::Mutex;

/// 記錄所有命令而不實際執行，可依命令內容回傳預設結果
#[derive(Default)]
pub struct RecordingRunner {
    calls: Mutex<Vec<CommandSpec>>,
    missing_tools: Vec<String>,
    responses: Vec<(String, CommandOutput)>,
    watched: Option<PathBuf>,
    observed: Mutex<Vec<bool>>,
}

impl RecordingRunner {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn missing_tool(mut self, tool: &str) -> Self {
        self.missing_tools.push(tool.to_string());
        self
    }

    /// 命令列包含 `needle` 時回傳 `output`（先加入者優先）
    pub fn respond(mut self, needle: &str, output: CommandOutput) -> Self {
        self.responses.push((needle.to_string(), output));
        self
    }

    pub fn respond_stdout(self, needle: &str, stdout: &str) -> Self {
        self.respond(
            needle,
            CommandOutput {
                code: Some(0),
                stdout: stdout.as_bytes().to_vec(),
                stderr: Vec::new(),
            },
        )
    }

    pub fn fail(self, needle: &str, code: i32) -> Self {
        self.respond(
            needle,
            CommandOutput {
                code: Some(code),
                ..CommandOutput::default()
            },
        )
    }

    /// Records whether `path` existed at the moment of each call.
    pub fn watch_path(mut self, path: PathBuf) -> Self {
        self.watched = Some(path);
        self
    }

    pub fn calls(&self) -> Vec<CommandSpec> {
        self.calls.lock().unwrap().clone()
    }

    pub fn lines(&self) -> Vec<String> {
        self.calls().iter().map(CommandSpec::display).collect()
    }

    pub fn position(&self, needle: &str) -> Option<usize> {
        self.lines().iter().position(|line| line.contains(needle))
    }

    pub fn observed(&self) -> Vec<bool> {
        self.observed.lock().unwrap().clone()
    }
}

#[async_trait]
impl CommandRunner for RecordingRunner {
    async fn run(&self, command: &CommandSpec) -> Result<CommandOutput> {
        self.calls.lock().unwrap().push(command.clone());
        if let Some(path) = &self.watched {
            self.observed.lock().unwrap().push(path.exists());
        }

        if self.missing_tools.contains(&command.program) {
            return Err(OpsError::MissingTool {
                tool: command.program.clone(),
            });
        }

        let line = command.display();
        Ok(self
            .responses
            .iter()
            .find(|(needle, _)| line.contains(needle.as_str()))
            .map(|(_, output)| output.clone())
            .unwrap_or_else(CommandOutput::ok))
    }
}

/// 依序回傳預先準備好的答案
#[derive(Default)]
pub struct ScriptedPrompter {
    answers: Mutex<VecDeque<String>>,
    questions: Mutex<Vec<String>>,
    pauses: Mutex<usize>,
}

impl ScriptedPrompter {
    pub fn answering(answers: &[&str]) -> Self {
        Self {
            answers: Mutex::new(answers.iter().map(|a| a.to_string()).collect()),
            ..Self::default()
        }
    }

    pub fn questions(&self) -> Vec<String> {
        self.questions.lock().unwrap().clone()
    }

    pub fn pauses(&self) -> usize {
        *self.pauses.lock().unwrap()
    }

    fn next(&self, question: &str) -> String {
        self.questions.lock().unwrap().push(question.to_string());
        self.answers.lock().unwrap().pop_front().unwrap_or_default()
    }
}

impl Prompter for ScriptedPrompter {
    fn confirm(&self, question: &str) -> Result<bool> {
        Ok(is_affirmative(&self.next(question)))
    }

    fn ask(&self, question: &str) -> Result<String> {
        Ok(self.next(question))
    }

    fn pause(&self, _message: &str) -> Result<()> {
        *self.pauses.lock().unwrap() += 1;
        Ok(())
    }
}
