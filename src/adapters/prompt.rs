use crate::domain::ports::{is_affirmative, Prompter};
use crate::utils::error::Result;
use std::io::{self, BufRead, Write};

/// 從終端讀取使用者輸入
#[derive(Debug, Clone, Default)]
pub struct StdinPrompter;

impl StdinPrompter {
    fn read_line(&self, prompt: &str) -> Result<String> {
        let mut stdout = io::stdout();
        write!(stdout, "{}", prompt)?;
        stdout.flush()?;

        let mut line = String::new();
        io::stdin().lock().read_line(&mut line)?;
        Ok(line.trim_end_matches(['\r', '\n']).to_string())
    }
}

impl Prompter for StdinPrompter {
    fn confirm(&self, question: &str) -> Result<bool> {
        let answer = self.read_line(&format!("{} [y/N] ", question))?;
        Ok(is_affirmative(&answer))
    }

    fn ask(&self, question: &str) -> Result<String> {
        self.read_line(&format!("{} ", question))
    }

    fn pause(&self, message: &str) -> Result<()> {
        self.read_line(&format!("{} (press Enter to continue) ", message))?;
        Ok(())
    }
}

/// 非互動模式：不詢問，一律拒絕確認
#[derive(Debug, Clone, Default)]
pub struct NonInteractivePrompter;

impl Prompter for NonInteractivePrompter {
    fn confirm(&self, question: &str) -> Result<bool> {
        tracing::warn!("⚠️ Non-interactive mode, declining: {}", question);
        Ok(false)
    }

    fn ask(&self, question: &str) -> Result<String> {
        tracing::warn!("⚠️ Non-interactive mode, no answer for: {}", question);
        Ok(String::new())
    }

    fn pause(&self, _message: &str) -> Result<()> {
        Ok(())
    }
}
