//! Terminal prompts: the pre-flight reclaim question and the interactive setup flow

use anyhow::{Context, Result};
use async_trait::async_trait;
use colored::Colorize;
use facebatch_core::port::PreflightPrompt;
use std::io::{BufRead, IsTerminal, Write};

/// Print `question` and read one trimmed line from stdin off the async runtime
pub async fn read_line(question: String) -> Result<String> {
    tokio::task::spawn_blocking(move || -> Result<String> {
        print!("{}", question);
        std::io::stdout().flush()?;
        let mut line = String::new();
        std::io::stdin().lock().read_line(&mut line)?;
        Ok(line.trim().to_string())
    })
    .await
    .context("stdin reader stopped")?
}

pub fn is_affirmative(answer: &str) -> bool {
    matches!(answer.to_ascii_lowercase().as_str(), "y" | "yes")
}

pub fn is_negative(answer: &str) -> bool {
    matches!(answer.to_ascii_lowercase().as_str(), "n" | "no")
}

/// Asks on stdin whether to reclaim memory before the batch starts
pub struct StdinPrompt {
    auto_accept: bool,
}

impl StdinPrompt {
    pub fn new(auto_accept: bool) -> Self {
        Self { auto_accept }
    }
}

#[async_trait]
impl PreflightPrompt for StdinPrompt {
    async fn confirm_reclaim(&self, memory_percent: f32) -> bool {
        if self.auto_accept {
            return true;
        }
        if !std::io::stdin().is_terminal() {
            return false;
        }

        let question = format!(
            "{} memory load is {:.1}%. Reclaim memory before starting? (y/n): ",
            "!".yellow().bold(),
            memory_percent
        );
        match read_line(question).await {
            Ok(answer) => is_affirmative(&answer),
            Err(_) => false,
        }
    }
}
