//! Injected input provider for the interactive flows.
//!
//! The weekend confirmation and manual trade entry are written against this
//! trait so they stay pure over provided answers; tests drive them with
//! [`ScriptedPrompt`] instead of a terminal.

use std::collections::VecDeque;
use std::io::{self, Write};

use crate::{Error, Result};

/// Source of user answers.
pub trait Prompt {
    /// Ask for one line of input.
    fn line(&mut self, message: &str) -> Result<String>;

    /// Ask a yes/no question, defaulting to no.
    fn confirm(&mut self, message: &str) -> Result<bool> {
        let answer = self.line(&format!("{message} [y/N] "))?;
        Ok(matches!(answer.trim().to_lowercase().as_str(), "y" | "yes"))
    }
}

/// Terminal-backed prompt.
#[derive(Debug, Default)]
pub struct StdinPrompt;

impl Prompt for StdinPrompt {
    fn line(&mut self, message: &str) -> Result<String> {
        print!("{message}");
        io::stdout().flush()?;

        let mut input = String::new();
        io::stdin().read_line(&mut input)?;
        Ok(input.trim().to_string())
    }
}

/// Prompt answering from a fixed script. Runs out loudly rather than
/// blocking, so a test that under-provides answers fails fast.
#[derive(Debug, Default)]
pub struct ScriptedPrompt {
    answers: VecDeque<String>,
}

impl ScriptedPrompt {
    /// Create a scripted prompt from the given answers, in order.
    pub fn new<I, S>(answers: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            answers: answers.into_iter().map(Into::into).collect(),
        }
    }
}

impl Prompt for ScriptedPrompt {
    fn line(&mut self, _message: &str) -> Result<String> {
        self.answers
            .pop_front()
            .ok_or_else(|| Error::InvalidOperation("scripted prompt ran out of answers".to_string()))
    }
}
