//! Operator confirmation: interactive prompt or `--yes` auto-confirm.
//!
//! Interactive prompts are the only suspension points in the pipeline. A
//! non-interactive invocation must supply the answer via `--yes`; with
//! neither a terminal nor the flag, confirmation fails immediately rather
//! than blocking forever.

use std::io::{self, IsTerminal as _, Write as _};

use crate::error::TransactionError;

/// Source of yes/no answers for destructive steps.
pub trait Confirm {
    /// Ask the operator to confirm `question`.
    ///
    /// # Errors
    ///
    /// Returns [`TransactionError::NotInteractive`] when no answer can be
    /// obtained without blocking indefinitely.
    fn confirm(&self, question: &str) -> Result<bool, TransactionError>;
}

/// Confirmation via the controlling terminal, with `--yes` short-circuit.
#[derive(Debug, Clone, Copy)]
pub struct TerminalConfirm {
    /// Auto-confirm flag (`--yes`).
    pub assume_yes: bool,
}

impl Confirm for TerminalConfirm {
    fn confirm(&self, question: &str) -> Result<bool, TransactionError> {
        if self.assume_yes {
            return Ok(true);
        }
        if !io::stdin().is_terminal() {
            return Err(TransactionError::NotInteractive);
        }
        print!("{question} [y/N]: ");
        let _ = io::stdout().flush();
        let mut input = String::new();
        if io::stdin().read_line(&mut input).is_err() {
            return Err(TransactionError::NotInteractive);
        }
        Ok(matches!(input.trim(), "y" | "Y" | "yes" | "Yes"))
    }
}

/// Scripted answers for tests.
#[derive(Debug, Clone, Copy)]
pub struct StaticConfirm {
    /// Answer returned for every question.
    pub answer: bool,
}

impl Confirm for StaticConfirm {
    fn confirm(&self, _question: &str) -> Result<bool, TransactionError> {
        Ok(self.answer)
    }
}
