//! Interactive credential prompts.
//!
//! Defines the [`CredentialPrompt`] trait so the login flow can be driven by
//! the terminal in production and by scripted answers in tests.

use std::io::{self, BufRead, Write};

use anyhow::{Context, Result};

/// Source of secrets typed by the user.
pub trait CredentialPrompt: Send + Sync {
  /// Ask for the account password.
  fn password(&self, username: &str) -> Result<String>;

  /// Ask for the one-time code of a two-factor challenge.
  fn two_factor_code(&self, username: &str) -> Result<String>;
}

/// Prompts on the controlling terminal; the password is read without echo.
#[derive(Debug, Default)]
pub struct TerminalPrompt;

impl TerminalPrompt {
  pub fn new() -> Self {
    Self
  }
}

impl CredentialPrompt for TerminalPrompt {
  fn password(&self, username: &str) -> Result<String> {
    rpassword::prompt_password(format!("Instagram password for {username}: ")).context("Failed to read password")
  }

  fn two_factor_code(&self, username: &str) -> Result<String> {
    let mut stdout = io::stdout();
    write!(stdout, "Two-factor code for {username}: ").context("Failed to write prompt")?;
    stdout.flush().context("Failed to write prompt")?;

    let mut code = String::new();
    io::stdin()
      .lock()
      .read_line(&mut code)
      .context("Failed to read two-factor code")?;

    Ok(code.trim().to_string())
  }
}
