//! Selection of the authentication method from command-line options.

use std::fmt;
use std::path::{Path, PathBuf};

use thiserror::Error;

/// The single credential source used for a run.
#[derive(Clone, PartialEq, Eq)]
pub enum AuthMethod {
  /// No credentials; public profiles only.
  Anonymous,
  /// Load a session saved by an earlier interactive login.
  SessionFile(PathBuf),
  /// Raw `sessionid` cookie copied from a browser.
  SessionId(String),
  /// Prompt for the password (and 2FA code) of this account.
  Interactive { username: String },
}

/// Invalid combination of command-line options.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConfigError {
  #[error("only one authentication method may be used at a time, got {}", .0.join(", "))]
  ConflictingAuth(Vec<&'static str>),

  #[error("{0} must not be empty")]
  Empty(&'static str),
}

impl AuthMethod {
  /// Pick the authentication method from the three mutually exclusive
  /// options.
  ///
  /// # Returns
  /// [`AuthMethod::Anonymous`] when no option is given.
  ///
  /// # Errors
  /// [`ConfigError::ConflictingAuth`] when more than one option is given, and
  /// [`ConfigError::Empty`] when the chosen option has an empty value.
  pub fn from_options(
    login: Option<&str>,
    session_file: Option<&Path>,
    sessionid: Option<&str>,
  ) -> Result<Self, ConfigError> {
    let given: Vec<&'static str> = [
      login.map(|_| "--login"),
      session_file.map(|_| "--session-file"),
      sessionid.map(|_| "--sessionid"),
    ]
    .into_iter()
    .flatten()
    .collect();

    if given.len() > 1 {
      return Err(ConfigError::ConflictingAuth(given));
    }

    if let Some(username) = login {
      let username = username.trim();
      if username.is_empty() {
        return Err(ConfigError::Empty("--login"));
      }
      return Ok(Self::Interactive {
        username: username.to_string(),
      });
    }

    if let Some(path) = session_file {
      if path.as_os_str().is_empty() {
        return Err(ConfigError::Empty("--session-file"));
      }
      return Ok(Self::SessionFile(path.to_path_buf()));
    }

    if let Some(cookie) = sessionid {
      let cookie = cookie.trim();
      if cookie.is_empty() {
        return Err(ConfigError::Empty("--sessionid"));
      }
      return Ok(Self::SessionId(cookie.to_string()));
    }

    Ok(Self::Anonymous)
  }
}

// The cookie is a bearer credential; keep it out of logs and panics.
impl fmt::Display for AuthMethod {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    match self {
      Self::Anonymous => write!(f, "anonymous"),
      Self::SessionFile(path) => write!(f, "session file {}", path.display()),
      Self::SessionId(_) => write!(f, "sessionid cookie"),
      Self::Interactive { username } => write!(f, "interactive login as {username}"),
    }
  }
}

impl fmt::Debug for AuthMethod {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    match self {
      Self::SessionId(_) => f.write_str("SessionId(\"***\")"),
      Self::Anonymous => f.write_str("Anonymous"),
      Self::SessionFile(path) => f.debug_tuple("SessionFile").field(path).finish(),
      Self::Interactive { username } => f.debug_struct("Interactive").field("username", username).finish(),
    }
  }
}
