//! Authentication for Instagram downloads.
//!
//! A run authenticates in exactly one of three ways, or not at all:
//!
//! - `--session-file <path>` loads a session saved by an earlier login;
//! - `--sessionid <cookie>` uses a cookie copied from a browser;
//! - `--login <username>` prompts for the password (and a two-factor code
//!   when the account has one) and saves the resulting session to
//!   `.session-<username>.json` for later runs.
//!
//! Without any of them, only public profiles can be downloaded.

mod method;
mod prompt;

use std::path::PathBuf;

pub use method::{AuthMethod, ConfigError};
pub use prompt::{CredentialPrompt, TerminalPrompt};
use tracing::{info, warn};

use crate::instagram::{InstagramApi, InstagramError, LoginOutcome, Session, session_filename};

/// Produces the session for a run from the chosen [`AuthMethod`].
pub struct Authenticator<'a> {
  api: &'a dyn InstagramApi,
  prompt: &'a dyn CredentialPrompt,
  session_dir: PathBuf,
}

impl<'a> Authenticator<'a> {
  /// # Arguments
  /// * `api` - Client used for the login calls.
  /// * `prompt` - Where passwords and 2FA codes come from.
  /// * `session_dir` - Directory that receives `.session-<username>.json`
  ///   after an interactive login.
  pub fn new(api: &'a dyn InstagramApi, prompt: &'a dyn CredentialPrompt, session_dir: impl Into<PathBuf>) -> Self {
    Self {
      api,
      prompt,
      session_dir: session_dir.into(),
    }
  }

  /// Where an interactive login of `username` is saved.
  pub fn session_path(&self, username: &str) -> PathBuf {
    self.session_dir.join(session_filename(username))
  }

  /// Run the authentication path selected by `method`.
  ///
  /// Exactly one of the client's session-producing operations is invoked.
  ///
  /// # Errors
  /// Returns an error of kind [`crate::instagram::ErrorKind::Auth`] when the
  /// credentials, session file or 2FA code are rejected.
  pub async fn authenticate(&self, method: &AuthMethod) -> Result<Session, InstagramError> {
    match method {
      AuthMethod::Anonymous => {
        info!("No credentials given, continuing without login");
        Ok(Session::anonymous())
      }
      AuthMethod::SessionFile(path) => {
        let session = self.api.load_session_file(path).await?;
        info!(
          "Loaded session for {} from {}",
          session.username.as_deref().unwrap_or("(unknown account)"),
          path.display()
        );
        Ok(session)
      }
      AuthMethod::SessionId(cookie) => {
        let session = self.api.import_sessionid(cookie).await?;
        info!("Using sessionid cookie");
        Ok(session)
      }
      AuthMethod::Interactive { username } => self.interactive_login(username).await,
    }
  }

  async fn interactive_login(&self, username: &str) -> Result<Session, InstagramError> {
    let password = self
      .prompt
      .password(username)
      .map_err(|err| InstagramError::Auth(format!("{err:#}")))?;
    if password.is_empty() {
      return Err(InstagramError::Auth("empty password".to_string()));
    }

    let session = match self.api.login(username, &password).await? {
      LoginOutcome::LoggedIn(session) => session,
      LoginOutcome::TwoFactorRequired(challenge) => {
        info!("Two-factor authentication required for {username}");
        let code = self
          .prompt
          .two_factor_code(username)
          .map_err(|err| InstagramError::Auth(format!("{err:#}")))?;
        if code.is_empty() {
          return Err(InstagramError::Auth("empty two-factor code".to_string()));
        }
        self.api.two_factor_login(&challenge, &code).await?
      }
    };
    info!("Logged in as {username}");

    // The session is usable even if it cannot be persisted.
    let path = self.session_path(username);
    match self.api.save_session(&session, &path).await {
      Ok(()) => info!("Saved session to {}", path.display()),
      Err(err) => warn!("Could not save session to {}: {err}", path.display()),
    }

    Ok(session)
  }
}
