//! Error taxonomy for Instagram operations.
//!
//! Every failure carries an [`ErrorKind`] so callers can decide whether to
//! retry without matching on individual variants.

use std::path::PathBuf;

use thiserror::Error;

/// Coarse classification used by the download loop to decide what to do with
/// a failure.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
  /// Connectivity loss or rate limiting; worth retrying after a pause.
  Transient,
  /// Bad input, missing or private profile, local I/O failure.
  Permanent,
  /// Credentials or session rejected.
  Auth,
}

/// Errors produced by the Instagram client and the authentication flow.
#[derive(Debug, Error)]
pub enum InstagramError {
  /// The transport failed before a response arrived (DNS, refused, reset,
  /// timeout).
  #[error("connection to Instagram failed: {0}")]
  Connection(#[source] reqwest::Error),

  /// HTTP 429 or Instagram's "please wait a few minutes" throttle.
  #[error("rate limited by Instagram ({status})")]
  RateLimited { status: u16 },

  /// HTTP 5xx.
  #[error("Instagram server error {status}")]
  ServerError { status: u16 },

  /// Credentials, session or 2FA code rejected.
  #[error("authentication failed: {0}")]
  Auth(String),

  /// Saved session file could not be used.
  #[error("session file {}: {reason}", path.display())]
  SessionFile { path: PathBuf, reason: String },

  /// The target profile does not exist.
  #[error("profile '{0}' does not exist")]
  ProfileNotFound(String),

  /// The target profile is private and the session does not follow it.
  #[error("profile '{0}' is private and not followed by the logged-in account")]
  ProfilePrivate(String),

  /// Instagram answered with a status the client does not know how to handle.
  #[error("Instagram returned unexpected status {status}: {body}")]
  UnexpectedStatus { status: u16, body: String },

  /// The response could not be interpreted.
  #[error("malformed response from Instagram: {0}")]
  BadResponse(String),

  /// A local filesystem operation failed.
  #[error("{action} {}: {source}", path.display())]
  Io {
    action: &'static str,
    path: PathBuf,
    #[source]
    source: std::io::Error,
  },

  /// Caller supplied an unusable argument.
  #[error("invalid argument: {0}")]
  InvalidArgument(String),
}

impl InstagramError {
  /// Classify this error for retry decisions.
  pub fn kind(&self) -> ErrorKind {
    match self {
      Self::Connection(_) | Self::RateLimited { .. } | Self::ServerError { .. } => ErrorKind::Transient,
      Self::Auth(_) | Self::SessionFile { .. } => ErrorKind::Auth,
      Self::ProfileNotFound(_)
      | Self::ProfilePrivate(_)
      | Self::UnexpectedStatus { .. }
      | Self::BadResponse(_)
      | Self::Io { .. }
      | Self::InvalidArgument(_) => ErrorKind::Permanent,
    }
  }

  /// Shorthand for `kind() == ErrorKind::Transient`.
  pub fn is_transient(&self) -> bool {
    self.kind() == ErrorKind::Transient
  }

  pub(crate) fn io(action: &'static str, path: impl Into<PathBuf>, source: std::io::Error) -> Self {
    Self::Io {
      action,
      path: path.into(),
      source,
    }
  }

  pub(crate) fn session_file(path: impl Into<PathBuf>, reason: impl Into<String>) -> Self {
    Self::SessionFile {
      path: path.into(),
      reason: reason.into(),
    }
  }
}

/// Map a transport error into the taxonomy.
///
/// Anything that happened on the wire is transient; a body that arrived but
/// failed to decode is a malformed response.
impl From<reqwest::Error> for InstagramError {
  fn from(err: reqwest::Error) -> Self {
    if err.is_decode() {
      Self::BadResponse(err.to_string())
    } else {
      Self::Connection(err)
    }
  }
}
