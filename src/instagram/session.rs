//! Session file persistence.
//!
//! Sessions are stored as pretty-printed JSON:
//!
//! ```text
//! {
//!   "username": "alice",
//!   "cookies": { "csrftoken": "...", "ds_user_id": "...", "sessionid": "..." },
//!   "saved_at": "2026-01-02T03:04:05Z"
//! }
//! ```
//!
//! Interactive logins write to `.session-<username>.json` so the next run can
//! pass that file to `--session-file`.

use std::path::Path;

use chrono::Utc;
use tracing::debug;

use super::error::InstagramError;
use super::models::Session;
use super::storage::write_atomic;

const SESSION_FILE_PREFIX: &str = ".session-";
const SESSION_FILE_SUFFIX: &str = ".json";

/// File name used to persist the session of `username`.
pub fn session_filename(username: &str) -> String {
  format!("{SESSION_FILE_PREFIX}{username}{SESSION_FILE_SUFFIX}")
}

/// Account name encoded in a session file name, if the name follows the
/// `.session-<username>.json` convention.
pub fn username_from_session_filename(path: &Path) -> Option<String> {
  let name = path.file_name()?.to_str()?;
  name
    .strip_prefix(SESSION_FILE_PREFIX)?
    .strip_suffix(SESSION_FILE_SUFFIX)
    .filter(|username| !username.is_empty())
    .map(str::to_string)
}

/// Read and validate a session file.
///
/// # Errors
/// Returns [`InstagramError::SessionFile`] when the file cannot be read or
/// parsed, has no `sessionid` cookie, or names a different account than its
/// file name.
pub async fn read_session_file(path: &Path) -> Result<Session, InstagramError> {
  let contents = match tokio::fs::read_to_string(path).await {
    Ok(contents) => contents,
    Err(err) if err.kind() == std::io::ErrorKind::NotFound => {
      return Err(InstagramError::session_file(path, "file not found"));
    }
    Err(err) => return Err(InstagramError::session_file(path, format!("cannot read file: {err}"))),
  };

  let session: Session = serde_json::from_str(&contents)
    .map_err(|err| InstagramError::session_file(path, format!("not a valid session file: {err}")))?;

  if session.sessionid().is_none() {
    return Err(InstagramError::session_file(path, "no sessionid cookie in file"));
  }

  if let Some(expected) = username_from_session_filename(path) {
    match session.username.as_deref() {
      Some(actual) if actual != expected => {
        return Err(InstagramError::session_file(
          path,
          format!("session belongs to '{actual}', expected '{expected}'"),
        ));
      }
      _ => {}
    }
  }

  debug!(
    "Loaded session for {} from {}",
    session.username.as_deref().unwrap_or("(unknown account)"),
    path.display()
  );

  Ok(session)
}

/// Write a session file, stamping `saved_at`.
pub async fn write_session_file(session: &Session, path: &Path) -> Result<(), InstagramError> {
  let mut stamped = session.clone();
  stamped.saved_at = Some(Utc::now());

  let json = serde_json::to_vec_pretty(&stamped)
    .map_err(|err| InstagramError::InvalidArgument(format!("session cannot be serialized: {err}")))?;

  write_atomic(path, &json).await?;
  debug!("Saved session to {}", path.display());
  Ok(())
}
