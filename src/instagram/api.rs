//! Trait definitions for interacting with Instagram.

use std::path::Path;

use async_trait::async_trait;

use super::error::InstagramError;
use super::models::{DownloadSummary, LoginOutcome, ProfileRequest, Session, TwoFactorChallenge};

/// Instagram operations consumed by the authenticator and the download loop
/// (enables testing with fake implementations).
#[async_trait]
pub trait InstagramApi: Send + Sync {
  /// Load a previously saved session.
  ///
  /// # Errors
  /// Returns [`InstagramError::SessionFile`] when the file is missing,
  /// unreadable, malformed, lacks a `sessionid` cookie, or belongs to a
  /// different account than its file name says.
  async fn load_session_file(&self, path: &Path) -> Result<Session, InstagramError>;

  /// Build a session from a raw `sessionid` cookie value.
  ///
  /// Nothing is verified here; a rejected cookie surfaces on the first
  /// authenticated request.
  async fn import_sessionid(&self, sessionid: &str) -> Result<Session, InstagramError>;

  /// Submit a username and password.
  ///
  /// # Returns
  /// Either a ready session or a challenge that must be answered with
  /// [`InstagramApi::two_factor_login`].
  async fn login(&self, username: &str, password: &str) -> Result<LoginOutcome, InstagramError>;

  /// Answer a two-factor challenge with a one-time code.
  async fn two_factor_login(&self, challenge: &TwoFactorChallenge, code: &str) -> Result<Session, InstagramError>;

  /// Persist a session so later runs can load it with
  /// [`InstagramApi::load_session_file`].
  async fn save_session(&self, session: &Session, path: &Path) -> Result<(), InstagramError>;

  /// Fetch and store the images of a profile.
  ///
  /// Files already present in the destination are never fetched again, so
  /// calling this repeatedly resumes where the previous call stopped. With
  /// `fast_update` set, the walk ends at the first post already on disk.
  async fn download_profile(&self, session: &Session, request: &ProfileRequest)
  -> Result<DownloadSummary, InstagramError>;
}
