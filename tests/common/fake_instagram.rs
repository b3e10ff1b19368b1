//! Fake Instagram client for testing
//!
//! Records every call and replays scripted outcomes instead of talking to
//! the network. Session files are read and written for real so the tests can
//! inspect them.

use std::collections::VecDeque;
use std::path::{Path, PathBuf};
use std::sync::Mutex;
use std::time::Duration;

use anyhow::{Result, anyhow};
use async_trait::async_trait;
use instagram_dl::auth::CredentialPrompt;
use instagram_dl::download::Sleeper;
use instagram_dl::instagram::session::{read_session_file, write_session_file};
use instagram_dl::instagram::{
  DownloadSummary, InstagramApi, InstagramError, LoginOutcome, ProfileRequest, Session, TwoFactorChallenge,
};

use crate::common::fixtures;

/// One recorded call on [`FakeInstagram`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Call {
  LoadSessionFile(PathBuf),
  ImportSessionid(String),
  Login { username: String, password: String },
  TwoFactorLogin { identifier: String, code: String },
  SaveSession(PathBuf),
  DownloadProfile {
    profile: String,
    destination: PathBuf,
    fast_update: bool,
    anonymous: bool,
  },
}

impl Call {
  pub fn is_download(&self) -> bool {
    matches!(self, Call::DownloadProfile { .. })
  }
}

/// A fake Instagram client with scripted responses
pub struct FakeInstagram {
  calls: Mutex<Vec<Call>>,
  downloads: Mutex<VecDeque<Result<DownloadSummary, InstagramError>>>,
  login: Mutex<Option<Result<LoginOutcome, InstagramError>>>,
  two_factor: Mutex<Option<Result<Session, InstagramError>>>,
}

impl FakeInstagram {
  /// Every call succeeds; downloads report a complete three post profile.
  pub fn new() -> Self {
    Self {
      calls: Mutex::new(Vec::new()),
      downloads: Mutex::new(VecDeque::new()),
      login: Mutex::new(None),
      two_factor: Mutex::new(None),
    }
  }

  /// Outcomes of successive `download_profile` calls. Once exhausted, calls
  /// succeed.
  pub fn with_downloads(self, results: impl IntoIterator<Item = Result<DownloadSummary, InstagramError>>) -> Self {
    self.downloads.lock().unwrap().extend(results);
    self
  }

  /// Fail the first `count` downloads with HTTP 429.
  pub fn rate_limited_times(self, count: usize) -> Self {
    self.with_downloads((0..count).map(|_| Err(InstagramError::RateLimited { status: 429 })))
  }

  pub fn with_login(self, outcome: Result<LoginOutcome, InstagramError>) -> Self {
    *self.login.lock().unwrap() = Some(outcome);
    self
  }

  pub fn with_two_factor(self, outcome: Result<Session, InstagramError>) -> Self {
    *self.two_factor.lock().unwrap() = Some(outcome);
    self
  }

  pub fn calls(&self) -> Vec<Call> {
    self.calls.lock().unwrap().clone()
  }

  pub fn download_calls(&self) -> Vec<Call> {
    self.calls().into_iter().filter(Call::is_download).collect()
  }

  fn record(&self, call: Call) {
    self.calls.lock().unwrap().push(call);
  }
}

impl Default for FakeInstagram {
  fn default() -> Self {
    Self::new()
  }
}

/// Session as returned by a successful login of `username`.
pub fn logged_in_session(username: &str) -> Session {
  Session {
    username: Some(username.to_string()),
    ..Session::from_sessionid("1784123%3AfakeSecret%3A27")
  }
}

#[async_trait]
impl InstagramApi for FakeInstagram {
  async fn load_session_file(&self, path: &Path) -> Result<Session, InstagramError> {
    self.record(Call::LoadSessionFile(path.to_path_buf()));
    read_session_file(path).await
  }

  async fn import_sessionid(&self, sessionid: &str) -> Result<Session, InstagramError> {
    self.record(Call::ImportSessionid(sessionid.to_string()));
    Ok(Session::from_sessionid(sessionid))
  }

  async fn login(&self, username: &str, password: &str) -> Result<LoginOutcome, InstagramError> {
    self.record(Call::Login {
      username: username.to_string(),
      password: password.to_string(),
    });
    self
      .login
      .lock()
      .unwrap()
      .take()
      .unwrap_or_else(|| Ok(LoginOutcome::LoggedIn(logged_in_session(username))))
  }

  async fn two_factor_login(&self, challenge: &TwoFactorChallenge, code: &str) -> Result<Session, InstagramError> {
    self.record(Call::TwoFactorLogin {
      identifier: challenge.identifier.clone(),
      code: code.to_string(),
    });
    self
      .two_factor
      .lock()
      .unwrap()
      .take()
      .unwrap_or_else(|| Ok(logged_in_session(&challenge.username)))
  }

  async fn save_session(&self, session: &Session, path: &Path) -> Result<(), InstagramError> {
    self.record(Call::SaveSession(path.to_path_buf()));
    write_session_file(session, path).await
  }

  async fn download_profile(
    &self,
    session: &Session,
    request: &ProfileRequest,
  ) -> Result<DownloadSummary, InstagramError> {
    self.record(Call::DownloadProfile {
      profile: request.profile.clone(),
      destination: request.destination.clone(),
      fast_update: request.fast_update,
      anonymous: session.is_anonymous(),
    });
    self
      .downloads
      .lock()
      .unwrap()
      .pop_front()
      .unwrap_or_else(|| Ok(fixtures::complete_summary(&request.profile)))
  }
}

/// Answers prompts from a script; a missing answer fails like a closed
/// terminal.
#[derive(Default)]
pub struct ScriptedPrompt {
  password: Option<String>,
  code: Option<String>,
  asked: Mutex<Vec<&'static str>>,
}

impl ScriptedPrompt {
  pub fn new(password: Option<&str>, code: Option<&str>) -> Self {
    Self {
      password: password.map(str::to_string),
      code: code.map(str::to_string),
      asked: Mutex::new(Vec::new()),
    }
  }

  /// Prompts shown so far, in order.
  pub fn asked(&self) -> Vec<&'static str> {
    self.asked.lock().unwrap().clone()
  }
}

impl CredentialPrompt for ScriptedPrompt {
  fn password(&self, _username: &str) -> Result<String> {
    self.asked.lock().unwrap().push("password");
    self.password.clone().ok_or_else(|| anyhow!("no terminal"))
  }

  fn two_factor_code(&self, _username: &str) -> Result<String> {
    self.asked.lock().unwrap().push("two_factor_code");
    self.code.clone().ok_or_else(|| anyhow!("no terminal"))
  }
}

/// Records requested pauses without waiting.
#[derive(Default)]
pub struct RecordingSleeper {
  slept: Mutex<Vec<Duration>>,
}

impl RecordingSleeper {
  pub fn slept(&self) -> Vec<Duration> {
    self.slept.lock().unwrap().clone()
  }
}

#[async_trait]
impl Sleeper for RecordingSleeper {
  async fn sleep(&self, duration: Duration) {
    self.slept.lock().unwrap().push(duration);
  }
}
