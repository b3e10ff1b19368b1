//! HTTP client implementation for the Instagram web API.

use std::collections::{BTreeMap, HashMap};
use std::path::Path;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use anyhow::{Context, Result};
use async_trait::async_trait;
use chrono::Utc;
use reqwest::{RequestBuilder, Response};
use serde_json::json;
use tokio::time::sleep;
use tracing::{debug, info, warn};

use super::api::InstagramApi;
use super::error::{ErrorKind, InstagramError};
use super::models::{
  DownloadSummary, LoginOutcome, LoginResponse, MediaConnection, PostNode, ProfileRequest, Session,
  TimelinePageResponse, TwoFactorChallenge, UserNode, WebProfileInfoResponse,
};
use super::session::{read_session_file, write_session_file};
use super::storage::{PostFiles, PostNamer, file_exists, write_atomic};

const DEFAULT_BASE_URL: &str = "https://www.instagram.com";

/// Application id the web client sends with every API call.
const IG_APP_ID: &str = "936619743392459";

/// GraphQL query returning a page of a user's timeline.
const TIMELINE_QUERY_HASH: &str = "003056d32c2554def87228bc3fd9668a";
const TIMELINE_PAGE_SIZE: u32 = 12;

/// Body text Instagram uses when it throttles a client without a 429.
const THROTTLE_MESSAGE: &str = "Please wait a few minutes";

const BROWSER_USER_AGENT: &str = "Mozilla/5.0 (X11; Linux x86_64) AppleWebKit/537.36 (KHTML, like Gecko) \
                                  Chrome/124.0.0.0 Safari/537.36";

/// Longest error body kept in [`InstagramError::UnexpectedStatus`].
const MAX_ERROR_BODY: usize = 200;

/// Instagram web API client.
#[derive(Clone)]
pub struct InstagramClient {
  base_url: String,
  client: reqwest::Client,
  request_interval: Duration,
  /// Images written by this client, by post shortcode. A retried
  /// `download_profile` walks the timeline from the top again and must not
  /// take these posts for ones saved by an earlier run.
  written: Arc<Mutex<HashMap<String, usize>>>,
}

impl InstagramClient {
  /// Create a client for `https://www.instagram.com`.
  ///
  /// # Arguments
  /// * `timeout_secs` - Request timeout in seconds
  /// * `request_interval` - Pause after each downloaded post
  pub fn new(timeout_secs: u64, request_interval: Duration) -> Result<Self> {
    Self::with_base_url(DEFAULT_BASE_URL, timeout_secs, request_interval)
  }

  /// Create a client against a custom base URL.
  ///
  /// # Errors
  /// Returns an error if the underlying `reqwest::Client` cannot be built.
  pub fn with_base_url(base_url: impl Into<String>, timeout_secs: u64, request_interval: Duration) -> Result<Self> {
    let base_url = base_url.into().trim_end_matches('/').to_string();

    let client = reqwest::Client::builder()
      .timeout(Duration::from_secs(timeout_secs))
      .user_agent(BROWSER_USER_AGENT)
      .build()
      .context("Failed to create HTTP client")?;

    Ok(Self {
      base_url,
      client,
      request_interval,
      written: Arc::default(),
    })
  }

  fn written_images(&self) -> MutexGuard<'_, HashMap<String, usize>> {
    self.written.lock().unwrap_or_else(PoisonError::into_inner)
  }

  /// Images of `shortcode` written by this client so far.
  fn images_written_for(&self, shortcode: &str) -> usize {
    self.written_images().get(shortcode).copied().unwrap_or(0)
  }

  /// Attach the headers every web API call needs, plus the session cookies.
  fn with_session(&self, request: RequestBuilder, session: &Session) -> RequestBuilder {
    let mut request = request
      .header("X-IG-App-ID", IG_APP_ID)
      .header("X-Requested-With", "XMLHttpRequest")
      .header("Referer", format!("{}/", self.base_url));

    if let Some(cookies) = session.cookie_header() {
      request = request.header("Cookie", cookies);
    }
    if let Some(csrf) = session.csrf_token() {
      request = request.header("X-CSRFToken", csrf);
    }

    request
  }

  async fn send(&self, request: RequestBuilder, session: &Session) -> Result<Response, InstagramError> {
    let response = request.send().await?;
    let status = response.status();
    if status.is_success() {
      return Ok(response);
    }

    let body = response.text().await.unwrap_or_default();
    Err(classify_status(status.as_u16(), &body, !session.is_anonymous()))
  }

  async fn fetch_profile(&self, session: &Session, username: &str) -> Result<UserNode, InstagramError> {
    let url = format!("{}/api/v1/users/web_profile_info/", self.base_url);
    debug!("Fetching profile info for {username}");

    let request = self.with_session(self.client.get(&url).query(&[("username", username)]), session);
    let response = request.send().await?;

    let status = response.status();
    if status == reqwest::StatusCode::NOT_FOUND {
      return Err(InstagramError::ProfileNotFound(username.to_string()));
    }
    if !status.is_success() {
      let body = response.text().await.unwrap_or_default();
      return Err(classify_status(status.as_u16(), &body, !session.is_anonymous()));
    }

    let info: WebProfileInfoResponse = response.json().await?;
    info
      .data
      .user
      .ok_or_else(|| InstagramError::ProfileNotFound(username.to_string()))
  }

  async fn fetch_timeline_page(
    &self,
    session: &Session,
    user_id: &str,
    cursor: &str,
  ) -> Result<MediaConnection, InstagramError> {
    let url = format!("{}/graphql/query/", self.base_url);
    let variables = json!({
      "id": user_id,
      "first": TIMELINE_PAGE_SIZE,
      "after": cursor,
    })
    .to_string();
    debug!("Fetching timeline page after cursor {cursor}");

    let request = self.with_session(
      self
        .client
        .get(&url)
        .query(&[("query_hash", TIMELINE_QUERY_HASH), ("variables", variables.as_str())]),
      session,
    );
    let response = self.send(request, session).await?;

    let page: TimelinePageResponse = response.json().await?;
    page
      .data
      .user
      .map(|user| user.edge_owner_to_timeline_media)
      .ok_or_else(|| InstagramError::BadResponse("timeline page without user".to_string()))
  }

  async fn fetch_media(&self, url: &str) -> Result<Vec<u8>, InstagramError> {
    let response = self.client.get(url).send().await?;

    let status = response.status();
    if !status.is_success() {
      let body = response.text().await.unwrap_or_default();
      return Err(classify_media_status(status.as_u16(), &body));
    }

    let bytes = response.bytes().await?;
    Ok(bytes.to_vec())
  }

  /// Fetch the images of `post` that are not on disk yet.
  ///
  /// # Returns
  /// Number of images written by this call.
  async fn save_post(
    &self,
    post: &PostNode,
    files: &PostFiles,
    raw: &serde_json::Value,
    request: &ProfileRequest,
  ) -> Result<usize, InstagramError> {
    let mut written = 0;
    for (url, path) in &files.images {
      if file_exists(path).await {
        continue;
      }

      let bytes = self.fetch_media(url).await?;
      write_atomic(path, &bytes).await?;
      *self.written_images().entry(post.shortcode.clone()).or_default() += 1;
      written += 1;
    }

    if request.save_metadata && (written > 0 || !file_exists(&files.metadata).await) {
      let json = serde_json::to_vec_pretty(raw)
        .map_err(|err| InstagramError::BadResponse(format!("post {} metadata: {err}", post.shortcode)))?;
      write_atomic(&files.metadata, &json).await?;
    }

    Ok(written)
  }
}

#[async_trait]
impl InstagramApi for InstagramClient {
  async fn load_session_file(&self, path: &Path) -> Result<Session, InstagramError> {
    read_session_file(path).await
  }

  async fn import_sessionid(&self, sessionid: &str) -> Result<Session, InstagramError> {
    let sessionid = sessionid.trim();
    if sessionid.is_empty() {
      return Err(InstagramError::Auth("sessionid cookie is empty".to_string()));
    }
    Ok(Session::from_sessionid(sessionid))
  }

  async fn login(&self, username: &str, password: &str) -> Result<LoginOutcome, InstagramError> {
    let login_page = format!("{}/accounts/login/", self.base_url);

    let response = self.send(self.client.get(&login_page), &Session::anonymous()).await?;
    let mut cookies = response_cookies(&response);
    if !cookies.contains_key("csrftoken") {
      return Err(InstagramError::BadResponse(
        "login page did not set a CSRF token".to_string(),
      ));
    }

    let enc_password = format!("#PWD_INSTAGRAM_BROWSER:0:{}:{password}", Utc::now().timestamp());
    let bootstrap = Session {
      username: None,
      cookies: cookies.clone(),
      saved_at: None,
    };

    debug!("Submitting credentials for {username}");
    let request = self
      .with_session(
        self
          .client
          .post(format!("{}/api/v1/web/accounts/login/ajax/", self.base_url)),
        &bootstrap,
      )
      .form(&[
        ("username", username),
        ("enc_password", enc_password.as_str()),
        ("queryParams", "{}"),
        ("optIntoOneTap", "false"),
      ]);

    let response = request.send().await?;
    cookies.extend(response_cookies(&response));
    let login = parse_login_response(response).await?;

    interpret_login(username, login, cookies)
  }

  async fn two_factor_login(&self, challenge: &TwoFactorChallenge, code: &str) -> Result<Session, InstagramError> {
    let mut cookies = challenge.cookies.clone();
    let pending = Session {
      username: None,
      cookies: cookies.clone(),
      saved_at: None,
    };

    debug!("Submitting two-factor code for {}", challenge.username);
    let request = self
      .with_session(
        self
          .client
          .post(format!("{}/api/v1/web/accounts/login/ajax/two_factor/", self.base_url)),
        &pending,
      )
      .form(&[
        ("username", challenge.username.as_str()),
        ("verificationCode", code.trim()),
        ("identifier", challenge.identifier.as_str()),
        ("queryParams", "{}"),
      ]);

    let response = request.send().await?;
    cookies.extend(response_cookies(&response));
    let login = parse_login_response(response).await?;

    interpret_two_factor(&challenge.username, login, cookies)
  }

  async fn save_session(&self, session: &Session, path: &Path) -> Result<(), InstagramError> {
    write_session_file(session, path).await
  }

  async fn download_profile(
    &self,
    session: &Session,
    request: &ProfileRequest,
  ) -> Result<DownloadSummary, InstagramError> {
    let user = self.fetch_profile(session, &request.profile).await?;
    let profile = user.info();

    let own_profile = session.username.as_deref() == Some(user.username.as_str())
      || session.user_id() == Some(user.id.as_str());
    if user.is_private && !user.followed_by_viewer && !own_profile {
      return Err(InstagramError::ProfilePrivate(user.username));
    }

    info!(
      "Profile {}: {} posts, {}",
      profile.username,
      profile.media_count,
      if profile.is_private { "private" } else { "public" }
    );

    tokio::fs::create_dir_all(&request.destination)
      .await
      .map_err(|err| InstagramError::io("failed to create directory", &request.destination, err))?;

    let mut summary = DownloadSummary {
      profile,
      posts_downloaded: 0,
      posts_already_present: 0,
      videos_skipped: 0,
      posts_failed: 0,
      images_written: 0,
      stopped_early: false,
    };

    let user_id = user.id;
    let mut connection = user.edge_owner_to_timeline_media;

    let mut namer = PostNamer::default();

    loop {
      for edge in &connection.edges {
        let post: PostNode = match serde_json::from_value(edge.node.clone()) {
          Ok(post) => post,
          Err(err) => {
            warn!("Skipping post with unexpected layout: {err}");
            summary.posts_failed += 1;
            continue;
          }
        };

        if post.is_video_only() {
          debug!("Skipping video post {}", post.shortcode);
          summary.videos_skipped += 1;
          continue;
        }

        let saved = match namer.files_for(&post, &request.destination) {
          Ok(files) if files.images.is_empty() => {
            debug!("Post {} has no downloadable images", post.shortcode);
            summary.videos_skipped += 1;
            continue;
          }
          Ok(files) => self.save_post(&post, &files, &edge.node, request).await,
          Err(err) => Err(err),
        };

        let written_now = match saved {
          Ok(written_now) => written_now,
          Err(err) if skips_post(&err) => {
            warn!("Could not save post {}: {err}", post.shortcode);
            summary.posts_failed += 1;
            continue;
          }
          Err(err) => return Err(err),
        };

        match self.images_written_for(&post.shortcode) {
          0 => {
            summary.posts_already_present += 1;
            if request.fast_update {
              info!("Post {} already downloaded, stopping (fast update)", post.shortcode);
              summary.stopped_early = true;
              return Ok(summary);
            }
            debug!("Post {} already downloaded", post.shortcode);
          }
          images => {
            summary.posts_downloaded += 1;
            summary.images_written += images;

            if written_now == 0 {
              debug!("Post {} was saved by an earlier attempt", post.shortcode);
              continue;
            }
            info!("Downloaded post {} ({} images)", post.shortcode, written_now);

            if !self.request_interval.is_zero() {
              sleep(self.request_interval).await;
            }
          }
        }
      }

      let next_cursor = match (connection.page_info.has_next_page, connection.page_info.end_cursor.take()) {
        (true, Some(cursor)) => cursor,
        _ => break,
      };
      connection = self.fetch_timeline_page(session, &user_id, &next_cursor).await?;
    }

    Ok(summary)
  }
}

/// Failures that concern a single post. The walk logs them and moves on;
/// connectivity, rate limits, rejected sessions and local disk errors end it.
fn skips_post(err: &InstagramError) -> bool {
  err.kind() == ErrorKind::Permanent && !matches!(err, InstagramError::Io { .. })
}

/// Cookies set by a response, by name.
fn response_cookies(response: &Response) -> BTreeMap<String, String> {
  response
    .cookies()
    .map(|cookie| (cookie.name().to_string(), cookie.value().to_string()))
    .collect()
}

async fn parse_login_response(response: Response) -> Result<LoginResponse, InstagramError> {
  let status = response.status().as_u16();
  let body = response.text().await?;

  match status {
    429 => return Err(InstagramError::RateLimited { status }),
    500..=599 => return Err(InstagramError::ServerError { status }),
    _ => {}
  }

  // Rejected logins come back as 400 with a JSON body, so the status alone
  // says little; only fall back to it when the body is not JSON.
  serde_json::from_str(&body).map_err(|_| classify_status(status, &body, false))
}

/// Turn a password-step response into a login outcome.
pub(crate) fn interpret_login(
  username: &str,
  response: LoginResponse,
  cookies: BTreeMap<String, String>,
) -> Result<LoginOutcome, InstagramError> {
  if response.two_factor_required {
    let info = response
      .two_factor_info
      .ok_or_else(|| InstagramError::BadResponse("two-factor challenge without identifier".to_string()))?;
    return Ok(LoginOutcome::TwoFactorRequired(TwoFactorChallenge {
      username: username.to_string(),
      identifier: info.two_factor_identifier,
      cookies,
    }));
  }

  if response.checkpoint_url.is_some() {
    return Err(InstagramError::Auth(format!(
      "Instagram requires a security checkpoint for '{username}'; confirm the login in a browser or the app and retry"
    )));
  }

  if response.authenticated {
    return logged_in_session(username, cookies).map(LoginOutcome::LoggedIn);
  }

  if let Some(message) = response.message.as_deref()
    && message.contains(THROTTLE_MESSAGE)
  {
    return Err(InstagramError::RateLimited { status: 400 });
  }

  if response.user {
    Err(InstagramError::Auth(format!("wrong password for '{username}'")))
  } else if response.status.as_deref() == Some("fail") && response.message.is_some() {
    Err(InstagramError::Auth(response.message.unwrap_or_default()))
  } else {
    Err(InstagramError::Auth(format!("user '{username}' does not exist")))
  }
}

/// Turn a 2FA-step response into a session.
pub(crate) fn interpret_two_factor(
  username: &str,
  response: LoginResponse,
  cookies: BTreeMap<String, String>,
) -> Result<Session, InstagramError> {
  if response.authenticated {
    return logged_in_session(username, cookies);
  }

  let reason = response
    .message
    .unwrap_or_else(|| "two-factor code rejected".to_string());
  Err(InstagramError::Auth(reason))
}

fn logged_in_session(username: &str, cookies: BTreeMap<String, String>) -> Result<Session, InstagramError> {
  let session = Session {
    username: Some(username.to_string()),
    cookies,
    saved_at: None,
  };

  if session.sessionid().is_none() {
    return Err(InstagramError::BadResponse(
      "login succeeded but no sessionid cookie was issued".to_string(),
    ));
  }

  Ok(session)
}

/// Classify a non-success API response.
pub(crate) fn classify_status(status: u16, body: &str, authenticated: bool) -> InstagramError {
  match status {
    429 => InstagramError::RateLimited { status },
    500..=599 => InstagramError::ServerError { status },
    400 | 401 | 403 if body.contains(THROTTLE_MESSAGE) => InstagramError::RateLimited { status },
    401 | 403 if authenticated => InstagramError::Auth(format!("Instagram rejected the session ({status})")),
    401 | 403 => InstagramError::Auth(format!("Instagram requires a login for this request ({status})")),
    _ => InstagramError::UnexpectedStatus {
      status,
      body: body.chars().take(MAX_ERROR_BODY).collect(),
    },
  }
}

/// Classify a non-success CDN response.
///
/// CDN URLs are signed and expire; a retry refetches the profile and gets
/// fresh ones, so 403/410 are transient here.
pub(crate) fn classify_media_status(status: u16, body: &str) -> InstagramError {
  match status {
    429 => InstagramError::RateLimited { status },
    500..=599 | 403 | 410 => InstagramError::ServerError { status },
    _ => InstagramError::UnexpectedStatus {
      status,
      body: body.chars().take(MAX_ERROR_BODY).collect(),
    },
  }
}
