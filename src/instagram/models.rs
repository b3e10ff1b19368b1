//! Data models for sessions, requests and Instagram web API responses.

use std::collections::BTreeMap;
use std::path::PathBuf;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Authenticated (or anonymous) context used for API requests.
///
/// A session is nothing more than the cookies Instagram handed out at login,
/// plus the account name when it is known.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Session {
  /// Account this session belongs to; `None` for anonymous sessions and for
  /// sessions built from a bare sessionid cookie.
  pub username: Option<String>,
  /// Cookie name to value.
  #[serde(default)]
  pub cookies: BTreeMap<String, String>,
  /// When the session was written to disk.
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub saved_at: Option<DateTime<Utc>>,
}

impl Session {
  /// Session with no credentials; only public data is reachable.
  pub fn anonymous() -> Self {
    Self::default()
  }

  /// Build a session from a raw `sessionid` cookie value.
  ///
  /// The cookie value starts with the numeric account id followed by `%3A`
  /// (or `:`), which is exposed as `ds_user_id` the way the web client does.
  pub fn from_sessionid(sessionid: &str) -> Self {
    let mut cookies = BTreeMap::new();
    cookies.insert("sessionid".to_string(), sessionid.to_string());

    let user_id = sessionid
      .split_once("%3A")
      .or_else(|| sessionid.split_once(':'))
      .map(|(id, _)| id)
      .filter(|id| !id.is_empty() && id.chars().all(|c| c.is_ascii_digit()));
    if let Some(id) = user_id {
      cookies.insert("ds_user_id".to_string(), id.to_string());
    }

    Self {
      username: None,
      cookies,
      saved_at: None,
    }
  }

  /// Whether the session carries no login cookie.
  pub fn is_anonymous(&self) -> bool {
    self.sessionid().is_none()
  }

  pub fn sessionid(&self) -> Option<&str> {
    self.cookies.get("sessionid").map(String::as_str).filter(|v| !v.is_empty())
  }

  pub fn csrf_token(&self) -> Option<&str> {
    self.cookies.get("csrftoken").map(String::as_str)
  }

  /// Numeric id of the logged-in account, from the `ds_user_id` cookie.
  pub fn user_id(&self) -> Option<&str> {
    self.cookies.get("ds_user_id").map(String::as_str).filter(|v| !v.is_empty())
  }

  /// Render the cookie map as a `Cookie` header value.
  pub fn cookie_header(&self) -> Option<String> {
    if self.cookies.is_empty() {
      return None;
    }

    Some(
      self
        .cookies
        .iter()
        .map(|(name, value)| format!("{name}={value}"))
        .collect::<Vec<_>>()
        .join("; "),
    )
  }
}

/// What to download and where.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProfileRequest {
  /// Username of the target profile.
  pub profile: String,
  /// Directory that receives images and metadata.
  pub destination: PathBuf,
  /// Stop at the first post already present in `destination`.
  pub fast_update: bool,
  /// Write a JSON metadata file next to each post's images.
  pub save_metadata: bool,
}

/// Result of a successful interactive login step.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LoginOutcome {
  /// Password accepted, session ready.
  LoggedIn(Session),
  /// Password accepted but the account requires a one-time code.
  TwoFactorRequired(TwoFactorChallenge),
}

/// State carried between the password step and the 2FA code step.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TwoFactorChallenge {
  pub username: String,
  /// Identifier Instagram expects back with the verification code.
  pub identifier: String,
  /// Cookies issued during the password step (CSRF token, device id).
  pub cookies: BTreeMap<String, String>,
}

/// Public facts about a profile, as reported by the profile info endpoint.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProfileInfo {
  pub id: String,
  pub username: String,
  pub full_name: Option<String>,
  pub is_private: bool,
  pub media_count: u64,
}

/// Totals reported by a completed `download_profile` call.
///
/// Posts written by an earlier call of the same client (an attempt that
/// failed and was retried) are counted as downloaded, not as already present.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DownloadSummary {
  pub profile: ProfileInfo,
  /// Posts with at least one new image written.
  pub posts_downloaded: usize,
  /// Posts whose files were all present already.
  pub posts_already_present: usize,
  /// Video posts that were skipped.
  pub videos_skipped: usize,
  /// Posts that could not be saved and were passed over.
  pub posts_failed: usize,
  /// Image files written during this call.
  pub images_written: usize,
  /// Fast-update stopped the walk before the end of the timeline.
  pub stopped_early: bool,
}

// Wire formats below mirror the web API; only the fields the client reads are
// declared.

#[derive(Debug, Deserialize)]
pub struct WebProfileInfoResponse {
  pub data: WebProfileData,
}

#[derive(Debug, Deserialize)]
pub struct WebProfileData {
  pub user: Option<UserNode>,
}

#[derive(Debug, Deserialize)]
pub struct UserNode {
  pub id: String,
  pub username: String,
  pub full_name: Option<String>,
  #[serde(default)]
  pub is_private: bool,
  #[serde(default)]
  pub followed_by_viewer: bool,
  pub edge_owner_to_timeline_media: MediaConnection,
}

impl UserNode {
  pub fn info(&self) -> ProfileInfo {
    ProfileInfo {
      id: self.id.clone(),
      username: self.username.clone(),
      full_name: self.full_name.clone().filter(|name| !name.is_empty()),
      is_private: self.is_private,
      media_count: self.edge_owner_to_timeline_media.count,
    }
  }
}

#[derive(Debug, Deserialize)]
pub struct MediaConnection {
  #[serde(default)]
  pub count: u64,
  pub page_info: PageInfo,
  #[serde(default)]
  pub edges: Vec<MediaEdge>,
}

#[derive(Debug, Deserialize)]
pub struct PageInfo {
  #[serde(default)]
  pub has_next_page: bool,
  pub end_cursor: Option<String>,
}

/// Post nodes are kept as raw JSON so they can be written verbatim as
/// metadata; [`PostNode`] is parsed from them on demand.
#[derive(Debug, Deserialize)]
pub struct MediaEdge {
  pub node: serde_json::Value,
}

#[derive(Debug, Deserialize)]
pub struct TimelinePageResponse {
  pub data: TimelinePageData,
}

#[derive(Debug, Deserialize)]
pub struct TimelinePageData {
  pub user: Option<TimelineUser>,
}

#[derive(Debug, Deserialize)]
pub struct TimelineUser {
  pub edge_owner_to_timeline_media: MediaConnection,
}

/// A timeline post.
#[derive(Debug, Clone, Deserialize)]
pub struct PostNode {
  #[serde(rename = "__typename")]
  pub typename: Option<String>,
  pub id: String,
  pub shortcode: String,
  #[serde(default)]
  pub is_video: bool,
  pub display_url: Option<String>,
  #[serde(default)]
  pub display_resources: Vec<DisplayResource>,
  pub taken_at_timestamp: i64,
  pub edge_sidecar_to_children: Option<SidecarChildren>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct SidecarChildren {
  #[serde(default)]
  pub edges: Vec<SidecarEdge>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct SidecarEdge {
  pub node: MediaNode,
}

/// One item of a sidecar (carousel) post.
#[derive(Debug, Clone, Deserialize)]
pub struct MediaNode {
  #[serde(default)]
  pub is_video: bool,
  pub display_url: Option<String>,
  #[serde(default)]
  pub display_resources: Vec<DisplayResource>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct DisplayResource {
  pub src: String,
  pub config_width: u32,
  pub config_height: u32,
}

/// Widest rendition, falling back to `display_url`.
fn best_url(resources: &[DisplayResource], display_url: Option<&str>) -> Option<String> {
  resources
    .iter()
    .max_by_key(|r| (r.config_width, r.config_height))
    .map(|r| r.src.clone())
    .or_else(|| display_url.map(str::to_string))
}

impl PostNode {
  pub fn is_sidecar(&self) -> bool {
    self.edge_sidecar_to_children.is_some()
  }

  /// A post that contains nothing but video.
  pub fn is_video_only(&self) -> bool {
    match &self.edge_sidecar_to_children {
      Some(children) => children.edges.iter().all(|edge| edge.node.is_video),
      None => self.is_video,
    }
  }

  /// Best-resolution URLs of every image in the post, in display order.
  ///
  /// Video items of a sidecar are dropped.
  pub fn image_urls(&self) -> Vec<String> {
    match &self.edge_sidecar_to_children {
      Some(children) => children
        .edges
        .iter()
        .filter(|edge| !edge.node.is_video)
        .filter_map(|edge| best_url(&edge.node.display_resources, edge.node.display_url.as_deref()))
        .collect(),
      None if self.is_video => Vec::new(),
      None => best_url(&self.display_resources, self.display_url.as_deref())
        .into_iter()
        .collect(),
    }
  }
}

#[derive(Debug, Deserialize)]
pub struct LoginResponse {
  #[serde(default)]
  pub authenticated: bool,
  #[serde(default)]
  pub user: bool,
  #[serde(default)]
  pub two_factor_required: bool,
  pub two_factor_info: Option<TwoFactorInfo>,
  pub checkpoint_url: Option<String>,
  pub message: Option<String>,
  pub status: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct TwoFactorInfo {
  pub two_factor_identifier: String,
}
