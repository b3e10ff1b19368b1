//! File naming and write helpers for downloaded posts.
//!
//! Posts are named after their UTC timestamp, which keeps a profile's
//! directory sorted chronologically and makes "already downloaded" a plain
//! existence check.

use std::collections::HashMap;
use std::ffi::OsString;
use std::path::{Path, PathBuf};

use chrono::DateTime;
use url::Url;

use super::error::InstagramError;
use super::models::PostNode;

/// Extension used when the image URL does not reveal one.
const DEFAULT_IMAGE_EXTENSION: &str = "jpg";

/// Base file name for a post taken at `timestamp` (Unix seconds, UTC).
///
/// # Returns
/// `None` when the timestamp is out of range.
pub fn post_basename(timestamp: i64) -> Option<String> {
  DateTime::from_timestamp(timestamp, 0).map(|time| time.format("%Y-%m-%d_%H-%M-%S_UTC").to_string())
}

/// Image file extension derived from the URL path.
pub fn image_extension(image_url: &str) -> String {
  Url::parse(image_url)
    .ok()
    .and_then(|url| {
      let path = url.path();
      let file = path.rsplit('/').next()?;
      let (_, ext) = file.rsplit_once('.')?;
      let ext = ext.to_ascii_lowercase();
      (!ext.is_empty() && ext.len() <= 4 && ext.chars().all(|c| c.is_ascii_alphanumeric())).then_some(ext)
    })
    .unwrap_or_else(|| DEFAULT_IMAGE_EXTENSION.to_string())
}

/// Files that make up one post on disk.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PostFiles {
  /// `(source URL, destination path)` for each image.
  pub images: Vec<(String, PathBuf)>,
  pub metadata: PathBuf,
}

/// Work out where each image of `post` goes inside `destination`.
///
/// Single-image posts use `<basename>.<ext>`; sidecar posts number their
/// images from 1: `<basename>_<n>.<ext>`.
pub fn post_files(post: &PostNode, destination: &Path) -> Result<PostFiles, InstagramError> {
  let basename = timestamp_basename(post)?;
  Ok(files_with_basename(post, destination, &basename))
}

/// Names posts during one walk of a timeline.
///
/// Two posts taken in the same second share a timestamp basename. The first
/// one seen keeps it and later ones get `_<shortcode>` appended. The timeline
/// is always walked newest first, so the same post wins on every run.
#[derive(Debug, Default)]
pub struct PostNamer {
  /// basename -> shortcode of the post that owns it
  claimed: HashMap<String, String>,
}

impl PostNamer {
  pub fn files_for(&mut self, post: &PostNode, destination: &Path) -> Result<PostFiles, InstagramError> {
    let mut basename = timestamp_basename(post)?;
    if let Some(owner) = self.claimed.get(&basename)
      && *owner != post.shortcode
    {
      basename = format!("{basename}_{}", post.shortcode);
    }
    self.claimed.insert(basename.clone(), post.shortcode.clone());

    Ok(files_with_basename(post, destination, &basename))
  }
}

fn timestamp_basename(post: &PostNode) -> Result<String, InstagramError> {
  post_basename(post.taken_at_timestamp).ok_or_else(|| {
    InstagramError::BadResponse(format!(
      "post {} has an invalid timestamp {}",
      post.shortcode, post.taken_at_timestamp
    ))
  })
}

fn files_with_basename(post: &PostNode, destination: &Path, basename: &str) -> PostFiles {
  let urls = post.image_urls();
  let images = if post.is_sidecar() {
    urls
      .into_iter()
      .enumerate()
      .map(|(index, url)| {
        let name = format!("{basename}_{}.{}", index + 1, image_extension(&url));
        (url, destination.join(name))
      })
      .collect()
  } else {
    urls
      .into_iter()
      .map(|url| {
        let name = format!("{basename}.{}", image_extension(&url));
        (url, destination.join(name))
      })
      .collect()
  };

  PostFiles {
    images,
    metadata: destination.join(format!("{basename}.json")),
  }
}

/// Path of the temporary file used while `path` is being written.
pub fn partial_path(path: &Path) -> PathBuf {
  let mut name = path.file_name().map(OsString::from).unwrap_or_default();
  name.push(".part");
  path.with_file_name(name)
}

pub async fn file_exists(path: &Path) -> bool {
  tokio::fs::try_exists(path).await.unwrap_or(false)
}

/// Write `bytes` to `path` through a `.part` file and a rename, so the final
/// name only ever holds complete content.
pub async fn write_atomic(path: &Path, bytes: &[u8]) -> Result<(), InstagramError> {
  if let Some(parent) = path.parent()
    && !parent.as_os_str().is_empty()
  {
    tokio::fs::create_dir_all(parent)
      .await
      .map_err(|err| InstagramError::io("failed to create directory", parent, err))?;
  }

  let partial = partial_path(path);
  tokio::fs::write(&partial, bytes)
    .await
    .map_err(|err| InstagramError::io("failed to write", &partial, err))?;

  if let Err(err) = tokio::fs::rename(&partial, path).await {
    let _ = tokio::fs::remove_file(&partial).await;
    return Err(InstagramError::io("failed to move into place", path, err));
  }

  Ok(())
}
