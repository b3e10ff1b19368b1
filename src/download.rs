//! Download loop with backoff for transient failures.
//!
//! The loop calls [`InstagramApi::download_profile`] until it succeeds.
//! Connection failures and rate limiting are answered with a pause taken from
//! a non-decreasing schedule (60s, 120s, 300s, 600s, then 900s for every
//! further attempt) followed by the same call again; the client skips files
//! already on disk, so each retry resumes where the previous attempt stopped.
//! Any other failure ends the loop immediately.
//!
//! Retries are unbounded unless [`RetryPolicy::max_retries`] is set, so an
//! unattended sync keeps going through long rate-limit windows.

use std::path::Path;
use std::time::Duration;

use async_trait::async_trait;
use tracing::{debug, info, warn};

use crate::instagram::{DownloadSummary, InstagramApi, InstagramError, Session};
pub use crate::instagram::ProfileRequest;

/// Default pauses between attempts, in seconds. The last entry is the ceiling.
pub const DEFAULT_BACKOFF_SCHEDULE_SECS: [u64; 5] = [60, 120, 300, 600, 900];

/// Name of the file used to check that the destination is writable.
const WRITE_TEST_FILE: &str = ".instagram-dl-write-test";

/// How long to wait between attempts and how many attempts to make.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RetryPolicy {
  schedule: Vec<Duration>,
  max_retries: Option<u32>,
}

impl Default for RetryPolicy {
  fn default() -> Self {
    Self {
      schedule: DEFAULT_BACKOFF_SCHEDULE_SECS
        .iter()
        .map(|secs| Duration::from_secs(*secs))
        .collect(),
      max_retries: None,
    }
  }
}

impl RetryPolicy {
  /// Build a policy from an explicit schedule.
  ///
  /// Entries smaller than their predecessor are raised to it, so the
  /// resulting schedule never decreases. An empty schedule falls back to the
  /// default one.
  pub fn new(schedule: Vec<Duration>, max_retries: Option<u32>) -> Self {
    if schedule.is_empty() {
      return Self {
        max_retries,
        ..Self::default()
      };
    }

    let mut floor = Duration::ZERO;
    let schedule = schedule
      .into_iter()
      .map(|delay| {
        floor = floor.max(delay);
        floor
      })
      .collect();

    Self { schedule, max_retries }
  }

  /// Same schedule with a different retry bound.
  #[must_use]
  pub fn with_max_retries(mut self, max_retries: Option<u32>) -> Self {
    self.max_retries = max_retries;
    self
  }

  pub fn schedule(&self) -> &[Duration] {
    &self.schedule
  }

  /// `None` means retry forever.
  pub fn max_retries(&self) -> Option<u32> {
    self.max_retries
  }

  /// Pause before retry number `attempt + 1` (`attempt` counts from 0).
  pub fn delay_for(&self, attempt: u32) -> Duration {
    let index = usize::try_from(attempt).unwrap_or(usize::MAX);
    self
      .schedule
      .get(index)
      .or_else(|| self.schedule.last())
      .copied()
      .unwrap_or_default()
  }

  /// Whether another retry is allowed after `retries_so_far` retries.
  pub fn allows_retry(&self, retries_so_far: u32) -> bool {
    self.max_retries.is_none_or(|max| retries_so_far < max)
  }
}

/// Something that can pause the loop.
#[async_trait]
pub trait Sleeper: Send + Sync {
  async fn sleep(&self, duration: Duration);
}

/// Sleeps on the tokio timer.
#[derive(Debug, Default, Clone, Copy)]
pub struct TokioSleeper;

#[async_trait]
impl Sleeper for TokioSleeper {
  async fn sleep(&self, duration: Duration) {
    tokio::time::sleep(duration).await;
  }
}

/// Outcome of a completed download loop.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DownloadReport {
  /// Totals from the attempt that completed.
  pub summary: DownloadSummary,
  /// Number of retries after transient failures.
  pub retries: u32,
  /// Pauses taken before each retry, in order.
  pub waits: Vec<Duration>,
}

/// Create the destination directory and check that files can be written in it.
///
/// # Errors
/// Returns a permanent [`InstagramError::Io`] when the directory cannot be
/// created or written to.
pub async fn prepare_destination(path: &Path) -> Result<(), InstagramError> {
  tokio::fs::create_dir_all(path)
    .await
    .map_err(|err| InstagramError::io("failed to create destination", path, err))?;

  let marker = path.join(WRITE_TEST_FILE);
  tokio::fs::write(&marker, b"")
    .await
    .map_err(|err| InstagramError::io("destination is not writable", path, err))?;
  tokio::fs::remove_file(&marker)
    .await
    .map_err(|err| InstagramError::io("failed to clean up", &marker, err))?;

  debug!("Destination {} is writable", path.display());
  Ok(())
}

/// Drive `download_profile` to completion.
///
/// Transient failures are retried after [`RetryPolicy::delay_for`]; any other
/// failure is returned as-is without a retry.
pub async fn run_download_loop(
  api: &dyn InstagramApi,
  session: &Session,
  request: &ProfileRequest,
  policy: &RetryPolicy,
  sleeper: &dyn Sleeper,
) -> Result<DownloadReport, InstagramError> {
  let mut retries: u32 = 0;
  let mut waits = Vec::new();

  loop {
    debug!(
      "Download attempt {} for {} (fast update: {})",
      retries + 1,
      request.profile,
      request.fast_update
    );

    match api.download_profile(session, request).await {
      Ok(summary) => {
        info!(
          "Finished {} after {} {}",
          request.profile,
          retries,
          if retries == 1 { "retry" } else { "retries" }
        );
        return Ok(DownloadReport {
          summary,
          retries,
          waits,
        });
      }
      Err(err) if err.is_transient() => {
        if !policy.allows_retry(retries) {
          warn!("Giving up after {retries} retries: {err}");
          return Err(err);
        }

        let delay = policy.delay_for(retries);
        warn!("{err}; retrying in {}s", delay.as_secs());
        sleeper.sleep(delay).await;
        waits.push(delay);
        retries += 1;
      }
      Err(err) => return Err(err),
    }
  }
}
