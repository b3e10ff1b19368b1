//! Profile download command.
//!
//! Authenticates, prepares the destination and runs the download loop, then
//! reports the outcome and maps failures to exit codes.

use std::path::Path;
use std::process;

use crate::auth::{AuthMethod, Authenticator, CredentialPrompt, TerminalPrompt};
use crate::cli::Cli;
use crate::color::ColorScheme;
use crate::download::{
  DownloadReport, ProfileRequest, RetryPolicy, Sleeper, TokioSleeper, prepare_destination, run_download_loop,
};
use crate::instagram::{ErrorKind, InstagramApi, InstagramClient, InstagramError};

/// Exit code for failures other than authentication.
pub const EXIT_FAILURE: i32 = 1;
/// Exit code for rejected credentials or sessions.
pub const EXIT_AUTH_FAILURE: i32 = 2;

/// Authenticate, then download `request.profile` until done.
///
/// An authentication failure returns before the destination is touched or
/// the download loop is entered.
///
/// # Arguments
/// * `api` - Instagram client used for both login and download.
/// * `prompt` - Source of password and 2FA code for interactive logins.
/// * `session_dir` - Where an interactive login saves its session file.
/// * `method` - Selected authentication method.
/// * `request` - Profile, destination and flags for the download.
/// * `policy` - Backoff schedule and retry bound.
/// * `sleeper` - Performs the backoff pauses.
pub async fn sync_profile(
  api: &dyn InstagramApi,
  prompt: &dyn CredentialPrompt,
  session_dir: &Path,
  method: &AuthMethod,
  request: &ProfileRequest,
  policy: &RetryPolicy,
  sleeper: &dyn Sleeper,
) -> Result<DownloadReport, InstagramError> {
  let session = Authenticator::new(api, prompt, session_dir)
    .authenticate(method)
    .await?;

  prepare_destination(&request.destination).await?;

  run_download_loop(api, &session, request, policy, sleeper).await
}

/// Process exit code for a failed run.
pub fn exit_code(err: &InstagramError) -> i32 {
  match err.kind() {
    ErrorKind::Auth => EXIT_AUTH_FAILURE,
    ErrorKind::Permanent | ErrorKind::Transient => EXIT_FAILURE,
  }
}

/// Handle profile download
pub(crate) async fn handle_profile_download(profile: &str, cli: &Cli, colors: &ColorScheme) {
  let request = cli.profile_request(profile);
  let policy = cli.retry_policy();

  let method = match cli.auth_method() {
    Ok(method) => method,
    Err(e) => {
      eprintln!("{} {}", colors.error("Error:"), e);
      process::exit(4);
    }
  };

  if !cli.behavior.quiet {
    println!("{} {}", colors.progress("→"), colors.info("Downloading profile"));
    println!(
      "  {}: {}",
      colors.emphasis("Profile"),
      colors.link(format!("https://www.instagram.com/{profile}/"))
    );
    println!(
      "  {}: {}",
      colors.emphasis("Destination"),
      colors.path(request.destination.display())
    );
    println!("  {}: {}", colors.emphasis("Authentication"), method);

    if request.fast_update {
      println!(
        "  {} {}",
        colors.success("✓"),
        colors.info("Fast update: stopping at the first downloaded post")
      );
    }
    if let Some(max) = policy.max_retries() {
      println!("  {}: {}", colors.emphasis("Max retries"), colors.number(max));
    }
  }

  let client = match InstagramClient::new(cli.performance.timeout, cli.request_interval()) {
    Ok(client) => client,
    Err(e) => {
      eprintln!(
        "{} {}",
        colors.error("✗"),
        colors.error("Failed to create Instagram client")
      );
      eprintln!("  {e:#}");
      process::exit(EXIT_FAILURE);
    }
  };
  let prompt = TerminalPrompt::new();

  let result = sync_profile(
    &client,
    &prompt,
    Path::new("."),
    &method,
    &request,
    &policy,
    &TokioSleeper,
  )
  .await;

  match result {
    Ok(report) => {
      if !cli.behavior.quiet {
        print_report(&report, &request, colors);
      }
    }
    Err(err) => {
      print_failure(&err, &method, colors);
      process::exit(exit_code(&err));
    }
  }
}

fn print_report(report: &DownloadReport, request: &ProfileRequest, colors: &ColorScheme) {
  let summary = &report.summary;

  println!("\n{} {}", colors.success("✓"), colors.success("Download complete"));
  println!(
    "  {}: {} ({} {})",
    colors.emphasis("Posts downloaded"),
    colors.number(summary.posts_downloaded),
    colors.number(summary.images_written),
    if summary.images_written == 1 { "image" } else { "images" }
  );
  println!(
    "  {}: {}",
    colors.emphasis("Already present"),
    colors.number(summary.posts_already_present)
  );
  if summary.videos_skipped > 0 {
    println!(
      "  {}: {}",
      colors.dimmed("Videos skipped"),
      colors.number(summary.videos_skipped)
    );
  }
  if summary.posts_failed > 0 {
    println!(
      "  {}: {} {}",
      colors.error("Posts that could not be saved"),
      colors.number(summary.posts_failed),
      colors.dimmed("(see the warnings above; a rerun tries them again)")
    );
  }
  if report.retries > 0 {
    println!(
      "  {}: {}",
      colors.dimmed("Retries after rate limits or connection errors"),
      colors.number(report.retries)
    );
  }
  if summary.stopped_early {
    println!("  {}", colors.dimmed("Stopped at the first post already downloaded"));
  }
  println!(
    "  {}: {}",
    colors.emphasis("Files saved in"),
    colors.path(request.destination.display())
  );
}

fn print_failure(err: &InstagramError, method: &AuthMethod, colors: &ColorScheme) {
  let headline = match err.kind() {
    ErrorKind::Auth => "Authentication failed",
    ErrorKind::Permanent => "Download failed",
    ErrorKind::Transient => "Download gave up after repeated retries",
  };

  eprintln!("\n{} {}", colors.error("✗"), colors.error(headline));
  eprintln!("  {}: {}", colors.emphasis("Error"), err);

  match (err, method) {
    (InstagramError::ProfilePrivate(_), AuthMethod::Anonymous) => {
      eprintln!(
        "\n{} Private profiles need a login from an account that follows them:",
        colors.info("ℹ")
      );
      eprintln!("  instagram-dl --login YOUR_USERNAME PROFILE");
    }
    (_, AuthMethod::SessionId(_)) if err.kind() == ErrorKind::Auth => {
      eprintln!(
        "\n{} The sessionid cookie may have expired; copy a fresh one from the browser.",
        colors.info("ℹ")
      );
    }
    (_, AuthMethod::SessionFile(_)) if err.kind() == ErrorKind::Auth => {
      eprintln!(
        "\n{} Run with --login to create a new session file.",
        colors.info("ℹ")
      );
    }
    _ => {}
  }
}
