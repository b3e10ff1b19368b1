//! Command-line interface definitions for instagram-dl.
//!
//! This module defines the CLI structure using clap derives and turns the
//! parsed options into the authentication method, download request and retry
//! policy used by the download command.

use std::path::PathBuf;
use std::process;
use std::time::Duration;

use clap::{Parser, Subcommand, ValueEnum};
use tracing_subscriber::EnvFilter;
use tracing_subscriber::filter::LevelFilter;

use crate::auth::{AuthMethod, ConfigError};
use crate::color::ColorScheme;
use crate::commands::completions::handle_completions_command;
use crate::commands::download::handle_profile_download;
use crate::commands::version::handle_version_command;
use crate::download::{ProfileRequest, RetryPolicy};

/// Longest username Instagram accepts.
const MAX_USERNAME_LEN: usize = 30;

/// instagram-dl - Download the images of an Instagram profile
#[derive(Debug, Parser)]
#[command(
  name = "instagram-dl",
  version,
  about = "Download the images of an Instagram profile",
  long_about = "A command-line tool for downloading every image of an Instagram profile.\n\
                Rides out rate limits with growing pauses and can resume incrementally with --fast-update.",
  styles = get_clap_styles()
)]
pub struct Cli {
  /// Username of the profile to download
  #[arg(value_name = "PROFILE")]
  pub profile: Option<String>,

  /// Subcommand to execute
  #[command(subcommand)]
  pub command: Option<Command>,

  /// Authentication options
  #[command(flatten)]
  pub auth: AuthOptions,

  /// Output options
  #[command(flatten)]
  pub output: OutputOptions,

  /// Behavior options
  #[command(flatten)]
  pub behavior: BehaviorOptions,

  /// Performance options
  #[command(flatten)]
  pub performance: PerformanceOptions,
}

/// Auxiliary subcommands
#[derive(Debug, Subcommand)]
pub enum Command {
  /// Display version and build information
  Version {
    /// Output in JSON format
    #[arg(long)]
    json: bool,

    /// Show only version number
    #[arg(long)]
    short: bool,
  },

  /// Generate shell completion scripts
  Completions {
    /// Target shell for completions
    #[arg(value_enum)]
    shell: Shell,
  },
}

/// Shells supported by `instagram-dl completions`
#[derive(Debug, Clone, Copy, ValueEnum)]
pub enum Shell {
  Bash,
  Zsh,
  Fish,
  Powershell,
  Elvish,
}

/// Authentication options (at most one may be given)
#[derive(Debug, Parser)]
pub struct AuthOptions {
  /// Log in interactively as this account and save the session
  #[arg(long, value_name = "USERNAME")]
  pub login: Option<String>,

  /// Load a session saved by an earlier --login
  #[arg(long, value_name = "PATH")]
  pub session_file: Option<PathBuf>,

  /// Authenticate with a sessionid cookie copied from a browser
  #[arg(long, env = "INSTAGRAM_SESSIONID", hide_env_values = true, value_name = "COOKIE")]
  pub sessionid: Option<String>,
}

/// Output options
#[derive(Debug, Parser)]
pub struct OutputOptions {
  /// Output directory (defaults to the profile username)
  #[arg(long, value_name = "DIR")]
  pub dest: Option<PathBuf>,

  /// Stop at the first post that is already downloaded
  #[arg(long)]
  pub fast_update: bool,

  /// Do not write a JSON metadata file per post
  #[arg(long)]
  pub no_metadata: bool,
}

/// Behavior options
#[derive(Debug, Parser)]
pub struct BehaviorOptions {
  /// Increase verbosity (-v info, -vv debug, -vvv trace)
  #[arg(short, long, action = clap::ArgAction::Count)]
  pub verbose: u8,

  /// Suppress all output except errors
  #[arg(short, long, conflicts_with = "verbose")]
  pub quiet: bool,

  /// Colorize output
  #[arg(long, value_enum, default_value = "auto", value_name = "WHEN")]
  pub color: ColorOption,
}

/// Color output options
#[derive(Debug, Clone, Copy, ValueEnum)]
pub enum ColorOption {
  Auto,
  Always,
  Never,
}

/// Performance options
#[derive(Debug, Parser)]
pub struct PerformanceOptions {
  /// Pause after each downloaded post, in seconds
  #[arg(long, default_value = "5", value_name = "SECONDS")]
  pub request_interval: f64,

  /// Request timeout in seconds
  #[arg(long, default_value = "30", value_name = "SECONDS")]
  pub timeout: u64,

  /// Give up after this many retries (default: retry forever)
  #[arg(long, value_name = "N")]
  pub max_retries: Option<u32>,
}

impl Cli {
  /// Parse CLI arguments from the environment
  pub fn parse_args() -> Self {
    let mut cli = Self::parse();

    // Accept "@name" the way profiles are usually written
    if let Some(profile) = &cli.profile {
      cli.profile = Some(profile.trim().trim_start_matches('@').to_string());
    }

    cli
  }

  /// Validate CLI arguments
  ///
  /// Returns an error if the CLI configuration is invalid.
  pub fn validate(&self) -> Result<(), String> {
    if self.profile.is_none() && self.command.is_none() {
      return Err("Either provide a profile username or use a subcommand".to_string());
    }

    if let Some(ref profile) = self.profile {
      validate_username(profile)?;
    }

    self.auth_method().map_err(|e| e.to_string())?;

    if !self.performance.request_interval.is_finite() || self.performance.request_interval < 0.0 {
      return Err("--request-interval must be a non-negative number of seconds".to_string());
    }

    if self.performance.timeout == 0 {
      return Err("--timeout must be at least 1 second".to_string());
    }

    Ok(())
  }

  /// The authentication method selected by the auth options.
  pub fn auth_method(&self) -> Result<AuthMethod, ConfigError> {
    AuthMethod::from_options(
      self.auth.login.as_deref(),
      self.auth.session_file.as_deref(),
      self.auth.sessionid.as_deref(),
    )
  }

  /// Directory that receives the download: `--dest`, or the profile name.
  pub fn destination(&self, profile: &str) -> PathBuf {
    self.output.dest.clone().unwrap_or_else(|| PathBuf::from(profile))
  }

  /// Build the download request for `profile`.
  pub fn profile_request(&self, profile: &str) -> ProfileRequest {
    ProfileRequest {
      profile: profile.to_string(),
      destination: self.destination(profile),
      fast_update: self.output.fast_update,
      save_metadata: !self.output.no_metadata,
    }
  }

  pub fn retry_policy(&self) -> RetryPolicy {
    RetryPolicy::default().with_max_retries(self.performance.max_retries)
  }

  pub fn request_interval(&self) -> Duration {
    Duration::try_from_secs_f64(self.performance.request_interval).unwrap_or_default()
  }
}

/// Check that `username` looks like an Instagram username.
///
/// The default destination is derived from it, so path separators and other
/// punctuation are rejected up front.
fn validate_username(username: &str) -> Result<(), String> {
  if username.is_empty() {
    return Err("Profile username must not be empty".to_string());
  }

  if username.len() > MAX_USERNAME_LEN {
    return Err(format!(
      "Profile username must be at most {MAX_USERNAME_LEN} characters: {username}"
    ));
  }

  if !username
    .chars()
    .all(|c| c.is_ascii_alphanumeric() || c == '.' || c == '_')
  {
    return Err(format!(
      "Profile username may only contain letters, digits, '.' and '_': {username}"
    ));
  }

  if username.chars().all(|c| c == '.') {
    return Err(format!("Invalid profile username: {username}"));
  }

  Ok(())
}

/// Parse CLI arguments, initialize shared services, and dispatch to the chosen
/// command.
pub async fn run() {
  let cli = Cli::parse_args();

  init_tracing(&cli.behavior);

  // Create color scheme based on user preference
  let colors = ColorScheme::new(cli.behavior.color);

  // Validate CLI arguments
  if let Err(e) = cli.validate() {
    eprintln!("{} {}", colors.error("Error:"), e);
    process::exit(4); // Invalid arguments exit code
  }

  // Handle subcommands
  if let Some(ref command) = cli.command {
    match command {
      Command::Version { json, short } => {
        handle_version_command(*json, *short, &colors);
      }
      Command::Completions { shell } => {
        handle_completions_command(*shell);
      }
    }
    return;
  }

  if let Some(ref profile) = cli.profile {
    handle_profile_download(profile, &cli, &colors).await;
  }
}

fn init_tracing(behavior: &BehaviorOptions) {
  let level = if behavior.quiet {
    LevelFilter::ERROR
  } else {
    match behavior.verbose {
      0 => LevelFilter::WARN,
      1 => LevelFilter::INFO,
      2 => LevelFilter::DEBUG,
      _ => LevelFilter::TRACE,
    }
  };

  let env_filter = EnvFilter::builder()
    .with_default_directive(level.into())
    .from_env_lossy();

  let _ = tracing_subscriber::fmt()
    .with_env_filter(env_filter)
    .with_target(false)
    .with_writer(std::io::stderr)
    .try_init();
}

/// Get custom styles for clap help output
fn get_clap_styles() -> clap::builder::Styles {
  use clap::builder::styling::{AnsiColor, Effects};

  clap::builder::Styles::styled()
    .header(AnsiColor::BrightYellow.on_default() | Effects::BOLD)
    .usage(AnsiColor::BrightYellow.on_default() | Effects::BOLD)
    .literal(AnsiColor::BrightGreen.on_default())
    .placeholder(AnsiColor::BrightCyan.on_default())
    .error(AnsiColor::BrightRed.on_default() | Effects::BOLD)
    .valid(AnsiColor::BrightGreen.on_default())
    .invalid(AnsiColor::BrightRed.on_default())
}
