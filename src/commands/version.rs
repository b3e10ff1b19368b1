//! `instagram-dl version` subcommand.
//!
//! Prints the build metadata embedded by `build.rs`, either as colored text or
//! as a JSON document for scripts.

use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::color::ColorScheme;

#[derive(Debug, Serialize)]
struct BuildInfo {
  version: &'static str,
  git_commit: &'static str,
  build_timestamp: String,
  target: &'static str,
  rust_version: &'static str,
}

impl BuildInfo {
  fn current() -> Self {
    Self {
      version: env!("CARGO_PKG_VERSION"),
      git_commit: option_env!("GIT_HASH").unwrap_or("unknown"),
      build_timestamp: format_timestamp(env!("BUILD_TIMESTAMP")),
      target: env!("TARGET"),
      rust_version: env!("RUSTC_VERSION"),
    }
  }
}

/// Render version and build metadata.
///
/// # Arguments
/// * `json` - Emit a JSON document instead of colored text.
/// * `short` - Print only the version number.
/// * `colors` - Palette for the human-readable form.
pub(crate) fn handle_version_command(json: bool, short: bool, colors: &ColorScheme) {
  let info = BuildInfo::current();

  if short {
    println!("{}", info.version);
    return;
  }

  if json {
    match serde_json::to_string_pretty(&info) {
      Ok(doc) => println!("{doc}"),
      Err(e) => eprintln!("{} {}", colors.error("Error:"), e),
    }
    return;
  }

  println!("{} {}", colors.emphasis("instagram-dl"), colors.number(info.version));
  println!("{}: {}", colors.emphasis("Git commit"), colors.dimmed(info.git_commit));
  println!("{}: {}", colors.emphasis("Built"), colors.dimmed(&info.build_timestamp));
  println!("{}: {}", colors.emphasis("Target"), info.target);
  println!("{}: {}", colors.emphasis("Rust version"), info.rust_version);
}

/// Unix epoch seconds as `YYYY-MM-DD HH:MM:SS UTC`, or the input unchanged
/// when it is not a timestamp.
fn format_timestamp(timestamp: &str) -> String {
  timestamp
    .parse::<i64>()
    .ok()
    .and_then(|secs| DateTime::<Utc>::from_timestamp(secs, 0))
    .map(|datetime| datetime.format("%Y-%m-%d %H:%M:%S UTC").to_string())
    .unwrap_or_else(|| timestamp.to_string())
}
