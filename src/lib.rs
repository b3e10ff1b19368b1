//! Instagram profile downloader library
//!
//! Authenticates against Instagram (session file, sessionid cookie,
//! interactive login or none) and downloads the images of a profile, retrying
//! with growing pauses when Instagram rate limits or the connection drops.

pub mod auth;
pub mod cli;
pub mod color;
pub mod commands;
pub mod download;
pub mod instagram;
