//! Instagram module providing the API abstraction, the HTTP client, data
//! models, session persistence and on-disk naming of downloaded posts.

pub mod api;
pub mod client;
pub mod error;
pub mod models;
pub mod session;
pub mod storage;

pub use api::InstagramApi;
pub use client::InstagramClient;
pub use error::{ErrorKind, InstagramError};
pub use models::{
  DownloadSummary, LoginOutcome, PostNode, ProfileInfo, ProfileRequest, Session, TwoFactorChallenge,
};
pub use session::session_filename;
