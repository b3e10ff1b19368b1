//! Test fixtures for Instagram responses and download results
//!
//! Post nodes follow the shape of the web timeline API.

use instagram_dl::instagram::{DownloadSummary, PostNode, ProfileInfo};
use serde_json::json;

pub fn profile_info(username: &str) -> ProfileInfo {
  ProfileInfo {
    id: "1784123".to_string(),
    username: username.to_string(),
    full_name: Some("Test Account".to_string()),
    is_private: username.starts_with("priv"),
    media_count: 3,
  }
}

/// Result of a download that wrote every post of a three post profile.
pub fn complete_summary(username: &str) -> DownloadSummary {
  DownloadSummary {
    profile: profile_info(username),
    posts_downloaded: 3,
    posts_already_present: 0,
    videos_skipped: 0,
    posts_failed: 0,
    images_written: 4,
    stopped_early: false,
  }
}

/// Single-image post with three renditions.
pub fn image_post() -> PostNode {
  serde_json::from_value(json!({
    "__typename": "GraphImage",
    "id": "3101",
    "shortcode": "CxImg01",
    "is_video": false,
    "display_url": "https://scontent.cdninstagram.com/v/t51/3101_n.jpg?stp=dst-jpg_e35",
    "display_resources": [
      { "src": "https://scontent.cdninstagram.com/v/t51/3101_640.jpg", "config_width": 640, "config_height": 800 },
      { "src": "https://scontent.cdninstagram.com/v/t51/3101_1080.jpg", "config_width": 1080, "config_height": 1350 },
      { "src": "https://scontent.cdninstagram.com/v/t51/3101_750.jpg", "config_width": 750, "config_height": 937 }
    ],
    "taken_at_timestamp": 1700000000
  }))
  .expect("valid image post")
}

/// Carousel with two images and one video.
pub fn sidecar_post() -> PostNode {
  serde_json::from_value(json!({
    "__typename": "GraphSidecar",
    "id": "3102",
    "shortcode": "CxSide02",
    "is_video": false,
    "display_url": "https://scontent.cdninstagram.com/v/t51/3102_cover.jpg",
    "taken_at_timestamp": 1700003600,
    "edge_sidecar_to_children": {
      "edges": [
        { "node": { "is_video": false, "display_url": "https://scontent.cdninstagram.com/v/t51/3102_a.jpg" } },
        { "node": { "is_video": true, "display_url": "https://scontent.cdninstagram.com/v/t51/3102_b.jpg" } },
        { "node": { "is_video": false, "display_url": "https://scontent.cdninstagram.com/v/t51/3102_c.webp" } }
      ]
    }
  }))
  .expect("valid sidecar post")
}

/// Reel with only a video.
pub fn video_post() -> PostNode {
  serde_json::from_value(json!({
    "__typename": "GraphVideo",
    "id": "3103",
    "shortcode": "CxVid03",
    "is_video": true,
    "display_url": "https://scontent.cdninstagram.com/v/t51/3103_thumb.jpg",
    "taken_at_timestamp": 1700007200
  }))
  .expect("valid video post")
}
