//! Stubbed Instagram web API for client tests
//!
//! Builds the JSON documents the real endpoints return and mounts them on a
//! `wiremock` server, so `InstagramClient` can be driven end to end without
//! network access.

use serde_json::{Value, json};
use wiremock::matchers::{method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

pub const PROFILE_ID: &str = "1784123";

/// Bytes served for every image.
pub const IMAGE_BYTES: &[u8] = b"\xff\xd8\xff\xe0 jpeg";

/// Single-image post whose image is served at `/media/<id>.jpg`.
pub fn image_node(server: &MockServer, id: &str, shortcode: &str, taken_at: i64) -> Value {
  json!({
    "__typename": "GraphImage",
    "id": id,
    "shortcode": shortcode,
    "is_video": false,
    "display_url": format!("{}/media/{id}.jpg", server.uri()),
    "taken_at_timestamp": taken_at
  })
}

pub fn video_node(server: &MockServer, id: &str, shortcode: &str, taken_at: i64) -> Value {
  json!({
    "__typename": "GraphVideo",
    "id": id,
    "shortcode": shortcode,
    "is_video": true,
    "display_url": format!("{}/media/{id}_thumb.jpg", server.uri()),
    "taken_at_timestamp": taken_at
  })
}

fn timeline(nodes: Vec<Value>, next_cursor: Option<&str>, count: usize) -> Value {
  json!({
    "count": count,
    "page_info": {
      "has_next_page": next_cursor.is_some(),
      "end_cursor": next_cursor
    },
    "edges": nodes.into_iter().map(|node| json!({ "node": node })).collect::<Vec<_>>()
  })
}

/// Options for the profile served by [`mount_profile`].
pub struct ProfilePage {
  pub username: &'static str,
  pub is_private: bool,
  pub followed_by_viewer: bool,
  pub nodes: Vec<Value>,
  pub next_cursor: Option<&'static str>,
}

impl ProfilePage {
  pub fn public(username: &'static str, nodes: Vec<Value>) -> Self {
    Self {
      username,
      is_private: false,
      followed_by_viewer: false,
      nodes,
      next_cursor: None,
    }
  }
}

pub async fn mount_profile(server: &MockServer, page: ProfilePage) {
  let count = page.nodes.len();
  let body = json!({
    "data": {
      "user": {
        "id": PROFILE_ID,
        "username": page.username,
        "full_name": "Test Account",
        "is_private": page.is_private,
        "followed_by_viewer": page.followed_by_viewer,
        "edge_owner_to_timeline_media": timeline(page.nodes, page.next_cursor, count)
      }
    },
    "status": "ok"
  });

  Mock::given(method("GET"))
    .and(path("/api/v1/users/web_profile_info/"))
    .and(query_param("username", page.username))
    .respond_with(ResponseTemplate::new(200).set_body_json(body))
    .mount(server)
    .await;
}

/// Serve one further timeline page for every pagination request.
pub async fn mount_timeline_page(server: &MockServer, nodes: Vec<Value>) {
  let count = nodes.len();
  let body = json!({
    "data": {
      "user": {
        "edge_owner_to_timeline_media": timeline(nodes, None, count)
      }
    },
    "status": "ok"
  });

  Mock::given(method("GET"))
    .and(path("/graphql/query/"))
    .respond_with(ResponseTemplate::new(200).set_body_json(body))
    .mount(server)
    .await;
}

/// Serve `/media/<id>.jpg` with [`IMAGE_BYTES`].
pub async fn mount_image(server: &MockServer, id: &str) {
  Mock::given(method("GET"))
    .and(path(format!("/media/{id}.jpg")))
    .respond_with(ResponseTemplate::new(200).set_body_bytes(IMAGE_BYTES))
    .mount(server)
    .await;
}

/// Serve `/media/<id>.jpg` with an error status. `times` limits how often;
/// mount it before [`mount_image`] to fail only the first requests.
pub async fn mount_image_error(server: &MockServer, id: &str, status: u16, times: Option<u64>) {
  let mock = Mock::given(method("GET"))
    .and(path(format!("/media/{id}.jpg")))
    .respond_with(ResponseTemplate::new(status));
  let mock = match times {
    Some(times) => mock.up_to_n_times(times),
    None => mock,
  };
  mock.mount(server).await;
}

/// Fail the test if `/media/<id>.jpg` is requested at all.
pub async fn forbid_image(server: &MockServer, id: &str) {
  Mock::given(method("GET"))
    .and(path(format!("/media/{id}.jpg")))
    .respond_with(ResponseTemplate::new(200).set_body_bytes(IMAGE_BYTES))
    .expect(0)
    .mount(server)
    .await;
}
