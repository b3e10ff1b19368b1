// Each integration test binary uses a different subset of these helpers.
#![allow(dead_code)]

pub mod fake_instagram;
pub mod fixtures;
pub mod web_api;
