//! instagram-dl - Download the images of an Instagram profile
//!
//! This is the main entry point for the CLI application.

#[tokio::main(flavor = "current_thread")]
async fn main() {
  instagram_dl::cli::run().await;
}
