//! Follow the live comment stream of one video from the terminal.
//!
//! ```sh
//! VIEWCAST_USERNAME=alice VIEWCAST_PASSWORD=secret \
//!     cargo run --example watch_comments -- 1
//! ```

use anyhow::Context;
use tracing::info;
use tracing_subscriber::EnvFilter;

use viewcast_client::{ApiClient, ClientConfig, CommentStream, CommentStreamEvent};
use viewcast_shared::types::VideoId;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()))
        .init();

    let video_id = std::env::args()
        .nth(1)
        .map(|arg| arg.parse::<u64>())
        .transpose()
        .context("video id must be a number")?
        .map(VideoId)
        .unwrap_or(VideoId(1));

    let username = std::env::var("VIEWCAST_USERNAME").context("VIEWCAST_USERNAME not set")?;
    let password = std::env::var("VIEWCAST_PASSWORD").context("VIEWCAST_PASSWORD not set")?;

    let config = ClientConfig::from_env();
    let api = ApiClient::new(&config);
    let session = api.login(&username, &password).await?;
    let identity = session.into_identity();

    info!(video = %video_id, user = %identity.username, "Watching comments");
    let (handle, mut events) = CommentStream::spawn(&config, identity, video_id)?;

    while let Some(event) = events.recv().await {
        match event {
            CommentStreamEvent::HistoryLoaded { count, .. } => {
                println!("-- {count} earlier comments --");
                for comment in handle.snapshot().await? {
                    println!("[{}] {}", comment.user, comment.text);
                }
            }
            CommentStreamEvent::CommentAdded(comment) => {
                println!("[{}] {}", comment.user, comment.text);
            }
            CommentStreamEvent::CommentConfirmed { comment, .. } => {
                println!("(saved as #{})", comment.id);
            }
            CommentStreamEvent::CommentDeleted(id) => {
                println!("(comment {id} deleted)");
            }
            CommentStreamEvent::ConnectionChanged(state) => {
                println!("-- live channel: {state} --");
            }
            CommentStreamEvent::Error(message) => {
                eprintln!("error: {message}");
            }
        }
    }

    Ok(())
}
