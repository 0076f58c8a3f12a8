//! Supervised WebSocket connection to the per-video comment endpoint.
//!
//! The connection runs in a background tokio task. Commands go in, push
//! notifications and state transitions come out. Transient disconnects are
//! retried with exponential backoff up to a bounded number of consecutive
//! failures; a successful connect resets the counter.

use std::time::Duration;

use futures::{SinkExt, StreamExt};
use tokio::sync::mpsc;
use tokio_tungstenite::{connect_async, tungstenite::Message};
use tracing::{debug, info, warn};
use url::Url;

use viewcast_shared::constants::{
    CHANNEL_CAPACITY, DEFAULT_LIVE_BACKOFF_MAX_MS, DEFAULT_LIVE_BACKOFF_MS,
    DEFAULT_LIVE_MAX_RETRIES, DEFAULT_WS_BASE,
};
use viewcast_shared::protocol::LiveMessage;
use viewcast_shared::types::{ConnectionState, VideoId};

use crate::backoff::Backoff;
use crate::error::LiveError;

// ---------------------------------------------------------------------------
// Command / notification types
// ---------------------------------------------------------------------------

/// Commands sent *into* the live channel task.
#[derive(Debug)]
pub enum LiveCommand {
    /// Send a frame to the server. Dropped with a debug log if the
    /// connection is not currently open.
    Publish(LiveMessage),
    /// Close the socket and end the task.
    Shutdown,
}

/// Notifications sent *from* the live channel task.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LiveNotification {
    /// An inbound push event.
    Push(LiveMessage),
    /// The connection state changed.
    StateChanged(ConnectionState),
}

/// Configuration for the live channel.
#[derive(Debug, Clone)]
pub struct LiveConfig {
    /// Base URL of the WebSocket host, e.g. `ws://127.0.0.1:8000`.
    pub ws_base: String,
    /// Consecutive failed connection attempts tolerated before `Errored`.
    pub max_retries: u32,
    /// First reconnect delay; doubles per consecutive failure.
    pub initial_backoff: Duration,
    /// Upper bound on the reconnect delay.
    pub max_backoff: Duration,
}

impl Default for LiveConfig {
    fn default() -> Self {
        Self {
            ws_base: DEFAULT_WS_BASE.to_string(),
            max_retries: DEFAULT_LIVE_MAX_RETRIES,
            initial_backoff: Duration::from_millis(DEFAULT_LIVE_BACKOFF_MS),
            max_backoff: Duration::from_millis(DEFAULT_LIVE_BACKOFF_MAX_MS),
        }
    }
}

impl LiveConfig {
    /// Endpoint URL for one video's comment channel.
    pub fn endpoint(&self, video_id: VideoId) -> Result<Url, LiveError> {
        let raw = format!(
            "{}/ws/comments/{}/",
            self.ws_base.trim_end_matches('/'),
            video_id
        );
        let url = Url::parse(&raw).map_err(|source| LiveError::InvalidUrl {
            url: raw.clone(),
            source,
        })?;
        if url.scheme() != "ws" && url.scheme() != "wss" {
            return Err(LiveError::NotWebSocket { url: raw });
        }
        Ok(url)
    }
}

// ---------------------------------------------------------------------------
// Task
// ---------------------------------------------------------------------------

/// Why the connected inner loop ended.
enum Disconnect {
    /// Explicit shutdown was requested.
    Shutdown,
    /// The transport failed or the server closed the socket.
    Lost,
}

/// Spawn the live channel for one video in a background tokio task.
///
/// Returns the command sender and notification receiver. The task ends
/// when [`LiveCommand::Shutdown`] arrives, when all command senders are
/// dropped, or when the reconnect budget is exhausted.
pub fn spawn_live_channel(
    config: &LiveConfig,
    video_id: VideoId,
) -> Result<(mpsc::Sender<LiveCommand>, mpsc::Receiver<LiveNotification>), LiveError> {
    let url = config.endpoint(video_id)?;
    let backoff = Backoff::new(config.initial_backoff, config.max_backoff);
    let max_retries = config.max_retries;

    let (cmd_tx, mut cmd_rx) = mpsc::channel::<LiveCommand>(CHANNEL_CAPACITY);
    let (notif_tx, notif_rx) = mpsc::channel::<LiveNotification>(CHANNEL_CAPACITY);

    tokio::spawn(async move {
        let mut state: Option<ConnectionState> = None;
        let mut failures: u32 = 0;

        'supervisor: loop {
            set_state(&notif_tx, &mut state, ConnectionState::Connecting).await;

            match connect_async(url.as_str()).await {
                Ok((mut ws, _response)) => {
                    failures = 0;
                    info!(url = %url, "Live channel connected");
                    set_state(&notif_tx, &mut state, ConnectionState::Open).await;

                    match run_connected(&mut ws, &mut cmd_rx, &notif_tx).await {
                        Disconnect::Shutdown => {
                            let _ = ws.send(Message::Close(None)).await;
                            set_state(&notif_tx, &mut state, ConnectionState::Closed).await;
                            break 'supervisor;
                        }
                        Disconnect::Lost => {
                            warn!(url = %url, "Live channel connection lost");
                        }
                    }
                }
                Err(e) => {
                    warn!(url = %url, error = %e, "Live channel connect failed");
                }
            }

            failures += 1;
            if failures >= max_retries {
                warn!(
                    url = %url,
                    attempts = failures,
                    "Live channel reconnect budget exhausted"
                );
                set_state(&notif_tx, &mut state, ConnectionState::Errored).await;
                // Keep draining commands so publishers see a closed-over
                // channel only after explicit shutdown.
                while let Some(cmd) = cmd_rx.recv().await {
                    match cmd {
                        LiveCommand::Shutdown => {
                            set_state(&notif_tx, &mut state, ConnectionState::Closed).await;
                            break;
                        }
                        LiveCommand::Publish(_) => {
                            debug!("Dropping publish on errored live channel")
                        }
                    }
                }
                break 'supervisor;
            }

            let delay = backoff.delay(failures);
            debug!(attempt = failures, delay_ms = delay.as_millis() as u64, "Reconnecting");
            if wait_for_retry(delay, &mut cmd_rx).await {
                set_state(&notif_tx, &mut state, ConnectionState::Closed).await;
                break 'supervisor;
            }
        }

        info!("Live channel task terminated");
    });

    Ok((cmd_tx, notif_rx))
}

/// Drive one established connection. Returns how it ended.
async fn run_connected(
    ws: &mut (impl futures::Stream<Item = Result<Message, tokio_tungstenite::tungstenite::Error>>
          + futures::Sink<Message, Error = tokio_tungstenite::tungstenite::Error>
          + Unpin),
    cmd_rx: &mut mpsc::Receiver<LiveCommand>,
    notif_tx: &mpsc::Sender<LiveNotification>,
) -> Disconnect {
    loop {
        tokio::select! {
            // --- Incoming commands ---
            cmd = cmd_rx.recv() => {
                match cmd {
                    Some(LiveCommand::Publish(msg)) => {
                        let json = match msg.to_json() {
                            Ok(json) => json,
                            Err(e) => {
                                warn!(error = %e, "Failed to encode live frame");
                                continue;
                            }
                        };
                        if let Err(e) = ws.send(Message::Text(json)).await {
                            warn!(error = %e, "Publish failed, reconnecting");
                            return Disconnect::Lost;
                        }
                    }
                    Some(LiveCommand::Shutdown) | None => return Disconnect::Shutdown,
                }
            }

            // --- Socket frames ---
            frame = ws.next() => {
                match frame {
                    Some(Ok(Message::Text(text))) => {
                        match LiveMessage::from_json(&text) {
                            Ok(msg) => {
                                let _ = notif_tx.send(LiveNotification::Push(msg)).await;
                            }
                            // Unknown frame types never tear down the channel.
                            Err(e) => debug!(error = %e, "Ignoring unrecognized frame"),
                        }
                    }
                    Some(Ok(Message::Close(_))) | None => return Disconnect::Lost,
                    Some(Ok(_)) => {} // ping/pong/binary
                    Some(Err(e)) => {
                        warn!(error = %e, "Live channel read error");
                        return Disconnect::Lost;
                    }
                }
            }
        }
    }
}

/// Sleep out the backoff delay while staying responsive to shutdown.
/// Returns `true` if shutdown was requested during the wait.
async fn wait_for_retry(delay: Duration, cmd_rx: &mut mpsc::Receiver<LiveCommand>) -> bool {
    let sleep = tokio::time::sleep(delay);
    tokio::pin!(sleep);
    loop {
        tokio::select! {
            _ = &mut sleep => return false,
            cmd = cmd_rx.recv() => match cmd {
                Some(LiveCommand::Shutdown) | None => return true,
                Some(LiveCommand::Publish(_)) => {
                    debug!("Dropping publish while disconnected");
                }
            },
        }
    }
}

async fn set_state(
    notif_tx: &mpsc::Sender<LiveNotification>,
    current: &mut Option<ConnectionState>,
    next: ConnectionState,
) {
    if *current != Some(next) {
        *current = Some(next);
        let _ = notif_tx
            .send(LiveNotification::StateChanged(next))
            .await;
    }
}
