//! Live comment session for one video.
//!
//! The session runs in a dedicated tokio task that owns the comment list.
//! Three independent sources mutate it: the initial history fetch, live
//! channel pushes, and user actions (submit, delete). All three are
//! serialized through the task's event loop, so every mutation is a plain
//! append / replace / filter over the current list.
//!
//! Every REST operation is tagged with the video id active when it was
//! issued; a response whose tag no longer matches the active id is
//! discarded, so switching videos mid-flight never applies stale data.

use chrono::Utc;
use tokio::sync::{mpsc, oneshot, watch};
use tracing::{debug, info, warn};

use viewcast_net::{spawn_live_channel, LiveCommand, LiveConfig, LiveNotification};
use viewcast_shared::constants::CHANNEL_CAPACITY;
use viewcast_shared::models::Comment;
use viewcast_shared::protocol::{CommentPush, LiveMessage};
use viewcast_shared::types::{CommentId, ConnectionState, Identity, VideoId};

use crate::api::ApiClient;
use crate::config::ClientConfig;
use crate::error::{ApiError, StreamError};
use crate::events::CommentStreamEvent;

// ---------------------------------------------------------------------------
// Commands and tagged operation results
// ---------------------------------------------------------------------------

#[derive(Debug)]
enum StreamCommand {
    Submit { text: String },
    Delete(CommentId),
    Snapshot(oneshot::Sender<Vec<Comment>>),
    SwitchVideo(VideoId),
    Close,
}

/// Result of a REST operation, tagged with the video id active when the
/// operation was issued.
#[derive(Debug)]
struct TaggedOutcome {
    video_id: VideoId,
    outcome: OpOutcome,
}

#[derive(Debug)]
enum OpOutcome {
    History(Result<Vec<Comment>, ApiError>),
    Created {
        /// Id of the provisional entry rendered at submit time, if the
        /// live channel was open then.
        local_id: Option<CommentId>,
        result: Result<Comment, ApiError>,
    },
    Deleted {
        id: CommentId,
        result: Result<(), ApiError>,
    },
}

// ---------------------------------------------------------------------------
// Public surface
// ---------------------------------------------------------------------------

/// Entry point for live comment sessions.
pub struct CommentStream;

impl CommentStream {
    /// Open a session for one video: one history fetch plus one live
    /// channel, both scoped to `video_id`. The two run independently;
    /// there is no ordering guarantee between the history response and
    /// the first push.
    ///
    /// Returns the command handle and the event receiver.
    pub fn spawn(
        config: &ClientConfig,
        identity: Identity,
        video_id: VideoId,
    ) -> Result<(CommentStreamHandle, mpsc::Receiver<CommentStreamEvent>), StreamError> {
        let live_config = config.live_config();
        let (live_tx, live_rx) = spawn_live_channel(&live_config, video_id)?;

        let (cmd_tx, cmd_rx) = mpsc::channel(CHANNEL_CAPACITY);
        let (events_tx, events_rx) = mpsc::channel(CHANNEL_CAPACITY);
        let (ops_tx, ops_rx) = mpsc::channel(CHANNEL_CAPACITY);
        let (state_tx, state_rx) = watch::channel(ConnectionState::Connecting);

        let handle = CommentStreamHandle {
            cmd_tx,
            state_rx,
            username: identity.username.clone(),
        };

        let task = StreamTask {
            api: ApiClient::new(config),
            live_config,
            identity,
            video_id,
            items: Vec::new(),
            conn: ConnectionState::Connecting,
            live_tx,
            live_rx,
            ops_tx,
            ops_rx,
            events_tx,
            state_tx,
        };
        task.spawn_history_fetch();
        tokio::spawn(task.run(cmd_rx));

        Ok((handle, events_rx))
    }
}

/// Command surface of a running session. Cheap to clone.
#[derive(Debug, Clone)]
pub struct CommentStreamHandle {
    cmd_tx: mpsc::Sender<StreamCommand>,
    state_rx: watch::Receiver<ConnectionState>,
    username: String,
}

impl CommentStreamHandle {
    /// Submit a comment.
    ///
    /// Empty or whitespace-only text is rejected here: no channel
    /// emission, no persistence call, no events. Otherwise the text is
    /// published on the live channel (if open, with one optimistic list
    /// entry) and persisted concurrently; the two effects are independent
    /// and neither rolls back the other.
    pub async fn submit(&self, text: impl Into<String>) -> Result<(), StreamError> {
        let text = text.into();
        if text.trim().is_empty() {
            return Err(StreamError::EmptyDraft);
        }
        self.send(StreamCommand::Submit { text }).await
    }

    /// Delete a comment. On success the entry is removed from the list;
    /// on failure the list is left unchanged and an error event is
    /// emitted.
    pub async fn delete(&self, id: CommentId) -> Result<(), StreamError> {
        self.send(StreamCommand::Delete(id)).await
    }

    /// Current contents of the comment list, in display order.
    pub async fn snapshot(&self) -> Result<Vec<Comment>, StreamError> {
        let (reply_tx, reply_rx) = oneshot::channel();
        self.send(StreamCommand::Snapshot(reply_tx)).await?;
        reply_rx.await.map_err(|_| StreamError::SessionClosed)
    }

    /// Point the session at another video: tears down the old live
    /// channel, clears the list, re-fetches history. In-flight responses
    /// for the previous video are discarded when they arrive.
    pub async fn switch_video(&self, video_id: VideoId) -> Result<(), StreamError> {
        self.send(StreamCommand::SwitchVideo(video_id)).await
    }

    /// Tear the session down. The live channel is closed and no list
    /// mutation or event is emitted afterwards.
    pub async fn close(&self) -> Result<(), StreamError> {
        self.send(StreamCommand::Close).await
    }

    /// Latest observed live channel state.
    pub fn connection_state(&self) -> ConnectionState {
        *self.state_rx.borrow()
    }

    /// Whether the delete control should be offered for this comment.
    ///
    /// Purely a presentation hint: it compares authors and carries no
    /// authorization weight. [`delete`](Self::delete) is not gated on it;
    /// the server remains the authority.
    pub fn can_delete(&self, comment: &Comment) -> bool {
        comment.user == self.username
    }

    async fn send(&self, cmd: StreamCommand) -> Result<(), StreamError> {
        self.cmd_tx
            .send(cmd)
            .await
            .map_err(|_| StreamError::SessionClosed)
    }
}

// ---------------------------------------------------------------------------
// Session task
// ---------------------------------------------------------------------------

struct StreamTask {
    api: ApiClient,
    live_config: LiveConfig,
    identity: Identity,
    video_id: VideoId,
    /// Insertion order is display order, oldest first.
    items: Vec<Comment>,
    conn: ConnectionState,
    live_tx: mpsc::Sender<LiveCommand>,
    live_rx: mpsc::Receiver<LiveNotification>,
    ops_tx: mpsc::Sender<TaggedOutcome>,
    ops_rx: mpsc::Receiver<TaggedOutcome>,
    events_tx: mpsc::Sender<CommentStreamEvent>,
    state_tx: watch::Sender<ConnectionState>,
}

impl StreamTask {
    async fn run(mut self, mut cmd_rx: mpsc::Receiver<StreamCommand>) {
        loop {
            tokio::select! {
                cmd = cmd_rx.recv() => match cmd {
                    Some(StreamCommand::Submit { text }) => self.handle_submit(text).await,
                    Some(StreamCommand::Delete(id)) => self.handle_delete(id).await,
                    Some(StreamCommand::Snapshot(reply)) => {
                        let _ = reply.send(self.items.clone());
                    }
                    Some(StreamCommand::SwitchVideo(video_id)) => {
                        self.handle_switch(video_id).await
                    }
                    Some(StreamCommand::Close) | None => {
                        self.teardown().await;
                        break;
                    }
                },

                Some(notification) = self.live_rx.recv() => {
                    self.handle_live(notification).await
                }

                Some(outcome) = self.ops_rx.recv() => {
                    self.handle_outcome(outcome).await
                }
            }
        }

        info!(video = %self.video_id, "Comment stream session closed");
    }

    // --- Live channel ---

    async fn handle_live(&mut self, notification: LiveNotification) {
        match notification {
            LiveNotification::Push(LiveMessage::Comment(push)) => {
                // Every push appends a locally-identified entry; there is
                // no deduplication against the eventual persisted record,
                // including the server echoing our own frame back.
                let comment = Comment::from_push(&push, Utc::now());
                self.items.push(comment.clone());
                self.emit(CommentStreamEvent::CommentAdded(comment)).await;
            }
            LiveNotification::StateChanged(state) => {
                self.conn = state;
                self.state_tx.send_replace(state);
                self.emit(CommentStreamEvent::ConnectionChanged(state)).await;
            }
        }
    }

    // --- User actions ---

    async fn handle_submit(&mut self, text: String) {
        if text.trim().is_empty() {
            // The handle already rejects these; nothing must be emitted.
            warn!("Ignoring empty comment submission");
            return;
        }

        let now = Utc::now();
        let mut local_id = None;

        if self.conn == ConnectionState::Open {
            let push = CommentPush::new(self.identity.username.as_str(), text.as_str(), now);
            let _ = self
                .live_tx
                .send(LiveCommand::Publish(LiveMessage::Comment(push)))
                .await;

            let provisional =
                Comment::provisional(self.identity.username.as_str(), text.as_str(), now);
            local_id = Some(provisional.id);
            self.items.push(provisional.clone());
            self.emit(CommentStreamEvent::CommentAdded(provisional)).await;
        }

        let api = self.api.clone();
        let token = self.identity.token.clone();
        let ops_tx = self.ops_tx.clone();
        let video_id = self.video_id;
        tokio::spawn(async move {
            let result = api.create_comment(video_id, &text, &token).await;
            let _ = ops_tx
                .send(TaggedOutcome {
                    video_id,
                    outcome: OpOutcome::Created { local_id, result },
                })
                .await;
        });
    }

    async fn handle_delete(&mut self, id: CommentId) {
        let CommentId::Server(server_id) = id else {
            // Live-pushed entries have no known server record; their ids
            // exist only in this session.
            warn!(id = %id, "Refusing to delete a comment with no persisted record");
            self.emit(CommentStreamEvent::Error(
                "This comment has not been persisted yet".to_string(),
            ))
            .await;
            return;
        };

        let api = self.api.clone();
        let token = self.identity.token.clone();
        let ops_tx = self.ops_tx.clone();
        let video_id = self.video_id;
        tokio::spawn(async move {
            let result = api.delete_comment(server_id, &token).await;
            let _ = ops_tx
                .send(TaggedOutcome {
                    video_id,
                    outcome: OpOutcome::Deleted { id, result },
                })
                .await;
        });
    }

    async fn handle_switch(&mut self, video_id: VideoId) {
        if video_id == self.video_id {
            return;
        }

        let _ = self.live_tx.send(LiveCommand::Shutdown).await;

        // Replacing the receiver also drops any pushes still queued for
        // the previous video.
        match spawn_live_channel(&self.live_config, video_id) {
            Ok((live_tx, live_rx)) => {
                self.live_tx = live_tx;
                self.live_rx = live_rx;
            }
            Err(e) => {
                warn!(video = %video_id, error = %e, "Failed to open live channel");
                self.emit(CommentStreamEvent::Error(
                    "Live comments are unavailable".to_string(),
                ))
                .await;
            }
        }

        self.video_id = video_id;
        self.items.clear();
        self.spawn_history_fetch();
    }

    // --- Tagged REST results ---

    async fn handle_outcome(&mut self, tagged: TaggedOutcome) {
        if tagged.video_id != self.video_id {
            debug!(
                tag = %tagged.video_id,
                active = %self.video_id,
                "Discarding response for a stale video"
            );
            return;
        }

        match tagged.outcome {
            OpOutcome::History(Ok(history)) => {
                let count = merge_history(&mut self.items, history);
                self.emit(CommentStreamEvent::HistoryLoaded {
                    video_id: self.video_id,
                    count,
                })
                .await;
            }
            OpOutcome::History(Err(e)) => {
                warn!(video = %self.video_id, error = %e, "History fetch failed");
                self.emit(CommentStreamEvent::Error("Failed to load comments".to_string()))
                    .await;
            }

            OpOutcome::Created { local_id, result } => match result {
                Ok(comment) => {
                    if let Some(local_id) = local_id {
                        if reconcile(&mut self.items, local_id, comment.clone()) {
                            self.emit(CommentStreamEvent::CommentConfirmed { local_id, comment })
                                .await;
                            return;
                        }
                    }
                    // No provisional entry was rendered (channel not open
                    // at submit time), so the persisted record is appended.
                    self.items.push(comment.clone());
                    self.emit(CommentStreamEvent::CommentAdded(comment)).await;
                }
                Err(e) => {
                    // The optimistic entry, if any, stays in place.
                    warn!(video = %self.video_id, error = %e, "Comment create failed");
                    self.emit(CommentStreamEvent::Error("Failed to post comment".to_string()))
                        .await;
                }
            },

            OpOutcome::Deleted { id, result } => match result {
                Ok(()) => {
                    self.items.retain(|c| c.id != id);
                    self.emit(CommentStreamEvent::CommentDeleted(id)).await;
                }
                Err(e) => {
                    warn!(id = %id, error = %e, "Comment delete failed");
                    self.emit(CommentStreamEvent::Error("Failed to delete comment".to_string()))
                        .await;
                }
            },
        }
    }

    /// Close the live channel and surface the final state transition.
    /// Pushes still in flight are dropped: the list is never mutated
    /// after teardown.
    async fn teardown(&mut self) {
        let _ = self.live_tx.send(LiveCommand::Shutdown).await;
        while let Some(notification) = self.live_rx.recv().await {
            if let LiveNotification::StateChanged(state) = notification {
                self.conn = state;
                self.state_tx.send_replace(state);
                self.emit(CommentStreamEvent::ConnectionChanged(state)).await;
                if state == ConnectionState::Closed {
                    break;
                }
            }
        }
    }

    fn spawn_history_fetch(&self) {
        let api = self.api.clone();
        let ops_tx = self.ops_tx.clone();
        let video_id = self.video_id;
        tokio::spawn(async move {
            let result = api.list_comments(video_id).await;
            let _ = ops_tx
                .send(TaggedOutcome {
                    video_id,
                    outcome: OpOutcome::History(result),
                })
                .await;
        });
    }

    async fn emit(&self, event: CommentStreamEvent) {
        let _ = self.events_tx.send(event).await;
    }
}

// ---------------------------------------------------------------------------
// List operations
// ---------------------------------------------------------------------------

/// Seed the history in front of whatever pushes arrived before it, so
/// display order stays oldest-first and no push is dropped. Returns the
/// number of history entries.
fn merge_history(items: &mut Vec<Comment>, history: Vec<Comment>) -> usize {
    let count = history.len();
    let mut merged = history;
    merged.append(items);
    *items = merged;
    count
}

/// Replace the provisional entry keyed by `local_id` with the persisted
/// record, keeping its position. Returns `false` if no such entry exists.
fn reconcile(items: &mut [Comment], local_id: CommentId, record: Comment) -> bool {
    match items.iter_mut().find(|c| c.id == local_id) {
        Some(entry) => {
            *entry = record;
            true
        }
        None => false,
    }
}
