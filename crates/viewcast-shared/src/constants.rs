//! Platform-wide defaults.

/// Default base URL for the REST API.
pub const DEFAULT_API_BASE: &str = "http://127.0.0.1:8000";

/// Default base URL for the live WebSocket endpoint.
pub const DEFAULT_WS_BASE: &str = "ws://127.0.0.1:8000";

/// Bounded size of the command / notification channels.
pub const CHANNEL_CAPACITY: usize = 256;

/// How many consecutive failed connection attempts the live channel
/// tolerates before giving up.
pub const DEFAULT_LIVE_MAX_RETRIES: u32 = 5;

/// First reconnect delay; doubles on every consecutive failure.
pub const DEFAULT_LIVE_BACKOFF_MS: u64 = 500;

/// Upper bound on the reconnect delay.
pub const DEFAULT_LIVE_BACKOFF_MAX_MS: u64 = 30_000;

/// Chunk size used when streaming a video upload from disk.
pub const UPLOAD_CHUNK_SIZE: usize = 64 * 1024;

/// File extensions accepted by the client-side upload validation.
pub const VIDEO_EXTENSIONS: &[&str] = &["mp4", "mov", "webm", "mkv", "avi", "m4v"];
