//! REST client for the platform API.
//!
//! Endpoints:
//! - `POST /api/register/`, `POST /api/login/` — token auth
//! - `GET  /api/videos/` — catalog
//! - `POST /api/videos/upload/` — multipart upload, streamed from disk
//! - `GET/POST /api/videos/{id}/comments/` — comment history / create
//! - `DELETE /api/comments/{id}/` — delete
//!
//! Authenticated calls send `Authorization: Token <credential>`. Non-2xx
//! responses carry `{"error": "..."}` and surface as
//! [`ApiError::Server`]; no call is retried automatically.

use std::path::{Path, PathBuf};

use bytes::Bytes;
use reqwest::header::AUTHORIZATION;
use serde::{Deserialize, Serialize};
use tokio::io::AsyncReadExt;
use tokio::sync::mpsc;
use tracing::{debug, info};

use viewcast_shared::constants::{UPLOAD_CHUNK_SIZE, VIDEO_EXTENSIONS};
use viewcast_shared::models::{AuthSession, Comment, VideoRecord, VideoSummary};
use viewcast_shared::types::{AuthToken, VideoId};

use crate::config::ClientConfig;
use crate::error::ApiError;

/// Thin wrapper over a shared [`reqwest::Client`]. Cheap to clone.
#[derive(Debug, Clone)]
pub struct ApiClient {
    http: reqwest::Client,
    api_base: String,
}

#[derive(Deserialize)]
struct ErrorBody {
    error: String,
}

#[derive(Serialize)]
struct CreateCommentBody<'a> {
    text: &'a str,
}

#[derive(Serialize)]
struct LoginBody<'a> {
    username: &'a str,
    password: &'a str,
}

#[derive(Serialize)]
struct RegisterBody<'a> {
    username: &'a str,
    email: &'a str,
    password: &'a str,
}

impl ApiClient {
    pub fn new(config: &ClientConfig) -> Self {
        Self {
            http: reqwest::Client::new(),
            api_base: config.api_base.trim_end_matches('/').to_string(),
        }
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.api_base, path)
    }

    // -----------------------------------------------------------------------
    // Auth
    // -----------------------------------------------------------------------

    /// Exchange username/password for a bearer token.
    pub async fn login(&self, username: &str, password: &str) -> Result<AuthSession, ApiError> {
        let response = self
            .http
            .post(self.url("/api/login/"))
            .json(&LoginBody { username, password })
            .send()
            .await?;
        let session: AuthSession = check(response).await?.json().await?;
        info!(user = %session.username, "Logged in");
        Ok(session)
    }

    /// Create an account; the response carries a token like login does.
    pub async fn register(
        &self,
        username: &str,
        email: &str,
        password: &str,
    ) -> Result<AuthSession, ApiError> {
        let response = self
            .http
            .post(self.url("/api/register/"))
            .json(&RegisterBody { username, email, password })
            .send()
            .await?;
        let session: AuthSession = check(response).await?.json().await?;
        info!(user = %session.username, "Registered");
        Ok(session)
    }

    // -----------------------------------------------------------------------
    // Video catalog
    // -----------------------------------------------------------------------

    pub async fn list_videos(&self) -> Result<Vec<VideoSummary>, ApiError> {
        let response = self.http.get(self.url("/api/videos/")).send().await?;
        Ok(check(response).await?.json().await?)
    }

    /// Upload a video file as multipart form data, streaming it from disk.
    ///
    /// Cumulative progress is reported over `progress` after each chunk;
    /// the final notification equals the file size. The file extension is
    /// validated before any request is issued.
    pub async fn upload_video(
        &self,
        request: UploadRequest,
        token: &AuthToken,
        progress: Option<mpsc::Sender<UploadProgress>>,
    ) -> Result<VideoRecord, ApiError> {
        let file_name = request
            .path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .ok_or_else(|| ApiError::Validation("Upload path has no file name".into()))?;
        let mime = video_mime(&request.path).ok_or_else(|| {
            ApiError::Validation(format!("'{file_name}' is not a supported video file"))
        })?;

        let file = tokio::fs::File::open(&request.path).await?;
        let total = file.metadata().await?.len();

        let stream = futures::stream::unfold(
            (file, 0u64, progress),
            move |(mut file, sent, progress)| async move {
                let mut buf = vec![0u8; UPLOAD_CHUNK_SIZE];
                match file.read(&mut buf).await {
                    Ok(0) => None,
                    Ok(n) => {
                        buf.truncate(n);
                        let sent = sent + n as u64;
                        if let Some(ref tx) = progress {
                            let _ = tx.send(UploadProgress { sent, total }).await;
                        }
                        Some((Ok(Bytes::from(buf)), (file, sent, progress)))
                    }
                    Err(e) => Some((Err(e), (file, sent, progress))),
                }
            },
        );

        let part = reqwest::multipart::Part::stream_with_length(
            reqwest::Body::wrap_stream(stream),
            total,
        )
        .file_name(file_name.clone())
        .mime_str(mime)?;

        let form = reqwest::multipart::Form::new()
            .part("video", part)
            .text("title", request.title)
            .text("description", request.description);

        let response = self
            .http
            .post(self.url("/api/videos/upload/"))
            .header(AUTHORIZATION, token.header_value())
            .multipart(form)
            .send()
            .await?;
        let record: VideoRecord = check(response).await?.json().await?;
        info!(video = %record.id, file = %file_name, size = total, "Video uploaded");
        Ok(record)
    }

    // -----------------------------------------------------------------------
    // Comments
    // -----------------------------------------------------------------------

    /// Full comment history for a video, oldest first.
    pub async fn list_comments(&self, video_id: VideoId) -> Result<Vec<Comment>, ApiError> {
        let response = self
            .http
            .get(self.url(&format!("/api/videos/{video_id}/comments/")))
            .send()
            .await?;
        Ok(check(response).await?.json().await?)
    }

    /// Persist a new comment; returns the server-assigned record.
    pub async fn create_comment(
        &self,
        video_id: VideoId,
        text: &str,
        token: &AuthToken,
    ) -> Result<Comment, ApiError> {
        let response = self
            .http
            .post(self.url(&format!("/api/videos/{video_id}/comments/")))
            .header(AUTHORIZATION, token.header_value())
            .json(&CreateCommentBody { text })
            .send()
            .await?;
        let comment: Comment = check(response).await?.json().await?;
        debug!(id = %comment.id, video = %video_id, "Comment persisted");
        Ok(comment)
    }

    /// Delete a persisted comment by its server id.
    pub async fn delete_comment(&self, id: i64, token: &AuthToken) -> Result<(), ApiError> {
        let response = self
            .http
            .delete(self.url(&format!("/api/comments/{id}/")))
            .header(AUTHORIZATION, token.header_value())
            .send()
            .await?;
        check(response).await?;
        debug!(id, "Comment deleted");
        Ok(())
    }
}

/// A video upload job.
#[derive(Debug, Clone)]
pub struct UploadRequest {
    /// Local path of the video file.
    pub path: PathBuf,
    pub title: String,
    pub description: String,
}

/// Cumulative upload progress.
#[derive(Debug, Clone, Copy, Serialize, PartialEq, Eq)]
pub struct UploadProgress {
    /// Bytes sent so far.
    pub sent: u64,
    /// Total file size in bytes.
    pub total: u64,
}

impl UploadProgress {
    pub fn percent(&self) -> u8 {
        if self.total == 0 {
            return 100;
        }
        ((self.sent * 100) / self.total).min(100) as u8
    }
}

/// Map a 2xx response through; turn anything else into
/// [`ApiError::Server`], preferring the server's `{"error": ...}` text.
async fn check(response: reqwest::Response) -> Result<reqwest::Response, ApiError> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }

    let message = match response.json::<ErrorBody>().await {
        Ok(body) => body.error,
        Err(_) => status
            .canonical_reason()
            .unwrap_or("request failed")
            .to_string(),
    };
    Err(ApiError::Server {
        status: status.as_u16(),
        message,
    })
}

/// MIME type for a supported video extension, `None` otherwise.
fn video_mime(path: &Path) -> Option<&'static str> {
    let ext = path.extension()?.to_str()?.to_ascii_lowercase();
    if !VIDEO_EXTENSIONS.contains(&ext.as_str()) {
        return None;
    }
    Some(match ext.as_str() {
        "mp4" => "video/mp4",
        "m4v" => "video/x-m4v",
        "mov" => "video/quicktime",
        "webm" => "video/webm",
        "mkv" => "video/x-matroska",
        "avi" => "video/x-msvideo",
        _ => "video/mp4",
    })
}
