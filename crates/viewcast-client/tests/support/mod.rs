//! In-process platform backend for integration tests: the REST endpoints
//! and the per-video comment WebSocket, with switches to force failures.
#![allow(dead_code)]

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicI64, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use axum::extract::ws::{Message, WebSocket, WebSocketUpgrade};
use axum::extract::{Multipart, Path, State};
use axum::http::{HeaderMap, StatusCode};
use axum::response::IntoResponse;
use axum::routing::{delete, get, post};
use axum::{Json, Router};
use serde_json::{json, Value};
use tokio::sync::broadcast;

#[derive(Clone)]
pub struct TestBackend {
    /// Persisted comments per video id.
    comments: Arc<Mutex<HashMap<u64, Vec<Value>>>>,
    /// One broadcast group per video, like the real consumer groups.
    topics: Arc<Mutex<HashMap<u64, broadcast::Sender<String>>>>,
    /// Artificial latency for history fetches, per video id.
    history_delay_ms: Arc<Mutex<HashMap<u64, u64>>>,
    /// Force the next create / delete calls to fail.
    pub fail_create: Arc<AtomicBool>,
    pub fail_delete: Arc<AtomicBool>,
    next_id: Arc<AtomicI64>,
    /// Texts of every create call that reached the server.
    pub created: Arc<Mutex<Vec<String>>>,
    /// Ids of every delete call that reached the server.
    pub deleted: Arc<Mutex<Vec<i64>>>,
    /// `Authorization` header of every authenticated call.
    pub auth_headers: Arc<Mutex<Vec<String>>>,
    /// `(title, description, video_bytes)` of every upload.
    pub uploads: Arc<Mutex<Vec<(String, String, usize)>>>,
}

impl TestBackend {
    fn new() -> Self {
        Self {
            comments: Arc::new(Mutex::new(HashMap::new())),
            topics: Arc::new(Mutex::new(HashMap::new())),
            history_delay_ms: Arc::new(Mutex::new(HashMap::new())),
            fail_create: Arc::new(AtomicBool::new(false)),
            fail_delete: Arc::new(AtomicBool::new(false)),
            next_id: Arc::new(AtomicI64::new(100)),
            created: Arc::new(Mutex::new(Vec::new())),
            deleted: Arc::new(Mutex::new(Vec::new())),
            auth_headers: Arc::new(Mutex::new(Vec::new())),
            uploads: Arc::new(Mutex::new(Vec::new())),
        }
    }

    pub fn seed_comment(&self, video_id: u64, id: i64, user: &str, text: &str) {
        self.comments.lock().unwrap().entry(video_id).or_default().push(json!({
            "id": id,
            "user": user,
            "text": text,
            "timestamp": "2025-10-17T10:30:00Z",
        }));
    }

    pub fn delay_history(&self, video_id: u64, ms: u64) {
        self.history_delay_ms.lock().unwrap().insert(video_id, ms);
    }

    /// Broadcast sender for one video's comment group.
    pub fn topic(&self, video_id: u64) -> broadcast::Sender<String> {
        self.topics
            .lock()
            .unwrap()
            .entry(video_id)
            .or_insert_with(|| broadcast::channel(64).0)
            .clone()
    }

    /// Inject a push as if another client had posted.
    pub fn push_comment(&self, video_id: u64, user: &str, text: &str) {
        let frame = json!({
            "type": "comment",
            "user": user,
            "text": text,
            "timestamp": "2025-10-17T11:00:00Z",
        });
        let _ = self.topic(video_id).send(frame.to_string());
    }
}

/// Bind the backend on an ephemeral port; returns the port and the
/// control handle.
pub async fn spawn_backend() -> (u16, TestBackend) {
    let backend = TestBackend::new();

    let app = Router::new()
        .route("/api/login/", post(login))
        .route("/api/register/", post(register))
        .route("/api/videos/", get(list_videos))
        .route("/api/videos/upload/", post(upload_video))
        .route("/api/videos/{video_id}/comments/", get(list_comments).post(create_comment))
        .route("/api/comments/{comment_id}/", delete(delete_comment))
        .route("/ws/comments/{video_id}/", get(ws_comments))
        .with_state(backend.clone());

    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let port = listener.local_addr().unwrap().port();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });

    (port, backend)
}

fn record_auth(backend: &TestBackend, headers: &HeaderMap) {
    if let Some(value) = headers.get("authorization").and_then(|v| v.to_str().ok()) {
        backend.auth_headers.lock().unwrap().push(value.to_string());
    }
}

async fn login(Json(body): Json<Value>) -> impl IntoResponse {
    if body["password"] == "pw" {
        Json(json!({
            "user_id": 7,
            "username": body["username"],
            "token": "tok123",
        }))
        .into_response()
    } else {
        (
            StatusCode::UNAUTHORIZED,
            Json(json!({"error": "Invalid credentials"})),
        )
            .into_response()
    }
}

async fn register(Json(body): Json<Value>) -> impl IntoResponse {
    (
        StatusCode::CREATED,
        Json(json!({
            "user_id": 8,
            "username": body["username"],
            "email": body["email"],
            "token": "tok456",
        })),
    )
}

async fn list_videos() -> Json<Value> {
    Json(json!([
        {
            "id": 1,
            "title": "Sample Video 1",
            "description": "First sample video",
            "thumbnail": "/media/thumbnails/1.jpg",
            "duration": "5:30",
            "views": 1250
        },
        {
            "id": 2,
            "title": "Sample Video 2",
            "description": "Second sample video",
            "thumbnail": "/media/thumbnails/2.jpg",
            "duration": "8:45",
            "views": 890
        }
    ]))
}

async fn upload_video(
    State(backend): State<TestBackend>,
    headers: HeaderMap,
    mut multipart: Multipart,
) -> impl IntoResponse {
    record_auth(&backend, &headers);

    let mut title = String::new();
    let mut description = String::new();
    let mut video_bytes = 0usize;
    let mut file_name = String::new();

    while let Some(field) = multipart.next_field().await.unwrap() {
        match field.name().unwrap_or("") {
            "title" => title = field.text().await.unwrap(),
            "description" => description = field.text().await.unwrap(),
            "video" => {
                file_name = field.file_name().unwrap_or("").to_string();
                video_bytes = field.bytes().await.unwrap().len();
            }
            _ => {}
        }
    }

    backend
        .uploads
        .lock()
        .unwrap()
        .push((title.clone(), description.clone(), video_bytes));

    (
        StatusCode::CREATED,
        Json(json!({
            "id": 1,
            "title": title,
            "description": description,
            "file_path": format!("videos/{file_name}"),
            "uploaded_by": "alice",
        })),
    )
}

async fn list_comments(
    State(backend): State<TestBackend>,
    Path(video_id): Path<u64>,
) -> Json<Value> {
    let delay = backend
        .history_delay_ms
        .lock()
        .unwrap()
        .get(&video_id)
        .copied();
    if let Some(ms) = delay {
        tokio::time::sleep(Duration::from_millis(ms)).await;
    }

    let comments = backend
        .comments
        .lock()
        .unwrap()
        .get(&video_id)
        .cloned()
        .unwrap_or_default();
    Json(Value::Array(comments))
}

async fn create_comment(
    State(backend): State<TestBackend>,
    Path(video_id): Path<u64>,
    headers: HeaderMap,
    Json(body): Json<Value>,
) -> impl IntoResponse {
    record_auth(&backend, &headers);

    if backend.fail_create.load(Ordering::SeqCst) {
        return (
            StatusCode::INTERNAL_SERVER_ERROR,
            Json(json!({"error": "Comment storage unavailable"})),
        )
            .into_response();
    }

    let text = body["text"].as_str().unwrap_or("").to_string();
    backend.created.lock().unwrap().push(text.clone());

    let id = backend.next_id.fetch_add(1, Ordering::SeqCst);
    let record = json!({
        "id": id,
        "user": "alice",
        "text": text,
        "timestamp": "2025-10-17T12:00:00Z",
    });
    backend
        .comments
        .lock()
        .unwrap()
        .entry(video_id)
        .or_default()
        .push(record.clone());

    (StatusCode::CREATED, Json(record)).into_response()
}

async fn delete_comment(
    State(backend): State<TestBackend>,
    Path(comment_id): Path<i64>,
    headers: HeaderMap,
) -> impl IntoResponse {
    record_auth(&backend, &headers);

    if backend.fail_delete.load(Ordering::SeqCst) {
        return (
            StatusCode::FORBIDDEN,
            Json(json!({"error": "Not allowed to delete this comment"})),
        )
            .into_response();
    }

    backend.deleted.lock().unwrap().push(comment_id);
    StatusCode::NO_CONTENT.into_response()
}

async fn ws_comments(
    ws: WebSocketUpgrade,
    Path(video_id): Path<u64>,
    State(backend): State<TestBackend>,
) -> impl IntoResponse {
    let topic = backend.topic(video_id);
    ws.on_upgrade(move |socket| handle_socket(socket, topic))
}

/// Mirrors the real consumer: inbound frames are re-broadcast to every
/// group member, including the sender.
async fn handle_socket(mut socket: WebSocket, topic: broadcast::Sender<String>) {
    let mut rx = topic.subscribe();
    loop {
        tokio::select! {
            Ok(frame) = rx.recv() => {
                if socket.send(Message::Text(frame.into())).await.is_err() {
                    break;
                }
            }
            inbound = socket.recv() => match inbound {
                Some(Ok(Message::Text(text))) => {
                    let _ = topic.send(text.to_string());
                }
                Some(Ok(_)) => {}
                Some(Err(_)) | None => break,
            },
        }
    }
}
