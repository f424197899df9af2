#![allow(dead_code)]

use std::collections::{BTreeMap, HashMap, HashSet};
use std::net::SocketAddr;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use axum::body::Body;
use axum::extract::{FromRequest, Multipart, Request, State};
use axum::http::{header, Method, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::{Json, Router};
use serde_json::{json, Value};
use tokio::net::TcpListener;
use tower::ServiceExt;

use kaiten_migrate::domain::{
    Board, Card, CardFile, ChecklistItem, Comment, Created, MigrationError, NewCard, Tag,
};
use kaiten_migrate::kaiten::KaitenApi;

// ── In-memory KaitenApi ────────────────────────────────────

#[derive(Debug, Clone, Default)]
pub struct FakeChecklist {
    pub id: i64,
    pub name: String,
    pub items: Vec<ChecklistItem>,
}

#[derive(Debug, Clone)]
pub struct FakeDestCard {
    pub id: i64,
    pub request: NewCard,
    pub tags: Vec<Tag>,
    pub checklists: Vec<FakeChecklist>,
    pub comments: Vec<String>,
    pub files: Vec<(String, Vec<u8>)>,
}

#[derive(Default)]
pub struct FakeState {
    pub boards: Vec<Board>,
    pub cards: BTreeMap<i64, Card>,
    pub tags: HashMap<i64, Vec<Tag>>,
    pub comments: HashMap<i64, Vec<Comment>>,
    pub files: HashMap<i64, Vec<CardFile>>,
    pub blobs: HashMap<String, Vec<u8>>,

    pub next_id: i64,
    pub dest: BTreeMap<i64, FakeDestCard>,

    /// Every call, as "method:arg".
    pub calls: Vec<String>,
    pub mutations: usize,
    pub upload_paths: Vec<PathBuf>,

    pub deny_writes: bool,
    pub missing_cards: HashSet<i64>,
    pub failing_comment_marker: Option<String>,
    pub failing_uploads: HashSet<String>,
}

/// One side of a migration, backed by plain maps. Writes are only
/// recorded when they succeed; `calls` records every attempt.
#[derive(Default)]
pub struct FakeKaiten {
    pub state: Mutex<FakeState>,
}

impl FakeKaiten {
    pub fn new() -> Self {
        let fake = Self::default();
        fake.state.lock().unwrap().next_id = 1000;
        fake
    }

    pub fn add_card(&self, card: Value) -> i64 {
        let card: Card = serde_json::from_value(card).unwrap();
        let id = card.id;
        self.state.lock().unwrap().cards.insert(id, card);
        id
    }

    pub fn add_tags(&self, card_id: i64, tags: Value) {
        let tags: Vec<Tag> = serde_json::from_value(tags).unwrap();
        self.state.lock().unwrap().tags.insert(card_id, tags);
    }

    pub fn add_comments(&self, card_id: i64, comments: Value) {
        let comments: Vec<Comment> = serde_json::from_value(comments).unwrap();
        self.state.lock().unwrap().comments.insert(card_id, comments);
    }

    pub fn add_file(&self, card_id: i64, name: &str, content: &[u8]) {
        let url = format!("https://files.example/{card_id}/{name}");
        let mut state = self.state.lock().unwrap();
        state.blobs.insert(url.clone(), content.to_vec());
        state.files.entry(card_id).or_default().push(CardFile {
            id: None,
            name: name.to_string(),
            url,
        });
    }

    pub fn set_boards(&self, boards: Value) {
        self.state.lock().unwrap().boards = serde_json::from_value(boards).unwrap();
    }

    pub fn dest_cards(&self) -> Vec<FakeDestCard> {
        self.state.lock().unwrap().dest.values().cloned().collect()
    }

    pub fn mutations(&self) -> usize {
        self.state.lock().unwrap().mutations
    }

    pub fn calls(&self) -> Vec<String> {
        self.state.lock().unwrap().calls.clone()
    }

    pub fn calls_starting_with(&self, prefix: &str) -> usize {
        self.calls().iter().filter(|c| c.starts_with(prefix)).count()
    }

    fn record(&self, call: String) {
        self.state.lock().unwrap().calls.push(call);
    }

    fn check_write(&self) -> Result<(), MigrationError> {
        if self.state.lock().unwrap().deny_writes {
            return Err(MigrationError::from_status(
                403,
                "token has no access to this space".into(),
            ));
        }
        Ok(())
    }

    fn with_dest<T>(
        &self,
        card_id: i64,
        f: impl FnOnce(&mut FakeDestCard) -> T,
    ) -> Result<T, MigrationError> {
        let mut state = self.state.lock().unwrap();
        let result = match state.dest.get_mut(&card_id) {
            Some(card) => f(card),
            None => {
                return Err(MigrationError::from_status(
                    404,
                    format!("card {card_id} not found"),
                ))
            }
        };
        state.mutations += 1;
        Ok(result)
    }
}

#[async_trait]
impl KaitenApi for FakeKaiten {
    async fn list_boards(&self, space_id: i64) -> Result<Vec<Board>, MigrationError> {
        self.record(format!("list_boards:{space_id}"));
        Ok(self.state.lock().unwrap().boards.clone())
    }

    async fn list_cards(
        &self,
        _space_id: i64,
        board_id: i64,
        column_id: i64,
    ) -> Result<Vec<Card>, MigrationError> {
        self.record(format!("list_cards:{board_id}/{column_id}"));
        Ok(self
            .state
            .lock()
            .unwrap()
            .cards
            .values()
            .filter(|c| c.board_id == Some(board_id) && c.column_id == Some(column_id))
            .cloned()
            .collect())
    }

    async fn get_card(&self, card_id: i64) -> Result<Card, MigrationError> {
        self.record(format!("get_card:{card_id}"));
        let state = self.state.lock().unwrap();
        if state.missing_cards.contains(&card_id) {
            return Err(MigrationError::from_status(404, "card not found".into()));
        }
        state
            .cards
            .get(&card_id)
            .cloned()
            .ok_or_else(|| MigrationError::from_status(404, "card not found".into()))
    }

    async fn list_tags(&self, card_id: i64) -> Result<Vec<Tag>, MigrationError> {
        self.record(format!("list_tags:{card_id}"));
        Ok(self.state.lock().unwrap().tags.get(&card_id).cloned().unwrap_or_default())
    }

    async fn list_comments(&self, card_id: i64) -> Result<Vec<Comment>, MigrationError> {
        self.record(format!("list_comments:{card_id}"));
        Ok(self
            .state
            .lock()
            .unwrap()
            .comments
            .get(&card_id)
            .cloned()
            .unwrap_or_default())
    }

    async fn list_files(&self, card_id: i64) -> Result<Vec<CardFile>, MigrationError> {
        self.record(format!("list_files:{card_id}"));
        Ok(self.state.lock().unwrap().files.get(&card_id).cloned().unwrap_or_default())
    }

    async fn download_file(&self, file: &CardFile, dest: &Path) -> Result<u64, MigrationError> {
        self.record(format!("download_file:{}", file.name));
        let content = self
            .state
            .lock()
            .unwrap()
            .blobs
            .get(&file.url)
            .cloned()
            .ok_or_else(|| MigrationError::from_status(404, "file not found".into()))?;
        std::fs::write(dest, &content)?;
        Ok(content.len() as u64)
    }

    async fn create_card(&self, card: &NewCard) -> Result<Created, MigrationError> {
        self.record(format!("create_card:{}", card.title));
        self.check_write()?;

        let mut state = self.state.lock().unwrap();
        state.next_id += 1;
        let id = state.next_id;
        state.dest.insert(
            id,
            FakeDestCard {
                id,
                request: card.clone(),
                tags: Vec::new(),
                checklists: Vec::new(),
                comments: Vec::new(),
                files: Vec::new(),
            },
        );
        state.mutations += 1;
        Ok(Created { id })
    }

    async fn add_tag(&self, card_id: i64, tag: &Tag) -> Result<(), MigrationError> {
        self.record(format!("add_tag:{}", tag.name));
        self.check_write()?;
        self.with_dest(card_id, |card| card.tags.push(tag.clone()))
    }

    async fn create_checklist(&self, card_id: i64, name: &str) -> Result<Created, MigrationError> {
        self.record(format!("create_checklist:{name}"));
        self.check_write()?;
        let id = {
            let mut state = self.state.lock().unwrap();
            state.next_id += 1;
            state.next_id
        };
        self.with_dest(card_id, |card| {
            card.checklists.push(FakeChecklist {
                id,
                name: name.to_string(),
                items: Vec::new(),
            })
        })?;
        Ok(Created { id })
    }

    async fn add_checklist_item(
        &self,
        card_id: i64,
        checklist_id: i64,
        item: &ChecklistItem,
    ) -> Result<(), MigrationError> {
        self.record(format!("add_checklist_item:{}", item.text));
        self.check_write()?;
        self.with_dest(card_id, |card| {
            if let Some(checklist) = card.checklists.iter_mut().find(|c| c.id == checklist_id) {
                checklist.items.push(item.clone());
            }
        })
    }

    async fn add_comment(&self, card_id: i64, text: &str) -> Result<(), MigrationError> {
        self.record(format!("add_comment:{card_id}"));
        self.check_write()?;
        let marker = self.state.lock().unwrap().failing_comment_marker.clone();
        if let Some(marker) = marker {
            if text.contains(&marker) {
                return Err(MigrationError::from_status(500, "comment service unavailable".into()));
            }
        }
        self.with_dest(card_id, |card| card.comments.push(text.to_string()))
    }

    async fn upload_file(
        &self,
        card_id: i64,
        path: &Path,
        file_name: &str,
    ) -> Result<(), MigrationError> {
        self.record(format!("upload_file:{file_name}"));
        self.check_write()?;
        let failing = {
            let mut state = self.state.lock().unwrap();
            state.upload_paths.push(path.to_path_buf());
            state.failing_uploads.contains(file_name)
        };
        assert!(path.exists(), "temp file must exist while uploading");
        if failing {
            return Err(MigrationError::from_status(413, "file too large".into()));
        }
        let content = std::fs::read(path)?;
        self.with_dest(card_id, |card| card.files.push((file_name.to_string(), content)))
    }
}

pub fn target_boards() -> Value {
    json!([
        {
            "id": 10,
            "title": "Delivery",
            "columns": [
                {"id": 102, "title": "Done", "sort_order": 2.0},
                {"id": 101, "title": "Queue", "sort_order": 1.0}
            ],
            "lanes": [{"id": 501, "title": "Main"}, {"id": 502, "title": "Urgent"}]
        },
        {
            "id": 20,
            "title": "Empty lanes",
            "columns": [{"id": 201, "title": "Queue"}],
            "lanes": []
        }
    ])
}

// ── Fake Kaiten HTTP server ────────────────────────────────

#[derive(Default)]
pub struct ServerState {
    pub token: String,
    pub boards: Value,
    pub cards: Vec<Value>,
    pub tags: HashMap<i64, Value>,
    pub comments: HashMap<i64, Value>,
    pub files: HashMap<i64, Value>,
    pub blobs: HashMap<String, Vec<u8>>,
    pub deny_create_card: bool,
    /// Blob paths answered with 403, like an expired signed link.
    pub denied_blobs: HashSet<String>,
    /// Delay before answering `GET cards/{id}/comments`.
    pub slow_comments: Option<Duration>,

    pub next_id: i64,
    /// Every request line, e.g. `GET /api/latest/cards?space_id=1`.
    pub requests: Vec<String>,
    /// JSON bodies of POST requests, keyed by path.
    pub posted: Vec<(String, Value)>,
    /// Multipart uploads: (path, field name, file name, content type, bytes).
    pub uploads: Vec<(String, String, String, String, Vec<u8>)>,
}

#[derive(Clone)]
pub struct FakeServer {
    pub addr: SocketAddr,
    pub state: Arc<Mutex<ServerState>>,
}

impl FakeServer {
    /// Host part usable as a space domain.
    pub fn domain(&self) -> String {
        self.addr.to_string()
    }

    pub fn base_url(&self) -> String {
        format!("http://{}/api/latest", self.addr)
    }

    pub fn file_url(&self, name: &str) -> String {
        format!("http://{}/files/{}", self.addr, name)
    }

    pub fn deny_blob(&self, name: &str) {
        self.state
            .lock()
            .unwrap()
            .denied_blobs
            .insert(format!("/files/{name}"));
    }

    pub fn add_blob(&self, name: &str, content: &[u8]) {
        self.state
            .lock()
            .unwrap()
            .blobs
            .insert(format!("/files/{name}"), content.to_vec());
    }

    pub fn requests(&self) -> Vec<String> {
        self.state.lock().unwrap().requests.clone()
    }

    pub fn posted(&self) -> Vec<(String, Value)> {
        self.state.lock().unwrap().posted.clone()
    }

    pub fn posted_to(&self, suffix: &str) -> Vec<Value> {
        self.posted()
            .into_iter()
            .filter(|(path, _)| path.ends_with(suffix))
            .map(|(_, body)| body)
            .collect()
    }
}

pub async fn spawn_fake_kaiten(token: &str) -> FakeServer {
    let state = Arc::new(Mutex::new(ServerState {
        token: token.to_string(),
        boards: json!([]),
        next_id: 9000,
        ..Default::default()
    }));

    let app = Router::new()
        .fallback(fake_kaiten_handler)
        .with_state(Arc::clone(&state));

    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });

    FakeServer { addr, state }
}

async fn fake_kaiten_handler(
    State(state): State<Arc<Mutex<ServerState>>>,
    req: Request,
) -> Response {
    let method = req.method().clone();
    let uri = req.uri().clone();
    let path = uri.path().to_string();
    let authorized = {
        let mut s = state.lock().unwrap();
        s.requests.push(format!("{method} {uri}"));
        let expected = format!("Bearer {}", s.token);
        req.headers()
            .get(header::AUTHORIZATION)
            .and_then(|v| v.to_str().ok())
            == Some(expected.as_str())
    };
    if !authorized {
        return (StatusCode::UNAUTHORIZED, "invalid token").into_response();
    }

    let segments: Vec<String> = path
        .trim_matches('/')
        .split('/')
        .map(str::to_string)
        .collect();
    let segments: Vec<&str> = segments.iter().map(String::as_str).collect();

    match (method, segments.as_slice()) {
        (Method::GET, ["files", _]) => {
            let s = state.lock().unwrap();
            if s.denied_blobs.contains(&path) {
                return (StatusCode::FORBIDDEN, "AccessDenied: Request has expired").into_response();
            }
            match s.blobs.get(&path) {
                Some(bytes) => bytes.clone().into_response(),
                None => StatusCode::NOT_FOUND.into_response(),
            }
        }
        (Method::GET, ["api", "latest", "spaces", _, "boards"]) => {
            Json(state.lock().unwrap().boards.clone()).into_response()
        }
        (Method::GET, ["api", "latest", "cards"]) => {
            Json(Value::Array(state.lock().unwrap().cards.clone())).into_response()
        }
        (Method::GET, ["api", "latest", "cards", id]) => {
            let id: i64 = id.parse().unwrap_or_default();
            let card = state
                .lock()
                .unwrap()
                .cards
                .iter()
                .find(|c| c["id"] == id)
                .cloned();
            match card {
                Some(card) => Json(card).into_response(),
                None => (StatusCode::NOT_FOUND, "card not found").into_response(),
            }
        }
        (Method::GET, ["api", "latest", "cards", id, sub]) => {
            let id: i64 = id.parse().unwrap_or_default();
            let delay = state.lock().unwrap().slow_comments;
            if let (Some(delay), "comments") = (delay, *sub) {
                tokio::time::sleep(delay).await;
            }
            let s = state.lock().unwrap();
            let map = match *sub {
                "tags" => &s.tags,
                "comments" => &s.comments,
                "files" => &s.files,
                _ => return StatusCode::NOT_FOUND.into_response(),
            };
            Json(map.get(&id).cloned().unwrap_or_else(|| json!([]))).into_response()
        }
        (Method::POST, ["api", "latest", "cards", _, "files"]) => {
            let mut multipart = match Multipart::from_request(req, &()).await {
                Ok(m) => m,
                Err(e) => return (StatusCode::BAD_REQUEST, e.to_string()).into_response(),
            };
            while let Ok(Some(field)) = multipart.next_field().await {
                let field_name = field.name().unwrap_or_default().to_string();
                let file_name = field.file_name().unwrap_or_default().to_string();
                let content_type = field.content_type().unwrap_or_default().to_string();
                let bytes = field.bytes().await.unwrap_or_default().to_vec();
                state.lock().unwrap().uploads.push((
                    path.clone(),
                    field_name,
                    file_name,
                    content_type,
                    bytes,
                ));
            }
            Json(json!({"id": 1})).into_response()
        }
        (Method::POST, ["api", "latest", ..]) => {
            let bytes = match axum::body::to_bytes(req.into_body(), usize::MAX).await {
                Ok(b) => b,
                Err(e) => return (StatusCode::BAD_REQUEST, e.to_string()).into_response(),
            };
            let body: Value = serde_json::from_slice(&bytes).unwrap_or(Value::Null);

            let mut s = state.lock().unwrap();
            if path == "/api/latest/cards" && s.deny_create_card {
                return (StatusCode::FORBIDDEN, "no permission to create cards").into_response();
            }
            s.next_id += 1;
            let id = s.next_id;
            s.posted.push((path.clone(), body));
            Json(json!({"id": id})).into_response()
        }
        _ => StatusCode::NOT_FOUND.into_response(),
    }
}

// ── Router helpers ─────────────────────────────────────────

pub async fn make_request(
    app: Router,
    method: &str,
    uri: &str,
    body: Option<Value>,
) -> (StatusCode, Value) {
    let mut request = axum::http::Request::builder().uri(uri).method(method);

    if body.is_some() {
        request = request.header("content-type", "application/json");
    }

    let request = request
        .body(Body::from(body.map(|b| b.to_string()).unwrap_or_default()))
        .unwrap();

    let response = app.oneshot(request).await.unwrap();
    let status = response.status();
    let body = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    let json = serde_json::from_slice(&body).unwrap_or(Value::Null);

    (status, json)
}
