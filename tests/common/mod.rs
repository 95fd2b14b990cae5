#![allow(dead_code)]

//! In-process fake of the storage, REST and remote download endpoints.

use audio_uploader::AppState;
use audio_uploader::config::StorageConfig;
use audio_uploader::infrastructure::storage::setup_storage;
use axum::Router;
use axum::body::Bytes;
use axum::extract::{DefaultBodyLimit, State};
use axum::http::{HeaderMap, Method, StatusCode, Uri};
use axum::response::{IntoResponse, Response};
use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use percent_encoding::percent_decode_str;
use serde_json::{Value, json};
use std::collections::{BTreeMap, HashMap, HashSet};
use std::path::Path;
use std::sync::{Arc, Mutex};
use uuid::Uuid;

pub const SERVICE_KEY: &str = "test-key";
pub const CHANNEL_ID: &str = "f76d55c8-3ac0-4d0b-8331-6968ada11896";
pub const MIB: usize = 1024 * 1024;

#[derive(Debug, Clone)]
pub struct StoredObject {
    pub content_type: String,
    pub data: Vec<u8>,
}

#[derive(Debug, Clone)]
pub struct UploadRequest {
    pub key: String,
    pub upsert: bool,
    pub content_type: String,
    pub len: usize,
}

#[derive(Debug, Clone)]
pub struct RecordRequest {
    pub table: String,
    pub prefer: String,
    pub body: Value,
}

#[derive(Debug)]
pub struct Session {
    pub key: String,
    pub content_type: String,
    pub total: u64,
    pub data: Vec<u8>,
}

#[derive(Debug, Default)]
pub struct Fake {
    pub objects: BTreeMap<String, StoredObject>,
    pub uploads: Vec<UploadRequest>,
    pub records: Vec<RecordRequest>,
    pub deletes: Vec<Vec<String>>,
    pub lists: usize,
    pub patches: Vec<(u64, usize)>,
    pub sessions: HashMap<String, Session>,
    pub sessions_created: usize,
    pub remote_files: HashMap<String, Vec<u8>>,
    pub unauthorized: usize,

    /// Object uploads for these keys are rejected with 409.
    pub reject_uploads: HashSet<String>,
    /// Delete requests with these (zero-based) indexes answer 500.
    pub reject_deletes: HashSet<usize>,
    pub reject_records: bool,
    pub reject_sessions: bool,
    pub reject_listing: bool,
    /// PATCH at this offset answers 500.
    pub reject_patch_at: Option<u64>,
    /// Acknowledge every PATCH with a wrong Upload-Offset.
    pub misreport_offset: bool,
}

pub type SharedFake = Arc<Mutex<Fake>>;

pub struct TestEnv {
    pub state: AppState,
    pub fake: SharedFake,
    pub base_url: String,
}

impl TestEnv {
    pub fn fake(&self) -> std::sync::MutexGuard<'_, Fake> {
        self.fake.lock().unwrap()
    }

    /// Puts an object straight into the fake bucket.
    pub fn seed_object(&self, key: &str) {
        self.fake().objects.insert(
            key.to_string(),
            StoredObject {
                content_type: "application/octet-stream".to_string(),
                data: b"old".to_vec(),
            },
        );
    }
}

pub async fn spawn() -> TestEnv {
    spawn_with(|_| {}).await
}

pub async fn spawn_with(tweak: impl FnOnce(&mut StorageConfig)) -> TestEnv {
    let fake: SharedFake = Arc::new(Mutex::new(Fake::default()));
    let app = Router::new()
        .fallback(handle)
        .layer(DefaultBodyLimit::disable())
        .with_state(fake.clone());

    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });

    let base_url = format!("http://{}", addr);
    let mut config = StorageConfig::new(&base_url, SERVICE_KEY);
    config.channel_id = Some(Uuid::parse_str(CHANNEL_ID).unwrap());
    config.remote_download_url = format!("{}/uc", base_url);
    tweak(&mut config);

    let state = setup_storage(config).unwrap();
    TestEnv {
        state,
        fake,
        base_url,
    }
}

/// Writes `len` bytes of a repeating pattern to `path`, creating parents.
pub fn write_file(path: &Path, len: usize) -> Vec<u8> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent).unwrap();
    }
    let data: Vec<u8> = (0..len).map(|i| (i % 251) as u8).collect();
    std::fs::write(path, &data).unwrap();
    data
}

/// One level of the bucket below `prefix`, as the listing endpoint returns
/// it: file names, plus folder names flagged `true`.
fn direct_children(objects: &BTreeMap<String, StoredObject>, prefix: &str) -> Vec<(String, bool)> {
    let mut children = BTreeMap::new();
    for key in objects.keys() {
        let rest = if prefix.is_empty() {
            key.as_str()
        } else {
            match key.strip_prefix(prefix).and_then(|r| r.strip_prefix('/')) {
                Some(rest) => rest,
                None => continue,
            }
        };
        match rest.split_once('/') {
            Some((folder, _)) => children.insert(folder.to_string(), true),
            None => children.insert(rest.to_string(), false),
        };
    }
    children.into_iter().collect()
}

fn header<'a>(headers: &'a HeaderMap, name: &str) -> Option<&'a str> {
    headers.get(name).and_then(|v| v.to_str().ok())
}

fn decode_metadata(raw: &str) -> HashMap<String, String> {
    raw.split(',')
        .filter_map(|pair| pair.trim().split_once(' '))
        .map(|(k, v)| {
            let decoded = STANDARD.decode(v).unwrap_or_default();
            (k.to_string(), String::from_utf8_lossy(&decoded).into_owned())
        })
        .collect()
}

async fn handle(
    State(fake): State<SharedFake>,
    method: Method,
    uri: Uri,
    headers: HeaderMap,
    body: Bytes,
) -> Response {
    let mut fake = fake.lock().unwrap();

    let bearer = format!("Bearer {}", SERVICE_KEY);
    let authorized = header(&headers, "authorization") == Some(bearer.as_str())
        && header(&headers, "apikey") == Some(SERVICE_KEY);
    let path = uri.path().to_string();

    // The remote host is public and takes no credentials.
    if method == Method::GET && path == "/uc" {
        let query: HashMap<String, String> = uri
            .query()
            .unwrap_or_default()
            .split('&')
            .filter_map(|p| p.split_once('='))
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        if query.get("export").map(String::as_str) != Some("download") {
            return StatusCode::BAD_REQUEST.into_response();
        }
        return match query.get("id").and_then(|id| fake.remote_files.get(id)) {
            Some(data) => data.clone().into_response(),
            None => (StatusCode::NOT_FOUND, "File not found").into_response(),
        };
    }

    if !authorized {
        fake.unauthorized += 1;
        return StatusCode::UNAUTHORIZED.into_response();
    }

    if method == Method::POST && path.starts_with("/storage/v1/object/list/") {
        fake.lists += 1;
        if fake.reject_listing {
            return (StatusCode::INTERNAL_SERVER_ERROR, "listing down").into_response();
        }
        let request: Value = serde_json::from_slice(&body).unwrap_or_default();
        let limit = request["limit"].as_u64().unwrap_or(100) as usize;
        let offset = request["offset"].as_u64().unwrap_or(0) as usize;
        let prefix = request["prefix"]
            .as_str()
            .unwrap_or_default()
            .trim_matches('/')
            .to_string();
        let page: Vec<Value> = direct_children(&fake.objects, &prefix)
            .into_iter()
            .skip(offset)
            .take(limit)
            .map(|(name, is_folder)| {
                if is_folder {
                    json!({ "name": name, "id": null, "metadata": null })
                } else {
                    json!({ "name": name, "id": Uuid::new_v4(), "metadata": {} })
                }
            })
            .collect();
        return axum::Json(page).into_response();
    }

    if method == Method::POST && path.starts_with("/storage/v1/object/") {
        let key = path
            .trim_start_matches("/storage/v1/object/")
            .split_once('/')
            .map(|(_, key)| percent_decode_str(key).decode_utf8_lossy().into_owned())
            .unwrap_or_default();
        let upsert = header(&headers, "x-upsert") == Some("true");
        let content_type = header(&headers, "content-type")
            .unwrap_or_default()
            .to_string();
        fake.uploads.push(UploadRequest {
            key: key.clone(),
            upsert,
            content_type: content_type.clone(),
            len: body.len(),
        });

        if fake.reject_uploads.contains(&key) || (!upsert && fake.objects.contains_key(&key)) {
            return (
                StatusCode::CONFLICT,
                axum::Json(json!({"statusCode": "409", "error": "Duplicate", "message": "The resource already exists"})),
            )
                .into_response();
        }
        fake.objects.insert(
            key.clone(),
            StoredObject {
                content_type,
                data: body.to_vec(),
            },
        );
        return axum::Json(json!({ "Key": format!("audio-files/{}", key) })).into_response();
    }

    if method == Method::DELETE && path.starts_with("/storage/v1/object/") {
        let request: Value = serde_json::from_slice(&body).unwrap_or_default();
        let keys: Vec<String> = request["prefixes"]
            .as_array()
            .map(|a| {
                a.iter()
                    .filter_map(|v| v.as_str().map(String::from))
                    .collect()
            })
            .unwrap_or_default();
        let index = fake.deletes.len();
        fake.deletes.push(keys.clone());
        if fake.reject_deletes.contains(&index) {
            return (StatusCode::INTERNAL_SERVER_ERROR, "delete failed").into_response();
        }
        for key in &keys {
            fake.objects.remove(key);
        }
        return axum::Json(json!([])).into_response();
    }

    if method == Method::POST && path == "/storage/v1/upload/resumable" {
        if fake.reject_sessions {
            return (StatusCode::FORBIDDEN, "quota exceeded").into_response();
        }
        let (Some("1.0.0"), Some(total)) = (
            header(&headers, "tus-resumable"),
            header(&headers, "upload-length").and_then(|v| v.parse::<u64>().ok()),
        ) else {
            return StatusCode::BAD_REQUEST.into_response();
        };
        let metadata = decode_metadata(header(&headers, "upload-metadata").unwrap_or_default());
        if metadata.get("bucketName").map(String::as_str) != Some("audio-files") {
            return StatusCode::BAD_REQUEST.into_response();
        }
        let id = Uuid::new_v4().to_string();
        fake.sessions_created += 1;
        fake.sessions.insert(
            id.clone(),
            Session {
                key: metadata.get("objectName").cloned().unwrap_or_default(),
                content_type: metadata.get("contentType").cloned().unwrap_or_default(),
                total,
                data: Vec::new(),
            },
        );
        return (
            StatusCode::CREATED,
            [
                ("Location", format!("/storage/v1/upload/resumable/{}", id)),
                ("Tus-Resumable", "1.0.0".to_string()),
            ],
        )
            .into_response();
    }

    if method == Method::PATCH && path.starts_with("/storage/v1/upload/resumable/") {
        let id = path.trim_start_matches("/storage/v1/upload/resumable/").to_string();
        let offset = header(&headers, "upload-offset").and_then(|v| v.parse::<u64>().ok());
        let content_type_ok =
            header(&headers, "content-type") == Some("application/offset+octet-stream");
        let Some(offset) = offset.filter(|_| content_type_ok) else {
            return StatusCode::BAD_REQUEST.into_response();
        };
        fake.patches.push((offset, body.len()));
        if fake.reject_patch_at == Some(offset) {
            return (StatusCode::INTERNAL_SERVER_ERROR, "storage node unavailable").into_response();
        }
        let misreport = fake.misreport_offset;

        let Some(session) = fake.sessions.get_mut(&id) else {
            return StatusCode::NOT_FOUND.into_response();
        };
        if offset != session.data.len() as u64 {
            return StatusCode::CONFLICT.into_response();
        }
        session.data.extend_from_slice(&body);
        let acknowledged = session.data.len() as u64 + if misreport { 1 } else { 0 };
        let finished = (session.data.len() as u64 == session.total).then(|| {
            (
                session.key.clone(),
                StoredObject {
                    content_type: session.content_type.clone(),
                    data: session.data.clone(),
                },
            )
        });
        if let Some((key, object)) = finished {
            fake.objects.insert(key, object);
        }
        return (
            StatusCode::NO_CONTENT,
            [
                ("Upload-Offset", acknowledged.to_string()),
                ("Tus-Resumable", "1.0.0".to_string()),
            ],
        )
            .into_response();
    }

    if method == Method::POST && path.starts_with("/rest/v1/") {
        let table = path.trim_start_matches("/rest/v1/").to_string();
        fake.records.push(RecordRequest {
            table,
            prefer: header(&headers, "prefer").unwrap_or_default().to_string(),
            body: serde_json::from_slice(&body).unwrap_or_default(),
        });
        if fake.reject_records {
            return (
                StatusCode::CONFLICT,
                axum::Json(json!({"code": "23505", "message": "duplicate key value violates unique constraint"})),
            )
                .into_response();
        }
        return StatusCode::CREATED.into_response();
    }

    (StatusCode::NOT_FOUND, format!("no route for {} {}", method, path)).into_response()
}
