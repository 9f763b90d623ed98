//! In-process stand-in for the lab-record REST API, served by axum on an
//! ephemeral port. Records carry an owner; `/my` listings filter on the
//! principal named in the bearer token.

#![allow(dead_code)]

use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use axum::extract::{Path, State};
use axum::http::{HeaderMap, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post, put};
use axum::{Json, Router};
use base64::Engine;
use parking_lot::Mutex;
use reqwest::Url;
use serde_json::{json, Value};

use labkeeper::identity::decode_claims;

#[derive(Default)]
pub struct MockBackend {
    /// collection -> (owner, record)
    records: Mutex<HashMap<String, Vec<(String, Value)>>>,
    users: Mutex<HashMap<String, (String, String)>>,
    failing: Mutex<HashSet<String>>,
    rejection: Mutex<Option<String>>,
    listing_delay: Mutex<Option<Duration>>,
    /// Admin registrations awaiting approval: (id, username).
    pending_admins: Mutex<Vec<(i64, String)>>,
    pub mutations: AtomicUsize,
}

impl MockBackend {
    pub fn user(&self, name: &str, password: &str, role: &str) {
        self.users.lock().insert(name.to_string(), (password.to_string(), role.to_string()));
    }

    pub fn insert(&self, collection: &str, owner: &str, record: Value) {
        self.records.lock().entry(collection.to_string()).or_default().push((owner.to_string(), record));
    }

    pub fn contains(&self, collection: &str, id: i64) -> bool {
        self.find(collection, id).is_some()
    }

    pub fn find(&self, collection: &str, id: i64) -> Option<Value> {
        self.records
            .lock()
            .get(collection)
            .and_then(|rs| rs.iter().find(|(_, r)| r["id"] == id).map(|(_, r)| r.clone()))
    }

    /// Make `/{collection}/my` answer 500.
    pub fn fail_listing(&self, collection: &str) {
        self.failing.lock().insert(collection.to_string());
    }

    /// Make every PUT/DELETE answer 409 with `message`.
    pub fn reject_mutations(&self, message: &str) {
        *self.rejection.lock() = Some(message.to_string());
    }

    pub fn delay_listings(&self, by: Duration) {
        *self.listing_delay.lock() = Some(by);
    }

    pub fn pending_admin(&self, id: i64, username: &str) {
        self.pending_admins.lock().push((id, username.to_string()));
    }

    pub fn pending_admin_names(&self) -> Vec<String> {
        self.pending_admins.lock().iter().map(|(_, n)| n.clone()).collect()
    }

    pub fn mutation_count(&self) -> usize { self.mutations.load(Ordering::SeqCst) }
}

pub fn token_for(sub: &str, role: &str) -> String {
    let enc = base64::engine::general_purpose::URL_SAFE_NO_PAD;
    let header = enc.encode(br#"{"alg":"HS256","typ":"JWT"}"#);
    let payload = enc.encode(json!({"sub": sub, "role": role}).to_string());
    format!("{}.{}.c2lnbmF0dXJl", header, payload)
}

fn message(status: StatusCode, msg: &str) -> Response {
    (status, Json(json!({"message": msg}))).into_response()
}

fn principal(headers: &HeaderMap) -> Option<String> {
    let auth = headers.get("authorization")?.to_str().ok()?;
    decode_claims(auth).ok().map(|c| c.principal)
}

fn is_admin(headers: &HeaderMap) -> bool {
    headers
        .get("authorization")
        .and_then(|v| v.to_str().ok())
        .and_then(|a| decode_claims(a).ok())
        .is_some_and(|c| c.role.is_admin())
}

async fn login(State(b): State<Arc<MockBackend>>, Json(body): Json<Value>) -> Response {
    let username = body["username"].as_str().unwrap_or_default().to_string();
    let password = body["password"].as_str().unwrap_or_default();
    let known = b.users.lock().get(&username).cloned();
    match known {
        Some((pw, role)) if pw == password => {
            (StatusCode::OK, Json(json!({"token": token_for(&username, &role), "message": "ok"}))).into_response()
        }
        _ => message(StatusCode::UNAUTHORIZED, "Invalid username or password"),
    }
}

async fn register(State(b): State<Arc<MockBackend>>, Json(body): Json<Value>) -> Response {
    let username = body["username"].as_str().unwrap_or_default().to_string();
    let password = body["password"].as_str().unwrap_or_default().to_string();
    let role = body["role"].as_str().unwrap_or("USER").to_string();
    let mut users = b.users.lock();
    if users.contains_key(&username) {
        return message(StatusCode::CONFLICT, "User already exists");
    }
    if role == "ADMIN" {
        let mut pending = b.pending_admins.lock();
        let next = pending.iter().map(|(id, _)| *id).max().unwrap_or(0) + 1;
        pending.push((next, username.clone()));
    }
    users.insert(username, (password, role));
    (StatusCode::CREATED, Json(json!({"message": "registered"}))).into_response()
}

async fn unconfirmed_admins(State(b): State<Arc<MockBackend>>, headers: HeaderMap) -> Response {
    if !is_admin(&headers) {
        return message(StatusCode::FORBIDDEN, "Forbidden");
    }
    let pending: Vec<Value> = b.pending_admins.lock().iter().map(|(id, n)| json!({"id": id, "username": n})).collect();
    if pending.is_empty() {
        return message(StatusCode::NOT_FOUND, "No unconfirmed admins");
    }
    Json(pending).into_response()
}

async fn confirm_admin(State(b): State<Arc<MockBackend>>, Path(id): Path<i64>, headers: HeaderMap) -> Response {
    if !is_admin(&headers) {
        return message(StatusCode::FORBIDDEN, "Forbidden");
    }
    let mut pending = b.pending_admins.lock();
    let before = pending.len();
    pending.retain(|(p, _)| *p != id);
    if pending.len() == before {
        return message(StatusCode::NOT_FOUND, "Admin not found");
    }
    StatusCode::OK.into_response()
}

async fn list_mine(State(b): State<Arc<MockBackend>>, Path(collection): Path<String>, headers: HeaderMap) -> Response {
    let delay = *b.listing_delay.lock();
    if let Some(d) = delay {
        tokio::time::sleep(d).await;
    }
    let Some(who) = principal(&headers) else {
        return message(StatusCode::UNAUTHORIZED, "Unauthorized");
    };
    if b.failing.lock().contains(&collection) {
        return message(StatusCode::INTERNAL_SERVER_ERROR, "listing unavailable");
    }
    let mine: Vec<Value> = b
        .records
        .lock()
        .get(&collection)
        .map(|rs| rs.iter().filter(|(o, _)| *o == who).map(|(_, r)| r.clone()).collect())
        .unwrap_or_default();
    Json(mine).into_response()
}

async fn get_one(State(b): State<Arc<MockBackend>>, Path((collection, id)): Path<(String, i64)>) -> Response {
    match b.find(&collection, id) {
        Some(r) => Json(r).into_response(),
        None => message(StatusCode::NOT_FOUND, "Not found"),
    }
}

async fn update(State(b): State<Arc<MockBackend>>, Path(collection): Path<String>, Json(body): Json<Value>) -> Response {
    b.mutations.fetch_add(1, Ordering::SeqCst);
    if let Some(msg) = b.rejection.lock().clone() {
        return message(StatusCode::CONFLICT, &msg);
    }
    let mut records = b.records.lock();
    let Some(slot) = records.get_mut(&collection).and_then(|rs| rs.iter_mut().find(|(_, r)| r["id"] == body["id"])) else {
        return message(StatusCode::NOT_FOUND, "Not found");
    };
    slot.1 = body;
    StatusCode::OK.into_response()
}

async fn delete(State(b): State<Arc<MockBackend>>, Path((collection, id)): Path<(String, i64)>) -> Response {
    b.mutations.fetch_add(1, Ordering::SeqCst);
    if let Some(msg) = b.rejection.lock().clone() {
        return message(StatusCode::CONFLICT, &msg);
    }
    let mut records = b.records.lock();
    let Some(rs) = records.get_mut(&collection) else {
        return message(StatusCode::NOT_FOUND, "Not found");
    };
    let before = rs.len();
    rs.retain(|(_, r)| r["id"] != id);
    if rs.len() == before {
        return message(StatusCode::NOT_FOUND, "Not found");
    }
    StatusCode::NO_CONTENT.into_response()
}

/// Serve `backend` on 127.0.0.1 and return the API base URL.
pub async fn serve(backend: Arc<MockBackend>) -> anyhow::Result<Url> {
    let app = Router::new()
        .route("/api/v1/auth/login", post(login))
        .route("/api/v1/auth/register", post(register))
        .route("/api/v1/admin/unconfirmed", get(unconfirmed_admins))
        .route("/api/v1/admin/confirm/{id}", put(confirm_admin))
        .route("/api/v1/{collection}", put(update))
        .route("/api/v1/{collection}/my", get(list_mine))
        .route("/api/v1/{collection}/{id}", get(get_one).delete(delete))
        .with_state(backend);
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await?;
    let addr = listener.local_addr()?;
    tokio::spawn(async move {
        let _ = axum::serve(listener, app).await;
    });
    Ok(Url::parse(&format!("http://{}/api/v1/", addr))?)
}
