use reqwest::header::{HeaderMap, HeaderValue, AUTHORIZATION, CONTENT_TYPE};
use reqwest::Url;
use serde_json::Value;

use super::listing::{RecordMutations, ResourceListing};
use super::record::ListedRecord;
use super::resource::ResourceKind;
use crate::error::{AppError, AppResult};
use crate::identity::SessionStore;

const FALLBACK_FAILURE: &str = "An error occurred.";

/// HTTP client for the resource endpoints. Every request carries the
/// `Authorization` value currently persisted by the session store, so a
/// re-login is picked up without rebuilding the client.
#[derive(Clone)]
pub struct ApiClient {
    base: Url,
    client: reqwest::Client,
    store: SessionStore,
}

impl ApiClient {
    pub fn new(base: Url, store: SessionStore) -> Self {
        Self { base, client: reqwest::Client::new(), store }
    }

    pub fn base(&self) -> &Url { &self.base }

    fn url(&self, path: &str) -> AppResult<Url> {
        self.base.join(path).map_err(|e| AppError::internal("bad_url", format!("{}: {}", path, e)))
    }

    fn headers(&self) -> AppResult<HeaderMap> {
        let mut headers = HeaderMap::new();
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
        if let Some(auth) = self.store.authorization() {
            let v = HeaderValue::from_str(&auth)
                .map_err(|_| AppError::auth("bad_authorization", "stored authorization is not a valid header value"))?;
            headers.insert(AUTHORIZATION, v);
        }
        Ok(headers)
    }

    pub async fn list_mine(&self, kind: ResourceKind) -> AppResult<Vec<ListedRecord>> {
        let url = self.url(&kind.my_path())?;
        let resp = self.client.get(url).headers(self.headers()?).send().await?;
        if !resp.status().is_success() {
            return Err(failure_from_response(resp).await);
        }
        let records: Vec<ListedRecord> = resp.json().await?;
        tracing::debug!(target: "labkeeper::api", "list_mine kind={} count={}", kind, records.len());
        Ok(records)
    }

    /// Fetch a single record by id, whoever owns it.
    pub async fn get(&self, kind: ResourceKind, id: i64) -> AppResult<ListedRecord> {
        let url = self.url(&kind.record_path(id))?;
        let resp = self.client.get(url).headers(self.headers()?).send().await?;
        if !resp.status().is_success() {
            return Err(failure_from_response(resp).await);
        }
        Ok(resp.json().await?)
    }

    /// PUT the full record body to the collection endpoint.
    pub async fn update(&self, kind: ResourceKind, body: &Value) -> AppResult<()> {
        let url = self.url(kind.collection())?;
        let resp = self.client.put(url).headers(self.headers()?).json(body).send().await?;
        if !resp.status().is_success() {
            return Err(failure_from_response(resp).await);
        }
        let id = body.get("id").cloned().unwrap_or_default();
        tracing::info!(target: "labkeeper::api", "update kind={} id={}", kind, id);
        Ok(())
    }

    pub async fn delete(&self, kind: ResourceKind, id: i64) -> AppResult<()> {
        let url = self.url(&kind.record_path(id))?;
        let resp = self.client.delete(url).headers(self.headers()?).send().await?;
        if !resp.status().is_success() {
            return Err(failure_from_response(resp).await);
        }
        tracing::info!(target: "labkeeper::api", "delete kind={} id={}", kind, id);
        Ok(())
    }
}

impl ResourceListing for ApiClient {
    async fn list_mine(&self, kind: ResourceKind) -> AppResult<Vec<ListedRecord>> {
        ApiClient::list_mine(self, kind).await
    }
}

impl RecordMutations for ApiClient {
    async fn update(&self, kind: ResourceKind, body: &Value) -> AppResult<()> {
        ApiClient::update(self, kind, body).await
    }

    async fn delete(&self, kind: ResourceKind, id: i64) -> AppResult<()> {
        ApiClient::delete(self, kind, id).await
    }
}

/// Turn a non-success response into an error carrying the server's own words:
/// the JSON `message` field when present, else the raw body text.
pub(crate) async fn failure_from_response(resp: reqwest::Response) -> AppError {
    let status = resp.status().as_u16();
    let is_json = resp
        .headers()
        .get(CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .map(|ct| ct.contains("application/json"))
        .unwrap_or(false);
    let text = resp.text().await.unwrap_or_default();
    AppError::from_http_status(status, failure_message(is_json, &text))
}

fn failure_message(is_json: bool, body: &str) -> String {
    if is_json {
        if let Ok(v) = serde_json::from_str::<Value>(body) {
            if let Some(m) = v.get("message").and_then(Value::as_str).filter(|m| !m.is_empty()) {
                return m.to_string();
            }
        }
    }
    let trimmed = body.trim();
    if trimmed.is_empty() { FALLBACK_FAILURE.to_string() } else { trimmed.to_string() }
}
