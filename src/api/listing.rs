use std::collections::HashMap;
use std::future::Future;
use std::sync::atomic::{AtomicUsize, Ordering};

use parking_lot::RwLock;
use serde_json::Value;

use super::record::ListedRecord;
use super::resource::ResourceKind;
use crate::error::{AppError, AppResult};

/// Source of the principal's own records, one listing per resource kind.
/// Implemented over HTTP by [`crate::api::ApiClient`].
pub trait ResourceListing: Send + Sync {
    fn list_mine(&self, kind: ResourceKind) -> impl Future<Output = AppResult<Vec<ListedRecord>>> + Send;
}

impl<T: ResourceListing> ResourceListing for std::sync::Arc<T> {
    fn list_mine(&self, kind: ResourceKind) -> impl Future<Output = AppResult<Vec<ListedRecord>>> + Send {
        (**self).list_mine(kind)
    }
}

/// In-memory listing with per-kind failure injection, also accepting mutations. Counts calls so tests
/// can assert that nothing is cached.
#[derive(Debug, Default)]
pub struct StaticListing {
    records: RwLock<HashMap<ResourceKind, Vec<ListedRecord>>>,
    failing: RwLock<HashMap<ResourceKind, AppError>>,
    rejecting: RwLock<Option<AppError>>,
    calls: AtomicUsize,
}

impl StaticListing {
    pub fn new() -> Self { Self::default() }

    pub fn with(self, kind: ResourceKind, records: Vec<ListedRecord>) -> Self {
        self.records.write().insert(kind, records);
        self
    }

    pub fn set(&self, kind: ResourceKind, records: Vec<ListedRecord>) {
        self.records.write().insert(kind, records);
    }

    pub fn fail(&self, kind: ResourceKind, err: AppError) {
        self.failing.write().insert(kind, err);
    }

    pub fn heal(&self, kind: ResourceKind) {
        self.failing.write().remove(&kind);
    }

    /// Make every subsequent mutation fail with `err`, as a server rejection would.
    pub fn reject_mutations(&self, err: AppError) {
        *self.rejecting.write() = Some(err);
    }

    pub fn records(&self, kind: ResourceKind) -> Vec<ListedRecord> {
        self.records.read().get(&kind).cloned().unwrap_or_default()
    }

    pub fn calls(&self) -> usize { self.calls.load(Ordering::SeqCst) }
}

impl ResourceListing for StaticListing {
    async fn list_mine(&self, kind: ResourceKind) -> AppResult<Vec<ListedRecord>> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if let Some(err) = self.failing.read().get(&kind) {
            return Err(err.clone());
        }
        Ok(self.records.read().get(&kind).cloned().unwrap_or_default())
    }
}

/// Mutating calls. The server stays the authority and may still reject.
pub trait RecordMutations: Send + Sync {
    fn update(&self, kind: ResourceKind, body: &Value) -> impl Future<Output = AppResult<()>> + Send;

    fn delete(&self, kind: ResourceKind, id: i64) -> impl Future<Output = AppResult<()>> + Send;
}

impl<T: RecordMutations> RecordMutations for std::sync::Arc<T> {
    fn update(&self, kind: ResourceKind, body: &Value) -> impl Future<Output = AppResult<()>> + Send {
        (**self).update(kind, body)
    }

    fn delete(&self, kind: ResourceKind, id: i64) -> impl Future<Output = AppResult<()>> + Send {
        (**self).delete(kind, id)
    }
}

impl RecordMutations for StaticListing {
    async fn update(&self, kind: ResourceKind, body: &Value) -> AppResult<()> {
        if let Some(err) = self.rejecting.read().clone() {
            return Err(err);
        }
        let rec: ListedRecord = serde_json::from_value(body.clone())
            .map_err(|e| AppError::rejected("http_400", e.to_string()))?;
        let mut m = self.records.write();
        let list = m.entry(kind).or_default();
        match list.iter_mut().find(|r| r.id == rec.id) {
            Some(slot) => {
                *slot = rec;
                Ok(())
            }
            None => Err(AppError::not_found("not_found", format!("{} #{} not found", kind, rec.id))),
        }
    }

    async fn delete(&self, kind: ResourceKind, id: i64) -> AppResult<()> {
        if let Some(err) = self.rejecting.read().clone() {
            return Err(err);
        }
        let mut m = self.records.write();
        let list = m.entry(kind).or_default();
        let before = list.len();
        list.retain(|r| r.id != id);
        if list.len() == before {
            return Err(AppError::not_found("not_found", format!("{} #{} not found", kind, id)));
        }
        Ok(())
    }
}
