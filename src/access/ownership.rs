use crate::api::{ResourceKind, ResourceListing};

use super::outcome::CheckOutcome;

/// Decides whether a record belongs to the principal by looking for it in the
/// principal's own listing. Nothing is cached: every call re-fetches.
pub struct OwnershipResolver<L> {
    listing: L,
}

impl<L: ResourceListing> OwnershipResolver<L> {
    pub fn new(listing: L) -> Self { Self { listing } }

    pub async fn is_owned(&self, kind: ResourceKind, id: i64) -> bool {
        self.resolve(kind, id).await.value
    }

    /// Ownership with the reason for a fail-closed `false`, if any.
    pub async fn resolve(&self, kind: ResourceKind, id: i64) -> CheckOutcome {
        match self.listing.list_mine(kind).await {
            Ok(records) => {
                let owned = records.iter().any(|r| r.id == id);
                tracing::debug!(target: "labkeeper::access", "ownership kind={} id={} owned={}", kind, id, owned);
                CheckOutcome::observed(owned)
            }
            Err(e) => {
                tracing::warn!(target: "labkeeper::access", "ownership fetch failed kind={} id={}: {}; denying", kind, id, e);
                CheckOutcome::fail_closed(false, format!("Failed to fetch your {}.", kind.plural_label()))
            }
        }
    }
}
