//! Referential-integrity checks run before a delete.
//!
//! A referenced record with at least one incoming reference from an existing
//! dependent must not be deleted; nothing cascades. Dependents are discovered
//! by scanning the principal's own listing of each dependent kind.

use futures_util::future::join_all;

use crate::api::{ListedRecord, ResourceKind, ResourceListing};

use super::outcome::CheckOutcome;

/// Directed reference `dependent.field -> referenced`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DependencyEdge {
    pub dependent: ResourceKind,
    pub referenced: ResourceKind,
    pub field: &'static str,
    pub required: bool,
}

pub static DEPENDENCY_EDGES: [DependencyEdge; 4] = [
    DependencyEdge { dependent: ResourceKind::LabWork, referenced: ResourceKind::Coordinates, field: "coordinates", required: true },
    DependencyEdge { dependent: ResourceKind::LabWork, referenced: ResourceKind::Discipline, field: "discipline", required: false },
    DependencyEdge { dependent: ResourceKind::LabWork, referenced: ResourceKind::Person, field: "author", required: false },
    DependencyEdge { dependent: ResourceKind::Person, referenced: ResourceKind::Location, field: "location", required: false },
];

pub fn edges_into(kind: ResourceKind) -> impl Iterator<Item = &'static DependencyEdge> {
    DEPENDENCY_EDGES.iter().filter(move |e| e.referenced == kind)
}

/// Which references to look for, and which single dependent record (if any)
/// must not count against itself.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DependencyQuery {
    pub referenced: ResourceKind,
    pub id: i64,
    pub exclude: Option<(ResourceKind, i64)>,
}

impl DependencyQuery {
    pub fn new(referenced: ResourceKind, id: i64) -> Self { Self { referenced, id, exclude: None } }

    pub fn excluding(mut self, kind: ResourceKind, id: i64) -> Self {
        self.exclude = Some((kind, id));
        self
    }

    /// Query that gates deleting `record`. A lab work is blocked while its
    /// coordinates are shared with another lab work; the lab work itself is
    /// excluded from the count. Every other kind is blocked by direct references.
    pub fn for_delete(kind: ResourceKind, record: &ListedRecord) -> Self {
        if kind == ResourceKind::LabWork {
            if let Some(coords) = record.reference_id("coordinates") {
                return DependencyQuery::new(ResourceKind::Coordinates, coords).excluding(ResourceKind::LabWork, record.id);
            }
        }
        DependencyQuery::new(kind, record.id)
    }
}

/// A dependent found referencing the queried record.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Dependent {
    pub kind: ResourceKind,
    pub id: i64,
    pub field: &'static str,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DependencyReport {
    pub outcome: CheckOutcome,
    pub dependents: Vec<Dependent>,
}

impl DependencyReport {
    pub fn has_dependents(&self) -> bool { self.outcome.value }
}

pub struct DependencyChecker<L> {
    listing: L,
}

impl<L: ResourceListing> DependencyChecker<L> {
    pub fn new(listing: L) -> Self { Self { listing } }

    pub async fn has_dependents(&self, kind: ResourceKind, id: i64) -> bool {
        self.check(DependencyQuery::new(kind, id)).await.has_dependents()
    }

    pub async fn has_dependents_excluding(&self, kind: ResourceKind, id: i64, exclude_kind: ResourceKind, exclude_id: i64) -> bool {
        self.check(DependencyQuery::new(kind, id).excluding(exclude_kind, exclude_id)).await.has_dependents()
    }

    pub async fn check(&self, query: DependencyQuery) -> DependencyReport {
        let edges: Vec<&'static DependencyEdge> = edges_into(query.referenced).collect();
        let mut kinds: Vec<ResourceKind> = edges.iter().map(|e| e.dependent).collect();
        kinds.sort();
        kinds.dedup();

        let fetched = join_all(kinds.iter().map(|k| self.listing.list_mine(*k))).await;

        let mut dependents = Vec::new();
        let mut failed: Vec<ResourceKind> = Vec::new();
        for (kind, result) in kinds.iter().zip(fetched) {
            let records = match result {
                Ok(r) => r,
                Err(e) => {
                    tracing::warn!(target: "labkeeper::access", "dependency fetch failed kind={} for {} #{}: {}; blocking delete", kind, query.referenced, query.id, e);
                    failed.push(*kind);
                    continue;
                }
            };
            for edge in edges.iter().filter(|e| e.dependent == *kind) {
                for rec in &records {
                    if query.exclude == Some((edge.dependent, rec.id)) { continue; }
                    if rec.reference_id(edge.field) == Some(query.id) {
                        dependents.push(Dependent { kind: edge.dependent, id: rec.id, field: edge.field });
                    }
                }
            }
        }

        let outcome = match failed.first() {
            Some(kind) => CheckOutcome::fail_closed(true, format!("Failed to fetch your {}.", kind.plural_label())),
            None => CheckOutcome::observed(!dependents.is_empty()),
        };
        tracing::debug!(target: "labkeeper::access", "dependencies of {} #{}: {} found, blocked={}", query.referenced, query.id, dependents.len(), outcome.value);
        DependencyReport { outcome, dependents }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::StaticListing;
    use crate::error::AppError;

    fn lab(id: i64, coords: i64) -> ListedRecord { ListedRecord::new(id, true).with_ref("coordinates", coords) }

    #[test]
    fn edges_cover_the_reference_graph() {
        let into_person: Vec<_> = edges_into(ResourceKind::Person).collect();
        assert_eq!(into_person.len(), 1);
        assert_eq!(into_person[0].field, "author");
        assert_eq!(edges_into(ResourceKind::LabWork).count(), 0);
        assert_eq!(edges_into(ResourceKind::Location).next().map(|e| e.dependent), Some(ResourceKind::Person));
    }

    #[tokio::test]
    async fn referenced_coordinates_are_blocked() {
        let listing = StaticListing::new().with(ResourceKind::LabWork, vec![lab(9, 5), lab(10, 6)]);
        let c = DependencyChecker::new(listing);
        let report = c.check(DependencyQuery::new(ResourceKind::Coordinates, 5)).await;
        assert!(report.has_dependents());
        assert_eq!(report.dependents, vec![Dependent { kind: ResourceKind::LabWork, id: 9, field: "coordinates" }]);
        assert!(!c.has_dependents(ResourceKind::Coordinates, 7).await);
    }

    #[tokio::test]
    async fn self_reference_is_excluded_but_others_count() {
        let listing = StaticListing::new().with(ResourceKind::LabWork, vec![lab(9, 5)]);
        let c = DependencyChecker::new(listing);
        assert!(!c.has_dependents_excluding(ResourceKind::Coordinates, 5, ResourceKind::LabWork, 9).await);

        let listing = StaticListing::new().with(ResourceKind::LabWork, vec![lab(9, 5), lab(11, 5)]);
        let c = DependencyChecker::new(listing);
        assert!(c.has_dependents_excluding(ResourceKind::Coordinates, 5, ResourceKind::LabWork, 9).await);
    }

    #[tokio::test]
    async fn optional_references_may_be_null() {
        let people = vec![
            ListedRecord::new(3, true).with_field("location", serde_json::Value::Null),
            ListedRecord::new(4, true).with_ref("location", 8),
        ];
        let c = DependencyChecker::new(StaticListing::new().with(ResourceKind::Person, people));
        assert!(c.has_dependents(ResourceKind::Location, 8).await);
        assert!(!c.has_dependents(ResourceKind::Location, 3).await);
    }

    #[tokio::test]
    async fn lab_work_author_blocks_person() {
        let labs = vec![
            ListedRecord::new(9, true).with_ref("coordinates", 5).with_ref("author", 3),
            ListedRecord::new(10, true).with_ref("coordinates", 6).with_field("author", serde_json::Value::Null),
        ];
        let c = DependencyChecker::new(StaticListing::new().with(ResourceKind::LabWork, labs));
        let report = c.check(DependencyQuery::new(ResourceKind::Person, 3)).await;
        assert_eq!(report.dependents, vec![Dependent { kind: ResourceKind::LabWork, id: 9, field: "author" }]);
        assert!(!c.has_dependents(ResourceKind::Person, 4).await);
    }

    #[tokio::test]
    async fn lab_work_discipline_blocks_discipline() {
        let labs = vec![
            ListedRecord::new(9, true).with_ref("coordinates", 5).with_ref("discipline", 2),
            ListedRecord::new(10, true).with_ref("coordinates", 6).with_field("discipline", serde_json::Value::Null),
        ];
        let c = DependencyChecker::new(StaticListing::new().with(ResourceKind::LabWork, labs));
        let report = c.check(DependencyQuery::new(ResourceKind::Discipline, 2)).await;
        assert_eq!(report.dependents, vec![Dependent { kind: ResourceKind::LabWork, id: 9, field: "discipline" }]);
        assert!(!report.outcome.is_degraded());
        assert!(!c.has_dependents(ResourceKind::Discipline, 7).await);
    }

    #[tokio::test]
    async fn fetch_failure_blocks() {
        let listing = StaticListing::new();
        listing.fail(ResourceKind::LabWork, AppError::upstream("http_500", "boom"));
        let c = DependencyChecker::new(listing);
        let report = c.check(DependencyQuery::new(ResourceKind::Discipline, 1)).await;
        assert!(report.has_dependents());
        assert!(report.outcome.is_degraded());
        assert_eq!(report.outcome.notice.as_deref(), Some("Failed to fetch your lab works."));
    }

    #[tokio::test]
    async fn nothing_depends_on_unreferenced_kinds() {
        let listing = StaticListing::new();
        listing.fail(ResourceKind::LabWork, AppError::upstream("http_500", "boom"));
        let c = DependencyChecker::new(listing);
        assert!(!c.has_dependents(ResourceKind::LabWork, 9).await);
    }

    #[test]
    fn delete_query_for_lab_work_targets_its_coordinates() {
        let q = DependencyQuery::for_delete(ResourceKind::LabWork, &lab(9, 5));
        assert_eq!(q, DependencyQuery::new(ResourceKind::Coordinates, 5).excluding(ResourceKind::LabWork, 9));
        let q = DependencyQuery::for_delete(ResourceKind::Person, &ListedRecord::new(3, false));
        assert_eq!(q, DependencyQuery::new(ResourceKind::Person, 3));
    }
}
