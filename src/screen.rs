//! One resource screen: session gate, then ownership and dependency checks for
//! the selected record, then the permission decision that enables or disables
//! mutation. Mutations are only sent when the decision allows them.

use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;

use serde_json::Value;

use crate::access::{Dependent, DependencyChecker, DependencyQuery, OwnershipResolver, PermissionDecision, PermissionEvaluator, PermissionInputs, FieldLock};
use crate::api::{ListedRecord, RecordMutations, ResourceKind, ResourceListing};
use crate::error::AppResult;
use crate::identity::{Redirect, Role, Session, SessionGuard, ViewOrRedirect};

pub const NOT_OWNER_DELETE: &str = "You are not the owner of this object. You can't delete it.";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Inspection {
    pub kind: ResourceKind,
    pub record_id: i64,
    pub principal: String,
    pub role: Role,
    pub owned: bool,
    pub has_dependents: bool,
    pub dependents: Vec<Dependent>,
    pub decision: PermissionDecision,
    /// Set when the ownership listing could not be fetched.
    pub ownership_notice: Option<String>,
    /// Set when a dependent listing could not be fetched.
    pub dependency_notice: Option<String>,
}

impl Inspection {
    /// Informational messages from checks that fell back to their fail-closed default.
    pub fn notices(&self) -> Vec<String> {
        self.ownership_notice.iter().chain(self.dependency_notice.iter()).cloned().collect()
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InspectOutcome {
    Ready(Inspection),
    /// The selection changed or the screen closed while checks were in flight.
    Stale,
    Redirect(Redirect),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MutationOutcome {
    Applied,
    /// Refused locally; the request was never sent.
    Refused(String),
    Stale,
    Redirect(Redirect),
}

pub struct ResourceScreen<L> {
    kind: ResourceKind,
    guard: Arc<SessionGuard>,
    backend: Arc<L>,
    ownership: OwnershipResolver<Arc<L>>,
    dependencies: DependencyChecker<Arc<L>>,
    evaluator: Arc<PermissionEvaluator>,
    selection: AtomicU64,
    closed: AtomicBool,
}

impl<L> ResourceScreen<L>
where
    L: ResourceListing + RecordMutations,
{
    pub fn new(kind: ResourceKind, guard: Arc<SessionGuard>, backend: Arc<L>, evaluator: Arc<PermissionEvaluator>) -> Self {
        Self {
            kind,
            guard,
            ownership: OwnershipResolver::new(backend.clone()),
            dependencies: DependencyChecker::new(backend.clone()),
            backend,
            evaluator,
            selection: AtomicU64::new(0),
            closed: AtomicBool::new(false),
        }
    }

    pub fn kind(&self) -> ResourceKind { self.kind }

    /// Screen activation: the session guard runs before anything is shown.
    pub fn activate(&self) -> ViewOrRedirect<Session> {
        self.closed.store(false, Ordering::SeqCst);
        self.guard.authorize(Session::clone)
    }

    /// Unmount. Results of checks still in flight are dropped on arrival.
    pub fn close(&self) {
        self.closed.store(true, Ordering::SeqCst);
        self.selection.fetch_add(1, Ordering::SeqCst);
    }

    /// Select `record` and resolve its permissions. Ownership and dependency
    /// checks are issued together; evaluation waits for both.
    pub async fn inspect(&self, record: &ListedRecord) -> InspectOutcome {
        let session = match self.guard.authorize(Session::clone) {
            ViewOrRedirect::View(s) => s,
            ViewOrRedirect::Redirect(r) => return InspectOutcome::Redirect(r),
        };
        let ticket = self.selection.fetch_add(1, Ordering::SeqCst) + 1;

        let query = DependencyQuery::for_delete(self.kind, record);
        let (owned, deps) = tokio::join!(
            self.ownership.resolve(self.kind, record.id),
            self.dependencies.check(query)
        );

        if self.closed.load(Ordering::SeqCst) || self.selection.load(Ordering::SeqCst) != ticket {
            tracing::debug!(target: "labkeeper::screen", "discarding stale checks for {} #{}", self.kind, record.id);
            return InspectOutcome::Stale;
        }

        let decision = self.evaluator.decide(&PermissionInputs {
            role: session.role,
            is_owned: owned.value,
            mutable: record.updateable,
            has_dependents: deps.has_dependents(),
        });
        tracing::debug!(target: "labkeeper::screen", "{} #{} principal={} owned={} deps={} edit={} delete={}",
            self.kind, record.id, session.principal_name, owned.value, deps.has_dependents(), decision.can_edit, decision.can_delete);

        InspectOutcome::Ready(Inspection {
            kind: self.kind,
            record_id: record.id,
            principal: session.principal_name,
            role: session.role,
            owned: owned.value,
            has_dependents: deps.has_dependents(),
            dependents: deps.dependents,
            decision,
            ownership_notice: owned.notice,
            dependency_notice: deps.outcome.notice,
        })
    }

    /// Delete `record` if the freshly computed decision allows it. A server
    /// rejection is returned as the error, message untouched.
    pub async fn delete(&self, record: &ListedRecord) -> AppResult<MutationOutcome> {
        let inspection = match self.inspect(record).await {
            InspectOutcome::Ready(i) => i,
            InspectOutcome::Stale => return Ok(MutationOutcome::Stale),
            InspectOutcome::Redirect(r) => return Ok(MutationOutcome::Redirect(r)),
        };
        if !inspection.decision.can_delete {
            return Ok(MutationOutcome::Refused(delete_refusal(&inspection)));
        }
        self.backend.delete(self.kind, record.id).await?;
        Ok(MutationOutcome::Applied)
    }

    /// Send `body` as the new state of `record`. Locked parts are reset to the
    /// record's current values before sending.
    pub async fn update(&self, record: &ListedRecord, body: &Value) -> AppResult<MutationOutcome> {
        let inspection = match self.inspect(record).await {
            InspectOutcome::Ready(i) => i,
            InspectOutcome::Stale => return Ok(MutationOutcome::Stale),
            InspectOutcome::Redirect(r) => return Ok(MutationOutcome::Redirect(r)),
        };
        if !inspection.decision.can_edit {
            return Ok(MutationOutcome::Refused(format!("You can only update your own {}.", self.kind.plural_label())));
        }
        let outgoing = apply_field_locks(record, body, &inspection.decision);
        if outgoing == record.to_json() {
            return Ok(MutationOutcome::Refused("Nothing to update: the changed fields are locked.".to_string()));
        }
        self.backend.update(self.kind, &outgoing).await?;
        Ok(MutationOutcome::Applied)
    }
}

fn delete_refusal(i: &Inspection) -> String {
    if !(i.owned || i.role.is_admin()) {
        return NOT_OWNER_DELETE.to_string();
    }
    if let Some(n) = &i.dependency_notice {
        return format!("{} Deletion is blocked until references can be checked.", n);
    }
    match i.kind {
        ResourceKind::Coordinates => "You cannot delete this coordinate because it is used in one of your lab works.".to_string(),
        ResourceKind::LabWork => "You cannot delete this lab work because its coordinate is used in another lab work.".to_string(),
        kind => {
            let users: Vec<String> = i.dependents.iter().map(|d| format!("{} #{}", d.kind, d.id)).collect();
            format!("You cannot delete this {} because it is referenced by {}.", kind, users.join(", "))
        }
    }
}

/// Merge `body` over `record`, keeping locked parts at their stored values.
fn apply_field_locks(record: &ListedRecord, body: &Value, decision: &PermissionDecision) -> Value {
    let current = record.to_json();
    let mut out = current.clone();
    let (Some(out_map), Some(body_map)) = (out.as_object_mut(), body.as_object()) else {
        return current;
    };
    for (k, v) in body_map {
        let lock = match k.as_str() {
            "id" => continue,
            "updateable" => decision.updateable_flag,
            _ => decision.fields,
        };
        if lock == FieldLock::Editable {
            out_map.insert(k.clone(), v.clone());
        }
    }
    out
}
