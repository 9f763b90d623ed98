use serde::Serialize;

use crate::identity::Role;

use super::policy::{FieldLock, FieldRule, FieldRuleTable};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Action {
    Edit,
    Delete,
}

/// Allow/deny for one action. Admins act on anything, users only on their own
/// records; deletion additionally requires that nothing references the record,
/// whatever the role.
///
/// The record's `updateable` flag does not gate the action itself; it only
/// shapes field locks (see [`PermissionEvaluator::decide`]).
pub fn evaluate(role: Role, is_owned: bool, mutable: bool, has_dependents: bool, action: Action) -> bool {
    // Field locks only; see the rule table.
    let _ = mutable;
    let may_act = role.is_admin() || is_owned;
    match action {
        Action::Edit => may_act,
        Action::Delete => may_act && !has_dependents,
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PermissionInputs {
    pub role: Role,
    pub is_owned: bool,
    pub mutable: bool,
    pub has_dependents: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct PermissionDecision {
    pub can_edit: bool,
    pub can_delete: bool,
    pub fields: FieldLock,
    pub updateable_flag: FieldLock,
}

#[derive(Debug, Clone, Default)]
pub struct PermissionEvaluator {
    rules: FieldRuleTable,
}

impl PermissionEvaluator {
    pub fn new(rules: FieldRuleTable) -> Self { Self { rules } }

    pub fn rules(&self) -> &FieldRuleTable { &self.rules }

    pub fn decide(&self, i: &PermissionInputs) -> PermissionDecision {
        let can_edit = evaluate(i.role, i.is_owned, i.mutable, i.has_dependents, Action::Edit);
        let can_delete = evaluate(i.role, i.is_owned, i.mutable, i.has_dependents, Action::Delete);
        let rule = if can_edit { self.rules.lookup(i.role, i.is_owned, i.mutable) } else { FieldRule::LOCKED };
        PermissionDecision { can_edit, can_delete, fields: rule.fields, updateable_flag: rule.updateable_flag }
    }
}
