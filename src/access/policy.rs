//! Field-level lock rules keyed by (role, is owner, updateable flag).
//!
//! Whether a caller may invoke an edit at all is decided by the evaluator;
//! this table decides which parts of the record stay editable once they do.
//! Lookups that miss the table lock everything.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::identity::Role;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FieldLock {
    Editable,
    Locked,
}

impl FieldLock {
    pub fn is_editable(&self) -> bool { matches!(self, FieldLock::Editable) }
}

/// Lock state for ordinary fields and for the `updateable` flag itself.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct FieldRule {
    pub fields: FieldLock,
    pub updateable_flag: FieldLock,
}

impl FieldRule {
    pub const LOCKED: FieldRule = FieldRule { fields: FieldLock::Locked, updateable_flag: FieldLock::Locked };
    pub const OPEN: FieldRule = FieldRule { fields: FieldLock::Editable, updateable_flag: FieldLock::Editable };
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct RuleKey {
    pub admin: bool,
    pub owner: bool,
    pub mutable: bool,
}

impl RuleKey {
    pub fn new(role: Role, owner: bool, mutable: bool) -> Self { Self { admin: role.is_admin(), owner, mutable } }
}

/// One row of the on-disk rule format.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RuleEntry {
    pub role: Role,
    pub owner: bool,
    pub mutable: bool,
    pub fields: FieldLock,
    pub updateable_flag: FieldLock,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldRuleTable {
    rules: BTreeMap<RuleKey, FieldRule>,
}

impl Default for FieldRuleTable {
    /// Owners edit their own records in full. Non-owning users edit nothing.
    /// Admins may edit, but never flip `updateable`, and are held to a
    /// record's own lock when they do not own it.
    fn default() -> Self {
        use FieldLock::{Editable, Locked};
        let mut t = FieldRuleTable::empty();
        for mutable in [true, false] {
            t.set(RuleKey::new(Role::User, true, mutable), FieldRule::OPEN);
            t.set(RuleKey::new(Role::User, false, mutable), FieldRule::LOCKED);
            t.set(RuleKey::new(Role::Admin, true, mutable), FieldRule { fields: Editable, updateable_flag: Locked });
        }
        t.set(RuleKey::new(Role::Admin, false, true), FieldRule { fields: Editable, updateable_flag: Locked });
        t.set(RuleKey::new(Role::Admin, false, false), FieldRule::LOCKED);
        t
    }
}

impl FieldRuleTable {
    pub fn empty() -> Self { Self { rules: BTreeMap::new() } }

    pub fn set(&mut self, key: RuleKey, rule: FieldRule) { self.rules.insert(key, rule); }

    pub fn lookup(&self, role: Role, owner: bool, mutable: bool) -> FieldRule {
        self.rules.get(&RuleKey::new(role, owner, mutable)).copied().unwrap_or(FieldRule::LOCKED)
    }

    /// Parse a JSON array of [`RuleEntry`] rows laid over the default table.
    pub fn from_json(text: &str) -> Result<Self, serde_json::Error> {
        let entries: Vec<RuleEntry> = serde_json::from_str(text)?;
        let mut t = FieldRuleTable::default();
        for e in entries {
            t.set(RuleKey::new(e.role, e.owner, e.mutable), FieldRule { fields: e.fields, updateable_flag: e.updateable_flag });
        }
        Ok(t)
    }

    pub fn entries(&self) -> Vec<RuleEntry> {
        self.rules
            .iter()
            .map(|(k, r)| RuleEntry {
                role: if k.admin { Role::Admin } else { Role::User },
                owner: k.owner,
                mutable: k.mutable,
                fields: r.fields,
                updateable_flag: r.updateable_flag,
            })
            .collect()
    }
}
