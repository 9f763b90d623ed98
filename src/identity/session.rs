use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

use super::role::Role;

/// Fixed lifetime of an authenticated session.
pub const SESSION_TTL: Duration = Duration::hours(3);

pub type SessionToken = String;

/// Snapshot of the authenticated principal. Replaced wholesale on re-login,
/// never updated field by field.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Session {
    pub principal_name: String,
    pub role: Role,
    pub token: SessionToken,
    pub issued_at: DateTime<Utc>,
}

impl Session {
    pub fn new(principal_name: impl Into<String>, role: Role, token: impl Into<SessionToken>, issued_at: DateTime<Utc>) -> Self {
        Self { principal_name: principal_name.into(), role, token: token.into(), issued_at }
    }

    pub fn expires_at(&self) -> DateTime<Utc> { self.issued_at + SESSION_TTL }

    /// Valid while `now - issued_at < SESSION_TTL`, compared at millisecond precision.
    pub fn is_valid_at(&self, now: DateTime<Utc>) -> bool {
        let age_ms = now.timestamp_millis() - self.issued_at.timestamp_millis();
        age_ms < SESSION_TTL.num_milliseconds()
    }

    /// Value sent in the `Authorization` header.
    pub fn bearer(&self) -> String { format!("Bearer {}", self.token) }
}
