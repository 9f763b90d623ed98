use std::collections::BTreeMap;
use std::sync::Arc;

use chrono::{TimeZone, Utc};

use super::clock::{Clock, SystemClock};
use super::role::Role;
use super::session::Session;
use super::storage::{
    SessionStorage, KEY_AUTHORIZATION, KEY_AUTH_TIMESTAMP, KEY_IS_AUTHENTICATED, KEY_NAME, KEY_ROLE, SESSION_KEYS,
};
use crate::error::AppResult;

/// Principal shown when no session is stored.
pub const GUEST_PRINCIPAL: &str = "Guest";

/// Sole owner of session state. Login and logout are the only writers; every
/// read is a snapshot of what is currently persisted.
#[derive(Clone)]
pub struct SessionStore {
    storage: Arc<dyn SessionStorage>,
    clock: Arc<dyn Clock>,
}

impl SessionStore {
    pub fn new(storage: Arc<dyn SessionStorage>, clock: Arc<dyn Clock>) -> Self { Self { storage, clock } }

    pub fn with_system_clock(storage: Arc<dyn SessionStorage>) -> Self { Self::new(storage, Arc::new(SystemClock)) }

    pub fn clock(&self) -> &Arc<dyn Clock> { &self.clock }

    /// Record a fresh session issued now, replacing whatever was stored.
    pub fn login(&self, principal_name: &str, role: Role, token: &str) -> AppResult<Session> {
        let session = Session::new(principal_name, role, token, self.clock.now());
        self.storage.set_many(&[
            (KEY_AUTHORIZATION, session.bearer()),
            (KEY_ROLE, role.as_str().to_string()),
            (KEY_NAME, session.principal_name.clone()),
            (KEY_AUTH_TIMESTAMP, session.issued_at.timestamp_millis().to_string()),
            (KEY_IS_AUTHENTICATED, "true".to_string()),
        ])?;
        tracing::info!(target: "labkeeper::session", "session.login principal={} role={} expires_at={}", session.principal_name, role, session.expires_at());
        Ok(session)
    }

    /// Clear every persisted session value. Safe to call with nothing stored.
    pub fn logout(&self) -> AppResult<()> {
        let who = self.storage.get(KEY_NAME);
        self.storage.remove_many(&SESSION_KEYS)?;
        if let Some(who) = who {
            tracing::info!(target: "labkeeper::session", "session.logout principal={}", who);
        }
        Ok(())
    }

    /// The stored session, or `None` if any part is missing or malformed.
    /// All parts come from a single storage snapshot.
    pub fn session(&self) -> Option<Session> {
        session_from(&self.storage.snapshot())
    }

    /// A session exists and is younger than the TTL. No side effects.
    pub fn is_valid(&self) -> bool {
        let now = self.clock.now();
        self.session().map(|s| s.is_valid_at(now)).unwrap_or(false)
    }

    /// The stored session if it is still valid.
    pub fn valid_session(&self) -> Option<Session> {
        let now = self.clock.now();
        self.session().filter(|s| s.is_valid_at(now))
    }

    pub fn current_role(&self) -> Role {
        self.storage.get(KEY_ROLE).map(|r| Role::parse(&r)).unwrap_or_default()
    }

    pub fn current_principal(&self) -> String {
        self.storage.get(KEY_NAME).filter(|n| !n.is_empty()).unwrap_or_else(|| GUEST_PRINCIPAL.to_string())
    }

    /// Stored `Authorization` header value, if any.
    pub fn authorization(&self) -> Option<String> { self.storage.get(KEY_AUTHORIZATION) }

    /// Start-up scrub: anything short of a fully valid, flagged session is cleared.
    pub fn restore(&self) -> AppResult<Option<Session>> {
        let snap = self.storage.snapshot();
        let flagged = snap.get(KEY_IS_AUTHENTICATED).map(String::as_str) == Some("true");
        let now = self.clock.now();
        match session_from(&snap).filter(|s| s.is_valid_at(now)) {
            Some(s) if flagged => Ok(Some(s)),
            _ => {
                self.logout()?;
                Ok(None)
            }
        }
    }
}

fn session_from(values: &BTreeMap<String, String>) -> Option<Session> {
    let auth = values.get(KEY_AUTHORIZATION)?;
    let token = auth.strip_prefix("Bearer ").unwrap_or(auth).trim();
    if token.is_empty() { return None; }
    let ts_ms: i64 = values.get(KEY_AUTH_TIMESTAMP)?.trim().parse().ok()?;
    let issued_at = Utc.timestamp_millis_opt(ts_ms).single()?;
    let principal_name = values.get(KEY_NAME)?.clone();
    let role = Role::parse(values.get(KEY_ROLE)?);
    Some(Session::new(principal_name, role, token, issued_at))
}
