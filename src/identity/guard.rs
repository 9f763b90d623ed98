use parking_lot::Mutex;

use super::session::Session;
use super::store::SessionStore;

/// Entry point unauthenticated callers are sent to.
pub const LOGIN_ROUTE: &str = "/auth";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GuardState {
    Authorized,
    Unauthorized,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Redirect {
    pub to: &'static str,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ViewOrRedirect<V> {
    View(V),
    Redirect(Redirect),
}

impl<V> ViewOrRedirect<V> {
    pub fn is_redirect(&self) -> bool { matches!(self, ViewOrRedirect::Redirect(_)) }

    pub fn view(self) -> Option<V> {
        match self {
            ViewOrRedirect::View(v) => Some(v),
            ViewOrRedirect::Redirect(_) => None,
        }
    }
}

/// Gate in front of protected views. Expiry is detected lazily: the session is
/// re-checked on every activation, never on a timer.
pub struct SessionGuard {
    store: SessionStore,
    state: Mutex<GuardState>,
}

impl SessionGuard {
    pub fn new(store: SessionStore) -> Self {
        let initial = if store.is_valid() { GuardState::Authorized } else { GuardState::Unauthorized };
        Self { store, state: Mutex::new(initial) }
    }

    pub fn store(&self) -> &SessionStore { &self.store }

    /// State as of the last activation.
    pub fn state(&self) -> GuardState { *self.state.lock() }

    /// Render the protected view for a valid session, otherwise scrub stored
    /// state and redirect to login.
    pub fn authorize<V, F>(&self, view: F) -> ViewOrRedirect<V>
    where
        F: FnOnce(&Session) -> V,
    {
        match self.store.valid_session() {
            Some(session) => {
                self.transition(GuardState::Authorized);
                ViewOrRedirect::View(view(&session))
            }
            None => {
                if let Err(e) = self.store.logout() {
                    tracing::warn!(target: "labkeeper::guard", "logout after expiry failed: {}", e);
                }
                self.transition(GuardState::Unauthorized);
                ViewOrRedirect::Redirect(Redirect { to: LOGIN_ROUTE })
            }
        }
    }

    fn transition(&self, next: GuardState) {
        let mut g = self.state.lock();
        if *g != next {
            tracing::info!(target: "labkeeper::guard", "guard {:?} -> {:?}", *g, next);
            *g = next;
        }
    }
}
