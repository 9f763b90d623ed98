//! Session lifecycle for the authenticated principal: issuance, persistence,
//! lazy expiry and the guard placed in front of protected views.
//! Keep the public surface thin and split implementation across sub-modules.

mod clock;
mod credentials;
mod guard;
mod provider;
mod role;
mod session;
mod storage;
mod store;
mod token;

pub use clock::{Clock, ManualClock, SystemClock};
pub use credentials::{validate_credentials, CredentialError};
pub use guard::{GuardState, Redirect, SessionGuard, ViewOrRedirect, LOGIN_ROUTE};
pub use provider::{AuthClient, LoginRequest, PendingAdmin, RegisterRequest};
pub use role::Role;
pub use session::{Session, SessionToken, SESSION_TTL};
pub use storage::{FileStorage, MemoryStorage, SessionStorage, StorageError, SESSION_KEYS};
pub use store::{SessionStore, GUEST_PRINCIPAL};
pub use token::{decode_claims, TokenClaims, TokenError};
