use reqwest::header::AUTHORIZATION;
use reqwest::Url;
use serde::{Deserialize, Serialize};

use super::credentials::validate_credentials;
use super::role::Role;
use super::session::Session;
use super::store::SessionStore;
use super::token::decode_claims;
use crate::api::client::failure_from_response;
use crate::error::{AppError, AppResult};

#[derive(Debug, Clone)]
pub struct LoginRequest {
    pub username: String,
    pub password: String,
}

#[derive(Debug, Clone)]
pub struct RegisterRequest {
    pub username: String,
    pub password: String,
    pub confirm_password: String,
    pub role: Role,
}

#[derive(Debug, Deserialize)]
struct LoginBody {
    #[serde(default)]
    token: Option<String>,
    #[serde(default)]
    message: Option<String>,
}

/// An administrator account waiting for approval.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PendingAdmin {
    pub id: i64,
    pub username: String,
}

/// Client for the auth service. A successful login is the only path that
/// creates a session.
pub struct AuthClient {
    base: Url,
    client: reqwest::Client,
    store: SessionStore,
}

impl AuthClient {
    pub fn new(base: Url, store: SessionStore) -> Self {
        Self { base, client: reqwest::Client::new(), store }
    }

    pub async fn login(&self, req: &LoginRequest) -> AppResult<Session> {
        validate_credentials(&req.username, &req.password, None)
            .map_err(|e| AppError::user("invalid_credentials_format", e.to_string()))?;
        let url = self.base.join("auth/login").map_err(|e| AppError::internal("bad_url", e.to_string()))?;
        let resp = self.client
            .post(url)
            .json(&serde_json::json!({"username": req.username, "password": req.password}))
            .send()
            .await?;
        if !(resp.status().as_u16() == 200 || resp.status().as_u16() == 201) {
            let err = failure_from_response(resp).await;
            tracing::info!(target: "labkeeper::session", "auth.login rejected user={} code={}", req.username, err.code_str());
            return Err(err);
        }
        let body: LoginBody = resp.json().await?;
        let Some(token) = body.token.filter(|t| !t.is_empty()) else {
            let msg = body.message.unwrap_or_else(|| "Unexpected response format.".to_string());
            return Err(AppError::upstream("login_no_token", msg));
        };
        let claims = decode_claims(&token).map_err(|e| AppError::upstream("bad_token", e.to_string()))?;
        self.store.login(&claims.principal, claims.role, &token)
    }

    /// Create an account. Does not log in.
    pub async fn register(&self, req: &RegisterRequest) -> AppResult<()> {
        validate_credentials(&req.username, &req.password, Some(&req.confirm_password))
            .map_err(|e| AppError::user("invalid_credentials_format", e.to_string()))?;
        let url = self.base.join("auth/register").map_err(|e| AppError::internal("bad_url", e.to_string()))?;
        let resp = self.client
            .post(url)
            .json(&serde_json::json!({"username": req.username, "password": req.password, "role": req.role}))
            .send()
            .await?;
        if !(resp.status().as_u16() == 200 || resp.status().as_u16() == 201) {
            return Err(failure_from_response(resp).await);
        }
        tracing::info!(target: "labkeeper::session", "auth.register user={} role={}", req.username, req.role);
        Ok(())
    }

    pub fn logout(&self) -> AppResult<()> { self.store.logout() }

    /// Admin registrations not yet approved. A 404 from the service means none.
    pub async fn unconfirmed_admins(&self) -> AppResult<Vec<PendingAdmin>> {
        let auth = self.admin_authorization()?;
        let url = self.base.join("admin/unconfirmed").map_err(|e| AppError::internal("bad_url", e.to_string()))?;
        let resp = self.client
            .get(url)
            .header(AUTHORIZATION, auth)
            .send()
            .await
            .map_err(|_| AppError::transport("network_error", "Error occurred while fetching unconfirmed admins."))?;
        match resp.status().as_u16() {
            404 => Ok(Vec::new()),
            s if (200..300).contains(&s) => Ok(resp.json().await?),
            s => Err(AppError::from_http_status(s, "Failed to fetch unconfirmed admins. Please try again.")),
        }
    }

    /// Approve a pending admin. Returns the confirmation shown to the caller.
    pub async fn confirm_admin(&self, id: i64) -> AppResult<String> {
        let auth = self.admin_authorization()?;
        let url = self.base
            .join(&format!("admin/confirm/{}", id))
            .map_err(|e| AppError::internal("bad_url", e.to_string()))?;
        let resp = self.client
            .put(url)
            .header(AUTHORIZATION, auth)
            .send()
            .await
            .map_err(|_| AppError::transport("network_error", "Error occurred while approving admin."))?;
        if !resp.status().is_success() {
            return Err(AppError::from_http_status(resp.status().as_u16(), format!("Failed to approve admin with ID {}.", id)));
        }
        tracing::info!(target: "labkeeper::session", "admin.confirm id={} by={}", id, self.store.current_principal());
        Ok(format!("Admin with ID {} successfully approved.", id))
    }

    // Approval is only offered to a signed-in admin.
    fn admin_authorization(&self) -> AppResult<String> {
        let session = self.store
            .valid_session()
            .ok_or_else(|| AppError::auth("not_logged_in", "Please log in first."))?;
        if !session.role.is_admin() {
            return Err(AppError::forbidden("admin_only", "Only administrators can approve new admins."));
        }
        Ok(session.bearer())
    }
}
