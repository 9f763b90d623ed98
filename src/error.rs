//! Unified application error model and mapping helpers.
//! This module provides the error enum shared by the session layer, the API client
//! and the screen workflow, along with mappers to and from HTTP status codes.

use serde::{Deserialize, Serialize};
use std::fmt::{Display, Formatter};

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum AppError {
    UserInput { code: String, message: String },
    NotFound { code: String, message: String },
    Conflict { code: String, message: String },
    Auth { code: String, message: String },
    Forbidden { code: String, message: String },
    Rejected { code: String, message: String },
    Upstream { code: String, message: String },
    Transport { code: String, message: String },
    Storage { code: String, message: String },
    Internal { code: String, message: String },
}

impl AppError {
    pub fn code_str(&self) -> &str {
        match self {
            AppError::UserInput { code, .. }
            | AppError::NotFound { code, .. }
            | AppError::Conflict { code, .. }
            | AppError::Auth { code, .. }
            | AppError::Forbidden { code, .. }
            | AppError::Rejected { code, .. }
            | AppError::Upstream { code, .. }
            | AppError::Transport { code, .. }
            | AppError::Storage { code, .. }
            | AppError::Internal { code, .. } => code.as_str(),
        }
    }

    pub fn message(&self) -> &str {
        match self {
            AppError::UserInput { message, .. }
            | AppError::NotFound { message, .. }
            | AppError::Conflict { message, .. }
            | AppError::Auth { message, .. }
            | AppError::Forbidden { message, .. }
            | AppError::Rejected { message, .. }
            | AppError::Upstream { message, .. }
            | AppError::Transport { message, .. }
            | AppError::Storage { message, .. }
            | AppError::Internal { message, .. } => message.as_str(),
        }
    }

    pub fn user(code: impl Into<String>, msg: impl Into<String>) -> Self { AppError::UserInput { code: code.into(), message: msg.into() } }
    pub fn not_found(code: impl Into<String>, msg: impl Into<String>) -> Self { AppError::NotFound { code: code.into(), message: msg.into() } }
    pub fn conflict(code: impl Into<String>, msg: impl Into<String>) -> Self { AppError::Conflict { code: code.into(), message: msg.into() } }
    pub fn auth(code: impl Into<String>, msg: impl Into<String>) -> Self { AppError::Auth { code: code.into(), message: msg.into() } }
    pub fn forbidden(code: impl Into<String>, msg: impl Into<String>) -> Self { AppError::Forbidden { code: code.into(), message: msg.into() } }
    pub fn rejected(code: impl Into<String>, msg: impl Into<String>) -> Self { AppError::Rejected { code: code.into(), message: msg.into() } }
    pub fn upstream(code: impl Into<String>, msg: impl Into<String>) -> Self { AppError::Upstream { code: code.into(), message: msg.into() } }
    pub fn transport(code: impl Into<String>, msg: impl Into<String>) -> Self { AppError::Transport { code: code.into(), message: msg.into() } }
    pub fn storage(code: impl Into<String>, msg: impl Into<String>) -> Self { AppError::Storage { code: code.into(), message: msg.into() } }
    pub fn internal(code: impl Into<String>, msg: impl Into<String>) -> Self { AppError::Internal { code: code.into(), message: msg.into() } }

    /// Map to the HTTP status a backend would have used for this error.
    pub fn http_status(&self) -> u16 {
        match self {
            AppError::UserInput { .. } => 400,
            AppError::NotFound { .. } => 404,
            AppError::Conflict { .. } => 409,
            AppError::Auth { .. } => 401,
            AppError::Forbidden { .. } => 403,
            AppError::Rejected { .. } => 422,
            AppError::Upstream { .. } => 502,
            AppError::Transport { .. } => 503,
            AppError::Storage { .. } | AppError::Internal { .. } => 500,
        }
    }

    /// Classify a non-success backend response. `message` is shown to the user verbatim.
    pub fn from_http_status(status: u16, message: impl Into<String>) -> Self {
        let message = message.into();
        match status {
            401 => AppError::Auth { code: "unauthorized".into(), message },
            403 => AppError::Forbidden { code: "forbidden".into(), message },
            404 => AppError::NotFound { code: "not_found".into(), message },
            409 => AppError::Conflict { code: "conflict".into(), message },
            400..=499 => AppError::Rejected { code: format!("http_{}", status), message },
            _ => AppError::Upstream { code: format!("http_{}", status), message },
        }
    }
}

impl Display for AppError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}: {}", self.code_str(), self.message())
    }
}

impl std::error::Error for AppError {}

pub type AppResult<T> = Result<T, AppError>;

impl From<anyhow::Error> for AppError {
    fn from(err: anyhow::Error) -> Self {
        AppError::Internal { code: "internal_error".into(), message: err.to_string() }
    }
}

impl From<reqwest::Error> for AppError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_decode() {
            return AppError::Upstream { code: "bad_payload".into(), message: err.to_string() };
        }
        AppError::Transport { code: "network_error".into(), message: err.to_string() }
    }
}

impl From<crate::identity::StorageError> for AppError {
    fn from(err: crate::identity::StorageError) -> Self {
        AppError::Storage { code: "session_storage".into(), message: err.to_string() }
    }
}
