//! Client configuration resolved from the environment.

use std::path::PathBuf;

use anyhow::{Context, Result};
use reqwest::Url;

use crate::access::FieldRuleTable;

pub const DEFAULT_API_URL: &str = "http://localhost:8080/api/v1/";

#[derive(Debug, Clone)]
pub struct ClientConfig {
    pub api_url: Url,
    pub session_file: PathBuf,
    pub field_rules: FieldRuleTable,
}

impl ClientConfig {
    pub fn from_env() -> Result<Self> {
        let raw_url = std::env::var("LABKEEPER_API_URL").unwrap_or_else(|_| DEFAULT_API_URL.to_string());
        let api_url = parse_base_url(&raw_url)?;

        let session_file = match std::env::var("LABKEEPER_SESSION_FILE") {
            Ok(p) if !p.trim().is_empty() => PathBuf::from(p),
            _ => default_session_file(),
        };

        let field_rules = match std::env::var("LABKEEPER_FIELD_RULES") {
            Ok(p) if !p.trim().is_empty() => {
                let text = std::fs::read_to_string(&p)
                    .with_context(|| format!("reading field rules from {}", p))?;
                FieldRuleTable::from_json(&text)
                    .with_context(|| format!("parsing field rules in {}", p))?
            }
            _ => FieldRuleTable::default(),
        };

        Ok(Self { api_url, session_file, field_rules })
    }
}

/// Parse a base URL, forcing a trailing slash so relative joins append instead of replace.
pub fn parse_base_url(raw: &str) -> Result<Url> {
    let trimmed = raw.trim();
    let with_slash = if trimmed.ends_with('/') { trimmed.to_string() } else { format!("{}/", trimmed) };
    Url::parse(&with_slash).with_context(|| format!("invalid API base URL '{}'", raw))
}

fn default_session_file() -> PathBuf {
    let home = std::env::var("HOME").or_else(|_| std::env::var("USERPROFILE")).ok();
    let root = home.map(PathBuf::from).unwrap_or_else(|| PathBuf::from("."));
    root.join(".labkeeper").join("session.json")
}
