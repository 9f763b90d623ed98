use serde::{Deserialize, Serialize};

/// Role carried in the session. Anything the backend sends that is not `ADMIN`
/// is treated as a plain user.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "UPPERCASE")]
pub enum Role {
    #[default]
    User,
    Admin,
}

impl Role {
    pub fn parse(s: &str) -> Role {
        if s.trim().eq_ignore_ascii_case("admin") { Role::Admin } else { Role::User }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Role::User => "USER",
            Role::Admin => "ADMIN",
        }
    }

    pub fn is_admin(&self) -> bool { matches!(self, Role::Admin) }
}

impl std::fmt::Display for Role {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}
