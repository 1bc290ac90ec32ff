//! Types exchanged with the hosted points service.

use std::fmt;

use serde::{Deserialize, Serialize};
use time::OffsetDateTime;
use uuid::Uuid;

use crate::logging::pii::Redacted;

/// Authenticated user id as issued by the hosted auth service.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct UserId(pub Uuid);

impl fmt::Display for UserId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

impl std::str::FromStr for UserId {
    type Err = uuid::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Uuid::parse_str(s).map(UserId)
    }
}

pub type TeamId = i64;

/// Caller's bearer token, forwarded verbatim to the hosted service.
#[derive(Clone, PartialEq, Eq)]
pub struct AccessToken(String);

impl AccessToken {
    pub fn new(token: impl Into<String>) -> Self {
        Self(token.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Debug for AccessToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("AccessToken").field(&"[REDACTED]").finish()
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserIdentity {
    pub id: UserId,
    pub email: Option<String>,
}

impl fmt::Display for UserIdentity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.email {
            Some(email) => write!(f, "{} ({})", self.id, Redacted(email)),
            None => write!(f, "{}", self.id),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Role {
    Teacher,
    Student,
}

impl Role {
    pub fn parse(raw: &str) -> Option<Self> {
        match raw.trim().to_ascii_lowercase().as_str() {
            "teacher" => Some(Role::Teacher),
            "student" => Some(Role::Student),
            _ => None,
        }
    }
}

/// Which panel the page shows for a role.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Panel {
    Award,
    Balance,
}

impl From<Role> for Panel {
    fn from(role: Role) -> Self {
        match role {
            Role::Teacher => Panel::Award,
            Role::Student => Panel::Balance,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Transaction {
    pub id: i64,
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
    pub delta: i64,
    pub reason: Option<String>,
    pub team_id: Option<TeamId>,
    pub device_id: Option<String>,
}

/// A transaction row ready for display, with the team resolved to a name.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TransactionView {
    pub id: i64,
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
    pub delta: i64,
    pub reason: String,
    pub team: Option<String>,
}

/// Arguments of the `award_points` RPC.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AwardRequest {
    /// Student email or student code, already normalized.
    pub identifier: String,
    pub delta: i64,
    pub reason: String,
    pub device_id: String,
}

/// What the `award_points` RPC reports back. Fields the service omits stay `None`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AwardReceipt {
    #[serde(default)]
    pub student_id: Option<UserId>,
    #[serde(default)]
    pub new_balance: Option<i64>,
    #[serde(default)]
    pub pool_team_id: Option<TeamId>,
}
