//! Wire shapes of the hosted service's auth, REST and RPC endpoints.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use time::OffsetDateTime;
use uuid::Uuid;

use crate::domain::{AwardReceipt, AwardRequest, TeamId, Transaction, UserId, UserIdentity};
use crate::errors::domain::{DomainError, InfraErrorKind};

/// `GET /auth/v1/user`
#[derive(Debug, Clone, Deserialize)]
pub struct AuthUserDto {
    pub id: Uuid,
    #[serde(default)]
    pub email: Option<String>,
}

impl From<AuthUserDto> for UserIdentity {
    fn from(dto: AuthUserDto) -> Self {
        Self {
            id: UserId(dto.id),
            email: dto.email.filter(|e| !e.is_empty()),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct RoleRow {
    pub role: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct BalanceRow {
    pub balance: Option<i64>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct TeamRow {
    pub name: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct TransactionRow {
    pub id: i64,
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
    pub delta: i64,
    #[serde(default)]
    pub reason: Option<String>,
    #[serde(default)]
    pub team_id: Option<TeamId>,
    #[serde(default)]
    pub device_id: Option<String>,
}

impl From<TransactionRow> for Transaction {
    fn from(row: TransactionRow) -> Self {
        Self {
            id: row.id,
            created_at: row.created_at,
            delta: row.delta,
            reason: row.reason,
            team_id: row.team_id,
            device_id: row.device_id,
        }
    }
}

/// Body of `POST /rest/v1/rpc/award_points`.
#[derive(Debug, Clone, Serialize)]
pub struct AwardPointsArgs<'a> {
    pub p_identifier: &'a str,
    pub p_delta: i64,
    pub p_reason: &'a str,
    pub p_device_id: &'a str,
}

impl<'a> From<&'a AwardRequest> for AwardPointsArgs<'a> {
    fn from(req: &'a AwardRequest) -> Self {
        Self {
            p_identifier: &req.identifier,
            p_delta: req.delta,
            p_reason: &req.reason,
            p_device_id: &req.device_id,
        }
    }
}

/// Error body shapes used by the auth and REST gateways.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ServiceErrorBody {
    #[serde(default)]
    pub message: Option<String>,
    #[serde(default)]
    pub msg: Option<String>,
    #[serde(default)]
    pub error_description: Option<String>,
    #[serde(default)]
    pub hint: Option<String>,
}

impl ServiceErrorBody {
    pub fn best_message(self) -> Option<String> {
        self.message
            .or(self.msg)
            .or(self.error_description)
            .or(self.hint)
            .filter(|m| !m.trim().is_empty())
    }
}

fn corrupt(detail: impl Into<String>) -> DomainError {
    DomainError::infra(InfraErrorKind::DataCorruption, detail)
}

/// Interpret the result of `get_my_local_total`.
///
/// The function may return a bare number, a `{ total_local }` object, or a
/// set of such rows. No rows means no local team; a null total counts as 0.
pub fn parse_local_total(value: &Value) -> Result<Option<i64>, DomainError> {
    match value {
        Value::Null => Ok(Some(0)),
        Value::Number(n) => n
            .as_i64()
            .map(Some)
            .ok_or_else(|| corrupt(format!("local total is not an integer: {n}"))),
        Value::Object(map) => match map.get("total_local") {
            None | Some(Value::Null) => Ok(Some(0)),
            Some(Value::Number(n)) => n
                .as_i64()
                .map(Some)
                .ok_or_else(|| corrupt(format!("total_local is not an integer: {n}"))),
            Some(other) => Err(corrupt(format!("total_local has unexpected shape: {other}"))),
        },
        Value::Array(rows) => match rows.first() {
            None => Ok(None),
            Some(row) => parse_local_total(row),
        },
        other => Err(corrupt(format!("local total has unexpected shape: {other}"))),
    }
}

/// Interpret the result of `award_points`: a receipt object, a one-row set, a
/// bare new balance, or nothing at all.
pub fn parse_award_receipt(value: Value) -> Result<AwardReceipt, DomainError> {
    match value {
        Value::Null => Ok(AwardReceipt::default()),
        Value::Number(n) => Ok(AwardReceipt {
            new_balance: n.as_i64(),
            ..AwardReceipt::default()
        }),
        Value::Array(mut rows) => {
            if rows.is_empty() {
                Ok(AwardReceipt::default())
            } else {
                parse_award_receipt(rows.swap_remove(0))
            }
        }
        obj @ Value::Object(_) => serde_json::from_value(obj)
            .map_err(|e| corrupt(format!("award_points returned an unreadable receipt: {e}"))),
        other => Err(corrupt(format!("award_points returned unexpected shape: {other}"))),
    }
}
