//! reqwest adapter for the hosted points service.
//!
//! Speaks the service's GoTrue-style auth endpoint, PostgREST tables and RPCs.
//! Each request forwards the caller's token so row-level security runs as them.

use async_trait::async_trait;
use reqwest::{Method, RequestBuilder, Response, StatusCode};
use serde::de::DeserializeOwned;
use serde_json::Value;
use tracing::{debug, warn};

use crate::config::hosted::HostedServiceConfig;
use crate::domain::{
    AccessToken, AwardReceipt, AwardRequest, Role, TeamId, Transaction, UserId, UserIdentity,
};
use crate::error::AppError;
use crate::errors::domain::{
    AuthErrorKind, DomainError, InfraErrorKind, NotFoundKind, ValidationKind,
};
use crate::repos::PointsBackend;

pub mod dto;

use dto::{
    parse_award_receipt, parse_local_total, AuthUserDto, AwardPointsArgs, BalanceRow, RoleRow,
    ServiceErrorBody, TeamRow, TransactionRow,
};

const TRANSACTION_COLUMNS: &str = "id,created_at,delta,reason,team_id,device_id";

#[derive(Debug, Clone)]
pub struct HostedRestBackend {
    http: reqwest::Client,
    base_url: String,
    anon_key: String,
}

impl HostedRestBackend {
    pub fn new(config: &HostedServiceConfig) -> Result<Self, AppError> {
        let http = reqwest::Client::builder()
            .timeout(config.request_timeout)
            .user_agent(concat!("points-backend/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|e| AppError::config(format!("failed to build HTTP client: {e}")))?;

        Ok(Self {
            http,
            base_url: config.base_url.clone(),
            anon_key: config.anon_key.clone(),
        })
    }

    fn request(&self, method: Method, path: &str, token: &AccessToken) -> RequestBuilder {
        self.http
            .request(method, format!("{}{}", self.base_url, path))
            .header("apikey", &self.anon_key)
            .bearer_auth(token.as_str())
    }

    async fn send(&self, builder: RequestBuilder, what: &'static str) -> Result<Response, DomainError> {
        let response = builder.send().await.map_err(|e| map_transport_err(what, e))?;
        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }

        let body = response.text().await.unwrap_or_default();
        let message = serde_json::from_str::<ServiceErrorBody>(&body)
            .ok()
            .and_then(ServiceErrorBody::best_message)
            .unwrap_or_else(|| format!("{what} failed with status {status}"));

        debug!(operation = what, status = status.as_u16(), "hosted service returned an error");
        Err(map_status(status, message))
    }

    async fn send_json<T: DeserializeOwned>(
        &self,
        builder: RequestBuilder,
        what: &'static str,
    ) -> Result<T, DomainError> {
        let response = self.send(builder, what).await?;
        let bytes = response
            .bytes()
            .await
            .map_err(|e| map_transport_err(what, e))?;
        decode(what, &bytes)
    }

    async fn first_row<T: DeserializeOwned>(
        &self,
        builder: RequestBuilder,
        what: &'static str,
    ) -> Result<Option<T>, DomainError> {
        let rows: Vec<T> = self.send_json(builder, what).await?;
        Ok(rows.into_iter().next())
    }
}

/// Decode a JSON body; an empty body reads as `null`.
fn decode<T: DeserializeOwned>(what: &'static str, bytes: &[u8]) -> Result<T, DomainError> {
    let bytes: &[u8] = if bytes.iter().all(u8::is_ascii_whitespace) {
        b"null"
    } else {
        bytes
    };
    serde_json::from_slice(bytes).map_err(|e| {
        DomainError::infra(
            InfraErrorKind::DataCorruption,
            format!("{what}: unreadable response: {e}"),
        )
    })
}

fn map_transport_err(what: &'static str, err: reqwest::Error) -> DomainError {
    if err.is_timeout() {
        warn!(operation = what, "hosted service timed out");
        DomainError::infra(InfraErrorKind::Timeout, format!("{what}: request timed out"))
    } else if err.is_decode() {
        DomainError::infra(
            InfraErrorKind::DataCorruption,
            format!("{what}: unreadable response: {err}"),
        )
    } else {
        warn!(operation = what, error = %err, "hosted service unreachable");
        DomainError::infra(
            InfraErrorKind::Unavailable,
            format!("{what}: hosted service unreachable"),
        )
    }
}

/// Map a non-success status from the hosted service to a domain error.
pub fn map_status(status: StatusCode, message: String) -> DomainError {
    match status {
        StatusCode::UNAUTHORIZED => DomainError::auth(AuthErrorKind::Unauthenticated, message),
        StatusCode::FORBIDDEN => DomainError::auth(AuthErrorKind::Forbidden, message),
        StatusCode::NOT_FOUND => {
            DomainError::not_found(NotFoundKind::Other("hosted".into()), message)
        }
        StatusCode::BAD_REQUEST | StatusCode::CONFLICT | StatusCode::UNPROCESSABLE_ENTITY => {
            DomainError::validation(ValidationKind::Rejected, message)
        }
        StatusCode::REQUEST_TIMEOUT | StatusCode::GATEWAY_TIMEOUT => {
            DomainError::infra(InfraErrorKind::Timeout, message)
        }
        s if s.is_server_error() => DomainError::infra(InfraErrorKind::Unavailable, message),
        s => DomainError::infra(
            InfraErrorKind::Other(s.as_u16().to_string()),
            format!("unexpected status {s}: {message}"),
        ),
    }
}

#[async_trait]
impl PointsBackend for HostedRestBackend {
    async fn current_user(
        &self,
        token: &AccessToken,
    ) -> Result<Option<UserIdentity>, DomainError> {
        let builder = self.request(Method::GET, "/auth/v1/user", token);
        match self.send_json::<AuthUserDto>(builder, "current_user").await {
            Ok(user) => Ok(Some(user.into())),
            Err(DomainError::Auth(_, _)) => Ok(None),
            Err(e) => Err(e),
        }
    }

    async fn role(
        &self,
        token: &AccessToken,
        user_id: UserId,
    ) -> Result<Option<Role>, DomainError> {
        let builder = self
            .request(Method::GET, "/rest/v1/profiles", token)
            .query(&[("select", "role".to_string()), ("id", format!("eq.{user_id}"))]);
        let row: Option<RoleRow> = self.first_row(builder, "role").await?;

        match row.and_then(|r| r.role) {
            None => Ok(None),
            Some(raw) => Role::parse(&raw).map(Some).ok_or_else(|| {
                DomainError::infra(
                    InfraErrorKind::DataCorruption,
                    format!("profile has unknown role '{raw}'"),
                )
            }),
        }
    }

    async fn student_balance(
        &self,
        token: &AccessToken,
        student_id: UserId,
    ) -> Result<i64, DomainError> {
        let builder = self
            .request(Method::GET, "/rest/v1/student_balances", token)
            .query(&[
                ("select", "balance".to_string()),
                ("student_id", format!("eq.{student_id}")),
            ]);
        let row: Option<BalanceRow> = self.first_row(builder, "student_balance").await?;
        Ok(row.and_then(|r| r.balance).unwrap_or(0))
    }

    async fn list_transactions(
        &self,
        token: &AccessToken,
        student_id: UserId,
        limit: u32,
    ) -> Result<Vec<Transaction>, DomainError> {
        let builder = self
            .request(Method::GET, "/rest/v1/transactions", token)
            .query(&[
                ("select", TRANSACTION_COLUMNS.to_string()),
                ("student_id", format!("eq.{student_id}")),
                ("order", "created_at.desc".to_string()),
                ("limit", limit.to_string()),
            ]);
        let rows: Vec<TransactionRow> = self.send_json(builder, "list_transactions").await?;
        Ok(rows.into_iter().map(Transaction::from).collect())
    }

    async fn award_points(
        &self,
        token: &AccessToken,
        award: &AwardRequest,
    ) -> Result<AwardReceipt, DomainError> {
        let builder = self
            .request(Method::POST, "/rest/v1/rpc/award_points", token)
            .json(&AwardPointsArgs::from(award));
        let value: Value = self.send_json(builder, "award_points").await?;
        parse_award_receipt(value)
    }

    async fn local_total(
        &self,
        token: &AccessToken,
        user_id: UserId,
    ) -> Result<Option<i64>, DomainError> {
        // The RPC reads the caller from the token; the id only labels the log line.
        debug!(%user_id, "fetching local team total");
        let builder = self
            .request(Method::POST, "/rest/v1/rpc/get_my_local_total", token)
            .json(&serde_json::json!({}));
        let value: Value = self.send_json(builder, "local_total").await?;
        parse_local_total(&value)
    }

    async fn team_name(
        &self,
        token: &AccessToken,
        team_id: TeamId,
    ) -> Result<Option<String>, DomainError> {
        let builder = self
            .request(Method::GET, "/rest/v1/teams", token)
            .query(&[("select", "name".to_string()), ("id", format!("eq.{team_id}"))]);
        let row: Option<TeamRow> = self.first_row(builder, "team_name").await?;
        Ok(row.and_then(|r| r.name))
    }
}
