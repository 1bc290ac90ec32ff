//! Points panels: who is signed in, balances, history and awards.

use serde::{Deserialize, Serialize};
use tracing::{debug, info};
use unicode_normalization::UnicodeNormalization;

use crate::domain::{
    AccessToken, AwardReceipt, AwardRequest, Panel, Role, TransactionView, UserId, UserIdentity,
};
use crate::errors::domain::{AuthErrorKind, DomainError, NotFoundKind, ValidationKind};
use crate::logging::pii::Redacted;
use crate::logging::security;
use crate::repos::SharedPointsBackend;
use crate::services::team_names::TeamNameCache;

pub const DEFAULT_HISTORY_LIMIT: u32 = 20;
pub const MAX_HISTORY_LIMIT: u32 = 100;
pub const MAX_AWARD_DELTA: i64 = 1000;
pub const MAX_REASON_CHARS: usize = 200;

/// The signed-in user together with the panel their role unlocks.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Me {
    pub user: UserIdentity,
    pub role: Role,
    pub panel: Panel,
}

/// Award form as submitted by a teacher.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct AwardForm {
    pub identifier: String,
    pub delta: i64,
    pub reason: String,
    #[serde(default)]
    pub device_id: Option<String>,
}

/// Normalize a student identifier. Emails are trimmed, NFKC-normalized and
/// lowercased; student codes are only trimmed.
pub fn normalize_identifier(raw: &str) -> String {
    let trimmed = raw.trim();
    if trimmed.contains('@') {
        trimmed.nfkc().collect::<String>().to_lowercase()
    } else {
        trimmed.to_string()
    }
}

/// Check an award form and turn it into the RPC arguments.
pub fn validate_award(form: &AwardForm, default_device_id: &str) -> Result<AwardRequest, DomainError> {
    let identifier = normalize_identifier(&form.identifier);
    if identifier.is_empty() {
        return Err(DomainError::validation(
            ValidationKind::InvalidIdentifier,
            "Student email or code is required",
        ));
    }

    if form.delta == 0 || form.delta.abs() > MAX_AWARD_DELTA {
        return Err(DomainError::validation(
            ValidationKind::InvalidDelta,
            format!("Points must be non-zero and between -{MAX_AWARD_DELTA} and {MAX_AWARD_DELTA}"),
        ));
    }

    let reason = form.reason.trim();
    if reason.is_empty() {
        return Err(DomainError::validation(
            ValidationKind::InvalidReason,
            "A reason is required",
        ));
    }
    if reason.chars().count() > MAX_REASON_CHARS {
        return Err(DomainError::validation(
            ValidationKind::InvalidReason,
            format!("Reason must be at most {MAX_REASON_CHARS} characters"),
        ));
    }

    let device_id = form
        .device_id
        .as_deref()
        .map(str::trim)
        .filter(|d| !d.is_empty())
        .unwrap_or(default_device_id)
        .to_string();

    Ok(AwardRequest {
        identifier,
        delta: form.delta,
        reason: reason.to_string(),
        device_id,
    })
}

/// Resolve an optional `limit` query value.
pub fn history_limit(limit: Option<u32>) -> Result<u32, DomainError> {
    match limit {
        None => Ok(DEFAULT_HISTORY_LIMIT),
        Some(n) if (1..=MAX_HISTORY_LIMIT).contains(&n) => Ok(n),
        Some(n) => Err(DomainError::validation(
            ValidationKind::InvalidLimit,
            format!("limit must be between 1 and {MAX_HISTORY_LIMIT}, got {n}"),
        )),
    }
}

#[derive(Clone)]
pub struct PointsService {
    backend: SharedPointsBackend,
    team_names: TeamNameCache,
    device_id: String,
}

impl PointsService {
    pub fn new(
        backend: SharedPointsBackend,
        team_names: TeamNameCache,
        device_id: impl Into<String>,
    ) -> Self {
        Self {
            backend,
            team_names,
            device_id: device_id.into(),
        }
    }

    pub async fn whoami(&self, token: &AccessToken) -> Result<Me, DomainError> {
        let user = self
            .backend
            .current_user(token)
            .await?
            .ok_or_else(DomainError::unauthenticated)?;

        let role = self.backend.role(token, user.id).await?.ok_or_else(|| {
            DomainError::not_found(
                NotFoundKind::Profile,
                "No profile found for this account. Ask your teacher to add you.",
            )
        })?;

        debug!(user = %user, ?role, "resolved caller");
        Ok(Me {
            panel: Panel::from(role),
            user,
            role,
        })
    }

    pub async fn balance(&self, token: &AccessToken, student_id: UserId) -> Result<i64, DomainError> {
        self.backend.student_balance(token, student_id).await
    }

    /// Newest-first transactions with team names resolved.
    pub async fn history(
        &self,
        token: &AccessToken,
        student_id: UserId,
        limit: Option<u32>,
    ) -> Result<Vec<TransactionView>, DomainError> {
        let limit = history_limit(limit)?;
        let mut rows = self
            .backend
            .list_transactions(token, student_id, limit)
            .await?;
        rows.sort_by(|a, b| b.created_at.cmp(&a.created_at).then(b.id.cmp(&a.id)));
        rows.truncate(limit as usize);

        let teams = self
            .team_names
            .names(token, rows.iter().map(|t| t.team_id))
            .await?;

        Ok(rows
            .into_iter()
            .zip(teams)
            .map(|(t, team)| TransactionView {
                id: t.id,
                created_at: t.created_at,
                delta: t.delta,
                reason: t.reason.unwrap_or_default(),
                team,
            })
            .collect())
    }

    /// Award points on behalf of `caller`. Teachers only.
    pub async fn award(
        &self,
        token: &AccessToken,
        caller: &Me,
        form: &AwardForm,
    ) -> Result<AwardReceipt, DomainError> {
        if caller.role != Role::Teacher {
            security::award_denied(caller.user.id);
            return Err(DomainError::auth(
                AuthErrorKind::InsufficientRole,
                "Only teachers can award points",
            ));
        }

        let request = validate_award(form, &self.device_id)?;
        let receipt = self.backend.award_points(token, &request).await?;

        info!(
            teacher = %caller.user.id,
            student = %Redacted(&request.identifier),
            delta = request.delta,
            device_id = %request.device_id,
            "points awarded"
        );
        Ok(receipt)
    }

    pub fn device_id(&self) -> &str {
        &self.device_id
    }
}
