//! The hosted points service, seen from this app.
//!
//! Authentication, row-level security, point awarding and balance aggregation
//! all live behind this trait. Every call carries the caller's access token so
//! the service evaluates its policies as that user.

use std::sync::Arc;

use async_trait::async_trait;

use crate::domain::{
    AccessToken, AwardReceipt, AwardRequest, Role, TeamId, Transaction, UserId, UserIdentity,
};
use crate::errors::domain::DomainError;

pub type SharedPointsBackend = Arc<dyn PointsBackend>;

#[async_trait]
pub trait PointsBackend: Send + Sync {
    /// The user behind `token`, or `None` when the session is missing or expired.
    async fn current_user(&self, token: &AccessToken)
        -> Result<Option<UserIdentity>, DomainError>;

    /// Role from the user's profile; `None` when no profile exists.
    async fn role(&self, token: &AccessToken, user_id: UserId)
        -> Result<Option<Role>, DomainError>;

    /// Current balance; a student without a balance row has 0.
    async fn student_balance(
        &self,
        token: &AccessToken,
        student_id: UserId,
    ) -> Result<i64, DomainError>;

    /// Newest-first transactions, at most `limit`.
    async fn list_transactions(
        &self,
        token: &AccessToken,
        student_id: UserId,
        limit: u32,
    ) -> Result<Vec<Transaction>, DomainError>;

    /// Invoke the `award_points` RPC. Authorization is the service's.
    async fn award_points(
        &self,
        token: &AccessToken,
        award: &AwardRequest,
    ) -> Result<AwardReceipt, DomainError>;

    /// Local-team point total net of spend, via `get_my_local_total`.
    ///
    /// `None` when the caller has no local team.
    async fn local_total(&self, token: &AccessToken, user_id: UserId)
        -> Result<Option<i64>, DomainError>;

    /// Display name of a team, `None` if unknown.
    async fn team_name(&self, token: &AccessToken, team_id: TeamId)
        -> Result<Option<String>, DomainError>;
}
