//! In-memory [`PointsBackend`] that mimics the hosted service's policies
//! closely enough for service, route and WebSocket tests.

use std::collections::HashMap;

use async_trait::async_trait;
use parking_lot::RwLock;
use time::macros::datetime;
use time::OffsetDateTime;
use uuid::Uuid;

use crate::domain::{
    AccessToken, AwardReceipt, AwardRequest, Role, TeamId, Transaction, UserId, UserIdentity,
};
use crate::errors::domain::{AuthErrorKind, DomainError, ValidationKind};
use crate::repos::PointsBackend;

#[derive(Debug, Clone)]
struct FakeUser {
    email: String,
    role: Option<Role>,
    student_code: Option<String>,
}

#[derive(Debug, Default)]
struct State {
    sessions: HashMap<String, UserId>,
    users: HashMap<UserId, FakeUser>,
    balances: HashMap<UserId, i64>,
    transactions: HashMap<UserId, Vec<Transaction>>,
    local_totals: HashMap<UserId, i64>,
    teams: HashMap<TeamId, String>,
    awards: Vec<AwardRequest>,
    calls: HashMap<&'static str, usize>,
    fail_next: Option<DomainError>,
    next_tx_id: i64,
}

#[derive(Debug, Default)]
pub struct InMemoryPointsBackend {
    state: RwLock<State>,
}

impl InMemoryPointsBackend {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a user reachable through `token`. Returns the new user's id.
    pub fn add_user(&self, token: &str, email: &str, role: Option<Role>) -> UserId {
        let id = UserId(Uuid::new_v4());
        let mut state = self.state.write();
        state.sessions.insert(token.to_string(), id);
        state.users.insert(
            id,
            FakeUser {
                email: email.to_lowercase(),
                role,
                student_code: None,
            },
        );
        id
    }

    pub fn set_student_code(&self, user: UserId, code: &str) {
        if let Some(u) = self.state.write().users.get_mut(&user) {
            u.student_code = Some(code.to_string());
        }
    }

    pub fn set_balance(&self, user: UserId, balance: i64) {
        self.state.write().balances.insert(user, balance);
    }

    /// Append a ledger row; each row is one minute newer than the previous.
    pub fn add_transaction(
        &self,
        user: UserId,
        delta: i64,
        reason: &str,
        team_id: Option<TeamId>,
    ) -> i64 {
        let mut state = self.state.write();
        state.next_tx_id += 1;
        let id = state.next_tx_id;
        state.transactions.entry(user).or_default().push(Transaction {
            id,
            created_at: Self::timestamp(id),
            delta,
            reason: Some(reason.to_string()),
            team_id,
            device_id: None,
        });
        id
    }

    pub fn set_local_total(&self, user: UserId, total: i64) {
        self.state.write().local_totals.insert(user, total);
    }

    pub fn add_team(&self, team_id: TeamId, name: &str) {
        self.state.write().teams.insert(team_id, name.to_string());
    }

    /// Make the next backend call fail with `err`.
    pub fn fail_next(&self, err: DomainError) {
        self.state.write().fail_next = Some(err);
    }

    /// How many times `op` (a trait method name) was called.
    pub fn calls(&self, op: &str) -> usize {
        self.state.read().calls.get(op).copied().unwrap_or(0)
    }

    pub fn awards(&self) -> Vec<AwardRequest> {
        self.state.read().awards.clone()
    }

    pub fn balance_of(&self, user: UserId) -> i64 {
        self.state.read().balances.get(&user).copied().unwrap_or(0)
    }

    fn timestamp(id: i64) -> OffsetDateTime {
        datetime!(2024-09-02 08:00 UTC) + time::Duration::minutes(id)
    }

    /// Count the call, fire a queued failure, then resolve the session.
    fn enter(&self, op: &'static str, token: &AccessToken) -> Result<Option<UserId>, DomainError> {
        let mut state = self.state.write();
        *state.calls.entry(op).or_default() += 1;
        if let Some(err) = state.fail_next.take() {
            return Err(err);
        }
        Ok(state.sessions.get(token.as_str()).copied())
    }

    fn authed(&self, op: &'static str, token: &AccessToken) -> Result<UserId, DomainError> {
        self.enter(op, token)?
            .ok_or_else(|| DomainError::auth(AuthErrorKind::Unauthenticated, "JWT expired"))
    }
}

#[async_trait]
impl PointsBackend for InMemoryPointsBackend {
    async fn current_user(
        &self,
        token: &AccessToken,
    ) -> Result<Option<UserIdentity>, DomainError> {
        let Some(id) = self.enter("current_user", token)? else {
            return Ok(None);
        };
        let state = self.state.read();
        Ok(state.users.get(&id).map(|u| UserIdentity {
            id,
            email: Some(u.email.clone()),
        }))
    }

    async fn role(&self, token: &AccessToken, user_id: UserId) -> Result<Option<Role>, DomainError> {
        self.authed("role", token)?;
        Ok(self.state.read().users.get(&user_id).and_then(|u| u.role))
    }

    async fn student_balance(
        &self,
        token: &AccessToken,
        student_id: UserId,
    ) -> Result<i64, DomainError> {
        self.authed("student_balance", token)?;
        Ok(self.balance_of(student_id))
    }

    async fn list_transactions(
        &self,
        token: &AccessToken,
        student_id: UserId,
        limit: u32,
    ) -> Result<Vec<Transaction>, DomainError> {
        self.authed("list_transactions", token)?;
        let mut rows = self
            .state
            .read()
            .transactions
            .get(&student_id)
            .cloned()
            .unwrap_or_default();
        rows.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        rows.truncate(limit as usize);
        Ok(rows)
    }

    async fn award_points(
        &self,
        token: &AccessToken,
        award: &AwardRequest,
    ) -> Result<AwardReceipt, DomainError> {
        let caller = self.authed("award_points", token)?;
        let mut state = self.state.write();

        if state.users.get(&caller).and_then(|u| u.role) != Some(Role::Teacher) {
            return Err(DomainError::auth(
                AuthErrorKind::Forbidden,
                "permission denied for function award_points",
            ));
        }

        let student = state
            .users
            .iter()
            .find(|(_, u)| {
                u.email == award.identifier || u.student_code.as_deref() == Some(&award.identifier)
            })
            .map(|(id, _)| *id)
            .ok_or_else(|| DomainError::validation(ValidationKind::Rejected, "Student not found"))?;

        let balance = state.balances.entry(student).or_insert(0);
        *balance += award.delta;
        let new_balance = *balance;

        state.next_tx_id += 1;
        let id = state.next_tx_id;
        state.transactions.entry(student).or_default().push(Transaction {
            id,
            created_at: Self::timestamp(id),
            delta: award.delta,
            reason: Some(award.reason.clone()),
            team_id: None,
            device_id: Some(award.device_id.clone()),
        });
        state.awards.push(award.clone());

        Ok(AwardReceipt {
            student_id: Some(student),
            new_balance: Some(new_balance),
            pool_team_id: None,
        })
    }

    async fn local_total(
        &self,
        token: &AccessToken,
        user_id: UserId,
    ) -> Result<Option<i64>, DomainError> {
        self.authed("local_total", token)?;
        Ok(self.state.read().local_totals.get(&user_id).copied())
    }

    async fn team_name(
        &self,
        token: &AccessToken,
        team_id: TeamId,
    ) -> Result<Option<String>, DomainError> {
        self.enter("team_name", token)?;
        Ok(self.state.read().teams.get(&team_id).cloned())
    }
}
