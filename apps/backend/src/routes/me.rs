use actix_web::{web, HttpRequest, HttpResponse};
use serde::{Deserialize, Serialize};

use crate::domain::{Panel, Role, UserId};
use crate::error::AppError;
use crate::errors::ErrorCode;
use crate::extractors::current_user::CurrentUser;
use crate::state::app_state::AppState;

#[derive(Debug, Serialize)]
pub struct MeResponse {
    pub user_id: UserId,
    pub email: Option<String>,
    pub role: Role,
    pub panel: Panel,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct BalanceResponse {
    pub student_id: UserId,
    pub balance: i64,
}

#[derive(Debug, Deserialize)]
struct HistoryQuery {
    limit: Option<u32>,
}

/// `?limit=` of a history request. A non-numeric value is an invalid limit.
pub(crate) fn limit_param(req: &HttpRequest) -> Result<Option<u32>, AppError> {
    web::Query::<HistoryQuery>::from_query(req.query_string())
        .map(|q| q.into_inner().limit)
        .map_err(|_| AppError::invalid(ErrorCode::InvalidLimit, "limit must be a whole number"))
}

async fn me(current_user: CurrentUser) -> Result<HttpResponse, AppError> {
    let me = current_user.me;
    Ok(HttpResponse::Ok().json(MeResponse {
        user_id: me.user.id,
        email: me.user.email,
        role: me.role,
        panel: me.panel,
    }))
}

async fn my_balance(
    current_user: CurrentUser,
    app_state: web::Data<AppState>,
) -> Result<HttpResponse, AppError> {
    let student_id = current_user.me.user.id;
    let balance = app_state
        .points
        .balance(&current_user.token, student_id)
        .await?;
    Ok(HttpResponse::Ok().json(BalanceResponse {
        student_id,
        balance,
    }))
}

async fn my_transactions(
    req: HttpRequest,
    current_user: CurrentUser,
    app_state: web::Data<AppState>,
) -> Result<HttpResponse, AppError> {
    let limit = limit_param(&req)?;
    let rows = app_state
        .points
        .history(&current_user.token, current_user.me.user.id, limit)
        .await?;
    Ok(HttpResponse::Ok().json(rows))
}

pub fn configure_routes(cfg: &mut web::ServiceConfig) {
    cfg.route("", web::get().to(me))
        .route("/balance", web::get().to(my_balance))
        .route("/transactions", web::get().to(my_transactions));
}
