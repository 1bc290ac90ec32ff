//! Balances and ledgers of any student the caller may see. The hosted
//! service's row-level security decides visibility; an invisible student
//! simply has no rows.

use actix_web::{web, HttpRequest, HttpResponse};

use crate::domain::UserId;
use crate::error::AppError;
use crate::errors::ErrorCode;
use crate::extractors::current_user::CurrentUser;
use crate::routes::me::{limit_param, BalanceResponse};
use crate::state::app_state::AppState;

fn student_id(raw: &str) -> Result<UserId, AppError> {
    raw.parse().map_err(|_| {
        AppError::bad_request(
            ErrorCode::InvalidStudentId,
            format!("'{raw}' is not a student id"),
        )
    })
}

async fn balance(
    path: web::Path<String>,
    current_user: CurrentUser,
    app_state: web::Data<AppState>,
) -> Result<HttpResponse, AppError> {
    let student_id = student_id(&path)?;
    let balance = app_state
        .points
        .balance(&current_user.token, student_id)
        .await?;
    Ok(HttpResponse::Ok().json(BalanceResponse {
        student_id,
        balance,
    }))
}

async fn transactions(
    req: HttpRequest,
    path: web::Path<String>,
    current_user: CurrentUser,
    app_state: web::Data<AppState>,
) -> Result<HttpResponse, AppError> {
    let student_id = student_id(&path)?;
    let limit = limit_param(&req)?;
    let rows = app_state
        .points
        .history(&current_user.token, student_id, limit)
        .await?;
    Ok(HttpResponse::Ok().json(rows))
}

pub fn configure_routes(cfg: &mut web::ServiceConfig) {
    cfg.route("/{student_id}/balance", web::get().to(balance))
        .route("/{student_id}/transactions", web::get().to(transactions));
}
