use actix_web::{web, HttpResponse};

use crate::error::AppError;
use crate::extractors::current_user::CurrentUser;
use crate::extractors::ValidatedJson;
use crate::services::AwardForm;
use crate::state::app_state::AppState;

async fn create_award(
    current_user: CurrentUser,
    app_state: web::Data<AppState>,
    body: ValidatedJson<AwardForm>,
) -> Result<HttpResponse, AppError> {
    let receipt = app_state
        .points
        .award(&current_user.token, &current_user.me, &body)
        .await?;
    Ok(HttpResponse::Ok().json(receipt))
}

pub fn configure_routes(cfg: &mut web::ServiceConfig) {
    cfg.route("", web::post().to(create_award));
}
