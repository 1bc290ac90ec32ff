use actix_web::{web, HttpResponse};

use crate::error::AppError;
use crate::extractors::current_user::CurrentUser;
use crate::state::app_state::AppState;
use crate::ws::game_session;

/// Load the game page: the caller's local total and the ready frame.
async fn snapshot(
    current_user: CurrentUser,
    app_state: web::Data<AppState>,
) -> Result<HttpResponse, AppError> {
    let game = app_state
        .game
        .load(&current_user.token, &current_user.me.user)
        .await?;
    Ok(HttpResponse::Ok().json(game.snapshot()))
}

pub fn configure_routes(cfg: &mut web::ServiceConfig) {
    cfg.route("", web::get().to(snapshot))
        .route("/ws", web::get().to(game_session::upgrade));
}
