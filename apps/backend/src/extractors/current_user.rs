use actix_web::dev::Payload;
use actix_web::{web, FromRequest, HttpRequest};
use futures_util::future::LocalBoxFuture;

use crate::domain::AccessToken;
use crate::error::AppError;
use crate::errors::domain::{AuthErrorKind, DomainError};
use crate::extractors::auth_token::AuthToken;
use crate::logging::security;
use crate::services::Me;
use crate::state::app_state::AppState;

/// The signed-in caller, resolved through the hosted service, with the token
/// used to do so.
#[derive(Debug, Clone)]
pub struct CurrentUser {
    pub token: AccessToken,
    pub me: Me,
}

impl FromRequest for CurrentUser {
    type Error = AppError;
    type Future = LocalBoxFuture<'static, Result<Self, Self::Error>>;

    fn from_request(req: &HttpRequest, _payload: &mut Payload) -> Self::Future {
        let req = req.clone();

        Box::pin(async move {
            let AuthToken(token) = AuthToken::extract(&req)?;

            let state = req
                .app_data::<web::Data<AppState>>()
                .ok_or_else(|| AppError::internal("AppState not available"))?;

            let me = state.points.whoami(&token).await.map_err(|e| {
                if matches!(e, DomainError::Auth(AuthErrorKind::Unauthenticated, _)) {
                    security::unauthenticated("session rejected by hosted service");
                }
                AppError::from(e)
            })?;

            Ok(CurrentUser { token, me })
        })
    }
}
