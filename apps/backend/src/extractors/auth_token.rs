use std::future::{ready, Ready};

use actix_web::{dev::Payload, http::header, web, FromRequest, HttpRequest};
use serde::Deserialize;

use crate::domain::AccessToken;
use crate::error::AppError;
use crate::logging::security;

/// Caller's access token, from `Authorization: Bearer <token>`.
///
/// Browsers cannot set headers on a WebSocket handshake, so an
/// `access_token` query parameter is accepted when the header is absent.
#[derive(Debug, Clone)]
pub struct AuthToken(pub AccessToken);

#[derive(Deserialize)]
struct TokenQuery {
    access_token: Option<String>,
}

impl AuthToken {
    pub fn token(&self) -> &AccessToken {
        &self.0
    }

    fn from_header(req: &HttpRequest) -> Option<Result<AccessToken, AppError>> {
        let value = req.headers().get(header::AUTHORIZATION)?;
        let parsed = value
            .to_str()
            .ok()
            .and_then(|v| {
                let mut parts = v.split_whitespace();
                match (parts.next(), parts.next(), parts.next()) {
                    (Some(scheme), Some(token), None) if scheme.eq_ignore_ascii_case("bearer") => {
                        Some(AccessToken::new(token))
                    }
                    _ => None,
                }
            })
            .ok_or_else(AppError::unauthorized_missing_bearer);
        Some(parsed)
    }

    fn from_query(req: &HttpRequest) -> Option<AccessToken> {
        web::Query::<TokenQuery>::from_query(req.query_string())
            .ok()?
            .into_inner()
            .access_token
            .map(|t| t.trim().to_string())
            .filter(|t| !t.is_empty())
            .map(AccessToken::new)
    }

    pub fn extract(req: &HttpRequest) -> Result<Self, AppError> {
        let token = match Self::from_header(req) {
            Some(parsed) => parsed,
            None => Self::from_query(req).ok_or_else(AppError::unauthorized_missing_bearer),
        };
        token.map(AuthToken).inspect_err(|_| {
            security::unauthenticated("missing or malformed bearer token");
        })
    }
}

impl FromRequest for AuthToken {
    type Error = AppError;
    type Future = Ready<Result<Self, Self::Error>>;

    fn from_request(req: &HttpRequest, _: &mut Payload) -> Self::Future {
        ready(Self::extract(req))
    }
}
