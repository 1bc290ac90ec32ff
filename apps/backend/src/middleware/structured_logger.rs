use std::future::{ready, Ready};
use std::time::Instant;

use actix_web::dev::{forward_ready, Service, ServiceRequest, ServiceResponse, Transform};
use actix_web::http::StatusCode;
use actix_web::{Error as ActixError, HttpMessage};
use futures_util::future::LocalBoxFuture;
use tracing::{error, info, warn};

/// One `request_completed` line per request, levelled by response status.
///
/// Only the matched route pattern is logged: query strings may carry
/// `access_token` and concrete paths carry student ids.
pub struct StructuredLogger;

impl<S, B> Transform<S, ServiceRequest> for StructuredLogger
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = ActixError>,
    S::Future: 'static,
    B: 'static,
{
    type Response = ServiceResponse<B>;
    type Error = ActixError;
    type InitError = ();
    type Transform = StructuredLoggerMiddleware<S>;
    type Future = Ready<Result<Self::Transform, Self::InitError>>;

    fn new_transform(&self, service: S) -> Self::Future {
        ready(Ok(StructuredLoggerMiddleware { service }))
    }
}

pub struct StructuredLoggerMiddleware<S> {
    service: S,
}

struct Completed {
    method: String,
    route: String,
    trace_id: String,
    started: Instant,
}

impl Completed {
    fn log(&self, status: StatusCode) {
        let status_code = status.as_u16();
        let duration_us = self.started.elapsed().as_micros() as u64;
        let (method, route, trace_id) = (&self.method, &self.route, &self.trace_id);

        if status.is_server_error() {
            error!(%method, %route, status_code, duration_us, %trace_id, "request_completed");
        } else if status.is_client_error() {
            warn!(%method, %route, status_code, duration_us, %trace_id, "request_completed");
        } else {
            info!(%method, %route, status_code, duration_us, %trace_id, "request_completed");
        }
    }
}

/// Route pattern of a request, e.g. `/api/students/{student_id}/balance`.
/// Unmatched requests are logged as `unmatched`.
fn route_label(pattern: Option<String>) -> String {
    pattern.unwrap_or_else(|| "unmatched".to_string())
}

impl<S, B> Service<ServiceRequest> for StructuredLoggerMiddleware<S>
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = ActixError>,
    S::Future: 'static,
    B: 'static,
{
    type Response = ServiceResponse<B>;
    type Error = ActixError;
    type Future = LocalBoxFuture<'static, Result<Self::Response, Self::Error>>;

    forward_ready!(service);

    fn call(&self, req: ServiceRequest) -> Self::Future {
        let started = Instant::now();
        let method = req.method().to_string();
        let trace_id = req
            .extensions()
            .get::<String>()
            .cloned()
            .unwrap_or_else(|| "unknown".to_string());

        let fut = self.service.call(req);

        Box::pin(async move {
            let result = fut.await;

            // The pattern is only known once routing has run.
            let (status, pattern) = match &result {
                Ok(res) => (res.status(), res.request().match_pattern()),
                Err(err) => (err.as_response_error().status_code(), None),
            };
            Completed {
                method,
                route: route_label(pattern),
                trace_id,
                started,
            }
            .log(status);

            result
        })
    }
}
