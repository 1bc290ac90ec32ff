#![allow(dead_code)]

use actix_web::body::BoxBody;
use actix_web::dev::ServiceResponse;
use actix_web::test;
use serde_json::Value;

// Logging is auto-installed for every test binary
#[ctor::ctor]
fn init_logging() {
    backend_test_support::logging::init();
}

/// Read a successful response as JSON, failing loudly on anything else.
pub async fn json_ok(resp: ServiceResponse<BoxBody>) -> Value {
    let status = resp.status();
    let body = test::read_body(resp).await;
    assert!(
        status.is_success(),
        "expected success, got {status}: {}",
        String::from_utf8_lossy(&body)
    );
    serde_json::from_slice(&body).expect("response body should be JSON")
}
