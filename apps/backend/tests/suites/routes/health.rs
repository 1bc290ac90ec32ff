use actix_web::test;
use actix_web::test::TestRequest;
use points_backend::test_support::create_test_app_builder;

use crate::support::Classroom;

#[actix_web::test]
async fn health_is_public_plain_text() {
    let room = Classroom::new();
    let app = create_test_app_builder(room.state()).build().await;

    let resp = test::call_service(&app, TestRequest::get().uri("/health").to_request()).await;
    assert!(resp.status().is_success());
    assert!(resp.headers().contains_key("x-request-id"));
    assert_eq!(test::read_body(resp).await, "ok");
    assert_eq!(room.backend.calls("current_user"), 0);
}
