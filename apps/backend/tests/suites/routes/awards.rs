use actix_web::http::StatusCode;
use actix_web::test;
use backend_test_support::assert_problem_details;
use points_backend::test_support::create_test_app_builder;
use serde_json::json;

use crate::common::json_ok;
use crate::support::{post_json, Classroom, DEVICE_ID, STUDENT_TOKEN, TEACHER_TOKEN};

#[actix_web::test]
async fn teacher_awards_points() {
    let room = Classroom::new();
    room.backend.set_balance(room.student, 3);
    let app = create_test_app_builder(room.state()).build().await;

    let body = json!({ "identifier": "Ana@School.test", "delta": 4, "reason": "Helped a classmate" });
    let receipt = json_ok(
        test::call_service(&app, post_json("/api/awards", TEACHER_TOKEN, &body).to_request()).await,
    )
    .await;
    assert_eq!(receipt["new_balance"], 7);
    assert_eq!(receipt["student_id"], room.student.to_string());
    assert_eq!(room.backend.balance_of(room.student), 7);
    assert_eq!(room.backend.awards()[0].device_id, DEVICE_ID);
}

#[actix_web::test]
async fn explicit_device_id_is_forwarded() {
    let room = Classroom::new();
    let app = create_test_app_builder(room.state()).build().await;

    let body = json!({
        "identifier": "S-1042",
        "delta": -2,
        "reason": "Phone in class",
        "device_id": "kiosk-2"
    });
    let resp = test::call_service(&app, post_json("/api/awards", TEACHER_TOKEN, &body).to_request()).await;
    assert!(resp.status().is_success());
    assert_eq!(room.backend.awards()[0].device_id, "kiosk-2");
    assert_eq!(room.backend.balance_of(room.student), -2);
}

#[actix_web::test]
async fn students_cannot_award() {
    let room = Classroom::new();
    let app = create_test_app_builder(room.state()).build().await;

    let body = json!({ "identifier": "ana@school.test", "delta": 50, "reason": "Me" });
    let resp = test::call_service(&app, post_json("/api/awards", STUDENT_TOKEN, &body).to_request()).await;
    assert_problem_details(resp, "INSUFFICIENT_ROLE", StatusCode::FORBIDDEN).await;
    assert_eq!(room.backend.calls("award_points"), 0);
}

#[actix_web::test]
async fn invalid_forms_are_rejected() {
    let room = Classroom::new();
    let app = create_test_app_builder(room.state()).build().await;

    let cases = [
        (json!({ "identifier": " ", "delta": 1, "reason": "x" }), "INVALID_IDENTIFIER"),
        (json!({ "identifier": "S-1042", "delta": 0, "reason": "x" }), "INVALID_DELTA"),
        (json!({ "identifier": "S-1042", "delta": 1001, "reason": "x" }), "INVALID_DELTA"),
        (json!({ "identifier": "S-1042", "delta": 1, "reason": "" }), "INVALID_REASON"),
    ];
    for (body, code) in cases {
        let resp =
            test::call_service(&app, post_json("/api/awards", TEACHER_TOKEN, &body).to_request()).await;
        assert_problem_details(resp, code, StatusCode::UNPROCESSABLE_ENTITY).await;
    }
    assert_eq!(room.backend.calls("award_points"), 0);
}

#[actix_web::test]
async fn unknown_student_keeps_service_message() {
    let room = Classroom::new();
    let app = create_test_app_builder(room.state()).build().await;

    let body = json!({ "identifier": "nobody@school.test", "delta": 1, "reason": "x" });
    let resp = test::call_service(&app, post_json("/api/awards", TEACHER_TOKEN, &body).to_request()).await;
    let problem = assert_problem_details(resp, "REJECTED", StatusCode::UNPROCESSABLE_ENTITY).await;
    assert_eq!(problem.detail, "Student not found");
}

#[actix_web::test]
async fn malformed_json_is_bad_request() {
    let room = Classroom::new();
    let app = create_test_app_builder(room.state()).build().await;

    let body = json!({ "identifier": "S-1042", "delta": "lots", "reason": "x" });
    let resp = test::call_service(&app, post_json("/api/awards", TEACHER_TOKEN, &body).to_request()).await;
    assert_problem_details(resp, "BAD_REQUEST", StatusCode::BAD_REQUEST).await;
}
