use std::time::Duration;

use points_backend::domain::{AccessToken, AwardRequest, Role, UserId};
use points_backend::errors::domain::{
    AuthErrorKind, DomainError, InfraErrorKind, ValidationKind,
};
use points_backend::{HostedRestBackend, PointsBackend};
use serde_json::json;
use uuid::Uuid;

use crate::support::fake_hosted::{FakeHosted, ANON_KEY};

fn token() -> AccessToken {
    AccessToken::new("caller-token")
}

fn backend(fake: &FakeHosted) -> HostedRestBackend {
    HostedRestBackend::new(&fake.config()).expect("client builds")
}

#[actix_web::test]
async fn every_request_carries_apikey_and_bearer() {
    let fake = FakeHosted::start().await;
    let id = Uuid::new_v4();
    fake.respond("/auth/v1/user", 200, json!({"id": id, "email": "ana@school.test"}));

    let user = backend(&fake).current_user(&token()).await.unwrap().unwrap();
    assert_eq!(user.id, UserId(id));
    assert_eq!(user.email.as_deref(), Some("ana@school.test"));

    let req = fake.last_request();
    assert_eq!(req.method, "GET");
    assert_eq!(req.apikey.as_deref(), Some(ANON_KEY));
    assert_eq!(req.authorization.as_deref(), Some("Bearer caller-token"));
    fake.shutdown().await;
}

#[actix_web::test]
async fn rejected_session_is_no_user() {
    let fake = FakeHosted::start().await;
    fake.respond("/auth/v1/user", 401, json!({"msg": "invalid JWT"}));
    assert!(backend(&fake).current_user(&token()).await.unwrap().is_none());

    fake.respond("/auth/v1/user", 403, json!({"msg": "bad token"}));
    assert!(backend(&fake).current_user(&token()).await.unwrap().is_none());
    fake.shutdown().await;
}

#[actix_web::test]
async fn role_filters_profile_by_id() {
    let fake = FakeHosted::start().await;
    let id = UserId(Uuid::new_v4());
    fake.respond("/rest/v1/profiles", 200, json!([{"role": "teacher"}]));

    let role = backend(&fake).role(&token(), id).await.unwrap();
    assert_eq!(role, Some(Role::Teacher));

    let query = fake.last_request().query;
    assert!(query.contains("select=role"), "{query}");
    assert!(query.contains(&format!("id=eq.{id}")), "{query}");

    fake.respond("/rest/v1/profiles", 200, json!([]));
    assert_eq!(backend(&fake).role(&token(), id).await.unwrap(), None);

    fake.respond("/rest/v1/profiles", 200, json!([{"role": "janitor"}]));
    let err = backend(&fake).role(&token(), id).await.unwrap_err();
    assert!(matches!(err, DomainError::Infra(InfraErrorKind::DataCorruption, _)));
    fake.shutdown().await;
}

#[actix_web::test]
async fn missing_balance_row_is_zero() {
    let fake = FakeHosted::start().await;
    let id = UserId(Uuid::new_v4());

    fake.respond("/rest/v1/student_balances", 200, json!([]));
    assert_eq!(backend(&fake).student_balance(&token(), id).await.unwrap(), 0);

    fake.respond("/rest/v1/student_balances", 200, json!([{"balance": 42}]));
    assert_eq!(backend(&fake).student_balance(&token(), id).await.unwrap(), 42);
    assert!(fake
        .last_request()
        .query
        .contains(&format!("student_id=eq.{id}")));
    fake.shutdown().await;
}

#[actix_web::test]
async fn transactions_are_requested_newest_first_with_limit() {
    let fake = FakeHosted::start().await;
    let id = UserId(Uuid::new_v4());
    fake.respond(
        "/rest/v1/transactions",
        200,
        json!([
            {"id": 2, "created_at": "2024-09-02T08:02:00+00:00", "delta": -3,
             "reason": "late", "team_id": 7, "device_id": "kiosk"},
            {"id": 1, "created_at": "2024-09-02T08:01:00Z", "delta": 5,
             "reason": null, "team_id": null, "device_id": null}
        ]),
    );

    let rows = backend(&fake)
        .list_transactions(&token(), id, 15)
        .await
        .unwrap();
    assert_eq!(rows.len(), 2);
    assert_eq!(rows[0].delta, -3);
    assert_eq!(rows[0].team_id, Some(7));
    assert_eq!(rows[1].reason, None);

    let query = fake.last_request().query;
    assert!(query.contains("order=created_at.desc"), "{query}");
    assert!(query.contains("limit=15"), "{query}");
    fake.shutdown().await;
}

#[actix_web::test]
async fn award_posts_rpc_arguments() {
    let fake = FakeHosted::start().await;
    let student = Uuid::new_v4();
    fake.respond(
        "/rest/v1/rpc/award_points",
        200,
        json!({"student_id": student, "new_balance": 15}),
    );

    let award = AwardRequest {
        identifier: "ana@school.test".into(),
        delta: 5,
        reason: "Helped out".into(),
        device_id: "kiosk-1".into(),
    };
    let receipt = backend(&fake).award_points(&token(), &award).await.unwrap();
    assert_eq!(receipt.student_id, Some(UserId(student)));
    assert_eq!(receipt.new_balance, Some(15));

    let req = fake.last_request();
    assert_eq!(req.method, "POST");
    let body: serde_json::Value = serde_json::from_str(&req.body).unwrap();
    assert_eq!(
        body,
        json!({
            "p_identifier": "ana@school.test",
            "p_delta": 5,
            "p_reason": "Helped out",
            "p_device_id": "kiosk-1"
        })
    );
    fake.shutdown().await;
}

#[actix_web::test]
async fn rejected_award_keeps_service_message() {
    let fake = FakeHosted::start().await;
    fake.respond(
        "/rest/v1/rpc/award_points",
        400,
        json!({"code": "P0001", "message": "Student not found", "hint": null}),
    );
    let award = AwardRequest {
        identifier: "ghost@school.test".into(),
        delta: 1,
        reason: "x".into(),
        device_id: "d".into(),
    };
    let err = backend(&fake).award_points(&token(), &award).await.unwrap_err();
    assert_eq!(
        err,
        DomainError::Validation(ValidationKind::Rejected, "Student not found".into())
    );

    fake.respond(
        "/rest/v1/rpc/award_points",
        403,
        json!({"message": "permission denied"}),
    );
    let err = backend(&fake).award_points(&token(), &award).await.unwrap_err();
    assert!(matches!(err, DomainError::Auth(AuthErrorKind::Forbidden, _)));
    fake.shutdown().await;
}

#[actix_web::test]
async fn local_total_shapes() {
    let fake = FakeHosted::start().await;
    let id = UserId(Uuid::new_v4());
    let path = "/rest/v1/rpc/get_my_local_total";

    fake.respond(path, 200, json!(12));
    assert_eq!(backend(&fake).local_total(&token(), id).await.unwrap(), Some(12));
    assert_eq!(fake.last_request().body, "{}");

    fake.respond(path, 200, json!([{"total_local": 30}]));
    assert_eq!(backend(&fake).local_total(&token(), id).await.unwrap(), Some(30));

    fake.respond(path, 200, json!([{"total_local": null}]));
    assert_eq!(backend(&fake).local_total(&token(), id).await.unwrap(), Some(0));

    fake.respond(path, 200, json!([]));
    assert_eq!(backend(&fake).local_total(&token(), id).await.unwrap(), None);
    fake.shutdown().await;
}

#[actix_web::test]
async fn team_name_first_row() {
    let fake = FakeHosted::start().await;
    fake.respond("/rest/v1/teams", 200, json!([{"name": "Otters"}]));
    assert_eq!(
        backend(&fake).team_name(&token(), 7).await.unwrap().as_deref(),
        Some("Otters")
    );
    assert!(fake.last_request().query.contains("id=eq.7"));

    fake.respond("/rest/v1/teams", 200, json!([]));
    assert_eq!(backend(&fake).team_name(&token(), 8).await.unwrap(), None);
    fake.shutdown().await;
}

#[actix_web::test]
async fn failures_map_to_infra_kinds() {
    let fake = FakeHosted::start().await;
    let id = UserId(Uuid::new_v4());

    fake.respond("/rest/v1/student_balances", 503, json!({"message": "maintenance"}));
    let err = backend(&fake).student_balance(&token(), id).await.unwrap_err();
    assert_eq!(
        err,
        DomainError::Infra(InfraErrorKind::Unavailable, "maintenance".into())
    );

    fake.respond_raw("/rest/v1/student_balances", 200, "{oops");
    let err = backend(&fake).student_balance(&token(), id).await.unwrap_err();
    assert!(matches!(err, DomainError::Infra(InfraErrorKind::DataCorruption, _)));

    fake.respond_slowly("/rest/v1/student_balances", Duration::from_secs(3));
    let err = backend(&fake).student_balance(&token(), id).await.unwrap_err();
    assert!(matches!(err, DomainError::Infra(InfraErrorKind::Timeout, _)));
    fake.shutdown().await;
}

#[actix_web::test]
async fn unreachable_service_is_unavailable() {
    let fake = FakeHosted::start().await;
    let config = fake.config();
    fake.shutdown().await;

    let backend = HostedRestBackend::new(&config).unwrap();
    let err = backend
        .student_balance(&token(), UserId(Uuid::new_v4()))
        .await
        .unwrap_err();
    assert!(matches!(err, DomainError::Infra(InfraErrorKind::Unavailable, _)));
}
