//! 用户 API 集成测试：手机号修改、账户软删除与恢复

use axum::http::{Method, StatusCode};
use serde_json::json;

mod common;
use common::TestApp;

#[tokio::test]
async fn test_change_phone_by_self_is_audited() {
    let app = TestApp::new();
    let admin = app.admin();
    let customer = app.customer();
    app.seed_user(&customer, None).await;
    let uri = format!("/api/users/{}/phone", customer.id);

    let (status, body) = app
        .send(
            Method::PUT,
            &uri,
            Some(&customer.token),
            Some(json!({ "phone": "+33 6 12 34 56 78" })),
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["user"]["phone"], "+33 6 12 34 56 78");

    let (status, _) = app
        .send(
            Method::PUT,
            &uri,
            Some(&admin.token),
            Some(json!({ "phone": "+33 7 00 00 00 00" })),
        )
        .await;
    assert_eq!(status, StatusCode::OK);

    let (_, body) = app
        .get(
            &format!("/api/users/audit?userId={}&sort=asc", customer.id),
            Some(&admin.token),
        )
        .await;
    assert_eq!(body["total"], 2);
    assert_eq!(body["audits"][0]["action"], "phone_changed");
    assert_eq!(body["audits"][0]["note"], "none -> +33 6 12 34 56 78");
    assert_eq!(
        body["audits"][1]["note"],
        "+33 6 12 34 56 78 -> +33 7 00 00 00 00"
    );
    assert_eq!(body["audits"][1]["byName"], admin.name.as_str());
}

#[tokio::test]
async fn test_other_customers_cannot_read_or_edit() {
    let app = TestApp::new();
    let owner = app.customer();
    let stranger = app.customer();
    app.seed_user(&owner, Some("555-0100")).await;

    let (status, _) = app
        .get(&format!("/api/users/{}", owner.id), Some(&stranger.token))
        .await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let (status, _) = app
        .send(
            Method::PUT,
            &format!("/api/users/{}/phone", owner.id),
            Some(&stranger.token),
            Some(json!({ "phone": "555-0199" })),
        )
        .await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let (status, body) = app
        .get(&format!("/api/users/{}", owner.id), Some(&owner.token))
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["user"]["phone"], "555-0100");
}

#[tokio::test]
async fn test_user_deletion_rules() {
    let app = TestApp::new();
    let admin = app.admin();
    let staff = app.staff();
    let customer = app.customer();
    app.seed_user(&admin, None).await;
    app.seed_user(&customer, None).await;
    let uri = format!("/api/users/{}", customer.id);

    let (status, _) = app.send(Method::DELETE, &uri, Some(&staff.token), None).await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let (status, _) = app
        .send(
            Method::DELETE,
            &format!("/api/users/{}", admin.id),
            Some(&admin.token),
            None,
        )
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, _) = app
        .send(
            Method::DELETE,
            &uri,
            Some(&admin.token),
            Some(json!({ "reason": "fraud" })),
        )
        .await;
    assert_eq!(status, StatusCode::OK);

    // 已删除账户对本人也不可见
    let (status, _) = app.get(&uri, Some(&customer.token)).await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (_, body) = app.get("/api/users/deleted", Some(&staff.token)).await;
    assert_eq!(body["count"], 1);

    let (status, body) = app
        .send(
            Method::POST,
            &format!("{}/restore", uri),
            Some(&admin.token),
            None,
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["user"]["id"], customer.id.to_string());

    let (_, body) = app
        .get(
            &format!("/api/users/audit?userId={}&action=restored", customer.id),
            Some(&admin.token),
        )
        .await;
    assert_eq!(body["audits"][0]["note"], "restored; prevReason: fraud");
}

#[tokio::test]
async fn test_change_phone_with_mistyped_body_is_bad_request() {
    let app = TestApp::new();
    let customer = app.customer();
    app.seed_user(&customer, None).await;

    let (status, body) = app
        .send(
            Method::PUT,
            &format!("/api/users/{}/phone", customer.id),
            Some(&customer.token),
            Some(json!({ "phone": 5550100 })),
        )
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"]["code"], 400);
}

#[tokio::test]
async fn test_deleted_staff_token_loses_access_until_restored() {
    let app = TestApp::new();
    let admin = app.admin();
    let staff = app.staff();
    app.seed_user(&staff, None).await;
    let review = app.seed_review("questionable").await;
    let review_uri = format!("/api/reviews/{}", review.id);

    let (status, _) = app
        .send(
            Method::DELETE,
            &format!("/api/users/{}", staff.id),
            Some(&admin.token),
            Some(json!({ "reason": "left the company" })),
        )
        .await;
    assert_eq!(status, StatusCode::OK);

    let (status, body) = app
        .send(Method::DELETE, &review_uri, Some(&staff.token), None)
        .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["error"]["code"], 401);

    app.send(
        Method::POST,
        &format!("/api/users/{}/restore", staff.id),
        Some(&admin.token),
        None,
    )
    .await;

    let (status, _) = app
        .send(Method::DELETE, &review_uri, Some(&staff.token), None)
        .await;
    assert_eq!(status, StatusCode::OK);
}
