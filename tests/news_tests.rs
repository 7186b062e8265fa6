//! 新闻 API 集成测试：阅读计数、浏览量修改与软删除

use axum::http::{Method, StatusCode};
use serde_json::json;

mod common;
use common::TestApp;

#[tokio::test]
async fn test_reading_increments_views_and_audits_signed_in_readers() {
    let app = TestApp::new();
    let admin = app.admin();
    let reader = app.customer();
    let news = app.seed_news("Spring menu").await;
    let uri = format!("/api/news/{}", news.id);

    let (status, body) = app.get(&uri, None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["news"]["views"], 1);

    let (status, body) = app.get(&uri, Some(&reader.token)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["news"]["views"], 2);

    // 无效令牌按匿名处理
    let (status, body) = app.get(&uri, Some("garbage")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["news"]["views"], 3);

    let (_, body) = app
        .get(
            &format!("/api/news/audit?newsId={}", news.id),
            Some(&admin.token),
        )
        .await;
    assert_eq!(body["total"], 1);
    assert_eq!(body["audits"][0]["action"], "viewed");
    assert_eq!(body["audits"][0]["byId"], reader.id.to_string());
}

#[tokio::test]
async fn test_update_views_records_old_and_new() {
    let app = TestApp::new();
    let admin = app.admin();
    let staff = app.staff();
    let news = app.seed_news("Opening hours").await;
    let uri = format!("/api/news/{}/views", news.id);

    let (status, body) = app
        .send(Method::PUT, &uri, Some(&admin.token), Some(json!({ "views": 120 })))
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["news"]["views"], 120);

    let (status, _) = app
        .send(Method::PUT, &uri, Some(&admin.token), Some(json!({ "views": -1 })))
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, _) = app
        .send(Method::PUT, &uri, Some(&staff.token), Some(json!({ "views": 5 })))
        .await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let (_, body) = app
        .get("/api/news/audit?action=views_updated", Some(&admin.token))
        .await;
    assert_eq!(body["total"], 1);
    assert_eq!(body["audits"][0]["note"], "0 -> 120");
}

#[tokio::test]
async fn test_deleted_news_is_hidden_until_restored() {
    let app = TestApp::new();
    let admin = app.admin();
    let staff = app.staff();
    let news = app.seed_news("Recall notice").await;
    let uri = format!("/api/news/{}", news.id);

    let (status, _) = app
        .send(
            Method::DELETE,
            &uri,
            Some(&staff.token),
            Some(json!({ "reason": "outdated", "note": "superseded by v2" })),
        )
        .await;
    assert_eq!(status, StatusCode::OK);

    let (status, _) = app.get(&uri, None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (_, body) = app.get("/api/news", None).await;
    assert_eq!(body["count"], 0);

    let (_, body) = app.get("/api/news/deleted", Some(&staff.token)).await;
    assert_eq!(body["count"], 1);
    assert_eq!(body["news"][0]["state"]["reason"], "outdated");
    assert_eq!(body["news"][0]["state"]["note"], "superseded by v2");

    let (status, body) = app
        .send(
            Method::POST,
            &format!("{}/restore", uri),
            Some(&admin.token),
            None,
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["news"]["title"], "Recall notice");

    let (status, _) = app.get(&uri, None).await;
    assert_eq!(status, StatusCode::OK);

    let (_, body) = app
        .get("/api/news/audit?action=restored", Some(&admin.token))
        .await;
    assert_eq!(body["audits"][0]["note"], "restored; prevReason: outdated");
}

#[tokio::test]
async fn test_publish_news() {
    let app = TestApp::new();
    let staff = app.staff();
    let customer = app.customer();
    let payload = json!({ "title": "Holiday hours", "content": "Closed on the 25th" });

    let (status, _) = app
        .send(Method::POST, "/api/news", Some(&customer.token), Some(payload.clone()))
        .await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let (status, body) = app
        .send(Method::POST, "/api/news", Some(&staff.token), Some(payload))
        .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(body["news"]["authorName"], staff.name.as_str());
    assert_eq!(body["news"]["views"], 0);

    let (_, body) = app.get("/api/news", None).await;
    assert_eq!(body["count"], 1);
}

#[tokio::test]
async fn test_mistyped_news_bodies_are_bad_request() {
    let app = TestApp::new();
    let admin = app.admin();
    let news = app.seed_news("Menu update").await;

    let (status, body) = app
        .send(
            Method::PUT,
            &format!("/api/news/{}/views", news.id),
            Some(&admin.token),
            Some(json!({ "views": "abc" })),
        )
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"]["code"], 400);

    let (status, body) = app
        .send(
            Method::POST,
            "/api/news",
            Some(&admin.token),
            Some(json!({ "title": 7 })),
        )
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"]["code"], 400);
}
