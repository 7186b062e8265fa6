//! 测试公共模块
//! 基于内存存储构建完整路由，并提供令牌、种子数据与请求辅助函数

#![allow(dead_code)]

use axum::{
    body::Body,
    http::{header, HeaderMap, Method, Request, StatusCode},
    Router,
};
use chrono::Utc;
use http_body_util::BodyExt;
use secrecy::Secret;
use serde_json::Value;
use std::sync::Arc;
use tower::ServiceExt;
use uuid::Uuid;
use wathii_moderation::{
    config::{
        AppConfig, DatabaseConfig, LoggingConfig, ModerationConfig, SecurityConfig, ServerConfig,
        StorageBackend,
    },
    middleware::AppState,
    models::{News, Review, Role, SubjectState, User},
    repository::{MemoryStore, NewsRepository, ReviewRepository, UserRepository},
    routes,
};

/// 创建测试配置
pub fn create_test_config() -> AppConfig {
    AppConfig {
        server: ServerConfig {
            addr: "127.0.0.1:0".to_string(),
            graceful_shutdown_timeout_secs: 5,
            body_limit_bytes: 64 * 1024,
        },
        database: DatabaseConfig {
            backend: StorageBackend::Memory,
            url: Secret::new(std::env::var("TEST_DATABASE_URL").unwrap_or_default()),
            max_connections: 5,
            min_connections: 1,
            acquire_timeout_secs: 5,
            idle_timeout_secs: 300,
            max_lifetime_secs: 1800,
        },
        logging: LoggingConfig {
            level: "debug".to_string(),
            format: "pretty".to_string(),
        },
        security: SecurityConfig {
            jwt_secret: Secret::new("test-secret-key-for-testing-only-min-32-chars".to_string()),
            access_token_exp_secs: 300,
            trust_proxy: false,
            allowed_ips: None,
        },
        moderation: ModerationConfig::default(),
    }
}

/// 测试中的操作者
#[derive(Debug, Clone)]
pub struct TestActor {
    pub id: Uuid,
    pub name: String,
    pub role: Role,
    pub token: String,
}

/// 完整测试应用
pub struct TestApp {
    pub router: Router,
    pub state: Arc<AppState>,
    pub store: Arc<MemoryStore>,
}

impl TestApp {
    pub fn new() -> Self {
        Self::with_config(create_test_config())
    }

    pub fn with_config(config: AppConfig) -> Self {
        let store = Arc::new(MemoryStore::new());
        let state = Arc::new(
            AppState::new(config, store.clone()).expect("Failed to build test app state"),
        );
        let router = routes::create_router(state.clone());

        Self {
            router,
            state,
            store,
        }
    }

    /// 签发令牌
    pub fn actor(&self, name: &str, role: Role) -> TestActor {
        let id = Uuid::new_v4();
        let token = self
            .state
            .jwt_service
            .generate_access_token(&id, name, role)
            .expect("Failed to sign test token");

        TestActor {
            id,
            name: name.to_string(),
            role,
            token,
        }
    }

    pub fn admin(&self) -> TestActor {
        self.actor("Ada Admin", Role::Admin)
    }

    pub fn staff(&self) -> TestActor {
        self.actor("Sam Staff", Role::Staff)
    }

    pub fn customer(&self) -> TestActor {
        self.actor("Casey Customer", Role::Customer)
    }

    pub async fn seed_review(&self, comment: &str) -> Review {
        let review = Review {
            id: Uuid::new_v4(),
            user_id: Uuid::new_v4(),
            user_name: "reviewer".to_string(),
            rating: 4,
            comment: comment.to_string(),
            created_at: Utc::now(),
            state: SubjectState::Active,
        };
        self.store.insert_review(&review).await.unwrap();
        review
    }

    pub async fn seed_news(&self, title: &str) -> News {
        let news = News {
            id: Uuid::new_v4(),
            title: title.to_string(),
            content: format!("{} body", title),
            views: 0,
            author_id: Uuid::new_v4(),
            author_name: "editor".to_string(),
            created_at: Utc::now(),
            state: SubjectState::Active,
        };
        self.store.insert_news(&news).await.unwrap();
        news
    }

    /// 以给定操作者的身份写入用户记录
    pub async fn seed_user(&self, actor: &TestActor, phone: Option<&str>) -> User {
        let user = User {
            id: actor.id,
            name: actor.name.clone(),
            email: format!("{}@example.com", actor.id),
            phone: phone.map(str::to_string),
            role: actor.role,
            created_at: Utc::now(),
            state: SubjectState::Active,
        };
        self.store.insert_user(&user).await.unwrap();
        user
    }

    /// 发送请求，返回状态码、响应头和原始响应体
    pub async fn send_raw(
        &self,
        method: Method,
        uri: &str,
        token: Option<&str>,
        body: Option<Value>,
    ) -> (StatusCode, HeaderMap, Vec<u8>) {
        let mut builder = Request::builder().method(method).uri(uri);
        if let Some(token) = token {
            builder = builder.header(header::AUTHORIZATION, format!("Bearer {}", token));
        }

        let request = match body {
            Some(json) => builder
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from(json.to_string()))
                .unwrap(),
            None => builder.body(Body::empty()).unwrap(),
        };

        let response = self.router.clone().oneshot(request).await.unwrap();
        let status = response.status();
        let headers = response.headers().clone();
        let bytes = response.into_body().collect().await.unwrap().to_bytes();

        (status, headers, bytes.to_vec())
    }

    /// 发送请求并按 JSON 解析响应体（空响应体为 Null）
    pub async fn send(
        &self,
        method: Method,
        uri: &str,
        token: Option<&str>,
        body: Option<Value>,
    ) -> (StatusCode, Value) {
        let (status, _, bytes) = self.send_raw(method, uri, token, body).await;
        let json = if bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&bytes).unwrap_or(Value::Null)
        };
        (status, json)
    }

    pub async fn get(&self, uri: &str, token: Option<&str>) -> (StatusCode, Value) {
        self.send(Method::GET, uri, token, None).await
    }
}
