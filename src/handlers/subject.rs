//! 软删除 / 恢复的公共请求体与参数解析

use axum::body::Bytes;
use serde::{de::DeserializeOwned, Deserialize};
use uuid::Uuid;

use crate::error::{AppError, Result};

/// 软删除请求体（可省略）
#[derive(Debug, Default, Deserialize)]
pub struct DeleteRequest {
    pub reason: Option<String>,
    pub note: Option<String>,
}

/// 恢复请求体（可省略）
#[derive(Debug, Default, Deserialize)]
pub struct RestoreRequest {
    pub note: Option<String>,
}

/// 路径中的对象 ID；格式错误与不存在同样返回 404
pub fn parse_subject_id(raw: &str) -> Result<Uuid> {
    Uuid::parse_str(raw.trim()).map_err(|_| AppError::NotFound)
}

/// 空请求体按默认值处理
pub fn parse_optional_body<T>(body: &Bytes) -> Result<T>
where
    T: DeserializeOwned + Default,
{
    if body.iter().all(u8::is_ascii_whitespace) {
        return Ok(T::default());
    }
    serde_json::from_slice(body)
        .map_err(|e| AppError::BadRequest(format!("Invalid request body: {}", e)))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_malformed_id_is_not_found() {
        assert!(matches!(parse_subject_id("r1"), Err(AppError::NotFound)));
        assert!(parse_subject_id(&Uuid::new_v4().to_string()).is_ok());
    }

    #[test]
    fn test_optional_body() {
        let empty: DeleteRequest = parse_optional_body(&Bytes::new()).unwrap();
        assert!(empty.reason.is_none());

        let body = Bytes::from_static(br#"{"reason":"spam"}"#);
        let parsed: DeleteRequest = parse_optional_body(&body).unwrap();
        assert_eq!(parsed.reason.as_deref(), Some("spam"));

        let bad = Bytes::from_static(b"{not json");
        assert!(parse_optional_body::<RestoreRequest>(&bad).is_err());
    }
}
