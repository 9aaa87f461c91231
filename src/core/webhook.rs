use axum::http::{header::AUTHORIZATION, HeaderMap};
use serde::Deserialize;

use crate::error::{RevalidateError, ValidationError};
use crate::models::ChangeNotification;

#[derive(Debug, Deserialize)]
struct Envelope {
    data: ChangeNotification,
}

/// 解析并校验 CMS webhook 负载
///
/// 接受两种形状：`Article` 必须带 `id` 与 `localizations`，其他类型只校验 `__typename`。
pub fn parse_payload(body: &[u8]) -> Result<ChangeNotification, ValidationError> {
    let envelope: Envelope = serde_json::from_slice(body)?;
    Ok(envelope.data)
}

/// 校验 webhook 共享密钥，支持原始值或 `Bearer <secret>`
pub fn verify_secret(headers: &HeaderMap, expected: &str) -> Result<(), RevalidateError> {
    let provided = headers
        .get(AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .map(|v| v.strip_prefix("Bearer ").unwrap_or(v).trim())
        .filter(|v| !v.is_empty())
        .ok_or(RevalidateError::Unauthorized)?;

    if !expected.is_empty() && constant_time_eq(provided.as_bytes(), expected.as_bytes()) {
        Ok(())
    } else {
        Err(RevalidateError::Unauthorized)
    }
}

fn constant_time_eq(a: &[u8], b: &[u8]) -> bool {
    if a.len() != b.len() {
        return false;
    }
    a.iter().zip(b).fold(0u8, |acc, (x, y)| acc | (x ^ y)) == 0
}
