//! # プリンシパル解決
//!
//! リクエストから消去対象のプリンシパルを 1 回だけ解決する extractor。
//!
//! 1. `X-User-ID` ヘッダー
//! 2. ヘッダーがない（または空の）場合は `user_id` クエリパラメータ
//!
//! どちらからも解決できない場合、または値がプリンシパルとして不正な場合は 401 を返す。

use axum::{
    extract::{FromRequestParts, Query},
    http::request::Parts,
};
use erasure_domain::principal::Principal;
use serde::Deserialize;

use crate::error::ServiceError;

/// プリンシパルを運ぶヘッダー名
pub const PRINCIPAL_HEADER: &str = "x-user-id";

/// 解決済みのプリンシパル
#[derive(Debug, Clone)]
pub struct AuthenticatedPrincipal(pub Principal);

#[derive(Debug, Deserialize)]
struct PrincipalQuery {
    user_id: Option<String>,
}

impl<S> FromRequestParts<S> for AuthenticatedPrincipal
where
    S: Send + Sync,
{
    type Rejection = ServiceError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let from_header = parts
            .headers
            .get(PRINCIPAL_HEADER)
            .and_then(|value| value.to_str().ok())
            .filter(|value| !value.trim().is_empty())
            .map(str::to_string);

        let raw = match from_header {
            Some(value) => Some(value),
            None => Query::<PrincipalQuery>::try_from_uri(&parts.uri)
                .ok()
                .and_then(|Query(query)| query.user_id),
        };

        let Some(raw) = raw else {
            return Err(ServiceError::Unauthorized(
                "X-User-ID ヘッダーまたは user_id パラメータが必要です".to_string(),
            ));
        };

        Ok(Self(Principal::new(raw)?))
    }
}
