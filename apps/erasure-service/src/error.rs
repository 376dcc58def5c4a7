//! # 消去サービス エラー定義
//!
//! 消去サービス固有のエラーと、HTTP レスポンスへの変換を定義する。
//!
//! | エラー | ステータス |
//! |--------|-----------|
//! | `InvalidConfirmation` | 400 |
//! | `Unauthorized` | 401 |
//! | `Forbidden` | 403 |
//! | `NotFound` | 404 |
//! | `DataIntegrity` | 422 |
//! | `Store` | 500 |
//!
//! `InvalidConfirmation` から `DataIntegrity` までは force モードに関係なく即座に中断する。
//! 消去ステージ中のストアエラーはこの型にならず、結果のエラー一覧に記録される。

use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use erasure_domain::DomainError;
use erasure_infra::InfraError;
use erasure_shared::ErrorResponse;
use thiserror::Error;

/// 消去サービスで発生するエラー
#[derive(Debug, Error)]
pub enum ServiceError {
    /// 確認文字列が一致しない
    #[error("確認文字列が一致しません。\"{expected}\" を正確に入力してください")]
    InvalidConfirmation { expected: &'static str },

    /// プリンシパルを解決できない
    #[error("認証が必要です: {0}")]
    Unauthorized(String),

    /// 本人確認に失敗した
    #[error("権限がありません: {0}")]
    Forbidden(String),

    /// アカウントが見つからない
    #[error("リソースが見つかりません: {0}")]
    NotFound(String),

    /// アカウントレコードを読み取れない
    #[error("データ不整合: {0}")]
    DataIntegrity(String),

    /// ストアエラー（本人確認中など、force モードで吸収されないもの）
    #[error("ストアエラー: {0}")]
    Store(#[from] InfraError),
}

impl From<DomainError> for ServiceError {
    fn from(error: DomainError) -> Self {
        match error {
            DomainError::InvalidConfirmation { expected } => Self::InvalidConfirmation { expected },
            DomainError::CredentialMismatch => {
                Self::Forbidden("メールアドレスが登録情報と一致しません".to_string())
            }
            // プリンシパル ID の検証失敗はプリンシパルを解決できなかったものとして扱う
            DomainError::Validation(msg) => Self::Unauthorized(msg),
        }
    }
}

impl IntoResponse for ServiceError {
    fn into_response(self) -> Response {
        let body = match &self {
            ServiceError::InvalidConfirmation { .. } => {
                ErrorResponse::invalid_confirmation(self.to_string())
            }
            ServiceError::Unauthorized(msg) => ErrorResponse::unauthorized(msg.clone()),
            ServiceError::Forbidden(msg) => ErrorResponse::forbidden(msg.clone()),
            ServiceError::NotFound(msg) => ErrorResponse::not_found(msg.clone()),
            ServiceError::DataIntegrity(msg) => ErrorResponse::data_integrity(msg.clone()),
            ServiceError::Store(e) => {
                tracing::error!(error = ?e, "ストアエラー");
                ErrorResponse::internal_error()
            }
        };

        let status =
            StatusCode::from_u16(body.status).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
        (status, Json(body)).into_response()
    }
}
