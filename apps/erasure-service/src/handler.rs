//! # HTTP リクエストハンドラ
//!
//! axum のルートに対応するハンドラ関数を定義する。
//!
//! ## 設計方針
//!
//! - 各ハンドラはサブモジュールに配置
//! - ハンドラは薄く保ち、ビジネスロジックは usecase 層に委譲
//! - プリンシパルは [`AuthenticatedPrincipal`] extractor で 1 回だけ解決する
//!
//! ## ハンドラ一覧
//!
//! - `health`: ヘルスチェック
//! - `erasure`: 消去・見積もり

pub mod erasure;
pub mod health;
pub mod principal;

use std::sync::Arc;

use axum::{
    Router,
    routing::{get, post},
};
pub use erasure::{ErasureState, delete_all_data, deletion_preview};
pub use health::health_check;
pub use principal::{AuthenticatedPrincipal, PRINCIPAL_HEADER};

/// 消去サービスのルーターを構築する
///
/// 消去エンドポイントは `POST` と `DELETE` の両方で受け付ける。
pub fn router(state: Arc<ErasureState>) -> Router {
    Router::new()
        .route("/health", get(health_check))
        .route(
            "/user/delete-all-data",
            post(delete_all_data).delete(delete_all_data),
        )
        .route("/user/deletion-preview", get(deletion_preview))
        .with_state(state)
}
