//! # ヘルスチェックハンドラ
//!
//! レスポンス型は [`erasure_shared::HealthResponse`] を参照。

use std::sync::Arc;

use axum::{Json, extract::State};
use erasure_shared::HealthResponse;

use super::ErasureState;

/// ヘルスチェックエンドポイント
///
/// ブロブストアが未構成でも `healthy` を返し、`blob_store` で構成状態を示す。
pub async fn health_check(State(state): State<Arc<ErasureState>>) -> Json<HealthResponse> {
    Json(HealthResponse::healthy(
        env!("CARGO_PKG_VERSION"),
        state.erasure.blob_store_available(),
    ))
}
