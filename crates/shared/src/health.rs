//! # ヘルスチェック共通型

use serde::Serialize;

/// ヘルスチェックレスポンス
///
/// `status` はサービスの稼働状態、`version` は Cargo.toml のバージョン、
/// `blob_store` はブロブストアが構成されているかどうかを示す。
/// ブロブストア未構成でもサービス自体は稼働する（消去時に「ストア利用不可」として扱う）。
///
/// ## 使用例
///
/// ```
/// use erasure_shared::HealthResponse;
///
/// let response = HealthResponse::healthy("0.1.0", true);
/// assert_eq!(response.status, "healthy");
/// ```
#[derive(Debug, Serialize)]
pub struct HealthResponse {
    /// 稼働状態（`"healthy"` 固定）
    pub status:     String,
    /// アプリケーションバージョン
    pub version:    String,
    /// ブロブストアの構成状態（`"configured"` または `"unavailable"`）
    pub blob_store: String,
}

impl HealthResponse {
    /// 稼働中のレスポンスを作成する
    pub fn healthy(version: impl Into<String>, blob_store_configured: bool) -> Self {
        Self {
            status:     "healthy".to_string(),
            version:    version.into(),
            blob_store: if blob_store_configured {
                "configured".to_string()
            } else {
                "unavailable".to_string()
            },
        }
    }
}
