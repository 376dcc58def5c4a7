//! # 消去ハンドラ
//!
//! ## エンドポイント
//!
//! - `POST /user/delete-all-data?force_delete=<bool>` - プリンシパルの全データを消去（`DELETE` も同じ）
//! - `GET /user/deletion-preview` - 消去対象の件数を見積もる
//!
//! 消去に失敗した場合（`success == false`）も部分的な削除件数を返すため、
//! 500 でも `{ "data": ... }` エンベロープで結果を返す。

use std::sync::Arc;

use axum::{
    Json,
    extract::{Query, State},
    http::StatusCode,
    response::IntoResponse,
};
use erasure_domain::{
    outcome::{ErasureOutcome, EstimateReport, StageCounts, StoreFailure},
    request::{CONFIRMATION_LITERAL, DeletionRequest},
};
use erasure_shared::ApiResponse;
use serde::{Deserialize, Serialize};

use super::principal::AuthenticatedPrincipal;
use crate::{
    error::ServiceError,
    usecase::{ErasureUseCase, EstimationUseCase},
};

/// 見積もりに添える警告文
const PREVIEW_WARNING: &str = "実際の消去ではここに示したデータがすべて完全に削除され、元に戻せません";

/// 消去ハンドラの共有状態
pub struct ErasureState {
    pub erasure:    Arc<dyn ErasureUseCase>,
    pub estimation: Arc<dyn EstimationUseCase>,
}

// --- リクエスト/レスポンス型 ---

/// 消去リクエスト
#[derive(Debug, Deserialize)]
pub struct DeleteAllDataRequest {
    pub confirmation_text: String,
    pub user_email:        String,
}

/// 消去リクエストのクエリパラメータ
#[derive(Debug, Default, Deserialize)]
pub struct DeleteAllDataQuery {
    #[serde(default)]
    pub force_delete: bool,
}

/// ストア別の削除件数
#[derive(Debug, Serialize)]
pub struct DeletedItems {
    pub records: StageCounts,
    pub blobs:   StageCounts,
}

/// 消去レスポンス
#[derive(Debug, Serialize)]
pub struct ErasureResponseData {
    pub success: bool,
    pub message: String,
    pub user_id: String,
    pub force_delete_used: bool,
    pub deleted_items: DeletedItems,
    pub total_documents_deleted: u64,
    pub total_files_deleted: u64,
    pub errors: Vec<StoreFailure>,
    pub deletion_timestamp: String,
}

impl From<&ErasureOutcome> for ErasureResponseData {
    fn from(outcome: &ErasureOutcome) -> Self {
        Self {
            success: outcome.is_success(),
            message: outcome.message(),
            user_id: outcome.principal().to_string(),
            force_delete_used: outcome.force_mode(),
            deleted_items: DeletedItems {
                records: outcome.record_counts().clone(),
                blobs:   outcome.blob_counts().clone(),
            },
            total_documents_deleted: outcome.total_documents(),
            total_files_deleted: outcome.total_blobs(),
            errors: outcome.errors().to_vec(),
            deletion_timestamp: outcome.completed_at().to_rfc3339(),
        }
    }
}

/// 見積もりレスポンス
#[derive(Debug, Serialize)]
pub struct DeletionPreviewData {
    pub user_id: String,
    pub record_collections: StageCounts,
    pub blob_prefixes: StageCounts,
    pub estimated_total_items: u64,
    pub errors: Vec<StoreFailure>,
    pub required_confirmation: &'static str,
    pub warning: &'static str,
}

impl From<&EstimateReport> for DeletionPreviewData {
    fn from(report: &EstimateReport) -> Self {
        Self {
            user_id: report.principal().to_string(),
            record_collections: report.record_counts().clone(),
            blob_prefixes: report.blob_counts().clone(),
            estimated_total_items: report.estimated_total(),
            errors: report.errors().to_vec(),
            required_confirmation: CONFIRMATION_LITERAL,
            warning: PREVIEW_WARNING,
        }
    }
}

// --- ハンドラ ---

/// POST /user/delete-all-data
///
/// プリンシパルのデータを全ストアから消去する。
pub async fn delete_all_data(
    State(state): State<Arc<ErasureState>>,
    AuthenticatedPrincipal(principal): AuthenticatedPrincipal,
    Query(query): Query<DeleteAllDataQuery>,
    Json(req): Json<DeleteAllDataRequest>,
) -> Result<impl IntoResponse, ServiceError> {
    let request = DeletionRequest::new(req.confirmation_text, req.user_email, query.force_delete);
    let outcome = state.erasure.erase(&request, &principal).await?;

    let status = if outcome.is_success() {
        StatusCode::OK
    } else {
        StatusCode::INTERNAL_SERVER_ERROR
    };

    Ok((
        status,
        Json(ApiResponse::new(ErasureResponseData::from(&outcome))),
    ))
}

/// GET /user/deletion-preview
///
/// 消去されるアイテム数を返す。何も削除しない。
pub async fn deletion_preview(
    State(state): State<Arc<ErasureState>>,
    AuthenticatedPrincipal(principal): AuthenticatedPrincipal,
) -> impl IntoResponse {
    let report = state.estimation.estimate(&principal).await;
    Json(ApiResponse::new(DeletionPreviewData::from(&report)))
}

#[cfg(test)]
mod tests {
    use std::sync::Mutex;

    use async_trait::async_trait;
    use axum::{
        Router,
        body::Body,
        http::{Method, Request},
        routing::{get, post},
    };
    use chrono::{TimeZone, Utc};
    use erasure_domain::principal::Principal;
    use pretty_assertions::assert_eq;
    use tower::ServiceExt;

    use super::*;

    // テスト用スタブ

    struct StubErasureUseCase {
        result:   fn(&Principal, bool) -> Result<ErasureOutcome, ServiceError>,
        requests: Mutex<Vec<(String, String, bool)>>,
    }

    impl StubErasureUseCase {
        fn returning(result: fn(&Principal, bool) -> Result<ErasureOutcome, ServiceError>) -> Self {
            Self {
                result,
                requests: Mutex::new(Vec::new()),
            }
        }
    }

    #[async_trait]
    impl ErasureUseCase for StubErasureUseCase {
        async fn erase(
            &self,
            request: &DeletionRequest,
            principal: &Principal,
        ) -> Result<ErasureOutcome, ServiceError> {
            self.requests.lock().unwrap().push((
                principal.to_string(),
                request.secondary_credential().to_string(),
                request.force_mode(),
            ));
            (self.result)(principal, request.force_mode())
        }

        fn blob_store_available(&self) -> bool {
            true
        }
    }

    struct StubEstimationUseCase;

    #[async_trait]
    impl EstimationUseCase for StubEstimationUseCase {
        async fn estimate(&self, principal: &Principal) -> EstimateReport {
            let mut records = StageCounts::new();
            records.set("profiles", 1);
            records.set("disposal_history", 4);
            let mut blobs = StageCounts::new();
            blobs.set("disposal_images", 2);
            EstimateReport::new(principal.clone(), records, blobs, Vec::new())
        }
    }

    fn completed(principal: &Principal, force_mode: bool) -> Result<ErasureOutcome, ServiceError> {
        let mut records = StageCounts::new();
        records.set("profiles", 1);
        let mut blobs = StageCounts::new();
        blobs.set("disposal_images", 3);
        Ok(ErasureOutcome::builder(principal.clone(), force_mode)
            .record_stage(records, Vec::new())
            .blob_stage(blobs, Vec::new())
            .finish(Utc.with_ymd_and_hms(2026, 3, 1, 12, 0, 0).unwrap()))
    }

    fn aborted(principal: &Principal, force_mode: bool) -> Result<ErasureOutcome, ServiceError> {
        let mut records = StageCounts::new();
        records.set("profiles", 1);
        Ok(ErasureOutcome::builder(principal.clone(), force_mode)
            .record_stage(records, vec![StoreFailure::new("disposal_history", "timeout")])
            .finish(Utc.with_ymd_and_hms(2026, 3, 1, 12, 0, 0).unwrap()))
    }

    fn forbidden(_: &Principal, _: bool) -> Result<ErasureOutcome, ServiceError> {
        Err(ServiceError::Forbidden("メールアドレスが登録情報と一致しません".to_string()))
    }

    fn create_test_app(erasure: Arc<StubErasureUseCase>) -> Router {
        let state = Arc::new(ErasureState {
            erasure,
            estimation: Arc::new(StubEstimationUseCase),
        });

        Router::new()
            .route(
                "/user/delete-all-data",
                post(delete_all_data).delete(delete_all_data),
            )
            .route("/user/deletion-preview", get(deletion_preview))
            .with_state(state)
    }

    fn erase_request(method: Method, uri: &str) -> Request<Body> {
        let body = serde_json::json!({
            "confirmation_text": "DELETE",
            "user_email": "a@example.com"
        });
        Request::builder()
            .method(method)
            .uri(uri)
            .header("content-type", "application/json")
            .header("X-User-ID", "user-123")
            .body(Body::from(serde_json::to_string(&body).unwrap()))
            .unwrap()
    }

    async fn json_body(response: axum::response::Response) -> serde_json::Value {
        let body = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        serde_json::from_slice(&body).unwrap()
    }

    #[tokio::test]
    async fn test_delete_all_data_成功時は200で結果を返す() {
        // Given
        let stub = Arc::new(StubErasureUseCase::returning(completed));
        let sut = create_test_app(stub.clone());

        // When
        let response = sut
            .oneshot(erase_request(Method::POST, "/user/delete-all-data"))
            .await
            .unwrap();

        // Then
        assert_eq!(response.status(), StatusCode::OK);
        let json = json_body(response).await;
        assert_eq!(json["data"]["success"], true);
        assert_eq!(json["data"]["user_id"], "user-123");
        assert_eq!(json["data"]["force_delete_used"], false);
        assert_eq!(json["data"]["deleted_items"]["records"]["profiles"], 1);
        assert_eq!(json["data"]["deleted_items"]["blobs"]["disposal_images"], 3);
        assert_eq!(json["data"]["total_documents_deleted"], 1);
        assert_eq!(json["data"]["total_files_deleted"], 3);
        assert_eq!(json["data"]["deletion_timestamp"], "2026-03-01T12:00:00+00:00");
        assert_eq!(
            stub.requests.lock().unwrap().clone(),
            vec![("user-123".to_string(), "a@example.com".to_string(), false)]
        );
    }

    #[tokio::test]
    async fn test_delete_all_data_deleteメソッドとforce_deleteを受け付ける() {
        // Given
        let stub = Arc::new(StubErasureUseCase::returning(completed));
        let sut = create_test_app(stub.clone());

        // When
        let response = sut
            .oneshot(erase_request(
                Method::DELETE,
                "/user/delete-all-data?force_delete=true",
            ))
            .await
            .unwrap();

        // Then
        assert_eq!(response.status(), StatusCode::OK);
        let json = json_body(response).await;
        assert_eq!(json["data"]["force_delete_used"], true);
        assert!(stub.requests.lock().unwrap()[0].2);
    }

    #[tokio::test]
    async fn test_delete_all_data_失敗時は500で部分的な件数を返す() {
        // Given
        let sut = create_test_app(Arc::new(StubErasureUseCase::returning(aborted)));

        // When
        let response = sut
            .oneshot(erase_request(Method::POST, "/user/delete-all-data"))
            .await
            .unwrap();

        // Then
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
        let json = json_body(response).await;
        assert_eq!(json["data"]["success"], false);
        assert_eq!(json["data"]["deleted_items"]["records"]["profiles"], 1);
        assert_eq!(json["data"]["errors"][0]["store"], "disposal_history");
        assert_eq!(json["data"]["deleted_items"]["blobs"], serde_json::json!({}));
    }

    #[tokio::test]
    async fn test_delete_all_data_本人確認の失敗は403() {
        let sut = create_test_app(Arc::new(StubErasureUseCase::returning(forbidden)));

        let response = sut
            .oneshot(erase_request(Method::POST, "/user/delete-all-data"))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::FORBIDDEN);
        let json = json_body(response).await;
        assert_eq!(json["status"], 403);
    }

    #[tokio::test]
    async fn test_delete_all_data_プリンシパルがなければ401でユースケースを呼ばない() {
        // Given
        let stub = Arc::new(StubErasureUseCase::returning(completed));
        let sut = create_test_app(stub.clone());
        let request = Request::builder()
            .method(Method::POST)
            .uri("/user/delete-all-data")
            .header("content-type", "application/json")
            .body(Body::from(
                r#"{"confirmation_text":"DELETE","user_email":"a@example.com"}"#,
            ))
            .unwrap();

        // When
        let response = sut.oneshot(request).await.unwrap();

        // Then
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
        assert!(stub.requests.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_deletion_preview_件数と確認文字列を返す() {
        // Given
        let sut = create_test_app(Arc::new(StubErasureUseCase::returning(completed)));
        let request = Request::builder()
            .uri("/user/deletion-preview?user_id=user-123")
            .body(Body::empty())
            .unwrap();

        // When
        let response = sut.oneshot(request).await.unwrap();

        // Then
        assert_eq!(response.status(), StatusCode::OK);
        let json = json_body(response).await;
        assert_eq!(json["data"]["user_id"], "user-123");
        assert_eq!(
            json["data"]["record_collections"],
            serde_json::json!({ "profiles": 1, "disposal_history": 4 })
        );
        assert_eq!(json["data"]["blob_prefixes"]["disposal_images"], 2);
        assert_eq!(json["data"]["estimated_total_items"], 7);
        assert_eq!(json["data"]["required_confirmation"], "DELETE");
        assert!(json["data"]["warning"].is_string());
    }
}
