//! # ユースケース層
//!
//! 消去サービスのビジネスロジックを実装する。
//!
//! ## 設計方針
//!
//! - **トレイトベースの設計**: ハンドラのテストでスタブに差し替えられるようトレイトを定義
//! - **依存性注入**: ストアは `Arc<dyn Trait>` で外部から注入する（グローバル状態を持たない）
//! - **薄いハンドラ**: ハンドラは薄く保ち、ロジックはユースケースに集約
//!
//! ## モジュール構成
//!
//! - `verifier`: 本人確認（二次認証情報の照合）
//! - `erasure`: 本人確認 → レコード消去 → ブロブ消去 の順に実行する消去フロー
//! - `estimation`: 消去対象の件数見積もり（読み取り専用）

pub mod erasure;
pub mod estimation;
pub mod verifier;

use async_trait::async_trait;
pub use erasure::ErasureUseCaseImpl;
use erasure_domain::{
    outcome::{ErasureOutcome, EstimateReport},
    principal::Principal,
    request::DeletionRequest,
};
pub use estimation::EstimationUseCaseImpl;
pub use verifier::IdentityVerifier;

use crate::error::ServiceError;

/// 消去ユースケーストレイト
///
/// 具体的な実装は `ErasureUseCaseImpl` で提供される。
#[async_trait]
pub trait ErasureUseCase: Send + Sync {
    /// プリンシパルのデータをすべてのストアから消去する
    ///
    /// ## 戻り値
    ///
    /// - `Ok(ErasureOutcome)`: 消去ステージまで進んだ（成否は `is_success` で判定）
    /// - `Err(ServiceError)`: 確認文字列・本人確認で拒否された
    async fn erase(
        &self,
        request: &DeletionRequest,
        principal: &Principal,
    ) -> Result<ErasureOutcome, ServiceError>;

    /// ブロブストアが設定されているか
    fn blob_store_available(&self) -> bool;
}

/// 見積もりユースケーストレイト
#[async_trait]
pub trait EstimationUseCase: Send + Sync {
    /// 消去されるアイテム数を見積もる（何も削除しない）
    async fn estimate(&self, principal: &Principal) -> EstimateReport;
}

#[async_trait]
impl ErasureUseCase for ErasureUseCaseImpl {
    async fn erase(
        &self,
        request: &DeletionRequest,
        principal: &Principal,
    ) -> Result<ErasureOutcome, ServiceError> {
        self.erase(request, principal).await
    }

    fn blob_store_available(&self) -> bool {
        self.blob_store_available()
    }
}

#[async_trait]
impl EstimationUseCase for EstimationUseCaseImpl {
    async fn estimate(&self, principal: &Principal) -> EstimateReport {
        self.estimate(principal).await
    }
}
