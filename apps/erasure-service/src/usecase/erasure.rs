//! # 消去ユースケース
//!
//! 1 回の消去呼び出しを 確認文字列 → 本人確認 → レコード消去 → ブロブ消去 → 集計 の順に実行する。
//!
//! ## 中断と継続
//!
//! | 失敗の種類 | force モードでない | force モード |
//! |-----------|-------------------|-------------|
//! | 確認文字列・本人確認 | エラーを返す | エラーを返す |
//! | コレクションの失敗 | 記録してレコード消去を打ち切り、ブロブ消去も行わない | 記録して続行 |
//! | プレフィックスの列挙失敗 | 記録してブロブ消去を打ち切る | 記録して続行 |
//! | 個々のブロブの削除失敗 | ログのみ | ログのみ |
//!
//! ストアをまたぐトランザクションはないため、打ち切った時点までの削除は取り消されない。
//! 結果の件数がどこまで消えたかを表す。
//!
//! 同一プリンシパルへの同時呼び出しは排他しない。

use std::sync::Arc;

use erasure_domain::{
    clock::Clock,
    outcome::ErasureOutcome,
    principal::Principal,
    request::DeletionRequest,
};
use erasure_infra::deletion::{BlobEraser, RecordEraser};
use erasure_shared::{
    event_log::{error, event},
    log_erasure_event,
};

use super::IdentityVerifier;
use crate::error::ServiceError;

/// 消去ユースケース
pub struct ErasureUseCaseImpl {
    verifier:      IdentityVerifier,
    record_eraser: Arc<RecordEraser>,
    blob_eraser:   Arc<BlobEraser>,
    clock:         Arc<dyn Clock>,
}

impl ErasureUseCaseImpl {
    pub fn new(
        verifier: IdentityVerifier,
        record_eraser: Arc<RecordEraser>,
        blob_eraser: Arc<BlobEraser>,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self {
            verifier,
            record_eraser,
            blob_eraser,
            clock,
        }
    }

    /// プリンシパルのデータをすべてのストアから消去する
    ///
    /// 確認文字列・本人確認の失敗は `Err` で返す。消去ステージのストアエラーは
    /// `Err` にならず、[`ErasureOutcome::errors`] に記録される。
    #[tracing::instrument(skip_all, fields(%principal, force_mode = request.force_mode()))]
    pub async fn erase(
        &self,
        request: &DeletionRequest,
        principal: &Principal,
    ) -> Result<ErasureOutcome, ServiceError> {
        let force_mode = request.force_mode();

        // 1. 確認文字列（どのストアにも触れる前に検証する）
        if let Err(e) = request.ensure_confirmed() {
            log_erasure_event!(
                event.action = event::action::ERASURE_REJECTED,
                event.principal = %principal,
                event.result = event::result::FAILURE,
                error.kind = error::kind::VERIFICATION,
                "確認文字列が一致しないため消去を拒否しました"
            );
            return Err(e.into());
        }

        log_erasure_event!(
            event.action = event::action::ERASURE_REQUESTED,
            event.principal = %principal,
            event.force_mode = force_mode,
            "データ消去を開始します"
        );

        // 2. 本人確認（force モードでも省略しない）
        if let Err(e) = self
            .verifier
            .verify(principal, request.secondary_credential())
            .await
        {
            log_erasure_event!(
                event.action = event::action::ERASURE_REJECTED,
                event.principal = %principal,
                event.result = event::result::FAILURE,
                error.kind = error::kind::VERIFICATION,
                error.message = %e,
                "本人確認に失敗したため消去を拒否しました"
            );
            return Err(e);
        }

        // 3. レコード消去
        let records = self.record_eraser.erase(principal, force_mode).await;
        let record_aborted = records.aborted;
        let mut builder = ErasureOutcome::builder(principal.clone(), force_mode)
            .record_stage(records.counts, records.errors);

        // 4. ブロブ消去（レコード消去が打ち切られた場合は行わない）
        if record_aborted {
            tracing::error!(
                error.kind = error::kind::RECORD_STORE,
                "レコード消去が中断されたため、ブロブ消去を行いません"
            );
        } else {
            let blobs = self.blob_eraser.erase(principal, force_mode).await;
            if blobs.aborted {
                tracing::error!(error.kind = error::kind::BLOB_STORE, "ブロブ消去が中断されました");
            }
            builder = builder.blob_stage(blobs.counts, blobs.errors);
        }

        // 5. 集計
        let outcome = builder.finish(self.clock.now());
        let result = match (outcome.is_success(), outcome.errors().is_empty()) {
            (true, true) => event::result::SUCCESS,
            (true, false) => event::result::FORCED,
            (false, _) => event::result::FAILURE,
        };

        log_erasure_event!(
            event.action = event::action::ERASURE_COMPLETED,
            event.principal = %principal,
            event.result = result,
            event.force_mode = force_mode,
            total_documents = outcome.total_documents(),
            total_blobs = outcome.total_blobs(),
            error_count = outcome.errors().len(),
            "データ消去が終了しました"
        );

        Ok(outcome)
    }

    /// ブロブストアが設定されているか
    pub fn blob_store_available(&self) -> bool {
        self.blob_eraser.is_available()
    }
}
