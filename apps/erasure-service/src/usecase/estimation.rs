//! 消去対象の見積もり
//!
//! 削除は行わず、各コレクション・プレフィックスの件数だけを数える。
//! 失敗したストアはエラーとして記録し、残りのストアの件数は返す。

use std::sync::Arc;

use erasure_domain::{outcome::EstimateReport, principal::Principal};
use erasure_infra::deletion::{BlobEraser, RecordEraser};
use erasure_shared::{event_log::event, log_erasure_event};

/// 見積もりユースケース
pub struct EstimationUseCaseImpl {
    record_eraser: Arc<RecordEraser>,
    blob_eraser:   Arc<BlobEraser>,
}

impl EstimationUseCaseImpl {
    pub fn new(record_eraser: Arc<RecordEraser>, blob_eraser: Arc<BlobEraser>) -> Self {
        Self {
            record_eraser,
            blob_eraser,
        }
    }

    /// プリンシパルについて消去されるアイテム数を見積もる
    #[tracing::instrument(skip_all, fields(%principal))]
    pub async fn estimate(&self, principal: &Principal) -> EstimateReport {
        let (records, blobs) = tokio::join!(
            self.record_eraser.count(principal),
            self.blob_eraser.count(principal)
        );

        let mut errors = records.errors;
        errors.extend(blobs.errors);
        let report = EstimateReport::new(principal.clone(), records.counts, blobs.counts, errors);

        let result = if report.errors().is_empty() {
            event::result::SUCCESS
        } else {
            event::result::FAILURE
        };
        log_erasure_event!(
            event.action = event::action::ESTIMATION_COMPLETED,
            event.principal = %principal,
            event.result = result,
            estimated_total = report.estimated_total(),
            "消去対象の見積もりが終了しました"
        );

        report
    }
}
