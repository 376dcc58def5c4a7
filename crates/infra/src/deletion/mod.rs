//! # プリンシパルデータ消去基盤
//!
//! プリンシパルのデータをストアごとに消去・計数する。
//!
//! - [`RecordEraser`]: レコードストアの宣言済みコレクションを順に処理する
//! - [`BlobEraser`]: ブロブストアの宣言済みプレフィックスを順に処理する
//! - [`BlobWorkerPool`]: ブロブ I/O 専用のワーカープール
//!
//! ## ステージの中断
//!
//! force モードでない場合、コレクション（またはプレフィックスの列挙）の失敗で
//! ステージを中断し、以降の対象には着手しない。force モードでは失敗を記録して続行する。
//! どちらの場合も、失敗した対象でそれまでに削除できた件数は結果に残す。

mod blob_eraser;
mod record_eraser;
mod worker_pool;

pub use blob_eraser::BlobEraser;
use erasure_domain::outcome::{StageCounts, StoreFailure};
pub use record_eraser::RecordEraser;
pub use worker_pool::{BLOB_WORKER_THREAD_NAME, BlobWorkerPool};

/// 消去・計数ステージの結果
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct StageReport {
    /// ラベルごとの件数（未着手のラベルは含まない）
    pub counts:  StageCounts,
    /// 発生順のエラー
    pub errors:  Vec<StoreFailure>,
    /// force モードでないエラーによりステージを打ち切ったか
    pub aborted: bool,
}
