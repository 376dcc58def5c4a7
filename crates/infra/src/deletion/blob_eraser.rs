//! # BlobEraser
//!
//! プリンシパルのブロブを宣言済みプレフィックスから順に削除する。
//!
//! ## 削除方式
//!
//! プレフィックスごとに [`BlobWorkerPool`] 上でジョブを実行し、その完了を待つ。
//! ジョブ内ではブロブを列挙し、[`MAX_CONCURRENT_DELETES`] 件ずつ並行に削除する。
//!
//! - 列挙の失敗はプレフィックスの失敗（force モードでなければステージを中断）
//! - 個々のブロブの削除失敗はログに記録して読み飛ばす（force モードに関係なく続行）
//!
//! ## ブロブストアが利用できない場合
//!
//! 全プレフィックスの件数を 0 とする。force モードでなければ
//! [`StoreFailure::BLOB_STORE`] のエラーを 1 件記録してステージを中断扱いにする。

use std::sync::Arc;

use erasure_domain::{catalog::PrefixSpec, outcome::StoreFailure, principal::Principal};
use tokio::task::JoinSet;
use tracing::Instrument as _;

use super::{BlobWorkerPool, StageReport};
use crate::{blob_store::BlobStore, error::InfraError};

/// 1 ジョブ内で同時に発行する削除リクエスト数の上限
pub const MAX_CONCURRENT_DELETES: usize = 16;

/// ブロブストアが利用できない場合のエラーメッセージ
const STORE_UNAVAILABLE: &str = "ブロブストアが利用できません";

/// ブロブ消去
pub struct BlobEraser {
    store:    Option<Arc<dyn BlobStore>>,
    prefixes: Vec<PrefixSpec>,
    pool:     Arc<BlobWorkerPool>,
}

impl BlobEraser {
    pub fn new(
        store: Option<Arc<dyn BlobStore>>,
        prefixes: impl Into<Vec<PrefixSpec>>,
        pool: Arc<BlobWorkerPool>,
    ) -> Self {
        Self {
            store,
            prefixes: prefixes.into(),
            pool,
        }
    }

    /// ブロブストアが設定されているか
    pub fn is_available(&self) -> bool {
        self.store.is_some()
    }

    /// プリンシパルのブロブを全プレフィックスから削除する
    pub async fn erase(&self, principal: &Principal, force_mode: bool) -> StageReport {
        let mut report = StageReport::default();

        let Some(store) = &self.store else {
            for spec in &self.prefixes {
                report.counts.set(spec.label, 0);
            }
            if !force_mode {
                tracing::error!(%principal, "ブロブストアが利用できないため消去できません");
                report
                    .errors
                    .push(StoreFailure::new(StoreFailure::BLOB_STORE, STORE_UNAVAILABLE));
                report.aborted = true;
            } else {
                tracing::warn!(%principal, "ブロブストアが利用できません（force モードのため続行）");
            }
            return report;
        };

        for spec in &self.prefixes {
            let prefix = spec.resolve(principal);
            let span = tracing::debug_span!("erase_prefix", store = spec.label, %prefix);
            let job = erase_prefix(Arc::clone(store), prefix).instrument(span);

            match self.pool.run(job).await.and_then(|result| result) {
                Ok(deleted) => report.counts.set(spec.label, deleted),
                Err(error) => {
                    tracing::error!(
                        store = spec.label,
                        %principal,
                        force_mode,
                        error = %error,
                        "プレフィックスの消去に失敗"
                    );
                    report.counts.set(spec.label, 0);
                    report
                        .errors
                        .push(StoreFailure::new(spec.label, error.to_string()));

                    if !force_mode {
                        report.aborted = true;
                        break;
                    }
                }
            }
        }

        report
    }

    /// プリンシパルのブロブ件数を全プレフィックスについて数える（削除しない）
    pub async fn count(&self, principal: &Principal) -> StageReport {
        let mut report = StageReport::default();

        let Some(store) = &self.store else {
            report
                .errors
                .push(StoreFailure::new(StoreFailure::BLOB_STORE, STORE_UNAVAILABLE));
            return report;
        };

        for spec in &self.prefixes {
            let prefix = spec.resolve(principal);
            let store = Arc::clone(store);
            let job = async move { store.count_by_prefix(&prefix).await };

            match self.pool.run(job).await.and_then(|result| result) {
                Ok(count) => report.counts.set(spec.label, count),
                Err(error) => {
                    tracing::warn!(store = spec.label, error = %error, "プレフィックスの件数取得に失敗");
                    report
                        .errors
                        .push(StoreFailure::new(spec.label, error.to_string()));
                }
            }
        }

        report
    }
}

/// プレフィックス配下のブロブを削除し、削除できた件数を返す
///
/// ワーカープール上で実行される。
async fn erase_prefix(store: Arc<dyn BlobStore>, prefix: String) -> Result<u64, InfraError> {
    let handles = store.list_by_prefix(&prefix).await?;
    let mut deleted: u64 = 0;

    for chunk in handles.chunks(MAX_CONCURRENT_DELETES) {
        let mut tasks = JoinSet::new();
        for handle in chunk.iter().cloned() {
            let store = Arc::clone(&store);
            tasks.spawn(async move {
                let result = store.delete(&handle).await;
                (handle, result)
            });
        }

        while let Some(joined) = tasks.join_next().await {
            match joined {
                Ok((_, Ok(()))) => deleted += 1,
                Ok((handle, Err(error))) => {
                    tracing::warn!(key = %handle.key, error = %error, "ブロブの削除に失敗（スキップ）");
                }
                Err(error) => {
                    tracing::warn!(error = %error, "ブロブ削除タスクが異常終了（スキップ）");
                }
            }
        }
    }

    tracing::debug!(listed = handles.len(), deleted, "プレフィックスを消去しました");
    Ok(deleted)
}

#[cfg(test)]
mod tests {
    use erasure_domain::catalog::DEFAULT_PREFIXES;
    use pretty_assertions::assert_eq;

    use super::*;
    use crate::{deletion::BLOB_WORKER_THREAD_NAME, mock::InMemoryBlobStore};

    fn principal() -> Principal {
        Principal::new("user-123").unwrap()
    }

    fn pool() -> Arc<BlobWorkerPool> {
        Arc::new(BlobWorkerPool::new(2).unwrap())
    }

    fn sut(store: &InMemoryBlobStore) -> BlobEraser {
        BlobEraser::new(Some(Arc::new(store.clone())), DEFAULT_PREFIXES, pool())
    }

    #[tokio::test]
    async fn test_プレフィックス配下のブロブだけを削除する() {
        // Given
        let store = InMemoryBlobStore::new();
        store.put("disposal-images/user-123/a.jpg");
        store.put("disposal-images/user-123/b.jpg");
        store.put("profile-images/user-123/avatar.png");
        store.put("profile-images/user-1234/avatar.png");
        let sut = sut(&store);

        // When
        let report = sut.erase(&principal(), false).await;

        // Then
        let counts: Vec<_> = report.counts.iter().collect();
        assert_eq!(counts, vec![("disposal_images", 2), ("profile_images", 1)]);
        assert_eq!(store.keys(), vec!["profile-images/user-1234/avatar.png"]);
        assert!(report.errors.is_empty());
    }

    #[rstest::rstest]
    #[case::通常モード(false)]
    #[case::force_mode(true)]
    #[tokio::test]
    async fn test_個々のブロブの削除失敗は読み飛ばして続行する(#[case] force_mode: bool) {
        // Given: 5 件中 3 件目の削除が失敗する
        let store = InMemoryBlobStore::new();
        for i in 1..=5 {
            store.put(&format!("disposal-images/user-123/{i}.jpg"));
        }
        store.fail_delete_of("disposal-images/user-123/3.jpg");
        let sut = sut(&store);

        // When
        let report = sut.erase(&principal(), force_mode).await;

        // Then
        assert_eq!(report.counts.get("disposal_images"), Some(4));
        assert_eq!(report.counts.get("profile_images"), Some(0));
        assert!(report.errors.is_empty());
        assert_eq!(store.keys(), vec!["disposal-images/user-123/3.jpg"]);
    }

    #[tokio::test]
    async fn test_列挙の失敗はforce_modeでなければ中断する() {
        // Given
        let store = InMemoryBlobStore::new();
        store.put("profile-images/user-123/avatar.png");
        store.fail_list_of("disposal-images/user-123/");
        let sut = sut(&store);

        // When
        let report = sut.erase(&principal(), false).await;

        // Then
        assert_eq!(report.counts.get("disposal_images"), Some(0));
        assert_eq!(report.counts.get("profile_images"), None);
        assert_eq!(report.errors.len(), 1);
        assert_eq!(report.errors[0].store, "disposal_images");
        assert!(report.aborted);
        assert_eq!(store.len(), 1);
    }

    #[tokio::test]
    async fn test_列挙の失敗はforce_modeなら後続のプレフィックスを処理する() {
        // Given
        let store = InMemoryBlobStore::new();
        store.put("profile-images/user-123/avatar.png");
        store.fail_list_of("disposal-images/user-123/");
        let sut = sut(&store);

        // When
        let report = sut.erase(&principal(), true).await;

        // Then
        assert_eq!(report.counts.get("profile_images"), Some(1));
        assert_eq!(report.errors.len(), 1);
        assert!(!report.aborted);
    }

    #[tokio::test]
    async fn test_ブロブストアがなければforce_modeでないときエラーを1件記録する() {
        let sut = BlobEraser::new(None, DEFAULT_PREFIXES, pool());

        let report = sut.erase(&principal(), false).await;

        let counts: Vec<_> = report.counts.iter().collect();
        assert_eq!(counts, vec![("disposal_images", 0), ("profile_images", 0)]);
        assert_eq!(
            report.errors,
            vec![StoreFailure::new(StoreFailure::BLOB_STORE, STORE_UNAVAILABLE)]
        );
        assert!(report.aborted);
    }

    #[tokio::test]
    async fn test_ブロブストアがなくてもforce_modeならエラーを記録しない() {
        let sut = BlobEraser::new(None, DEFAULT_PREFIXES, pool());

        let report = sut.erase(&principal(), true).await;

        assert_eq!(report.counts.total(), 0);
        assert!(report.errors.is_empty());
        assert!(!report.aborted);
    }

    #[tokio::test]
    async fn test_ストア操作は専用ワーカースレッドで実行される() {
        // Given
        let store = InMemoryBlobStore::new();
        store.put("disposal-images/user-123/a.jpg");
        let sut = sut(&store);

        // When
        sut.erase(&principal(), false).await;

        // Then
        let threads = store.thread_names();
        assert!(!threads.is_empty());
        assert!(
            threads
                .iter()
                .all(|name| name.as_deref() == Some(BLOB_WORKER_THREAD_NAME)),
            "{threads:?}"
        );
    }

    #[tokio::test]
    async fn test_件数取得はブロブを削除しない() {
        // Given
        let store = InMemoryBlobStore::new();
        store.put("disposal-images/user-123/a.jpg");
        store.put("disposal-images/user-123/b.jpg");
        store.fail_list_of("profile-images/user-123/");
        let sut = sut(&store);

        // When
        let report = sut.count(&principal()).await;

        // Then
        assert_eq!(report.counts.get("disposal_images"), Some(2));
        assert_eq!(report.counts.get("profile_images"), None);
        assert_eq!(report.errors.len(), 1);
        assert_eq!(store.len(), 2);
    }

    #[tokio::test]
    async fn test_ブロブストアがなければ件数取得はエラーを1件返す() {
        let sut = BlobEraser::new(None, DEFAULT_PREFIXES, pool());

        let report = sut.count(&principal()).await;

        assert!(report.counts.is_empty());
        assert_eq!(report.errors.len(), 1);
        assert_eq!(report.errors[0].store, StoreFailure::BLOB_STORE);
    }
}
