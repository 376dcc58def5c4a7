//! # BlobWorkerPool
//!
//! ブロブストアの I/O を、リクエスト処理用ランタイムとは別の専用ランタイムで実行する。
//!
//! 大量のブロブ削除がリクエスト処理のワーカースレッドを占有しないように、
//! スレッド数を固定した tokio ランタイム（スレッド名 `blob-io`）を持つ。
//! ジョブは [`BlobWorkerPool::run`] で投入し、呼び出し元はその完了を待つ。

use std::future::Future;

use tokio::runtime::{Builder, Handle, Runtime};

use crate::error::InfraError;

/// ワーカースレッド名
pub const BLOB_WORKER_THREAD_NAME: &str = "blob-io";

/// ブロブ I/O 専用のワーカープール
pub struct BlobWorkerPool {
    // Drop で shutdown_background するため Option で保持する
    runtime: Option<Runtime>,
    handle:  Handle,
}

impl BlobWorkerPool {
    /// 指定したスレッド数でワーカープールを起動する
    ///
    /// `workers` が 0 の場合は 1 として扱う。
    pub fn new(workers: usize) -> Result<Self, InfraError> {
        let workers = workers.max(1);
        let runtime = Builder::new_multi_thread()
            .worker_threads(workers)
            .thread_name(BLOB_WORKER_THREAD_NAME)
            .enable_all()
            .build()
            .map_err(|e| InfraError::worker_pool(format!("ランタイムの起動に失敗: {e}")))?;
        let handle = runtime.handle().clone();

        tracing::debug!(workers, "ブロブ用ワーカープールを起動しました");

        Ok(Self {
            runtime: Some(runtime),
            handle,
        })
    }

    /// ジョブをワーカープールで実行し、完了を待つ
    ///
    /// ジョブが panic した場合は [`InfraError`] を返す。
    pub async fn run<F, T>(&self, job: F) -> Result<T, InfraError>
    where
        F: Future<Output = T> + Send + 'static,
        T: Send + 'static,
    {
        self.handle
            .spawn(job)
            .await
            .map_err(|e| InfraError::worker_pool(format!("ジョブの実行に失敗: {e}")))
    }
}

impl Drop for BlobWorkerPool {
    fn drop(&mut self) {
        // 非同期コンテキスト内で Runtime を drop すると panic するため、待たずに停止する
        if let Some(runtime) = self.runtime.take() {
            runtime.shutdown_background();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_ジョブは専用スレッドで実行される() {
        let pool = BlobWorkerPool::new(2).unwrap();

        let thread_name = pool
            .run(async { std::thread::current().name().map(String::from) })
            .await
            .unwrap();

        assert_eq!(thread_name.as_deref(), Some(BLOB_WORKER_THREAD_NAME));
    }

    #[tokio::test]
    async fn test_panicしたジョブはエラーになる() {
        let pool = BlobWorkerPool::new(1).unwrap();

        let result: Result<(), _> = pool.run(async { panic!("job failed") }).await;

        assert!(result.is_err());
    }

    #[tokio::test]
    async fn test_スレッド数0でもジョブを実行できる() {
        // Given
        let pool = BlobWorkerPool::new(0).unwrap();

        // When
        let value = pool.run(async { 42 }).await.unwrap();

        // Then
        assert_eq!(value, 42);
    }

    #[tokio::test]
    async fn test_非同期コンテキスト内でdropできる() {
        let pool = BlobWorkerPool::new(1).unwrap();
        pool.run(async {}).await.unwrap();
        drop(pool);
    }
}
