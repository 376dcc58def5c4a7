//! # ブロブストア
//!
//! プレフィックス（フォルダ）単位でブロブを列挙・削除するストアの抽象化と、
//! S3 による実装。
//!
//! ブロブストアが設定されていない環境では、利用側が `Option<Arc<dyn BlobStore>>`
//! の `None` として扱う。利用可否は構築時に一度だけ決まる。

use async_trait::async_trait;
use aws_sdk_s3::Client;

use crate::error::InfraError;

/// ブロブの所在（オブジェクトキー）
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct BlobHandle {
    pub key: String,
}

impl BlobHandle {
    pub fn new(key: impl Into<String>) -> Self {
        Self { key: key.into() }
    }
}

/// ブロブストアトレイト
#[async_trait]
pub trait BlobStore: Send + Sync {
    /// プレフィックス配下のブロブをすべて列挙する
    async fn list_by_prefix(&self, prefix: &str) -> Result<Vec<BlobHandle>, InfraError>;

    /// ブロブを 1 件削除する
    async fn delete(&self, handle: &BlobHandle) -> Result<(), InfraError>;

    /// プレフィックス配下のブロブ件数を返す
    async fn count_by_prefix(&self, prefix: &str) -> Result<u64, InfraError> {
        Ok(self.list_by_prefix(prefix).await?.len() as u64)
    }
}

/// S3 によるブロブストア実装
pub struct S3BlobStore {
    client:      Client,
    bucket_name: String,
}

impl S3BlobStore {
    pub fn new(client: Client, bucket_name: impl Into<String>) -> Self {
        Self {
            client,
            bucket_name: bucket_name.into(),
        }
    }
}

#[async_trait]
impl BlobStore for S3BlobStore {
    async fn list_by_prefix(&self, prefix: &str) -> Result<Vec<BlobHandle>, InfraError> {
        let mut handles = Vec::new();
        let mut continuation_token = None;

        loop {
            let output = self
                .client
                .list_objects_v2()
                .bucket(&self.bucket_name)
                .prefix(prefix)
                .set_continuation_token(continuation_token)
                .send()
                .await
                .map_err(|e| InfraError::s3(format!("オブジェクト一覧の取得に失敗: {e}")))?;

            handles.extend(
                output
                    .contents()
                    .iter()
                    .filter_map(|object| object.key().map(BlobHandle::new)),
            );

            continuation_token =
                next_page_token(output.is_truncated(), output.next_continuation_token());
            if continuation_token.is_none() {
                break;
            }
        }

        Ok(handles)
    }

    async fn delete(&self, handle: &BlobHandle) -> Result<(), InfraError> {
        self.client
            .delete_object()
            .bucket(&self.bucket_name)
            .key(&handle.key)
            .send()
            .await
            .map_err(|e| {
                InfraError::s3(format!("オブジェクト {} の削除に失敗: {e}", handle.key))
            })?;
        Ok(())
    }

    async fn count_by_prefix(&self, prefix: &str) -> Result<u64, InfraError> {
        let mut total: u64 = 0;
        let mut continuation_token = None;

        loop {
            let output = self
                .client
                .list_objects_v2()
                .bucket(&self.bucket_name)
                .prefix(prefix)
                .set_continuation_token(continuation_token)
                .send()
                .await
                .map_err(|e| InfraError::s3(format!("オブジェクト件数の取得に失敗: {e}")))?;

            total += output.key_count().unwrap_or(0) as u64;

            continuation_token =
                next_page_token(output.is_truncated(), output.next_continuation_token());
            if continuation_token.is_none() {
                break;
            }
        }

        Ok(total)
    }
}

/// 次のページを要求するための継続トークンを返す
///
/// 続きがあるのにトークンが返らない応答は最終ページとして扱う。
fn next_page_token(is_truncated: Option<bool>, token: Option<&str>) -> Option<String> {
    match (is_truncated, token) {
        (Some(true), Some(token)) => Some(token.to_string()),
        (Some(true), None) => {
            tracing::warn!("継続トークンのない途中までの一覧応答を受け取ったため、列挙を打ち切ります");
            None
        }
        _ => None,
    }
}
