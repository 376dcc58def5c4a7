//! # インフラ層エラー定義
//!
//! レコードストア・ブロブストアとの通信で発生するエラーを表現する。
//!
//! ## 構造
//!
//! `std::io::Error` と同じ struct + enum パターンを採用:
//! - [`InfraError`]: エラー種別（[`InfraErrorKind`]）と [`SpanTrace`] を保持するラッパー
//! - [`InfraErrorKind`]: エラーの具体的な種別（DynamoDb, S3, WorkerPool 等）
//!
//! convenience constructor でエラーを生成すると、その時点のスパン情報
//! （どのプリンシパル・どのストアの処理中か）が自動的に記録される。

use std::fmt;

use derive_more::Display;
use thiserror::Error;
use tracing_error::SpanTrace;

/// インフラ層で発生するエラー
///
/// パターンマッチには [`kind()`](InfraError::kind) を使用する:
///
/// ```ignore
/// match error.kind() {
///     InfraErrorKind::S3(message) => { /* ... */ }
///     _ => { /* その他 */ }
/// }
/// ```
#[derive(Display)]
#[display("{kind}")]
pub struct InfraError {
    kind:       InfraErrorKind,
    span_trace: SpanTrace,
}

/// インフラ層エラーの種別
#[derive(Debug, Error)]
pub enum InfraErrorKind {
    /// DynamoDB エラー
    ///
    /// AWS SDK のエラー型はジェネリクスが深く `#[from]` が困難なため、
    /// 手動で String にマップする。
    #[error("DynamoDB エラー: {0}")]
    DynamoDb(String),

    /// S3 エラー
    #[error("S3 エラー: {0}")]
    S3(String),

    /// 不正なレコード
    ///
    /// ストアから取得したアイテムが期待する形式でない場合（キー属性の欠落等）。
    #[error("不正なレコード: {0}")]
    MalformedRecord(String),

    /// ブロブ用ワーカープールのエラー
    ///
    /// ランタイムの起動失敗、ジョブの panic など。
    #[error("ワーカープールエラー: {0}")]
    WorkerPool(String),
}

impl InfraError {
    /// エラー種別を取得する
    pub fn kind(&self) -> &InfraErrorKind {
        &self.kind
    }

    /// SpanTrace を取得する
    pub fn span_trace(&self) -> &SpanTrace {
        &self.span_trace
    }

    fn new(kind: InfraErrorKind) -> Self {
        Self {
            kind,
            span_trace: SpanTrace::capture(),
        }
    }

    // ===== Convenience constructors =====

    /// DynamoDB エラーを生成する
    pub fn dynamo_db(msg: impl Into<String>) -> Self {
        Self::new(InfraErrorKind::DynamoDb(msg.into()))
    }

    /// S3 エラーを生成する
    pub fn s3(msg: impl Into<String>) -> Self {
        Self::new(InfraErrorKind::S3(msg.into()))
    }

    /// 不正なレコードエラーを生成する
    pub fn malformed_record(msg: impl Into<String>) -> Self {
        Self::new(InfraErrorKind::MalformedRecord(msg.into()))
    }

    /// ワーカープールエラーを生成する
    pub fn worker_pool(msg: impl Into<String>) -> Self {
        Self::new(InfraErrorKind::WorkerPool(msg.into()))
    }
}

impl fmt::Debug for InfraError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("InfraError")
            .field("kind", &self.kind)
            .field("span_trace", &self.span_trace)
            .finish()
    }
}

impl std::error::Error for InfraError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        self.kind.source()
    }
}
