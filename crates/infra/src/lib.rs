//! # 消去サービス インフラ層
//!
//! レコードストア（DynamoDB）・ブロブストア（S3）との接続と、
//! ストアごとの消去・計数処理を担当する。
//!
//! ## 依存関係
//!
//! ```text
//! erasure-service → infra → domain
//! ```
//!
//! ドメイン層はインフラ層に依存しない。
//!
//! ## モジュール構成
//!
//! - [`record_store`] - レコードストアトレイトと DynamoDB 実装
//! - [`blob_store`] - ブロブストアトレイトと S3 実装
//! - [`deletion`] - レコード消去・ブロブ消去・ブロブ用ワーカープール
//! - [`dynamodb`] / [`s3`] - クライアント生成
//! - [`error`] - インフラ層エラー定義
//! - `mock` - テスト用インメモリストア（`test-utils` feature）
//!
//! ## 使用例
//!
//! ```rust,ignore
//! use std::sync::Arc;
//!
//! use erasure_domain::catalog::DEFAULT_COLLECTIONS;
//! use erasure_infra::{deletion::RecordEraser, dynamodb, record_store::DynamoDbRecordStore};
//!
//! async fn setup() -> RecordEraser {
//!     let client = dynamodb::create_client(Some("http://localhost:18000")).await;
//!     let store = Arc::new(DynamoDbRecordStore::new(client, "dev-"));
//!     RecordEraser::new(store, DEFAULT_COLLECTIONS)
//! }
//! ```

pub mod blob_store;
pub mod deletion;
pub mod dynamodb;
pub mod error;
#[cfg(any(test, feature = "test-utils"))]
pub mod mock;
pub mod record_store;
pub mod s3;

pub use blob_store::{BlobHandle, BlobStore, S3BlobStore};
pub use error::{InfraError, InfraErrorKind};
pub use record_store::{DynamoDbRecordStore, RecordData, RecordHandle, RecordStore, StoredRecord};
