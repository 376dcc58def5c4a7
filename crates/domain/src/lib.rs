//! # Erasure ドメイン層
//!
//! プリンシパル（アカウント）単位のデータ消去を表現するドメインモデルを定義する。
//!
//! ## 設計方針
//!
//! - **値オブジェクト**: [`principal::Principal`]、[`request::DeletionRequest`] など、
//!   生成時に検証され以後不変のオブジェクト
//! - **カタログ**: 消去対象のコレクション・プレフィックスを宣言順に固定した
//!   [`catalog::CollectionSpec`] / [`catalog::PrefixSpec`]
//! - **結果モデル**: 消去・見積もりの集計結果（[`outcome::ErasureOutcome`],
//!   [`outcome::EstimateReport`]）
//!
//! ## 依存関係の方向
//!
//! ```text
//! erasure-service → infra → domain
//!        ↘                   ↑
//!          ──────────────────
//! ```
//!
//! ドメイン層はストア（DynamoDB, S3）に一切依存しない。
//!
//! ## 使用例
//!
//! ```rust
//! use erasure_domain::{principal::Principal, request::DeletionRequest};
//!
//! let principal = Principal::new("user-123").unwrap();
//! let request = DeletionRequest::new("DELETE", "a@example.com", false);
//! assert!(request.ensure_confirmed().is_ok());
//! assert_eq!(principal.as_str(), "user-123");
//! ```

pub mod catalog;
pub mod clock;
pub mod error;
pub mod outcome;
pub mod principal;
pub mod request;

pub use error::DomainError;
