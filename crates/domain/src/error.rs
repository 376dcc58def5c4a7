//! # ドメイン層エラー定義
//!
//! 消去リクエストそのものが不正であることを表すエラー型。
//!
//! ## エラーの種類と HTTP ステータスの対応
//!
//! | エラー種別 | HTTP ステータス | 用途 |
//! |-----------|----------------|------|
//! | `Validation` | 401 Unauthorized | プリンシパル ID の検証失敗（解決できないものとして扱う） |
//! | `InvalidConfirmation` | 400 Bad Request | 確認文字列の不一致 |
//! | `CredentialMismatch` | 403 Forbidden | 二次認証情報の不一致 |
//!
//! いずれも force モードの有無に関係なく、消去を開始する前にリクエストを拒否する。

use thiserror::Error;

/// ドメイン層で発生するエラー
#[derive(Debug, Error, PartialEq, Eq)]
pub enum DomainError {
    /// バリデーションエラー
    ///
    /// 空のプリンシパル ID など、値オブジェクトの生成に失敗した場合に使用する。
    #[error("バリデーションエラー: {0}")]
    Validation(String),

    /// 確認文字列の不一致
    ///
    /// 確認文字列は大文字小文字を区別して固定リテラルと比較する。
    #[error("確認文字列が一致しません（\"{expected}\" を正確に入力してください）")]
    InvalidConfirmation {
        /// 要求される確認文字列
        expected: &'static str,
    },

    /// 二次認証情報（メールアドレス）の不一致
    #[error("メールアドレスの確認に失敗しました")]
    CredentialMismatch,
}
