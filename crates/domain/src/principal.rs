//! # プリンシパル
//!
//! 消去対象となるアカウントの識別子。
//!
//! ## 設計判断
//!
//! プリンシパル ID は外部の認証層が発行する不透明な文字列であり、形式（UUID 等）を
//! 仮定しない。空文字列だけは拒否する。空のプリンシパルでオーナー検索を行うと
//! `user_id` 未設定のレコードに一致し、他人のデータを消去しかねないため。
//!
//! リクエストごとに一度だけ解決され、処理中は変更されない（フィールドは非公開）。

use derive_more::Display;
use serde::Serialize;

use crate::DomainError;

/// 消去対象アカウントの識別子
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Display)]
#[display("{_0}")]
pub struct Principal(String);

impl Principal {
    /// プリンシパルを作成する
    ///
    /// # バリデーション
    ///
    /// - 前後の空白はトリミング
    /// - 空文字列ではない
    /// - `/` を含まない（ブロブのプレフィックスが他のプリンシパルに広がるのを防ぐ）
    pub fn new(value: impl Into<String>) -> Result<Self, DomainError> {
        let value = value.into().trim().to_string();

        if value.is_empty() {
            return Err(DomainError::Validation(
                "プリンシパル ID は必須です".to_string(),
            ));
        }

        if value.contains('/') {
            return Err(DomainError::Validation(
                "プリンシパル ID に '/' は使用できません".to_string(),
            ));
        }

        Ok(Self(value))
    }

    /// 文字列参照を取得する
    pub fn as_str(&self) -> &str {
        &self.0
    }
}
