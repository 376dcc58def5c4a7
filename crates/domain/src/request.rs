//! # 消去リクエスト
//!
//! 1 回の消去呼び出しの入力（確認文字列・二次認証情報・force フラグ）を表す。
//!
//! ## 確認文字列
//!
//! 確認文字列は [`CONFIRMATION_LITERAL`]（`"DELETE"`）と大文字小文字を区別して比較する。
//! クライアントとサービスの双方が知る固定値であり、不一致の場合はどのストアにも
//! 触れる前にリクエストを拒否する。
//!
//! ## 二次認証情報
//!
//! アカウントに登録されたメールアドレス。ASCII 小文字に正規化して比較する。

use crate::DomainError;

/// 消去リクエストに要求される確認文字列
pub const CONFIRMATION_LITERAL: &str = "DELETE";

/// 消去リクエスト
///
/// リクエストごとに生成され、消去完了後に破棄される。
#[derive(Debug, Clone)]
pub struct DeletionRequest {
    confirmation_token:   String,
    secondary_credential: String,
    force_mode:           bool,
}

impl DeletionRequest {
    pub fn new(
        confirmation_token: impl Into<String>,
        secondary_credential: impl Into<String>,
        force_mode: bool,
    ) -> Self {
        Self {
            confirmation_token: confirmation_token.into(),
            secondary_credential: secondary_credential.into(),
            force_mode,
        }
    }

    /// 確認文字列が固定リテラルと一致することを検証する
    pub fn ensure_confirmed(&self) -> Result<(), DomainError> {
        if self.confirmation_token == CONFIRMATION_LITERAL {
            Ok(())
        } else {
            Err(DomainError::InvalidConfirmation {
                expected: CONFIRMATION_LITERAL,
            })
        }
    }

    /// 二次認証情報（メールアドレス）を取得する
    pub fn secondary_credential(&self) -> &str {
        &self.secondary_credential
    }

    /// force モードかどうか
    ///
    /// force モードではストアエラーで各ステージを中断せず、最終結果も成功として報告する。
    /// 本人確認は force モードでも省略されない。
    pub fn force_mode(&self) -> bool {
        self.force_mode
    }
}

/// 保存済みの認証情報と入力された認証情報を照合する
///
/// 双方を ASCII 小文字に正規化して比較する。
/// 保存済みの認証情報がない場合は不一致として扱う。
pub fn verify_credential(stored: Option<&str>, supplied: &str) -> Result<(), DomainError> {
    match stored {
        Some(stored) if stored.to_ascii_lowercase() == supplied.to_ascii_lowercase() => Ok(()),
        _ => Err(DomainError::CredentialMismatch),
    }
}

#[cfg(test)]
mod tests {
    use rstest::rstest;

    use super::*;

    #[test]
    fn test_確認文字列が一致すれば受け入れる() {
        let request = DeletionRequest::new("DELETE", "a@example.com", false);
        assert!(request.ensure_confirmed().is_ok());
    }

    #[rstest]
    #[case::小文字("delete")]
    #[case::先頭だけ大文字("Delete")]
    #[case::末尾に空白("DELETE ")]
    #[case::空文字列("")]
    #[case::別の単語("CONFIRM")]
    fn test_確認文字列が完全一致しなければ拒否する(#[case] token: &str) {
        let request = DeletionRequest::new(token, "a@example.com", true);

        assert_eq!(
            request.ensure_confirmed(),
            Err(DomainError::InvalidConfirmation { expected: "DELETE" })
        );
    }

    #[test]
    fn test_認証情報は大文字小文字を区別せずに照合する() {
        assert!(verify_credential(Some("a@example.com"), "A@Example.com").is_ok());
        assert!(verify_credential(Some("A@EXAMPLE.COM"), "a@example.com").is_ok());
    }

    #[test]
    fn test_認証情報が異なれば不一致を返す() {
        assert_eq!(
            verify_credential(Some("a@example.com"), "b@example.com"),
            Err(DomainError::CredentialMismatch)
        );
    }

    #[test]
    fn test_保存済み認証情報がなければ不一致を返す() {
        assert_eq!(
            verify_credential(None, "a@example.com"),
            Err(DomainError::CredentialMismatch)
        );
    }
}
