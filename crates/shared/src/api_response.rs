//! # API レスポンスエンベロープ
//!
//! 公開 API の統一レスポンス形式 `{ "data": T }` を提供する。

use serde::{Deserialize, Serialize};

/// 公開 API の統一レスポンス型
///
/// 消去 API・見積もり API はいずれも `{ "data": T }` 形式でレスポンスを返す。
/// 消去が失敗扱いになった場合（500）も、部分的な削除件数を呼び出し元が確認できるよう
/// 同じエンベロープで結果を返す。
///
/// ## 使用例
///
/// ```
/// use erasure_shared::ApiResponse;
///
/// let response = ApiResponse::new(3_u64);
/// assert_eq!(response.data, 3);
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ApiResponse<T> {
    pub data: T,
}

impl<T> ApiResponse<T> {
    /// 新しい `ApiResponse` を作成する
    pub fn new(data: T) -> Self {
        Self { data }
    }
}
