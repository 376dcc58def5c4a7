//! # 消去イベントログとエラーコンテキストの構造化ヘルパー
//!
//! 消去操作は不可逆であり、事後に「いつ・誰のデータを・どこまで消したか」を
//! ログから追跡できる必要がある。そのためのフィールド命名規約とマクロを提供する。
//!
//! ## 消去イベント
//!
//! [`log_erasure_event!`] マクロで出力する。`event.kind = "erasure_event"` マーカーが
//! 自動付与され、`jq 'select(.["event.kind"] == "erasure_event")'` でフィルタできる。
//!
//! ## フィールド命名規約
//!
//! ドット記法（`event.action`、`error.kind`）を使用。JSON 出力でフラットなキーになる。

/// 消去イベントを構造化ログとして出力する。
///
/// `event.kind = "erasure_event"` マーカーを自動付与する。
/// 不可逆操作の記録であるため `tracing::warn!` レベルで出力し、
/// 本番の既定フィルタ（`info`）でも確実に残るようにする。
///
/// ## 必須フィールド（慣例）
///
/// - `event.action`: アクション名（[`event::action`] の定数を使用）
/// - `event.principal`: 対象プリンシパル
/// - `event.result`: 結果（[`event::result`] の定数を使用）
#[macro_export]
macro_rules! log_erasure_event {
    ($($args:tt)*) => {
        ::tracing::warn!(
            event.kind = "erasure_event",
            $($args)*
        )
    };
}

/// イベントフィールドの定数
pub mod event {
    /// イベントアクション
    pub mod action {
        pub const ERASURE_REQUESTED: &str = "erasure.requested";
        pub const ERASURE_COMPLETED: &str = "erasure.completed";
        pub const ERASURE_REJECTED: &str = "erasure.rejected";
        pub const ESTIMATION_COMPLETED: &str = "estimation.completed";
    }

    /// イベント結果
    pub mod result {
        pub const SUCCESS: &str = "success";
        pub const FAILURE: &str = "failure";
        /// force モードによりエラーありでも成功扱いになった
        pub const FORCED: &str = "forced";
    }
}

/// エラーコンテキストフィールドの定数
pub mod error {
    /// エラー種別
    pub mod kind {
        pub const RECORD_STORE: &str = "record_store";
        pub const BLOB_STORE: &str = "blob_store";
        pub const VERIFICATION: &str = "verification";
    }
}
