//! # 消去結果・見積もり結果
//!
//! ## ErasureOutcome
//!
//! 1 回の消去呼び出しの集計結果。オーケストレーターが [`ErasureOutcomeBuilder`] で
//! ステージごとに組み立て、[`ErasureOutcomeBuilder::finish`] で確定させる。
//! 確定後は変更できない（フィールドは非公開、アクセサのみ）。永続化はしない。
//!
//! ## 成功判定
//!
//! `is_success = errors.is_empty() || force_mode`
//!
//! force モードではエラーがあっても成功として報告する。エラー一覧は可視化のために
//! 返すが、成功フラグは反転させない。呼び出し元がエラー一覧を自分で確認することを
//! オペレーターが明示的に了承した、という扱いである。

use chrono::{DateTime, Utc};
use serde::{Serialize, Serializer, ser::SerializeMap};

use crate::principal::Principal;

/// ストア単位の件数（宣言順を保持する）
///
/// ラベルが存在しない場合は「未着手」を意味する。0 件とは区別する。
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct StageCounts {
    entries: Vec<(&'static str, u64)>,
}

impl StageCounts {
    pub fn new() -> Self {
        Self::default()
    }

    /// ラベルの件数を設定する（既存のラベルは上書き）
    pub fn set(&mut self, label: &'static str, count: u64) {
        match self.entries.iter_mut().find(|(l, _)| *l == label) {
            Some(entry) => entry.1 = count,
            None => self.entries.push((label, count)),
        }
    }

    /// ラベルの件数を取得する（未着手なら `None`）
    pub fn get(&self, label: &str) -> Option<u64> {
        self.entries
            .iter()
            .find(|(l, _)| *l == label)
            .map(|(_, count)| *count)
    }

    /// 全ラベルの合計件数
    pub fn total(&self) -> u64 {
        self.entries.iter().map(|(_, count)| count).sum()
    }

    /// 宣言順に (ラベル, 件数) を列挙する
    pub fn iter(&self) -> impl Iterator<Item = (&'static str, u64)> + '_ {
        self.entries.iter().copied()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// 宣言順を保ったまま `{ ラベル: 件数 }` のオブジェクトとしてシリアライズする
impl Serialize for StageCounts {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.entries.len()))?;
        for (label, count) in &self.entries {
            map.serialize_entry(label, count)?;
        }
        map.end()
    }
}

/// ストア操作の失敗記録
///
/// `store` はコレクションまたはプレフィックスのラベル、
/// ブロブストア自体が利用できない場合は [`StoreFailure::BLOB_STORE`]。
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StoreFailure {
    pub store:   &'static str,
    pub message: String,
}

impl StoreFailure {
    /// ブロブストア全体を指すラベル
    pub const BLOB_STORE: &'static str = "blob_store";

    pub fn new(store: &'static str, message: impl Into<String>) -> Self {
        Self {
            store,
            message: message.into(),
        }
    }
}

impl std::fmt::Display for StoreFailure {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}: {}", self.store, self.message)
    }
}

/// 消去結果
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ErasureOutcome {
    principal:     Principal,
    record_counts: StageCounts,
    blob_counts:   StageCounts,
    errors:        Vec<StoreFailure>,
    force_mode:    bool,
    completed_at:  DateTime<Utc>,
}

impl ErasureOutcome {
    /// 消去結果の組み立てを開始する
    pub fn builder(principal: Principal, force_mode: bool) -> ErasureOutcomeBuilder {
        ErasureOutcomeBuilder {
            principal,
            record_counts: StageCounts::new(),
            blob_counts: StageCounts::new(),
            errors: Vec::new(),
            force_mode,
        }
    }

    pub fn principal(&self) -> &Principal {
        &self.principal
    }

    /// コレクションごとの削除件数
    pub fn record_counts(&self) -> &StageCounts {
        &self.record_counts
    }

    /// プレフィックスごとの削除件数
    pub fn blob_counts(&self) -> &StageCounts {
        &self.blob_counts
    }

    /// 発生順のエラー一覧
    pub fn errors(&self) -> &[StoreFailure] {
        &self.errors
    }

    pub fn force_mode(&self) -> bool {
        self.force_mode
    }

    pub fn completed_at(&self) -> DateTime<Utc> {
        self.completed_at
    }

    /// 削除したレコードの合計件数
    pub fn total_documents(&self) -> u64 {
        self.record_counts.total()
    }

    /// 削除したブロブの合計件数
    pub fn total_blobs(&self) -> u64 {
        self.blob_counts.total()
    }

    /// 成功として報告するかどうか
    pub fn is_success(&self) -> bool {
        self.errors.is_empty() || self.force_mode
    }

    /// 呼び出し元向けの要約メッセージ
    pub fn message(&self) -> String {
        match (self.is_success(), self.errors.is_empty()) {
            (true, true) => format!(
                "データ消去が完了しました（ドキュメント {} 件、ファイル {} 件）",
                self.total_documents(),
                self.total_blobs()
            ),
            (true, false) => format!(
                "force モードでデータ消去が完了しました（ドキュメント {} 件、ファイル {} 件、エラー {} 件）",
                self.total_documents(),
                self.total_blobs(),
                self.errors.len()
            ),
            (false, _) => format!(
                "データ消去はエラーにより中断されました（エラー {} 件）。force_delete=true でエラーを無視して続行できます",
                self.errors.len()
            ),
        }
    }
}

/// [`ErasureOutcome`] の組み立て用ビルダー
#[derive(Debug)]
pub struct ErasureOutcomeBuilder {
    principal:     Principal,
    record_counts: StageCounts,
    blob_counts:   StageCounts,
    errors:        Vec<StoreFailure>,
    force_mode:    bool,
}

impl ErasureOutcomeBuilder {
    /// レコード消去ステージの結果を取り込む
    pub fn record_stage(mut self, counts: StageCounts, errors: Vec<StoreFailure>) -> Self {
        self.record_counts = counts;
        self.errors.extend(errors);
        self
    }

    /// ブロブ消去ステージの結果を取り込む
    pub fn blob_stage(mut self, counts: StageCounts, errors: Vec<StoreFailure>) -> Self {
        self.blob_counts = counts;
        self.errors.extend(errors);
        self
    }

    /// 完了時刻を記録して結果を確定する
    pub fn finish(self, completed_at: DateTime<Utc>) -> ErasureOutcome {
        ErasureOutcome {
            principal: self.principal,
            record_counts: self.record_counts,
            blob_counts: self.blob_counts,
            errors: self.errors,
            force_mode: self.force_mode,
            completed_at,
        }
    }
}

/// 見積もり結果（読み取り専用の件数集計）
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EstimateReport {
    principal:     Principal,
    record_counts: StageCounts,
    blob_counts:   StageCounts,
    errors:        Vec<StoreFailure>,
}

impl EstimateReport {
    pub fn new(
        principal: Principal,
        record_counts: StageCounts,
        blob_counts: StageCounts,
        errors: Vec<StoreFailure>,
    ) -> Self {
        Self {
            principal,
            record_counts,
            blob_counts,
            errors,
        }
    }

    pub fn principal(&self) -> &Principal {
        &self.principal
    }

    pub fn record_counts(&self) -> &StageCounts {
        &self.record_counts
    }

    pub fn blob_counts(&self) -> &StageCounts {
        &self.blob_counts
    }

    pub fn errors(&self) -> &[StoreFailure] {
        &self.errors
    }

    /// 数えられた全アイテムの合計（失敗したストアは含まない）
    pub fn estimated_total(&self) -> u64 {
        self.record_counts.total() + self.blob_counts.total()
    }
}

#[cfg(test)]
mod tests {
    use chrono::TimeZone;
    use pretty_assertions::assert_eq;

    use super::*;

    fn principal() -> Principal {
        Principal::new("user-123").unwrap()
    }

    fn counts(entries: &[(&'static str, u64)]) -> StageCounts {
        let mut counts = StageCounts::new();
        for (label, count) in entries {
            counts.set(label, *count);
        }
        counts
    }

    fn completed_at() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2026, 3, 1, 12, 0, 0).unwrap()
    }

    #[test]
    fn test_stage_countsは宣言順を保持し同じラベルを上書きする() {
        let mut counts = StageCounts::new();
        counts.set("profiles", 1);
        counts.set("disposal_history", 5);
        counts.set("profiles", 2);

        let entries: Vec<_> = counts.iter().collect();
        assert_eq!(entries, vec![("profiles", 2), ("disposal_history", 5)]);
        assert_eq!(counts.total(), 7);
    }

    #[test]
    fn test_未着手のラベルはnoneを返す() {
        let counts = counts(&[("profiles", 0)]);

        assert_eq!(counts.get("profiles"), Some(0));
        assert_eq!(counts.get("available_bins"), None);
    }

    #[test]
    fn test_エラーなしの結果は成功になる() {
        let outcome = ErasureOutcome::builder(principal(), false)
            .record_stage(counts(&[("profiles", 1), ("disposal_history", 3)]), vec![])
            .blob_stage(counts(&[("disposal_images", 4)]), vec![])
            .finish(completed_at());

        assert!(outcome.is_success());
        assert_eq!(outcome.total_documents(), 4);
        assert_eq!(outcome.total_blobs(), 4);
        assert_eq!(outcome.completed_at(), completed_at());
    }

    #[test]
    fn test_force_modeでなければエラーありの結果は失敗になる() {
        let outcome = ErasureOutcome::builder(principal(), false)
            .record_stage(
                counts(&[("profiles", 1)]),
                vec![StoreFailure::new("disposal_history", "timeout")],
            )
            .finish(completed_at());

        assert!(!outcome.is_success());
        assert!(outcome.message().contains("force_delete=true"));
    }

    #[test]
    fn test_force_modeではエラーありでも成功として報告する() {
        let outcome = ErasureOutcome::builder(principal(), true)
            .record_stage(
                counts(&[("profiles", 1)]),
                vec![StoreFailure::new("disposal_history", "timeout")],
            )
            .blob_stage(
                StageCounts::new(),
                vec![StoreFailure::new("profile_images", "denied")],
            )
            .finish(completed_at());

        assert!(outcome.is_success());
        assert_eq!(
            outcome.errors(),
            &[
                StoreFailure::new("disposal_history", "timeout"),
                StoreFailure::new("profile_images", "denied"),
            ]
        );
        assert!(outcome.message().contains("エラー 2 件"));
    }

    #[test]
    fn test_見積もりの合計は全ストアの件数の和になる() {
        let report = EstimateReport::new(
            principal(),
            counts(&[("profiles", 1), ("disposal_history", 10)]),
            counts(&[("disposal_images", 7)]),
            vec![StoreFailure::new("profile_images", "denied")],
        );

        assert_eq!(report.estimated_total(), 18);
    }

    #[test]
    fn test_stage_countsは宣言順のオブジェクトにシリアライズされる() {
        let counts = counts(&[("profiles", 1), ("disposal_history", 3)]);

        let json = serde_json::to_string(&counts).unwrap();

        assert_eq!(json, r#"{"profiles":1,"disposal_history":3}"#);
    }

    #[test]
    fn test_store_failureのdisplay() {
        let failure = StoreFailure::new(StoreFailure::BLOB_STORE, "ストアが利用できません");
        assert_eq!(failure.to_string(), "blob_store: ストアが利用できません");
    }
}
