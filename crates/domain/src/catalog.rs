//! # 消去対象カタログ
//!
//! プリンシパルのデータが格納される場所を宣言順に列挙する。
//!
//! - [`CollectionSpec`]: レコードストアの論理コレクション
//! - [`PrefixSpec`]: ブロブストアのプレフィックス（フォルダ）
//!
//! ## 順序の意味
//!
//! 消去・見積もりはこの宣言順に逐次処理する。force モードでない消去が途中で
//! 中断した場合、どこまで処理されたかはこの順序で決まる。

use strum::IntoStaticStr;

/// レコードをプリンシパルに紐付ける方法
#[derive(Debug, Clone, Copy, PartialEq, Eq, IntoStaticStr)]
#[strum(serialize_all = "snake_case")]
pub enum CollectionScope {
    /// インデックス付きのオーナーフィールドの等価検索（1 プリンシパルに複数件）
    OwnerField(&'static str),
    /// プリンシパル ID 自体をドキュメントキーとする（1 プリンシパルに最大 1 件）
    PrincipalKey,
}

/// レコードストアの論理コレクション
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CollectionSpec {
    /// 結果の集計キー（例: `"disposal_history"`）
    pub label:      &'static str,
    /// ストア上のコレクション名（例: `"disposal-history"`）
    pub collection: &'static str,
    /// プリンシパルへの紐付け方法
    pub scope:      CollectionScope,
}

impl CollectionSpec {
    /// オーナーフィールドで検索するコレクションを定義する
    pub const fn owned_by(
        label: &'static str,
        collection: &'static str,
        owner_field: &'static str,
    ) -> Self {
        Self {
            label,
            collection,
            scope: CollectionScope::OwnerField(owner_field),
        }
    }

    /// プリンシパル ID をキーとするコレクションを定義する
    pub const fn keyed_by_principal(label: &'static str, collection: &'static str) -> Self {
        Self {
            label,
            collection,
            scope: CollectionScope::PrincipalKey,
        }
    }

    /// オーナーフィールド名（プリンシパルキーのコレクションは `None`）
    pub const fn owner_field(&self) -> Option<&'static str> {
        match self.scope {
            CollectionScope::OwnerField(field) => Some(field),
            CollectionScope::PrincipalKey => None,
        }
    }
}

/// ブロブストアのプレフィックス
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PrefixSpec {
    /// 結果の集計キー（例: `"profile_images"`）
    pub label:    &'static str,
    /// `{principal}` をプリンシパル ID で置換するテンプレート
    pub template: &'static str,
}

/// テンプレート中のプリンシパル ID プレースホルダ
const PRINCIPAL_PLACEHOLDER: &str = "{principal}";

impl PrefixSpec {
    pub const fn new(label: &'static str, template: &'static str) -> Self {
        Self { label, template }
    }

    /// プリンシパルに対応する具体的なプレフィックスを返す
    pub fn resolve(&self, principal: &crate::principal::Principal) -> String {
        self.template
            .replace(PRINCIPAL_PLACEHOLDER, principal.as_str())
    }
}

/// 既定の消去対象コレクション（宣言順に処理する）
pub const DEFAULT_COLLECTIONS: [CollectionSpec; 3] = [
    CollectionSpec::owned_by("profiles", "profiles", "user_id"),
    CollectionSpec::owned_by("disposal_history", "disposal-history", "user_id"),
    CollectionSpec::keyed_by_principal("available_bins", "available-bins"),
];

/// 既定の消去対象プレフィックス（宣言順に処理する）
pub const DEFAULT_PREFIXES: [PrefixSpec; 2] = [
    PrefixSpec::new("disposal_images", "disposal-images/{principal}/"),
    PrefixSpec::new("profile_images", "profile-images/{principal}/"),
];

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;
    use crate::principal::Principal;

    #[test]
    fn test_プレフィックスはプリンシパルidで展開される() {
        let principal = Principal::new("user-123").unwrap();

        let resolved: Vec<String> = DEFAULT_PREFIXES
            .iter()
            .map(|spec| spec.resolve(&principal))
            .collect();

        assert_eq!(
            resolved,
            vec![
                "disposal-images/user-123/".to_string(),
                "profile-images/user-123/".to_string(),
            ]
        );
    }

    #[test]
    fn test_既定コレクションの宣言順() {
        let labels: Vec<&str> = DEFAULT_COLLECTIONS.iter().map(|c| c.label).collect();
        assert_eq!(labels, vec!["profiles", "disposal_history", "available_bins"]);
    }

    #[test]
    fn test_1件限定のコレクションはプリンシパルキーで紐付ける() {
        let bins = DEFAULT_COLLECTIONS[2];
        assert_eq!(bins.scope, CollectionScope::PrincipalKey);

        let scope: &'static str = DEFAULT_COLLECTIONS[0].scope.into();
        assert_eq!(scope, "owner_field");
    }

    #[test]
    fn test_オーナーフィールドはスコープから取り出せる() {
        assert_eq!(DEFAULT_COLLECTIONS[0].owner_field(), Some("user_id"));
        assert_eq!(DEFAULT_COLLECTIONS[2].owner_field(), None);
    }
}
