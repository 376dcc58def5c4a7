//! # RecordEraser
//!
//! プリンシパルのレコードを宣言済みコレクションから順に削除する。
//!
//! ## 削除方式
//!
//! レコードストアには一括削除がないため、対象レコードを取得してから
//! 1 件ずつ削除する。件数は削除に成功したレコードだけを数える。

use std::sync::Arc;

use erasure_domain::{
    catalog::{CollectionScope, CollectionSpec},
    outcome::StoreFailure,
    principal::Principal,
};

use super::StageReport;
use crate::{
    error::InfraError,
    record_store::{RecordStore, StoredRecord},
};

/// レコード消去
pub struct RecordEraser {
    store:       Arc<dyn RecordStore>,
    collections: Vec<CollectionSpec>,
}

impl RecordEraser {
    pub fn new(store: Arc<dyn RecordStore>, collections: impl Into<Vec<CollectionSpec>>) -> Self {
        Self {
            store,
            collections: collections.into(),
        }
    }

    /// プリンシパルのレコードを全コレクションから削除する
    pub async fn erase(&self, principal: &Principal, force_mode: bool) -> StageReport {
        let mut report = StageReport::default();

        for spec in &self.collections {
            let mut deleted: u64 = 0;
            let result = self.erase_collection(spec, principal, &mut deleted).await;
            report.counts.set(spec.label, deleted);

            if let Err(error) = result {
                tracing::error!(
                    store = spec.label,
                    %principal,
                    deleted,
                    force_mode,
                    error = %error,
                    "コレクションの消去に失敗"
                );
                report
                    .errors
                    .push(StoreFailure::new(spec.label, error.to_string()));

                if !force_mode {
                    report.aborted = true;
                    break;
                }
            }
        }

        report
    }

    /// プリンシパルのレコード件数を全コレクションについて数える（削除しない）
    ///
    /// 失敗したコレクションはエラーとして記録し、件数には含めずに続行する。
    pub async fn count(&self, principal: &Principal) -> StageReport {
        let mut report = StageReport::default();

        for spec in &self.collections {
            match self.count_collection(spec, principal).await {
                Ok(count) => report.counts.set(spec.label, count),
                Err(error) => {
                    tracing::warn!(store = spec.label, error = %error, "コレクションの件数取得に失敗");
                    report
                        .errors
                        .push(StoreFailure::new(spec.label, error.to_string()));
                }
            }
        }

        report
    }

    #[tracing::instrument(
        skip_all,
        level = "debug",
        fields(store = spec.label, scope = <&'static str>::from(spec.scope), %principal)
    )]
    async fn erase_collection(
        &self,
        spec: &CollectionSpec,
        principal: &Principal,
        deleted: &mut u64,
    ) -> Result<(), InfraError> {
        let records = self.fetch(spec, principal).await?;

        for record in records {
            self.store.delete(&record.handle).await?;
            *deleted += 1;
        }

        tracing::debug!(deleted = *deleted, "コレクションを消去しました");
        Ok(())
    }

    async fn fetch(
        &self,
        spec: &CollectionSpec,
        principal: &Principal,
    ) -> Result<Vec<StoredRecord>, InfraError> {
        match spec.scope {
            CollectionScope::OwnerField(owner_field) => {
                self.store
                    .query_by_owner(spec.collection, owner_field, principal)
                    .await
            }
            CollectionScope::PrincipalKey => Ok(self
                .store
                .get_by_key(spec.collection, principal.as_str())
                .await?
                .into_iter()
                .collect()),
        }
    }

    #[tracing::instrument(
        skip_all,
        level = "debug",
        fields(store = spec.label, scope = <&'static str>::from(spec.scope), %principal)
    )]
    async fn count_collection(
        &self,
        spec: &CollectionSpec,
        principal: &Principal,
    ) -> Result<u64, InfraError> {
        match spec.scope {
            CollectionScope::OwnerField(owner_field) => {
                self.store
                    .count_by_owner(spec.collection, owner_field, principal)
                    .await
            }
            CollectionScope::PrincipalKey => Ok(self
                .store
                .get_by_key(spec.collection, principal.as_str())
                .await?
                .map_or(0, |_| 1)),
        }
    }
}
