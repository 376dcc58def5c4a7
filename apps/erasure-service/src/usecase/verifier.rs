//! 本人確認
//!
//! 消去対象のプリンシパルがアカウントの所有者であることを、
//! 登録済みメールアドレスとの照合で確認する。force モードでも省略しない。

use std::sync::Arc;

use erasure_domain::{principal::Principal, request::verify_credential};
use erasure_infra::record_store::RecordStore;

use crate::error::ServiceError;

/// 本人確認
pub struct IdentityVerifier {
    store:              Arc<dyn RecordStore>,
    account_collection: String,
}

impl IdentityVerifier {
    pub fn new(store: Arc<dyn RecordStore>, account_collection: impl Into<String>) -> Self {
        Self {
            store,
            account_collection: account_collection.into(),
        }
    }

    /// プリンシパルのアカウントと二次認証情報を照合する
    ///
    /// ## エラー
    ///
    /// - `NotFound`: アカウントレコードがない
    /// - `DataIntegrity`: アカウントレコードにペイロードがない
    /// - `Forbidden`: メールアドレスが一致しない（未登録を含む）
    /// - `Store`: アカウントの読み取りに失敗した
    #[tracing::instrument(skip_all, level = "debug", fields(%principal))]
    pub async fn verify(
        &self,
        principal: &Principal,
        secondary_credential: &str,
    ) -> Result<(), ServiceError> {
        let record = self
            .store
            .get_by_key(&self.account_collection, principal.as_str())
            .await?
            .ok_or_else(|| ServiceError::NotFound("アカウントが見つかりません".to_string()))?;

        let data = record.data.ok_or_else(|| {
            ServiceError::DataIntegrity("アカウント情報を読み取れません".to_string())
        })?;

        verify_credential(data.email.as_deref(), secondary_credential)?;
        Ok(())
    }
}
