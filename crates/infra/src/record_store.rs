//! # レコードストア
//!
//! 論理コレクション単位でレコードを検索・削除するストアの抽象化と、
//! DynamoDB による実装。
//!
//! ## レコードの型付け
//!
//! ストアのアイテムは境界で [`StoredRecord`] にデコードする。キー以外の属性を
//! 一つも持たないアイテムは「読み取れるペイロードがない」ものとして
//! `data: None` になる。本人確認ではこれをデータ不整合として扱う。

use std::collections::HashMap;

use async_trait::async_trait;
use aws_sdk_dynamodb::{
    Client,
    types::{AttributeValue, Select},
};
use chrono::{DateTime, Utc};
use erasure_domain::principal::Principal;

use crate::{
    dynamodb::{PARTITION_KEY, owner_index_name},
    error::InfraError,
};

/// オーナー ID を保持する属性名
pub const OWNER_ATTRIBUTE: &str = "user_id";

/// レコードの所在（コレクション + ドキュメントキー）
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct RecordHandle {
    pub collection: String,
    pub key:        String,
}

impl RecordHandle {
    pub fn new(collection: impl Into<String>, key: impl Into<String>) -> Self {
        Self {
            collection: collection.into(),
            key:        key.into(),
        }
    }
}

/// レコードのペイロード
///
/// コレクションごとにスキーマが異なるため、消去処理と本人確認に必要な
/// フィールドだけを明示的な Option で持つ。
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RecordData {
    pub owner_id:   Option<String>,
    pub email:      Option<String>,
    pub created_at: Option<DateTime<Utc>>,
    pub updated_at: Option<DateTime<Utc>>,
}

/// ストアから取得したレコード
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoredRecord {
    pub handle: RecordHandle,
    pub data:   Option<RecordData>,
}

/// レコードストアトレイト
#[async_trait]
pub trait RecordStore: Send + Sync {
    /// オーナーフィールドが一致するレコードをすべて取得する
    async fn query_by_owner(
        &self,
        collection: &str,
        owner_field: &str,
        principal: &Principal,
    ) -> Result<Vec<StoredRecord>, InfraError>;

    /// ドキュメントキーでレコードを 1 件取得する
    async fn get_by_key(
        &self,
        collection: &str,
        key: &str,
    ) -> Result<Option<StoredRecord>, InfraError>;

    /// レコードを 1 件削除する
    async fn delete(&self, handle: &RecordHandle) -> Result<(), InfraError>;

    /// オーナーフィールドが一致するレコードの件数を返す
    async fn count_by_owner(
        &self,
        collection: &str,
        owner_field: &str,
        principal: &Principal,
    ) -> Result<u64, InfraError> {
        let records = self
            .query_by_owner(collection, owner_field, principal)
            .await?;
        Ok(records.len() as u64)
    }
}

/// DynamoDB によるレコードストア実装
///
/// テーブル名は `{table_prefix}{collection}`。
pub struct DynamoDbRecordStore {
    client:       Client,
    table_prefix: String,
}

impl DynamoDbRecordStore {
    pub fn new(client: Client, table_prefix: impl Into<String>) -> Self {
        Self {
            client,
            table_prefix: table_prefix.into(),
        }
    }

    /// コレクションに対応するテーブル名を返す
    pub fn table_name(&self, collection: &str) -> String {
        format!("{}{}", self.table_prefix, collection)
    }
}

#[async_trait]
impl RecordStore for DynamoDbRecordStore {
    async fn query_by_owner(
        &self,
        collection: &str,
        owner_field: &str,
        principal: &Principal,
    ) -> Result<Vec<StoredRecord>, InfraError> {
        let table_name = self.table_name(collection);
        let mut records = Vec::new();
        let mut exclusive_start_key = None;

        loop {
            let output = self
                .client
                .query()
                .table_name(&table_name)
                .index_name(owner_index_name(owner_field))
                .key_condition_expression("#owner = :owner")
                .expression_attribute_names("#owner", owner_field)
                .expression_attribute_values(":owner", AttributeValue::S(principal.to_string()))
                .set_exclusive_start_key(exclusive_start_key)
                .send()
                .await
                .map_err(|e| {
                    InfraError::dynamo_db(format!("'{table_name}' の検索に失敗: {e}"))
                })?;

            for item in output.items() {
                records.push(decode_item(collection, item)?);
            }

            // ページネーション
            exclusive_start_key = output.last_evaluated_key().cloned();
            if exclusive_start_key.is_none() {
                break;
            }
        }

        Ok(records)
    }

    async fn get_by_key(
        &self,
        collection: &str,
        key: &str,
    ) -> Result<Option<StoredRecord>, InfraError> {
        let table_name = self.table_name(collection);
        let output = self
            .client
            .get_item()
            .table_name(&table_name)
            .key(PARTITION_KEY, AttributeValue::S(key.to_string()))
            .consistent_read(true)
            .send()
            .await
            .map_err(|e| InfraError::dynamo_db(format!("'{table_name}' の取得に失敗: {e}")))?;

        output
            .item()
            .map(|item| decode_item(collection, item))
            .transpose()
    }

    async fn delete(&self, handle: &RecordHandle) -> Result<(), InfraError> {
        let table_name = self.table_name(&handle.collection);
        self.client
            .delete_item()
            .table_name(&table_name)
            .key(PARTITION_KEY, AttributeValue::S(handle.key.clone()))
            .send()
            .await
            .map_err(|e| {
                InfraError::dynamo_db(format!(
                    "'{table_name}' のレコード {} の削除に失敗: {e}",
                    handle.key
                ))
            })?;
        Ok(())
    }

    async fn count_by_owner(
        &self,
        collection: &str,
        owner_field: &str,
        principal: &Principal,
    ) -> Result<u64, InfraError> {
        let table_name = self.table_name(collection);
        let mut total: u64 = 0;
        let mut exclusive_start_key = None;

        loop {
            let output = self
                .client
                .query()
                .table_name(&table_name)
                .index_name(owner_index_name(owner_field))
                .key_condition_expression("#owner = :owner")
                .expression_attribute_names("#owner", owner_field)
                .expression_attribute_values(":owner", AttributeValue::S(principal.to_string()))
                .select(Select::Count)
                .set_exclusive_start_key(exclusive_start_key)
                .send()
                .await
                .map_err(|e| {
                    InfraError::dynamo_db(format!("'{table_name}' の件数取得に失敗: {e}"))
                })?;

            total += output.count() as u64;

            exclusive_start_key = output.last_evaluated_key().cloned();
            if exclusive_start_key.is_none() {
                break;
            }
        }

        Ok(total)
    }
}

/// DynamoDB のアイテムを [`StoredRecord`] にデコードする
fn decode_item(
    collection: &str,
    item: &HashMap<String, AttributeValue>,
) -> Result<StoredRecord, InfraError> {
    let key = item
        .get(PARTITION_KEY)
        .and_then(|v| v.as_s().ok())
        .ok_or_else(|| {
            InfraError::malformed_record(format!(
                "'{collection}' のアイテムに文字列の {PARTITION_KEY} 属性がありません"
            ))
        })?;

    let has_payload = item.keys().any(|name| name != PARTITION_KEY);
    let data = has_payload.then(|| RecordData {
        owner_id:   string_attr(item, OWNER_ATTRIBUTE),
        email:      string_attr(item, "email"),
        created_at: timestamp_attr(item, "created_at"),
        updated_at: timestamp_attr(item, "updated_at"),
    });

    Ok(StoredRecord {
        handle: RecordHandle::new(collection, key.clone()),
        data,
    })
}

fn string_attr(item: &HashMap<String, AttributeValue>, name: &str) -> Option<String> {
    item.get(name).and_then(|v| v.as_s().ok()).cloned()
}

fn timestamp_attr(item: &HashMap<String, AttributeValue>, name: &str) -> Option<DateTime<Utc>> {
    let raw = string_attr(item, name)?;
    match DateTime::parse_from_rfc3339(&raw) {
        Ok(parsed) => Some(parsed.with_timezone(&Utc)),
        Err(e) => {
            tracing::warn!(attribute = name, value = %raw, error = %e, "日時属性を解釈できません");
            None
        }
    }
}
