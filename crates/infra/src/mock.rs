//! # テスト用インメモリストア
//!
//! ユースケーステスト・ハンドラテストで使用するインメモリのレコードストア・ブロブストア。
//! `test-utils` feature を有効にすることで、他クレートからも利用可能。
//!
//! ```toml
//! [dev-dependencies]
//! erasure-infra = { workspace = true, features = ["test-utils"] }
//! ```
//!
//! どちらのストアも失敗注入と操作ログを持ち、「どのストアに触れたか」を検証できる。
//! `Clone` は内部状態を共有する（テスト側でハンドルを保持したまま `Arc<dyn ...>` に渡せる）。

use std::{
    collections::{BTreeSet, HashSet},
    sync::{Arc, Mutex},
};

use async_trait::async_trait;
use erasure_domain::principal::Principal;

use crate::{
    blob_store::{BlobHandle, BlobStore},
    error::InfraError,
    record_store::{OWNER_ATTRIBUTE, RecordData, RecordHandle, RecordStore, StoredRecord},
};

// ===== InMemoryRecordStore =====

/// レコードストアに対して行われた操作
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StoreOperation {
    Query { collection: String },
    Get { collection: String, key: String },
    Delete { collection: String, key: String },
}

impl StoreOperation {
    /// 操作対象のコレクション
    pub fn collection(&self) -> Option<&str> {
        match self {
            Self::Query { collection }
            | Self::Get { collection, .. }
            | Self::Delete { collection, .. } => Some(collection),
        }
    }
}

#[derive(Debug, Clone)]
struct MemoryRecord {
    handle: RecordHandle,
    owner:  Option<(String, String)>,
    data:   Option<RecordData>,
}

#[derive(Default)]
struct RecordState {
    records:         Vec<MemoryRecord>,
    failing_deletes: HashSet<RecordHandle>,
    failing_reads:   HashSet<String>,
    operations:      Vec<StoreOperation>,
}

#[derive(Clone, Default)]
pub struct InMemoryRecordStore {
    state: Arc<Mutex<RecordState>>,
}

impl InMemoryRecordStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// オーナーフィールドを持つレコードを追加する
    pub fn insert_owned(&self, collection: &str, key: &str, owner_field: &str, owner: &str) {
        let data = RecordData {
            owner_id: Some(owner.to_string()),
            ..RecordData::default()
        };
        self.push(MemoryRecord {
            handle: RecordHandle::new(collection, key),
            owner:  Some((owner_field.to_string(), owner.to_string())),
            data:   Some(data),
        });
    }

    /// プリンシパル ID をキーとするレコードを追加する
    pub fn insert_keyed(&self, collection: &str, principal: &str) {
        let data = RecordData {
            owner_id: Some(principal.to_string()),
            ..RecordData::default()
        };
        self.push(MemoryRecord {
            handle: RecordHandle::new(collection, principal),
            owner:  Some((OWNER_ATTRIBUTE.to_string(), principal.to_string())),
            data:   Some(data),
        });
    }

    /// アカウントレコードを追加する（`email` が `None` なら認証情報なし）
    pub fn insert_account(&self, collection: &str, principal: &str, email: Option<&str>) {
        let data = RecordData {
            owner_id: Some(principal.to_string()),
            email: email.map(String::from),
            ..RecordData::default()
        };
        self.push(MemoryRecord {
            handle: RecordHandle::new(collection, principal),
            owner:  None,
            data:   Some(data),
        });
    }

    /// ペイロードを持たないレコードを追加する
    pub fn insert_without_payload(&self, collection: &str, key: &str) {
        self.push(MemoryRecord {
            handle: RecordHandle::new(collection, key),
            owner:  None,
            data:   None,
        });
    }

    /// 指定レコードの削除を失敗させる
    pub fn fail_delete_of(&self, collection: &str, key: &str) {
        self.lock()
            .failing_deletes
            .insert(RecordHandle::new(collection, key));
    }

    /// 指定コレクションの読み取り（検索・取得）を失敗させる
    pub fn fail_queries_on(&self, collection: &str) {
        self.lock().failing_reads.insert(collection.to_string());
    }

    /// コレクションのレコード件数
    pub fn len(&self, collection: &str) -> usize {
        self.lock()
            .records
            .iter()
            .filter(|r| r.handle.collection == collection)
            .count()
    }

    /// 全レコード件数
    pub fn total_len(&self) -> usize {
        self.lock().records.len()
    }

    /// 記録された操作（発生順）
    pub fn operations(&self) -> Vec<StoreOperation> {
        self.lock().operations.clone()
    }

    fn push(&self, record: MemoryRecord) {
        self.lock().records.push(record);
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, RecordState> {
        self.state.lock().unwrap()
    }
}

#[async_trait]
impl RecordStore for InMemoryRecordStore {
    async fn query_by_owner(
        &self,
        collection: &str,
        owner_field: &str,
        principal: &Principal,
    ) -> Result<Vec<StoredRecord>, InfraError> {
        let mut state = self.lock();
        state.operations.push(StoreOperation::Query {
            collection: collection.to_string(),
        });
        if state.failing_reads.contains(collection) {
            return Err(InfraError::dynamo_db(format!("'{collection}' の検索に失敗")));
        }

        Ok(state
            .records
            .iter()
            .filter(|r| r.handle.collection == collection)
            .filter(|r| {
                r.owner
                    .as_ref()
                    .is_some_and(|(field, value)| field == owner_field && value == principal.as_str())
            })
            .map(|r| StoredRecord {
                handle: r.handle.clone(),
                data:   r.data.clone(),
            })
            .collect())
    }

    async fn get_by_key(
        &self,
        collection: &str,
        key: &str,
    ) -> Result<Option<StoredRecord>, InfraError> {
        let mut state = self.lock();
        state.operations.push(StoreOperation::Get {
            collection: collection.to_string(),
            key:        key.to_string(),
        });
        if state.failing_reads.contains(collection) {
            return Err(InfraError::dynamo_db(format!("'{collection}' の取得に失敗")));
        }

        Ok(state
            .records
            .iter()
            .find(|r| r.handle.collection == collection && r.handle.key == key)
            .map(|r| StoredRecord {
                handle: r.handle.clone(),
                data:   r.data.clone(),
            }))
    }

    async fn delete(&self, handle: &RecordHandle) -> Result<(), InfraError> {
        let mut state = self.lock();
        state.operations.push(StoreOperation::Delete {
            collection: handle.collection.clone(),
            key:        handle.key.clone(),
        });
        if state.failing_deletes.contains(handle) {
            return Err(InfraError::dynamo_db(format!(
                "'{}' のレコード {} の削除に失敗",
                handle.collection, handle.key
            )));
        }

        state.records.retain(|r| &r.handle != handle);
        Ok(())
    }
}

// ===== InMemoryBlobStore =====

#[derive(Default)]
struct BlobState {
    keys:            BTreeSet<String>,
    failing_deletes: HashSet<String>,
    failing_lists:   HashSet<String>,
    thread_names:    Vec<Option<String>>,
}

#[derive(Clone, Default)]
pub struct InMemoryBlobStore {
    state: Arc<Mutex<BlobState>>,
}

impl InMemoryBlobStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// ブロブを追加する
    pub fn put(&self, key: &str) {
        self.lock().keys.insert(key.to_string());
    }

    /// 指定ブロブの削除を失敗させる
    pub fn fail_delete_of(&self, key: &str) {
        self.lock().failing_deletes.insert(key.to_string());
    }

    /// 指定プレフィックスの列挙を失敗させる
    pub fn fail_list_of(&self, prefix: &str) {
        self.lock().failing_lists.insert(prefix.to_string());
    }

    /// 残っているブロブのキー（昇順）
    pub fn keys(&self) -> Vec<String> {
        self.lock().keys.iter().cloned().collect()
    }

    pub fn len(&self) -> usize {
        self.lock().keys.len()
    }

    pub fn is_empty(&self) -> bool {
        self.lock().keys.is_empty()
    }

    /// 各操作を実行したスレッドの名前（発生順）
    pub fn thread_names(&self) -> Vec<Option<String>> {
        self.lock().thread_names.clone()
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, BlobState> {
        self.state.lock().unwrap()
    }

    /// ストア操作として実行スレッドを記録してロックする
    fn lock_for_operation(&self) -> std::sync::MutexGuard<'_, BlobState> {
        let mut state = self.lock();
        state
            .thread_names
            .push(std::thread::current().name().map(String::from));
        state
    }
}

#[async_trait]
impl BlobStore for InMemoryBlobStore {
    async fn list_by_prefix(&self, prefix: &str) -> Result<Vec<BlobHandle>, InfraError> {
        let state = self.lock_for_operation();
        if state.failing_lists.contains(prefix) {
            return Err(InfraError::s3(format!("'{prefix}' の一覧の取得に失敗")));
        }

        Ok(state
            .keys
            .iter()
            .filter(|key| key.starts_with(prefix))
            .map(BlobHandle::new)
            .collect())
    }

    async fn delete(&self, handle: &BlobHandle) -> Result<(), InfraError> {
        let mut state = self.lock_for_operation();
        if state.failing_deletes.contains(&handle.key) {
            return Err(InfraError::s3(format!("{} の削除に失敗", handle.key)));
        }

        state.keys.remove(&handle.key);
        Ok(())
    }
}
