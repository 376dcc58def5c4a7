//! # DynamoDB 接続管理
//!
//! レコードストアとして使う Amazon DynamoDB への接続管理を行う。
//!
//! ## テーブル構成
//!
//! 論理コレクション 1 つにつき 1 テーブル（`{table_prefix}{collection}`）。
//!
//! - PK: `id` (String)。プリンシパルキーのコレクションではプリンシパル ID そのもの
//! - GSI: オーナーフィールドで検索するコレクションは `{owner_field}-index`
//!
//! ## 使用例
//!
//! ```rust,ignore
//! use erasure_infra::dynamodb;
//!
//! async fn setup() -> Result<(), Box<dyn std::error::Error>> {
//!     let client = dynamodb::create_client(Some("http://localhost:18000")).await;
//!     dynamodb::ensure_collection_table(&client, "disposal-history", Some("user_id")).await?;
//!     Ok(())
//! }
//! ```

use aws_sdk_dynamodb::{
    Client,
    types::{
        AttributeDefinition,
        BillingMode,
        GlobalSecondaryIndex,
        KeySchemaElement,
        KeyType,
        Projection,
        ProjectionType,
        ScalarAttributeType,
    },
};

use crate::InfraError;

/// テーブルのパーティションキー名
pub const PARTITION_KEY: &str = "id";

/// オーナーフィールドの GSI 名を返す
pub fn owner_index_name(owner_field: &str) -> String {
    format!("{owner_field}-index")
}

/// DynamoDB クライアントを作成する
///
/// `endpoint` が `Some` の場合は DynamoDB Local に接続する。認証情報はダミー値を使用する
/// （DynamoDB Local の `-sharedDb` モードでは認証情報を検証しない）。
/// `None` の場合は SDK のデフォルト認証チェーンで AWS に接続する。
pub async fn create_client(endpoint: Option<&str>) -> Client {
    let mut config_builder = aws_config::defaults(aws_config::BehaviorVersion::latest())
        .region(aws_config::Region::new("ap-northeast-1"));

    if let Some(endpoint_url) = endpoint {
        config_builder = config_builder
            .endpoint_url(endpoint_url)
            // DynamoDB Local はクレデンシャルを検証しないが、SDK はプロバイダが必要
            .credentials_provider(aws_sdk_dynamodb::config::Credentials::new(
                "local", "local", None, None, "local",
            ));
    }

    let config = config_builder.load().await;
    Client::new(&config)
}

/// コレクションのテーブルが存在しなければ作成する（冪等）
///
/// ローカル開発・結合テスト用。本番のテーブルは IaC で管理する。
///
/// # 引数
///
/// * `client` - DynamoDB クライアント
/// * `table_name` - テーブル名
/// * `owner_field` - GSI を張るオーナーフィールド（プリンシパルキーのコレクションは `None`）
pub async fn ensure_collection_table(
    client: &Client,
    table_name: &str,
    owner_field: Option<&str>,
) -> Result<(), InfraError> {
    match client.describe_table().table_name(table_name).send().await {
        Ok(_) => {
            tracing::debug!("テーブル '{}' は既に存在します", table_name);
            return Ok(());
        }
        Err(err) => {
            // ResourceNotFoundException の場合のみテーブル作成に進む
            let not_found = err
                .as_service_error()
                .map(|e| e.is_resource_not_found_exception())
                .unwrap_or(false);
            if !not_found {
                return Err(InfraError::dynamo_db(format!(
                    "テーブル '{table_name}' の確認に失敗: {err}"
                )));
            }
        }
    }

    tracing::info!("テーブル '{}' を作成します", table_name);

    let mut request = client
        .create_table()
        .table_name(table_name)
        .key_schema(hash_key(PARTITION_KEY)?)
        .attribute_definitions(string_attribute(PARTITION_KEY)?)
        .billing_mode(BillingMode::PayPerRequest);

    if let Some(field) = owner_field {
        let index = GlobalSecondaryIndex::builder()
            .index_name(owner_index_name(field))
            .key_schema(hash_key(field)?)
            .projection(
                Projection::builder()
                    .projection_type(ProjectionType::KeysOnly)
                    .build(),
            )
            .build()
            .map_err(|e| InfraError::dynamo_db(format!("GSI 構築エラー: {e}")))?;

        request = request
            .attribute_definitions(string_attribute(field)?)
            .global_secondary_indexes(index);
    }

    if let Err(err) = request.send().await {
        // ResourceInUseException は並行呼び出し時に発生しうる（テーブルが作成中）
        let in_use = err
            .as_service_error()
            .map(|e| e.is_resource_in_use_exception())
            .unwrap_or(false);
        if !in_use {
            return Err(InfraError::dynamo_db(format!(
                "テーブル '{table_name}' の作成に失敗: {err}"
            )));
        }
        tracing::debug!(
            "テーブル '{}' は既に作成中または存在します（ResourceInUseException）",
            table_name
        );
        return Ok(());
    }

    tracing::info!("テーブル '{}' を作成しました", table_name);
    Ok(())
}

fn hash_key(name: &str) -> Result<KeySchemaElement, InfraError> {
    KeySchemaElement::builder()
        .attribute_name(name)
        .key_type(KeyType::Hash)
        .build()
        .map_err(|e| InfraError::dynamo_db(format!("KeySchema 構築エラー: {e}")))
}

fn string_attribute(name: &str) -> Result<AttributeDefinition, InfraError> {
    AttributeDefinition::builder()
        .attribute_name(name)
        .attribute_type(ScalarAttributeType::S)
        .build()
        .map_err(|e| InfraError::dynamo_db(format!("AttributeDefinition 構築エラー: {e}")))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_gsi名はオーナーフィールドにindexを付ける() {
        assert_eq!(owner_index_name("user_id"), "user_id-index");
    }

    #[test]
    fn test_キー定義を構築できる() {
        let key = hash_key(PARTITION_KEY).unwrap();
        assert_eq!(key.attribute_name(), "id");
        assert_eq!(key.key_type(), &KeyType::Hash);
    }
}
