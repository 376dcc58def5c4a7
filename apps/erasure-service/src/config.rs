//! # 消去サービス設定
//!
//! 環境変数から消去サービスの設定を読み込む。
//!
//! ## 環境変数
//!
//! | 変数名 | 必須 | 説明 |
//! |--------|------|------|
//! | `ERASURE_HOST` | No | バインドアドレス（デフォルト: `0.0.0.0`） |
//! | `ERASURE_PORT` | **Yes** | ポート番号 |
//! | `DYNAMODB_ENDPOINT_URL` | No | DynamoDB Local のエンドポイント（未設定で AWS デフォルト） |
//! | `RECORD_TABLE_PREFIX` | No | テーブル名のプレフィックス（デフォルト: 空） |
//! | `ERASURE_ACCOUNT_COLLECTION` | No | 本人確認で参照するコレクション（デフォルト: `accounts`） |
//! | `S3_ENDPOINT_URL` | No | MinIO 等のエンドポイント（未設定で AWS S3 デフォルト） |
//! | `S3_BUCKET_NAME` | No | バケット名（未設定ならブロブストアは利用不可） |
//! | `ERASURE_BLOB_WORKERS` | No | ブロブ用ワーカースレッド数（デフォルト: `2`） |
//! | `LOG_FORMAT` | No | `json` / `pretty`（デフォルト: `pretty`） |

use std::env;

use thiserror::Error;

/// 設定読み込みエラー
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("{0} が設定されていません")]
    Missing(&'static str),

    #[error("{name} の値が不正です: {value}")]
    Invalid { name: &'static str, value: String },
}

/// 消去サービスの設定
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ErasureConfig {
    /// バインドアドレス
    pub host: String,
    /// ポート番号
    pub port: u16,
    /// DynamoDB エンドポイント URL
    pub dynamodb_endpoint_url: Option<String>,
    /// テーブル名のプレフィックス
    pub record_table_prefix: String,
    /// 本人確認用アカウントのコレクション名
    pub account_collection: String,
    /// S3 エンドポイント URL
    pub s3_endpoint_url: Option<String>,
    /// S3 バケット名（`None` ならブロブストアは利用不可）
    pub s3_bucket_name: Option<String>,
    /// ブロブ用ワーカースレッド数
    pub blob_workers: usize,
}

impl ErasureConfig {
    /// 環境変数から設定を読み込む
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|name| env::var(name).ok())
    }

    /// 任意の参照関数から設定を読み込む
    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let non_empty = |name: &str| lookup(name).filter(|v| !v.trim().is_empty());

        let port_raw = non_empty("ERASURE_PORT").ok_or(ConfigError::Missing("ERASURE_PORT"))?;
        let port = port_raw.parse().map_err(|_| ConfigError::Invalid {
            name:  "ERASURE_PORT",
            value: port_raw.clone(),
        })?;

        let blob_workers = match non_empty("ERASURE_BLOB_WORKERS") {
            Some(raw) => match raw.parse::<usize>() {
                Ok(n) if n >= 1 => n,
                _ => {
                    return Err(ConfigError::Invalid {
                        name:  "ERASURE_BLOB_WORKERS",
                        value: raw,
                    });
                }
            },
            None => 2,
        };

        Ok(Self {
            host: non_empty("ERASURE_HOST").unwrap_or_else(|| "0.0.0.0".to_string()),
            port,
            dynamodb_endpoint_url: non_empty("DYNAMODB_ENDPOINT_URL"),
            record_table_prefix: lookup("RECORD_TABLE_PREFIX").unwrap_or_default(),
            account_collection: non_empty("ERASURE_ACCOUNT_COLLECTION")
                .unwrap_or_else(|| "accounts".to_string()),
            s3_endpoint_url: non_empty("S3_ENDPOINT_URL"),
            s3_bucket_name: non_empty("S3_BUCKET_NAME"),
            blob_workers,
        })
    }
}
