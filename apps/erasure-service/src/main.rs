//! # Erasure Service サーバー
//!
//! プリンシパル（アカウント）単位でデータを全ストアから消去する内部サービス。
//!
//! ## 役割
//!
//! - **消去**: 本人確認の後、レコードストア（DynamoDB）とブロブストア（S3）から
//!   プリンシパルのデータを宣言順に削除する
//! - **見積もり**: 消去されるアイテム数を削除せずに数える
//!
//! ```text
//! ┌──────────────┐     ┌─────────────────┐     ┌──────────────┐
//! │   Gateway    │────▶│ Erasure Service │────▶│   DynamoDB   │
//! └──────────────┘     └─────────────────┘     └──────────────┘
//!   X-User-ID を付与            │              ┌──────────────┐
//!                               └─────────────▶│      S3      │
//!                                              └──────────────┘
//! ```
//!
//! 環境変数は [`erasure_service::config`] を参照。
//!
//! ## 起動方法
//!
//! ```bash
//! # 開発環境（DynamoDB Local / MinIO）
//! ERASURE_PORT=13100 DYNAMODB_ENDPOINT_URL=http://localhost:18000 \
//!   S3_ENDPOINT_URL=http://localhost:19000 S3_BUCKET_NAME=erasure-dev \
//!   cargo run -p erasure-service
//! ```

use std::{net::SocketAddr, sync::Arc};

use erasure_domain::{
    catalog::{DEFAULT_COLLECTIONS, DEFAULT_PREFIXES},
    clock::SystemClock,
};
use erasure_infra::{
    BlobStore,
    DynamoDbRecordStore,
    RecordStore,
    S3BlobStore,
    deletion::{BlobEraser, BlobWorkerPool, RecordEraser},
    dynamodb,
    s3,
};
use erasure_service::{
    config::ErasureConfig,
    handler::{ErasureState, router},
    usecase::{ErasureUseCaseImpl, EstimationUseCaseImpl, IdentityVerifier},
};
use erasure_shared::observability::{TracingConfig, init_tracing};
use tokio::net::TcpListener;
use tower_http::trace::TraceLayer;

/// Erasure Service サーバーのエントリーポイント
#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // .env ファイルを読み込む（存在する場合）
    dotenvy::dotenv().ok();

    init_tracing(TracingConfig::from_env("erasure-service"));

    let config = ErasureConfig::from_env()?;

    tracing::info!(
        "Erasure Service サーバーを起動します: {}:{}",
        config.host,
        config.port
    );

    // レコードストア
    let dynamodb_client = dynamodb::create_client(config.dynamodb_endpoint_url.as_deref()).await;
    let record_store = DynamoDbRecordStore::new(dynamodb_client.clone(), &config.record_table_prefix);

    // ローカルエンドポイントではテーブルを用意する（本番のテーブルはインフラ側で管理）
    if config.dynamodb_endpoint_url.is_some() {
        for spec in &DEFAULT_COLLECTIONS {
            dynamodb::ensure_collection_table(
                &dynamodb_client,
                &record_store.table_name(spec.collection),
                spec.owner_field(),
            )
            .await?;
        }
        dynamodb::ensure_collection_table(
            &dynamodb_client,
            &record_store.table_name(&config.account_collection),
            None,
        )
        .await?;
        tracing::info!("DynamoDB テーブルを確認しました");
    }

    let record_store: Arc<dyn RecordStore> = Arc::new(record_store);

    // ブロブストア（バケット未設定なら利用不可として起動する）
    let blob_store: Option<Arc<dyn BlobStore>> = match &config.s3_bucket_name {
        Some(bucket) => {
            let s3_client = s3::create_client(config.s3_endpoint_url.as_deref()).await;
            Some(Arc::new(S3BlobStore::new(s3_client, bucket)))
        }
        None => {
            tracing::warn!("S3_BUCKET_NAME が未設定のため、ブロブストアは利用できません");
            None
        }
    };

    let pool = Arc::new(BlobWorkerPool::new(config.blob_workers)?);
    let record_eraser = Arc::new(RecordEraser::new(record_store.clone(), DEFAULT_COLLECTIONS));
    let blob_eraser = Arc::new(BlobEraser::new(blob_store, DEFAULT_PREFIXES, pool));

    let erasure = ErasureUseCaseImpl::new(
        IdentityVerifier::new(record_store, config.account_collection.clone()),
        record_eraser.clone(),
        blob_eraser.clone(),
        Arc::new(SystemClock),
    );
    let estimation = EstimationUseCaseImpl::new(record_eraser, blob_eraser);

    let state = Arc::new(ErasureState {
        erasure:    Arc::new(erasure),
        estimation: Arc::new(estimation),
    });

    let app = router(state).layer(TraceLayer::new_for_http());

    let addr: SocketAddr = format!("{}:{}", config.host, config.port).parse()?;
    let listener = TcpListener::bind(addr).await?;
    tracing::info!("Erasure Service サーバーが起動しました: {}", addr);

    axum::serve(listener, app).await?;

    Ok(())
}
