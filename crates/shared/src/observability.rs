//! # ログ出力の初期化
//!
//! 消去サービスのログは、誰のデータをどのストアから消したかを後から追えることが
//! 求められる。本番では集約基盤に流す JSON、手元では読みやすいテキストで出す。
//!
//! | 変数 | 用途 | 既定値 |
//! |------|------|--------|
//! | `LOG_FORMAT` | `json` / `pretty` | `pretty` |
//! | `RUST_LOG` | レベルフィルタ | [`DEFAULT_LOG_FILTER`] |
//!
//! 購読者の組み立て（[`init_tracing`]）は `observability` フィーチャーを有効にした
//! バイナリだけが使う。

/// `RUST_LOG` 未設定時のフィルタ
pub const DEFAULT_LOG_FILTER: &str = "info,erasure=debug";

/// ログの出力形式
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LogFormat {
    /// 1 行 1 イベントの JSON
    Json,
    #[default]
    Pretty,
}

impl LogFormat {
    /// `LOG_FORMAT` の値を解釈する
    ///
    /// 知らない値は起動を止めずに `Pretty` として扱い、stderr に一行残す。
    /// 購読者の初期化前なので tracing には出せない。
    pub fn parse(value: &str) -> Self {
        match value {
            "json" => Self::Json,
            "pretty" => Self::Pretty,
            other => {
                eprintln!("LOG_FORMAT={other:?} は解釈できないため pretty で出力します");
                Self::Pretty
            }
        }
    }

    pub fn from_env() -> Self {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        lookup("LOG_FORMAT").map_or_else(Self::default, |value| Self::parse(&value))
    }
}

/// [`init_tracing`] に渡す設定
#[derive(Debug, Clone)]
pub struct TracingConfig {
    /// 起動ログに載せるサービス名
    pub service_name: String,
    pub log_format:   LogFormat,
}

impl TracingConfig {
    pub fn new(service_name: impl Into<String>, log_format: LogFormat) -> Self {
        Self {
            service_name: service_name.into(),
            log_format,
        }
    }

    pub fn from_env(service_name: impl Into<String>) -> Self {
        Self::new(service_name, LogFormat::from_env())
    }
}

/// グローバルな購読者を登録する
///
/// フィルタ、出力形式に応じたフォーマッタ、`tracing_error::ErrorLayer` の 3 層を重ねる。
/// `ErrorLayer` がないと `InfraError` の `SpanTrace` は空になり、
/// 失敗したストアやプリンシパルがエラーから辿れない。
///
/// プロセスで一度だけ呼ぶこと（2 回目は panic する）。
#[cfg(feature = "observability")]
pub fn init_tracing(config: TracingConfig) {
    use tracing_subscriber::{EnvFilter, Layer as _, fmt, layer::SubscriberExt, util::SubscriberInitExt};

    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_LOG_FILTER));

    // JSON ではイベントのフィールドをトップレベルに展開し、
    // 直近のスパン（principal, store を持つ）だけを添える
    let formatter = match config.log_format {
        LogFormat::Json => fmt::layer()
            .json()
            .flatten_event(true)
            .with_current_span(true)
            .with_span_list(false)
            .boxed(),
        LogFormat::Pretty => fmt::layer().boxed(),
    };

    tracing_subscriber::registry()
        .with(filter)
        .with(formatter)
        .with(tracing_error::ErrorLayer::default())
        .init();

    tracing::info!(
        service = %config.service_name,
        log_format = ?config.log_format,
        "ログ出力を初期化しました"
    );
}
