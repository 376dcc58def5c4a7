//! # Clock（時刻プロバイダ）
//!
//! 消去結果の完了時刻（`completed_at`）を決める時刻源の抽象化。
//! テストでは固定時刻を注入し、結果のタイムスタンプを検証可能にする。

use chrono::{DateTime, Utc};

/// 現在時刻（UTC）を提供するトレイト
pub trait Clock: Send + Sync {
    fn now(&self) -> DateTime<Utc>;
}

/// 実際のシステム時刻を返す実装
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }
}

/// 固定時刻を返すテスト用実装
pub struct FixedClock {
    now: DateTime<Utc>,
}

impl FixedClock {
    pub fn new(now: DateTime<Utc>) -> Self {
        Self { now }
    }
}

impl Clock for FixedClock {
    fn now(&self) -> DateTime<Utc> {
        self.now
    }
}
