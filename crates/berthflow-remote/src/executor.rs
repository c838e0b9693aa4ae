//! リモート実行のトレイト定義
//!
//! デプロイ先ホストでのシェルコマンド実行を抽象化します。
//! SSH実装・エージェント実装はこのトレイトを実装してください。

use crate::error::Result;
use berthflow_core::HostRef;
use std::sync::Mutex;

/// コマンド列をホストで実行するコラボレーター
pub trait RemoteExecutor {
    /// コマンドを宣言順に実行する。途中で失敗したらエラーを返す
    fn execute(&self, host: &HostRef, commands: &[String]) -> Result<()>;
}

/// 実行せずに記録するだけの実装
///
/// テストとdry-run表示に使う。
#[derive(Debug, Default)]
pub struct RecordingExecutor {
    recorded: Mutex<Vec<(String, Vec<String>)>>,
}

impl RecordingExecutor {
    pub fn new() -> Self {
        Self::default()
    }

    /// これまでに記録された (ホスト名, コマンド列) の一覧
    pub fn recorded(&self) -> Vec<(String, Vec<String>)> {
        self.recorded
            .lock()
            .map(|r| r.clone())
            .unwrap_or_default()
    }
}

impl RemoteExecutor for RecordingExecutor {
    fn execute(&self, host: &HostRef, commands: &[String]) -> Result<()> {
        if let Ok(mut recorded) = self.recorded.lock() {
            recorded.push((host.name.clone(), commands.to_vec()));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_recording_executor_keeps_order() {
        let executor = RecordingExecutor::new();
        let host = HostRef {
            name: "berth-01".to_string(),
            ip: "203.0.113.10".to_string(),
        };

        executor
            .execute(&host, &["mkdir -p /x".to_string(), "cd /x".to_string()])
            .unwrap();
        executor.execute(&host, &["touch .env".to_string()]).unwrap();

        let recorded = executor.recorded();
        assert_eq!(recorded.len(), 2);
        assert_eq!(recorded[0].1[0], "mkdir -p /x");
        assert_eq!(recorded[1].1[0], "touch .env");
    }
}
