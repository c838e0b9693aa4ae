//! スタック削除時のベストエフォート後始末
//!
//! 名前付きボリュームとスタック専用ネットワークをリモート側で破棄します。
//! 失敗はログに残すだけで呼び出し元へは伝播しません（削除トランザクションを
//! リモートの状態に巻き込まない）。

use crate::executor::RemoteExecutor;
use berthflow_core::HostRef;
use tracing::warn;

/// スタックのリモートリソースを破棄する
pub fn teardown_stack(
    executor: &dyn RemoteExecutor,
    host: &HostRef,
    stack_uuid: &str,
    volume_names: &[String],
) {
    let mut commands: Vec<String> = volume_names
        .iter()
        .map(|name| format!("docker volume rm -f {name}"))
        .collect();
    commands.push(format!("docker network rm {stack_uuid}"));

    if let Err(error) = executor.execute(host, &commands) {
        warn!(
            host = %host.name,
            stack = stack_uuid,
            error = %error,
            "Best-effort teardown failed"
        );
    }
}
