//! Compose設定ファイルの実体化
//!
//! デプロイ可能ドキュメントと `.env` をスタックの作業ディレクトリへ
//! 書き込むコマンド列を組み立てます。Composeドキュメントはクォート事故を
//! 避けるためbase64往復で書き込みます。

use base64::Engine as _;
use base64::engine::general_purpose::STANDARD;
use berthflow_catalog::EnvironmentVariable;

/// スタック設定のデフォルト配置先
pub const DEFAULT_CONFIG_BASE: &str = "/data/berthflow/stacks";

/// スタックの作業ディレクトリ（`{base}/{uuid}`）
pub fn stack_workdir(base: &str, uuid: &str) -> String {
    format!("{base}/{uuid}")
}

/// compose/.env を書き込むコマンド列を組み立てる
///
/// `.env` は毎回作り直す。環境変数が1つも無い場合は空ファイルを置く。
pub fn build_config_commands(
    workdir: &str,
    compose_yaml: &str,
    envs: &[EnvironmentVariable],
) -> Vec<String> {
    let mut commands = vec![format!("mkdir -p {workdir}"), format!("cd {workdir}")];

    let encoded = STANDARD.encode(compose_yaml.as_bytes());
    commands.push(format!("echo {encoded} | base64 -d > docker-compose.yml"));

    commands.push("rm -f .env || true".to_string());
    for env in envs {
        let value = env.value.as_deref().unwrap_or_default();
        commands.push(format!("echo '{}={}' >> .env", env.key, value));
    }
    if envs.is_empty() {
        commands.push("touch .env".to_string());
    }

    commands
}
