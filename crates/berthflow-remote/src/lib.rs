//! Berthflow リモート実行層
//!
//! 正規化エンジンの出力をデプロイ先ホストへ実体化する薄い層です。
//! シェルコマンド列を [`RemoteExecutor`] 越しに実行するだけで、
//! オーケストレーションは行いません。

pub mod configs;
pub mod configurator;
pub mod error;
pub mod executor;
pub mod teardown;

// Re-exports
pub use configs::{build_config_commands, stack_workdir};
pub use configurator::StackConfigurator;
pub use error::{RemoteError, Result};
pub use executor::{RecordingExecutor, RemoteExecutor};
pub use teardown::teardown_stack;
