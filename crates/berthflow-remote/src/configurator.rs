//! スタック設定のオーケストレーション
//!
//! 正規化 → カタログ反映 → 設定ファイル実体化、および削除カスケードを
//! つなぐ層。エンジン本体（berthflow-core）はI/Oを持たないため、
//! リモートへの副作用はすべてここを通ります。

use crate::configs::{DEFAULT_CONFIG_BASE, build_config_commands, stack_workdir};
use crate::error::Result;
use crate::executor::RemoteExecutor;
use crate::teardown::teardown_stack;
use berthflow_catalog::CatalogStore;
use berthflow_core::{HostRef, Normalizer, ParseOutcome, StackRef};
use tracing::info;

/// パースと設定配布をまとめるオーケストレーター
pub struct StackConfigurator<'a> {
    store: &'a dyn CatalogStore,
    executor: &'a dyn RemoteExecutor,
    config_base: String,
}

impl<'a> StackConfigurator<'a> {
    pub fn new(store: &'a dyn CatalogStore, executor: &'a dyn RemoteExecutor) -> Self {
        Self {
            store,
            executor,
            config_base: DEFAULT_CONFIG_BASE.to_string(),
        }
    }

    /// 設定配置先のベースディレクトリを差し替える
    pub fn with_config_base(mut self, base: impl Into<String>) -> Self {
        self.config_base = base.into();
        self
    }

    /// ドキュメントをパースし、結果をリモートへ実体化する
    ///
    /// 空入力のときは実体化もスキップされる。
    pub fn reparse(
        &self,
        normalizer: &Normalizer,
        stack: &StackRef,
        host: &HostRef,
        raw: &str,
        is_new: bool,
    ) -> Result<ParseOutcome> {
        let outcome = normalizer.parse(stack, host, raw, is_new)?;
        if outcome.deployable_document.is_empty() {
            return Ok(outcome);
        }

        let workdir = stack_workdir(&self.config_base, &stack.uuid);
        let envs = self.store.list_env(stack.id)?;
        let commands = build_config_commands(&workdir, &outcome.deployable_document, &envs);
        self.executor.execute(host, &commands)?;

        info!(stack = %stack.uuid, workdir = %workdir, "Materialized stack configs");
        Ok(outcome)
    }

    /// スタックを削除する
    ///
    /// 子レコードをカタログから消した後、リモートのボリュームと
    /// ネットワークをベストエフォートで破棄する。
    pub fn delete_stack(&self, stack: &StackRef, host: &HostRef) -> Result<()> {
        let volume_names = self.store.delete_stack_children(stack.id)?;
        teardown_stack(self.executor, host, &stack.uuid, &volume_names);
        Ok(())
    }
}
