use berthflow_catalog::CatalogError;
use berthflow_core::ComposeError;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum RemoteError {
    #[error("リモートコマンドの実行エラー: {host}\n理由: {message}")]
    Execution { host: String, message: String },

    #[error("カタログ操作エラー: {0}")]
    Catalog(#[from] CatalogError),

    #[error("Compose正規化エラー: {0}")]
    Compose(#[from] ComposeError),
}

pub type Result<T> = std::result::Result<T, RemoteError>;
