use berthflow_catalog::CatalogError;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ComposeError {
    #[error("Composeドキュメントのパースエラー: {0}")]
    Parse(#[from] serde_yaml::Error),

    #[error("不正なComposeドキュメント: {0}")]
    InvalidDocument(String),

    #[error("カタログ操作エラー: {0}")]
    Catalog(#[from] CatalogError),
}

pub type Result<T> = std::result::Result<T, ComposeError>;
