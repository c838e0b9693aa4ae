use thiserror::Error;

#[derive(Error, Debug)]
pub enum CatalogError {
    #[error("スタックが見つかりません: id={0}")]
    StackNotFound(i64),

    #[error("リソースが見つかりません: id={0}")]
    ResourceNotFound(i64),

    #[error("カタログストアにアクセスできません: {0}")]
    Store(String),
}

pub type Result<T> = std::result::Result<T, CatalogError>;
