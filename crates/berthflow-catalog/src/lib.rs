//! Berthflow サービスカタログ
//!
//! Composeスタックから導出されたサブリソース（アプリケーション/データベース
//! レコード、環境変数、バインドマウント、名前付きボリューム）の永続化層です。
//! ストア実装は [`CatalogStore`] トレイト越しに差し替え可能で、
//! テストとCLIにはインメモリ実装 [`MemoryCatalog`] を提供します。

pub mod entities;
pub mod error;
pub mod memory;
pub mod store;

// Re-exports
pub use entities::*;
pub use error::{CatalogError, Result};
pub use memory::MemoryCatalog;
pub use store::CatalogStore;
