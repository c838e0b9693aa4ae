//! モデル定義
//!
//! Composeドキュメントと、その中の揺れのあるエントリ形状
//! （文字列/構造化のポート・ボリューム・環境変数）を
//! パース入口で一度だけタグ付きの型へ解決します。

mod compose;
mod env;
mod port;
mod stack;
mod volume;

// Re-exports
pub use compose::*;
pub use env::*;
pub use port::*;
pub use stack::*;
pub use volume::*;
