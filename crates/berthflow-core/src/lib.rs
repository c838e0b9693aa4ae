//! Berthflow Compose正規化エンジン
//!
//! ユーザーが持ち込んだ（不完全かもしれない）Composeドキュメントから、
//! デプロイ可能な完全解決済みドキュメントとサブリソースカタログを
//! 決定論的に導出します。
//!
//! パイプライン:
//! raw YAML → パース → サービスごとに
//! ボリューム/ネットワーク分類 → 環境変数解決（シークレット生成・トークン置換）
//! → ラベル合成 → カタログ同期 → 最終ドキュメント組み立て
//!
//! エンジン自体は同期実行で、1回のパースの中にサスペンションポイントを
//! 持ちません。同一スタックの並行パースの直列化は呼び出し側の責務です。

pub mod database;
pub mod error;
pub mod generate;
pub mod labels;
pub mod model;
pub mod normalize;
pub mod substitute;
pub mod sync;
mod envres;
mod util;

// Re-exports
pub use database::is_database_image;
pub use error::{ComposeError, Result};
pub use generate::{DomainResolver, RandomGenerator, SslipResolver, ValueGenerator};
pub use model::{ComposeDocument, EnvEntry, HostRef, PortEntry, RestartPolicy, StackRef,
    VolumeEntry, VolumeKind};
pub use normalize::{Normalizer, ParseOutcome};
