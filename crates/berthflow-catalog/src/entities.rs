//! カタログのデータモデル
//!
//! Composeドキュメントのパースで導出・永続化されるレコード群。
//! キー制約（name×stack_id、key×stack_id、mount_path×resource）は
//! ストア実装側で保証されます。

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Composeスタック — 1つのComposeドキュメントを所有する親レコード
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Stack {
    pub id: i64,

    /// スタック識別子（ネットワーク名・コンテナ名サフィックスに使用）
    pub uuid: String,

    pub name: String,

    /// 入力されたままのComposeドキュメント（軽い正規化のみ）
    pub compose_raw: Option<String>,

    /// デプロイ可能な完全解決済みComposeドキュメント
    pub compose_deployable: Option<String>,

    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// サブリソース種別
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ResourceKind {
    Application,
    Database,
}

impl ResourceKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Application => "application",
            Self::Database => "database",
        }
    }
}

/// リソースの稼働状態
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ResourceStatus {
    /// 作成済み・未起動（デフォルト）
    #[default]
    Exited,
    Starting,
    Running,
    Stopped,
}

/// サービス1つに対応する永続レコード（Application または Database）
///
/// `(name, stack_id)` ごとに必ず1行。再パースは find-or-create であり、
/// 重複を作ってはならない。
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ManagedResource {
    pub id: i64,
    pub name: String,
    pub kind: ResourceKind,
    pub stack_id: i64,

    /// 正規化済みイメージ参照（タグ付き）
    pub image: String,

    /// カンマ結合されたポート指定
    pub ports: String,

    pub fqdn: Option<String>,

    pub status: ResourceStatus,

    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// 環境変数レコード — `(key, stack_id)` でユニーク
///
/// 一度値付きで作成された行は、以後の再パースで値を再生成しない
/// （生成済みシークレットの安定性はこの制約に依存する）。
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EnvironmentVariable {
    pub id: i64,
    pub key: String,
    pub value: Option<String>,
    pub is_build_time: bool,
    pub is_preview: bool,
    pub stack_id: i64,
}

/// バインドマウント — `(mount_path, resource_id, resource_kind)` でユニーク
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FileMount {
    pub id: i64,

    /// コンテナ内のマウント先
    pub mount_path: String,

    /// ホスト側ソースパス
    pub fs_path: String,

    /// インラインで配布するファイル内容（任意）
    pub content: Option<String>,

    pub is_directory: bool,

    pub resource_id: i64,
    pub resource_kind: ResourceKind,
}

/// 名前付きボリューム — `(mount_path, resource_id, resource_kind)` でユニーク
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NamedVolume {
    pub id: i64,

    /// スラグ化されたボリューム名
    pub name: String,

    pub mount_path: String,

    pub resource_id: i64,
    pub resource_kind: ResourceKind,
}

/// ManagedResource 作成時の入力
#[derive(Debug, Clone)]
pub struct NewManagedResource {
    pub name: String,
    pub kind: ResourceKind,
    pub stack_id: i64,
    pub image: String,
}

/// EnvironmentVariable 作成時の入力
#[derive(Debug, Clone)]
pub struct NewEnvironmentVariable {
    pub key: String,
    pub value: Option<String>,
    pub is_build_time: bool,
    pub is_preview: bool,
    pub stack_id: i64,
}

/// FileMount upsert の入力
#[derive(Debug, Clone)]
pub struct FileMountSpec {
    pub mount_path: String,
    pub fs_path: String,
    pub content: Option<String>,
    pub is_directory: bool,
    pub resource_id: i64,
    pub resource_kind: ResourceKind,
}

/// NamedVolume upsert の入力
#[derive(Debug, Clone)]
pub struct NamedVolumeSpec {
    pub name: String,
    pub mount_path: String,
    pub resource_id: i64,
    pub resource_kind: ResourceKind,
}
