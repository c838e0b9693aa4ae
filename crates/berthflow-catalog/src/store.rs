//! カタログストアのトレイト定義
//!
//! パースエンジンはこのトレイト越しにのみ永続化層へ触れます。
//! すべての操作はフェイルファストで、リトライはストア実装・呼び出し側の責務です。

use crate::entities::*;
use crate::error::Result;

/// サブリソースカタログへのアクセス
///
/// キー制約:
/// - ManagedResource: `(name, stack_id)`
/// - EnvironmentVariable: `(key, stack_id)`
/// - FileMount / NamedVolume: `(mount_path, resource_id, resource_kind)`
pub trait CatalogStore {
    // --- Stack ---

    fn create_stack(&self, name: &str, uuid: &str) -> Result<Stack>;

    fn get_stack(&self, stack_id: i64) -> Result<Stack>;

    /// パース結果のrawドキュメントとデプロイ可能ドキュメントを保存
    fn save_stack_documents(&self, stack_id: i64, raw: &str, deployable: &str) -> Result<()>;

    // --- ManagedResource ---

    /// `(name, stack_id)` でリソースを検索。Application/Database を区別しない
    fn find_resource(&self, name: &str, stack_id: i64) -> Result<Option<ManagedResource>>;

    fn create_resource(&self, new: NewManagedResource) -> Result<ManagedResource>;

    fn list_resources(&self, stack_id: i64) -> Result<Vec<ManagedResource>>;

    /// ポート文字列はパースごとに無条件で上書きされる
    fn save_resource_ports(&self, resource_id: i64, ports: &str) -> Result<()>;

    fn save_resource_fqdn(&self, resource_id: i64, fqdn: &str) -> Result<()>;

    // --- EnvironmentVariable ---

    fn find_env(&self, key: &str, stack_id: i64) -> Result<Option<EnvironmentVariable>>;

    /// 既存行があればエラーにせずそのまま返す（作成は一度だけ）
    fn create_env(&self, new: NewEnvironmentVariable) -> Result<EnvironmentVariable>;

    /// `(key, stack_id)` で upsert。既存行の値は上書きされる
    fn upsert_env(&self, new: NewEnvironmentVariable) -> Result<EnvironmentVariable>;

    /// スタックの全環境変数をキー昇順で返す（.env 出力の決定性に使用）
    fn list_env(&self, stack_id: i64) -> Result<Vec<EnvironmentVariable>>;

    // --- FileMount / NamedVolume ---

    fn find_file_mount(
        &self,
        mount_path: &str,
        resource_id: i64,
        resource_kind: ResourceKind,
    ) -> Result<Option<FileMount>>;

    fn upsert_file_mount(&self, spec: FileMountSpec) -> Result<FileMount>;

    fn upsert_named_volume(&self, spec: NamedVolumeSpec) -> Result<NamedVolume>;

    fn list_named_volumes(&self, stack_id: i64) -> Result<Vec<NamedVolume>>;

    // --- 削除カスケード ---

    /// スタック配下の子レコードを全削除し、リモート側で破棄すべき
    /// 名前付きボリューム名の一覧を返す
    fn delete_stack_children(&self, stack_id: i64) -> Result<Vec<String>>;
}
