//! カタログ同期
//!
//! 変換ロジックが算出した形をストアへ突き合わせる層。
//! find-or-create と upsert のみで、値の計算はここでは行いません。

use crate::error::Result;
use crate::model::{PortEntry, VolumeEntry};
use crate::util::slugify;
use berthflow_catalog::{
    CatalogStore, FileMountSpec, ManagedResource, NamedVolumeSpec, NewManagedResource,
    ResourceKind,
};
use tracing::debug;

/// `(name, stack_id)` のManagedResourceを取得、無ければ作成する
///
/// 再パースで重複行を作らないことがこの関数の不変条件。
pub fn ensure_resource(
    store: &dyn CatalogStore,
    name: &str,
    stack_id: i64,
    kind: ResourceKind,
    image: &str,
) -> Result<ManagedResource> {
    if let Some(existing) = store.find_resource(name, stack_id)? {
        return Ok(existing);
    }
    debug!(name, kind = kind.as_str(), "Registering new managed resource");
    Ok(store.create_resource(NewManagedResource {
        name: name.to_string(),
        kind,
        stack_id,
        image: image.to_string(),
    })?)
}

/// 収集したポートをカンマ結合の保存表記へ変換する
pub fn render_ports(ports: &[PortEntry]) -> String {
    ports
        .iter()
        .map(PortEntry::render)
        .collect::<Vec<_>>()
        .join(",")
}

/// バインドマウントをupsertする
///
/// 同じマウントパスに保存済みのレコードがある場合、その content /
/// is_directory が再宣言より優先される（永続化済みの内容が勝つ）。
pub fn sync_bind_mount(
    store: &dyn CatalogStore,
    resource: &ManagedResource,
    entry: &VolumeEntry,
) -> Result<()> {
    let stored = store.find_file_mount(&entry.target, resource.id, resource.kind)?;
    let (content, is_directory) = match stored {
        Some(found) => (found.content, found.is_directory),
        None => (entry.content.clone(), entry.is_directory),
    };

    store.upsert_file_mount(FileMountSpec {
        mount_path: entry.target.clone(),
        fs_path: entry.source.clone(),
        content,
        is_directory,
        resource_id: resource.id,
        resource_kind: resource.kind,
    })?;
    Ok(())
}

/// 名前付きボリュームをupsertし、スラグ化した名前を返す
pub fn sync_named_volume(
    store: &dyn CatalogStore,
    resource: &ManagedResource,
    entry: &VolumeEntry,
) -> Result<String> {
    let name = slugify(&entry.source);
    store.upsert_named_volume(NamedVolumeSpec {
        name: name.clone(),
        mount_path: entry.target.clone(),
        resource_id: resource.id,
        resource_kind: resource.kind,
    })?;
    Ok(name)
}
