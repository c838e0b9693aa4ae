//! インメモリカタログ実装
//!
//! CLIの単発実行とテストで使用します。外部データベースを使う場合は
//! 同じ [`CatalogStore`] を実装してください。

use crate::entities::*;
use crate::error::{CatalogError, Result};
use crate::store::CatalogStore;
use chrono::Utc;
use std::sync::{Mutex, MutexGuard};
use tracing::debug;

#[derive(Debug, Default)]
struct Inner {
    next_id: i64,
    stacks: Vec<Stack>,
    resources: Vec<ManagedResource>,
    envs: Vec<EnvironmentVariable>,
    file_mounts: Vec<FileMount>,
    named_volumes: Vec<NamedVolume>,
}

impl Inner {
    fn next_id(&mut self) -> i64 {
        self.next_id += 1;
        self.next_id
    }
}

/// インメモリの [`CatalogStore`]
#[derive(Debug, Default)]
pub struct MemoryCatalog {
    inner: Mutex<Inner>,
}

impl MemoryCatalog {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> Result<MutexGuard<'_, Inner>> {
        self.inner
            .lock()
            .map_err(|e| CatalogError::Store(e.to_string()))
    }
}

impl CatalogStore for MemoryCatalog {
    fn create_stack(&self, name: &str, uuid: &str) -> Result<Stack> {
        let mut inner = self.lock()?;
        let now = Utc::now();
        let stack = Stack {
            id: inner.next_id(),
            uuid: uuid.to_string(),
            name: name.to_string(),
            compose_raw: None,
            compose_deployable: None,
            created_at: now,
            updated_at: now,
        };
        inner.stacks.push(stack.clone());
        Ok(stack)
    }

    fn get_stack(&self, stack_id: i64) -> Result<Stack> {
        let inner = self.lock()?;
        inner
            .stacks
            .iter()
            .find(|s| s.id == stack_id)
            .cloned()
            .ok_or(CatalogError::StackNotFound(stack_id))
    }

    fn save_stack_documents(&self, stack_id: i64, raw: &str, deployable: &str) -> Result<()> {
        let mut inner = self.lock()?;
        let stack = inner
            .stacks
            .iter_mut()
            .find(|s| s.id == stack_id)
            .ok_or(CatalogError::StackNotFound(stack_id))?;
        stack.compose_raw = Some(raw.to_string());
        stack.compose_deployable = Some(deployable.to_string());
        stack.updated_at = Utc::now();
        Ok(())
    }

    fn find_resource(&self, name: &str, stack_id: i64) -> Result<Option<ManagedResource>> {
        let inner = self.lock()?;
        Ok(inner
            .resources
            .iter()
            .find(|r| r.name == name && r.stack_id == stack_id)
            .cloned())
    }

    fn create_resource(&self, new: NewManagedResource) -> Result<ManagedResource> {
        let mut inner = self.lock()?;
        let now = Utc::now();
        let resource = ManagedResource {
            id: inner.next_id(),
            name: new.name,
            kind: new.kind,
            stack_id: new.stack_id,
            image: new.image,
            ports: String::new(),
            fqdn: None,
            status: ResourceStatus::default(),
            created_at: now,
            updated_at: now,
        };
        debug!(
            name = %resource.name,
            kind = resource.kind.as_str(),
            "Created managed resource"
        );
        inner.resources.push(resource.clone());
        Ok(resource)
    }

    fn list_resources(&self, stack_id: i64) -> Result<Vec<ManagedResource>> {
        let inner = self.lock()?;
        Ok(inner
            .resources
            .iter()
            .filter(|r| r.stack_id == stack_id)
            .cloned()
            .collect())
    }

    fn save_resource_ports(&self, resource_id: i64, ports: &str) -> Result<()> {
        let mut inner = self.lock()?;
        let resource = inner
            .resources
            .iter_mut()
            .find(|r| r.id == resource_id)
            .ok_or(CatalogError::ResourceNotFound(resource_id))?;
        resource.ports = ports.to_string();
        resource.updated_at = Utc::now();
        Ok(())
    }

    fn save_resource_fqdn(&self, resource_id: i64, fqdn: &str) -> Result<()> {
        let mut inner = self.lock()?;
        let resource = inner
            .resources
            .iter_mut()
            .find(|r| r.id == resource_id)
            .ok_or(CatalogError::ResourceNotFound(resource_id))?;
        resource.fqdn = Some(fqdn.to_string());
        resource.updated_at = Utc::now();
        Ok(())
    }

    fn find_env(&self, key: &str, stack_id: i64) -> Result<Option<EnvironmentVariable>> {
        let inner = self.lock()?;
        Ok(inner
            .envs
            .iter()
            .find(|e| e.key == key && e.stack_id == stack_id)
            .cloned())
    }

    fn create_env(&self, new: NewEnvironmentVariable) -> Result<EnvironmentVariable> {
        let mut inner = self.lock()?;
        if let Some(existing) = inner
            .envs
            .iter()
            .find(|e| e.key == new.key && e.stack_id == new.stack_id)
        {
            return Ok(existing.clone());
        }
        let env = EnvironmentVariable {
            id: inner.next_id(),
            key: new.key,
            value: new.value,
            is_build_time: new.is_build_time,
            is_preview: new.is_preview,
            stack_id: new.stack_id,
        };
        inner.envs.push(env.clone());
        Ok(env)
    }

    fn upsert_env(&self, new: NewEnvironmentVariable) -> Result<EnvironmentVariable> {
        let mut inner = self.lock()?;
        if let Some(existing) = inner
            .envs
            .iter_mut()
            .find(|e| e.key == new.key && e.stack_id == new.stack_id)
        {
            existing.value = new.value;
            existing.is_build_time = new.is_build_time;
            existing.is_preview = new.is_preview;
            return Ok(existing.clone());
        }
        let env = EnvironmentVariable {
            id: inner.next_id(),
            key: new.key,
            value: new.value,
            is_build_time: new.is_build_time,
            is_preview: new.is_preview,
            stack_id: new.stack_id,
        };
        inner.envs.push(env.clone());
        Ok(env)
    }

    fn list_env(&self, stack_id: i64) -> Result<Vec<EnvironmentVariable>> {
        let inner = self.lock()?;
        let mut envs: Vec<_> = inner
            .envs
            .iter()
            .filter(|e| e.stack_id == stack_id)
            .cloned()
            .collect();
        envs.sort_by(|a, b| a.key.cmp(&b.key));
        Ok(envs)
    }

    fn find_file_mount(
        &self,
        mount_path: &str,
        resource_id: i64,
        resource_kind: ResourceKind,
    ) -> Result<Option<FileMount>> {
        let inner = self.lock()?;
        Ok(inner
            .file_mounts
            .iter()
            .find(|m| {
                m.mount_path == mount_path
                    && m.resource_id == resource_id
                    && m.resource_kind == resource_kind
            })
            .cloned())
    }

    fn upsert_file_mount(&self, spec: FileMountSpec) -> Result<FileMount> {
        let mut inner = self.lock()?;
        if let Some(existing) = inner.file_mounts.iter_mut().find(|m| {
            m.mount_path == spec.mount_path
                && m.resource_id == spec.resource_id
                && m.resource_kind == spec.resource_kind
        }) {
            existing.fs_path = spec.fs_path;
            existing.content = spec.content;
            existing.is_directory = spec.is_directory;
            return Ok(existing.clone());
        }
        let mount = FileMount {
            id: inner.next_id(),
            mount_path: spec.mount_path,
            fs_path: spec.fs_path,
            content: spec.content,
            is_directory: spec.is_directory,
            resource_id: spec.resource_id,
            resource_kind: spec.resource_kind,
        };
        inner.file_mounts.push(mount.clone());
        Ok(mount)
    }

    fn upsert_named_volume(&self, spec: NamedVolumeSpec) -> Result<NamedVolume> {
        let mut inner = self.lock()?;
        if let Some(existing) = inner.named_volumes.iter_mut().find(|v| {
            v.mount_path == spec.mount_path
                && v.resource_id == spec.resource_id
                && v.resource_kind == spec.resource_kind
        }) {
            existing.name = spec.name;
            return Ok(existing.clone());
        }
        let volume = NamedVolume {
            id: inner.next_id(),
            name: spec.name,
            mount_path: spec.mount_path,
            resource_id: spec.resource_id,
            resource_kind: spec.resource_kind,
        };
        inner.named_volumes.push(volume.clone());
        Ok(volume)
    }

    fn list_named_volumes(&self, stack_id: i64) -> Result<Vec<NamedVolume>> {
        let inner = self.lock()?;
        let resource_ids: Vec<i64> = inner
            .resources
            .iter()
            .filter(|r| r.stack_id == stack_id)
            .map(|r| r.id)
            .collect();
        Ok(inner
            .named_volumes
            .iter()
            .filter(|v| resource_ids.contains(&v.resource_id))
            .cloned()
            .collect())
    }

    fn delete_stack_children(&self, stack_id: i64) -> Result<Vec<String>> {
        let mut inner = self.lock()?;
        let resource_ids: Vec<i64> = inner
            .resources
            .iter()
            .filter(|r| r.stack_id == stack_id)
            .map(|r| r.id)
            .collect();

        let volume_names: Vec<String> = inner
            .named_volumes
            .iter()
            .filter(|v| resource_ids.contains(&v.resource_id))
            .map(|v| v.name.clone())
            .collect();

        inner
            .named_volumes
            .retain(|v| !resource_ids.contains(&v.resource_id));
        inner
            .file_mounts
            .retain(|m| !resource_ids.contains(&m.resource_id));
        inner.envs.retain(|e| e.stack_id != stack_id);
        inner.resources.retain(|r| r.stack_id != stack_id);

        debug!(
            stack_id,
            volume_count = volume_names.len(),
            "Deleted stack children"
        );
        Ok(volume_names)
    }
}
