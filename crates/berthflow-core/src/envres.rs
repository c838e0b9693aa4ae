//! 環境変数の解決
//!
//! サービスのenvironmentブロックを歩き、`SERVICE_FQDN*` 露出トークンの
//! FQDN割り当て、`SERVICE_<COMMAND>_<TARGET>` 生成コマンド、
//! デフォルト値式の解決とカタログへの永続化を行います。
//!
//! 不変条件: 生成済みシークレットは再パースで再生成されない。
//! 永続化済みの値は、新しくパースされたデフォルト値より常に優先される。

use crate::error::Result;
use crate::generate::{ValueGenerator, default_fqdn};
use crate::model::{EnvEntry, StackRef, parse_environment};
use crate::substitute::{parse_expr, references_service_token, strip_expansion};
use berthflow_catalog::{CatalogStore, ManagedResource, NewEnvironmentVariable};
use serde_yaml::{Mapping, Value};
use std::collections::HashMap;
use tracing::debug;

/// 1サービス分のenvironmentブロックを解決する
///
/// 戻り値はデプロイ可能ドキュメントに出すenvironment値
/// （`$SERVICE_*` 参照のエントリを除いたもの、入力と同じ書式）。
/// 入力にenvironmentが無ければNone。
#[allow(clippy::too_many_arguments)]
pub(crate) fn resolve_environment(
    store: &dyn CatalogStore,
    generator: &dyn ValueGenerator,
    stack: &StackRef,
    resource: &mut ManagedResource,
    container_name: &str,
    sslip: &str,
    is_database: bool,
    bindings: &mut HashMap<String, String>,
    env_value: Option<&Value>,
) -> Result<Option<Value>> {
    let Some(original) = env_value else {
        return Ok(None);
    };

    for entry in parse_environment(Some(original)) {
        resolve_entry(
            store,
            generator,
            stack,
            resource,
            container_name,
            sslip,
            is_database,
            bindings,
            &entry,
        )?;
    }

    Ok(Some(strip_service_references(original)))
}

#[allow(clippy::too_many_arguments)]
fn resolve_entry(
    store: &dyn CatalogStore,
    generator: &dyn ValueGenerator,
    stack: &StackRef,
    resource: &mut ManagedResource,
    container_name: &str,
    sslip: &str,
    is_database: bool,
    bindings: &mut HashMap<String, String>,
    entry: &EnvEntry,
) -> Result<()> {
    // 露出トークン: SERVICE_FQDN* キーはFQDN割り当てディレクティブ
    if entry.key.starts_with("SERVICE_FQDN") {
        resolve_fqdn_token(
            store,
            resource,
            container_name,
            sslip,
            is_database,
            bindings,
            entry,
        )?;
        return Ok(());
    }

    let Some(value) = entry.value.as_deref() else {
        return Ok(());
    };
    let Some(expr_body) = strip_expansion(value) else {
        return Ok(());
    };

    if let Some(rest) = expr_body.strip_prefix("SERVICE_") {
        // 生成コマンド: SERVICE_<COMMAND>_<TARGET>
        let command = rest.rsplit_once('_').map_or(rest, |(command, _)| command);
        resolve_generator_command(
            store,
            generator,
            stack,
            resource,
            container_name,
            sslip,
            is_database,
            expr_body,
            command,
        )?;
    } else {
        // デフォルト値式: ${KEY:-default} 等
        resolve_default_expr(store, stack, expr_body)?;
    }
    Ok(())
}

fn resolve_fqdn_token(
    store: &dyn CatalogStore,
    resource: &mut ManagedResource,
    container_name: &str,
    sslip: &str,
    is_database: bool,
    bindings: &mut HashMap<String, String>,
    entry: &EnvEntry,
) -> Result<()> {
    // 既にFQDNを持っていれば何もしない
    if resource.fqdn.is_some() {
        return Ok(());
    }

    let token = strip_positional_index(&entry.key);
    let base = bindings
        .entry(token.to_string())
        .or_insert_with(|| default_fqdn(container_name, sslip))
        .clone();

    // パス付きトークン: SERVICE_FQDN_<NAME>=/path
    let path = entry
        .value
        .as_deref()
        .filter(|v| token.matches('_').count() == 2 && v.starts_with('/'));
    let fqdn = match path {
        Some(path) => format!("{base}{path}"),
        None => base,
    };

    // データベースは公開されない
    if !is_database {
        debug!(token, fqdn = %fqdn, "Assigned service FQDN");
        store.save_resource_fqdn(resource.id, &fqdn)?;
        resource.fqdn = Some(fqdn);
    }
    Ok(())
}

#[allow(clippy::too_many_arguments)]
fn resolve_generator_command(
    store: &dyn CatalogStore,
    generator: &dyn ValueGenerator,
    stack: &StackRef,
    resource: &mut ManagedResource,
    container_name: &str,
    sslip: &str,
    is_database: bool,
    key: &str,
    command: &str,
) -> Result<()> {
    let found = store.find_env(key, stack.id)?;

    if command == "FQDN" || command == "URL" {
        let fqdn = found
            .as_ref()
            .and_then(|env| env.value.clone())
            .unwrap_or_else(|| default_fqdn(container_name, sslip));
        if found.is_none() {
            store.create_env(NewEnvironmentVariable {
                key: key.to_string(),
                value: Some(fqdn.clone()),
                is_build_time: false,
                is_preview: false,
                stack_id: stack.id,
            })?;
        }
        if !is_database {
            store.save_resource_fqdn(resource.id, &fqdn)?;
            resource.fqdn = Some(fqdn);
        }
        return Ok(());
    }

    let generated = match command {
        "PASSWORD" => Some(generator.password(32, false)),
        "PASSWORD_64" => Some(generator.password(64, false)),
        "BASE64" => Some(generator.random_string(32)),
        "BASE64_64" => Some(generator.random_string(64)),
        "BASE64_128" => Some(generator.random_string(128)),
        "USER" => Some(generator.random_string(16)),
        _ => None,
    };

    // 一度生成された値は上書きしない
    if found.is_none() {
        debug!(key, command, "Generated environment value");
        store.create_env(NewEnvironmentVariable {
            key: key.to_string(),
            value: generated,
            is_build_time: false,
            is_preview: false,
            stack_id: stack.id,
        })?;
    }
    Ok(())
}

fn resolve_default_expr(store: &dyn CatalogStore, stack: &StackRef, expr_body: &str) -> Result<()> {
    let expr = parse_expr(expr_body);
    let found = store.find_env(&expr.name, stack.id)?;

    // 永続化済みの値が新しいデフォルトより優先される
    let value = match found {
        Some(env) => env.value,
        None => expr.default,
    };

    store.upsert_env(NewEnvironmentVariable {
        key: expr.name,
        value,
        is_build_time: false,
        is_preview: false,
        stack_id: stack.id,
    })?;
    Ok(())
}

/// `SERVICE_FQDN_APP_3000` → `SERVICE_FQDN_APP`（末尾の数値インデックスを除く）
fn strip_positional_index(key: &str) -> &str {
    match key.rsplit_once('_') {
        Some((head, tail)) if !tail.is_empty() && tail.bytes().all(|b| b.is_ascii_digit()) => head,
        _ => key,
    }
}

/// `$SERVICE_*` を参照するエントリを取り除いたenvironment値を作る
///
/// 解決ディレクティブであって実行時変数ではないため、
/// デプロイ可能ドキュメントには出さない。
fn strip_service_references(original: &Value) -> Value {
    match original {
        Value::Sequence(items) => Value::Sequence(
            items
                .iter()
                .filter(|item| {
                    EnvEntry::from_list_item(item)
                        .and_then(|e| e.value)
                        .is_none_or(|v| !references_service_token(&v))
                })
                .cloned()
                .collect(),
        ),
        Value::Mapping(map) => {
            let mut kept = Mapping::new();
            for (key, value) in map {
                let stripped = crate::util::scalar_to_string(value)
                    .is_some_and(|v| references_service_token(&v));
                if !stripped {
                    kept.insert(key.clone(), value.clone());
                }
            }
            Value::Mapping(kept)
        }
        other => other.clone(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::generate::RandomGenerator;
    use berthflow_catalog::{MemoryCatalog, NewManagedResource, ResourceKind};

    fn fixture() -> (MemoryCatalog, StackRef, ManagedResource) {
        let catalog = MemoryCatalog::new();
        let stack = catalog.create_stack("blog", "vgsco4o").unwrap();
        let resource = catalog
            .create_resource(NewManagedResource {
                name: "app".to_string(),
                kind: ResourceKind::Application,
                stack_id: stack.id,
                image: "ghost:latest".to_string(),
            })
            .unwrap();
        let stack_ref = StackRef {
            id: stack.id,
            uuid: stack.uuid,
        };
        (catalog, stack_ref, resource)
    }

    fn resolve(
        catalog: &MemoryCatalog,
        stack: &StackRef,
        resource: &mut ManagedResource,
        is_database: bool,
        bindings: &mut HashMap<String, String>,
        yaml: &str,
    ) -> Option<Value> {
        let value: Value = serde_yaml::from_str(yaml).unwrap();
        resolve_environment(
            catalog,
            &RandomGenerator::new(),
            stack,
            resource,
            "app-vgsco4o",
            "203.0.113.10.sslip.io",
            is_database,
            bindings,
            Some(&value),
        )
        .unwrap()
    }

    #[test]
    fn test_fqdn_token_assigns_resource_fqdn() {
        let (catalog, stack, mut resource) = fixture();
        let mut bindings = HashMap::new();

        resolve(&catalog, &stack, &mut resource, false, &mut bindings, "- SERVICE_FQDN_APP\n");

        assert_eq!(
            resource.fqdn.as_deref(),
            Some("http://app-vgsco4o.203.0.113.10.sslip.io")
        );
        // EnvironmentVariable行は作られない
        assert!(catalog.list_env(stack.id).unwrap().is_empty());
    }

    #[test]
    fn test_fqdn_token_with_path() {
        let (catalog, stack, mut resource) = fixture();
        let mut bindings = HashMap::new();

        resolve(
            &catalog,
            &stack,
            &mut resource,
            false,
            &mut bindings,
            "- SERVICE_FQDN_API=/api\n",
        );

        assert_eq!(
            resource.fqdn.as_deref(),
            Some("http://app-vgsco4o.203.0.113.10.sslip.io/api")
        );
    }

    #[test]
    fn test_fqdn_token_repeated_resolves_identically() {
        let (catalog, stack, mut resource) = fixture();
        let mut bindings = HashMap::new();

        resolve(
            &catalog,
            &stack,
            &mut resource,
            false,
            &mut bindings,
            "- SERVICE_FQDN_GHOST=/a\n",
        );
        let first = bindings.get("SERVICE_FQDN_GHOST").cloned().unwrap();

        // 2回目の出現は同じバインディングを使う
        resolve(
            &catalog,
            &stack,
            &mut resource,
            false,
            &mut bindings,
            "- SERVICE_FQDN_GHOST=/b\n",
        );
        assert_eq!(bindings.get("SERVICE_FQDN_GHOST").unwrap(), &first);
        assert_eq!(bindings.len(), 1);
    }

    #[test]
    fn test_database_never_gets_fqdn() {
        let (catalog, stack, mut resource) = fixture();
        let mut bindings = HashMap::new();

        resolve(&catalog, &stack, &mut resource, true, &mut bindings, "- SERVICE_FQDN_DB\n");

        assert!(resource.fqdn.is_none());
    }

    #[test]
    fn test_password_generated_once() {
        let (catalog, stack, mut resource) = fixture();
        let mut bindings = HashMap::new();

        resolve(
            &catalog,
            &stack,
            &mut resource,
            false,
            &mut bindings,
            "- DB_PASS=$SERVICE_PASSWORD_DB\n",
        );
        let first = catalog
            .find_env("SERVICE_PASSWORD_DB", stack.id)
            .unwrap()
            .unwrap();
        assert_eq!(first.value.as_ref().unwrap().len(), 32);

        // 再解決でも値は変わらない
        resolve(
            &catalog,
            &stack,
            &mut resource,
            false,
            &mut bindings,
            "- DB_PASS=$SERVICE_PASSWORD_DB\n",
        );
        let second = catalog
            .find_env("SERVICE_PASSWORD_DB", stack.id)
            .unwrap()
            .unwrap();
        assert_eq!(second.value, first.value);
    }

    #[test]
    fn test_generator_command_lengths() {
        let (catalog, stack, mut resource) = fixture();
        let mut bindings = HashMap::new();

        resolve(
            &catalog,
            &stack,
            &mut resource,
            false,
            &mut bindings,
            "- A=$SERVICE_PASSWORD_64_DB\n- B=$SERVICE_BASE64_128_APP\n- C=$SERVICE_USER_DB\n",
        );

        let len_of = |key: &str| {
            catalog
                .find_env(key, stack.id)
                .unwrap()
                .unwrap()
                .value
                .unwrap()
                .len()
        };
        assert_eq!(len_of("SERVICE_PASSWORD_64_DB"), 64);
        assert_eq!(len_of("SERVICE_BASE64_128_APP"), 128);
        assert_eq!(len_of("SERVICE_USER_DB"), 16);
    }

    #[test]
    fn test_service_url_creates_env_and_fqdn() {
        let (catalog, stack, mut resource) = fixture();
        let mut bindings = HashMap::new();

        resolve(
            &catalog,
            &stack,
            &mut resource,
            false,
            &mut bindings,
            "- APP_URL=$SERVICE_URL_APP\n",
        );

        let env = catalog.find_env("SERVICE_URL_APP", stack.id).unwrap().unwrap();
        assert_eq!(
            env.value.as_deref(),
            Some("http://app-vgsco4o.203.0.113.10.sslip.io")
        );
        assert_eq!(resource.fqdn, env.value);
    }

    #[test]
    fn test_default_expr_existing_value_wins() {
        let (catalog, stack, mut resource) = fixture();
        let mut bindings = HashMap::new();

        catalog
            .upsert_env(NewEnvironmentVariable {
                key: "POSTGRES_USER".to_string(),
                value: Some("old".to_string()),
                is_build_time: false,
                is_preview: false,
                stack_id: stack.id,
            })
            .unwrap();

        resolve(
            &catalog,
            &stack,
            &mut resource,
            false,
            &mut bindings,
            "- USER=${POSTGRES_USER:-default}\n",
        );

        let env = catalog.find_env("POSTGRES_USER", stack.id).unwrap().unwrap();
        assert_eq!(env.value.as_deref(), Some("old"));
    }

    #[test]
    fn test_default_expr_creates_with_default() {
        let (catalog, stack, mut resource) = fixture();
        let mut bindings = HashMap::new();

        resolve(
            &catalog,
            &stack,
            &mut resource,
            false,
            &mut bindings,
            "- USER=${POSTGRES_USER:-admin}\n",
        );

        let env = catalog.find_env("POSTGRES_USER", stack.id).unwrap().unwrap();
        assert_eq!(env.value.as_deref(), Some("admin"));
    }

    #[test]
    fn test_service_references_stripped_from_output() {
        let (catalog, stack, mut resource) = fixture();
        let mut bindings = HashMap::new();

        let output = resolve(
            &catalog,
            &stack,
            &mut resource,
            false,
            &mut bindings,
            "- KEEP=literal\n- DB_PASS=$SERVICE_PASSWORD_DB\n- $SERVICE_BASE64_APP\n- SERVICE_FQDN_APP\n",
        )
        .unwrap();

        let items = output.as_sequence().unwrap();
        let rendered: Vec<&str> = items.iter().filter_map(|v| v.as_str()).collect();
        assert_eq!(rendered, vec!["KEEP=literal", "SERVICE_FQDN_APP"]);
    }

    #[test]
    fn test_mapping_form_stripped() {
        let (catalog, stack, mut resource) = fixture();
        let mut bindings = HashMap::new();

        let output = resolve(
            &catalog,
            &stack,
            &mut resource,
            false,
            &mut bindings,
            "KEEP: literal\nDB_PASS: $SERVICE_PASSWORD_DB\n",
        )
        .unwrap();

        let map = output.as_mapping().unwrap();
        assert_eq!(map.len(), 1);
        assert!(map.get(&Value::from("KEEP")).is_some());
    }
}
