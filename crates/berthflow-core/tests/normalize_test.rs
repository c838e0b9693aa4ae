//! 正規化エンジンの結合テスト
//!
//! インメモリカタログに対してパースを繰り返し、冪等性と
//! サブリソース同期の不変条件を検証します。

use berthflow_catalog::{CatalogStore, MemoryCatalog, ResourceKind};
use berthflow_core::{HostRef, Normalizer, RandomGenerator, SslipResolver, StackRef};
use serde_yaml::Value;

struct TestStack {
    catalog: MemoryCatalog,
    stack: StackRef,
    host: HostRef,
}

impl TestStack {
    fn new() -> Self {
        let catalog = MemoryCatalog::new();
        let stack = catalog.create_stack("blog", "vgsco4o").unwrap();
        Self {
            catalog,
            stack: StackRef {
                id: stack.id,
                uuid: stack.uuid,
            },
            host: HostRef {
                name: "berth-01".to_string(),
                ip: "203.0.113.10".to_string(),
            },
        }
    }

    fn parse(&self, raw: &str, is_new: bool) -> berthflow_core::ParseOutcome {
        let generator = RandomGenerator::new();
        let domains = SslipResolver::new();
        Normalizer::new(&self.catalog, &generator, &domains)
            .parse(&self.stack, &self.host, raw, is_new)
            .unwrap()
    }
}

const GHOST_COMPOSE: &str = r#"
services:
  app:
    image: nginx
    ports:
      - 8080:80
    volumes:
      - ./data:/data
    environment:
      - SERVICE_FQDN_APP
      - DB_PASS=$SERVICE_PASSWORD_DB
      - POSTGRES_USER=${POSTGRES_USER:-admin}
  db:
    image: mysql:8.0
    volumes:
      - db_data:/var/lib/mysql
"#;

#[test]
fn test_empty_document_is_noop() {
    let t = TestStack::new();
    let outcome = t.parse("", true);
    assert_eq!(outcome.services, 0);
    assert!(outcome.deployable_document.is_empty());
    assert!(t.catalog.list_resources(t.stack.id).unwrap().is_empty());
}

#[test]
fn test_invalid_yaml_is_parse_error() {
    let t = TestStack::new();
    let generator = RandomGenerator::new();
    let domains = SslipResolver::new();
    let result = Normalizer::new(&t.catalog, &generator, &domains).parse(
        &t.stack,
        &t.host,
        "services:\n  app: [unclosed",
        true,
    );
    assert!(result.is_err());
    // 部分的な状態は残さない
    assert!(t.catalog.list_resources(t.stack.id).unwrap().is_empty());
}

#[test]
fn test_reparse_is_idempotent() {
    let t = TestStack::new();
    let first = t.parse(GHOST_COMPOSE, true);
    let second = t.parse(GHOST_COMPOSE, false);

    // デプロイ可能ドキュメントはバイト単位で一致する
    assert_eq!(first.deployable_document, second.deployable_document);
    assert_eq!(first.raw_document, second.raw_document);

    // サブリソース行は重複しない
    let resources = t.catalog.list_resources(t.stack.id).unwrap();
    assert_eq!(resources.len(), 2);
    let envs = t.catalog.list_env(t.stack.id).unwrap();
    let keys: Vec<_> = envs.iter().map(|e| e.key.as_str()).collect();
    assert_eq!(keys, vec!["POSTGRES_USER", "SERVICE_PASSWORD_DB"]);
}

#[test]
fn test_generated_secret_is_stable_across_reparses() {
    let t = TestStack::new();
    t.parse(GHOST_COMPOSE, true);
    let before = t
        .catalog
        .find_env("SERVICE_PASSWORD_DB", t.stack.id)
        .unwrap()
        .unwrap();

    t.parse(GHOST_COMPOSE, false);
    let after = t
        .catalog
        .find_env("SERVICE_PASSWORD_DB", t.stack.id)
        .unwrap()
        .unwrap();

    assert!(before.value.is_some());
    assert_eq!(before.value, after.value);
    assert_eq!(before.id, after.id);
}

#[test]
fn test_persisted_value_beats_parsed_default() {
    let t = TestStack::new();
    t.catalog
        .upsert_env(berthflow_catalog::NewEnvironmentVariable {
            key: "POSTGRES_USER".to_string(),
            value: Some("old".to_string()),
            is_build_time: false,
            is_preview: false,
            stack_id: t.stack.id,
        })
        .unwrap();

    t.parse(GHOST_COMPOSE, false);

    let env = t
        .catalog
        .find_env("POSTGRES_USER", t.stack.id)
        .unwrap()
        .unwrap();
    assert_eq!(env.value.as_deref(), Some("old"));
}

#[test]
fn test_special_mount_sources_excluded() {
    let t = TestStack::new();
    t.parse(
        r#"
services:
  agent:
    image: portainer/agent
    volumes:
      - /var/run/docker.sock:/var/run/docker.sock
      - /tmp:/tmp
      - ./config:/config
"#,
        true,
    );

    let resource = t.catalog.find_resource("agent", t.stack.id).unwrap().unwrap();
    assert!(t
        .catalog
        .find_file_mount("/var/run/docker.sock", resource.id, resource.kind)
        .unwrap()
        .is_none());
    assert!(t
        .catalog
        .find_file_mount("/tmp", resource.id, resource.kind)
        .unwrap()
        .is_none());
    // 通常のバインドは記録される
    assert!(t
        .catalog
        .find_file_mount("/config", resource.id, resource.kind)
        .unwrap()
        .is_some());
}

#[test]
fn test_image_defaulting_and_database_classification() {
    let t = TestStack::new();
    let outcome = t.parse(
        "services:\n  cache:\n    image: mysql\n  pinned:\n    image: mysql:8.0\n",
        true,
    );
    assert_eq!(outcome.databases, 2);

    let cache = t.catalog.find_resource("cache", t.stack.id).unwrap().unwrap();
    assert_eq!(cache.image, "mysql:latest");
    assert_eq!(cache.kind, ResourceKind::Database);

    let pinned = t.catalog.find_resource("pinned", t.stack.id).unwrap().unwrap();
    assert_eq!(pinned.image, "mysql:8.0");

    let doc: Value = serde_yaml::from_str(&outcome.deployable_document).unwrap();
    let image = &doc["services"]["cache"]["image"];
    assert_eq!(image.as_str(), Some("mysql:latest"));
}

#[test]
fn test_database_resource_never_exposed() {
    let t = TestStack::new();
    t.parse(
        "services:\n  db:\n    image: postgres\n    environment:\n      - SERVICE_FQDN_DB\n",
        true,
    );
    let db = t.catalog.find_resource("db", t.stack.id).unwrap().unwrap();
    assert!(db.fqdn.is_none());
}

#[test]
fn test_ports_rendered_to_catalog() {
    let t = TestStack::new();
    t.parse(
        r#"
services:
  web:
    image: nginx
    ports:
      - 8080:80
      - target: 443
        published: 8443
        protocol: tcp
"#,
        true,
    );

    let web = t.catalog.find_resource("web", t.stack.id).unwrap().unwrap();
    assert_eq!(web.ports, "8080:80,443:8443/tcp");
}

#[test]
fn test_end_to_end_first_parse() {
    let t = TestStack::new();
    let outcome = t.parse(
        r#"
services:
  app:
    image: nginx
    volumes:
      - ./data:/data
    environment:
      - SERVICE_FQDN_APP
"#,
        true,
    );

    // Applicationリソースが1つ作られる
    let resources = t.catalog.list_resources(t.stack.id).unwrap();
    assert_eq!(resources.len(), 1);
    let app = &resources[0];
    assert_eq!(app.name, "app");
    assert_eq!(app.kind, ResourceKind::Application);

    // /data のFileMountが1つ
    let mount = t
        .catalog
        .find_file_mount("/data", app.id, app.kind)
        .unwrap()
        .unwrap();
    assert_eq!(mount.fs_path, "./data");

    // FQDNが合成される
    let app = t.catalog.find_resource("app", t.stack.id).unwrap().unwrap();
    assert_eq!(
        app.fqdn.as_deref(),
        Some("http://app-vgsco4o.203.0.113.10.sslip.io")
    );

    // デプロイ可能ドキュメントの検証
    let doc: Value = serde_yaml::from_str(&outcome.deployable_document).unwrap();
    let service = &doc["services"]["app"];
    assert_eq!(service["restart"].as_str(), Some("unless-stopped"));
    assert_eq!(service["container_name"].as_str(), Some("app-vgsco4o"));

    let networks: Vec<&str> = service["networks"]
        .as_sequence()
        .unwrap()
        .iter()
        .filter_map(|v| v.as_str())
        .collect();
    assert!(networks.contains(&"vgsco4o"));

    assert_eq!(service["labels"]["berthflow.managed"].as_str(), Some("true"));
    assert_eq!(
        service["labels"]["berthflow.container_name"].as_str(),
        Some("app-vgsco4o")
    );
    assert_eq!(service["labels"]["traefik.enable"].as_str(), Some("true"));

    // スタック専用ネットワークはexternal
    let stack_network = &doc["networks"]["vgsco4o"];
    assert_eq!(stack_network["external"].as_bool(), Some(true));
    assert_eq!(stack_network["name"].as_str(), Some("vgsco4o"));

    // 環境変数ブロックから$SERVICE_*参照は消え、露出トークンは残る
    let env: Vec<&str> = service["environment"]
        .as_sequence()
        .unwrap()
        .iter()
        .filter_map(|v| v.as_str())
        .collect();
    assert_eq!(env, vec!["SERVICE_FQDN_APP"]);
}

#[test]
fn test_named_volume_registered_top_level() {
    let t = TestStack::new();
    let outcome = t.parse(
        "services:\n  db:\n    image: postgres\n    volumes:\n      - pg_data:/var/lib/postgresql/data\n",
        true,
    );

    let doc: Value = serde_yaml::from_str(&outcome.deployable_document).unwrap();
    assert!(doc["volumes"]
        .as_mapping()
        .unwrap()
        .contains_key(&Value::from("pg_data")));

    let volumes = t.catalog.list_named_volumes(t.stack.id).unwrap();
    assert_eq!(volumes.len(), 1);
    assert_eq!(volumes[0].name, "pg-data");
}

#[test]
fn test_documents_saved_on_stack() {
    let t = TestStack::new();
    t.parse(GHOST_COMPOSE, true);
    let stack = t.catalog.get_stack(t.stack.id).unwrap();
    assert!(stack.compose_raw.is_some());
    assert!(stack.compose_deployable.is_some());

    // rawはサービスレベルの付加を受けない
    let raw: Value = serde_yaml::from_str(stack.compose_raw.as_deref().unwrap()).unwrap();
    assert!(raw["services"]["app"]["container_name"].is_null());
}

#[test]
fn test_version_defaulted_when_absent() {
    let t = TestStack::new();
    let outcome = t.parse("services:\n  app:\n    image: nginx\n", true);
    let doc: Value = serde_yaml::from_str(&outcome.deployable_document).unwrap();
    assert_eq!(doc["version"].as_str(), Some("3.8"));
}

#[test]
fn test_user_declared_network_added_top_level() {
    let t = TestStack::new();
    let outcome = t.parse(
        "services:\n  app:\n    image: nginx\n    networks:\n      - backend\n",
        true,
    );
    let doc: Value = serde_yaml::from_str(&outcome.deployable_document).unwrap();
    let networks = doc["networks"].as_mapping().unwrap();
    assert!(networks.contains_key(&Value::from("backend")));
    assert!(networks.contains_key(&Value::from("vgsco4o")));
}
