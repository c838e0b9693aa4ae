//! Compose正規化のオーケストレーター
//!
//! 宣言順に各サービスを処理し、分類・解決・同期の結果から
//! デプロイ可能なトップレベルドキュメントを組み立てます。
//! パースごとの可変状態（トップレベルvolumes/networks、FQDNトークンの
//! バインディング）は [`ParseContext`] に明示的に持たせます。

use crate::database::DATABASE_IMAGES;
use crate::envres::resolve_environment;
use crate::error::Result;
use crate::generate::{DomainResolver, ValueGenerator};
use crate::labels::{default_labels, merge_labels, parse_labels, proxy_labels};
use crate::model::{
    ComposeDocument, DEFAULT_COMPOSE_VERSION, HostRef, RestartPolicy, StackRef, VolumeKind,
    parse_ports, parse_volumes,
};
use crate::sync::{ensure_resource, render_ports, sync_bind_mount, sync_named_volume};
use crate::util::scalar_to_string;
use berthflow_catalog::{CatalogStore, ResourceKind};
use serde_yaml::{Mapping, Value};
use std::collections::HashMap;
use tracing::{debug, info};

/// パース結果
#[derive(Debug, Clone, Default)]
pub struct ParseOutcome {
    /// 軽い正規化のみを施したソースドキュメント
    pub raw_document: String,
    /// 完全解決済みのデプロイ可能ドキュメント
    pub deployable_document: String,
    /// 処理したサービス数
    pub services: usize,
    /// うちデータベースに分類された数
    pub databases: usize,
}

impl ParseOutcome {
    /// 空入力に対する結果（副作用なし）
    pub fn empty() -> Self {
        Self::default()
    }
}

/// パース1回分の可変状態
struct ParseContext {
    top_level_volumes: Mapping,
    top_level_networks: Mapping,
    token_bindings: HashMap<String, String>,
}

/// Compose正規化エンジン
///
/// コラボレーター（カタログストア、値生成器、ドメイン解決器）は
/// トレイト越しに注入され、エンジン本体はI/O実装を持ちません。
pub struct Normalizer<'a> {
    store: &'a dyn CatalogStore,
    generator: &'a dyn ValueGenerator,
    domains: &'a dyn DomainResolver,
    database_images: Vec<String>,
}

impl<'a> Normalizer<'a> {
    pub fn new(
        store: &'a dyn CatalogStore,
        generator: &'a dyn ValueGenerator,
        domains: &'a dyn DomainResolver,
    ) -> Self {
        Self {
            store,
            generator,
            domains,
            database_images: DATABASE_IMAGES.iter().map(|s| s.to_string()).collect(),
        }
    }

    /// データベース判定の許可リストを差し替える
    pub fn with_database_images(mut self, images: Vec<String>) -> Self {
        self.database_images = images;
        self
    }

    /// Composeドキュメントをパース・正規化し、カタログを同期する
    ///
    /// 空の入力は副作用なしで空の結果を返す。YAMLとして不正な入力は
    /// パーサーのメッセージを載せたエラーになり、部分的な状態は残さない。
    pub fn parse(
        &self,
        stack: &StackRef,
        host: &HostRef,
        raw: &str,
        is_new: bool,
    ) -> Result<ParseOutcome> {
        if raw.trim().is_empty() {
            debug!(stack = %stack.uuid, "Empty compose document, nothing to parse");
            return Ok(ParseOutcome::empty());
        }

        let doc = ComposeDocument::parse(raw)?;
        let sslip = self.domains.sslip_domain(host);

        let mut ctx = ParseContext {
            top_level_volumes: doc.top_level_volumes(),
            top_level_networks: doc.top_level_networks(),
            token_bindings: HashMap::new(),
        };

        let mut services_out = Mapping::new();
        let mut databases = 0;
        for (name, spec) in doc.services() {
            let (transformed, is_database) =
                self.normalize_service(stack, &sslip, &name, spec, &mut ctx)?;
            if is_database {
                databases += 1;
            }
            services_out.insert(Value::from(name), Value::Mapping(transformed));
        }
        let services = services_out.len();

        let mut root = Mapping::new();
        root.insert(
            Value::from("version"),
            Value::from(
                doc.version()
                    .unwrap_or_else(|| DEFAULT_COMPOSE_VERSION.to_string()),
            ),
        );
        root.insert(Value::from("services"), Value::Mapping(services_out));
        root.insert(
            Value::from("volumes"),
            Value::Mapping(ctx.top_level_volumes),
        );
        root.insert(
            Value::from("networks"),
            Value::Mapping(ctx.top_level_networks),
        );

        let raw_document = doc.normalized_source()?;
        let deployable_document = serde_yaml::to_string(&Value::Mapping(root))?;
        self.store
            .save_stack_documents(stack.id, &raw_document, &deployable_document)?;

        info!(
            stack = %stack.uuid,
            is_new,
            services,
            databases,
            "Parsed compose document"
        );
        Ok(ParseOutcome {
            raw_document,
            deployable_document,
            services,
            databases,
        })
    }

    fn normalize_service(
        &self,
        stack: &StackRef,
        sslip: &str,
        name: &str,
        spec: Mapping,
        ctx: &mut ParseContext,
    ) -> Result<(Mapping, bool)> {
        // イメージ正規化: タグなしは :latest を付ける
        let raw_image = spec
            .get(&Value::from("image"))
            .and_then(scalar_to_string)
            .unwrap_or_default();
        let image = if raw_image.is_empty() || raw_image.contains(':') {
            raw_image
        } else {
            format!("{raw_image}:latest")
        };
        let image_name = image.split(':').next().unwrap_or_default();

        let is_database = self.database_images.iter().any(|i| i == image_name);
        let kind = if is_database {
            ResourceKind::Database
        } else {
            ResourceKind::Application
        };

        let mut resource = ensure_resource(self.store, name, stack.id, kind, &image)?;
        let container_name = format!("{name}-{}", stack.uuid);

        // ポートは毎パース上書き
        let ports = parse_ports(spec.get(&Value::from("ports")));
        self.store
            .save_resource_ports(resource.id, &render_ports(&ports))?;

        // ネットワーク: 未知の宣言はトップレベルへnull定義で追加し、
        // スタック専用ネットワークを常に確保・付与する
        let declared_networks = declared_network_names(spec.get(&Value::from("networks")));
        for network in &declared_networks {
            if !network_present(&ctx.top_level_networks, network) {
                ctx.top_level_networks
                    .insert(Value::from(network.clone()), Value::Null);
            }
        }
        if !network_present(&ctx.top_level_networks, &stack.uuid) {
            let mut stack_network = Mapping::new();
            stack_network.insert(Value::from("name"), Value::from(stack.uuid.clone()));
            stack_network.insert(Value::from("external"), Value::from(true));
            ctx.top_level_networks
                .insert(Value::from(stack.uuid.clone()), Value::Mapping(stack_network));
        }
        let mut service_networks = declared_networks;
        service_networks.push(stack.uuid.clone());

        // ボリューム分類と同期
        let volume_entries = parse_volumes(spec.get(&Value::from("volumes")));
        for entry in &volume_entries {
            match entry.kind {
                VolumeKind::Bind => {
                    if entry.is_ignored_source() {
                        debug!(source = %entry.source, "Skipping special mount source");
                        continue;
                    }
                    sync_bind_mount(self.store, &resource, entry)?;
                }
                VolumeKind::Named => {
                    sync_named_volume(self.store, &resource, entry)?;
                    let source = Value::from(entry.source.clone());
                    if !ctx.top_level_volumes.contains_key(&source) {
                        ctx.top_level_volumes.insert(source, Value::Null);
                    }
                }
            }
        }

        // 環境変数解決
        let environment = resolve_environment(
            self.store,
            self.generator,
            stack,
            &mut resource,
            &container_name,
            sslip,
            is_database,
            &mut ctx.token_bindings,
            spec.get(&Value::from("environment")),
        )?;

        // ラベル合成: ユーザー定義 ← プラットフォーム識別 ← ルーティング
        let user_labels = parse_labels(spec.get(&Value::from("labels")));
        let mut labels = merge_labels(
            user_labels,
            default_labels(stack.id, &container_name, kind, resource.id),
        );
        if !is_database {
            if let Some(fqdn) = &resource.fqdn {
                let fqdns: Vec<String> = fqdn.split(',').map(|s| s.trim().to_string()).collect();
                labels = merge_labels(labels, proxy_labels(&fqdns, &container_name));
            }
        }

        // 出力サービスの組み立て — 消費しないキーはそのまま通す
        let mut out = spec.clone();
        if !image.is_empty() {
            out.insert(Value::from("image"), Value::from(image));
        }
        out.insert(
            Value::from("networks"),
            Value::Sequence(service_networks.into_iter().map(Value::from).collect()),
        );
        if out.contains_key(&Value::from("volumes")) {
            out.insert(
                Value::from("volumes"),
                Value::Sequence(volume_entries.iter().map(|e| e.emit()).collect()),
            );
        }
        if let Some(environment) = environment {
            out.insert(Value::from("environment"), environment);
        }
        let mut label_map = Mapping::new();
        for (key, value) in labels {
            label_map.insert(Value::from(key), Value::from(value));
        }
        out.insert(Value::from("labels"), Value::Mapping(label_map));
        out.insert(
            Value::from("restart"),
            Value::from(RestartPolicy::default().as_docker_str()),
        );
        out.insert(
            Value::from("container_name"),
            Value::from(container_name),
        );

        Ok((out, is_database))
    }
}

/// サービスの `networks` 宣言から名前一覧を取り出す（リスト/マップ両対応）
fn declared_network_names(value: Option<&Value>) -> Vec<String> {
    match value {
        Some(Value::Sequence(items)) => items.iter().filter_map(scalar_to_string).collect(),
        Some(Value::Mapping(map)) => map.keys().filter_map(scalar_to_string).collect(),
        _ => Vec::new(),
    }
}

/// トップレベルnetworksにキーまたは値として名前が存在するか
fn network_present(networks: &Mapping, name: &str) -> bool {
    networks.iter().any(|(key, value)| {
        key.as_str() == Some(name) || value.as_str() == Some(name)
    })
}
