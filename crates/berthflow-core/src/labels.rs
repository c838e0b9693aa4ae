//! コンテナラベルの合成
//!
//! プラットフォーム識別ラベルと、HTTP公開されるリソース向けの
//! Traefikルーティングラベルを合成します。ユーザー定義ラベルは保持し、
//! キー衝突時はプラットフォーム側が勝ちます。

use crate::util::scalar_to_string;
use berthflow_catalog::ResourceKind;
use serde_yaml::Value;

/// プラットフォーム識別ラベル
pub fn default_labels(
    stack_id: i64,
    container_name: &str,
    kind: ResourceKind,
    resource_id: i64,
) -> Vec<(String, String)> {
    vec![
        ("berthflow.managed".to_string(), "true".to_string()),
        ("berthflow.stack_id".to_string(), stack_id.to_string()),
        (
            "berthflow.container_name".to_string(),
            container_name.to_string(),
        ),
        ("berthflow.resource_type".to_string(), "service".to_string()),
        (
            "berthflow.resource_subtype".to_string(),
            kind.as_str().to_string(),
        ),
        ("berthflow.resource_id".to_string(), resource_id.to_string()),
    ]
}

/// 公開ドメインからTraefikルーティングラベルを導出する
///
/// ドメインごとにルーターを1つ作り、パス付きFQDNにはPathPrefixを足す。
pub fn proxy_labels(fqdns: &[String], container_name: &str) -> Vec<(String, String)> {
    let mut labels = vec![("traefik.enable".to_string(), "true".to_string())];

    for (index, fqdn) in fqdns.iter().enumerate() {
        let (host, path) = split_fqdn(fqdn);
        if host.is_empty() {
            continue;
        }
        let router = if index == 0 {
            container_name.to_string()
        } else {
            format!("{container_name}-{index}")
        };

        let rule = if path.is_empty() || path == "/" {
            format!("Host(`{host}`)")
        } else {
            format!("Host(`{host}`) && PathPrefix(`{path}`)")
        };
        labels.push((format!("traefik.http.routers.{router}.rule"), rule));
        labels.push((
            format!("traefik.http.routers.{router}.entryPoints"),
            "http".to_string(),
        ));
    }

    labels
}

/// FQDNをホストとパスへ分解する（スキームは捨てる）
fn split_fqdn(fqdn: &str) -> (&str, &str) {
    let rest = fqdn
        .split_once("://")
        .map_or(fqdn, |(_, rest)| rest);
    match rest.find('/') {
        Some(pos) => (&rest[..pos], &rest[pos..]),
        None => (rest, ""),
    }
}

/// サービスの `labels` 値（リスト/マッピング両形式）をパースする
pub fn parse_labels(value: Option<&Value>) -> Vec<(String, String)> {
    match value {
        Some(Value::Sequence(items)) => items
            .iter()
            .filter_map(scalar_to_string)
            .filter_map(|raw| {
                raw.split_once('=')
                    .map(|(k, v)| (k.to_string(), v.to_string()))
            })
            .collect(),
        Some(Value::Mapping(map)) => map
            .iter()
            .filter_map(|(k, v)| {
                Some((scalar_to_string(k)?, scalar_to_string(v).unwrap_or_default()))
            })
            .collect(),
        _ => Vec::new(),
    }
}

/// ユーザーラベルにプラットフォームラベルをマージする
///
/// ユーザーの記述順を保ち、衝突キーはプラットフォーム値で置き換える。
pub fn merge_labels(
    user: Vec<(String, String)>,
    platform: Vec<(String, String)>,
) -> Vec<(String, String)> {
    let mut merged = user;
    for (key, value) in platform {
        if let Some(existing) = merged.iter_mut().find(|(k, _)| *k == key) {
            existing.1 = value;
        } else {
            merged.push((key, value));
        }
    }
    merged
}
