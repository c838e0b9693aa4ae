//! Composeドキュメントのラッパー
//!
//! トップレベルの `version` / `services` / `volumes` / `networks` への
//! 順序を保持したアクセスを提供します。サービスの反復順は
//! 入力ドキュメントの記述順（`Mapping` の挿入順）です。

use crate::error::Result;
use serde_yaml::{Mapping, Value};

/// `version` 未指定時のデフォルト
pub const DEFAULT_COMPOSE_VERSION: &str = "3.8";

/// パース済みComposeドキュメント
#[derive(Debug, Clone)]
pub struct ComposeDocument {
    doc: Value,
}

impl ComposeDocument {
    /// YAMLテキストをパースする
    ///
    /// YAMLとして不正な場合はパーサーのメッセージごとエラーを返す。
    /// マッピングでないトップレベル（スカラーのみ等）はエラーにせず、
    /// 各アクセサが空を返す。
    pub fn parse(raw: &str) -> Result<Self> {
        let doc: Value = serde_yaml::from_str(raw)?;
        Ok(Self { doc })
    }

    fn top_level(&self, key: &str) -> Option<&Value> {
        self.doc
            .as_mapping()
            .and_then(|m| m.get(&Value::from(key)))
    }

    /// `version` の値（未指定はNone — デフォルト適用は組み立て側）
    pub fn version(&self) -> Option<String> {
        self.top_level("version")
            .and_then(|v| v.as_str())
            .map(|s| s.to_string())
    }

    /// 宣言順のサービス一覧。`services` が無ければ空
    pub fn services(&self) -> Vec<(String, Mapping)> {
        let Some(services) = self.top_level("services").and_then(|v| v.as_mapping()) else {
            return Vec::new();
        };
        services
            .iter()
            .filter_map(|(name, spec)| {
                let name = name.as_str()?.to_string();
                // サービス値がマッピングでない行はスキップ（エントリ単位の耐性）
                let spec = spec.as_mapping()?.clone();
                Some((name, spec))
            })
            .collect()
    }

    /// トップレベル `volumes`（無ければ空のマッピング）
    pub fn top_level_volumes(&self) -> Mapping {
        self.top_level("volumes")
            .and_then(|v| v.as_mapping())
            .cloned()
            .unwrap_or_default()
    }

    /// トップレベル `networks`（無ければ空のマッピング）
    pub fn top_level_networks(&self) -> Mapping {
        self.top_level("networks")
            .and_then(|v| v.as_mapping())
            .cloned()
            .unwrap_or_default()
    }

    /// 軽い正規化のみのソース再シリアライズ（インデント2）
    pub fn normalized_source(&self) -> Result<String> {
        Ok(serde_yaml::to_string(&self.doc)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_preserves_service_order() {
        let doc = ComposeDocument::parse(
            r#"
services:
  zebra:
    image: nginx
  alpha:
    image: redis
  middle:
    image: mysql
"#,
        )
        .unwrap();

        let names: Vec<_> = doc.services().into_iter().map(|(n, _)| n).collect();
        assert_eq!(names, vec!["zebra", "alpha", "middle"]);
    }

    #[test]
    fn test_invalid_yaml_is_parse_error() {
        let result = ComposeDocument::parse("services:\n  app: [unclosed");
        assert!(result.is_err());
    }

    #[test]
    fn test_missing_services_yields_empty() {
        let doc = ComposeDocument::parse("version: '3'\n").unwrap();
        assert!(doc.services().is_empty());
        assert_eq!(doc.version().as_deref(), Some("3"));
    }

    #[test]
    fn test_top_level_collections_default_empty() {
        let doc = ComposeDocument::parse("services: {}\n").unwrap();
        assert!(doc.top_level_volumes().is_empty());
        assert!(doc.top_level_networks().is_empty());
    }
}
