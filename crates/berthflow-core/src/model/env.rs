//! 環境変数エントリ
//!
//! リスト形式（`"KEY=VALUE"` / `"KEY"`）とマッピング形式（`KEY: VALUE`）の
//! 両方をサポートします。

use crate::util::scalar_to_string;
use serde_yaml::Value;

/// 環境変数エントリ1件
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EnvEntry {
    pub key: String,
    pub value: Option<String>,
}

impl EnvEntry {
    pub(crate) fn from_list_item(item: &Value) -> Option<Self> {
        let raw = scalar_to_string(item)?;
        if let Some((key, value)) = raw.split_once('=') {
            // - SESSION_SECRET=123 / - SESSION_SECRET=
            Some(Self {
                key: key.to_string(),
                value: Some(value.to_string()),
            })
        } else if raw.starts_with('$') {
            // - $SERVICE_PASSWORD_DB — キー自体が参照なら値としても扱う
            Some(Self {
                key: raw.clone(),
                value: Some(raw),
            })
        } else {
            // - SESSION_SECRET
            Some(Self {
                key: raw,
                value: None,
            })
        }
    }

    fn from_mapping_pair(key: &Value, value: &Value) -> Option<Self> {
        Some(Self {
            key: scalar_to_string(key)?,
            value: scalar_to_string(value),
        })
    }
}

/// サービスの `environment` 値からエントリ一覧をパースする
pub fn parse_environment(value: Option<&Value>) -> Vec<EnvEntry> {
    match value {
        Some(Value::Sequence(items)) => {
            items.iter().filter_map(EnvEntry::from_list_item).collect()
        }
        Some(Value::Mapping(map)) => map
            .iter()
            .filter_map(|(k, v)| EnvEntry::from_mapping_pair(k, v))
            .collect(),
        _ => Vec::new(),
    }
}
