//! ポートエントリ
//!
//! Composeのポートは短縮形（`"8080:80"`、`3000`）と構造化形
//! （`{target, published, protocol}`）の両方で書ける。
//! パース入口で一度だけ解決し、以降は型で扱う。

use crate::util::scalar_to_string;
use serde_yaml::Value;

/// ポート指定1件
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PortEntry {
    /// 短縮形 — 入力の文字列/数値をそのまま保持
    Short(String),
    /// 構造化形
    Structured {
        target: u16,
        published: u16,
        protocol: Protocol,
    },
}

/// プロトコル種別
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum Protocol {
    #[default]
    Tcp,
    Udp,
}

impl Protocol {
    pub fn parse(s: &str) -> Self {
        match s.to_lowercase().as_str() {
            "udp" => Protocol::Udp,
            _ => Protocol::Tcp,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Tcp => "tcp",
            Self::Udp => "udp",
        }
    }
}

impl PortEntry {
    /// YAML値からパースする。想定外の形状はNone（エントリ単位でスキップ）
    pub fn parse(value: &Value) -> Option<Self> {
        match value {
            Value::String(_) | Value::Number(_) => Some(Self::Short(scalar_to_string(value)?)),
            Value::Mapping(map) => {
                let target = map
                    .get(&Value::from("target"))
                    .and_then(Value::as_u64)? as u16;
                let published = map
                    .get(&Value::from("published"))
                    .and_then(scalar_to_string)
                    .and_then(|s| s.parse().ok())?;
                let protocol = map
                    .get(&Value::from("protocol"))
                    .and_then(|v| v.as_str())
                    .map(Protocol::parse)
                    .unwrap_or_default();
                Some(Self::Structured {
                    target,
                    published,
                    protocol,
                })
            }
            _ => None,
        }
    }

    /// カタログに保存する表記へ変換
    pub fn render(&self) -> String {
        match self {
            Self::Short(raw) => raw.clone(),
            Self::Structured {
                target,
                published,
                protocol,
            } => format!("{}:{}/{}", target, published, protocol.as_str()),
        }
    }
}

/// サービスの `ports` 値からエントリ一覧をパースする
pub fn parse_ports(value: Option<&Value>) -> Vec<PortEntry> {
    let Some(Value::Sequence(items)) = value else {
        return Vec::new();
    };
    items.iter().filter_map(PortEntry::parse).collect()
}
