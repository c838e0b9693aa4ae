//! ボリュームエントリの分類
//!
//! 短縮形 `source:target[:mode]` と構造化形
//! `{type, source, target, content?, isDirectory?}` を、
//! バインドマウント / 名前付きボリュームへ分類します。

use crate::util::scalar_to_string;
use serde_yaml::{Mapping, Value};

/// Dockerソケットは絶対にマウントレコード化しない
const DOCKER_SOCKET: &str = "/var/run/docker.sock";

/// ボリューム種別
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VolumeKind {
    /// ホストパスを使うバインドマウント
    Bind,
    /// 名前付き（マネージド）ボリューム
    Named,
}

/// 入力の書式 — 出力時に元の形を保つために保持する
#[derive(Debug, Clone, PartialEq, Eq)]
enum VolumeForm {
    Short(String),
    Structured,
}

/// ボリューム指定1件
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VolumeEntry {
    pub kind: VolumeKind,
    pub source: String,
    pub target: String,
    /// 構造化形でのみ指定できるインライン内容
    pub content: Option<String>,
    pub is_directory: bool,
    form: VolumeForm,
}

impl VolumeEntry {
    /// YAML値からパースする。想定外の形状はNone（エントリ単位でスキップ）
    pub fn parse(value: &Value) -> Option<Self> {
        match value {
            Value::String(raw) => Self::parse_short(raw),
            Value::Mapping(map) => Self::parse_structured(map),
            _ => None,
        }
    }

    fn parse_short(raw: &str) -> Option<Self> {
        let (source, rest) = raw.split_once(':')?;
        // modeサフィックスはターゲットから除く（出力には残る）
        let target = rest.rsplit_once(':').map_or(rest, |(t, _)| t);
        if source.is_empty() || target.is_empty() {
            return None;
        }

        let kind = if source.starts_with("./") || source.starts_with('/') || source.starts_with('~')
        {
            VolumeKind::Bind
        } else {
            VolumeKind::Named
        };

        Some(Self {
            kind,
            source: source.to_string(),
            target: target.to_string(),
            content: None,
            is_directory: false,
            form: VolumeForm::Short(raw.to_string()),
        })
    }

    fn parse_structured(map: &Mapping) -> Option<Self> {
        let kind = match map.get(&Value::from("type")).and_then(|v| v.as_str()) {
            Some("bind") => VolumeKind::Bind,
            Some("volume") => VolumeKind::Named,
            _ => return None,
        };
        let source = map
            .get(&Value::from("source"))
            .and_then(scalar_to_string)?;
        let target = map
            .get(&Value::from("target"))
            .and_then(scalar_to_string)?;
        let content = map
            .get(&Value::from("content"))
            .and_then(scalar_to_string);
        let is_directory = map
            .get(&Value::from("isDirectory"))
            .and_then(Value::as_bool)
            .unwrap_or(false);

        Some(Self {
            kind,
            source,
            target,
            content,
            is_directory,
            form: VolumeForm::Structured,
        })
    }

    /// マウントレコードを作らない特別なソースかどうか
    pub fn is_ignored_source(&self) -> bool {
        let source = self.source.as_str();
        source == DOCKER_SOCKET || source == "/tmp" || source == "/tmp/"
    }

    /// 出力ドキュメント用の表現
    ///
    /// 短縮形は入力の文字列をそのまま（mode付きも保持）、構造化形は
    /// content/isDirectoryを落としたtype/source/targetのみを出す。
    pub fn emit(&self) -> Value {
        match &self.form {
            VolumeForm::Short(raw) => Value::String(raw.clone()),
            VolumeForm::Structured => {
                let mut map = Mapping::new();
                let kind = match self.kind {
                    VolumeKind::Bind => "bind",
                    VolumeKind::Named => "volume",
                };
                map.insert(Value::from("type"), Value::from(kind));
                map.insert(Value::from("source"), Value::from(self.source.clone()));
                map.insert(Value::from("target"), Value::from(self.target.clone()));
                Value::Mapping(map)
            }
        }
    }
}

/// サービスの `volumes` 値からエントリ一覧をパースする
pub fn parse_volumes(value: Option<&Value>) -> Vec<VolumeEntry> {
    let Some(Value::Sequence(items)) = value else {
        return Vec::new();
    };
    items.iter().filter_map(VolumeEntry::parse).collect()
}
