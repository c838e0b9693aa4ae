//! スタック・ホストの識別子

use serde::{Deserialize, Serialize};

/// パース対象のスタックの識別情報
///
/// `uuid` はスタック専用ネットワーク名とコンテナ名サフィックスに使われる。
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StackRef {
    pub id: i64,
    pub uuid: String,
}

/// デプロイ先ホストの識別情報
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HostRef {
    pub name: String,
    /// ワイルドカードDNSドメイン合成に使うIPアドレス
    pub ip: String,
}

/// 再起動ポリシー (no, always, on-failure, unless-stopped)
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum RestartPolicy {
    No,
    Always,
    OnFailure,
    /// 明示的に停止しない限り再起動（プラットフォーム既定）
    #[default]
    UnlessStopped,
}

impl RestartPolicy {
    /// 文字列からパース
    pub fn parse(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "no" => Some(Self::No),
            "always" => Some(Self::Always),
            "on-failure" | "on_failure" => Some(Self::OnFailure),
            "unless-stopped" | "unless_stopped" => Some(Self::UnlessStopped),
            _ => None,
        }
    }

    /// Composeドキュメントで使用する文字列に変換
    pub fn as_docker_str(&self) -> &'static str {
        match self {
            Self::No => "no",
            Self::Always => "always",
            Self::OnFailure => "on-failure",
            Self::UnlessStopped => "unless-stopped",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_restart_policy_roundtrip() {
        assert_eq!(RestartPolicy::parse("unless-stopped"), Some(RestartPolicy::UnlessStopped));
        assert_eq!(RestartPolicy::parse("on_failure"), Some(RestartPolicy::OnFailure));
        assert_eq!(RestartPolicy::parse("bogus"), None);
        assert_eq!(RestartPolicy::default().as_docker_str(), "unless-stopped");
    }
}
