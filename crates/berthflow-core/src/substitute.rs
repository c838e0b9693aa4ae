//! `$VAR` / `${VAR:-default}` 形式のトークン置換ヘルパー
//!
//! 値が `$` で始まる環境変数エントリを展開式として解釈します。
//! デフォルト値の書式は `:-` → `-` → `:?` → `?` の優先順で判定します
//! （最長・最具体のパターンが勝つ）。

/// パース済みの展開式
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VariableExpr {
    /// 置換後のキー名（`${POSTGRES_USER:-admin}` なら `POSTGRES_USER`）
    pub name: String,
    /// デフォルト値（`?` 系ではエラーメッセージ相当）
    pub default: Option<String>,
    /// `:?` / `?` 形式（値必須の意図）かどうか
    pub required: bool,
}

/// `$...` / `${...}` の外側の記法を剥がして式本体を返す
///
/// `$` で始まらない入力はNone。
pub fn strip_expansion(value: &str) -> Option<&str> {
    let rest = value.strip_prefix('$')?;
    if let Some(inner) = rest.strip_prefix('{') {
        Some(inner.strip_suffix('}').unwrap_or(inner))
    } else {
        Some(rest)
    }
}

/// 展開式をパースする
///
/// 入力は `strip_expansion` 済みの式本体。
pub fn parse_expr(expr: &str) -> VariableExpr {
    for (op, required) in [(":-", false), ("-", false), (":?", true), ("?", true)] {
        if let Some(pos) = expr.find(op) {
            let name = &expr[..pos];
            let default = &expr[pos + op.len()..];
            return VariableExpr {
                name: name.to_string(),
                default: Some(default.to_string()),
                required,
            };
        }
    }
    VariableExpr {
        name: expr.to_string(),
        default: None,
        required: false,
    }
}

/// 値が `$SERVICE_*` トークンを参照しているか
///
/// これらは解決ディレクティブであり、デプロイ可能ドキュメントの
/// environmentブロックからは取り除かれる。
pub fn references_service_token(value: &str) -> bool {
    strip_expansion(value).is_some_and(|expr| expr.starts_with("SERVICE_"))
}
