//! 文字列まわりの小さなヘルパー

use serde_yaml::Value;

/// ボリューム名などに使うスラグを生成する
///
/// 英数字以外は区切り文字に畳み込み、先頭・末尾の区切りは落とす。
/// `pg_data` → `pg-data`、`My Volume!` → `my-volume`
pub fn slugify(input: &str) -> String {
    let mut slug = String::with_capacity(input.len());
    let mut last_was_sep = true;

    for c in input.chars() {
        if c.is_ascii_alphanumeric() {
            slug.push(c.to_ascii_lowercase());
            last_was_sep = false;
        } else if !last_was_sep {
            slug.push('-');
            last_was_sep = true;
        }
    }

    while slug.ends_with('-') {
        slug.pop();
    }
    slug
}

/// YAMLスカラー値を文字列へ変換する（マッピング・シーケンスはNone）
pub fn scalar_to_string(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        Value::Bool(b) => Some(b.to_string()),
        Value::Null => None,
        _ => None,
    }
}
