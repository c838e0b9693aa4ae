//! データベースイメージの判定
//!
//! イメージ名（タグを除いた部分）が既知のデータベースイメージかどうかで
//! サービスを Application / Database に分類します。

/// 既知のデータベースDockerイメージ
pub const DATABASE_IMAGES: &[&str] = &[
    "postgres",
    "postgis/postgis",
    "mysql",
    "mariadb",
    "mongo",
    "redis",
    "keydb",
    "memcached",
    "couchdb",
    "neo4j",
    "influxdb",
    "clickhouse/clickhouse-server",
    "cassandra",
    "elasticsearch",
    "supabase/postgres",
];

/// タグを除いたイメージ名がデータベースかどうか
pub fn is_database_image(image_name: &str) -> bool {
    DATABASE_IMAGES.contains(&image_name)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_known_databases() {
        assert!(is_database_image("mysql"));
        assert!(is_database_image("postgres"));
        assert!(is_database_image("supabase/postgres"));
    }

    #[test]
    fn test_applications_are_not_databases() {
        assert!(!is_database_image("nginx"));
        assert!(!is_database_image("ghost"));
        // タグ付きのままでは判定しない（呼び出し側でタグを除く）
        assert!(!is_database_image("mysql:8.0"));
    }
}
