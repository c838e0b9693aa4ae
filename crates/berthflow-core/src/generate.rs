//! シークレット・FQDN生成
//!
//! `SERVICE_PASSWORD_*` 等の生成コマンドが要求するランダム値と、
//! sslipワイルドカードDNSベースのデフォルトFQDNを合成します。
//! 生成はトレイト越しに注入されるため、エンジン本体は乱数源に依存しません。

use crate::model::HostRef;
use rand::Rng;

const ALNUM: &[u8] = b"ABCDEFGHIJKLMNOPQRSTUVWXYZabcdefghijklmnopqrstuvwxyz0123456789";
const SYMBOLS: &[u8] = b"!@#$%^&*()-_=+";

/// ランダム値の生成器
///
/// 生成された値はカタログに一度だけ書き込まれ、再パースで
/// 再生成されることはない（冪等性はカタログ側の create-once が担保）。
pub trait ValueGenerator {
    /// パスワードを生成（`symbols = false` で英数字のみ）
    fn password(&self, length: usize, symbols: bool) -> String;

    /// 英数字のランダム文字列を生成
    fn random_string(&self, length: usize) -> String;
}

/// OSの乱数源を使う標準実装
#[derive(Debug, Default)]
pub struct RandomGenerator;

impl RandomGenerator {
    pub fn new() -> Self {
        Self
    }

    fn from_charset(charset: &[u8], length: usize) -> String {
        let mut rng = rand::thread_rng();
        (0..length)
            .map(|_| charset[rng.gen_range(0..charset.len())] as char)
            .collect()
    }
}

impl ValueGenerator for RandomGenerator {
    fn password(&self, length: usize, symbols: bool) -> String {
        if symbols {
            let charset: Vec<u8> = [ALNUM, SYMBOLS].concat();
            Self::from_charset(&charset, length)
        } else {
            Self::from_charset(ALNUM, length)
        }
    }

    fn random_string(&self, length: usize) -> String {
        Self::from_charset(ALNUM, length)
    }
}

/// ホストからワイルドカードDNSドメインを導出する
pub trait DomainResolver {
    /// ホストのsslipドメイン（例: `10.0.0.1.sslip.io`）
    fn sslip_domain(&self, host: &HostRef) -> String;
}

/// sslip.io ベースの標準実装
#[derive(Debug, Default)]
pub struct SslipResolver;

impl SslipResolver {
    pub fn new() -> Self {
        Self
    }
}

impl DomainResolver for SslipResolver {
    fn sslip_domain(&self, host: &HostRef) -> String {
        format!("{}.sslip.io", host.ip)
    }
}

/// コンテナ名とsslipドメインからデフォルトFQDNを合成する
pub fn default_fqdn(container_name: &str, sslip: &str) -> String {
    format!("http://{container_name}.{sslip}")
}
