mod commands;

use clap::{Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "berth")]
#[command(about = "書いたComposeが、そのまま動く。", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Composeドキュメントをパースしてデプロイ可能な形を表示
    Parse {
        /// Composeファイルのパス
        file: PathBuf,
        /// スタックUUID（省略時は自動生成）
        #[arg(long, env = "BERTH_STACK_UUID")]
        uuid: Option<String>,
        /// デプロイ先ホストのIP（sslipドメイン合成に使用）
        #[arg(long, default_value = "127.0.0.1")]
        host_ip: String,
        /// 実体化コマンド列も表示する
        #[arg(long)]
        commands: bool,
    },
    /// サービスの分類とサブリソースを確認
    Check {
        /// Composeファイルのパス
        file: PathBuf,
        /// スタックUUID（省略時は自動生成）
        #[arg(long, env = "BERTH_STACK_UUID")]
        uuid: Option<String>,
        /// デプロイ先ホストのIP
        #[arg(long, default_value = "127.0.0.1")]
        host_ip: String,
    },
    /// 解決済みの環境変数（.envの内容）を表示
    Env {
        /// Composeファイルのパス
        file: PathBuf,
        /// スタックUUID（省略時は自動生成）
        #[arg(long, env = "BERTH_STACK_UUID")]
        uuid: Option<String>,
        /// デプロイ先ホストのIP
        #[arg(long, default_value = "127.0.0.1")]
        host_ip: String,
    },
    /// バージョンを表示
    Version,
}

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt::init();

    let cli = Cli::parse();
    match cli.command {
        Commands::Parse {
            file,
            uuid,
            host_ip,
            commands,
        } => commands::handle_parse(&file, uuid.as_deref(), &host_ip, commands),
        Commands::Check { file, uuid, host_ip } => {
            commands::handle_check(&file, uuid.as_deref(), &host_ip)
        }
        Commands::Env { file, uuid, host_ip } => {
            commands::handle_env(&file, uuid.as_deref(), &host_ip)
        }
        Commands::Version => {
            println!("berthflow {}", env!("CARGO_PKG_VERSION"));
            Ok(())
        }
    }
}
