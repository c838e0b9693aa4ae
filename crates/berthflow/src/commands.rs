//! CLIコマンドの実装
//!
//! 単発実行なのでカタログはインメモリ、リモート実行は記録のみ。
//! 永続カタログ・SSH実行を使う場合はそれぞれのトレイト実装を差し込む。

use anyhow::Context;
use berthflow_catalog::{CatalogStore, MemoryCatalog, ResourceKind};
use berthflow_core::{HostRef, Normalizer, ParseOutcome, RandomGenerator, SslipResolver, StackRef};
use berthflow_remote::{RecordingExecutor, StackConfigurator};
use colored::Colorize;
use std::path::Path;
use uuid::Uuid;

struct ParsedStack {
    catalog: MemoryCatalog,
    stack: StackRef,
    executor: RecordingExecutor,
    outcome: ParseOutcome,
}

fn run_parse(file: &Path, uuid: Option<&str>, host_ip: &str) -> anyhow::Result<ParsedStack> {
    let raw = std::fs::read_to_string(file)
        .with_context(|| format!("Composeファイルを読み込めません: {}", file.display()))?;

    let name = file
        .file_stem()
        .and_then(|s| s.to_str())
        .unwrap_or("stack");
    let uuid = match uuid {
        Some(uuid) => uuid.to_string(),
        None => {
            let mut generated = Uuid::new_v4().simple().to_string();
            generated.truncate(7);
            generated
        }
    };

    let catalog = MemoryCatalog::new();
    let stack = catalog.create_stack(name, &uuid)?;
    let stack = StackRef {
        id: stack.id,
        uuid: stack.uuid,
    };
    let host = HostRef {
        name: "local".to_string(),
        ip: host_ip.to_string(),
    };

    let generator = RandomGenerator::new();
    let domains = SslipResolver::new();
    let normalizer = Normalizer::new(&catalog, &generator, &domains);
    let executor = RecordingExecutor::new();
    let outcome = StackConfigurator::new(&catalog, &executor)
        .reparse(&normalizer, &stack, &host, &raw, true)?;

    Ok(ParsedStack {
        catalog,
        stack,
        executor,
        outcome,
    })
}

pub fn handle_parse(
    file: &Path,
    uuid: Option<&str>,
    host_ip: &str,
    show_commands: bool,
) -> anyhow::Result<()> {
    let parsed = run_parse(file, uuid, host_ip)?;

    if parsed.outcome.services == 0 {
        println!("{}", "サービスが見つかりませんでした".yellow());
        return Ok(());
    }

    println!(
        "{} {} ({}サービス / うちデータベース{})",
        "✓".green(),
        format!("stack {}", parsed.stack.uuid).bold(),
        parsed.outcome.services,
        parsed.outcome.databases,
    );
    println!();
    print!("{}", parsed.outcome.deployable_document);

    if show_commands {
        println!();
        println!("{}", "# 実体化コマンド".cyan());
        for (_, commands) in parsed.executor.recorded() {
            for command in commands {
                println!("{command}");
            }
        }
    }
    Ok(())
}

pub fn handle_check(file: &Path, uuid: Option<&str>, host_ip: &str) -> anyhow::Result<()> {
    let parsed = run_parse(file, uuid, host_ip)?;

    let resources = parsed.catalog.list_resources(parsed.stack.id)?;
    if resources.is_empty() {
        println!("{}", "サービスが見つかりませんでした".yellow());
        return Ok(());
    }

    for resource in resources {
        let kind = match resource.kind {
            ResourceKind::Application => "application".blue(),
            ResourceKind::Database => "database".magenta(),
        };
        println!("{} {} [{}]", "●".green(), resource.name.bold(), kind);
        println!("    image: {}", resource.image);
        if !resource.ports.is_empty() {
            println!("    ports: {}", resource.ports);
        }
        if let Some(fqdn) = &resource.fqdn {
            println!("    fqdn:  {}", fqdn.underline());
        }
    }
    Ok(())
}

pub fn handle_env(file: &Path, uuid: Option<&str>, host_ip: &str) -> anyhow::Result<()> {
    let parsed = run_parse(file, uuid, host_ip)?;

    for env in parsed.catalog.list_env(parsed.stack.id)? {
        println!("{}={}", env.key, env.value.unwrap_or_default());
    }
    Ok(())
}
