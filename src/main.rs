use anyhow::{anyhow, Result};
use clap::{value_parser, Arg, ArgMatches, Command};
use std::path::PathBuf;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use backup_lro_crab::agent::HttpAgentClient;
use backup_lro_crab::config::EngineConfig;
use backup_lro_crab::types::{Backup, BackupPhase, BackupSpec, BackupType};
use backup_lro_crab::{BackupClients, BackupReconciler, PhysicalBackup};

#[tokio::main]
async fn main() -> Result<()> {
    init_tracing();

    let matches = cli().get_matches();
    let backup = backup_from_args(&matches)?;

    if matches.get_flag("dry-run") {
        let request = PhysicalBackup::request_for(&backup)?;
        println!("{}", serde_json::to_string_pretty(&request)?);
        return Ok(());
    }

    let config = config_from_args(&matches)?;
    run_backup(config, backup).await
}

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(true)
        .init();
}

fn cli() -> Command {
    Command::new("Database Physical Backup")
        .version(env!("CARGO_PKG_VERSION"))
        .about("Starts a physical backup through the config agent and waits for it to finish")
        .arg(Arg::new("instance").long("instance").required(true).help("Target database instance"))
        .arg(
            Arg::new("name")
                .long("name")
                .help("Backup resource name (defaults to a timestamped name)"),
        )
        .arg(Arg::new("namespace").long("namespace").default_value("default"))
        .arg(
            Arg::new("type")
                .long("type")
                .value_parser(["physical", "snapshot"])
                .default_value("physical"),
        )
        .arg(
            Arg::new("dop")
                .long("dop")
                .value_parser(value_parser!(i32))
                .help("Degree of parallelism (0 uses the agent default of 1)"),
        )
        .arg(
            Arg::new("level")
                .long("level")
                .value_parser(value_parser!(i32))
                .help("Incremental level, 0 for a full backup"),
        )
        .arg(Arg::new("gcs-path").long("gcs-path").help("Backup destination"))
        .arg(
            Arg::new("backupset")
                .long("backupset")
                .value_parser(value_parser!(bool))
                .help("Produce a backupset (defaults to true)"),
        )
        .arg(
            Arg::new("config")
                .long("config")
                .value_parser(value_parser!(PathBuf))
                .help("TOML engine configuration"),
        )
        .arg(Arg::new("agent-endpoint").long("agent-endpoint").help("Config agent base URL"))
        .arg(
            Arg::new("dry-run")
                .long("dry-run")
                .help("Print the resolved backup request without contacting the agent")
                .action(clap::ArgAction::SetTrue),
        )
}

fn backup_from_args(matches: &ArgMatches) -> Result<Backup> {
    let instance = matches
        .get_one::<String>("instance")
        .cloned()
        .ok_or_else(|| anyhow!("--instance is required"))?;

    let backup_type = match matches.get_one::<String>("type").map(String::as_str) {
        Some("snapshot") => BackupType::Snapshot,
        _ => BackupType::Physical,
    };

    let spec = BackupSpec {
        instance,
        backup_type,
        dop: matches.get_one::<i32>("dop").copied().unwrap_or_default(),
        backupset: matches.get_one::<bool>("backupset").copied(),
        gcs_path: matches.get_one::<String>("gcs-path").cloned().unwrap_or_default(),
        level: matches.get_one::<i32>("level").copied().unwrap_or_default(),
    };

    let name = matches
        .get_one::<String>("name")
        .cloned()
        .unwrap_or_else(|| format!("backup-{}", chrono::Utc::now().format("%Y%m%d%H%M%S")));
    let namespace = matches
        .get_one::<String>("namespace")
        .cloned()
        .unwrap_or_else(|| "default".to_string());

    Ok(Backup::new(name, namespace, spec))
}

fn config_from_args(matches: &ArgMatches) -> Result<EngineConfig> {
    let config = match matches.get_one::<PathBuf>("config") {
        Some(path) => EngineConfig::from_file(path)?,
        None => EngineConfig::default(),
    };
    let mut config = config.merge_env();
    if let Some(endpoint) = matches.get_one::<String>("agent-endpoint") {
        config.agent_endpoint = endpoint.clone();
    }
    config.validate()?;
    Ok(config)
}

async fn run_backup(config: EngineConfig, mut backup: Backup) -> Result<()> {
    let client = Arc::new(HttpAgentClient::new(
        &config.agent_endpoint,
        config.auth_token.clone(),
    )?);
    let clients = BackupClients::new(client.clone(), client, config.request_timeout());
    let reconciler = BackupReconciler::new(clients, config.poll_interval())
        .with_operation_cleanup(config.delete_operation_on_completion);

    let cancel = CancellationToken::new();
    let ctrl_c = cancel.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            warn!("interrupt received, cancelling backup");
            ctrl_c.cancel();
        }
    });

    reconciler.run_to_completion(&mut backup, &cancel).await?;
    println!("{}", serde_json::to_string_pretty(&backup.status)?);

    match backup.status.phase {
        BackupPhase::Succeeded => {
            info!(backup = %backup.name, "backup succeeded");
            Ok(())
        }
        _ => Err(anyhow!(
            "backup {} failed: {}",
            backup.name,
            backup.status.message.as_deref().unwrap_or("unknown error")
        )),
    }
}
