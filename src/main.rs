use anyhow::Result;
use std::sync::Arc;

use tasksync::backend::factory;
use tasksync::config::Config;
use tasksync::constants::{STATUS_OFFLINE, STATUS_SYNCED, STATUS_SYNC_IN_PROGRESS};
use tasksync::logger::{setup_logging, Logger};
use tasksync::storage::LocalStorage;
use tasksync::sync::{SyncService, SyncStatus};

#[tokio::main]
async fn main() -> Result<()> {
    if std::env::args().nth(1).as_deref() == Some("--generate-config") {
        return Config::generate_default_config(Config::get_default_config_path()?);
    }

    let config = Config::load()?;

    // Check if the credential is set
    if std::env::var(&config.server.auth_header_env).is_err() {
        eprintln!("❌ Error: {} environment variable not set", config.server.auth_header_env);
        eprintln!("\n💡 To use this app:");
        eprintln!("1. Build the Authorization header value your server expects (e.g. \"Basic <base64>\")");
        eprintln!("2. Set it as environment variable: export {}='<header value>'", config.server.auth_header_env);
        eprintln!("3. Run the app again to sync your tasks!");
        return Ok(());
    }

    let logger = Logger::new();
    setup_logging(&config.logging, &logger)?;

    let storage = Arc::new(LocalStorage::from_config(&config.storage).await?);
    let backend = factory::create_backend(&config.server)?;
    let sync_service = SyncService::new(storage, backend);

    let status = sync_service.spawn_cycle(config.sync.default_query()).await?;
    match &status {
        SyncStatus::Success(_) => println!("{STATUS_SYNCED}"),
        SyncStatus::Offline { message, .. } => println!("{STATUS_OFFLINE}: {message}"),
        SyncStatus::InProgress => println!("{STATUS_SYNC_IN_PROGRESS}"),
    }
    if let Some(report) = status.report() {
        println!(
            "   {} deleted, {} pushed, {} notes uploaded, {} pulled, {} still pending",
            report.deletes_pushed,
            report.tasks_pushed,
            report.notes_pushed,
            report.tasks_pulled,
            report.pending_total()
        );
        for notice in &report.notices {
            println!("   ⚠️  {notice}");
        }
    }

    println!();
    for task in sync_service.visible_tasks().await? {
        let check = if task.completed { "x" } else { " " };
        let marker = if task.is_dirty { " *" } else { "" };
        let due = task.due_date.as_deref().map(|d| format!(" (due {d})")).unwrap_or_default();
        println!("[{check}] {}{due}{marker}", task.title);
    }

    Ok(())
}
