use std::path::PathBuf;
use std::time::Instant;

use bmr_core::config::RowFailurePolicy;
use bmr_core::import::{ImportReport, ImportStatus, Importer};
use tracing::{error, info};

/// Flags of the `import` command. `None` falls back to the config file.
#[derive(Debug, Default)]
pub struct ImportArgs {
    pub users: Option<String>,
    pub rooms: Option<String>,
    pub dry_run: bool,
    pub on_invalid_row: Option<RowFailurePolicy>,
}

/// Run the `import` command: import users then rooms, one transaction per file.
pub async fn run(config_path: &str, args: ImportArgs) -> anyhow::Result<()> {
    let config = super::load_config(config_path)?;

    let users_path = PathBuf::from(args.users.unwrap_or(config.import.users_file.clone()));
    let rooms_path = PathBuf::from(args.rooms.unwrap_or(config.import.rooms_file.clone()));
    let policy = args.on_invalid_row.unwrap_or(config.import.on_invalid_row);

    let repo = super::connect(&config).await?;
    let importer = Importer::new(policy).dry_run(args.dry_run);
    let start = Instant::now();

    if args.dry_run {
        println!("Dry run mode - changes will be rolled back.");
    }

    let mut failed = Vec::new();

    println!("\nImporting users from {}...", users_path.display());
    let session = repo.begin_import().await?;
    match importer.import_users(&users_path, session).await {
        Ok(report) => {
            if !print_report(&report) {
                failed.push(users_path.display().to_string());
            }
        }
        Err(e) => {
            error!("Users import failed: {}", e);
            println!("error: {e}");
            failed.push(users_path.display().to_string());
        }
    }

    println!("\nImporting rooms from {}...", rooms_path.display());
    let session = repo.begin_import().await?;
    match importer.import_rooms(&rooms_path, session).await {
        Ok(report) => {
            if !print_report(&report) {
                failed.push(rooms_path.display().to_string());
            }
        }
        Err(e) => {
            error!("Rooms import failed: {}", e);
            println!("error: {e}");
            failed.push(rooms_path.display().to_string());
        }
    }

    repo.pool().close().await;

    info!("Import run finished in {:.1}s", start.elapsed().as_secs_f64());

    if !failed.is_empty() {
        anyhow::bail!("import failed for: {}", failed.join(", "));
    }
    Ok(())
}

/// Print one line per row and the totals. Returns `false` when the file was rolled back.
fn print_report(report: &ImportReport) -> bool {
    for row in &report.rows {
        println!("  {row}");
    }

    match &report.status {
        ImportStatus::Committed => {
            println!(
                "{}: {} imported, {} skipped, {} errors",
                report.entity,
                report.imported(),
                report.skipped(),
                report.errors()
            );
            true
        }
        ImportStatus::DryRun => {
            println!(
                "{} (dry run): {} would be imported, {} skipped, {} errors",
                report.entity,
                report.imported(),
                report.skipped(),
                report.errors()
            );
            true
        }
        ImportStatus::RolledBack { line, reason } => {
            println!(
                "{}: rolled back at line {line}, nothing was imported: {reason}",
                report.entity
            );
            false
        }
    }
}
