use std::io::{self, BufRead, Write};
use std::path::Path;
use std::time::Instant;

use bmr_core::export::{ExportSummary, ExportTarget, Exporter};
use tracing::error;

use crate::ExportChoice;

/// Run the `export` command: write one table, or all of them, as CSV.
pub async fn run(
    config_path: &str,
    entity: Option<ExportChoice>,
    output_dir: Option<&str>,
) -> anyhow::Result<()> {
    let choice = match entity {
        Some(choice) => choice,
        None => match prompt_menu()? {
            Some(choice) => choice,
            None => return Ok(()),
        },
    };

    let config = super::load_config(config_path)?;
    let output_dir = Path::new(output_dir.unwrap_or(config.export.output_dir.as_str()));

    let repo = super::connect(&config).await?;
    let exporter = Exporter::new(&repo);
    let start = Instant::now();

    let results = match target_for(choice) {
        Some(target) => {
            let path = output_dir.join(target.file_name(None));
            vec![(target, exporter.export(target, &path).await)]
        }
        None => {
            let timestamp = chrono::Local::now().naive_local();
            exporter.export_all(output_dir, &timestamp).await
        }
    };

    let mut failed = Vec::new();
    for (target, result) in &results {
        match result {
            Ok(summary) => print_summary(summary),
            Err(e) => {
                error!("Export of {} failed: {}", target, e);
                println!("Export of {target} failed: {e}");
                failed.push(target.name());
            }
        }
    }

    repo.pool().close().await;

    if !failed.is_empty() {
        anyhow::bail!("export failed for: {}", failed.join(", "));
    }

    println!(
        "\nExport completed in {:.1}s",
        start.elapsed().as_secs_f64()
    );
    Ok(())
}

fn target_for(choice: ExportChoice) -> Option<ExportTarget> {
    match choice {
        ExportChoice::Users => Some(ExportTarget::Users),
        ExportChoice::Rooms => Some(ExportTarget::Rooms),
        ExportChoice::Buildings => Some(ExportTarget::Buildings),
        ExportChoice::Reservations => Some(ExportTarget::Reservations),
        ExportChoice::All => None,
    }
}

fn print_summary(summary: &ExportSummary) {
    println!("\nExporting {}...", summary.target);
    for line in &summary.progress {
        println!("  {line}");
    }
    println!(
        "{} {} written to {}",
        summary.rows(),
        summary.target,
        summary.path.display()
    );
}

const MENU: &str = "\
Select a table to export:
  1) users
  2) rooms
  3) buildings
  4) reservations
  5) all
  0) quit";

/// Show the menu until a valid choice is entered. `None` means quit.
fn prompt_menu() -> anyhow::Result<Option<ExportChoice>> {
    let stdin = io::stdin();
    let mut input = stdin.lock();
    loop {
        println!("{MENU}");
        print!("> ");
        io::stdout().flush()?;

        let mut line = String::new();
        if input.read_line(&mut line)? == 0 {
            // EOF
            return Ok(None);
        }

        match parse_menu_choice(&line) {
            Some(choice) => return Ok(choice),
            None => println!("Invalid choice '{}'", line.trim()),
        }
    }
}

/// Outer `None` for unrecognized input, inner `None` for quit.
fn parse_menu_choice(input: &str) -> Option<Option<ExportChoice>> {
    match input.trim() {
        "0" => Some(None),
        "1" => Some(Some(ExportChoice::Users)),
        "2" => Some(Some(ExportChoice::Rooms)),
        "3" => Some(Some(ExportChoice::Buildings)),
        "4" => Some(Some(ExportChoice::Reservations)),
        "5" => Some(Some(ExportChoice::All)),
        _ => None,
    }
}
