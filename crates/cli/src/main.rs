use bmr_core::config::RowFailurePolicy;
use clap::Parser;
use tracing_subscriber::EnvFilter;

mod commands;

#[derive(Parser)]
#[command(
    name = "bmr",
    about = "Export and import BookMyRoom tables as CSV",
    version
)]
struct Cli {
    /// Path to configuration file
    #[arg(long, default_value = "bookmyroom.toml")]
    config: String,

    #[command(subcommand)]
    command: Commands,
}

#[derive(clap::Subcommand)]
enum Commands {
    /// Export tables to CSV files (interactive menu when no table is given)
    Export {
        /// Table to export
        #[arg(value_enum)]
        entity: Option<ExportChoice>,
        /// Directory for the exported files
        #[arg(long)]
        output_dir: Option<String>,
    },
    /// Import users and rooms from CSV files
    Import {
        /// Users CSV (name,email,role)
        #[arg(long)]
        users: Option<String>,
        /// Rooms CSV (room_number,capacity,floor,building_address)
        #[arg(long)]
        rooms: Option<String>,
        /// Process the files and roll back instead of committing
        #[arg(long)]
        dry_run: bool,
        /// What to do with a row that cannot be parsed
        #[arg(long, value_enum)]
        on_invalid_row: Option<InvalidRowChoice>,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, clap::ValueEnum)]
pub enum ExportChoice {
    Users,
    Rooms,
    Buildings,
    Reservations,
    All,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, clap::ValueEnum)]
enum InvalidRowChoice {
    Rollback,
    Skip,
}

impl From<InvalidRowChoice> for RowFailurePolicy {
    fn from(choice: InvalidRowChoice) -> Self {
        match choice {
            InvalidRowChoice::Rollback => RowFailurePolicy::Rollback,
            InvalidRowChoice::Skip => RowFailurePolicy::Skip,
        }
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Export { entity, output_dir } => {
            commands::export::run(&cli.config, entity, output_dir.as_deref()).await?;
        }
        Commands::Import {
            users,
            rooms,
            dry_run,
            on_invalid_row,
        } => {
            commands::import::run(
                &cli.config,
                commands::import::ImportArgs {
                    users,
                    rooms,
                    dry_run,
                    on_invalid_row: on_invalid_row.map(RowFailurePolicy::from),
                },
            )
            .await?;
        }
    }

    Ok(())
}
