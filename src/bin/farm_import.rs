use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};

use clap::{Parser, Subcommand, ValueEnum};
use indicatif::{ProgressBar, ProgressStyle};
use tracing::info;

use farm_tracker_service::db::{
    CostRepository, DbPool, ImportSummary, ProductionRepository, SupplyRepository,
};
use farm_tracker_service::importers::{ExcelImporter, SheetTable};
use farm_tracker_service::services::report_service::Table;
use farm_tracker_service::services::{
    ProductionService, ReportService, SettingsService, SupplyService,
};
use farm_tracker_service::settings::SettingsStore;

#[derive(Parser)]
#[command(name = "farm-import")]
#[command(about = "Bulk import farm spreadsheets and dump tables as CSV", long_about = None)]
struct Cli {
    /// Database connection string
    #[arg(long, env)]
    database_url: String,

    /// Settings document used for defaults
    #[arg(long, env, default_value = "config.json")]
    settings_path: PathBuf,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Import a production workbook (.xlsx)
    ImportProduction {
        file: PathBuf,
    },
    /// Import a supply workbook (.xlsx)
    ImportSupplies {
        file: PathBuf,
    },
    /// Write one table as CSV
    Export {
        #[arg(value_enum)]
        table: ExportTable,

        /// Output file, stdout when omitted
        #[arg(long, short)]
        output: Option<PathBuf>,
    },
}

#[derive(Clone, Copy, ValueEnum)]
enum ExportTable {
    Production,
    Supplies,
    Costs,
}

impl From<ExportTable> for Table {
    fn from(table: ExportTable) -> Self {
        match table {
            ExportTable::Production => Table::Production,
            ExportTable::Supplies => Table::Supplies,
            ExportTable::Costs => Table::Costs,
        }
    }
}

fn spinner(message: String) -> ProgressBar {
    let pb = ProgressBar::new_spinner();
    pb.set_style(
        ProgressStyle::default_spinner()
            .template("{spinner:.green} {msg}")
            .unwrap_or_else(|_| ProgressStyle::default_spinner()),
    );
    pb.enable_steady_tick(Duration::from_millis(100));
    pb.set_message(message);
    pb
}

fn read_workbook(file: &Path) -> Result<SheetTable, Box<dyn std::error::Error>> {
    let pb = spinner(format!("Reading {}...", file.display()));
    let sheet = ExcelImporter::read_path(file)?;
    pb.finish_with_message(format!("✓ Read {} rows", sheet.len()));
    Ok(sheet)
}

fn report(summary: &ImportSummary, started: Instant) {
    println!(
        "Inserted {} of {} rows in {:.1}s",
        summary.inserted,
        summary.rows_read,
        started.elapsed().as_secs_f64()
    );
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let _ = dotenvy::dotenv();

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    let cli = Cli::parse();

    info!("Connecting to database...");
    let pool = DbPool::connect(&cli.database_url, 5).await?.into_inner();
    let settings = SettingsService::load(SettingsStore::new(cli.settings_path))?;

    match cli.command {
        Command::ImportProduction { file } => {
            let started = Instant::now();
            let sheet = read_workbook(&file)?;
            let service =
                ProductionService::new(ProductionRepository::new(pool), settings, None);

            let pb = spinner("Inserting production rows...".to_string());
            let summary = service.import_sheet(&sheet).await?;
            pb.finish_with_message("✓ Production rows stored");
            report(&summary, started);
        }
        Command::ImportSupplies { file } => {
            let started = Instant::now();
            let sheet = read_workbook(&file)?;
            let service = SupplyService::new(SupplyRepository::new(pool));

            let pb = spinner("Inserting supply rows...".to_string());
            let summary = service.import_sheet(&sheet).await?;
            pb.finish_with_message("✓ Supply rows stored");
            report(&summary, started);
        }
        Command::Export { table, output } => {
            let service = ReportService::new(
                ProductionRepository::new(pool.clone()),
                SupplyRepository::new(pool.clone()),
                CostRepository::new(pool),
                settings,
            );
            let csv = service.table_csv(table.into()).await?;
            match output {
                Some(path) => {
                    std::fs::write(&path, csv)?;
                    info!("Wrote {}", path.display());
                }
                None => print!("{csv}"),
            }
        }
    }

    Ok(())
}
