//! Bulk ingestion CLI
//!
//! 고객/대출 시트(CSV 또는 xlsx)를 DB에 적재하고 id 시퀀스를 맞춘다.
//!
//! ```text
//! credit-ingest --customers data_files/customer_data.xlsx --loans data_files/loan_data.xlsx
//! ```

use std::path::PathBuf;

use clap::Parser;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use credit_system_api::{services::ingest, Config, Database};

#[derive(Debug, Parser)]
#[command(
    name = "credit-ingest",
    about = "Ingest customer and loan sheets (.xlsx/.xls/.ods workbooks or CSV exports)",
    version
)]
struct Args {
    /// 고객 시트 (워크북은 첫 시트만 읽음)
    #[arg(long, env = "CUSTOMER_DATA", default_value = "data_files/customer_data.xlsx")]
    customers: PathBuf,

    /// 대출 시트
    #[arg(long, env = "LOAN_DATA", default_value = "data_files/loan_data.xlsx")]
    loans: PathBuf,

    /// 적재 전에 마이그레이션을 실행하지 않음
    #[arg(long)]
    skip_migrations: bool,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::try_from_default_env()
            .unwrap_or_else(|_| "credit_system_api=info,credit_ingest=info".into()))
        .with(tracing_subscriber::fmt::layer())
        .init();

    let args = Args::parse();
    let config = Config::from_env()?;

    tracing::info!("Starting data ingestion...");
    let db = Database::connect(&config.database_url, config.db_max_connections).await?;
    if !args.skip_migrations {
        db.run_migrations().await?;
    }

    let customers = ingest::load_sheet(&args.customers)?;
    let loans = ingest::load_sheet(&args.loans)?;
    let report = ingest::ingest(&db, customers.as_slice(), loans.as_slice()).await?;

    tracing::info!(
        customers_inserted = report.customers_inserted,
        customers_skipped = report.customers_skipped,
        loans_inserted = report.loans_inserted,
        loans_skipped = report.loans_skipped,
        loans_orphaned = report.loans_orphaned,
        "Data ingestion completed"
    );
    Ok(())
}
