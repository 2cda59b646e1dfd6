use crate::cli::ImportArgs;
use property_records::config::AppConfig;
use property_records::error::AppError;
use property_records::import::import_csv_path;
use property_records::records::{PropertyService, SqlitePropertyRepository};
use property_records::telemetry;
use std::sync::Arc;

pub(crate) async fn run_import(args: ImportArgs) -> Result<(), AppError> {
    let config = AppConfig::load()?;
    telemetry::init(&config.telemetry)?;

    let repository = SqlitePropertyRepository::connect(&config.database).await?;
    let service = PropertyService::new(Arc::new(repository));
    let summary = import_csv_path(&service, &args.csv).await?;

    println!(
        "Imported {} properties from {} ({} rows failed)",
        summary.imported,
        args.csv.display(),
        summary.failed
    );
    Ok(())
}
