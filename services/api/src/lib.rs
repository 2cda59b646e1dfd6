mod cli;
mod import;
mod infra;
mod routes;
mod server;

use property_records::error::AppError;

pub async fn run() -> Result<(), AppError> {
    cli::run().await
}
