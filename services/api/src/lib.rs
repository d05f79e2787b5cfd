mod cli;
mod demo;
mod infra;
mod routes;
mod server;

use motor_norm::error::AppError;

pub async fn run() -> Result<(), AppError> {
    cli::run().await
}
