use process::error::FetchError;
use thiserror::Error;
use tokio_cron_scheduler::JobSchedulerError;

#[derive(Error, Debug)]
pub enum AppError {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Io error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Client error: {0}")]
    Client(#[from] FetchError),

    #[error("Scheduler error: {0}")]
    Scheduler(#[from] JobSchedulerError),
}
