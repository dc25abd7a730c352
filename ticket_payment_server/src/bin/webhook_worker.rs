use std::process::exit;

use dotenvy::dotenv;
use log::{error, info};
use ticket_payment_server::{cli::handle_command_line_args, config::WorkerConfig, worker::run_worker};

#[tokio::main]
async fn main() {
    dotenv().ok();
    env_logger::init();
    if handle_command_line_args() {
        return;
    }
    let config = WorkerConfig::from_env_or_default();
    match run_worker(config).await {
        Ok(_) => {
            info!("👷️ Webhook worker stopped");
            exit(0)
        },
        Err(e) => {
            error!("👷️ Webhook worker stopped. {e}");
            eprintln!("{e}");
            exit(1)
        },
    }
}
