use std::path::PathBuf;
use std::process::ExitCode;

use log::{error, info};

use pingwatch::{Config, Error, Monitor};

#[tokio::main]
async fn main() -> ExitCode {
    env_logger::init_from_env(env_logger::Env::default().default_filter_or("info"));

    match run().await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            error!("{e}");
            ExitCode::FAILURE
        }
    }
}

async fn run() -> Result<(), Error> {
    // Optional first argument: path to the config file.
    let config_path = std::env::args()
        .nth(1)
        .map_or_else(Config::default_path, PathBuf::from);
    let settings = Config::load(&config_path)?.into_settings()?;

    let mut monitor = Monitor::start(settings)?;

    tokio::select! {
        // The loop only ends on its own when a log write failed.
        result = monitor.join() => return result,
        _ = tokio::signal::ctrl_c() => info!("stop requested"),
    }

    monitor.request_stop();
    monitor.join().await
}
