use clap::Parser;
use log::{error, info};
use std::path::PathBuf;
use wiretap::configuration::config::Config;
use wiretap::controller::controller_handler::Controller;

#[derive(Parser)]
#[command(name = "wiretap")]
#[command(version = "0.1.0")]
#[command(about = "Background packet capture sessions and tshark analysis over HTTP")]
struct Args {
    /// TOML configuration file; when given, it replaces the flags below.
    #[arg(long)]
    config_file: Option<PathBuf>,

    #[command(flatten)]
    config: Config,
}

#[tokio::main]
async fn main() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info"))
        .format_target(false)
        .init();

    println!(
        "
==============================================================================
                               wiretap v0.1.0
        background packet capture sessions and tshark analysis over HTTP
==============================================================================
"
    );

    let args = Args::parse();

    let config = match &args.config_file {
        Some(path) => {
            info!("Importing configuration from {}", path.display());
            match Config::from_file(path) {
                Ok(config) => config,
                Err(e) => {
                    error!("Unable to import configuration from file: {}", e);
                    std::process::exit(1);
                }
            }
        }
        None => args.config,
    };

    if let Err(e) = config.validate() {
        error!("Invalid configuration: {}", e);
        std::process::exit(1);
    }
    info!("Configuration imported successfully");

    let controller = match Controller::new(config) {
        Ok(controller) => controller,
        Err(e) => {
            error!("Unable to create a controller instance: {}, exiting...", e);
            std::process::exit(1);
        }
    };

    tokio::select! {
        result = controller.run() => {
            if let Err(e) = result {
                error!("Error occured in the controller process: {}, exiting...", e);
                std::process::exit(1);
            }
        }
        _ = tokio::signal::ctrl_c() => {
            info!("Interrupted, shutting down; running captures stop on their own limits");
        }
    }
}
