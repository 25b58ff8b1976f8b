use std::sync::Arc;

use clap::{Parser, Subcommand};
use rst_common::with_tokio::tokio;

use didxd::errors::DaemonError;
use didxd::svc::check::Check;
use didxd::svc::logging;
use didxd::svc::send::{Delivery, ResponsePrinter};

#[derive(Parser)]
#[command(name = "didxd")]
#[command(version = "0.1")]
#[command(long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    #[command(name = "config")]
    #[command(about = "Validate a configuration file and print its settings")]
    Config {
        #[arg(short, long, value_name = "FILE")]
        config: String,
    },

    #[command(name = "send")]
    #[command(about = "Deliver an encrypted envelope file to an agent endpoint")]
    Send {
        #[arg(short, long, value_name = "FILE")]
        config: String,

        #[arg(short, long, value_name = "FILE")]
        envelope: String,

        #[arg(long, value_name = "URL")]
        endpoint: String,

        #[arg(long)]
        #[arg(help = "Wait for a response on the same connection")]
        response_requested: bool,
    },
}

#[tokio::main]
async fn main() -> Result<(), DaemonError> {
    logging::init();

    let cli = Cli::parse();
    match &cli.command {
        Commands::Config { config } => {
            let parsed = Check::new(config.to_owned()).run()?;
            for (key, value) in Check::summary(&parsed) {
                println!("{:<26}{}", key, value);
            }
        }
        Commands::Send {
            config,
            envelope,
            endpoint,
            response_requested,
        } => {
            let parsed = Check::new(config.to_owned()).run()?;
            let envelope = Delivery::load_envelope(envelope).await?;

            Delivery::new(parsed.agent().clone(), endpoint.to_owned())
                .with_response_requested(*response_requested)
                .run(envelope, Arc::new(ResponsePrinter))
                .await?;
        }
    }

    Ok(())
}
