//! Diabetes screening - main entry point

use clap::Parser;
use diabetes_screening::cli::{cmd_serve, cmd_train, Cli, Commands};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "diabetes_screening=info,tower_http=info".into()),
        )
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Train { data, model_dir } => {
            cmd_train(&data, &model_dir)?;
        }
        Commands::Serve { host, port, model_dir } => {
            cmd_serve(host, port, model_dir).await?;
        }
    }

    Ok(())
}
