#![warn(clippy::all, clippy::pedantic, clippy::nursery)]

use age_estimator::Config;
use anyhow::Result;
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

const DEFAULT_LOG_FILTER: &str = "age_estimator=info,age_core=info,tower_http=info";

#[derive(Parser)]
#[clap(version, about = "Estimate a person's age from a photo of their face")]
struct Cli {
	#[clap(subcommand)]
	command: Option<Command>,
}

#[derive(Debug, Subcommand)]
enum Command {
	/// Start the web server (default)
	Serve,

	/// Estimate the age for a local image and exit
	Predict {
		/// Path to the image
		image: PathBuf,
	},
}

#[tokio::main]
async fn main() -> Result<()> {
	tracing_subscriber::fmt()
		.with_env_filter(
			EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_LOG_FILTER)),
		)
		.init();

	let cli = Cli::parse();
	let config = Config::from_env()?;

	match cli.command.unwrap_or(Command::Serve) {
		Command::Serve => age_estimator::start(config).await,
		Command::Predict { image } => {
			let age = age_estimator::predict_file(&config, image).await?;
			println!("{age}");

			Ok(())
		},
	}
}
