mod push;
mod sample;

use push::*;
use sample::*;

use clap::{Parser, Subcommand};
use url::Url;

#[derive(Parser, Clone)]
#[command(name = "toucan", version, about = "Report VR interaction events and sample streaming bandwidth")]
pub struct Cli {
	#[command(flatten)]
	log: toucan::Log,

	#[command(subcommand)]
	command: Command,
}

#[derive(Subcommand, Clone)]
pub enum Command {
	/// Send one interaction event to the collector.
	Push {
		#[command(flatten)]
		config: toucan::DispatchConfig,

		#[command(subcommand)]
		event: EventArgs,
	},
	/// Download media and log the bandwidth it consumed.
	Sample {
		#[command(flatten)]
		config: toucan::SamplerConfig,

		/// The URL to download. Repeat to download several transfers in one session.
		#[arg(long = "url", required = true)]
		urls: Vec<Url>,
	},
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
	let cli = Cli::parse();
	cli.log.init();

	match cli.command {
		Command::Push { config, event } => push(config, event).await,
		Command::Sample { config, urls } => sample(config, urls).await,
	}
}
