use clap::Args;
use tracing::level_filters::LevelFilter;
use tracing_subscriber::EnvFilter;

// Dependencies that are chatty at debug level.
const QUIET: &[&str] = &["hyper=warn", "hyper_util=warn", "reqwest=info", "rustls=info"];

/// Diagnostic logging for the telemetry pipeline itself.
///
/// `RUST_LOG` takes precedence over `--log-level` when set.
#[derive(Args, Clone, Debug)]
pub struct Log {
	/// The default log level.
	#[arg(long = "log-level", env = "TOUCAN_LOG_LEVEL", default_value_t = tracing::Level::INFO)]
	pub level: tracing::Level,
}

impl Default for Log {
	fn default() -> Self {
		Self {
			level: tracing::Level::INFO,
		}
	}
}

impl Log {
	pub fn level(&self) -> LevelFilter {
		LevelFilter::from_level(self.level)
	}

	/// Install a global fmt subscriber writing to stderr.
	///
	/// Does nothing if a subscriber is already installed.
	pub fn init(&self) {
		let mut filter = EnvFilter::builder()
			.with_default_directive(self.level().into())
			.from_env_lossy();

		for directive in QUIET {
			if let Ok(directive) = directive.parse() {
				filter = filter.add_directive(directive);
			}
		}

		let _ = tracing_subscriber::fmt()
			.with_env_filter(filter)
			.with_writer(std::io::stderr)
			.try_init();
	}
}
