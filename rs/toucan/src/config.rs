use std::path::PathBuf;
use std::time::Duration;

use clap::Parser;
use serde::{Deserialize, Serialize};

/// Where and how interaction events are delivered.
#[derive(Parser, Clone, Debug, Deserialize, Serialize)]
#[serde(deny_unknown_fields, default)]
pub struct DispatchConfig {
	/// Base URL of the event collector, e.g. `http://10.0.0.2`.
	#[arg(long = "endpoint", env = "TOUCAN_ENDPOINT", default_value = "http://localhost")]
	pub endpoint: String,

	/// How long to wait for the collector to accept a connection.
	#[arg(
		long = "connect-timeout",
		env = "TOUCAN_CONNECT_TIMEOUT",
		default_value = "1500ms",
		value_parser = humantime::parse_duration
	)]
	#[serde(with = "humantime_serde")]
	pub connect_timeout: Duration,

	/// Optional limit on the whole request, response included.
	/// Unset means only the connect timeout applies.
	#[arg(long = "request-timeout", env = "TOUCAN_REQUEST_TIMEOUT", value_parser = humantime::parse_duration)]
	#[serde(with = "humantime_serde")]
	pub request_timeout: Option<Duration>,

	/// The User-Agent sent with every event.
	#[arg(long = "user-agent", default_value = DEFAULT_USER_AGENT)]
	pub user_agent: String,
}

const DEFAULT_USER_AGENT: &str = "Test";

impl Default for DispatchConfig {
	fn default() -> Self {
		Self {
			endpoint: "http://localhost".to_string(),
			connect_timeout: Duration::from_millis(1500),
			request_timeout: None,
			user_agent: DEFAULT_USER_AGENT.to_string(),
		}
	}
}

/// Where bandwidth logs go and how often they are flushed.
#[derive(Parser, Clone, Debug, Deserialize, Serialize)]
#[serde(deny_unknown_fields, default)]
pub struct SamplerConfig {
	/// Directory for bandwidth logs, created if missing.
	#[arg(long = "bandwidth-dir", env = "TOUCAN_LOG_DIR", default_value = "toucan/logs")]
	pub dir: PathBuf,

	/// Prefix of each log file name.
	#[arg(long = "bandwidth-prefix", env = "TOUCAN_LOG_PREFIX", default_value = "toucan")]
	pub prefix: String,

	/// Flush buffered samples at least this often.
	#[arg(long = "bandwidth-flush-interval", default_value = "1s", value_parser = humantime::parse_duration)]
	#[serde(with = "humantime_serde")]
	pub flush_interval: Duration,

	/// Flush after this many buffered samples. 1 flushes every sample.
	#[arg(long = "bandwidth-flush-lines", default_value_t = 64)]
	pub flush_lines: usize,
}

impl Default for SamplerConfig {
	fn default() -> Self {
		Self {
			dir: PathBuf::from("toucan/logs"),
			prefix: "toucan".to_string(),
			flush_interval: Duration::from_secs(1),
			flush_lines: 64,
		}
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[derive(Parser)]
	struct Cli {
		#[command(flatten)]
		dispatch: DispatchConfig,

		#[command(flatten)]
		sampler: SamplerConfig,
	}

	#[test]
	fn test_cli_defaults_match_default() {
		let cli = Cli::parse_from(["toucan"]);

		let dispatch = DispatchConfig::default();
		assert_eq!(cli.dispatch.endpoint, dispatch.endpoint);
		assert_eq!(cli.dispatch.connect_timeout, dispatch.connect_timeout);
		assert_eq!(cli.dispatch.request_timeout, None);
		assert_eq!(cli.dispatch.user_agent, "Test");

		let sampler = SamplerConfig::default();
		assert_eq!(cli.sampler.dir, sampler.dir);
		assert_eq!(cli.sampler.prefix, sampler.prefix);
		assert_eq!(cli.sampler.flush_interval, sampler.flush_interval);
		assert_eq!(cli.sampler.flush_lines, sampler.flush_lines);
	}

	#[test]
	fn test_cli_overrides() {
		let cli = Cli::parse_from([
			"toucan",
			"--endpoint",
			"http://10.0.0.2",
			"--connect-timeout",
			"3s",
			"--request-timeout",
			"250ms",
			"--bandwidth-dir",
			"/tmp/logs",
			"--bandwidth-flush-lines",
			"1",
		]);

		assert_eq!(cli.dispatch.endpoint, "http://10.0.0.2");
		assert_eq!(cli.dispatch.connect_timeout, Duration::from_secs(3));
		assert_eq!(cli.dispatch.request_timeout, Some(Duration::from_millis(250)));
		assert_eq!(cli.sampler.dir, PathBuf::from("/tmp/logs"));
		assert_eq!(cli.sampler.flush_lines, 1);
	}
}
