//! Bandwidth sampling driven by the media transfer lifecycle.
//!
//! A [BandwidthSampler] owns one CSV file for its whole life. Every chunk notification appends
//! `"{elapsed_ms}, {total_bytes}"`, where the total is cumulative over the session.
//! Only the very first transfer start of a session is logged; later starts are silent even when
//! they begin a new transfer.

use std::fs::{self, File, OpenOptions};
use std::io::{self, BufWriter, Write};
use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};

use chrono::{DateTime, Local};

use crate::{Clock, Error, Result, SamplerConfig, SamplerId, SystemClock};

// Gives up on finding a free file name after this many suffixes.
const MAX_NAME_ATTEMPTS: u32 = 1000;

/// The lifecycle hooks a streaming engine calls while it downloads media.
pub trait TransferListener {
	/// A transfer is about to start.
	fn on_transfer_start(&mut self);

	/// `bytes` more bytes were received by the current transfer.
	fn on_bytes_transferred(&mut self, bytes: u64);

	/// The current transfer ended.
	fn on_transfer_end(&mut self);
}

/// One line of a bandwidth log.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BandwidthSample {
	/// Monotonic milliseconds, see [Clock].
	pub elapsed: u64,
	/// Bytes consumed since the sampler was created.
	pub total_bytes: u64,
}

impl std::fmt::Display for BandwidthSample {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		write!(f, "{}, {}", self.elapsed, self.total_bytes)
	}
}

struct SampleLog {
	writer: BufWriter<Box<dyn Write + Send>>,
	pending: usize,
	last_flush: Instant,
	flush_lines: usize,
	flush_interval: Duration,
}

impl SampleLog {
	fn new(writer: Box<dyn Write + Send>, flush_lines: usize, flush_interval: Duration) -> Self {
		Self {
			writer: BufWriter::new(writer),
			pending: 0,
			last_flush: Instant::now(),
			flush_lines: flush_lines.max(1),
			flush_interval,
		}
	}

	fn from_config(file: File, config: &SamplerConfig) -> Self {
		Self::new(Box::new(file), config.flush_lines, config.flush_interval)
	}

	fn append(&mut self, sample: BandwidthSample) -> io::Result<()> {
		writeln!(self.writer, "{sample}")?;
		self.pending += 1;

		if self.pending >= self.flush_lines || self.last_flush.elapsed() >= self.flush_interval {
			self.flush()?;
		}

		Ok(())
	}

	fn flush(&mut self) -> io::Result<()> {
		self.writer.flush()?;
		self.pending = 0;
		self.last_flush = Instant::now();
		Ok(())
	}
}

/// Records cumulative bytes consumed during playback to `{prefix}_bandwidth_{date}.csv`.
///
/// Meant to be driven by one transfer thread at a time. Writes are buffered and flushed every
/// [SamplerConfig::flush_lines] samples, every [SamplerConfig::flush_interval], at the end of each
/// transfer and on drop.
///
/// File system errors never reach the caller's thread as a panic. They are logged, kept in
/// [BandwidthSampler::error], and the sampler carries on counting without a log.
pub struct BandwidthSampler<C: Clock = SystemClock> {
	id: SamplerId,
	path: PathBuf,
	clock: C,
	total_bytes: u64,
	first_transfer: bool,
	log: Option<SampleLog>,
	error: Option<Error>,
}

impl BandwidthSampler {
	/// Create a sampler logging into `dir`, failing if the log file can't be created.
	pub fn create(prefix: &str, dir: impl AsRef<Path>) -> Result<Self> {
		Self::open(&Self::config(prefix, dir), SystemClock::new())
	}

	/// Create a sampler logging into `dir`, counting without a log if the file can't be created.
	pub fn new(prefix: &str, dir: impl AsRef<Path>) -> Self {
		Self::open_or_degraded(&Self::config(prefix, dir), SystemClock::new())
	}

	pub fn from_config(config: &SamplerConfig) -> Self {
		Self::open_or_degraded(config, SystemClock::new())
	}

	fn config(prefix: &str, dir: impl AsRef<Path>) -> SamplerConfig {
		SamplerConfig {
			dir: dir.as_ref().to_path_buf(),
			prefix: prefix.to_string(),
			..Default::default()
		}
	}
}

impl<C: Clock> BandwidthSampler<C> {
	pub fn open(config: &SamplerConfig, clock: C) -> Result<Self> {
		let (path, file) = create_log_file(&config.dir, &config.prefix, Local::now())?;
		Ok(Self::with_log(path, clock, Some(SampleLog::from_config(file, config))))
	}

	pub fn open_or_degraded(config: &SamplerConfig, clock: C) -> Self {
		let now = Local::now();

		match create_log_file(&config.dir, &config.prefix, now) {
			Ok((path, file)) => Self::with_log(path, clock, Some(SampleLog::from_config(file, config))),
			Err(err) => {
				let path = config.dir.join(log_file_name(&config.prefix, &timestamp(now), 0));
				let mut sampler = Self::with_log(path, clock, None);
				sampler.degrade(err);
				sampler
			}
		}
	}

	fn with_log(path: PathBuf, clock: C, log: Option<SampleLog>) -> Self {
		Self {
			id: SamplerId::next(),
			path,
			clock,
			total_bytes: 0,
			first_transfer: true,
			log,
			error: None,
		}
	}

	pub fn id(&self) -> SamplerId {
		self.id
	}

	/// The log file path, or the path that could not be created in degraded mode.
	pub fn path(&self) -> &Path {
		&self.path
	}

	pub fn total_bytes(&self) -> u64 {
		self.total_bytes
	}

	/// True once the log has failed; samples are only counted from then on.
	pub fn is_degraded(&self) -> bool {
		self.log.is_none()
	}

	/// The error that put the sampler in degraded mode, if any.
	pub fn error(&self) -> Option<&Error> {
		self.error.as_ref()
	}

	/// Push buffered samples to the file.
	pub fn flush(&mut self) {
		if let Some(Err(err)) = self.log.as_mut().map(SampleLog::flush) {
			self.degrade(err);
		}
	}

	fn record(&mut self) {
		let sample = BandwidthSample {
			elapsed: self.clock.elapsed_millis(),
			total_bytes: self.total_bytes,
		};

		if let Some(Err(err)) = self.log.as_mut().map(|log| log.append(sample)) {
			self.degrade(err);
		}
	}

	fn degrade(&mut self, err: io::Error) {
		tracing::error!(
			sampler = %self.id,
			path = %self.path.display(),
			%err,
			"bandwidth log unavailable, counting without it"
		);
		self.log = None;
		self.error = Some(err.into());
	}
}

impl<C: Clock> TransferListener for BandwidthSampler<C> {
	/// Logs the current total, but only for the first start this sampler ever sees.
	fn on_transfer_start(&mut self) {
		if self.first_transfer {
			self.record();
			self.first_transfer = false;
		}
	}

	fn on_bytes_transferred(&mut self, bytes: u64) {
		self.total_bytes = self.total_bytes.saturating_add(bytes);
		self.record();
	}

	/// Writes no sample; only pushes buffered ones to disk.
	fn on_transfer_end(&mut self) {
		self.flush();
	}
}

impl<C: Clock> Drop for BandwidthSampler<C> {
	fn drop(&mut self) {
		if let Some(Err(err)) = self.log.as_mut().map(SampleLog::flush) {
			tracing::error!(sampler = %self.id, path = %self.path.display(), %err, "failed to flush bandwidth log");
		}
	}
}

fn timestamp(now: DateTime<Local>) -> String {
	now.format("%Y_%m_%d_%H_%M_%S").to_string()
}

fn log_file_name(prefix: &str, timestamp: &str, attempt: u32) -> String {
	match attempt {
		0 => format!("{prefix}_bandwidth_{timestamp}.csv"),
		n => format!("{prefix}_bandwidth_{timestamp}_{n}.csv"),
	}
}

// Never reuses an existing file: a name taken in the same second gets a numeric suffix.
fn create_log_file(dir: &Path, prefix: &str, now: DateTime<Local>) -> io::Result<(PathBuf, File)> {
	fs::create_dir_all(dir)?;
	let timestamp = timestamp(now);

	for attempt in 0..MAX_NAME_ATTEMPTS {
		let path = dir.join(log_file_name(prefix, &timestamp, attempt));

		match OpenOptions::new().append(true).create_new(true).open(&path) {
			Ok(file) => {
				tracing::debug!(path = %path.display(), "created bandwidth log");
				return Ok((path, file));
			}
			Err(err) if err.kind() == io::ErrorKind::AlreadyExists => continue,
			Err(err) => return Err(err),
		}
	}

	Err(io::Error::new(
		io::ErrorKind::AlreadyExists,
		format!("no free bandwidth log name for {prefix} at {timestamp}"),
	))
}
