use std::sync::LazyLock;
use std::time::{Instant, SystemTime, UNIX_EPOCH};

/// A monotonic source of elapsed milliseconds.
///
/// Bandwidth samples are stamped with this rather than the wall clock,
/// so adjusting the system time never reorders or skews a log.
pub trait Clock: Send + 'static {
	fn elapsed_millis(&self) -> u64;
}

// Shared by every SystemClock so samples from different samplers are comparable.
static ANCHOR: LazyLock<Instant> = LazyLock::new(Instant::now);

/// Milliseconds since the first [SystemClock] reading in this process.
#[derive(Debug, Default, Clone, Copy)]
pub struct SystemClock;

impl SystemClock {
	pub fn new() -> Self {
		// Pin the anchor now instead of at the first sample.
		LazyLock::force(&ANCHOR);
		Self
	}
}

impl Clock for SystemClock {
	fn elapsed_millis(&self) -> u64 {
		u64::try_from(ANCHOR.elapsed().as_millis()).unwrap_or(u64::MAX)
	}
}

/// Wall-clock milliseconds since the Unix epoch, used to stamp captured events.
pub fn wall_clock_millis() -> u64 {
	SystemTime::now()
		.duration_since(UNIX_EPOCH)
		.map(|d| u64::try_from(d.as_millis()).unwrap_or(u64::MAX))
		.unwrap_or(0)
}
