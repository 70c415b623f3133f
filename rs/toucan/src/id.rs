use std::num::NonZero;
use std::sync::atomic::{AtomicU64, Ordering};

// Starts at 1 so the id fits in a NonZero. Initialised at compile time, never reset.
static NEXT_SAMPLER_ID: AtomicU64 = AtomicU64::new(1);

/// A process-unique handle for a [crate::BandwidthSampler].
///
/// Only used to tell concurrently alive samplers apart in diagnostics.
/// Each sampler owns its own file handle, so the id never decides where samples are written.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct SamplerId(NonZero<u64>);

impl SamplerId {
	pub(crate) fn next() -> Self {
		let id = NEXT_SAMPLER_ID.fetch_add(1, Ordering::Relaxed);
		// Only 0 after 2^64 allocations.
		Self(NonZero::new(id).unwrap_or(NonZero::<u64>::MIN))
	}
}

impl std::fmt::Display for SamplerId {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		write!(f, "{}", self.0.get())
	}
}

impl From<SamplerId> for u64 {
	fn from(value: SamplerId) -> Self {
		value.0.get()
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn test_ids_are_unique() {
		let a = SamplerId::next();
		let b = SamplerId::next();
		let c = SamplerId::next();

		assert_ne!(a, b);
		assert_ne!(b, c);
		assert!(u64::from(a) >= 1);
	}

	#[test]
	fn test_ids_increase() {
		let a = SamplerId::next();
		let b = SamplerId::next();
		assert!(b > a);
	}

	#[test]
	fn test_unique_across_threads() {
		let handles: Vec<_> = (0..8)
			.map(|_| std::thread::spawn(|| (0..100).map(|_| SamplerId::next()).collect::<Vec<_>>()))
			.collect();

		let mut all: Vec<_> = handles.into_iter().flat_map(|h| h.join().unwrap()).collect();
		let count = all.len();
		all.sort();
		all.dedup();
		assert_eq!(all.len(), count);
	}
}
