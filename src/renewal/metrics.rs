// std
use std::sync::atomic::{AtomicU64, Ordering};

/// Thread-safe counters for renewal episodes.
#[derive(Debug, Default)]
pub struct RenewalMetrics {
	issuer_calls: AtomicU64,
	success: AtomicU64,
	failure: AtomicU64,
	coalesced: AtomicU64,
	short_cuts: AtomicU64,
}
impl RenewalMetrics {
	/// Returns the number of calls made to the credential issuer.
	pub fn issuer_calls(&self) -> u64 {
		self.issuer_calls.load(Ordering::Relaxed)
	}

	/// Returns the number of episodes that produced a new credential.
	pub fn successes(&self) -> u64 {
		self.success.load(Ordering::Relaxed)
	}

	/// Returns the number of episodes that failed.
	pub fn failures(&self) -> u64 {
		self.failure.load(Ordering::Relaxed)
	}

	/// Returns how many callers joined an episode already in flight.
	pub fn coalesced(&self) -> u64 {
		self.coalesced.load(Ordering::Relaxed)
	}

	/// Returns how many late failures reused a credential renewed after they were sent.
	pub fn short_cuts(&self) -> u64 {
		self.short_cuts.load(Ordering::Relaxed)
	}

	pub(crate) fn record_issuer_call(&self) {
		self.issuer_calls.fetch_add(1, Ordering::Relaxed);
	}

	pub(crate) fn record_success(&self) {
		self.success.fetch_add(1, Ordering::Relaxed);
	}

	pub(crate) fn record_failure(&self) {
		self.failure.fetch_add(1, Ordering::Relaxed);
	}

	pub(crate) fn record_coalesced(&self) {
		self.coalesced.fetch_add(1, Ordering::Relaxed);
	}

	pub(crate) fn record_short_cut(&self) {
		self.short_cuts.fetch_add(1, Ordering::Relaxed);
	}
}
