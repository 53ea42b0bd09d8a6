//! One-shot session teardown notifications.
//!
//! The renewal coordinator raises [`SessionSignal`] once per failed renewal episode, after the
//! credential holder has been cleared. Listeners typically route the user back to a sign-in
//! screen; the client itself never navigates.

// std
use std::sync::atomic::{AtomicU64, Ordering};
// self
use crate::_prelude::*;

type Listener = Arc<dyn Fn(&SessionInvalidated) + Send + Sync>;

/// Payload delivered to session listeners.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionInvalidated {
	/// Renewal episode that failed.
	pub episode: u64,
	/// Human-readable renewal failure.
	pub reason: String,
	/// Instant the session was torn down.
	pub at: OffsetDateTime,
}

/// Handle returned by [`SessionSignal::subscribe`].
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct ListenerId(u64);

#[derive(Default)]
struct Registry {
	next_id: u64,
	listeners: Vec<(ListenerId, Listener)>,
	// Last raised episode per coordinator.
	last_episodes: BTreeMap<u64, u64>,
}

/// Shared listener registry for session-invalid notifications.
///
/// Cloning yields another handle to the same registry.
#[derive(Clone, Default)]
pub struct SessionSignal {
	registry: Arc<Mutex<Registry>>,
	raised: Arc<AtomicU64>,
}
impl SessionSignal {
	/// Registers a listener invoked on every session teardown.
	pub fn subscribe<F>(&self, listener: F) -> ListenerId
	where
		F: 'static + Fn(&SessionInvalidated) + Send + Sync,
	{
		let mut registry = self.registry.lock();
		let id = ListenerId(registry.next_id);

		registry.next_id += 1;
		registry.listeners.push((id, Arc::new(listener)));

		id
	}

	/// Removes a listener; returns false when it was not registered.
	pub fn unsubscribe(&self, id: ListenerId) -> bool {
		let mut registry = self.registry.lock();
		let before = registry.listeners.len();

		registry.listeners.retain(|(listener_id, _)| *listener_id != id);

		registry.listeners.len() != before
	}

	/// Returns how many teardowns have been raised so far.
	pub fn raised(&self) -> u64 {
		self.raised.load(Ordering::Acquire)
	}

	/// Notifies every listener that `episode` of coordinator `source` ended the session.
	///
	/// Episodes are numbered per coordinator, so de-duplication is keyed by `source`: raising
	/// the same `(source, episode)` twice is a no-op while coordinators sharing one signal each
	/// get their teardowns delivered. Listeners run outside the registry lock and may subscribe
	/// or unsubscribe freely.
	pub(crate) fn raise(&self, source: u64, episode: u64, reason: &dyn Display) -> bool {
		let listeners = {
			let mut registry = self.registry.lock();
			let last = registry.last_episodes.entry(source).or_default();

			if *last >= episode {
				return false;
			}

			*last = episode;

			registry.listeners.iter().map(|(_, listener)| listener.clone()).collect::<Vec<_>>()
		};
		let event = SessionInvalidated {
			episode,
			reason: reason.to_string(),
			at: OffsetDateTime::now_utc(),
		};

		self.raised.fetch_add(1, Ordering::AcqRel);

		for listener in listeners {
			listener(&event);
		}

		true
	}
}
impl Debug for SessionSignal {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.debug_struct("SessionSignal")
			.field("listeners", &self.registry.lock().listeners.len())
			.field("raised", &self.raised())
			.finish()
	}
}
