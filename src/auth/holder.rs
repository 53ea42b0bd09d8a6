//! Shared slot holding the current access credential.

// self
use crate::{_prelude::*, auth::AccessCredential};

/// Point-in-time view of the holder captured when a request is dispatched.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct CredentialSnapshot {
	/// Credential attached to the request, if any.
	pub credential: Option<AccessCredential>,
	/// Holder generation observed together with the credential.
	pub generation: u64,
}

#[derive(Debug, Default)]
struct Slot {
	credential: Option<AccessCredential>,
	issued_at: Option<OffsetDateTime>,
	generation: u64,
	invalidated: bool,
}

/// Process-wide credential slot read by every outgoing request.
///
/// Cloning yields another handle to the same slot. Writes are visible to every subsequent
/// read immediately; each `set`/`clear` bumps a generation counter so the renewal
/// coordinator can tell whether a failing request was sent with an outdated credential.
#[derive(Clone, Debug, Default)]
pub struct CredentialHolder(Arc<RwLock<Slot>>);
impl CredentialHolder {
	/// Creates a holder seeded with an initial credential.
	pub fn with_credential(credential: AccessCredential) -> Self {
		let holder = Self::default();

		holder.set(credential);

		holder
	}

	/// Returns the current credential, if any.
	pub fn get(&self) -> Option<AccessCredential> {
		self.0.read().credential.clone()
	}

	/// Replaces the current credential and re-opens an invalidated session.
	pub fn set(&self, credential: AccessCredential) {
		let mut slot = self.0.write();

		slot.credential = Some(credential);
		slot.issued_at = Some(OffsetDateTime::now_utc());
		slot.generation += 1;
		slot.invalidated = false;
	}

	/// Drops the current credential.
	pub fn clear(&self) {
		let mut slot = self.0.write();

		slot.credential = None;
		slot.issued_at = None;
		slot.generation += 1;
	}

	/// Drops the current credential and marks the session as ended.
	///
	/// Authorization failures observed while invalidated are surfaced directly instead of
	/// starting a renewal, until [`set`](Self::set) installs a new credential.
	pub fn invalidate(&self) {
		let mut slot = self.0.write();

		slot.credential = None;
		slot.issued_at = None;
		slot.generation += 1;
		slot.invalidated = true;
	}

	/// Returns the credential together with the generation it belongs to.
	pub fn snapshot(&self) -> CredentialSnapshot {
		let slot = self.0.read();

		CredentialSnapshot { credential: slot.credential.clone(), generation: slot.generation }
	}

	/// Returns the current generation counter.
	pub fn generation(&self) -> u64 {
		self.0.read().generation
	}

	/// Returns when the current credential was installed.
	pub fn issued_at(&self) -> Option<OffsetDateTime> {
		self.0.read().issued_at
	}

	/// Returns true when a credential is present.
	pub fn is_authenticated(&self) -> bool {
		self.0.read().credential.is_some()
	}

	/// Returns true when the session was ended by a failed renewal or a sign-out.
	pub fn is_invalidated(&self) -> bool {
		self.0.read().invalidated
	}

	/// Returns the current credential when it was installed after `generation`.
	pub(crate) fn newer_than(&self, generation: u64) -> Option<AccessCredential> {
		let slot = self.0.read();

		if slot.generation == generation { None } else { slot.credential.clone() }
	}
}

#[cfg(test)]
mod tests {
	// self
	use super::*;

	#[test]
	fn writes_are_visible_across_handles() {
		let holder = CredentialHolder::default();
		let other = holder.clone();

		assert!(holder.get().is_none());

		holder.set(AccessCredential::new("t1"));

		assert_eq!(other.get().as_ref().map(AccessCredential::expose), Some("t1"));
		assert!(other.issued_at().is_some());

		other.clear();

		assert!(holder.get().is_none());
		assert!(holder.issued_at().is_none());
		assert!(!holder.is_invalidated());
	}

	#[test]
	fn generation_tracks_every_write() {
		let holder = CredentialHolder::with_credential(AccessCredential::new("t1"));
		let before = holder.snapshot();

		assert_eq!(before.generation, 1);
		assert!(holder.newer_than(before.generation).is_none());

		holder.set(AccessCredential::new("t2"));

		assert_eq!(
			holder.newer_than(before.generation).as_ref().map(AccessCredential::expose),
			Some("t2")
		);

		holder.clear();

		assert_eq!(holder.generation(), 3);
		assert!(holder.newer_than(before.generation).is_none());
	}

	#[test]
	fn set_reopens_invalidated_session() {
		let holder = CredentialHolder::with_credential(AccessCredential::new("t1"));

		holder.invalidate();

		assert!(holder.is_invalidated());
		assert!(!holder.is_authenticated());

		holder.set(AccessCredential::new("t2"));

		assert!(!holder.is_invalidated());
		assert!(holder.is_authenticated());
	}
}
