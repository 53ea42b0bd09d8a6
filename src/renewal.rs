//! Single-flight credential renewal.
//!
//! [`RenewalCoordinator`] turns any number of concurrently observed authorization failures
//! into exactly one call to the [`CredentialIssuer`]. The first caller to observe a failure
//! while the coordinator is idle becomes the episode's initiator; everyone arriving while the
//! episode is in flight queues a completion handle and suspends. When the issuer answers, the
//! holder is updated first and only then is the identical [`RenewalOutcome`] fanned out to
//! every waiter, so no waiter can replay with a credential from a different generation.

mod metrics;

pub use metrics::RenewalMetrics;

// std
use std::{
	mem,
	sync::atomic::{AtomicU64, Ordering},
};
// crates.io
use futures::channel::oneshot;
// self
use crate::{
	_prelude::*,
	auth::{AccessCredential, CredentialHolder, CredentialSnapshot},
	issuer::{CredentialIssuer, RenewalError},
	obs::{self, OpKind, OpOutcome, OpSpan},
	session::SessionSignal,
};

/// Observable coordinator state.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum RenewalState {
	/// No renewal in flight.
	Idle,
	/// One renewal in flight; failures queue behind it.
	Refreshing,
}

/// Outcome shared by every participant of a renewal episode.
#[derive(Clone, Debug)]
pub enum RenewalOutcome {
	/// A credential is available; replay with it.
	Renewed(AccessCredential),
	/// The issuer failed; surface the original authorization failure.
	Failed(Arc<RenewalError>),
	/// The session was ended earlier and has not been re-established.
	SessionEnded,
}
impl RenewalOutcome {
	/// Returns the renewed credential, if any.
	pub fn credential(&self) -> Option<&AccessCredential> {
		match self {
			Self::Renewed(credential) => Some(credential),
			_ => None,
		}
	}
}

static NEXT_COORDINATOR: AtomicU64 = AtomicU64::new(0);

struct PendingRenewal {
	id: u64,
	completion: oneshot::Sender<RenewalOutcome>,
}

enum Phase {
	Idle,
	Refreshing {
		episode: u64,
		// True once an authorization failure joined the episode.
		observed_failure: bool,
		waiters: Vec<PendingRenewal>,
	},
}

struct Machine {
	phase: Phase,
	episodes: u64,
	next_waiter: u64,
}

#[derive(Clone, Copy)]
enum Entry {
	Failure { generation: u64 },
	Bootstrap,
}

enum Role {
	Settled(RenewalOutcome),
	Initiator(u64),
	Waiter { episode: u64, id: u64, receiver: oneshot::Receiver<RenewalOutcome> },
}

/// Coordinates credential renewal so at most one issuer call is in flight.
///
/// All transitions happen under one [`Mutex`] that is never held across an `.await`; the
/// issuer call itself runs unlocked in the initiator's task.
pub struct RenewalCoordinator {
	id: u64,
	issuer: Arc<dyn CredentialIssuer>,
	holder: CredentialHolder,
	signal: SessionSignal,
	metrics: Arc<RenewalMetrics>,
	machine: Mutex<Machine>,
}
impl RenewalCoordinator {
	/// Creates an idle coordinator publishing into `holder` and tearing down through `signal`.
	pub fn new(
		issuer: Arc<dyn CredentialIssuer>,
		holder: CredentialHolder,
		signal: SessionSignal,
	) -> Self {
		Self {
			id: NEXT_COORDINATOR.fetch_add(1, Ordering::Relaxed),
			issuer,
			holder,
			signal,
			metrics: Default::default(),
			machine: Mutex::new(Machine { phase: Phase::Idle, episodes: 0, next_waiter: 0 }),
		}
	}

	/// Returns the current state.
	pub fn state(&self) -> RenewalState {
		match self.machine.lock().phase {
			Phase::Idle => RenewalState::Idle,
			Phase::Refreshing { .. } => RenewalState::Refreshing,
		}
	}

	/// Returns how many callers are queued behind the in-flight episode.
	pub fn waiting(&self) -> usize {
		match &self.machine.lock().phase {
			Phase::Idle => 0,
			Phase::Refreshing { waiters, .. } => waiters.len(),
		}
	}

	/// Returns the number of episodes started so far.
	pub fn episodes(&self) -> u64 {
		self.machine.lock().episodes
	}

	/// Returns the renewal counters.
	pub fn metrics(&self) -> &Arc<RenewalMetrics> {
		&self.metrics
	}

	/// Returns the holder this coordinator publishes into.
	pub fn holder(&self) -> &CredentialHolder {
		&self.holder
	}

	/// Resolves an authorization failure observed by a request sent with `observed`.
	///
	/// Starts an episode when idle, joins the in-flight one otherwise. When the holder already
	/// moved past `observed` (a renewal finished after the request left), the current
	/// credential is returned without contacting the issuer. Replayed requests and renewal
	/// endpoint calls must never be routed here.
	pub async fn recover(&self, observed: &CredentialSnapshot) -> RenewalOutcome {
		self.enter(Entry::Failure { generation: observed.generation }).await
	}

	/// Starts (or joins) an episode without an observed failure, e.g. to restore a session at
	/// startup. A failed episode that no authorization failure joined does not raise the
	/// session signal.
	///
	/// An ended session (signed out or torn down) settles to [`RenewalOutcome::SessionEnded`]
	/// without contacting the issuer until a credential is set again.
	pub async fn renew_now(&self) -> RenewalOutcome {
		self.enter(Entry::Bootstrap).await
	}

	async fn enter(&self, entry: Entry) -> RenewalOutcome {
		loop {
			match self.claim(entry) {
				Role::Settled(outcome) => return outcome,
				Role::Initiator(episode) => return self.run_episode(episode).await,
				Role::Waiter { episode, id, receiver } => {
					let _registration = WaiterGuard { coordinator: self, episode, id };

					match receiver.await {
						Ok(outcome) => return outcome,
						// The initiator was dropped mid-flight; elect a new one.
						Err(oneshot::Canceled) => continue,
					}
				},
			}
		}
	}

	fn claim(&self, entry: Entry) -> Role {
		let mut machine = self.machine.lock();
		let id = machine.next_waiter;

		machine.next_waiter += 1;

		match &mut machine.phase {
			Phase::Refreshing { episode, observed_failure, waiters } => {
				let (completion, receiver) = oneshot::channel();
				let episode = *episode;

				if matches!(entry, Entry::Failure { .. }) {
					*observed_failure = true;
				}

				waiters.push(PendingRenewal { id, completion });
				self.metrics.record_coalesced();
				obs::record_op_outcome(OpKind::Renewal, OpOutcome::Coalesced);

				Role::Waiter { episode, id, receiver }
			},
			Phase::Idle => {
				if let Entry::Failure { generation } = entry
					&& let Some(current) = self.holder.newer_than(generation)
				{
					self.metrics.record_short_cut();

					return Role::Settled(RenewalOutcome::Renewed(current));
				}
				if self.holder.is_invalidated() {
					return Role::Settled(RenewalOutcome::SessionEnded);
				}

				machine.episodes += 1;

				let episode = machine.episodes;

				machine.phase = Phase::Refreshing {
					episode,
					observed_failure: matches!(entry, Entry::Failure { .. }),
					waiters: Vec::new(),
				};
				obs::renewal_transition(episode, "idle->refreshing");

				Role::Initiator(episode)
			},
		}
	}

	async fn run_episode(&self, episode: u64) -> RenewalOutcome {
		let mut guard = EpisodeGuard { coordinator: self, episode, armed: true };
		let span = OpSpan::new(OpKind::Renewal, "issuer");

		self.metrics.record_issuer_call();
		obs::record_op_outcome(OpKind::Renewal, OpOutcome::Attempt);

		let result = span.instrument(self.issuer.renew()).await;

		guard.armed = false;

		let (outcome, waiters, observed_failure) = self.settle(episode, result);

		match &outcome {
			RenewalOutcome::Failed(err) => {
				self.metrics.record_failure();
				obs::record_op_outcome(OpKind::Renewal, OpOutcome::Failure);
				obs::renewal_failed(episode, err);
			},
			_ => {
				self.metrics.record_success();
				obs::record_op_outcome(OpKind::Renewal, OpOutcome::Success);
			},
		}

		for waiter in waiters {
			// A closed receiver means the waiter gave up; nothing to deliver.
			let _ = waiter.completion.send(outcome.clone());
		}

		if let (RenewalOutcome::Failed(err), true) = (&outcome, observed_failure) {
			self.signal.raise(self.id, episode, err);
		}

		outcome
	}

	// Publishes the result to the holder and returns to `Idle` in one critical section, so a
	// failure observed right after sees either `Refreshing` or the updated holder.
	fn settle(
		&self,
		episode: u64,
		result: Result<AccessCredential, RenewalError>,
	) -> (RenewalOutcome, Vec<PendingRenewal>, bool) {
		let mut machine = self.machine.lock();
		let (waiters, observed_failure) = match mem::replace(&mut machine.phase, Phase::Idle) {
			Phase::Refreshing { episode: current, observed_failure, waiters }
				if current == episode =>
				(waiters, observed_failure),
			other => {
				machine.phase = other;

				(Vec::new(), false)
			},
		};
		let outcome = match result {
			Ok(credential) => {
				self.holder.set(credential.clone());

				RenewalOutcome::Renewed(credential)
			},
			Err(err) => {
				if observed_failure {
					self.holder.invalidate();
				} else {
					self.holder.clear();
				}

				RenewalOutcome::Failed(Arc::new(err))
			},
		};

		obs::renewal_transition(episode, "refreshing->idle");

		(outcome, waiters, observed_failure)
	}

	fn abandon(&self, episode: u64) {
		let mut machine = self.machine.lock();

		if matches!(machine.phase, Phase::Refreshing { episode: current, .. } if current == episode)
		{
			// Dropping the senders wakes every waiter with `Canceled`.
			machine.phase = Phase::Idle;
			obs::renewal_transition(episode, "abandoned");
		}
	}

	fn deregister(&self, episode: u64, id: u64) {
		let mut machine = self.machine.lock();

		if let Phase::Refreshing { episode: current, waiters, .. } = &mut machine.phase
			&& *current == episode
		{
			waiters.retain(|waiter| waiter.id != id);
		}
	}
}
impl Debug for RenewalCoordinator {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.debug_struct("RenewalCoordinator")
			.field("state", &self.state())
			.field("waiting", &self.waiting())
			.field("metrics", &self.metrics)
			.finish()
	}
}

// Resets the machine when the initiator's future is dropped before the issuer answered.
struct EpisodeGuard<'a> {
	coordinator: &'a RenewalCoordinator,
	episode: u64,
	armed: bool,
}
impl Drop for EpisodeGuard<'_> {
	fn drop(&mut self) {
		if self.armed {
			self.coordinator.abandon(self.episode);
		}
	}
}

// Removes a queued waiter whose future was dropped before the fan-out.
struct WaiterGuard<'a> {
	coordinator: &'a RenewalCoordinator,
	episode: u64,
	id: u64,
}
impl Drop for WaiterGuard<'_> {
	fn drop(&mut self) {
		self.coordinator.deregister(self.episode, self.id);
	}
}
