//! Optional observability helpers for client operations.
//!
//! # Feature Flags
//!
//! - Enable `tracing` to emit structured spans named `renewal_client.op` with the `op` and `stage`
//!   fields, plus debug/warn events at renewal state transitions.
//! - Enable `metrics` to increment the `renewal_client_op_total` counter for every
//!   attempt/success/failure/coalesced outcome, labeled by `op` + `outcome`.

mod metrics;
mod tracing;

pub use metrics::*;
pub use tracing::*;

// self
use crate::_prelude::*;

/// Operation kinds observed by the client.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum OpKind {
	/// First dispatch of an application request.
	Dispatch,
	/// Credential renewal episode.
	Renewal,
	/// Replay of a request after renewal.
	Replay,
	/// Sign-in exchange.
	SignIn,
	/// Sign-out call.
	SignOut,
	/// Startup session restore.
	Bootstrap,
}
impl OpKind {
	/// Returns a stable label suitable for span or metric fields.
	pub const fn as_str(self) -> &'static str {
		match self {
			OpKind::Dispatch => "dispatch",
			OpKind::Renewal => "renewal",
			OpKind::Replay => "replay",
			OpKind::SignIn => "sign_in",
			OpKind::SignOut => "sign_out",
			OpKind::Bootstrap => "bootstrap",
		}
	}
}
impl Display for OpKind {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.write_str(self.as_str())
	}
}

/// Outcome labels recorded for each operation.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum OpOutcome {
	/// Entry to an operation.
	Attempt,
	/// Successful completion.
	Success,
	/// Failure propagated back to the caller.
	Failure,
	/// Joined an operation already in flight instead of starting one.
	Coalesced,
}
impl OpOutcome {
	/// Returns a stable label suitable for span or metric fields.
	pub const fn as_str(self) -> &'static str {
		match self {
			OpOutcome::Attempt => "attempt",
			OpOutcome::Success => "success",
			OpOutcome::Failure => "failure",
			OpOutcome::Coalesced => "coalesced",
		}
	}
}
impl Display for OpOutcome {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.write_str(self.as_str())
	}
}
