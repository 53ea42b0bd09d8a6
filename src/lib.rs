//! Authenticated HTTP client that renews short-lived access credentials exactly once per
//! expiry, replays the requests that tripped over the expiry, and tells the application when
//! the session cannot be saved.

#![deny(clippy::all, missing_docs, unused_crate_dependencies)]

pub mod auth;
pub mod client;
pub mod config;
pub mod error;
pub mod http;
pub mod issuer;
pub mod obs;
pub mod renewal;
pub mod session;
#[cfg(any(test, feature = "test"))]
pub mod _preludet {
	//! Convenience re-exports and helpers for tests; enabled via `cfg(test)` or the `test`
	//! crate feature.

	pub use crate::_prelude::*;

	// std
	use std::{collections::VecDeque, convert::Infallible};
	// self
	use crate::http::{HttpTransport, TransportFuture, TransportRequest, TransportResponse};

	/// Status returned once the scripted responses run out.
	pub const UNSCRIPTED_STATUS: u16 = 599;

	#[derive(Debug, Default)]
	struct Script {
		responses: VecDeque<TransportResponse>,
		requests: Vec<TransportRequest>,
	}

	/// In-memory transport that answers from a queue of scripted responses and records every
	/// request it receives. Clones share the same script.
	#[derive(Clone, Debug, Default)]
	pub struct ScriptedTransport(Arc<Mutex<Script>>);
	impl ScriptedTransport {
		/// Queues a raw response.
		pub fn push(&self, response: TransportResponse) {
			self.0.lock().responses.push_back(response);
		}

		/// Queues an empty response with `status`.
		pub fn push_status(&self, status: u16) {
			self.push(TransportResponse::empty(status));
		}

		/// Queues a JSON response.
		pub fn push_json(&self, status: u16, body: serde_json::Value) {
			self.push(TransportResponse::json(status, &body));
		}

		/// Returns every request received so far, oldest first.
		pub fn requests(&self) -> Vec<TransportRequest> {
			self.0.lock().requests.clone()
		}
	}
	impl HttpTransport for ScriptedTransport {
		type TransportError = Infallible;

		fn execute(&self, request: TransportRequest) -> TransportFuture<'_, Self::TransportError> {
			let response = {
				let mut script = self.0.lock();

				script.requests.push(request);

				script
					.responses
					.pop_front()
					.unwrap_or_else(|| TransportResponse::empty(UNSCRIPTED_STATUS))
			};

			Box::pin(async move { Ok(response) })
		}
	}
}

mod _prelude {
	pub use std::{
		collections::BTreeMap,
		error::Error as StdError,
		fmt::{Debug, Display, Formatter, Result as FmtResult},
		future::Future,
		pin::Pin,
		sync::Arc,
	};

	pub use parking_lot::{Mutex, RwLock};
	#[cfg(feature = "reqwest")]
	pub use reqwest::{Client as ReqwestClient, Error as ReqwestError};
	pub use serde::{Deserialize, Serialize};
	pub use thiserror::Error as ThisError;
	pub use time::OffsetDateTime;
	pub use url::Url;

	pub use crate::error::{Error, Result};
}

#[cfg(feature = "reqwest")] pub use reqwest;
pub use url;
#[cfg(test)] use {color_eyre as _, httpmock as _};
