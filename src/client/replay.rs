//! Replay controller: the single resubmission of a request after renewal.

// self
use crate::{
	_prelude::*,
	client::Dispatcher,
	http::{ApiResponse, Attempt, HttpTransport, ReplayRequest},
	obs::{self, OpKind, OpOutcome, OpSpan},
};

/// Resubmits renewed requests exactly once.
///
/// A replay is dispatched with [`Attempt::Replay`]; whatever the endpoint answers, including
/// another 401, goes straight back to the caller.
pub struct ReplayController<T>
where
	T: ?Sized + HttpTransport,
{
	dispatcher: Arc<Dispatcher<T>>,
}
impl<T> ReplayController<T>
where
	T: ?Sized + HttpTransport,
{
	/// Creates a controller sharing the client's dispatcher.
	pub fn new(dispatcher: Arc<Dispatcher<T>>) -> Self {
		Self { dispatcher }
	}

	/// Dispatches `replay` once with its fresh credential.
	pub async fn replay(&self, replay: ReplayRequest) -> Result<ApiResponse> {
		const KIND: OpKind = OpKind::Replay;

		let span = OpSpan::new(KIND, "replay");

		obs::record_op_outcome(KIND, OpOutcome::Attempt);

		let result = span
			.instrument(self.dispatcher.send(
				replay.request(),
				Some(replay.credential()),
				Attempt::Replay(replay.marker()),
			))
			.await;

		match &result {
			Ok(_) => obs::record_op_outcome(KIND, OpOutcome::Success),
			Err(_) => obs::record_op_outcome(KIND, OpOutcome::Failure),
		}

		result
	}
}
impl<T> Debug for ReplayController<T>
where
	T: ?Sized + HttpTransport,
{
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.debug_struct("ReplayController").field("dispatcher", &self.dispatcher).finish()
	}
}

#[cfg(test)]
mod tests {
	// self
	use super::*;
	use crate::{
		_preludet::ScriptedTransport,
		auth::AccessCredential,
		config::ClientConfig,
		http::ApiRequest,
	};

	fn controller(transport: ScriptedTransport) -> ReplayController<ScriptedTransport> {
		let config = ClientConfig::builder(
			Url::parse("https://shop.example.com/api").expect("Fixture base URL should parse."),
		)
		.build()
		.expect("Fixture configuration should validate.");
		let dispatcher =
			Dispatcher::new(Arc::new(config), transport).expect("Dispatcher should build.");

		ReplayController::new(Arc::new(dispatcher))
	}

	#[tokio::test]
	async fn replay_sends_once_with_fresh_credential() {
		let transport = ScriptedTransport::default();

		transport.push_json(200, serde_json::json!({ "items": [] }));

		let controller = controller(transport.clone());
		let replay = ReplayRequest::new(ApiRequest::get("/cart"), AccessCredential::new("t2"));
		let response = controller.replay(replay).await.expect("Replay should succeed.");
		let sent = transport.requests();

		assert_eq!(response.status, 200);
		assert_eq!(sent.len(), 1);
		assert_eq!(sent[0].header("authorization"), Some("Bearer t2"));
		assert!(sent[0].attempt.is_replay());
	}

	#[tokio::test]
	async fn replay_rejection_is_returned_unchanged() {
		let transport = ScriptedTransport::default();

		transport.push_status(401);

		let controller = controller(transport.clone());
		let replay = ReplayRequest::new(ApiRequest::get("/cart"), AccessCredential::new("t2"));
		let err = controller.replay(replay).await.expect_err("Replay rejection should surface.");

		assert!(err.is_unauthorized());
		assert_eq!(transport.requests().len(), 1);
	}
}
