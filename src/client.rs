//! Application-facing client: dispatch, recovery from authorization failures, and replay.
//!
//! Every request goes out with whatever credential the holder has at that moment. When the
//! endpoint answers 401 the request is handed to the [`RenewalCoordinator`]; if renewal
//! succeeds the request is replayed exactly once through the [`ReplayController`], otherwise
//! the caller gets its own original authorization failure back.

pub mod dispatch;
pub mod replay;

mod session;

pub use dispatch::*;
pub use replay::*;

// self
use crate::{
	_prelude::*,
	auth::CredentialHolder,
	config::ClientConfig,
	http::{ApiRequest, ApiResponse, Attempt, HttpTransport, ReplayRequest},
	issuer::{CredentialIssuer, EndpointIssuer},
	obs::{self, OpKind, OpOutcome, OpSpan},
	renewal::{RenewalCoordinator, RenewalOutcome},
	session::{ListenerId, SessionInvalidated, SessionSignal},
};
#[cfg(feature = "reqwest")] use crate::http::ReqwestTransport;

/// HTTP client that renews its access credential transparently.
///
/// Cloning is cheap; every clone shares the holder, the coordinator, and the transport.
pub struct Client<T>
where
	T: ?Sized + HttpTransport,
{
	dispatcher: Arc<Dispatcher<T>>,
	replay: Arc<ReplayController<T>>,
	holder: CredentialHolder,
	coordinator: Arc<RenewalCoordinator>,
	signal: SessionSignal,
}
#[cfg(feature = "reqwest")]
impl Client<ReqwestTransport> {
	/// Builds a client on the default cookie-aware reqwest transport.
	pub fn new(config: ClientConfig) -> Result<Self> {
		Self::with_transport(config, ReqwestTransport::new()?)
	}
}
impl<T> Client<T>
where
	T: ?Sized + HttpTransport,
{
	/// Builds a client whose issuer POSTs to the configured renewal endpoint.
	pub fn with_transport(config: ClientConfig, transport: impl Into<Arc<T>>) -> Result<Self> {
		let dispatcher = Arc::new(Dispatcher::new(Arc::new(config), transport)?);
		let issuer: Arc<dyn CredentialIssuer> = Arc::new(EndpointIssuer::new(dispatcher.clone()));

		Ok(Self::assemble(dispatcher, issuer))
	}

	/// Builds a client that renews through a custom issuer.
	pub fn with_issuer(
		config: ClientConfig,
		transport: impl Into<Arc<T>>,
		issuer: Arc<dyn CredentialIssuer>,
	) -> Result<Self> {
		let dispatcher = Arc::new(Dispatcher::new(Arc::new(config), transport)?);

		Ok(Self::assemble(dispatcher, issuer))
	}

	fn assemble(dispatcher: Arc<Dispatcher<T>>, issuer: Arc<dyn CredentialIssuer>) -> Self {
		let holder = CredentialHolder::default();
		let signal = SessionSignal::default();
		let coordinator =
			Arc::new(RenewalCoordinator::new(issuer, holder.clone(), signal.clone()));
		let replay = Arc::new(ReplayController::new(dispatcher.clone()));

		Self { dispatcher, replay, holder, coordinator, signal }
	}

	/// Returns the validated configuration.
	pub fn config(&self) -> &ClientConfig {
		self.dispatcher.config()
	}

	/// Returns the shared credential holder.
	pub fn holder(&self) -> &CredentialHolder {
		&self.holder
	}

	/// Returns the renewal coordinator.
	pub fn coordinator(&self) -> &Arc<RenewalCoordinator> {
		&self.coordinator
	}

	/// Returns the session teardown signal.
	pub fn session_signal(&self) -> &SessionSignal {
		&self.signal
	}

	/// Registers `listener` to run whenever a failed renewal ends the session.
	pub fn on_session_invalid<F>(&self, listener: F) -> ListenerId
	where
		F: 'static + Fn(&SessionInvalidated) + Send + Sync,
	{
		self.signal.subscribe(listener)
	}

	/// Sends `request`, renewing the credential and replaying once on a 401.
	///
	/// Requests aimed at the renewal endpoint are never recovered. When renewal fails the
	/// caller receives the original [`Error::Unauthorized`].
	pub async fn send(&self, request: ApiRequest) -> Result<ApiResponse> {
		const KIND: OpKind = OpKind::Dispatch;

		let span = OpSpan::new(KIND, "send");

		obs::record_op_outcome(KIND, OpOutcome::Attempt);

		let result = span.instrument(self.dispatch(request)).await;

		match &result {
			Ok(_) => obs::record_op_outcome(KIND, OpOutcome::Success),
			Err(_) => obs::record_op_outcome(KIND, OpOutcome::Failure),
		}

		result
	}

	/// Sends a `GET` for `path`.
	pub async fn get(&self, path: impl Into<String>) -> Result<ApiResponse> {
		self.send(ApiRequest::get(path)).await
	}

	/// Sends a `DELETE` for `path`.
	pub async fn delete(&self, path: impl Into<String>) -> Result<ApiResponse> {
		self.send(ApiRequest::delete(path)).await
	}

	/// Sends a `POST` with `payload` serialized as JSON.
	pub async fn post_json<P>(&self, path: impl Into<String>, payload: &P) -> Result<ApiResponse>
	where
		P: ?Sized + Serialize,
	{
		self.send(ApiRequest::post(path).with_json(payload)?).await
	}

	/// Sends a `PUT` with `payload` serialized as JSON.
	pub async fn put_json<P>(&self, path: impl Into<String>, payload: &P) -> Result<ApiResponse>
	where
		P: ?Sized + Serialize,
	{
		self.send(ApiRequest::put(path).with_json(payload)?).await
	}

	/// Sends a `PATCH` with `payload` serialized as JSON.
	pub async fn patch_json<P>(&self, path: impl Into<String>, payload: &P) -> Result<ApiResponse>
	where
		P: ?Sized + Serialize,
	{
		self.send(ApiRequest::patch(path).with_json(payload)?).await
	}

	async fn dispatch(&self, request: ApiRequest) -> Result<ApiResponse> {
		let snapshot = self.holder.snapshot();
		let failure = match self
			.dispatcher
			.send(&request, snapshot.credential.as_ref(), Attempt::Initial)
			.await
		{
			Err(Error::Unauthorized(failure)) if !self.dispatcher.targets_renewal(&request) =>
				failure,
			other => return other,
		};

		match self.coordinator.recover(&snapshot).await {
			RenewalOutcome::Renewed(credential) =>
				self.replay.replay(ReplayRequest::new(request, credential)).await,
			RenewalOutcome::Failed(_) | RenewalOutcome::SessionEnded => Err(failure.into()),
		}
	}
}
impl<T> Clone for Client<T>
where
	T: ?Sized + HttpTransport,
{
	fn clone(&self) -> Self {
		Self {
			dispatcher: self.dispatcher.clone(),
			replay: self.replay.clone(),
			holder: self.holder.clone(),
			coordinator: self.coordinator.clone(),
			signal: self.signal.clone(),
		}
	}
}
impl<T> Debug for Client<T>
where
	T: ?Sized + HttpTransport,
{
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.debug_struct("Client")
			.field("dispatcher", &self.dispatcher)
			.field("holder", &self.holder)
			.field("coordinator", &self.coordinator)
			.finish()
	}
}

#[cfg(test)]
mod tests {
	// self
	use super::*;
	use crate::{_preludet::ScriptedTransport, auth::AccessCredential, http::Method};

	fn client(transport: ScriptedTransport) -> Client<ScriptedTransport> {
		let config = ClientConfig::builder(
			Url::parse("https://shop.example.com/api").expect("Fixture base URL should parse."),
		)
		.build()
		.expect("Fixture configuration should validate.");

		Client::with_transport(config, transport).expect("Client should build.")
	}

	#[tokio::test]
	async fn unauthorized_request_renews_and_replays_once() {
		let transport = ScriptedTransport::default();

		transport.push_status(401);
		transport.push_json(200, serde_json::json!({ "access_token": "t2" }));
		transport.push_json(200, serde_json::json!({ "items": [1, 2] }));

		let client = client(transport.clone());

		client.holder().set(AccessCredential::new("t1"));

		let response = client.get("/cart").await.expect("Replay should succeed.");
		let sent = transport.requests();

		assert_eq!(response.status, 200);
		assert_eq!(sent.len(), 3);
		assert_eq!(sent[0].header("authorization"), Some("Bearer t1"));
		assert_eq!(sent[1].attempt, Attempt::Renewal);
		assert_eq!(sent[1].header("authorization"), None);
		assert_eq!(sent[1].url.path(), "/api/auth/refresh");
		assert_eq!(sent[2].header("authorization"), Some("Bearer t2"));
		assert!(sent[2].attempt.is_replay());
		assert_eq!(client.holder().get().as_ref().map(AccessCredential::expose), Some("t2"));
	}

	#[tokio::test]
	async fn failed_renewal_returns_original_failure() {
		let transport = ScriptedTransport::default();

		transport.push_status(401);
		transport.push_status(401);

		let client = client(transport.clone());

		client.holder().set(AccessCredential::new("t1"));

		let err = client.delete("/cart/3").await.expect_err("Renewal failure should surface.");

		match err {
			Error::Unauthorized(failure) => {
				assert_eq!(failure.method, Method::Delete);
				assert_eq!(failure.url, "https://shop.example.com/api/cart/3");
			},
			other => panic!("Unexpected error variant: {other:?}."),
		}

		assert_eq!(transport.requests().len(), 2);
		assert_eq!(client.session_signal().raised(), 1);
		assert!(client.holder().is_invalidated());
	}

	#[tokio::test]
	async fn replay_rejection_does_not_renew_again() {
		let transport = ScriptedTransport::default();

		transport.push_status(401);
		transport.push_json(200, serde_json::json!({ "access_token": "t2" }));
		transport.push_status(401);

		let client = client(transport.clone());
		let err = client.get("/orders").await.expect_err("Replay rejection should surface.");

		assert!(err.is_unauthorized());
		assert_eq!(transport.requests().len(), 3);
		assert_eq!(client.coordinator().metrics().issuer_calls(), 1);
	}

	#[tokio::test]
	async fn renewal_endpoint_failure_is_not_recovered() {
		let transport = ScriptedTransport::default();

		transport.push_status(401);

		let client = client(transport.clone());
		let err = client
			.send(ApiRequest::post("auth/refresh"))
			.await
			.expect_err("Renewal endpoint rejection should surface.");

		assert!(err.is_unauthorized());
		assert_eq!(transport.requests().len(), 1);
		assert_eq!(client.coordinator().episodes(), 0);
	}

	#[tokio::test]
	async fn other_statuses_pass_through() {
		let transport = ScriptedTransport::default();

		transport.push_status(403);

		let client = client(transport.clone());
		let err = client
			.post_json("/orders", &serde_json::json!({ "sku": "A-1" }))
			.await
			.expect_err("A 403 should surface unchanged.");

		assert_eq!(err.status(), Some(403));
		assert_eq!(transport.requests().len(), 1);
		assert_eq!(client.coordinator().episodes(), 0);
	}
}
