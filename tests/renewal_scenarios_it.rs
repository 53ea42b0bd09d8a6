// std
use std::{
	collections::VecDeque,
	convert::Infallible,
	sync::{
		Arc,
		atomic::{AtomicBool, AtomicUsize, Ordering},
	},
};
// crates.io
use parking_lot::Mutex;
use tokio::sync::Notify;
// self
use renewal_client::{
	auth::AccessCredential,
	client::Client,
	config::ClientConfig,
	error::Error,
	http::{Attempt, HttpTransport, TransportFuture, TransportRequest, TransportResponse},
	renewal::RenewalState,
	url::Url,
};

enum RenewalPlan {
	Issue(&'static str),
	IssueUnaccepted(&'static str),
	Reject,
}

#[derive(Clone, Debug)]
struct Seen {
	path: String,
	authorization: Option<String>,
	attempt: Attempt,
}

#[derive(Default)]
struct Backend {
	accepted: Mutex<Option<String>>,
	plans: Mutex<VecDeque<RenewalPlan>>,
	seen: Mutex<Vec<Seen>>,
	renewals: AtomicUsize,
	gated: AtomicBool,
	gate: Notify,
}
impl Backend {
	fn new(plans: impl IntoIterator<Item = RenewalPlan>) -> Arc<Self> {
		Arc::new(Self { plans: Mutex::new(plans.into_iter().collect()), ..Default::default() })
	}

	fn gated(plans: impl IntoIterator<Item = RenewalPlan>) -> Arc<Self> {
		let backend = Self::new(plans);

		backend.gated.store(true, Ordering::SeqCst);

		backend
	}

	fn accept(&self, token: &str) {
		*self.accepted.lock() = Some(token.into());
	}

	fn expire(&self) {
		*self.accepted.lock() = None;
	}

	fn renewals(&self) -> usize {
		self.renewals.load(Ordering::SeqCst)
	}

	fn seen(&self) -> Vec<Seen> {
		self.seen.lock().clone()
	}

	fn replays(&self) -> Vec<Seen> {
		self.seen().into_iter().filter(|seen| seen.attempt.is_replay()).collect()
	}

	fn authorized(&self, request: &TransportRequest) -> bool {
		let accepted = self.accepted.lock();

		match (accepted.as_deref(), request.header("authorization")) {
			(Some(token), Some(header)) => header == format!("Bearer {token}"),
			_ => false,
		}
	}

	async fn renew(&self) -> TransportResponse {
		self.renewals.fetch_add(1, Ordering::SeqCst);

		if self.gated.load(Ordering::SeqCst) {
			self.gate.notified().await;
		}

		let plan = self.plans.lock().pop_front().unwrap_or(RenewalPlan::Reject);

		match plan {
			RenewalPlan::Issue(token) => {
				self.accept(token);

				TransportResponse::json(200, &serde_json::json!({ "access_token": token }))
			},
			RenewalPlan::IssueUnaccepted(token) =>
				TransportResponse::json(200, &serde_json::json!({ "access_token": token })),
			RenewalPlan::Reject => TransportResponse::empty(401),
		}
	}
}

#[derive(Clone)]
struct BackendTransport(Arc<Backend>);
impl HttpTransport for BackendTransport {
	type TransportError = Infallible;

	fn execute(&self, request: TransportRequest) -> TransportFuture<'_, Self::TransportError> {
		Box::pin(async move {
			let backend = &self.0;
			let path = request.url.path().trim_start_matches("/api/").to_owned();

			backend.seen.lock().push(Seen {
				path: path.clone(),
				authorization: request.header("authorization").map(str::to_owned),
				attempt: request.attempt,
			});

			let response = match path.as_str() {
				"auth/refresh" => backend.renew().await,
				"auth/login" => {
					backend.accept("t5");

					TransportResponse::json(
						200,
						&serde_json::json!({ "access_token": "t5", "user": { "id": 1 } }),
					)
				},
				"missing" => TransportResponse::empty(404),
				_ if backend.authorized(&request) =>
					TransportResponse::json(200, &serde_json::json!({ "path": path })),
				_ => TransportResponse::empty(401),
			};

			Ok(response)
		})
	}
}

fn client(backend: &Arc<Backend>) -> Client<BackendTransport> {
	let config = ClientConfig::builder(
		Url::parse("https://shop.example.com/api").expect("Fixture base URL should parse."),
	)
	.build()
	.expect("Fixture configuration should validate.");

	Client::with_transport(config, BackendTransport(backend.clone()))
		.expect("Client should build.")
}

async fn release_when_waiting(client: &Client<BackendTransport>, backend: &Backend, count: usize) {
	while client.coordinator().waiting() < count {
		tokio::task::yield_now().await;
	}

	backend.gate.notify_one();
}

#[tokio::test]
async fn concurrent_expiry_renews_once_and_replays_everyone() {
	let backend = Backend::gated([RenewalPlan::Issue("t2")]);
	let client = client(&backend);

	client.holder().set(AccessCredential::new("t1"));

	let paths = ["cart", "orders", "profile", "wishlist", "addresses"];
	let requests = paths.map(|path| client.get(path));
	let (responses, ()) = tokio::join!(
		futures::future::join_all(requests),
		release_when_waiting(&client, &backend, 4)
	);

	for response in responses {
		assert_eq!(response.expect("Every request should succeed after renewal.").status, 200);
	}

	let replays = backend.replays();

	assert_eq!(backend.renewals(), 1);
	assert_eq!(replays.len(), 5);
	assert!(replays.iter().all(|seen| seen.authorization.as_deref() == Some("Bearer t2")));
	assert_eq!(client.holder().get().as_ref().map(AccessCredential::expose), Some("t2"));
	assert_eq!(client.coordinator().state(), RenewalState::Idle);
	assert_eq!(client.coordinator().metrics().coalesced(), 4);
	assert_eq!(client.session_signal().raised(), 0);
}

#[tokio::test]
async fn sequential_expiries_start_separate_episodes() {
	let backend = Backend::new([RenewalPlan::Issue("t2"), RenewalPlan::Issue("t3")]);
	let client = client(&backend);

	client.holder().set(AccessCredential::new("t1"));
	client.get("cart").await.expect("First expiry should recover.");
	backend.expire();
	client.get("cart").await.expect("Second expiry should recover.");

	assert_eq!(backend.renewals(), 2);
	assert_eq!(client.coordinator().episodes(), 2);
	assert_eq!(client.holder().get().as_ref().map(AccessCredential::expose), Some("t3"));
}

#[tokio::test]
async fn rejected_replay_surfaces_without_another_renewal() {
	let backend = Backend::new([RenewalPlan::IssueUnaccepted("t2"), RenewalPlan::Issue("t3")]);
	let client = client(&backend);

	client.holder().set(AccessCredential::new("t1"));

	let err = client.get("cart").await.expect_err("A rejected replay should surface.");

	match err {
		Error::Unauthorized(failure) => assert!(failure.url.ends_with("/api/cart")),
		other => panic!("Unexpected error variant: {other:?}."),
	}

	let paths = backend.seen().into_iter().map(|seen| seen.path).collect::<Vec<_>>();

	assert_eq!(paths, ["cart", "auth/refresh", "cart"]);
	assert_eq!(backend.renewals(), 1);
	assert_eq!(client.session_signal().raised(), 0);
}

#[tokio::test]
async fn failed_renewal_tears_down_once_and_rejects_everyone() {
	let backend = Backend::gated([RenewalPlan::Reject]);
	let client = client(&backend);
	let notified = Arc::new(AtomicUsize::new(0));
	let counter = notified.clone();

	client.on_session_invalid(move |_| {
		counter.fetch_add(1, Ordering::SeqCst);
	});
	client.holder().set(AccessCredential::new("t1"));

	let paths = ["cart", "orders", "profile"];
	let requests = paths.map(|path| client.get(path));
	let (results, ()) = tokio::join!(
		futures::future::join_all(requests),
		release_when_waiting(&client, &backend, 2)
	);

	for (result, path) in results.into_iter().zip(paths) {
		match result {
			Err(Error::Unauthorized(failure)) =>
				assert!(failure.url.ends_with(&format!("/api/{path}"))),
			other => panic!("Unexpected result: {other:?}."),
		}
	}

	assert_eq!(backend.renewals(), 1);
	assert_eq!(notified.load(Ordering::SeqCst), 1);
	assert!(client.holder().get().is_none());
	assert!(backend.replays().is_empty());

	// The ended session neither renews nor signals again.
	let err = client.get("cart").await.expect_err("Ended sessions should stay rejected.");

	assert!(err.is_unauthorized());
	assert_eq!(backend.renewals(), 1);
	assert_eq!(notified.load(Ordering::SeqCst), 1);

	// Signing in again re-opens the session.
	client
		.sign_in(&serde_json::json!({ "email": "ada@example.com" }))
		.await
		.expect("Sign-in should succeed.");

	let response = client.get("cart").await.expect("Signed-in request should succeed.");

	assert_eq!(response.status, 200);
}

#[tokio::test]
async fn renewal_endpoint_requests_are_never_recovered() {
	let backend = Backend::new([RenewalPlan::Reject, RenewalPlan::Issue("t2")]);
	let client = client(&backend);

	client.holder().set(AccessCredential::new("t1"));

	let err = client
		.post_json("auth/refresh", &serde_json::json!({}))
		.await
		.expect_err("The renewal endpoint's 401 should surface.");

	assert!(err.is_unauthorized());
	assert_eq!(backend.renewals(), 1);
	assert_eq!(client.coordinator().episodes(), 0);
	assert_eq!(backend.seen()[0].authorization, None);
}

#[tokio::test]
async fn non_authorization_failures_pass_through() {
	let backend = Backend::new([RenewalPlan::Issue("t2")]);
	let client = client(&backend);

	client.holder().set(AccessCredential::new("t1"));

	let err = client.get("missing").await.expect_err("A 404 should surface.");

	assert_eq!(err.status(), Some(404));
	assert_eq!(backend.renewals(), 0);
	assert_eq!(backend.seen().len(), 1);
}
