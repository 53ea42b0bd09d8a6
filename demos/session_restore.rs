//! Restores a session at startup through the renewal endpoint, loads the signed-in profile,
//! then signs out and shows that the ended session is not silently revived.

// crates.io
use color_eyre::Result;
use httpmock::prelude::*;
// self
use renewal_client::{client::Client, config::ClientConfig, url::Url};

#[tokio::main]
async fn main() -> Result<()> {
	color_eyre::install()?;

	let server = MockServer::start_async().await;
	let refresh = server
		.mock_async(|when, then| {
			when.method(POST).path("/api/auth/refresh");
			then.status(200)
				.header("content-type", "application/json")
				.json_body(serde_json::json!({ "access_token": "restored" }));
		})
		.await;
	let me = server
		.mock_async(|when, then| {
			when.method(GET).path("/api/auth/me").header("authorization", "Bearer restored");
			then.status(200)
				.header("content-type", "application/json")
				.json_body(serde_json::json!({ "id": 7, "email": "ada@example.com" }));
		})
		.await;
	let logout = server
		.mock_async(|when, then| {
			when.method(POST).path("/api/auth/logout");
			then.status(204);
		})
		.await;
	let config = ClientConfig::builder(Url::parse(&server.url("/api"))?).build()?;
	let client = Client::new(config)?;

	client.on_session_invalid(|event| println!("Session ended: {}.", event.reason));

	let profile = client.restore_session().await?;

	println!("Restored session for {}.", profile["email"]);

	client.sign_out().await;

	match client.bootstrap().await {
		Ok(_) => println!("Unexpectedly restored a signed-out session."),
		Err(e) => println!("Bootstrap after sign-out was refused: {e}."),
	}

	refresh.assert_calls_async(1).await;
	me.assert_async().await;
	logout.assert_async().await;

	Ok(())
}
