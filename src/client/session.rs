//! Session lifecycle: sign-in, sign-out, and startup restore.

// self
use crate::{
	_prelude::*,
	auth::AccessCredential,
	client::Client,
	error::DecodeError,
	http::{ApiRequest, Attempt, HttpTransport},
	issuer::{self, RenewalError},
	obs::{self, OpKind, OpOutcome, OpSpan},
	renewal::RenewalOutcome,
};

impl<T> Client<T>
where
	T: ?Sized + HttpTransport,
{
	/// Exchanges `credentials` at the sign-in endpoint and stores the returned access
	/// credential.
	///
	/// Returns the full response body (typically the user profile). A 401 here means the
	/// credentials were wrong and is returned as-is; it never starts a renewal.
	pub async fn sign_in<P>(&self, credentials: &P) -> Result<serde_json::Value>
	where
		P: ?Sized + Serialize,
	{
		const KIND: OpKind = OpKind::SignIn;

		let span = OpSpan::new(KIND, "sign_in");

		obs::record_op_outcome(KIND, OpOutcome::Attempt);

		let result = span
			.instrument(async {
				let config = self.config();
				let request = ApiRequest::post(config.sign_in_path.clone()).with_json(credentials)?;
				let response = self.dispatcher.send(&request, None, Attempt::Initial).await?;
				let body = response.json::<serde_json::Value>()?;
				let credential = issuer::credential_from_body(&body, &config.token_field)
					.ok_or_else(|| DecodeError::MissingToken {
						url: response.url.to_string(),
						field: config.token_field.clone(),
					})?;

				self.holder.set(credential);

				Ok::<_, Error>(body)
			})
			.await;

		match &result {
			Ok(_) => obs::record_op_outcome(KIND, OpOutcome::Success),
			Err(_) => obs::record_op_outcome(KIND, OpOutcome::Failure),
		}

		result
	}

	/// Tells the server to drop the session, then forgets the local credential.
	///
	/// The server call is best-effort; its failure is recorded but never returned. Afterwards
	/// authorization failures surface without renewal, and [`Client::bootstrap`] is refused,
	/// until the next sign-in.
	pub async fn sign_out(&self) {
		const KIND: OpKind = OpKind::SignOut;

		let span = OpSpan::new(KIND, "sign_out");

		obs::record_op_outcome(KIND, OpOutcome::Attempt);

		let request = ApiRequest::post(self.config().sign_out_path.clone());
		let credential = self.holder.get();
		let result = span
			.instrument(self.dispatcher.send(&request, credential.as_ref(), Attempt::Initial))
			.await;

		self.holder.invalidate();

		match result {
			Ok(_) => obs::record_op_outcome(KIND, OpOutcome::Success),
			Err(_) => obs::record_op_outcome(KIND, OpOutcome::Failure),
		}
	}

	/// Restores a session at startup by renewing through the ambient long-lived secret.
	///
	/// Runs through the coordinator, so requests failing concurrently share the same issuer
	/// call. A failure clears the holder without raising the session signal. After sign-out or
	/// a teardown the session stays ended: this returns [`RenewalError::SessionEnded`] without
	/// contacting the issuer.
	pub async fn bootstrap(&self) -> Result<AccessCredential> {
		const KIND: OpKind = OpKind::Bootstrap;

		let span = OpSpan::new(KIND, "bootstrap");

		obs::record_op_outcome(KIND, OpOutcome::Attempt);

		match span.instrument(self.coordinator.renew_now()).await {
			RenewalOutcome::Renewed(credential) => {
				obs::record_op_outcome(KIND, OpOutcome::Success);

				Ok(credential)
			},
			RenewalOutcome::Failed(err) => {
				obs::record_op_outcome(KIND, OpOutcome::Failure);

				Err(Error::Renewal(err))
			},
			RenewalOutcome::SessionEnded => {
				obs::record_op_outcome(KIND, OpOutcome::Failure);

				Err(Error::Renewal(Arc::new(RenewalError::SessionEnded)))
			},
		}
	}

	/// Restores the session and fetches the signed-in user's profile.
	///
	/// The profile request goes through [`Client::send`], so it carries the restored credential
	/// and recovers from an expiry like any other request.
	pub async fn restore_session(&self) -> Result<serde_json::Value> {
		let span = OpSpan::new(OpKind::Bootstrap, "restore_session");

		span.instrument(async {
			self.bootstrap().await?;

			let response = self.get(self.config().profile_path.clone()).await?;

			Ok::<_, Error>(response.json::<serde_json::Value>()?)
		})
		.await
	}
}
