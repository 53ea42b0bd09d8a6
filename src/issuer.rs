//! Credential issuer contract and the endpoint-backed implementation.

// self
use crate::{
	_prelude::*,
	auth::AccessCredential,
	client::Dispatcher,
	error::AuthorizationFailure,
	http::{ApiRequest, ApiResponse, Attempt, HttpTransport},
};

/// Boxed future returned by [`CredentialIssuer::renew`].
pub type IssuerFuture<'a> =
	Pin<Box<dyn Future<Output = Result<AccessCredential, RenewalError>> + 'a + Send>>;

/// Remote party able to exchange an ambient long-lived secret for a new access credential.
///
/// The renewal coordinator calls [`renew`](CredentialIssuer::renew) at most once per episode
/// and never retries it; any error ends the episode.
pub trait CredentialIssuer
where
	Self: Send + Sync,
{
	/// Requests a fresh access credential.
	fn renew(&self) -> IssuerFuture<'_>;
}

/// Renewal failures; terminal for the episode that produced them.
#[derive(Debug, ThisError)]
pub enum RenewalError {
	/// The renewal endpoint itself answered with an authorization failure.
	#[error("Credential issuer rejected the renewal.")]
	Rejected(#[source] AuthorizationFailure),
	/// The renewal call failed for any other reason.
	#[error("Credential issuer request failed.")]
	Request(#[source] Box<Error>),
	/// The renewal response did not carry a credential.
	#[error("Credential issuer response is missing the `{field}` field.")]
	MissingToken {
		/// Expected JSON field.
		field: String,
	},
	/// The session was ended and no episode produced a credential.
	#[error("Session ended; sign in again.")]
	SessionEnded,
	/// Custom issuer failure.
	#[error("Credential issuer failed: {message}.")]
	Issuer {
		/// Issuer-supplied message.
		message: String,
	},
}
impl From<Error> for RenewalError {
	fn from(e: Error) -> Self {
		match e {
			Error::Unauthorized(failure) => Self::Rejected(failure),
			other => Self::Request(Box::new(other)),
		}
	}
}

/// Issuer that POSTs to the configured renewal endpoint.
///
/// The request carries no `Authorization` header; the long-lived secret travels as whatever the
/// transport attaches ambiently (the reqwest transport's cookie jar).
pub struct EndpointIssuer<T>
where
	T: ?Sized + HttpTransport,
{
	dispatcher: Arc<Dispatcher<T>>,
}
impl<T> EndpointIssuer<T>
where
	T: ?Sized + HttpTransport,
{
	/// Creates an issuer sharing the client's dispatcher.
	pub fn new(dispatcher: Arc<Dispatcher<T>>) -> Self {
		Self { dispatcher }
	}
}
impl<T> CredentialIssuer for EndpointIssuer<T>
where
	T: ?Sized + HttpTransport,
{
	fn renew(&self) -> IssuerFuture<'_> {
		Box::pin(async move {
			let config = self.dispatcher.config();
			let request = ApiRequest::post(config.renewal_path.clone());
			let response = self.dispatcher.send(&request, None, Attempt::Renewal).await?;

			credential_from_response(&response, &config.token_field)
		})
	}
}
impl<T> Debug for EndpointIssuer<T>
where
	T: ?Sized + HttpTransport,
{
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.debug_struct("EndpointIssuer")
			.field("renewal_path", &self.dispatcher.config().renewal_path)
			.finish()
	}
}

/// Reads `field` from a JSON response body as a credential.
pub(crate) fn credential_from_response(
	response: &ApiResponse,
	field: &str,
) -> Result<AccessCredential, RenewalError> {
	let body = response.json::<serde_json::Value>().map_err(Error::from)?;

	credential_from_body(&body, field)
		.ok_or_else(|| RenewalError::MissingToken { field: field.to_owned() })
}

/// Reads `field` from a decoded JSON body; blank strings count as missing.
pub(crate) fn credential_from_body(
	body: &serde_json::Value,
	field: &str,
) -> Option<AccessCredential> {
	body.get(field)
		.and_then(serde_json::Value::as_str)
		.filter(|token| !token.trim().is_empty())
		.map(AccessCredential::new)
}

#[cfg(test)]
mod tests {
	// self
	use super::*;
	use crate::http::Method;

	#[test]
	fn credential_from_body_requires_non_blank_string() {
		let body = serde_json::json!({ "access_token": "t2", "blank": " ", "number": 7 });

		assert_eq!(
			credential_from_body(&body, "access_token").as_ref().map(AccessCredential::expose),
			Some("t2")
		);
		assert!(credential_from_body(&body, "blank").is_none());
		assert!(credential_from_body(&body, "number").is_none());
		assert!(credential_from_body(&body, "missing").is_none());
	}

	#[test]
	fn unauthorized_errors_become_rejections() {
		let failure = AuthorizationFailure {
			status: 401,
			method: Method::Post,
			url: "https://api.example.com/auth/refresh".into(),
			body: Vec::new(),
		};

		assert!(matches!(RenewalError::from(Error::from(failure)), RenewalError::Rejected(_)));

		let status = Error::Status {
			status: 503,
			method: Method::Post,
			url: "https://api.example.com/auth/refresh".into(),
			body: Vec::new(),
		};

		assert!(matches!(RenewalError::from(status), RenewalError::Request(_)));
	}
}
