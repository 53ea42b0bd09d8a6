//! Client-level error types shared across dispatch, renewal, and replay.

// self
use crate::{_prelude::*, http::Method, issuer::RenewalError};

/// Client-wide result type alias returning [`Error`] by default.
pub type Result<T, E = Error> = std::result::Result<T, E>;

type BoxError = Box<dyn std::error::Error + Send + Sync>;

/// Canonical client error exposed by public APIs.
///
/// Renewal is invisible to callers: a request that could not be recovered surfaces the same
/// [`Error::Unauthorized`] it produced before any renewal detour.
#[derive(Debug, ThisError)]
pub enum Error {
	/// Local configuration problem.
	#[error(transparent)]
	Config(#[from] ConfigError),
	/// Transport failure (DNS, TCP, TLS).
	#[error(transparent)]
	Transport(#[from] TransportError),
	/// Response body could not be decoded.
	#[error(transparent)]
	Decode(#[from] DecodeError),
	/// The presented credential was rejected.
	#[error(transparent)]
	Unauthorized(#[from] AuthorizationFailure),
	/// Endpoint answered with a non-success status other than 401.
	#[error("{method} {url} failed with HTTP {status}.")]
	Status {
		/// HTTP status code.
		status: u16,
		/// Request method.
		method: Method,
		/// Fully resolved request URL.
		url: String,
		/// Raw response body.
		body: Vec<u8>,
	},
	/// Credential renewal failed while restoring a session.
	#[error("Credential renewal failed.")]
	Renewal(#[source] Arc<RenewalError>),
}
impl Error {
	/// Returns the HTTP status carried by the error, if any.
	pub fn status(&self) -> Option<u16> {
		match self {
			Self::Unauthorized(failure) => Some(failure.status),
			Self::Status { status, .. } => Some(*status),
			_ => None,
		}
	}

	/// Returns true when the error is an authorization failure.
	pub fn is_unauthorized(&self) -> bool {
		matches!(self, Self::Unauthorized(_))
	}
}

/// Distinguished "credential rejected" signal returned by an endpoint.
#[derive(Clone, Debug, PartialEq, Eq, ThisError)]
#[error("{method} {url} was rejected as unauthorized (HTTP {status}).")]
pub struct AuthorizationFailure {
	/// HTTP status code (401).
	pub status: u16,
	/// Request method.
	pub method: Method,
	/// Fully resolved request URL.
	pub url: String,
	/// Raw response body.
	pub body: Vec<u8>,
}

/// Configuration and request-construction failures.
#[derive(Debug, ThisError)]
pub enum ConfigError {
	/// HTTP client could not be constructed.
	#[error("HTTP client could not be constructed.")]
	HttpClientBuild {
		/// Underlying transport builder failure.
		#[source]
		source: BoxError,
	},
	/// Client configuration failed validation.
	#[error(transparent)]
	Invalid(#[from] crate::config::ClientConfigError),
	/// Request path could not be joined onto the base URL.
	#[error("Request path `{path}` cannot be resolved against the base URL.")]
	InvalidPath {
		/// Offending path.
		path: String,
		/// Underlying parsing failure.
		#[source]
		source: url::ParseError,
	},
	/// Request body could not be serialized.
	#[error("Request body could not be serialized.")]
	Body(#[from] serde_json::Error),
}
impl ConfigError {
	/// Wraps a transport's builder failure inside [`ConfigError`].
	pub fn http_client_build(src: impl 'static + Send + Sync + std::error::Error) -> Self {
		Self::HttpClientBuild { source: Box::new(src) }
	}
}
#[cfg(feature = "reqwest")]
impl From<ReqwestError> for ConfigError {
	fn from(e: ReqwestError) -> Self {
		Self::http_client_build(e)
	}
}

/// Transport-level failures.
#[derive(Debug, ThisError)]
pub enum TransportError {
	/// Underlying HTTP client reported a network failure.
	#[error("Network error occurred while calling {url}.")]
	Network {
		/// Fully resolved request URL.
		url: String,
		/// Transport-specific network error.
		#[source]
		source: BoxError,
	},
}
impl TransportError {
	/// Wraps a transport-specific network error.
	pub fn network(url: impl Into<String>, src: impl 'static + Send + Sync + StdError) -> Self {
		Self::Network { url: url.into(), source: Box::new(src) }
	}
}

/// Response decoding failures.
#[derive(Debug, ThisError)]
pub enum DecodeError {
	/// Body was not valid JSON for the requested type.
	#[error("Response body from {url} is not valid JSON for the requested type.")]
	Json {
		/// Fully resolved request URL.
		url: String,
		/// Structured parsing failure.
		#[source]
		source: serde_path_to_error::Error<serde_json::Error>,
	},
	/// A credential-bearing response lacked the configured token field.
	#[error("Response body from {url} is missing the `{field}` field.")]
	MissingToken {
		/// Fully resolved request URL.
		url: String,
		/// Expected JSON field.
		field: String,
	},
}
