//! Request descriptions, the replay variant, and the transport-level request.

// self
use crate::{_prelude::*, auth::AccessCredential, error::ConfigError};

/// HTTP methods issued by the client.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Method {
	/// `GET`.
	Get,
	/// `POST`.
	Post,
	/// `PUT`.
	Put,
	/// `PATCH`.
	Patch,
	/// `DELETE`.
	Delete,
}
impl Method {
	/// Returns the canonical method token.
	pub const fn as_str(self) -> &'static str {
		match self {
			Method::Get => "GET",
			Method::Post => "POST",
			Method::Put => "PUT",
			Method::Patch => "PATCH",
			Method::Delete => "DELETE",
		}
	}
}
impl Display for Method {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.write_str(self.as_str())
	}
}
#[cfg(feature = "reqwest")]
impl From<Method> for reqwest::Method {
	fn from(method: Method) -> Self {
		match method {
			Method::Get => reqwest::Method::GET,
			Method::Post => reqwest::Method::POST,
			Method::Put => reqwest::Method::PUT,
			Method::Patch => reqwest::Method::PATCH,
			Method::Delete => reqwest::Method::DELETE,
		}
	}
}

/// Description of a request against a resource endpoint.
///
/// Paths are resolved against the configured base URL. The description never carries the
/// credential; the dispatcher attaches whatever the holder provides at send time.
#[derive(Clone, Debug, PartialEq)]
pub struct ApiRequest {
	/// Request method.
	pub method: Method,
	/// Path relative to the base URL.
	pub path: String,
	/// Query pairs appended to the resolved URL.
	pub query: Vec<(String, String)>,
	/// Extra headers sent with the request.
	pub headers: Vec<(String, String)>,
	/// Optional JSON payload.
	pub body: Option<serde_json::Value>,
}
impl ApiRequest {
	/// Creates a request without query, headers, or body.
	pub fn new(method: Method, path: impl Into<String>) -> Self {
		Self { method, path: path.into(), query: Vec::new(), headers: Vec::new(), body: None }
	}

	/// Shorthand for a `GET` request.
	pub fn get(path: impl Into<String>) -> Self {
		Self::new(Method::Get, path)
	}

	/// Shorthand for a `POST` request.
	pub fn post(path: impl Into<String>) -> Self {
		Self::new(Method::Post, path)
	}

	/// Shorthand for a `PUT` request.
	pub fn put(path: impl Into<String>) -> Self {
		Self::new(Method::Put, path)
	}

	/// Shorthand for a `PATCH` request.
	pub fn patch(path: impl Into<String>) -> Self {
		Self::new(Method::Patch, path)
	}

	/// Shorthand for a `DELETE` request.
	pub fn delete(path: impl Into<String>) -> Self {
		Self::new(Method::Delete, path)
	}

	/// Appends a query pair.
	pub fn with_query(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
		self.query.push((name.into(), value.into()));

		self
	}

	/// Appends a header.
	pub fn with_header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
		self.headers.push((name.into(), value.into()));

		self
	}

	/// Sets a pre-built JSON payload.
	pub fn with_body(mut self, body: serde_json::Value) -> Self {
		self.body = Some(body);

		self
	}

	/// Serializes `payload` into the JSON body.
	pub fn with_json<T>(self, payload: &T) -> Result<Self, ConfigError>
	where
		T: ?Sized + Serialize,
	{
		Ok(self.with_body(serde_json::to_value(payload)?))
	}
}

/// Tag carried by every replayed request.
///
/// The field is private, so only a [`ReplayRequest`] built by this crate can hold one.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct RetryMarker(());

/// A failed request scheduled for its single replay with a freshly renewed credential.
///
/// Replays are a distinct type: the renewal coordinator only ever accepts [`ApiRequest`], so
/// a replay that fails authorization again can only be surfaced to its caller.
#[derive(Clone, Debug)]
pub struct ReplayRequest {
	request: ApiRequest,
	credential: AccessCredential,
	marker: RetryMarker,
}
impl ReplayRequest {
	/// Tags `original` for replay with `credential`.
	pub fn new(original: ApiRequest, credential: AccessCredential) -> Self {
		Self { request: original, credential, marker: RetryMarker(()) }
	}

	/// Returns the request description being replayed.
	pub fn request(&self) -> &ApiRequest {
		&self.request
	}

	/// Returns the credential the replay carries.
	pub fn credential(&self) -> &AccessCredential {
		&self.credential
	}

	/// Returns the retry marker.
	pub fn marker(&self) -> RetryMarker {
		self.marker
	}
}

/// Why a request reached the transport.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Attempt {
	/// First dispatch of an application request.
	Initial,
	/// Single replay after a successful renewal.
	Replay(RetryMarker),
	/// Call against the credential issuer itself.
	Renewal,
}
impl Attempt {
	/// Returns a stable label suitable for span or metric fields.
	pub const fn as_str(self) -> &'static str {
		match self {
			Attempt::Initial => "initial",
			Attempt::Replay(_) => "replay",
			Attempt::Renewal => "renewal",
		}
	}

	/// Returns true for replayed requests.
	pub const fn is_replay(self) -> bool {
		matches!(self, Attempt::Replay(_))
	}
}
impl Display for Attempt {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.write_str(self.as_str())
	}
}

/// Fully resolved request handed to an [`HttpTransport`](crate::http::HttpTransport).
#[derive(Clone, Debug)]
pub struct TransportRequest {
	/// Request method.
	pub method: Method,
	/// Absolute URL including query.
	pub url: Url,
	/// Headers, including `Authorization` when a credential was attached.
	pub headers: Vec<(String, String)>,
	/// Serialized body.
	pub body: Option<Vec<u8>>,
	/// Dispatch reason.
	pub attempt: Attempt,
}
impl TransportRequest {
	/// Returns the first header value matching `name` case-insensitively.
	pub fn header(&self, name: &str) -> Option<&str> {
		self.headers
			.iter()
			.find(|(key, _)| key.eq_ignore_ascii_case(name))
			.map(|(_, value)| value.as_str())
	}
}
