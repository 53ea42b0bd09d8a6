//! Raw transport responses and the decoded application response.

// self
use crate::{_prelude::*, error::DecodeError};

/// Raw response returned by an [`HttpTransport`](crate::http::HttpTransport).
#[derive(Clone, Debug, Default)]
pub struct TransportResponse {
	/// HTTP status code.
	pub status: u16,
	/// Response headers keyed by lowercase name.
	pub headers: BTreeMap<String, String>,
	/// Raw body bytes.
	pub body: Vec<u8>,
}
impl TransportResponse {
	/// Builds a JSON response with the provided status.
	pub fn json(status: u16, body: &serde_json::Value) -> Self {
		let mut headers = BTreeMap::new();

		headers.insert("content-type".into(), "application/json".into());

		Self { status, headers, body: body.to_string().into_bytes() }
	}

	/// Builds an empty response with the provided status.
	pub fn empty(status: u16) -> Self {
		Self { status, ..Default::default() }
	}

	/// Returns true for 2xx statuses.
	pub fn is_success(&self) -> bool {
		(200..300).contains(&self.status)
	}
}

/// Successful response surfaced to callers.
#[derive(Clone, Debug)]
pub struct ApiResponse {
	/// HTTP status code.
	pub status: u16,
	/// Fully resolved URL the response came from.
	pub url: Url,
	/// Response headers keyed by lowercase name.
	pub headers: BTreeMap<String, String>,
	/// Raw body bytes.
	pub body: Vec<u8>,
}
impl ApiResponse {
	/// Returns a header value by lowercase name.
	pub fn header(&self, name: &str) -> Option<&str> {
		self.headers.get(&name.to_ascii_lowercase()).map(String::as_str)
	}

	/// Returns the body as UTF-8 text, replacing invalid sequences.
	pub fn text(&self) -> String {
		String::from_utf8_lossy(&self.body).into_owned()
	}

	/// Decodes the body as JSON, reporting the failing path on error.
	pub fn json<T>(&self) -> Result<T, DecodeError>
	where
		T: for<'de> Deserialize<'de>,
	{
		let mut deserializer = serde_json::Deserializer::from_slice(&self.body);

		serde_path_to_error::deserialize(&mut deserializer)
			.map_err(|source| DecodeError::Json { url: self.url.to_string(), source })
	}
}
