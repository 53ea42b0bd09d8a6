//! Redacted access credential wrapper.

// self
use crate::_prelude::*;

/// Opaque bearer credential presented to resource endpoints.
///
/// Validity is only ever learned from the server's authorization-failure signal; the client
/// never inspects or mutates the token, it only replaces it wholesale.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AccessCredential(String);
impl AccessCredential {
	/// Wraps a new token string.
	pub fn new(value: impl Into<String>) -> Self {
		Self(value.into())
	}

	/// Returns the inner token value. Callers must avoid logging this string.
	pub fn expose(&self) -> &str {
		&self.0
	}

	/// Formats the value of an `Authorization` header for the provided scheme.
	pub fn authorization_value(&self, scheme: &str) -> String {
		format!("{scheme} {}", self.0)
	}
}
impl AsRef<str> for AccessCredential {
	fn as_ref(&self) -> &str {
		self.expose()
	}
}
impl Debug for AccessCredential {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.debug_tuple("AccessCredential").field(&"<redacted>").finish()
	}
}
impl Display for AccessCredential {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.write_str("<redacted>")
	}
}

#[cfg(test)]
mod tests {
	// self
	use super::*;

	#[test]
	fn credential_formatters_redact() {
		let credential = AccessCredential::new("super-secret");

		assert_eq!(format!("{credential:?}"), "AccessCredential(\"<redacted>\")");
		assert_eq!(format!("{credential}"), "<redacted>");
	}

	#[test]
	fn authorization_value_uses_scheme() {
		let credential = AccessCredential::new("t1");

		assert_eq!(credential.authorization_value("Bearer"), "Bearer t1");
	}
}
