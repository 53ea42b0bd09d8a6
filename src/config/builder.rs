// self
use crate::{
	_prelude::*,
	config::{
		ClientConfig, DEFAULT_AUTH_SCHEME, DEFAULT_RENEWAL_PATH, DEFAULT_SIGN_IN_PATH,
		DEFAULT_PROFILE_PATH, DEFAULT_SIGN_OUT_PATH, DEFAULT_TOKEN_FIELD,
	},
};

/// Errors raised while constructing or validating configurations.
#[derive(Clone, Debug, PartialEq, Eq, ThisError)]
pub enum ClientConfigError {
	/// Base URL cannot have paths joined onto it.
	#[error("Base URL cannot be a base: {url}.")]
	CannotBeBase {
		/// Base URL that failed validation.
		url: String,
	},
	/// Base URL must use HTTP or HTTPS.
	#[error("Base URL must use http or https: {url}.")]
	UnsupportedScheme {
		/// Base URL that failed validation.
		url: String,
	},
	/// Endpoint paths must not be blank.
	#[error("The {field} must not be empty.")]
	EmptyPath {
		/// Which path failed validation.
		field: &'static str,
	},
	/// Token field must not be blank.
	#[error("The token field must not be empty.")]
	EmptyTokenField,
	/// Authorization scheme must be a single non-empty token.
	#[error("Authorization scheme `{scheme}` must be a single non-empty token.")]
	InvalidAuthScheme {
		/// Scheme that failed validation.
		scheme: String,
	},
	/// Default header names must be valid HTTP field names.
	#[error("Header name `{name}` is not a valid HTTP field name.")]
	InvalidHeaderName {
		/// Header name that failed validation.
		name: String,
	},
	/// Default header values must be sendable as HTTP field values.
	#[error("Header `{name}` carries a value that is not a valid HTTP field value.")]
	InvalidHeaderValue {
		/// Header whose value failed validation.
		name: String,
	},
}

/// Builder for [`ClientConfig`] values.
#[derive(Debug)]
pub struct ClientConfigBuilder {
	/// Base URL every request path is resolved against.
	pub base_url: Url,
	/// Path of the credential issuer's renewal endpoint.
	pub renewal_path: String,
	/// Path of the sign-in endpoint.
	pub sign_in_path: String,
	/// Path of the sign-out endpoint.
	pub sign_out_path: String,
	/// Path of the current-user endpoint fetched by session restore.
	pub profile_path: String,
	/// JSON field holding the credential.
	pub token_field: String,
	/// Scheme prefix of the `Authorization` header.
	pub auth_scheme: String,
	/// Headers attached to every request.
	pub default_headers: Vec<(String, String)>,
}
impl ClientConfigBuilder {
	/// Creates a new builder seeded with defaults for every path.
	pub fn new(base_url: Url) -> Self {
		Self {
			base_url,
			renewal_path: DEFAULT_RENEWAL_PATH.into(),
			sign_in_path: DEFAULT_SIGN_IN_PATH.into(),
			sign_out_path: DEFAULT_SIGN_OUT_PATH.into(),
			profile_path: DEFAULT_PROFILE_PATH.into(),
			token_field: DEFAULT_TOKEN_FIELD.into(),
			auth_scheme: DEFAULT_AUTH_SCHEME.into(),
			default_headers: Vec::new(),
		}
	}

	/// Overrides the renewal endpoint path.
	pub fn renewal_path(mut self, path: impl Into<String>) -> Self {
		self.renewal_path = path.into();

		self
	}

	/// Overrides the sign-in endpoint path.
	pub fn sign_in_path(mut self, path: impl Into<String>) -> Self {
		self.sign_in_path = path.into();

		self
	}

	/// Overrides the sign-out endpoint path.
	pub fn sign_out_path(mut self, path: impl Into<String>) -> Self {
		self.sign_out_path = path.into();

		self
	}

	/// Overrides the current-user endpoint path.
	pub fn profile_path(mut self, path: impl Into<String>) -> Self {
		self.profile_path = path.into();

		self
	}

	/// Overrides the JSON field holding the credential.
	pub fn token_field(mut self, field: impl Into<String>) -> Self {
		self.token_field = field.into();

		self
	}

	/// Overrides the `Authorization` scheme.
	pub fn auth_scheme(mut self, scheme: impl Into<String>) -> Self {
		self.auth_scheme = scheme.into();

		self
	}

	/// Adds a header attached to every request.
	pub fn default_header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
		self.default_headers.push((name.into(), value.into()));

		self
	}

	/// Consumes the builder and validates the resulting configuration.
	pub fn build(self) -> Result<ClientConfig, ClientConfigError> {
		let config = ClientConfig {
			base_url: self.base_url,
			renewal_path: self.renewal_path,
			sign_in_path: self.sign_in_path,
			sign_out_path: self.sign_out_path,
			profile_path: self.profile_path,
			token_field: self.token_field,
			auth_scheme: self.auth_scheme,
			default_headers: self.default_headers,
		};

		config.validate()?;

		Ok(config)
	}
}

impl ClientConfig {
	/// Validates invariants for the configuration.
	pub fn validate(&self) -> Result<(), ClientConfigError> {
		if self.base_url.cannot_be_a_base() {
			return Err(ClientConfigError::CannotBeBase { url: self.base_url.to_string() });
		}
		if !matches!(self.base_url.scheme(), "http" | "https") {
			return Err(ClientConfigError::UnsupportedScheme { url: self.base_url.to_string() });
		}

		validate_path("renewal path", &self.renewal_path)?;
		validate_path("sign-in path", &self.sign_in_path)?;
		validate_path("sign-out path", &self.sign_out_path)?;
		validate_path("profile path", &self.profile_path)?;

		if self.token_field.trim().is_empty() {
			return Err(ClientConfigError::EmptyTokenField);
		}
		if self.auth_scheme.is_empty() || !self.auth_scheme.chars().all(is_token_char) {
			return Err(ClientConfigError::InvalidAuthScheme { scheme: self.auth_scheme.clone() });
		}

		for (name, value) in &self.default_headers {
			validate_header(name, value)?;
		}

		Ok(())
	}
}

fn validate_path(field: &'static str, path: &str) -> Result<(), ClientConfigError> {
	if path.trim_matches(|c: char| c == '/' || c.is_whitespace()).is_empty() {
		Err(ClientConfigError::EmptyPath { field })
	} else {
		Ok(())
	}
}

fn validate_header(name: &str, value: &str) -> Result<(), ClientConfigError> {
	if !is_header_name(name) {
		return Err(ClientConfigError::InvalidHeaderName { name: name.to_owned() });
	}
	if !is_header_value(value) {
		return Err(ClientConfigError::InvalidHeaderValue { name: name.to_owned() });
	}

	Ok(())
}

// Accept exactly what the transport's header map will.
#[cfg(feature = "reqwest")]
fn is_header_name(name: &str) -> bool {
	reqwest::header::HeaderName::from_bytes(name.as_bytes()).is_ok()
}

#[cfg(feature = "reqwest")]
fn is_header_value(value: &str) -> bool {
	reqwest::header::HeaderValue::from_str(value).is_ok()
}

#[cfg(not(feature = "reqwest"))]
fn is_header_name(name: &str) -> bool {
	!name.is_empty() && name.chars().all(is_token_char)
}

#[cfg(not(feature = "reqwest"))]
fn is_header_value(value: &str) -> bool {
	!value.chars().any(|c| c.is_control() && c != '\t')
}

// RFC 9110 `tchar`.
fn is_token_char(c: char) -> bool {
	c.is_ascii_alphanumeric() || "!#$%&'*+-.^_`|~".contains(c)
}
