//! Validated client configuration.
//!
//! [`ClientConfig`] describes where the resource endpoints live, which paths belong to the
//! credential issuer and the sign-in/sign-out endpoints, and how the credential is attached to
//! outgoing requests. Values can be assembled with [`ClientConfigBuilder`] or deserialized
//! (for example from a JSON settings file) and checked with [`ClientConfig::validate`].

/// Builder API for assembling client configurations.
pub mod builder;

pub use builder::*;

// self
use crate::{_prelude::*, error::ConfigError};

/// Default renewal endpoint path.
pub const DEFAULT_RENEWAL_PATH: &str = "auth/refresh";
/// Default sign-in endpoint path.
pub const DEFAULT_SIGN_IN_PATH: &str = "auth/login";
/// Default sign-out endpoint path.
pub const DEFAULT_SIGN_OUT_PATH: &str = "auth/logout";
/// Default current-user endpoint path.
pub const DEFAULT_PROFILE_PATH: &str = "auth/me";
/// Default JSON field carrying the issued credential.
pub const DEFAULT_TOKEN_FIELD: &str = "access_token";
/// Default `Authorization` scheme.
pub const DEFAULT_AUTH_SCHEME: &str = "Bearer";

/// Immutable configuration consumed by the client.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClientConfig {
	/// Base URL every request path is resolved against.
	pub base_url: Url,
	/// Path of the credential issuer's renewal endpoint.
	#[serde(default = "default_renewal_path")]
	pub renewal_path: String,
	/// Path of the sign-in endpoint.
	#[serde(default = "default_sign_in_path")]
	pub sign_in_path: String,
	/// Path of the sign-out endpoint.
	#[serde(default = "default_sign_out_path")]
	pub sign_out_path: String,
	/// Path of the current-user endpoint fetched by session restore.
	#[serde(default = "default_profile_path")]
	pub profile_path: String,
	/// JSON field holding the credential in issuer and sign-in responses.
	#[serde(default = "default_token_field")]
	pub token_field: String,
	/// Scheme prefix of the `Authorization` header.
	#[serde(default = "default_auth_scheme")]
	pub auth_scheme: String,
	/// Headers attached to every request.
	#[serde(default)]
	pub default_headers: Vec<(String, String)>,
}
impl ClientConfig {
	/// Creates a new builder for the provided base URL.
	pub fn builder(base_url: Url) -> ClientConfigBuilder {
		ClientConfigBuilder::new(base_url)
	}

	/// Resolves a request path (or absolute URL) against the base URL.
	///
	/// Leading slashes are ignored so `/tasks` under `https://host/api/` stays below `/api/`.
	pub fn resolve(&self, path: &str) -> Result<Url, ConfigError> {
		let base = with_trailing_slash(&self.base_url);

		base.join(path.trim_start_matches('/'))
			.map_err(|source| ConfigError::InvalidPath { path: path.to_owned(), source })
	}

	/// Returns the resolved renewal endpoint URL.
	pub fn renewal_url(&self) -> Result<Url, ConfigError> {
		self.resolve(&self.renewal_path)
	}
}

pub(crate) fn with_trailing_slash(url: &Url) -> Url {
	let mut url = url.clone();

	if !url.path().ends_with('/') {
		let path = format!("{}/", url.path());

		url.set_path(&path);
	}

	url
}

fn default_renewal_path() -> String {
	DEFAULT_RENEWAL_PATH.into()
}

fn default_sign_in_path() -> String {
	DEFAULT_SIGN_IN_PATH.into()
}

fn default_sign_out_path() -> String {
	DEFAULT_SIGN_OUT_PATH.into()
}

fn default_profile_path() -> String {
	DEFAULT_PROFILE_PATH.into()
}

fn default_token_field() -> String {
	DEFAULT_TOKEN_FIELD.into()
}

fn default_auth_scheme() -> String {
	DEFAULT_AUTH_SCHEME.into()
}
