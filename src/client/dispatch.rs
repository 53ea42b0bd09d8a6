//! Request dispatcher: credential decoration and response classification.

// self
use crate::{
	_prelude::*,
	auth::AccessCredential,
	config::ClientConfig,
	error::{AuthorizationFailure, ConfigError, TransportError},
	http::{
		ApiRequest, ApiResponse, Attempt, HttpTransport, Method, TransportRequest,
		TransportResponse,
	},
};

const UNAUTHORIZED: u16 = 401;

/// Sends requests through the transport with the supplied credential attached.
///
/// The dispatcher never consults the renewal machinery; it only reports what the endpoint
/// said. A 401 becomes [`Error::Unauthorized`], any other non-2xx status becomes
/// [`Error::Status`], and transport failures become [`Error::Transport`].
pub struct Dispatcher<T>
where
	T: ?Sized + HttpTransport,
{
	transport: Arc<T>,
	config: Arc<ClientConfig>,
	renewal_url: Url,
}
impl<T> Dispatcher<T>
where
	T: ?Sized + HttpTransport,
{
	/// Validates `config` and wraps `transport`.
	pub fn new(config: Arc<ClientConfig>, transport: impl Into<Arc<T>>) -> Result<Self> {
		config.validate().map_err(ConfigError::from)?;

		let renewal_url = config.renewal_url()?;

		Ok(Self { transport: transport.into(), config, renewal_url })
	}

	/// Returns the configuration requests are resolved against.
	pub fn config(&self) -> &ClientConfig {
		&self.config
	}

	/// Returns the shared transport.
	pub fn transport(&self) -> &Arc<T> {
		&self.transport
	}

	/// Returns true when `request` resolves to the credential issuer's renewal endpoint.
	pub fn targets_renewal(&self, request: &ApiRequest) -> bool {
		self.config
			.resolve(&request.path)
			.map(|url| same_endpoint(&url, &self.renewal_url))
			.unwrap_or(false)
	}

	/// Builds the transport request, attaching `credential` unless the request targets the
	/// renewal endpoint.
	pub fn prepare(
		&self,
		request: &ApiRequest,
		credential: Option<&AccessCredential>,
		attempt: Attempt,
	) -> Result<TransportRequest> {
		let mut url = self.config.resolve(&request.path)?;

		if !request.query.is_empty() {
			url.query_pairs_mut().extend_pairs(request.query.iter());
		}

		let decorate = credential.filter(|_| !same_endpoint(&url, &self.renewal_url));
		let mut headers = self.config.default_headers.clone();

		headers.extend(request.headers.iter().cloned());

		if let Some(credential) = decorate {
			headers.retain(|(name, _)| !name.eq_ignore_ascii_case("authorization"));
			headers.push((
				"authorization".into(),
				credential.authorization_value(&self.config.auth_scheme),
			));
		}

		let body = match &request.body {
			Some(value) => {
				if !headers.iter().any(|(name, _)| name.eq_ignore_ascii_case("content-type")) {
					headers.push(("content-type".into(), "application/json".into()));
				}

				Some(serde_json::to_vec(value).map_err(ConfigError::from)?)
			},
			None => None,
		};

		Ok(TransportRequest { method: request.method, url, headers, body, attempt })
	}

	/// Sends `request` once and classifies the response.
	pub async fn send(
		&self,
		request: &ApiRequest,
		credential: Option<&AccessCredential>,
		attempt: Attempt,
	) -> Result<ApiResponse> {
		let prepared = self.prepare(request, credential, attempt)?;
		let method = prepared.method;
		let url = prepared.url.clone();
		let response = self
			.transport
			.execute(prepared)
			.await
			.map_err(|err| TransportError::network(url.as_str(), err))?;

		classify(method, url, response)
	}
}
impl<T> Debug for Dispatcher<T>
where
	T: ?Sized + HttpTransport,
{
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.debug_struct("Dispatcher")
			.field("base_url", &self.config.base_url.as_str())
			.field("renewal_url", &self.renewal_url.as_str())
			.finish()
	}
}

fn classify(method: Method, url: Url, response: TransportResponse) -> Result<ApiResponse> {
	if response.is_success() {
		return Ok(ApiResponse {
			status: response.status,
			url,
			headers: response.headers,
			body: response.body,
		});
	}
	if response.status == UNAUTHORIZED {
		return Err(AuthorizationFailure {
			status: response.status,
			method,
			url: url.into(),
			body: response.body,
		}
		.into());
	}

	Err(Error::Status { status: response.status, method, url: url.into(), body: response.body })
}

fn same_endpoint(a: &Url, b: &Url) -> bool {
	a.scheme() == b.scheme()
		&& a.host_str() == b.host_str()
		&& a.port_or_known_default() == b.port_or_known_default()
		&& a.path().trim_end_matches('/') == b.path().trim_end_matches('/')
}
