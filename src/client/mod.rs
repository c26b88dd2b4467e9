//! Client layer: registers every endpoint once and exposes one facade per API family.

mod account;
mod messages;
mod proactive_connect;
mod subaccounts;

use std::sync::Arc;
use std::time::Duration;

use tracing::debug;

use crate::auth::{AuthMethod, Credentials};
use crate::domain::{ApiKey, ValidationError};
use crate::endpoint::Dispatcher;
use crate::error::VonageError;
use crate::transport::{AccountScoped, HttpConfig, HttpTransport, ReqwestTransport};

pub use account::AccountClient;
pub use messages::MessagesClient;
pub use proactive_connect::ProactiveConnectClient;
pub use subaccounts::SubaccountsClient;

/// Default `User-Agent` sent with every request.
pub const DEFAULT_USER_AGENT: &str = concat!("vonage-rust/", env!("CARGO_PKG_VERSION"));

pub const ENV_API_KEY: &str = "VONAGE_API_KEY";
pub const ENV_API_SECRET: &str = "VONAGE_API_SECRET";
pub const ENV_SIGNATURE_SECRET: &str = "VONAGE_SIGNATURE_SECRET";
pub const ENV_APPLICATION_ID: &str = "VONAGE_APPLICATION_ID";
/// Path of the application's PEM private key file.
pub const ENV_PRIVATE_KEY_PATH: &str = "VONAGE_PRIVATE_KEY_PATH";

#[derive(Clone)]
/// Builder for [`VonageClient`].
///
/// Use this when you need other hosts, a timeout, a custom user-agent, the
/// Messages sandbox, or your own [`HttpTransport`].
pub struct VonageClientBuilder {
    credentials: Credentials,
    base_uri: Option<String>,
    api_base_uri: Option<String>,
    rest_base_uri: Option<String>,
    api_eu_base_uri: Option<String>,
    messages_sandbox_uri: Option<String>,
    messages_sandbox: bool,
    timeout: Option<Duration>,
    user_agent: Option<String>,
    transport: Option<Arc<dyn HttpTransport>>,
}

impl Default for VonageClientBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl VonageClientBuilder {
    /// A builder with the default hosts and no credentials.
    pub fn new() -> Self {
        Self {
            credentials: Credentials::default(),
            base_uri: None,
            api_base_uri: None,
            rest_base_uri: None,
            api_eu_base_uri: None,
            messages_sandbox_uri: None,
            messages_sandbox: false,
            timeout: None,
            user_agent: None,
            transport: None,
        }
    }

    /// Read credentials from the `VONAGE_*` environment variables.
    ///
    /// `VONAGE_API_KEY` with `VONAGE_API_SECRET` configures token auth, with
    /// `VONAGE_SIGNATURE_SECRET` signature auth; `VONAGE_APPLICATION_ID` with
    /// `VONAGE_PRIVATE_KEY_PATH` configures JWT auth from the key file. Unset
    /// pairs are skipped.
    pub fn from_env() -> Result<Self, VonageError> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, VonageError> {
        let builder = Self::new();
        let api_key = lookup(ENV_API_KEY);

        if let (Some(key), Some(secret)) = (&api_key, lookup(ENV_API_SECRET)) {
            builder.credentials.insert(AuthMethod::token(key.as_str(), secret)?);
        }
        if let (Some(key), Some(secret)) = (&api_key, lookup(ENV_SIGNATURE_SECRET)) {
            builder
                .credentials
                .insert(AuthMethod::signature(key.as_str(), secret)?);
        }
        if let (Some(app), Some(key_path)) =
            (lookup(ENV_APPLICATION_ID), lookup(ENV_PRIVATE_KEY_PATH))
        {
            let private_key = std::fs::read(&key_path).map_err(|err| {
                VonageError::InvalidConfig(format!("cannot read private key {key_path}: {err}"))
            })?;
            builder
                .credentials
                .insert(AuthMethod::jwt(app, private_key)?);
        }
        Ok(builder)
    }

    /// Add an auth method, replacing any configured method of the same type.
    pub fn auth(self, method: AuthMethod) -> Self {
        self.credentials.insert(method);
        self
    }

    /// Use an existing credential store; rotations through it reach the built client.
    pub fn credentials(mut self, credentials: Credentials) -> Self {
        self.credentials = credentials;
        self
    }

    /// Override the host of the JSON APIs (`https://api.nexmo.com`).
    pub fn api_base_uri(mut self, uri: impl Into<String>) -> Self {
        self.api_base_uri = Some(uri.into());
        self
    }

    /// Override the host of the legacy REST APIs (`https://rest.nexmo.com`).
    pub fn rest_base_uri(mut self, uri: impl Into<String>) -> Self {
        self.rest_base_uri = Some(uri.into());
        self
    }

    /// Override the EU host (`https://api-eu.vonage.com`).
    pub fn api_eu_base_uri(mut self, uri: impl Into<String>) -> Self {
        self.api_eu_base_uri = Some(uri.into());
        self
    }

    /// Override the Messages sandbox host.
    pub fn messages_sandbox_uri(mut self, uri: impl Into<String>) -> Self {
        self.messages_sandbox_uri = Some(uri.into());
        self
    }

    /// Route outbound messages through the Messages sandbox.
    pub fn messages_sandbox(mut self, enabled: bool) -> Self {
        self.messages_sandbox = enabled;
        self
    }

    /// Point every host, regional ones included, at `uri`; handy for local mock servers.
    ///
    /// Per-host overrides still win.
    pub fn base_uri(mut self, uri: impl Into<String>) -> Self {
        self.base_uri = Some(uri.into());
        self
    }

    /// Set an HTTP client timeout applied to the entire request.
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    /// Override the HTTP `User-Agent` header.
    pub fn user_agent(mut self, user_agent: impl Into<String>) -> Self {
        self.user_agent = Some(user_agent.into());
        self
    }

    /// Send requests through `transport` instead of a `reqwest` client.
    ///
    /// Timeout and user-agent settings are then up to the transport.
    pub fn transport(mut self, transport: Arc<dyn HttpTransport>) -> Self {
        self.transport = Some(transport);
        self
    }

    /// Build a [`VonageClient`].
    pub fn build(self) -> Result<VonageClient, VonageError> {
        let mut config = match &self.base_uri {
            Some(uri) => HttpConfig::all(uri)?,
            None => HttpConfig::defaults()?,
        };
        if let Some(uri) = &self.api_base_uri {
            config = config.with_api_base_uri(uri)?;
        }
        if let Some(uri) = &self.rest_base_uri {
            config = config.with_rest_base_uri(uri)?;
        }
        if let Some(uri) = &self.api_eu_base_uri {
            config = config.with_api_eu_base_uri(uri)?;
        }
        if let Some(uri) = &self.messages_sandbox_uri {
            config = config.with_messages_sandbox_uri(uri)?;
        }

        let transport = match self.transport {
            Some(transport) => transport,
            None => {
                let mut builder = reqwest::Client::builder().user_agent(
                    self.user_agent
                        .unwrap_or_else(|| DEFAULT_USER_AGENT.to_owned()),
                );
                if let Some(timeout) = self.timeout {
                    builder = builder.timeout(timeout);
                }
                let client = builder
                    .build()
                    .map_err(|err| VonageError::InvalidConfig(err.to_string()))?;
                Arc::new(ReqwestTransport::new(client)) as Arc<dyn HttpTransport>
            }
        };

        debug!(
            api = %config.api_base_uri(),
            rest = %config.rest_base_uri(),
            api_eu = %config.api_eu_base_uri(),
            sandbox = self.messages_sandbox,
            "building Vonage client"
        );

        let dispatcher = Dispatcher::new(config, self.credentials, transport);
        Ok(VonageClient::from_dispatcher(dispatcher, self.messages_sandbox))
    }
}

#[derive(Clone)]
/// High-level Vonage client.
///
/// Holds one facade per API family; each registers its endpoints once at build
/// time. Clones share the endpoints, the transport and the credential store, and any
/// number of calls may run concurrently on one client.
pub struct VonageClient {
    dispatcher: Dispatcher,
    messages: MessagesClient,
    proactive_connect: ProactiveConnectClient,
    subaccounts: SubaccountsClient,
    account: AccountClient,
}

impl VonageClient {
    /// Create a client with the default hosts and a single auth method.
    ///
    /// For more customization, use [`VonageClient::builder`].
    pub fn new(auth: AuthMethod) -> Result<Self, VonageError> {
        Self::builder().auth(auth).build()
    }

    /// Start building a client with custom settings.
    pub fn builder() -> VonageClientBuilder {
        VonageClientBuilder::new()
    }

    fn from_dispatcher(dispatcher: Dispatcher, messages_sandbox: bool) -> Self {
        Self {
            messages: MessagesClient::new(&dispatcher, messages_sandbox),
            proactive_connect: ProactiveConnectClient::new(&dispatcher),
            subaccounts: SubaccountsClient::new(&dispatcher),
            account: AccountClient::new(&dispatcher),
            dispatcher,
        }
    }

    /// The shared credential store; rotate credentials through it at runtime.
    pub fn credentials(&self) -> &Credentials {
        self.dispatcher.credentials()
    }

    pub fn config(&self) -> &HttpConfig {
        self.dispatcher.config()
    }

    pub fn messages(&self) -> &MessagesClient {
        &self.messages
    }

    pub fn proactive_connect(&self) -> &ProactiveConnectClient {
        &self.proactive_connect
    }

    pub fn subaccounts(&self) -> &SubaccountsClient {
        &self.subaccounts
    }

    pub fn account(&self) -> &AccountClient {
        &self.account
    }
}

/// Copy `request`, filling a missing account id from the configured API key.
fn with_account<R>(credentials: &Credentials, request: &R) -> Result<R, VonageError>
where
    R: AccountScoped + Clone,
{
    let mut request = request.clone();
    if request.account_id().is_none() {
        let api_key = credentials
            .primary_api_key()
            .ok_or(ValidationError::Empty {
                field: ApiKey::FIELD,
            })?;
        request.set_account_id(api_key);
    }
    Ok(request)
}
