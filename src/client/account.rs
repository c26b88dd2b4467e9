use reqwest::Method;
use url::Url;

use crate::auth::AuthMethodType;
use crate::client::with_account;
use crate::domain::account::{
    Balance, CreateSecret, Secret, SecretPath, SecretsListing, SecretsPath, Settings,
    SettingsUpdate, TopUp, TopUpResult,
};
use crate::domain::{AccountSecret, ApiKey, SecretId};
use crate::endpoint::{Dispatcher, Endpoint, EndpointSpec};
use crate::error::{ApiDomain, VonageError};
use crate::transport::encode::JSON;
use crate::transport::path::join;
use crate::transport::{AccountScoped, BodyFormat, HttpConfig, Json, NoContent};

const REST_AUTH: &[AuthMethodType] = &[AuthMethodType::Token, AuthMethodType::Signature];
const SECRETS_AUTH: &[AuthMethodType] = &[AuthMethodType::Token];

fn rest(config: &HttpConfig, action: &str) -> Url {
    join(config.rest_base_uri(), &["account", action])
}

fn balance_path(config: &HttpConfig, _request: &()) -> Url {
    rest(config, "get-balance")
}

fn top_up_path(config: &HttpConfig, _request: &TopUp) -> Url {
    rest(config, "top-up")
}

fn settings_path(config: &HttpConfig, _request: &SettingsUpdate) -> Url {
    rest(config, "settings")
}

fn secrets<R: AccountScoped>(config: &HttpConfig, request: &R) -> Url {
    join(
        config.api_base_uri(),
        &["accounts", request.account_segment(), "secrets"],
    )
}

fn secret(config: &HttpConfig, request: &SecretPath) -> Url {
    join(
        config.api_base_uri(),
        &[
            "accounts",
            request.account_segment(),
            "secrets",
            request.secret_id().as_str(),
        ],
    )
}

#[derive(Clone)]
/// Account API: balance, top-up, webhook settings and API secrets.
pub struct AccountClient {
    dispatcher: Dispatcher,
    balance: Endpoint<(), Json<Balance>>,
    top_up: Endpoint<TopUp, Json<TopUpResult>>,
    settings: Endpoint<SettingsUpdate, Json<Settings>>,
    list_secrets: Endpoint<SecretsPath, Json<SecretsListing>>,
    get_secret: Endpoint<SecretPath, Json<Secret>>,
    create_secret: Endpoint<CreateSecret, Json<Secret>>,
    revoke_secret: Endpoint<SecretPath, NoContent>,
}

impl AccountClient {
    pub(crate) fn new(dispatcher: &Dispatcher) -> Self {
        Self {
            dispatcher: dispatcher.clone(),
            balance: dispatcher.register(EndpointSpec {
                name: "account.get_balance",
                domain: ApiDomain::Account,
                method: Method::GET,
                auth: REST_AUTH,
                path: balance_path,
                format: BodyFormat::Empty,
                accept: JSON,
                decoder: Json::new(),
            }),
            top_up: dispatcher.register(EndpointSpec {
                name: "account.top_up",
                domain: ApiDomain::Account,
                method: Method::POST,
                auth: REST_AUTH,
                path: top_up_path,
                format: BodyFormat::Form,
                accept: JSON,
                decoder: Json::new(),
            }),
            settings: dispatcher.register(EndpointSpec {
                name: "account.update_settings",
                domain: ApiDomain::Account,
                method: Method::POST,
                auth: REST_AUTH,
                path: settings_path,
                format: BodyFormat::Form,
                accept: JSON,
                decoder: Json::new(),
            }),
            list_secrets: dispatcher.register(EndpointSpec {
                name: "account.list_secrets",
                domain: ApiDomain::Account,
                method: Method::GET,
                auth: SECRETS_AUTH,
                path: secrets,
                format: BodyFormat::Empty,
                accept: JSON,
                decoder: Json::new(),
            }),
            get_secret: dispatcher.register(EndpointSpec {
                name: "account.get_secret",
                domain: ApiDomain::Account,
                method: Method::GET,
                auth: SECRETS_AUTH,
                path: secret,
                format: BodyFormat::Empty,
                accept: JSON,
                decoder: Json::new(),
            }),
            create_secret: dispatcher.register(EndpointSpec {
                name: "account.create_secret",
                domain: ApiDomain::Account,
                method: Method::POST,
                auth: SECRETS_AUTH,
                path: secrets,
                format: BodyFormat::Json,
                accept: JSON,
                decoder: Json::new(),
            }),
            revoke_secret: dispatcher.register(EndpointSpec {
                name: "account.revoke_secret",
                domain: ApiDomain::Account,
                method: Method::DELETE,
                auth: SECRETS_AUTH,
                path: secret,
                format: BodyFormat::Empty,
                accept: JSON,
                decoder: NoContent,
            }),
        }
    }

    pub async fn get_balance(&self) -> Result<Balance, VonageError> {
        self.balance.execute(&()).await
    }

    /// Top up an account that has auto-reload enabled.
    pub async fn top_up(&self, request: &TopUp) -> Result<TopUpResult, VonageError> {
        self.top_up.execute(request).await
    }

    /// Change the inbound SMS and delivery receipt webhooks.
    pub async fn update_settings(
        &self,
        request: &SettingsUpdate,
    ) -> Result<Settings, VonageError> {
        self.settings.execute(request).await
    }

    /// Secrets of `account`, or of the configured API key when `None`.
    pub async fn list_secrets(
        &self,
        account: Option<&ApiKey>,
    ) -> Result<SecretsListing, VonageError> {
        let request = self.scoped(&SecretsPath::new(account.cloned()))?;
        self.list_secrets.execute(&request).await
    }

    pub async fn get_secret(
        &self,
        account: Option<&ApiKey>,
        secret_id: &SecretId,
    ) -> Result<Secret, VonageError> {
        let request = self.scoped(&SecretPath::new(account.cloned(), secret_id.clone()))?;
        self.get_secret.execute(&request).await
    }

    /// Add a secret; an account holds at most two.
    pub async fn create_secret(
        &self,
        account: Option<&ApiKey>,
        secret: &AccountSecret,
    ) -> Result<Secret, VonageError> {
        let request = self.scoped(&CreateSecret::new(account.cloned(), secret.clone()))?;
        self.create_secret.execute(&request).await
    }

    pub async fn revoke_secret(
        &self,
        account: Option<&ApiKey>,
        secret_id: &SecretId,
    ) -> Result<(), VonageError> {
        let request = self.scoped(&SecretPath::new(account.cloned(), secret_id.clone()))?;
        self.revoke_secret.execute(&request).await
    }

    fn scoped<R: AccountScoped + Clone>(&self, request: &R) -> Result<R, VonageError> {
        with_account(self.dispatcher.credentials(), request)
    }
}
