use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::domain::validation::ValidationError;
use crate::domain::value::{AccountSecret, ApiKey, SecretId, WebUrl, check_length};
use crate::transport::AccountScoped;

/// Maximum callback URL length accepted by the settings endpoint.
pub const CALLBACK_URL_MAX_LEN: usize = 255;

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct Balance {
    pub value: f64,
    #[serde(rename = "autoReload", default)]
    pub auto_reload: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
/// Top up an account with auto-reload enabled, using a previous transaction reference.
pub struct TopUp {
    trx: String,
}

impl TopUp {
    pub fn new(trx: impl Into<String>) -> Result<Self, ValidationError> {
        let trx = trx.into();
        let trimmed = trx.trim();
        if trimmed.is_empty() {
            return Err(ValidationError::Empty { field: "trx" });
        }
        Ok(Self {
            trx: trimmed.to_owned(),
        })
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct TopUpResult {
    #[serde(rename = "error-code")]
    pub error_code: String,
    #[serde(rename = "error-code-label", default)]
    pub error_code_label: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize)]
/// Inbound and delivery-receipt webhook settings.
pub struct SettingsUpdate {
    #[serde(rename = "moCallBackUrl", skip_serializing_if = "Option::is_none")]
    inbound_sms_url: Option<String>,
    #[serde(rename = "drCallBackUrl", skip_serializing_if = "Option::is_none")]
    delivery_receipt_url: Option<String>,
}

impl SettingsUpdate {
    pub fn new(
        inbound_sms_url: Option<String>,
        delivery_receipt_url: Option<String>,
    ) -> Result<Self, ValidationError> {
        if inbound_sms_url.is_none() && delivery_receipt_url.is_none() {
            return Err(ValidationError::NothingToUpdate);
        }
        Ok(Self {
            inbound_sms_url: inbound_sms_url
                .map(|url| check_callback("moCallBackUrl", url))
                .transpose()?,
            delivery_receipt_url: delivery_receipt_url
                .map(|url| check_callback("drCallBackUrl", url))
                .transpose()?,
        })
    }
}

fn check_callback(field: &'static str, url: String) -> Result<String, ValidationError> {
    let url = WebUrl::new(field, url)?;
    check_length(field, url.as_str(), 1, CALLBACK_URL_MAX_LEN)?;
    Ok(url.as_str().to_owned())
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct Settings {
    #[serde(rename = "mo-callback-url", default)]
    pub inbound_sms_url: Option<String>,
    #[serde(rename = "dr-callback-url", default)]
    pub delivery_receipt_url: Option<String>,
    #[serde(rename = "max-outbound-request", default)]
    pub max_outbound_request: Option<u32>,
    #[serde(rename = "max-inbound-request", default)]
    pub max_inbound_request: Option<u32>,
    #[serde(rename = "max-calls-per-second", default)]
    pub max_calls_per_second: Option<u32>,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize)]
/// Path-only request for an account's secrets collection.
pub struct SecretsPath {
    #[serde(skip)]
    account: Option<ApiKey>,
}

impl SecretsPath {
    /// `account` defaults to the configured API key.
    pub fn new(account: Option<ApiKey>) -> Self {
        Self { account }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SecretPath {
    #[serde(skip)]
    account: Option<ApiKey>,
    #[serde(skip)]
    secret_id: SecretId,
}

impl SecretPath {
    pub fn new(account: Option<ApiKey>, secret_id: SecretId) -> Self {
        Self { account, secret_id }
    }

    pub fn secret_id(&self) -> &SecretId {
        &self.secret_id
    }
}

#[derive(Clone, PartialEq, Serialize)]
pub struct CreateSecret {
    #[serde(skip)]
    account: Option<ApiKey>,
    secret: String,
}

impl CreateSecret {
    pub fn new(account: Option<ApiKey>, secret: AccountSecret) -> Self {
        Self {
            account,
            secret: secret.as_str().to_owned(),
        }
    }
}

impl std::fmt::Debug for CreateSecret {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CreateSecret")
            .field("account", &self.account)
            .field("secret", &"***")
            .finish()
    }
}

macro_rules! account_scoped {
    ($($ty:ty),* $(,)?) => {
        $(
            impl AccountScoped for $ty {
                fn account_id(&self) -> Option<&ApiKey> {
                    self.account.as_ref()
                }

                fn set_account_id(&mut self, account_id: ApiKey) {
                    self.account = Some(account_id);
                }
            }
        )*
    };
}

account_scoped!(SecretsPath, SecretPath, CreateSecret);

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct Secret {
    pub id: String,
    #[serde(default)]
    pub created_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct SecretsListing {
    #[serde(rename = "_embedded")]
    embedded: SecretsEmbedded,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
struct SecretsEmbedded {
    #[serde(default)]
    secrets: Vec<Secret>,
}

impl SecretsListing {
    pub fn secrets(&self) -> &[Secret] {
        &self.embedded.secrets
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn balance_reads_camel_case_flag() {
        let balance: Balance = serde_json::from_str(r#"{"value": 10.28, "autoReload": true}"#)
            .unwrap();
        assert_eq!(balance.value, 10.28);
        assert!(balance.auto_reload);
    }

    #[test]
    fn top_up_requires_reference() {
        assert_eq!(
            TopUp::new("  ").unwrap_err(),
            ValidationError::Empty { field: "trx" }
        );
        assert_eq!(
            serde_json::to_value(TopUp::new(" 8ef2 ").unwrap()).unwrap(),
            serde_json::json!({"trx": "8ef2"})
        );
    }

    #[test]
    fn settings_update_checks_urls() {
        assert_eq!(
            SettingsUpdate::new(None, None).unwrap_err(),
            ValidationError::NothingToUpdate
        );
        assert!(SettingsUpdate::new(Some("not a url".to_owned()), None).is_err());

        let long = format!("https://example.com/{}", "a".repeat(CALLBACK_URL_MAX_LEN));
        assert!(matches!(
            SettingsUpdate::new(None, Some(long)).unwrap_err(),
            ValidationError::Length {
                field: "drCallBackUrl",
                ..
            }
        ));

        let update =
            SettingsUpdate::new(Some("https://example.com/inbound".to_owned()), None).unwrap();
        assert_eq!(
            serde_json::to_value(&update).unwrap(),
            serde_json::json!({"moCallBackUrl": "https://example.com/inbound"})
        );
    }

    #[test]
    fn settings_response_uses_dashed_names() {
        let json = r#"{
            "mo-callback-url": "https://example.com/mo",
            "dr-callback-url": "https://example.com/dr",
            "max-outbound-request": 30,
            "max-inbound-request": 30,
            "max-calls-per-second": 30
        }"#;
        let settings: Settings = serde_json::from_str(json).unwrap();
        assert_eq!(
            settings.inbound_sms_url.as_deref(),
            Some("https://example.com/mo")
        );
        assert_eq!(settings.max_calls_per_second, Some(30));
    }

    #[test]
    fn create_secret_debug_redacts() {
        let request = CreateSecret::new(None, AccountSecret::new("Passw0rdX").unwrap());
        assert!(!format!("{request:?}").contains("Passw0rdX"));
    }

    #[test]
    fn secrets_listing() {
        let json = r#"{"_embedded": {"secrets": [
            {"id": "ad6dc56f-07b5-46e1-a527-85530e625800", "created_at": "2017-03-02T16:34:49Z"}
        ]}}"#;
        let listing: SecretsListing = serde_json::from_str(json).unwrap();
        assert_eq!(listing.secrets().len(), 1);
    }
}
