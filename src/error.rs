//! Error taxonomy shared by the dispatch core and every domain client.

use std::error::Error as StdError;
use std::fmt;

use serde::Deserialize;

use crate::auth::AuthMethodType;
use crate::domain::ValidationError;

#[derive(Debug, thiserror::Error)]
/// Errors returned by every Vonage API call.
///
/// A call yields exactly one of:
/// - a client-side validation failure, raised before any network activity,
/// - a configuration failure (no usable credentials, bad base URI),
/// - a transport failure (DNS, TLS, timeouts) passed through unchanged,
/// - a server-side API error (non-2xx) tagged with its API family,
/// - a parse failure for a 2xx body that did not match the expected schema.
pub enum VonageError {
    /// A domain constructor or domain client rejected an invalid value.
    #[error("validation error: {0}")]
    Validation(#[from] ValidationError),

    /// None of the endpoint's acceptable auth methods is configured.
    #[error("no acceptable auth method configured; endpoint accepts {acceptable:?}")]
    NoAcceptableAuthMethod { acceptable: Vec<AuthMethodType> },

    /// HTTP client / transport failure.
    #[error("transport error: {0}")]
    Transport(#[source] Box<dyn StdError + Send + Sync>),

    /// The server answered with a non-2xx status.
    #[error("{0}")]
    Api(ApiResponseError),

    /// A 2xx response body could not be parsed as the expected type.
    #[error("parse error: {0}")]
    Parse(#[source] Box<dyn StdError + Send + Sync>),

    /// A merged response disagrees with the request on an identity field.
    #[error("response {field} `{response}` does not match request {field} `{request}`")]
    Inconsistent {
        field: &'static str,
        request: String,
        response: String,
    },

    /// Writing a downloaded body to its destination failed.
    #[error("i/o error: {0}")]
    Io(#[from] std::io::Error),

    /// The client configuration is unusable (bad base URI, HTTP client build failure).
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),
}

impl VonageError {
    /// The API error, if this is one.
    pub fn api_error(&self) -> Option<&ApiResponseError> {
        match self {
            Self::Api(err) => Some(err),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
/// API family an [`ApiResponseError`] originates from.
pub enum ApiDomain {
    Messages,
    ProactiveConnect,
    Subaccounts,
    Account,
}

impl ApiDomain {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Messages => "messages",
            Self::ProactiveConnect => "proactive-connect",
            Self::Subaccounts => "subaccounts",
            Self::Account => "account",
        }
    }
}

impl fmt::Display for ApiDomain {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq)]
/// Non-2xx response from one of the Vonage APIs.
pub struct ApiResponseError {
    /// API family that produced the error.
    pub domain: ApiDomain,
    /// HTTP status code.
    pub status: u16,
    /// Structured problem details from the body.
    pub problem: ProblemDetail,
}

impl ApiResponseError {
    /// Human-readable title; always present.
    pub fn title(&self) -> &str {
        self.problem.title.as_deref().unwrap_or_default()
    }
}

impl fmt::Display for ApiResponseError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} API error {}: {}", self.domain, self.status, self.title())?;
        if let Some(detail) = &self.problem.detail {
            write!(f, " ({detail})")?;
        }
        Ok(())
    }
}

impl StdError for ApiResponseError {}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
/// RFC 7807 style problem payload.
pub struct ProblemDetail {
    /// Machine-readable error type URI.
    #[serde(default, rename = "type")]
    pub type_uri: Option<String>,
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub detail: Option<String>,
    /// Opaque trace id of the failed request.
    #[serde(default)]
    pub instance: Option<String>,
    /// Per-parameter failures reported by the Messages and Subaccounts APIs.
    #[serde(default)]
    pub invalid_parameters: Vec<InvalidParameter>,
    /// Validation failures reported by the Proactive Connect API, in whatever
    /// shape the server chose (array or object keyed by field).
    #[serde(default)]
    pub errors: Option<serde_json::Value>,
    /// Any other fields present in the body.
    #[serde(flatten)]
    pub extra: serde_json::Map<String, serde_json::Value>,
}

impl ProblemDetail {
    /// Read each known field on its own from a JSON object.
    ///
    /// A field with an unexpected shape is kept in `extra` instead of failing the
    /// whole document.
    pub fn from_fields(mut fields: serde_json::Map<String, serde_json::Value>) -> Self {
        let type_uri = take_string(&mut fields, "type");
        let title = take_string(&mut fields, "title");
        let detail = take_string(&mut fields, "detail");
        let instance = take_string(&mut fields, "instance");
        let invalid_parameters = fields
            .remove("invalid_parameters")
            .and_then(|value| match serde_json::from_value(value.clone()) {
                Ok(parameters) => Some(parameters),
                Err(_) => {
                    fields.insert("invalid_parameters".to_owned(), value);
                    None
                }
            })
            .unwrap_or_default();
        let errors = fields.remove("errors");

        Self {
            type_uri,
            title,
            detail,
            instance,
            invalid_parameters,
            errors,
            extra: fields,
        }
    }
}

fn take_string(
    fields: &mut serde_json::Map<String, serde_json::Value>,
    key: &str,
) -> Option<String> {
    match fields.remove(key)? {
        serde_json::Value::String(text) => Some(text),
        serde_json::Value::Null => None,
        other => {
            fields.insert(key.to_owned(), other);
            None
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct InvalidParameter {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub reason: String,
}
