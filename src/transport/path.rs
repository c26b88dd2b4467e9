//! Base hosts and absolute URL construction.

use std::fmt;

use url::Url;

use crate::domain::ApiKey;
use crate::error::VonageError;

pub const DEFAULT_API_BASE_URI: &str = "https://api.nexmo.com";
pub const DEFAULT_REST_BASE_URI: &str = "https://rest.nexmo.com";
pub const DEFAULT_API_EU_BASE_URI: &str = "https://api-eu.vonage.com";
pub const DEFAULT_API_US_BASE_URI: &str = "https://api-us.vonage.com";
pub const DEFAULT_API_AP_BASE_URI: &str = "https://api-ap.vonage.com";
pub const MESSAGES_SANDBOX_URI: &str = "https://messages-sandbox.nexmo.com";

/// Builds the absolute URL of one call from the client configuration and the request.
///
/// Implementations must be pure: same inputs, same URL, no side effects.
pub type PathResolver<Req> = fn(&HttpConfig, &Req) -> Url;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
/// Regional Vonage API host.
pub enum Region {
    Us,
    Eu,
    Apac,
}

impl fmt::Display for Region {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Us => "us",
            Self::Eu => "eu",
            Self::Apac => "apac",
        })
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
/// Hosts every path resolver builds on.
///
/// Invariant: every URI is an absolute `http`/`https` URL.
pub struct HttpConfig {
    api_base_uri: Url,
    rest_base_uri: Url,
    api_eu_base_uri: Url,
    api_us_base_uri: Url,
    api_ap_base_uri: Url,
    messages_sandbox_uri: Url,
}

impl HttpConfig {
    /// The production Vonage hosts.
    pub fn defaults() -> Result<Self, VonageError> {
        Ok(Self {
            api_base_uri: parse_base(DEFAULT_API_BASE_URI)?,
            rest_base_uri: parse_base(DEFAULT_REST_BASE_URI)?,
            api_eu_base_uri: parse_base(DEFAULT_API_EU_BASE_URI)?,
            api_us_base_uri: parse_base(DEFAULT_API_US_BASE_URI)?,
            api_ap_base_uri: parse_base(DEFAULT_API_AP_BASE_URI)?,
            messages_sandbox_uri: parse_base(MESSAGES_SANDBOX_URI)?,
        })
    }

    /// Point every host at one base URI (useful against a local mock server).
    pub fn all(base_uri: &str) -> Result<Self, VonageError> {
        let base = parse_base(base_uri)?;
        Ok(Self {
            api_base_uri: base.clone(),
            rest_base_uri: base.clone(),
            api_eu_base_uri: base.clone(),
            api_us_base_uri: base.clone(),
            api_ap_base_uri: base.clone(),
            messages_sandbox_uri: base,
        })
    }

    pub fn with_api_base_uri(mut self, uri: &str) -> Result<Self, VonageError> {
        self.api_base_uri = parse_base(uri)?;
        Ok(self)
    }

    pub fn with_rest_base_uri(mut self, uri: &str) -> Result<Self, VonageError> {
        self.rest_base_uri = parse_base(uri)?;
        Ok(self)
    }

    pub fn with_api_eu_base_uri(mut self, uri: &str) -> Result<Self, VonageError> {
        self.api_eu_base_uri = parse_base(uri)?;
        Ok(self)
    }

    pub fn with_messages_sandbox_uri(mut self, uri: &str) -> Result<Self, VonageError> {
        self.messages_sandbox_uri = parse_base(uri)?;
        Ok(self)
    }

    /// Default host for most JSON APIs (`https://api.nexmo.com`).
    pub fn api_base_uri(&self) -> &Url {
        &self.api_base_uri
    }

    /// Host for the legacy form-encoded APIs (`https://rest.nexmo.com`).
    pub fn rest_base_uri(&self) -> &Url {
        &self.rest_base_uri
    }

    /// EU host (`https://api-eu.vonage.com`), used by Proactive Connect.
    pub fn api_eu_base_uri(&self) -> &Url {
        &self.api_eu_base_uri
    }

    pub fn messages_sandbox_uri(&self) -> &Url {
        &self.messages_sandbox_uri
    }

    pub fn regional_base_uri(&self, region: Region) -> &Url {
        match region {
            Region::Us => &self.api_us_base_uri,
            Region::Eu => &self.api_eu_base_uri,
            Region::Apac => &self.api_ap_base_uri,
        }
    }
}

fn parse_base(uri: &str) -> Result<Url, VonageError> {
    let url = Url::parse(uri.trim())
        .map_err(|err| VonageError::InvalidConfig(format!("base URI `{uri}`: {err}")))?;
    if !matches!(url.scheme(), "http" | "https") || url.cannot_be_a_base() {
        return Err(VonageError::InvalidConfig(format!(
            "base URI `{uri}` must be an absolute http(s) URL"
        )));
    }
    Ok(url)
}

/// Append `segments` to `base`, percent-encoding each one.
///
/// Segments are opaque: `/`, `?` and `#` inside an id stay inside that segment.
pub fn join(base: &Url, segments: &[&str]) -> Url {
    let mut url = base.clone();
    if let Ok(mut path) = url.path_segments_mut() {
        path.pop_if_empty().extend(segments);
    }
    url
}

/// Requests addressed under `/accounts/{api_key}`.
///
/// Domain clients fill a missing account id from the configured credentials before
/// the request reaches a path resolver.
pub trait AccountScoped {
    fn account_id(&self) -> Option<&ApiKey>;

    fn set_account_id(&mut self, account_id: ApiKey);

    /// The account id as a path segment (empty when still unset).
    fn account_segment(&self) -> &str {
        self.account_id().map(ApiKey::as_str).unwrap_or_default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn join_appends_and_encodes_segments() {
        let config = HttpConfig::defaults().unwrap();
        let url = join(config.api_base_uri(), &["accounts", "ab/c d", "secrets"]);
        assert_eq!(
            url.as_str(),
            "https://api.nexmo.com/accounts/ab%2Fc%20d/secrets"
        );
    }

    #[test]
    fn join_keeps_base_path_prefix() {
        let base = Url::parse("http://127.0.0.1:8080/mock/").unwrap();
        let url = join(&base, &["v1", "messages"]);
        assert_eq!(url.as_str(), "http://127.0.0.1:8080/mock/v1/messages");
    }

    #[test]
    fn join_is_idempotent() {
        let config = HttpConfig::defaults().unwrap();
        let a = join(config.api_eu_base_uri(), &["v0.1", "bulk", "lists", "x"]);
        let b = join(config.api_eu_base_uri(), &["v0.1", "bulk", "lists", "x"]);
        assert_eq!(a, b);
    }

    #[test]
    fn base_uris_must_be_http() {
        assert!(HttpConfig::all("ftp://example.invalid").is_err());
        assert!(HttpConfig::all("not a url").is_err());
        assert!(
            HttpConfig::defaults()
                .unwrap()
                .with_api_base_uri("mailto:x@example.invalid")
                .is_err()
        );
    }

    #[test]
    fn regions_map_to_regional_hosts() {
        let config = HttpConfig::defaults().unwrap();
        assert_eq!(
            config.regional_base_uri(Region::Apac).as_str(),
            "https://api-ap.vonage.com/"
        );
        assert_eq!(
            config.regional_base_uri(Region::Eu).as_str(),
            "https://api-eu.vonage.com/"
        );
    }
}
