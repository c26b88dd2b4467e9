use std::fmt;

use hmac::{Hmac, Mac};
use sha2::Sha256;

use crate::domain::{ApiKey, ValidationError};
use crate::error::VonageError;

type HmacSha256 = Hmac<Sha256>;

#[derive(Clone)]
/// API key + signature secret; signs the request parameters instead of sending a secret.
pub struct SignatureAuth {
    api_key: ApiKey,
    secret: String,
}

impl SignatureAuth {
    /// Parameters the signature supplies itself.
    pub const RESERVED_PARAMS: [&'static str; 3] = ["api_key", "timestamp", "sig"];

    /// Whether a request parameter named `key` would clash with the signature's own.
    pub fn is_reserved(key: &str) -> bool {
        Self::RESERVED_PARAMS.contains(&key)
    }

    pub fn new(api_key: ApiKey, secret: impl Into<String>) -> Result<Self, ValidationError> {
        let secret = secret.into();
        if secret.is_empty() {
            return Err(ValidationError::Empty {
                field: "signature_secret",
            });
        }
        Ok(Self { api_key, secret })
    }

    pub fn api_key(&self) -> &ApiKey {
        &self.api_key
    }

    /// Query parameters to append: `api_key`, `timestamp` and `sig`.
    ///
    /// `sig` is the lowercase hex HMAC-SHA256 of `&k1=v1&k2=v2...` over `params`
    /// plus `api_key` and `timestamp`, sorted by key. `&` and `=` inside values are
    /// replaced with `_` before signing. Reserved keys in `params` are ignored.
    pub fn sign(
        &self,
        params: &[(String, String)],
        timestamp: u64,
    ) -> Result<Vec<(String, String)>, VonageError> {
        let api_key = (ApiKey::FIELD.to_owned(), self.api_key.as_str().to_owned());
        let timestamp = ("timestamp".to_owned(), timestamp.to_string());

        let mut signed = params
            .iter()
            .filter(|(key, _)| !Self::is_reserved(key))
            .cloned()
            .chain([api_key.clone(), timestamp.clone()])
            .collect::<Vec<_>>();
        signed.sort();

        let mut input = String::new();
        for (key, value) in &signed {
            input.push('&');
            input.push_str(key);
            input.push('=');
            input.push_str(&value.replace(['&', '='], "_"));
        }

        let mut mac = HmacSha256::new_from_slice(self.secret.as_bytes())
            .map_err(|err| VonageError::InvalidConfig(format!("signature secret: {err}")))?;
        mac.update(input.as_bytes());
        let sig = hex::encode(mac.finalize().into_bytes());

        Ok(vec![api_key, timestamp, ("sig".to_owned(), sig)])
    }
}

impl fmt::Debug for SignatureAuth {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SignatureAuth")
            .field("api_key", &self.api_key)
            .field("secret", &"***")
            .finish()
    }
}
