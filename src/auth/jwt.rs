use std::fmt;
use std::time::{SystemTime, UNIX_EPOCH};

use jsonwebtoken::{Algorithm, EncodingKey, Header};
use serde::Serialize;
use uuid::Uuid;

use crate::domain::{ApplicationId, ValidationError};
use crate::error::VonageError;

/// Lifetime of a generated token, in seconds.
pub const JWT_TTL_SECS: u64 = 900;

#[derive(Clone)]
/// Application credentials that mint a fresh RS256 JWT for every call.
///
/// The key is the PEM private key downloaded when the Vonage application was
/// created.
pub struct JwtAuth {
    application_id: ApplicationId,
    private_key: EncodingKey,
}

#[derive(Serialize)]
struct Claims<'a> {
    application_id: &'a str,
    iat: u64,
    exp: u64,
    jti: String,
}

impl JwtAuth {
    pub fn new(
        application_id: ApplicationId,
        private_key_pem: impl AsRef<[u8]>,
    ) -> Result<Self, ValidationError> {
        let pem = private_key_pem.as_ref();
        if pem.iter().all(u8::is_ascii_whitespace) {
            return Err(ValidationError::Empty {
                field: "private_key",
            });
        }
        let private_key =
            EncodingKey::from_rsa_pem(pem).map_err(|_| ValidationError::InvalidFormat {
                field: "private_key",
                reason: "must be a PEM encoded RSA private key",
            })?;
        Ok(Self {
            application_id,
            private_key,
        })
    }

    pub fn application_id(&self) -> &ApplicationId {
        &self.application_id
    }

    /// Mint a token issued now.
    pub fn generate(&self) -> Result<String, VonageError> {
        self.generate_at(unix_now())
    }

    pub(crate) fn generate_at(&self, issued_at: u64) -> Result<String, VonageError> {
        let claims = Claims {
            application_id: self.application_id.as_str(),
            iat: issued_at,
            exp: issued_at + JWT_TTL_SECS,
            jti: Uuid::new_v4().to_string(),
        };
        jsonwebtoken::encode(&Header::new(Algorithm::RS256), &claims, &self.private_key)
            .map_err(|err| VonageError::InvalidConfig(format!("jwt signing failed: {err}")))
    }
}

impl fmt::Debug for JwtAuth {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("JwtAuth")
            .field("application_id", &self.application_id)
            .field("private_key", &"***")
            .finish()
    }
}

pub(crate) fn unix_now() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|elapsed| elapsed.as_secs())
        .unwrap_or_default()
}

#[cfg(test)]
pub(crate) const TEST_PRIVATE_KEY: &str =
    include_str!("../../tests/fixtures/application_key.pem");
