//! Authentication strategies and the per-call auth method resolver.

mod jwt;
mod signature;

use std::sync::{Arc, PoisonError, RwLock};

use base64::Engine;
use base64::engine::general_purpose::STANDARD as BASE64;
use tracing::trace;

use crate::domain::{ApiKey, ApiSecret, ApplicationId, ValidationError};
use crate::error::VonageError;
use crate::transport::HttpRequest;

pub use jwt::JwtAuth;
#[cfg(test)]
pub(crate) use jwt::TEST_PRIVATE_KEY;
pub use signature::SignatureAuth;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
/// Kind of an [`AuthMethod`]; endpoints list the kinds they accept in order of preference.
pub enum AuthMethodType {
    /// API key + secret sent as HTTP Basic credentials.
    Token,
    /// Signed application JWT sent as a bearer token.
    Jwt,
    /// Request signature sent as query parameters.
    Signature,
}

#[derive(Debug, Clone)]
/// A configured way of proving identity to the Vonage APIs.
pub enum AuthMethod {
    Token(TokenAuth),
    Jwt(JwtAuth),
    Signature(SignatureAuth),
}

impl AuthMethod {
    /// Create [`AuthMethod::Token`] from an API key and secret.
    pub fn token(
        api_key: impl Into<String>,
        api_secret: impl Into<String>,
    ) -> Result<Self, ValidationError> {
        Ok(Self::Token(TokenAuth {
            api_key: ApiKey::new(api_key)?,
            api_secret: ApiSecret::new(api_secret)?,
        }))
    }

    /// Create [`AuthMethod::Jwt`] from an application id and the application's
    /// PEM encoded RSA private key.
    pub fn jwt(
        application_id: impl Into<String>,
        private_key_pem: impl AsRef<[u8]>,
    ) -> Result<Self, ValidationError> {
        Ok(Self::Jwt(JwtAuth::new(
            ApplicationId::new(application_id)?,
            private_key_pem,
        )?))
    }

    /// Create [`AuthMethod::Signature`] from an API key and a signature secret.
    pub fn signature(
        api_key: impl Into<String>,
        signature_secret: impl Into<String>,
    ) -> Result<Self, ValidationError> {
        Ok(Self::Signature(SignatureAuth::new(
            ApiKey::new(api_key)?,
            signature_secret,
        )?))
    }

    pub fn method_type(&self) -> AuthMethodType {
        match self {
            Self::Token(_) => AuthMethodType::Token,
            Self::Jwt(_) => AuthMethodType::Jwt,
            Self::Signature(_) => AuthMethodType::Signature,
        }
    }

    /// Decorate `request` with this method's proof of identity.
    ///
    /// `params` are the request's query/form parameters, which the signature covers.
    pub(crate) fn apply(
        &self,
        request: &mut HttpRequest,
        params: &[(String, String)],
    ) -> Result<(), VonageError> {
        match self {
            Self::Token(token) => {
                request.set_header("Authorization", token.basic_header());
            }
            Self::Jwt(jwt) => {
                let token = jwt.generate()?;
                request.set_header("Authorization", format!("Bearer {token}"));
            }
            Self::Signature(signature) => {
                let signed = signature.sign(params, jwt::unix_now())?;
                request.url.query_pairs_mut().extend_pairs(signed);
            }
        }
        Ok(())
    }
}

#[derive(Debug, Clone)]
/// API key + secret credentials.
pub struct TokenAuth {
    api_key: ApiKey,
    api_secret: ApiSecret,
}

impl TokenAuth {
    pub fn api_key(&self) -> &ApiKey {
        &self.api_key
    }

    fn basic_header(&self) -> String {
        let raw = format!("{}:{}", self.api_key.as_str(), self.api_secret.as_str());
        format!("Basic {}", BASE64.encode(raw))
    }
}

/// Pick the first acceptable method type that is also configured.
///
/// `acceptable` is ordered by preference; the order of `configured` does not matter.
pub fn resolve(
    acceptable: &[AuthMethodType],
    configured: &[AuthMethod],
) -> Result<AuthMethod, VonageError> {
    acceptable
        .iter()
        .find_map(|wanted| {
            configured
                .iter()
                .find(|method| method.method_type() == *wanted)
        })
        .cloned()
        .ok_or_else(|| VonageError::NoAcceptableAuthMethod {
            acceptable: acceptable.to_vec(),
        })
}

#[derive(Debug, Clone, Default)]
/// Shared, rotatable set of configured auth methods (at most one per type).
///
/// Clones share the same underlying set, so rotating credentials through any clone
/// is visible to every client built from it on their next call.
pub struct Credentials {
    methods: Arc<RwLock<Vec<AuthMethod>>>,
}

impl Credentials {
    pub fn new(methods: impl IntoIterator<Item = AuthMethod>) -> Self {
        let credentials = Self::default();
        for method in methods {
            credentials.insert(method);
        }
        credentials
    }

    /// Add `method`, replacing any configured method of the same type.
    pub fn insert(&self, method: AuthMethod) {
        let mut methods = self.methods.write().unwrap_or_else(PoisonError::into_inner);
        let kind = method.method_type();
        methods.retain(|existing| existing.method_type() != kind);
        methods.push(method);
    }

    /// Remove the configured method of type `kind`, returning it.
    pub fn remove(&self, kind: AuthMethodType) -> Option<AuthMethod> {
        let mut methods = self.methods.write().unwrap_or_else(PoisonError::into_inner);
        let idx = methods.iter().position(|m| m.method_type() == kind)?;
        Some(methods.remove(idx))
    }

    /// Replace the whole set.
    pub fn replace(&self, methods: impl IntoIterator<Item = AuthMethod>) {
        let fresh = Self::new(methods).snapshot();
        *self.methods.write().unwrap_or_else(PoisonError::into_inner) = fresh;
    }

    /// Copy of the currently configured methods.
    pub fn snapshot(&self) -> Vec<AuthMethod> {
        self.methods
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    pub fn is_empty(&self) -> bool {
        self.methods
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .is_empty()
    }

    /// Resolve against the methods configured right now.
    pub fn resolve(&self, acceptable: &[AuthMethodType]) -> Result<AuthMethod, VonageError> {
        let methods = self.methods.read().unwrap_or_else(PoisonError::into_inner);
        let method = resolve(acceptable, &methods)?;
        trace!(?acceptable, resolved = ?method.method_type(), "resolved auth method");
        Ok(method)
    }

    /// API key of the configured token (or, failing that, signature) credentials.
    ///
    /// Account-scoped paths default to this key.
    pub fn primary_api_key(&self) -> Option<ApiKey> {
        let methods = self.methods.read().unwrap_or_else(PoisonError::into_inner);
        let token = methods.iter().find_map(|m| match m {
            AuthMethod::Token(token) => Some(token.api_key.clone()),
            _ => None,
        });
        token.or_else(|| {
            methods.iter().find_map(|m| match m {
                AuthMethod::Signature(sig) => Some(sig.api_key().clone()),
                _ => None,
            })
        })
    }
}
