//! Request encoder: turns a typed request into a wire-level [`HttpRequest`].

use reqwest::Method;
use serde::Serialize;
use serde_json::Value;
use url::Url;

use crate::auth::{AuthMethod, SignatureAuth};
use crate::error::VonageError;
use crate::transport::HttpRequest;

pub const JSON: &str = "application/json";
pub const FORM: &str = "application/x-www-form-urlencoded";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
/// Where an endpoint puts the serialized request.
pub enum BodyFormat {
    /// JSON body.
    Json,
    /// `application/x-www-form-urlencoded` body (legacy REST endpoints).
    Form,
    /// Top-level fields as query parameters, no body.
    Query,
    /// Nothing beyond the path.
    Empty,
}

/// Encode `request` and decorate it with `auth` exactly once.
///
/// No semantic validation happens here; the value is serialized as given.
pub fn encode<Req: Serialize>(
    method: &Method,
    url: Url,
    format: BodyFormat,
    accept: &str,
    auth: &AuthMethod,
    request: &Req,
) -> Result<HttpRequest, VonageError> {
    let mut wire = HttpRequest::new(method.clone(), url);
    let mut params = Vec::new();

    match format {
        BodyFormat::Json => {
            let body =
                serde_json::to_vec(request).map_err(|err| VonageError::Parse(Box::new(err)))?;
            wire.set_header("Content-Type", JSON);
            wire.body = Some(body);
        }
        BodyFormat::Form => {
            params = request_params(auth, request)?;
            let body = url::form_urlencoded::Serializer::new(String::new())
                .extend_pairs(&params)
                .finish();
            wire.set_header("Content-Type", FORM);
            wire.body = Some(body.into_bytes());
        }
        BodyFormat::Query => {
            params = request_params(auth, request)?;
            if !params.is_empty() {
                wire.url.query_pairs_mut().extend_pairs(&params);
            }
        }
        BodyFormat::Empty => {}
    }

    wire.set_header("Accept", accept);
    auth.apply(&mut wire, &params)?;
    Ok(wire)
}

/// Flattened request fields, minus any the signature will add itself.
fn request_params<Req: Serialize>(
    auth: &AuthMethod,
    request: &Req,
) -> Result<Vec<(String, String)>, VonageError> {
    let mut params = flatten(request)?;
    if let AuthMethod::Signature(_) = auth {
        params.retain(|(key, _)| !SignatureAuth::is_reserved(key));
    }
    Ok(params)
}

/// Flatten a request's top-level fields into string pairs.
///
/// `null` fields are skipped, arrays become comma-separated lists and nested
/// objects are sent as compact JSON.
pub fn flatten<Req: Serialize>(request: &Req) -> Result<Vec<(String, String)>, VonageError> {
    let value = serde_json::to_value(request).map_err(|err| VonageError::Parse(Box::new(err)))?;
    let Value::Object(fields) = value else {
        return Ok(Vec::new());
    };

    let mut pairs = Vec::with_capacity(fields.len());
    for (key, value) in fields {
        let value = match value {
            Value::Null => continue,
            Value::Array(items) => items
                .iter()
                .map(scalar_to_string)
                .collect::<Vec<_>>()
                .join(","),
            other => scalar_to_string(&other),
        };
        pairs.push((key, value));
    }
    Ok(pairs)
}

fn scalar_to_string(value: &Value) -> String {
    match value {
        Value::String(value) => value.clone(),
        Value::Null => String::new(),
        other => other.to_string(),
    }
}
