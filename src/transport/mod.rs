//! Transport layer: HTTP plumbing and wire-format details (encoding, decoding, paths).

pub mod decode;
pub mod encode;
pub mod path;

use std::error::Error as StdError;
use std::future::Future;
use std::pin::Pin;

use bytes::Bytes;
use futures::stream::{self, BoxStream, StreamExt};
use reqwest::Method;
use url::Url;

pub use decode::{Decode, DownloadTarget, Downloaded, Json, Merge, MergeResponse, NoContent};
pub use encode::BodyFormat;
pub use path::{AccountScoped, HttpConfig, PathResolver, Region};

pub type BoxFuture<'a, T> = Pin<Box<dyn Future<Output = T> + Send + 'a>>;

pub type BoxError = Box<dyn StdError + Send + Sync>;

/// Response body delivered chunk by chunk.
pub type BodyStream = BoxStream<'static, Result<Bytes, BoxError>>;

#[derive(Debug, Clone, PartialEq, Eq)]
/// Fully encoded request handed to an [`HttpTransport`].
pub struct HttpRequest {
    pub method: Method,
    pub url: Url,
    pub headers: Vec<(String, String)>,
    pub body: Option<Vec<u8>>,
}

impl HttpRequest {
    pub fn new(method: Method, url: Url) -> Self {
        Self {
            method,
            url,
            headers: Vec::new(),
            body: None,
        }
    }

    /// Set a header, replacing any existing value (names compare case-insensitively).
    pub fn set_header(&mut self, name: &str, value: impl Into<String>) {
        self.headers
            .retain(|(existing, _)| !existing.eq_ignore_ascii_case(name));
        self.headers.push((name.to_owned(), value.into()));
    }

    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(existing, _)| existing.eq_ignore_ascii_case(name))
            .map(|(_, value)| value.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HttpResponse {
    pub status: u16,
    pub headers: Vec<(String, String)>,
    pub body: Vec<u8>,
}

/// Response whose body has not been read yet.
pub struct StreamingResponse {
    pub status: u16,
    pub headers: Vec<(String, String)>,
    pub body: BodyStream,
}

impl StreamingResponse {
    /// Wrap an already buffered response as a single-chunk stream.
    pub fn buffered(response: HttpResponse) -> Self {
        let chunk = Bytes::from(response.body);
        Self {
            status: response.status,
            headers: response.headers,
            body: stream::iter([Ok(chunk)]).boxed(),
        }
    }
}

/// The network boundary: sends one request and returns the raw response.
///
/// Connection pooling, TLS and timeouts belong to the implementation. Errors are
/// surfaced to callers unchanged as [`crate::VonageError::Transport`].
pub trait HttpTransport: Send + Sync {
    fn send<'a>(&'a self, request: HttpRequest) -> BoxFuture<'a, Result<HttpResponse, BoxError>>;

    /// Like [`HttpTransport::send`], but hands the body over as it arrives.
    ///
    /// The default buffers through `send`; transports that can stream should
    /// override it.
    fn send_streaming<'a>(
        &'a self,
        request: HttpRequest,
    ) -> BoxFuture<'a, Result<StreamingResponse, BoxError>> {
        Box::pin(async move {
            let response = self.send(request).await?;
            Ok(StreamingResponse::buffered(response))
        })
    }
}

#[derive(Debug, Clone)]
/// [`HttpTransport`] backed by `reqwest`.
pub struct ReqwestTransport {
    client: reqwest::Client,
}

impl ReqwestTransport {
    pub fn new(client: reqwest::Client) -> Self {
        Self { client }
    }
}

impl ReqwestTransport {
    async fn dispatch(&self, request: HttpRequest) -> Result<reqwest::Response, reqwest::Error> {
        let mut builder = self.client.request(request.method, request.url);
        for (name, value) in request.headers {
            builder = builder.header(name, value);
        }
        if let Some(body) = request.body {
            builder = builder.body(body);
        }
        builder.send().await
    }
}

fn response_headers(response: &reqwest::Response) -> Vec<(String, String)> {
    response
        .headers()
        .iter()
        .filter_map(|(name, value)| {
            value
                .to_str()
                .ok()
                .map(|value| (name.as_str().to_owned(), value.to_owned()))
        })
        .collect()
}

impl HttpTransport for ReqwestTransport {
    fn send<'a>(&'a self, request: HttpRequest) -> BoxFuture<'a, Result<HttpResponse, BoxError>> {
        Box::pin(async move {
            let response = self.dispatch(request).await?;
            let status = response.status().as_u16();
            let headers = response_headers(&response);
            let body = response.bytes().await?.to_vec();
            Ok(HttpResponse {
                status,
                headers,
                body,
            })
        })
    }

    fn send_streaming<'a>(
        &'a self,
        request: HttpRequest,
    ) -> BoxFuture<'a, Result<StreamingResponse, BoxError>> {
        Box::pin(async move {
            let response = self.dispatch(request).await?;
            let status = response.status().as_u16();
            let headers = response_headers(&response);
            let body = response
                .bytes_stream()
                .map(|chunk| chunk.map_err(|err| Box::new(err) as BoxError))
                .boxed();
            Ok(StreamingResponse {
                status,
                headers,
                body,
            })
        })
    }
}
