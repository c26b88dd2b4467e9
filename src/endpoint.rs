//! Typed endpoints: immutable descriptors plus the per-call dispatch pipeline.
//!
//! A call runs resolve auth → resolve path → encode → send → decode, strictly in
//! that order. Everything a call needs lives in that call's stack frame, so one
//! [`Endpoint`] can serve any number of overlapping calls.

use std::sync::Arc;

use reqwest::Method;
use serde::Serialize;
use tracing::{debug, warn};

use crate::auth::{AuthMethodType, Credentials};
use crate::error::{ApiDomain, VonageError};
use crate::transport::decode::{self, Decode, DownloadTarget, Downloaded};
use crate::transport::encode::{self, BodyFormat};
use crate::transport::{
    HttpConfig, HttpRequest, HttpResponse, HttpTransport, PathResolver, StreamingResponse,
};

/// Marker decoder for binary endpoints; use [`Endpoint::download`].
#[derive(Debug, Clone, Copy, Default)]
pub struct Download;

/// Everything that describes one endpoint, fixed at registration.
pub struct EndpointSpec<Req, D> {
    /// Short name for logs, e.g. `messages.send`.
    pub name: &'static str,
    pub domain: ApiDomain,
    pub method: Method,
    /// Acceptable auth method types, most preferred first.
    pub auth: &'static [AuthMethodType],
    pub path: PathResolver<Req>,
    pub format: BodyFormat,
    pub accept: &'static str,
    pub decoder: D,
}

struct Shared {
    config: HttpConfig,
    credentials: Credentials,
    transport: Arc<dyn HttpTransport>,
}

#[derive(Clone)]
/// Shared collaborators of every endpoint: hosts, credentials, transport.
pub struct Dispatcher {
    shared: Arc<Shared>,
}

impl Dispatcher {
    pub fn new(
        config: HttpConfig,
        credentials: Credentials,
        transport: Arc<dyn HttpTransport>,
    ) -> Self {
        Self {
            shared: Arc::new(Shared {
                config,
                credentials,
                transport,
            }),
        }
    }

    pub fn config(&self) -> &HttpConfig {
        &self.shared.config
    }

    pub fn credentials(&self) -> &Credentials {
        &self.shared.credentials
    }

    /// Bind a descriptor to this dispatcher.
    pub fn register<Req, D>(&self, spec: EndpointSpec<Req, D>) -> Endpoint<Req, D> {
        Endpoint {
            dispatcher: self.clone(),
            spec: Arc::new(spec),
        }
    }
}

/// One registered endpoint.
///
/// Immutable after registration; cheap to clone; `Send + Sync` whenever its
/// decoder is.
pub struct Endpoint<Req, D> {
    dispatcher: Dispatcher,
    spec: Arc<EndpointSpec<Req, D>>,
}

impl<Req, D> Clone for Endpoint<Req, D> {
    fn clone(&self) -> Self {
        Self {
            dispatcher: self.dispatcher.clone(),
            spec: Arc::clone(&self.spec),
        }
    }
}

impl<Req, D> Endpoint<Req, D> {
    pub fn name(&self) -> &'static str {
        self.spec.name
    }

    pub fn method(&self) -> &Method {
        &self.spec.method
    }

    pub fn acceptable_auth(&self) -> &'static [AuthMethodType] {
        self.spec.auth
    }

    /// URL a call with `request` would go to.
    pub fn url_for(&self, request: &Req) -> url::Url {
        (self.spec.path)(self.dispatcher.config(), request)
    }
}

impl<Req, D> Endpoint<Req, D>
where
    Req: Serialize + Sync,
    D: Send + Sync,
{
    fn prepare(&self, request: &Req) -> Result<HttpRequest, VonageError> {
        let spec = &self.spec;
        let auth = self.dispatcher.credentials().resolve(spec.auth)?;
        let url = (spec.path)(self.dispatcher.config(), request);
        let wire = encode::encode(&spec.method, url, spec.format, spec.accept, &auth, request)?;

        debug!(
            endpoint = spec.name,
            method = %wire.method,
            path = wire.url.path(),
            auth = ?auth.method_type(),
            "sending request"
        );
        Ok(wire)
    }

    async fn send(&self, request: &Req) -> Result<HttpResponse, VonageError> {
        let wire = self.prepare(request)?;
        let response = self
            .dispatcher
            .shared
            .transport
            .send(wire)
            .await
            .map_err(VonageError::Transport)?;

        debug!(endpoint = self.spec.name, status = response.status, "received response");
        Ok(response)
    }

    async fn send_streaming(&self, request: &Req) -> Result<StreamingResponse, VonageError> {
        let wire = self.prepare(request)?;
        let response = self
            .dispatcher
            .shared
            .transport
            .send_streaming(wire)
            .await
            .map_err(VonageError::Transport)?;

        debug!(endpoint = self.spec.name, status = response.status, "receiving body");
        Ok(response)
    }

    fn log_failure(&self, result: &Result<impl Sized, VonageError>) {
        if let Err(VonageError::Api(err)) = result {
            warn!(
                endpoint = self.spec.name,
                status = err.status,
                title = err.title(),
                "API call failed"
            );
        }
    }
}

impl<Req, D> Endpoint<Req, D>
where
    Req: Serialize + Sync,
    D: Decode<Req>,
{
    /// Run one call and decode its response.
    pub async fn execute(&self, request: &Req) -> Result<D::Output, VonageError> {
        let response = self.send(request).await?;
        let result =
            decode::decode_response(self.spec.domain, &self.spec.decoder, request, &response);
        self.log_failure(&result);
        result
    }
}

impl<Req> Endpoint<Req, Download>
where
    Req: Serialize + Sync,
{
    /// Run one call and stream the raw body to `target`.
    pub async fn download(
        &self,
        request: &Req,
        target: DownloadTarget,
    ) -> Result<Downloaded, VonageError> {
        let response = self.send_streaming(request).await?;
        let result = decode::write_download(self.spec.domain, response, target).await;
        self.log_failure(&result);
        result
    }
}


#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use serde::{Deserialize, Serialize};
    use url::Url;

    use super::testing::FakeTransport;
    use super::*;
    use crate::auth::AuthMethod;
    use crate::transport::decode::{Json, Merge, MergeResponse, NoContent};
    use crate::transport::encode::JSON;
    use crate::transport::path::join;

    #[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
    struct Widget {
        #[serde(skip)]
        bucket: String,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        id: Option<String>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        name: Option<String>,
    }

    impl MergeResponse for Widget {
        const IDENTITY_FIELD: &'static str = "id";

        fn identity(&self) -> Option<&str> {
            self.id.as_deref()
        }

        fn merged_with(&self, server: Self) -> Self {
            Self {
                bucket: self.bucket.clone(),
                id: server.id.or_else(|| self.id.clone()),
                name: server.name.or_else(|| self.name.clone()),
            }
        }
    }

    fn widget(bucket: &str, name: &str) -> Widget {
        Widget {
            bucket: bucket.to_owned(),
            id: None,
            name: Some(name.to_owned()),
        }
    }

    fn widget_path(config: &HttpConfig, request: &Widget) -> Url {
        join(config.api_base_uri(), &["buckets", &request.bucket, "widgets"])
    }

    fn dispatcher(transport: FakeTransport, methods: Vec<AuthMethod>) -> Dispatcher {
        Dispatcher::new(
            HttpConfig::all("https://example.invalid").unwrap(),
            Credentials::new(methods),
            Arc::new(transport),
        )
    }

    fn spec<D>(decoder: D, auth: &'static [AuthMethodType]) -> EndpointSpec<Widget, D> {
        EndpointSpec {
            name: "widgets.create",
            domain: ApiDomain::ProactiveConnect,
            method: Method::POST,
            auth,
            path: widget_path,
            format: BodyFormat::Json,
            accept: JSON,
            decoder,
        }
    }

    #[tokio::test]
    async fn execute_resolves_path_auth_and_decodes() {
        let transport = FakeTransport::new(201, r#"{"id":"w1","name":"srv"}"#);
        let endpoint = dispatcher(
            transport.clone(),
            vec![AuthMethod::token("key", "secret").unwrap()],
        )
        .register(spec(
            Json::<Widget>::new(),
            &[AuthMethodType::Jwt, AuthMethodType::Token],
        ));

        let response = endpoint.execute(&widget("b 1", "mine")).await.unwrap();
        assert_eq!(response.id.as_deref(), Some("w1"));
        assert_eq!(response.bucket, "");

        let sent = transport.last_request();
        assert_eq!(sent.method, Method::POST);
        assert_eq!(
            sent.url.as_str(),
            "https://example.invalid/buckets/b%201/widgets"
        );
        assert!(sent.header("Authorization").unwrap().starts_with("Basic "));
    }

    #[tokio::test]
    async fn missing_auth_fails_before_sending() {
        let transport = FakeTransport::new(200, "{}");
        let endpoint = dispatcher(
            transport.clone(),
            vec![AuthMethod::token("key", "secret").unwrap()],
        )
        .register(spec(NoContent, &[AuthMethodType::Jwt]));

        let err = endpoint.execute(&widget("b", "n")).await.unwrap_err();
        assert!(matches!(err, VonageError::NoAcceptableAuthMethod { .. }));
        assert!(transport.requests().is_empty());
    }

    #[tokio::test]
    async fn credentials_added_after_registration_are_used() {
        let transport = FakeTransport::new(204, "");
        let dispatcher = dispatcher(transport.clone(), Vec::new());
        let endpoint = dispatcher.register(spec(NoContent, &[AuthMethodType::Jwt]));

        assert!(endpoint.execute(&widget("b", "n")).await.is_err());
        dispatcher
            .credentials()
            .insert(AuthMethod::jwt("app", crate::auth::TEST_PRIVATE_KEY).unwrap());
        endpoint.execute(&widget("b", "n")).await.unwrap();

        let sent = transport.last_request();
        assert!(sent.header("Authorization").unwrap().starts_with("Bearer "));
    }

    #[tokio::test]
    async fn concurrent_merge_calls_keep_their_own_request() {
        // The fake echoes the bucket from the URL back as the id, after a yield.
        let transport = FakeTransport::with(|request| {
            let bucket = request.url.path_segments().unwrap().nth(1).unwrap().to_owned();
            (200, format!(r#"{{"id":"{bucket}"}}"#).into_bytes())
        });
        let endpoint = dispatcher(transport, vec![AuthMethod::token("k", "s").unwrap()])
            .register(spec(Merge, &[AuthMethodType::Token]));

        let calls = (0..16).map(|idx| {
            let endpoint = endpoint.clone();
            tokio::spawn(async move {
                let request = widget(&format!("bucket{idx}"), &format!("name{idx}"));
                let merged = endpoint.execute(&request).await.unwrap();
                (idx, request, merged)
            })
        });

        for call in calls.collect::<Vec<_>>() {
            let (idx, request, merged) = call.await.unwrap();
            assert_eq!(merged.id, Some(format!("bucket{idx}")));
            assert_eq!(merged.name, Some(format!("name{idx}")));
            assert_eq!(merged.bucket, format!("bucket{idx}"));
            assert!(request.id.is_none());
        }
    }

    #[tokio::test]
    async fn concurrent_downloads_write_only_their_own_bytes() {
        let transport = FakeTransport::with(|request| {
            let bucket = request.url.path_segments().unwrap().nth(1).unwrap().to_owned();
            (200, format!("payload-for-{bucket}").repeat(1000).into_bytes())
        });
        let endpoint = dispatcher(transport, vec![AuthMethod::token("k", "s").unwrap()])
            .register(EndpointSpec {
                name: "widgets.download",
                domain: ApiDomain::ProactiveConnect,
                method: Method::GET,
                auth: &[AuthMethodType::Token],
                path: widget_path,
                format: BodyFormat::Empty,
                accept: "text/csv",
                decoder: Download,
            });

        let dir = tempfile::tempdir().unwrap();
        let path_a = dir.path().join("a.csv");
        let path_b = dir.path().join("b.csv");
        let request_a = widget("A", "a");
        let request_b = widget("B", "b");

        let (a, b) = tokio::join!(
            endpoint.download(&request_a, DownloadTarget::File(path_a.clone())),
            endpoint.download(&request_b, DownloadTarget::File(path_b.clone())),
        );
        a.unwrap();
        b.unwrap();

        assert_eq!(
            std::fs::read_to_string(&path_a).unwrap(),
            "payload-for-A".repeat(1000)
        );
        assert_eq!(
            std::fs::read_to_string(&path_b).unwrap(),
            "payload-for-B".repeat(1000)
        );

        let in_memory = endpoint
            .download(&request_a, DownloadTarget::Memory)
            .await
            .unwrap();
        assert_eq!(
            in_memory.into_bytes().unwrap(),
            "payload-for-A".repeat(1000).into_bytes()
        );
    }

    #[tokio::test]
    async fn path_resolution_is_repeatable() {
        let endpoint = dispatcher(FakeTransport::new(200, "{}"), Vec::new())
            .register(spec(NoContent, &[AuthMethodType::Token]));
        let request = widget("x/y", "n");
        assert_eq!(endpoint.url_for(&request), endpoint.url_for(&request));
        assert_eq!(request, widget("x/y", "n"));
    }

    #[tokio::test]
    async fn api_errors_carry_the_endpoint_domain() {
        let endpoint = dispatcher(
            FakeTransport::new(404, r#"{"title":"Not Found"}"#),
            vec![AuthMethod::token("k", "s").unwrap()],
        )
        .register(spec(Json::<Widget>::new(), &[AuthMethodType::Token]));

        let err = endpoint.execute(&widget("b", "n")).await.unwrap_err();
        let api = err.api_error().unwrap();
        assert_eq!(api.status, 404);
        assert_eq!(api.title(), "Not Found");
        assert_eq!(api.domain, ApiDomain::ProactiveConnect);
    }
}
