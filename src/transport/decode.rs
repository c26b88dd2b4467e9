//! Response decoders: status classification, typed success values, typed API errors.

use std::io;
use std::marker::PhantomData;
use std::path::{Path, PathBuf};

use futures::StreamExt;
use serde::de::DeserializeOwned;
use tokio::io::AsyncWriteExt;
use uuid::Uuid;

use crate::error::{ApiDomain, ApiResponseError, ProblemDetail, VonageError};
use crate::transport::{BodyStream, HttpResponse, StreamingResponse};

/// `200..=299` is success; everything else is an API error.
pub fn is_success(status: u16) -> bool {
    (200..=299).contains(&status)
}

/// Decodes the body of a successful response.
///
/// `request` is the call's own request value; decoders that need per-call context
/// (merge targets) read it from here, never from shared state.
pub trait Decode<Req>: Send + Sync {
    type Output;

    fn decode(&self, request: &Req, body: &[u8]) -> Result<Self::Output, VonageError>;
}

/// Fresh-object mode: the body deserializes into a new `R`.
pub struct Json<R>(PhantomData<fn() -> R>);

impl<R> Json<R> {
    pub const fn new() -> Self {
        Self(PhantomData)
    }
}

impl<R> Default for Json<R> {
    fn default() -> Self {
        Self::new()
    }
}

impl<Req, R: DeserializeOwned> Decode<Req> for Json<R> {
    type Output = R;

    fn decode(&self, _request: &Req, body: &[u8]) -> Result<R, VonageError> {
        serde_json::from_slice(body).map_err(|err| VonageError::Parse(Box::new(err)))
    }
}

/// Success responses without a meaningful body (`204 No Content` and friends).
#[derive(Debug, Clone, Copy, Default)]
pub struct NoContent;

impl<Req> Decode<Req> for NoContent {
    type Output = ();

    fn decode(&self, _request: &Req, _body: &[u8]) -> Result<(), VonageError> {
        Ok(())
    }
}

/// Resources the server echoes back with server-assigned fields filled in.
pub trait MergeResponse: DeserializeOwned + Clone {
    /// Wire name of the identity field, used in [`VonageError::Inconsistent`].
    const IDENTITY_FIELD: &'static str;

    /// Identity-correlating value, when known.
    fn identity(&self) -> Option<&str>;

    /// Combine `self` (what was sent) with `server` (what came back) into a new value.
    ///
    /// Fields present in `server` win.
    fn merged_with(&self, server: Self) -> Self;
}

/// Merge mode: the server's reply is folded into a copy of the request.
///
/// The caller's request is only borrowed; the merged value is independent of it.
#[derive(Debug, Clone, Copy, Default)]
pub struct Merge;

impl<Req: MergeResponse> Decode<Req> for Merge {
    type Output = Req;

    fn decode(&self, request: &Req, body: &[u8]) -> Result<Req, VonageError> {
        let server: Req =
            serde_json::from_slice(body).map_err(|err| VonageError::Parse(Box::new(err)))?;
        if let (Some(sent), Some(received)) = (request.identity(), server.identity()) {
            if sent != received {
                return Err(VonageError::Inconsistent {
                    field: Req::IDENTITY_FIELD,
                    request: sent.to_owned(),
                    response: received.to_owned(),
                });
            }
        }
        Ok(request.merged_with(server))
    }
}

/// Run `decoder` on a success response, or build the domain's API error.
pub fn decode_response<Req, D: Decode<Req>>(
    domain: ApiDomain,
    decoder: &D,
    request: &Req,
    response: &HttpResponse,
) -> Result<D::Output, VonageError> {
    if !is_success(response.status) {
        return Err(VonageError::Api(decode_error(
            domain,
            response.status,
            &response.body,
        )));
    }
    decoder.decode(request, &response.body)
}

/// Build an [`ApiResponseError`] from a failed response.
///
/// Known fields of a JSON object body are read one by one, so a malformed field
/// never hides the others. A body that is not a JSON object still yields an
/// error: its text becomes the detail. A missing title is filled from the HTTP
/// reason phrase.
pub fn decode_error(domain: ApiDomain, status: u16, body: &[u8]) -> ApiResponseError {
    let mut problem = match serde_json::from_slice::<serde_json::Value>(body) {
        Ok(serde_json::Value::Object(fields)) => ProblemDetail::from_fields(fields),
        _ => {
            let text = String::from_utf8_lossy(body);
            let text = text.trim();
            ProblemDetail {
                detail: (!text.is_empty()).then(|| text.to_owned()),
                ..Default::default()
            }
        }
    };

    if problem.title.as_deref().is_none_or(|title| title.trim().is_empty()) {
        problem.title = Some(reason_phrase(status));
    }

    ApiResponseError {
        domain,
        status,
        problem,
    }
}

fn reason_phrase(status: u16) -> String {
    reqwest::StatusCode::from_u16(status)
        .ok()
        .and_then(|code| code.canonical_reason())
        .map(str::to_owned)
        .unwrap_or_else(|| format!("HTTP {status}"))
}

#[derive(Debug, Clone, PartialEq, Eq)]
/// Where a binary download goes; chosen per call.
pub enum DownloadTarget {
    /// Keep the bytes in memory.
    Memory,
    /// Write the bytes to this path, replacing any existing file.
    File(PathBuf),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Downloaded {
    Bytes(Vec<u8>),
    File { path: PathBuf, bytes_written: u64 },
}

impl Downloaded {
    /// The in-memory bytes, if the download targeted memory.
    pub fn into_bytes(self) -> Option<Vec<u8>> {
        match self {
            Self::Bytes(bytes) => Some(bytes),
            Self::File { .. } => None,
        }
    }
}

/// Binary decoder: no JSON parsing, raw bytes to memory or to a file.
///
/// File targets are written chunk by chunk to a part file next to the
/// destination, which is renamed into place once the whole body has arrived.
/// An existing destination is left untouched when the download fails.
pub async fn write_download(
    domain: ApiDomain,
    response: StreamingResponse,
    target: DownloadTarget,
) -> Result<Downloaded, VonageError> {
    if !is_success(response.status) {
        let body = collect(response.body).await?;
        return Err(VonageError::Api(decode_error(
            domain,
            response.status,
            &body,
        )));
    }

    match target {
        DownloadTarget::Memory => Ok(Downloaded::Bytes(collect(response.body).await?)),
        DownloadTarget::File(path) => {
            let partial = partial_path(&path)?;
            let written = match stream_to_file(&partial, response.body).await {
                Ok(written) => tokio::fs::rename(&partial, &path)
                    .await
                    .map(|()| written)
                    .map_err(VonageError::Io),
                Err(err) => Err(err),
            };
            match written {
                Ok(bytes_written) => Ok(Downloaded::File {
                    path,
                    bytes_written,
                }),
                Err(err) => {
                    let _ = tokio::fs::remove_file(&partial).await;
                    Err(err)
                }
            }
        }
    }
}

async fn collect(mut body: BodyStream) -> Result<Vec<u8>, VonageError> {
    let mut buffer = Vec::new();
    while let Some(chunk) = body.next().await {
        buffer.extend_from_slice(&chunk.map_err(VonageError::Transport)?);
    }
    Ok(buffer)
}

async fn stream_to_file(path: &Path, mut body: BodyStream) -> Result<u64, VonageError> {
    let mut file = tokio::fs::File::create(path).await?;
    let mut written = 0u64;
    while let Some(chunk) = body.next().await {
        let chunk = chunk.map_err(VonageError::Transport)?;
        file.write_all(&chunk).await?;
        written += chunk.len() as u64;
    }
    file.flush().await?;
    file.sync_all().await?;
    Ok(written)
}

/// Unique sibling of `path`, so concurrent downloads to one target never share it.
fn partial_path(path: &Path) -> Result<PathBuf, VonageError> {
    let name = path.file_name().ok_or_else(|| {
        VonageError::Io(io::Error::new(
            io::ErrorKind::InvalidInput,
            format!("download target {} has no file name", path.display()),
        ))
    })?;
    let mut partial = name.to_os_string();
    partial.push(format!(".{}.part", Uuid::new_v4().simple()));
    Ok(path.with_file_name(partial))
}

#[cfg(test)]
mod tests {
    use serde::Deserialize;

    use super::*;
    use crate::transport::BoxError;

    fn response(status: u16, body: &str) -> HttpResponse {
        HttpResponse {
            status,
            headers: Vec::new(),
            body: body.as_bytes().to_vec(),
        }
    }

    #[derive(Debug, Clone, PartialEq, Deserialize)]
    struct Thing {
        id: Option<String>,
        name: Option<String>,
        created_at: Option<String>,
    }

    impl MergeResponse for Thing {
        const IDENTITY_FIELD: &'static str = "id";

        fn identity(&self) -> Option<&str> {
            self.id.as_deref()
        }

        fn merged_with(&self, server: Self) -> Self {
            Self {
                id: server.id.or_else(|| self.id.clone()),
                name: server.name.or_else(|| self.name.clone()),
                created_at: server.created_at.or_else(|| self.created_at.clone()),
            }
        }
    }

    #[test]
    fn success_range_is_exactly_2xx() {
        for status in 0..1000u16 {
            assert_eq!(is_success(status), (200..300).contains(&status), "{status}");
        }
    }

    #[test]
    fn every_non_2xx_status_becomes_an_api_error() {
        for status in [100, 199, 300, 304, 400, 404, 429, 500, 503, 599] {
            let err = decode_response(
                ApiDomain::Account,
                &Json::<Thing>::new(),
                &(),
                &response(status, "{}"),
            )
            .unwrap_err();
            match err {
                VonageError::Api(api) => {
                    assert_eq!(api.status, status);
                    assert_eq!(api.domain, ApiDomain::Account);
                }
                other => panic!("unexpected error for {status}: {other:?}"),
            }
        }
    }

    #[test]
    fn not_found_body_title_is_kept() {
        let err = decode_error(ApiDomain::ProactiveConnect, 404, br#"{"title":"Not Found"}"#);
        assert_eq!(err.status, 404);
        assert_eq!(err.title(), "Not Found");
    }

    #[test]
    fn partial_invalid_parameters_keep_the_server_title() {
        let err = decode_error(
            ApiDomain::Messages,
            422,
            br#"{"title":"Invalid params","detail":"x","invalid_parameters":[{"name":"to"}]}"#,
        );
        assert_eq!(err.title(), "Invalid params");
        assert_eq!(err.problem.detail.as_deref(), Some("x"));
        assert_eq!(err.problem.invalid_parameters.len(), 1);
        assert_eq!(err.problem.invalid_parameters[0].name, "to");
        assert!(err.problem.invalid_parameters[0].reason.is_empty());
    }

    #[test]
    fn errors_keyed_by_field_keep_the_server_detail() {
        let err = decode_error(
            ApiDomain::ProactiveConnect,
            400,
            br#"{"title":"Bad Request","detail":"d","errors":{"name":"too long"}}"#,
        );
        assert_eq!(err.title(), "Bad Request");
        assert_eq!(err.problem.detail.as_deref(), Some("d"));
        assert_eq!(
            err.problem.errors,
            Some(serde_json::json!({"name": "too long"}))
        );
    }

    #[test]
    fn json_array_body_becomes_the_detail() {
        let err = decode_error(ApiDomain::Account, 500, br#"["boom"]"#);
        assert_eq!(err.title(), "Internal Server Error");
        assert_eq!(err.problem.detail.as_deref(), Some(r#"["boom"]"#));
    }

    #[test]
    fn missing_title_falls_back_to_reason_phrase() {
        let err = decode_error(ApiDomain::Messages, 422, br#"{"detail":"bad channel"}"#);
        assert_eq!(err.title(), "Unprocessable Entity");
        assert_eq!(err.problem.detail.as_deref(), Some("bad channel"));

        let err = decode_error(ApiDomain::Messages, 502, b"<html>gateway</html>");
        assert_eq!(err.title(), "Bad Gateway");
        assert_eq!(err.problem.detail.as_deref(), Some("<html>gateway</html>"));

        let err = decode_error(ApiDomain::Messages, 599, b"");
        assert_eq!(err.title(), "HTTP 599");
        assert!(err.problem.detail.is_none());
    }

    #[test]
    fn unparsable_success_body_is_a_parse_error() {
        let err = decode_response(
            ApiDomain::Account,
            &Json::<Thing>::new(),
            &(),
            &response(200, "{ not json"),
        )
        .unwrap_err();
        assert!(matches!(err, VonageError::Parse(_)));
    }

    #[test]
    fn no_content_ignores_the_body() {
        decode_response(ApiDomain::Account, &NoContent, &(), &response(204, "")).unwrap();
        decode_response(ApiDomain::Account, &NoContent, &(), &response(200, "ok")).unwrap();
    }

    #[test]
    fn merge_fills_server_fields_without_touching_the_request() {
        let request = Thing {
            id: None,
            name: Some("mine".to_owned()),
            created_at: None,
        };
        let merged = decode_response(
            ApiDomain::ProactiveConnect,
            &Merge,
            &request,
            &response(200, r#"{"id":"abc","created_at":"2024-01-01T00:00:00Z"}"#),
        )
        .unwrap();

        assert_eq!(merged.id.as_deref(), Some("abc"));
        assert_eq!(merged.name.as_deref(), Some("mine"));
        assert_eq!(merged.created_at.as_deref(), Some("2024-01-01T00:00:00Z"));
        assert!(request.id.is_none());
    }

    #[test]
    fn merge_keeps_matching_identity() {
        let request = Thing {
            id: Some("abc".to_owned()),
            name: None,
            created_at: None,
        };
        let merged = Merge
            .decode(&request, br#"{"id":"abc","name":"server"}"#)
            .unwrap();
        assert_eq!(merged.id.as_deref(), Some("abc"));
        assert_eq!(merged.name.as_deref(), Some("server"));
    }

    #[test]
    fn merge_rejects_conflicting_identity() {
        let request = Thing {
            id: Some("abc".to_owned()),
            name: None,
            created_at: None,
        };
        let err = Merge.decode(&request, br#"{"id":"xyz"}"#).unwrap_err();
        match err {
            VonageError::Inconsistent {
                field,
                request,
                response,
            } => {
                assert_eq!(field, "id");
                assert_eq!(request, "abc");
                assert_eq!(response, "xyz");
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    fn streamed(
        status: u16,
        chunks: Vec<Result<&'static str, &'static str>>,
    ) -> StreamingResponse {
        let chunks = chunks.into_iter().map(|chunk| {
            chunk
                .map(|text| bytes::Bytes::from_static(text.as_bytes()))
                .map_err(|message| -> BoxError { message.into() })
        });
        StreamingResponse {
            status,
            headers: Vec::new(),
            body: futures::stream::iter(chunks).boxed(),
        }
    }

    fn file_names(dir: &Path) -> Vec<String> {
        let mut names: Vec<_> = std::fs::read_dir(dir)
            .unwrap()
            .map(|entry| entry.unwrap().file_name().to_string_lossy().into_owned())
            .collect();
        names.sort();
        names
    }

    #[tokio::test]
    async fn download_to_memory_returns_bytes() {
        let downloaded = write_download(
            ApiDomain::ProactiveConnect,
            streamed(200, vec![Ok("a,b\n"), Ok("1,2\n")]),
            DownloadTarget::Memory,
        )
        .await
        .unwrap();
        assert_eq!(downloaded.into_bytes().unwrap(), b"a,b\n1,2\n".to_vec());
    }

    #[tokio::test]
    async fn download_to_file_writes_everything() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("items.csv");
        let downloaded = write_download(
            ApiDomain::ProactiveConnect,
            streamed(200, vec![Ok("a,b\n"), Ok("1,"), Ok("2\n")]),
            DownloadTarget::File(path.clone()),
        )
        .await
        .unwrap();

        assert_eq!(
            downloaded,
            Downloaded::File {
                path: path.clone(),
                bytes_written: 8
            }
        );
        assert_eq!(std::fs::read(&path).unwrap(), b"a,b\n1,2\n".to_vec());
        assert_eq!(file_names(dir.path()), vec!["items.csv".to_owned()]);
    }

    #[tokio::test]
    async fn interrupted_download_keeps_the_previous_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("items.csv");
        std::fs::write(&path, "old contents").unwrap();

        let err = write_download(
            ApiDomain::ProactiveConnect,
            streamed(200, vec![Ok("a,b\n"), Err("connection reset")]),
            DownloadTarget::File(path.clone()),
        )
        .await
        .unwrap_err();

        assert!(matches!(err, VonageError::Transport(_)));
        assert_eq!(std::fs::read_to_string(&path).unwrap(), "old contents");
        assert_eq!(file_names(dir.path()), vec!["items.csv".to_owned()]);
    }

    #[tokio::test]
    async fn download_replaces_an_existing_file_on_success() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("items.csv");
        std::fs::write(&path, "old contents that are longer").unwrap();

        write_download(
            ApiDomain::ProactiveConnect,
            streamed(200, vec![Ok("new\n")]),
            DownloadTarget::File(path.clone()),
        )
        .await
        .unwrap();

        assert_eq!(std::fs::read_to_string(&path).unwrap(), "new\n");
    }

    #[tokio::test]
    async fn download_target_without_file_name_is_rejected() {
        let err = write_download(
            ApiDomain::ProactiveConnect,
            streamed(200, vec![Ok("a")]),
            DownloadTarget::File(PathBuf::from("/")),
        )
        .await
        .unwrap_err();
        assert!(matches!(err, VonageError::Io(_)));
    }

    #[tokio::test]
    async fn failed_download_does_not_create_the_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("items.csv");
        let err = write_download(
            ApiDomain::ProactiveConnect,
            streamed(404, vec![Ok(r#"{"title":"#), Ok(r#""Not Found"}"#)]),
            DownloadTarget::File(path.clone()),
        )
        .await
        .unwrap_err();
        assert_eq!(err.api_error().unwrap().title(), "Not Found");
        assert!(!path.exists());
    }
}
