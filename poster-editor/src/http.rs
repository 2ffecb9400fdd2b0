//! HTTP client for the publicity backend's JSON API.
//!
//! Endpoints, relative to the configured base URL:
//!
//! | Operation          | Request                                          |
//! |--------------------|--------------------------------------------------|
//! | template types     | `GET  template-types`                            |
//! | event media        | `GET  posts/{id}/media`                          |
//! | post content       | `GET  posts/{id}`                                |
//! | load layout        | `GET  posts/{id}/layout` (404 means none)        |
//! | save layout        | `PUT  posts/{id}/layout`                         |
//! | upload artifact    | `PUT  layouts/{record}/artifact?filename=...`    |
//! | fetch asset        | `GET  {fileRef}` resolved against the base URL   |
//!
//! Transient failures (transport errors, 5xx, 429) are retried per
//! [`RetryPolicy`], with separate limits for reads and writes.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use poster_core::PostContent;
use poster_renderer::decode_data_uri;
use reqwest::{Client, RequestBuilder, Response, StatusCode};
use serde::de::DeserializeOwned;
use tracing::{debug, warn};
use url::Url;

use crate::backend::{
    Backend, BackendError, BackendResult, MediaAsset, PostId, RecordId, SaveLayoutRequest,
    SaveLayoutResponse, StoredLayout, TemplateType,
};

/// How often the client repeats a request the backend failed transiently.
///
/// Every endpoint is safe to repeat: reads have no side effects and both
/// writes replace the stored layout or artifact wholesale. Writes get fewer
/// attempts because each one re-sends the full document or JPEG. Pauses
/// double from `first_pause` up to `max_pause`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Attempts for lookups, layout loads and asset fetches.
    pub read_attempts: u32,
    /// Attempts for layout saves and artifact uploads.
    pub write_attempts: u32,
    /// Pause before the first repeat.
    pub first_pause: Duration,
    /// Longest pause between two attempts.
    pub max_pause: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            read_attempts: 4,
            write_attempts: 2,
            first_pause: Duration::from_millis(250),
            max_pause: Duration::from_secs(2),
        }
    }
}

impl RetryPolicy {
    fn attempts(&self, kind: RequestKind) -> u32 {
        let attempts = match kind {
            RequestKind::Read => self.read_attempts,
            RequestKind::Write => self.write_attempts,
        };
        attempts.max(1)
    }

    /// Pause after the `failed`-th failed attempt (1-based).
    fn pause_after(&self, failed: u32) -> Duration {
        let doublings = failed.saturating_sub(1).min(16);
        self.first_pause
            .saturating_mul(1 << doublings)
            .min(self.max_pause)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum RequestKind {
    Read,
    Write,
}

/// Backend spoken to over HTTP.
#[derive(Clone)]
pub struct HttpBackend {
    inner: Arc<InnerClient>,
}

struct InnerClient {
    http: Client,
    base: Url,
    retry: RetryPolicy,
}

impl HttpBackend {
    /// Create a client with the default retry policy.
    ///
    /// # Errors
    ///
    /// Returns [`BackendError::InvalidUrl`] if the URL is malformed.
    pub fn new(base_url: impl AsRef<str>) -> BackendResult<Self> {
        Self::with_retry_policy(base_url, RetryPolicy::default())
    }

    /// Create a client with a custom retry policy.
    ///
    /// # Errors
    ///
    /// Returns [`BackendError::InvalidUrl`] if the URL is malformed.
    /// Returns [`BackendError::Http`] if the HTTP client fails to build.
    pub fn with_retry_policy(
        base_url: impl AsRef<str>,
        retry: RetryPolicy,
    ) -> BackendResult<Self> {
        let mut base =
            Url::parse(base_url.as_ref()).map_err(|e| BackendError::InvalidUrl(e.to_string()))?;
        if base.cannot_be_a_base() {
            return Err(BackendError::InvalidUrl(format!(
                "{base} cannot be used as a base URL"
            )));
        }
        // joined paths are relative to the last segment otherwise
        if !base.path().ends_with('/') {
            let path = format!("{}/", base.path());
            base.set_path(&path);
        }

        let http = Client::builder()
            .user_agent(concat!("poster-studio/", env!("CARGO_PKG_VERSION")))
            .build()?;

        Ok(Self {
            inner: Arc::new(InnerClient { http, base, retry }),
        })
    }

    /// Base URL every endpoint is resolved against.
    #[must_use]
    pub fn base_url(&self) -> &Url {
        &self.inner.base
    }

    fn endpoint(&self, path: &str) -> BackendResult<Url> {
        self.inner
            .base
            .join(path)
            .map_err(|e| BackendError::InvalidUrl(format!("{path}: {e}")))
    }

    /// Send a request, repeating it on transport failures, 5xx and 429.
    ///
    /// Other responses, including 4xx, are returned for the caller to judge.
    async fn send_with_retry<F>(
        &self,
        operation: &str,
        kind: RequestKind,
        build: F,
    ) -> BackendResult<Response>
    where
        F: Fn() -> RequestBuilder + Send + Sync,
    {
        let policy = &self.inner.retry;
        let attempts = policy.attempts(kind);
        let mut failed = 0;

        loop {
            let error = match build().send().await {
                Ok(resp)
                    if resp.status().is_server_error()
                        || resp.status() == StatusCode::TOO_MANY_REQUESTS =>
                {
                    BackendError::Status {
                        status: resp.status().as_u16(),
                        url: resp.url().to_string(),
                    }
                }
                Ok(resp) => return Ok(resp),
                Err(e) => BackendError::Http(e),
            };
            failed += 1;

            if !error.is_retryable() || failed >= attempts {
                return Err(error);
            }
            let pause = policy.pause_after(failed);
            warn!(
                "Backend {operation} failed ({failed}/{attempts}), retrying in {}ms: {error}",
                pause.as_millis()
            );
            tokio::time::sleep(pause).await;
        }
    }

    async fn get_json<T: DeserializeOwned>(&self, operation: &str, path: &str) -> BackendResult<T> {
        let url = self.endpoint(path)?;
        let response = self
            .send_with_retry(operation, RequestKind::Read, || {
                self.inner.http.get(url.clone())
            })
            .await?;
        let response = ensure_success(response)?;
        Ok(response.json().await?)
    }
}

fn ensure_success(response: Response) -> BackendResult<Response> {
    if response.status().is_success() {
        Ok(response)
    } else {
        Err(BackendError::Status {
            status: response.status().as_u16(),
            url: response.url().to_string(),
        })
    }
}

#[async_trait]
impl Backend for HttpBackend {
    async fn template_types(&self) -> BackendResult<Vec<TemplateType>> {
        self.get_json("template_types", "template-types").await
    }

    async fn event_media(&self, post: PostId) -> BackendResult<Vec<MediaAsset>> {
        self.get_json("event_media", &format!("posts/{post}/media"))
            .await
    }

    async fn post_content(&self, post: PostId) -> BackendResult<PostContent> {
        self.get_json("post_content", &format!("posts/{post}")).await
    }

    async fn load_layout(&self, post: PostId) -> BackendResult<Option<StoredLayout>> {
        let url = self.endpoint(&format!("posts/{post}/layout"))?;
        let response = self
            .send_with_retry("load_layout", RequestKind::Read, || {
                self.inner.http.get(url.clone())
            })
            .await?;
        if response.status() == StatusCode::NOT_FOUND {
            debug!("No stored layout for post {post}");
            return Ok(None);
        }
        let response = ensure_success(response)?;
        Ok(Some(response.json().await?))
    }

    async fn save_layout(
        &self,
        post: PostId,
        request: &SaveLayoutRequest,
    ) -> BackendResult<RecordId> {
        let url = self.endpoint(&format!("posts/{post}/layout"))?;
        let response = self
            .send_with_retry("save_layout", RequestKind::Write, || {
                self.inner.http.put(url.clone()).json(request)
            })
            .await?;
        let saved: SaveLayoutResponse = ensure_success(response)?.json().await?;
        debug!("Saved layout for post {post} as record {}", saved.record_id);
        Ok(saved.record_id)
    }

    async fn upload_artifact(
        &self,
        record: RecordId,
        filename: &str,
        bytes: Vec<u8>,
    ) -> BackendResult<()> {
        let mut url = self.endpoint(&format!("layouts/{record}/artifact"))?;
        url.query_pairs_mut().append_pair("filename", filename);
        let size = bytes.len();
        let response = self
            .send_with_retry("upload_artifact", RequestKind::Write, || {
                self.inner
                    .http
                    .put(url.clone())
                    .header(reqwest::header::CONTENT_TYPE, poster_renderer::ARTIFACT_MIME)
                    .body(bytes.clone())
            })
            .await?;
        ensure_success(response)?;
        debug!("Uploaded {filename} ({size} bytes) to record {record}");
        Ok(())
    }

    async fn fetch_asset(&self, file_ref: &str) -> BackendResult<Vec<u8>> {
        if file_ref.starts_with("data:") {
            return decode_data_uri(file_ref)
                .map_err(|e| BackendError::UnexpectedResponse(e.to_string()));
        }
        let url = self.endpoint(file_ref)?;
        let response = self
            .send_with_retry("fetch_asset", RequestKind::Read, || {
                self.inner.http.get(url.clone())
            })
            .await?;
        let response = ensure_success(response)?;
        Ok(response.bytes().await?.to_vec())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use wiremock::matchers::{body_json, header, method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    #[test]
    fn test_writes_get_fewer_attempts() {
        let policy = RetryPolicy::default();
        assert_eq!(policy.attempts(RequestKind::Read), 4);
        assert_eq!(policy.attempts(RequestKind::Write), 2);
        // zero still sends once
        let never = RetryPolicy {
            write_attempts: 0,
            ..policy
        };
        assert_eq!(never.attempts(RequestKind::Write), 1);
    }

    #[test]
    fn test_pause_doubles_up_to_cap() {
        let policy = RetryPolicy::default();
        assert_eq!(policy.pause_after(1), Duration::from_millis(250));
        assert_eq!(policy.pause_after(2), Duration::from_millis(500));
        assert_eq!(policy.pause_after(3), Duration::from_secs(1));
        assert_eq!(policy.pause_after(4), Duration::from_secs(2));
        assert_eq!(policy.pause_after(40), Duration::from_secs(2));
    }

    #[test]
    fn test_invalid_url_error() {
        let result = HttpBackend::new("not-a-valid-url");
        match result {
            Err(BackendError::InvalidUrl(_)) => {}
            Err(other) => panic!("Expected InvalidUrl error, got: {other:?}"),
            Ok(_) => panic!("Expected InvalidUrl error"),
        }
    }

    #[test]
    fn test_base_url_gets_trailing_slash() {
        let backend = HttpBackend::new("http://localhost:8080/api").expect("backend");
        assert_eq!(backend.base_url().as_str(), "http://localhost:8080/api/");
        let url = backend.endpoint("posts/4/layout").expect("url");
        assert_eq!(url.as_str(), "http://localhost:8080/api/posts/4/layout");
    }

    fn backend_for(server: &MockServer) -> HttpBackend {
        let policy = RetryPolicy {
            read_attempts: 3,
            write_attempts: 2,
            first_pause: Duration::from_millis(1),
            max_pause: Duration::from_millis(5),
        };
        HttpBackend::with_retry_policy(server.uri(), policy).expect("backend")
    }

    #[tokio::test]
    #[cfg_attr(
        target_os = "macos",
        ignore = "wiremock/reqwest system-configuration issue on macOS"
    )]
    async fn template_types_success() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/template-types"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!([
                {"id": 1, "name": "Feed", "canvasWidth": 1080, "canvasHeight": 1350},
                {"id": 2, "name": "Story", "canvasWidth": 1080, "canvasHeight": 1920,
                 "backgroundImageRef": "assets/story.png"}
            ])))
            .mount(&server)
            .await;

        let types = backend_for(&server).template_types().await.expect("types");
        assert_eq!(types.len(), 2);
        assert_eq!(types[1].canvas_height, 1920);
    }

    #[tokio::test]
    #[cfg_attr(
        target_os = "macos",
        ignore = "wiremock/reqwest system-configuration issue on macOS"
    )]
    async fn load_layout_404_is_none() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/posts/9/layout"))
            .respond_with(ResponseTemplate::new(404))
            .mount(&server)
            .await;

        let layout = backend_for(&server).load_layout(9).await.expect("layout");
        assert!(layout.is_none());
    }

    #[tokio::test]
    #[cfg_attr(
        target_os = "macos",
        ignore = "wiremock/reqwest system-configuration issue on macOS"
    )]
    async fn get_retries_server_errors() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/posts/5"))
            .respond_with(ResponseTemplate::new(503))
            .up_to_n_times(2)
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/posts/5"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "title": "Open Day", "content": "All welcome", "date": "Sunday", "issue": "2"
            })))
            .mount(&server)
            .await;

        let content = backend_for(&server).post_content(5).await.expect("content");
        assert_eq!(content.title, "Open Day");
    }

    #[tokio::test]
    #[cfg_attr(
        target_os = "macos",
        ignore = "wiremock/reqwest system-configuration issue on macOS"
    )]
    async fn get_gives_up_after_max_attempts() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/posts/5/media"))
            .respond_with(ResponseTemplate::new(500))
            .expect(3)
            .mount(&server)
            .await;

        let err = backend_for(&server).event_media(5).await.unwrap_err();
        assert!(matches!(err, BackendError::Status { status: 500, .. }));
    }

    #[tokio::test]
    #[cfg_attr(
        target_os = "macos",
        ignore = "wiremock/reqwest system-configuration issue on macOS"
    )]
    async fn save_layout_puts_document() {
        let server = MockServer::start().await;
        let request = SaveLayoutRequest {
            template_type_id: 1,
            layout_document: json!({"version": 1}),
            asset_slots: Vec::new(),
        };
        Mock::given(method("PUT"))
            .and(path("/posts/3/layout"))
            .and(body_json(json!({
                "templateTypeId": 1,
                "layoutDocument": {"version": 1},
                "assetSlots": []
            })))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({"recordId": 77})))
            .expect(1)
            .mount(&server)
            .await;

        let record = backend_for(&server)
            .save_layout(3, &request)
            .await
            .expect("save");
        assert_eq!(record, 77);
    }

    #[tokio::test]
    #[cfg_attr(
        target_os = "macos",
        ignore = "wiremock/reqwest system-configuration issue on macOS"
    )]
    async fn upload_artifact_sends_jpeg() {
        let server = MockServer::start().await;
        Mock::given(method("PUT"))
            .and(path("/layouts/77/artifact"))
            .and(query_param("filename", "poster-3.jpg"))
            .and(header("content-type", "image/jpeg"))
            .respond_with(ResponseTemplate::new(204))
            .expect(1)
            .mount(&server)
            .await;

        backend_for(&server)
            .upload_artifact(77, "poster-3.jpg", vec![0xFF, 0xD8, 0xFF])
            .await
            .expect("upload");
    }

    #[tokio::test]
    async fn fetch_asset_decodes_data_uri() {
        let backend = HttpBackend::new("http://localhost:1").expect("backend");
        let bytes = backend
            .fetch_asset("data:image/png;base64,iVBORw0KGgo=")
            .await
            .expect("asset");
        assert_eq!(&bytes[..4], &[0x89, 0x50, 0x4E, 0x47]);
    }

    #[tokio::test]
    #[cfg_attr(
        target_os = "macos",
        ignore = "wiremock/reqwest system-configuration issue on macOS"
    )]
    async fn save_retries_once_then_fails() {
        let server = MockServer::start().await;
        Mock::given(method("PUT"))
            .and(path("/posts/3/layout"))
            .respond_with(ResponseTemplate::new(502))
            .expect(2)
            .mount(&server)
            .await;
        let request = SaveLayoutRequest {
            template_type_id: 1,
            layout_document: json!({}),
            asset_slots: Vec::new(),
        };

        let err = backend_for(&server)
            .save_layout(3, &request)
            .await
            .unwrap_err();
        assert!(matches!(err, BackendError::Status { status: 502, .. }));
    }

    #[tokio::test]
    #[cfg_attr(
        target_os = "macos",
        ignore = "wiremock/reqwest system-configuration issue on macOS"
    )]
    async fn upload_repeats_body_after_transient_failure() {
        let server = MockServer::start().await;
        Mock::given(method("PUT"))
            .and(path("/layouts/8/artifact"))
            .respond_with(ResponseTemplate::new(503))
            .up_to_n_times(1)
            .mount(&server)
            .await;
        Mock::given(method("PUT"))
            .and(path("/layouts/8/artifact"))
            .respond_with(ResponseTemplate::new(204))
            .expect(1)
            .mount(&server)
            .await;

        backend_for(&server)
            .upload_artifact(8, "poster-8.jpg", vec![0xFF, 0xD8, 0xFF])
            .await
            .expect("upload");
        let requests = server.received_requests().await.expect("recording");
        assert_eq!(requests.len(), 2);
        assert!(requests.iter().all(|r| r.body == [0xFF, 0xD8, 0xFF]));
    }

    #[tokio::test]
    #[cfg_attr(
        target_os = "macos",
        ignore = "wiremock/reqwest system-configuration issue on macOS"
    )]
    async fn client_errors_are_not_retried() {
        let server = MockServer::start().await;
        Mock::given(method("PUT"))
            .and(path("/posts/3/layout"))
            .respond_with(ResponseTemplate::new(422))
            .expect(1)
            .mount(&server)
            .await;
        let request = SaveLayoutRequest {
            template_type_id: 1,
            layout_document: json!({}),
            asset_slots: Vec::new(),
        };

        let err = backend_for(&server)
            .save_layout(3, &request)
            .await
            .unwrap_err();
        assert!(matches!(err, BackendError::Status { status: 422, .. }));
    }
}
