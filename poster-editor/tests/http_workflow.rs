//! Integration tests for the editor against an HTTP publicity backend.
//!
//! A wiremock server stands in for the backend; the tests check the requests
//! the editor sends and how it reacts to failing endpoints.

use std::sync::Arc;
use std::time::Duration;

use poster_editor::{Editor, EditorConfig, EditorError, HttpBackend, RetryPolicy, Status};
use poster_renderer::ExportConfig;
use serde_json::{json, Value};
use wiremock::matchers::{header, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn png(rgb: [u8; 3]) -> Vec<u8> {
    let img = image::RgbImage::from_pixel(2, 2, image::Rgb(rgb));
    let mut buf = std::io::Cursor::new(Vec::new());
    img.write_to(&mut buf, image::ImageFormat::Png)
        .expect("png");
    buf.into_inner()
}

fn config(dir: &std::path::Path) -> EditorConfig {
    EditorConfig {
        download_dir: dir.to_path_buf(),
        export: ExportConfig {
            oversample: 1.0,
            load_system_fonts: false,
            ..ExportConfig::default()
        },
        ..EditorConfig::default()
    }
}

fn backend(server: &MockServer) -> Arc<HttpBackend> {
    let policy = RetryPolicy {
        read_attempts: 2,
        write_attempts: 2,
        first_pause: Duration::from_millis(1),
        max_pause: Duration::from_millis(5),
    };
    Arc::new(HttpBackend::with_retry_policy(server.uri(), policy).expect("backend"))
}

async fn mount_lookups(server: &MockServer) {
    Mock::given(method("GET"))
        .and(path("/template-types"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([
            {"id": 1, "name": "Feed", "canvasWidth": 540, "canvasHeight": 675}
        ])))
        .mount(server)
        .await;
    Mock::given(method("GET"))
        .and(path("/posts/3/media"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([
            {"id": 5, "fileRef": "files/5.png", "displayName": "Stage"}
        ])))
        .mount(server)
        .await;
    Mock::given(method("GET"))
        .and(path("/posts/3"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "title": "Jazz Night", "content": "Live band", "date": "Friday", "issue": "7"
        })))
        .mount(server)
        .await;
}

#[tokio::test]
#[cfg_attr(
    target_os = "macos",
    ignore = "wiremock/reqwest system-configuration issue on macOS"
)]
async fn test_export_saves_then_uploads() {
    let server = MockServer::start().await;
    mount_lookups(&server).await;
    Mock::given(method("GET"))
        .and(path("/posts/3/layout"))
        .respond_with(ResponseTemplate::new(404))
        .mount(&server)
        .await;
    Mock::given(method("PUT"))
        .and(path("/posts/3/layout"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"recordId": 41})))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/files/5.png"))
        .respond_with(ResponseTemplate::new(200).set_body_bytes(png([255, 0, 0])))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("PUT"))
        .and(path("/layouts/41/artifact"))
        .and(query_param("filename", "poster-3.jpg"))
        .and(header("content-type", "image/jpeg"))
        .respond_with(ResponseTemplate::new(204))
        .expect(1)
        .mount(&server)
        .await;

    let dir = tempfile::tempdir().expect("tempdir");
    let mut editor = Editor::connect(backend(&server), config(dir.path()), 3).await;
    assert_eq!(editor.session().content().title, "Jazz Night");
    editor.select_template(1).expect("template");
    editor.session_mut().select_media(5).expect("slot");

    let outcome = editor.export().await.expect("export");
    assert_eq!(outcome.record_id, 41);
    assert_eq!((outcome.width, outcome.height), (540, 675));

    let requests = server.received_requests().await.expect("recording");
    let save = requests
        .iter()
        .find(|r| r.method.as_str() == "PUT" && r.url.path() == "/posts/3/layout")
        .expect("save request");
    let body: Value = serde_json::from_slice(&save.body).expect("json body");
    assert_eq!(body["templateTypeId"], 1);
    assert_eq!(body["layoutDocument"]["version"], 1);
    assert_eq!(body["layoutDocument"]["canvas"]["width"], 540);
    assert_eq!(body["assetSlots"], json!([{"mediaId": 5, "slotNumber": 0}]));

    let upload = requests
        .iter()
        .find(|r| r.url.path() == "/layouts/41/artifact")
        .expect("upload request");
    assert_eq!(&upload.body[..2], &[0xFF, 0xD8]);
    assert_eq!(std::fs::read(&outcome.path).expect("download"), upload.body);
}

#[tokio::test]
#[cfg_attr(
    target_os = "macos",
    ignore = "wiremock/reqwest system-configuration issue on macOS"
)]
async fn test_failed_auto_save_aborts_export() {
    let server = MockServer::start().await;
    mount_lookups(&server).await;
    Mock::given(method("GET"))
        .and(path("/posts/3/layout"))
        .respond_with(ResponseTemplate::new(404))
        .mount(&server)
        .await;
    Mock::given(method("PUT"))
        .and(path("/posts/3/layout"))
        .respond_with(ResponseTemplate::new(500))
        .mount(&server)
        .await;
    Mock::given(method("PUT"))
        .and(path("/layouts/41/artifact"))
        .respond_with(ResponseTemplate::new(204))
        .expect(0)
        .mount(&server)
        .await;

    let dir = tempfile::tempdir().expect("tempdir");
    let mut editor = Editor::connect(backend(&server), config(dir.path()), 3).await;
    editor.select_template(1).expect("template");
    let before = editor.session().document().clone();

    let err = editor.export().await.unwrap_err();
    assert!(matches!(err, EditorError::Backend(_)));
    assert!(editor.status().is_error());
    assert!(editor.record_id().is_none());
    assert_eq!(editor.session().document(), &before);
    assert!(!dir.path().join("poster-3.jpg").exists());
}

#[tokio::test]
#[cfg_attr(
    target_os = "macos",
    ignore = "wiremock/reqwest system-configuration issue on macOS"
)]
async fn test_failed_lookups_keep_editor_usable() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/template-types"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([
            {"id": 1, "canvasWidth": 1080, "canvasHeight": 1350}
        ])))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/posts/3/media"))
        .respond_with(ResponseTemplate::new(503))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/posts/3"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"title": "Quiz"})))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/posts/3/layout"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "recordId": 12,
            "templateTypeId": 1,
            "layoutDocument": {"assets": {"selectedMediaIds": [5]}}
        })))
        .mount(&server)
        .await;

    let dir = tempfile::tempdir().expect("tempdir");
    let editor = Editor::connect(backend(&server), config(dir.path()), 3).await;

    assert!(matches!(editor.status(), Status::Error(message) if message.contains("media")));
    assert!(editor.media().is_empty());
    assert_eq!(editor.record_id(), Some(12));
    assert_eq!(editor.template().map(|t| t.id), Some(1));
    assert_eq!(editor.session().document().assets.ids(), &[5]);
}

#[tokio::test]
#[cfg_attr(
    target_os = "macos",
    ignore = "wiremock/reqwest system-configuration issue on macOS"
)]
async fn test_failed_layout_fetch_opens_defaults() {
    let server = MockServer::start().await;
    mount_lookups(&server).await;
    Mock::given(method("GET"))
        .and(path("/posts/3/layout"))
        .respond_with(ResponseTemplate::new(500))
        .mount(&server)
        .await;

    let dir = tempfile::tempdir().expect("tempdir");
    let mut editor = Editor::connect(backend(&server), config(dir.path()), 3).await;

    assert!(matches!(editor.status(), Status::Error(message) if message.contains("500")));
    assert!(editor.record_id().is_none());
    assert!(editor.template().is_none());
    assert_eq!(editor.session().content().title, "Jazz Night");
    assert_eq!(
        editor.session().layout(),
        &poster_core::default_layout(poster_core::DEFAULT_CANVAS)
    );

    // still editable once the backend recovers
    editor.select_template(1).expect("template");
    assert_eq!(editor.session().canvas(), poster_core::Canvas::new(540, 675));
}
