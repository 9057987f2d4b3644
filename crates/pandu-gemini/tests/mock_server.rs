//! `GeminiClient` against an in-process mock of the `generateContent` endpoint.

use pandu_core::{
    AspectRatio, CharacterId, GenerateImageParams, GenerationError, GenerationQueue,
    ImageGenerator, ImageStatus, ReferenceImage, StudioSession, UiAspectRatio,
};
use pandu_gemini::{GeminiClient, GeminiConfig};
use pretty_assertions::assert_eq;
use serde_json::{json, Value};
use std::sync::{Arc, Mutex};
use warp::http::StatusCode;
use warp::Filter;

/// (model path segment, api key header, request body)
type Seen = Arc<Mutex<Vec<(String, String, Value)>>>;

/// Serve a fixed reply for every request; returns the base URL
fn spawn_mock(status: StatusCode, body: String, seen: Seen) -> String {
    let route = warp::post()
        .and(warp::path!("v1beta" / "models" / String))
        .and(warp::header::<String>("x-goog-api-key"))
        .and(warp::body::json())
        .map(move |model: String, key: String, request: Value| {
            seen.lock().unwrap().push((model, key, request));
            warp::reply::with_status(body.clone(), status)
        });
    let (addr, server) = warp::serve(route).bind_ephemeral(([127, 0, 0, 1], 0));
    tokio::spawn(server);
    format!("http://{addr}/v1beta")
}

fn client_for(base_url: &str) -> GeminiClient {
    GeminiClient::new(
        GeminiConfig::default()
            .with_api_key("test-key")
            .with_base_url(base_url),
    )
    .unwrap()
}

fn image_reply(data: &str) -> String {
    json!({
        "candidates": [{
            "content": {"role": "model", "parts": [
                {"text": "Here is your scene."},
                {"inlineData": {"mimeType": "image/png", "data": data}}
            ]},
            "finishReason": "STOP"
        }]
    })
    .to_string()
}

#[tokio::test]
async fn success_returns_data_url_and_sends_references_first() {
    let seen: Seen = Arc::default();
    let base = spawn_mock(StatusCode::OK, image_reply("iVBORw0K"), seen.clone());
    let client = client_for(&base);

    let params = GenerateImageParams::new("two friends at a market", UiAspectRatio::Custom)
        .with_references(vec![
            ReferenceImage::new("QQ==", "image/png"),
            ReferenceImage::new("Qg==", "image/webp"),
        ]);
    let url = client.generate(params).await.unwrap();
    assert_eq!(url, "data:image/png;base64,iVBORw0K");

    let seen = seen.lock().unwrap();
    let (model, key, body) = &seen[0];
    assert_eq!(model, "gemini-3-pro-image-preview:generateContent");
    assert_eq!(key, "test-key");

    let parts = body["contents"][0]["parts"].as_array().unwrap();
    assert_eq!(parts.len(), 3);
    assert_eq!(parts[0]["inlineData"]["data"], "QQ==");
    assert_eq!(parts[1]["inlineData"]["mimeType"], "image/webp");
    assert_eq!(parts[2]["text"], "two friends at a market");
    assert_eq!(body["generationConfig"]["imageConfig"]["aspectRatio"], "1:1");
    assert_eq!(body["generationConfig"]["imageConfig"]["imageSize"], "4K");
}

#[tokio::test]
async fn forbidden_maps_to_permission_denied() {
    let body = json!({"error": {"code": 403, "message": "API key not valid", "status": "PERMISSION_DENIED"}});
    let base = spawn_mock(StatusCode::FORBIDDEN, body.to_string(), Arc::default());

    let err = client_for(&base)
        .generate(GenerateImageParams::new("x", UiAspectRatio::default()))
        .await
        .unwrap_err();
    assert_eq!(err, GenerationError::PermissionDenied("API key not valid".into()));
}

#[tokio::test]
async fn server_error_keeps_status() {
    let body = json!({"error": {"code": 500, "message": "Internal error", "status": "INTERNAL"}});
    let base = spawn_mock(StatusCode::INTERNAL_SERVER_ERROR, body.to_string(), Arc::default());

    let err = client_for(&base)
        .generate(GenerateImageParams::new("x", UiAspectRatio::default()))
        .await
        .unwrap_err();
    assert_eq!(
        err,
        GenerationError::Api {
            status: 500,
            message: "Internal error".into()
        }
    );
}

#[tokio::test]
async fn text_only_reply_is_no_image_data() {
    let body = json!({"candidates": [{"content": {"parts": [{"text": "I can't draw that."}]}}]});
    let base = spawn_mock(StatusCode::OK, body.to_string(), Arc::default());

    let err = client_for(&base)
        .generate(GenerateImageParams::new("x", UiAspectRatio::default()))
        .await
        .unwrap_err();
    assert_eq!(err, GenerationError::NoImageData);
}

#[tokio::test]
async fn garbage_reply_is_parse_error() {
    let base = spawn_mock(StatusCode::OK, "<html>oops</html>".to_string(), Arc::default());

    let err = client_for(&base)
        .generate(GenerateImageParams::new("x", UiAspectRatio::default()))
        .await
        .unwrap_err();
    assert!(matches!(err, GenerationError::Parse(_)));
}

#[tokio::test]
async fn batch_over_http_stops_on_forbidden() {
    let seen: Seen = Arc::default();
    let body = json!({"error": {"code": 403, "message": "denied", "status": "PERMISSION_DENIED"}});
    let base = spawn_mock(StatusCode::FORBIDDEN, body.to_string(), seen.clone());
    let queue = GenerationQueue::new(Arc::new(client_for(&base)));

    let mut session =
        StudioSession::new().with_aspect_ratio(UiAspectRatio::Fixed(AspectRatio::Standard));
    session
        .roster
        .attach(CharacterId::slot(1), ReferenceImage::new("QQ==", "image/png"))
        .unwrap();
    session.prompts.update(0, "first").unwrap();
    session.prompts.push("second").unwrap();
    session.prompts.push("third").unwrap();

    let report = session.generate_all(&queue).await.unwrap();

    assert_eq!(seen.lock().unwrap().len(), 1);
    assert_eq!(session.results()[0].status, ImageStatus::Error);
    assert_eq!(session.results()[1].status, ImageStatus::Pending);
    assert_eq!(report.not_attempted, 2);
    assert!(report.aborted.is_some());
}
