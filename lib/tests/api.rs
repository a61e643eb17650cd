#![cfg(feature = "axum")]

use std::sync::Arc;

use axum::body::Body;
use axum::http::{header, Request, StatusCode};
use serde_json::{json, Value};
use tower::ServiceExt;

use embrace::ai::{MockGenerator, PIXEL_PNG};
use embrace::{config, App, Config};

fn app(uri: Option<&str>, generator: MockGenerator) -> App {
    let config = Config {
        database: config::Database {
            uri: uri.map(str::to_string),
        },
        assets: config::Assets {
            serve: false,
            ..Default::default()
        },
        ..Default::default()
    };
    App::with_generator(config, Arc::new(generator))
}

async fn send(app: &App, method: &str, uri: &str, body: Option<Value>) -> (StatusCode, Vec<u8>) {
    let mut request = Request::builder().method(method).uri(uri);
    let body = match body {
        Some(body) => {
            request = request.header(header::CONTENT_TYPE, "application/json");
            Body::from(body.to_string())
        }
        None => Body::empty(),
    };
    let response = embrace::axum::router(app)
        .oneshot(request.body(body).unwrap())
        .await
        .unwrap();
    let status = response.status();
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    (status, bytes.to_vec())
}

async fn send_json(app: &App, method: &str, uri: &str, body: Option<Value>) -> (StatusCode, Value) {
    let (status, bytes) = send(app, method, uri, body).await;
    let json = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap()
    };
    (status, json)
}

#[tokio::test]
async fn save_and_list_images() {
    let app = app(Some("mem:"), MockGenerator::new());

    let (status, saved) = send_json(
        &app,
        "POST",
        "/api/images",
        Some(json!({ "imageDataUri": PIXEL_PNG, "prompt": "sunset castle" })),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(saved["prompt"], "sunset castle");
    assert!(saved.get("memoryId").is_none());

    let (status, gallery) = send_json(&app, "GET", "/api/images", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(gallery["status"], "ok");
    assert_eq!(gallery["images"][0]["id"], saved["id"]);
    assert!(gallery.get("reason").is_none());
}

#[tokio::test]
async fn empty_image_data_is_rejected() {
    let app = app(Some("mem:"), MockGenerator::new());
    let (status, body) = send_json(
        &app,
        "POST",
        "/api/images",
        Some(json!({ "imageDataUri": " ", "prompt": "nothing" })),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["error"].is_string());
}

#[tokio::test]
async fn unconfigured_storage_answers_without_failing() {
    let app = app(None, MockGenerator::new());

    let (status, gallery) = send_json(&app, "GET", "/api/images", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(gallery["status"], "unavailable");
    assert_eq!(gallery["images"], json!([]));
    assert_eq!(gallery["reason"]["kind"], "not_configured");

    let (status, body) = send_json(
        &app,
        "POST",
        "/api/images",
        Some(json!({ "imageDataUri": PIXEL_PNG, "prompt": "p" })),
    )
    .await;
    assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
    assert_eq!(body["reason"]["kind"], "not_configured");

    let (status, _) = send_json(&app, "GET", "/api/memories/m1/image", None).await;
    assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
}

#[tokio::test]
async fn generated_image_is_returned_even_when_not_saved() {
    let app = app(None, MockGenerator::new());
    let (status, body) = send_json(
        &app,
        "POST",
        "/api/images/generate",
        Some(json!({ "prompt": "a lighthouse" })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["imageDataUri"], PIXEL_PNG);
    assert!(body["saved"].is_null());
    assert!(body["warning"].is_string());
}

#[tokio::test]
async fn generation_failure_is_bad_gateway() {
    let app = app(Some("mem:"), MockGenerator::failing());
    let (status, _) = send_json(
        &app,
        "POST",
        "/api/images/generate",
        Some(json!({ "prompt": "a lighthouse" })),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_GATEWAY);

    let (_, gallery) = send_json(&app, "GET", "/api/images", None).await;
    assert_eq!(gallery["images"], json!([]));
}

#[tokio::test]
async fn serves_image_bytes() {
    let app = app(Some("mem:"), MockGenerator::new());
    let saved = app
        .store
        .save_image(PIXEL_PNG, "pixel")
        .await
        .into_option()
        .unwrap();

    let response = embrace::axum::router(&app)
        .oneshot(
            Request::builder()
                .uri(format!("/image/{}", saved.id))
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(response.headers()[header::CONTENT_TYPE], "image/png");
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    assert!(bytes.starts_with(b"\x89PNG"));

    let (status, _) = send(&app, "GET", &format!("/image/{}", uuid::Uuid::new_v4()), None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn memory_slot_roundtrip() {
    let app = app(Some("mem:"), MockGenerator::new());

    let (status, _) = send_json(&app, "GET", "/api/memories/first-date/image", None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (status, first) = send_json(
        &app,
        "PUT",
        "/api/memories/first-date/image",
        Some(json!({ "imageDataUri": "data:,one", "prompt": "one" })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(first["memoryId"], "first-date");

    let (status, regenerated) = send_json(
        &app,
        "POST",
        "/api/memories/first-date/image/generate",
        Some(json!({ "hint": "picnic in the park" })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(regenerated["saved"]["id"], first["id"]);

    let (status, current) = send_json(&app, "GET", "/api/memories/first-date/image", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(current["imageDataUri"], PIXEL_PNG);

    let (_, all) = send_json(&app, "GET", "/api/memories", None).await;
    assert_eq!(all.as_array().map(Vec::len), Some(1));
}

#[tokio::test]
async fn poem_and_companion() {
    let app = app(None, MockGenerator::with_reply("roses are red"));
    let (status, body) = send_json(
        &app,
        "POST",
        "/api/poem",
        Some(json!({ "monthsTogether": 6, "userName": "Sam", "partnerName": "Alex" })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["poem"], "roses are red");

    let app = self::app(None, MockGenerator::failing());
    let (status, body) = send_json(
        &app,
        "POST",
        "/api/companion",
        Some(json!({ "milestone": "six months" })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(
        body["message"],
        embrace::ai::prompts::COMPANION_ERROR_FALLBACK
    );
}

#[tokio::test]
async fn storage_failures_keep_internals_private() -> anyhow::Result<()> {
    let dir = tempfile::tempdir()?;
    let path = dir.path().join("db");
    // Holding the database open elsewhere makes every connect fail on the
    // file lock, with the path in the error.
    let _holder = sled::open(&path)?;
    let path = path.display().to_string();
    let app = app(Some(&format!("sled:{path}")), MockGenerator::new());

    let requests = [
        ("GET", "/api/images", None),
        (
            "POST",
            "/api/images",
            Some(json!({ "imageDataUri": PIXEL_PNG, "prompt": "p" })),
        ),
        ("GET", "/api/memories/m1/image", None),
        ("POST", "/api/images/generate", Some(json!({ "prompt": "p" }))),
    ];
    for (method, uri, body) in requests {
        let (_, bytes) = send(&app, method, uri, body).await;
        let text = String::from_utf8(bytes)?;
        assert!(!text.contains(&path), "{method} {uri}: {text}");
        assert!(!text.contains("lock"), "{method} {uri}: {text}");
        assert!(!text.contains("backtrace"), "{method} {uri}: {text}");
    }

    let (status, gallery) = send_json(&app, "GET", "/api/images", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(gallery["status"], "unavailable");
    assert_eq!(gallery["reason"], json!({ "kind": "connection" }));

    let (status, body) = send_json(&app, "GET", "/api/memories", None).await;
    assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
    assert_eq!(body["reason"], json!({ "kind": "connection" }));
    assert_eq!(body["error"], "storage is unreachable");
    Ok(())
}
