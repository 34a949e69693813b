//! Translation gate tests: throttle behavior and the Google backend

mod common;

use std::sync::Arc;
use std::time::Duration;

use wiremock::matchers::{method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

use common::TaggingTranslator;
use steamcast::translation::{GoogleTranslator, TranslationGate, FAILURE_MARKER};

const WINDOW: Duration = Duration::from_secs(60);

#[tokio::test(start_paused = true)]
async fn test_concurrent_callers_respect_budget_and_spacing() {
    let backend = Arc::new(TaggingTranslator::default());
    let gate = Arc::new(TranslationGate::new(
        backend.clone(),
        3,
        Duration::from_secs(1),
        1_500,
        Duration::from_secs(5),
    ));

    let handles: Vec<_> = (0..10)
        .map(|i| {
            let gate = Arc::clone(&gate);
            tokio::spawn(async move { gate.translate(&format!("text {i}"), "en", "fr").await })
        })
        .collect();

    for handle in handles {
        let translated = handle.await.unwrap();
        assert!(translated.starts_with("[fr] text "));
    }

    let times = backend.call_times();
    assert_eq!(times.len(), 10);

    for pair in times.windows(2) {
        assert!(pair[1].duration_since(pair[0]) >= Duration::from_secs(1));
    }

    // Any 4 consecutive calls span at least one full window
    for group in times.windows(4) {
        assert!(group[3].duration_since(group[0]) >= WINDOW);
    }
}

#[tokio::test(start_paused = true)]
async fn test_single_caller_waits_for_window() {
    let backend = Arc::new(TaggingTranslator::default());
    let gate = TranslationGate::new(
        backend.clone(),
        2,
        Duration::ZERO,
        1_500,
        Duration::from_secs(5),
    );

    let start = tokio::time::Instant::now();
    gate.translate("one", "en", "fr").await;
    gate.translate("two", "en", "fr").await;
    assert!(start.elapsed() < Duration::from_secs(1));

    gate.translate("three", "en", "fr").await;
    assert!(start.elapsed() >= WINDOW);
    assert_eq!(backend.call_count(), 3);
}

#[tokio::test(start_paused = true)]
async fn test_oversized_text_is_cut_at_sentence_boundary() {
    let backend = Arc::new(TaggingTranslator::default());
    let gate = TranslationGate::new(backend, 20, Duration::ZERO, 40, Duration::from_secs(5));

    let text = "New map added. Balance changes for all heroes. Bug fixes.";
    let translated = gate.translate(text, "en", "fr").await;
    assert_eq!(translated, "[fr] New map added.");
}

#[tokio::test]
async fn test_google_backend_joins_segments() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/translate_a/single"))
        .and(query_param("client", "gtx"))
        .and(query_param("sl", "en"))
        .and(query_param("tl", "fr"))
        .and(query_param("q", "Hello world. See you."))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!([
            [
                ["Bonjour le monde. ", "Hello world. ", null, null, 1],
                ["A bientôt.", "See you.", null, null, 1]
            ],
            null,
            "en"
        ])))
        .expect(1)
        .mount(&mock_server)
        .await;

    let endpoint = format!("{}/translate_a/single", mock_server.uri());
    let backend = Arc::new(GoogleTranslator::new(endpoint, Duration::from_secs(5)).unwrap());
    let gate = TranslationGate::new(backend, 20, Duration::ZERO, 1_500, Duration::from_secs(5));

    let translated = gate.translate("Hello world.   See you.", "en", "fr").await;
    assert_eq!(translated, "Bonjour le monde. A bientôt.");
}

#[tokio::test]
async fn test_google_backend_error_returns_marked_original() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/translate_a/single"))
        .respond_with(ResponseTemplate::new(500))
        .expect(1)
        .mount(&mock_server)
        .await;

    let endpoint = format!("{}/translate_a/single", mock_server.uri());
    let backend = Arc::new(GoogleTranslator::new(endpoint, Duration::from_secs(5)).unwrap());
    let gate = TranslationGate::new(backend, 20, Duration::ZERO, 1_500, Duration::from_secs(5));

    let translated = gate.translate("Patch notes", "en", "fr").await;
    assert_eq!(translated, format!("{FAILURE_MARKER} Patch notes"));
}

#[tokio::test]
async fn test_slow_backend_times_out() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/translate_a/single"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(serde_json::json!([[["Bonjour", "Hello"]], null, "en"]))
                .set_delay(Duration::from_secs(3)),
        )
        .mount(&mock_server)
        .await;

    let endpoint = format!("{}/translate_a/single", mock_server.uri());
    let backend = Arc::new(GoogleTranslator::new(endpoint, Duration::from_secs(10)).unwrap());
    let gate = TranslationGate::new(
        backend,
        20,
        Duration::ZERO,
        1_500,
        Duration::from_millis(200),
    );

    let started = std::time::Instant::now();
    let translated = gate.translate("Hello", "en", "fr").await;
    assert_eq!(translated, format!("{FAILURE_MARKER} Hello"));
    assert!(started.elapsed() < Duration::from_secs(3));
}

#[tokio::test]
async fn test_detect_language() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/translate_a/single"))
        .and(query_param("sl", "auto"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(serde_json::json!([[["Hello", "Bonjour"]], null, "fr"])),
        )
        .mount(&mock_server)
        .await;

    let endpoint = format!("{}/translate_a/single", mock_server.uri());
    let backend = Arc::new(GoogleTranslator::new(endpoint, Duration::from_secs(5)).unwrap());
    let gate = TranslationGate::new(backend, 20, Duration::ZERO, 1_500, Duration::from_secs(5));

    assert_eq!(gate.detect_language("Bonjour").await.as_deref(), Some("fr"));
    assert_eq!(gate.detect_language("   ").await, None);
}
