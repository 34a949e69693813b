//! Discord webhook sink tests against a mock server

use std::time::Duration;

use wiremock::matchers::{body_partial_json, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

use steamcast::feed::Article;
use steamcast::notifications::format::{build_message, MessageContext, TranslatedArticle};
use steamcast::notifications::{
    deliver_with_fallback, DeliveryError, DeliveryMessage, DeliveryPath, DeliverySink,
    DiscordWebhookSink,
};
use steamcast::utils::retry::RetryConfig;

const HOOK_PATH: &str = "/api/webhooks/1/token";

fn sink_for(server: &MockServer) -> DiscordWebhookSink {
    DiscordWebhookSink::new(format!("{}{HOOK_PATH}", server.uri()), Duration::from_secs(5))
        .unwrap()
        .with_retry(RetryConfig::with_delays(2, 1, 5))
}

fn message() -> DeliveryMessage {
    let article = Article {
        id: "42".to_string(),
        title: "Major update released".to_string(),
        body: "New maps and fixes.".to_string(),
        published_at: 1_700_000_000,
        author: Some("Valve".to_string()),
        url: "https://store.steampowered.com/news/42".to_string(),
        image_url: Some("https://clan.akamai.steamstatic.com/images/10/hero.jpg".to_string()),
        feed_label: None,
    };
    let translated = TranslatedArticle {
        title: "Mise à jour majeure".to_string(),
        body: "Nouvelles cartes et correctifs.".to_string(),
        truncated: false,
    };
    let ctx = MessageContext {
        product_name: "Team Fortress 2",
        header_image: Some("https://cdn.akamai.steamstatic.com/steam/apps/440/header.jpg"),
        lang: "fr",
    };
    build_message(&article, &translated, &ctx)
}

#[tokio::test]
async fn test_message_posted_as_embed() {
    let mock_server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path(HOOK_PATH))
        .and(body_partial_json(serde_json::json!({
            "embeds": [{
                "title": "Mise à jour majeure",
                "description": "Nouvelles cartes et correctifs.",
                "url": "https://store.steampowered.com/news/42",
                "color": 0x1b2838,
                "timestamp": "2023-11-14T22:13:20+00:00",
                "author": { "name": "🎮 Team Fortress 2" },
                "image": { "url": "https://clan.akamai.steamstatic.com/images/10/hero.jpg" },
                "thumbnail": { "url": "https://cdn.akamai.steamstatic.com/steam/apps/440/header.jpg" }
            }]
        })))
        .respond_with(ResponseTemplate::new(204))
        .expect(1)
        .mount(&mock_server)
        .await;

    let sink = sink_for(&mock_server);
    sink.send_message(&message()).await.unwrap();
}

#[tokio::test]
async fn test_rate_limited_post_is_retried() {
    let mock_server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path(HOOK_PATH))
        .respond_with(ResponseTemplate::new(429).set_body_string("slow down"))
        .up_to_n_times(1)
        .expect(1)
        .mount(&mock_server)
        .await;

    Mock::given(method("POST"))
        .and(path(HOOK_PATH))
        .respond_with(ResponseTemplate::new(204))
        .expect(1)
        .mount(&mock_server)
        .await;

    let sink = sink_for(&mock_server);
    sink.send_text("hello").await.unwrap();
}

#[tokio::test]
async fn test_bad_request_is_not_retried() {
    let mock_server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path(HOOK_PATH))
        .respond_with(ResponseTemplate::new(400).set_body_string("Invalid Form Body"))
        .expect(1)
        .mount(&mock_server)
        .await;

    let sink = sink_for(&mock_server);
    let err = sink.send_text("hello").await.unwrap_err();
    match err {
        DeliveryError::Status { status, body } => {
            assert_eq!(status, 400);
            assert_eq!(body, "Invalid Form Body");
        }
        other => panic!("unexpected error: {other:?}"),
    }
}

#[tokio::test]
async fn test_rejected_embed_falls_back_to_content() {
    let mock_server = MockServer::start().await;
    let message = message();

    Mock::given(method("POST"))
        .and(path(HOOK_PATH))
        .and(body_partial_json(serde_json::json!({
            "embeds": [{ "title": "Mise à jour majeure" }]
        })))
        .respond_with(ResponseTemplate::new(400))
        .expect(1)
        .mount(&mock_server)
        .await;

    Mock::given(method("POST"))
        .and(path(HOOK_PATH))
        .and(body_partial_json(serde_json::json!({ "content": message.plain_text })))
        .respond_with(ResponseTemplate::new(204))
        .expect(1)
        .mount(&mock_server)
        .await;

    let sink = sink_for(&mock_server);
    let delivered = deliver_with_fallback(&sink, &message).await.unwrap();
    assert_eq!(delivered, DeliveryPath::PlainText);
}

#[tokio::test]
async fn test_ready_checks_webhook() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path(HOOK_PATH))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(serde_json::json!({ "id": "1", "name": "steamcast" })),
        )
        .expect(1)
        .mount(&mock_server)
        .await;

    let sink = sink_for(&mock_server);
    assert!(sink.ready().await.is_ok());
}

#[tokio::test]
async fn test_unknown_webhook_is_not_ready() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path(HOOK_PATH))
        .respond_with(ResponseTemplate::new(401))
        .mount(&mock_server)
        .await;

    let sink = sink_for(&mock_server);
    assert!(matches!(
        sink.ready().await,
        Err(DeliveryError::Status { status: 401, .. })
    ));
}
