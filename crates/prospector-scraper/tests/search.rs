//! Integration tests for `OpenAiSearchClient` using wiremock HTTP mocks.

use prospector_scraper::{ClientSettings, OpenAiSearchClient};
use wiremock::matchers::{body_partial_json, header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn test_client(base_url: &str) -> OpenAiSearchClient {
    let settings = ClientSettings {
        timeout_secs: 5,
        max_retries: 0,
        backoff_base_ms: 0,
        ..ClientSettings::default()
    };
    OpenAiSearchClient::with_base_url("sk-test", "gpt-4o-mini", &settings, base_url)
        .expect("client construction should not fail")
}

fn reply(text: &str) -> serde_json::Value {
    serde_json::json!({
        "output": [
            { "type": "web_search_call", "id": "ws_1", "status": "completed" },
            { "type": "message", "content": [{ "type": "output_text", "text": text }] }
        ]
    })
}

fn query_body(query: &str) -> serde_json::Value {
    serde_json::json!({
        "input": format!(
            "Search query: {query}\nPlease provide up to 5 distinct business website URLs only."
        )
    })
}

#[tokio::test]
async fn search_uses_hosted_web_search_tool() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/responses"))
        .and(header("authorization", "Bearer sk-test"))
        .and(body_partial_json(serde_json::json!({
            "model": "gpt-4o-mini",
            "tools": [{ "type": "web_search_preview" }]
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(reply(
            "https://a.example\nhttps://b.example\nhttps://c.example\nhttps://d.example\nhttps://e.example\nhttps://f.example",
        )))
        .expect(1)
        .mount(&server)
        .await;

    let urls = test_client(&server.uri()).search("plumber Austin").await.unwrap();
    assert_eq!(urls.len(), 5);
    assert_eq!(urls[0], "https://a.example");
}

#[tokio::test]
async fn discover_dedupes_and_skips_failed_queries() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/responses"))
        .and(body_partial_json(query_body("q1")))
        .respond_with(ResponseTemplate::new(200).set_body_json(reply(
            "https://a.example\nhttps://a.example\nhttps://b.example",
        )))
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/responses"))
        .and(body_partial_json(query_body("q2")))
        .respond_with(ResponseTemplate::new(500))
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/responses"))
        .and(body_partial_json(query_body("q3")))
        .respond_with(ResponseTemplate::new(200).set_body_json(reply(
            "Results:\nhttps://b.example\nhttps://c.example",
        )))
        .mount(&server)
        .await;

    let queries = vec!["q1".to_owned(), "q2".to_owned(), "q3".to_owned()];
    let urls = test_client(&server.uri()).discover(&queries, 10).await;
    assert_eq!(
        urls,
        vec!["https://a.example", "https://b.example", "https://c.example"]
    );
}

#[tokio::test]
async fn discover_stops_once_limit_is_reached() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/responses"))
        .respond_with(ResponseTemplate::new(200).set_body_json(reply(
            "https://a.example\nhttps://b.example\nhttps://c.example",
        )))
        .expect(1)
        .mount(&server)
        .await;

    let queries = vec!["q1".to_owned(), "q2".to_owned()];
    let urls = test_client(&server.uri()).discover(&queries, 2).await;
    assert_eq!(urls, vec!["https://a.example", "https://b.example"]);
}
