mod harness;

use harness::config::ConfigBuilder;
use harness::mock_upstream::MockUpstream;
use harness::server::TestServer;

#[tokio::test]
async fn health_reports_full_service_before_any_traffic() {
    let mock = MockUpstream::start().await.unwrap();
    let config = ConfigBuilder::new(&mock.base_url()).build();
    let server = TestServer::start(config).await.unwrap();

    let resp = server.client().get(server.url("/health")).send().await.unwrap();
    assert_eq!(resp.status(), 200);

    let json: serde_json::Value = resp.json().await.unwrap();
    assert_eq!(json["status"], "ok");
    assert_eq!(json["service_level"], "full");
    assert!(json["features"]
        .as_array()
        .unwrap()
        .contains(&serde_json::json!("streaming")));
    // The breaker registry is lazy; no traffic means no dependencies yet
    assert_eq!(json["dependencies"].as_array().unwrap().len(), 0);
}

#[tokio::test]
async fn health_lists_the_upstream_after_traffic() {
    let mock = MockUpstream::start().await.unwrap();
    let config = ConfigBuilder::new(&mock.base_url()).build();
    let server = TestServer::start(config).await.unwrap();

    let resp = server
        .client()
        .post(server.url("/v1/completions"))
        .json(&serde_json::json!({"model": "m", "prompt": "hi"}))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 200);

    let resp = server.client().get(server.url("/health")).send().await.unwrap();
    let json: serde_json::Value = resp.json().await.unwrap();

    assert_eq!(json["dependencies"][0]["name"], "azure-responses");
    assert_eq!(json["dependencies"][0]["state"], "closed");
    assert!(json["dependencies"][0].get("retry_after").is_none());
}
