mod harness;

use harness::config::ConfigBuilder;
use harness::mock_upstream::MockUpstream;
use harness::server::TestServer;

#[tokio::test]
async fn legacy_prompt_translates_to_single_user_message() {
    let mock = MockUpstream::start().await.unwrap();
    let config = ConfigBuilder::new(&mock.base_url()).build();
    let server = TestServer::start(config).await.unwrap();

    let resp = server
        .client()
        .post(server.url("/v1/completions"))
        .json(&serde_json::json!({
            "model": "m",
            "prompt": "hi",
            "stream": false
        }))
        .send()
        .await
        .unwrap();

    assert_eq!(resp.status(), 200);

    // The upstream saw exactly one user message, and fields the caller
    // did not supply were never serialized
    let captured = mock.last_request().unwrap();
    assert_eq!(captured["messages"].as_array().unwrap().len(), 1);
    assert_eq!(captured["messages"][0]["role"], "user");
    assert_eq!(captured["messages"][0]["content"], "hi");
    assert!(captured.get("max_completion_tokens").is_none());
    assert!(captured.get("temperature").is_none());
    assert!(captured["trace_id"].as_str().unwrap().starts_with("trace-"));

    // The response comes back in the legacy shape
    let json: serde_json::Value = resp.json().await.unwrap();
    assert_eq!(json["type"], "message");
    assert_eq!(json["role"], "assistant");
    assert_eq!(json["content"][0]["text"], "Hello from mock upstream");
    assert_eq!(json["stop_reason"], "end_turn");
    assert_eq!(json["usage"]["input_tokens"], 10);
}

#[tokio::test]
async fn chat_messages_round_trip_in_chat_shape() {
    let mock = MockUpstream::start().await.unwrap();
    let config = ConfigBuilder::new(&mock.base_url()).build();
    let server = TestServer::start(config).await.unwrap();

    let resp = server
        .client()
        .post(server.url("/v1/completions"))
        .json(&serde_json::json!({
            "model": "m",
            "messages": [
                {"role": "system", "content": "be brief"},
                {"role": "user", "content": "hi"}
            ]
        }))
        .send()
        .await
        .unwrap();

    assert_eq!(resp.status(), 200);

    let captured = mock.last_request().unwrap();
    assert_eq!(captured["messages"].as_array().unwrap().len(), 2);
    assert_eq!(captured["messages"][0]["role"], "system");
    assert_eq!(captured["messages"][1]["content"], "hi");

    let json: serde_json::Value = resp.json().await.unwrap();
    assert_eq!(json["object"], "chat.completion");
    assert_eq!(json["choices"][0]["message"]["content"], "Hello from mock upstream");
    assert_eq!(json["choices"][0]["finish_reason"], "stop");
    assert_eq!(json["usage"]["prompt_tokens"], 10);
}

#[tokio::test]
async fn supplied_sampling_fields_pass_through() {
    let mock = MockUpstream::start().await.unwrap();
    let config = ConfigBuilder::new(&mock.base_url()).build();
    let server = TestServer::start(config).await.unwrap();

    let resp = server
        .client()
        .post(server.url("/v1/completions"))
        .json(&serde_json::json!({
            "model": "m",
            "prompt": "hi",
            "max_tokens": 50,
            "temperature": 0.5,
            "top_p": 0.9,
            "stop_sequences": ["END"]
        }))
        .send()
        .await
        .unwrap();

    assert_eq!(resp.status(), 200);

    let captured = mock.last_request().unwrap();
    assert_eq!(captured["max_completion_tokens"], 50);
    assert_eq!(captured["temperature"], 0.5);
    assert_eq!(captured["top_p"], 0.9);
    assert_eq!(captured["stop"], serde_json::json!(["END"]));
}

#[tokio::test]
async fn block_content_is_flattened_for_the_upstream() {
    let mock = MockUpstream::start().await.unwrap();
    let config = ConfigBuilder::new(&mock.base_url()).build();
    let server = TestServer::start(config).await.unwrap();

    let resp = server
        .client()
        .post(server.url("/v1/completions"))
        .json(&serde_json::json!({
            "model": "m",
            "messages": [{
                "role": "user",
                "content": [
                    {"type": "text", "text": "first"},
                    {"type": "text", "text": "second"}
                ]
            }]
        }))
        .send()
        .await
        .unwrap();

    assert_eq!(resp.status(), 200);

    let captured = mock.last_request().unwrap();
    assert_eq!(captured["messages"][0]["content"], "first\nsecond");
}

#[tokio::test]
async fn custom_upstream_content_is_preserved() {
    let mock = MockUpstream::start_with_response("forty-two").await.unwrap();
    let config = ConfigBuilder::new(&mock.base_url()).build();
    let server = TestServer::start(config).await.unwrap();

    let resp = server
        .client()
        .post(server.url("/v1/completions"))
        .json(&serde_json::json!({"model": "m", "prompt": "hi"}))
        .send()
        .await
        .unwrap();

    let json: serde_json::Value = resp.json().await.unwrap();
    assert_eq!(json["content"][0]["text"], "forty-two");
    assert_eq!(mock.completion_count(), 1);
}
