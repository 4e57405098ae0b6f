//! Integration tests for the dispatcher: validation, routing, deadlines

use async_trait::async_trait;
use modelgate_core::config::GatewayConfig;
use modelgate_core::dispatch::{Dispatcher, TimeoutPolicy};
use modelgate_core::http::HttpClient;
use modelgate_core::protocol::{ChatRequest, ChatResponse, ProviderId, RawChatRequest};
use modelgate_core::providers::{
    AdapterConfig, OpenAIAdapter, ProviderAdapter, ProviderRegistry, ProviderResult, Severity,
};
use proptest::prelude::*;
use serde_json::json;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;
use test_case::test_case;
use wiremock::matchers::{body_partial_json, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

#[derive(Clone, Copy)]
enum Behavior {
    Echo,
    Hang,
    Panic,
}

/// Adapter that counts invocations instead of calling a backend
struct CountingAdapter {
    provider: ProviderId,
    behavior: Behavior,
    calls: Arc<AtomicUsize>,
}

#[async_trait]
impl ProviderAdapter for CountingAdapter {
    fn provider(&self) -> ProviderId {
        self.provider
    }

    async fn invoke(
        &self,
        request: &ChatRequest,
        config: &AdapterConfig,
        _deadline: Duration,
    ) -> ProviderResult<ChatResponse> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        match self.behavior {
            Behavior::Echo => Ok(ChatResponse {
                provider: self.provider,
                model: request.effective_model(&config.default_model).to_string(),
                response: request.prompt.clone(),
                prompt_tokens: None,
                completion_tokens: None,
            }),
            Behavior::Hang => {
                tokio::time::sleep(Duration::from_secs(60)).await;
                unreachable!("dispatcher should have given up")
            }
            Behavior::Panic => panic!("adapter bug"),
        }
    }
}

/// Registry with a counting adapter for every provider
fn counting_dispatcher(behavior: Behavior, timeouts: TimeoutPolicy) -> (Dispatcher, Arc<AtomicUsize>) {
    let calls = Arc::new(AtomicUsize::new(0));
    let registry = ProviderId::ALL
        .into_iter()
        .fold(ProviderRegistry::builder(), |builder, provider| {
            builder.register(
                Arc::new(CountingAdapter {
                    provider,
                    behavior,
                    calls: calls.clone(),
                }),
                AdapterConfig::new("http://127.0.0.1:1", format!("{provider}-default")),
            )
        })
        .build();

    (Dispatcher::new(Arc::new(registry), timeouts), calls)
}

/// Dispatcher whose OpenAI entry points at a mock server
fn openai_dispatcher(server: &MockServer, timeouts: TimeoutPolicy) -> Dispatcher {
    let mut config = GatewayConfig::default();
    config.providers.openai.api_key = Some("sk-test-0123456789abcdef".into());
    config.providers.openai.base_url = Some(server.uri());

    let registry = ProviderRegistry::from_config(&config, HttpClient::new().unwrap());
    Dispatcher::new(Arc::new(registry), timeouts)
}

#[tokio::test]
async fn test_unsupported_provider_lists_all_four() {
    let (dispatcher, calls) = counting_dispatcher(Behavior::Echo, TimeoutPolicy::default());

    let err = dispatcher
        .dispatch(RawChatRequest::new("cohere", "hello"))
        .await
        .unwrap_err();

    assert_eq!(err.severity, Severity::ClientError);
    assert_eq!(err.http_status(), 400);
    assert!(err
        .message
        .contains("openai, anthropic, gemini, ollama"));
    assert!(err.message.contains("cohere"));
    assert_eq!(calls.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn test_missing_prompt_names_field() {
    let (dispatcher, calls) = counting_dispatcher(Behavior::Echo, TimeoutPolicy::default());

    let err = dispatcher
        .dispatch_json(json!({"provider": "openai"}))
        .await
        .unwrap_err();

    assert_eq!(err.severity, Severity::ClientError);
    assert!(err.message.contains("prompt"));
    assert_eq!(calls.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn test_non_object_body() {
    let (dispatcher, _) = counting_dispatcher(Behavior::Echo, TimeoutPolicy::default());

    let err = dispatcher.dispatch_json(json!(["openai"])).await.unwrap_err();
    assert_eq!(err.severity, Severity::ClientError);
    assert!(err.message.contains("body"));
}

#[test_case("openai" ; "lowercase")]
#[test_case("OpenAI" ; "mixed case")]
#[test_case(" ollama " ; "padded")]
#[tokio::test]
async fn test_provider_names_are_normalized(provider: &str) {
    let (dispatcher, calls) = counting_dispatcher(Behavior::Echo, TimeoutPolicy::default());

    let response = dispatcher
        .dispatch(RawChatRequest::new(provider, "hello"))
        .await
        .unwrap();

    assert_eq!(response.provider.as_str(), provider.trim().to_lowercase());
    assert_eq!(calls.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn test_adapter_past_deadline_is_aborted() {
    let timeouts = TimeoutPolicy {
        cloud: Duration::from_millis(100),
        local: Duration::from_millis(400),
    };
    let (dispatcher, calls) = counting_dispatcher(Behavior::Hang, timeouts);

    let started = std::time::Instant::now();
    let err = dispatcher
        .dispatch(RawChatRequest::new("anthropic", "hello"))
        .await
        .unwrap_err();

    assert!(started.elapsed() < Duration::from_secs(5));
    assert_eq!(err.severity, Severity::UpstreamError);
    assert_eq!(err.message, "Anthropic request timed out after 100ms");

    // The local daemon gets the longer deadline
    let err = dispatcher
        .dispatch(RawChatRequest::new("ollama", "hello"))
        .await
        .unwrap_err();
    assert_eq!(err.message, "Ollama request timed out after 400ms");
    assert_eq!(calls.load(Ordering::SeqCst), 2);
}

#[tokio::test]
async fn test_adapter_panic_is_upstream_error() {
    let (dispatcher, _) = counting_dispatcher(Behavior::Panic, TimeoutPolicy::default());

    let err = dispatcher
        .dispatch(RawChatRequest::new("gemini", "hello"))
        .await
        .unwrap_err();

    assert_eq!(err.severity, Severity::UpstreamError);
    assert_eq!(err.http_status(), 502);
    assert!(err.message.starts_with("Gemini"));
    assert!(!err.message.contains("adapter bug"));
}

#[tokio::test]
async fn test_cloud_timeout_end_to_end() {
    let mock_server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/chat/completions"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_delay(Duration::from_secs(3))
                .set_body_json(json!({"choices": [{"message": {"content": "late"}}]})),
        )
        .mount(&mock_server)
        .await;

    let timeouts = TimeoutPolicy {
        cloud: Duration::from_millis(300),
        local: Duration::from_secs(5),
    };
    let dispatcher = openai_dispatcher(&mock_server, timeouts);

    let err = dispatcher
        .dispatch(RawChatRequest::new("openai", "hello"))
        .await
        .unwrap_err();

    assert_eq!(err.http_status(), 502);
    assert!(err.message.contains("OpenAI"));
    assert!(err.message.contains("timed out"));
}

#[test_case(Some("gpt-4o"), "gpt-4o" ; "explicit model is echoed")]
#[test_case(None, "gpt-4o-mini" ; "default model when absent")]
#[test_case(Some("  "), "gpt-4o-mini" ; "blank model means default")]
#[tokio::test]
async fn test_model_echo(requested: Option<&str>, expected: &str) {
    let mock_server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/chat/completions"))
        .and(body_partial_json(json!({"model": expected})))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "choices": [{"message": {"content": "hi"}}],
            "usage": {"prompt_tokens": 1, "completion_tokens": 1}
        })))
        .expect(1)
        .mount(&mock_server)
        .await;

    let dispatcher = openai_dispatcher(&mock_server, TimeoutPolicy::default());
    let mut raw = RawChatRequest::new("openai", "hello");
    if let Some(model) = requested {
        raw = raw.with_model(model);
    }

    let response = dispatcher.dispatch(raw).await.unwrap();
    assert_eq!(response.model, expected);
}

#[tokio::test]
async fn test_identical_requests_classify_identically() {
    let mock_server = MockServer::start().await;

    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(503).set_body_json(json!({
            "error": {"message": "The server is overloaded"}
        })))
        .mount(&mock_server)
        .await;

    let dispatcher = openai_dispatcher(&mock_server, TimeoutPolicy::default());
    let first = dispatcher
        .dispatch(RawChatRequest::new("openai", "hello"))
        .await
        .unwrap_err();
    let second = dispatcher
        .dispatch(RawChatRequest::new("openai", "hello"))
        .await
        .unwrap_err();

    assert_eq!(first, second);
    assert_eq!(first.severity, Severity::UpstreamError);
}

fn runtime() -> tokio::runtime::Runtime {
    tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
        .unwrap()
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(64))]

    #[test]
    fn prop_unknown_provider_never_reaches_adapter(
        provider in "[a-zA-Z0-9_ -]{0,16}".prop_filter("known provider", |s| s.parse::<ProviderId>().is_err())
    ) {
        let (dispatcher, calls) = counting_dispatcher(Behavior::Echo, TimeoutPolicy::default());
        let err = runtime()
            .block_on(dispatcher.dispatch(RawChatRequest::new(provider, "hello")))
            .unwrap_err();

        prop_assert_eq!(err.severity, Severity::ClientError);
        prop_assert_eq!(calls.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn prop_prompt_length_bounds(len in prop_oneof![Just(0usize), 10_001usize..12_000, 1usize..10_001]) {
        let (dispatcher, calls) = counting_dispatcher(Behavior::Echo, TimeoutPolicy::default());
        let prompt = "é".repeat(len);
        let result = runtime().block_on(dispatcher.dispatch(RawChatRequest::new("ollama", prompt)));

        if (1..=10_000).contains(&len) {
            prop_assert!(result.is_ok());
            prop_assert_eq!(calls.load(Ordering::SeqCst), 1);
        } else {
            let err = result.unwrap_err();
            prop_assert_eq!(err.severity, Severity::ClientError);
            prop_assert!(err.message.contains("prompt"));
            prop_assert_eq!(calls.load(Ordering::SeqCst), 0);
        }
    }
}
