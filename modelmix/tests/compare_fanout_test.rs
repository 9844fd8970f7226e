//! Fan-out behavior: ordering, per-model failure isolation, concurrent
//! dispatch and the per-call timeout, all against mock provider APIs.

use std::time::{Duration, Instant};

use modelmix::anthropic::Anthropic;
use modelmix::cohere::Cohere;
use modelmix::google::Google;
use modelmix::mistral::Mistral;
use modelmix::openai::OpenAi;
use modelmix::{
	Adapters, CompareRequest, MixError, ModelMix, ResultStatus,
};
use serde_json::json;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn request(models: &[&str]) -> CompareRequest {
	CompareRequest {
		prompt: "Count the R's in 'strawberry'".into(),
		models: models.iter().map(|m| m.to_string()).collect(),
		max_tokens: None,
	}
}

fn anthropic_body(text: &str) -> serde_json::Value {
	json!({
		"content": [{ "type": "text", "text": text }],
		"usage": { "input_tokens": 5, "output_tokens": 3 },
	})
}

fn openai_body(text: &str) -> serde_json::Value {
	json!({
		"choices": [{
			"message": { "role": "assistant", "content": text },
		}],
		"usage": {
			"prompt_tokens": 5,
			"completion_tokens": 3,
			"total_tokens": 8,
		},
	})
}

fn google_body(text: &str) -> serde_json::Value {
	json!({
		"candidates": [{
			"content": { "parts": [{ "text": text }], "role": "model" },
		}],
	})
}

async fn mock_provider(
	route: &str,
	template: ResponseTemplate,
) -> MockServer {
	let server = MockServer::start().await;

	Mock::given(method("POST"))
		.and(path(route))
		.respond_with(template)
		.mount(&server)
		.await;

	server
}

#[tokio::test]
async fn results_keep_request_order_and_isolate_failures() {
	let anthropic = mock_provider(
		"/v1/messages",
		ResponseTemplate::new(200).set_body_json(anthropic_body("three")),
	)
	.await;

	// OpenAI is down, its sibling must be unaffected.
	let openai = mock_provider(
		"/v1/chat/completions",
		ResponseTemplate::new(500).set_body_string("upstream exploded"),
	)
	.await;

	let mix = ModelMix::from_adapters(Adapters {
		anthropic: Some(
			Anthropic::new("k".into()).with_base_url(anthropic.uri()),
		),
		open_ai: Some(OpenAi::new("k".into()).with_base_url(openai.uri())),
		..Default::default()
	});

	let session = mix
		.compare(&request(&["claude-sonnet-4", "gpt-4o"]))
		.await
		.unwrap();

	assert_eq!(session.results.len(), 2);
	assert_eq!(session.results[0].model_id, "claude-sonnet-4");
	assert_eq!(session.results[1].model_id, "gpt-4o");

	let ok = &session.results[0];
	assert_eq!(ok.status, ResultStatus::Complete);
	assert_eq!(ok.content, "three");
	assert_eq!(ok.token_usage.unwrap().total_tokens, 8);

	let failed = &session.results[1];
	assert_eq!(failed.status, ResultStatus::Error);
	assert!(failed.content.starts_with("Error: "));
	assert!(failed.content.contains("upstream exploded"));
	assert_eq!(failed.response_time, 0);
	assert!(failed.token_usage.is_none());
}

#[tokio::test]
async fn calls_are_dispatched_concurrently() {
	let delay = Duration::from_millis(250);

	let anthropic = mock_provider(
		"/v1/messages",
		ResponseTemplate::new(200)
			.set_body_json(anthropic_body("a"))
			.set_delay(delay),
	)
	.await;
	let openai = mock_provider(
		"/v1/chat/completions",
		ResponseTemplate::new(200)
			.set_body_json(openai_body("b"))
			.set_delay(delay),
	)
	.await;
	let google = mock_provider(
		"/v1beta/models/gemini-2.0-flash:generateContent",
		ResponseTemplate::new(200)
			.set_body_json(google_body("c"))
			.set_delay(delay),
	)
	.await;
	let mistral = mock_provider(
		"/v1/chat/completions",
		ResponseTemplate::new(200)
			.set_body_json(openai_body("d"))
			.set_delay(delay),
	)
	.await;

	let mix = ModelMix::from_adapters(Adapters {
		anthropic: Some(
			Anthropic::new("k".into()).with_base_url(anthropic.uri()),
		),
		open_ai: Some(OpenAi::new("k".into()).with_base_url(openai.uri())),
		google: Some(Google::new("k".into()).with_base_url(google.uri())),
		mistral: Some(Mistral::new("k".into()).with_base_url(mistral.uri())),
		..Default::default()
	});

	let start = Instant::now();
	let session = mix
		.compare(&request(&[
			"claude-sonnet-4",
			"gpt-4o",
			"gemini-2.0-flash",
			"mistral-large",
		]))
		.await
		.unwrap();
	let elapsed = start.elapsed();

	assert_eq!(session.results.len(), 4);
	for result in &session.results {
		assert_eq!(result.status, ResultStatus::Complete);
	}

	// Four serialized 250ms calls would take a second; concurrent
	// dispatch is bounded by the slowest call.
	assert!(
		elapsed < Duration::from_millis(700),
		"batch took {elapsed:?}, calls were serialized"
	);
}

#[tokio::test]
async fn validation_errors_dispatch_no_calls() {
	let anthropic = MockServer::start().await;

	Mock::given(method("POST"))
		.and(path("/v1/messages"))
		.respond_with(
			ResponseTemplate::new(200).set_body_json(anthropic_body("x")),
		)
		.expect(0)
		.mount(&anthropic)
		.await;

	let mix = ModelMix::from_adapters(Adapters {
		anthropic: Some(
			Anthropic::new("k".into()).with_base_url(anthropic.uri()),
		),
		..Default::default()
	});

	let err = mix
		.compare(&request(&[
			"claude-opus-4",
			"claude-sonnet-4",
			"claude-haiku-3.5",
			"gpt-4o",
			"gpt-4o-mini",
		]))
		.await
		.unwrap_err();
	assert!(matches!(err, MixError::TooManyModels { max: 4 }));

	let err = mix
		.compare(&request(&["claude-sonnet-4", "not-a-model"]))
		.await
		.unwrap_err();
	assert_eq!(err.to_string(), "Invalid model(s): not-a-model");

	// MockServer verifies expect(0) on drop.
}

#[tokio::test]
async fn unresponsive_provider_times_out_without_stalling_siblings() {
	let anthropic = mock_provider(
		"/v1/messages",
		ResponseTemplate::new(200)
			.set_body_json(anthropic_body("slow"))
			.set_delay(Duration::from_secs(5)),
	)
	.await;
	let openai = mock_provider(
		"/v1/chat/completions",
		ResponseTemplate::new(200).set_body_json(openai_body("fast")),
	)
	.await;

	let mix = ModelMix::from_adapters(Adapters {
		anthropic: Some(
			Anthropic::new("k".into()).with_base_url(anthropic.uri()),
		),
		open_ai: Some(OpenAi::new("k".into()).with_base_url(openai.uri())),
		..Default::default()
	})
	.with_call_timeout(Duration::from_millis(200));

	let start = Instant::now();
	let session = mix
		.compare(&request(&["claude-sonnet-4", "gpt-4o"]))
		.await
		.unwrap();

	assert!(start.elapsed() < Duration::from_secs(2));

	let timed_out = &session.results[0];
	assert_eq!(timed_out.status, ResultStatus::Error);
	assert!(timed_out.content.contains("timed out"));

	assert_eq!(session.results[1].status, ResultStatus::Complete);
	assert_eq!(session.results[1].content, "fast");
}

#[tokio::test]
async fn cohere_models_join_the_fanout() {
	let cohere = mock_provider(
		"/v2/chat",
		ResponseTemplate::new(200).set_body_json(json!({
			"message": {
				"role": "assistant",
				"content": [{ "type": "text", "text": "aye" }],
			},
			"usage": {
				"billed_units": { "input_tokens": 4.0, "output_tokens": 1.0 },
			},
		})),
	)
	.await;

	let mix = ModelMix::from_adapters(Adapters {
		cohere: Some(Cohere::new("k".into()).with_base_url(cohere.uri())),
		..Default::default()
	});

	let session =
		mix.compare(&request(&["command-r-plus"])).await.unwrap();

	assert_eq!(session.results[0].content, "aye");
	assert_eq!(session.results[0].token_usage.unwrap().total_tokens, 5);
}
