use modelmix::{CompareRequest, MixConfig, ModelMix};

#[tokio::main]
async fn main() {
	let mix = ModelMix::new(MixConfig::from_env());

	let req = CompareRequest {
		prompt: "Count the R's in 'strawberry'".into(),
		models: vec!["claude-sonnet-4".into(), "gpt-4o".into()],
		max_tokens: Some(256),
	};

	let session = mix.compare(&req).await.unwrap();

	for result in &session.results {
		println!(
			"== {} ({}, {}ms) ==",
			result.model_name, result.provider, result.response_time
		);
		println!("{}", result.content);

		if let Some(usage) = &result.token_usage {
			println!(
				"tokens: {} prompt, {} completion, {} total",
				usage.prompt_tokens,
				usage.completion_tokens,
				usage.total_tokens
			);
		}
	}
}
