pub mod error;

pub use error::MixError;

use std::env;
use std::time::{Duration, Instant};

use chrono::{DateTime, Utc};
use futures::future;
use serde::{Deserialize, Serialize};
use tracing::warn;
use uuid::Uuid;

use crate::{
	anthropic::Anthropic,
	cohere::Cohere,
	google::Google,
	mistral::Mistral,
	openai::OpenAi,
	registry::{self, ModelDescriptor, Provider},
};

/// Default cap on models per comparison. A product constraint (the UI
/// renders at most four columns), kept configurable via
/// [`ModelMix::with_max_models`].
pub const DEFAULT_MAX_MODELS: usize = 4;

/// Ceiling for a single provider call. A call that exceeds it becomes a
/// per-model error result instead of stalling the whole batch.
pub const DEFAULT_CALL_TIMEOUT: Duration = Duration::from_secs(30);

/// One comparison request: a prompt fanned out to up to
/// [`DEFAULT_MAX_MODELS`] models.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CompareRequest {
	#[serde(default)]
	pub prompt: String,
	#[serde(default)]
	pub models: Vec<String>,
	#[serde(default)]
	pub max_tokens: Option<u32>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TokenUsage {
	pub prompt_tokens: u32,
	pub completion_tokens: u32,
	pub total_tokens: u32,
}

impl TokenUsage {
	/// For vendors that only report prompt and completion counts, the
	/// total is their sum.
	pub fn from_counts(prompt_tokens: u32, completion_tokens: u32) -> Self {
		Self {
			prompt_tokens,
			completion_tokens,
			total_tokens: prompt_tokens + completion_tokens,
		}
	}
}

/// The normalized output of a single provider call.
#[derive(Debug, Clone)]
pub struct Completion {
	pub content: String,
	/// Only present when the vendor reports token counts.
	pub usage: Option<TokenUsage>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ResultStatus {
	Complete,
	Error,
}

/// The outcome of one model call within a comparison, success or
/// failure. Error results still carry a human-readable `content` string
/// so rendering never has to branch on missing fields.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ModelResult {
	pub model_id: String,
	pub model_name: String,
	pub provider: Provider,
	pub content: String,
	/// Wall-clock milliseconds from dispatch to resolution, `0` when the
	/// call never completed.
	pub response_time: u64,
	pub status: ResultStatus,
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub token_usage: Option<TokenUsage>,
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub error_message: Option<String>,
}

impl ModelResult {
	fn complete(
		desc: &ModelDescriptor,
		completion: Completion,
		elapsed: Duration,
	) -> Self {
		Self {
			model_id: desc.id.into(),
			model_name: desc.name.into(),
			provider: desc.provider,
			content: completion.content,
			response_time: elapsed.as_millis() as u64,
			status: ResultStatus::Complete,
			token_usage: completion.usage,
			error_message: None,
		}
	}

	fn error(desc: &ModelDescriptor, error: MixError) -> Self {
		Self {
			model_id: desc.id.into(),
			model_name: desc.name.into(),
			provider: desc.provider,
			content: format!("Error: {error}"),
			response_time: 0,
			status: ResultStatus::Error,
			token_usage: None,
			error_message: Some(error.to_string()),
		}
	}
}

/// The aggregate of one fan-out: every requested model produces exactly
/// one entry in `results`, in request order.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ComparisonSession {
	pub id: Uuid,
	pub prompt: String,
	pub timestamp: DateTime<Utc>,
	pub results: Vec<ModelResult>,
}

/// One credential per provider. A missing credential means the provider
/// is unavailable: its models are flagged in `/models` and selecting one
/// yields a per-model error result.
#[derive(Debug, Clone, Default)]
#[non_exhaustive]
pub struct MixConfig {
	pub anthropic_api_key: Option<String>,
	pub openai_api_key: Option<String>,
	pub google_api_key: Option<String>,
	pub mistral_api_key: Option<String>,
	pub cohere_api_key: Option<String>,
}

impl MixConfig {
	pub fn new() -> Self {
		Self::default()
	}

	/// Reads the per-provider key variables, treating empty values as
	/// absent.
	pub fn from_env() -> Self {
		fn var(name: &str) -> Option<String> {
			env::var(name).ok().filter(|v| !v.is_empty())
		}

		Self::new()
			.anthropic(var("ANTHROPIC_API_KEY"))
			.openai(var("OPENAI_API_KEY"))
			.google(var("GOOGLE_AI_API_KEY"))
			.mistral(var("MISTRAL_API_KEY"))
			.cohere(var("COHERE_API_KEY"))
	}

	pub fn anthropic(mut self, api_key: impl Into<Option<String>>) -> Self {
		self.anthropic_api_key = api_key.into();
		self
	}

	pub fn openai(mut self, api_key: impl Into<Option<String>>) -> Self {
		self.openai_api_key = api_key.into();
		self
	}

	pub fn google(mut self, api_key: impl Into<Option<String>>) -> Self {
		self.google_api_key = api_key.into();
		self
	}

	pub fn mistral(mut self, api_key: impl Into<Option<String>>) -> Self {
		self.mistral_api_key = api_key.into();
		self
	}

	pub fn cohere(mut self, api_key: impl Into<Option<String>>) -> Self {
		self.cohere_api_key = api_key.into();
		self
	}
}

/// One adapter per configured provider. Also constructible directly for
/// tests or custom endpoints via [`ModelMix::from_adapters`].
#[derive(Debug, Clone, Default)]
pub struct Adapters {
	pub anthropic: Option<Anthropic>,
	pub open_ai: Option<OpenAi>,
	pub google: Option<Google>,
	pub mistral: Option<Mistral>,
	pub cohere: Option<Cohere>,
}

#[derive(Debug, Clone)]
pub struct ModelMix {
	adapters: Adapters,
	max_models: usize,
	call_timeout: Duration,
}

impl ModelMix {
	pub fn new(config: MixConfig) -> Self {
		Self::from_adapters(Adapters {
			anthropic: config.anthropic_api_key.map(Anthropic::new),
			open_ai: config.openai_api_key.map(OpenAi::new),
			google: config.google_api_key.map(Google::new),
			mistral: config.mistral_api_key.map(Mistral::new),
			cohere: config.cohere_api_key.map(Cohere::new),
		})
	}

	pub fn from_adapters(adapters: Adapters) -> Self {
		Self {
			adapters,
			max_models: DEFAULT_MAX_MODELS,
			call_timeout: DEFAULT_CALL_TIMEOUT,
		}
	}

	pub fn with_max_models(mut self, max_models: usize) -> Self {
		self.max_models = max_models;
		self
	}

	pub fn with_call_timeout(mut self, call_timeout: Duration) -> Self {
		self.call_timeout = call_timeout;
		self
	}

	/// Whether a credential is configured for the provider.
	pub fn provider_available(&self, provider: Provider) -> bool {
		match provider {
			Provider::Anthropic => self.adapters.anthropic.is_some(),
			Provider::OpenAi => self.adapters.open_ai.is_some(),
			Provider::Google => self.adapters.google.is_some(),
			Provider::Mistral => self.adapters.mistral.is_some(),
			Provider::Cohere => self.adapters.cohere.is_some(),
		}
	}

	/// Fans the prompt out to every requested model concurrently and
	/// collects one result per model, in request order.
	///
	/// Only request validation can fail here. Once validation passes a
	/// session is always produced; provider failures and timeouts become
	/// per-model error results and never abort sibling calls.
	pub async fn compare(
		&self,
		req: &CompareRequest,
	) -> Result<ComparisonSession, MixError> {
		let descriptors = self.validate(req)?;

		let calls = descriptors.into_iter().map(|desc| {
			// Default to the model's output limit, clamp anything above it.
			let max_tokens = req
				.max_tokens
				.unwrap_or(desc.max_output_tokens)
				.min(desc.max_output_tokens);

			self.call_model(desc, &req.prompt, max_tokens)
		});

		let results = future::join_all(calls).await;

		Ok(ComparisonSession {
			id: Uuid::new_v4(),
			prompt: req.prompt.clone(),
			timestamp: Utc::now(),
			results,
		})
	}

	fn validate(
		&self,
		req: &CompareRequest,
	) -> Result<Vec<&'static ModelDescriptor>, MixError> {
		if req.prompt.trim().is_empty() {
			return Err(MixError::EmptyPrompt);
		}

		if req.models.is_empty() {
			return Err(MixError::NoModels);
		}

		if req.models.len() > self.max_models {
			return Err(MixError::TooManyModels {
				max: self.max_models,
			});
		}

		let mut descriptors = Vec::with_capacity(req.models.len());
		let mut unknown = Vec::new();

		for id in &req.models {
			match registry::lookup(id) {
				Some(desc) => descriptors.push(desc),
				None => unknown.push(id.clone()),
			}
		}

		if !unknown.is_empty() {
			return Err(MixError::UnknownModels(unknown));
		}

		Ok(descriptors)
	}

	async fn call_model(
		&self,
		desc: &'static ModelDescriptor,
		prompt: &str,
		max_tokens: u32,
	) -> ModelResult {
		let start = Instant::now();

		let outcome = tokio::time::timeout(
			self.call_timeout,
			self.dispatch(desc, prompt, max_tokens),
		)
		.await
		.unwrap_or(Err(MixError::Timeout(self.call_timeout)));

		match outcome {
			Ok(completion) => {
				ModelResult::complete(desc, completion, start.elapsed())
			}
			Err(e) => {
				warn!("model {} failed: {e}", desc.id);
				ModelResult::error(desc, e)
			}
		}
	}

	async fn dispatch(
		&self,
		desc: &ModelDescriptor,
		prompt: &str,
		max_tokens: u32,
	) -> Result<Completion, MixError> {
		match desc.provider {
			Provider::Anthropic => {
				let llm = self.adapters.anthropic.as_ref().ok_or(
					MixError::MissingCredential(Provider::Anthropic),
				)?;
				llm.complete(desc.vendor_model, prompt, max_tokens)
					.await
					.map_err(Into::into)
			}
			Provider::OpenAi => {
				let llm = self
					.adapters
					.open_ai
					.as_ref()
					.ok_or(MixError::MissingCredential(Provider::OpenAi))?;
				llm.complete(desc.vendor_model, prompt, max_tokens)
					.await
					.map_err(Into::into)
			}
			Provider::Google => {
				let llm = self
					.adapters
					.google
					.as_ref()
					.ok_or(MixError::MissingCredential(Provider::Google))?;
				llm.complete(desc.vendor_model, prompt, max_tokens)
					.await
					.map_err(Into::into)
			}
			Provider::Mistral => {
				let llm = self
					.adapters
					.mistral
					.as_ref()
					.ok_or(MixError::MissingCredential(Provider::Mistral))?;
				llm.complete(desc.vendor_model, prompt, max_tokens)
					.await
					.map_err(Into::into)
			}
			Provider::Cohere => {
				let llm = self
					.adapters
					.cohere
					.as_ref()
					.ok_or(MixError::MissingCredential(Provider::Cohere))?;
				llm.complete(desc.vendor_model, prompt, max_tokens)
					.await
					.map_err(Into::into)
			}
		}
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	fn unconfigured() -> ModelMix {
		ModelMix::new(MixConfig::new())
	}

	fn req(prompt: &str, models: &[&str]) -> CompareRequest {
		CompareRequest {
			prompt: prompt.into(),
			models: models.iter().map(|m| m.to_string()).collect(),
			max_tokens: None,
		}
	}

	#[tokio::test]
	async fn empty_prompt_is_rejected() {
		let err = unconfigured()
			.compare(&req("  ", &["gpt-4o"]))
			.await
			.unwrap_err();

		assert!(matches!(err, MixError::EmptyPrompt));
		assert!(err.is_validation());
	}

	#[tokio::test]
	async fn empty_model_list_is_rejected() {
		let err = unconfigured().compare(&req("hi", &[])).await.unwrap_err();

		assert!(matches!(err, MixError::NoModels));
	}

	#[tokio::test]
	async fn more_than_max_models_is_rejected() {
		let models =
			["claude-opus-4", "claude-sonnet-4", "gpt-4o", "gpt-4o-mini", "mistral-large"];
		let err =
			unconfigured().compare(&req("hi", &models)).await.unwrap_err();

		assert!(matches!(err, MixError::TooManyModels { max: 4 }));
	}

	#[tokio::test]
	async fn unknown_models_are_named_in_the_error() {
		let err = unconfigured()
			.compare(&req("hi", &["gpt-4o", "gpt-6", "claude-9"]))
			.await
			.unwrap_err();

		assert_eq!(
			err.to_string(),
			"Invalid model(s): gpt-6, claude-9"
		);
	}

	#[tokio::test]
	async fn missing_credentials_become_per_model_errors() {
		let session = unconfigured()
			.compare(&req("hi", &["claude-sonnet-4", "gpt-4o"]))
			.await
			.unwrap();

		assert_eq!(session.results.len(), 2);
		assert_eq!(session.results[0].model_id, "claude-sonnet-4");
		assert_eq!(session.results[1].model_id, "gpt-4o");

		for result in &session.results {
			assert_eq!(result.status, ResultStatus::Error);
			assert!(result.content.starts_with("Error: "));
			assert_eq!(result.response_time, 0);
			assert!(result.token_usage.is_none());
			assert!(result.error_message.is_some());
		}
	}

	#[tokio::test]
	async fn resubmission_gets_a_fresh_session_id() {
		let mix = unconfigured();
		let request = req("hi", &["gpt-4o"]);

		let a = mix.compare(&request).await.unwrap();
		let b = mix.compare(&request).await.unwrap();

		assert_ne!(a.id, b.id);
		assert_eq!(a.results.len(), b.results.len());
	}

	#[test]
	fn usage_total_is_the_sum_of_counts() {
		let usage = TokenUsage::from_counts(12, 30);

		assert_eq!(usage.total_tokens, 42);
	}

	#[test]
	fn max_models_cap_is_configurable() {
		let mix = unconfigured().with_max_models(2);
		let err = mix
			.validate(&req("hi", &["gpt-4o", "gpt-4o-mini", "mistral-large"]))
			.unwrap_err();

		assert!(matches!(err, MixError::TooManyModels { max: 2 }));
	}
}
