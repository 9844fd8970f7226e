use std::fmt;

use reqwest::{Client, StatusCode};
use serde::{Deserialize, Serialize};
use tracing::trace;

use crate::mix::{Completion, MixError, TokenUsage};

const DEFAULT_BASE_URL: &str = "https://api.anthropic.com";
const ANTHROPIC_VERSION: &str = "2023-06-01";

#[derive(Clone)]
pub struct Anthropic {
	pub client: Client,
	pub api_key: String,
	pub base_url: String,
}

impl Anthropic {
	pub fn new(api_key: String) -> Self {
		Self {
			client: Client::new(),
			api_key,
			base_url: DEFAULT_BASE_URL.into(),
		}
	}

	pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
		self.base_url = base_url.into();
		self
	}

	/// Single-shot messages call, no retries.
	pub async fn complete(
		&self,
		model: &str,
		prompt: &str,
		max_tokens: u32,
	) -> Result<Completion, AnthropicError> {
		#[derive(Debug, Serialize)]
		struct ApiReq<'a> {
			model: &'a str,
			max_tokens: u32,
			messages: Vec<ApiMessage<'a>>,
		}

		#[derive(Debug, Serialize)]
		struct ApiMessage<'a> {
			role: &'a str,
			content: &'a str,
		}

		let api_req = ApiReq {
			model,
			max_tokens,
			messages: vec![ApiMessage {
				role: "user",
				content: prompt,
			}],
		};

		trace!("{:?}", serde_json::to_string(&api_req));

		let resp = self
			.client
			.post(format!("{}/v1/messages", self.base_url))
			.header("x-api-key", &self.api_key)
			.header("anthropic-version", ANTHROPIC_VERSION)
			.json(&api_req)
			.send()
			.await?;

		if !resp.status().is_success() {
			let status = resp.status();
			let body = resp.text().await?;
			return Err(AnthropicError::ResponseError { status, body });
		}

		let resp: ApiResp = resp.json().await?;

		let content = resp
			.content
			.into_iter()
			.filter_map(|block| block.text)
			.collect();

		// Anthropic reports input/output counts but no total.
		let usage = resp
			.usage
			.map(|u| TokenUsage::from_counts(u.input_tokens, u.output_tokens));

		Ok(Completion { content, usage })
	}
}

impl fmt::Debug for Anthropic {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.debug_struct("Anthropic")
			.field("api_key", &"***")
			.finish()
	}
}

#[derive(Debug, Deserialize)]
struct ApiResp {
	content: Vec<ApiContentBlock>,
	usage: Option<ApiUsage>,
}

/// Non-text blocks carry no `text` field and are skipped.
#[derive(Debug, Deserialize)]
struct ApiContentBlock {
	#[serde(default)]
	text: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ApiUsage {
	input_tokens: u32,
	output_tokens: u32,
}

#[derive(Debug, thiserror::Error)]
pub enum AnthropicError {
	#[error("Response error: status {status}, body {body}")]
	ResponseError { status: StatusCode, body: String },
	#[error("Reqwest error: {0}")]
	ReqwestError(#[from] reqwest::Error),
}

impl From<AnthropicError> for MixError {
	fn from(e: AnthropicError) -> Self {
		match e {
			AnthropicError::ResponseError { status, body } => {
				MixError::Response { status, body }
			}
			AnthropicError::ReqwestError(e) => MixError::Reqwest(e),
		}
	}
}
