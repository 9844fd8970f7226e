use std::fmt;

use reqwest::{Client, StatusCode};
use serde::{Deserialize, Serialize};
use tracing::trace;

use crate::mix::{Completion, MixError, TokenUsage};

const DEFAULT_BASE_URL: &str = "https://api.openai.com";

#[derive(Clone)]
pub struct OpenAi {
	pub client: Client,
	pub api_key: String,
	pub base_url: String,
}

impl OpenAi {
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

	pub async fn complete(
		&self,
		model: &str,
		prompt: &str,
		max_tokens: u32,
	) -> Result<Completion, OpenAiError> {
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
			.post(format!("{}/v1/chat/completions", self.base_url))
			.bearer_auth(&self.api_key)
			.json(&api_req)
			.send()
			.await?;

		if !resp.status().is_success() {
			let status = resp.status();
			let body = resp.text().await?;
			return Err(OpenAiError::ResponseError { status, body });
		}

		let resp: ApiResp = resp.json().await?;

		let content = resp
			.choices
			.into_iter()
			.next()
			.and_then(|c| c.message.content)
			.unwrap_or_default();

		let usage = resp.usage.map(|u| TokenUsage {
			prompt_tokens: u.prompt_tokens,
			completion_tokens: u.completion_tokens,
			total_tokens: u.total_tokens,
		});

		Ok(Completion { content, usage })
	}
}

impl fmt::Debug for OpenAi {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.debug_struct("OpenAi").field("api_key", &"***").finish()
	}
}

#[derive(Debug, Deserialize)]
struct ApiResp {
	choices: Vec<ApiChoice>,
	usage: Option<ApiUsage>,
}

#[derive(Debug, Deserialize)]
struct ApiChoice {
	message: ApiChoiceMessage,
}

#[derive(Debug, Deserialize)]
struct ApiChoiceMessage {
	content: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ApiUsage {
	prompt_tokens: u32,
	completion_tokens: u32,
	total_tokens: u32,
}

#[derive(Debug, thiserror::Error)]
pub enum OpenAiError {
	#[error("Response error: status {status}, body {body}")]
	ResponseError { status: StatusCode, body: String },
	#[error("Reqwest error: {0}")]
	ReqwestError(#[from] reqwest::Error),
}

impl From<OpenAiError> for MixError {
	fn from(e: OpenAiError) -> Self {
		match e {
			OpenAiError::ResponseError { status, body } => {
				MixError::Response { status, body }
			}
			OpenAiError::ReqwestError(e) => MixError::Reqwest(e),
		}
	}
}
