use std::fmt;

use reqwest::{Client, StatusCode};
use serde::{Deserialize, Serialize};
use tracing::trace;

use crate::mix::{Completion, MixError, TokenUsage};

const DEFAULT_BASE_URL: &str = "https://api.cohere.com";

#[derive(Clone)]
pub struct Cohere {
	pub client: Client,
	pub api_key: String,
	pub base_url: String,
}

impl Cohere {
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
	) -> Result<Completion, CohereError> {
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
			.post(format!("{}/v2/chat", self.base_url))
			.bearer_auth(&self.api_key)
			.json(&api_req)
			.send()
			.await?;

		if !resp.status().is_success() {
			let status = resp.status();
			let body = resp.text().await?;
			return Err(CohereError::ResponseError { status, body });
		}

		let resp: ApiResp = resp.json().await?;

		let content = resp
			.message
			.map(|m| {
				m.content
					.into_iter()
					.flatten()
					.filter_map(|block| block.text)
					.collect()
			})
			.unwrap_or_default();

		// Cohere reports billed input/output counts, no total.
		let usage = resp
			.usage
			.and_then(|u| u.billed_units)
			.map(|b| {
				TokenUsage::from_counts(
					b.input_tokens.unwrap_or(0.0) as u32,
					b.output_tokens.unwrap_or(0.0) as u32,
				)
			});

		Ok(Completion { content, usage })
	}
}

impl fmt::Debug for Cohere {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.debug_struct("Cohere").field("api_key", &"***").finish()
	}
}

#[derive(Debug, Deserialize)]
struct ApiResp {
	message: Option<ApiRespMessage>,
	usage: Option<ApiUsage>,
}

#[derive(Debug, Deserialize)]
struct ApiRespMessage {
	#[serde(default)]
	content: Option<Vec<ApiRespBlock>>,
}

#[derive(Debug, Deserialize)]
struct ApiRespBlock {
	#[serde(default)]
	text: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ApiUsage {
	billed_units: Option<ApiBilledUnits>,
}

/// Billed counts are documented as numbers and can be fractional.
#[derive(Debug, Deserialize)]
struct ApiBilledUnits {
	input_tokens: Option<f64>,
	output_tokens: Option<f64>,
}

#[derive(Debug, thiserror::Error)]
pub enum CohereError {
	#[error("Response error: status {status}, body {body}")]
	ResponseError { status: StatusCode, body: String },
	#[error("Reqwest error: {0}")]
	ReqwestError(#[from] reqwest::Error),
}

impl From<CohereError> for MixError {
	fn from(e: CohereError) -> Self {
		match e {
			CohereError::ResponseError { status, body } => {
				MixError::Response { status, body }
			}
			CohereError::ReqwestError(e) => MixError::Reqwest(e),
		}
	}
}
