use std::fmt;

use reqwest::{Client, StatusCode};
use serde::{Deserialize, Serialize};
use tracing::trace;

use crate::mix::{Completion, MixError, TokenUsage};

const DEFAULT_BASE_URL: &str =
	"https://generativelanguage.googleapis.com";

#[derive(Clone)]
pub struct Google {
	pub client: Client,
	pub api_key: String,
	pub base_url: String,
}

impl Google {
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
	) -> Result<Completion, GoogleError> {
		#[derive(Debug, Serialize)]
		#[serde(rename_all = "camelCase")]
		struct ApiReq<'a> {
			contents: Vec<ApiContent<'a>>,
			generation_config: ApiGenerationConfig,
		}

		#[derive(Debug, Serialize)]
		struct ApiContent<'a> {
			parts: Vec<ApiPart<'a>>,
		}

		#[derive(Debug, Serialize)]
		struct ApiPart<'a> {
			text: &'a str,
		}

		#[derive(Debug, Serialize)]
		#[serde(rename_all = "camelCase")]
		struct ApiGenerationConfig {
			max_output_tokens: u32,
		}

		let api_req = ApiReq {
			contents: vec![ApiContent {
				parts: vec![ApiPart { text: prompt }],
			}],
			generation_config: ApiGenerationConfig {
				max_output_tokens: max_tokens,
			},
		};

		trace!("{:?}", serde_json::to_string(&api_req));

		let url = format!(
			"{}/v1beta/models/{}:generateContent",
			self.base_url, model,
		);

		let resp = self
			.client
			.post(&url)
			.header("x-goog-api-key", &self.api_key)
			.json(&api_req)
			.send()
			.await?;

		if !resp.status().is_success() {
			let status = resp.status();
			let body = resp.text().await?;
			return Err(GoogleError::ResponseError { status, body });
		}

		let resp: ApiResp = resp.json().await?;

		let content = resp
			.candidates
			.into_iter()
			.flatten()
			.next()
			.map(|c| {
				c.content
					.parts
					.into_iter()
					.filter_map(|p| p.text)
					.collect()
			})
			.unwrap_or_default();

		let usage = resp.usage_metadata.map(|u| {
			let completion = u.candidates_token_count.unwrap_or(0);
			TokenUsage {
				prompt_tokens: u.prompt_token_count,
				completion_tokens: completion,
				total_tokens: u
					.total_token_count
					.unwrap_or(u.prompt_token_count + completion),
			}
		});

		Ok(Completion { content, usage })
	}
}

impl fmt::Debug for Google {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.debug_struct("Google").field("api_key", &"***").finish()
	}
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ApiResp {
	candidates: Option<Vec<ApiCandidate>>,
	usage_metadata: Option<ApiUsageMetadata>,
}

#[derive(Debug, Deserialize)]
struct ApiCandidate {
	content: ApiCandidateContent,
}

#[derive(Debug, Deserialize)]
struct ApiCandidateContent {
	#[serde(default)]
	parts: Vec<ApiRespPart>,
}

#[derive(Debug, Deserialize)]
struct ApiRespPart {
	#[serde(default)]
	text: Option<String>,
}

/// `candidatesTokenCount` is absent when the candidate was emptied by a
/// safety filter, `totalTokenCount` includes thinking tokens on some
/// models, so both are optional.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ApiUsageMetadata {
	prompt_token_count: u32,
	candidates_token_count: Option<u32>,
	total_token_count: Option<u32>,
}

#[derive(Debug, thiserror::Error)]
pub enum GoogleError {
	#[error("Response error: status {status}, body {body}")]
	ResponseError { status: StatusCode, body: String },
	#[error("Reqwest error: {0}")]
	ReqwestError(#[from] reqwest::Error),
}

impl From<GoogleError> for MixError {
	fn from(e: GoogleError) -> Self {
		match e {
			GoogleError::ResponseError { status, body } => {
				MixError::Response { status, body }
			}
			GoogleError::ReqwestError(e) => MixError::Reqwest(e),
		}
	}
}
