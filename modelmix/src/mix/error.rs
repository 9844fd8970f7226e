use std::time::Duration;

use reqwest::StatusCode;

use crate::registry::Provider;

#[derive(Debug, thiserror::Error)]
#[non_exhaustive]
pub enum MixError {
	#[error("Prompt is required")]
	EmptyPrompt,
	#[error("At least one model must be selected")]
	NoModels,
	#[error("Maximum {max} models can be compared at once")]
	TooManyModels { max: usize },
	#[error("Invalid model(s): {}", .0.join(", "))]
	UnknownModels(Vec<String>),
	#[error("{0} API key not configured")]
	MissingCredential(Provider),
	#[error("Response error: status {status}, body {body}")]
	Response { status: StatusCode, body: String },
	#[error("Request timed out after {0:?}")]
	Timeout(Duration),
	#[error("JSON deserialization error: {0}")]
	Json(#[from] serde_json::Error),
	#[error("Reqwest error: {0}")]
	Reqwest(#[from] reqwest::Error),
}

impl MixError {
	/// Whether this error was raised while validating the request, before
	/// anything was dispatched to a provider. Validation errors map to
	/// client errors at the HTTP boundary, everything else is either
	/// converted into a per-model error result or a server error.
	pub fn is_validation(&self) -> bool {
		matches!(
			self,
			MixError::EmptyPrompt
				| MixError::NoModels
				| MixError::TooManyModels { .. }
				| MixError::UnknownModels(_)
		)
	}
}
