use std::fmt;

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Provider {
	Anthropic,
	#[serde(rename = "openai")]
	OpenAi,
	Google,
	Mistral,
	Cohere,
}

impl Provider {
	pub const ALL: [Provider; 5] = [
		Provider::Anthropic,
		Provider::OpenAi,
		Provider::Google,
		Provider::Mistral,
		Provider::Cohere,
	];

	pub fn as_str(&self) -> &'static str {
		match self {
			Provider::Anthropic => "anthropic",
			Provider::OpenAi => "openai",
			Provider::Google => "google",
			Provider::Mistral => "mistral",
			Provider::Cohere => "cohere",
		}
	}
}

impl fmt::Display for Provider {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.write_str(self.as_str())
	}
}

/// Static metadata for one selectable model: the public id callers use,
/// the provider that serves it and the opaque model string that
/// provider expects on the wire.
#[derive(Debug, Clone, Copy)]
pub struct ModelDescriptor {
	pub id: &'static str,
	pub name: &'static str,
	pub provider: Provider,
	pub vendor_model: &'static str,
	pub max_output_tokens: u32,
	pub context_window_tokens: u32,
}

pub const MODELS: &[ModelDescriptor] = &[
	ModelDescriptor {
		id: "claude-opus-4",
		name: "Claude Opus 4",
		provider: Provider::Anthropic,
		vendor_model: "claude-opus-4-20250514",
		max_output_tokens: 4096,
		context_window_tokens: 200_000,
	},
	ModelDescriptor {
		id: "claude-sonnet-4",
		name: "Claude Sonnet 4",
		provider: Provider::Anthropic,
		vendor_model: "claude-sonnet-4-20250514",
		max_output_tokens: 4096,
		context_window_tokens: 200_000,
	},
	ModelDescriptor {
		id: "claude-haiku-3.5",
		name: "Claude Haiku 3.5",
		provider: Provider::Anthropic,
		vendor_model: "claude-3-5-haiku-20241022",
		max_output_tokens: 4096,
		context_window_tokens: 200_000,
	},
	ModelDescriptor {
		id: "gpt-4o",
		name: "GPT-4o",
		provider: Provider::OpenAi,
		vendor_model: "gpt-4o",
		max_output_tokens: 4096,
		context_window_tokens: 128_000,
	},
	ModelDescriptor {
		id: "gpt-4o-mini",
		name: "GPT-4o Mini",
		provider: Provider::OpenAi,
		vendor_model: "gpt-4o-mini",
		max_output_tokens: 4096,
		context_window_tokens: 128_000,
	},
	ModelDescriptor {
		id: "gemini-2.0-flash",
		name: "Gemini 2.0 Flash",
		provider: Provider::Google,
		vendor_model: "gemini-2.0-flash",
		max_output_tokens: 8192,
		context_window_tokens: 1_000_000,
	},
	ModelDescriptor {
		id: "gemini-1.5-pro",
		name: "Gemini 1.5 Pro",
		provider: Provider::Google,
		vendor_model: "gemini-1.5-pro",
		max_output_tokens: 8192,
		context_window_tokens: 2_000_000,
	},
	ModelDescriptor {
		id: "mistral-large",
		name: "Mistral Large",
		provider: Provider::Mistral,
		vendor_model: "mistral-large-latest",
		max_output_tokens: 4096,
		context_window_tokens: 128_000,
	},
	ModelDescriptor {
		id: "command-r-plus",
		name: "Command R+",
		provider: Provider::Cohere,
		vendor_model: "command-r-plus-08-2024",
		max_output_tokens: 4096,
		context_window_tokens: 128_000,
	},
];

pub fn lookup(id: &str) -> Option<&'static ModelDescriptor> {
	MODELS.iter().find(|m| m.id == id)
}
