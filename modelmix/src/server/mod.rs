use std::sync::Arc;

use axum::{
	Json, Router,
	extract::{State, rejection::JsonRejection},
	http::StatusCode,
	response::{IntoResponse, Response},
	routing::{get, post},
};
use serde::Serialize;
use serde_json::json;
use tracing::error;

use crate::{
	mix::{CompareRequest, ModelMix},
	registry::{self, Provider},
};

pub struct AppState {
	pub mix: ModelMix,
}

pub fn app(mix: ModelMix) -> Router {
	let state = Arc::new(AppState { mix });

	Router::new()
		.route("/models", get(list_models))
		.route("/compare", post(compare))
		.with_state(state)
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct ModelInfo {
	id: &'static str,
	name: &'static str,
	provider: Provider,
	context_window: u32,
	max_tokens: u32,
	available: bool,
}

#[derive(Debug, Serialize)]
struct ProviderInfo {
	provider: Provider,
	available: bool,
}

#[derive(Debug, Serialize)]
struct ModelsResponse {
	models: Vec<ModelInfo>,
	providers: Vec<ProviderInfo>,
}

async fn list_models(
	State(state): State<Arc<AppState>>,
) -> Json<ModelsResponse> {
	let mut models: Vec<_> = registry::MODELS
		.iter()
		.map(|m| ModelInfo {
			id: m.id,
			name: m.name,
			provider: m.provider,
			context_window: m.context_window_tokens,
			max_tokens: m.max_output_tokens,
			available: state.mix.provider_available(m.provider),
		})
		.collect();

	models.sort_by_key(|m| (m.provider.as_str(), m.name));

	let providers = Provider::ALL
		.iter()
		.map(|&provider| ProviderInfo {
			provider,
			available: state.mix.provider_available(provider),
		})
		.collect();

	Json(ModelsResponse { models, providers })
}

async fn compare(
	State(state): State<Arc<AppState>>,
	payload: Result<Json<CompareRequest>, JsonRejection>,
) -> Response {
	let Json(req) = match payload {
		Ok(payload) => payload,
		Err(rejection) => {
			return client_error(rejection.body_text());
		}
	};

	match state.mix.compare(&req).await {
		Ok(session) => Json(session).into_response(),
		Err(e) if e.is_validation() => client_error(e.to_string()),
		Err(e) => {
			error!("compare failed: {e}");
			(
				StatusCode::INTERNAL_SERVER_ERROR,
				Json(json!({ "error": "Internal server error" })),
			)
				.into_response()
		}
	}
}

fn client_error(message: String) -> Response {
	(StatusCode::BAD_REQUEST, Json(json!({ "error": message })))
		.into_response()
}
