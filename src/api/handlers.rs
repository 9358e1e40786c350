use axum::{extract::State, http::StatusCode, Json};

use super::types::{ErrorResponse, GenerateRequest};
use super::ServerState;
use crate::error::LLMError;
use crate::orchestrator::GenerationResult;

/// Handles message generation requests
///
/// # Returns
/// * `Ok(Json<GenerationResult>)` - A validated or canned message
/// * `Err((StatusCode, Json<ErrorResponse>))` - 400 for an unknown theme
///
/// Provider failures never surface here: the orchestrator degrades to a
/// canned message instead.
pub async fn handle_generate(
    State(state): State<ServerState>,
    Json(req): Json<GenerateRequest>,
) -> Result<Json<GenerationResult>, (StatusCode, Json<ErrorResponse>)> {
    match state.orchestrator.generate_str(&req.theme).await {
        Ok(result) => Ok(Json(result)),
        Err(e @ LLMError::InvalidArgument(_)) => Err((
            StatusCode::BAD_REQUEST,
            Json(ErrorResponse {
                error: e.to_string(),
            }),
        )),
        Err(e) => {
            log::error!("Unexpected generation error: {}", e);
            Err((
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(ErrorResponse {
                    error: "internal error".to_string(),
                }),
            ))
        }
    }
}

/// Liveness probe
pub async fn handle_health() -> &'static str {
    "ok"
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::builder::MoodlineBuilder;
    use crate::completion::{CompletionProvider, CompletionRequest, RawCompletion};
    use async_trait::async_trait;
    use std::sync::Arc;

    struct Fixed(&'static str);

    #[async_trait]
    impl CompletionProvider for Fixed {
        async fn complete(&self, _req: &CompletionRequest) -> Result<RawCompletion, LLMError> {
            Ok(RawCompletion::new(self.0))
        }
    }

    fn state(reply: &'static str) -> ServerState {
        let orchestrator = MoodlineBuilder::new()
            .provider(Fixed(reply))
            .models(["m"])
            .unwrap()
            .max_passes(1)
            .max_attempts_per_model(1)
            .build()
            .unwrap();
        ServerState {
            orchestrator: Arc::new(orchestrator),
        }
    }

    #[tokio::test]
    async fn generate_returns_validated_payload() {
        let reply = r#"{"reasoning": "r", "score": 6, "finalMessage": "Hello friend"}"#;
        let Json(result) = handle_generate(
            State(state(reply)),
            Json(GenerateRequest {
                theme: "wholesome".into(),
            }),
        )
        .await
        .unwrap();
        assert_eq!(result.message(), "Hello friend");
        assert!(!result.is_fallback());
    }

    #[tokio::test]
    async fn generate_degrades_to_fallback() {
        let Json(result) = handle_generate(
            State(state("garbage")),
            Json(GenerateRequest {
                theme: "dark".into(),
            }),
        )
        .await
        .unwrap();
        assert!(result.is_fallback());
    }

    #[tokio::test]
    async fn unknown_theme_is_bad_request() {
        let (status, Json(body)) = handle_generate(
            State(state("unused")),
            Json(GenerateRequest {
                theme: "beige".into(),
            }),
        )
        .await
        .unwrap_err();
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert!(body.error.contains("beige"));
    }
}
