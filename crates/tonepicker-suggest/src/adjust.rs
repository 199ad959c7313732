use std::sync::Arc;
use std::time::Duration;

use serde_json::Value;
use tracing::{debug, error};

use tonepicker_core::{describe, AdjustmentResult, ToneCoordinate};

use crate::cache::{cache_key, ResultCache};
use crate::engine::{ModelError, ModelParams, ToneModel};
use crate::prompt;
use crate::sanitize::sanitize;

pub const DEFAULT_UPSTREAM_TIMEOUT: Duration = Duration::from_secs(60);

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum AdjustError {
    #[error("{0}")]
    InvalidInput(String),
    #[error("Invalid API key. Please check your Mistral API configuration.")]
    UpstreamAuth,
    #[error("Rate limit exceeded. Please try again later.")]
    UpstreamRateLimited,
    #[error("Failed to adjust text tone. Please try again.")]
    UpstreamUnavailable,
}

impl AdjustError {
    fn text_required() -> Self {
        Self::InvalidInput("Text is required".to_string())
    }

    fn invalid_coordinates() -> Self {
        Self::InvalidInput("Invalid tone coordinates".to_string())
    }
}

impl From<ModelError> for AdjustError {
    fn from(err: ModelError) -> Self {
        match err {
            ModelError::Auth(_) => Self::UpstreamAuth,
            ModelError::RateLimited(_) => Self::UpstreamRateLimited,
            ModelError::Unavailable(_) => Self::UpstreamUnavailable,
        }
    }
}

/// A validated rewrite request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AdjustmentRequest {
    pub text: String,
    pub coordinate: ToneCoordinate,
}

impl AdjustmentRequest {
    pub fn new(text: impl Into<String>, x: i64, y: i64) -> Result<Self, AdjustError> {
        let text = text.into();
        if text.trim().is_empty() {
            return Err(AdjustError::text_required());
        }
        let coordinate = ToneCoordinate::new(x, y).map_err(|_| AdjustError::invalid_coordinates())?;
        Ok(Self { text, coordinate })
    }

    /// Validate an untyped JSON body. Missing, non-string text is treated as
    /// empty; missing or non-integer coordinates are invalid.
    pub fn from_body(body: &Value) -> Result<Self, AdjustError> {
        let text = body.get("text").and_then(Value::as_str).unwrap_or_default();
        if text.trim().is_empty() {
            return Err(AdjustError::text_required());
        }
        let axis = |name: &str| body.get(name).and_then(Value::as_i64);
        match (axis("x"), axis("y")) {
            (Some(x), Some(y)) => Self::new(text, x, y),
            _ => Err(AdjustError::invalid_coordinates()),
        }
    }
}

/// Runs one rewrite: cache lookup, then on a miss prompt → model →
/// sanitize → cache write. Holds no per-request state.
pub struct ToneAdjuster {
    cache: Arc<ResultCache>,
    model: Arc<dyn ToneModel>,
    params: ModelParams,
    upstream_timeout: Duration,
}

impl ToneAdjuster {
    pub fn new(cache: Arc<ResultCache>, model: Arc<dyn ToneModel>) -> Self {
        Self {
            cache,
            model,
            params: ModelParams::default(),
            upstream_timeout: DEFAULT_UPSTREAM_TIMEOUT,
        }
    }

    pub fn with_params(mut self, params: ModelParams) -> Self {
        self.params = params;
        self
    }

    pub fn with_upstream_timeout(mut self, timeout: Duration) -> Self {
        self.upstream_timeout = timeout;
        self
    }

    pub fn cache(&self) -> &Arc<ResultCache> {
        &self.cache
    }

    pub async fn adjust_tone(
        &self,
        text: &str,
        x: i64,
        y: i64,
    ) -> Result<AdjustmentResult, AdjustError> {
        let request = AdjustmentRequest::new(text, x, y)?;
        self.adjust(request).await
    }

    pub async fn adjust(&self, request: AdjustmentRequest) -> Result<AdjustmentResult, AdjustError> {
        let coordinate = request.coordinate;
        let key = cache_key(&request.text, coordinate);
        let tone = describe(coordinate);

        if let Some(entry) = self.cache.get(&key).await {
            debug!(x = coordinate.x(), y = coordinate.y(), "cache hit");
            return Ok(AdjustmentResult {
                adjusted_text: entry.result_text,
                tone,
                cached: true,
            });
        }
        debug!(x = coordinate.x(), y = coordinate.y(), "cache miss, calling model");

        let prompt = prompt::user_message(&request.text, &tone);
        let call = self.model.complete(&prompt, self.params);
        let raw = match tokio::time::timeout(self.upstream_timeout, call).await {
            Ok(Ok(raw)) => raw,
            Ok(Err(err)) => {
                error!(error = %err, "error adjusting tone");
                return Err(err.into());
            }
            Err(_) => {
                error!(timeout = ?self.upstream_timeout, "model call timed out");
                return Err(AdjustError::UpstreamUnavailable);
            }
        };

        let adjusted_text = sanitize(&raw);
        debug!(raw_len = raw.len(), clean_len = adjusted_text.len(), "sanitized model output");

        self.cache.put(key, adjusted_text.clone()).await;

        Ok(AdjustmentResult {
            adjusted_text,
            tone,
            cached: false,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn body_validation_follows_field_order() {
        assert_eq!(
            AdjustmentRequest::from_body(&json!({ "x": 9, "y": 9 })),
            Err(AdjustError::text_required())
        );
        assert_eq!(
            AdjustmentRequest::from_body(&json!({ "text": "   ", "x": 1, "y": 1 })),
            Err(AdjustError::text_required())
        );
        assert_eq!(
            AdjustmentRequest::from_body(&json!({ "text": 42, "x": 1, "y": 1 })),
            Err(AdjustError::text_required())
        );
    }

    #[test]
    fn body_rejects_missing_or_fractional_coordinates() {
        for body in [
            json!({ "text": "hi", "y": 1 }),
            json!({ "text": "hi", "x": 1 }),
            json!({ "text": "hi", "x": 1.5, "y": 1 }),
            json!({ "text": "hi", "x": "1", "y": 1 }),
            json!({ "text": "hi", "x": 3, "y": 1 }),
            json!({ "text": "hi", "x": 0, "y": -1 }),
        ] {
            assert_eq!(
                AdjustmentRequest::from_body(&body),
                Err(AdjustError::invalid_coordinates()),
                "{body}"
            );
        }
    }

    #[test]
    fn body_keeps_text_as_sent() {
        let request = AdjustmentRequest::from_body(&json!({ "text": " hi ", "x": 2, "y": 0 })).unwrap();
        assert_eq!(request.text, " hi ");
        assert_eq!(request.coordinate, ToneCoordinate::new(2, 0).unwrap());
    }

    #[test]
    fn model_errors_map_to_upstream_classes() {
        assert_eq!(AdjustError::from(ModelError::Auth(String::new())), AdjustError::UpstreamAuth);
        assert_eq!(
            AdjustError::from(ModelError::RateLimited(String::new())),
            AdjustError::UpstreamRateLimited
        );
        assert_eq!(
            AdjustError::from(ModelError::Unavailable(String::new())),
            AdjustError::UpstreamUnavailable
        );
    }
}
