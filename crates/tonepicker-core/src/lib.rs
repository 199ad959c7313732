pub mod tone;

use serde::{Deserialize, Serialize};

pub use tone::{describe, Formality, Register, ToneDescriptor};

// --- Tone coordinates ---

/// A point on the 3x3 tone grid. Both axes are in `0..=2`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ToneCoordinate {
    x: u8,
    y: u8,
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("tone coordinate ({x}, {y}) is outside the 3x3 grid")]
pub struct CoordinateError {
    pub x: i64,
    pub y: i64,
}

impl ToneCoordinate {
    pub const MAX: i64 = 2;

    pub fn new(x: i64, y: i64) -> Result<Self, CoordinateError> {
        let in_range = |v: i64| (0..=Self::MAX).contains(&v);
        if in_range(x) && in_range(y) {
            Ok(Self { x: x as u8, y: y as u8 })
        } else {
            Err(CoordinateError { x, y })
        }
    }

    pub fn x(&self) -> u8 {
        self.x
    }

    pub fn y(&self) -> u8 {
        self.y
    }
}

// --- Wire types (shared by server and client) ---

/// Body of `POST /api/adjust-tone`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct AdjustToneBody {
    pub text: String,
    pub x: i64,
    pub y: i64,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct AdjustmentResult {
    pub adjusted_text: String,
    pub tone: ToneDescriptor,
    pub cached: bool,
}

/// Body of `GET /api/health`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct HealthStatus {
    pub status: String,
    pub timestamp: String,
    pub cache_size: usize,
}

/// Every non-2xx response carries this shape.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ErrorBody {
    pub error: String,
}

impl ErrorBody {
    pub fn new(error: impl Into<String>) -> Self {
        Self { error: error.into() }
    }
}

// --- AI Settings ---

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
pub struct AiSettings {
    pub provider: String,
    pub api_key: String,
    pub model: String,
}

impl AiSettings {
    pub const DEFAULT_PROVIDER: &'static str = "mistral";
    pub const DEFAULT_MODEL: &'static str = "mistral-small-latest";
}

pub fn ai_configured(settings: &AiSettings) -> bool {
    !settings.provider.is_empty()
        && !settings.model.is_empty()
        && (settings.provider == "ollama" || !settings.api_key.is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn coordinate_accepts_the_grid() {
        for x in 0..=2 {
            for y in 0..=2 {
                let c = ToneCoordinate::new(x, y).unwrap();
                assert_eq!((c.x() as i64, c.y() as i64), (x, y));
            }
        }
    }

    #[test]
    fn coordinate_rejects_off_grid_values() {
        for (x, y) in [(-1, 0), (0, -1), (3, 0), (0, 3), (i64::MAX, 1)] {
            assert_eq!(ToneCoordinate::new(x, y), Err(CoordinateError { x, y }));
        }
    }

    #[test]
    fn adjustment_result_uses_camel_case() {
        let result = AdjustmentResult {
            adjusted_text: "Hi".to_string(),
            tone: describe(ToneCoordinate::new(1, 1).unwrap()),
            cached: true,
        };
        let json = serde_json::to_value(&result).unwrap();
        assert_eq!(json["adjustedText"], "Hi");
        assert_eq!(json["tone"]["description"], "Balanced and neutral");
        assert_eq!(json["cached"], true);
    }

    #[test]
    fn ollama_needs_no_key() {
        let mut settings = AiSettings {
            provider: "ollama".to_string(),
            api_key: String::new(),
            model: "llama3".to_string(),
        };
        assert!(ai_configured(&settings));
        settings.provider = "mistral".to_string();
        assert!(!ai_configured(&settings));
        settings.api_key = "sk-test".to_string();
        assert!(ai_configured(&settings));
    }
}
