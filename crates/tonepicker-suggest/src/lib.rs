pub mod adjust;
pub mod cache;
pub mod engine;
mod prompt;
mod sanitize;

pub use adjust::{AdjustError, AdjustmentRequest, ToneAdjuster, DEFAULT_UPSTREAM_TIMEOUT};
pub use cache::{cache_key, CacheEntry, ResultCache, DEFAULT_TTL};
pub use engine::{LlmToneModel, ModelError, ModelParams, ToneModel};
pub use prompt::user_message;
pub use sanitize::sanitize;
