pub mod cascade;
pub mod detect;
pub mod libre;
pub mod model_fallback;
pub mod provider;

pub use cascade::{timeout_from_secs, TranslationCascade};
pub use libre::LibreEndpoint;
pub use model_fallback::ModelFallbackProvider;
pub use provider::{LanguageDetector, TranslateError, TranslationProvider};
