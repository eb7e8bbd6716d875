use async_trait::async_trait;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum TranslateError {
    #[error("http error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("endpoint returned status {status}: {message}")]
    Api { status: u16, message: String },

    #[error("endpoint returned an empty or unparseable translation")]
    EmptyResponse,

    #[error("request cancelled by timeout")]
    Timeout,
}

/// One leg of the translation cascade: a remote endpoint or a local
/// heuristic that knows how to turn `text` in `source` into `target`.
#[async_trait]
pub trait TranslationProvider: Send + Sync {
    fn name(&self) -> &str;

    async fn translate(&self, text: &str, source: &str, target: &str) -> Result<String, TranslateError>;
}

/// One leg of language detection.
#[async_trait]
pub trait LanguageDetector: Send + Sync {
    fn name(&self) -> &str;

    async fn detect(&self, text: &str) -> Result<String, TranslateError>;
}
