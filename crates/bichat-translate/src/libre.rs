use async_trait::async_trait;
use serde::Deserialize;
use std::time::Duration;
use tracing::{debug, warn};

use crate::provider::{LanguageDetector, TranslateError, TranslationProvider};

/// One LibreTranslate-compatible HTTP endpoint.
///
/// Tries a JSON body first; on 400/415/422 (endpoints that insist on
/// form-encoded bodies) retries once with `application/x-www-form-urlencoded`.
pub struct LibreEndpoint {
    client: reqwest::Client,
    url: String,
    timeout: Duration,
}

impl LibreEndpoint {
    pub fn new(url: impl Into<String>, timeout: Duration) -> Self {
        Self {
            client: reqwest::Client::new(),
            url: url.into(),
            timeout,
        }
    }
}

#[derive(Deserialize)]
struct TranslateResponse {
    #[serde(rename = "translatedText")]
    translated_text: Option<String>,
}

#[derive(Deserialize)]
struct DetectResponse {
    language: Option<String>,
}

#[async_trait]
impl TranslationProvider for LibreEndpoint {
    fn name(&self) -> &str {
        &self.url
    }

    async fn translate(&self, text: &str, source: &str, target: &str) -> Result<String, TranslateError> {
        let json_body = serde_json::json!({
            "q": text,
            "source": source,
            "target": target,
            "format": "text",
        });

        let resp = self
            .client
            .post(&self.url)
            .timeout(self.timeout)
            .json(&json_body)
            .send()
            .await?;

        let status = resp.status();
        let parsed = if status.as_u16() == 400 || status.as_u16() == 415 || status.as_u16() == 422 {
            debug!(url = %self.url, status = status.as_u16(), "retrying translate endpoint with form encoding");
            let form_resp = self
                .client
                .post(&self.url)
                .timeout(self.timeout)
                .form(&[("q", text), ("source", source), ("target", target), ("format", "text")])
                .send()
                .await?;
            if !form_resp.status().is_success() {
                return Err(TranslateError::Api {
                    status: form_resp.status().as_u16(),
                    message: form_resp.text().await.unwrap_or_default(),
                });
            }
            form_resp.json::<TranslateResponse>().await?
        } else if !status.is_success() {
            let message = resp.text().await.unwrap_or_default();
            warn!(url = %self.url, status = status.as_u16(), "translate endpoint error");
            return Err(TranslateError::Api {
                status: status.as_u16(),
                message,
            });
        } else {
            resp.json::<TranslateResponse>().await?
        };

        parsed
            .translated_text
            .filter(|t| !t.is_empty())
            .ok_or(TranslateError::EmptyResponse)
    }
}

#[async_trait]
impl LanguageDetector for LibreEndpoint {
    fn name(&self) -> &str {
        &self.url
    }

    async fn detect(&self, text: &str) -> Result<String, TranslateError> {
        let resp = self
            .client
            .post(&self.url)
            .timeout(self.timeout)
            .json(&serde_json::json!({ "q": text }))
            .send()
            .await?;

        if !resp.status().is_success() {
            return Err(TranslateError::Api {
                status: resp.status().as_u16(),
                message: resp.text().await.unwrap_or_default(),
            });
        }

        // LibreTranslate's /detect returns a ranked array; take the top hit.
        let parsed: Vec<DetectResponse> = resp.json().await.map_err(TranslateError::Http)?;
        parsed
            .into_iter()
            .next()
            .and_then(|d| d.language)
            .filter(|l| !l.is_empty())
            .ok_or(TranslateError::EmptyResponse)
    }
}
