use async_trait::async_trait;
use serde::Deserialize;
use std::time::Duration;
use tracing::debug;

use crate::provider::{TranslateError, TranslationProvider};

/// Terminal fallback leg: an OpenAI-compatible chat-completion endpoint
/// instructed to act as a pure translator. Invoked only when every
/// configured endpoint in the cascade failed or echoed the input back.
pub struct ModelFallbackProvider {
    client: reqwest::Client,
    base_url: String,
    api_key: Option<String>,
    model: String,
    timeout: Duration,
}

impl ModelFallbackProvider {
    pub fn new(base_url: String, api_key: Option<String>, model: String, timeout: Duration) -> Self {
        Self {
            client: reqwest::Client::new(),
            base_url,
            api_key,
            model,
            timeout,
        }
    }

    fn system_prompt(target: &str) -> String {
        match target {
            "zh" => "你是一个专业翻译引擎。将用户输入逐句翻译成中文，只输出译文本身，不要添加任何解释或标签。".to_string(),
            "fr" => "Tu es un moteur de traduction professionnel. Traduis le texte de l'utilisateur en français. Ne renvoie que la traduction, sans explication ni balise.".to_string(),
            other => format!(
                "You are a professional translation engine. Translate the user's text into the language with ISO code \"{other}\". Output only the translation, with no explanation or tags."
            ),
        }
    }
}

#[derive(Deserialize)]
struct ChatCompletionResponse {
    choices: Vec<Choice>,
}

#[derive(Deserialize)]
struct Choice {
    message: ChoiceMessage,
}

#[derive(Deserialize)]
struct ChoiceMessage {
    content: Option<String>,
}

#[async_trait]
impl TranslationProvider for ModelFallbackProvider {
    fn name(&self) -> &str {
        "model-fallback"
    }

    async fn translate(&self, text: &str, _source: &str, target: &str) -> Result<String, TranslateError> {
        let max_tokens = (text.chars().count() * 3).clamp(128, 2048);
        let body = serde_json::json!({
            "model": self.model,
            "temperature": 0.0,
            "max_tokens": max_tokens,
            "messages": [
                {"role": "system", "content": Self::system_prompt(target)},
                {"role": "user", "content": text},
            ],
        });

        debug!(model = %self.model, target, "invoking model-based translation fallback");

        let mut req = self
            .client
            .post(format!("{}/chat/completions", self.base_url))
            .timeout(self.timeout)
            .json(&body);
        if let Some(key) = &self.api_key {
            req = req.bearer_auth(key);
        }

        let resp = req.send().await?;
        if !resp.status().is_success() {
            return Err(TranslateError::Api {
                status: resp.status().as_u16(),
                message: resp.text().await.unwrap_or_default(),
            });
        }

        let parsed: ChatCompletionResponse = resp.json().await.map_err(TranslateError::Http)?;
        parsed
            .choices
            .into_iter()
            .next()
            .and_then(|c| c.message.content)
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
            .ok_or(TranslateError::EmptyResponse)
    }
}
