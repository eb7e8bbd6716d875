use std::time::Duration;

use tracing::{info, warn};

use crate::detect::heuristic_detect;
use crate::provider::{LanguageDetector, TranslateError, TranslationProvider};

fn is_cjk(c: char) -> bool {
    ('\u{4E00}'..='\u{9FFF}').contains(&c)
}

/// Best-effort translation over an ordered list of endpoints, with a
/// terminal model-based fallback. Never returns an error: every failure
/// mode downgrades to returning the original text.
pub struct TranslationCascade {
    enabled: bool,
    providers: Vec<Box<dyn TranslationProvider>>,
    detectors: Vec<Box<dyn LanguageDetector>>,
    model_fallback: Option<Box<dyn TranslationProvider>>,
}

impl TranslationCascade {
    pub fn new(
        enabled: bool,
        providers: Vec<Box<dyn TranslationProvider>>,
        detectors: Vec<Box<dyn LanguageDetector>>,
        model_fallback: Option<Box<dyn TranslationProvider>>,
    ) -> Self {
        Self {
            enabled,
            providers,
            detectors,
            model_fallback,
        }
    }

    pub async fn translate(&self, text: &str, target: &str, source: &str) -> String {
        if text.is_empty() || !self.enabled {
            return text.to_string();
        }
        let target = normalize_lang(target);

        if target == "zh" && text.chars().any(is_cjk) {
            return text.to_string();
        }

        let effective_source = if source == "auto" {
            self.detect_language(text).await
        } else {
            source.to_string()
        };

        if effective_source.starts_with(target.as_str()) {
            return text.to_string();
        }

        for provider in &self.providers {
            match provider.translate(text, &effective_source, &target).await {
                Ok(translated) if !translated.is_empty() => return translated,
                Ok(_) => continue,
                Err(e) => {
                    warn!(provider = provider.name(), error = %e, "translation endpoint failed, trying next");
                    continue;
                }
            }
        }

        if let Some(fallback) = &self.model_fallback {
            match fallback.translate(text, &effective_source, &target).await {
                Ok(translated) if !translated.is_empty() => return translated,
                Ok(_) => {}
                Err(e) => warn!(error = %e, "model-based translation fallback failed"),
            }
        }

        info!(target = %target, "translation cascade exhausted, returning original text");
        text.to_string()
    }

    async fn detect_language(&self, text: &str) -> String {
        for detector in &self.detectors {
            match detector.detect(text).await {
                Ok(lang) if !lang.is_empty() => return normalize_lang(&lang),
                Ok(_) => continue,
                Err(e) => {
                    warn!(detector = detector.name(), error = %e, "language detection endpoint failed");
                    continue;
                }
            }
        }
        heuristic_detect(text)
    }
}

fn normalize_lang(lang: &str) -> String {
    let trimmed = lang.trim().to_lowercase();
    if trimmed.is_empty() {
        "en".to_string()
    } else {
        trimmed.chars().take(2).collect()
    }
}

/// Per-endpoint timeout shared by every leg of the cascade.
pub fn timeout_from_secs(secs: f64) -> Duration {
    Duration::from_secs_f64(secs.max(0.1))
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;

    struct AlwaysFail;
    #[async_trait]
    impl TranslationProvider for AlwaysFail {
        fn name(&self) -> &str {
            "always-fail"
        }
        async fn translate(&self, _t: &str, _s: &str, _tg: &str) -> Result<String, TranslateError> {
            Err(TranslateError::EmptyResponse)
        }
    }

    struct AlwaysOk(String);
    #[async_trait]
    impl TranslationProvider for AlwaysOk {
        fn name(&self) -> &str {
            "always-ok"
        }
        async fn translate(&self, _t: &str, _s: &str, _tg: &str) -> Result<String, TranslateError> {
            Ok(self.0.clone())
        }
    }

    #[tokio::test]
    async fn same_language_short_circuits_without_calling_any_provider() {
        let cascade = TranslationCascade::new(true, vec![Box::new(AlwaysFail)], vec![], None);
        let out = cascade.translate("hello", "en", "en").await;
        assert_eq!(out, "hello");
    }

    #[tokio::test]
    async fn chinese_target_with_cjk_input_short_circuits() {
        let cascade = TranslationCascade::new(true, vec![Box::new(AlwaysFail)], vec![], None);
        let out = cascade.translate("你好吗", "zh", "auto").await;
        assert_eq!(out, "你好吗");
    }

    #[tokio::test]
    async fn falls_back_to_second_provider_when_first_fails() {
        let cascade = TranslationCascade::new(
            true,
            vec![Box::new(AlwaysFail), Box::new(AlwaysOk("bonjour".to_string()))],
            vec![],
            None,
        );
        let out = cascade.translate("hello", "fr", "en").await;
        assert_eq!(out, "bonjour");
    }

    #[tokio::test]
    async fn disabled_cascade_returns_input_unchanged() {
        let cascade = TranslationCascade::new(false, vec![Box::new(AlwaysOk("x".to_string()))], vec![], None);
        let out = cascade.translate("hello", "fr", "en").await;
        assert_eq!(out, "hello");
    }

    #[tokio::test]
    async fn all_providers_failing_returns_original_text() {
        let cascade = TranslationCascade::new(true, vec![Box::new(AlwaysFail), Box::new(AlwaysFail)], vec![], None);
        let out = cascade.translate("hello", "fr", "en").await;
        assert_eq!(out, "hello");
    }
}
