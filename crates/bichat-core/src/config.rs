use figment::{
    providers::{Env, Format, Toml},
    Figment,
};
use serde::{Deserialize, Serialize};

pub const DEFAULT_PORT: u16 = 8787;
pub const DEFAULT_BIND: &str = "0.0.0.0";
pub const MAX_WS_FRAME_BYTES: usize = 20 * 1024 * 1024; // base64 images included

/// Top-level config (bichat.toml + BICHAT_* env overrides).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BichatConfig {
    #[serde(default)]
    pub gateway: GatewayConfig,
    #[serde(default)]
    pub database: DatabaseConfig,
    #[serde(default)]
    pub chat: ChatConfig,
    #[serde(default)]
    pub translation: TranslationConfig,
}

impl Default for BichatConfig {
    fn default() -> Self {
        Self {
            gateway: GatewayConfig::default(),
            database: DatabaseConfig::default(),
            chat: ChatConfig::default(),
            translation: TranslationConfig::default(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GatewayConfig {
    #[serde(default = "default_port")]
    pub port: u16,
    #[serde(default = "default_bind")]
    pub bind: String,
    #[serde(default = "default_frontend_origin")]
    pub frontend_origin: String,
    #[serde(default = "default_api_base_url")]
    pub api_base_url: String,
}

impl Default for GatewayConfig {
    fn default() -> Self {
        Self {
            port: default_port(),
            bind: default_bind(),
            frontend_origin: default_frontend_origin(),
            api_base_url: default_api_base_url(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DatabaseConfig {
    #[serde(default = "default_db_path")]
    pub path: String,
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            path: default_db_path(),
        }
    }
}

/// Chat broker tuning — bot takeover and learning windows.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChatConfig {
    #[serde(default = "default_client_lang")]
    pub default_client_lang: String,
    #[serde(default = "default_max_message_length")]
    pub max_message_length: usize,
    #[serde(default = "default_inactivity_sec")]
    pub bot_inactivity_sec: u64,
    #[serde(default = "default_suppress_sec")]
    pub bot_suppress_sec: u64,
    #[serde(default = "default_pairing_window_sec")]
    pub learning_pairing_window_sec: u64,
}

impl Default for ChatConfig {
    fn default() -> Self {
        Self {
            default_client_lang: default_client_lang(),
            max_message_length: default_max_message_length(),
            bot_inactivity_sec: default_inactivity_sec(),
            bot_suppress_sec: default_suppress_sec(),
            learning_pairing_window_sec: default_pairing_window_sec(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TranslationConfig {
    #[serde(default = "bool_true")]
    pub enabled: bool,
    #[serde(default = "default_timeout_sec")]
    pub timeout_sec: f64,
    #[serde(default = "default_libre_endpoints")]
    pub libre_endpoints: Vec<String>,
    #[serde(default = "default_libre_detect_endpoints")]
    pub libre_detect_endpoints: Vec<String>,
    pub llm_base_url: Option<String>,
    pub llm_api_key: Option<String>,
    #[serde(default = "default_llm_model")]
    pub llm_model: String,
}

impl Default for TranslationConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            timeout_sec: default_timeout_sec(),
            libre_endpoints: default_libre_endpoints(),
            libre_detect_endpoints: default_libre_detect_endpoints(),
            llm_base_url: None,
            llm_api_key: None,
            llm_model: default_llm_model(),
        }
    }
}

fn bool_true() -> bool {
    true
}
fn default_port() -> u16 {
    DEFAULT_PORT
}
fn default_bind() -> String {
    DEFAULT_BIND.to_string()
}
fn default_frontend_origin() -> String {
    "*".to_string()
}
fn default_api_base_url() -> String {
    format!("http://127.0.0.1:{DEFAULT_PORT}")
}
fn default_client_lang() -> String {
    "fr".to_string()
}
fn default_max_message_length() -> usize {
    500
}
fn default_inactivity_sec() -> u64 {
    30
}
fn default_suppress_sec() -> u64 {
    5
}
fn default_pairing_window_sec() -> u64 {
    180
}
fn default_timeout_sec() -> f64 {
    5.0
}
fn default_llm_model() -> String {
    "qwen2.5-3b-instruct-q5_k_m".to_string()
}
fn default_libre_endpoints() -> Vec<String> {
    vec![
        "https://libretranslate.de/translate".to_string(),
        "https://translate.argosopentech.com/translate".to_string(),
    ]
}
fn default_libre_detect_endpoints() -> Vec<String> {
    vec!["https://libretranslate.de/detect".to_string()]
}
fn default_db_path() -> String {
    let home = std::env::var("HOME").unwrap_or_else(|_| ".".to_string());
    format!("{home}/.bichat/bichat.db")
}

impl BichatConfig {
    /// Load config from a TOML file with BICHAT_* env var overrides.
    ///
    /// Checks in order:
    ///   1. Explicit path argument
    ///   2. BICHAT_CONFIG env var
    ///   3. ~/.bichat/bichat.toml
    pub fn load(config_path: Option<&str>) -> crate::error::Result<Self> {
        let path = config_path
            .map(String::from)
            .or_else(|| std::env::var("BICHAT_CONFIG").ok())
            .unwrap_or_else(default_config_path);

        let config: BichatConfig = Figment::new()
            .merge(Toml::file(&path))
            .merge(Env::prefixed("BICHAT_").split("_"))
            .extract()
            .map_err(|e| crate::error::BichatError::Config(e.to_string()))?;

        Ok(config)
    }
}

fn default_config_path() -> String {
    let home = std::env::var("HOME").unwrap_or_else(|_| ".".to_string());
    format!("{home}/.bichat/bichat.toml")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_without_any_file_or_env() {
        let cfg = BichatConfig::default();
        assert_eq!(cfg.gateway.port, DEFAULT_PORT);
        assert_eq!(cfg.chat.default_client_lang, "fr");
        assert_eq!(cfg.chat.bot_inactivity_sec, 30);
        assert_eq!(cfg.chat.bot_suppress_sec, 5);
        assert!(cfg.translation.enabled);
    }

    #[test]
    fn env_override_applies_on_top_of_file_defaults() {
        std::env::set_var("BICHAT_CHAT_DEFAULT_CLIENT_LANG", "en");
        let loaded: BichatConfig = Figment::new()
            .merge(figment::providers::Serialized::defaults(BichatConfig::default()))
            .merge(Env::prefixed("BICHAT_").split("_"))
            .extract()
            .expect("figment extraction");
        assert_eq!(loaded.chat.default_client_lang, "en");
        std::env::remove_var("BICHAT_CHAT_DEFAULT_CLIENT_LANG");
    }
}
