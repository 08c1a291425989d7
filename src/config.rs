use serde::Deserialize;

#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
    pub telegram_bot_token: String,
    pub gemini_api_key: String,
    pub serpapi_api_key: String,
    pub database_url: String,

    /// Model used for plain text chat
    pub gemini_text_model: String,
    /// Multimodal model used for image analysis
    pub gemini_vision_model: String,
    /// Base URL of the Generative Language API
    pub gemini_api_base: String,

    /// Full URL of the SerpAPI search endpoint
    pub serpapi_url: String,
}

impl AppConfig {
    pub fn from_env() -> anyhow::Result<Self> {
        Ok(Self::from_lookup(|key| std::env::var(key).ok()))
    }

    /// Build the config from an arbitrary variable source.
    ///
    /// Secrets are not required here: a missing token or key only surfaces
    /// when the corresponding service is first called.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let secret = |key: &str| {
            let value = lookup(key).unwrap_or_default();
            if value.trim().is_empty() {
                tracing::warn!("{} is not set", key);
            }
            value
        };
        let or_default = |key: &str, default: &str| {
            lookup(key)
                .filter(|v| !v.trim().is_empty())
                .unwrap_or_else(|| default.to_string())
        };

        Self {
            telegram_bot_token: secret("TELEGRAM_BOT_TOKEN"),
            gemini_api_key: secret("GEMINI_API_KEY"),
            serpapi_api_key: secret("SERPAPI_API_KEY"),
            database_url: secret("DATABASE_URL"),
            gemini_text_model: or_default("GEMINI_TEXT_MODEL", "gemini-pro"),
            gemini_vision_model: or_default("GEMINI_VISION_MODEL", "gemini-1.5-flash"),
            gemini_api_base: or_default(
                "GEMINI_API_BASE",
                "https://generativelanguage.googleapis.com",
            ),
            serpapi_url: or_default("SERPAPI_URL", "https://serpapi.com/search"),
        }
    }
}
