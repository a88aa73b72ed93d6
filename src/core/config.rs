use std::env;
use std::str::FromStr;
use std::time::Duration;

use crate::features::rate_limits::{PolicyKind, RateLimitPolicy};

#[derive(Debug, Clone)]
pub struct Config {
    pub app: AppConfig,
    pub llm: LlmConfig,
    pub rate_limit: RateLimitConfig,
    pub swagger: SwaggerConfig,
}

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub host: String,
    pub port: u16,
    pub cors_allowed_origins: Vec<String>,
}

/// Upstream language-model provider settings
#[derive(Debug, Clone)]
pub struct LlmConfig {
    pub api_key: String,
    pub base_url: String,
    pub model: String,
    pub max_tokens: u32,
    pub temperature: f32,
    /// Delay inserted after every relayed chunk
    pub pacing_delay: Duration,
    pub connect_timeout: Duration,
    /// Company name rendered into the assistant persona
    pub company_name: String,
}

/// Admission policies and store maintenance
#[derive(Debug, Clone)]
pub struct RateLimitConfig {
    pub chat_max_requests: u32,
    pub chat_window_secs: u64,
    pub contact_max_requests: u32,
    pub contact_window_secs: u64,
    pub sweep_interval: Duration,
}

#[derive(Debug, Clone)]
pub struct SwaggerConfig {
    pub username: Option<String>,
    pub password: Option<String>,
    pub title: String,
    pub version: String,
    pub description: String,
}

/// Read `key`, falling back to `default` when unset, and parse it
fn parse_env<T: FromStr>(key: &str, default: T) -> Result<T, String> {
    match env::var(key) {
        Ok(raw) => raw
            .trim()
            .parse::<T>()
            .map_err(|_| format!("{} must be a valid number", key)),
        Err(_) => Ok(default),
    }
}

impl Config {
    pub fn from_env() -> Result<Self, String> {
        // Load .env file if exists, ignore if not found (optional for production)
        if let Err(e) = dotenvy::dotenv() {
            if !e.to_string().contains("not found") {
                eprintln!("Warning: Error loading .env file: {}", e);
            }
        }

        Ok(Config {
            app: AppConfig::from_env()?,
            llm: LlmConfig::from_env()?,
            rate_limit: RateLimitConfig::from_env()?,
            swagger: SwaggerConfig::from_env()?,
        })
    }
}

impl AppConfig {
    pub fn from_env() -> Result<Self, String> {
        let host = env::var("HOST").unwrap_or_else(|_| "127.0.0.1".to_string());
        let port = env::var("PORT")
            .unwrap_or_else(|_| "3000".to_string())
            .parse::<u16>()
            .map_err(|e| format!("Invalid PORT: {}", e))?;

        // Parse CORS allowed origins from comma-separated string
        let cors_allowed_origins = env::var("CORS_ALLOWED_ORIGINS")
            .unwrap_or_else(|_| "*".to_string())
            .split(',')
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
            .collect();

        Ok(Self {
            host,
            port,
            cors_allowed_origins,
        })
    }

    pub fn server_address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

impl LlmConfig {
    const DEFAULT_BASE_URL: &'static str = "https://api.openai.com/v1";
    const DEFAULT_MODEL: &'static str = "gpt-4o-mini";
    const DEFAULT_MAX_TOKENS: u32 = 500;
    const DEFAULT_TEMPERATURE: f32 = 0.7;
    const DEFAULT_PACING_DELAY_MS: u64 = 85;
    const DEFAULT_CONNECT_TIMEOUT_SECS: u64 = 10;

    pub fn from_env() -> Result<Self, String> {
        let api_key = env::var("OPENAI_API_KEY")
            .ok()
            .filter(|s| !s.is_empty())
            .ok_or_else(|| "OPENAI_API_KEY environment variable is required".to_string())?;

        let base_url = env::var("OPENAI_BASE_URL")
            .unwrap_or_else(|_| Self::DEFAULT_BASE_URL.to_string())
            .trim_end_matches('/')
            .to_string();

        let model = env::var("OPENAI_MODEL").unwrap_or_else(|_| Self::DEFAULT_MODEL.to_string());

        let max_tokens = parse_env("CHAT_MAX_TOKENS", Self::DEFAULT_MAX_TOKENS)?;
        let temperature = parse_env("CHAT_TEMPERATURE", Self::DEFAULT_TEMPERATURE)?;
        let pacing_delay_ms = parse_env("CHAT_PACING_DELAY_MS", Self::DEFAULT_PACING_DELAY_MS)?;
        let connect_timeout_secs = parse_env(
            "LLM_CONNECT_TIMEOUT_SECS",
            Self::DEFAULT_CONNECT_TIMEOUT_SECS,
        )?;

        let company_name = env::var("ASSISTANT_COMPANY_NAME")
            .unwrap_or_else(|_| "Talento Consultores".to_string());

        Ok(Self {
            api_key,
            base_url,
            model,
            max_tokens,
            temperature,
            pacing_delay: Duration::from_millis(pacing_delay_ms),
            connect_timeout: Duration::from_secs(connect_timeout_secs),
            company_name,
        })
    }
}

impl RateLimitConfig {
    const DEFAULT_CHAT_MAX_REQUESTS: u32 = 10;
    const DEFAULT_CHAT_WINDOW_SECS: u64 = 60;
    const DEFAULT_CONTACT_MAX_REQUESTS: u32 = 3;
    const DEFAULT_CONTACT_WINDOW_SECS: u64 = 300;
    const DEFAULT_SWEEP_INTERVAL_SECS: u64 = 300; // 5 minutes
    const MAX_WINDOW_SECS: u64 = 86_400; // 1 day

    pub fn from_env() -> Result<Self, String> {
        let config = Self {
            chat_max_requests: parse_env("CHAT_RATE_LIMIT_MAX", Self::DEFAULT_CHAT_MAX_REQUESTS)?,
            chat_window_secs: parse_env(
                "CHAT_RATE_LIMIT_WINDOW_SECS",
                Self::DEFAULT_CHAT_WINDOW_SECS,
            )?,
            contact_max_requests: parse_env(
                "CONTACT_RATE_LIMIT_MAX",
                Self::DEFAULT_CONTACT_MAX_REQUESTS,
            )?,
            contact_window_secs: parse_env(
                "CONTACT_RATE_LIMIT_WINDOW_SECS",
                Self::DEFAULT_CONTACT_WINDOW_SECS,
            )?,
            sweep_interval: Duration::from_secs(parse_env(
                "RATE_LIMIT_SWEEP_INTERVAL_SECS",
                Self::DEFAULT_SWEEP_INTERVAL_SECS,
            )?),
        };

        config.validate()?;
        Ok(config)
    }

    fn validate(&self) -> Result<(), String> {
        let windows = [
            ("CHAT_RATE_LIMIT_WINDOW_SECS", self.chat_window_secs),
            ("CONTACT_RATE_LIMIT_WINDOW_SECS", self.contact_window_secs),
        ];
        if let Some((key, _)) = windows
            .iter()
            .find(|(_, value)| *value > Self::MAX_WINDOW_SECS)
        {
            return Err(format!(
                "{} must be at most {}",
                key,
                Self::MAX_WINDOW_SECS
            ));
        }

        let checks = [
            ("CHAT_RATE_LIMIT_MAX", self.chat_max_requests as u64),
            ("CHAT_RATE_LIMIT_WINDOW_SECS", self.chat_window_secs),
            ("CONTACT_RATE_LIMIT_MAX", self.contact_max_requests as u64),
            ("CONTACT_RATE_LIMIT_WINDOW_SECS", self.contact_window_secs),
            ("RATE_LIMIT_SWEEP_INTERVAL_SECS", self.sweep_interval.as_secs()),
        ];

        match checks.iter().find(|(_, value)| *value == 0) {
            Some((key, _)) => Err(format!("{} must be at least 1", key)),
            None => Ok(()),
        }
    }

    pub fn chat_policy(&self) -> RateLimitPolicy {
        RateLimitPolicy::new(PolicyKind::Chat, self.chat_max_requests, self.chat_window_secs)
    }

    pub fn contact_policy(&self) -> RateLimitPolicy {
        RateLimitPolicy::new(
            PolicyKind::Contact,
            self.contact_max_requests,
            self.contact_window_secs,
        )
    }
}

impl SwaggerConfig {
    pub fn from_env() -> Result<Self, String> {
        // Only use credentials if they are non-empty
        let username = env::var("SWAGGER_USERNAME").ok().filter(|s| !s.is_empty());
        let password = env::var("SWAGGER_PASSWORD").ok().filter(|s| !s.is_empty());
        let title = env::var("SWAGGER_TITLE").unwrap_or_else(|_| "Talento Gateway API".to_string());
        let version = env::var("SWAGGER_VERSION").unwrap_or_else(|_| "0.1.0".to_string());
        let description = env::var("SWAGGER_DESCRIPTION")
            .unwrap_or_else(|_| "Chat and contact gateway for the Talento website".to_string());

        Ok(Self {
            username,
            password,
            title,
            version,
            description,
        })
    }

    /// Returns credentials in "username:password" format if auth is enabled
    pub fn credentials(&self) -> Option<String> {
        match (&self.username, &self.password) {
            (Some(user), Some(pass)) => Some(format!("{}:{}", user, pass)),
            _ => None,
        }
    }
}
