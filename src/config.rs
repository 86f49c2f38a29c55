//! Process-wide configuration, read once from the environment.
//!
//! An optional `.env` file is loaded first. Nothing here is global: build an
//! [`AppConfig`] at startup and hand the pieces to gateways and tools.

use crate::error::{DispatchError, Result};
use std::str::FromStr;
use std::time::Duration;
use tracing::debug;

const DEFAULT_TIMEOUT_SECS: u64 = 30;
const DEFAULT_MAX_TOOL_ITERATIONS: usize = 8;

/// Credentials and base URL for one HTTP service
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Endpoint {
    pub api_key: String,
    pub base_url: String,
}

impl Endpoint {
    pub fn new(api_key: impl Into<String>, base_url: impl Into<String>) -> Self {
        Self {
            api_key: api_key.into(),
            base_url: base_url.into(),
        }
    }

    fn from_env(key_var: &str, url_var: &str, default_url: &str) -> Self {
        Self {
            api_key: std::env::var(key_var).unwrap_or_default(),
            base_url: std::env::var(url_var)
                .ok()
                .filter(|url| !url.trim().is_empty())
                .unwrap_or_else(|| default_url.to_string()),
        }
    }

    pub fn has_api_key(&self) -> bool {
        !self.api_key.trim().is_empty()
    }
}

/// OpenAI-compatible chat platforms the assistant can talk to
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Platform {
    OpenAi,
    Zhipu,
}

impl Platform {
    pub fn models(self) -> &'static [&'static str] {
        match self {
            Platform::OpenAi => &["gpt-4o-mini", "gpt-3.5-turbo"],
            Platform::Zhipu => &["glm-4-flash", "glm-4"],
        }
    }

    pub fn default_model(self) -> &'static str {
        self.models()[0]
    }

    /// The requested model if the platform serves it, otherwise its default
    pub fn resolve_model(self, requested: &str) -> &'static str {
        self.models()
            .iter()
            .copied()
            .find(|m| *m == requested)
            .unwrap_or_else(|| self.default_model())
    }
}

impl FromStr for Platform {
    type Err = DispatchError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_lowercase().as_str() {
            "openai" => Ok(Platform::OpenAi),
            "zhipu" | "zhipuai" => Ok(Platform::Zhipu),
            other => Err(DispatchError::ConfigError(format!("unknown platform '{}'", other))),
        }
    }
}

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub openai: Endpoint,
    pub zhipu: Endpoint,
    pub search: Endpoint,
    pub weather: Endpoint,
    pub exchange_rate: Endpoint,
    pub request_timeout: Duration,
    pub max_tool_iterations: usize,
}

impl AppConfig {
    /// Load `.env` (if present) and read the configuration from the environment
    pub fn from_env() -> Result<Self> {
        if let Ok(path) = dotenv::dotenv() {
            debug!(path = %path.display(), "Loaded environment file");
        }
        Self::from_current_env()
    }

    /// Read the configuration from the current process environment only
    pub fn from_current_env() -> Result<Self> {
        let timeout_secs = parse_var("REQUEST_TIMEOUT_SECS", DEFAULT_TIMEOUT_SECS)?;
        let max_tool_iterations = parse_var("MAX_TOOL_ITERATIONS", DEFAULT_MAX_TOOL_ITERATIONS)?;

        if timeout_secs == 0 {
            return Err(DispatchError::ConfigError(
                "REQUEST_TIMEOUT_SECS must be greater than zero".to_string(),
            ));
        }
        if max_tool_iterations == 0 {
            return Err(DispatchError::ConfigError(
                "MAX_TOOL_ITERATIONS must be greater than zero".to_string(),
            ));
        }

        Ok(Self {
            openai: Endpoint::from_env(
                "OPENAI_API_KEY",
                "OPENAI_BASE_URL",
                "https://api.openai.com/v1",
            ),
            zhipu: Endpoint::from_env(
                "ZHIPU_API_KEY",
                "ZHIPU_BASE_URL",
                "https://open.bigmodel.cn/api/paas/v4",
            ),
            search: Endpoint::from_env(
                "QIANFAN_API_KEY",
                "QIANFAN_SEARCH_URL",
                "https://qianfan.baidubce.com/v2/ai_search",
            ),
            weather: Endpoint::from_env(
                "OPENWEATHER_API_KEY",
                "OPENWEATHER_BASE_URL",
                "http://api.openweathermap.org",
            ),
            exchange_rate: Endpoint::from_env(
                "JUHE_API_KEY",
                "JUHE_EXCHANGE_URL",
                "http://web.juhe.cn/finance/exchange/rmbquot",
            ),
            request_timeout: Duration::from_secs(timeout_secs),
            max_tool_iterations,
        })
    }

    /// Chat endpoint for a platform
    pub fn platform(&self, platform: Platform) -> &Endpoint {
        match platform {
            Platform::OpenAi => &self.openai,
            Platform::Zhipu => &self.zhipu,
        }
    }

    /// First platform with an API key, OpenAI before Zhipu
    pub fn default_platform(&self) -> Result<Platform> {
        [Platform::OpenAi, Platform::Zhipu]
            .into_iter()
            .find(|p| self.platform(*p).has_api_key())
            .ok_or_else(|| {
                DispatchError::ConfigError(
                    "set OPENAI_API_KEY or ZHIPU_API_KEY to choose a chat platform".to_string(),
                )
            })
    }
}

fn parse_var<T: FromStr>(name: &str, default: T) -> Result<T> {
    match std::env::var(name) {
        Ok(raw) if !raw.trim().is_empty() => raw.trim().parse().map_err(|_| {
            DispatchError::ConfigError(format!("{} is not a valid number: '{}'", name, raw))
        }),
        _ => Ok(default),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;

    // Environment variables are process-wide; serialize the tests touching them.
    static ENV_LOCK: Mutex<()> = Mutex::new(());

    const VARS: [&str; 4] =
        ["REQUEST_TIMEOUT_SECS", "MAX_TOOL_ITERATIONS", "OPENAI_BASE_URL", "OPENAI_API_KEY"];

    fn clear_vars() {
        for var in VARS {
            std::env::remove_var(var);
        }
    }

    #[test]
    fn test_defaults() {
        let _guard = ENV_LOCK.lock().unwrap_or_else(|e| e.into_inner());
        clear_vars();

        let config = AppConfig::from_current_env().unwrap();
        assert_eq!(config.openai.base_url, "https://api.openai.com/v1");
        assert!(!config.openai.has_api_key());
        assert_eq!(config.request_timeout, Duration::from_secs(30));
        assert_eq!(config.max_tool_iterations, 8);
    }

    #[test]
    fn test_overrides_from_env() {
        let _guard = ENV_LOCK.lock().unwrap_or_else(|e| e.into_inner());
        clear_vars();
        std::env::set_var("OPENAI_API_KEY", "sk-test");
        std::env::set_var("OPENAI_BASE_URL", "https://proxy.example.com/v1");
        std::env::set_var("REQUEST_TIMEOUT_SECS", "5");
        std::env::set_var("MAX_TOOL_ITERATIONS", "3");

        let config = AppConfig::from_current_env().unwrap();
        clear_vars();

        assert_eq!(config.openai, Endpoint::new("sk-test", "https://proxy.example.com/v1"));
        assert_eq!(config.platform(Platform::OpenAi).api_key, "sk-test");
        assert_eq!(config.request_timeout, Duration::from_secs(5));
        assert_eq!(config.max_tool_iterations, 3);
    }

    #[test]
    fn test_malformed_number_is_config_error() {
        let _guard = ENV_LOCK.lock().unwrap_or_else(|e| e.into_inner());
        clear_vars();
        std::env::set_var("MAX_TOOL_ITERATIONS", "many");

        let result = AppConfig::from_current_env();
        clear_vars();

        assert!(matches!(result, Err(DispatchError::ConfigError(_))));
    }

    #[test]
    fn test_zero_timeout_rejected() {
        let _guard = ENV_LOCK.lock().unwrap_or_else(|e| e.into_inner());
        clear_vars();
        std::env::set_var("REQUEST_TIMEOUT_SECS", "0");

        let result = AppConfig::from_current_env();
        clear_vars();

        assert!(result.is_err());
    }

    #[test]
    fn test_default_platform_prefers_openai() {
        let mut config = AppConfig {
            openai: Endpoint::new("", "https://api.openai.com/v1"),
            zhipu: Endpoint::new("", "https://open.bigmodel.cn/api/paas/v4"),
            search: Endpoint::new("", "http://localhost"),
            weather: Endpoint::new("", "http://localhost"),
            exchange_rate: Endpoint::new("", "http://localhost"),
            request_timeout: Duration::from_secs(30),
            max_tool_iterations: 8,
        };
        assert!(config.default_platform().is_err());

        config.zhipu.api_key = "zhipu-key".to_string();
        assert_eq!(config.default_platform().unwrap(), Platform::Zhipu);

        config.openai.api_key = "sk-test".to_string();
        assert_eq!(config.default_platform().unwrap(), Platform::OpenAi);
    }

    #[test]
    fn test_platform_from_str() {
        assert_eq!("openai".parse::<Platform>().unwrap(), Platform::OpenAi);
        assert_eq!("ZhipuAI".parse::<Platform>().unwrap(), Platform::Zhipu);
        assert!("anthropic".parse::<Platform>().is_err());
    }

    #[test]
    fn test_platform_model_fallback() {
        assert_eq!(Platform::OpenAi.resolve_model("gpt-3.5-turbo"), "gpt-3.5-turbo");
        assert_eq!(Platform::OpenAi.resolve_model("glm-4"), "gpt-4o-mini");
        assert_eq!(Platform::Zhipu.resolve_model("gpt-4o-mini"), "glm-4-flash");
        assert_eq!(Platform::Zhipu.resolve_model("glm-4"), "glm-4");
    }
}
