use config::{Config, ConfigError, File};
use serde::{Deserialize, Serialize};

/// 应用配置
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    pub server: ServerConfig,
    pub database: DatabaseConfig,
    pub llm: LlmConfig,
    pub extraction: ExtractionConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DatabaseConfig {
    /// "memory" 表示使用内存存储
    pub url: String,
    pub max_connections: u32,
    pub acquire_timeout_secs: u64,
    /// 超过该耗时的语句以 warn 级别记录
    pub slow_statement_secs: u64,
}

impl DatabaseConfig {
    pub fn is_memory(&self) -> bool {
        self.url == "memory"
    }
}

#[derive(Clone, Serialize, Deserialize)]
pub struct LlmConfig {
    pub api_key: Option<String>,
    pub base_url: String,
    pub text_model: String,
    pub vision_model: String,
    pub timeout_secs: u64,
}

// 不打印 api_key
impl std::fmt::Debug for LlmConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LlmConfig")
            .field("api_key", &self.api_key.as_ref().map(|_| "***"))
            .field("base_url", &self.base_url)
            .field("text_model", &self.text_model)
            .field("vision_model", &self.vision_model)
            .field("timeout_secs", &self.timeout_secs)
            .finish()
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExtractionConfig {
    /// true = 文本+页面图像, false = 仅文本
    pub use_vision: bool,
    pub pdfium_library_path: Option<String>,
    pub render_dpi: f32,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            server: ServerConfig {
                host: "127.0.0.1".to_string(),
                port: 8080,
            },
            database: DatabaseConfig {
                url: "postgres://localhost/procuro".to_string(),
                max_connections: 10,
                acquire_timeout_secs: 10,
                slow_statement_secs: 2,
            },
            llm: LlmConfig {
                api_key: None,
                base_url: "https://api.openai.com/v1".to_string(),
                text_model: "gpt-5-mini".to_string(),
                vision_model: "gpt-4o".to_string(),
                timeout_secs: 120,
            },
            extraction: ExtractionConfig {
                use_vision: true,
                pdfium_library_path: None,
                render_dpi: 150.0,
            },
        }
    }
}

fn env(name: &str) -> Option<String> {
    std::env::var(name).ok().filter(|v| !v.trim().is_empty())
}

impl AppConfig {
    /// 默认值 -> 可选 procuro.toml -> 环境变量
    pub fn load() -> Result<Self, ConfigError> {
        let defaults = Config::try_from(&AppConfig::default())?;

        Config::builder()
            .add_source(defaults)
            .add_source(File::with_name("procuro").required(false))
            .set_override_option("server.host", env("SERVER_HOST"))?
            .set_override_option("server.port", env("SERVER_PORT"))?
            .set_override_option("database.url", env("DATABASE_URL"))?
            .set_override_option("database.max_connections", env("DATABASE_MAX_CONNECTIONS"))?
            .set_override_option("llm.api_key", env("OPENAI_API_KEY"))?
            .set_override_option("llm.base_url", env("OPENAI_BASE_URL"))?
            .set_override_option("llm.text_model", env("LLM_TEXT_MODEL"))?
            .set_override_option("llm.vision_model", env("LLM_VISION_MODEL"))?
            .set_override_option("llm.timeout_secs", env("LLM_TIMEOUT_SECS"))?
            .set_override_option("extraction.use_vision", env("USE_VISION"))?
            .set_override_option("extraction.pdfium_library_path", env("PDFIUM_LIBRARY_PATH"))?
            .set_override_option("extraction.render_dpi", env("RENDER_DPI"))?
            .build()?
            .try_deserialize()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_documented_values() {
        let config = AppConfig::default();
        assert_eq!(config.llm.text_model, "gpt-5-mini");
        assert_eq!(config.llm.vision_model, "gpt-4o");
        assert!(config.extraction.use_vision);
        assert_eq!(config.extraction.render_dpi, 150.0);
        assert!(!config.database.is_memory());
    }

    #[test]
    fn debug_output_hides_api_key() {
        let mut config = AppConfig::default();
        config.llm.api_key = Some("sk-secret".to_string());
        let printed = format!("{:?}", config);
        assert!(!printed.contains("sk-secret"));
    }
}
