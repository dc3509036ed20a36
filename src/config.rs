use crate::error::{Error, Result};
use dotenvy::dotenv;
use std::env;
use std::sync::OnceLock;

#[derive(Debug, Clone)]
pub struct Config {
    pub content_api_url: String,
    pub content_api_key: Option<String>,
    pub grading_api_key: String,
    pub grading_model: String,
    pub http_timeout_seconds: u64,
}

pub static CONFIG: OnceLock<Config> = OnceLock::new();

impl Config {
    pub fn from_env() -> Result<Self> {
        dotenv().ok();

        Ok(Self {
            content_api_url: get_env("CONTENT_API_URL")?,
            content_api_key: env::var("CONTENT_API_KEY").ok(),
            grading_api_key: get_env("GRADING_API_KEY")?,
            grading_model: env::var("GRADING_MODEL").unwrap_or_else(|_| "gpt-4o".to_string()),
            http_timeout_seconds: match env::var("HTTP_TIMEOUT_SECONDS") {
                Ok(raw) => raw.parse().map_err(|e| {
                    Error::Config(format!("Invalid value for HTTP_TIMEOUT_SECONDS: {}", e))
                })?,
                Err(_) => 60,
            },
        })
    }
}

fn get_env(name: &str) -> Result<String> {
    env::var(name).map_err(|_| Error::Config(format!("Missing environment variable: {}", name)))
}

pub fn init_config() -> Result<()> {
    let config = Config::from_env()?;
    CONFIG
        .set(config)
        .map_err(|_| Error::Config("Configuration has already been initialized".to_string()))?;
    Ok(())
}

pub fn get_config() -> &'static Config {
    CONFIG
        .get()
        .expect("Configuration has not been initialized")
}
