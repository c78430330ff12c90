use serde::Deserialize;
use std::env;

#[derive(Debug, Deserialize, Clone)]
pub struct Config {
    pub server: ServerConfig,
    pub auth: AuthConfig,
    pub payments: PaymentsConfig,
    pub business_rules: BusinessRules,
    pub chat: ChatConfig,
}

#[derive(Debug, Deserialize, Clone)]
pub struct ServerConfig {
    pub port: u16,
}

#[derive(Debug, Deserialize, Clone)]
pub struct AuthConfig {
    pub jwt_secret: String,
}

#[derive(Debug, Deserialize, Clone)]
pub struct PaymentsConfig {
    pub webhook_secret: String,
}

#[derive(Debug, Deserialize, Clone)]
pub struct BusinessRules {
    #[serde(default = "default_write_attempts")]
    pub max_write_attempts: u32,
    #[serde(default = "default_page_size")]
    pub default_page_size: u32,
    #[serde(default = "default_max_page_size")]
    pub max_page_size: u32,
}

fn default_write_attempts() -> u32 { 5 }
fn default_page_size() -> u32 { 10 }
fn default_max_page_size() -> u32 { 100 }

impl Default for BusinessRules {
    fn default() -> Self {
        Self {
            max_write_attempts: default_write_attempts(),
            default_page_size: default_page_size(),
            max_page_size: default_max_page_size(),
        }
    }
}

#[derive(Debug, Deserialize, Clone)]
pub struct ChatConfig {
    #[serde(default = "default_category")]
    pub default_category: String,
    #[serde(default = "default_auto_reply")]
    pub auto_reply: bool,
}

fn default_category() -> String { "operation".to_string() }
fn default_auto_reply() -> bool { true }

impl Default for ChatConfig {
    fn default() -> Self {
        Self {
            default_category: default_category(),
            auto_reply: default_auto_reply(),
        }
    }
}

impl Config {
    pub fn load() -> Result<Self, config::ConfigError> {
        let run_mode = env::var("RUN_MODE").unwrap_or_else(|_| "development".into());

        let s = config::Config::builder()
            .set_default("server.port", 8080)?
            .set_default("business_rules.max_write_attempts", default_write_attempts() as i64)?
            .set_default("business_rules.default_page_size", default_page_size() as i64)?
            .set_default("business_rules.max_page_size", default_max_page_size() as i64)?
            .set_default("chat.default_category", default_category())?
            .set_default("chat.auto_reply", default_auto_reply())?
            .add_source(config::File::with_name("config/default").required(false))
            .add_source(config::File::with_name(&format!("config/{}", run_mode)).required(false))
            // local overrides, never checked in
            .add_source(config::File::with_name("config/local").required(false))
            // e.g. FERRY_AUTH__JWT_SECRET=...
            .add_source(config::Environment::with_prefix("FERRY").separator("__"))
            .build()?;

        s.try_deserialize()
    }
}
