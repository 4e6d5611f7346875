//! 配置系统
//! 从环境变量加载所有配置（前缀 AMPERE_）

use config::{Config, ConfigError, Environment};
use serde::Deserialize;

#[derive(Debug, Clone, Deserialize)]
pub struct LoggingConfig {
    /// 日志级别: trace, debug, info, warn, error
    pub level: String,
    /// 日志格式: json, pretty
    pub format: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct AuditConfig {
    /// 审计日志持久化目录
    pub data_dir: String,
    /// 持久化键名（文件名不含扩展名）
    pub storage_key: String,
    /// 未提供时使用的来源地址
    pub default_ip_address: String,
    /// 未提供时使用的 User-Agent
    pub default_user_agent: String,
    /// 摘要中最近活动条数
    pub recent_activity_limit: usize,
    /// 摘要中活跃用户排行条数
    pub top_users_limit: usize,
}

impl Default for AuditConfig {
    fn default() -> Self {
        Self {
            data_dir: "./data".to_string(),
            storage_key: "ampere_audit_logs".to_string(),
            default_ip_address: "localhost".to_string(),
            default_user_agent: concat!("ampere-access/", env!("CARGO_PKG_VERSION")).to_string(),
            recent_activity_limit: 20,
            top_users_limit: 10,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
    pub logging: LoggingConfig,
    pub audit: AuditConfig,
}

impl AppConfig {
    /// 从环境变量加载配置
    pub fn from_env() -> Result<Self, ConfigError> {
        let defaults = AuditConfig::default();
        let mut settings = Config::builder();

        // 添加默认配置
        settings = settings
            .set_default("logging.level", "info")?
            .set_default("logging.format", "pretty")?
            .set_default("audit.data_dir", defaults.data_dir)?
            .set_default("audit.storage_key", defaults.storage_key)?
            .set_default("audit.default_ip_address", defaults.default_ip_address)?
            .set_default("audit.default_user_agent", defaults.default_user_agent)?
            .set_default("audit.recent_activity_limit", defaults.recent_activity_limit as i64)?
            .set_default("audit.top_users_limit", defaults.top_users_limit as i64)?;

        settings = settings.add_source(
            Environment::with_prefix("AMPERE")
                .prefix_separator("_")
                .separator("__")
                .try_parsing(true),
        );

        let config: AppConfig = settings.build()?.try_deserialize()?;

        config.validate()?;

        Ok(config)
    }

    /// 验证配置合法性
    fn validate(&self) -> Result<(), ConfigError> {
        match self.logging.level.to_lowercase().as_str() {
            "trace" | "debug" | "info" | "warn" | "error" => {}
            _ => {
                return Err(ConfigError::Message(format!(
                    "Invalid log level: {}. Must be one of: trace, debug, info, warn, error",
                    self.logging.level
                )))
            }
        }

        match self.logging.format.to_lowercase().as_str() {
            "json" | "pretty" => {}
            _ => {
                return Err(ConfigError::Message(format!(
                    "Invalid log format: {}. Must be one of: json, pretty",
                    self.logging.format
                )))
            }
        }

        // 键名会成为文件名
        let key = self.audit.storage_key.trim();
        if key.is_empty() || key.contains(['/', '\\']) || key.starts_with('.') {
            return Err(ConfigError::Message(format!(
                "Invalid audit storage key: {:?}",
                self.audit.storage_key
            )));
        }

        if !(1..=500).contains(&self.audit.recent_activity_limit) {
            return Err(ConfigError::Message(
                "recent_activity_limit must be between 1 and 500".to_string(),
            ));
        }

        if !(1..=100).contains(&self.audit.top_users_limit) {
            return Err(ConfigError::Message(
                "top_users_limit must be between 1 and 100".to_string(),
            ));
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serial_test::serial;

    const VARS: [&str; 5] = [
        "AMPERE_LOGGING__LEVEL",
        "AMPERE_LOGGING__FORMAT",
        "AMPERE_AUDIT__STORAGE_KEY",
        "AMPERE_AUDIT__RECENT_ACTIVITY_LIMIT",
        "AMPERE_AUDIT__TOP_USERS_LIMIT",
    ];

    fn clear_env() {
        for var in VARS {
            std::env::remove_var(var);
        }
    }

    #[test]
    #[serial]
    fn test_config_defaults() {
        clear_env();

        let config = AppConfig::from_env().unwrap();
        assert_eq!(config.logging.level, "info");
        assert_eq!(config.audit.storage_key, "ampere_audit_logs");
        assert_eq!(config.audit.default_ip_address, "localhost");
        assert_eq!(config.audit.recent_activity_limit, 20);
        assert_eq!(config.audit.top_users_limit, 10);
    }

    #[test]
    #[serial]
    fn test_config_env_override() {
        clear_env();
        std::env::set_var("AMPERE_AUDIT__TOP_USERS_LIMIT", "5");

        let config = AppConfig::from_env().unwrap();
        assert_eq!(config.audit.top_users_limit, 5);

        clear_env();
    }

    #[test]
    #[serial]
    fn test_config_validation_invalid_log_level() {
        clear_env();
        std::env::set_var("AMPERE_LOGGING__LEVEL", "invalid");

        assert!(AppConfig::from_env().is_err());

        clear_env();
    }

    #[test]
    #[serial]
    fn test_config_validation_storage_key_path() {
        clear_env();
        std::env::set_var("AMPERE_AUDIT__STORAGE_KEY", "../escape");

        assert!(AppConfig::from_env().is_err());

        clear_env();
    }

    #[test]
    #[serial]
    fn test_config_validation_zero_limit() {
        clear_env();
        std::env::set_var("AMPERE_AUDIT__RECENT_ACTIVITY_LIMIT", "0");

        assert!(AppConfig::from_env().is_err());

        clear_env();
    }
}
