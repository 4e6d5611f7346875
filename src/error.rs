//! 统一错误模型
//! 授权检查只返回布尔值，这里的错误只来自配置、持久化和调用方误用

use thiserror::Error;

/// 应用错误类型
#[derive(Debug, Error)]
pub enum AppError {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Storage error: {0}")]
    Storage(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Unknown role: {0}")]
    InvalidRole(String),
}

impl AppError {
    /// 获取错误码（用于日志字段）
    pub fn code(&self) -> &'static str {
        match self {
            AppError::Config(_) => "config",
            AppError::Storage(_) => "storage",
            AppError::Serialization(_) => "serialization",
            AppError::InvalidRole(_) => "invalid_role",
        }
    }
}

/// 从 String 转换为 AppError::Config
impl From<String> for AppError {
    fn from(s: String) -> Self {
        AppError::Config(s)
    }
}

/// 从 config::ConfigError 转换
impl From<config::ConfigError> for AppError {
    fn from(e: config::ConfigError) -> Self {
        AppError::Config(e.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_codes() {
        assert_eq!(AppError::Config("x".to_string()).code(), "config");
        assert_eq!(AppError::InvalidRole("x".to_string()).code(), "invalid_role");
    }

    #[test]
    fn test_io_error_converts_to_storage() {
        let io = std::io::Error::new(std::io::ErrorKind::PermissionDenied, "read-only");
        let err: AppError = io.into();
        assert_eq!(err.code(), "storage");
        assert!(err.to_string().contains("read-only"));
    }

    #[test]
    fn test_serde_error_converts_to_serialization() {
        let err: AppError = serde_json::from_str::<u32>("not json").unwrap_err().into();
        assert_eq!(err.code(), "serialization");
    }
}
