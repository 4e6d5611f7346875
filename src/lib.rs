//! 权限与审计核心库
//! 提供角色权限模型、权限检查服务、字段变更检测与审计日志存储

pub mod config;
pub mod error;
pub mod models;
pub mod repository;
pub mod services;
pub mod telemetry;
