//! Audit repository (审计数据访问)
//!
//! 持久化是尽力而为的：任何序列化或存储错误都只记录警告，不向调用方传播。

use std::sync::Arc;

use tracing::{debug, warn};

use super::storage::StateStorage;
use crate::models::audit::AuditLog;

#[derive(Clone)]
pub struct AuditRepository {
    storage: Arc<dyn StateStorage>,
    key: String,
}

impl AuditRepository {
    pub fn new(storage: Arc<dyn StateStorage>, key: impl Into<String>) -> Self {
        Self {
            storage,
            key: key.into(),
        }
    }

    pub fn key(&self) -> &str {
        &self.key
    }

    /// 读取持久化的审计日志；缺失、读取失败或内容损坏都返回空序列
    pub fn load_logs(&self) -> Vec<AuditLog> {
        let data = match self.storage.load(&self.key) {
            Ok(Some(data)) => data,
            Ok(None) => return Vec::new(),
            Err(e) => {
                record_failure("load");
                warn!(key = %self.key, code = e.code(), error = %e, "Failed to load audit logs");
                return Vec::new();
            }
        };

        match serde_json::from_str::<Vec<AuditLog>>(&data) {
            Ok(logs) => {
                debug!(key = %self.key, count = logs.len(), "Audit logs loaded");
                logs
            }
            Err(e) => {
                record_failure("decode");
                warn!(key = %self.key, error = %e, "Stored audit logs are malformed, starting empty");
                Vec::new()
            }
        }
    }

    /// 保存完整的审计日志快照，返回是否成功
    pub fn save_logs(&self, logs: &[AuditLog]) -> bool {
        let data = match serde_json::to_string(logs) {
            Ok(data) => data,
            Err(e) => {
                record_failure("encode");
                warn!(key = %self.key, error = %e, "Failed to serialize audit logs");
                return false;
            }
        };

        match self.storage.save(&self.key, &data) {
            Ok(()) => true,
            Err(e) => {
                record_failure("save");
                warn!(key = %self.key, code = e.code(), error = %e, "Failed to save audit logs");
                false
            }
        }
    }

    /// 删除持久化的审计日志，返回是否成功
    pub fn remove_logs(&self) -> bool {
        match self.storage.remove(&self.key) {
            Ok(()) => true,
            Err(e) => {
                record_failure("remove");
                warn!(key = %self.key, code = e.code(), error = %e, "Failed to remove audit logs");
                false
            }
        }
    }

    /// 清空持久化数据；删除失败时改写为空快照，重新打开后不会恢复旧日志
    pub fn clear_logs(&self) -> bool {
        self.remove_logs() || self.save_logs(&[])
    }
}

fn record_failure(op: &'static str) {
    metrics::counter!("audit_persist_failures_total", "op" => op).increment(1);
}
