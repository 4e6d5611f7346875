//! 审计日志存储
//!
//! 只追加的内存序列（最新在前），每次变更后整体持久化。
//! 持久化失败只记录警告，内存状态在进程生命周期内始终是唯一可信来源。
//! 存储本身不做授权检查，清空等操作由调用方先通过 PermissionService 校验。

use std::collections::{BTreeMap, HashMap, VecDeque};
use std::sync::{Arc, RwLock, RwLockReadGuard, RwLockWriteGuard};

use chrono::{DateTime, Duration, Local, TimeZone, Utc};
use serde_json::Value;
use tracing::{debug, info};
use uuid::Uuid;

use crate::{
    config::AuditConfig,
    error::AppError,
    models::{audit::*, user::User},
    repository::{audit_repo::AuditRepository, storage::FileStorage},
    services::change_detector::{ChangeDetector, BOOKKEEPING_FIELDS},
};

/// Time source for entry timestamps and summary windows
pub trait Clock: Send + Sync {
    fn now(&self) -> DateTime<Utc>;
}

/// 系统时钟
#[derive(Debug, Default, Clone, Copy)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }
}

/// 审计日志参数结构体
#[derive(Debug, Clone, Default)]
pub struct AuditLogParams<'a> {
    pub entity_name: Option<&'a str>,
    pub old_data: Option<&'a Value>,
    pub new_data: Option<&'a Value>,
    pub details: Option<&'a str>,
    /// Extra fields to leave out of the diff; bookkeeping fields are always left out
    pub exclude_fields: &'a [&'a str],
    pub ip_address: Option<&'a str>,
    pub user_agent: Option<&'a str>,
}

/// 构建一条尚未写入的审计日志
///
/// 只有同时提供新旧快照时才计算字段变更。
pub fn create_audit_log(
    actor: &User,
    action: AuditAction,
    entity_type: AuditEntityType,
    entity_id: &str,
    params: AuditLogParams<'_>,
) -> NewAuditLog {
    let changes = match (params.old_data, params.new_data) {
        (Some(old), Some(new)) => {
            let exclude: Vec<&str> = BOOKKEEPING_FIELDS
                .iter()
                .chain(params.exclude_fields)
                .copied()
                .collect();
            Some(ChangeDetector::diff(Some(old), Some(new), &exclude))
        }
        _ => None,
    };

    NewAuditLog {
        actor: AuditActor::from(actor),
        action,
        entity_type,
        entity_id: entity_id.to_string(),
        entity_name: params.entity_name.map(str::to_string),
        changes,
        details: params.details.map(str::to_string),
        ip_address: params.ip_address.map(str::to_string),
        user_agent: params.user_agent.map(str::to_string),
    }
}

/// `LOG-<unix millis>-<uuid v4>`
fn generate_log_id(timestamp: DateTime<Utc>) -> String {
    format!("LOG-{}-{}", timestamp.timestamp_millis(), Uuid::new_v4().simple())
}

pub struct AuditLogStore {
    logs: RwLock<VecDeque<AuditLog>>,
    repository: AuditRepository,
    clock: Arc<dyn Clock>,
    config: AuditConfig,
}

impl AuditLogStore {
    /// 创建存储并从持久化层加载已有日志
    pub fn open(repository: AuditRepository, config: AuditConfig) -> Self {
        let logs: VecDeque<AuditLog> = repository.load_logs().into();

        info!(key = %repository.key(), count = logs.len(), "Audit log store opened");

        Self {
            logs: RwLock::new(logs),
            repository,
            clock: Arc::new(SystemClock),
            config,
        }
    }

    /// 使用配置中的本地目录作为持久化后端
    pub fn from_config(config: &AuditConfig) -> Self {
        let storage = Arc::new(FileStorage::new(&config.data_dir));
        let repository = AuditRepository::new(storage, config.storage_key.clone());
        Self::open(repository, config.clone())
    }

    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    fn read(&self) -> RwLockReadGuard<'_, VecDeque<AuditLog>> {
        self.logs.read().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    fn write(&self) -> RwLockWriteGuard<'_, VecDeque<AuditLog>> {
        self.logs.write().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    /// 记录审计日志条目
    pub fn append(
        &self,
        actor: &User,
        action: AuditAction,
        entity_type: AuditEntityType,
        entity_id: &str,
        params: AuditLogParams<'_>,
    ) -> AuditLog {
        self.add(create_audit_log(actor, action, entity_type, entity_id, params))
    }

    /// 写入已构建的条目：分配 ID 与时间戳，补全上下文默认值，置于序列最前
    pub fn add(&self, new_log: NewAuditLog) -> AuditLog {
        let timestamp = self.clock.now();
        let log = AuditLog {
            id: generate_log_id(timestamp),
            timestamp,
            user_id: new_log.actor.id,
            user_role: new_log.actor.role,
            user_name: new_log.actor.name,
            action: new_log.action,
            entity_type: new_log.entity_type,
            entity_id: new_log.entity_id,
            entity_name: new_log.entity_name,
            changes: new_log.changes,
            details: new_log.details,
            ip_address: Some(
                new_log
                    .ip_address
                    .unwrap_or_else(|| self.config.default_ip_address.clone()),
            ),
            user_agent: Some(
                new_log
                    .user_agent
                    .unwrap_or_else(|| self.config.default_user_agent.clone()),
            ),
        };

        {
            let mut logs = self.write();
            logs.push_front(log.clone());
            self.repository.save_logs(logs.make_contiguous());
        }

        metrics::counter!("audit_logs_appended_total", "action" => log.action.as_str())
            .increment(1);
        debug!(
            id = %log.id,
            user_id = %log.user_id,
            action = %log.action,
            entity_type = %log.entity_type,
            entity_id = %log.entity_id,
            changes = log.changes.as_ref().map_or(0, Vec::len),
            "Audit log appended"
        );

        log
    }

    /// 查询审计日志（最新在前）；没有过滤条件时返回全部
    pub fn query(&self, filter: Option<&AuditLogFilter>) -> Vec<AuditLog> {
        let logs = self.read();
        match filter {
            Some(filter) => logs.iter().filter(|log| filter.matches(log)).cloned().collect(),
            None => logs.iter().cloned().collect(),
        }
    }

    /// 汇总统计，完全由 `query(None)` 推导
    pub fn summary(&self) -> AuditLogSummary {
        let logs = self.query(None);
        let now = self.clock.now();

        let today = start_of_local_day(now);
        let week_ago = now - Duration::days(7);
        let month_ago = now - Duration::days(30);

        let count_since =
            |cutoff: DateTime<Utc>| logs.iter().filter(|l| l.timestamp >= cutoff).count();

        let mut by_action = BTreeMap::new();
        let mut by_entity_type = BTreeMap::new();
        let mut by_user: Vec<UserActivity> = Vec::new();
        let mut user_index: HashMap<&str, usize> = HashMap::new();

        for log in &logs {
            *by_action.entry(log.action).or_insert(0) += 1;
            *by_entity_type.entry(log.entity_type).or_insert(0) += 1;

            match user_index.get(log.user_id.as_str()) {
                Some(&i) => by_user[i].count += 1,
                None => {
                    user_index.insert(&log.user_id, by_user.len());
                    by_user.push(UserActivity {
                        user_id: log.user_id.clone(),
                        user_name: log.user_name.clone(),
                        count: 1,
                    });
                }
            }
        }

        // 稳定排序：次数相同保持首次出现顺序
        by_user.sort_by(|a, b| b.count.cmp(&a.count));
        by_user.truncate(self.config.top_users_limit);

        AuditLogSummary {
            total_logs: logs.len(),
            today_logs: count_since(today),
            week_logs: count_since(week_ago),
            month_logs: count_since(month_ago),
            by_action,
            by_entity_type,
            by_user,
            recent_activity: logs
                .iter()
                .take(self.config.recent_activity_limit)
                .cloned()
                .collect(),
        }
    }

    /// 以格式化 JSON 导出过滤后的日志
    pub fn export(&self, filter: Option<&AuditLogFilter>) -> Result<String, AppError> {
        let logs = self.query(filter);
        Ok(serde_json::to_string_pretty(&logs)?)
    }

    /// 清空内存序列与持久化数据（不可恢复）
    pub fn clear(&self) {
        let removed = {
            let mut logs = self.write();
            let removed = logs.len();
            logs.clear();
            self.repository.clear_logs();
            removed
        };

        metrics::counter!("audit_logs_cleared_total").increment(1);
        info!(removed, "Audit logs cleared");
    }

    /// 将当前内存状态重新写入持久化层
    pub fn flush(&self) -> bool {
        let mut logs = self.write();
        self.repository.save_logs(logs.make_contiguous())
    }

    pub fn get_by_id(&self, id: &str) -> Option<AuditLog> {
        self.read().iter().find(|log| log.id == id).cloned()
    }

    pub fn get_by_entity(&self, entity_type: AuditEntityType, entity_id: &str) -> Vec<AuditLog> {
        self.read()
            .iter()
            .filter(|log| log.entity_type == entity_type && log.entity_id == entity_id)
            .cloned()
            .collect()
    }

    pub fn get_by_user(&self, user_id: &str) -> Vec<AuditLog> {
        self.read()
            .iter()
            .filter(|log| log.user_id == user_id)
            .cloned()
            .collect()
    }

    pub fn len(&self) -> usize {
        self.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.read().is_empty()
    }
}

/// 本地日历日的零点（UTC 表示）
fn start_of_local_day(now: DateTime<Utc>) -> DateTime<Utc> {
    let Some(midnight) = now.with_timezone(&Local).date_naive().and_hms_opt(0, 0, 0) else {
        return now;
    };
    match Local.from_local_datetime(&midnight).earliest() {
        Some(local) => local.with_timezone(&Utc),
        // 零点恰好落在夏令时跳变中
        None => Utc.from_utc_datetime(&midnight),
    }
}
