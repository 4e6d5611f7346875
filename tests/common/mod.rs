//! 测试公共模块
//! 提供测试辅助函数和测试工具

#![allow(dead_code)]

use std::sync::{Arc, Mutex};

use ampere_access::{
    config::AuditConfig,
    models::{project::Project, role::Role, user::User},
    repository::{AuditRepository, MemoryStorage, StateStorage},
    services::{AuditLogStore, Clock},
};
use chrono::{DateTime, Duration, Utc};

pub const TEST_STORAGE_KEY: &str = "ampere_audit_logs_test";

/// 可手动推进的时钟
pub struct ManualClock {
    now: Mutex<DateTime<Utc>>,
}

impl ManualClock {
    pub fn new(now: DateTime<Utc>) -> Arc<Self> {
        Arc::new(Self {
            now: Mutex::new(now),
        })
    }

    pub fn set(&self, now: DateTime<Utc>) {
        *self.now.lock().unwrap() = now;
    }

    pub fn advance(&self, by: Duration) {
        *self.now.lock().unwrap() += by;
    }
}

impl Clock for ManualClock {
    fn now(&self) -> DateTime<Utc> {
        *self.now.lock().unwrap()
    }
}

/// 创建测试用审计配置
pub fn create_test_audit_config() -> AuditConfig {
    AuditConfig {
        data_dir: std::env::temp_dir()
            .join(format!("ampere-test-{}", uuid::Uuid::new_v4()))
            .to_string_lossy()
            .into_owned(),
        storage_key: TEST_STORAGE_KEY.to_string(),
        default_ip_address: "localhost".to_string(),
        default_user_agent: "ampere-tests".to_string(),
        recent_activity_limit: 20,
        top_users_limit: 10,
    }
}

/// 基于内存存储的审计日志
pub fn memory_store() -> (AuditLogStore, Arc<MemoryStorage>) {
    let storage = Arc::new(MemoryStorage::new());
    let store = store_on(storage.clone());
    (store, storage)
}

pub fn store_on(storage: Arc<dyn StateStorage>) -> AuditLogStore {
    let repository = AuditRepository::new(storage, TEST_STORAGE_KEY);
    AuditLogStore::open(repository, create_test_audit_config())
}

pub fn super_admin() -> User {
    User::new("sa1", "Siti Admin", Role::SuperAdmin)
}

pub fn admin() -> User {
    User::new("ad1", "Arun Admin", Role::Admin)
}

pub fn finance() -> User {
    User::new("fi1", "Faith Finance", Role::Finance)
}

pub fn projects_user(id: &str) -> User {
    User::new(id, format!("PM {}", id), Role::Projects)
}

pub fn sales() -> User {
    User::new("sl1", "Sam Sales", Role::Sales)
}

/// 项目 p1：经理 u1，团队 u2
pub fn sample_project() -> Project {
    Project::new("p1", "Orchard Road Renovation", "u1").with_team(["u2"])
}
