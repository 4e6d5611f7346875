//! Audit domain models

use std::collections::BTreeMap;
use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::role::Role;
use super::user::User;

/// 审计操作类型
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum AuditAction {
    Create,
    Update,
    Delete,
    Login,
    Logout,
    View,
    Export,
    Import,
    Approve,
    Reject,
    Send,
    Cancel,
    Restore,
    Activate,
    Deactivate,
}

impl AuditAction {
    pub fn as_str(&self) -> &'static str {
        match self {
            AuditAction::Create => "CREATE",
            AuditAction::Update => "UPDATE",
            AuditAction::Delete => "DELETE",
            AuditAction::Login => "LOGIN",
            AuditAction::Logout => "LOGOUT",
            AuditAction::View => "VIEW",
            AuditAction::Export => "EXPORT",
            AuditAction::Import => "IMPORT",
            AuditAction::Approve => "APPROVE",
            AuditAction::Reject => "REJECT",
            AuditAction::Send => "SEND",
            AuditAction::Cancel => "CANCEL",
            AuditAction::Restore => "RESTORE",
            AuditAction::Activate => "ACTIVATE",
            AuditAction::Deactivate => "DEACTIVATE",
        }
    }
}

impl fmt::Display for AuditAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// 审计实体类型
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum AuditEntityType {
    User,
    Client,
    Project,
    Tender,
    Quotation,
    Invoice,
    Payment,
    Vendor,
    Report,
    Settings,
    ClientType,
    System,
}

impl AuditEntityType {
    pub fn as_str(&self) -> &'static str {
        match self {
            AuditEntityType::User => "USER",
            AuditEntityType::Client => "CLIENT",
            AuditEntityType::Project => "PROJECT",
            AuditEntityType::Tender => "TENDER",
            AuditEntityType::Quotation => "QUOTATION",
            AuditEntityType::Invoice => "INVOICE",
            AuditEntityType::Payment => "PAYMENT",
            AuditEntityType::Vendor => "VENDOR",
            AuditEntityType::Report => "REPORT",
            AuditEntityType::Settings => "SETTINGS",
            AuditEntityType::ClientType => "CLIENT_TYPE",
            AuditEntityType::System => "SYSTEM",
        }
    }
}

impl fmt::Display for AuditEntityType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One differing field between two snapshots. `None` means the field was absent.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AuditChange {
    pub field: String,
    pub old_value: Option<Value>,
    pub new_value: Option<Value>,
    pub field_label: String,
}

/// Actor snapshot denormalized into each entry
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuditActor {
    pub id: String,
    pub name: String,
    pub role: Role,
}

impl From<&User> for AuditActor {
    fn from(user: &User) -> Self {
        Self {
            id: user.id.clone(),
            name: user.name.clone(),
            role: user.role,
        }
    }
}

/// Audit log entry
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AuditLog {
    pub id: String,
    pub timestamp: DateTime<Utc>,
    pub user_id: String,
    pub user_role: Role,
    pub user_name: String,
    pub action: AuditAction,
    pub entity_type: AuditEntityType,
    pub entity_id: String,
    #[serde(default)]
    pub entity_name: Option<String>,
    #[serde(default)]
    pub changes: Option<Vec<AuditChange>>,
    #[serde(default)]
    pub details: Option<String>,
    #[serde(default)]
    pub ip_address: Option<String>,
    #[serde(default)]
    pub user_agent: Option<String>,
}

impl AuditLog {
    /// Text the free-form search runs against
    pub fn searchable_text(&self) -> String {
        [
            self.user_name.as_str(),
            self.entity_name.as_deref().unwrap_or_default(),
            self.details.as_deref().unwrap_or_default(),
            self.action.as_str(),
            self.entity_type.as_str(),
        ]
        .join(" ")
        .to_lowercase()
    }
}

/// Entry built but not yet stamped with id and timestamp
#[derive(Debug, Clone, PartialEq)]
pub struct NewAuditLog {
    pub actor: AuditActor,
    pub action: AuditAction,
    pub entity_type: AuditEntityType,
    pub entity_id: String,
    pub entity_name: Option<String>,
    pub changes: Option<Vec<AuditChange>>,
    pub details: Option<String>,
    pub ip_address: Option<String>,
    pub user_agent: Option<String>,
}

/// Audit log filters (all supplied predicates must match)
#[derive(Debug, Clone, Default, Deserialize)]
pub struct AuditLogFilter {
    pub user_id: Option<String>,
    pub user_role: Option<Role>,
    pub action: Option<AuditAction>,
    pub entity_type: Option<AuditEntityType>,
    pub date_from: Option<DateTime<Utc>>,
    pub date_to: Option<DateTime<Utc>>,
    pub search_term: Option<String>,
}

impl AuditLogFilter {
    pub fn matches(&self, log: &AuditLog) -> bool {
        if self.user_id.as_ref().is_some_and(|id| *id != log.user_id) {
            return false;
        }
        if self.user_role.is_some_and(|role| role != log.user_role) {
            return false;
        }
        if self.action.is_some_and(|action| action != log.action) {
            return false;
        }
        if self.entity_type.is_some_and(|ty| ty != log.entity_type) {
            return false;
        }
        if self.date_from.is_some_and(|from| log.timestamp < from) {
            return false;
        }
        if self.date_to.is_some_and(|to| log.timestamp > to) {
            return false;
        }
        // 空字符串视为未设置
        if let Some(term) = self.search_term.as_deref().filter(|t| !t.is_empty()) {
            if !log.searchable_text().contains(&term.to_lowercase()) {
                return false;
            }
        }
        true
    }
}

/// Per-user activity count
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct UserActivity {
    pub user_id: String,
    pub user_name: String,
    pub count: usize,
}

/// Aggregate view over the whole log
#[derive(Debug, Clone, Serialize)]
pub struct AuditLogSummary {
    pub total_logs: usize,
    pub today_logs: usize,
    pub week_logs: usize,
    pub month_logs: usize,
    pub by_action: BTreeMap<AuditAction, usize>,
    pub by_entity_type: BTreeMap<AuditEntityType, usize>,
    pub by_user: Vec<UserActivity>,
    pub recent_activity: Vec<AuditLog>,
}
