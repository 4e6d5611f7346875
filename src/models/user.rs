//! User (actor) domain model

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::role::{PermissionSet, Role};

/// Authenticated user evaluated by the permission checks
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct User {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub email: String,
    pub role: Role,
    pub is_active: bool,
    /// Fine-grained permissions; with `None` only role shortcuts and client viewing pass
    #[serde(default)]
    pub permissions: Option<PermissionSet>,
    /// Project IDs this user can access
    #[serde(default)]
    pub assigned_projects: Vec<String>,
    #[serde(default)]
    pub department: Option<String>,
    #[serde(default)]
    pub last_login: Option<DateTime<Utc>>,
}

impl User {
    /// 创建用户，按角色初始化默认权限
    pub fn new(id: impl Into<String>, name: impl Into<String>, role: Role) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            email: String::new(),
            role,
            is_active: true,
            permissions: Some(PermissionSet::for_role(role)),
            assigned_projects: Vec::new(),
            department: None,
            last_login: None,
        }
    }

    pub fn with_permissions(mut self, permissions: Option<PermissionSet>) -> Self {
        self.permissions = permissions;
        self
    }

    pub fn with_assigned_projects<I, S>(mut self, projects: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.assigned_projects = projects.into_iter().map(Into::into).collect();
        self
    }

    pub fn deactivated(mut self) -> Self {
        self.is_active = false;
        self
    }

    pub fn is_assigned_to(&self, project_id: &str) -> bool {
        self.assigned_projects.iter().any(|id| id == project_id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_user_is_active_with_role_defaults() {
        let user = User::new("u1", "Alice", Role::Finance);
        assert!(user.is_active);
        assert_eq!(user.permissions, Some(PermissionSet::for_role(Role::Finance)));
        assert!(user.assigned_projects.is_empty());
    }

    #[test]
    fn test_user_deserializes_without_optional_fields() {
        let user: User = serde_json::from_str(
            r#"{"id": "u9", "name": "Bob", "role": "sales", "is_active": false}"#,
        )
        .unwrap();
        assert_eq!(user.role, Role::Sales);
        assert!(!user.is_active);
        assert!(user.permissions.is_none());
    }

    #[test]
    fn test_is_assigned_to() {
        let user = User::new("u1", "Alice", Role::Projects).with_assigned_projects(["p1", "p2"]);
        assert!(user.is_assigned_to("p2"));
        assert!(!user.is_assigned_to("p3"));
    }
}
