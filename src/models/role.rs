//! Role and permission domain models

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::AppError;

/// Role
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Role {
    SuperAdmin,
    Admin,
    Finance,
    Projects,
    Sales,
}

impl Role {
    pub const ALL: [Role; 5] = [
        Role::SuperAdmin,
        Role::Admin,
        Role::Finance,
        Role::Projects,
        Role::Sales,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Role::SuperAdmin => "super_admin",
            Role::Admin => "admin",
            Role::Finance => "finance",
            Role::Projects => "projects",
            Role::Sales => "sales",
        }
    }

    /// super_admin 与 admin 绕过大部分细粒度检查
    pub fn is_elevated(&self) -> bool {
        matches!(self, Role::SuperAdmin | Role::Admin)
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Role {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Role::ALL
            .into_iter()
            .find(|role| role.as_str() == s)
            .ok_or_else(|| AppError::InvalidRole(s.to_string()))
    }
}

/// Finance permissions
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct FinancePermissions {
    pub view_finance: bool,
    pub edit_invoices: bool,
    pub delete_invoices: bool,
    pub view_reports: bool,
    pub manage_payments: bool,
}

/// Project permissions
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ProjectPermissions {
    pub view_all_projects: bool,
    pub edit_assigned_projects: bool,
    pub create_projects: bool,
    pub delete_projects: bool,
    pub manage_team: bool,
}

/// Client permissions
///
/// `view_clients` is the one default-open flag: a missing value reads as `true`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClientPermissions {
    #[serde(default = "default_true")]
    pub view_clients: bool,
    #[serde(default)]
    pub edit_clients: bool,
    #[serde(default)]
    pub create_clients: bool,
    #[serde(default)]
    pub delete_clients: bool,
}

impl Default for ClientPermissions {
    fn default() -> Self {
        Self {
            view_clients: true,
            edit_clients: false,
            create_clients: false,
            delete_clients: false,
        }
    }
}

fn default_true() -> bool {
    true
}

/// System permissions
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SystemPermissions {
    pub manage_users: bool,
    pub view_audit_logs: bool,
    pub manage_settings: bool,
    pub view_reports: bool,
}

/// Fine-grained permission set, grouped by domain
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PermissionSet {
    pub finance: FinancePermissions,
    pub projects: ProjectPermissions,
    pub clients: ClientPermissions,
    pub system: SystemPermissions,
}

/// One boolean flag of a [`PermissionSet`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Capability {
    ViewFinance,
    EditInvoices,
    DeleteInvoices,
    ViewFinanceReports,
    ManagePayments,

    ViewAllProjects,
    EditAssignedProjects,
    CreateProjects,
    DeleteProjects,
    ManageTeam,

    ViewClients,
    EditClients,
    CreateClients,
    DeleteClients,

    ManageUsers,
    ViewAuditLogs,
    ManageSettings,
    ViewReports,
}

impl Capability {
    pub const ALL: [Capability; 18] = [
        Capability::ViewFinance,
        Capability::EditInvoices,
        Capability::DeleteInvoices,
        Capability::ViewFinanceReports,
        Capability::ManagePayments,
        Capability::ViewAllProjects,
        Capability::EditAssignedProjects,
        Capability::CreateProjects,
        Capability::DeleteProjects,
        Capability::ManageTeam,
        Capability::ViewClients,
        Capability::EditClients,
        Capability::CreateClients,
        Capability::DeleteClients,
        Capability::ManageUsers,
        Capability::ViewAuditLogs,
        Capability::ManageSettings,
        Capability::ViewReports,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Capability::ViewFinance => "finance.view_finance",
            Capability::EditInvoices => "finance.edit_invoices",
            Capability::DeleteInvoices => "finance.delete_invoices",
            Capability::ViewFinanceReports => "finance.view_reports",
            Capability::ManagePayments => "finance.manage_payments",
            Capability::ViewAllProjects => "projects.view_all_projects",
            Capability::EditAssignedProjects => "projects.edit_assigned_projects",
            Capability::CreateProjects => "projects.create_projects",
            Capability::DeleteProjects => "projects.delete_projects",
            Capability::ManageTeam => "projects.manage_team",
            Capability::ViewClients => "clients.view_clients",
            Capability::EditClients => "clients.edit_clients",
            Capability::CreateClients => "clients.create_clients",
            Capability::DeleteClients => "clients.delete_clients",
            Capability::ManageUsers => "system.manage_users",
            Capability::ViewAuditLogs => "system.view_audit_logs",
            Capability::ManageSettings => "system.manage_settings",
            Capability::ViewReports => "system.view_reports",
        }
    }
}

impl PermissionSet {
    /// 读取单个权限标志
    pub fn get(&self, capability: Capability) -> bool {
        match capability {
            Capability::ViewFinance => self.finance.view_finance,
            Capability::EditInvoices => self.finance.edit_invoices,
            Capability::DeleteInvoices => self.finance.delete_invoices,
            Capability::ViewFinanceReports => self.finance.view_reports,
            Capability::ManagePayments => self.finance.manage_payments,
            Capability::ViewAllProjects => self.projects.view_all_projects,
            Capability::EditAssignedProjects => self.projects.edit_assigned_projects,
            Capability::CreateProjects => self.projects.create_projects,
            Capability::DeleteProjects => self.projects.delete_projects,
            Capability::ManageTeam => self.projects.manage_team,
            Capability::ViewClients => self.clients.view_clients,
            Capability::EditClients => self.clients.edit_clients,
            Capability::CreateClients => self.clients.create_clients,
            Capability::DeleteClients => self.clients.delete_clients,
            Capability::ManageUsers => self.system.manage_users,
            Capability::ViewAuditLogs => self.system.view_audit_logs,
            Capability::ManageSettings => self.system.manage_settings,
            Capability::ViewReports => self.system.view_reports,
        }
    }

    /// 设置单个权限标志
    pub fn set(&mut self, capability: Capability, value: bool) {
        let flag = match capability {
            Capability::ViewFinance => &mut self.finance.view_finance,
            Capability::EditInvoices => &mut self.finance.edit_invoices,
            Capability::DeleteInvoices => &mut self.finance.delete_invoices,
            Capability::ViewFinanceReports => &mut self.finance.view_reports,
            Capability::ManagePayments => &mut self.finance.manage_payments,
            Capability::ViewAllProjects => &mut self.projects.view_all_projects,
            Capability::EditAssignedProjects => &mut self.projects.edit_assigned_projects,
            Capability::CreateProjects => &mut self.projects.create_projects,
            Capability::DeleteProjects => &mut self.projects.delete_projects,
            Capability::ManageTeam => &mut self.projects.manage_team,
            Capability::ViewClients => &mut self.clients.view_clients,
            Capability::EditClients => &mut self.clients.edit_clients,
            Capability::CreateClients => &mut self.clients.create_clients,
            Capability::DeleteClients => &mut self.clients.delete_clients,
            Capability::ManageUsers => &mut self.system.manage_users,
            Capability::ViewAuditLogs => &mut self.system.view_audit_logs,
            Capability::ManageSettings => &mut self.system.manage_settings,
            Capability::ViewReports => &mut self.system.view_reports,
        };
        *flag = value;
    }

    /// Builder-style variant of [`PermissionSet::set`]
    pub fn with(mut self, capability: Capability, value: bool) -> Self {
        self.set(capability, value);
        self
    }

    /// Default permission set for a role
    pub fn for_role(role: Role) -> Self {
        match role {
            Role::SuperAdmin => PermissionSet {
                finance: FinancePermissions {
                    view_finance: true,
                    edit_invoices: true,
                    delete_invoices: true,
                    view_reports: true,
                    manage_payments: true,
                },
                projects: ProjectPermissions {
                    view_all_projects: true,
                    edit_assigned_projects: true,
                    create_projects: true,
                    delete_projects: true,
                    manage_team: true,
                },
                clients: ClientPermissions {
                    view_clients: true,
                    edit_clients: true,
                    create_clients: true,
                    delete_clients: true,
                },
                system: SystemPermissions {
                    manage_users: true,
                    view_audit_logs: true,
                    manage_settings: true,
                    view_reports: true,
                },
            },
            Role::Admin => PermissionSet {
                finance: FinancePermissions {
                    view_finance: true,
                    edit_invoices: false,
                    delete_invoices: false,
                    view_reports: true,
                    manage_payments: false,
                },
                projects: ProjectPermissions {
                    view_all_projects: true,
                    edit_assigned_projects: true,
                    create_projects: true,
                    delete_projects: false,
                    manage_team: true,
                },
                clients: ClientPermissions {
                    view_clients: true,
                    edit_clients: true,
                    create_clients: true,
                    delete_clients: false,
                },
                system: SystemPermissions {
                    manage_users: true,
                    view_audit_logs: false,
                    manage_settings: true,
                    view_reports: true,
                },
            },
            Role::Finance => PermissionSet {
                finance: FinancePermissions {
                    view_finance: true,
                    edit_invoices: true,
                    delete_invoices: false,
                    view_reports: true,
                    manage_payments: true,
                },
                projects: ProjectPermissions::default(),
                clients: ClientPermissions::default(),
                system: SystemPermissions {
                    view_reports: true,
                    ..SystemPermissions::default()
                },
            },
            Role::Projects => PermissionSet {
                finance: FinancePermissions::default(),
                projects: ProjectPermissions {
                    edit_assigned_projects: true,
                    ..ProjectPermissions::default()
                },
                clients: ClientPermissions::default(),
                system: SystemPermissions::default(),
            },
            Role::Sales => PermissionSet {
                finance: FinancePermissions::default(),
                projects: ProjectPermissions::default(),
                clients: ClientPermissions {
                    view_clients: true,
                    edit_clients: true,
                    create_clients: true,
                    delete_clients: false,
                },
                system: SystemPermissions::default(),
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_role_round_trip_through_str() {
        for role in Role::ALL {
            assert_eq!(role.as_str().parse::<Role>().unwrap(), role);
        }
    }

    #[test]
    fn test_unknown_role_is_rejected() {
        let err = "owner".parse::<Role>().unwrap_err();
        assert!(matches!(err, AppError::InvalidRole(ref r) if r == "owner"));
    }

    #[test]
    fn test_role_serde_uses_snake_case() {
        assert_eq!(serde_json::to_string(&Role::SuperAdmin).unwrap(), "\"super_admin\"");
        let role: Role = serde_json::from_str("\"projects\"").unwrap();
        assert_eq!(role, Role::Projects);
    }

    #[test]
    fn test_get_and_set_cover_every_capability() {
        let mut set = PermissionSet::default();
        set.set(Capability::ViewClients, false);
        for capability in Capability::ALL {
            assert!(!set.get(capability), "{} should start false", capability.as_str());
            set.set(capability, true);
            assert!(set.get(capability), "{} should be set", capability.as_str());
        }
    }

    #[test]
    fn test_view_clients_defaults_open_when_missing() {
        let set: PermissionSet =
            serde_json::from_str(r#"{"clients": {"edit_clients": true}}"#).unwrap();
        assert!(set.clients.view_clients);
        assert!(set.clients.edit_clients);
        assert!(!set.clients.delete_clients);
        assert!(!set.finance.view_finance);
    }

    #[test]
    fn test_super_admin_defaults_are_all_true() {
        let set = PermissionSet::for_role(Role::SuperAdmin);
        assert!(Capability::ALL.iter().all(|c| set.get(*c)));
    }

    #[test]
    fn test_every_role_can_view_clients_by_default() {
        for role in Role::ALL {
            assert!(PermissionSet::for_role(role).clients.view_clients);
        }
    }

    #[test]
    fn test_only_super_admin_views_audit_logs_by_default() {
        for role in Role::ALL {
            let expected = role == Role::SuperAdmin;
            assert_eq!(PermissionSet::for_role(role).system.view_audit_logs, expected);
        }
    }
}
