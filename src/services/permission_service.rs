//! 权限检查服务
//!
//! 每个检查都是纯函数，按同样的三层顺序求值：
//! 1. 用户缺失或未激活 → 拒绝
//! 2. 角色快捷通道（super_admin / admin 等）→ 允许
//! 3. 用户的细粒度权限；没有细粒度权限时只开放 `view_clients`，其余拒绝
//!
//! 角色快捷通道优先于显式权限：给 admin 设置 `view_finance = false`
//! 不会撤销 admin 的财务访问权。

use std::collections::HashSet;

use crate::models::{
    project::Project,
    role::{Capability, PermissionSet, Role},
    user::User,
};

/// 角色是否被硬编码授予某项能力
pub fn role_shortcut(role: Role, capability: Capability) -> bool {
    use Capability::*;

    match capability {
        ViewFinance | ViewFinanceReports | ViewReports => {
            matches!(role, Role::SuperAdmin | Role::Admin | Role::Finance)
        }
        ViewAllProjects | EditAssignedProjects | CreateProjects | ManageTeam | ManageUsers
        | ManageSettings => role.is_elevated(),
        EditClients | CreateClients => {
            matches!(role, Role::SuperAdmin | Role::Admin | Role::Sales)
        }
        // projects 角色对客户的访问受限，其余角色都能查看
        ViewClients => role != Role::Projects,
        EditInvoices | DeleteInvoices | ManagePayments | DeleteProjects | DeleteClients
        | ViewAuditLogs => role == Role::SuperAdmin,
    }
}

/// 角色 + 显式权限 → 是否拥有能力（不检查激活状态）
pub fn evaluate(role: Role, overrides: Option<&PermissionSet>, capability: Capability) -> bool {
    if role_shortcut(role, capability) {
        return true;
    }

    match overrides {
        Some(permissions) => permissions.get(capability),
        // 缺少权限对象时按缺失字段处理：只有查看客户默认开放
        None => capability == Capability::ViewClients,
    }
}

/// Centralised authorization decisions
pub struct PermissionService;

impl PermissionService {
    fn active(user: Option<&User>) -> Option<&User> {
        user.filter(|u| u.is_active)
    }

    fn check(user: Option<&User>, capability: Capability) -> bool {
        Self::active(user)
            .is_some_and(|u| evaluate(u.role, u.permissions.as_ref(), capability))
    }

    /// 检查用户是否拥有某项能力
    pub fn has_capability(user: Option<&User>, capability: Capability) -> bool {
        Self::check(user, capability)
    }

    // ==================== Finance ====================

    pub fn can_access_finance(user: Option<&User>) -> bool {
        Self::check(user, Capability::ViewFinance)
    }

    pub fn can_edit_invoices(user: Option<&User>) -> bool {
        Self::check(user, Capability::EditInvoices)
    }

    pub fn can_delete_invoices(user: Option<&User>) -> bool {
        Self::check(user, Capability::DeleteInvoices)
    }

    pub fn can_manage_payments(user: Option<&User>) -> bool {
        Self::check(user, Capability::ManagePayments)
    }

    pub fn can_view_finance_reports(user: Option<&User>) -> bool {
        Self::check(user, Capability::ViewFinanceReports)
    }

    // ==================== Projects ====================

    /// 项目经理、团队成员或被分配到该项目的用户
    pub fn is_project_member(user: Option<&User>, project: &Project) -> bool {
        Self::active(user).is_some_and(|u| relates_to(u, project))
    }

    pub fn can_view_project(user: Option<&User>, project: &Project) -> bool {
        Self::active(user).is_some_and(|u| {
            evaluate(u.role, u.permissions.as_ref(), Capability::ViewAllProjects)
                || relates_to(u, project)
        })
    }

    /// 编辑需要 `edit_assigned_projects` 且与项目有关联；仅有其一不够
    pub fn can_edit_project(user: Option<&User>, project: &Project) -> bool {
        Self::active(user).is_some_and(|u| {
            u.role.is_elevated()
                || (evaluate(u.role, u.permissions.as_ref(), Capability::EditAssignedProjects)
                    && relates_to(u, project))
        })
    }

    pub fn can_create_projects(user: Option<&User>) -> bool {
        Self::check(user, Capability::CreateProjects)
    }

    pub fn can_delete_projects(user: Option<&User>) -> bool {
        Self::check(user, Capability::DeleteProjects)
    }

    /// 项目经理可以管理自己项目的团队
    pub fn can_manage_project_team(user: Option<&User>, project: Option<&Project>) -> bool {
        Self::active(user).is_some_and(|u| {
            u.role.is_elevated()
                || project.is_some_and(|p| p.is_managed_by(&u.id))
                || evaluate(u.role, u.permissions.as_ref(), Capability::ManageTeam)
        })
    }

    /// 按输入顺序返回用户可见的项目
    pub fn get_accessible_projects<'a>(
        user: Option<&User>,
        all_projects: &'a [Project],
    ) -> Vec<&'a Project> {
        let Some(user) = Self::active(user) else {
            return Vec::new();
        };

        if evaluate(user.role, user.permissions.as_ref(), Capability::ViewAllProjects) {
            return all_projects.iter().collect();
        }

        all_projects.iter().filter(|p| relates_to(user, p)).collect()
    }

    /// 可访问的项目 ID
    ///
    /// 拥有全局查看权限时按输入顺序返回全部 ID；否则先返回分配的项目，
    /// 再按输入顺序追加担任经理或团队成员的项目，去重保留首次出现。
    pub fn get_accessible_project_ids(
        user: Option<&User>,
        all_projects: &[Project],
    ) -> Vec<String> {
        let Some(user) = Self::active(user) else {
            return Vec::new();
        };

        if evaluate(user.role, user.permissions.as_ref(), Capability::ViewAllProjects) {
            return all_projects.iter().map(|p| p.id.clone()).collect();
        }

        let mut seen = HashSet::new();
        let discovered = all_projects
            .iter()
            .filter(|p| p.is_managed_by(&user.id) || p.has_team_member(&user.id))
            .map(|p| &p.id);

        user.assigned_projects
            .iter()
            .chain(discovered)
            .filter(|&id| seen.insert(id.as_str()))
            .cloned()
            .collect()
    }

    // ==================== Clients ====================

    /// 默认开放：缺失的 `view_clients` 视为 true
    pub fn can_view_clients(user: Option<&User>) -> bool {
        Self::check(user, Capability::ViewClients)
    }

    pub fn can_edit_clients(user: Option<&User>) -> bool {
        Self::check(user, Capability::EditClients)
    }

    pub fn can_create_clients(user: Option<&User>) -> bool {
        Self::check(user, Capability::CreateClients)
    }

    pub fn can_delete_clients(user: Option<&User>) -> bool {
        Self::check(user, Capability::DeleteClients)
    }

    // ==================== System ====================

    pub fn can_manage_users(user: Option<&User>) -> bool {
        Self::check(user, Capability::ManageUsers)
    }

    pub fn can_view_audit_logs(user: Option<&User>) -> bool {
        Self::check(user, Capability::ViewAuditLogs)
    }

    pub fn can_manage_settings(user: Option<&User>) -> bool {
        Self::check(user, Capability::ManageSettings)
    }

    pub fn can_view_reports(user: Option<&User>) -> bool {
        Self::check(user, Capability::ViewReports)
    }

    // ==================== Roles ====================

    pub fn has_any_role(user: Option<&User>, roles: &[Role]) -> bool {
        Self::active(user).is_some_and(|u| roles.contains(&u.role))
    }

    /// 新用户的初始权限
    pub fn initialize_user_permissions(role: Role) -> PermissionSet {
        PermissionSet::for_role(role)
    }
}

fn relates_to(user: &User, project: &Project) -> bool {
    user.is_assigned_to(&project.id)
        || project.is_managed_by(&user.id)
        || project.has_team_member(&user.id)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_role_shortcut_never_exceeds_defaults() {
        // 快捷通道授予的能力必须也出现在该角色的默认权限中
        for role in Role::ALL {
            let defaults = PermissionSet::for_role(role);
            for capability in Capability::ALL {
                if role_shortcut(role, capability) {
                    assert!(
                        defaults.get(capability),
                        "{} shortcut grants {} but defaults do not",
                        role,
                        capability.as_str()
                    );
                }
            }
        }
    }

    #[test]
    fn test_evaluate_without_overrides_fails_closed() {
        for role in Role::ALL {
            for capability in Capability::ALL {
                let expected =
                    role_shortcut(role, capability) || capability == Capability::ViewClients;
                assert_eq!(evaluate(role, None, capability), expected);
            }
        }
        assert!(!evaluate(Role::Finance, None, Capability::EditInvoices));
        assert!(evaluate(Role::Projects, None, Capability::ViewClients));
    }

    #[test]
    fn test_evaluate_role_shortcut_beats_explicit_false() {
        let revoked = PermissionSet::for_role(Role::Admin).with(Capability::ViewFinance, false);
        assert!(evaluate(Role::Admin, Some(&revoked), Capability::ViewFinance));
    }

    #[test]
    fn test_evaluate_explicit_flag_without_shortcut() {
        let granted = PermissionSet::for_role(Role::Sales).with(Capability::ViewAuditLogs, true);
        assert!(evaluate(Role::Sales, Some(&granted), Capability::ViewAuditLogs));

        let revoked = PermissionSet::for_role(Role::Finance).with(Capability::EditInvoices, false);
        assert!(!evaluate(Role::Finance, Some(&revoked), Capability::EditInvoices));
    }

    #[test]
    fn test_view_clients_shortcut_excludes_projects_role() {
        assert!(role_shortcut(Role::Sales, Capability::ViewClients));
        assert!(!role_shortcut(Role::Projects, Capability::ViewClients));
    }
}
