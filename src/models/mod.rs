//! 数据模型模块
//! 角色与权限、用户、受保护的项目实体以及审计日志

pub mod audit;
pub mod project;
pub mod role;
pub mod user;
