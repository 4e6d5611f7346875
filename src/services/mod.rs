//! Business logic services layer

pub mod audit_store;
pub mod change_detector;
pub mod permission_service;

pub use audit_store::{AuditLogParams, AuditLogStore, Clock, SystemClock};
pub use change_detector::ChangeDetector;
pub use permission_service::PermissionService;
