//! 数据访问层

pub mod audit_repo;
pub mod storage;

pub use audit_repo::AuditRepository;
pub use storage::{FileStorage, MemoryStorage, StateStorage};
