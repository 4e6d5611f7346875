//! 键值持久化抽象
//!
//! 审计日志以序列化后的整体快照保存在某个键下，后端可以是：
//! - 本地文件系统（每个键一个 JSON 文件）
//! - 进程内内存（测试与临时使用）

use std::collections::HashMap;
use std::fs;
use std::io::{ErrorKind, Write};
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use tracing::debug;

use crate::error::AppError;

/// Best-effort key/value persistence
pub trait StateStorage: Send + Sync {
    fn save(&self, key: &str, data: &str) -> Result<(), AppError>;

    /// `Ok(None)` when nothing is stored under `key`
    fn load(&self, key: &str) -> Result<Option<String>, AppError>;

    /// Removing a missing key is not an error
    fn remove(&self, key: &str) -> Result<(), AppError>;
}

/// 本地文件存储
#[derive(Debug, Clone)]
pub struct FileStorage {
    base_path: PathBuf,
}

impl FileStorage {
    pub fn new(base_path: impl Into<PathBuf>) -> Self {
        Self {
            base_path: base_path.into(),
        }
    }

    pub fn base_path(&self) -> &Path {
        &self.base_path
    }

    fn path_for(&self, key: &str) -> PathBuf {
        self.base_path.join(format!("{}.json", key))
    }
}

impl StateStorage for FileStorage {
    fn save(&self, key: &str, data: &str) -> Result<(), AppError> {
        fs::create_dir_all(&self.base_path)?;

        // 先写临时文件再重命名，避免留下半截快照
        let path = self.path_for(key);
        let tmp_path = path.with_extension("json.tmp");
        {
            let mut file = fs::File::create(&tmp_path)?;
            file.write_all(data.as_bytes())?;
            file.sync_all()?;
        }
        fs::rename(&tmp_path, &path)?;

        debug!(path = %path.display(), bytes = data.len(), "State saved");
        Ok(())
    }

    fn load(&self, key: &str) -> Result<Option<String>, AppError> {
        match fs::read_to_string(self.path_for(key)) {
            Ok(data) => Ok(Some(data)),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    fn remove(&self, key: &str) -> Result<(), AppError> {
        match fs::remove_file(self.path_for(key)) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e.into()),
        }
    }
}

/// 内存存储
#[derive(Debug, Default)]
pub struct MemoryStorage {
    entries: Mutex<HashMap<String, String>>,
}

impl MemoryStorage {
    pub fn new() -> Self {
        Self::default()
    }

    fn entries(&self) -> std::sync::MutexGuard<'_, HashMap<String, String>> {
        self.entries.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

impl StateStorage for MemoryStorage {
    fn save(&self, key: &str, data: &str) -> Result<(), AppError> {
        self.entries().insert(key.to_string(), data.to_string());
        Ok(())
    }

    fn load(&self, key: &str) -> Result<Option<String>, AppError> {
        Ok(self.entries().get(key).cloned())
    }

    fn remove(&self, key: &str) -> Result<(), AppError> {
        self.entries().remove(key);
        Ok(())
    }
}
