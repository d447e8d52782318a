// ==========================================
// 船舶离线报表系统 - 存储配置
// ==========================================
// CSV 路径: {upload_root}/{folder}/{batch_id}_{file}.csv
// 镜像目录可选，写入失败不影响主目录结果
// ==========================================

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StorageConfig {
    pub upload_root: PathBuf,
    #[serde(default)]
    pub mirror_root: Option<PathBuf>,
}

impl Default for StorageConfig {
    fn default() -> Self {
        let base = dirs::data_local_dir().unwrap_or_else(|| PathBuf::from("."));
        Self {
            upload_root: base.join("vessel-sheets").join("uploads"),
            mirror_root: None,
        }
    }
}

impl StorageConfig {
    pub fn new(upload_root: impl Into<PathBuf>) -> Self {
        Self {
            upload_root: upload_root.into(),
            mirror_root: None,
        }
    }

    pub fn with_mirror(mut self, mirror_root: impl Into<PathBuf>) -> Self {
        self.mirror_root = Some(mirror_root.into());
        self
    }
}
