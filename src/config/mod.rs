// ==========================================
// 船舶离线报表系统 - 配置层
// ==========================================
// 职责: 业务配置 / 布局配置 / 存储配置，支持 vessel 级覆写
// 存储: config_kv 表
// ==========================================

pub mod config_manager;
pub mod domain_config;
pub mod layout_config;
pub mod pipeline_config_trait;
pub mod storage_config;

/// 配置层错误
pub type ConfigError = Box<dyn std::error::Error + Send + Sync>;

// 重导出核心配置类型
pub use config_manager::{config_keys, ConfigManager, ConfigScope};
pub use domain_config::{DomainConfig, DEFAULT_NOTE_SLOT_LIMIT};
pub use layout_config::LayoutConfig;
pub use pipeline_config_trait::{PipelineConfigReader, PipelineSettings};
pub use storage_config::StorageConfig;
