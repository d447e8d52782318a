// ==========================================
// 船舶离线报表系统 - 流水线配置读取 Trait
// ==========================================
// 职责: 定义生成/解析流水线所需的配置读取接口（不包含实现）
// 红线: 不包含配置写入、不包含业务逻辑
// ==========================================

use crate::config::domain_config::DomainConfig;
use crate::config::layout_config::LayoutConfig;
use crate::config::storage_config::StorageConfig;
use crate::config::ConfigError;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};

// ==========================================
// PipelineSettings - 三类配置的组合
// ==========================================
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PipelineSettings {
    pub domain: DomainConfig,
    pub layout: LayoutConfig,
    pub storage: StorageConfig,
}

// ==========================================
// PipelineConfigReader Trait
// ==========================================
// 用途: API 层读取配置的接缝
// 实现者: ConfigManager（从 config_kv 表读取，vessel 作用域优先于 global）
#[async_trait]
pub trait PipelineConfigReader: Send + Sync {
    /// 业务配置
    ///
    /// # 参数
    /// - vessel_id: 船舶 ID（None 时只读 global）
    async fn get_domain_config(&self, vessel_id: Option<i64>) -> Result<DomainConfig, ConfigError>;

    /// 布局配置
    async fn get_layout_config(&self, vessel_id: Option<i64>) -> Result<LayoutConfig, ConfigError>;

    /// 存储配置（仅 global）
    async fn get_storage_config(&self) -> Result<StorageConfig, ConfigError>;

    /// 一次性读取全部配置
    async fn get_pipeline_settings(
        &self,
        vessel_id: Option<i64>,
    ) -> Result<PipelineSettings, ConfigError> {
        Ok(PipelineSettings {
            domain: self.get_domain_config(vessel_id).await?,
            layout: self.get_layout_config(vessel_id).await?,
            storage: self.get_storage_config().await?,
        })
    }
}
