// ==========================================
// 船舶离线报表系统 - 模板下载 API
// ==========================================
// 职责: 读取船舶作用域配置 → 生成模板 → 返回文件名 + 二进制
// ==========================================

use crate::api::error::{ApiError, ApiResult};
use crate::config::PipelineConfigReader;
use crate::domain::types::TemplateKind;
use crate::template::TemplateGenerator;
use serde::Serialize;
use std::sync::Arc;

pub const XLSX_CONTENT_TYPE: &str =
    "application/vnd.openxmlformats-officedocument.spreadsheetml.sheet";

/// 模板下载响应
#[derive(Debug, Clone, Serialize)]
pub struct TemplateDownload {
    pub file_name: String,
    pub content_type: &'static str,
    #[serde(skip_serializing)]
    pub bytes: Vec<u8>,
    pub upload_token: String,
    pub staging_tables: Vec<String>,
    /// 放弃保护的工作表（sheet, 原因）
    pub unprotected_sheets: Vec<(String, String)>,
}

pub struct TemplateApi {
    generator: TemplateGenerator,
    config: Arc<dyn PipelineConfigReader>,
}

impl TemplateApi {
    pub fn new(generator: TemplateGenerator, config: Arc<dyn PipelineConfigReader>) -> Self {
        Self { generator, config }
    }

    /// 下载指定船舶的模板
    pub async fn download_template(&self, vessel_id: i64, kind: TemplateKind) -> ApiResult<TemplateDownload> {
        if vessel_id <= 0 {
            return Err(ApiError::InvalidInput(format!("vessel_id 无效: {}", vessel_id)));
        }

        let settings = self.config.get_pipeline_settings(Some(vessel_id)).await?;
        let generated = self.generator.generate(vessel_id, kind, &settings).await?;

        Ok(TemplateDownload {
            file_name: generated.file_name,
            content_type: XLSX_CONTENT_TYPE,
            bytes: generated.bytes,
            upload_token: generated.upload_token.token,
            staging_tables: generated.staging_tables,
            unprotected_sheets: generated.unprotected_sheets,
        })
    }

    /// 字符串形式的模板类型
    pub async fn download_template_named(&self, vessel_id: i64, kind: &str) -> ApiResult<TemplateDownload> {
        let kind: TemplateKind = kind.parse().map_err(ApiError::InvalidInput)?;
        self.download_template(vessel_id, kind).await
    }
}
