// ==========================================
// 船舶离线报表系统 - 回传导入 API
// ==========================================
// 请求面: 上传已填写工作簿 / 预览解析结果 / 按批次 ID 触发导入
// 两个阶段之间无事务关联；参考数据在此期间的变化由下游过程复核
// ==========================================

use crate::api::error::{ApiError, ApiResult};
use crate::config::PipelineConfigReader;
use crate::domain::batch::{BatchFile, DispatchOutcome, SheetArtifact};
use crate::importer::{
    staging_table_name, CsvExtractor, ImportDispatcher, ParsedWorkbook, StagingProvisioner,
    WorkbookParser,
};
use crate::repository::{BatchRepository, ReferenceDataRepository};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{info, instrument};
use uuid::Uuid;

/// 上传响应
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UploadResponse {
    pub batch_id: String,
    pub vessel_id: i64,
    pub artifacts: Vec<SheetArtifact>,
    pub total_rows: usize,
    /// 已写入的 staging 表（表名, 行数）
    pub staged_tables: Vec<(String, usize)>,
    pub upload_token: Option<String>,
    pub warnings: Vec<String>,
}

pub struct ImportApi {
    config: Arc<dyn PipelineConfigReader>,
    reference: Arc<dyn ReferenceDataRepository>,
    batches: Arc<dyn BatchRepository>,
    provisioner: Arc<StagingProvisioner>,
    dispatcher: ImportDispatcher,
}

impl ImportApi {
    pub fn new(
        config: Arc<dyn PipelineConfigReader>,
        reference: Arc<dyn ReferenceDataRepository>,
        batches: Arc<dyn BatchRepository>,
        provisioner: Arc<StagingProvisioner>,
        dispatcher: ImportDispatcher,
    ) -> Self {
        Self {
            config,
            reference,
            batches,
            provisioner,
            dispatcher,
        }
    }

    /// 新批次 ID（同船并发上传也不会冲突）
    pub fn new_batch_id() -> String {
        Uuid::new_v4().simple().to_string()
    }

    /// 上传已填写的工作簿
    ///
    /// # 流程
    /// 1. 解析（单表失败降级为空表）
    /// 2. 每表写出 CSV（主路径 + 可选镜像）
    /// 3. 登记批次
    /// 4. 若该船存在 staging 表，写入对应行
    #[instrument(skip(self, bytes), fields(size = bytes.len()))]
    pub async fn upload_workbook(&self, vessel_id: i64, bytes: &[u8]) -> ApiResult<UploadResponse> {
        let vessel = self.reference.get_vessel(vessel_id).await?;
        let settings = self.config.get_pipeline_settings(Some(vessel_id)).await?;

        let parser = WorkbookParser::new(&settings.domain, &settings.layout);
        let parsed = parser.parse_bytes(bytes)?;

        if let Some(token_vessel) = parsed.token_vessel_id {
            if token_vessel != vessel_id {
                return Err(ApiError::TokenMismatch(format!(
                    "工作簿属于船舶 {}，上传目标为 {}",
                    token_vessel, vessel_id
                )));
            }
        }

        let batch_id = Self::new_batch_id();
        let artifacts = CsvExtractor::new(&settings.storage).extract(&batch_id, &parsed)?;
        let batch = BatchFile::new(batch_id.clone(), vessel_id, artifacts);
        self.batches.insert_batch(&batch).await?;

        let mut staged_tables = Vec::new();
        for sheet in &parsed.sheets {
            let table = staging_table_name(&vessel.short_code, sheet.kind);
            if let Some(written) = self.provisioner.load_rows(&table, &sheet.rows).await? {
                staged_tables.push((table, written));
            }
        }

        info!(
            vessel_id,
            batch_id = %batch_id,
            rows = batch.total_rows(),
            staged = staged_tables.len(),
            "工作簿上传完成"
        );

        Ok(UploadResponse {
            batch_id,
            vessel_id,
            total_rows: batch.total_rows(),
            artifacts: batch.artifacts,
            staged_tables,
            upload_token: parsed.upload_token.clone(),
            warnings: parsed.sheets.iter().filter_map(|s| s.warning.clone()).collect(),
        })
    }

    /// 预览解析结果（不落盘、不登记批次）
    pub async fn preview_workbook(&self, vessel_id: Option<i64>, bytes: &[u8]) -> ApiResult<ParsedWorkbook> {
        let settings = self.config.get_pipeline_settings(vessel_id).await?;
        let parser = WorkbookParser::new(&settings.domain, &settings.layout);
        Ok(parser.parse_bytes(bytes)?)
    }

    /// 预览结果序列化为 JSON
    pub async fn preview_workbook_json(&self, vessel_id: Option<i64>, bytes: &[u8]) -> ApiResult<String> {
        let parsed = self.preview_workbook(vessel_id, bytes).await?;
        Ok(parsed.to_json()?)
    }

    /// 按批次 ID 与报表类型触发导入
    pub async fn trigger_import(&self, batch_id: &str, report_type: &str) -> ApiResult<DispatchOutcome> {
        if batch_id.trim().is_empty() {
            return Err(ApiError::InvalidInput("batch_id 不能为空".to_string()));
        }
        Ok(self.dispatcher.dispatch_named(batch_id, report_type).await?)
    }

    pub async fn get_batch(&self, batch_id: &str) -> ApiResult<BatchFile> {
        self.batches
            .find_batch(batch_id)
            .await?
            .ok_or_else(|| ApiError::NotFound(format!("批次不存在: {}", batch_id)))
    }

    pub async fn list_batches(&self, vessel_id: i64) -> ApiResult<Vec<BatchFile>> {
        Ok(self.batches.list_batches(vessel_id).await?)
    }
}
