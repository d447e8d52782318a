// ==========================================
// 船舶离线报表系统 - 导入批次
// ==========================================
// 生命周期: 解析器创建 → 导入调度消费（可重试）→ 不自动删除
// ==========================================

use crate::domain::types::{BatchStatus, ReportType};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

// ==========================================
// SheetArtifact - 单个工作表导出的 CSV
// ==========================================
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SheetArtifact {
    pub sheet_name: String,
    pub csv_path: PathBuf,
    pub row_count: usize,
    pub mirrored: bool, // 镜像目录是否写入成功
}

// ==========================================
// BatchFile - 一次上传对应的批次
// ==========================================
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BatchFile {
    pub batch_id: String,
    pub vessel_id: i64,
    pub status: BatchStatus,
    pub artifacts: Vec<SheetArtifact>,
    pub created_at: DateTime<Utc>,
    pub last_report_type: Option<ReportType>,
    pub last_message: Option<String>,
}

impl BatchFile {
    pub fn new(batch_id: String, vessel_id: i64, artifacts: Vec<SheetArtifact>) -> Self {
        Self {
            batch_id,
            vessel_id,
            status: BatchStatus::Parsed,
            artifacts,
            created_at: Utc::now(),
            last_report_type: None,
            last_message: None,
        }
    }

    pub fn total_rows(&self) -> usize {
        self.artifacts.iter().map(|a| a.row_count).sum()
    }
}

// ==========================================
// DispatchOutcome - 导入过程调用结果
// ==========================================
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DispatchOutcome {
    pub batch_id: String,
    pub report_type: ReportType,
    pub procedure: String,
    pub rows_affected: usize,
}
