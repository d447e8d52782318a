// ==========================================
// 船舶离线报表系统 - 布局配置
// ==========================================
// 职责: 纯布局取值（行数上限、列宽、隐藏表名称、冻结表头）
// ==========================================

use crate::domain::types::TemplateKind;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LayoutConfig {
    /// 标准模板预置行数（含表头，1 起）
    pub standard_max_row: u32,
    /// 批量模板预置行数
    pub bulk_max_row: u32,
    pub default_column_width: f64,
    pub helper_column_width: f64,
    pub lookup_sheet: String,
    pub token_sheet: String,
    pub freeze_header: bool,
}

impl Default for LayoutConfig {
    fn default() -> Self {
        Self {
            standard_max_row: 100,
            bulk_max_row: 500,
            default_column_width: 18.0,
            helper_column_width: 4.0,
            lookup_sheet: "Lookup".to_string(),
            token_sheet: "__token__".to_string(),
            freeze_header: true,
        }
    }
}

impl LayoutConfig {
    pub fn max_row(&self, kind: TemplateKind) -> u32 {
        match kind {
            TemplateKind::Standard => self.standard_max_row,
            TemplateKind::Bulk => self.bulk_max_row,
        }
    }
}
