// ==========================================
// 船舶离线报表系统 - 业务配置
// ==========================================
// 职责: 纯业务取值（作业类型、占位符、加油单槽位上限、保护口令、可编辑公式列）
// 约束: 不含任何布局常量（见 layout_config）
// ==========================================

use serde::{Deserialize, Serialize};

/// 默认加油单槽位上限（每个油品类型最多展示的加油单数）
pub const DEFAULT_NOTE_SLOT_LIMIT: usize = 10;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DomainConfig {
    /// Voyage 表 Operation 列的内联候选
    pub operation_types: Vec<String>,

    /// 视同空白的占位符（比较时忽略大小写与首尾空白）
    pub not_applicable: Vec<String>,

    /// 加油单槽位上限；超出部分静默丢弃
    pub note_slot_limit: usize,

    /// 工作表保护口令
    pub protection_password: String,

    /// 保持可见可编辑的公式列（按表头匹配）
    pub editable_formula_columns: Vec<String>,
}

impl Default for DomainConfig {
    fn default() -> Self {
        Self {
            operation_types: vec![
                "Sea Passage".to_string(),
                "Maneuvering".to_string(),
                "Port Stay".to_string(),
                "Anchorage".to_string(),
                "Drifting".to_string(),
            ],
            not_applicable: vec!["N/A".to_string()],
            note_slot_limit: DEFAULT_NOTE_SLOT_LIMIT,
            protection_password: "vessel-report".to_string(),
            editable_formula_columns: vec!["Consumption (MT)".to_string()],
        }
    }
}

impl DomainConfig {
    /// 是否为"不适用"占位符
    pub fn is_placeholder(&self, value: &str) -> bool {
        let trimmed = value.trim();
        self.not_applicable
            .iter()
            .any(|p| p.trim().eq_ignore_ascii_case(trimmed))
    }

    pub fn is_editable_formula(&self, header: &str) -> bool {
        self.editable_formula_columns.iter().any(|h| h == header)
    }
}
