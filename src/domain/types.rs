// ==========================================
// 船舶离线报表系统 - 领域类型定义
// ==========================================
// 职责: 列角色 / 值类型 / 模板类型 / 导入类型 / 批次状态
// ==========================================

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

// ==========================================
// 列角色 (Column Role)
// ==========================================
// 决定单元格是否由公式驱动、是否导出、是否隐藏
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ColumnRole {
    Input,        // 船员填写
    Computed,     // 公式计算（可见）
    HiddenHelper, // 隐藏辅助列（不导出）
}

impl fmt::Display for ColumnRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ColumnRole::Input => write!(f, "INPUT"),
            ColumnRole::Computed => write!(f, "COMPUTED"),
            ColumnRole::HiddenHelper => write!(f, "HIDDEN_HELPER"),
        }
    }
}

// ==========================================
// 值类型 (Value Kind)
// ==========================================
// 仅影响单元格数字格式，不做校验
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ValueKind {
    Text,
    Number,
    DateTime,
}

// ==========================================
// 模板类型 (Template Kind)
// ==========================================
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum TemplateKind {
    Standard, // 常规模板
    Bulk,     // 批量模板（预建 staging 表）
}

impl TemplateKind {
    /// 批量模板需要在返回文件前预建 staging 表
    pub fn provisions_staging(&self) -> bool {
        matches!(self, TemplateKind::Bulk)
    }
}

impl fmt::Display for TemplateKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TemplateKind::Standard => write!(f, "standard"),
            TemplateKind::Bulk => write!(f, "bulk"),
        }
    }
}

impl FromStr for TemplateKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "standard" | "" => Ok(TemplateKind::Standard),
            "bulk" => Ok(TemplateKind::Bulk),
            other => Err(format!("未知模板类型: {}", other)),
        }
    }
}

// ==========================================
// 导入类型 (Report Type)
// ==========================================
// 每种类型对应一个下游导入过程
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ReportType {
    Single,
    Bulk,
    Voyage,
    Bunker,
}

impl ReportType {
    /// 下游导入过程名
    pub fn procedure_name(&self) -> &'static str {
        match self {
            ReportType::Single => "import_single_report",
            ReportType::Bulk => "import_bulk_report",
            ReportType::Voyage => "import_voyage_report",
            ReportType::Bunker => "import_bunker_report",
        }
    }
}

impl fmt::Display for ReportType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ReportType::Single => write!(f, "single"),
            ReportType::Bulk => write!(f, "bulk"),
            ReportType::Voyage => write!(f, "voyage"),
            ReportType::Bunker => write!(f, "bunker"),
        }
    }
}

impl FromStr for ReportType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "single" => Ok(ReportType::Single),
            "bulk" => Ok(ReportType::Bulk),
            "voyage" => Ok(ReportType::Voyage),
            "bunker" => Ok(ReportType::Bunker),
            other => Err(format!("未知导入类型: {}", other)),
        }
    }
}

// ==========================================
// 物料类别 (Item Category)
// ==========================================
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ItemCategory {
    Fuel,
    LubeOil,
    Water,
}

impl fmt::Display for ItemCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ItemCategory::Fuel => write!(f, "FUEL"),
            ItemCategory::LubeOil => write!(f, "LUBE"),
            ItemCategory::Water => write!(f, "WATER"),
        }
    }
}

impl FromStr for ItemCategory {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_uppercase().as_str() {
            "FUEL" => Ok(ItemCategory::Fuel),
            "LUBE" | "LUBE_OIL" => Ok(ItemCategory::LubeOil),
            "WATER" => Ok(ItemCategory::Water),
            other => Err(format!("未知物料类别: {}", other)),
        }
    }
}

// ==========================================
// 批次状态 (Batch Status)
// ==========================================
// PARSED → IMPORTED | FAILED；FAILED 可重试
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum BatchStatus {
    Parsed,
    Imported,
    Failed,
}

impl fmt::Display for BatchStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BatchStatus::Parsed => write!(f, "PARSED"),
            BatchStatus::Imported => write!(f, "IMPORTED"),
            BatchStatus::Failed => write!(f, "FAILED"),
        }
    }
}

impl FromStr for BatchStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim() {
            "PARSED" => Ok(BatchStatus::Parsed),
            "IMPORTED" => Ok(BatchStatus::Imported),
            "FAILED" => Ok(BatchStatus::Failed),
            other => Err(format!("未知批次状态: {}", other)),
        }
    }
}
