// ==========================================
// 船舶离线报表系统 - 参考数据实体
// ==========================================
// 职责: 单船参考数据的行结构（机器/油品/加油单/航次/港口/时区）
// 来源: ReferenceDataRepository
// ==========================================

use crate::domain::types::ItemCategory;
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

// ==========================================
// VesselInfo - 船舶基本信息
// ==========================================
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VesselInfo {
    pub vessel_id: i64,
    pub short_code: String, // 船舶简码（用于 staging 表名/文件名）
    pub name: String,
}

// ==========================================
// MachineryEntry - 机器设备
// ==========================================
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MachineryEntry {
    pub machinery_id: i64,
    pub name: String,
    pub category: String,     // 主机/副机/锅炉 ...
    pub rated_power_kw: f64,  // 额定功率
    pub sfoc_g_kwh: f64,      // 燃油消耗率
}

// ==========================================
// ItemTypeEntry - 燃油/滑油类型 + 当前 ROB
// ==========================================
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ItemTypeEntry {
    pub item_type_id: i64,
    pub type_key: String,
    pub category: ItemCategory,
    pub rob: f64,
}

// ==========================================
// BunkerNoteEntry - 加油单（一次交付批次）
// ==========================================
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BunkerNoteEntry {
    pub note_id: i64,
    pub type_key: String,
    pub note_no: String,
    pub bunker_date: Option<NaiveDate>,
    pub remaining_qty: f64,
}

// ==========================================
// VoyageEntry - 航次/航段
// ==========================================
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VoyageEntry {
    pub voyage_id: i64,
    pub voyage_no: String,
    pub leg_no: Option<i64>,
}

// ==========================================
// PortEntry - 港口
// ==========================================
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PortEntry {
    pub port_id: i64,
    pub name: String,
    pub unlocode: Option<String>,
}

// ==========================================
// TimezoneEntry - 时区
// ==========================================
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TimezoneEntry {
    pub label: String,
    pub utc_offset_minutes: i32,
}
