// ==========================================
// 船舶离线报表系统 - 工作表契约
// ==========================================
// 职责: 定义数据工作表的列顺序、列角色、驱动列与导出列数上限
// 约束: 隐藏辅助列必须位于导出列数上限之后
// 使用方: 模板生成引擎（写入）+ 工作簿解析器（读取）
// ==========================================

use crate::domain::types::{ColumnRole, ValueKind};
use serde::{Deserialize, Serialize};

// ==========================================
// ColumnSpec - 列定义
// ==========================================
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ColumnSpec {
    pub header: &'static str,
    pub role: ColumnRole,
    pub kind: ValueKind,
}

const fn input(header: &'static str, kind: ValueKind) -> ColumnSpec {
    ColumnSpec {
        header,
        role: ColumnRole::Input,
        kind,
    }
}

const fn computed(header: &'static str, kind: ValueKind) -> ColumnSpec {
    ColumnSpec {
        header,
        role: ColumnRole::Computed,
        kind,
    }
}

const fn helper(header: &'static str) -> ColumnSpec {
    ColumnSpec {
        header,
        role: ColumnRole::HiddenHelper,
        kind: ValueKind::Text,
    }
}

// ==========================================
// 列索引常量（0 起）
// ==========================================
pub mod voyage_cols {
    pub const VOYAGE_NO: u16 = 0;
    pub const VOYAGE_ID: u16 = 1;
    pub const LEG_NO: u16 = 2;
    pub const OPERATION: u16 = 3;
    pub const DEPARTURE_PORT: u16 = 4;
    pub const DEPARTURE_PORT_ID: u16 = 5;
    pub const DEPARTURE_TIME: u16 = 6;
    pub const ARRIVAL_PORT: u16 = 7;
    pub const ARRIVAL_PORT_ID: u16 = 8;
    pub const ARRIVAL_TIME: u16 = 9;
    pub const TIMEZONE: u16 = 10;
    pub const DISTANCE: u16 = 11;
    pub const STEAMING_HOURS: u16 = 12;
    pub const AVG_SPEED: u16 = 13;
}

pub mod machinery_cols {
    pub const VOYAGE_NO: u16 = 0;
    pub const MACHINERY_NAME: u16 = 1;
    pub const MACHINERY_ID: u16 = 2;
    pub const RATED_POWER: u16 = 3;
    pub const START_COUNTER: u16 = 4;
    pub const END_COUNTER: u16 = 5;
    pub const RUNNING_HOURS: u16 = 6;
    pub const LOAD_PCT: u16 = 7;
    pub const FUEL_TYPE: u16 = 8;
    pub const FUEL_TYPE_ID: u16 = 9;
    pub const BUNKER_NOTE: u16 = 10;
    pub const CONSUMPTION: u16 = 11;
    pub const REMARKS: u16 = 12;
    pub const VOYAGE_CARRY: u16 = 13;
    pub const NOTE_RANGE: u16 = 14;
}

pub mod lube_cols {
    pub const VOYAGE_NO: u16 = 0;
    pub const MACHINERY_NAME: u16 = 1;
    pub const MACHINERY_ID: u16 = 2;
    pub const LUBE_TYPE: u16 = 3;
    pub const LUBE_TYPE_ID: u16 = 4;
    pub const LUBE_NOTE: u16 = 5;
    pub const QUANTITY: u16 = 6;
    pub const REMARKS: u16 = 7;
    pub const VOYAGE_CARRY: u16 = 8;
    pub const NOTE_RANGE: u16 = 9;
}

pub mod bunkering_cols {
    pub const VOYAGE_NO: u16 = 0;
    pub const ITEM_TYPE: u16 = 1;
    pub const ITEM_TYPE_ID: u16 = 2;
    pub const BUNKER_DATE: u16 = 3;
    pub const PORT: u16 = 4;
    pub const PORT_ID: u16 = 5;
    pub const NOTE_NO: u16 = 6;
    pub const QUANTITY: u16 = 7;
    pub const ROB_BEFORE: u16 = 8;
    pub const ROB_AFTER: u16 = 9;
    pub const REMARKS: u16 = 10;
    pub const VOYAGE_CARRY: u16 = 11;
}

const VOYAGE_COLUMNS: &[ColumnSpec] = &[
    input("Voyage No", ValueKind::Text),
    computed("Voyage ID", ValueKind::Number),
    input("Leg No", ValueKind::Number),
    input("Operation", ValueKind::Text),
    input("Departure Port", ValueKind::Text),
    computed("Departure Port ID", ValueKind::Number),
    input("Departure Time", ValueKind::DateTime),
    input("Arrival Port", ValueKind::Text),
    computed("Arrival Port ID", ValueKind::Number),
    input("Arrival Time", ValueKind::DateTime),
    input("Timezone", ValueKind::Text),
    input("Distance (NM)", ValueKind::Number),
    computed("Steaming Hours", ValueKind::Number),
    computed("Avg Speed (kn)", ValueKind::Number),
];

const MACHINERY_COLUMNS: &[ColumnSpec] = &[
    computed("Voyage No", ValueKind::Text),
    input("Machinery Name", ValueKind::Text),
    computed("Machinery ID", ValueKind::Number),
    computed("Rated Power (kW)", ValueKind::Number),
    input("Start Counter (h)", ValueKind::Number),
    input("End Counter (h)", ValueKind::Number),
    computed("Running Hours", ValueKind::Number),
    input("Load (%)", ValueKind::Number),
    input("Fuel Type", ValueKind::Text),
    computed("Fuel Type ID", ValueKind::Number),
    input("Bunker Note", ValueKind::Text),
    computed("Consumption (MT)", ValueKind::Number),
    input("Remarks", ValueKind::Text),
    helper("Voyage Carry"),
    helper("Note Range"),
];

const LUBE_COLUMNS: &[ColumnSpec] = &[
    computed("Voyage No", ValueKind::Text),
    input("Machinery Name", ValueKind::Text),
    computed("Machinery ID", ValueKind::Number),
    input("Lube Oil Type", ValueKind::Text),
    computed("Lube Oil Type ID", ValueKind::Number),
    input("Lube Oil Note", ValueKind::Text),
    input("Quantity (L)", ValueKind::Number),
    input("Remarks", ValueKind::Text),
    helper("Voyage Carry"),
    helper("Note Range"),
];

const BUNKERING_COLUMNS: &[ColumnSpec] = &[
    computed("Voyage No", ValueKind::Text),
    input("Item Type", ValueKind::Text),
    computed("Item Type ID", ValueKind::Number),
    input("Bunker Date", ValueKind::DateTime),
    input("Port", ValueKind::Text),
    computed("Port ID", ValueKind::Number),
    input("Bunker Note No", ValueKind::Text),
    input("Quantity", ValueKind::Number),
    computed("ROB Before", ValueKind::Number),
    computed("ROB After", ValueKind::Number),
    input("Remarks", ValueKind::Text),
    helper("Voyage Carry"),
];

// ==========================================
// SheetKind - 数据工作表（固定集合）
// ==========================================
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum SheetKind {
    Voyage,
    Machinery,
    LubeOil,
    Bunkering,
}

impl SheetKind {
    /// 解析器处理的工作表集合（顺序即导出顺序）
    pub const ALL: [SheetKind; 4] = [
        SheetKind::Voyage,
        SheetKind::Machinery,
        SheetKind::LubeOil,
        SheetKind::Bunkering,
    ];

    pub fn sheet_name(&self) -> &'static str {
        match self {
            SheetKind::Voyage => "Voyage",
            SheetKind::Machinery => "Machinery",
            SheetKind::LubeOil => "Lube Oil",
            SheetKind::Bunkering => "Bunkering",
        }
    }

    /// 上传根目录下的子目录
    pub fn folder(&self) -> &'static str {
        match self {
            SheetKind::Voyage => "voyage",
            SheetKind::Machinery => "machinery",
            SheetKind::LubeOil => "lube_oil",
            SheetKind::Bunkering => "bunkering",
        }
    }

    /// 文件名后缀: {batch_id}_{file_stem}.csv
    pub fn file_stem(&self) -> &'static str {
        self.folder()
    }

    pub fn columns(&self) -> &'static [ColumnSpec] {
        match self {
            SheetKind::Voyage => VOYAGE_COLUMNS,
            SheetKind::Machinery => MACHINERY_COLUMNS,
            SheetKind::LubeOil => LUBE_COLUMNS,
            SheetKind::Bunkering => BUNKERING_COLUMNS,
        }
    }

    /// 驱动列：该列为空时整行计算列为空
    pub fn driver_col(&self) -> u16 {
        match self {
            SheetKind::Voyage => voyage_cols::VOYAGE_NO,
            SheetKind::Machinery => machinery_cols::MACHINERY_NAME,
            SheetKind::LubeOil => lube_cols::MACHINERY_NAME,
            SheetKind::Bunkering => bunkering_cols::ITEM_TYPE,
        }
    }

    /// 导出列数上限（排除尾部隐藏辅助列）
    pub fn column_limit(&self) -> usize {
        self.columns()
            .iter()
            .take_while(|c| c.role != ColumnRole::HiddenHelper)
            .count()
    }

    /// 导出列表头
    pub fn export_headers(&self) -> Vec<String> {
        self.columns()
            .iter()
            .take(self.column_limit())
            .map(|c| c.header.to_string())
            .collect()
    }

    pub fn from_sheet_name(name: &str) -> Option<SheetKind> {
        Self::ALL.into_iter().find(|k| k.sheet_name() == name)
    }
}
