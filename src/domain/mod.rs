// ==========================================
// 船舶离线报表系统 - 领域模型层
// ==========================================
// 职责: 定义领域实体、类型、工作表契约
// 红线: 不含数据访问逻辑,不含生成/解析逻辑
// ==========================================

pub mod batch;
pub mod catalog;
pub mod sheet;
pub mod types;

// 重导出核心类型
pub use batch::{BatchFile, DispatchOutcome, SheetArtifact};
pub use catalog::{
    BunkerNoteEntry, ItemTypeEntry, MachineryEntry, PortEntry, TimezoneEntry, VesselInfo,
    VoyageEntry,
};
pub use sheet::{ColumnSpec, SheetKind};
pub use types::{BatchStatus, ColumnRole, ItemCategory, ReportType, TemplateKind, ValueKind};
