// ==========================================
// 船舶离线报表系统 - 回传导入层
// ==========================================
// 流程: 工作簿解析 → 每表一个 CSV（按批次 ID 命名）→ 触发命名导入过程
// 两个阶段之间没有事务关联；失败时保留 CSV 以便单独重试导入
// ==========================================

// 模块声明
pub mod cell_format;
pub mod csv_extractor;
pub mod dispatcher;
pub mod error;
pub mod pipeline_trait;
pub mod staging;
pub mod workbook_parser;

// 重导出核心类型
pub use cell_format::{format_cell, serial_to_datetime, DATETIME_FORMAT};
pub use csv_extractor::{artifact_path, read_csv, write_csv, CsvExtractor};
pub use dispatcher::ImportDispatcher;
pub use error::{ImportError, ImportResult};
pub use pipeline_trait::{ProcedureExecutor, ProcedureFailure};
pub use staging::{sanitize_headers, sanitize_identifier, staging_table_name, StagingProvisioner};
pub use workbook_parser::{ParsedSheet, ParsedWorkbook, WorkbookParser};
