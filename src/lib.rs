// ==========================================
// 船舶离线报表系统 - 核心库
// ==========================================
// 技术栈: Rust + SQLite + xlsx
// 系统定位: 离线填报模板生成 + 回传工作簿解析/导入
// 数据流: Lookup Catalog → 模板生成 → (离线填写) → 解析 → CSV → 导入过程
// ==========================================

// ==========================================
// 模块声明
// ==========================================

// 领域层 - 实体与类型
pub mod domain;

// 公式层 - 表达式模型/渲染/求值
pub mod formula;

// 参考数据快照
pub mod catalog;

// 模板生成层
pub mod template;

// 回传导入层
pub mod importer;

// 数据仓储层 - 数据访问
pub mod repository;

// 配置层
pub mod config;

// 数据库基础设施（连接初始化/PRAGMA 统一/建表）
pub mod db;

// 日志系统
pub mod logging;

// API 层 - 请求面外观
pub mod api;

// 应用层 - 装配
pub mod app;

// ==========================================
// 重导出核心类型
// ==========================================

// 领域类型
pub use domain::types::{BatchStatus, ColumnRole, ItemCategory, ReportType, TemplateKind, ValueKind};

// 领域实体
pub use domain::{BatchFile, DispatchOutcome, SheetArtifact, SheetKind};

// 生成与导入
pub use catalog::{LookupCatalog, LookupCatalogBuilder};
pub use importer::{CsvExtractor, ImportDispatcher, StagingProvisioner, WorkbookParser};
pub use template::{TemplateGenerator, WorkbookTemplate};

// API
pub use api::{ImportApi, TemplateApi};

// ==========================================
// 常量定义
// ==========================================

// 系统版本
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

// 系统名称
pub const APP_NAME: &str = "船舶离线报表系统";
