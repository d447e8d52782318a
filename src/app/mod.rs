// ==========================================
// 船舶离线报表系统 - 应用层
// ==========================================
// 职责: 装配仓储、配置与 API，供 CLI / 外部服务调用
// ==========================================

pub mod state;

// 重导出
pub use state::{get_default_db_path, AppState};
