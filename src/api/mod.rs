// ==========================================
// 船舶离线报表系统 - API 层
// ==========================================
// 职责: 请求面外观（下载模板 / 上传 / 预览 / 触发导入）
// 说明: HTTP 路由与鉴权中间件不在本 crate 内；此处只关心授权已通过
// ==========================================

pub mod error;
pub mod import_api;
pub mod template_api;

// 重导出核心类型
pub use error::{ApiError, ApiResult};
pub use import_api::{ImportApi, UploadResponse};
pub use template_api::{TemplateApi, TemplateDownload, XLSX_CONTENT_TYPE};
