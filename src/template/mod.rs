// ==========================================
// 船舶离线报表系统 - 模板生成层
// ==========================================
// 职责: Lookup Catalog → 多表工作簿（公式 + 级联下拉 + 保护）→ xlsx
// 红线: 公式只经由 formula 层构建；不返回部分模板
// ==========================================

pub mod error;
pub mod generator;
pub mod layout;
pub mod model;
pub mod protection;
pub mod sheets;
pub mod writer;

pub use error::{TemplateError, TemplateResult};
pub use generator::{
    build_workbook, template_file_name, BuiltWorkbook, GeneratedTemplate, TemplateGenerator,
    UploadToken, TOKEN_HEADERS,
};
pub use layout::LookupLayout;
pub use model::{
    CellContent, CellLock, ListSource, ListValidation, ProtectionPlan, SheetTemplate,
    TemplateColumn, WorkbookTemplate,
};
pub use protection::{ProtectionEnforcer, ProtectionError};
pub use sheets::{build_sheet, SheetContext};
pub use writer::render_workbook;
