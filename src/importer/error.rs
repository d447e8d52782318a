// ==========================================
// 船舶离线报表系统 - 导入模块错误类型
// ==========================================
// 工具: thiserror 派生宏
// 约束: ProcedureFailed.message 为执行器原文，不做任何改写
// ==========================================

use crate::repository::error::RepositoryError;
use thiserror::Error;

/// 导入模块错误类型
#[derive(Error, Debug)]
pub enum ImportError {
    // ===== 文件相关错误 =====
    #[error("文件不存在: {0}")]
    FileNotFound(String),

    #[error("文件格式不支持: {0}（仅支持 .xlsx）")]
    UnsupportedFormat(String),

    #[error("文件读取失败: {0}")]
    FileReadError(String),

    #[error("Excel 解析失败: {0}")]
    ExcelParseError(String),

    #[error("工作表不可读 (sheet={sheet}): {message}")]
    SheetUnreadable { sheet: String, message: String },

    #[error("CSV 写入失败: {0}")]
    CsvWriteError(String),

    // ===== 批次错误 =====
    #[error("批次不存在: {0}")]
    BatchNotFound(String),

    #[error("批次已导入，不可重复导入: {0}")]
    BatchAlreadyImported(String),

    #[error("报表类型无效: {0}")]
    InvalidReportType(String),

    // ===== 下游过程错误 =====
    #[error("导入过程 {procedure} 执行失败: {message}")]
    ProcedureFailed { procedure: String, message: String },

    // ===== staging 错误 =====
    #[error("staging 表处理失败 (table={table}): {message}")]
    StagingError { table: String, message: String },

    // ===== 配置错误 =====
    #[error("配置读取失败: {0}")]
    ConfigReadError(String),

    // ===== 透传 =====
    #[error(transparent)]
    Repository(#[from] RepositoryError),

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl From<csv::Error> for ImportError {
    fn from(err: csv::Error) -> Self {
        ImportError::CsvWriteError(err.to_string())
    }
}

impl From<calamine::XlsxError> for ImportError {
    fn from(err: calamine::XlsxError) -> Self {
        ImportError::ExcelParseError(err.to_string())
    }
}

/// Result 类型别名
pub type ImportResult<T> = Result<T, ImportError>;
