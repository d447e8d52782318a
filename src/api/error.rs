// ==========================================
// 船舶离线报表系统 - API 层错误类型
// ==========================================
// 职责: 把各层错误转换为调用方可读的错误
// 约束: 导入过程失败信息原样透传
// ==========================================

use crate::config::ConfigError;
use crate::importer::error::ImportError;
use crate::repository::error::RepositoryError;
use crate::template::error::TemplateError;
use thiserror::Error;

/// API 层错误类型
#[derive(Error, Debug)]
pub enum ApiError {
    // ===== 请求错误 =====
    #[error("无效输入: {0}")]
    InvalidInput(String),

    #[error("资源未找到: {0}")]
    NotFound(String),

    #[error("上传凭据不匹配: {0}")]
    TokenMismatch(String),

    #[error("业务规则违反: {0}")]
    BusinessRuleViolation(String),

    // ===== 生成/导入错误 =====
    #[error("模板生成失败 (vessel_id={vessel_id}): {reason}")]
    TemplateGenerationFailed { vessel_id: i64, reason: String },

    #[error("文件导入失败: {0}")]
    ImportError(String),

    /// 下游导入过程失败（message 为原文）
    #[error("{message}")]
    ProcedureFailed { procedure: String, message: String },

    // ===== 数据访问错误 =====
    #[error("配置读取失败: {0}")]
    ConfigError(String),

    #[error("数据库错误: {0}")]
    DatabaseError(String),

    #[error("数据库连接失败: {0}")]
    DatabaseConnectionError(String),

    #[error("数据库事务失败: {0}")]
    DatabaseTransactionError(String),

    // ===== 通用错误 =====
    #[error("内部错误: {0}")]
    InternalError(String),

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

// ==========================================
// 从 RepositoryError 转换
// ==========================================
impl From<RepositoryError> for ApiError {
    fn from(err: RepositoryError) -> Self {
        match err {
            RepositoryError::NotFound { entity, id } => {
                ApiError::NotFound(format!("{}(id={})不存在", entity, id))
            }
            RepositoryError::LockError(msg) => {
                ApiError::DatabaseConnectionError(format!("数据库锁获取失败: {}", msg))
            }
            RepositoryError::DatabaseTransactionError(msg) => {
                ApiError::DatabaseTransactionError(msg)
            }
            RepositoryError::DatabaseQueryError(msg) => ApiError::DatabaseError(msg),
            RepositoryError::UniqueConstraintViolation(msg) => {
                ApiError::BusinessRuleViolation(format!("唯一约束违反: {}", msg))
            }
            RepositoryError::ForeignKeyViolation(msg) => {
                ApiError::BusinessRuleViolation(format!("外键约束违反: {}", msg))
            }
            RepositoryError::FieldValueError { field, message } => {
                ApiError::InvalidInput(format!("字段{}错误: {}", field, message))
            }
            RepositoryError::Other(err) => ApiError::Other(err),
        }
    }
}

// ==========================================
// 从 TemplateError 转换
// ==========================================
impl From<TemplateError> for ApiError {
    fn from(err: TemplateError) -> Self {
        match err {
            TemplateError::GenerationFailed { vessel_id, reason } => {
                ApiError::TemplateGenerationFailed { vessel_id, reason }
            }
            other => ApiError::InternalError(other.to_string()),
        }
    }
}

// ==========================================
// 从 ImportError 转换
// ==========================================
impl From<ImportError> for ApiError {
    fn from(err: ImportError) -> Self {
        match err {
            ImportError::ProcedureFailed { procedure, message } => {
                ApiError::ProcedureFailed { procedure, message }
            }
            ImportError::BatchNotFound(id) => ApiError::NotFound(format!("批次不存在: {}", id)),
            ImportError::BatchAlreadyImported(id) => {
                ApiError::BusinessRuleViolation(format!("批次已导入: {}", id))
            }
            ImportError::InvalidReportType(t) => ApiError::InvalidInput(format!("报表类型无效: {}", t)),
            ImportError::Repository(e) => ApiError::from(e),
            other => ApiError::ImportError(other.to_string()),
        }
    }
}

impl From<ConfigError> for ApiError {
    fn from(err: ConfigError) -> Self {
        ApiError::ConfigError(err.to_string())
    }
}

/// Result 类型别名
pub type ApiResult<T> = Result<T, ApiError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_procedure_message_is_verbatim() {
        let err: ApiError = ImportError::ProcedureFailed {
            procedure: "import_single_report".to_string(),
            message: "constraint failed: ROB < 0".to_string(),
        }
        .into();
        assert_eq!(err.to_string(), "constraint failed: ROB < 0");
    }

    #[test]
    fn test_not_found_mapping() {
        let err: ApiError = RepositoryError::NotFound {
            entity: "vessel".to_string(),
            id: "9".to_string(),
        }
        .into();
        assert!(matches!(err, ApiError::NotFound(_)));
    }
}
