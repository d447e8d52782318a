// ==========================================
// 船舶离线报表系统 - 模板生成错误类型
// ==========================================
// 约束: 对外只暴露 GenerationFailed（点名船舶），不返回部分模板
// ==========================================

use crate::repository::error::RepositoryError;
use rust_xlsxwriter::XlsxError;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum TemplateError {
    #[error("船舶 {vessel_id} 模板生成失败: {reason}")]
    GenerationFailed { vessel_id: i64, reason: String },

    #[error("xlsx 序列化失败: {0}")]
    Xlsx(#[from] XlsxError),

    #[error("staging 表预建失败: {0}")]
    Staging(String),

    #[error(transparent)]
    Repository(#[from] RepositoryError),

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl TemplateError {
    /// 包装为点名船舶的聚合错误（已是聚合错误则原样返回）
    pub fn for_vessel(self, vessel_id: i64) -> Self {
        match self {
            TemplateError::GenerationFailed { .. } => self,
            other => TemplateError::GenerationFailed {
                vessel_id,
                reason: other.to_string(),
            },
        }
    }
}

pub type TemplateResult<T> = Result<T, TemplateError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_for_vessel_wraps_once() {
        let err = TemplateError::Staging("disk full".to_string()).for_vessel(7);
        assert_eq!(err.to_string(), "船舶 7 模板生成失败: staging 表预建失败: disk full");
        let again = err.for_vessel(8);
        assert!(matches!(again, TemplateError::GenerationFailed { vessel_id: 7, .. }));
    }
}
