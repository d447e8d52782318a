// ==========================================
// 船舶离线报表系统 - 导入流水线接缝
// ==========================================
// 职责: 定义导入调度依赖的外部协作方接口（不包含实现）
// 实现者: repository::procedure_repo::SqliteProcedureExecutor
// ==========================================

use async_trait::async_trait;
use std::fmt;

/// 过程执行失败（message 为执行方原文）
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProcedureFailure {
    pub message: String,
}

impl ProcedureFailure {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

impl fmt::Display for ProcedureFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.message)
    }
}

// ==========================================
// ProcedureExecutor Trait
// ==========================================
// 用途: 按名称调用下游导入过程，以批次 ID 为唯一参数
// 职责边界: 调用即结束，失败信息原样返回
#[async_trait]
pub trait ProcedureExecutor: Send + Sync {
    /// 执行命名过程
    ///
    /// # 返回
    /// - Ok(usize): 受影响行数
    /// - Err(ProcedureFailure): 执行方的原始错误信息
    async fn execute(&self, procedure: &str, batch_id: &str) -> Result<usize, ProcedureFailure>;
}
