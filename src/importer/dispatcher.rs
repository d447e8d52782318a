// ==========================================
// 船舶离线报表系统 - 导入调度
// ==========================================
// 职责: 批次 ID + 报表类型 → 调用对应的命名导入过程
// 状态: PARSED → IMPORTED | FAILED；FAILED 可重试；IMPORTED 拒绝重复导入
// 约束: 过程失败信息原样上抛；CSV 产物不删除
// ==========================================

use crate::domain::batch::DispatchOutcome;
use crate::domain::types::{BatchStatus, ReportType};
use crate::importer::error::{ImportError, ImportResult};
use crate::importer::pipeline_trait::ProcedureExecutor;
use crate::repository::BatchRepository;
use std::sync::Arc;
use tracing::{error, info, instrument};

pub struct ImportDispatcher {
    batches: Arc<dyn BatchRepository>,
    executor: Arc<dyn ProcedureExecutor>,
}

impl ImportDispatcher {
    pub fn new(batches: Arc<dyn BatchRepository>, executor: Arc<dyn ProcedureExecutor>) -> Self {
        Self { batches, executor }
    }

    /// 触发导入
    ///
    /// # 返回
    /// - Err(BatchNotFound): 批次不存在
    /// - Err(BatchAlreadyImported): 批次已成功导入
    /// - Err(ProcedureFailed): 过程失败（message 为原文），批次标记 FAILED
    #[instrument(skip(self))]
    pub async fn dispatch(&self, batch_id: &str, report_type: ReportType) -> ImportResult<DispatchOutcome> {
        let batch = self
            .batches
            .find_batch(batch_id)
            .await?
            .ok_or_else(|| ImportError::BatchNotFound(batch_id.to_string()))?;

        if batch.status == BatchStatus::Imported {
            return Err(ImportError::BatchAlreadyImported(batch_id.to_string()));
        }

        let procedure = report_type.procedure_name();
        info!(batch_id, procedure, status = %batch.status, "调用导入过程");

        match self.executor.execute(procedure, batch_id).await {
            Ok(rows_affected) => {
                self.batches
                    .update_status(batch_id, BatchStatus::Imported, report_type, None)
                    .await?;
                info!(batch_id, procedure, rows_affected, "导入过程执行成功");
                Ok(DispatchOutcome {
                    batch_id: batch_id.to_string(),
                    report_type,
                    procedure: procedure.to_string(),
                    rows_affected,
                })
            }
            Err(failure) => {
                error!(batch_id, procedure, message = %failure, "导入过程执行失败");
                self.batches
                    .update_status(
                        batch_id,
                        BatchStatus::Failed,
                        report_type,
                        Some(&failure.message),
                    )
                    .await?;
                Err(ImportError::ProcedureFailed {
                    procedure: procedure.to_string(),
                    message: failure.message,
                })
            }
        }
    }

    /// 字符串形式的报表类型
    pub async fn dispatch_named(&self, batch_id: &str, report_type: &str) -> ImportResult<DispatchOutcome> {
        let report_type: ReportType = report_type
            .parse()
            .map_err(|_| ImportError::InvalidReportType(report_type.to_string()))?;
        self.dispatch(batch_id, report_type).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::batch::BatchFile;
    use crate::importer::pipeline_trait::ProcedureFailure;
    use crate::repository::RepositoryResult;
    use async_trait::async_trait;
    use std::collections::HashMap;
    use std::sync::Mutex;

    #[derive(Default)]
    struct MemoryBatches {
        rows: Mutex<HashMap<String, BatchFile>>,
    }

    #[async_trait]
    impl BatchRepository for MemoryBatches {
        async fn insert_batch(&self, batch: &BatchFile) -> RepositoryResult<()> {
            self.rows
                .lock()
                .unwrap()
                .insert(batch.batch_id.clone(), batch.clone());
            Ok(())
        }

        async fn find_batch(&self, batch_id: &str) -> RepositoryResult<Option<BatchFile>> {
            Ok(self.rows.lock().unwrap().get(batch_id).cloned())
        }

        async fn update_status(
            &self,
            batch_id: &str,
            status: BatchStatus,
            report_type: ReportType,
            message: Option<&str>,
        ) -> RepositoryResult<()> {
            let mut rows = self.rows.lock().unwrap();
            let batch = rows.get_mut(batch_id).unwrap();
            batch.status = status;
            batch.last_report_type = Some(report_type);
            batch.last_message = message.map(str::to_string);
            Ok(())
        }

        async fn list_batches(&self, _vessel_id: i64) -> RepositoryResult<Vec<BatchFile>> {
            Ok(self.rows.lock().unwrap().values().cloned().collect())
        }
    }

    // 第一次失败，之后成功
    struct FlakyExecutor {
        calls: Mutex<Vec<String>>,
    }

    #[async_trait]
    impl ProcedureExecutor for FlakyExecutor {
        async fn execute(&self, procedure: &str, _batch_id: &str) -> Result<usize, ProcedureFailure> {
            let mut calls = self.calls.lock().unwrap();
            calls.push(procedure.to_string());
            if calls.len() == 1 {
                Err(ProcedureFailure::new("ORA-20001: ROB went negative for HFO"))
            } else {
                Ok(4)
            }
        }
    }

    async fn setup() -> (ImportDispatcher, Arc<MemoryBatches>, Arc<FlakyExecutor>) {
        let batches = Arc::new(MemoryBatches::default());
        batches
            .insert_batch(&BatchFile::new("b1".to_string(), 1, vec![]))
            .await
            .unwrap();
        let executor = Arc::new(FlakyExecutor {
            calls: Mutex::new(Vec::new()),
        });
        (
            ImportDispatcher::new(batches.clone(), executor.clone()),
            batches,
            executor,
        )
    }

    #[tokio::test]
    async fn test_failure_verbatim_then_retry() {
        let (dispatcher, batches, executor) = setup().await;

        match dispatcher.dispatch("b1", ReportType::Bunker).await {
            Err(ImportError::ProcedureFailed { procedure, message }) => {
                assert_eq!(procedure, "import_bunker_report");
                assert_eq!(message, "ORA-20001: ROB went negative for HFO");
            }
            other => panic!("unexpected: {:?}", other),
        }
        let batch = batches.find_batch("b1").await.unwrap().unwrap();
        assert_eq!(batch.status, BatchStatus::Failed);

        let outcome = dispatcher.dispatch("b1", ReportType::Bunker).await.unwrap();
        assert_eq!(outcome.rows_affected, 4);
        assert_eq!(executor.calls.lock().unwrap().len(), 2);

        // 已导入的批次拒绝再次导入
        assert!(matches!(
            dispatcher.dispatch("b1", ReportType::Bunker).await,
            Err(ImportError::BatchAlreadyImported(_))
        ));
    }

    #[tokio::test]
    async fn test_unknown_batch_and_type() {
        let (dispatcher, _, _) = setup().await;
        assert!(matches!(
            dispatcher.dispatch("nope", ReportType::Single).await,
            Err(ImportError::BatchNotFound(_))
        ));
        assert!(matches!(
            dispatcher.dispatch_named("b1", "daily").await,
            Err(ImportError::InvalidReportType(_))
        ));
    }
}
