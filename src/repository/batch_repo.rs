// ==========================================
// 船舶离线报表系统 - 导入批次仓储
// ==========================================
// 职责: import_batch / batch_artifact 两表的读写
// 红线: 不含状态机规则（见 importer::dispatcher）
// ==========================================

use crate::domain::batch::{BatchFile, SheetArtifact};
use crate::domain::types::{BatchStatus, ReportType};
use crate::repository::error::{RepositoryError, RepositoryResult};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use rusqlite::{params, Connection, OptionalExtension};
use std::path::PathBuf;
use std::sync::{Arc, Mutex, MutexGuard};

#[async_trait]
pub trait BatchRepository: Send + Sync {
    /// 写入批次及其产物（同一事务）
    async fn insert_batch(&self, batch: &BatchFile) -> RepositoryResult<()>;

    async fn find_batch(&self, batch_id: &str) -> RepositoryResult<Option<BatchFile>>;

    /// 更新状态与最近一次调度信息
    async fn update_status(
        &self,
        batch_id: &str,
        status: BatchStatus,
        report_type: ReportType,
        message: Option<&str>,
    ) -> RepositoryResult<()>;

    async fn list_batches(&self, vessel_id: i64) -> RepositoryResult<Vec<BatchFile>>;
}

pub struct SqliteBatchRepository {
    conn: Arc<Mutex<Connection>>,
}

impl SqliteBatchRepository {
    pub fn from_connection(conn: Arc<Mutex<Connection>>) -> Self {
        Self { conn }
    }

    fn get_conn(&self) -> RepositoryResult<MutexGuard<'_, Connection>> {
        self.conn
            .lock()
            .map_err(|e| RepositoryError::LockError(e.to_string()))
    }

    fn load_artifacts(conn: &Connection, batch_id: &str) -> RepositoryResult<Vec<SheetArtifact>> {
        let mut stmt = conn.prepare(
            r#"
            SELECT sheet_name, csv_path, row_count, mirrored
            FROM batch_artifact
            WHERE batch_id = ?1
            ORDER BY rowid
            "#,
        )?;
        let rows = stmt.query_map(params![batch_id], |row| {
            Ok(SheetArtifact {
                sheet_name: row.get(0)?,
                csv_path: PathBuf::from(row.get::<_, String>(1)?),
                row_count: row.get::<_, i64>(2)? as usize,
                mirrored: row.get::<_, i64>(3)? != 0,
            })
        })?;
        Ok(rows.collect::<Result<Vec<_>, _>>()?)
    }
}

// import_batch 行（产物另查）
struct BatchRow {
    batch_id: String,
    vessel_id: i64,
    status: String,
    created_at: String,
    last_report_type: Option<String>,
    last_message: Option<String>,
}

impl BatchRow {
    fn into_batch(self, artifacts: Vec<SheetArtifact>) -> RepositoryResult<BatchFile> {
        let status = self
            .status
            .parse::<BatchStatus>()
            .map_err(|message| RepositoryError::FieldValueError {
                field: "status".to_string(),
                message,
            })?;
        let created_at = DateTime::parse_from_rfc3339(&self.created_at)
            .map(|d| d.with_timezone(&Utc))
            .map_err(|e| RepositoryError::FieldValueError {
                field: "created_at".to_string(),
                message: e.to_string(),
            })?;
        Ok(BatchFile {
            batch_id: self.batch_id,
            vessel_id: self.vessel_id,
            status,
            artifacts,
            created_at,
            last_report_type: self
                .last_report_type
                .and_then(|t| t.parse::<ReportType>().ok()),
            last_message: self.last_message,
        })
    }
}

const BATCH_COLUMNS: &str =
    "batch_id, vessel_id, status, created_at, last_report_type, last_message";

fn map_batch_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<BatchRow> {
    Ok(BatchRow {
        batch_id: row.get(0)?,
        vessel_id: row.get(1)?,
        status: row.get(2)?,
        created_at: row.get(3)?,
        last_report_type: row.get(4)?,
        last_message: row.get(5)?,
    })
}

#[async_trait]
impl BatchRepository for SqliteBatchRepository {
    async fn insert_batch(&self, batch: &BatchFile) -> RepositoryResult<()> {
        let mut conn = self.get_conn()?;
        let tx = conn.transaction()?;

        tx.execute(
            r#"
            INSERT INTO import_batch (batch_id, vessel_id, status, created_at, last_report_type, last_message)
            VALUES (?1, ?2, ?3, ?4, ?5, ?6)
            "#,
            params![
                batch.batch_id,
                batch.vessel_id,
                batch.status.to_string(),
                batch.created_at.to_rfc3339(),
                batch.last_report_type.map(|t| t.to_string()),
                batch.last_message,
            ],
        )?;

        for artifact in &batch.artifacts {
            tx.execute(
                r#"
                INSERT INTO batch_artifact (batch_id, sheet_name, csv_path, row_count, mirrored)
                VALUES (?1, ?2, ?3, ?4, ?5)
                "#,
                params![
                    batch.batch_id,
                    artifact.sheet_name,
                    artifact.csv_path.to_string_lossy().to_string(),
                    artifact.row_count as i64,
                    artifact.mirrored as i64,
                ],
            )?;
        }

        tx.commit()
            .map_err(|e| RepositoryError::DatabaseTransactionError(e.to_string()))?;
        Ok(())
    }

    async fn find_batch(&self, batch_id: &str) -> RepositoryResult<Option<BatchFile>> {
        let conn = self.get_conn()?;
        let row = conn
            .query_row(
                &format!("SELECT {} FROM import_batch WHERE batch_id = ?1", BATCH_COLUMNS),
                params![batch_id],
                map_batch_row,
            )
            .optional()?;

        match row {
            Some(row) => {
                let artifacts = Self::load_artifacts(&conn, batch_id)?;
                Ok(Some(row.into_batch(artifacts)?))
            }
            None => Ok(None),
        }
    }

    async fn update_status(
        &self,
        batch_id: &str,
        status: BatchStatus,
        report_type: ReportType,
        message: Option<&str>,
    ) -> RepositoryResult<()> {
        let conn = self.get_conn()?;
        let updated = conn.execute(
            r#"
            UPDATE import_batch
            SET status = ?2, last_report_type = ?3, last_message = ?4
            WHERE batch_id = ?1
            "#,
            params![batch_id, status.to_string(), report_type.to_string(), message],
        )?;
        if updated == 0 {
            return Err(RepositoryError::NotFound {
                entity: "import_batch".to_string(),
                id: batch_id.to_string(),
            });
        }
        Ok(())
    }

    async fn list_batches(&self, vessel_id: i64) -> RepositoryResult<Vec<BatchFile>> {
        let conn = self.get_conn()?;
        let mut stmt = conn.prepare(&format!(
            "SELECT {} FROM import_batch WHERE vessel_id = ?1 ORDER BY created_at DESC",
            BATCH_COLUMNS
        ))?;
        let rows = stmt
            .query_map(params![vessel_id], map_batch_row)?
            .collect::<Result<Vec<_>, _>>()?;

        let mut batches = Vec::with_capacity(rows.len());
        for row in rows {
            let artifacts = Self::load_artifacts(&conn, &row.batch_id)?;
            batches.push(row.into_batch(artifacts)?);
        }
        Ok(batches)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::ensure_schema;

    fn repo() -> SqliteBatchRepository {
        let conn = Connection::open_in_memory().unwrap();
        ensure_schema(&conn).unwrap();
        SqliteBatchRepository::from_connection(Arc::new(Mutex::new(conn)))
    }

    fn artifact(sheet: &str) -> SheetArtifact {
        SheetArtifact {
            sheet_name: sheet.to_string(),
            csv_path: PathBuf::from(format!("/tmp/{}.csv", sheet)),
            row_count: 3,
            mirrored: false,
        }
    }

    #[tokio::test]
    async fn test_insert_and_find() {
        let repo = repo();
        let batch = BatchFile::new(
            "b-1".to_string(),
            7,
            vec![artifact("Voyage"), artifact("Machinery")],
        );
        repo.insert_batch(&batch).await.unwrap();

        let found = repo.find_batch("b-1").await.unwrap().unwrap();
        assert_eq!(found.status, BatchStatus::Parsed);
        assert_eq!(found.artifacts.len(), 2);
        assert_eq!(found.artifacts[0].sheet_name, "Voyage");
        assert_eq!(found.total_rows(), 6);

        assert!(repo.find_batch("missing").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_update_status() {
        let repo = repo();
        repo.insert_batch(&BatchFile::new("b-2".to_string(), 7, vec![]))
            .await
            .unwrap();
        repo.update_status("b-2", BatchStatus::Failed, ReportType::Bulk, Some("boom"))
            .await
            .unwrap();

        let found = repo.find_batch("b-2").await.unwrap().unwrap();
        assert_eq!(found.status, BatchStatus::Failed);
        assert_eq!(found.last_report_type, Some(ReportType::Bulk));
        assert_eq!(found.last_message.as_deref(), Some("boom"));

        let err = repo
            .update_status("nope", BatchStatus::Imported, ReportType::Single, None)
            .await
            .unwrap_err();
        assert!(matches!(err, RepositoryError::NotFound { .. }));
    }
}
