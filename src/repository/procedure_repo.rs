// ==========================================
// 船舶离线报表系统 - 导入过程执行器（SQLite）
// ==========================================
// 职责: 从 import_procedure 表取出过程 SQL，逐条执行并绑定 :batch_id
// 约束: 整个过程在一个事务内执行，失败回滚；错误信息原样返回
// 影响行数取 total_changes() 差值（DDL 不会重置 changes()）
// ==========================================

use crate::importer::pipeline_trait::{ProcedureExecutor, ProcedureFailure};
use crate::repository::error::{RepositoryError, RepositoryResult};
use async_trait::async_trait;
use rusqlite::{params, Batch, Connection, OptionalExtension};
use std::sync::{Arc, Mutex};

/// 过程 SQL 中的批次参数名
pub const BATCH_ID_PARAM: &str = ":batch_id";

pub struct SqliteProcedureExecutor {
    conn: Arc<Mutex<Connection>>,
}

impl SqliteProcedureExecutor {
    pub fn from_connection(conn: Arc<Mutex<Connection>>) -> Self {
        Self { conn }
    }

    /// 注册（或覆盖）命名过程
    pub fn register(&self, name: &str, body_sql: &str) -> RepositoryResult<()> {
        let conn = self
            .conn
            .lock()
            .map_err(|e| RepositoryError::LockError(e.to_string()))?;
        conn.execute(
            "INSERT INTO import_procedure (name, body_sql) VALUES (?1, ?2)
             ON CONFLICT(name) DO UPDATE SET body_sql = ?2",
            params![name, body_sql],
        )?;
        Ok(())
    }

    fn run(conn: &mut Connection, procedure: &str, batch_id: &str) -> rusqlite::Result<Option<usize>> {
        let body: Option<String> = conn
            .query_row(
                "SELECT body_sql FROM import_procedure WHERE name = ?1",
                params![procedure],
                |row| row.get(0),
            )
            .optional()?;
        let body = match body {
            Some(b) => b,
            None => return Ok(None),
        };

        let tx = conn.transaction()?;
        let before = total_changes(&tx)?;
        {
            let mut batch = Batch::new(&tx, &body);
            while let Some(mut stmt) = batch.next()? {
                if let Some(idx) = stmt.parameter_index(BATCH_ID_PARAM)? {
                    stmt.raw_bind_parameter(idx, batch_id)?;
                }
                stmt.raw_execute()?;
            }
        }
        let affected = total_changes(&tx)?.saturating_sub(before);
        tx.commit()?;
        Ok(Some(affected as usize))
    }
}

fn total_changes(conn: &Connection) -> rusqlite::Result<i64> {
    conn.query_row("SELECT total_changes()", [], |row| row.get(0))
}

#[async_trait]
impl ProcedureExecutor for SqliteProcedureExecutor {
    async fn execute(&self, procedure: &str, batch_id: &str) -> Result<usize, ProcedureFailure> {
        let mut conn = self
            .conn
            .lock()
            .map_err(|e| ProcedureFailure::new(format!("database lock poisoned: {}", e)))?;

        match Self::run(&mut conn, procedure, batch_id) {
            Ok(Some(affected)) => Ok(affected),
            Ok(None) => Err(ProcedureFailure::new(format!(
                "procedure {} is not registered",
                procedure
            ))),
            Err(e) => Err(ProcedureFailure::new(e.to_string())),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::ensure_schema;

    fn executor() -> (SqliteProcedureExecutor, Arc<Mutex<Connection>>) {
        let conn = Connection::open_in_memory().unwrap();
        ensure_schema(&conn).unwrap();
        conn.execute_batch("CREATE TABLE landed (batch_id TEXT, n INTEGER);")
            .unwrap();
        let conn = Arc::new(Mutex::new(conn));
        (SqliteProcedureExecutor::from_connection(conn.clone()), conn)
    }

    #[tokio::test]
    async fn test_executes_statements_with_batch_id() {
        let (exec, conn) = executor();
        exec.register(
            "import_single_report",
            "INSERT INTO landed VALUES (:batch_id, 1); INSERT INTO landed VALUES (:batch_id, 2);",
        )
        .unwrap();

        let n = exec.execute("import_single_report", "b-1").await.unwrap();
        assert_eq!(n, 2);

        let count: i64 = conn
            .lock()
            .unwrap()
            .query_row("SELECT COUNT(*) FROM landed WHERE batch_id = 'b-1'", [], |r| r.get(0))
            .unwrap();
        assert_eq!(count, 2);
    }

    #[tokio::test]
    async fn test_failure_rolls_back_and_keeps_message() {
        let (exec, conn) = executor();
        exec.register(
            "import_bulk_report",
            "INSERT INTO landed VALUES (:batch_id, 1); INSERT INTO missing_table VALUES (1);",
        )
        .unwrap();

        let err = exec.execute("import_bulk_report", "b-2").await.unwrap_err();
        assert!(err.message.contains("no such table: missing_table"));

        let count: i64 = conn
            .lock()
            .unwrap()
            .query_row("SELECT COUNT(*) FROM landed", [], |r| r.get(0))
            .unwrap();
        assert_eq!(count, 0);
    }

    #[tokio::test]
    async fn test_ddl_does_not_inflate_rows_affected() {
        let (exec, _) = executor();
        exec.register(
            "import_voyage_report",
            "INSERT INTO landed VALUES (:batch_id, 1); INSERT INTO landed VALUES (:batch_id, 2);
             CREATE TABLE IF NOT EXISTS audit (batch_id TEXT);
             CREATE INDEX IF NOT EXISTS idx_audit ON audit (batch_id);",
        )
        .unwrap();

        let n = exec.execute("import_voyage_report", "b-4").await.unwrap();
        assert_eq!(n, 2);
    }

    #[tokio::test]
    async fn test_unregistered_procedure() {
        let (exec, _) = executor();
        let err = exec.execute("import_voyage_report", "b-3").await.unwrap_err();
        assert_eq!(err.message, "procedure import_voyage_report is not registered");
    }
}
