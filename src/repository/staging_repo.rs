// ==========================================
// 船舶离线报表系统 - Staging 表仓储
// ==========================================
// 职责: staging 表的整表替换、列查询、行写入
// 约束: 表名/列名由 StagingProvisioner 预先净化，这里只负责加引号
// ==========================================

use crate::repository::error::{RepositoryError, RepositoryResult};
use async_trait::async_trait;
use rusqlite::{params_from_iter, Connection};
use std::sync::{Arc, Mutex, MutexGuard};

#[async_trait]
pub trait StagingRepository: Send + Sync {
    /// DROP + CREATE（同一事务），全部列为 TEXT
    async fn recreate_table(&self, table: &str, columns: &[String]) -> RepositoryResult<()>;

    /// 表的列名（表不存在时返回空）
    async fn table_columns(&self, table: &str) -> RepositoryResult<Vec<String>>;

    /// 清空后写入行（同一事务），返回写入行数
    async fn replace_rows(
        &self,
        table: &str,
        columns: &[String],
        rows: &[Vec<String>],
    ) -> RepositoryResult<usize>;
}

pub struct SqliteStagingRepository {
    conn: Arc<Mutex<Connection>>,
}

impl SqliteStagingRepository {
    pub fn from_connection(conn: Arc<Mutex<Connection>>) -> Self {
        Self { conn }
    }

    fn get_conn(&self) -> RepositoryResult<MutexGuard<'_, Connection>> {
        self.conn
            .lock()
            .map_err(|e| RepositoryError::LockError(e.to_string()))
    }
}

fn quote_ident(name: &str) -> String {
    format!("\"{}\"", name.replace('"', "\"\""))
}

#[async_trait]
impl StagingRepository for SqliteStagingRepository {
    async fn recreate_table(&self, table: &str, columns: &[String]) -> RepositoryResult<()> {
        if columns.is_empty() {
            return Err(RepositoryError::FieldValueError {
                field: "columns".to_string(),
                message: format!("staging 表 {} 至少需要一列", table),
            });
        }

        let mut conn = self.get_conn()?;
        let tx = conn.transaction()?;

        tx.execute_batch(&format!("DROP TABLE IF EXISTS {}", quote_ident(table)))?;

        let column_defs: Vec<String> = columns
            .iter()
            .map(|c| format!("{} TEXT", quote_ident(c)))
            .collect();
        tx.execute_batch(&format!(
            "CREATE TABLE {} ({})",
            quote_ident(table),
            column_defs.join(", ")
        ))?;

        tx.commit()
            .map_err(|e| RepositoryError::DatabaseTransactionError(e.to_string()))?;
        Ok(())
    }

    async fn table_columns(&self, table: &str) -> RepositoryResult<Vec<String>> {
        let conn = self.get_conn()?;
        let mut stmt = conn.prepare(&format!("PRAGMA table_info({})", quote_ident(table)))?;
        let rows = stmt.query_map([], |row| row.get::<_, String>(1))?;
        Ok(rows.collect::<Result<Vec<_>, _>>()?)
    }

    async fn replace_rows(
        &self,
        table: &str,
        columns: &[String],
        rows: &[Vec<String>],
    ) -> RepositoryResult<usize> {
        let mut conn = self.get_conn()?;
        let tx = conn.transaction()?;

        tx.execute_batch(&format!("DELETE FROM {}", quote_ident(table)))?;

        let placeholders: Vec<String> = (1..=columns.len()).map(|i| format!("?{}", i)).collect();
        let quoted: Vec<String> = columns.iter().map(|c| quote_ident(c)).collect();
        let sql = format!(
            "INSERT INTO {} ({}) VALUES ({})",
            quote_ident(table),
            quoted.join(", "),
            placeholders.join(", ")
        );

        let mut count = 0;
        {
            let mut stmt = tx.prepare(&sql)?;
            for row in rows {
                // 行宽与列数对齐：短行补空，长行截断
                let values = (0..columns.len()).map(|i| row.get(i).map(String::as_str).unwrap_or(""));
                stmt.execute(params_from_iter(values))?;
                count += 1;
            }
        }

        tx.commit()
            .map_err(|e| RepositoryError::DatabaseTransactionError(e.to_string()))?;
        Ok(count)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn repo() -> SqliteStagingRepository {
        let conn = Connection::open_in_memory().unwrap();
        SqliteStagingRepository::from_connection(Arc::new(Mutex::new(conn)))
    }

    #[tokio::test]
    async fn test_recreate_replaces_columns() {
        let repo = repo();
        let cols = vec!["a".to_string(), "b".to_string()];
        repo.recreate_table("stg_x", &cols).await.unwrap();
        assert_eq!(repo.table_columns("stg_x").await.unwrap(), cols);

        let cols = vec!["c".to_string()];
        repo.recreate_table("stg_x", &cols).await.unwrap();
        assert_eq!(repo.table_columns("stg_x").await.unwrap(), cols);
    }

    #[tokio::test]
    async fn test_replace_rows_pads_short_rows() {
        let repo = repo();
        let cols = vec!["a".to_string(), "b".to_string()];
        repo.recreate_table("stg_y", &cols).await.unwrap();
        let n = repo
            .replace_rows("stg_y", &cols, &[vec!["1".to_string()], vec!["2".to_string(), "x".to_string()]])
            .await
            .unwrap();
        assert_eq!(n, 2);
        let n = repo
            .replace_rows("stg_y", &cols, &[vec!["3".to_string()]])
            .await
            .unwrap();
        assert_eq!(n, 1);
    }

    #[tokio::test]
    async fn test_missing_table_has_no_columns() {
        let repo = repo();
        assert!(repo.table_columns("stg_none").await.unwrap().is_empty());
    }
}
