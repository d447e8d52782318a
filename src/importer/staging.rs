// ==========================================
// 船舶离线报表系统 - Staging 表预建
// ==========================================
// 职责: 按表头列表整表重建宽松类型的 staging 表（全部 TEXT，无约束）
// 表名: stg_{船舶简码}_{工作表文件名}（小写，已净化）
// 列名净化: 保留 [A-Za-z0-9_#]，其余替换为 '_'，合并连续 '_'，去首尾 '_'
//          空名 → col_{n}；重复名追加 _{k}
// ==========================================

use crate::domain::sheet::SheetKind;
use crate::importer::error::{ImportError, ImportResult};
use crate::repository::StagingRepository;
use std::collections::HashSet;
use std::sync::Arc;
use tracing::{debug, info, instrument};

/// 单个标识符净化（不处理空名与重复）
pub fn sanitize_identifier(raw: &str) -> String {
    let mut out = String::with_capacity(raw.len());
    for ch in raw.trim().chars() {
        let keep = ch.is_ascii_alphanumeric() || ch == '_' || ch == '#';
        let ch = if keep { ch } else { '_' };
        if ch == '_' && out.ends_with('_') {
            continue;
        }
        out.push(ch);
    }
    out.trim_matches('_').to_string()
}

/// 表头列表净化为列名（n 从 1 起）
pub fn sanitize_headers(headers: &[String]) -> Vec<String> {
    let mut seen: HashSet<String> = HashSet::new();
    let mut columns = Vec::with_capacity(headers.len());

    for (idx, header) in headers.iter().enumerate() {
        let mut base = sanitize_identifier(header);
        if base.is_empty() {
            base = format!("col_{}", idx + 1);
        }

        let mut name = base.clone();
        let mut k = 2;
        while !seen.insert(name.to_lowercase()) {
            name = format!("{}_{}", base, k);
            k += 1;
        }
        columns.push(name);
    }
    columns
}

/// staging 表名
pub fn staging_table_name(short_code: &str, kind: SheetKind) -> String {
    let code = sanitize_identifier(short_code).to_lowercase();
    let code = if code.is_empty() { "vessel".to_string() } else { code };
    format!("stg_{}_{}", code, kind.file_stem())
}

pub struct StagingProvisioner {
    repo: Arc<dyn StagingRepository>,
}

impl StagingProvisioner {
    pub fn new(repo: Arc<dyn StagingRepository>) -> Self {
        Self { repo }
    }

    /// 整表替换（非合并），返回净化后的列名
    #[instrument(skip(self, headers), fields(columns = headers.len()))]
    pub async fn provision_table(&self, table: &str, headers: &[String]) -> ImportResult<Vec<String>> {
        let columns = sanitize_headers(headers);
        self.repo
            .recreate_table(table, &columns)
            .await
            .map_err(|e| ImportError::StagingError {
                table: table.to_string(),
                message: e.to_string(),
            })?;
        debug!(table, ?columns, "staging 表已重建");
        Ok(columns)
    }

    /// 为一条船的全部数据工作表预建 staging 表
    pub async fn provision_vessel(&self, short_code: &str) -> ImportResult<Vec<String>> {
        let mut tables = Vec::with_capacity(SheetKind::ALL.len());
        for kind in SheetKind::ALL {
            let table = staging_table_name(short_code, kind);
            self.provision_table(&table, &kind.export_headers()).await?;
            tables.push(table);
        }
        info!(short_code, tables = tables.len(), "staging 表预建完成");
        Ok(tables)
    }

    /// 向已存在的 staging 表写入行；表不存在时返回 Ok(None)
    pub async fn load_rows(&self, table: &str, rows: &[Vec<String>]) -> ImportResult<Option<usize>> {
        let columns = self.repo.table_columns(table).await?;
        if columns.is_empty() {
            return Ok(None);
        }
        let written = self
            .repo
            .replace_rows(table, &columns, rows)
            .await
            .map_err(|e| ImportError::StagingError {
                table: table.to_string(),
                message: e.to_string(),
            })?;
        Ok(Some(written))
    }

    pub async fn columns_of(&self, table: &str) -> ImportResult<Vec<String>> {
        Ok(self.repo.table_columns(table).await?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sanitize_identifier() {
        assert_eq!(sanitize_identifier("Rated Power (kW)"), "Rated_Power_kW");
        assert_eq!(sanitize_identifier("Note #3"), "Note_#3");
        assert_eq!(sanitize_identifier("  __a--b__ "), "a_b");
        assert_eq!(sanitize_identifier("(%)"), "");
    }

    #[test]
    fn test_sanitize_headers_fills_and_dedupes() {
        let headers: Vec<String> = ["Load (%)", "", "Remarks", "remarks", "Remarks"]
            .iter()
            .map(|s| s.to_string())
            .collect();
        assert_eq!(
            sanitize_headers(&headers),
            vec!["Load", "col_2", "Remarks", "remarks_2", "Remarks_3"]
        );
    }

    #[test]
    fn test_staging_table_name() {
        assert_eq!(staging_table_name("MV-Ocean", SheetKind::LubeOil), "stg_mv_ocean_lube_oil");
        assert_eq!(staging_table_name("", SheetKind::Voyage), "stg_vessel_voyage");
    }
}
