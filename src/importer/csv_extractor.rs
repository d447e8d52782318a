// ==========================================
// 船舶离线报表系统 - CSV 导出
// ==========================================
// 格式: 逗号分隔、CRLF 行尾、字段含分隔符/引号/换行时加引号、内部引号加倍
// 路径: {upload_root}/{folder}/{batch_id}_{file}.csv
// 镜像: 主路径成功即视为成功；镜像失败只记 warn
// ==========================================

use crate::config::StorageConfig;
use crate::domain::batch::SheetArtifact;
use crate::domain::sheet::SheetKind;
use crate::importer::error::ImportResult;
use crate::importer::workbook_parser::{ParsedSheet, ParsedWorkbook};
use csv::{QuoteStyle, ReaderBuilder, Terminator, WriterBuilder};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

/// 产物路径
pub fn artifact_path(root: &Path, kind: SheetKind, batch_id: &str) -> PathBuf {
    root.join(kind.folder())
        .join(format!("{}_{}.csv", batch_id, kind.file_stem()))
}

/// 写出单个 CSV（自动创建目录）
pub fn write_csv(path: &Path, headers: &[String], rows: &[Vec<String>]) -> ImportResult<()> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)?;
    }

    let mut writer = WriterBuilder::new()
        .delimiter(b',')
        .quote(b'"')
        .double_quote(true)
        .quote_style(QuoteStyle::Necessary)
        .terminator(Terminator::CRLF)
        .from_path(path)?;

    writer.write_record(headers)?;
    for row in rows {
        writer.write_record(row)?;
    }
    writer.flush()?;
    Ok(())
}

/// 与 write_csv 对称的读取
pub fn read_csv(path: &Path) -> ImportResult<(Vec<String>, Vec<Vec<String>>)> {
    let mut reader = ReaderBuilder::new()
        .delimiter(b',')
        .quote(b'"')
        .double_quote(true)
        .has_headers(true)
        .flexible(true)
        .from_path(path)?;

    let headers = reader.headers()?.iter().map(str::to_string).collect();
    let mut rows = Vec::new();
    for record in reader.records() {
        rows.push(record?.iter().map(str::to_string).collect());
    }
    Ok((headers, rows))
}

pub struct CsvExtractor<'a> {
    storage: &'a StorageConfig,
}

impl<'a> CsvExtractor<'a> {
    pub fn new(storage: &'a StorageConfig) -> Self {
        Self { storage }
    }

    /// 每张工作表写出一个 CSV
    pub fn extract(&self, batch_id: &str, parsed: &ParsedWorkbook) -> ImportResult<Vec<SheetArtifact>> {
        let mut artifacts = Vec::with_capacity(parsed.sheets.len());
        for sheet in &parsed.sheets {
            artifacts.push(self.extract_sheet(batch_id, sheet)?);
        }
        Ok(artifacts)
    }

    fn extract_sheet(&self, batch_id: &str, sheet: &ParsedSheet) -> ImportResult<SheetArtifact> {
        let primary = artifact_path(&self.storage.upload_root, sheet.kind, batch_id);
        write_csv(&primary, &sheet.headers, &sheet.rows)?;
        debug!(
            batch_id,
            sheet = %sheet.sheet_name,
            rows = sheet.rows.len(),
            path = %primary.display(),
            "CSV 写出完成"
        );

        let mirrored = match &self.storage.mirror_root {
            Some(mirror_root) => {
                let mirror = artifact_path(mirror_root, sheet.kind, batch_id);
                match write_csv(&mirror, &sheet.headers, &sheet.rows) {
                    Ok(()) => true,
                    Err(e) => {
                        warn!(
                            batch_id,
                            sheet = %sheet.sheet_name,
                            path = %mirror.display(),
                            error = %e,
                            "镜像 CSV 写出失败（不影响主路径）"
                        );
                        false
                    }
                }
            }
            None => false,
        };

        Ok(SheetArtifact {
            sheet_name: sheet.sheet_name.clone(),
            csv_path: primary,
            row_count: sheet.rows.len(),
            mirrored,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_artifact_path_layout() {
        let path = artifact_path(Path::new("/data/up"), SheetKind::LubeOil, "b-1");
        assert_eq!(path, PathBuf::from("/data/up/lube_oil/b-1_lube_oil.csv"));
    }

    #[test]
    fn test_crlf_and_quoting() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("x").join("t.csv");
        let headers = vec!["A".to_string(), "B".to_string()];
        let rows = vec![vec!["a,b".to_string(), "say \"hi\"".to_string()]];
        write_csv(&path, &headers, &rows).unwrap();

        let raw = fs::read_to_string(&path).unwrap();
        assert_eq!(raw, "A,B\r\n\"a,b\",\"say \"\"hi\"\"\"\r\n");
    }

    #[test]
    fn test_round_trip_with_newlines() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("t.csv");
        let headers = vec!["Remarks".to_string(), "Qty".to_string()];
        let rows = vec![
            vec!["line1\nline2".to_string(), "1".to_string()],
            vec!["crlf\r\ninside".to_string(), "".to_string()],
        ];
        write_csv(&path, &headers, &rows).unwrap();
        let (h, r) = read_csv(&path).unwrap();
        assert_eq!(h, headers);
        assert_eq!(r, rows);
    }

    #[test]
    fn test_mirror_failure_is_not_fatal() {
        let dir = TempDir::new().unwrap();
        // 镜像根是一个普通文件，无法在其下建目录
        let blocker = dir.path().join("blocker");
        fs::write(&blocker, "x").unwrap();
        let storage = StorageConfig::new(dir.path().join("primary")).with_mirror(&blocker);

        let parsed = ParsedWorkbook {
            sheets: vec![ParsedSheet {
                kind: SheetKind::Voyage,
                sheet_name: "Voyage".to_string(),
                headers: SheetKind::Voyage.export_headers(),
                rows: vec![],
                dropped_rows: 0,
                warning: None,
            }],
            upload_token: None,
            token_vessel_id: None,
        };
        let artifacts = CsvExtractor::new(&storage).extract("b1", &parsed).unwrap();
        assert_eq!(artifacts.len(), 1);
        assert!(!artifacts[0].mirrored);
        assert!(artifacts[0].csv_path.exists());
    }
}
