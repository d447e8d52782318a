// ==========================================
// 船舶离线报表系统 - 工作簿解析器
// ==========================================
// 输入: 已填写的工作簿二进制
// 输出: 每张数据表的表头 + 非空行（按导出列数上限截断）
// 规则:
// - 第 1 行为表头，其余行读取缓存计算结果
// - 行内全部单元格为空或占位符（N/A）→ 整行丢弃
// - 单表缺失/不可读 → 该表为空结果 + warn，其余表照常解析
// ==========================================

use crate::config::{DomainConfig, LayoutConfig};
use crate::domain::sheet::SheetKind;
use crate::importer::cell_format::format_cell;
use crate::importer::error::{ImportError, ImportResult};
use calamine::{open_workbook_from_rs, Data, Range, Reader, Xlsx};
use serde::{Deserialize, Serialize};
use std::io::Cursor;
use std::path::Path;
use tracing::{debug, warn};

// ==========================================
// ParsedSheet - 单表解析结果
// ==========================================
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ParsedSheet {
    pub kind: SheetKind,
    pub sheet_name: String,
    pub headers: Vec<String>,
    pub rows: Vec<Vec<String>>,
    pub dropped_rows: usize,
    pub warning: Option<String>,
}

impl ParsedSheet {
    /// 缺失或不可读时的空结果（表头取契约）
    fn empty(kind: SheetKind, warning: String) -> Self {
        Self {
            kind,
            sheet_name: kind.sheet_name().to_string(),
            headers: kind.export_headers(),
            rows: Vec::new(),
            dropped_rows: 0,
            warning: Some(warning),
        }
    }

    pub fn row_count(&self) -> usize {
        self.rows.len()
    }
}

// ==========================================
// ParsedWorkbook - 整本解析结果（预览直接序列化为 JSON）
// ==========================================
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ParsedWorkbook {
    pub sheets: Vec<ParsedSheet>,
    pub upload_token: Option<String>,
    pub token_vessel_id: Option<i64>,
}

impl ParsedWorkbook {
    pub fn sheet(&self, kind: SheetKind) -> Option<&ParsedSheet> {
        self.sheets.iter().find(|s| s.kind == kind)
    }

    pub fn total_rows(&self) -> usize {
        self.sheets.iter().map(|s| s.rows.len()).sum()
    }

    pub fn to_json(&self) -> ImportResult<String> {
        serde_json::to_string_pretty(self).map_err(|e| ImportError::Other(e.into()))
    }
}

pub struct WorkbookParser<'a> {
    domain: &'a DomainConfig,
    layout: &'a LayoutConfig,
}

impl<'a> WorkbookParser<'a> {
    pub fn new(domain: &'a DomainConfig, layout: &'a LayoutConfig) -> Self {
        Self { domain, layout }
    }

    pub fn parse_file(&self, path: &Path) -> ImportResult<ParsedWorkbook> {
        if !path.exists() {
            return Err(ImportError::FileNotFound(path.display().to_string()));
        }
        let ext = path
            .extension()
            .and_then(|e| e.to_str())
            .unwrap_or("")
            .to_lowercase();
        if ext != "xlsx" {
            return Err(ImportError::UnsupportedFormat(ext));
        }
        let bytes = std::fs::read(path).map_err(|e| ImportError::FileReadError(e.to_string()))?;
        self.parse_bytes(&bytes)
    }

    /// 解析工作簿二进制；整本无法打开才返回错误
    pub fn parse_bytes(&self, bytes: &[u8]) -> ImportResult<ParsedWorkbook> {
        let mut workbook: Xlsx<_> = open_workbook_from_rs(Cursor::new(bytes.to_vec()))?;
        let names: Vec<String> = workbook.sheet_names().to_vec();

        let mut sheets = Vec::with_capacity(SheetKind::ALL.len());
        for kind in SheetKind::ALL {
            let name = kind.sheet_name();
            if !names.iter().any(|n| n == name) {
                warn!(sheet = name, "工作表缺失，按空表处理");
                sheets.push(ParsedSheet::empty(kind, format!("工作表缺失: {}", name)));
                continue;
            }
            match workbook.worksheet_range(name) {
                Ok(range) => sheets.push(self.parse_sheet(kind, &range)),
                Err(e) => {
                    let err = ImportError::SheetUnreadable {
                        sheet: name.to_string(),
                        message: e.to_string(),
                    };
                    warn!(sheet = name, error = %err, "工作表不可读，按空表处理");
                    sheets.push(ParsedSheet::empty(kind, err.to_string()));
                }
            }
        }

        let (upload_token, token_vessel_id) = if names.iter().any(|n| n == &self.layout.token_sheet) {
            match workbook.worksheet_range(&self.layout.token_sheet) {
                Ok(range) => read_token(&range),
                Err(e) => {
                    warn!(error = %e, "token 表不可读");
                    (None, None)
                }
            }
        } else {
            (None, None)
        };

        Ok(ParsedWorkbook {
            sheets,
            upload_token,
            token_vessel_id,
        })
    }

    fn is_blank(&self, value: &str) -> bool {
        value.trim().is_empty() || self.domain.is_placeholder(value)
    }

    pub fn parse_sheet(&self, kind: SheetKind, range: &Range<Data>) -> ParsedSheet {
        let specs = kind.columns();
        let limit = kind.column_limit();
        let end_row = range.end().map(|(r, _)| r).unwrap_or(0);

        let headers: Vec<String> = (0..limit)
            .map(|col| {
                let text = range
                    .get_value((0, col as u32))
                    .map(|d| format_cell(d, specs[col].kind))
                    .unwrap_or_default();
                let text = text.trim().to_string();
                if text.is_empty() {
                    specs[col].header.to_string()
                } else {
                    text
                }
            })
            .collect();

        let mut rows = Vec::new();
        let mut dropped_rows = 0;
        for row in 1..=end_row {
            let values: Vec<String> = (0..limit)
                .map(|col| {
                    range
                        .get_value((row, col as u32))
                        .map(|d| format_cell(d, specs[col].kind))
                        .unwrap_or_default()
                })
                .collect();

            if values.iter().all(|v| self.is_blank(v)) {
                dropped_rows += 1;
                continue;
            }
            rows.push(values);
        }

        debug!(
            sheet = kind.sheet_name(),
            rows = rows.len(),
            dropped_rows,
            "工作表解析完成"
        );

        ParsedSheet {
            kind,
            sheet_name: kind.sheet_name().to_string(),
            headers,
            rows,
            dropped_rows,
            warning: None,
        }
    }
}

fn read_token(range: &Range<Data>) -> (Option<String>, Option<i64>) {
    let token = range
        .get_value((1, 0))
        .map(|d| format_cell(d, crate::domain::types::ValueKind::Text))
        .filter(|s| !s.is_empty());
    let vessel_id = range.get_value((1, 1)).and_then(|d| match d {
        Data::Float(f) => Some(*f as i64),
        Data::Int(i) => Some(*i),
        Data::String(s) => s.trim().parse().ok(),
        _ => None,
    });
    (token, vessel_id)
}
