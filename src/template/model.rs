// ==========================================
// 船舶离线报表系统 - 模板内存模型
// ==========================================
// 职责: 工作簿模板（有序工作表 → 列 + 单元格 + 列表验证 + 保护计划）
// 约束: 单元格坐标 0 起；max_row 为含表头的行数（1 起的最后一行）
// 用途: 生成器写入 → 保护器分类 → writer 渲染；求值器直接在此模型上计算
// ==========================================

use crate::domain::sheet::SheetKind;
use crate::domain::types::ColumnRole;
use crate::formula::address::{CellRef, RangeRef};
use crate::formula::eval::{Evaluator, Grid, GridCell, Value};
use crate::formula::expr::Expr;
use crate::formula::patterns::indirect_list;
use std::collections::BTreeMap;
use std::ops::RangeInclusive;

// ==========================================
// CellContent - 单元格内容（空白即不存在）
// ==========================================
#[derive(Debug, Clone, PartialEq)]
pub enum CellContent {
    Text(String),
    Number(f64),
    Formula(Expr),
}

impl CellContent {
    pub fn text(s: impl Into<String>) -> Self {
        CellContent::Text(s.into())
    }

    pub fn is_formula(&self) -> bool {
        matches!(self, CellContent::Formula(_))
    }
}

// ==========================================
// 列表验证
// ==========================================
#[derive(Debug, Clone, PartialEq)]
pub enum ListSource {
    /// 固定区域（Lookup 表中的一列）
    Static(RangeRef),
    /// 同行辅助列保存的文本地址，经 INDIRECT 解析
    Indirect { helper_col: u16 },
    /// 内联候选
    Inline(Vec<String>),
}

#[derive(Debug, Clone, PartialEq)]
pub struct ListValidation {
    pub col: u16,
    pub first_row: u32,
    pub last_row: u32,
    pub source: ListSource,
}

impl ListValidation {
    pub fn covers(&self, row: u32, col: u16) -> bool {
        self.col == col && row >= self.first_row && row <= self.last_row
    }
}

// ==========================================
// 保护计划
// ==========================================
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CellLock {
    Locked,
    LockedHidden,
    Unlocked,
}

impl CellLock {
    pub fn is_locked(&self) -> bool {
        !matches!(self, CellLock::Unlocked)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct ProtectionPlan {
    pub password: String,
    pub cells: BTreeMap<(u32, u16), CellLock>,
}

impl ProtectionPlan {
    /// 未分类的单元格按电子表格默认值视为锁定
    pub fn lock_of(&self, row: u32, col: u16) -> CellLock {
        self.cells.get(&(row, col)).copied().unwrap_or(CellLock::Locked)
    }
}

// ==========================================
// TemplateColumn
// ==========================================
#[derive(Debug, Clone, PartialEq)]
pub struct TemplateColumn {
    pub header: String,
    pub role: ColumnRole,
    pub width: f64,
}

// ==========================================
// SheetTemplate
// ==========================================
#[derive(Debug, Clone, PartialEq)]
pub struct SheetTemplate {
    pub name: String,
    pub kind: Option<SheetKind>,
    pub columns: Vec<TemplateColumn>,
    pub max_row: u32,
    cells: BTreeMap<(u32, u16), CellContent>,
    pub validations: Vec<ListValidation>,
    pub hidden: bool,
    /// 只能通过程序取消隐藏（Excel 界面中不可见）
    pub very_hidden: bool,
    pub freeze_header: bool,
    pub protection: Option<ProtectionPlan>,
}

impl SheetTemplate {
    /// 新建工作表并写入表头行
    pub fn new(name: impl Into<String>, kind: Option<SheetKind>, columns: Vec<TemplateColumn>, max_row: u32) -> Self {
        let mut sheet = Self {
            name: name.into(),
            kind,
            columns,
            max_row: max_row.max(1),
            cells: BTreeMap::new(),
            validations: Vec::new(),
            hidden: false,
            very_hidden: false,
            freeze_header: false,
            protection: None,
        };
        let headers: Vec<String> = sheet.columns.iter().map(|c| c.header.clone()).collect();
        for (idx, header) in headers.into_iter().enumerate() {
            sheet.cells.insert((0, idx as u16), CellContent::Text(header));
        }
        sheet
    }

    /// 数据行（0 起，不含表头）
    pub fn data_rows(&self) -> RangeInclusive<u32> {
        1..=self.max_row.saturating_sub(1)
    }

    pub fn column_count(&self) -> u16 {
        self.columns.len() as u16
    }

    pub fn set(&mut self, row: u32, col: u16, content: CellContent) {
        self.cells.insert((row, col), content);
    }

    pub fn clear(&mut self, row: u32, col: u16) {
        self.cells.remove(&(row, col));
    }

    pub fn get(&self, row: u32, col: u16) -> Option<&CellContent> {
        self.cells.get(&(row, col))
    }

    pub fn cells(&self) -> impl Iterator<Item = (&(u32, u16), &CellContent)> {
        self.cells.iter()
    }

    pub fn add_validation(&mut self, col: u16, source: ListSource) {
        let rows = self.data_rows();
        self.validations.push(ListValidation {
            col,
            first_row: *rows.start(),
            last_row: *rows.end(),
            source,
        });
    }

    pub fn validation_for(&self, row: u32, col: u16) -> Option<&ListValidation> {
        self.validations.iter().find(|v| v.covers(row, col))
    }

    pub fn column_index(&self, header: &str) -> Option<u16> {
        self.columns
            .iter()
            .position(|c| c.header == header)
            .map(|i| i as u16)
    }
}

// ==========================================
// WorkbookTemplate
// ==========================================
#[derive(Debug, Clone, Default, PartialEq)]
pub struct WorkbookTemplate {
    pub sheets: Vec<SheetTemplate>,
}

impl WorkbookTemplate {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, sheet: SheetTemplate) {
        self.sheets.push(sheet);
    }

    pub fn sheet(&self, name: &str) -> Option<&SheetTemplate> {
        self.sheets.iter().find(|s| s.name == name)
    }

    pub fn sheet_mut(&mut self, name: &str) -> Option<&mut SheetTemplate> {
        self.sheets.iter_mut().find(|s| s.name == name)
    }

    /// 模拟用户录入（数值或文本）；工作表不存在返回 false
    pub fn set_input(&mut self, sheet: &str, row: u32, col: u16, content: CellContent) -> bool {
        match self.sheet_mut(sheet) {
            Some(s) => {
                s.set(row, col, content);
                true
            }
            None => false,
        }
    }

    /// 模拟用户清空单元格
    pub fn clear_input(&mut self, sheet: &str, row: u32, col: u16) -> bool {
        match self.sheet_mut(sheet) {
            Some(s) => {
                s.clear(row, col);
                true
            }
            None => false,
        }
    }

    pub fn evaluator(&self) -> Evaluator<'_, WorkbookTemplate> {
        Evaluator::new(self)
    }

    /// 单元格当前求值结果（一次性求值器）
    pub fn value(&self, sheet: &str, row: u32, col: u16) -> Value {
        self.evaluator().value(sheet, row, col)
    }

    /// 单元格下拉当前可选的候选（无验证或地址无效时为空）
    pub fn choices_at(&self, sheet: &str, row: u32, col: u16) -> Vec<String> {
        let Some(index) = self.sheet_index(sheet) else {
            return Vec::new();
        };
        let Some(validation) = self.sheets[index].validation_for(row, col) else {
            return Vec::new();
        };

        let evaluator = self.evaluator();
        let values = match &validation.source {
            ListSource::Inline(list) => return list.clone(),
            ListSource::Static(range) => evaluator
                .range_values(index, &Expr::range(range.clone()))
                .unwrap_or_default(),
            ListSource::Indirect { helper_col } => evaluator
                .range_values(index, &indirect_list(&CellRef::local(row, *helper_col)))
                .unwrap_or_default(),
        };

        values
            .into_iter()
            .filter(|v| !v.is_blank() && !v.is_error())
            .map(|v| v.as_text())
            .collect()
    }
}

impl Grid for WorkbookTemplate {
    fn sheet_index(&self, name: &str) -> Option<usize> {
        self.sheets.iter().position(|s| s.name == name)
    }

    fn sheet_name(&self, index: usize) -> Option<&str> {
        self.sheets.get(index).map(|s| s.name.as_str())
    }

    fn cell(&self, sheet: usize, row: u32, col: u16) -> Option<GridCell<'_>> {
        let content = self.sheets.get(sheet)?.get(row, col)?;
        Some(match content {
            CellContent::Text(s) => GridCell::Value(Value::Text(s.clone())),
            CellContent::Number(n) => GridCell::Value(Value::Number(*n)),
            CellContent::Formula(expr) => GridCell::Formula(expr),
        })
    }

    fn formula_positions(&self, sheet: usize) -> Vec<(u32, u16)> {
        self.sheets
            .get(sheet)
            .map(|s| {
                s.cells()
                    .filter(|(_, c)| c.is_formula())
                    .map(|(pos, _)| *pos)
                    .collect()
            })
            .unwrap_or_default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn column(header: &str) -> TemplateColumn {
        TemplateColumn {
            header: header.to_string(),
            role: ColumnRole::Input,
            width: 10.0,
        }
    }

    #[test]
    fn test_new_sheet_writes_headers() {
        let sheet = SheetTemplate::new("S", None, vec![column("A"), column("B")], 5);
        assert_eq!(sheet.get(0, 1), Some(&CellContent::text("B")));
        assert_eq!(sheet.data_rows(), 1..=4);
        assert_eq!(sheet.column_index("B"), Some(1));
    }

    #[test]
    fn test_inline_choices() {
        let mut sheet = SheetTemplate::new("S", None, vec![column("Op")], 4);
        sheet.add_validation(0, ListSource::Inline(vec!["Sea".to_string(), "Port".to_string()]));
        let mut wb = WorkbookTemplate::new();
        wb.push(sheet);
        assert_eq!(wb.choices_at("S", 2, 0), vec!["Sea", "Port"]);
        // 表头行不在验证范围内
        assert!(wb.choices_at("S", 0, 0).is_empty());
    }

    #[test]
    fn test_static_choices_skip_blanks() {
        let mut lookup = SheetTemplate::new("Lookup", None, vec![column("K")], 4);
        lookup.set(1, 0, CellContent::text("x"));
        lookup.set(3, 0, CellContent::text("y"));
        let mut data = SheetTemplate::new("S", None, vec![column("Pick")], 4);
        data.add_validation(0, ListSource::Static(RangeRef::column("Lookup", 0, 1, 3)));

        let mut wb = WorkbookTemplate::new();
        wb.push(data);
        wb.push(lookup);
        assert_eq!(wb.choices_at("S", 1, 0), vec!["x", "y"]);
    }
}
