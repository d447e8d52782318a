// ==========================================
// 船舶离线报表系统 - xlsx 渲染
// ==========================================
// 职责: WorkbookTemplate → xlsx 二进制（rust_xlsxwriter）
// - 公式写入缓存结果（由求值器计算），不重算的读取方看到的是空白
// - 空串与错误值的缓存结果一律写成空白（t="str" 空 <v>），不能落成 0
// - 保护计划存在时：锁定/隐藏/解锁格式 + 带口令的工作表保护
// - 辅助列与隐藏表不可见
// ==========================================

use crate::domain::types::ColumnRole;
use crate::formula::eval::Evaluator;
use crate::formula::render::{render, render_formula};
use crate::formula::address::CellRef;
use crate::formula::patterns::indirect_list;
use crate::template::model::{CellContent, CellLock, ListSource, SheetTemplate, WorkbookTemplate};
use rust_xlsxwriter::{
    DataValidation, Format, Formula, ProtectionOptions, Workbook, Worksheet, XlsxError,
};

struct Formats {
    header: Format,
    locked: Format,
    locked_hidden: Format,
    unlocked: Format,
}

impl Formats {
    fn new() -> Self {
        Self {
            header: Format::new().set_bold(),
            locked: Format::new(),
            locked_hidden: Format::new().set_hidden(),
            unlocked: Format::new().set_unlocked(),
        }
    }

    fn for_lock(&self, lock: CellLock) -> &Format {
        match lock {
            CellLock::Locked => &self.locked,
            CellLock::LockedHidden => &self.locked_hidden,
            CellLock::Unlocked => &self.unlocked,
        }
    }
}

/// 渲染整个工作簿
pub fn render_workbook(template: &WorkbookTemplate) -> Result<Vec<u8>, XlsxError> {
    let evaluator = Evaluator::new(template);
    let formats = Formats::new();
    let mut workbook = Workbook::new();

    for (index, sheet) in template.sheets.iter().enumerate() {
        let worksheet = workbook.add_worksheet();
        worksheet.set_name(&sheet.name)?;
        write_sheet(worksheet, sheet, index, &evaluator, &formats)?;
    }

    workbook.save_to_buffer()
}

fn write_sheet(
    worksheet: &mut Worksheet,
    sheet: &SheetTemplate,
    index: usize,
    evaluator: &Evaluator<'_, WorkbookTemplate>,
    formats: &Formats,
) -> Result<(), XlsxError> {
    for (col, column) in sheet.columns.iter().enumerate() {
        let col = col as u16;
        worksheet.set_column_width(col, column.width)?;
        if column.role == ColumnRole::HiddenHelper {
            worksheet.set_column_hidden(col)?;
        }
    }

    worksheet.set_formula_result_default("");

    let plan = sheet.protection.as_ref();
    for row in 0..sheet.max_row {
        for col in 0..sheet.column_count() {
            let format = match (row, plan) {
                (0, _) => &formats.header,
                (_, Some(plan)) => formats.for_lock(plan.lock_of(row, col)),
                (_, None) => &formats.locked,
            };

            match sheet.get(row, col) {
                Some(CellContent::Text(s)) => {
                    worksheet.write_string_with_format(row, col, s, format)?;
                }
                Some(CellContent::Number(n)) => {
                    worksheet.write_number_with_format(row, col, *n, format)?;
                }
                Some(CellContent::Formula(expr)) => {
                    let cached = evaluator.value_at(index, row, col);
                    let result = if cached.is_error() {
                        String::new()
                    } else {
                        cached.as_text()
                    };
                    let formula = Formula::new(render_formula(expr)).set_result(result);
                    worksheet.write_formula_with_format(row, col, formula, format)?;
                }
                None => {
                    // 空白单元格只在需要解锁时写入格式
                    if plan.map(|p| p.lock_of(row, col)) == Some(CellLock::Unlocked) {
                        worksheet.write_blank(row, col, &formats.unlocked)?;
                    }
                }
            }
        }
    }

    for validation in &sheet.validations {
        let dv = match &validation.source {
            ListSource::Static(range) => {
                DataValidation::new().allow_list_formula(Formula::new(range.to_string()))
            }
            // 相对引用以验证区域左上角为基准
            ListSource::Indirect { helper_col } => DataValidation::new().allow_list_formula(
                Formula::new(render(&indirect_list(&CellRef::local_col_abs(
                    validation.first_row,
                    *helper_col,
                )))),
            ),
            ListSource::Inline(items) => {
                let refs: Vec<&str> = items.iter().map(String::as_str).collect();
                DataValidation::new().allow_list_strings(&refs)?
            }
        };
        worksheet.add_data_validation(
            validation.first_row,
            validation.col,
            validation.last_row,
            validation.col,
            &dv,
        )?;
    }

    if sheet.freeze_header {
        worksheet.set_freeze_panes(1, 0)?;
    }

    if let Some(plan) = plan {
        let options = ProtectionOptions::new();
        worksheet.protect_with_password(&plan.password);
        worksheet.protect_with_options(&options);
    }

    if sheet.very_hidden {
        worksheet.set_very_hidden(true);
    } else if sheet.hidden {
        worksheet.set_hidden(true);
    }

    Ok(())
}
