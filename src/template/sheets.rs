// ==========================================
// 船舶离线报表系统 - 数据工作表构建
// ==========================================
// 每行公式均由 formula::patterns 构建:
// - 计算列: IF(driver="","",...)
// - 航次号: 隐藏 carry 列向下传递 Voyage 表的航次号
// - 加油单下拉: 隐藏 Note Range 列保存候选区域地址，验证用 INDIRECT
// ==========================================

use crate::config::{DomainConfig, LayoutConfig};
use crate::domain::sheet::{bunkering_cols, lube_cols, machinery_cols, voyage_cols, SheetKind};
use crate::domain::types::ColumnRole;
use crate::formula::address::CellRef;
use crate::formula::expr::{if_error, Expr};
use crate::formula::patterns::{
    conditional_chain, dynamic_range_address, forward_propagation, keyed_lookup, require_all,
};
use crate::template::layout::LookupLayout;
use crate::template::model::{CellContent, ListSource, SheetTemplate, TemplateColumn};

/// 单表构建所需的上下文
pub struct SheetContext<'a> {
    pub lookup: &'a LookupLayout,
    pub domain: &'a DomainConfig,
    pub layout: &'a LayoutConfig,
    pub max_row: u32,
}

/// 按契约建表（表头 + 列宽），尚无公式
fn blank_sheet(kind: SheetKind, ctx: &SheetContext<'_>) -> SheetTemplate {
    let columns = kind
        .columns()
        .iter()
        .map(|c| TemplateColumn {
            header: c.header.to_string(),
            role: c.role,
            width: if c.role == ColumnRole::HiddenHelper {
                ctx.layout.helper_column_width
            } else {
                ctx.layout.default_column_width
            },
        })
        .collect();
    let mut sheet = SheetTemplate::new(kind.sheet_name(), Some(kind), columns, ctx.max_row);
    sheet.freeze_header = ctx.layout.freeze_header;
    sheet
}

pub fn build_sheet(kind: SheetKind, ctx: &SheetContext<'_>) -> SheetTemplate {
    match kind {
        SheetKind::Voyage => voyage_sheet(ctx),
        SheetKind::Machinery => machinery_sheet(ctx),
        SheetKind::LubeOil => lube_oil_sheet(ctx),
        SheetKind::Bunkering => bunkering_sheet(ctx),
    }
}

fn cell(row: u32, col: u16) -> CellRef {
    CellRef::local_col_abs(row, col)
}

fn at(row: u32, col: u16) -> Expr {
    Expr::cell(cell(row, col))
}

// 航次号向下传递：carry 列 + 可见列
fn write_voyage_carry(sheet: &mut SheetTemplate, row: u32, visible_col: u16, carry_col: u16, driver: &CellRef) {
    let source = CellRef::on_sheet(SheetKind::Voyage.sheet_name(), row, voyage_cols::VOYAGE_NO);
    let above = if row > 1 { Some(cell(row - 1, carry_col)) } else { None };
    sheet.set(
        row,
        carry_col,
        CellContent::Formula(forward_propagation(&source, above.as_ref())),
    );
    sheet.set(
        row,
        visible_col,
        CellContent::Formula(conditional_chain(driver, at(row, carry_col))),
    );
}

// ==========================================
// Voyage
// ==========================================
fn voyage_sheet(ctx: &SheetContext<'_>) -> SheetTemplate {
    use voyage_cols::*;
    let lk = ctx.lookup;
    let mut sheet = blank_sheet(SheetKind::Voyage, ctx);

    for row in sheet.data_rows() {
        let driver = cell(row, VOYAGE_NO);
        let gated = |body: Expr| CellContent::Formula(conditional_chain(&driver, body));

        sheet.set(row, VOYAGE_ID, gated(keyed_lookup(at(row, VOYAGE_NO), &lk.voyage_nos, &lk.voyage_ids)));
        sheet.set(
            row,
            DEPARTURE_PORT_ID,
            gated(keyed_lookup(at(row, DEPARTURE_PORT), &lk.port_names, &lk.port_ids)),
        );
        sheet.set(
            row,
            ARRIVAL_PORT_ID,
            gated(keyed_lookup(at(row, ARRIVAL_PORT), &lk.port_names, &lk.port_ids)),
        );
        sheet.set(
            row,
            STEAMING_HOURS,
            gated(require_all(
                &[cell(row, DEPARTURE_TIME), cell(row, ARRIVAL_TIME)],
                at(row, ARRIVAL_TIME)
                    .minus(at(row, DEPARTURE_TIME))
                    .times(Expr::number(24.0))
                    .round(2),
            )),
        );
        sheet.set(
            row,
            AVG_SPEED,
            gated(require_all(
                &[cell(row, DISTANCE), cell(row, STEAMING_HOURS)],
                if_error(
                    at(row, DISTANCE).divided_by(at(row, STEAMING_HOURS)).round(2),
                    Expr::empty(),
                ),
            )),
        );
    }

    sheet.add_validation(VOYAGE_NO, ListSource::Static(lk.voyage_nos.clone()));
    sheet.add_validation(OPERATION, ListSource::Inline(ctx.domain.operation_types.clone()));
    sheet.add_validation(DEPARTURE_PORT, ListSource::Static(lk.port_names.clone()));
    sheet.add_validation(ARRIVAL_PORT, ListSource::Static(lk.port_names.clone()));
    sheet.add_validation(TIMEZONE, ListSource::Static(lk.timezones.clone()));
    sheet
}

// ==========================================
// Machinery
// ==========================================
fn machinery_sheet(ctx: &SheetContext<'_>) -> SheetTemplate {
    use machinery_cols::*;
    let lk = ctx.lookup;
    let mut sheet = blank_sheet(SheetKind::Machinery, ctx);

    for row in sheet.data_rows() {
        let driver = cell(row, MACHINERY_NAME);
        let gated = |body: Expr| CellContent::Formula(conditional_chain(&driver, body));
        let name = || at(row, MACHINERY_NAME);

        write_voyage_carry(&mut sheet, row, VOYAGE_NO, VOYAGE_CARRY, &driver);

        sheet.set(row, MACHINERY_ID, gated(keyed_lookup(name(), &lk.machinery_names, &lk.machinery_ids)));
        sheet.set(row, RATED_POWER, gated(keyed_lookup(name(), &lk.machinery_names, &lk.machinery_power)));
        sheet.set(
            row,
            RUNNING_HOURS,
            gated(require_all(
                &[cell(row, START_COUNTER), cell(row, END_COUNTER)],
                at(row, END_COUNTER).minus(at(row, START_COUNTER)),
            )),
        );
        sheet.set(row, FUEL_TYPE_ID, gated(keyed_lookup(at(row, FUEL_TYPE), &lk.item_keys, &lk.item_ids)));
        sheet.set(row, NOTE_RANGE, gated(dynamic_range_address(at(row, FUEL_TYPE), &lk.notes)));

        // 功率 × 负荷% × 小时 × SFOC(g/kWh) → 吨
        let sfoc = keyed_lookup(name(), &lk.machinery_names, &lk.machinery_sfoc);
        let consumption = at(row, RATED_POWER)
            .times(at(row, LOAD_PCT))
            .divided_by(Expr::number(100.0))
            .times(at(row, RUNNING_HOURS))
            .times(sfoc)
            .divided_by(Expr::number(1_000_000.0))
            .round(3);
        sheet.set(
            row,
            CONSUMPTION,
            gated(require_all(
                &[cell(row, RATED_POWER), cell(row, RUNNING_HOURS), cell(row, LOAD_PCT)],
                consumption,
            )),
        );
    }

    sheet.add_validation(MACHINERY_NAME, ListSource::Static(lk.machinery_names.clone()));
    sheet.add_validation(FUEL_TYPE, ListSource::Static(lk.fuel_keys.clone()));
    sheet.add_validation(BUNKER_NOTE, ListSource::Indirect { helper_col: NOTE_RANGE });
    sheet
}

// ==========================================
// Lube Oil
// ==========================================
fn lube_oil_sheet(ctx: &SheetContext<'_>) -> SheetTemplate {
    use lube_cols::*;
    let lk = ctx.lookup;
    let mut sheet = blank_sheet(SheetKind::LubeOil, ctx);

    for row in sheet.data_rows() {
        let driver = cell(row, MACHINERY_NAME);
        let gated = |body: Expr| CellContent::Formula(conditional_chain(&driver, body));

        write_voyage_carry(&mut sheet, row, VOYAGE_NO, VOYAGE_CARRY, &driver);

        sheet.set(
            row,
            MACHINERY_ID,
            gated(keyed_lookup(at(row, MACHINERY_NAME), &lk.machinery_names, &lk.machinery_ids)),
        );
        sheet.set(row, LUBE_TYPE_ID, gated(keyed_lookup(at(row, LUBE_TYPE), &lk.item_keys, &lk.item_ids)));
        sheet.set(row, NOTE_RANGE, gated(dynamic_range_address(at(row, LUBE_TYPE), &lk.notes)));
    }

    sheet.add_validation(MACHINERY_NAME, ListSource::Static(lk.machinery_names.clone()));
    sheet.add_validation(LUBE_TYPE, ListSource::Static(lk.lube_keys.clone()));
    sheet.add_validation(LUBE_NOTE, ListSource::Indirect { helper_col: NOTE_RANGE });
    sheet
}

// ==========================================
// Bunkering
// ==========================================
fn bunkering_sheet(ctx: &SheetContext<'_>) -> SheetTemplate {
    use bunkering_cols::*;
    let lk = ctx.lookup;
    let mut sheet = blank_sheet(SheetKind::Bunkering, ctx);

    for row in sheet.data_rows() {
        let driver = cell(row, ITEM_TYPE);
        let gated = |body: Expr| CellContent::Formula(conditional_chain(&driver, body));

        write_voyage_carry(&mut sheet, row, VOYAGE_NO, VOYAGE_CARRY, &driver);

        sheet.set(row, ITEM_TYPE_ID, gated(keyed_lookup(at(row, ITEM_TYPE), &lk.item_keys, &lk.item_ids)));
        sheet.set(row, PORT_ID, gated(keyed_lookup(at(row, PORT), &lk.port_names, &lk.port_ids)));
        sheet.set(row, ROB_BEFORE, gated(keyed_lookup(at(row, ITEM_TYPE), &lk.item_keys, &lk.item_rob)));
        sheet.set(
            row,
            ROB_AFTER,
            gated(require_all(
                &[cell(row, ROB_BEFORE), cell(row, QUANTITY)],
                at(row, ROB_BEFORE).plus(at(row, QUANTITY)),
            )),
        );
    }

    sheet.add_validation(ITEM_TYPE, ListSource::Static(lk.item_keys.clone()));
    sheet.add_validation(PORT, ListSource::Static(lk.port_names.clone()));
    sheet
}
