// ==========================================
// 船舶离线报表系统 - 公式模式构建器
// ==========================================
// 条件链: 驱动列为空 → 整行计算列为空
// 向下传递: 隐藏 carry 列保持最近的非空值
// 动态区域: 辅助列保存候选区域的文本地址，数据验证用 INDIRECT 解析
// ==========================================

use crate::formula::address::{CellRef, RangeRef};
use crate::formula::expr::{any_of, exact_match, if_error, index, Expr, Function};

/// IF(driver="","",body)
pub fn conditional_chain(driver: &CellRef, body: Expr) -> Expr {
    Expr::if_then(
        Expr::cell(driver.clone()).is_blank(),
        Expr::empty(),
        body,
    )
}

/// 任一前置单元格为空则结果为空
pub fn require_all(cells: &[CellRef], body: Expr) -> Expr {
    let test = match cells {
        [] => return body,
        [single] => Expr::cell(single.clone()).is_blank(),
        many => any_of(
            many.iter()
                .map(|c| Expr::cell(c.clone()).is_blank())
                .collect(),
        ),
    };
    Expr::if_then(test, Expr::empty(), body)
}

/// IFERROR(INDEX(values, MATCH(key, keys, 0)), "")
pub fn keyed_lookup(key: Expr, keys: &RangeRef, values: &RangeRef) -> Expr {
    if_error(
        index(values.clone(), exact_match(key, keys.clone())),
        Expr::empty(),
    )
}

/// 向下传递: 首行取来源；后续行优先取来源的新值，否则沿用上一行
pub fn forward_propagation(source: &CellRef, carry_above: Option<&CellRef>) -> Expr {
    let src = Expr::cell(source.clone());
    match carry_above {
        None => Expr::if_then(src.clone().is_blank(), Expr::empty(), src),
        Some(above) => Expr::if_then(src.clone().is_present(), src, Expr::cell(above.clone())),
    }
}

// ==========================================
// PivotRanges - 宽表（键 | 数量 | 槽位1..N）区域描述
// ==========================================
#[derive(Debug, Clone, PartialEq)]
pub struct PivotRanges {
    pub sheet: String,
    pub keys: RangeRef,
    pub counts: RangeRef,
    pub first_slot_col: u16,
}

/// 计算某键对应候选区域的文本地址，如 "Lookup!$L$3:$N$3"
///
/// 键不存在或数量为 0 时返回 ""
pub fn dynamic_range_address(key: Expr, pivot: &PivotRanges) -> Expr {
    let position = exact_match(key, pivot.keys.clone());
    let count = index(pivot.counts.clone(), position.clone());
    let sheet_row = position.plus(Expr::number(pivot.keys.first_row as f64));

    let first = Expr::call(
        Function::Address,
        vec![
            sheet_row.clone(),
            Expr::number(pivot.first_slot_col as f64 + 1.0),
            Expr::number(1.0),
            Expr::boolean(true),
            Expr::text(pivot.sheet.clone()),
        ],
    );
    let last = Expr::call(
        Function::Address,
        vec![
            sheet_row,
            Expr::number(pivot.first_slot_col as f64).plus(count.clone()),
            Expr::number(1.0),
            Expr::boolean(true),
        ],
    );

    if_error(
        Expr::if_then(
            count.less_than(Expr::number(1.0)),
            Expr::empty(),
            first.join(Expr::text(":")).join(last),
        ),
        Expr::empty(),
    )
}

/// INDIRECT(helper)
pub fn indirect_list(helper: &CellRef) -> Expr {
    Expr::call(Function::Indirect, vec![Expr::cell(helper.clone())])
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::formula::render::render;

    #[test]
    fn test_conditional_chain_render() {
        let e = conditional_chain(&CellRef::local_col_abs(4, 1), Expr::number(1.0));
        assert_eq!(render(&e), "IF($B5=\"\",\"\",1)");
    }

    #[test]
    fn test_require_all_render() {
        let e = require_all(
            &[CellRef::local_col_abs(1, 4), CellRef::local_col_abs(1, 5)],
            Expr::number(0.0),
        );
        assert_eq!(render(&e), "IF(OR($E2=\"\",$F2=\"\"),\"\",0)");
    }

    #[test]
    fn test_forward_propagation_render() {
        let src = CellRef::on_sheet("Voyage", 2, 0);
        let above = CellRef::local_col_abs(1, 13);
        assert_eq!(
            render(&forward_propagation(&src, Some(&above))),
            "IF(Voyage!$A3<>\"\",Voyage!$A3,$N2)"
        );
        assert_eq!(
            render(&forward_propagation(&CellRef::on_sheet("Voyage", 1, 0), None)),
            "IF(Voyage!$A2=\"\",\"\",Voyage!$A2)"
        );
    }

    #[test]
    fn test_dynamic_range_render() {
        let pivot = PivotRanges {
            sheet: "Lookup".to_string(),
            keys: RangeRef::column("Lookup", 9, 1, 2),
            counts: RangeRef::column("Lookup", 10, 1, 2),
            first_slot_col: 11,
        };
        let e = dynamic_range_address(Expr::cell(CellRef::local_col_abs(1, 8)), &pivot);
        let text = render(&e);
        assert!(text.starts_with("IFERROR(IF(INDEX(Lookup!$K$2:$K$3,MATCH($I2,Lookup!$J$2:$J$3,0))<1"));
        assert!(text.contains("ADDRESS(MATCH($I2,Lookup!$J$2:$J$3,0)+1,12,1,TRUE,\"Lookup\")"));
        assert!(text.contains("&\":\"&"));
    }
}
