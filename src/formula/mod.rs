// ==========================================
// 船舶离线报表系统 - 公式层
// ==========================================
// 表达式模型 + 渲染 + 求值
// 所有写入模板的公式都由此处构建，不直接拼接字符串
// ==========================================

pub mod address;
pub mod eval;
pub mod expr;
pub mod patterns;
pub mod render;

pub use address::{column_letters, parse_reference, quote_sheet, CellRef, RangeRef};
pub use eval::{Evaluator, Grid, GridCell, Value};
pub use expr::{BinaryOp, Expr, Function, Literal};
pub use patterns::{
    conditional_chain, dynamic_range_address, forward_propagation, indirect_list, keyed_lookup,
    require_all, PivotRanges,
};
pub use render::{render, render_formula};
