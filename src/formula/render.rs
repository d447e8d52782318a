// ==========================================
// 船舶离线报表系统 - 公式渲染
// ==========================================
// 职责: 表达式模型 → 电子表格公式文本（唯一出口）
// ==========================================

use crate::formula::expr::{Expr, Literal};

/// 渲染为带前导 '=' 的公式
pub fn render_formula(expr: &Expr) -> String {
    format!("={}", render(expr))
}

/// 渲染为公式体（无前导 '='）
pub fn render(expr: &Expr) -> String {
    match expr {
        Expr::Literal(lit) => render_literal(lit),
        Expr::Cell(c) => c.to_string(),
        Expr::Range(r) => r.to_string(),
        Expr::Call(f, args) => {
            let rendered: Vec<String> = args.iter().map(render).collect();
            format!("{}({})", f.name(), rendered.join(","))
        }
        Expr::Conditional {
            test,
            then,
            otherwise,
        } => format!("IF({},{},{})", render(test), render(then), render(otherwise)),
        Expr::Binary { op, lhs, rhs } => {
            let prec = op.precedence();
            let left = render_operand(lhs, prec, false);
            let right = render_operand(rhs, prec, true);
            format!("{}{}{}", left, op.symbol(), right)
        }
    }
}

// 子表达式优先级较低时加括号；右侧同级也加括号（a-(b-c)）
fn render_operand(expr: &Expr, parent_prec: u8, is_rhs: bool) -> String {
    match expr {
        Expr::Binary { op, .. } => {
            let child = op.precedence();
            if child < parent_prec || (is_rhs && child == parent_prec) {
                format!("({})", render(expr))
            } else {
                render(expr)
            }
        }
        _ => render(expr),
    }
}

fn render_literal(lit: &Literal) -> String {
    match lit {
        Literal::Text(s) => format!("\"{}\"", s.replace('"', "\"\"")),
        Literal::Number(n) => format_number(*n),
        Literal::Bool(b) => if *b { "TRUE" } else { "FALSE" }.to_string(),
    }
}

/// 数字文本：整数不带小数点
pub fn format_number(n: f64) -> String {
    if n.is_finite() && n.fract() == 0.0 && n.abs() < 1e15 {
        format!("{}", n as i64)
    } else {
        format!("{}", n)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::formula::address::{CellRef, RangeRef};
    use crate::formula::expr::{exact_match, if_error, index};

    #[test]
    fn test_render_conditional_chain() {
        let driver = Expr::cell(CellRef::local_col_abs(1, 1));
        let e = Expr::if_then(
            driver.is_blank(),
            Expr::empty(),
            Expr::cell(CellRef::local_col_abs(1, 5)).minus(Expr::cell(CellRef::local_col_abs(1, 4))),
        );
        assert_eq!(render_formula(&e), "=IF($B2=\"\",\"\",$F2-$E2)");
    }

    #[test]
    fn test_render_escapes_quotes() {
        assert_eq!(render(&Expr::text("say \"hi\"")), "\"say \"\"hi\"\"\"");
    }

    #[test]
    fn test_render_precedence() {
        let a = Expr::cell(CellRef::local(1, 0));
        let b = Expr::cell(CellRef::local(1, 1));
        let c = Expr::cell(CellRef::local(1, 2));
        // (A2-B2)*C2
        let e = a.clone().minus(b.clone()).times(c.clone());
        assert_eq!(render(&e), "(A2-B2)*C2");
        // A2-(B2-C2)
        let e = a.clone().minus(b.clone().minus(c.clone()));
        assert_eq!(render(&e), "A2-(B2-C2)");
        // A2*B2/C2 左结合不加括号
        let e = a.times(b).divided_by(c);
        assert_eq!(render(&e), "A2*B2/C2");
    }

    #[test]
    fn test_render_lookup() {
        let keys = RangeRef::column("Lookup", 0, 1, 3);
        let values = RangeRef::column("Lookup", 1, 1, 3);
        let key = Expr::cell(CellRef::local_col_abs(1, 1));
        let e = if_error(index(values, exact_match(key, keys)), Expr::empty());
        assert_eq!(
            render(&e),
            "IFERROR(INDEX(Lookup!$B$2:$B$4,MATCH($B2,Lookup!$A$2:$A$4,0)),\"\")"
        );
    }

    #[test]
    fn test_format_number() {
        assert_eq!(format_number(3.0), "3");
        assert_eq!(format_number(0.5), "0.5");
        assert_eq!(format_number(-12.0), "-12");
        assert_eq!(format_number(1000000.0), "1000000");
    }
}
