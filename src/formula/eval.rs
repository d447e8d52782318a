// ==========================================
// 船舶离线报表系统 - 公式求值器
// ==========================================
// 职责: 在内存网格上对表达式模型求值
// 用途:
// - 生成模板时写入公式缓存结果（不重算的读取方看到的是空白而不是 0）
// - 解析某单元格当前可选的下拉候选
// 语义: 与电子表格一致（空单元格 = "" = 0，文本比较不区分大小写）
// ==========================================

use crate::formula::address::{column_letters, parse_reference, quote_sheet, RangeRef};
use crate::formula::expr::{BinaryOp, Expr, Function, Literal};
use crate::formula::render::format_number;
use std::cell::{Cell as StdCell, RefCell};
use std::cmp::Ordering;
use std::collections::{HashMap, HashSet};

/// 递归深度上限（超过视为循环引用）
const MAX_DEPTH: u32 = 256;

// ==========================================
// Value - 求值结果
// ==========================================
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    Empty,
    Text(String),
    Number(f64),
    Bool(bool),
    Error(String),
}

impl Value {
    pub fn text(s: impl Into<String>) -> Value {
        Value::Text(s.into())
    }

    /// 空单元格或空字符串
    pub fn is_blank(&self) -> bool {
        match self {
            Value::Empty => true,
            Value::Text(s) => s.is_empty(),
            _ => false,
        }
    }

    pub fn is_error(&self) -> bool {
        matches!(self, Value::Error(_))
    }

    /// 文本形式（用于拼接与缓存结果）
    pub fn as_text(&self) -> String {
        match self {
            Value::Empty => String::new(),
            Value::Text(s) => s.clone(),
            Value::Number(n) => format_number(*n),
            Value::Bool(b) => if *b { "TRUE" } else { "FALSE" }.to_string(),
            Value::Error(e) => e.clone(),
        }
    }

    fn as_number(&self) -> Result<f64, Value> {
        match self {
            Value::Empty => Ok(0.0),
            Value::Number(n) => Ok(*n),
            Value::Bool(b) => Ok(if *b { 1.0 } else { 0.0 }),
            Value::Text(s) => s
                .trim()
                .parse::<f64>()
                .map_err(|_| Value::Error("#VALUE!".to_string())),
            Value::Error(_) => Err(self.clone()),
        }
    }

    fn as_bool(&self) -> Result<bool, Value> {
        match self {
            Value::Empty => Ok(false),
            Value::Bool(b) => Ok(*b),
            Value::Number(n) => Ok(*n != 0.0),
            Value::Text(s) => match s.to_uppercase().as_str() {
                "TRUE" => Ok(true),
                "FALSE" => Ok(false),
                _ => Err(Value::Error("#VALUE!".to_string())),
            },
            Value::Error(_) => Err(self.clone()),
        }
    }
}

fn error(code: &str) -> Value {
    Value::Error(code.to_string())
}

// ==========================================
// Grid - 求值器读取的网格
// ==========================================
pub enum GridCell<'a> {
    Value(Value),
    Formula(&'a Expr),
}

pub trait Grid {
    fn sheet_index(&self, name: &str) -> Option<usize>;

    fn sheet_name(&self, index: usize) -> Option<&str>;

    fn cell(&self, sheet: usize, row: u32, col: u16) -> Option<GridCell<'_>>;

    /// 行优先排序的公式单元格位置
    fn formula_positions(&self, sheet: usize) -> Vec<(u32, u16)>;
}

// ==========================================
// Evaluator
// ==========================================
pub struct Evaluator<'g, G: Grid> {
    grid: &'g G,
    memo: RefCell<HashMap<(usize, u32, u16), Value>>,
    primed: RefCell<HashSet<usize>>,
    depth: StdCell<u32>,
}

impl<'g, G: Grid> Evaluator<'g, G> {
    pub fn new(grid: &'g G) -> Self {
        Self {
            grid,
            memo: RefCell::new(HashMap::new()),
            primed: RefCell::new(HashSet::new()),
            depth: StdCell::new(0),
        }
    }

    /// 读取单元格的求值结果
    pub fn value(&self, sheet: &str, row: u32, col: u16) -> Value {
        match self.grid.sheet_index(sheet) {
            Some(idx) => self.value_at(idx, row, col),
            None => error("#REF!"),
        }
    }

    pub fn value_at(&self, sheet: usize, row: u32, col: u16) -> Value {
        self.prime(sheet);
        self.cell_value(sheet, row, col)
    }

    /// 对文本地址或区域表达式求出区域内全部值（行优先）
    pub fn range_values(&self, sheet: usize, expr: &Expr) -> Result<Vec<Value>, Value> {
        self.prime(sheet);
        let (target, range) = self.eval_range(expr, sheet)?;
        Ok(self.collect_range(target, &range))
    }

    // 按行顺序预先求值，保证 carry 链的递归深度有界
    fn prime(&self, sheet: usize) {
        if !self.primed.borrow_mut().insert(sheet) {
            return;
        }
        for (row, col) in self.grid.formula_positions(sheet) {
            self.cell_value(sheet, row, col);
        }
    }

    fn cell_value(&self, sheet: usize, row: u32, col: u16) -> Value {
        if let Some(v) = self.memo.borrow().get(&(sheet, row, col)) {
            return v.clone();
        }

        let value = match self.grid.cell(sheet, row, col) {
            None => Value::Empty,
            Some(GridCell::Value(v)) => v,
            Some(GridCell::Formula(expr)) => {
                let depth = self.depth.get();
                if depth >= MAX_DEPTH {
                    return error("#CYCLE!");
                }
                self.depth.set(depth + 1);
                let v = self.eval(expr, sheet);
                self.depth.set(depth);
                // 公式直接引用空单元格时结果为 0
                if v == Value::Empty {
                    Value::Number(0.0)
                } else {
                    v
                }
            }
        };

        self.memo
            .borrow_mut()
            .insert((sheet, row, col), value.clone());
        value
    }

    fn collect_range(&self, sheet: usize, range: &RangeRef) -> Vec<Value> {
        let mut out = Vec::with_capacity((range.rows() as usize) * (range.cols() as usize));
        for row in range.first_row..=range.last_row {
            for col in range.first_col..=range.last_col {
                out.push(self.cell_value(sheet, row, col));
            }
        }
        out
    }

    fn resolve_sheet(&self, name: Option<&String>, current: usize) -> Result<usize, Value> {
        match name {
            None => Ok(current),
            Some(n) => self.grid.sheet_index(n).ok_or_else(|| error("#REF!")),
        }
    }

    fn eval_range(&self, expr: &Expr, sheet: usize) -> Result<(usize, RangeRef), Value> {
        match expr {
            Expr::Range(r) => Ok((self.resolve_sheet(r.sheet.as_ref(), sheet)?, r.clone())),
            Expr::Cell(c) => Ok((
                self.resolve_sheet(c.sheet.as_ref(), sheet)?,
                RangeRef::new(None, c.row, c.col, c.row, c.col),
            )),
            Expr::Call(Function::Indirect, args) if args.len() == 1 => {
                let text = self.eval(&args[0], sheet);
                if text.is_error() {
                    return Err(text);
                }
                let range = parse_reference(&text.as_text()).ok_or_else(|| error("#REF!"))?;
                Ok((self.resolve_sheet(range.sheet.as_ref(), sheet)?, range))
            }
            _ => Err(error("#VALUE!")),
        }
    }

    pub fn eval(&self, expr: &Expr, sheet: usize) -> Value {
        match expr {
            Expr::Literal(Literal::Text(s)) => Value::Text(s.clone()),
            Expr::Literal(Literal::Number(n)) => Value::Number(*n),
            Expr::Literal(Literal::Bool(b)) => Value::Bool(*b),
            Expr::Cell(_) | Expr::Range(_) => match self.eval_range(expr, sheet) {
                Ok((target, range)) if range.rows() == 1 && range.cols() == 1 => {
                    self.cell_value(target, range.first_row, range.first_col)
                }
                Ok(_) => error("#VALUE!"),
                Err(e) => e,
            },
            Expr::Conditional {
                test,
                then,
                otherwise,
            } => match self.eval(test, sheet).as_bool() {
                Ok(true) => self.eval(then, sheet),
                Ok(false) => self.eval(otherwise, sheet),
                Err(e) => e,
            },
            Expr::Binary { op, lhs, rhs } => {
                let l = self.eval(lhs, sheet);
                if l.is_error() {
                    return l;
                }
                let r = self.eval(rhs, sheet);
                if r.is_error() {
                    return r;
                }
                binary(*op, &l, &r)
            }
            Expr::Call(f, args) => self.call(*f, args, sheet),
        }
    }

    fn call(&self, f: Function, args: &[Expr], sheet: usize) -> Value {
        match f {
            Function::IfError => {
                if args.len() != 2 {
                    return error("#N/A");
                }
                let v = self.eval(&args[0], sheet);
                if v.is_error() {
                    self.eval(&args[1], sheet)
                } else {
                    v
                }
            }
            Function::Index => self.call_index(args, sheet),
            Function::Match => self.call_match(args, sheet),
            Function::Address => self.call_address(args, sheet),
            Function::CountA => {
                let mut count = 0usize;
                for arg in args {
                    match self.eval_range(arg, sheet) {
                        Ok((target, range)) => {
                            count += self
                                .collect_range(target, &range)
                                .iter()
                                .filter(|v| **v != Value::Empty)
                                .count();
                        }
                        Err(_) => {
                            if self.eval(arg, sheet) != Value::Empty {
                                count += 1;
                            }
                        }
                    }
                }
                Value::Number(count as f64)
            }
            Function::Indirect => match self.eval_range(&Expr::Call(f, args.to_vec()), sheet) {
                Ok((target, range)) if range.rows() == 1 && range.cols() == 1 => {
                    self.cell_value(target, range.first_row, range.first_col)
                }
                Ok(_) => error("#VALUE!"),
                Err(e) => e,
            },
            Function::And | Function::Or => {
                let mut results = Vec::with_capacity(args.len());
                for arg in args {
                    match self.eval(arg, sheet).as_bool() {
                        Ok(b) => results.push(b),
                        Err(e) => return e,
                    }
                }
                if f == Function::And {
                    Value::Bool(results.iter().all(|b| *b))
                } else {
                    Value::Bool(results.iter().any(|b| *b))
                }
            }
            Function::Round => {
                if args.len() != 2 {
                    return error("#N/A");
                }
                let x = match self.eval(&args[0], sheet).as_number() {
                    Ok(x) => x,
                    Err(e) => return e,
                };
                let digits = match self.eval(&args[1], sheet).as_number() {
                    Ok(d) => d as i32,
                    Err(e) => return e,
                };
                let factor = 10f64.powi(digits);
                Value::Number((x * factor).round() / factor)
            }
        }
    }

    fn call_index(&self, args: &[Expr], sheet: usize) -> Value {
        if args.len() < 2 {
            return error("#N/A");
        }
        let (target, range) = match self.eval_range(&args[0], sheet) {
            Ok(r) => r,
            Err(e) => return e,
        };
        let n = match self.eval(&args[1], sheet).as_number() {
            Ok(n) => n as i64,
            Err(e) => return e,
        };
        let m = match args.get(2) {
            Some(a) => match self.eval(a, sheet).as_number() {
                Ok(m) => m as i64,
                Err(e) => return e,
            },
            None => 0,
        };

        // 单行区域只给一个序号时按列取值
        let (row_off, col_off) = if range.rows() == 1 && args.len() == 2 {
            (1, n)
        } else {
            (n, if m == 0 { 1 } else { m })
        };

        if row_off < 1
            || col_off < 1
            || row_off > range.rows() as i64
            || col_off > range.cols() as i64
        {
            return error("#REF!");
        }

        let (row, col) = range.cell_at((row_off - 1) as u32, (col_off - 1) as u16);
        self.cell_value(target, row, col)
    }

    fn call_match(&self, args: &[Expr], sheet: usize) -> Value {
        if args.len() < 2 {
            return error("#N/A");
        }
        let key = self.eval(&args[0], sheet);
        if key.is_error() {
            return key;
        }
        if key.is_blank() {
            return error("#N/A");
        }
        let (target, range) = match self.eval_range(&args[1], sheet) {
            Ok(r) => r,
            Err(e) => return e,
        };
        if range.rows() > 1 && range.cols() > 1 {
            return error("#N/A");
        }
        self.collect_range(target, &range)
            .iter()
            .position(|v| compare(&key, v) == Some(Ordering::Equal))
            .map(|pos| Value::Number((pos + 1) as f64))
            .unwrap_or_else(|| error("#N/A"))
    }

    fn call_address(&self, args: &[Expr], sheet: usize) -> Value {
        if args.len() < 2 {
            return error("#N/A");
        }
        let mut nums = Vec::with_capacity(3);
        for arg in args.iter().take(2) {
            match self.eval(arg, sheet).as_number() {
                Ok(n) if n >= 1.0 => nums.push(n as u32),
                Ok(_) => return error("#VALUE!"),
                Err(e) => return e,
            }
        }
        let abs = match args.get(2) {
            Some(a) => match self.eval(a, sheet).as_number() {
                Ok(n) => n as u32,
                Err(e) => return e,
            },
            None => 1,
        };
        let (row_abs, col_abs) = match abs {
            1 => (true, true),
            2 => (true, false),
            3 => (false, true),
            _ => (false, false),
        };
        let col = match u16::try_from(nums[1] - 1) {
            Ok(c) => c,
            Err(_) => return error("#VALUE!"),
        };
        let address = format!(
            "{}{}{}{}",
            if col_abs { "$" } else { "" },
            column_letters(col),
            if row_abs { "$" } else { "" },
            nums[0]
        );
        match args.get(4) {
            Some(a) => {
                let sheet_name = self.eval(a, sheet);
                if sheet_name.is_error() {
                    return sheet_name;
                }
                Value::Text(format!("{}!{}", quote_sheet(&sheet_name.as_text()), address))
            }
            None => Value::Text(address),
        }
    }
}

// 比较：数字 < 文本 < 布尔；空值随对方类型取零值
fn compare(a: &Value, b: &Value) -> Option<Ordering> {
    fn rank(v: &Value) -> u8 {
        match v {
            Value::Number(_) => 0,
            Value::Text(_) => 1,
            Value::Bool(_) => 2,
            _ => 3,
        }
    }
    let (a, b) = match (a, b) {
        (Value::Empty, Value::Empty) => return Some(Ordering::Equal),
        (Value::Empty, other) => (zero_like(other), other.clone()),
        (other, Value::Empty) => (other.clone(), zero_like(other)),
        (x, y) => (x.clone(), y.clone()),
    };
    match (&a, &b) {
        (Value::Number(x), Value::Number(y)) => x.partial_cmp(y),
        (Value::Text(x), Value::Text(y)) => Some(x.to_lowercase().cmp(&y.to_lowercase())),
        (Value::Bool(x), Value::Bool(y)) => Some(x.cmp(y)),
        _ => Some(rank(&a).cmp(&rank(&b))),
    }
}

fn zero_like(v: &Value) -> Value {
    match v {
        Value::Number(_) => Value::Number(0.0),
        Value::Bool(_) => Value::Bool(false),
        _ => Value::Text(String::new()),
    }
}

fn binary(op: BinaryOp, l: &Value, r: &Value) -> Value {
    match op {
        BinaryOp::Eq => Value::Bool(compare(l, r) == Some(Ordering::Equal)),
        BinaryOp::Ne => Value::Bool(compare(l, r) != Some(Ordering::Equal)),
        BinaryOp::Lt => Value::Bool(compare(l, r) == Some(Ordering::Less)),
        BinaryOp::Gt => Value::Bool(compare(l, r) == Some(Ordering::Greater)),
        BinaryOp::Concat => Value::Text(format!("{}{}", l.as_text(), r.as_text())),
        BinaryOp::Add | BinaryOp::Sub | BinaryOp::Mul | BinaryOp::Div => {
            let x = match l.as_number() {
                Ok(x) => x,
                Err(e) => return e,
            };
            let y = match r.as_number() {
                Ok(y) => y,
                Err(e) => return e,
            };
            match op {
                BinaryOp::Add => Value::Number(x + y),
                BinaryOp::Sub => Value::Number(x - y),
                BinaryOp::Mul => Value::Number(x * y),
                _ if y == 0.0 => error("#DIV/0!"),
                _ => Value::Number(x / y),
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::formula::address::CellRef;
    use crate::formula::patterns::{
        conditional_chain, dynamic_range_address, keyed_lookup, PivotRanges,
    };
    use std::collections::BTreeMap;

    // 简单网格：sheet 名 → (row, col) → 内容
    struct TestGrid {
        names: Vec<String>,
        values: Vec<BTreeMap<(u32, u16), Value>>,
        formulas: Vec<BTreeMap<(u32, u16), Expr>>,
    }

    impl TestGrid {
        fn new(names: &[&str]) -> Self {
            Self {
                names: names.iter().map(|s| s.to_string()).collect(),
                values: names.iter().map(|_| BTreeMap::new()).collect(),
                formulas: names.iter().map(|_| BTreeMap::new()).collect(),
            }
        }

        fn set(&mut self, sheet: usize, row: u32, col: u16, v: Value) {
            self.values[sheet].insert((row, col), v);
        }

        fn formula(&mut self, sheet: usize, row: u32, col: u16, e: Expr) {
            self.formulas[sheet].insert((row, col), e);
        }
    }

    impl Grid for TestGrid {
        fn sheet_index(&self, name: &str) -> Option<usize> {
            self.names.iter().position(|n| n == name)
        }

        fn sheet_name(&self, index: usize) -> Option<&str> {
            self.names.get(index).map(String::as_str)
        }

        fn cell(&self, sheet: usize, row: u32, col: u16) -> Option<GridCell<'_>> {
            if let Some(e) = self.formulas[sheet].get(&(row, col)) {
                return Some(GridCell::Formula(e));
            }
            self.values[sheet]
                .get(&(row, col))
                .cloned()
                .map(GridCell::Value)
        }

        fn formula_positions(&self, sheet: usize) -> Vec<(u32, u16)> {
            self.formulas[sheet].keys().copied().collect()
        }
    }

    #[test]
    fn test_conditional_chain_blanks_when_driver_empty() {
        let mut grid = TestGrid::new(&["Data"]);
        let driver = CellRef::local_col_abs(1, 0);
        grid.formula(
            0,
            1,
            1,
            conditional_chain(&driver, Expr::cell(CellRef::local(1, 2)).times(Expr::number(2.0))),
        );
        grid.set(0, 1, 2, Value::Number(21.0));

        let ev = Evaluator::new(&grid);
        assert_eq!(ev.value("Data", 1, 1), Value::text(""));

        grid.set(0, 1, 0, Value::text("ME"));
        let ev = Evaluator::new(&grid);
        assert_eq!(ev.value("Data", 1, 1), Value::Number(42.0));
    }

    #[test]
    fn test_keyed_lookup_case_insensitive() {
        let mut grid = TestGrid::new(&["Data", "Lookup"]);
        grid.set(1, 1, 0, Value::text("Main Engine"));
        grid.set(1, 2, 0, Value::text("Aux Engine 1"));
        grid.set(1, 1, 1, Value::Number(7.0));
        grid.set(1, 2, 1, Value::Number(9.0));
        let keys = RangeRef::column("Lookup", 0, 1, 2);
        let values = RangeRef::column("Lookup", 1, 1, 2);
        grid.set(0, 1, 0, Value::text("aux engine 1"));
        grid.formula(0, 1, 1, keyed_lookup(Expr::cell(CellRef::local(1, 0)), &keys, &values));
        grid.set(0, 2, 0, Value::text("Boiler"));
        grid.formula(0, 2, 1, keyed_lookup(Expr::cell(CellRef::local(2, 0)), &keys, &values));

        let ev = Evaluator::new(&grid);
        assert_eq!(ev.value("Data", 1, 1), Value::Number(9.0));
        assert_eq!(ev.value("Data", 2, 1), Value::text(""));
    }

    #[test]
    fn test_dynamic_range_resolves_through_indirect() {
        let mut grid = TestGrid::new(&["Data", "Lookup"]);
        // Lookup: 键 A，数量 B，槽位 C..E
        grid.set(1, 1, 0, Value::text("HFO"));
        grid.set(1, 1, 1, Value::Number(2.0));
        grid.set(1, 1, 2, Value::text("N-1"));
        grid.set(1, 1, 3, Value::text("N-2"));
        grid.set(1, 2, 0, Value::text("MGO"));
        grid.set(1, 2, 1, Value::Number(1.0));
        grid.set(1, 2, 2, Value::text("M-1"));
        let pivot = PivotRanges {
            sheet: "Lookup".to_string(),
            keys: RangeRef::column("Lookup", 0, 1, 2),
            counts: RangeRef::column("Lookup", 1, 1, 2),
            first_slot_col: 2,
        };
        grid.set(0, 1, 0, Value::text("HFO"));
        grid.formula(0, 1, 1, dynamic_range_address(Expr::cell(CellRef::local(1, 0)), &pivot));
        grid.set(0, 2, 0, Value::text("LSMGO"));
        grid.formula(0, 2, 1, dynamic_range_address(Expr::cell(CellRef::local(2, 0)), &pivot));

        let ev = Evaluator::new(&grid);
        assert_eq!(ev.value("Data", 1, 1), Value::text("Lookup!$C$2:$D$2"));
        assert_eq!(ev.value("Data", 2, 1), Value::text(""));

        let indirect = Expr::call(Function::Indirect, vec![Expr::cell(CellRef::local(1, 1))]);
        let values = ev.range_values(0, &indirect).unwrap();
        assert_eq!(values, vec![Value::text("N-1"), Value::text("N-2")]);

        let indirect = Expr::call(Function::Indirect, vec![Expr::cell(CellRef::local(2, 1))]);
        assert!(ev.range_values(0, &indirect).is_err());
    }

    #[test]
    fn test_formula_referencing_empty_cell_is_zero() {
        let mut grid = TestGrid::new(&["Data"]);
        grid.formula(0, 0, 0, Expr::cell(CellRef::local(5, 5)));
        let ev = Evaluator::new(&grid);
        assert_eq!(ev.value("Data", 0, 0), Value::Number(0.0));
    }

    #[test]
    fn test_cycle_is_reported() {
        let mut grid = TestGrid::new(&["Data"]);
        grid.formula(0, 0, 0, Expr::cell(CellRef::local(0, 1)));
        grid.formula(0, 0, 1, Expr::cell(CellRef::local(0, 0)));
        let ev = Evaluator::new(&grid);
        assert!(ev.value("Data", 0, 0).is_error());
    }

    #[test]
    fn test_arithmetic_and_round() {
        let mut grid = TestGrid::new(&["Data"]);
        grid.set(0, 0, 0, Value::Number(10.0));
        grid.set(0, 0, 1, Value::Number(3.0));
        grid.formula(
            0,
            0,
            2,
            Expr::cell(CellRef::local(0, 0))
                .divided_by(Expr::cell(CellRef::local(0, 1)))
                .round(2),
        );
        grid.formula(
            0,
            0,
            3,
            Expr::cell(CellRef::local(0, 0)).divided_by(Expr::number(0.0)),
        );
        let ev = Evaluator::new(&grid);
        assert_eq!(ev.value("Data", 0, 2), Value::Number(3.33));
        assert_eq!(ev.value("Data", 0, 3), Value::Error("#DIV/0!".to_string()));
    }
}
