// ==========================================
// 船舶离线报表系统 - 公式表达式模型
// ==========================================
// 职责: 公式的内部表示（字面量/单元格/区域/函数调用/条件/二元运算）
// 渲染: formula::render；求值: formula::eval
// ==========================================

use crate::formula::address::{CellRef, RangeRef};

#[derive(Debug, Clone, PartialEq)]
pub enum Literal {
    Text(String),
    Number(f64),
    Bool(bool),
}

/// 支持的工作表函数
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Function {
    IfError,
    Index,
    Match,
    Address,
    CountA,
    Indirect,
    And,
    Or,
    Round,
}

impl Function {
    pub fn name(&self) -> &'static str {
        match self {
            Function::IfError => "IFERROR",
            Function::Index => "INDEX",
            Function::Match => "MATCH",
            Function::Address => "ADDRESS",
            Function::CountA => "COUNTA",
            Function::Indirect => "INDIRECT",
            Function::And => "AND",
            Function::Or => "OR",
            Function::Round => "ROUND",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BinaryOp {
    Eq,
    Ne,
    Lt,
    Gt,
    Concat,
    Add,
    Sub,
    Mul,
    Div,
}

impl BinaryOp {
    pub fn symbol(&self) -> &'static str {
        match self {
            BinaryOp::Eq => "=",
            BinaryOp::Ne => "<>",
            BinaryOp::Lt => "<",
            BinaryOp::Gt => ">",
            BinaryOp::Concat => "&",
            BinaryOp::Add => "+",
            BinaryOp::Sub => "-",
            BinaryOp::Mul => "*",
            BinaryOp::Div => "/",
        }
    }

    /// 运算优先级（数值越大越先结合）
    pub fn precedence(&self) -> u8 {
        match self {
            BinaryOp::Eq | BinaryOp::Ne | BinaryOp::Lt | BinaryOp::Gt => 1,
            BinaryOp::Concat => 2,
            BinaryOp::Add | BinaryOp::Sub => 3,
            BinaryOp::Mul | BinaryOp::Div => 4,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum Expr {
    Literal(Literal),
    Cell(CellRef),
    Range(RangeRef),
    Call(Function, Vec<Expr>),
    Conditional {
        test: Box<Expr>,
        then: Box<Expr>,
        otherwise: Box<Expr>,
    },
    Binary {
        op: BinaryOp,
        lhs: Box<Expr>,
        rhs: Box<Expr>,
    },
}

impl Expr {
    pub fn text(s: impl Into<String>) -> Expr {
        Expr::Literal(Literal::Text(s.into()))
    }

    /// 空字符串 ""
    pub fn empty() -> Expr {
        Expr::text("")
    }

    pub fn number(n: f64) -> Expr {
        Expr::Literal(Literal::Number(n))
    }

    pub fn boolean(b: bool) -> Expr {
        Expr::Literal(Literal::Bool(b))
    }

    pub fn cell(r: CellRef) -> Expr {
        Expr::Cell(r)
    }

    pub fn range(r: RangeRef) -> Expr {
        Expr::Range(r)
    }

    pub fn call(f: Function, args: Vec<Expr>) -> Expr {
        Expr::Call(f, args)
    }

    pub fn if_then(test: Expr, then: Expr, otherwise: Expr) -> Expr {
        Expr::Conditional {
            test: Box::new(test),
            then: Box::new(then),
            otherwise: Box::new(otherwise),
        }
    }

    fn binary(self, op: BinaryOp, rhs: Expr) -> Expr {
        Expr::Binary {
            op,
            lhs: Box::new(self),
            rhs: Box::new(rhs),
        }
    }

    pub fn equals(self, rhs: Expr) -> Expr {
        self.binary(BinaryOp::Eq, rhs)
    }

    pub fn not_equals(self, rhs: Expr) -> Expr {
        self.binary(BinaryOp::Ne, rhs)
    }

    pub fn less_than(self, rhs: Expr) -> Expr {
        self.binary(BinaryOp::Lt, rhs)
    }

    pub fn greater_than(self, rhs: Expr) -> Expr {
        self.binary(BinaryOp::Gt, rhs)
    }

    pub fn join(self, rhs: Expr) -> Expr {
        self.binary(BinaryOp::Concat, rhs)
    }

    pub fn plus(self, rhs: Expr) -> Expr {
        self.binary(BinaryOp::Add, rhs)
    }

    pub fn minus(self, rhs: Expr) -> Expr {
        self.binary(BinaryOp::Sub, rhs)
    }

    pub fn times(self, rhs: Expr) -> Expr {
        self.binary(BinaryOp::Mul, rhs)
    }

    pub fn divided_by(self, rhs: Expr) -> Expr {
        self.binary(BinaryOp::Div, rhs)
    }

    /// self = ""
    pub fn is_blank(self) -> Expr {
        self.equals(Expr::empty())
    }

    /// self <> ""
    pub fn is_present(self) -> Expr {
        self.not_equals(Expr::empty())
    }

    pub fn round(self, digits: u32) -> Expr {
        Expr::call(Function::Round, vec![self, Expr::number(digits as f64)])
    }

    /// 收集表达式中引用到的所有单元格（不含区域）
    pub fn cell_refs(&self) -> Vec<&CellRef> {
        let mut out = Vec::new();
        self.collect_cells(&mut out);
        out
    }

    fn collect_cells<'a>(&'a self, out: &mut Vec<&'a CellRef>) {
        match self {
            Expr::Literal(_) | Expr::Range(_) => {}
            Expr::Cell(c) => out.push(c),
            Expr::Call(_, args) => args.iter().for_each(|a| a.collect_cells(out)),
            Expr::Conditional {
                test,
                then,
                otherwise,
            } => {
                test.collect_cells(out);
                then.collect_cells(out);
                otherwise.collect_cells(out);
            }
            Expr::Binary { lhs, rhs, .. } => {
                lhs.collect_cells(out);
                rhs.collect_cells(out);
            }
        }
    }
}

/// OR(a, b, ...)
pub fn any_of(args: Vec<Expr>) -> Expr {
    Expr::call(Function::Or, args)
}

/// IFERROR(value, fallback)
pub fn if_error(value: Expr, fallback: Expr) -> Expr {
    Expr::call(Function::IfError, vec![value, fallback])
}

/// MATCH(key, range, 0)
pub fn exact_match(key: Expr, range: RangeRef) -> Expr {
    Expr::call(
        Function::Match,
        vec![key, Expr::range(range), Expr::number(0.0)],
    )
}

/// INDEX(range, n)
pub fn index(range: RangeRef, n: Expr) -> Expr {
    Expr::call(Function::Index, vec![Expr::range(range), n])
}
