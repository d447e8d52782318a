// ==========================================
// 船舶离线报表系统 - 单元格地址
// ==========================================
// 职责: A1 地址的格式化与解析（行列均为 0 起）
// ==========================================

use std::fmt;

/// 列号（0 起）→ 列字母
pub fn column_letters(col: u16) -> String {
    let mut n = col as u32 + 1;
    let mut letters = Vec::new();
    while n > 0 {
        let rem = ((n - 1) % 26) as u8;
        letters.push((b'A' + rem) as char);
        n = (n - 1) / 26;
    }
    letters.iter().rev().collect()
}

/// 列字母 → 列号（0 起）
pub fn column_index(letters: &str) -> Option<u16> {
    if letters.is_empty() || letters.len() > 3 {
        return None;
    }
    let mut n: u32 = 0;
    for ch in letters.chars() {
        if !ch.is_ascii_alphabetic() {
            return None;
        }
        n = n * 26 + (ch.to_ascii_uppercase() as u32 - 'A' as u32 + 1);
    }
    u16::try_from(n - 1).ok()
}

/// 工作表名需要引号时加单引号
pub fn quote_sheet(name: &str) -> String {
    let plain = name
        .chars()
        .all(|c| c.is_ascii_alphanumeric() || c == '_')
        && !name.chars().next().map(|c| c.is_ascii_digit()).unwrap_or(true);
    if plain {
        name.to_string()
    } else {
        format!("'{}'", name.replace('\'', "''"))
    }
}

// ==========================================
// CellRef - 单元格引用
// ==========================================
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct CellRef {
    pub sheet: Option<String>,
    pub row: u32,
    pub col: u16,
    pub row_abs: bool,
    pub col_abs: bool,
}

impl CellRef {
    /// 同表相对引用
    pub fn local(row: u32, col: u16) -> Self {
        Self {
            sheet: None,
            row,
            col,
            row_abs: false,
            col_abs: false,
        }
    }

    /// 同表引用，列绝对、行相对（$B2）
    pub fn local_col_abs(row: u32, col: u16) -> Self {
        Self {
            col_abs: true,
            ..Self::local(row, col)
        }
    }

    /// 跨表引用，列绝对、行相对（Voyage!$A2）
    pub fn on_sheet(sheet: &str, row: u32, col: u16) -> Self {
        Self {
            sheet: Some(sheet.to_string()),
            col_abs: true,
            ..Self::local(row, col)
        }
    }

    pub fn a1(&self) -> String {
        format!(
            "{}{}{}{}",
            if self.col_abs { "$" } else { "" },
            column_letters(self.col),
            if self.row_abs { "$" } else { "" },
            self.row + 1
        )
    }
}

impl fmt::Display for CellRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.sheet {
            Some(sheet) => write!(f, "{}!{}", quote_sheet(sheet), self.a1()),
            None => write!(f, "{}", self.a1()),
        }
    }
}

// ==========================================
// RangeRef - 区域引用（始终绝对）
// ==========================================
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct RangeRef {
    pub sheet: Option<String>,
    pub first_row: u32,
    pub first_col: u16,
    pub last_row: u32,
    pub last_col: u16,
}

impl RangeRef {
    pub fn new(sheet: Option<&str>, first_row: u32, first_col: u16, last_row: u32, last_col: u16) -> Self {
        Self {
            sheet: sheet.map(str::to_string),
            first_row,
            first_col,
            last_row: last_row.max(first_row),
            last_col: last_col.max(first_col),
        }
    }

    /// 单列区域
    pub fn column(sheet: &str, col: u16, first_row: u32, last_row: u32) -> Self {
        Self::new(Some(sheet), first_row, col, last_row, col)
    }

    pub fn rows(&self) -> u32 {
        self.last_row - self.first_row + 1
    }

    pub fn cols(&self) -> u16 {
        self.last_col - self.first_col + 1
    }

    /// 区域内第 n 个单元格（行优先，0 起）
    pub fn cell_at(&self, offset_row: u32, offset_col: u16) -> (u32, u16) {
        (self.first_row + offset_row, self.first_col + offset_col)
    }
}

impl fmt::Display for RangeRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if let Some(sheet) = &self.sheet {
            write!(f, "{}!", quote_sheet(sheet))?;
        }
        write!(
            f,
            "${}${}:${}${}",
            column_letters(self.first_col),
            self.first_row + 1,
            column_letters(self.last_col),
            self.last_row + 1
        )
    }
}

/// 解析 "Sheet!$A$1:$B$2" / "'Lube Oil'!C3" / "$A$1" 形式的文本地址
///
/// 单元格地址解析为 1x1 区域；无法解析返回 None
pub fn parse_reference(text: &str) -> Option<RangeRef> {
    let text = text.trim();
    if text.is_empty() {
        return None;
    }

    let (sheet, rest) = match text.rfind('!') {
        Some(idx) => {
            let raw = &text[..idx];
            let sheet = if raw.starts_with('\'') && raw.ends_with('\'') && raw.len() >= 2 {
                raw[1..raw.len() - 1].replace("''", "'")
            } else {
                raw.to_string()
            };
            (Some(sheet), &text[idx + 1..])
        }
        None => (None, text),
    };

    let mut parts = rest.split(':');
    let first = parse_cell(parts.next()?)?;
    let last = match parts.next() {
        Some(p) => parse_cell(p)?,
        None => first,
    };
    if parts.next().is_some() {
        return None;
    }

    Some(RangeRef {
        sheet,
        first_row: first.0.min(last.0),
        first_col: first.1.min(last.1),
        last_row: first.0.max(last.0),
        last_col: first.1.max(last.1),
    })
}

fn parse_cell(text: &str) -> Option<(u32, u16)> {
    let cleaned: String = text.chars().filter(|c| *c != '$').collect();
    let split = cleaned.find(|c: char| c.is_ascii_digit())?;
    let (letters, digits) = cleaned.split_at(split);
    let col = column_index(letters)?;
    let row: u32 = digits.parse().ok()?;
    if row == 0 {
        return None;
    }
    Some((row - 1, col))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_column_letters() {
        assert_eq!(column_letters(0), "A");
        assert_eq!(column_letters(25), "Z");
        assert_eq!(column_letters(26), "AA");
        assert_eq!(column_letters(701), "ZZ");
        assert_eq!(column_letters(702), "AAA");
    }

    #[test]
    fn test_column_index_inverse() {
        for col in [0u16, 1, 25, 26, 51, 700, 702] {
            assert_eq!(column_index(&column_letters(col)), Some(col));
        }
        assert_eq!(column_index("a1"), None);
    }

    #[test]
    fn test_cell_ref_display() {
        assert_eq!(CellRef::local(1, 1).to_string(), "B2");
        assert_eq!(CellRef::local_col_abs(4, 0).to_string(), "$A5");
        assert_eq!(CellRef::on_sheet("Lube Oil", 1, 3).to_string(), "'Lube Oil'!$D2");
    }

    #[test]
    fn test_range_display() {
        let r = RangeRef::column("Lookup", 2, 1, 9);
        assert_eq!(r.to_string(), "Lookup!$C$2:$C$10");
    }

    #[test]
    fn test_parse_reference() {
        let r = parse_reference("Lookup!$K$5:$M$5").unwrap();
        assert_eq!(r.sheet.as_deref(), Some("Lookup"));
        assert_eq!((r.first_row, r.first_col, r.last_row, r.last_col), (4, 10, 4, 12));

        let r = parse_reference("'Lube Oil'!C3").unwrap();
        assert_eq!(r.sheet.as_deref(), Some("Lube Oil"));
        assert_eq!((r.first_row, r.first_col), (2, 2));
        assert_eq!(r.rows(), 1);

        assert!(parse_reference("").is_none());
        assert!(parse_reference("Lookup!").is_none());
        assert!(parse_reference("A0").is_none());
    }
}
