// ==========================================
// 船舶离线报表系统 - 单元格文本化
// ==========================================
// 读取的是单元格最后一次计算结果，不重算公式
// - 数字: 整数不带小数点
// - 布尔: TRUE / FALSE
// - 错误值: 空白
// - 日期时间: 固定格式，按序列值直接换算，不做时区转换
// ==========================================

use crate::domain::types::ValueKind;
use crate::formula::render::format_number;
use calamine::Data;
use chrono::{Duration, NaiveDate, NaiveDateTime};

/// 导出日期时间格式
pub const DATETIME_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

const SECONDS_PER_DAY: f64 = 86_400.0;

/// 序列值 → 日期时间（1900 日期系统，基准 1899-12-30）
pub fn serial_to_datetime(serial: f64) -> Option<NaiveDateTime> {
    if !serial.is_finite() || serial < 0.0 {
        return None;
    }
    let base = NaiveDate::from_ymd_opt(1899, 12, 30)?.and_hms_opt(0, 0, 0)?;
    let seconds = (serial * SECONDS_PER_DAY).round() as i64;
    base.checked_add_signed(Duration::seconds(seconds))
}

fn format_serial(serial: f64) -> String {
    serial_to_datetime(serial)
        .map(|dt| dt.format(DATETIME_FORMAT).to_string())
        .unwrap_or_else(|| format_number(serial))
}

/// 单元格 → 导出文本
///
/// 日期列中的普通数字同样按序列值换算
pub fn format_cell(data: &Data, kind: ValueKind) -> String {
    match data {
        Data::Empty => String::new(),
        Data::String(s) => s.clone(),
        Data::Float(n) if kind == ValueKind::DateTime => format_serial(*n),
        Data::Float(n) => format_number(*n),
        Data::Int(n) if kind == ValueKind::DateTime => format_serial(*n as f64),
        Data::Int(n) => n.to_string(),
        Data::Bool(b) => if *b { "TRUE" } else { "FALSE" }.to_string(),
        Data::Error(_) => String::new(),
        Data::DateTime(dt) => format_serial(dt.as_f64()),
        Data::DateTimeIso(s) => s.replace('T', " "),
        Data::DurationIso(s) => s.clone(),
    }
}
