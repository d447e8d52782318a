// ==========================================
// 船舶离线报表系统 - 参考数据仓储
// ==========================================
// 职责: 读取单船参考数据（机器/油品+ROB/加油单/航次/港口/时区）
// 红线: Repository 不含业务逻辑（过滤/排序/透视在 catalog::builder）
// ==========================================

use crate::domain::catalog::{
    BunkerNoteEntry, ItemTypeEntry, MachineryEntry, PortEntry, TimezoneEntry, VesselInfo,
    VoyageEntry,
};
use crate::domain::types::ItemCategory;
use crate::repository::error::{RepositoryError, RepositoryResult};
use async_trait::async_trait;
use chrono::NaiveDate;
use rusqlite::{params, Connection, OptionalExtension};
use std::sync::{Arc, Mutex, MutexGuard};
use tracing::debug;

// ==========================================
// ReferenceDataRepository Trait
// ==========================================
// 用途: Lookup Catalog 构建所需的参考数据读取
// 实现者: SqliteReferenceRepository
#[async_trait]
pub trait ReferenceDataRepository: Send + Sync {
    /// 船舶基本信息（不存在时返回 NotFound）
    async fn get_vessel(&self, vessel_id: i64) -> RepositoryResult<VesselInfo>;

    async fn list_machinery(&self, vessel_id: i64) -> RepositoryResult<Vec<MachineryEntry>>;

    /// 全部油品类型及本船 ROB（无 ROB 记录时为 0）
    async fn list_item_types(&self, vessel_id: i64) -> RepositoryResult<Vec<ItemTypeEntry>>;

    /// 本船全部加油单（含余量为 0 的记录）
    async fn list_bunker_notes(&self, vessel_id: i64) -> RepositoryResult<Vec<BunkerNoteEntry>>;

    async fn list_voyages(&self, vessel_id: i64) -> RepositoryResult<Vec<VoyageEntry>>;

    async fn list_ports(&self) -> RepositoryResult<Vec<PortEntry>>;

    async fn list_timezones(&self) -> RepositoryResult<Vec<TimezoneEntry>>;
}

// ==========================================
// SqliteReferenceRepository
// ==========================================
pub struct SqliteReferenceRepository {
    conn: Arc<Mutex<Connection>>,
}

impl SqliteReferenceRepository {
    pub fn from_connection(conn: Arc<Mutex<Connection>>) -> Self {
        Self { conn }
    }

    fn get_conn(&self) -> RepositoryResult<MutexGuard<'_, Connection>> {
        self.conn
            .lock()
            .map_err(|e| RepositoryError::LockError(e.to_string()))
    }
}

fn parse_category(raw: &str) -> rusqlite::Result<ItemCategory> {
    raw.parse::<ItemCategory>().map_err(|e| {
        rusqlite::Error::FromSqlConversionFailure(
            2,
            rusqlite::types::Type::Text,
            format!("item_type.category: {}", e).into(),
        )
    })
}

#[async_trait]
impl ReferenceDataRepository for SqliteReferenceRepository {
    async fn get_vessel(&self, vessel_id: i64) -> RepositoryResult<VesselInfo> {
        let conn = self.get_conn()?;
        conn.query_row(
            "SELECT vessel_id, short_code, name FROM vessel WHERE vessel_id = ?1",
            params![vessel_id],
            |row| {
                Ok(VesselInfo {
                    vessel_id: row.get(0)?,
                    short_code: row.get(1)?,
                    name: row.get(2)?,
                })
            },
        )
        .optional()?
        .ok_or_else(|| RepositoryError::NotFound {
            entity: "vessel".to_string(),
            id: vessel_id.to_string(),
        })
    }

    async fn list_machinery(&self, vessel_id: i64) -> RepositoryResult<Vec<MachineryEntry>> {
        let conn = self.get_conn()?;
        let mut stmt = conn.prepare(
            r#"
            SELECT machinery_id, name, category, rated_power_kw, sfoc_g_kwh
            FROM machinery
            WHERE vessel_id = ?1
            ORDER BY machinery_id
            "#,
        )?;
        let rows = stmt.query_map(params![vessel_id], |row| {
            Ok(MachineryEntry {
                machinery_id: row.get(0)?,
                name: row.get(1)?,
                category: row.get(2)?,
                rated_power_kw: row.get(3)?,
                sfoc_g_kwh: row.get(4)?,
            })
        })?;
        Ok(rows.collect::<Result<Vec<_>, _>>()?)
    }

    async fn list_item_types(&self, vessel_id: i64) -> RepositoryResult<Vec<ItemTypeEntry>> {
        let conn = self.get_conn()?;
        let mut stmt = conn.prepare(
            r#"
            SELECT t.item_type_id, t.type_key, t.category, COALESCE(r.rob, 0)
            FROM item_type t
            LEFT JOIN item_rob r ON r.item_type_id = t.item_type_id AND r.vessel_id = ?1
            ORDER BY t.type_key
            "#,
        )?;
        let rows = stmt.query_map(params![vessel_id], |row| {
            Ok(ItemTypeEntry {
                item_type_id: row.get(0)?,
                type_key: row.get(1)?,
                category: parse_category(&row.get::<_, String>(2)?)?,
                rob: row.get(3)?,
            })
        })?;
        Ok(rows.collect::<Result<Vec<_>, _>>()?)
    }

    async fn list_bunker_notes(&self, vessel_id: i64) -> RepositoryResult<Vec<BunkerNoteEntry>> {
        let conn = self.get_conn()?;
        let mut stmt = conn.prepare(
            r#"
            SELECT n.note_id, t.type_key, n.note_no, n.bunker_date, n.remaining_qty
            FROM bunker_note n
            JOIN item_type t ON t.item_type_id = n.item_type_id
            WHERE n.vessel_id = ?1
            ORDER BY n.note_id
            "#,
        )?;
        let rows = stmt.query_map(params![vessel_id], |row| {
            let note_no: String = row.get(2)?;
            let bunker_date = parse_bunker_date(&note_no, row.get::<_, Option<String>>(3)?);
            Ok(BunkerNoteEntry {
                note_id: row.get(0)?,
                type_key: row.get(1)?,
                note_no,
                bunker_date,
                remaining_qty: row.get(4)?,
            })
        })?;
        Ok(rows.collect::<Result<Vec<_>, _>>()?)
    }

    async fn list_voyages(&self, vessel_id: i64) -> RepositoryResult<Vec<VoyageEntry>> {
        let conn = self.get_conn()?;
        let mut stmt = conn.prepare(
            r#"
            SELECT voyage_id, voyage_no, leg_no
            FROM voyage
            WHERE vessel_id = ?1
            ORDER BY voyage_no, leg_no
            "#,
        )?;
        let rows = stmt.query_map(params![vessel_id], |row| {
            Ok(VoyageEntry {
                voyage_id: row.get(0)?,
                voyage_no: row.get(1)?,
                leg_no: row.get(2)?,
            })
        })?;
        Ok(rows.collect::<Result<Vec<_>, _>>()?)
    }

    async fn list_ports(&self) -> RepositoryResult<Vec<PortEntry>> {
        let conn = self.get_conn()?;
        let mut stmt = conn.prepare("SELECT port_id, name, unlocode FROM port ORDER BY name")?;
        let rows = stmt.query_map([], |row| {
            Ok(PortEntry {
                port_id: row.get(0)?,
                name: row.get(1)?,
                unlocode: row.get(2)?,
            })
        })?;
        Ok(rows.collect::<Result<Vec<_>, _>>()?)
    }

    async fn list_timezones(&self) -> RepositoryResult<Vec<TimezoneEntry>> {
        let conn = self.get_conn()?;
        let mut stmt = conn.prepare(
            "SELECT label, utc_offset_minutes FROM timezone ORDER BY utc_offset_minutes, label",
        )?;
        let rows = stmt.query_map([], |row| {
            Ok(TimezoneEntry {
                label: row.get(0)?,
                utc_offset_minutes: row.get(1)?,
            })
        })?;
        Ok(rows.collect::<Result<Vec<_>, _>>()?)
    }
}

/// 加油日期（YYYY-MM-DD）；无法解析时按无日期排序并记录
fn parse_bunker_date(note_no: &str, raw: Option<String>) -> Option<NaiveDate> {
    let raw = raw?;
    match NaiveDate::parse_from_str(raw.trim(), "%Y-%m-%d") {
        Ok(date) => Some(date),
        Err(e) => {
            debug!(
                note_no = %note_no,
                bunker_date = %raw,
                error = %e,
                "加油日期无法解析，按无日期排在最后"
            );
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_bunker_date() {
        assert_eq!(
            parse_bunker_date("HFO-01", Some("2024-03-05".to_string())),
            NaiveDate::from_ymd_opt(2024, 3, 5)
        );
        assert_eq!(parse_bunker_date("HFO-02", Some("05/03/2024".to_string())), None);
        assert_eq!(parse_bunker_date("HFO-03", None), None);
    }
}
