// ==========================================
// 船舶离线报表系统 - SQLite 连接初始化
// ==========================================
// 目标:
// - 统一所有 Connection::open 的 PRAGMA 行为
// - 统一 busy_timeout，减少并发写入时的偶发 busy 错误
// - 建立核心流水线所需的最小表结构（幂等）
// ==========================================

use rusqlite::Connection;
use std::time::Duration;

/// 默认 busy_timeout（毫秒）
pub const DEFAULT_BUSY_TIMEOUT_MS: u64 = 5_000;

/// 配置 SQLite 连接的统一 PRAGMA
///
/// 说明：
/// - foreign_keys 需要"每个连接"单独开启
/// - busy_timeout 需要"每个连接"单独配置
pub fn configure_sqlite_connection(conn: &Connection) -> rusqlite::Result<()> {
    conn.execute_batch("PRAGMA foreign_keys = ON;")?;
    conn.busy_timeout(Duration::from_millis(DEFAULT_BUSY_TIMEOUT_MS))?;
    Ok(())
}

/// 打开 SQLite 连接并应用统一配置
pub fn open_sqlite_connection(db_path: &str) -> rusqlite::Result<Connection> {
    let conn = Connection::open(db_path)?;
    configure_sqlite_connection(&conn)?;
    Ok(conn)
}

/// 建立最小表结构
///
/// 参考数据表由上游系统维护，这里只保证结构存在；
/// staging 表由 StagingProvisioner 按需创建，不在此列。
pub fn ensure_schema(conn: &Connection) -> rusqlite::Result<()> {
    conn.execute_batch(SCHEMA_SQL)
}

const SCHEMA_SQL: &str = r#"
CREATE TABLE IF NOT EXISTS vessel (
    vessel_id   INTEGER PRIMARY KEY,
    short_code  TEXT NOT NULL UNIQUE,
    name        TEXT NOT NULL
);

CREATE TABLE IF NOT EXISTS machinery (
    machinery_id    INTEGER PRIMARY KEY,
    vessel_id       INTEGER NOT NULL REFERENCES vessel(vessel_id),
    name            TEXT NOT NULL,
    category        TEXT NOT NULL DEFAULT '',
    rated_power_kw  REAL NOT NULL DEFAULT 0,
    sfoc_g_kwh      REAL NOT NULL DEFAULT 0
);

CREATE TABLE IF NOT EXISTS item_type (
    item_type_id  INTEGER PRIMARY KEY,
    type_key      TEXT NOT NULL UNIQUE,
    category      TEXT NOT NULL
);

CREATE TABLE IF NOT EXISTS item_rob (
    vessel_id     INTEGER NOT NULL REFERENCES vessel(vessel_id),
    item_type_id  INTEGER NOT NULL REFERENCES item_type(item_type_id),
    rob           REAL NOT NULL DEFAULT 0,
    PRIMARY KEY (vessel_id, item_type_id)
);

CREATE TABLE IF NOT EXISTS bunker_note (
    note_id        INTEGER PRIMARY KEY,
    vessel_id      INTEGER NOT NULL REFERENCES vessel(vessel_id),
    item_type_id   INTEGER NOT NULL REFERENCES item_type(item_type_id),
    note_no        TEXT NOT NULL,
    bunker_date    TEXT,
    remaining_qty  REAL NOT NULL DEFAULT 0
);

CREATE TABLE IF NOT EXISTS voyage (
    voyage_id  INTEGER PRIMARY KEY,
    vessel_id  INTEGER NOT NULL REFERENCES vessel(vessel_id),
    voyage_no  TEXT NOT NULL,
    leg_no     INTEGER
);

CREATE TABLE IF NOT EXISTS port (
    port_id   INTEGER PRIMARY KEY,
    name      TEXT NOT NULL,
    unlocode  TEXT
);

CREATE TABLE IF NOT EXISTS timezone (
    label               TEXT PRIMARY KEY,
    utc_offset_minutes  INTEGER NOT NULL
);

CREATE TABLE IF NOT EXISTS config_kv (
    scope_id  TEXT NOT NULL,
    key       TEXT NOT NULL,
    value     TEXT NOT NULL,
    PRIMARY KEY (scope_id, key)
);

CREATE TABLE IF NOT EXISTS import_procedure (
    name      TEXT PRIMARY KEY,
    body_sql  TEXT NOT NULL
);

CREATE TABLE IF NOT EXISTS import_batch (
    batch_id          TEXT PRIMARY KEY,
    vessel_id         INTEGER NOT NULL,
    status            TEXT NOT NULL,
    created_at        TEXT NOT NULL,
    last_report_type  TEXT,
    last_message      TEXT
);

CREATE TABLE IF NOT EXISTS batch_artifact (
    batch_id    TEXT NOT NULL REFERENCES import_batch(batch_id),
    sheet_name  TEXT NOT NULL,
    csv_path    TEXT NOT NULL,
    row_count   INTEGER NOT NULL,
    mirrored    INTEGER NOT NULL DEFAULT 0,
    PRIMARY KEY (batch_id, sheet_name)
);
"#;
