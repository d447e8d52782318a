// ==========================================
// 船舶离线报表系统 - 配置管理器
// ==========================================
// 职责: 配置加载、查询、覆写管理
// 存储: config_kv 表 (scope_id + key → value)
// 作用域: 'vessel:{id}' 优先于 'global'，都不存在时取默认值
// ==========================================

use crate::config::domain_config::DomainConfig;
use crate::config::layout_config::LayoutConfig;
use crate::config::pipeline_config_trait::PipelineConfigReader;
use crate::config::storage_config::StorageConfig;
use crate::config::ConfigError;
use crate::db::open_sqlite_connection;
use async_trait::async_trait;
use rusqlite::{params, Connection, OptionalExtension};
use serde::de::DeserializeOwned;
use serde_json::json;
use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::{Arc, Mutex};

// ==========================================
// ConfigScope - 配置作用域
// ==========================================
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConfigScope {
    Global,
    Vessel { vessel_id: i64 },
}

impl ConfigScope {
    pub fn scope_id(&self) -> String {
        match self {
            ConfigScope::Global => "global".to_string(),
            ConfigScope::Vessel { vessel_id } => format!("vessel:{}", vessel_id),
        }
    }
}

// ==========================================
// ConfigManager - 配置管理器
// ==========================================
pub struct ConfigManager {
    conn: Arc<Mutex<Connection>>,
}

impl ConfigManager {
    /// 创建新的 ConfigManager 实例
    ///
    /// # 参数
    /// - db_path: 数据库文件路径
    pub fn new(db_path: &str) -> Result<Self, ConfigError> {
        let conn = open_sqlite_connection(db_path)?;

        Ok(Self {
            conn: Arc::new(Mutex::new(conn)),
        })
    }

    /// 从已有连接创建 ConfigManager
    ///
    /// 说明：为保证连接行为一致，会对传入连接再次应用统一 PRAGMA（幂等）。
    pub fn from_connection(conn: Arc<Mutex<Connection>>) -> Result<Self, ConfigError> {
        {
            let conn_guard = conn.lock().map_err(|e| format!("锁获取失败: {}", e))?;
            crate::db::configure_sqlite_connection(&conn_guard)?;
        }

        Ok(Self { conn })
    }

    fn get_scoped_value(&self, scope: &ConfigScope, key: &str) -> Result<Option<String>, ConfigError> {
        let conn = self.conn.lock().map_err(|e| format!("锁获取失败: {}", e))?;

        let value = conn
            .query_row(
                "SELECT value FROM config_kv WHERE scope_id = ?1 AND key = ?2",
                params![scope.scope_id(), key],
                |row| row.get::<_, String>(0),
            )
            .optional()?;
        Ok(value)
    }

    /// 读取配置值：vessel 作用域优先，回退到 global
    pub fn get_config_value(
        &self,
        vessel_id: Option<i64>,
        key: &str,
    ) -> Result<Option<String>, ConfigError> {
        if let Some(vessel_id) = vessel_id {
            if let Some(v) = self.get_scoped_value(&ConfigScope::Vessel { vessel_id }, key)? {
                return Ok(Some(v));
            }
        }
        self.get_scoped_value(&ConfigScope::Global, key)
    }

    /// 写入配置值（UPSERT）
    pub fn set_config_value(
        &self,
        scope: &ConfigScope,
        key: &str,
        value: &str,
    ) -> Result<(), ConfigError> {
        let conn = self.conn.lock().map_err(|e| format!("锁获取失败: {}", e))?;
        conn.execute(
            "INSERT INTO config_kv (scope_id, key, value) VALUES (?1, ?2, ?3)
             ON CONFLICT(scope_id, key) DO UPDATE SET value = ?3",
            params![scope.scope_id(), key, value],
        )?;
        Ok(())
    }

    /// 获取指定作用域配置快照（JSON格式）
    pub fn get_config_snapshot(&self, scope: &ConfigScope) -> Result<String, ConfigError> {
        let conn = self.conn.lock().map_err(|e| format!("锁获取失败: {}", e))?;

        let mut stmt =
            conn.prepare("SELECT key, value FROM config_kv WHERE scope_id = ?1 ORDER BY key")?;

        let mut config_map: HashMap<String, String> = HashMap::new();
        let rows = stmt.query_map(params![scope.scope_id()], |row| {
            Ok((row.get::<_, String>(0)?, row.get::<_, String>(1)?))
        })?;

        for row in rows {
            let (key, value) = row?;
            config_map.insert(key, value);
        }

        Ok(serde_json::to_string(&json!(config_map))?)
    }

    // 数值配置：解析失败时回退默认值
    fn parse_or<T: std::str::FromStr>(
        &self,
        vessel_id: Option<i64>,
        key: &str,
        default: T,
    ) -> Result<T, ConfigError> {
        Ok(self
            .get_config_value(vessel_id, key)?
            .and_then(|v| v.trim().parse::<T>().ok())
            .unwrap_or(default))
    }

    // JSON 配置：解析失败时回退默认值
    fn json_or<T: DeserializeOwned>(
        &self,
        vessel_id: Option<i64>,
        key: &str,
        default: T,
    ) -> Result<T, ConfigError> {
        Ok(self
            .get_config_value(vessel_id, key)?
            .and_then(|v| serde_json::from_str::<T>(&v).ok())
            .unwrap_or(default))
    }
}

// ==========================================
// PipelineConfigReader 实现
// ==========================================
#[async_trait]
impl PipelineConfigReader for ConfigManager {
    async fn get_domain_config(&self, vessel_id: Option<i64>) -> Result<DomainConfig, ConfigError> {
        let defaults = DomainConfig::default();

        let note_slot_limit = self
            .parse_or(vessel_id, config_keys::NOTE_SLOT_LIMIT, defaults.note_slot_limit)?
            .max(1);

        let protection_password = self
            .get_config_value(vessel_id, config_keys::PROTECTION_PASSWORD)?
            .unwrap_or(defaults.protection_password);

        Ok(DomainConfig {
            operation_types: self.json_or(
                vessel_id,
                config_keys::OPERATION_TYPES,
                defaults.operation_types,
            )?,
            not_applicable: self.json_or(
                vessel_id,
                config_keys::NOT_APPLICABLE,
                defaults.not_applicable,
            )?,
            note_slot_limit,
            protection_password,
            editable_formula_columns: self.json_or(
                vessel_id,
                config_keys::EDITABLE_FORMULA_COLUMNS,
                defaults.editable_formula_columns,
            )?,
        })
    }

    async fn get_layout_config(&self, vessel_id: Option<i64>) -> Result<LayoutConfig, ConfigError> {
        let defaults = LayoutConfig::default();

        // 至少保留表头 + 1 行数据
        let standard_max_row = self
            .parse_or(vessel_id, config_keys::STANDARD_MAX_ROW, defaults.standard_max_row)?
            .max(2);
        let bulk_max_row = self
            .parse_or(vessel_id, config_keys::BULK_MAX_ROW, defaults.bulk_max_row)?
            .max(2);

        Ok(LayoutConfig {
            standard_max_row,
            bulk_max_row,
            ..defaults
        })
    }

    async fn get_storage_config(&self) -> Result<StorageConfig, ConfigError> {
        let defaults = StorageConfig::default();

        let upload_root = self
            .get_config_value(None, config_keys::UPLOAD_ROOT)?
            .map(PathBuf::from)
            .unwrap_or(defaults.upload_root);
        let mirror_root = self
            .get_config_value(None, config_keys::MIRROR_ROOT)?
            .filter(|v| !v.trim().is_empty())
            .map(PathBuf::from);

        Ok(StorageConfig {
            upload_root,
            mirror_root,
        })
    }
}

// ==========================================
// 配置键常量
// ==========================================
pub mod config_keys {
    // 业务
    pub const OPERATION_TYPES: &str = "operation_types"; // JSON 数组
    pub const NOT_APPLICABLE: &str = "not_applicable"; // JSON 数组
    pub const NOTE_SLOT_LIMIT: &str = "note_slot_limit";
    pub const PROTECTION_PASSWORD: &str = "protection_password";
    pub const EDITABLE_FORMULA_COLUMNS: &str = "editable_formula_columns"; // JSON 数组

    // 布局
    pub const STANDARD_MAX_ROW: &str = "standard_max_row";
    pub const BULK_MAX_ROW: &str = "bulk_max_row";

    // 存储
    pub const UPLOAD_ROOT: &str = "upload_root";
    pub const MIRROR_ROOT: &str = "mirror_root";
}
