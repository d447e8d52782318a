// ==========================================
// 船舶离线报表系统 - 应用状态
// ==========================================
// 职责: 打开共享连接、建表、装配仓储与 API 实例
// ==========================================

use std::sync::{Arc, Mutex};

use crate::api::{ImportApi, TemplateApi};
use crate::catalog::LookupCatalogBuilder;
use crate::config::{ConfigManager, PipelineConfigReader};
use crate::db::{ensure_schema, open_sqlite_connection};
use crate::importer::{ImportDispatcher, StagingProvisioner};
use crate::repository::{
    BatchRepository, ReferenceDataRepository, SqliteBatchRepository, SqliteProcedureExecutor,
    SqliteReferenceRepository, SqliteStagingRepository,
};
use crate::template::TemplateGenerator;

/// 应用状态
///
/// 所有仓储共享同一个连接
pub struct AppState {
    /// 数据库路径
    pub db_path: String,

    /// 配置管理器
    pub config_manager: Arc<ConfigManager>,

    /// 模板下载 API
    pub template_api: Arc<TemplateApi>,

    /// 回传导入 API
    pub import_api: Arc<ImportApi>,

    /// 导入过程注册/执行（下游过程由部署方注册）
    pub procedures: Arc<SqliteProcedureExecutor>,
}

impl AppState {
    /// 创建新的 AppState 实例
    ///
    /// # 返回
    /// - Err(String): 打开数据库或建表失败
    pub fn new(db_path: String) -> Result<Self, String> {
        tracing::info!(db_path = %db_path, "初始化 AppState");

        let conn = open_sqlite_connection(&db_path).map_err(|e| format!("无法打开数据库: {}", e))?;
        ensure_schema(&conn).map_err(|e| format!("建表失败: {}", e))?;
        let conn = Arc::new(Mutex::new(conn));

        // ==========================================
        // 仓储层
        // ==========================================
        let reference_repo: Arc<dyn ReferenceDataRepository> =
            Arc::new(SqliteReferenceRepository::from_connection(conn.clone()));
        let batch_repo: Arc<dyn BatchRepository> =
            Arc::new(SqliteBatchRepository::from_connection(conn.clone()));
        let staging_repo = Arc::new(SqliteStagingRepository::from_connection(conn.clone()));
        let procedures = Arc::new(SqliteProcedureExecutor::from_connection(conn.clone()));

        let config_manager = Arc::new(
            ConfigManager::from_connection(conn.clone())
                .map_err(|e| format!("无法创建 ConfigManager: {}", e))?,
        );
        let config_reader: Arc<dyn PipelineConfigReader> = config_manager.clone();

        // ==========================================
        // 生成与导入
        // ==========================================
        let provisioner = Arc::new(StagingProvisioner::new(staging_repo));
        let generator = TemplateGenerator::new(LookupCatalogBuilder::new(reference_repo.clone()))
            .with_provisioner(provisioner.clone());
        let dispatcher = ImportDispatcher::new(batch_repo.clone(), procedures.clone());

        let template_api = Arc::new(TemplateApi::new(generator, config_reader.clone()));
        let import_api = Arc::new(ImportApi::new(
            config_reader,
            reference_repo,
            batch_repo,
            provisioner,
            dispatcher,
        ));

        Ok(Self {
            db_path,
            config_manager,
            template_api,
            import_api,
            procedures,
        })
    }

    /// 获取数据库路径
    pub fn get_db_path(&self) -> &str {
        &self.db_path
    }
}

// ==========================================
// 默认数据库路径辅助函数
// ==========================================

/// 获取默认数据库路径
///
/// # 返回
/// - 环境变量 VESSEL_SHEETS_DB_PATH（非空时）
/// - 否则: 用户数据目录/vessel-sheets/vessel_sheets.db
pub fn get_default_db_path() -> String {
    use std::path::PathBuf;

    if let Ok(path) = std::env::var("VESSEL_SHEETS_DB_PATH") {
        let trimmed = path.trim();
        if !trimmed.is_empty() {
            return trimmed.to_string();
        }
    }

    let mut path = PathBuf::from("./vessel_sheets.db");
    if let Some(data_dir) = dirs::data_dir() {
        let dir = data_dir.join("vessel-sheets");
        // 目录创建失败时回退到当前目录
        if std::fs::create_dir_all(&dir).is_ok() {
            path = dir.join("vessel_sheets.db");
        }
    }

    path.to_string_lossy().to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_get_default_db_path() {
        let path = get_default_db_path();
        assert!(!path.is_empty());
        assert!(path.ends_with(".db"));
    }

    #[test]
    fn test_new_creates_schema() {
        let dir = tempfile::TempDir::new().unwrap();
        let db_path = dir.path().join("state.db").to_string_lossy().to_string();
        let state = AppState::new(db_path.clone()).unwrap();
        assert_eq!(state.get_db_path(), db_path);
    }
}
