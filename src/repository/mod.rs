// ==========================================
// 船舶离线报表系统 - 数据仓储层
// ==========================================
// 红线: Repository 不含业务逻辑
// 职责: 提供数据访问接口,屏蔽数据库细节
// 约束: 所有值查询使用参数化；动态标识符统一加引号
// ==========================================

pub mod batch_repo;
pub mod error;
pub mod procedure_repo;
pub mod reference_repo;
pub mod staging_repo;

// 重导出核心仓储
pub use batch_repo::{BatchRepository, SqliteBatchRepository};
pub use error::{RepositoryError, RepositoryResult};
pub use procedure_repo::{SqliteProcedureExecutor, BATCH_ID_PARAM};
pub use reference_repo::{ReferenceDataRepository, SqliteReferenceRepository};
pub use staging_repo::{SqliteStagingRepository, StagingRepository};
