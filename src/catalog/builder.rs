// ==========================================
// 船舶离线报表系统 - Lookup Catalog 构建器
// ==========================================
// 输入: vessel_id；输出: 单船参考数据快照
// 加油单溢出（超过槽位上限）属于已接受的数据丢失，只记 debug 日志
// ==========================================

use crate::catalog::model::LookupCatalog;
use crate::config::DomainConfig;
use crate::repository::{ReferenceDataRepository, RepositoryResult};
use std::sync::Arc;
use tracing::{debug, info, instrument};

pub struct LookupCatalogBuilder {
    repo: Arc<dyn ReferenceDataRepository>,
}

impl LookupCatalogBuilder {
    pub fn new(repo: Arc<dyn ReferenceDataRepository>) -> Self {
        Self { repo }
    }

    /// 构建快照
    ///
    /// # 返回
    /// - Err: 船舶不存在或任一参考查询失败（不返回部分快照）
    #[instrument(skip(self, domain))]
    pub async fn build(&self, vessel_id: i64, domain: &DomainConfig) -> RepositoryResult<LookupCatalog> {
        let vessel = self.repo.get_vessel(vessel_id).await?;
        let machinery = self.repo.list_machinery(vessel_id).await?;
        let item_types = self.repo.list_item_types(vessel_id).await?;
        let notes = self.repo.list_bunker_notes(vessel_id).await?;
        let voyages = self.repo.list_voyages(vessel_id).await?;
        let ports = self.repo.list_ports().await?;
        let timezones = self.repo.list_timezones().await?;

        let catalog = LookupCatalog::new(
            vessel,
            machinery,
            item_types,
            &notes,
            voyages,
            ports,
            timezones,
            domain.note_slot_limit,
        );

        for (type_key, dropped) in &catalog.notes.overflow {
            debug!(
                vessel_id,
                type_key = %type_key,
                dropped,
                slot_limit = domain.note_slot_limit,
                "加油单超出槽位上限，超出部分不进入下拉"
            );
        }

        info!(
            vessel_id,
            machinery = catalog.machinery.len(),
            item_types = catalog.item_types.len(),
            note_types = catalog.notes.groups.len(),
            voyages = catalog.voyages.len(),
            "Lookup Catalog 构建完成"
        );
        Ok(catalog)
    }
}
