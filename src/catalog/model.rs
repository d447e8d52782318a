// ==========================================
// 船舶离线报表系统 - Lookup Catalog
// ==========================================
// 职责: 单船参考数据快照（生成请求内构建一次，之后只读）
// 结构: 按业务键分别建索引，公式构建器逐个引用，不依赖跨列表的行对齐
// 不变量: 可选的加油单号在快照时余量严格大于 0
// ==========================================

use crate::domain::catalog::{
    BunkerNoteEntry, ItemTypeEntry, MachineryEntry, PortEntry, TimezoneEntry, VesselInfo,
    VoyageEntry,
};
use crate::domain::types::ItemCategory;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

// ==========================================
// NotePivot - 加油单长表 → 宽表
// ==========================================
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct NotePivot {
    /// 油品类型键 → 排序后的加油单号（最多 slot_limit 个）
    pub groups: BTreeMap<String, Vec<String>>,
    /// 油品类型键 → 被截断丢弃的加油单数
    pub overflow: BTreeMap<String, usize>,
}

/// 透视加油单
///
/// - 余量 <= 0 的加油单不参与
/// - 同类型内按加油日期升序（无日期排最后），再按单号排序
/// - 超过 slot_limit 的部分静默丢弃（记入 overflow）
pub fn pivot_notes(notes: &[BunkerNoteEntry], slot_limit: usize) -> NotePivot {
    let mut grouped: BTreeMap<String, Vec<&BunkerNoteEntry>> = BTreeMap::new();
    for note in notes.iter().filter(|n| n.remaining_qty > 0.0) {
        grouped.entry(note.type_key.clone()).or_default().push(note);
    }

    let mut pivot = NotePivot::default();
    for (key, mut entries) in grouped {
        entries.sort_by(|a, b| {
            let date_order = match (a.bunker_date, b.bunker_date) {
                (Some(x), Some(y)) => x.cmp(&y),
                (Some(_), None) => std::cmp::Ordering::Less,
                (None, Some(_)) => std::cmp::Ordering::Greater,
                (None, None) => std::cmp::Ordering::Equal,
            };
            date_order.then_with(|| a.note_no.cmp(&b.note_no))
        });

        if entries.len() > slot_limit {
            pivot.overflow.insert(key.clone(), entries.len() - slot_limit);
        }
        let kept: Vec<String> = entries
            .into_iter()
            .take(slot_limit)
            .map(|n| n.note_no.clone())
            .collect();
        pivot.groups.insert(key, kept);
    }
    pivot
}

// ==========================================
// LookupCatalog
// ==========================================
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LookupCatalog {
    pub vessel: VesselInfo,
    pub machinery: BTreeMap<i64, MachineryEntry>,
    pub item_types: BTreeMap<String, ItemTypeEntry>,
    pub notes: NotePivot,
    pub voyages: Vec<VoyageEntry>,
    pub ports: Vec<PortEntry>,
    pub timezones: Vec<TimezoneEntry>,
    pub note_slot_limit: usize,
    pub snapshot_at: DateTime<Utc>,
}

impl LookupCatalog {
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        vessel: VesselInfo,
        machinery: Vec<MachineryEntry>,
        item_types: Vec<ItemTypeEntry>,
        notes: &[BunkerNoteEntry],
        voyages: Vec<VoyageEntry>,
        ports: Vec<PortEntry>,
        timezones: Vec<TimezoneEntry>,
        note_slot_limit: usize,
    ) -> Self {
        Self {
            vessel,
            machinery: machinery
                .into_iter()
                .map(|m| (m.machinery_id, m))
                .collect(),
            item_types: item_types
                .into_iter()
                .map(|t| (t.type_key.clone(), t))
                .collect(),
            notes: pivot_notes(notes, note_slot_limit),
            voyages,
            ports,
            timezones,
            note_slot_limit,
            snapshot_at: Utc::now(),
        }
    }

    /// 机器下拉顺序（按名称）
    pub fn machinery_by_name(&self) -> Vec<&MachineryEntry> {
        let mut list: Vec<&MachineryEntry> = self.machinery.values().collect();
        list.sort_by(|a, b| a.name.cmp(&b.name).then(a.machinery_id.cmp(&b.machinery_id)));
        list
    }

    fn keys_of(&self, category: ItemCategory) -> Vec<String> {
        self.item_types
            .values()
            .filter(|t| t.category == category)
            .map(|t| t.type_key.clone())
            .collect()
    }

    /// 去重后的燃油类型键（连续无空洞）
    pub fn fuel_keys(&self) -> Vec<String> {
        self.keys_of(ItemCategory::Fuel)
    }

    /// 去重后的滑油类型键（连续无空洞）
    pub fn lube_keys(&self) -> Vec<String> {
        self.keys_of(ItemCategory::LubeOil)
    }

    pub fn notes_for(&self, type_key: &str) -> &[String] {
        self.notes
            .groups
            .get(type_key)
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    /// 有可选加油单的类型（宽表行）
    pub fn note_groups(&self) -> impl Iterator<Item = (&String, &Vec<String>)> {
        self.notes.groups.iter().filter(|(_, notes)| !notes.is_empty())
    }

    pub fn dropped_note_count(&self) -> usize {
        self.notes.overflow.values().sum()
    }

    /// 旧版按位置拼接的整表视图（列表按最长者补空）
    ///
    /// 第 i 行的各列来自不同列表的第 i 项，除非共享键列，否则互不相关。
    /// 仅用于导出/排查；公式构建不依赖此视图。
    pub fn positional_rows(&self) -> Vec<Vec<String>> {
        let columns: Vec<Vec<String>> = vec![
            self.machinery_by_name().iter().map(|m| m.name.clone()).collect(),
            self.item_types.keys().cloned().collect(),
            self.item_types.values().map(|t| t.rob.to_string()).collect(),
            self.voyages.iter().map(|v| v.voyage_no.clone()).collect(),
            self.ports.iter().map(|p| p.name.clone()).collect(),
            self.timezones.iter().map(|t| t.label.clone()).collect(),
        ];
        let height = columns.iter().map(Vec::len).max().unwrap_or(0);
        (0..height)
            .map(|i| {
                columns
                    .iter()
                    .map(|col| col.get(i).cloned().unwrap_or_default())
                    .collect()
            })
            .collect()
    }
}
