// ==========================================
// 船舶离线报表系统 - Lookup 表布局
// ==========================================
// 职责: 把 Lookup Catalog 的各个列表并排写入隐藏的 Lookup 表，
//       并记录每个列表所在区域，供公式/验证逐个引用
// 约束: 每个列表从第 2 行开始按自身长度写入；空列表保留一个空单元格
// 加油单宽表: Note Type | Note Count | Note1..NoteN（N = 槽位上限）
// ==========================================

use crate::catalog::LookupCatalog;
use crate::config::LayoutConfig;
use crate::domain::types::ColumnRole;
use crate::formula::address::RangeRef;
use crate::formula::patterns::PivotRanges;
use crate::template::model::{CellContent, SheetTemplate, TemplateColumn};

#[derive(Debug, Clone, PartialEq)]
pub struct LookupLayout {
    pub sheet: String,
    pub machinery_names: RangeRef,
    pub machinery_ids: RangeRef,
    pub machinery_power: RangeRef,
    pub machinery_sfoc: RangeRef,
    pub fuel_keys: RangeRef,
    pub lube_keys: RangeRef,
    pub item_keys: RangeRef,
    pub item_ids: RangeRef,
    pub item_rob: RangeRef,
    pub notes: PivotRanges,
    pub voyage_nos: RangeRef,
    pub voyage_ids: RangeRef,
    pub port_names: RangeRef,
    pub port_ids: RangeRef,
    pub timezones: RangeRef,
}

// 列写入器：顺序分配列号并记录区域
struct ColumnCursor<'a> {
    sheet_name: &'a str,
    columns: Vec<TemplateColumn>,
    cells: Vec<(u32, u16, CellContent)>,
    width: f64,
}

impl<'a> ColumnCursor<'a> {
    fn next_col(&self) -> u16 {
        self.columns.len() as u16
    }

    fn header(&mut self, header: &str) -> u16 {
        let col = self.next_col();
        self.columns.push(TemplateColumn {
            header: header.to_string(),
            role: ColumnRole::Input,
            width: self.width,
        });
        col
    }

    fn list(&mut self, header: &str, values: Vec<CellContent>) -> RangeRef {
        let col = self.header(header);
        let len = values.len() as u32;
        for (i, v) in values.into_iter().enumerate() {
            self.cells.push((i as u32 + 1, col, v));
        }
        RangeRef::column(self.sheet_name, col, 1, len.max(1))
    }

    fn max_row(&self) -> u32 {
        self.cells.iter().map(|(r, _, _)| *r + 1).max().unwrap_or(1).max(2)
    }
}

fn texts<I: IntoIterator<Item = String>>(values: I) -> Vec<CellContent> {
    values.into_iter().map(CellContent::Text).collect()
}

fn numbers<I: IntoIterator<Item = f64>>(values: I) -> Vec<CellContent> {
    values.into_iter().map(CellContent::Number).collect()
}

impl LookupLayout {
    /// 构建 Lookup 工作表与区域索引
    pub fn build(catalog: &LookupCatalog, layout: &LayoutConfig) -> (LookupLayout, SheetTemplate) {
        let sheet_name = layout.lookup_sheet.as_str();
        let mut cursor = ColumnCursor {
            sheet_name,
            columns: Vec::new(),
            cells: Vec::new(),
            width: layout.default_column_width,
        };

        let machinery = catalog.machinery_by_name();
        let machinery_names = cursor.list("Machinery Name", texts(machinery.iter().map(|m| m.name.clone())));
        let machinery_ids = cursor.list(
            "Machinery ID",
            numbers(machinery.iter().map(|m| m.machinery_id as f64)),
        );
        let machinery_power = cursor.list(
            "Rated Power (kW)",
            numbers(machinery.iter().map(|m| m.rated_power_kw)),
        );
        let machinery_sfoc = cursor.list("SFOC (g/kWh)", numbers(machinery.iter().map(|m| m.sfoc_g_kwh)));

        let fuel_keys = cursor.list("Fuel Key", texts(catalog.fuel_keys()));
        let lube_keys = cursor.list("Lube Key", texts(catalog.lube_keys()));

        let item_keys = cursor.list("Item Type", texts(catalog.item_types.keys().cloned()));
        let item_ids = cursor.list(
            "Item Type ID",
            numbers(catalog.item_types.values().map(|t| t.item_type_id as f64)),
        );
        let item_rob = cursor.list("ROB", numbers(catalog.item_types.values().map(|t| t.rob)));

        // 加油单宽表
        let groups: Vec<(&String, &Vec<String>)> = catalog.note_groups().collect();
        let note_keys = cursor.list("Note Type", texts(groups.iter().map(|(k, _)| (*k).clone())));
        let note_counts = cursor.list("Note Count", numbers(groups.iter().map(|(_, n)| n.len() as f64)));
        let first_slot_col = cursor.next_col();
        for slot in 0..catalog.note_slot_limit {
            let col = cursor.header(&format!("Note{}", slot + 1));
            for (row, (_, notes)) in groups.iter().enumerate() {
                if let Some(note) = notes.get(slot) {
                    cursor.cells.push((row as u32 + 1, col, CellContent::Text(note.clone())));
                }
            }
        }

        let voyage_nos = cursor.list("Voyage No", texts(catalog.voyages.iter().map(|v| v.voyage_no.clone())));
        let voyage_ids = cursor.list(
            "Voyage ID",
            numbers(catalog.voyages.iter().map(|v| v.voyage_id as f64)),
        );
        let port_names = cursor.list("Port", texts(catalog.ports.iter().map(|p| p.name.clone())));
        let port_ids = cursor.list("Port ID", numbers(catalog.ports.iter().map(|p| p.port_id as f64)));
        let timezones = cursor.list("Timezone", texts(catalog.timezones.iter().map(|t| t.label.clone())));

        let max_row = cursor.max_row();
        let mut sheet = SheetTemplate::new(sheet_name, None, cursor.columns, max_row);
        for (row, col, content) in cursor.cells {
            sheet.set(row, col, content);
        }
        sheet.hidden = true;

        let layout = LookupLayout {
            sheet: sheet_name.to_string(),
            machinery_names,
            machinery_ids,
            machinery_power,
            machinery_sfoc,
            fuel_keys,
            lube_keys,
            item_keys,
            item_ids,
            item_rob,
            notes: PivotRanges {
                sheet: sheet_name.to_string(),
                keys: note_keys,
                counts: note_counts,
                first_slot_col,
            },
            voyage_nos,
            voyage_ids,
            port_names,
            port_ids,
            timezones,
        };
        (layout, sheet)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::catalog::{BunkerNoteEntry, ItemTypeEntry, VesselInfo};
    use crate::domain::types::ItemCategory;

    fn catalog() -> LookupCatalog {
        let item = |id: i64, key: &str, category| ItemTypeEntry {
            item_type_id: id,
            type_key: key.to_string(),
            category,
            rob: 100.0,
        };
        let notes: Vec<BunkerNoteEntry> = (0..3)
            .map(|i| BunkerNoteEntry {
                note_id: i,
                type_key: "MGO".to_string(),
                note_no: format!("M-{}", i),
                bunker_date: None,
                remaining_qty: 1.0,
            })
            .collect();
        LookupCatalog::new(
            VesselInfo {
                vessel_id: 1,
                short_code: "ABC".to_string(),
                name: "Alpha".to_string(),
            },
            vec![],
            vec![
                item(1, "HFO", ItemCategory::Fuel),
                item(2, "MGO", ItemCategory::Fuel),
                item(3, "CYL", ItemCategory::LubeOil),
            ],
            &notes,
            vec![],
            vec![],
            vec![],
            10,
        )
    }

    #[test]
    fn test_lists_have_own_lengths() {
        let (layout, sheet) = LookupLayout::build(&catalog(), &LayoutConfig::default());
        assert_eq!(layout.fuel_keys.rows(), 2);
        assert_eq!(layout.lube_keys.rows(), 1);
        // 空列表保留一个单元格
        assert_eq!(layout.machinery_names.rows(), 1);
        assert!(sheet.hidden);
        assert_eq!(sheet.name, "Lookup");
    }

    #[test]
    fn test_note_pivot_block() {
        let (layout, sheet) = LookupLayout::build(&catalog(), &LayoutConfig::default());
        let pivot = &layout.notes;
        assert_eq!(pivot.keys.rows(), 1);
        assert_eq!(sheet.get(1, pivot.keys.first_col), Some(&CellContent::text("MGO")));
        assert_eq!(sheet.get(1, pivot.counts.first_col), Some(&CellContent::Number(3.0)));
        assert_eq!(sheet.get(1, pivot.first_slot_col + 2), Some(&CellContent::text("M-2")));
        assert_eq!(sheet.get(1, pivot.first_slot_col + 3), None);
        assert_eq!(
            sheet.columns[(pivot.first_slot_col + 9) as usize].header,
            "Note10"
        );
    }
}
