// ==========================================
// 船舶离线报表系统 - 保护与可见性
// ==========================================
// 分类规则（表头行 + 数据行全部列）:
// - 表头: 锁定
// - 公式单元格: 锁定 + 隐藏公式；白名单列保持可编辑且可见
// - 其他单元格: 解锁
// 冲突: 带列表验证的单元格被锁定 → 该表放弃保护（记录 warn，不致命）
// ==========================================

use crate::config::DomainConfig;
use crate::formula::address::CellRef;
use crate::template::model::{CellLock, ProtectionPlan, SheetTemplate};
use std::collections::BTreeMap;
use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum ProtectionError {
    #[error("单元格配置不受支持 (sheet={sheet}, cell={cell}): {reason}")]
    UnsupportedCell {
        sheet: String,
        cell: String,
        reason: String,
    },
}

pub struct ProtectionEnforcer<'a> {
    domain: &'a DomainConfig,
}

impl<'a> ProtectionEnforcer<'a> {
    pub fn new(domain: &'a DomainConfig) -> Self {
        Self { domain }
    }

    /// 单元格分类
    pub fn classify(&self, sheet: &SheetTemplate, row: u32, col: u16) -> CellLock {
        if row == 0 {
            return CellLock::Locked;
        }
        match sheet.get(row, col) {
            Some(content) if content.is_formula() => {
                let header = sheet
                    .columns
                    .get(col as usize)
                    .map(|c| c.header.as_str())
                    .unwrap_or("");
                if self.domain.is_editable_formula(header) {
                    CellLock::Unlocked
                } else {
                    CellLock::LockedHidden
                }
            }
            _ => CellLock::Unlocked,
        }
    }

    /// 生成保护计划并挂到工作表上
    ///
    /// 失败时工作表保持无保护状态
    pub fn apply(&self, sheet: &mut SheetTemplate) -> Result<(), ProtectionError> {
        sheet.protection = None;

        let mut cells = BTreeMap::new();
        for row in 0..sheet.max_row {
            for col in 0..sheet.column_count() {
                cells.insert((row, col), self.classify(sheet, row, col));
            }
        }

        // 列表验证单元格必须可录入
        for validation in &sheet.validations {
            for row in validation.first_row..=validation.last_row {
                let lock = cells
                    .get(&(row, validation.col))
                    .copied()
                    .unwrap_or(CellLock::Locked);
                if lock.is_locked() {
                    return Err(ProtectionError::UnsupportedCell {
                        sheet: sheet.name.clone(),
                        cell: CellRef::local(row, validation.col).a1(),
                        reason: "列表验证单元格被锁定".to_string(),
                    });
                }
            }
        }

        sheet.protection = Some(ProtectionPlan {
            password: self.domain.protection_password.clone(),
            cells,
        });
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::types::ColumnRole;
    use crate::formula::expr::Expr;
    use crate::template::model::{CellContent, ListSource, TemplateColumn};

    fn sheet() -> SheetTemplate {
        let col = |h: &str| TemplateColumn {
            header: h.to_string(),
            role: ColumnRole::Input,
            width: 10.0,
        };
        let mut s = SheetTemplate::new(
            "S",
            None,
            vec![col("Name"), col("Hours"), col("Consumption (MT)")],
            3,
        );
        s.set(1, 1, CellContent::Formula(Expr::number(1.0)));
        s.set(1, 2, CellContent::Formula(Expr::number(2.0)));
        s
    }

    #[test]
    fn test_classification() {
        let domain = DomainConfig::default();
        let enforcer = ProtectionEnforcer::new(&domain);
        let s = sheet();
        assert_eq!(enforcer.classify(&s, 0, 0), CellLock::Locked);
        assert_eq!(enforcer.classify(&s, 1, 0), CellLock::Unlocked);
        assert_eq!(enforcer.classify(&s, 1, 1), CellLock::LockedHidden);
        // 白名单公式列保持可编辑
        assert_eq!(enforcer.classify(&s, 1, 2), CellLock::Unlocked);
    }

    #[test]
    fn test_apply_attaches_plan() {
        let domain = DomainConfig::default();
        let mut s = sheet();
        s.add_validation(0, ListSource::Inline(vec!["a".to_string()]));
        ProtectionEnforcer::new(&domain).apply(&mut s).unwrap();
        let plan = s.protection.as_ref().unwrap();
        assert_eq!(plan.lock_of(2, 0), CellLock::Unlocked);
        assert_eq!(plan.lock_of(1, 1), CellLock::LockedHidden);
        assert_eq!(plan.password, domain.protection_password);
    }

    #[test]
    fn test_validated_formula_cell_is_conflict() {
        let domain = DomainConfig::default();
        let mut s = sheet();
        s.add_validation(1, ListSource::Inline(vec!["a".to_string()]));
        let err = ProtectionEnforcer::new(&domain).apply(&mut s).unwrap_err();
        assert!(matches!(err, ProtectionError::UnsupportedCell { ref cell, .. } if cell == "B2"));
        assert!(s.protection.is_none());
    }
}
