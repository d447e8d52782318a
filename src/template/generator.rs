// ==========================================
// 船舶离线报表系统 - 模板生成引擎
// ==========================================
// 流程:
// 1. 构建 Lookup Catalog（参考查询失败 → 整体失败）
// 2. Lookup 表布局 → 四张数据表（公式 + 列表验证）
// 3. 保护器分类并挂保护计划（失败只记 warn）
// 4. 追加隐藏 token 表 → 渲染 xlsx
// 5. 批量模板: 返回前预建 staging 表
// 失败: 统一包装为 GenerationFailed { vessel_id }，不返回部分模板
// ==========================================

use crate::catalog::{LookupCatalog, LookupCatalogBuilder};
use crate::config::{DomainConfig, LayoutConfig, PipelineSettings};
use crate::domain::sheet::SheetKind;
use crate::domain::types::{ColumnRole, TemplateKind};
use crate::importer::staging::StagingProvisioner;
use crate::template::error::{TemplateError, TemplateResult};
use crate::template::layout::LookupLayout;
use crate::template::model::{CellContent, SheetTemplate, TemplateColumn, WorkbookTemplate};
use crate::template::protection::ProtectionEnforcer;
use crate::template::sheets::{build_sheet, SheetContext};
use crate::template::writer::render_workbook;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{error, info, instrument, warn};
use uuid::Uuid;

/// token 表表头（顺序固定，解析器按此读取）
pub const TOKEN_HEADERS: [&str; 3] = ["upload_token", "vessel_id", "generated_at"];

// ==========================================
// UploadToken - 写入隐藏 token 表的上传凭据
// ==========================================
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UploadToken {
    pub token: String,
    pub vessel_id: i64,
    pub generated_at: DateTime<Utc>,
}

impl UploadToken {
    pub fn issue(vessel_id: i64) -> Self {
        Self {
            token: Uuid::new_v4().to_string(),
            vessel_id,
            generated_at: Utc::now(),
        }
    }
}

// ==========================================
// BuiltWorkbook - 内存中的完整模板
// ==========================================
#[derive(Debug, Clone)]
pub struct BuiltWorkbook {
    pub template: WorkbookTemplate,
    /// 放弃保护的工作表及原因
    pub unprotected_sheets: Vec<(String, String)>,
}

// ==========================================
// GeneratedTemplate - 返回给调用方的产物
// ==========================================
#[derive(Debug, Clone)]
pub struct GeneratedTemplate {
    pub vessel_id: i64,
    pub kind: TemplateKind,
    pub file_name: String,
    pub bytes: Vec<u8>,
    pub upload_token: UploadToken,
    pub staging_tables: Vec<String>,
    pub unprotected_sheets: Vec<(String, String)>,
}

fn token_sheet(token: &UploadToken, layout: &LayoutConfig) -> SheetTemplate {
    let columns = TOKEN_HEADERS
        .iter()
        .map(|h| TemplateColumn {
            header: h.to_string(),
            role: ColumnRole::Input,
            width: layout.default_column_width,
        })
        .collect();
    let mut sheet = SheetTemplate::new(layout.token_sheet.as_str(), None, columns, 2);
    sheet.set(1, 0, CellContent::text(token.token.clone()));
    sheet.set(1, 1, CellContent::Number(token.vessel_id as f64));
    sheet.set(1, 2, CellContent::text(token.generated_at.to_rfc3339()));
    sheet.hidden = true;
    sheet.very_hidden = true;
    sheet
}

/// 纯内存构建（不访问数据库、不序列化）
///
/// 工作表顺序: Voyage, Machinery, Lube Oil, Bunkering, Lookup, token
pub fn build_workbook(
    catalog: &LookupCatalog,
    kind: TemplateKind,
    domain: &DomainConfig,
    layout: &LayoutConfig,
    token: &UploadToken,
) -> BuiltWorkbook {
    let (lookup, lookup_sheet) = LookupLayout::build(catalog, layout);
    let ctx = SheetContext {
        lookup: &lookup,
        domain,
        layout,
        max_row: layout.max_row(kind),
    };

    let enforcer = ProtectionEnforcer::new(domain);
    let mut template = WorkbookTemplate::new();
    let mut unprotected_sheets = Vec::new();

    for sheet_kind in SheetKind::ALL {
        let mut sheet = build_sheet(sheet_kind, &ctx);
        if let Err(e) = enforcer.apply(&mut sheet) {
            warn!(
                vessel_id = token.vessel_id,
                sheet = %sheet.name,
                error = %e,
                "工作表保护失败，该表不带锁定/隐藏"
            );
            unprotected_sheets.push((sheet.name.clone(), e.to_string()));
        }
        template.push(sheet);
    }

    template.push(lookup_sheet);
    template.push(token_sheet(token, layout));

    BuiltWorkbook {
        template,
        unprotected_sheets,
    }
}

/// 模板文件名
pub fn template_file_name(short_code: &str, kind: TemplateKind) -> String {
    format!("{}_{}_template.xlsx", short_code, kind)
}

pub struct TemplateGenerator {
    catalog_builder: LookupCatalogBuilder,
    provisioner: Option<Arc<StagingProvisioner>>,
}

impl TemplateGenerator {
    pub fn new(catalog_builder: LookupCatalogBuilder) -> Self {
        Self {
            catalog_builder,
            provisioner: None,
        }
    }

    /// 批量模板需要 staging 预建能力
    pub fn with_provisioner(mut self, provisioner: Arc<StagingProvisioner>) -> Self {
        self.provisioner = Some(provisioner);
        self
    }

    /// 生成模板
    ///
    /// # 返回
    /// - Ok: 完整 xlsx 二进制
    /// - Err: GenerationFailed（点名船舶）
    #[instrument(skip(self, settings))]
    pub async fn generate(
        &self,
        vessel_id: i64,
        kind: TemplateKind,
        settings: &PipelineSettings,
    ) -> TemplateResult<GeneratedTemplate> {
        info!(vessel_id, kind = %kind, "开始生成模板");

        match self.generate_inner(vessel_id, kind, settings).await {
            Ok(generated) => {
                info!(
                    vessel_id,
                    file_name = %generated.file_name,
                    bytes = generated.bytes.len(),
                    staging_tables = generated.staging_tables.len(),
                    "模板生成完成"
                );
                Ok(generated)
            }
            Err(e) => {
                let err = e.for_vessel(vessel_id);
                error!(vessel_id, error = %err, "模板生成失败");
                Err(err)
            }
        }
    }

    async fn generate_inner(
        &self,
        vessel_id: i64,
        kind: TemplateKind,
        settings: &PipelineSettings,
    ) -> TemplateResult<GeneratedTemplate> {
        let catalog = self.catalog_builder.build(vessel_id, &settings.domain).await?;
        let token = UploadToken::issue(vessel_id);

        let built = build_workbook(&catalog, kind, &settings.domain, &settings.layout, &token);
        let bytes = render_workbook(&built.template)?;
        info!(
            vessel_id,
            sheets = built.template.sheets.len(),
            bytes = bytes.len(),
            "工作簿序列化完成"
        );

        let staging_tables = if kind.provisions_staging() {
            let provisioner = self.provisioner.as_ref().ok_or_else(|| {
                TemplateError::Staging("未配置 staging 预建器".to_string())
            })?;
            provisioner
                .provision_vessel(&catalog.vessel.short_code)
                .await
                .map_err(|e| TemplateError::Staging(e.to_string()))?
        } else {
            Vec::new()
        };

        Ok(GeneratedTemplate {
            vessel_id,
            kind,
            file_name: template_file_name(&catalog.vessel.short_code, kind),
            bytes,
            upload_token: token,
            staging_tables,
            unprotected_sheets: built.unprotected_sheets,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::catalog::{ItemTypeEntry, MachineryEntry, VesselInfo};
    use crate::domain::types::ItemCategory;

    fn catalog() -> LookupCatalog {
        LookupCatalog::new(
            VesselInfo {
                vessel_id: 3,
                short_code: "OCN".to_string(),
                name: "Ocean".to_string(),
            },
            vec![MachineryEntry {
                machinery_id: 11,
                name: "ME".to_string(),
                category: "Main".to_string(),
                rated_power_kw: 10000.0,
                sfoc_g_kwh: 180.0,
            }],
            vec![ItemTypeEntry {
                item_type_id: 1,
                type_key: "HFO".to_string(),
                category: ItemCategory::Fuel,
                rob: 50.0,
            }],
            &[],
            vec![],
            vec![],
            vec![],
            10,
        )
    }

    #[test]
    fn test_sheet_order_and_visibility() {
        let token = UploadToken::issue(3);
        let built = build_workbook(
            &catalog(),
            TemplateKind::Standard,
            &DomainConfig::default(),
            &LayoutConfig::default(),
            &token,
        );
        let names: Vec<&str> = built.template.sheets.iter().map(|s| s.name.as_str()).collect();
        assert_eq!(
            names,
            vec!["Voyage", "Machinery", "Lube Oil", "Bunkering", "Lookup", "__token__"]
        );
        let hidden: Vec<bool> = built.template.sheets.iter().map(|s| s.hidden).collect();
        assert_eq!(hidden, vec![false, false, false, false, true, true]);
        let very_hidden: Vec<bool> = built.template.sheets.iter().map(|s| s.very_hidden).collect();
        assert_eq!(very_hidden, vec![false, false, false, false, false, true]);
        assert!(built.unprotected_sheets.is_empty());
        assert!(built.template.sheets[..4].iter().all(|s| s.protection.is_some()));
    }

    #[test]
    fn test_max_row_follows_kind() {
        let token = UploadToken::issue(3);
        let layout = LayoutConfig::default();
        let built = build_workbook(&catalog(), TemplateKind::Bulk, &DomainConfig::default(), &layout, &token);
        assert_eq!(built.template.sheets[0].max_row, layout.bulk_max_row);
    }

    #[test]
    fn test_token_sheet_contents() {
        let token = UploadToken::issue(3);
        let sheet = token_sheet(&token, &LayoutConfig::default());
        assert_eq!(sheet.get(1, 0), Some(&CellContent::text(token.token.clone())));
        assert_eq!(sheet.get(1, 1), Some(&CellContent::Number(3.0)));
    }

    #[test]
    fn test_render_produces_xlsx_bytes() {
        let token = UploadToken::issue(3);
        let built = build_workbook(
            &catalog(),
            TemplateKind::Standard,
            &DomainConfig::default(),
            &LayoutConfig::default(),
            &token,
        );
        let bytes = render_workbook(&built.template).unwrap();
        // xlsx 为 zip 容器
        assert_eq!(&bytes[..2], b"PK");
    }

    #[test]
    fn test_file_name() {
        assert_eq!(template_file_name("OCN", TemplateKind::Bulk), "OCN_bulk_template.xlsx");
    }
}
