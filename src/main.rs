// ==========================================
// 船舶离线报表系统 - 命令行入口
// ==========================================
// 用法:
//   vessel-sheets generate <db> <vessel_id> <out.xlsx> [standard|bulk]
//   vessel-sheets upload   <db> <vessel_id> <in.xlsx>
//   vessel-sheets preview  <in.xlsx>
//   vessel-sheets import   <db> <batch_id> <single|bulk|voyage|bunker>
// ==========================================

use anyhow::{anyhow, bail, Context, Result};
use vessel_sheets::app::AppState;
use vessel_sheets::config::{DomainConfig, LayoutConfig};
use vessel_sheets::importer::WorkbookParser;
use vessel_sheets::{logging, TemplateKind, APP_NAME, VERSION};

fn usage() -> String {
    [
        "usage:",
        "  vessel-sheets generate <db> <vessel_id> <out.xlsx> [standard|bulk]",
        "  vessel-sheets upload   <db> <vessel_id> <in.xlsx>",
        "  vessel-sheets preview  <in.xlsx>",
        "  vessel-sheets import   <db> <batch_id> <single|bulk|voyage|bunker>",
    ]
    .join("\n")
}

fn arg(args: &[String], idx: usize, name: &str) -> Result<String> {
    args.get(idx)
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
        .ok_or_else(|| anyhow!("缺少参数 <{}>\n{}", name, usage()))
}

fn parse_vessel_id(raw: &str) -> Result<i64> {
    raw.parse().with_context(|| format!("vessel_id 无效: {}", raw))
}

#[tokio::main]
async fn main() -> Result<()> {
    logging::init();
    tracing::info!("{} v{}", APP_NAME, VERSION);

    let args: Vec<String> = std::env::args().skip(1).collect();
    let command = arg(&args, 0, "command")?;

    match command.as_str() {
        "generate" => {
            let state = AppState::new(arg(&args, 1, "db")?).map_err(|e| anyhow!(e))?;
            let vessel_id = parse_vessel_id(&arg(&args, 2, "vessel_id")?)?;
            let out = arg(&args, 3, "out.xlsx")?;
            let kind: TemplateKind = args
                .get(4)
                .map(|s| s.parse::<TemplateKind>())
                .transpose()
                .map_err(|e: String| anyhow!(e))?
                .unwrap_or(TemplateKind::Standard);

            let download = state.template_api.download_template(vessel_id, kind).await?;
            std::fs::write(&out, &download.bytes).with_context(|| format!("写出失败: {}", out))?;
            println!("file_name={}", download.file_name);
            println!("upload_token={}", download.upload_token);
            for table in &download.staging_tables {
                println!("staging_table={}", table);
            }
            for (sheet, reason) in &download.unprotected_sheets {
                println!("unprotected={} ({})", sheet, reason);
            }
        }
        "upload" => {
            let state = AppState::new(arg(&args, 1, "db")?).map_err(|e| anyhow!(e))?;
            let vessel_id = parse_vessel_id(&arg(&args, 2, "vessel_id")?)?;
            let input = arg(&args, 3, "in.xlsx")?;
            let bytes = std::fs::read(&input).with_context(|| format!("读取失败: {}", input))?;

            let response = state.import_api.upload_workbook(vessel_id, &bytes).await?;
            println!("{}", serde_json::to_string_pretty(&response)?);
        }
        "preview" => {
            let input = arg(&args, 1, "in.xlsx")?;
            let domain = DomainConfig::default();
            let layout = LayoutConfig::default();
            let parsed = WorkbookParser::new(&domain, &layout).parse_file(std::path::Path::new(&input))?;
            println!("{}", parsed.to_json()?);
        }
        "import" => {
            let state = AppState::new(arg(&args, 1, "db")?).map_err(|e| anyhow!(e))?;
            let batch_id = arg(&args, 2, "batch_id")?;
            let report_type = arg(&args, 3, "type")?;

            let outcome = state.import_api.trigger_import(&batch_id, &report_type).await?;
            println!("{}", serde_json::to_string_pretty(&outcome)?);
        }
        other => bail!("未知命令: {}\n{}", other, usage()),
    }

    Ok(())
}
