// ==========================================
// 回传导入流水线 E2E 测试
// ==========================================
// 路径: AppState → TemplateApi / ImportApi → SQLite
// 覆盖: 批次隔离 / staging 预建与重建 / 导入过程错误原文透传与重试
// ==========================================


use std::sync::Arc;
use test_helpers::{build_catalog, create_test_db, TestDb, MAIN_ENGINE, SHORT_CODE, VESSEL_ID};
use vessel_sheets::api::ApiError;
use vessel_sheets::app::AppState;
use vessel_sheets::config::{config_keys, ConfigScope};
use vessel_sheets::domain::sheet::{machinery_cols, voyage_cols, SheetKind};
use vessel_sheets::domain::{BatchStatus, ReportType, TemplateKind};
use vessel_sheets::importer::{read_csv, staging_table_name, StagingProvisioner};
use vessel_sheets::repository::SqliteStagingRepository;
use vessel_sheets::template::{build_workbook, render_workbook, CellContent, UploadToken};

fn app_state(db: &TestDb) -> AppState {
    let state = AppState::new(db.db_path.clone()).unwrap();
    state
        .config_manager
        .set_config_value(
            &ConfigScope::Global,
            config_keys::UPLOAD_ROOT,
            &db.upload_root().to_string_lossy(),
        )
        .unwrap();
    state
}

/// 已填写一行 Voyage + 一行 Machinery 的工作簿
async fn filled_workbook(db: &TestDb, vessel_id: i64) -> Vec<u8> {
    let settings = db.settings();
    let catalog = build_catalog(db).await;
    let mut built = build_workbook(
        &catalog,
        TemplateKind::Standard,
        &settings.domain,
        &settings.layout,
        &UploadToken::issue(vessel_id),
    );
    let wb = &mut built.template;
    wb.set_input("Voyage", 1, voyage_cols::VOYAGE_NO, CellContent::text("V002"));
    wb.set_input("Voyage", 1, voyage_cols::OPERATION, CellContent::text("Port Stay"));
    wb.set_input("Machinery", 1, machinery_cols::MACHINERY_NAME, CellContent::text(MAIN_ENGINE));
    wb.set_input("Machinery", 1, machinery_cols::REMARKS, CellContent::text("a, \"b\"\nc"));
    render_workbook(wb).unwrap()
}

#[tokio::test]
async fn test_two_uploads_get_distinct_batches_and_files() {
    let db = create_test_db().unwrap();
    let state = app_state(&db);
    let bytes = filled_workbook(&db, VESSEL_ID).await;

    let first = state.import_api.upload_workbook(VESSEL_ID, &bytes).await.unwrap();
    let second = state.import_api.upload_workbook(VESSEL_ID, &bytes).await.unwrap();

    assert_ne!(first.batch_id, second.batch_id);
    assert_eq!(first.total_rows, 2);
    assert_eq!(first.artifacts.len(), 4);
    assert!(first.staged_tables.is_empty());
    assert!(first.warnings.is_empty());

    for (a, b) in first.artifacts.iter().zip(&second.artifacts) {
        assert_ne!(a.csv_path, b.csv_path);
        assert!(a.csv_path.exists());
        assert!(b.csv_path.exists());
    }

    let machinery = first
        .artifacts
        .iter()
        .find(|a| a.sheet_name == SheetKind::Machinery.sheet_name())
        .unwrap();
    let (_, rows) = read_csv(&machinery.csv_path).unwrap();
    assert_eq!(rows.len(), 1);
    assert_eq!(rows[0][machinery_cols::REMARKS as usize], "a, \"b\"\nc");

    let batches = state.import_api.list_batches(VESSEL_ID).await.unwrap();
    assert_eq!(batches.len(), 2);
    assert!(batches.iter().all(|b| b.status == BatchStatus::Parsed));
}

#[tokio::test]
async fn test_upload_rejects_foreign_token() {
    let db = create_test_db().unwrap();
    let state = app_state(&db);
    let bytes = filled_workbook(&db, 2).await;

    let result = state.import_api.upload_workbook(VESSEL_ID, &bytes).await;
    assert!(matches!(result, Err(ApiError::TokenMismatch(_))));
    assert!(state.import_api.list_batches(VESSEL_ID).await.unwrap().is_empty());
}

#[tokio::test]
async fn test_upload_unknown_vessel_is_not_found() {
    let db = create_test_db().unwrap();
    let state = app_state(&db);
    let bytes = filled_workbook(&db, VESSEL_ID).await;

    let result = state.import_api.upload_workbook(99, &bytes).await;
    assert!(matches!(result, Err(ApiError::NotFound(_))));
}

#[tokio::test]
async fn test_bulk_template_provisions_staging_and_upload_fills_it() {
    let db = create_test_db().unwrap();
    let state = app_state(&db);

    let download = state
        .template_api
        .download_template(VESSEL_ID, TemplateKind::Bulk)
        .await
        .unwrap();
    assert_eq!(download.file_name, "OCN_bulk_template.xlsx");
    assert_eq!(download.staging_tables.len(), 4);
    assert!(download
        .staging_tables
        .contains(&staging_table_name(SHORT_CODE, SheetKind::Machinery)));

    let bytes = filled_workbook(&db, VESSEL_ID).await;
    let response = state.import_api.upload_workbook(VESSEL_ID, &bytes).await.unwrap();

    assert_eq!(response.staged_tables.len(), 4);
    let machinery_table = staging_table_name(SHORT_CODE, SheetKind::Machinery);
    let staged = response
        .staged_tables
        .iter()
        .find(|(table, _)| *table == machinery_table)
        .unwrap();
    assert_eq!(staged.1, 1);
}

#[tokio::test]
async fn test_reprovision_replaces_columns() {
    let db = create_test_db().unwrap();
    let repo = Arc::new(SqliteStagingRepository::from_connection(db.shared_connection()));
    let provisioner = StagingProvisioner::new(repo);
    let table = "stg_ocn_manual";

    let first = provisioner
        .provision_table(table, &["Voyage No".to_string(), "Remarks".to_string()])
        .await
        .unwrap();
    assert_eq!(first, vec!["Voyage_No", "Remarks"]);

    provisioner
        .load_rows(table, &[vec!["V001".to_string(), "x".to_string()]])
        .await
        .unwrap();

    let second = provisioner
        .provision_table(table, &["Item Type".to_string()])
        .await
        .unwrap();
    assert_eq!(second, vec!["Item_Type"]);
    assert_eq!(provisioner.columns_of(table).await.unwrap(), vec!["Item_Type"]);

    assert_eq!(provisioner.load_rows("stg_ocn_absent", &[]).await.unwrap(), None);
}

#[tokio::test]
async fn test_procedure_error_is_returned_verbatim_and_batch_can_retry() {
    let db = create_test_db().unwrap();
    let state = app_state(&db);
    let bytes = filled_workbook(&db, VESSEL_ID).await;
    let upload = state.import_api.upload_workbook(VESSEL_ID, &bytes).await.unwrap();

    let procedure = ReportType::Voyage.procedure_name();
    state
        .procedures
        .register(procedure, "INSERT INTO missing_table VALUES (:batch_id);")
        .unwrap();

    let err = state
        .import_api
        .trigger_import(&upload.batch_id, "voyage")
        .await
        .unwrap_err();
    let message = match &err {
        ApiError::ProcedureFailed { procedure: p, message } => {
            assert_eq!(p, procedure);
            message.clone()
        }
        other => panic!("期望 ProcedureFailed，实际为 {:?}", other),
    };
    assert_eq!(message, "no such table: missing_table");
    assert_eq!(err.to_string(), message);

    let failed = state.import_api.get_batch(&upload.batch_id).await.unwrap();
    assert_eq!(failed.status, BatchStatus::Failed);
    assert_eq!(failed.last_message.as_deref(), Some(message.as_str()));
    assert!(failed.artifacts.iter().all(|a| a.csv_path.exists()));

    state
        .procedures
        .register(
            procedure,
            "CREATE TABLE IF NOT EXISTS landed (batch_id TEXT);
             INSERT INTO landed VALUES (:batch_id);",
        )
        .unwrap();

    let outcome = state
        .import_api
        .trigger_import(&upload.batch_id, "voyage")
        .await
        .unwrap();
    assert_eq!(outcome.batch_id, upload.batch_id);
    assert_eq!(outcome.report_type, ReportType::Voyage);
    assert_eq!(outcome.rows_affected, 1);

    let imported = state.import_api.get_batch(&upload.batch_id).await.unwrap();
    assert_eq!(imported.status, BatchStatus::Imported);

    // 已导入的批次不可重复导入
    let again = state.import_api.trigger_import(&upload.batch_id, "voyage").await;
    assert!(matches!(again, Err(ApiError::BusinessRuleViolation(_))));
}

#[tokio::test]
async fn test_trigger_import_validates_input() {
    let db = create_test_db().unwrap();
    let state = app_state(&db);

    let unknown_batch = state.import_api.trigger_import("no-such-batch", "single").await;
    assert!(matches!(unknown_batch, Err(ApiError::NotFound(_))));

    let bytes = filled_workbook(&db, VESSEL_ID).await;
    let upload = state.import_api.upload_workbook(VESSEL_ID, &bytes).await.unwrap();
    let bad_type = state.import_api.trigger_import(&upload.batch_id, "weekly").await;
    assert!(matches!(bad_type, Err(ApiError::InvalidInput(_))));

    let unregistered = state.import_api.trigger_import(&upload.batch_id, "bunker").await;
    match unregistered {
        Err(ApiError::ProcedureFailed { message, .. }) => {
            assert_eq!(message, "procedure import_bunker_report is not registered")
        }
        other => panic!("期望 ProcedureFailed，实际为 {:?}", other),
    }
}

#[tokio::test]
async fn test_preview_does_not_create_batch() {
    let db = create_test_db().unwrap();
    let state = app_state(&db);
    let bytes = filled_workbook(&db, VESSEL_ID).await;

    let json = state
        .import_api
        .preview_workbook_json(Some(VESSEL_ID), &bytes)
        .await
        .unwrap();
    let value: serde_json::Value = serde_json::from_str(&json).unwrap();
    assert_eq!(value["sheets"].as_array().map(Vec::len), Some(4));
    assert_eq!(value["token_vessel_id"], serde_json::json!(VESSEL_ID));

    assert!(state.import_api.list_batches(VESSEL_ID).await.unwrap().is_empty());
}
