//! Integration tests for CSV escaping
//!
//! Output of an export is read back with a `csv` reader to check that a
//! standard parser recovers every cell value.

use csv_export::adapters::{ExportPlugins, StaticRowsProvider};
use csv_export::config::ExportDefinitionConfig;
use csv_export::core::export::{ExportService, MemoryAuditSink};
use csv_export::core::registry::ExportDefinitionRegistry;
use csv_export::core::security::PermitAllSecurity;
use csv_export::domain::{AttributeKind, CellValue, RawParams, RowAttribute, RowSchema};
use std::sync::Arc;

#[tokio::test]
async fn test_standard_parser_recovers_cells() {
    let schema = RowSchema::new(
        "NoteRow",
        vec![
            RowAttribute::new("title", AttributeKind::Text),
            RowAttribute::new("body", AttributeKind::Text),
            RowAttribute::new("count", AttributeKind::Integer),
            RowAttribute::new("note", AttributeKind::Text),
        ],
    )
    .unwrap();
    let rows = vec![
        vec![
            CellValue::from("a,b"),
            CellValue::from("a\"b"),
            CellValue::Integer(3),
            CellValue::Null,
        ],
        vec![
            CellValue::from("multi\nline"),
            CellValue::from("  spaced  "),
            CellValue::Integer(-1),
            CellValue::from("\"quoted\""),
        ],
    ];
    let plugins = ExportPlugins::new()
        .with_provider("notes", Arc::new(StaticRowsProvider::new(schema, rows)))
        .unwrap();
    let entry = ExportDefinitionConfig {
        key: "notes".into(),
        description: String::new(),
        allowed_roles: Vec::new(),
        max_rows: None,
        provider: Some("notes".into()),
        columns: Vec::new(),
        params: Vec::new(),
    };
    let registry = ExportDefinitionRegistry::build(&[entry], 10, &plugins).unwrap();
    let service = ExportService::new(
        Arc::new(registry),
        Arc::new(PermitAllSecurity),
        Arc::new(MemoryAuditSink::new()),
    );

    let mut out = Vec::new();
    service
        .stream_csv("notes", &RawParams::new(), &mut out)
        .await
        .unwrap();

    let text = String::from_utf8(out.clone()).unwrap();
    assert!(text.starts_with("title,body,count,note\n\"a,b\",\"a\"\"b\",3,\n"));

    let mut reader = csv::ReaderBuilder::new()
        .has_headers(true)
        .from_reader(out.as_slice());
    let headers = reader.headers().unwrap().clone();
    assert_eq!(headers.iter().collect::<Vec<_>>(), ["title", "body", "count", "note"]);

    let records: Vec<csv::StringRecord> = reader.records().map(|r| r.unwrap()).collect();
    assert_eq!(records.len(), 2);
    assert_eq!(records[0].iter().collect::<Vec<_>>(), ["a,b", "a\"b", "3", ""]);
    assert_eq!(
        records[1].iter().collect::<Vec<_>>(),
        ["multi\nline", "  spaced  ", "-1", "\"quoted\""]
    );
}
