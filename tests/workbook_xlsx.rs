use std::path::PathBuf;
use std::time::{SystemTime, UNIX_EPOCH};

use csv2xlsx::types::{CellValue, NumberFormat};
use csv2xlsx::workbook::{SpreadsheetEngine, Workbook, XlsxEngine};

fn tmp_xlsx(name: &str) -> PathBuf {
    let nanos = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap()
        .as_nanos();
    std::env::temp_dir().join(format!("csv2xlsx-engine-{nanos}-{name}.xlsx"))
}

#[test]
fn saved_workbook_loads_back() {
    let path = tmp_xlsx("roundtrip");
    let mut wb = Workbook::new();
    wb.create_sheet("data.csv");
    wb.create_sheet("other");
    wb.set_cell_text("data.csv", "A1", "name").unwrap();
    wb.set_cell_number("data.csv", "B1", 1.5, Some(1)).unwrap();
    wb.set_cell_number("data.csv", "B2", 2.0, None).unwrap();
    wb.set_cell("data.csv", 3, 1, CellValue::Bool(true)).unwrap();
    wb.set_cell("data.csv", 2, 3, CellValue::Formula("SUM(B1:B2)".into()))
        .unwrap();
    wb.set_cell_text("other", "C4", "far").unwrap();

    XlsxEngine.save_workbook(&wb, &path).unwrap();
    assert!(XlsxEngine.exists(&path));

    let loaded = XlsxEngine.load_workbook(&path).unwrap();
    assert_eq!(loaded.sheet_names(), vec!["data.csv", "other"]);

    let data = loaded.sheet("data.csv").unwrap();
    assert_eq!(data.cell(1, 1), Some(&CellValue::Text("name".into())));
    assert_eq!(
        data.cell(2, 1),
        Some(&CellValue::Number {
            value: 1.5,
            format: NumberFormat::Fixed(1)
        })
    );
    assert_eq!(data.cell(2, 2), Some(&CellValue::number(2.0, None)));
    assert_eq!(data.cell(2, 2).map(|v| v.display()), Some("2".to_string()));
    assert_eq!(data.cell(3, 1), Some(&CellValue::Bool(true)));
    assert_eq!(
        data.cell(2, 3),
        Some(&CellValue::Formula("SUM(B1:B2)".into()))
    );
    assert_eq!(data.cell(1, 2), None);

    let other = loaded.sheet("OTHER").unwrap();
    assert_eq!(other.len(), 1);
    assert_eq!(other.cell(3, 4), Some(&CellValue::Text("far".into())));

    let _ = std::fs::remove_file(&path);
}

#[test]
fn loads_workbook_written_by_another_producer() {
    let path = tmp_xlsx("foreign");
    let mut book = rust_xlsxwriter::Workbook::new();
    let ws = book.add_worksheet();
    ws.set_name("Budget").unwrap();
    ws.write_string(0, 0, "item").unwrap();
    ws.write_number(1, 1, 42.0).unwrap();
    ws.write_boolean(2, 0, false).unwrap();
    ws.write_formula(3, 1, "=B2*2").unwrap();
    book.add_worksheet().set_name("Empty").unwrap();
    book.save(&path).unwrap();

    let loaded = XlsxEngine.load_workbook(&path).unwrap();
    assert_eq!(loaded.sheet_names(), vec!["Budget", "Empty"]);
    let budget = loaded.sheet("Budget").unwrap();
    assert_eq!(budget.cell(1, 1), Some(&CellValue::Text("item".into())));
    assert!(budget.cell(2, 2).is_some_and(CellValue::is_number));
    assert_eq!(budget.cell(1, 3), Some(&CellValue::Bool(false)));
    assert_eq!(budget.cell(2, 4), Some(&CellValue::Formula("B2*2".into())));
    assert!(loaded.sheet("Empty").unwrap().is_empty());

    let _ = std::fs::remove_file(&path);
}

#[test]
fn number_formats_survive_load_and_save() {
    let path = tmp_xlsx("formats");
    let mut book = rust_xlsxwriter::Workbook::new();
    let ws = book.add_worksheet();
    ws.set_name("Ledger").unwrap();
    let money = rust_xlsxwriter::Format::new().set_num_format("#,##0.00");
    let date = rust_xlsxwriter::Format::new().set_num_format("yyyy-mm-dd");
    let two = rust_xlsxwriter::Format::new().set_num_format("0.00");
    ws.write_number_with_format(0, 0, 1234.5, &money).unwrap();
    ws.write_number_with_format(1, 0, 45000.0, &date).unwrap();
    ws.write_number_with_format(2, 0, 3.1, &two).unwrap();
    ws.write_number(3, 0, 7.25).unwrap();
    book.save(&path).unwrap();

    let loaded = XlsxEngine.load_workbook(&path).unwrap();
    let ledger = loaded.sheet("Ledger").unwrap();
    assert_eq!(
        ledger.cell(1, 1),
        Some(&CellValue::Number {
            value: 1234.5,
            format: NumberFormat::Custom("#,##0.00".into())
        })
    );
    assert_eq!(ledger.cell(1, 1).map(|v| v.display()), Some("1,234.50".to_string()));
    assert!(matches!(
        ledger.cell(1, 2),
        Some(CellValue::Number { format: NumberFormat::Custom(code), .. }) if code == "yyyy-mm-dd"
    ));
    assert_eq!(ledger.cell(1, 3).map(|v| v.display()), Some("3.10".to_string()));
    assert_eq!(ledger.cell(1, 4), Some(&CellValue::number(7.25, None)));

    // Saving again writes the same codes back.
    XlsxEngine.save_workbook(&loaded, &path).unwrap();
    let reloaded = XlsxEngine.load_workbook(&path).unwrap();
    assert_eq!(reloaded, loaded);

    let _ = std::fs::remove_file(&path);
}

#[test]
fn loading_a_non_workbook_fails() {
    let path = tmp_xlsx("garbage");
    std::fs::write(&path, b"not a zip archive").unwrap();
    assert!(XlsxEngine.load_workbook(&path).is_err());
    let _ = std::fs::remove_file(&path);
}
