mod common;

use common::{codes_and_assets, row_with_asset, today, InventorySheet, ASSET, SEQ, SERIAL, STATUS, VERIFIED};
use inventory_io::{MemoryStore, SheetStore, Worksheet};
use inventory_model::{CellValue, Column, ImportLayout, InventoryConfig};
use inventory_reconcile::{Classification, ImportOutcome, ImportRow, RosterImport};
use pretty_assertions::assert_eq;

fn roster_row(identifier: &str, serial: &str) -> ImportRow {
    ImportRow::from_parts(&ImportLayout::default(), identifier, serial, Vec::new())
}

#[test]
fn serial_only_match_rejoins_a_pending_row() {
    let mut store = MemoryStore::new(
        InventorySheet::new()
            .row(50005, "OLD-1", "sn-42")
            .row(3, "AB000003", "S3")
            .build(),
    );
    let config = InventoryConfig::default();
    let mut import = RosterImport::begin(&mut store, &config, today());

    for n in 1..=6 {
        let outcome = import
            .submit_import_row(&roster_row(&format!("ZZ00{n}"), &format!("Z{n}")))
            .expect("import");
        assert!(matches!(outcome, ImportOutcome::BrandNew { .. }), "{outcome:?}");
    }

    let outcome = import
        .submit_import_row(&roster_row("AB000999", "SN-42"))
        .expect("import");
    assert_eq!(
        outcome,
        ImportOutcome::Rejoined {
            import_index: 7,
            row: 2,
            previous: Some(50005),
            identifier: "AB000999".to_string(),
            serial: "SN-42".to_string(),
            via_serial: true,
        }
    );

    let report = import.finish().expect("finish");
    assert_eq!(report.count(Classification::Rejoined), 1);
    assert!(
        report
            .items_of(Classification::RemovedByImport)
            .all(|line| !line.contains("AB000999")),
        "{report}"
    );

    let sheet = store.committed().expect("committed");
    let row = row_with_asset(sheet, "AB000999").expect("rejoined row");
    assert_eq!(sheet.cell(row, SEQ), &CellValue::from(7i64));
    assert_eq!(sheet.cell(row, SERIAL), &CellValue::from("sn-42"));
}

#[test]
fn unclaimed_active_rows_move_to_the_smallest_free_pending_code() {
    let mut store = MemoryStore::new(
        InventorySheet::new()
            .row(10, "AB000010", "S10")
            .row(50000, "AB050000", "")
            .row(50002, "AB050002", "")
            .row(20, "AB000020", "S20")
            .build(),
    );
    let config = InventoryConfig::default();
    let mut import = RosterImport::begin(&mut store, &config, today());
    import
        .submit_import_row(&roster_row("AB000020", "S20"))
        .expect("import");

    let report = import.finish().expect("finish");
    assert_eq!(report.count(Classification::Unchanged), 1);
    assert_eq!(report.count(Classification::RemovedByImport), 1);
    assert_eq!(
        report.items_of(Classification::RemovedByImport).collect::<Vec<_>>(),
        vec![r#"Row 2: Asset "AB000010" / Serial "S10" -> 50001"#]
    );

    let sheet = store.committed().expect("committed");
    assert_eq!(
        codes_and_assets(sheet),
        vec![
            ("1".to_string(), "AB000020".to_string()),
            ("50000".to_string(), "AB050000".to_string()),
            ("50001".to_string(), "AB000010".to_string()),
            ("50002".to_string(), "AB050002".to_string()),
        ]
    );
}

#[test]
fn exact_matches_on_pending_rows_rejoin_and_active_rows_stay_unchanged() {
    let mut store = MemoryStore::new(
        InventorySheet::new()
            .row(4, "AB000100", "S100")
            .row(50001, "AB000200", "S200")
            .build(),
    );
    let config = InventoryConfig::default();
    let mut import = RosterImport::begin(&mut store, &config, today());

    let unchanged = import
        .submit_import_row(&roster_row("ab-100", " s100 "))
        .expect("import");
    assert_eq!(
        unchanged,
        ImportOutcome::Unchanged {
            import_index: 1,
            row: 2
        }
    );

    let rejoined = import
        .submit_import_row(&roster_row("AB000200", "S200"))
        .expect("import");
    assert!(
        matches!(
            rejoined,
            ImportOutcome::Rejoined {
                import_index: 2,
                row: 3,
                via_serial: false,
                ..
            }
        ),
        "{rejoined:?}"
    );

    let report = import.finish().expect("finish");
    assert_eq!(report.count(Classification::RemovedByImport), 0);
    let sheet = store.committed().expect("committed");
    assert_eq!(
        codes_and_assets(sheet),
        vec![
            ("1".to_string(), "AB000100".to_string()),
            ("2".to_string(), "AB000200".to_string()),
        ]
    );
}

#[test]
fn blank_roster_rows_consume_no_index() {
    let mut store = MemoryStore::new(InventorySheet::new().row(1, "AB000001", "").build());
    let config = InventoryConfig::default();
    let mut import = RosterImport::begin(&mut store, &config, today());

    assert_eq!(
        import.submit_import_row(&roster_row("", "  ")).expect("blank"),
        ImportOutcome::Skipped
    );
    let outcome = import
        .submit_import_row(&roster_row("AB000001", ""))
        .expect("import");
    assert_eq!(outcome.import_index(), Some(1));
    import.finish().expect("finish");
}

#[test]
fn serial_only_matching_prefers_the_last_pending_row() {
    // Several pending rows sharing a serial: the last one in sheet order wins.
    let mut store = MemoryStore::new(
        InventorySheet::new()
            .row(50000, "AB000001", "DUP")
            .row(50001, "AB000002", "dup")
            .build(),
    );
    let config = InventoryConfig::default();
    let mut import = RosterImport::begin(&mut store, &config, today());

    let outcome = import
        .submit_import_row(&roster_row("AB000009", "DUP"))
        .expect("import");
    assert!(
        matches!(outcome, ImportOutcome::Rejoined { row: 3, via_serial: true, .. }),
        "{outcome:?}"
    );
    import.abandon();
}

#[test]
fn brand_new_rows_shift_one_column_right_and_blank_the_scan_columns() {
    let mut store = MemoryStore::new(InventorySheet::new().row(1, "AB000001", "S1").build());
    let config = InventoryConfig::default();
    let mut import = RosterImport::begin(&mut store, &config, today());

    let mut cells = vec![CellValue::Empty; 30];
    cells[0] = "dept".into();
    cells[1] = "AB000777".into();
    cells[13] = "SER-777".into();
    cells[22] = "stale status".into();
    cells[25] = "stale verified".into();
    cells[29] = "past the sheet".into();
    let roster = ImportRow::from_cells(cells);

    let outcome = import.submit_import_row(&roster).expect("import");
    let ImportOutcome::BrandNew { row, import_index, .. } = outcome else {
        panic!("expected BrandNew, got {outcome:?}");
    };
    assert_eq!((row, import_index), (3, 1));

    let report = import.finish().expect("finish");
    assert_eq!(report.count(Classification::BrandNew), 1);
    assert_eq!(report.count(Classification::RemovedByImport), 1);

    let sheet = store.committed().expect("committed");
    let row = row_with_asset(sheet, "AB000777").expect("brand new row");
    assert_eq!(sheet.cell(row, SEQ), &CellValue::from(1i64));
    assert_eq!(sheet.cell(row, Column::new(2)), &CellValue::from("dept"));
    assert_eq!(sheet.cell(row, ASSET), &CellValue::from("AB000777"));
    assert_eq!(sheet.cell(row, SERIAL), &CellValue::from("SER-777"));
    assert_eq!(sheet.cell(row, STATUS), &CellValue::Empty);
    assert_eq!(sheet.cell(row, VERIFIED), &CellValue::Empty);
    assert_eq!(sheet.column_count(), 27);
}

#[test]
fn brand_new_rows_are_not_matchable_later_in_the_same_import() {
    let mut store = MemoryStore::new(InventorySheet::new().row(1, "AB000001", "").build());
    let config = InventoryConfig::default();
    let mut import = RosterImport::begin(&mut store, &config, today());

    let first = import
        .submit_import_row(&roster_row("AB000050", "X"))
        .expect("import");
    let second = import
        .submit_import_row(&roster_row("AB000050", "X"))
        .expect("import");
    assert!(matches!(first, ImportOutcome::BrandNew { row: 3, .. }), "{first:?}");
    assert!(matches!(second, ImportOutcome::BrandNew { row: 4, .. }), "{second:?}");

    let report = import.finish().expect("finish");
    assert_eq!(report.duplicates.groups.len(), 1);
    assert_eq!(report.duplicates.groups[0].identifier, "AB000050");
}

#[test]
fn import_sheet_walks_every_data_row() {
    let mut store = MemoryStore::new(
        InventorySheet::new()
            .row(7, "AB000001", "S1")
            .row(8, "AB000002", "S2")
            .build(),
    );
    let mut roster = Worksheet::new("HR");
    roster.set_cell(1, Column::new(2), "Asset".into());
    roster.set_cell(1, Column::new(14), "Serial".into());
    roster.set_cell(2, Column::new(2), "AB000002".into());
    roster.set_cell(2, Column::new(14), "S2".into());
    roster.set_cell(4, Column::new(2), "AB000001".into());
    roster.set_cell(4, Column::new(14), "S1".into());

    let config = InventoryConfig::default();
    let mut import = RosterImport::begin(&mut store, &config, today());
    let outcomes = import.import_sheet(&roster).expect("import");
    assert_eq!(
        outcomes.iter().map(ImportOutcome::import_index).collect::<Vec<_>>(),
        vec![Some(1), None, Some(2)]
    );
    import.finish().expect("finish");

    let sheet = store.committed().expect("committed");
    assert_eq!(
        codes_and_assets(sheet),
        vec![
            ("1".to_string(), "AB000002".to_string()),
            ("2".to_string(), "AB000001".to_string()),
        ]
    );
    assert!(sheet.is_column_hidden(Column::new(2)));
    assert!(!sheet.is_column_hidden(ASSET));
}

#[test]
fn reports_serialize_with_snake_case_keys() {
    let mut store = MemoryStore::new(InventorySheet::new().row(5, "AB000005", "").build());
    let config = InventoryConfig::default();
    let import = RosterImport::begin(&mut store, &config, today());
    let report = import.finish().expect("finish");

    let json = serde_json::to_value(&report).expect("serialize");
    assert_eq!(json["mode"], "roster_import");
    assert_eq!(json["date"], "2024-03-15");
    assert_eq!(json["counts"]["removed_by_import"], 1);
    assert_eq!(json["duplicates"]["groups"], serde_json::json!([]));
}
