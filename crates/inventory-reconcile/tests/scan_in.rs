mod common;

use common::{codes_and_assets, row_with_asset, today, InventorySheet, ASSET, SCANNED, SEQ, VERIFIED};
use inventory_io::{InventoryStore, MemoryStore, SheetStore};
use inventory_model::{CellValue, InventoryConfig};
use inventory_reconcile::normalize::strict_suffix_key;
use inventory_reconcile::{
    Classification, InputError, ReconcileError, ScanMode, ScanOutcome, ScanSession,
    SessionWarning,
};
use pretty_assertions::assert_eq;

fn store() -> MemoryStore {
    MemoryStore::new(
        InventorySheet::new()
            .row(1, "AB000123", "S-1")
            .row(2, "AB000777", "S-2")
            .row(51003, "AB000900", "")
            .build(),
    )
}

#[test]
fn first_scan_is_found_and_repeat_is_a_duplicate() {
    let mut store = store();
    let config = InventoryConfig::default();
    let mut session =
        ScanSession::begin(&mut store, &config, ScanMode::ScanIn, today()).expect("begin");

    let found = session.submit_event("ab-000123").expect("scan");
    let ScanOutcome::Found(record) = &found else {
        panic!("expected Found, got {found:?}");
    };
    assert_eq!(record.row, 2);
    let key = strict_suffix_key("AB000123", config.key_width).expect("key");
    assert!(session.has_scanned(&key));

    let duplicate = session.submit_event("ab-000123").expect("scan");
    let ScanOutcome::Duplicate(record) = &duplicate else {
        panic!("expected Duplicate, got {duplicate:?}");
    };
    assert_eq!(record.sequence, Some(51004));
    assert_eq!(record.row, 5);

    let report = session.finish().expect("finish");
    assert_eq!(report.count(Classification::Found), 1);
    assert_eq!(report.count(Classification::Duplicate), 1);
    assert_eq!(report.scanned_unique, 1);

    let sheet = store.committed().expect("committed");
    assert_eq!(sheet.cell(2, SCANNED), &CellValue::Date(today()));
    assert_eq!(sheet.cell(2, VERIFIED), &CellValue::Date(today()));
    assert_eq!(
        codes_and_assets(sheet),
        vec![
            ("1".to_string(), "AB000123".to_string()),
            ("2".to_string(), "AB000777".to_string()),
            ("51003".to_string(), "AB000900".to_string()),
            ("51004".to_string(), "ab-000123".to_string()),
        ]
    );
}

#[test]
fn duplicate_codes_start_at_the_band_floor() {
    let mut store = MemoryStore::new(InventorySheet::new().row(1, "AB000123", "").build());
    let config = InventoryConfig::default();
    let mut session =
        ScanSession::begin(&mut store, &config, ScanMode::ScanIn, today()).expect("begin");

    session.submit_event("AB000123").expect("scan");
    let outcome = session.submit_event("AB000123").expect("scan");
    assert_eq!(outcome.record().and_then(|r| r.sequence), Some(51000));
}

#[test]
fn unknown_codes_are_appended_in_the_new_item_stream() {
    let mut store = MemoryStore::new(
        InventorySheet::new()
            .row(1, "AB000123", "")
            .row(50002, "AB000500", "")
            .build(),
    );
    let config = InventoryConfig::default();
    let mut session =
        ScanSession::begin(&mut store, &config, ScanMode::ScanIn, today()).expect("begin");

    let first = session.submit_event("ZZ000001").expect("scan");
    assert!(matches!(first, ScanOutcome::New(_)), "{first:?}");
    assert_eq!(first.record().and_then(|r| r.sequence), Some(50003));

    let second = session.submit_event("ZZ000002").expect("scan");
    assert_eq!(second.record().and_then(|r| r.sequence), Some(50004));

    // A new item is scanned as soon as it is added.
    let again = session.submit_event("zz-000001").expect("scan");
    assert!(matches!(again, ScanOutcome::Duplicate(_)), "{again:?}");

    let report = session.finish().expect("finish");
    assert_eq!(report.count(Classification::New), 2);
    assert_eq!(report.count(Classification::Duplicate), 1);
    assert_eq!(report.items_of(Classification::New).count(), 2);

    let sheet = store.committed().expect("committed");
    let row = row_with_asset(sheet, "ZZ000001").expect("appended row");
    assert_eq!(sheet.cell(row, SEQ), &CellValue::from(50003i64));
    assert_eq!(sheet.cell(row, SCANNED), &CellValue::Date(today()));
}

#[test]
fn appended_rows_copy_the_template_style() {
    let mut store = store();
    let config = InventoryConfig::default();
    let mut session =
        ScanSession::begin(&mut store, &config, ScanMode::ScanIn, today()).expect("begin");
    let outcome = session.submit_event("QQ1").expect("scan");
    let row = outcome.record().expect("record").row;
    session.abandon();

    assert_eq!(store.sheet().style(row, ASSET), Some(common::TEMPLATE_STYLE));
    assert_eq!(store.sheet().style(row, SCANNED), Some(common::TEMPLATE_STYLE));
}

#[test]
fn blank_input_and_the_sentinel_write_nothing() {
    let mut store = store();
    let config = InventoryConfig::default();
    let mut session =
        ScanSession::begin(&mut store, &config, ScanMode::ScanIn, today()).expect("begin");

    assert_eq!(session.submit_event("   ").expect("blank"), ScanOutcome::Ignored);
    assert_eq!(
        session.submit_event(" Done ").expect("sentinel"),
        ScanOutcome::FinishRequested
    );
    let report = session.finish().expect("finish");
    assert_eq!(report.scanned_unique, 0);
    assert_eq!(report.not_scanned.len(), 3);
    assert_eq!(report.inventory_size, 3);
}

#[test]
fn codes_without_digits_never_match_and_are_flagged() {
    let mut store = MemoryStore::new(
        InventorySheet::new()
            .row(1, "", "")
            .row(2, "NOTAG", "")
            .build(),
    );
    let config = InventoryConfig::default();
    let mut session =
        ScanSession::begin(&mut store, &config, ScanMode::ScanIn, today()).expect("begin");

    let outcome = session.submit_event("NOTAG").expect("scan");
    assert!(matches!(outcome, ScanOutcome::New(_)), "{outcome:?}");
    let again = session.submit_event("NOTAG").expect("scan");
    assert!(matches!(again, ScanOutcome::New(_)), "{again:?}");

    let report = session.finish().expect("finish");
    assert_eq!(
        report.warnings,
        vec![
            SessionWarning::UnmatchableCode {
                code: "NOTAG".to_string()
            };
            2
        ]
    );
}

#[test]
fn not_scanned_lists_rows_present_at_start() {
    let mut store = store();
    let config = InventoryConfig::default();
    let mut session =
        ScanSession::begin(&mut store, &config, ScanMode::ScanIn, today()).expect("begin");
    session.submit_event("AB000777").expect("scan");
    session.submit_event("NEW0001").expect("scan");

    let report = session.finish().expect("finish");
    let missing: Vec<&str> = report
        .not_scanned
        .iter()
        .map(|row| row.identifier.as_str())
        .collect();
    assert_eq!(missing, vec!["AB000123", "AB000900"]);
}

#[test]
fn a_sheet_without_the_identifier_header_is_rejected() {
    let sheet = InventorySheet::new()
        .row(1, "AB000123", "")
        .cell(1, ASSET, "Description")
        .build();
    let mut store = MemoryStore::new(sheet);
    let config = InventoryConfig::default();

    let err = ScanSession::begin(&mut store, &config, ScanMode::ScanIn, today())
        .err()
        .expect("header mismatch");
    assert!(
        matches!(err, ReconcileError::Input(InputError::MissingColumn { .. })),
        "{err:?}"
    );
    assert_eq!(store.save_count(), 0);
}

#[test]
fn header_check_is_case_insensitive_and_can_be_disabled() {
    let sheet = InventorySheet::new()
        .row(1, "AB000123", "")
        .cell(1, ASSET, "  asset id ")
        .build();
    let mut store = MemoryStore::new(sheet.clone());
    let config = InventoryConfig::default();
    assert!(ScanSession::begin(&mut store, &config, ScanMode::ScanIn, today()).is_ok());

    let sheet = InventorySheet::new()
        .row(1, "AB000123", "")
        .cell(1, ASSET, "Tag")
        .build();
    let mut store = MemoryStore::new(sheet);
    let config = InventoryConfig {
        identifier_header: None,
        ..InventoryConfig::default()
    };
    assert!(ScanSession::begin(&mut store, &config, ScanMode::ScanIn, today()).is_ok());
}

#[test]
fn abandoning_commits_nothing() {
    let mut store = store();
    let config = InventoryConfig::default();
    let mut session =
        ScanSession::begin(&mut store, &config, ScanMode::ScanIn, today()).expect("begin");
    session.submit_event("AB000123").expect("scan");
    session.abandon();

    assert_eq!(store.save_count(), 0);
    let committed = store.committed().expect("initial snapshot");
    assert_eq!(committed.cell(2, SCANNED), &CellValue::Empty);
}
