use std::io::Write;
use std::path::Path;
use std::process::{Command, Output, Stdio};

use chrono::NaiveDate;
use inventory_io::{open_workbook, save_workbook, SheetStore, Workbook, Worksheet};
use inventory_model::{CellValue, Column};
use pretty_assertions::assert_eq;

const INVENTORY: &str = "\
Seq,Name,Asset Id
2,dock,AB000777
1,laptop,AB000123
";

fn run(args: &[&str], stdin: &str) -> Output {
    let mut child = Command::new(env!("CARGO_BIN_EXE_inventory"))
        .args(args)
        .arg("--date")
        .arg("2024-03-15")
        .stdin(Stdio::piped())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .spawn()
        .expect("spawn inventory");
    child
        .stdin
        .take()
        .expect("stdin")
        .write_all(stdin.as_bytes())
        .expect("write stdin");
    child.wait_with_output().expect("wait for inventory")
}

fn stdout(output: &Output) -> String {
    String::from_utf8_lossy(&output.stdout).into_owned()
}

fn stderr(output: &Output) -> String {
    String::from_utf8_lossy(&output.stderr).into_owned()
}

fn read_sheet(path: &Path) -> Worksheet {
    open_workbook(path)
        .expect("reopen")
        .sheets
        .into_iter()
        .next()
        .expect("sheet")
}

fn column_texts(sheet: &Worksheet, column: Column) -> Vec<String> {
    (2..=sheet.row_count())
        .map(|row| sheet.cell(row, column).to_text().into_owned())
        .collect()
}

#[test]
fn scan_in_stamps_found_rows_and_appends_the_rest() {
    let dir = tempfile::tempdir().expect("temp dir");
    let path = dir.path().join("inventory.csv");
    std::fs::write(&path, INVENTORY).expect("write inventory");

    let output = run(
        &["scan-in", "--inventory", path.to_str().expect("utf-8 path")],
        "ab-000123\nab-000123\n\nNEW1\ndone\n",
    );
    assert!(output.status.success(), "stderr:\n{}", stderr(&output));

    let text = stdout(&output);
    assert!(text.contains("Unique items scanned: 2"), "{text}");
    assert!(text.contains("New items added (50xxx): 1"), "{text}");
    assert!(text.contains("Duplicate entries added (51xxx): 1"), "{text}");
    assert!(stderr(&output).contains("[✓] ab-000123 found in inventory."));

    let sheet = read_sheet(&path);
    assert_eq!(
        column_texts(&sheet, Column::new(1)),
        vec!["1", "2", "50000", "51000"]
    );
    assert_eq!(
        column_texts(&sheet, Column::new(3)),
        vec!["AB000123", "AB000777", "NEW1", "ab-000123"]
    );
    assert_eq!(
        sheet.cell(2, Column::new(26)),
        &CellValue::from("2024-03-15")
    );
    assert_eq!(sheet.cell(3, Column::new(26)), &CellValue::Empty);
}

/// Date cell format of a freshly written `.xlsx`.
const DATE_STYLE: u32 = 1;

#[test]
fn scan_in_saves_an_xlsx_inventory_in_place_with_its_formatting() {
    let dir = tempfile::tempdir().expect("temp dir");
    let path = dir.path().join("inventory.xlsx");
    let mut sheet = Worksheet::from_rows(
        "Inventory",
        vec![
            vec!["Seq".into(), "Name".into(), "Asset Id".into()],
            vec![2i64.into(), "dock".into(), "AB000777".into()],
            vec![1i64.into(), "laptop".into(), "AB000123".into()],
        ],
    );
    sheet.set_style(2, Column::new(26), DATE_STYLE);
    save_workbook(&Workbook::with_sheet(sheet), &path).expect("write inventory");

    let output = run(
        &["scan-in", "--inventory", path.to_str().expect("utf-8 path")],
        "AB000123\nNEW1\ndone\n",
    );
    assert!(output.status.success(), "stderr:\n{}", stderr(&output));
    assert!(!stderr(&output).contains("Changes will be saved to"), "{}", stderr(&output));
    assert!(!dir.path().join("inventory.csv").exists());

    let sheet = read_sheet(&path);
    assert_eq!(
        column_texts(&sheet, Column::new(3)),
        vec!["AB000123", "AB000777", "NEW1"]
    );
    let today = NaiveDate::from_ymd_opt(2024, 3, 15).expect("valid date");
    assert_eq!(sheet.cell(2, Column::new(26)).as_date(), Some(today));
    assert_eq!(sheet.cell(4, Column::new(26)).as_date(), Some(today));
    assert_eq!(sheet.style(4, Column::new(26)), Some(DATE_STYLE));
    assert!(sheet.is_column_hidden(Column::new(2)));
    assert!(sheet.is_column_hidden(Column::new(4)));
    assert!(!sheet.is_column_hidden(Column::new(3)));
}

#[test]
fn end_of_input_without_done_saves_nothing() {
    let dir = tempfile::tempdir().expect("temp dir");
    let path = dir.path().join("inventory.csv");
    std::fs::write(&path, INVENTORY).expect("write inventory");

    let output = run(
        &["scan-in", "--inventory", path.to_str().expect("utf-8 path")],
        "AB000123\n",
    );
    assert!(!output.status.success());
    assert!(stderr(&output).contains("nothing was saved"), "{}", stderr(&output));
    assert_eq!(std::fs::read_to_string(&path).expect("read"), INVENTORY);
}

#[test]
fn finish_on_eof_commits_the_session() {
    let dir = tempfile::tempdir().expect("temp dir");
    let path = dir.path().join("inventory.csv");
    std::fs::write(&path, INVENTORY).expect("write inventory");

    let output = run(
        &[
            "scan-in",
            "--finish-on-eof",
            "--inventory",
            path.to_str().expect("utf-8 path"),
        ],
        "AB000123\n",
    );
    assert!(output.status.success(), "stderr:\n{}", stderr(&output));
    let sheet = read_sheet(&path);
    assert_eq!(
        sheet.cell(2, Column::new(27)),
        &CellValue::from("2024-03-15")
    );
}

#[test]
fn scan_out_reprompts_for_a_blank_location() {
    let dir = tempfile::tempdir().expect("temp dir");
    let path = dir.path().join("inventory.csv");
    std::fs::write(&path, INVENTORY).expect("write inventory");

    let output = run(
        &["scan-out", "--inventory", path.to_str().expect("utf-8 path")],
        "  \nDock 4\nAB000777\ndone\n",
    );
    assert!(output.status.success(), "stderr:\n{}", stderr(&output));
    assert!(stderr(&output).contains("A location is required"));
    assert!(stdout(&output).contains("Location used: SHR: Dock 4"));

    let sheet = read_sheet(&path);
    assert_eq!(sheet.cell(3, Column::new(9)), &CellValue::from("SHR: Dock 4"));
    assert_eq!(sheet.cell(3, Column::new(24)), &CellValue::from("Out"));
    assert_eq!(sheet.cell(2, Column::new(24)), &CellValue::Empty);
}

#[test]
fn import_hr_renumbers_against_the_roster() {
    let dir = tempfile::tempdir().expect("temp dir");
    let path = dir.path().join("inventory.csv");
    std::fs::write(&path, INVENTORY).expect("write inventory");
    let roster = dir.path().join("roster.csv");
    std::fs::write(&roster, "Dept,Asset\nIT,AB000777\n,\nOps,ZZ000001\n").expect("write roster");

    let output = run(
        &[
            "import-hr",
            "--inventory",
            path.to_str().expect("utf-8 path"),
            "--roster",
            roster.to_str().expect("utf-8 path"),
            "--format",
            "json",
        ],
        "",
    );
    assert!(output.status.success(), "stderr:\n{}", stderr(&output));

    let json: serde_json::Value = serde_json::from_str(&stdout(&output)).expect("json report");
    assert_eq!(json["report"]["mode"], "roster_import");
    assert_eq!(json["report"]["counts"]["unchanged"], 1);
    assert_eq!(json["report"]["counts"]["brand_new"], 1);
    assert_eq!(json["report"]["counts"]["removed_by_import"], 1);

    let sheet = read_sheet(&path);
    assert_eq!(
        column_texts(&sheet, Column::new(1)),
        vec!["1", "2", "50000"]
    );
    assert_eq!(
        column_texts(&sheet, Column::new(3)),
        vec!["AB000777", "ZZ000001", "AB000123"]
    );
    assert_eq!(sheet.cell(3, Column::new(2)), &CellValue::from("Ops"));
}

#[test]
fn export_dir_receives_the_scan_listings() {
    let dir = tempfile::tempdir().expect("temp dir");
    let path = dir.path().join("inventory.csv");
    std::fs::write(&path, INVENTORY).expect("write inventory");
    let exports = dir.path().join("exports");

    let output = run(
        &[
            "scan-in",
            "--inventory",
            path.to_str().expect("utf-8 path"),
            "--export-dir",
            exports.to_str().expect("utf-8 path"),
        ],
        "AB000123\nNEW1\ndone\n",
    );
    assert!(output.status.success(), "stderr:\n{}", stderr(&output));

    let not_scanned = std::fs::read_to_string(exports.join("not_scanned.csv")).expect("read");
    assert_eq!(
        not_scanned,
        "row,sequence,identifier,serial\n2,2,AB000777,\n"
    );
    let new_items = std::fs::read_to_string(exports.join("new_items.csv")).expect("read");
    assert_eq!(
        new_items,
        "sequence,identifier,scanned,location\n50000,NEW1,2024-03-15,\n"
    );
}

#[test]
fn a_missing_identifier_header_aborts_the_run() {
    let dir = tempfile::tempdir().expect("temp dir");
    let path = dir.path().join("inventory.csv");
    let original = "Seq,Name,Tag\n1,laptop,AB000123\n";
    std::fs::write(&path, original).expect("write inventory");

    let output = run(
        &["scan-in", "--inventory", path.to_str().expect("utf-8 path")],
        "AB000123\ndone\n",
    );
    assert!(!output.status.success());
    assert!(stderr(&output).contains("Asset Id"), "{}", stderr(&output));
    assert_eq!(std::fs::read_to_string(&path).expect("read"), original);
}

#[test]
fn a_blank_inventory_path_cancels() {
    let output = run(&["scan-in"], "\n");
    assert!(!output.status.success());
    assert!(stderr(&output).contains("no Inventory workbook selected"), "{}", stderr(&output));
}
