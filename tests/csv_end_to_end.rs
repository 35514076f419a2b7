use chrono::NaiveDate;
use country_cleaner::{
    count_runs, get_events_for_run, save_run, setup_audit_store, AuditStage, CleaningConfig,
    Pipeline, Table,
};
use rusqlite::Connection;
use std::fs;

const STORE_EXTRACT: &str = "\
id,store_name,store_email,department,income,date_measured,country
1,Cullen/Frost Bankers Inc.,,Clothing,$54438554.24,4-2-2006,United States/
2,Nordson Corp,,Tools,$41744177.01,4-1-2006,Britain
3,Stag Industrial Inc.,,Beauty,$36152340.34,12-9-2003,United States
4,FIRST REPUBLIC BANK,ccibworth3@ow.ly,Automotive,$8928350.04,8-5-2006,United States/
5,Mercantile Bank Corp.,,Baby,$33552742.32,10-6-2006,United Kingdom
6,Auburn National Bancorp,,Industrial,$69798665.07,24-1-2011,S.A.
7,Interlink Electronics,,Toys,$52412052.12,22-12-2003,
8,Banco Santander,,Books,$47000000.00,01-01-2020,  .
9,Pacific Coast Oil,,Grocery,$1000.00,03-03-2019,Kingdom United
10,\"Nuveen, LLC\",,Garden,$2000.00,04-04-2018,South Africa.
11,Atlas Corp,,Garden,$3000.00,05-05-2017,england
12,Mystery Store,,Games,$4000.00,06-06-2016,Atlantis
";

fn reference() -> NaiveDate {
    NaiveDate::from_ymd_opt(2021, 1, 1).unwrap()
}

#[test]
fn test_store_extract_cleans_to_three_countries() {
    let dir = tempfile::tempdir().unwrap();
    let input = dir.path().join("store_income_data_task.csv");
    fs::write(&input, STORE_EXTRACT).unwrap();

    let table = Table::load_csv(&input).unwrap();
    assert_eq!(table.len(), 12);

    let pipeline = Pipeline::new(CleaningConfig::default()).unwrap();
    let output = pipeline.run(&table, reference()).unwrap();

    // Rows 7 (missing) and 8 (punctuation only) are dropped
    assert_eq!(output.table.len(), 10);
    assert_eq!(output.report.dropped_empty, 2);

    let distinct: Vec<String> = output.table.distinct_countries().into_iter().collect();
    assert_eq!(
        distinct,
        vec![
            "atlantis".to_string(),
            "south africa".to_string(),
            "united kingdom".to_string(),
            "united states of america".to_string(),
        ]
    );
    assert_eq!(output.report.unresolved, vec!["atlantis".to_string()]);

    // Single-digit day and month still parse with %d-%m-%Y
    let first = &output.table.records[0];
    assert_eq!(first.line_number, 1);
    assert_eq!(first.country.as_deref(), Some("united states of america"));
    let expected = (reference() - NaiveDate::from_ymd_opt(2006, 2, 4).unwrap()).num_days();
    assert_eq!(first.days_ago, Some(expected));
}

#[test]
fn test_written_output_is_stable_under_rerun() {
    let dir = tempfile::tempdir().unwrap();
    let input = dir.path().join("in.csv");
    let cleaned = dir.path().join("out.csv");
    fs::write(&input, STORE_EXTRACT).unwrap();

    let pipeline = Pipeline::new(CleaningConfig::default()).unwrap();

    let first = pipeline.run(&Table::load_csv(&input).unwrap(), reference()).unwrap();
    first.table.save_csv(&cleaned).unwrap();

    let text = fs::read_to_string(&cleaned).unwrap();
    let header = text.lines().next().unwrap();
    assert_eq!(
        header,
        "id,store_name,store_email,department,income,date_measured,country,days_ago"
    );
    // Quoted cells survive the round trip
    assert!(text.contains("\"Nuveen, LLC\""));

    let reloaded = Table::load_csv(&cleaned).unwrap();
    let second = pipeline.run(&reloaded, reference()).unwrap();

    assert_eq!(second.report.input_fingerprint, second.report.output_fingerprint);
    assert_eq!(first.report.output_fingerprint, second.report.output_fingerprint);
    assert!(second.audit.is_empty());

    // Writing again does not add a second days_ago column
    let again = dir.path().join("again.csv");
    second.table.save_csv(&again).unwrap();
    assert_eq!(fs::read_to_string(&again).unwrap(), text);
}

#[test]
fn test_audit_run_persists_to_sqlite() {
    let dir = tempfile::tempdir().unwrap();
    let db_path = dir.path().join("audit.db");

    let table = Table::from_reader(STORE_EXTRACT.as_bytes()).unwrap();
    let pipeline = Pipeline::new(CleaningConfig::default()).unwrap();
    let output = pipeline.run(&table, reference()).unwrap();

    let mut conn = Connection::open(&db_path).unwrap();
    setup_audit_store(&conn).unwrap();
    save_run(&mut conn, &output.report.run_record(), &output.audit).unwrap();
    drop(conn);

    let conn = Connection::open(&db_path).unwrap();
    let events = get_events_for_run(&conn, &output.audit.run_id).unwrap();

    assert_eq!(count_runs(&conn).unwrap(), 1);
    assert_eq!(events.len(), output.audit.len());
    assert!(events
        .iter()
        .any(|e| e.stage == AuditStage::Fuzzy && e.original == "kingdom united"));
    assert!(events
        .iter()
        .any(|e| e.stage == AuditStage::Alias && e.original == "britain"));
}
