mod common;

use common::{NEXT, ScriptedDriver, contacts_page, contacts_page_rows, people_page, session_config};
use contact_harvest::dom::DomSnapshot;
use contact_harvest::extract::{PageParser, RowAligner, presets};
use contact_harvest::{
    Credentials, DedupMode, HarvestError, Orchestrator, RunConfig, SessionController, SessionState, StopReason,
};
use std::fs;
use std::path::Path;
use tempfile::TempDir;

fn credentials() -> Credentials {
    Credentials::new("me@example.com", "hunter2")
}

fn run_config(dir: &Path, pages: usize) -> RunConfig {
    RunConfig::new(dir.join("contacts.csv")).page_budget(pages).debug_dir(dir.join("debug"))
}

fn site() -> Vec<String> {
    vec![
        people_page(&[("Ada Lovelace", "Analyst", "Engines Ltd"), ("Grace Hopper", "Admiral", "US Navy")]),
        people_page(&[("Alan Turing", "Researcher", "Bletchley Park")]),
        people_page(&[("Edsger Dijkstra", "Professor", "UT Austin"), ("Ada Lovelace", "Analyst", "Engines Ltd")]),
    ]
}

fn csv_rows(path: &Path) -> Vec<String> {
    fs::read_to_string(path).unwrap().lines().map(str::to_string).collect()
}

#[test]
fn test_full_run_merges_every_page() {
    let dir = TempDir::new().unwrap();
    let driver = ScriptedDriver::new(site());
    let controller = SessionController::new(&driver, session_config());
    let mut orchestrator = Orchestrator::new(controller, &presets::people_rows(), run_config(dir.path(), 3)).unwrap();

    let summary = orchestrator.run(&credentials()).unwrap();

    assert_eq!(summary.pages_attempted, 3);
    assert_eq!(summary.pages_failed, 0);
    assert_eq!(summary.rows_written, 5);
    assert_eq!(summary.stop, StopReason::BudgetReached);
    assert_eq!(
        csv_rows(&dir.path().join("contacts.csv")),
        vec![
            "Full Name,Job Title,Company",
            "Grace Hopper,Admiral,US Navy",
            "Alan Turing,Researcher,Bletchley Park",
            "Edsger Dijkstra,Professor,UT Austin",
            "Ada Lovelace,Analyst,Engines Ltd",
        ]
    );
}

fn row_values(record: &contact_harvest::Record) -> Vec<&str> {
    record.values().iter().map(String::as_str).collect()
}

#[test]
fn test_contacts_preset_pads_every_column() {
    let rules = presets::contacts("Australia");
    let fields = PageParser::new(&rules).unwrap().parse(&DomSnapshot::parse(&contacts_page()));

    assert_eq!(fields["Business Name"].len(), 3);
    assert_eq!(fields["Website"].len(), 2);
    assert_eq!(fields["Company LinkedIn"].len(), 1);
    assert_eq!(fields["Country"].len(), 2);
    assert_eq!(fields["Job Title"].len(), 3);

    let records = RowAligner::new(&rules).align(&fields);

    let rows: Vec<Vec<&str>> = records.iter().map(row_values).collect();
    assert_eq!(rows, contacts_page_rows());
}

#[test]
fn test_contacts_preset_through_orchestrator() {
    let dir = TempDir::new().unwrap();
    let driver = ScriptedDriver::new(vec![contacts_page()]);
    let controller = SessionController::new(&driver, session_config());
    let mut orchestrator =
        Orchestrator::new(controller, &presets::contacts("Australia"), run_config(dir.path(), 1)).unwrap();

    let summary = orchestrator.run(&credentials()).unwrap();
    assert_eq!(summary.rows_written, 3);

    let saved = orchestrator.store().load().unwrap();
    assert_eq!(saved.schema().len(), 11);
    let rows: Vec<Vec<&str>> = saved.records().iter().map(row_values).collect();
    assert_eq!(rows, contacts_page_rows());
}

#[test]
fn test_exhaustion_stops_the_loop_cleanly() {
    let dir = TempDir::new().unwrap();
    let driver = ScriptedDriver::new(site()[..2].to_vec());
    let controller = SessionController::new(&driver, session_config());
    let mut orchestrator = Orchestrator::new(controller, &presets::people_rows(), run_config(dir.path(), 5)).unwrap();

    let summary = orchestrator.run(&credentials()).unwrap();

    assert_eq!(summary.pages_attempted, 2);
    assert_eq!(summary.stop, StopReason::Exhausted);
    assert_eq!(summary.rows_written, 3);
    assert_eq!(orchestrator.controller().state(), SessionState::Exhausted);
}

#[test]
fn test_budget_is_respected() {
    let dir = TempDir::new().unwrap();
    let driver = ScriptedDriver::new(site());
    let controller = SessionController::new(&driver, session_config());
    let mut orchestrator = Orchestrator::new(controller, &presets::people_rows(), run_config(dir.path(), 2)).unwrap();

    let summary = orchestrator.run(&credentials()).unwrap();

    assert_eq!(summary.pages_attempted, 2);
    assert_eq!(summary.stop, StopReason::BudgetReached);
    assert_eq!(driver.clicks().iter().filter(|c| c.as_str() == NEXT).count(), 1);
    assert_eq!(driver.current_page(), Some(2));
}

#[test]
fn test_auth_failure_parses_and_writes_nothing() {
    let dir = TempDir::new().unwrap();
    let driver = ScriptedDriver::new(site()).without_login_form();
    let controller = SessionController::new(&driver, session_config());
    let mut orchestrator = Orchestrator::new(controller, &presets::people_rows(), run_config(dir.path(), 3)).unwrap();

    let err = orchestrator.run(&credentials()).unwrap_err();

    assert!(matches!(err, HarvestError::Auth(_)));
    assert_eq!(driver.page_reads(), 0);
    assert!(!dir.path().join("contacts.csv").exists());

    let screenshots = driver.screenshots();
    assert_eq!(screenshots.len(), 1);
    let name = screenshots[0].file_name().unwrap().to_string_lossy().into_owned();
    assert!(name.starts_with("debug_login_error_"));
    assert!(screenshots[0].starts_with(dir.path().join("debug")));
}

#[test]
fn test_second_run_is_rejected_without_screenshot() {
    let dir = TempDir::new().unwrap();
    let driver = ScriptedDriver::new(site());
    let controller = SessionController::new(&driver, session_config());
    let mut orchestrator = Orchestrator::new(controller, &presets::people_rows(), run_config(dir.path(), 1)).unwrap();
    orchestrator.run(&credentials()).unwrap();

    let err = orchestrator.run(&credentials()).unwrap_err();

    assert!(matches!(err, HarvestError::InvalidState { .. }));
    assert!(driver.screenshots().is_empty());
}

#[test]
fn test_failed_page_does_not_stop_the_run() {
    let dir = TempDir::new().unwrap();
    let driver = ScriptedDriver::new(site()).unreadable_page(2);
    let controller = SessionController::new(&driver, session_config());
    let mut orchestrator = Orchestrator::new(controller, &presets::people_rows(), run_config(dir.path(), 3)).unwrap();

    let summary = orchestrator.run(&credentials()).unwrap();

    assert_eq!(summary.pages_attempted, 3);
    assert_eq!(summary.pages_failed, 1);
    assert_eq!(summary.rows_written, 4);
    assert_eq!(driver.screenshots(), vec![dir.path().join("debug").join("debug_error_page_2.png")]);

    let rows = csv_rows(&dir.path().join("contacts.csv"));
    assert_eq!(rows.len(), 4);
    assert!(!rows.iter().any(|r| r.starts_with("Alan Turing")));
}

#[test]
fn test_screenshots_can_be_disabled() {
    let dir = TempDir::new().unwrap();
    let driver = ScriptedDriver::new(site()).unreadable_page(1);
    let controller = SessionController::new(&driver, session_config());
    let config = run_config(dir.path(), 1).screenshots_on_failure(false);
    let mut orchestrator = Orchestrator::new(controller, &presets::people_rows(), config).unwrap();

    let summary = orchestrator.run(&credentials()).unwrap();

    assert_eq!(summary.pages_failed, 1);
    assert!(driver.screenshots().is_empty());
}

#[test]
fn test_rerun_leaves_dataset_unchanged() {
    let dir = TempDir::new().unwrap();
    let output = dir.path().join("contacts.csv");

    for _ in 0..2 {
        let driver = ScriptedDriver::new(site());
        let controller = SessionController::new(&driver, session_config());
        let mut orchestrator =
            Orchestrator::new(controller, &presets::people_rows(), run_config(dir.path(), 3)).unwrap();
        orchestrator.run(&credentials()).unwrap();
    }

    assert_eq!(csv_rows(&output).len(), 5);
}

#[test]
fn test_post_pass_writes_cleaned_copy() {
    let dir = TempDir::new().unwrap();
    let driver = ScriptedDriver::new(site());
    let controller = SessionController::new(&driver, session_config());
    let config = run_config(dir.path(), 3).dedup_mode(DedupMode::PostPass);
    let mut orchestrator = Orchestrator::new(controller, &presets::people_rows(), config).unwrap();

    let summary = orchestrator.run(&credentials()).unwrap();

    let report = summary.dedup.unwrap();
    assert_eq!((report.input_rows, report.output_rows), (5, 4));
    assert_eq!(csv_rows(&dir.path().join("contacts.csv")).len(), 6);
    assert_eq!(csv_rows(&dir.path().join("cleaned_contacts.csv")).len(), 5);
}

#[test]
fn test_invalid_run_config_is_rejected() {
    let dir = TempDir::new().unwrap();
    let driver = ScriptedDriver::new(site());
    let controller = SessionController::new(&driver, session_config());

    let result = Orchestrator::new(controller, &presets::people_rows(), run_config(dir.path(), 0));

    assert!(matches!(result, Err(HarvestError::Config(_))));
}
