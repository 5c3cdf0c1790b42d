//! CLI argument handling and end-to-end rendering tests.

use std::path::Path;

use chrono::{TimeZone, Utc};
use clap::Parser;
use rstest::{fixture, rstest};
use tempfile::TempDir;
use waymark_core::{Node, Tag};
use waymark_store::test_support::{Dataset, User, write_database};

use super::{Cli, CliError, execute};

fn seed(path: &Path) {
    let node = Node {
        id: 1001,
        lat: Some(51.5),
        lon: Some(-0.1),
        user: None,
        uid: None,
        visible: true,
        version: 1,
        changeset: 100,
        timestamp: Utc.with_ymd_and_hms(2021, 6, 15, 12, 0, 0).unwrap(),
        tags: vec![Tag::new("amenity", "pub")],
    };
    let changeset = waymark_core::Changeset {
        id: 100,
        user: None,
        uid: Some(1),
        created_at: Utc.with_ymd_and_hms(2021, 6, 15, 11, 0, 0).unwrap(),
        closed_at: Utc.with_ymd_and_hms(2021, 6, 15, 12, 0, 0).unwrap(),
        open: false,
        min_lat: 51.0,
        max_lat: 52.0,
        min_lon: -1.0,
        max_lon: 0.0,
        num_changes: 1,
        comments_count: 0,
        tags: Vec::new(),
        discussion: None,
    };
    let dataset = Dataset::new()
        .with_users([User::public(1, "alice")])
        .with_changesets([changeset])
        .with_nodes([node]);
    write_database(path, &dataset).expect("seed database");
}

#[fixture]
fn db() -> (TempDir, String) {
    let dir = TempDir::new().expect("create temp dir");
    let path = dir.path().join("cli.db");
    seed(&path);
    let path = path.to_string_lossy().into_owned();
    (dir, path)
}

fn parse(args: &[&str]) -> Cli {
    Cli::try_parse_from(args).expect("parse arguments")
}

#[rstest]
fn node_subcommand_renders_xml(#[from(db)] (_dir, db): (TempDir, String)) {
    let cli = parse(&["waymark", "--db", &db, "node", "1001"]);
    let output = execute(&cli).expect("execute");
    assert!(output.starts_with("<osm"));
    assert!(output.contains("id=\"1001\""));
    assert!(output.contains("k=\"amenity\""));
}

#[rstest]
fn json_flag_switches_output_format(#[from(db)] (_dir, db): (TempDir, String)) {
    let cli = parse(&["waymark", "--db", &db, "--json", "node", "1001"]);
    let output = execute(&cli).expect("execute");
    let value: serde_json::Value = serde_json::from_str(&output).expect("valid JSON");
    assert_eq!(value["elements"][0]["id"], 1001);
    assert_eq!(value["elements"][0]["type"], "node");
}

#[rstest]
fn missing_element_surfaces_domain_error(#[from(db)] (_dir, db): (TempDir, String)) {
    let cli = parse(&["waymark", "--db", &db, "node", "9999"]);
    let error = execute(&cli).expect_err("unknown node");
    assert!(matches!(
        error,
        CliError::Api(waymark_api::ApiError::NotFound)
    ));
}

#[rstest]
fn malformed_reference_list_fails_before_any_query(
    #[from(db)] (_dir, db): (TempDir, String),
) {
    let cli = parse(&["waymark", "--db", &db, "nodes", "1001,12x4"]);
    assert!(matches!(
        execute(&cli).expect_err("malformed refs"),
        CliError::InvalidRefs(_)
    ));
}

#[rstest]
fn malformed_bbox_fails_before_any_query(#[from(db)] (_dir, db): (TempDir, String)) {
    let cli = parse(&["waymark", "--db", &db, "map", "1,2,3"]);
    assert!(matches!(
        execute(&cli).expect_err("malformed bbox"),
        CliError::InvalidBbox(_)
    ));
}

#[rstest]
#[case("--help", clap::error::ErrorKind::DisplayHelp)]
#[case("--version", clap::error::ErrorKind::DisplayVersion)]
fn help_and_version_are_not_usage_errors(
    #[case] flag: &str,
    #[case] kind: clap::error::ErrorKind,
) {
    // These short-circuit parsing; the binary hands them back to clap
    // to print on stdout with a zero exit code.
    let err = Cli::try_parse_from(["waymark", flag]).expect_err("parsing short-circuits");
    assert_eq!(err.kind(), kind);
}

#[rstest]
fn version_and_history_flags_conflict() {
    let result = Cli::try_parse_from(["waymark", "node", "1", "--version", "2", "--history"]);
    assert!(result.is_err());
}

#[rstest]
fn changeset_subcommand_renders(#[from(db)] (_dir, db): (TempDir, String)) {
    let cli = parse(&["waymark", "--db", &db, "changeset", "100"]);
    let output = execute(&cli).expect("execute");
    assert!(output.contains("<changeset id=\"100\""));
}
