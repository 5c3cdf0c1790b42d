//! End-to-end resolution against a seeded SQLite database.

use chrono::{DateTime, TimeZone, Utc};
use rstest::{fixture, rstest};
use tempfile::TempDir;
use waymark_api::{ApiError, ElementRefs, Engine};
use waymark_core::{Changeset, Member, MemberType, Node, Relation, Tag, Way};
use waymark_store::SqliteOsmStore;
use waymark_store::test_support::{Dataset, User, write_database};

fn ts() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2021, 6, 15, 12, 0, 0).unwrap()
}

fn node(id: i64, lat: f64, lon: f64) -> Node {
    Node {
        id,
        lat: Some(lat),
        lon: Some(lon),
        user: None,
        uid: None,
        visible: true,
        version: 1,
        changeset: 100,
        timestamp: ts(),
        tags: Vec::new(),
    }
}

fn way(id: i64, nodes: Vec<i64>) -> Way {
    Way {
        id,
        visible: true,
        version: 1,
        user: None,
        uid: None,
        changeset: 100,
        timestamp: ts(),
        nodes,
        tags: Vec::new(),
    }
}

fn changeset(id: i64) -> Changeset {
    Changeset {
        id,
        user: None,
        uid: Some(1),
        created_at: ts(),
        closed_at: ts(),
        open: false,
        min_lat: 0.0,
        max_lat: 1.0,
        min_lon: 0.0,
        max_lon: 1.0,
        num_changes: 5,
        comments_count: 0,
        tags: Vec::new(),
        discussion: None,
    }
}

/// A small district: a pub node, a street with one node outside the box,
/// a deleted node, a route relation over the street and a parent relation.
fn district() -> Dataset {
    let mut pub_node = node(1001, 0.5, 0.5);
    pub_node.tags = vec![Tag::new("amenity", "pub")];
    let mut razed = node(1002, 0.55, 0.55);
    razed.visible = false;
    razed.version = 2;
    let street = way(3004, vec![1001, 1003]);
    let route = Relation {
        id: 7001,
        visible: true,
        version: 1,
        user: None,
        uid: None,
        changeset: 100,
        timestamp: ts(),
        tags: vec![Tag::new("type", "route")],
        members: vec![Member::new(MemberType::Way, 3004, "street")],
    };
    let parent = Relation {
        id: 7002,
        visible: true,
        version: 1,
        user: None,
        uid: None,
        changeset: 100,
        timestamp: ts(),
        tags: Vec::new(),
        members: vec![Member::new(MemberType::Relation, 7001, "network")],
    };
    Dataset::new()
        .with_users([User::public(1, "alice")])
        .with_changesets([changeset(100)])
        .with_nodes([pub_node, razed, node(1003, 5.0, 5.0)])
        .with_ways([street])
        .with_relations([route, parent])
        .with_historical_nodes([node(1001, 0.5, 0.5), {
            let mut v1 = node(1002, 0.55, 0.55);
            v1.version = 1;
            v1
        }])
}

#[fixture]
fn engine() -> (TempDir, Engine<SqliteOsmStore>) {
    let dir = TempDir::new().expect("create temp dir");
    let path = dir.path().join("district.db");
    write_database(&path, &district()).expect("seed database");
    let store = SqliteOsmStore::open(&path).expect("open store");
    (dir, Engine::new(store))
}

#[rstest]
fn single_node_resolution(#[from(engine)] (_dir, engine): (TempDir, Engine<SqliteOsmStore>)) {
    let doc = engine.node(1001).expect("resolve node");
    assert_eq!(doc.nodes.len(), 1);
    assert_eq!(doc.nodes[0].tags[0].v, "pub");
    assert_eq!(doc.nodes[0].user.as_deref(), Some("alice"));

    assert!(matches!(engine.node(1002), Err(ApiError::Gone)));
    assert!(matches!(engine.node(9999), Err(ApiError::NotFound)));
}

#[rstest]
fn batch_completeness_over_sqlite(
    #[from(engine)] (_dir, engine): (TempDir, Engine<SqliteOsmStore>),
) {
    let refs: ElementRefs = "1001,1002v1".parse().expect("parse");
    let doc = engine.nodes(&refs).expect("batch");
    assert_eq!(doc.nodes.len(), 2);

    let refs: ElementRefs = "1001,4040".parse().expect("parse");
    assert!(matches!(engine.nodes(&refs), Err(ApiError::NotFound)));
}

#[rstest]
fn way_full_pulls_outside_nodes(
    #[from(engine)] (_dir, engine): (TempDir, Engine<SqliteOsmStore>),
) {
    let doc = engine.way_full(3004).expect("full");
    let node_ids: Vec<i64> = doc.nodes.iter().map(|n| n.id).collect();
    assert_eq!(node_ids, vec![1001, 1003]);
    assert_eq!(doc.ways[0].nodes, vec![1001, 1003]);
}

#[rstest]
fn map_closure_over_sqlite(#[from(engine)] (_dir, engine): (TempDir, Engine<SqliteOsmStore>)) {
    let bbox = "0.0,0.0,1.0,1.0".parse().expect("bbox");
    let doc = engine.map(&bbox).expect("map");

    let node_ids: Vec<i64> = doc.nodes.iter().map(|n| n.id).collect();
    // Node 1003 joins through the street; the deleted 1002 never seeds.
    assert_eq!(node_ids, vec![1001, 1003]);
    let relation_ids: Vec<i64> = doc.relations.iter().map(|r| r.id).collect();
    assert_eq!(relation_ids, vec![7001, 7002]);
}

#[rstest]
fn relation_full_over_sqlite(#[from(engine)] (_dir, engine): (TempDir, Engine<SqliteOsmStore>)) {
    let doc = engine.relation_full(7001).expect("full");
    let way_ids: Vec<i64> = doc.ways.iter().map(|w| w.id).collect();
    assert_eq!(way_ids, vec![3004]);
    let node_ids: Vec<i64> = doc.nodes.iter().map(|n| n.id).collect();
    assert_eq!(node_ids, vec![1001, 1003]);
    assert_eq!(doc.relations.len(), 1);
}

#[rstest]
fn changeset_over_sqlite(#[from(engine)] (_dir, engine): (TempDir, Engine<SqliteOsmStore>)) {
    let doc = engine.changeset(100, false).expect("changeset");
    assert_eq!(doc.changesets[0].num_changes, 5);
    assert!(matches!(engine.changeset(404, false), Err(ApiError::NotFound)));
}
