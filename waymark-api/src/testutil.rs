//! Shared element constructors for engine unit tests.

use chrono::{DateTime, TimeZone, Utc};
use waymark_core::{Changeset, Member, MemberType, Node, Relation, Way};

pub fn ts() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2021, 6, 15, 12, 0, 0).unwrap()
}

pub fn node(id: i64, version: i64) -> Node {
    Node {
        id,
        lat: Some(51.5074),
        lon: Some(-0.1278),
        user: Some("mapper".to_owned()),
        uid: Some(42),
        visible: true,
        version,
        changeset: 9000,
        timestamp: ts(),
        tags: Vec::new(),
    }
}

pub fn tombstone_node(id: i64, version: i64) -> Node {
    Node {
        visible: false,
        ..node(id, version)
    }
}

pub fn way(id: i64, nodes: Vec<i64>) -> Way {
    Way {
        id,
        user: Some("mapper".to_owned()),
        uid: Some(42),
        visible: true,
        version: 1,
        changeset: 9000,
        timestamp: ts(),
        tags: Vec::new(),
        nodes,
    }
}

pub fn tombstone_way(id: i64) -> Way {
    Way {
        visible: false,
        ..way(id, Vec::new())
    }
}

pub fn relation(id: i64, members: Vec<Member>) -> Relation {
    Relation {
        id,
        user: Some("mapper".to_owned()),
        uid: Some(42),
        visible: true,
        version: 1,
        changeset: 9000,
        timestamp: ts(),
        tags: Vec::new(),
        members,
    }
}

pub fn member(member_type: MemberType, ref_id: i64, role: &str) -> Member {
    Member::new(member_type, ref_id, role)
}

pub fn changeset(id: i64) -> Changeset {
    Changeset {
        id,
        user: Some("mapper".to_owned()),
        uid: Some(42),
        created_at: ts(),
        closed_at: ts(),
        open: false,
        min_lat: 51.0,
        max_lat: 52.0,
        min_lon: -1.0,
        max_lon: 0.0,
        num_changes: 3,
        comments_count: 0,
        tags: Vec::new(),
        discussion: None,
    }
}
