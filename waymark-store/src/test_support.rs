//! Seeding helpers used by store and engine tests.
//!
//! [`write_database`] lays a [`Dataset`] out in a fresh database following
//! [`crate::schema`], so tests can exercise the read-only store against
//! realistic fixtures.

use std::path::Path;

use rusqlite::{Connection, params};
use waymark_core::{COORDINATE_SCALE, Changeset, Node, Relation, Way, time};

use crate::schema;

/// One user account row.
#[derive(Debug, Clone)]
pub struct User {
    /// Account identifier.
    pub id: i64,
    /// Display name.
    pub name: String,
    /// Whether edits attribute publicly to this account.
    pub data_public: bool,
}

impl User {
    /// Build a publicly attributable account.
    pub fn public(id: i64, name: &str) -> Self {
        Self {
            id,
            name: name.to_owned(),
            data_public: true,
        }
    }

    /// Build an account that has opted out of public attribution.
    pub fn private(id: i64, name: &str) -> Self {
        Self {
            id,
            name: name.to_owned(),
            data_public: false,
        }
    }
}

/// Everything one test database holds.
///
/// Element rows reference changesets by id and changesets reference users,
/// so a coherent dataset seeds all three. The `user`/`uid` fields of
/// seeded element values are ignored; attribution is derived through the
/// changeset join exactly as in production data.
#[derive(Debug, Default)]
pub struct Dataset {
    /// User accounts.
    pub users: Vec<User>,
    /// Changeset rows, with any attached discussion seeded as comments.
    pub changesets: Vec<Changeset>,
    /// Current node rows.
    pub nodes: Vec<Node>,
    /// Current way rows.
    pub ways: Vec<Way>,
    /// Current relation rows.
    pub relations: Vec<Relation>,
    /// Historical node snapshots.
    pub historical_nodes: Vec<Node>,
    /// Historical way snapshots.
    pub historical_ways: Vec<Way>,
    /// Historical relation snapshots.
    pub historical_relations: Vec<Relation>,
}

impl Dataset {
    /// Create an empty dataset.
    pub fn new() -> Self {
        Self::default()
    }

    /// Add user accounts.
    #[must_use]
    pub fn with_users(mut self, users: impl IntoIterator<Item = User>) -> Self {
        self.users.extend(users);
        self
    }

    /// Add changeset rows.
    #[must_use]
    pub fn with_changesets(mut self, changesets: impl IntoIterator<Item = Changeset>) -> Self {
        self.changesets.extend(changesets);
        self
    }

    /// Add current node rows.
    #[must_use]
    pub fn with_nodes(mut self, nodes: impl IntoIterator<Item = Node>) -> Self {
        self.nodes.extend(nodes);
        self
    }

    /// Add current way rows.
    #[must_use]
    pub fn with_ways(mut self, ways: impl IntoIterator<Item = Way>) -> Self {
        self.ways.extend(ways);
        self
    }

    /// Add current relation rows.
    #[must_use]
    pub fn with_relations(mut self, relations: impl IntoIterator<Item = Relation>) -> Self {
        self.relations.extend(relations);
        self
    }

    /// Add historical node snapshots.
    #[must_use]
    pub fn with_historical_nodes(mut self, nodes: impl IntoIterator<Item = Node>) -> Self {
        self.historical_nodes.extend(nodes);
        self
    }

    /// Add historical way snapshots.
    #[must_use]
    pub fn with_historical_ways(mut self, ways: impl IntoIterator<Item = Way>) -> Self {
        self.historical_ways.extend(ways);
        self
    }

    /// Add historical relation snapshots.
    #[must_use]
    pub fn with_historical_relations(
        mut self,
        relations: impl IntoIterator<Item = Relation>,
    ) -> Self {
        self.historical_relations.extend(relations);
        self
    }
}

/// Create a database at `path` holding `dataset`.
pub fn write_database(path: &Path, dataset: &Dataset) -> Result<(), rusqlite::Error> {
    let connection = Connection::open(path)?;
    schema::apply(&connection)?;

    for user in &dataset.users {
        connection.execute(
            "INSERT INTO users (id, display_name, data_public) VALUES (?, ?, ?)",
            params![user.id, user.name, user.data_public],
        )?;
    }
    for changeset in &dataset.changesets {
        insert_changeset(&connection, changeset)?;
    }
    for node in &dataset.nodes {
        connection.execute(
            "INSERT INTO current_nodes \
             (id, latitude, longitude, changeset_id, visible, timestamp, version) \
             VALUES (?, ?, ?, ?, ?, ?, ?)",
            params![
                node.id,
                scale(node.lat.unwrap_or(0.0)),
                scale(node.lon.unwrap_or(0.0)),
                node.changeset,
                node.visible,
                time::format_timestamp(&node.timestamp),
                node.version,
            ],
        )?;
        insert_tags(&connection, "current_node_tags", "node_id", node.id, &node.tags)?;
    }
    for node in &dataset.historical_nodes {
        connection.execute(
            "INSERT INTO nodes \
             (node_id, version, latitude, longitude, changeset_id, visible, timestamp) \
             VALUES (?, ?, ?, ?, ?, ?, ?)",
            params![
                node.id,
                node.version,
                scale(node.lat.unwrap_or(0.0)),
                scale(node.lon.unwrap_or(0.0)),
                node.changeset,
                node.visible,
                time::format_timestamp(&node.timestamp),
            ],
        )?;
        for tag in &node.tags {
            connection.execute(
                "INSERT INTO node_tags (node_id, version, k, v) VALUES (?, ?, ?, ?)",
                params![node.id, node.version, tag.k, tag.v],
            )?;
        }
    }
    for way in &dataset.ways {
        connection.execute(
            "INSERT INTO current_ways (id, changeset_id, visible, timestamp, version) \
             VALUES (?, ?, ?, ?, ?)",
            params![
                way.id,
                way.changeset,
                way.visible,
                time::format_timestamp(&way.timestamp),
                way.version,
            ],
        )?;
        for (sequence, node_id) in way.nodes.iter().enumerate() {
            connection.execute(
                "INSERT INTO current_way_nodes (way_id, node_id, sequence_id) \
                 VALUES (?, ?, ?)",
                params![way.id, node_id, sequence as i64],
            )?;
        }
        insert_tags(&connection, "current_way_tags", "way_id", way.id, &way.tags)?;
    }
    for way in &dataset.historical_ways {
        connection.execute(
            "INSERT INTO ways (way_id, version, changeset_id, visible, timestamp) \
             VALUES (?, ?, ?, ?, ?)",
            params![
                way.id,
                way.version,
                way.changeset,
                way.visible,
                time::format_timestamp(&way.timestamp),
            ],
        )?;
        for (sequence, node_id) in way.nodes.iter().enumerate() {
            connection.execute(
                "INSERT INTO way_nodes (way_id, version, node_id, sequence_id) \
                 VALUES (?, ?, ?, ?)",
                params![way.id, way.version, node_id, sequence as i64],
            )?;
        }
        for tag in &way.tags {
            connection.execute(
                "INSERT INTO way_tags (way_id, version, k, v) VALUES (?, ?, ?, ?)",
                params![way.id, way.version, tag.k, tag.v],
            )?;
        }
    }
    for relation in &dataset.relations {
        connection.execute(
            "INSERT INTO current_relations (id, changeset_id, visible, timestamp, version) \
             VALUES (?, ?, ?, ?, ?)",
            params![
                relation.id,
                relation.changeset,
                relation.visible,
                time::format_timestamp(&relation.timestamp),
                relation.version,
            ],
        )?;
        for (sequence, member) in relation.members.iter().enumerate() {
            connection.execute(
                "INSERT INTO current_relation_members \
                 (relation_id, member_type, member_id, member_role, sequence_id) \
                 VALUES (?, ?, ?, ?, ?)",
                params![
                    relation.id,
                    member.member_type.as_str(),
                    member.ref_id,
                    member.role,
                    sequence as i64,
                ],
            )?;
        }
        insert_tags(
            &connection,
            "current_relation_tags",
            "relation_id",
            relation.id,
            &relation.tags,
        )?;
    }
    for relation in &dataset.historical_relations {
        connection.execute(
            "INSERT INTO relations (relation_id, version, changeset_id, visible, timestamp) \
             VALUES (?, ?, ?, ?, ?)",
            params![
                relation.id,
                relation.version,
                relation.changeset,
                relation.visible,
                time::format_timestamp(&relation.timestamp),
            ],
        )?;
        for (sequence, member) in relation.members.iter().enumerate() {
            connection.execute(
                "INSERT INTO relation_members \
                 (relation_id, version, member_type, member_id, member_role, sequence_id) \
                 VALUES (?, ?, ?, ?, ?, ?)",
                params![
                    relation.id,
                    relation.version,
                    member.member_type.as_str(),
                    member.ref_id,
                    member.role,
                    sequence as i64,
                ],
            )?;
        }
        for tag in &relation.tags {
            connection.execute(
                "INSERT INTO relation_tags (relation_id, version, k, v) VALUES (?, ?, ?, ?)",
                params![relation.id, relation.version, tag.k, tag.v],
            )?;
        }
    }
    Ok(())
}

fn insert_changeset(connection: &Connection, changeset: &Changeset) -> Result<(), rusqlite::Error> {
    connection.execute(
        "INSERT INTO changesets \
         (id, user_id, created_at, closed_at, open, min_lat, max_lat, min_lon, max_lon, \
          num_changes, comments_count) \
         VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)",
        params![
            changeset.id,
            changeset.uid.unwrap_or(0),
            time::format_timestamp(&changeset.created_at),
            time::format_timestamp(&changeset.closed_at),
            changeset.open,
            scale(changeset.min_lat),
            scale(changeset.max_lat),
            scale(changeset.min_lon),
            scale(changeset.max_lon),
            changeset.num_changes,
            changeset.comments_count,
        ],
    )?;
    for tag in &changeset.tags {
        connection.execute(
            "INSERT INTO changeset_tags (changeset_id, k, v) VALUES (?, ?, ?)",
            params![changeset.id, tag.k, tag.v],
        )?;
    }
    if let Some(discussion) = &changeset.discussion {
        for comment in &discussion.comments {
            connection.execute(
                "INSERT INTO changeset_comments \
                 (changeset_id, author_id, body, created_at, visible) \
                 VALUES (?, ?, ?, ?, 1)",
                params![
                    changeset.id,
                    comment.uid,
                    comment.text,
                    time::format_timestamp(&comment.timestamp),
                ],
            )?;
        }
    }
    Ok(())
}

fn insert_tags(
    connection: &Connection,
    table: &str,
    id_column: &str,
    id: i64,
    tags: &[waymark_core::Tag],
) -> Result<(), rusqlite::Error> {
    for tag in tags {
        let query = format!("INSERT INTO {table} ({id_column}, k, v) VALUES (?, ?, ?)");
        connection.execute(&query, params![id, tag.k, tag.v])?;
    }
    Ok(())
}

#[expect(
    clippy::cast_possible_truncation,
    reason = "seed coordinates are bounded to +-180 degrees"
)]
fn scale(degrees: f64) -> i64 {
    (degrees * COORDINATE_SCALE).round() as i64
}
