//! Table layout served by [`crate::SqliteOsmStore`].
//!
//! Coordinates are persisted as fixed-point integers scaled by
//! [`waymark_core::COORDINATE_SCALE`]; timestamps as RFC 3339 text in
//! UTC. Historical tables hold every version of an element, the latest
//! included, keyed by `(id, version)`. User attribution hangs off the
//! `changesets` table: an element row names its changeset, the changeset
//! names its user, and the user row records whether the account is
//! publicly attributable.

/// Statements creating every table the store reads.
pub const SCHEMA: &str = "
CREATE TABLE users (
    id           INTEGER PRIMARY KEY,
    display_name TEXT NOT NULL,
    data_public  INTEGER NOT NULL DEFAULT 0
);

CREATE TABLE changesets (
    id             INTEGER PRIMARY KEY,
    user_id        INTEGER NOT NULL REFERENCES users (id),
    created_at     TEXT NOT NULL,
    closed_at      TEXT NOT NULL,
    open           INTEGER NOT NULL,
    min_lat        INTEGER NOT NULL,
    max_lat        INTEGER NOT NULL,
    min_lon        INTEGER NOT NULL,
    max_lon        INTEGER NOT NULL,
    num_changes    INTEGER NOT NULL DEFAULT 0,
    comments_count INTEGER NOT NULL DEFAULT 0
);

CREATE TABLE changeset_tags (
    changeset_id INTEGER NOT NULL REFERENCES changesets (id),
    k            TEXT NOT NULL,
    v            TEXT NOT NULL
);

CREATE TABLE changeset_comments (
    changeset_id INTEGER NOT NULL REFERENCES changesets (id),
    author_id    INTEGER NOT NULL REFERENCES users (id),
    body         TEXT NOT NULL,
    created_at   TEXT NOT NULL,
    visible      INTEGER NOT NULL DEFAULT 1
);

CREATE TABLE current_nodes (
    id           INTEGER PRIMARY KEY,
    latitude     INTEGER NOT NULL,
    longitude    INTEGER NOT NULL,
    changeset_id INTEGER NOT NULL REFERENCES changesets (id),
    visible      INTEGER NOT NULL,
    timestamp    TEXT NOT NULL,
    version      INTEGER NOT NULL
);

CREATE TABLE current_node_tags (
    node_id INTEGER NOT NULL REFERENCES current_nodes (id),
    k       TEXT NOT NULL,
    v       TEXT NOT NULL
);

CREATE TABLE nodes (
    node_id      INTEGER NOT NULL,
    version      INTEGER NOT NULL,
    latitude     INTEGER NOT NULL,
    longitude    INTEGER NOT NULL,
    changeset_id INTEGER NOT NULL REFERENCES changesets (id),
    visible      INTEGER NOT NULL,
    timestamp    TEXT NOT NULL,
    PRIMARY KEY (node_id, version)
);

CREATE TABLE node_tags (
    node_id INTEGER NOT NULL,
    version INTEGER NOT NULL,
    k       TEXT NOT NULL,
    v       TEXT NOT NULL
);

CREATE TABLE current_ways (
    id           INTEGER PRIMARY KEY,
    changeset_id INTEGER NOT NULL REFERENCES changesets (id),
    visible      INTEGER NOT NULL,
    timestamp    TEXT NOT NULL,
    version      INTEGER NOT NULL
);

CREATE TABLE current_way_nodes (
    way_id      INTEGER NOT NULL REFERENCES current_ways (id),
    node_id     INTEGER NOT NULL,
    sequence_id INTEGER NOT NULL,
    PRIMARY KEY (way_id, sequence_id)
);

CREATE TABLE current_way_tags (
    way_id INTEGER NOT NULL REFERENCES current_ways (id),
    k      TEXT NOT NULL,
    v      TEXT NOT NULL
);

CREATE TABLE ways (
    way_id       INTEGER NOT NULL,
    version      INTEGER NOT NULL,
    changeset_id INTEGER NOT NULL REFERENCES changesets (id),
    visible      INTEGER NOT NULL,
    timestamp    TEXT NOT NULL,
    PRIMARY KEY (way_id, version)
);

CREATE TABLE way_nodes (
    way_id      INTEGER NOT NULL,
    version     INTEGER NOT NULL,
    node_id     INTEGER NOT NULL,
    sequence_id INTEGER NOT NULL,
    PRIMARY KEY (way_id, version, sequence_id)
);

CREATE TABLE way_tags (
    way_id  INTEGER NOT NULL,
    version INTEGER NOT NULL,
    k       TEXT NOT NULL,
    v       TEXT NOT NULL
);

CREATE TABLE current_relations (
    id           INTEGER PRIMARY KEY,
    changeset_id INTEGER NOT NULL REFERENCES changesets (id),
    visible      INTEGER NOT NULL,
    timestamp    TEXT NOT NULL,
    version      INTEGER NOT NULL
);

CREATE TABLE current_relation_members (
    relation_id INTEGER NOT NULL REFERENCES current_relations (id),
    member_type TEXT NOT NULL,
    member_id   INTEGER NOT NULL,
    member_role TEXT NOT NULL DEFAULT '',
    sequence_id INTEGER NOT NULL,
    PRIMARY KEY (relation_id, sequence_id)
);

CREATE TABLE current_relation_tags (
    relation_id INTEGER NOT NULL REFERENCES current_relations (id),
    k           TEXT NOT NULL,
    v           TEXT NOT NULL
);

CREATE TABLE relations (
    relation_id  INTEGER NOT NULL,
    version      INTEGER NOT NULL,
    changeset_id INTEGER NOT NULL REFERENCES changesets (id),
    visible      INTEGER NOT NULL,
    timestamp    TEXT NOT NULL,
    PRIMARY KEY (relation_id, version)
);

CREATE TABLE relation_members (
    relation_id INTEGER NOT NULL,
    version     INTEGER NOT NULL,
    member_type TEXT NOT NULL,
    member_id   INTEGER NOT NULL,
    member_role TEXT NOT NULL DEFAULT '',
    sequence_id INTEGER NOT NULL,
    PRIMARY KEY (relation_id, version, sequence_id)
);

CREATE TABLE relation_tags (
    relation_id INTEGER NOT NULL,
    version     INTEGER NOT NULL,
    k           TEXT NOT NULL,
    v           TEXT NOT NULL
);

CREATE INDEX idx_current_way_nodes_node ON current_way_nodes (node_id);
CREATE INDEX idx_current_relation_members_ref
    ON current_relation_members (member_type, member_id);
CREATE INDEX idx_current_nodes_coords ON current_nodes (latitude, longitude);
";

/// Create every table and index in an open connection.
pub fn apply(connection: &rusqlite::Connection) -> Result<(), rusqlite::Error> {
    connection.execute_batch(SCHEMA)
}
