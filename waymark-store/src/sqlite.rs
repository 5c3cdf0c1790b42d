//! Read-only [`OsmStore`] over a SQLite database.

use std::collections::HashMap;
use std::fmt;
use std::path::Path;
use std::sync::{Mutex, MutexGuard, PoisonError};

use chrono::{DateTime, Utc};
use rusqlite::{Connection, OpenFlags, params, params_from_iter};
use waymark_core::{
    COORDINATE_SCALE, Changeset, Comment, Discussion, ElementKind, Member, MemberType, Node,
    OsmStore, Relation, ScaledBbox, StoreError, VersionRef, Way,
};

use crate::error::SqliteStoreError;

/// SQLite limits bound parameters per statement to 999 by default. The
/// store chunks `IN` queries to remain below that ceiling.
const SQLITE_MAX_VARIABLE_NUMBER: usize = 999;

/// Historical lookups bind two parameters per reference.
const VERSION_PAIR_CHUNK: usize = SQLITE_MAX_VARIABLE_NUMBER / 2;

/// Read-only element store backed by a pre-built SQLite database.
///
/// The connection is shared behind a mutex; queries are short and the
/// database never changes underneath the store.
pub struct SqliteOsmStore {
    connection: Mutex<Connection>,
}

impl fmt::Debug for SqliteOsmStore {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SqliteOsmStore").finish_non_exhaustive()
    }
}

impl SqliteOsmStore {
    /// Open the database at `path` read-only.
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self, SqliteStoreError> {
        let path = path.as_ref();
        let connection = Connection::open_with_flags(path, OpenFlags::SQLITE_OPEN_READ_ONLY)
            .map_err(|source| SqliteStoreError::OpenDatabase {
                path: path.to_path_buf(),
                source,
            })?;
        log::debug!("opened read-only element database at {}", path.display());
        Ok(Self {
            connection: Mutex::new(connection),
        })
    }

    fn lock(&self) -> MutexGuard<'_, Connection> {
        // A panicked reader cannot leave a read-only connection in an
        // inconsistent state.
        self.connection.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

const fn current_table(kind: ElementKind) -> &'static str {
    match kind {
        ElementKind::Node => "current_nodes",
        ElementKind::Way => "current_ways",
        ElementKind::Relation => "current_relations",
    }
}

const fn history_table(kind: ElementKind) -> &'static str {
    match kind {
        ElementKind::Node => "nodes",
        ElementKind::Way => "ways",
        ElementKind::Relation => "relations",
    }
}

const fn history_id_column(kind: ElementKind) -> &'static str {
    match kind {
        ElementKind::Node => "node_id",
        ElementKind::Way => "way_id",
        ElementKind::Relation => "relation_id",
    }
}

fn placeholders(count: usize) -> String {
    vec!["?"; count].join(", ")
}

/// `(id = ? AND version = ?)` predicates for one chunk of references.
fn version_pair_predicate(id_column: &str, count: usize) -> String {
    vec![format!("({id_column} = ? AND version = ?)"); count].join(" OR ")
}

fn pair_params(refs: &[VersionRef]) -> Vec<i64> {
    refs.iter().flat_map(|r| [r.id, r.version]).collect()
}

#[expect(
    clippy::cast_precision_loss,
    reason = "stored coordinates are bounded to +-1.8e9, exactly representable in f64"
)]
fn degrees(fixed: i64) -> f64 {
    fixed as f64 / COORDINATE_SCALE
}

fn member_type(name: &str) -> Result<MemberType, SqliteStoreError> {
    match name {
        "node" => Ok(MemberType::Node),
        "way" => Ok(MemberType::Way),
        "relation" => Ok(MemberType::Relation),
        other => Err(SqliteStoreError::InvalidMemberType {
            found: other.to_owned(),
        }),
    }
}

fn query_limit(limit: usize) -> i64 {
    i64::try_from(limit).unwrap_or(i64::MAX)
}

/// Expression yielding the joined attribution columns, `NULL` unless the
/// owning account is public.
const ATTRIBUTION_COLUMNS: &str = "CASE WHEN u.data_public THEN u.display_name END, \
     CASE WHEN u.data_public THEN u.id END";

const ATTRIBUTION_JOIN: &str = "LEFT JOIN changesets c ON c.id = {alias}.changeset_id \
     LEFT JOIN users u ON u.id = c.user_id";

fn attribution_join(alias: &str) -> String {
    ATTRIBUTION_JOIN.replace("{alias}", alias)
}

impl SqliteOsmStore {
    fn distinct_ids(
        &self,
        query_template: &str,
        ids: &[i64],
    ) -> Result<Vec<i64>, SqliteStoreError> {
        let connection = self.lock();
        let mut found = Vec::new();
        for chunk in ids.chunks(SQLITE_MAX_VARIABLE_NUMBER) {
            let query = query_template.replace("{in}", &placeholders(chunk.len()));
            let mut statement = connection.prepare(&query)?;
            let mut rows = statement.query(params_from_iter(chunk.iter()))?;
            while let Some(row) = rows.next()? {
                found.push(row.get(0)?);
            }
        }
        found.sort_unstable();
        found.dedup();
        Ok(found)
    }

    fn load_current_nodes(&self, ids: &[i64]) -> Result<Vec<Node>, SqliteStoreError> {
        let connection = self.lock();
        let mut nodes = Vec::new();
        for chunk in ids.chunks(SQLITE_MAX_VARIABLE_NUMBER) {
            let query = format!(
                "SELECT n.id, n.latitude, n.longitude, n.visible, n.version, \
                        n.changeset_id, n.timestamp, {ATTRIBUTION_COLUMNS} \
                 FROM current_nodes n {join} \
                 WHERE n.id IN ({placeholders})",
                join = attribution_join("n"),
                placeholders = placeholders(chunk.len()),
            );
            let mut statement = connection.prepare(&query)?;
            let mut rows = statement.query(params_from_iter(chunk.iter()))?;
            while let Some(row) = rows.next()? {
                nodes.push(Node {
                    id: row.get(0)?,
                    lat: Some(degrees(row.get(1)?)),
                    lon: Some(degrees(row.get(2)?)),
                    visible: row.get(3)?,
                    version: row.get(4)?,
                    changeset: row.get(5)?,
                    timestamp: row.get::<_, DateTime<Utc>>(6)?,
                    user: row.get(7)?,
                    uid: row.get(8)?,
                    tags: Vec::new(),
                });
            }
        }
        nodes.sort_unstable_by_key(|n| n.id);

        let tags = self.load_tags(
            &connection,
            "SELECT node_id, k, v FROM current_node_tags WHERE node_id IN ({in})",
            ids,
        )?;
        for node in &mut nodes {
            if let Some(found) = tags.get(&node.id) {
                node.tags.clone_from(found);
            }
        }
        Ok(nodes)
    }

    fn load_historical_nodes(&self, refs: &[VersionRef]) -> Result<Vec<Node>, SqliteStoreError> {
        let connection = self.lock();
        let mut nodes = Vec::new();
        for chunk in refs.chunks(VERSION_PAIR_CHUNK) {
            let query = format!(
                "SELECT n.node_id, n.version, n.latitude, n.longitude, n.visible, \
                        n.changeset_id, n.timestamp, {ATTRIBUTION_COLUMNS} \
                 FROM nodes n {join} \
                 WHERE {predicate}",
                join = attribution_join("n"),
                predicate = version_pair_predicate("n.node_id", chunk.len()),
            );
            let mut statement = connection.prepare(&query)?;
            let mut rows = statement.query(params_from_iter(pair_params(chunk)))?;
            while let Some(row) = rows.next()? {
                nodes.push(Node {
                    id: row.get(0)?,
                    version: row.get(1)?,
                    lat: Some(degrees(row.get(2)?)),
                    lon: Some(degrees(row.get(3)?)),
                    visible: row.get(4)?,
                    changeset: row.get(5)?,
                    timestamp: row.get::<_, DateTime<Utc>>(6)?,
                    user: row.get(7)?,
                    uid: row.get(8)?,
                    tags: Vec::new(),
                });
            }
        }
        nodes.sort_unstable_by_key(|n| (n.id, n.version));

        let tags = self.load_versioned_tags(
            &connection,
            "SELECT node_id, version, k, v FROM node_tags WHERE {predicate}",
            "node_id",
            refs,
        )?;
        for node in &mut nodes {
            if let Some(found) = tags.get(&(node.id, node.version)) {
                node.tags.clone_from(found);
            }
        }
        Ok(nodes)
    }

    fn load_current_ways(&self, ids: &[i64]) -> Result<Vec<Way>, SqliteStoreError> {
        let connection = self.lock();
        let mut ways = Vec::new();
        for chunk in ids.chunks(SQLITE_MAX_VARIABLE_NUMBER) {
            let query = format!(
                "SELECT w.id, w.visible, w.version, w.changeset_id, w.timestamp, \
                        {ATTRIBUTION_COLUMNS} \
                 FROM current_ways w {join} \
                 WHERE w.id IN ({placeholders})",
                join = attribution_join("w"),
                placeholders = placeholders(chunk.len()),
            );
            let mut statement = connection.prepare(&query)?;
            let mut rows = statement.query(params_from_iter(chunk.iter()))?;
            while let Some(row) = rows.next()? {
                ways.push(Way {
                    id: row.get(0)?,
                    visible: row.get(1)?,
                    version: row.get(2)?,
                    changeset: row.get(3)?,
                    timestamp: row.get::<_, DateTime<Utc>>(4)?,
                    user: row.get(5)?,
                    uid: row.get(6)?,
                    nodes: Vec::new(),
                    tags: Vec::new(),
                });
            }
        }
        ways.sort_unstable_by_key(|w| w.id);

        let mut node_lists: HashMap<i64, Vec<i64>> = HashMap::new();
        for chunk in ids.chunks(SQLITE_MAX_VARIABLE_NUMBER) {
            let query = format!(
                "SELECT way_id, node_id FROM current_way_nodes \
                 WHERE way_id IN ({placeholders}) \
                 ORDER BY way_id, sequence_id",
                placeholders = placeholders(chunk.len()),
            );
            let mut statement = connection.prepare(&query)?;
            let mut rows = statement.query(params_from_iter(chunk.iter()))?;
            while let Some(row) = rows.next()? {
                let way_id: i64 = row.get(0)?;
                node_lists.entry(way_id).or_default().push(row.get(1)?);
            }
        }
        let tags = self.load_tags(
            &connection,
            "SELECT way_id, k, v FROM current_way_tags WHERE way_id IN ({in})",
            ids,
        )?;
        for way in &mut ways {
            if let Some(nodes) = node_lists.remove(&way.id) {
                way.nodes = nodes;
            }
            if let Some(found) = tags.get(&way.id) {
                way.tags.clone_from(found);
            }
        }
        Ok(ways)
    }

    fn load_historical_ways(&self, refs: &[VersionRef]) -> Result<Vec<Way>, SqliteStoreError> {
        let connection = self.lock();
        let mut ways = Vec::new();
        for chunk in refs.chunks(VERSION_PAIR_CHUNK) {
            let query = format!(
                "SELECT w.way_id, w.version, w.visible, w.changeset_id, w.timestamp, \
                        {ATTRIBUTION_COLUMNS} \
                 FROM ways w {join} \
                 WHERE {predicate}",
                join = attribution_join("w"),
                predicate = version_pair_predicate("w.way_id", chunk.len()),
            );
            let mut statement = connection.prepare(&query)?;
            let mut rows = statement.query(params_from_iter(pair_params(chunk)))?;
            while let Some(row) = rows.next()? {
                ways.push(Way {
                    id: row.get(0)?,
                    version: row.get(1)?,
                    visible: row.get(2)?,
                    changeset: row.get(3)?,
                    timestamp: row.get::<_, DateTime<Utc>>(4)?,
                    user: row.get(5)?,
                    uid: row.get(6)?,
                    nodes: Vec::new(),
                    tags: Vec::new(),
                });
            }
        }
        ways.sort_unstable_by_key(|w| (w.id, w.version));

        let mut node_lists: HashMap<(i64, i64), Vec<i64>> = HashMap::new();
        for chunk in refs.chunks(VERSION_PAIR_CHUNK) {
            let query = format!(
                "SELECT way_id, version, node_id FROM way_nodes \
                 WHERE {predicate} \
                 ORDER BY way_id, version, sequence_id",
                predicate = version_pair_predicate("way_id", chunk.len()),
            );
            let mut statement = connection.prepare(&query)?;
            let mut rows = statement.query(params_from_iter(pair_params(chunk)))?;
            while let Some(row) = rows.next()? {
                let key = (row.get(0)?, row.get(1)?);
                node_lists.entry(key).or_default().push(row.get(2)?);
            }
        }
        let tags = self.load_versioned_tags(
            &connection,
            "SELECT way_id, version, k, v FROM way_tags WHERE {predicate}",
            "way_id",
            refs,
        )?;
        for way in &mut ways {
            if let Some(nodes) = node_lists.remove(&(way.id, way.version)) {
                way.nodes = nodes;
            }
            if let Some(found) = tags.get(&(way.id, way.version)) {
                way.tags.clone_from(found);
            }
        }
        Ok(ways)
    }

    fn load_current_relations(&self, ids: &[i64]) -> Result<Vec<Relation>, SqliteStoreError> {
        let connection = self.lock();
        let mut relations = Vec::new();
        for chunk in ids.chunks(SQLITE_MAX_VARIABLE_NUMBER) {
            let query = format!(
                "SELECT r.id, r.visible, r.version, r.changeset_id, r.timestamp, \
                        {ATTRIBUTION_COLUMNS} \
                 FROM current_relations r {join} \
                 WHERE r.id IN ({placeholders})",
                join = attribution_join("r"),
                placeholders = placeholders(chunk.len()),
            );
            let mut statement = connection.prepare(&query)?;
            let mut rows = statement.query(params_from_iter(chunk.iter()))?;
            while let Some(row) = rows.next()? {
                relations.push(Relation {
                    id: row.get(0)?,
                    visible: row.get(1)?,
                    version: row.get(2)?,
                    changeset: row.get(3)?,
                    timestamp: row.get::<_, DateTime<Utc>>(4)?,
                    user: row.get(5)?,
                    uid: row.get(6)?,
                    members: Vec::new(),
                    tags: Vec::new(),
                });
            }
        }
        relations.sort_unstable_by_key(|r| r.id);

        let mut member_lists: HashMap<i64, Vec<Member>> = HashMap::new();
        for chunk in ids.chunks(SQLITE_MAX_VARIABLE_NUMBER) {
            let query = format!(
                "SELECT relation_id, member_type, member_id, member_role \
                 FROM current_relation_members \
                 WHERE relation_id IN ({placeholders}) \
                 ORDER BY relation_id, sequence_id",
                placeholders = placeholders(chunk.len()),
            );
            let mut statement = connection.prepare(&query)?;
            let mut rows = statement.query(params_from_iter(chunk.iter()))?;
            while let Some(row) = rows.next()? {
                let relation_id: i64 = row.get(0)?;
                let type_name: String = row.get(1)?;
                member_lists.entry(relation_id).or_default().push(Member {
                    member_type: member_type(&type_name)?,
                    ref_id: row.get(2)?,
                    role: row.get(3)?,
                });
            }
        }
        let tags = self.load_tags(
            &connection,
            "SELECT relation_id, k, v FROM current_relation_tags WHERE relation_id IN ({in})",
            ids,
        )?;
        for relation in &mut relations {
            if let Some(members) = member_lists.remove(&relation.id) {
                relation.members = members;
            }
            if let Some(found) = tags.get(&relation.id) {
                relation.tags.clone_from(found);
            }
        }
        Ok(relations)
    }

    fn load_historical_relations(
        &self,
        refs: &[VersionRef],
    ) -> Result<Vec<Relation>, SqliteStoreError> {
        let connection = self.lock();
        let mut relations = Vec::new();
        for chunk in refs.chunks(VERSION_PAIR_CHUNK) {
            let query = format!(
                "SELECT r.relation_id, r.version, r.visible, r.changeset_id, r.timestamp, \
                        {ATTRIBUTION_COLUMNS} \
                 FROM relations r {join} \
                 WHERE {predicate}",
                join = attribution_join("r"),
                predicate = version_pair_predicate("r.relation_id", chunk.len()),
            );
            let mut statement = connection.prepare(&query)?;
            let mut rows = statement.query(params_from_iter(pair_params(chunk)))?;
            while let Some(row) = rows.next()? {
                relations.push(Relation {
                    id: row.get(0)?,
                    version: row.get(1)?,
                    visible: row.get(2)?,
                    changeset: row.get(3)?,
                    timestamp: row.get::<_, DateTime<Utc>>(4)?,
                    user: row.get(5)?,
                    uid: row.get(6)?,
                    members: Vec::new(),
                    tags: Vec::new(),
                });
            }
        }
        relations.sort_unstable_by_key(|r| (r.id, r.version));

        let mut member_lists: HashMap<(i64, i64), Vec<Member>> = HashMap::new();
        for chunk in refs.chunks(VERSION_PAIR_CHUNK) {
            let query = format!(
                "SELECT relation_id, version, member_type, member_id, member_role \
                 FROM relation_members \
                 WHERE {predicate} \
                 ORDER BY relation_id, version, sequence_id",
                predicate = version_pair_predicate("relation_id", chunk.len()),
            );
            let mut statement = connection.prepare(&query)?;
            let mut rows = statement.query(params_from_iter(pair_params(chunk)))?;
            while let Some(row) = rows.next()? {
                let key = (row.get(0)?, row.get(1)?);
                let type_name: String = row.get(2)?;
                member_lists.entry(key).or_default().push(Member {
                    member_type: member_type(&type_name)?,
                    ref_id: row.get(3)?,
                    role: row.get(4)?,
                });
            }
        }
        let tags = self.load_versioned_tags(
            &connection,
            "SELECT relation_id, version, k, v FROM relation_tags WHERE {predicate}",
            "relation_id",
            refs,
        )?;
        for relation in &mut relations {
            if let Some(members) = member_lists.remove(&(relation.id, relation.version)) {
                relation.members = members;
            }
            if let Some(found) = tags.get(&(relation.id, relation.version)) {
                relation.tags.clone_from(found);
            }
        }
        Ok(relations)
    }

    fn load_tags(
        &self,
        connection: &Connection,
        query_template: &str,
        ids: &[i64],
    ) -> Result<HashMap<i64, Vec<waymark_core::Tag>>, SqliteStoreError> {
        let mut tags: HashMap<i64, Vec<waymark_core::Tag>> = HashMap::new();
        for chunk in ids.chunks(SQLITE_MAX_VARIABLE_NUMBER) {
            let query = query_template.replace("{in}", &placeholders(chunk.len()));
            let mut statement = connection.prepare(&query)?;
            let mut rows = statement.query(params_from_iter(chunk.iter()))?;
            while let Some(row) = rows.next()? {
                let id: i64 = row.get(0)?;
                tags.entry(id)
                    .or_default()
                    .push(waymark_core::Tag::new(
                        row.get::<_, String>(1)?,
                        row.get::<_, String>(2)?,
                    ));
            }
        }
        Ok(tags)
    }

    fn load_versioned_tags(
        &self,
        connection: &Connection,
        query_template: &str,
        id_column: &str,
        refs: &[VersionRef],
    ) -> Result<HashMap<(i64, i64), Vec<waymark_core::Tag>>, SqliteStoreError> {
        let mut tags: HashMap<(i64, i64), Vec<waymark_core::Tag>> = HashMap::new();
        for chunk in refs.chunks(VERSION_PAIR_CHUNK) {
            let query = query_template.replace(
                "{predicate}",
                &version_pair_predicate(id_column, chunk.len()),
            );
            let mut statement = connection.prepare(&query)?;
            let mut rows = statement.query(params_from_iter(pair_params(chunk)))?;
            while let Some(row) = rows.next()? {
                let key = (row.get(0)?, row.get(1)?);
                tags.entry(key)
                    .or_default()
                    .push(waymark_core::Tag::new(
                        row.get::<_, String>(2)?,
                        row.get::<_, String>(3)?,
                    ));
            }
        }
        Ok(tags)
    }

    fn load_changesets(
        &self,
        ids: &[i64],
        include_discussion: bool,
    ) -> Result<Vec<Changeset>, SqliteStoreError> {
        let connection = self.lock();
        let mut changesets = Vec::new();
        for chunk in ids.chunks(SQLITE_MAX_VARIABLE_NUMBER) {
            let query = format!(
                "SELECT c.id, c.created_at, c.closed_at, c.open, \
                        c.min_lat, c.max_lat, c.min_lon, c.max_lon, \
                        c.num_changes, c.comments_count, \
                        CASE WHEN u.data_public THEN u.display_name END, \
                        CASE WHEN u.data_public THEN u.id END \
                 FROM changesets c \
                 LEFT JOIN users u ON u.id = c.user_id \
                 WHERE c.id IN ({placeholders})",
                placeholders = placeholders(chunk.len()),
            );
            let mut statement = connection.prepare(&query)?;
            let mut rows = statement.query(params_from_iter(chunk.iter()))?;
            while let Some(row) = rows.next()? {
                changesets.push(Changeset {
                    id: row.get(0)?,
                    created_at: row.get::<_, DateTime<Utc>>(1)?,
                    closed_at: row.get::<_, DateTime<Utc>>(2)?,
                    open: row.get(3)?,
                    min_lat: degrees(row.get(4)?),
                    max_lat: degrees(row.get(5)?),
                    min_lon: degrees(row.get(6)?),
                    max_lon: degrees(row.get(7)?),
                    num_changes: row.get(8)?,
                    comments_count: row.get(9)?,
                    user: row.get(10)?,
                    uid: row.get(11)?,
                    tags: Vec::new(),
                    discussion: include_discussion.then(Discussion::default),
                });
            }
        }
        changesets.sort_unstable_by_key(|c| c.id);

        let tags = self.load_tags(
            &connection,
            "SELECT changeset_id, k, v FROM changeset_tags WHERE changeset_id IN ({in})",
            ids,
        )?;
        for changeset in &mut changesets {
            if let Some(found) = tags.get(&changeset.id) {
                changeset.tags.clone_from(found);
            }
        }

        if include_discussion {
            let mut threads: HashMap<i64, Vec<Comment>> = HashMap::new();
            for chunk in ids.chunks(SQLITE_MAX_VARIABLE_NUMBER) {
                let query = format!(
                    "SELECT cc.changeset_id, cc.author_id, u.display_name, \
                            cc.created_at, cc.body \
                     FROM changeset_comments cc \
                     JOIN users u ON u.id = cc.author_id \
                     WHERE cc.visible AND cc.changeset_id IN ({placeholders}) \
                     ORDER BY cc.changeset_id, cc.created_at",
                    placeholders = placeholders(chunk.len()),
                );
                let mut statement = connection.prepare(&query)?;
                let mut rows = statement.query(params_from_iter(chunk.iter()))?;
                while let Some(row) = rows.next()? {
                    let changeset_id: i64 = row.get(0)?;
                    threads.entry(changeset_id).or_default().push(Comment {
                        uid: row.get(1)?,
                        user: row.get(2)?,
                        timestamp: row.get::<_, DateTime<Utc>>(3)?,
                        text: row.get(4)?,
                    });
                }
            }
            for changeset in &mut changesets {
                if let Some(comments) = threads.remove(&changeset.id) {
                    changeset.discussion = Some(Discussion { comments });
                }
            }
        }
        Ok(changesets)
    }
}

impl OsmStore for SqliteOsmStore {
    fn resolve_ids(&self, kind: ElementKind, ids: &[i64]) -> Result<Vec<i64>, StoreError> {
        let template = format!("SELECT id FROM {} WHERE id IN ({{in}})", current_table(kind));
        Ok(self.distinct_ids(&template, ids)?)
    }

    fn is_visible(&self, kind: ElementKind, id: i64) -> Result<Option<bool>, StoreError> {
        let connection = self.lock();
        let query = format!("SELECT visible FROM {} WHERE id = ?", current_table(kind));
        let mut statement = connection.prepare(&query).map_err(SqliteStoreError::from)?;
        let mut rows = statement.query(params![id]).map_err(SqliteStoreError::from)?;
        match rows.next().map_err(SqliteStoreError::from)? {
            Some(row) => Ok(Some(row.get(0).map_err(SqliteStoreError::from)?)),
            None => Ok(None),
        }
    }

    fn history(&self, kind: ElementKind, id: i64) -> Result<Vec<VersionRef>, StoreError> {
        let connection = self.lock();
        let query = format!(
            "SELECT version FROM {} WHERE {} = ? ORDER BY version",
            history_table(kind),
            history_id_column(kind),
        );
        let mut statement = connection.prepare(&query).map_err(SqliteStoreError::from)?;
        let mut rows = statement.query(params![id]).map_err(SqliteStoreError::from)?;
        let mut versions = Vec::new();
        while let Some(row) = rows.next().map_err(SqliteStoreError::from)? {
            versions.push(VersionRef::new(id, row.get(0).map_err(SqliteStoreError::from)?));
        }
        Ok(versions)
    }

    fn nodes_by_ids(&self, ids: &[i64]) -> Result<Vec<Node>, StoreError> {
        Ok(self.load_current_nodes(ids)?)
    }

    fn ways_by_ids(&self, ids: &[i64]) -> Result<Vec<Way>, StoreError> {
        Ok(self.load_current_ways(ids)?)
    }

    fn relations_by_ids(&self, ids: &[i64]) -> Result<Vec<Relation>, StoreError> {
        Ok(self.load_current_relations(ids)?)
    }

    fn historical_nodes(&self, refs: &[VersionRef]) -> Result<Vec<Node>, StoreError> {
        Ok(self.load_historical_nodes(refs)?)
    }

    fn historical_ways(&self, refs: &[VersionRef]) -> Result<Vec<Way>, StoreError> {
        Ok(self.load_historical_ways(refs)?)
    }

    fn historical_relations(&self, refs: &[VersionRef]) -> Result<Vec<Relation>, StoreError> {
        Ok(self.load_historical_relations(refs)?)
    }

    fn ways_referencing_nodes(&self, node_ids: &[i64]) -> Result<Vec<i64>, StoreError> {
        Ok(self.distinct_ids(
            "SELECT DISTINCT way_id FROM current_way_nodes WHERE node_id IN ({in})",
            node_ids,
        )?)
    }

    fn nodes_referenced_by_ways(&self, way_ids: &[i64]) -> Result<Vec<i64>, StoreError> {
        Ok(self.distinct_ids(
            "SELECT DISTINCT node_id FROM current_way_nodes WHERE way_id IN ({in})",
            way_ids,
        )?)
    }

    fn relation_members(
        &self,
        kind: ElementKind,
        relation_ids: &[i64],
    ) -> Result<Vec<i64>, StoreError> {
        let template = format!(
            "SELECT DISTINCT member_id FROM current_relation_members \
             WHERE member_type = '{}' AND relation_id IN ({{in}})",
            kind.as_str(),
        );
        Ok(self.distinct_ids(&template, relation_ids)?)
    }

    fn relations_referencing(
        &self,
        kind: ElementKind,
        ids: &[i64],
    ) -> Result<Vec<i64>, StoreError> {
        let template = format!(
            "SELECT DISTINCT relation_id FROM current_relation_members \
             WHERE member_type = '{}' AND member_id IN ({{in}})",
            kind.as_str(),
        );
        Ok(self.distinct_ids(&template, ids)?)
    }

    fn node_ids_in_bbox(&self, bbox: &ScaledBbox, limit: usize) -> Result<Vec<i64>, StoreError> {
        let connection = self.lock();
        let mut statement = connection
            .prepare(
                "SELECT id FROM current_nodes \
                 WHERE visible \
                   AND latitude BETWEEN ? AND ? \
                   AND longitude BETWEEN ? AND ? \
                 ORDER BY id LIMIT ?",
            )
            .map_err(SqliteStoreError::from)?;
        let mut rows = statement
            .query(params![
                bbox.min_lat,
                bbox.max_lat,
                bbox.min_lon,
                bbox.max_lon,
                query_limit(limit),
            ])
            .map_err(SqliteStoreError::from)?;
        let mut ids = Vec::new();
        while let Some(row) = rows.next().map_err(SqliteStoreError::from)? {
            ids.push(row.get(0).map_err(SqliteStoreError::from)?);
        }
        Ok(ids)
    }

    fn resolve_changesets(&self, ids: &[i64]) -> Result<Vec<i64>, StoreError> {
        Ok(self.distinct_ids("SELECT id FROM changesets WHERE id IN ({in})", ids)?)
    }

    fn changesets_by_ids(
        &self,
        ids: &[i64],
        include_discussion: bool,
    ) -> Result<Vec<Changeset>, StoreError> {
        Ok(self.load_changesets(ids, include_discussion)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::{Dataset, User, write_database};
    use chrono::TimeZone;
    use rstest::{fixture, rstest};
    use std::path::PathBuf;
    use tempfile::TempDir;
    use waymark_core::{Bbox, Tag};

    fn ts() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2021, 6, 15, 12, 0, 0).unwrap()
    }

    fn node(id: i64, lat: f64, lon: f64, changeset: i64) -> Node {
        Node {
            id,
            lat: Some(lat),
            lon: Some(lon),
            user: None,
            uid: None,
            visible: true,
            version: 1,
            changeset,
            timestamp: ts(),
            tags: Vec::new(),
        }
    }

    fn way(id: i64, nodes: Vec<i64>, changeset: i64) -> Way {
        Way {
            id,
            visible: true,
            version: 1,
            user: None,
            uid: None,
            changeset,
            timestamp: ts(),
            nodes,
            tags: Vec::new(),
        }
    }

    fn changeset(id: i64, uid: i64) -> Changeset {
        Changeset {
            id,
            user: None,
            uid: Some(uid),
            created_at: ts(),
            closed_at: ts(),
            open: false,
            min_lat: 51.0,
            max_lat: 52.0,
            min_lon: -1.0,
            max_lon: 0.0,
            num_changes: 2,
            comments_count: 0,
            tags: Vec::new(),
            discussion: None,
        }
    }

    #[fixture]
    fn temp_db() -> (TempDir, PathBuf) {
        let dir = TempDir::new().expect("create temp dir");
        let path = dir.path().join("map.db");
        (dir, path)
    }

    fn base_dataset() -> Dataset {
        Dataset::new()
            .with_users([User::public(1, "alice"), User::private(2, "bob")])
            .with_changesets([changeset(100, 1), changeset(200, 2)])
    }

    #[rstest]
    fn opening_a_missing_database_fails(#[from(temp_db)] (_dir, path): (TempDir, PathBuf)) {
        let error = SqliteOsmStore::open(&path).expect_err("missing file should fail");
        assert!(matches!(error, SqliteStoreError::OpenDatabase { .. }));
    }

    #[rstest]
    fn resolves_ids_and_visibility(#[from(temp_db)] (_dir, path): (TempDir, PathBuf)) {
        let mut hidden = node(2, 1.0, 1.0, 100);
        hidden.visible = false;
        let dataset = base_dataset().with_nodes([node(1, 0.5, 0.5, 100), hidden]);
        write_database(&path, &dataset).expect("seed database");
        let store = SqliteOsmStore::open(&path).expect("open store");

        let ids = store
            .resolve_ids(ElementKind::Node, &[1, 2, 3])
            .expect("resolve");
        assert_eq!(ids, vec![1, 2]);
        assert_eq!(store.is_visible(ElementKind::Node, 1).expect("query"), Some(true));
        assert_eq!(store.is_visible(ElementKind::Node, 2).expect("query"), Some(false));
        assert_eq!(store.is_visible(ElementKind::Node, 3).expect("query"), None);
    }

    #[rstest]
    fn node_rows_carry_tags_and_public_attribution(
        #[from(temp_db)] (_dir, path): (TempDir, PathBuf),
    ) {
        let mut tagged = node(1, 51.5074, -0.1278, 100);
        tagged.tags = vec![Tag::new("amenity", "pub"), Tag::new("name", "The Anchor")];
        let dataset = base_dataset().with_nodes([tagged, node(2, 0.0, 0.0, 200)]);
        write_database(&path, &dataset).expect("seed database");
        let store = SqliteOsmStore::open(&path).expect("open store");

        let rows = store.nodes_by_ids(&[1, 2]).expect("load");
        assert_eq!(rows[0].lat, Some(51.5074));
        assert_eq!(rows[0].lon, Some(-0.1278));
        assert_eq!(rows[0].tags.len(), 2);
        assert_eq!(rows[0].user.as_deref(), Some("alice"));
        assert_eq!(rows[0].uid, Some(1));
        // Changeset 200 belongs to a non-public account.
        assert_eq!(rows[1].user, None);
        assert_eq!(rows[1].uid, None);
    }

    #[rstest]
    fn way_rows_preserve_node_sequence(#[from(temp_db)] (_dir, path): (TempDir, PathBuf)) {
        let dataset = base_dataset()
            .with_nodes([node(10, 0.0, 0.0, 100), node(11, 1.0, 1.0, 100)])
            .with_ways([way(3004, vec![11, 10, 11], 100)]);
        write_database(&path, &dataset).expect("seed database");
        let store = SqliteOsmStore::open(&path).expect("open store");

        let rows = store.ways_by_ids(&[3004]).expect("load");
        assert_eq!(rows[0].nodes, vec![11, 10, 11]);
    }

    #[rstest]
    fn relation_rows_preserve_member_order(#[from(temp_db)] (_dir, path): (TempDir, PathBuf)) {
        let relation = Relation {
            id: 7001,
            visible: true,
            version: 1,
            user: None,
            uid: None,
            changeset: 100,
            timestamp: ts(),
            tags: vec![Tag::new("type", "route")],
            members: vec![
                Member::new(MemberType::Way, 3004, "outer"),
                Member::new(MemberType::Node, 10, "stop"),
            ],
        };
        let dataset = base_dataset().with_relations([relation]);
        write_database(&path, &dataset).expect("seed database");
        let store = SqliteOsmStore::open(&path).expect("open store");

        let rows = store.relations_by_ids(&[7001]).expect("load");
        assert_eq!(rows[0].members.len(), 2);
        assert_eq!(rows[0].members[0].member_type, MemberType::Way);
        assert_eq!(rows[0].members[1].role, "stop");
        assert_eq!(rows[0].tags[0].k, "type");

        let member_ways = store
            .relation_members(ElementKind::Way, &[7001])
            .expect("members");
        assert_eq!(member_ways, vec![3004]);
        let parents = store
            .relations_referencing(ElementKind::Node, &[10])
            .expect("parents");
        assert_eq!(parents, vec![7001]);
    }

    #[rstest]
    fn history_and_versioned_extraction(#[from(temp_db)] (_dir, path): (TempDir, PathBuf)) {
        let mut v2 = node(5, 1.0, 1.0, 100);
        v2.version = 2;
        v2.visible = false;
        let dataset = base_dataset().with_historical_nodes([node(5, 0.5, 0.5, 100), v2]);
        write_database(&path, &dataset).expect("seed database");
        let store = SqliteOsmStore::open(&path).expect("open store");

        let versions = store.history(ElementKind::Node, 5).expect("history");
        assert_eq!(versions, vec![VersionRef::new(5, 1), VersionRef::new(5, 2)]);

        let rows = store
            .historical_nodes(&[VersionRef::new(5, 2)])
            .expect("load");
        assert_eq!(rows.len(), 1);
        assert!(!rows[0].visible);
    }

    #[rstest]
    fn bbox_query_respects_visibility_and_limit(
        #[from(temp_db)] (_dir, path): (TempDir, PathBuf),
    ) {
        let mut hidden = node(3, 0.5, 0.5, 100);
        hidden.visible = false;
        let dataset = base_dataset().with_nodes([
            node(1, 0.4, 0.4, 100),
            node(2, 0.6, 0.6, 100),
            hidden,
            node(4, 5.0, 5.0, 100),
        ]);
        write_database(&path, &dataset).expect("seed database");
        let store = SqliteOsmStore::open(&path).expect("open store");

        let bbox = Bbox::new(0.0, 0.0, 1.0, 1.0).expect("bbox").scaled();
        let ids = store.node_ids_in_bbox(&bbox, 10).expect("query");
        assert_eq!(ids, vec![1, 2]);
        let capped = store.node_ids_in_bbox(&bbox, 1).expect("query");
        assert_eq!(capped, vec![1]);
    }

    #[rstest]
    fn changesets_round_trip_with_discussion(
        #[from(temp_db)] (_dir, path): (TempDir, PathBuf),
    ) {
        let mut discussed = changeset(100, 1);
        discussed.comments_count = 1;
        discussed.discussion = Some(Discussion {
            comments: vec![Comment {
                uid: 1,
                user: "alice".to_owned(),
                timestamp: ts(),
                text: "resurveyed".to_owned(),
            }],
        });
        let dataset = Dataset::new()
            .with_users([User::public(1, "alice")])
            .with_changesets([discussed]);
        write_database(&path, &dataset).expect("seed database");
        let store = SqliteOsmStore::open(&path).expect("open store");

        let plain = store.changesets_by_ids(&[100], false).expect("load");
        assert_eq!(plain[0].min_lat, 51.0);
        assert_eq!(plain[0].user.as_deref(), Some("alice"));
        assert!(plain[0].discussion.is_none());

        let with_thread = store.changesets_by_ids(&[100], true).expect("load");
        let discussion = with_thread[0].discussion.as_ref().expect("discussion");
        assert_eq!(discussion.comments[0].text, "resurveyed");
    }
}
