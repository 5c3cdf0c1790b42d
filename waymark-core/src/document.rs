//! The response document: collections of elements plus fixed metadata.

use serde::Serialize;

use crate::changeset::Changeset;
use crate::node::Node;
use crate::relation::Relation;
use crate::way::Way;

/// Protocol version served by the API.
pub const PROTOCOL_VERSION: &str = "0.6";
/// Generator string attached to every document.
pub const GENERATOR: &str = "Waymark";
/// Copyright holder string matching the reference API.
pub const COPYRIGHT: &str = "OpenStreetMap and contributors";
/// Attribution URL matching the reference API.
pub const ATTRIBUTION: &str = "http://www.openstreetmap.org/copyright";
/// Licence URL matching the reference API.
pub const LICENSE: &str = "http://opendatacommons.org/licenses/odbl/1-0/";

/// A view of any element in a document, used for the flat element list.
///
/// Closed over the four element kinds on purpose: canonical equality and
/// the JSON element list operate over this union, never over an open
/// "anything with an id" interface.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum Object<'a> {
    /// A node entry.
    Node(&'a Node),
    /// A way entry.
    Way(&'a Way),
    /// A relation entry.
    Relation(&'a Relation),
    /// A changeset entry.
    Changeset(&'a Changeset),
}

impl Object<'_> {
    /// Identifier of the underlying element.
    ///
    /// Identifiers are only unique within a kind; two objects of different
    /// kinds may share a numeric id.
    pub const fn id(&self) -> i64 {
        match self {
            Object::Node(node) => node.id,
            Object::Way(way) => way.id,
            Object::Relation(relation) => relation.id,
            Object::Changeset(changeset) => changeset.id,
        }
    }
}

/// The top-level response container.
///
/// Populated by exactly one resolution path per request and discarded once
/// serialized; no document outlives its request.
#[derive(Debug, Clone, PartialEq)]
pub struct Osm {
    /// Protocol version, fixed at 0.6.
    pub version: String,
    /// Name of the producing software.
    pub generator: String,
    /// Copyright holder string.
    pub copyright: String,
    /// Attribution URL.
    pub attribution: String,
    /// Licence URL.
    pub license: String,
    /// Node collection, in extraction order.
    pub nodes: Vec<Node>,
    /// Way collection, in extraction order.
    pub ways: Vec<Way>,
    /// Relation collection, in extraction order.
    pub relations: Vec<Relation>,
    /// Changeset collection, in extraction order.
    pub changesets: Vec<Changeset>,
}

impl Osm {
    /// Create an empty document carrying the standard metadata.
    pub fn new() -> Self {
        Self {
            version: PROTOCOL_VERSION.to_owned(),
            generator: GENERATOR.to_owned(),
            copyright: COPYRIGHT.to_owned(),
            attribution: ATTRIBUTION.to_owned(),
            license: LICENSE.to_owned(),
            nodes: Vec::new(),
            ways: Vec::new(),
            relations: Vec::new(),
            changesets: Vec::new(),
        }
    }

    /// Flatten the document into a single element list.
    pub fn objects(&self) -> Vec<Object<'_>> {
        let mut objects =
            Vec::with_capacity(self.nodes.len() + self.ways.len() + self.relations.len() + self.changesets.len());
        objects.extend(self.nodes.iter().map(Object::Node));
        objects.extend(self.ways.iter().map(Object::Way));
        objects.extend(self.relations.iter().map(Object::Relation));
        objects.extend(self.changesets.iter().map(Object::Changeset));
        objects
    }

    /// Reorder every internal list into canonical order.
    ///
    /// This exists solely so two documents can be compared independent of
    /// extraction order; canonical order must never be served to clients,
    /// since way node order and relation member order are semantically
    /// significant.
    pub fn canonicalize(&mut self) {
        for node in &mut self.nodes {
            node.tags.sort();
        }
        for way in &mut self.ways {
            way.nodes.sort_unstable();
            way.tags.sort();
        }
        for relation in &mut self.relations {
            relation
                .members
                .sort_by(|a, b| {
                    (a.ref_id, a.member_type, &a.role).cmp(&(b.ref_id, b.member_type, &b.role))
                });
            relation.tags.sort();
        }
        for changeset in &mut self.changesets {
            changeset.tags.sort();
        }
        self.nodes.sort_by_key(|node| node.id);
        self.ways.sort_by_key(|way| way.id);
        self.relations.sort_by_key(|relation| relation.id);
        self.changesets.sort_by_key(|changeset| changeset.id);
    }

    /// Order-independent equality over the element contents.
    ///
    /// Both sides are cloned and canonicalized, then their flat element
    /// lists are compared field by field. Document metadata (generator and
    /// licence strings) is deliberately excluded so documents from two
    /// implementations can be diffed.
    pub fn canonical_eq(&self, other: &Self) -> bool {
        let mut left = self.clone();
        let mut right = other.clone();
        left.canonicalize();
        right.canonicalize();
        left.objects() == right.objects()
    }

    /// Serialize the document as an osmjson-style envelope.
    ///
    /// The envelope carries the metadata attributes once and every element
    /// in a single `elements` array with a `type` discriminator.
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        #[derive(Serialize)]
        struct Envelope<'a> {
            version: &'a str,
            generator: &'a str,
            copyright: &'a str,
            attribution: &'a str,
            license: &'a str,
            elements: Vec<Object<'a>>,
        }

        serde_json::to_string(&Envelope {
            version: &self.version,
            generator: &self.generator,
            copyright: &self.copyright,
            attribution: &self.attribution,
            license: &self.license,
            elements: self.objects(),
        })
    }
}

impl Default for Osm {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::relation::{Member, MemberType};
    use crate::tag::Tag;
    use chrono::{TimeZone, Utc};
    use rstest::{fixture, rstest};

    fn ts() -> chrono::DateTime<Utc> {
        Utc.with_ymd_and_hms(2020, 1, 1, 0, 0, 0).unwrap()
    }

    fn node(id: i64) -> Node {
        Node {
            id,
            lat: Some(1.0),
            lon: Some(2.0),
            user: None,
            uid: None,
            visible: true,
            version: 1,
            changeset: 1,
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
            changeset: 1,
            timestamp: ts(),
            nodes,
            tags: Vec::new(),
        }
    }

    fn relation(id: i64, members: Vec<Member>) -> Relation {
        Relation {
            id,
            visible: true,
            version: 1,
            user: None,
            uid: None,
            changeset: 1,
            timestamp: ts(),
            tags: Vec::new(),
            members,
        }
    }

    #[fixture]
    fn scrambled() -> Osm {
        let mut doc = Osm::new();
        doc.nodes = vec![node(12), node(10), node(11)];
        let mut tagged = way(3004, vec![12, 10, 11]);
        tagged.tags = vec![Tag::new("name", "b"), Tag::new("highway", "x")];
        doc.ways = vec![tagged];
        doc.relations = vec![relation(
            7,
            vec![
                Member::new(MemberType::Way, 3004, "outer"),
                Member::new(MemberType::Node, 10, ""),
            ],
        )];
        doc
    }

    #[rstest]
    fn canonicalize_is_noop_on_sorted_input(scrambled: Osm) {
        let mut once = scrambled.clone();
        once.canonicalize();
        let mut twice = once.clone();
        twice.canonicalize();
        assert_eq!(once, twice);
    }

    #[rstest]
    fn canonical_eq_ignores_collection_order(scrambled: Osm) {
        let mut reordered = scrambled.clone();
        reordered.nodes.reverse();
        reordered.ways[0].nodes.reverse();
        reordered.relations[0].members.reverse();
        assert!(scrambled.canonical_eq(&reordered));
    }

    #[rstest]
    fn canonical_eq_is_symmetric(scrambled: Osm) {
        let mut reordered = scrambled.clone();
        reordered.nodes.reverse();
        assert_eq!(
            scrambled.canonical_eq(&reordered),
            reordered.canonical_eq(&scrambled)
        );
    }

    #[rstest]
    fn canonical_eq_detects_content_differences(scrambled: Osm) {
        let mut changed = scrambled.clone();
        changed.nodes[0].version = 99;
        assert!(!scrambled.canonical_eq(&changed));
    }

    #[rstest]
    fn canonical_eq_does_not_mutate_operands(scrambled: Osm) {
        let reference = scrambled.clone();
        let other = Osm::new();
        let _ = scrambled.canonical_eq(&other);
        assert_eq!(scrambled, reference);
        assert_eq!(scrambled.ways[0].nodes, vec![12, 10, 11]);
    }

    #[rstest]
    fn ids_may_collide_across_kinds(scrambled: Osm) {
        let mut doc = scrambled;
        doc.ways[0].id = 10;
        let objects = doc.objects();
        let with_id_10 = objects.iter().filter(|o| o.id() == 10).count();
        assert_eq!(with_id_10, 2, "node 10 and way 10 are distinct elements");
    }

    #[rstest]
    fn json_envelope_lists_elements_with_type_tags(scrambled: Osm) {
        let json = scrambled.to_json().expect("serialize");
        let value: serde_json::Value = serde_json::from_str(&json).expect("parse back");
        assert_eq!(value["version"], "0.6");
        let elements = value["elements"].as_array().expect("elements array");
        assert_eq!(elements.len(), 5);
        assert_eq!(elements[0]["type"], "node");
        assert_eq!(elements[3]["type"], "way");
        assert_eq!(elements[4]["type"], "relation");
    }
}
