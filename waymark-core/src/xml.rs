//! Wire-format serialization of documents.
//!
//! Documents are rendered as flat XML: the `<osm>` root carries the
//! protocol metadata once, followed by nodes, ways, relations and
//! changesets in that fixed order. Optional attributes are omitted
//! entirely when absent, never emitted empty. Collection-internal order is
//! written exactly as assembled; serving never canonicalizes.

use quick_xml::Writer;
use quick_xml::events::{BytesStart, BytesText, Event};
use thiserror::Error;

use crate::changeset::Changeset;
use crate::document::Osm;
use crate::node::Node;
use crate::relation::Relation;
use crate::tag::Tags;
use crate::time::format_timestamp;
use crate::way::Way;

/// Errors raised while serializing a document.
#[derive(Debug, Error)]
pub enum XmlError {
    /// Writing an XML event failed.
    #[error("failed to write XML event")]
    Write {
        /// Source error from the XML writer.
        #[source]
        source: quick_xml::Error,
    },
    /// The serialized buffer was not valid UTF-8.
    #[error("serialized document is not valid UTF-8")]
    Utf8 {
        /// Source conversion error.
        #[source]
        source: std::string::FromUtf8Error,
    },
}

type XmlWriter = Writer<Vec<u8>>;

fn emit(writer: &mut XmlWriter, event: Event<'_>) -> Result<(), XmlError> {
    writer
        .write_event(event)
        .map_err(|source| XmlError::Write { source })
}

impl Osm {
    /// Serialize the document to its XML wire form.
    pub fn to_xml(&self) -> Result<String, XmlError> {
        let mut writer = Writer::new(Vec::new());

        let mut root = BytesStart::new("osm");
        root.push_attribute(("version", self.version.as_str()));
        root.push_attribute(("generator", self.generator.as_str()));
        root.push_attribute(("copyright", self.copyright.as_str()));
        root.push_attribute(("attribution", self.attribution.as_str()));
        root.push_attribute(("license", self.license.as_str()));
        let root_end = root.to_end().into_owned();
        emit(&mut writer, Event::Start(root))?;

        for node in &self.nodes {
            write_node(&mut writer, node)?;
        }
        for way in &self.ways {
            write_way(&mut writer, way)?;
        }
        for relation in &self.relations {
            write_relation(&mut writer, relation)?;
        }
        for changeset in &self.changesets {
            write_changeset(&mut writer, changeset)?;
        }

        emit(&mut writer, Event::End(root_end))?;
        String::from_utf8(writer.into_inner()).map_err(|source| XmlError::Utf8 { source })
    }
}

fn write_element(
    writer: &mut XmlWriter,
    elem: BytesStart<'_>,
    has_children: bool,
    children: impl FnOnce(&mut XmlWriter) -> Result<(), XmlError>,
) -> Result<(), XmlError> {
    if has_children {
        let end = elem.to_end().into_owned();
        emit(writer, Event::Start(elem))?;
        children(writer)?;
        emit(writer, Event::End(end))
    } else {
        emit(writer, Event::Empty(elem))
    }
}

fn write_tags(writer: &mut XmlWriter, tags: &Tags) -> Result<(), XmlError> {
    for tag in tags {
        let mut elem = BytesStart::new("tag");
        elem.push_attribute(("k", tag.k.as_str()));
        elem.push_attribute(("v", tag.v.as_str()));
        emit(writer, Event::Empty(elem))?;
    }
    Ok(())
}

fn write_node(writer: &mut XmlWriter, node: &Node) -> Result<(), XmlError> {
    let mut elem = BytesStart::new("node");
    elem.push_attribute(("id", node.id.to_string().as_str()));
    if let Some(lat) = node.lat {
        elem.push_attribute(("lat", lat.to_string().as_str()));
    }
    if let Some(lon) = node.lon {
        elem.push_attribute(("lon", lon.to_string().as_str()));
    }
    if let Some(user) = &node.user {
        elem.push_attribute(("user", user.as_str()));
    }
    if let Some(uid) = node.uid {
        elem.push_attribute(("uid", uid.to_string().as_str()));
    }
    elem.push_attribute(("visible", bool_attr(node.visible)));
    elem.push_attribute(("version", node.version.to_string().as_str()));
    elem.push_attribute(("changeset", node.changeset.to_string().as_str()));
    elem.push_attribute(("timestamp", format_timestamp(&node.timestamp).as_str()));

    write_element(writer, elem, !node.tags.is_empty(), |writer| {
        write_tags(writer, &node.tags)
    })
}

fn write_way(writer: &mut XmlWriter, way: &Way) -> Result<(), XmlError> {
    let mut elem = BytesStart::new("way");
    elem.push_attribute(("id", way.id.to_string().as_str()));
    elem.push_attribute(("visible", bool_attr(way.visible)));
    elem.push_attribute(("version", way.version.to_string().as_str()));
    if let Some(user) = &way.user {
        elem.push_attribute(("user", user.as_str()));
    }
    if let Some(uid) = way.uid {
        elem.push_attribute(("uid", uid.to_string().as_str()));
    }
    elem.push_attribute(("changeset", way.changeset.to_string().as_str()));
    elem.push_attribute(("timestamp", format_timestamp(&way.timestamp).as_str()));

    let has_children = !way.nodes.is_empty() || !way.tags.is_empty();
    write_element(writer, elem, has_children, |writer| {
        for node_id in &way.nodes {
            let mut nd = BytesStart::new("nd");
            nd.push_attribute(("ref", node_id.to_string().as_str()));
            emit(writer, Event::Empty(nd))?;
        }
        write_tags(writer, &way.tags)
    })
}

fn write_relation(writer: &mut XmlWriter, relation: &Relation) -> Result<(), XmlError> {
    let mut elem = BytesStart::new("relation");
    elem.push_attribute(("id", relation.id.to_string().as_str()));
    elem.push_attribute(("visible", bool_attr(relation.visible)));
    elem.push_attribute(("version", relation.version.to_string().as_str()));
    if let Some(user) = &relation.user {
        elem.push_attribute(("user", user.as_str()));
    }
    if let Some(uid) = relation.uid {
        elem.push_attribute(("uid", uid.to_string().as_str()));
    }
    elem.push_attribute(("changeset", relation.changeset.to_string().as_str()));
    elem.push_attribute(("timestamp", format_timestamp(&relation.timestamp).as_str()));

    let has_children = !relation.tags.is_empty() || !relation.members.is_empty();
    write_element(writer, elem, has_children, |writer| {
        write_tags(writer, &relation.tags)?;
        for member in &relation.members {
            let mut entry = BytesStart::new("member");
            entry.push_attribute(("type", member.member_type.as_str()));
            entry.push_attribute(("ref", member.ref_id.to_string().as_str()));
            entry.push_attribute(("role", member.role.as_str()));
            emit(writer, Event::Empty(entry))?;
        }
        Ok(())
    })
}

fn write_changeset(writer: &mut XmlWriter, changeset: &Changeset) -> Result<(), XmlError> {
    let mut elem = BytesStart::new("changeset");
    elem.push_attribute(("id", changeset.id.to_string().as_str()));
    if let Some(user) = &changeset.user {
        elem.push_attribute(("user", user.as_str()));
    }
    if let Some(uid) = changeset.uid {
        elem.push_attribute(("uid", uid.to_string().as_str()));
    }
    elem.push_attribute(("created_at", format_timestamp(&changeset.created_at).as_str()));
    elem.push_attribute(("closed_at", format_timestamp(&changeset.closed_at).as_str()));
    elem.push_attribute(("open", bool_attr(changeset.open)));
    elem.push_attribute(("num_changes", changeset.num_changes.to_string().as_str()));
    elem.push_attribute(("min_lat", changeset.min_lat.to_string().as_str()));
    elem.push_attribute(("max_lat", changeset.max_lat.to_string().as_str()));
    elem.push_attribute(("min_lon", changeset.min_lon.to_string().as_str()));
    elem.push_attribute(("max_lon", changeset.max_lon.to_string().as_str()));
    elem.push_attribute((
        "comments_count",
        changeset.comments_count.to_string().as_str(),
    ));

    let has_children = !changeset.tags.is_empty() || changeset.discussion.is_some();
    write_element(writer, elem, has_children, |writer| {
        write_tags(writer, &changeset.tags)?;
        if let Some(discussion) = &changeset.discussion {
            let discussion_elem = BytesStart::new("discussion");
            let end = discussion_elem.to_end().into_owned();
            emit(writer, Event::Start(discussion_elem))?;
            for comment in &discussion.comments {
                let mut entry = BytesStart::new("comment");
                entry.push_attribute(("uid", comment.uid.to_string().as_str()));
                entry.push_attribute(("user", comment.user.as_str()));
                entry.push_attribute(("date", format_timestamp(&comment.timestamp).as_str()));
                let comment_end = entry.to_end().into_owned();
                emit(writer, Event::Start(entry))?;
                let text = BytesStart::new("text");
                let text_end = text.to_end().into_owned();
                emit(writer, Event::Start(text))?;
                emit(writer, Event::Text(BytesText::new(&comment.text)))?;
                emit(writer, Event::End(text_end))?;
                emit(writer, Event::End(comment_end))?;
            }
            emit(writer, Event::End(end))?;
        }
        Ok(())
    })
}

const fn bool_attr(value: bool) -> &'static str {
    if value { "true" } else { "false" }
}
