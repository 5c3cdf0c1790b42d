//! Command-line front end for the Waymark resolution engine.
//!
//! Each subcommand maps onto one engine operation and prints the resolved
//! document to standard output, as XML by default or as JSON with
//! `--json`. The database path comes from `--db` or the `WAYMARK_DB`
//! environment variable.

#![forbid(unsafe_code)]

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};
use thiserror::Error;
use waymark_api::{ApiError, ElementRefs, Engine, RefListError};
use waymark_core::xml::XmlError;
use waymark_core::{Bbox, BboxError, Osm, OsmStore};
use waymark_store::{SqliteOsmStore, SqliteStoreError};

/// Run the CLI with the current process arguments.
pub fn run() -> Result<String, CliError> {
    let cli = Cli::try_parse()?;
    execute(&cli)
}

/// Resolve one parsed invocation to its rendered document.
fn execute(cli: &Cli) -> Result<String, CliError> {
    let store = SqliteOsmStore::open(&cli.db)?;
    let engine = Engine::new(store);
    let doc = dispatch(&engine, &cli.command)?;
    log::debug!(
        "resolved {} nodes, {} ways, {} relations, {} changesets",
        doc.nodes.len(),
        doc.ways.len(),
        doc.relations.len(),
        doc.changesets.len()
    );
    render(&doc, cli.json)
}

fn dispatch<S: OsmStore>(engine: &Engine<S>, command: &Command) -> Result<Osm, CliError> {
    match command {
        Command::Node { id, select } => match select.parts() {
            Selection::Current => Ok(engine.node(*id)?),
            Selection::Version(version) => Ok(engine.node_version(*id, version)?),
            Selection::History => Ok(engine.node_history(*id)?),
        },
        Command::NodeWays { id } => Ok(engine.node_ways(*id)?),
        Command::Way { id, select, full } => {
            if *full {
                return Ok(engine.way_full(*id)?);
            }
            match select.parts() {
                Selection::Current => Ok(engine.way(*id)?),
                Selection::Version(version) => Ok(engine.way_version(*id, version)?),
                Selection::History => Ok(engine.way_history(*id)?),
            }
        }
        Command::Relation { id, select, full } => {
            if *full {
                return Ok(engine.relation_full(*id)?);
            }
            match select.parts() {
                Selection::Current => Ok(engine.relation(*id)?),
                Selection::Version(version) => Ok(engine.relation_version(*id, version)?),
                Selection::History => Ok(engine.relation_history(*id)?),
            }
        }
        Command::Nodes { refs } => Ok(engine.nodes(&refs.parse::<ElementRefs>()?)?),
        Command::Ways { refs } => Ok(engine.ways(&refs.parse::<ElementRefs>()?)?),
        Command::Relations { refs } => Ok(engine.relations(&refs.parse::<ElementRefs>()?)?),
        Command::Map { bbox } => Ok(engine.map(&bbox.parse::<Bbox>()?)?),
        Command::Changeset { id, discussion } => Ok(engine.changeset(*id, *discussion)?),
    }
}

fn render(doc: &Osm, json: bool) -> Result<String, CliError> {
    if json {
        Ok(doc.to_json()?)
    } else {
        Ok(doc.to_xml()?)
    }
}

#[derive(Debug, Parser)]
#[command(
    name = "waymark",
    about = "Query a Waymark element database from the command line",
    version
)]
struct Cli {
    /// Path to the element database.
    #[arg(long, env = "WAYMARK_DB", value_name = "path", global = true, default_value = "waymark.db")]
    db: PathBuf,
    /// Print JSON instead of XML.
    #[arg(long, global = true)]
    json: bool,
    #[command(subcommand)]
    command: Command,
}

/// Version/history selectors shared by the single-element subcommands.
#[derive(Debug, Args)]
struct Select {
    /// Fetch one specific version instead of the current one.
    #[arg(long, value_name = "n", conflicts_with = "history")]
    version: Option<i64>,
    /// Fetch every version of the element.
    #[arg(long)]
    history: bool,
}

enum Selection {
    Current,
    Version(i64),
    History,
}

impl Select {
    fn parts(&self) -> Selection {
        if self.history {
            Selection::History
        } else if let Some(version) = self.version {
            Selection::Version(version)
        } else {
            Selection::Current
        }
    }
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Fetch a node.
    Node {
        /// Node identifier.
        id: i64,
        #[command(flatten)]
        select: Select,
    },
    /// Fetch the visible ways referencing a node.
    NodeWays {
        /// Node identifier.
        id: i64,
    },
    /// Fetch a way, optionally with every node it references.
    Way {
        /// Way identifier.
        id: i64,
        #[command(flatten)]
        select: Select,
        /// Include the nodes the way references.
        #[arg(long, conflicts_with_all = ["version", "history"])]
        full: bool,
    },
    /// Fetch a relation, optionally with its members expanded one hop.
    Relation {
        /// Relation identifier.
        id: i64,
        #[command(flatten)]
        select: Select,
        /// Include members, member-way nodes and member relations.
        #[arg(long, conflicts_with_all = ["version", "history"])]
        full: bool,
    },
    /// Fetch several nodes by a comma-separated reference list.
    Nodes {
        /// References such as `1001,1002,1005v1`.
        refs: String,
    },
    /// Fetch several ways by a comma-separated reference list.
    Ways {
        /// References such as `3004,3005v2`.
        refs: String,
    },
    /// Fetch several relations by a comma-separated reference list.
    Relations {
        /// References such as `7001,7002v1`.
        refs: String,
    },
    /// Fetch everything relevant to a bounding box.
    Map {
        /// Bounds as `min_lat,min_lon,max_lat,max_lon`.
        bbox: String,
    },
    /// Fetch changeset metadata.
    Changeset {
        /// Changeset identifier.
        id: i64,
        /// Include the discussion thread.
        #[arg(long)]
        discussion: bool,
    },
}

/// Errors emitted by the Waymark CLI.
#[derive(Debug, Error)]
pub enum CliError {
    /// Provided arguments failed Clap validation.
    #[error(transparent)]
    ArgumentParsing(#[from] clap::Error),
    /// The element reference list did not parse.
    #[error(transparent)]
    InvalidRefs(#[from] RefListError),
    /// The bounding box did not parse or validate.
    #[error(transparent)]
    InvalidBbox(#[from] BboxError),
    /// The element database could not be opened.
    #[error(transparent)]
    Store(#[from] SqliteStoreError),
    /// The request resolved to a domain failure or a backend fault.
    #[error(transparent)]
    Api(#[from] ApiError),
    /// The resolved document failed to serialise as XML.
    #[error(transparent)]
    Xml(#[from] XmlError),
    /// The resolved document failed to serialise as JSON.
    #[error("failed to encode document as JSON: {0}")]
    Json(#[from] serde_json::Error),
}

#[cfg(test)]
mod tests;
