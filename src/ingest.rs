//! Graph builder: derives nodes and links from the file collection.
//!
//! Three relationships are extracted:
//!
//! - `parent`: folder to child, from `parent_id`
//! - `tag`: item to a synthetic `tag:<name>` node
//! - `link`: `[[Title]]` wiki references in content, resolved by item name
//!
//! Output is deterministic for a given input: item nodes in input order,
//! then tag nodes sorted by name; links grouped by kind in the same order.

use crate::model::{AccessLevel, GraphData, Link, LinkType, Node, NodeMetadata, NodeType};
use chrono::{DateTime, Utc};
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap, HashSet};
use std::sync::LazyLock;

/// `[[Target]]` or `[[Target|label]]`
static WIKI_LINK_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\[\[([^\[\]|]+)(?:\|[^\[\]]*)?\]\]").unwrap());

const MIN_NODE_SIZE: f64 = 8.0;
const MAX_NODE_SIZE: f64 = 40.0;

const PARENT_STRENGTH: f64 = 1.0;
const WIKI_LINK_STRENGTH: f64 = 0.8;
const TAG_STRENGTH: f64 = 0.5;

/// Prefix for synthetic tag node ids.
pub const TAG_ID_PREFIX: &str = "tag:";

/// Kind of workspace item.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FileItemType {
    #[default]
    File,
    Folder,
    Database,
}

impl From<FileItemType> for NodeType {
    fn from(kind: FileItemType) -> Self {
        match kind {
            FileItemType::File => NodeType::File,
            FileItemType::Folder => NodeType::Folder,
            FileItemType::Database => NodeType::Database,
        }
    }
}

/// A workspace item as stored by the host application.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct FileItem {
    pub id: String,
    pub name: String,
    #[serde(rename = "type")]
    pub item_type: FileItemType,
    pub content: String,
    pub tags: Vec<String>,
    pub parent_id: Option<String>,
    pub path: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub collaborators: Vec<String>,
    pub access_level: AccessLevel,
}

impl FileItem {
    pub fn new(id: impl Into<String>, name: impl Into<String>, item_type: FileItemType) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            item_type,
            ..Default::default()
        }
    }

    /// Builder: set content
    pub fn with_content(mut self, content: impl Into<String>) -> Self {
        self.content = content.into();
        self
    }

    /// Builder: set tags
    pub fn with_tags<I, S>(mut self, tags: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.tags = tags.into_iter().map(Into::into).collect();
        self
    }

    /// Builder: set parent
    pub fn with_parent(mut self, parent_id: impl Into<String>) -> Self {
        self.parent_id = Some(parent_id.into());
        self
    }

    /// Builder: set update timestamp
    pub fn with_updated_at(mut self, at: DateTime<Utc>) -> Self {
        self.updated_at = at;
        self
    }

    /// Titles referenced with `[[...]]`, in order of appearance.
    pub fn wiki_references(&self) -> Vec<&str> {
        WIKI_LINK_RE
            .captures_iter(&self.content)
            .filter_map(|c| c.get(1))
            .map(|m| m.as_str().trim())
            .filter(|t| !t.is_empty())
            .collect()
    }
}

/// Builds [`GraphData`] from file items.
#[derive(Debug, Clone)]
pub struct GraphBuilder {
    include_tags: bool,
    include_wiki_links: bool,
}

impl Default for GraphBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl GraphBuilder {
    pub fn new() -> Self {
        Self {
            include_tags: true,
            include_wiki_links: true,
        }
    }

    /// Builder: emit tag nodes and tag links
    pub fn with_tags(mut self, include: bool) -> Self {
        self.include_tags = include;
        self
    }

    /// Builder: resolve `[[...]]` references
    pub fn with_wiki_links(mut self, include: bool) -> Self {
        self.include_wiki_links = include;
        self
    }

    pub fn build(&self, items: &[FileItem]) -> GraphData {
        let mut seen_ids = HashSet::new();
        let items: Vec<&FileItem> = items
            .iter()
            .filter(|item| {
                let fresh = seen_ids.insert(item.id.as_str());
                if !fresh {
                    tracing::warn!(id = %item.id, "duplicate item id ignored");
                }
                fresh
            })
            .collect();

        let mut nodes: Vec<Node> = items.iter().map(|item| item_node(item)).collect();
        let mut links = parent_links(&items);
        if self.include_wiki_links {
            links.extend(wiki_links(&items));
        }
        if self.include_tags {
            let (tag_nodes, tag_links) = tag_graph(&items, &seen_ids);
            nodes.extend(tag_nodes);
            links.extend(tag_links);
        }

        let mut seen = HashSet::new();
        links.retain(|l| seen.insert((l.source.clone(), l.target.clone(), l.link_type)));

        let mut graph = GraphData::new(nodes, links);
        graph.derive_connections();
        tracing::debug!(
            items = items.len(),
            nodes = graph.nodes.len(),
            links = graph.links.len(),
            "graph built"
        );
        graph
    }
}

/// `clamp(8 + sqrt(len) / 2, 8, 40)`
fn node_size(content_len: usize) -> f64 {
    (MIN_NODE_SIZE + (content_len as f64).sqrt() / 2.0).clamp(MIN_NODE_SIZE, MAX_NODE_SIZE)
}

fn item_node(item: &FileItem) -> Node {
    Node::new(&item.id, &item.name, item.item_type.into())
        .with_size(node_size(item.content.chars().count()))
        .with_metadata(NodeMetadata {
            last_modified: item.updated_at,
            word_count: item.content.split_whitespace().count(),
            tags: item.tags.clone(),
            collaborators: item.collaborators.clone(),
            path: item.path.clone(),
            access_level: item.access_level,
        })
}

fn parent_links(items: &[&FileItem]) -> Vec<Link> {
    let ids: HashSet<&str> = items.iter().map(|i| i.id.as_str()).collect();
    items
        .iter()
        .filter_map(|item| {
            let parent = item.parent_id.as_deref()?;
            if parent == item.id || !ids.contains(parent) {
                return None;
            }
            Some(Link::new(parent, &item.id, LinkType::Parent).with_strength(PARENT_STRENGTH))
        })
        .collect()
}

fn wiki_links(items: &[&FileItem]) -> Vec<Link> {
    let mut by_name: HashMap<String, usize> = HashMap::new();
    for (i, item) in items.iter().enumerate() {
        // first item wins on duplicate names
        by_name.entry(item.name.trim().to_lowercase()).or_insert(i);
    }

    let mut ordered: Vec<(usize, usize)> = Vec::new();
    let mut pairs = HashSet::new();
    for (i, item) in items.iter().enumerate() {
        for title in item.wiki_references() {
            match by_name.get(&title.to_lowercase()) {
                Some(&j) if j != i => {
                    if pairs.insert((i, j)) {
                        ordered.push((i, j));
                    }
                }
                Some(_) => {}
                None => tracing::trace!(from = %item.id, title, "unresolved wiki link"),
            }
        }
    }

    ordered
        .into_iter()
        .filter_map(|(i, j)| {
            let link = Link::new(&items[i].id, &items[j].id, LinkType::Link)
                .with_strength(WIKI_LINK_STRENGTH);
            if !pairs.contains(&(j, i)) {
                Some(link)
            } else if i < j {
                Some(link.bidirectional())
            } else {
                None
            }
        })
        .collect()
}

/// Tag nodes and item -> tag links. A tag whose node id is already taken by
/// an item is skipped along with its links.
fn tag_graph(items: &[&FileItem], item_ids: &HashSet<&str>) -> (Vec<Node>, Vec<Link>) {
    let mut usage: BTreeMap<&str, (usize, DateTime<Utc>)> = BTreeMap::new();
    let mut links = Vec::new();
    let mut collided = HashSet::new();

    for item in items {
        let mut own = HashSet::new();
        for tag in item.tags.iter().map(|t| t.trim()).filter(|t| !t.is_empty()) {
            if !own.insert(tag) {
                continue;
            }
            let id = tag_node_id(tag);
            if item_ids.contains(id.as_str()) {
                if collided.insert(tag) {
                    tracing::warn!(
                        tag,
                        id = %id,
                        "tag node id collides with an item id, tag skipped"
                    );
                }
                continue;
            }
            let entry = usage.entry(tag).or_insert((0, item.updated_at));
            entry.0 += 1;
            entry.1 = entry.1.max(item.updated_at);
            links.push(
                Link::new(&item.id, id, LinkType::Tag).with_strength(TAG_STRENGTH),
            );
        }
    }

    let nodes = usage
        .into_iter()
        .map(|(tag, (count, last_modified))| {
            Node::new(tag_node_id(tag), format!("#{tag}"), NodeType::Tag)
                .with_size((MIN_NODE_SIZE + 2.0 * count as f64).min(MAX_NODE_SIZE))
                .with_last_modified(last_modified)
                .with_tags([tag])
        })
        .collect();
    (nodes, links)
}

pub fn tag_node_id(tag: &str) -> String {
    format!("{TAG_ID_PREFIX}{tag}")
}
