//! Serializers for sharing a graph outside the application.
//!
//! - JSON: nodes, links and summary metadata, optionally with positions and
//!   render styles
//! - CSV: separate node and link tables, every field quoted
//! - GEXF 1.2: for Gephi and similar tools, with `viz:position` and edge
//!   weights

use crate::error::GraphError;
use crate::model::{GraphData, Link, Node, NodeType};
use serde::{Deserialize, Serialize};
use serde_json::{json, Map, Value};
use std::collections::BTreeMap;
use std::fmt::Write;

/// What to include in a JSON export.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct ExportOptions {
    pub include_positions: bool,
    pub include_styles: bool,
    pub include_metadata: bool,
    pub pretty: bool,
}

impl Default for ExportOptions {
    fn default() -> Self {
        Self {
            include_positions: true,
            include_styles: false,
            include_metadata: true,
            pretty: true,
        }
    }
}

/// Node and link tables produced by [`to_csv`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CsvTables {
    pub nodes: String,
    pub links: String,
}

/// Fill colour used by the default theme for each node type.
pub fn node_color(node_type: NodeType) -> &'static str {
    match node_type {
        NodeType::File => "#3b82f6",
        NodeType::Folder => "#f59e0b",
        NodeType::Database => "#10b981",
        NodeType::Tag => "#8b5cf6",
    }
}

// =============================================================================
// JSON
// =============================================================================

pub fn to_json(graph: &GraphData, options: &ExportOptions) -> Result<String, GraphError> {
    let nodes: Vec<Value> = graph
        .nodes
        .iter()
        .map(|node| node_json(node, options))
        .collect();
    let links: Vec<Value> = graph
        .links
        .iter()
        .map(|link| link_json(link, options))
        .collect();

    let mut root = Map::new();
    root.insert("nodes".into(), Value::Array(nodes));
    root.insert("links".into(), Value::Array(links));
    if options.include_metadata {
        let mut by_type: BTreeMap<&str, usize> = BTreeMap::new();
        for node in &graph.nodes {
            *by_type.entry(node.node_type.as_str()).or_insert(0) += 1;
        }
        root.insert(
            "metadata".into(),
            json!({
                "nodeCount": graph.nodes.len(),
                "linkCount": graph.links.len(),
                "nodeTypes": by_type,
                "generator": concat!(env!("CARGO_PKG_NAME"), " ", env!("CARGO_PKG_VERSION")),
            }),
        );
    }

    let root = Value::Object(root);
    let text = if options.pretty {
        serde_json::to_string_pretty(&root)?
    } else {
        serde_json::to_string(&root)?
    };
    Ok(text)
}

fn node_json(node: &Node, options: &ExportOptions) -> Value {
    let mut out = Map::new();
    out.insert("id".into(), json!(node.id));
    out.insert("title".into(), json!(node.title));
    out.insert("type".into(), json!(node.node_type.as_str()));
    out.insert("size".into(), json!(node.size));
    if options.include_metadata {
        out.insert(
            "metadata".into(),
            serde_json::to_value(&node.metadata).unwrap_or(Value::Null),
        );
    }
    if options.include_positions {
        if let Some(pos) = node.position {
            out.insert("x".into(), json!(pos.x));
            out.insert("y".into(), json!(pos.y));
        }
    }
    if options.include_styles {
        out.insert(
            "style".into(),
            json!({ "color": node_color(node.node_type), "radius": node.size }),
        );
    }
    for (key, value) in [
        ("cluster", node.cluster.map(|v| json!(v))),
        ("community", node.community.map(|v| json!(v))),
        ("centrality", node.centrality.map(|v| json!(v))),
        ("betweenness", node.betweenness.map(|v| json!(v))),
        ("closeness", node.closeness.map(|v| json!(v))),
    ] {
        if let Some(value) = value {
            out.insert(key.into(), value);
        }
    }
    Value::Object(out)
}

fn link_json(link: &Link, options: &ExportOptions) -> Value {
    let mut out = json!({
        "source": link.source,
        "target": link.target,
        "type": link.link_type.as_str(),
        "strength": link.strength,
        "bidirectional": link.bidirectional,
    });
    if options.include_styles {
        out["style"] = json!({ "width": 1.0 + 2.0 * link.strength });
    }
    out
}

// =============================================================================
// CSV
// =============================================================================

pub fn to_csv(graph: &GraphData) -> Result<CsvTables, GraphError> {
    let mut nodes = String::new();
    write_row(
        &mut nodes,
        &[
            "id", "title", "type", "size", "x", "y", "cluster", "community", "centrality",
            "betweenness", "closeness", "tags", "lastModified",
        ],
    )?;
    for node in &graph.nodes {
        let (x, y) = node
            .position
            .map(|p| (p.x.to_string(), p.y.to_string()))
            .unwrap_or_default();
        write_row(
            &mut nodes,
            &[
                &node.id,
                &node.title,
                node.node_type.as_str(),
                &node.size.to_string(),
                &x,
                &y,
                &optional(node.cluster),
                &optional(node.community),
                &optional(node.centrality),
                &optional(node.betweenness),
                &optional(node.closeness),
                &node.metadata.tags.join(";"),
                &node.metadata.last_modified.to_rfc3339(),
            ],
        )?;
    }

    let mut links = String::new();
    write_row(&mut links, &["source", "target", "type", "strength", "bidirectional"])?;
    for link in &graph.links {
        write_row(
            &mut links,
            &[
                &link.source,
                &link.target,
                link.link_type.as_str(),
                &link.strength.to_string(),
                if link.bidirectional { "true" } else { "false" },
            ],
        )?;
    }

    Ok(CsvTables { nodes, links })
}

fn optional<T: ToString>(value: Option<T>) -> String {
    value.map(|v| v.to_string()).unwrap_or_default()
}

fn write_row(out: &mut String, fields: &[&str]) -> std::fmt::Result {
    for (i, field) in fields.iter().enumerate() {
        if i > 0 {
            out.push(',');
        }
        write!(out, "\"{}\"", field.replace('"', "\"\""))?;
    }
    out.push('\n');
    Ok(())
}

// =============================================================================
// GEXF
// =============================================================================

pub fn to_gexf(graph: &GraphData) -> Result<String, GraphError> {
    let mut out = String::new();
    writeln!(out, r#"<?xml version="1.0" encoding="UTF-8"?>"#)?;
    writeln!(
        out,
        r#"<gexf xmlns="http://gexf.net/1.2" xmlns:viz="http://gexf.net/1.2/viz" version="1.2">"#
    )?;
    writeln!(out, r#"  <graph mode="static" defaultedgetype="directed">"#)?;
    writeln!(out, r#"    <attributes class="node">"#)?;
    writeln!(out, r#"      <attribute id="type" title="type" type="string"/>"#)?;
    writeln!(out, r#"      <attribute id="community" title="community" type="integer"/>"#)?;
    writeln!(out, r#"    </attributes>"#)?;

    writeln!(out, "    <nodes>")?;
    for node in &graph.nodes {
        writeln!(
            out,
            r#"      <node id="{}" label="{}">"#,
            xml_escape(&node.id),
            xml_escape(&node.title)
        )?;
        writeln!(out, "        <attvalues>")?;
        writeln!(
            out,
            r#"          <attvalue for="type" value="{}"/>"#,
            node.node_type.as_str()
        )?;
        if let Some(community) = node.community {
            writeln!(out, r#"          <attvalue for="community" value="{community}"/>"#)?;
        }
        writeln!(out, "        </attvalues>")?;
        if let Some(pos) = node.position {
            writeln!(
                out,
                r#"        <viz:position x="{}" y="{}" z="0.0"/>"#,
                pos.x, pos.y
            )?;
        }
        writeln!(out, r#"        <viz:size value="{}"/>"#, node.size)?;
        writeln!(out, "      </node>")?;
    }
    writeln!(out, "    </nodes>")?;

    writeln!(out, "    <edges>")?;
    for (i, link) in graph.links.iter().enumerate() {
        let kind = if link.bidirectional {
            r#" type="undirected""#
        } else {
            ""
        };
        writeln!(
            out,
            r#"      <edge id="{i}" source="{}" target="{}" weight="{}" label="{}"{kind}/>"#,
            xml_escape(&link.source),
            xml_escape(&link.target),
            link.strength,
            link.link_type.as_str()
        )?;
    }
    writeln!(out, "    </edges>")?;
    writeln!(out, "  </graph>")?;
    writeln!(out, "</gexf>")?;
    Ok(out)
}

fn xml_escape(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&apos;"),
            _ => out.push(c),
        }
    }
    out
}
