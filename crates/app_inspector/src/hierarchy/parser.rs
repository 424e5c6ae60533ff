//! Hierarchy markup to node tree

use std::collections::BTreeMap;

use super::bounds::normalize_bounds;
use crate::error::{DriverError, Result};
use crate::model::{Node, WindowSize};

/// Deepest element nesting accepted, root included
pub const MAX_DEPTH: usize = 200;

/// Parse a hierarchy payload into a [`Node`] tree.
///
/// A malformed `bounds` attribute anywhere fails the whole parse; partial
/// trees are never returned. Markup nested deeper than [`MAX_DEPTH`] is
/// rejected as a malformed payload.
pub fn parse_xml(xml: &str, size: WindowSize) -> Result<Node> {
    let doc = roxmltree::Document::parse(xml)
        .map_err(|e| DriverError::MalformedPayload(format!("invalid hierarchy xml: {}", e)))?;

    let mut path = vec![0];
    parse_element(doc.root_element(), size, &mut path)
}

fn parse_element(
    element: roxmltree::Node<'_, '_>,
    size: WindowSize,
    path: &mut Vec<usize>,
) -> Result<Node> {
    if path.len() > MAX_DEPTH {
        return Err(DriverError::MalformedPayload(format!(
            "hierarchy nested deeper than {} elements",
            MAX_DEPTH
        )));
    }

    let tag = element.tag_name().name();
    // uiautomator emits <node class="..."/>, appium emits the class as the tag
    let name = if tag == "node" {
        element.attribute("class").unwrap_or("node")
    } else {
        tag
    };

    let mut bounds = None;
    let mut properties = BTreeMap::new();
    for attr in element.attributes() {
        if attr.name() == "bounds" {
            bounds = Some(normalize_bounds(attr.value(), size)?);
        } else {
            properties.insert(attr.name().to_string(), attr.value().to_string());
        }
    }

    let mut children = Vec::new();
    for (index, child) in element.children().filter(|n| n.is_element()).enumerate() {
        path.push(index);
        let parsed = parse_element(child, size, path);
        path.pop();
        children.push(parsed?);
    }

    Ok(Node {
        key: path
            .iter()
            .map(|i| i.to_string())
            .collect::<Vec<_>>()
            .join("-"),
        name: name.to_string(),
        bounds,
        properties,
        children,
    })
}
