//! Data types shared by the driver, the registry and the REST facade

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::error::{DriverError, Result};

/// Pixel dimensions of the active display, captured once per dump
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct WindowSize {
    pub width: u32,
    pub height: u32,
}

impl WindowSize {
    /// Create a window size, rejecting zero-sized displays
    pub fn new(width: u32, height: u32) -> Result<Self> {
        let size = Self { width, height };
        size.validate()?;
        Ok(size)
    }

    pub fn validate(&self) -> Result<()> {
        if self.width == 0 || self.height == 0 {
            return Err(DriverError::InvalidWindowSize {
                width: self.width,
                height: self.height,
            });
        }
        Ok(())
    }
}

/// Fractional `(left, top, right, bottom)` rectangle, each in `[0, 1]`
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Bounds(pub f64, pub f64, pub f64, pub f64);

/// One element of a parsed UI hierarchy
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Node {
    /// Dash-joined sibling indices from the root, e.g. `0-2-1`
    pub key: String,
    pub name: String,
    /// Absent when the source element carries no geometry
    pub bounds: Option<Bounds>,
    pub properties: BTreeMap<String, String>,
    pub children: Vec<Node>,
}

impl Node {
    /// Total number of nodes in this subtree, including `self`
    pub fn count(&self) -> usize {
        1 + self.children.iter().map(Node::count).sum::<usize>()
    }

    /// Depth-first, document-order iterator over this subtree
    pub fn iter(&self) -> NodeIter<'_> {
        NodeIter { stack: vec![self] }
    }

    pub fn find_by_key(&self, key: &str) -> Option<&Node> {
        self.iter().find(|node| node.key == key)
    }
}

pub struct NodeIter<'a> {
    stack: Vec<&'a Node>,
}

impl<'a> Iterator for NodeIter<'a> {
    type Item = &'a Node;

    fn next(&mut self) -> Option<Self::Item> {
        let node = self.stack.pop()?;
        self.stack.extend(node.children.iter().rev());
        Some(node)
    }
}

/// Result of one hierarchy dump: the backend payload and its parsed tree
#[derive(Debug, Clone, Serialize)]
pub struct Hierarchy {
    pub raw: String,
    pub root: Node,
}

/// Outcome of a shell command; `error` is set whenever the command did not succeed
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ShellResponse {
    pub output: String,
    pub error: Option<String>,
}

impl ShellResponse {
    pub fn success(output: impl Into<String>) -> Self {
        Self {
            output: output.into(),
            error: None,
        }
    }

    pub fn failure(error: impl Into<String>) -> Self {
        Self {
            output: String::new(),
            error: Some(error.into()),
        }
    }
}

/// Foreground application reported by the device
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CurrentApp {
    pub package: String,
    pub activity: String,
    pub pid: Option<u32>,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn leaf(key: &str) -> Node {
        Node {
            key: key.to_string(),
            name: "android.widget.TextView".to_string(),
            bounds: None,
            properties: BTreeMap::new(),
            children: vec![],
        }
    }

    #[test]
    fn test_window_size_rejects_zero() {
        assert!(WindowSize::new(1080, 2400).is_ok());
        assert!(matches!(
            WindowSize::new(0, 2400),
            Err(DriverError::InvalidWindowSize { width: 0, .. })
        ));
    }

    #[test]
    fn test_node_iter_document_order() {
        let mut root = leaf("0");
        let mut first = leaf("0-0");
        first.children.push(leaf("0-0-0"));
        root.children.push(first);
        root.children.push(leaf("0-1"));

        let keys: Vec<&str> = root.iter().map(|n| n.key.as_str()).collect();
        assert_eq!(keys, vec!["0", "0-0", "0-0-0", "0-1"]);
        assert_eq!(root.count(), 4);
        assert!(root.find_by_key("0-0-0").is_some());
        assert!(root.find_by_key("0-2").is_none());
    }

    #[test]
    fn test_shell_response_serialization() {
        let json = serde_json::to_value(ShellResponse::success("ok")).unwrap();
        assert_eq!(json, serde_json::json!({"output": "ok", "error": null}));
    }
}
