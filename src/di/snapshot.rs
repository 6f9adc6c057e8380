use crate::di::ProviderKind;
use serde::Serialize;

/// Serializable view of a compiled graph.
#[derive(Debug, Clone, Serialize)]
pub struct GraphSnapshot {
    pub nodes: Vec<NodeSnapshot>,
}

#[derive(Debug, Clone, Serialize)]
pub struct NodeSnapshot {
    pub key: String,
    pub kind: ProviderKind,
    pub implements: Vec<String>,
    /// Keys of the definitions this node's arguments resolved to.
    pub dependencies: Vec<String>,
    pub built: bool,
}

impl GraphSnapshot {
    pub fn node(&self, key: &str) -> Option<&NodeSnapshot> {
        self.nodes.iter().find(|node| node.key == key)
    }

    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string_pretty(self)
    }
}
