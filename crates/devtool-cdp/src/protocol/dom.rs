//! DOM domain types: document/node inspection and file input interaction.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

/// Parameters for `DOM.getDocument`.
#[derive(Debug, Clone, Serialize, Default)]
#[serde(rename_all = "camelCase")]
pub struct GetDocumentParams {
    /// How many levels of children to resolve; -1 for the full subtree.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub depth: Option<i32>,
}

/// A DOM node as returned by `DOM.getDocument`.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Node {
    /// CDP node id, valid only for the lifetime of the document.
    pub node_id: i64,
    /// Backend node id, stable across document invalidation.
    pub backend_node_id: i64,
    /// Node name, e.g. `"DIV"`.
    pub node_name: String,
}

/// Result of `DOM.getDocument`.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GetDocumentResult {
    /// Root document node.
    pub root: Node,
}

/// Parameters for `DOM.getOuterHTML`.
#[derive(Debug, Clone, Serialize, Default)]
#[serde(rename_all = "camelCase")]
pub struct GetOuterHtmlParams {
    /// Node to serialize, by CDP node id.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub node_id: Option<i64>,
    /// Node to serialize, by CDP-issued remote object id.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub object_id: Option<String>,
}

/// Result of `DOM.getOuterHTML`.
#[derive(Debug, Clone, Deserialize)]
pub struct GetOuterHtmlResult {
    /// Serialized HTML.
    pub outer_html: String,
}

/// Parameters for `DOM.getBoxModel`.
#[derive(Debug, Clone, Serialize, Default)]
#[serde(rename_all = "camelCase")]
pub struct GetBoxModelParams {
    /// Node to inspect, by CDP-issued remote object id.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub object_id: Option<String>,
}

/// Quad of 8 numbers: four `(x, y)` corner pairs, clockwise from top-left.
pub type Quad = [f64; 8];

/// Box model geometry for one node.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BoxModel {
    /// Content box quad.
    pub content: Quad,
    /// Rendered element width.
    pub width: i64,
    /// Rendered element height.
    pub height: i64,
}

/// Result of `DOM.getBoxModel`.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GetBoxModelResult {
    /// The node's box model.
    pub model: BoxModel,
}

/// Parameters for `DOM.getAttributes`.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GetAttributesParams {
    /// Node to read attributes of.
    pub node_id: i64,
}

/// Result of `DOM.getAttributes`: a flat `[name, value, name, value, ...]`
/// list as CDP returns it.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GetAttributesResult {
    /// Flat name/value pairs.
    pub attributes: Vec<String>,
}

impl GetAttributesResult {
    /// Fold the flat `attributes` list into a name -> value map.
    #[must_use]
    pub fn into_map(self) -> HashMap<String, String> {
        self.attributes
            .chunks_exact(2)
            .map(|pair| (pair[0].clone(), pair[1].clone()))
            .collect()
    }
}

/// Parameters for `DOM.requestNode`.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RequestNodeParams {
    /// Remote object to resolve into a CDP node id.
    pub object_id: String,
}

/// Result of `DOM.requestNode`.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RequestNodeResult {
    /// The node's CDP node id, valid for the life of the current document.
    pub node_id: i64,
}

/// Parameters for `DOM.describeNode`.
#[derive(Debug, Clone, Serialize, Default)]
#[serde(rename_all = "camelCase")]
pub struct DescribeNodeParams {
    /// Node to describe, by CDP-issued remote object id.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub object_id: Option<String>,
    /// Node to describe, by CDP node id.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub node_id: Option<i64>,
}

/// Result of `DOM.describeNode`.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DescribeNodeResult {
    /// The described node.
    pub node: Node,
}

/// Parameters for `DOM.resolveNode`.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ResolveNodeParams {
    /// Node to resolve into a remote object, by backend node id.
    pub backend_node_id: i64,
}

/// Result of `DOM.resolveNode`.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ResolveNodeResult {
    /// Remote object referring to the resolved node.
    pub object: super::runtime::RemoteObject,
}

/// Parameters for `DOM.setFileInputFiles`.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SetFileInputFilesParams {
    /// Absolute paths of the files to attach.
    pub files: Vec<String>,
    /// The `<input type=file>` element, by CDP-issued remote object id.
    pub object_id: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn attributes_fold_into_a_map() {
        let result = GetAttributesResult {
            attributes: vec![
                "id".to_string(),
                "search".to_string(),
                "class".to_string(),
                "box".to_string(),
            ],
        };
        let map = result.into_map();
        assert_eq!(map.get("id"), Some(&"search".to_string()));
        assert_eq!(map.get("class"), Some(&"box".to_string()));
    }
}
