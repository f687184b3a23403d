//! JSON toolpath documents
//!
//! Operations can be written as structured commands or as G-code text:
//!
//! ```json
//! { "operations": [
//!     { "kind": "path", "label": "Drill", "coolant": "Flood",
//!       "commands": ["G0 X10 Y10", { "name": "G81", "params": { "Z": -3 } }] }
//! ] }
//! ```

use super::{BaseInfo, Command, CoolantMode, NodeInfo, ToolpathNode};
use crate::parser::{parse_commands, ParseError};
use serde::{Deserialize, Serialize};
use std::path::Path;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum DocumentError {
    #[error("cannot read toolpath document: {0}")]
    Io(#[from] std::io::Error),

    #[error("malformed toolpath document: {0}")]
    Json(#[from] serde_json::Error),

    #[error("bad command in '{label}': {source}")]
    Command {
        label: String,
        text: String,
        #[source]
        source: ParseError,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NodeKind {
    Compound,
    Path,
    #[serde(alias = "decoration")]
    Other,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum CommandDocument {
    Text(String),
    Structured(Command),
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NodeDocument {
    pub kind: NodeKind,
    pub label: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub active: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub coolant: Option<CoolantMode>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub base: Option<BaseInfo>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub children: Vec<NodeDocument>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub commands: Vec<CommandDocument>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ToolpathDocument {
    pub operations: Vec<NodeDocument>,
}

impl ToolpathDocument {
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, DocumentError> {
        let content = std::fs::read_to_string(path)?;
        Self::from_json(&content)
    }

    pub fn from_json(json: &str) -> Result<Self, DocumentError> {
        Ok(serde_json::from_str(json)?)
    }

    /// Resolve the document into the toolpath tree
    pub fn into_nodes(self) -> Result<Vec<ToolpathNode>, DocumentError> {
        self.operations
            .into_iter()
            .map(NodeDocument::into_node)
            .collect()
    }
}

impl NodeDocument {
    pub fn into_node(self) -> Result<ToolpathNode, DocumentError> {
        let info = NodeInfo {
            label: self.label,
            active: self.active,
            coolant: self.coolant,
            base: self.base,
        };

        match self.kind {
            NodeKind::Compound => {
                let children = self
                    .children
                    .into_iter()
                    .map(NodeDocument::into_node)
                    .collect::<Result<Vec<_>, _>>()?;
                Ok(ToolpathNode::Compound { info, children })
            }
            NodeKind::Path => {
                let mut commands = Vec::new();
                for doc in self.commands {
                    match doc {
                        CommandDocument::Text(text) => match parse_commands(&text) {
                            Ok(parsed) => commands.extend(parsed),
                            Err(source) => {
                                return Err(DocumentError::Command {
                                    label: info.label,
                                    text,
                                    source,
                                })
                            }
                        },
                        CommandDocument::Structured(cmd) => commands.push(normalize(cmd)),
                    }
                }
                Ok(ToolpathNode::Leaf { info, commands })
            }
            NodeKind::Other => Ok(ToolpathNode::Decoration { info }),
        }
    }
}

fn normalize(cmd: Command) -> Command {
    // Comment text is kept as written
    let name = if cmd.is_comment() {
        cmd.name
    } else {
        cmd.name.trim().to_ascii_uppercase()
    };
    Command {
        name,
        params: cmd
            .params
            .into_iter()
            .map(|(letter, value)| (letter.to_ascii_uppercase(), value))
            .collect(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_mixed_command_forms() {
        let json = r#"{
            "operations": [
                {
                    "kind": "compound",
                    "label": "Job",
                    "children": [
                        { "kind": "other", "label": "Stock" },
                        {
                            "kind": "path",
                            "label": "Drilling",
                            "coolant": "Flood",
                            "commands": [
                                "G0 X10 Y10\nG0 Z5",
                                { "name": "g81", "params": { "x": 10, "Y": 10, "Z": -3, "R": 2, "F": 5 } }
                            ]
                        }
                    ]
                }
            ]
        }"#;

        let nodes = ToolpathDocument::from_json(json)
            .and_then(ToolpathDocument::into_nodes)
            .expect("document should load");
        assert_eq!(nodes.len(), 1);

        let children = nodes[0].children().expect("compound");
        assert!(matches!(children[0], ToolpathNode::Decoration { .. }));

        let commands = children[1].commands().expect("path");
        assert_eq!(commands.len(), 3);
        assert_eq!(commands[2].name, "G81");
        assert_eq!(commands[2].param('X'), Some(10.0));
        assert_eq!(children[1].coolant(), CoolantMode::Flood);
    }

    #[test]
    fn test_command_error_names_the_path() {
        let json = r#"{ "operations": [
            { "kind": "path", "label": "Profile", "commands": ["G1 X1 X2"] }
        ] }"#;

        let err = ToolpathDocument::from_json(json)
            .and_then(ToolpathDocument::into_nodes)
            .unwrap_err();
        match err {
            DocumentError::Command { label, text, .. } => {
                assert_eq!(label, "Profile");
                assert_eq!(text, "G1 X1 X2");
            }
            other => panic!("unexpected error {other:?}"),
        }
    }

    #[test]
    fn test_comment_case_is_kept() {
        let json = r#"{ "operations": [
            { "kind": "path", "label": "Rough",
              "commands": [{ "name": "(Roughing pass)" }, "(Roughing pass)", { "name": "g0", "params": { "z": 5 } }] }
        ] }"#;

        let nodes = ToolpathDocument::from_json(json)
            .and_then(ToolpathDocument::into_nodes)
            .expect("document should load");
        let commands = nodes[0].commands().expect("path");
        assert_eq!(commands[0].name, "(Roughing pass)");
        assert_eq!(commands[0], commands[1]);
        assert_eq!(commands[2], Command::new("G0").with_param('Z', 5.0));
    }

    #[test]
    fn test_missing_kind_is_rejected() {
        let json = r#"{ "operations": [ { "label": "NoKind" } ] }"#;
        assert!(matches!(
            ToolpathDocument::from_json(json),
            Err(DocumentError::Json(_))
        ));
    }
}
