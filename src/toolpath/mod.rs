//! Toolpath object model handed over by the CAM planner
//!
//! A toolpath is a tree of compound nodes and leaf paths. Leaves carry the
//! ordered machine commands; order defines machining order.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

pub mod document;

pub const RAPID_MOVES: [&str; 2] = ["G0", "G00"];
pub const MOTION_COMMANDS: [&str; 8] = ["G0", "G00", "G1", "G01", "G2", "G02", "G3", "G03"];

/// A single machine command with its parameter words.
///
/// Lengths are stored in millimetres and velocities in millimetres per second.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct Command {
    pub name: String,
    #[serde(default)]
    pub params: BTreeMap<char, f64>,
}

impl Command {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            params: BTreeMap::new(),
        }
    }

    pub fn with_param(mut self, letter: char, value: f64) -> Self {
        self.params.insert(letter.to_ascii_uppercase(), value);
        self
    }

    pub fn param(&self, letter: char) -> Option<f64> {
        self.params.get(&letter).copied()
    }

    pub fn is_comment(&self) -> bool {
        self.name.starts_with('(')
    }

    pub fn is_rapid(&self) -> bool {
        RAPID_MOVES.contains(&self.name.as_str())
    }

    pub fn is_motion(&self) -> bool {
        MOTION_COMMANDS.contains(&self.name.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum CoolantMode {
    #[default]
    None,
    Flood, // M8
    Mist,  // M7
}

impl CoolantMode {
    pub fn on_code(&self) -> Option<&'static str> {
        match self {
            CoolantMode::None => None,
            CoolantMode::Flood => Some("M8"),
            CoolantMode::Mist => Some("M7"),
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            CoolantMode::None => "None",
            CoolantMode::Flood => "Flood",
            CoolantMode::Mist => "Mist",
        }
    }
}

/// Properties of the object an operation is based on
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct BaseInfo {
    #[serde(default)]
    pub active: Option<bool>,
    #[serde(default)]
    pub coolant: Option<CoolantMode>,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct NodeInfo {
    pub label: String,
    #[serde(default)]
    pub active: Option<bool>,
    #[serde(default)]
    pub coolant: Option<CoolantMode>,
    #[serde(default)]
    pub base: Option<BaseInfo>,
}

impl NodeInfo {
    pub fn new(label: impl Into<String>) -> Self {
        Self {
            label: label.into(),
            ..Self::default()
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum ToolpathNode {
    Compound {
        info: NodeInfo,
        children: Vec<ToolpathNode>,
    },
    Leaf {
        info: NodeInfo,
        commands: Vec<Command>,
    },
    /// Non-path objects (stock, fixtures) that may sit inside a group
    Decoration { info: NodeInfo },
}

impl ToolpathNode {
    pub fn compound(label: impl Into<String>, children: Vec<ToolpathNode>) -> Self {
        ToolpathNode::Compound {
            info: NodeInfo::new(label),
            children,
        }
    }

    pub fn leaf(label: impl Into<String>, commands: Vec<Command>) -> Self {
        ToolpathNode::Leaf {
            info: NodeInfo::new(label),
            commands,
        }
    }

    pub fn info(&self) -> &NodeInfo {
        match self {
            ToolpathNode::Compound { info, .. }
            | ToolpathNode::Leaf { info, .. }
            | ToolpathNode::Decoration { info } => info,
        }
    }

    fn info_mut(&mut self) -> &mut NodeInfo {
        match self {
            ToolpathNode::Compound { info, .. }
            | ToolpathNode::Leaf { info, .. }
            | ToolpathNode::Decoration { info } => info,
        }
    }

    pub fn label(&self) -> &str {
        &self.info().label
    }

    pub fn with_active(mut self, active: bool) -> Self {
        self.info_mut().active = Some(active);
        self
    }

    pub fn with_coolant(mut self, coolant: CoolantMode) -> Self {
        self.info_mut().coolant = Some(coolant);
        self
    }

    pub fn with_base(mut self, base: BaseInfo) -> Self {
        self.info_mut().base = Some(base);
        self
    }

    /// Inactive if the node or its base is explicitly switched off
    pub fn is_active(&self) -> bool {
        let info = self.info();
        let base_active = info.base.as_ref().and_then(|b| b.active);
        info.active != Some(false) && base_active != Some(false)
    }

    /// Own coolant mode, falling back to the base object's
    pub fn coolant(&self) -> CoolantMode {
        let info = self.info();
        info.coolant
            .or_else(|| info.base.as_ref().and_then(|b| b.coolant))
            .unwrap_or_default()
    }

    pub fn commands(&self) -> Option<&[Command]> {
        match self {
            ToolpathNode::Leaf { commands, .. } => Some(commands),
            _ => None,
        }
    }

    pub fn children(&self) -> Option<&[ToolpathNode]> {
        match self {
            ToolpathNode::Compound { children, .. } => Some(children),
            _ => None,
        }
    }
}
