//! Macro templates substituted for machine-control commands
//!
//! Templates are plain line lists. `{T}`-style placeholders name a parameter
//! of the replaced command.

use super::ConfigError;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::Path;

pub const TOOL_CHANGE_COMMANDS: [&str; 2] = ["M6", "M06"];
pub const SPINDLE_START_COMMANDS: [&str; 4] = ["M3", "M03", "M4", "M04"];

/// Tool change for a machine whose spindle and vacuum hang off pins 19/20
const TOOL_CHANGE: &[&str] = &[
    "M400 ; wait for moves to finish",
    "M42 M1 P19 S1 ; spindle off",
    "M42 M1 P20 S1 ; vacuum off",
    "G53 ; machine coordinates",
    "G0 Z50 ; highest Z",
    "G0 Y100",
    "G0 X150",
    "G55 ; workspace 2",
    "G0 Z0",
    "M0 Install tool: {T}; change bit",
    "G53 ; machine coordinates",
    "G0 Z50 ; highest Z",
    "G55 ; workspace 2",
    "G0 Y0",
    "G0 X0",
    "M42 M1 P19 S0 ; spindle on",
    "M42 M1 P20 S0 ; vacuum on",
    "M117 end tool switch",
];

const SPINDLE_START: &[&str] = &[
    ";(activate spindle)",
    "M400",
    "M42 M1 P19 S0",
    "M42 M1 P20 S0",
    "G4 S5 ; wait for spindle",
];

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct MacroTemplate {
    pub lines: Vec<String>,
}

impl MacroTemplate {
    pub fn new<S: AsRef<str>>(lines: &[S]) -> Self {
        Self {
            lines: lines.iter().map(|l| l.as_ref().to_string()).collect(),
        }
    }
}

/// Command name -> macro replacing it
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct MacroTable {
    macros: BTreeMap<String, MacroTemplate>,
}

impl MacroTable {
    pub fn empty() -> Self {
        Self::default()
    }

    /// Tool change and spindle start for the default Marlin router
    pub fn marlin() -> Self {
        let mut table = Self::empty();
        for name in TOOL_CHANGE_COMMANDS {
            table.insert(name, MacroTemplate::new(TOOL_CHANGE));
        }
        for name in SPINDLE_START_COMMANDS {
            table.insert(name, MacroTemplate::new(SPINDLE_START));
        }
        table
    }

    /// Load a JSON object of `"NAME": ["line", ...]`
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path).map_err(|source| ConfigError::MacroFile {
            path: path.display().to_string(),
            source,
        })?;
        Self::from_json(&content)
    }

    pub fn from_json(json: &str) -> Result<Self, ConfigError> {
        let table: MacroTable = serde_json::from_str(json)?;
        Ok(Self {
            macros: table
                .macros
                .into_iter()
                .map(|(name, template)| (name.trim().to_ascii_uppercase(), template))
                .collect(),
        })
    }

    pub fn insert(&mut self, name: &str, template: MacroTemplate) {
        self.macros.insert(name.to_ascii_uppercase(), template);
    }

    /// Entries of `other` replace entries of the same name
    pub fn merge(&mut self, other: MacroTable) {
        self.macros.extend(other.macros);
    }

    pub fn get(&self, name: &str) -> Option<&MacroTemplate> {
        self.macros.get(name)
    }

    pub fn len(&self) -> usize {
        self.macros.len()
    }

    pub fn is_empty(&self) -> bool {
        self.macros.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_marlin_table() {
        let table = MacroTable::marlin();
        assert_eq!(table.len(), 6);
        let tool_change = table.get("M06").expect("tool change macro");
        assert!(tool_change.lines.iter().any(|l| l.contains("{T}")));
        assert!(table.get("M5").is_none());
    }

    #[test]
    fn test_json_overrides() {
        let mut table = MacroTable::marlin();
        let custom = MacroTable::from_json(r#"{ "m3": ["M3 S{S}"], "M8": ["M42 P21 S1"] }"#)
            .expect("valid macro json");
        table.merge(custom);

        assert_eq!(table.get("M3").map(|m| m.lines.clone()), Some(vec!["M3 S{S}".to_string()]));
        assert!(table.get("M8").is_some());
        assert!(table.get("M03").is_some());
    }

    #[test]
    fn test_bad_json() {
        assert!(matches!(
            MacroTable::from_json(r#"{ "M6": "not a list" }"#),
            Err(ConfigError::MacroParse(_))
        ));
    }
}
