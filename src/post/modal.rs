//! Modal memory: which words of a command actually need to be written

use crate::toolpath::Command;
use std::collections::HashMap;

/// Output order of parameter words. Downstream tooling depends on it.
pub const PARAMETER_ORDER: [char; 21] = [
    'X', 'Y', 'Z', 'A', 'B', 'C', 'U', 'V', 'W', 'I', 'J', 'K', 'F', 'S', 'T', 'Q', 'R', 'L', 'P',
    'H', 'D',
];

/// Always written, as integers
pub const INTEGER_PARAMETERS: [char; 7] = ['T', 'H', 'D', 'S', 'P', 'Q', 'R'];

/// Values assumed before the first move of a path
const FIRST_MOVE: [(char, f64); 4] = [('X', -1.0), ('Y', -1.0), ('Z', -1.0), ('F', 0.0)];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ModalOptions {
    pub modal: bool,
    pub suppress_duplicates: bool,
}

/// Words of a command that survive suppression
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Visible {
    pub name: bool,
    pub params: Vec<char>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ModalState {
    last_command: Option<String>,
    last_values: HashMap<char, f64>,
}

impl Default for ModalState {
    fn default() -> Self {
        Self::new()
    }
}

impl ModalState {
    pub fn new() -> Self {
        Self {
            last_command: None,
            last_values: FIRST_MOVE.into_iter().collect(),
        }
    }

    /// Forget everything, back to the first-move values
    pub fn reset(&mut self) {
        *self = Self::new();
    }

    pub fn last_command(&self) -> Option<&str> {
        self.last_command.as_deref()
    }

    pub fn last_value(&self, letter: char) -> Option<f64> {
        self.last_values.get(&letter).copied()
    }

    pub fn visible(&self, cmd: &Command, options: ModalOptions) -> Visible {
        let name = !(options.modal
            && !cmd.is_comment()
            && self.last_command.as_deref() == Some(cmd.name.as_str()));

        let params = PARAMETER_ORDER
            .iter()
            .copied()
            .filter(|&letter| match cmd.param(letter) {
                Some(value) => self.is_visible(cmd, letter, value, options),
                None => false,
            })
            .collect();

        Visible { name, params }
    }

    fn is_visible(&self, cmd: &Command, letter: char, value: f64, options: ModalOptions) -> bool {
        let changed = !options.suppress_duplicates || self.last_value(letter) != Some(value);

        if letter == 'F' {
            // Marlin ignores feed on rapids
            return changed && !cmd.is_rapid() && value > 0.0;
        }
        if INTEGER_PARAMETERS.contains(&letter) {
            return true;
        }
        changed
    }

    /// Remember the command's input values, written or not
    pub fn record(&mut self, cmd: &Command) {
        self.last_values
            .extend(cmd.params.iter().map(|(&letter, &value)| (letter, value)));
        self.last_command = Some(cmd.name.clone());
    }
}
